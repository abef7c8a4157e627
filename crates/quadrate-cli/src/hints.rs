use owo_colors::OwoColorize;
use quadrate_syntax::{Diagnostic, DiagnosticKind};

/// A short suggestion for fixing `diag`, if there is a useful one.
pub fn help_for(diag: &Diagnostic) -> Option<&'static str> {
    let msg = diag.message.as_str();
    match diag.kind {
        DiagnosticKind::UnterminatedString => {
            Some("a string ends at the next unescaped '\"'; add the closing quote")
        }
        DiagnosticKind::UnterminatedComment => {
            Some("block comments do not nest; close this one with '*/'")
        }
        DiagnosticKind::InvalidCharacter => {
            Some("remove the character, or move it into a string or comment")
        }
        DiagnosticKind::UnexpectedEof => {
            Some("something is still open here; look for a missing '}' or ')'")
        }
        DiagnosticKind::MissingBody => {
            Some("bodies are written in braces, even when empty: '{}'")
        }
        DiagnosticKind::MalformedSignature => Some(
            "signatures look like '(a:int b:int -- c:int)'; inputs go before '--', outputs after",
        ),
        DiagnosticKind::NestingTooDeep => {
            Some("split the innermost blocks out into separate functions")
        }
        DiagnosticKind::UnexpectedToken if msg.contains("builtin") => {
            Some("builtin words are reserved; choose another name")
        }
        DiagnosticKind::UnexpectedToken if msg.contains("keyword") => {
            Some("keywords are reserved; choose another name")
        }
        DiagnosticKind::UnexpectedToken if msg.contains("'else'") => {
            Some("'else' must directly follow the closing brace of an 'if' block")
        }
        DiagnosticKind::UnexpectedToken if msg.contains("unmatched '}'") => {
            Some("this brace closes nothing; check the braces above it")
        }
        DiagnosticKind::UnexpectedToken | DiagnosticKind::Cancelled => None,
    }
}

pub fn render_help(diag: &Diagnostic, color: bool) -> Option<String> {
    let help = help_for(diag)?;
    Some(if color {
        format!("{} {}\n", "help:".yellow().bold(), help.yellow())
    } else {
        format!("help: {}\n", help)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadrate_syntax::Span;

    fn diag(kind: DiagnosticKind, msg: &str) -> Diagnostic {
        Diagnostic::new(kind, Span::default(), msg)
    }

    #[test]
    fn test_help_by_kind() {
        assert!(help_for(&diag(DiagnosticKind::MissingBody, "x")).is_some());
        assert!(help_for(&diag(DiagnosticKind::NestingTooDeep, "x")).is_some());
        assert!(help_for(&diag(DiagnosticKind::Cancelled, "parse cancelled")).is_none());
    }

    #[test]
    fn test_help_by_message() {
        let d = diag(
            DiagnosticKind::UnexpectedToken,
            "'dup' is a builtin operation and cannot be used as a local name",
        );
        assert_eq!(help_for(&d), Some("builtin words are reserved; choose another name"));
        let d = diag(DiagnosticKind::UnexpectedToken, "expected '=' after constant 'A'");
        assert_eq!(help_for(&d), None);
    }

    #[test]
    fn test_plain_help_line() {
        let d = diag(DiagnosticKind::UnterminatedComment, "unterminated block comment");
        assert_eq!(
            render_help(&d, false).unwrap(),
            "help: block comments do not nest; close this one with '*/'\n"
        );
    }
}
