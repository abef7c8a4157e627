pub mod ast;
pub mod diagnostic;
pub mod error;
pub mod report;
pub mod reserved;
pub mod source;
pub mod token;

pub use ast::*;
pub use diagnostic::*;
pub use error::{Error, Result};
pub use report::Renderer;
pub use reserved::{builtin_names, is_builtin, is_keyword, lookup_reserved};
pub use source::{SourceBuffer, Span};
pub use token::*;
