use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.parent().unwrap().parent().unwrap().to_path_buf()
}

#[test]
fn quadfmt_accepts_canonical_sample() {
    let root = workspace_root();
    let mut cmd = Command::cargo_bin("quadfmt").unwrap();
    cmd.arg("--check").arg(root.join("samples/hello.qd"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hello.qd: ok"));
}

#[test]
fn quadfmt_rewrites_file_in_place() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("messy.qd");
    std::fs::write(&path, "fn   sq(x:int -- y:int){dup mul}").unwrap();

    let mut check = Command::cargo_bin("quadfmt").unwrap();
    check.arg("--check").arg(&path);
    check
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not formatted"));

    let mut write = Command::cargo_bin("quadfmt").unwrap();
    write.arg("--write").arg(&path);
    write.assert().success();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "fn sq(x:int -- y:int) {\n\tdup\n\tmul\n}\n"
    );
}

#[test]
fn quadfmt_write_keeps_comments() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("commented.qd");
    std::fs::write(
        &path,
        "// squares\nfn   sq(x:int -- y:int){ /* twice */ dup mul // done\n}",
    )
    .unwrap();

    let mut write = Command::cargo_bin("quadfmt").unwrap();
    write.arg("--write").arg(&path);
    write.assert().success();
    let expected = "// squares\nfn sq(x:int -- y:int) {\n\t/* twice */\n\tdup\n\tmul // done\n}\n";
    assert_eq!(std::fs::read_to_string(&path).unwrap(), expected);

    let mut check = Command::cargo_bin("quadfmt").unwrap();
    check.arg("--check").arg(&path);
    check
        .assert()
        .success()
        .stdout(predicate::str::contains("commented.qd: ok"));
}

#[test]
fn quadfmt_checks_commented_sample() {
    let root = workspace_root();
    let mut cmd = Command::cargo_bin("quadfmt").unwrap();
    cmd.arg(root.join("samples/math.qd"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("// Foreign math bindings"))
        .stdout(predicate::str::contains("/* squares the value on top of the stack */"));
}

#[test]
fn quadfmt_refuses_files_with_errors() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("broken.qd");
    std::fs::write(&path, "fn f {").unwrap();

    let mut cmd = Command::cargo_bin("quadfmt").unwrap();
    cmd.env("NO_COLOR", "1").arg(&path);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not formatting a file with errors"));
}
