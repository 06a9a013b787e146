use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn compiles_a_directory_and_writes_a_silo() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path();
    fs::write(root.join("a.xml"), "<a><b>hi</b></a>")?;

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("siloc"));
    cmd.arg(root);
    cmd.assert().success();

    assert!(root.with_extension("silo").exists());
    Ok(())
}

#[test]
fn ensure_is_idempotent_on_a_second_run() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path();
    fs::write(root.join("a.xml"), "<a/>")?;
    let output = root.join("out.silo");

    let mut first = Command::new(assert_cmd::cargo::cargo_bin!("siloc"));
    first.arg(root).arg("-o").arg(&output).arg("-v");
    first
        .assert()
        .success()
        .stderr(predicate::str::contains("recompiling"));

    let mut second = Command::new(assert_cmd::cargo::cargo_bin!("siloc"));
    second.arg(root).arg("-o").arg(&output).arg("-v");
    second
        .assert()
        .success()
        .stderr(predicate::str::contains("reusing").or(predicate::str::contains("rebinding")));

    Ok(())
}

#[test]
fn force_always_recompiles() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path();
    fs::write(root.join("a.xml"), "<a/>")?;
    let output = root.join("out.silo");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("siloc"));
    cmd.arg(root).arg("-o").arg(&output).arg("--force");
    cmd.assert().success();
    assert!(output.exists());
    Ok(())
}

#[test]
fn inspect_dumps_header_as_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path();
    fs::write(root.join("a.xml"), "<a><b>hi</b><b>ho</b></a>")?;
    let output = root.join("out.silo");

    let mut compile = Command::new(assert_cmd::cargo::cargo_bin!("siloc"));
    compile.arg(root).arg("-o").arg(&output);
    compile.assert().success();

    let mut inspect = Command::new(assert_cmd::cargo::cargo_bin!("siloc"));
    inspect.arg("inspect").arg(&output);
    inspect
        .assert()
        .success()
        .stdout(predicate::str::contains("\"strtab_ntags\": 2"))
        .stdout(predicate::str::contains("\"magic\": \"SILO\""));

    Ok(())
}

#[test]
fn batch_compiles_multiple_directories() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let first = dir.path().join("one");
    let second = dir.path().join("two");
    fs::create_dir(&first)?;
    fs::create_dir(&second)?;
    fs::write(first.join("a.xml"), "<a/>")?;
    fs::write(second.join("b.xml"), "<b/>")?;

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("siloc"));
    cmd.arg("batch").arg(&first).arg(&second);
    cmd.assert().success();

    assert!(first.with_extension("silo").exists());
    assert!(second.with_extension("silo").exists());
    Ok(())
}

#[test]
fn ignore_invalid_skips_a_malformed_file_instead_of_aborting() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path();
    fs::write(root.join("a.xml"), "<a/>")?;
    fs::write(root.join("broken.xml"), "<broken")?;

    let mut without_flag = Command::new(assert_cmd::cargo::cargo_bin!("siloc"));
    without_flag.arg(root).arg("-o").arg(root.join("fails.silo"));
    without_flag.assert().failure();

    let mut with_flag = Command::new(assert_cmd::cargo::cargo_bin!("siloc"));
    with_flag
        .arg(root)
        .arg("-o")
        .arg(root.join("ok.silo"))
        .arg("--ignore-invalid");
    with_flag.assert().success();

    Ok(())
}
