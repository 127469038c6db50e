//! End-to-end tests for `epicsenv init`.

mod common;
use common::prelude::*;

#[test]
fn test_init_local_env() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .args(["init", "env", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Environment initialized"))
        .stdout(predicate::str::contains("Activate with: epicsenv use env"));

    let env = fixture.child("epicsenv/epicsenv.json");
    env.assert(predicate::path::is_file());
    env.assert(predicate::str::contains("EPICS_BASE"));
    env.assert(predicate::str::contains("CONFIG_MACROS"));
}

#[test]
fn test_init_twice_fails_without_force() {
    let fixture = TestFixture::new();
    fixture.command().args(["init", "env", "--yes"]).assert().success();

    fixture
        .command()
        .args(["init", "env", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    fixture
        .command()
        .args(["init", "env", "--yes", "--force", "--empty"])
        .assert()
        .success();
    fixture
        .child("epicsenv/epicsenv.json")
        .assert(predicate::str::contains("EPICS_BASE").not());
}

#[test]
fn test_init_global_env() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .args(["init", "env", "--global", "--name", "beamline", "--yes", "--empty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("epicsenv use env beamline"));

    fixture.child("cfg/beamline.json").assert(predicate::path::is_file());
    fixture.child("cfg/epicsenv.ini").assert(predicate::path::is_file());
}

#[test]
fn test_init_env_custom_locations() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .args(["init", "env", "--yes", "--empty", "--build", "b", "--install", "i"])
        .assert()
        .success();

    let build = fixture.path().join("b").display().to_string();
    fixture
        .child("epicsenv/epicsenv.json")
        .assert(predicate::str::contains(build));
}

#[test]
fn test_init_module() {
    let fixture = TestFixture::new().with_env(envs::EMPTY);
    fixture
        .command_with_env()
        .args([
            "init",
            "module",
            "ASYN",
            "--url",
            "https://github.com/epics-modules/asyn",
            "--version",
            "R4-41",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Module ASYN added"));

    let env = fixture.child("env.json");
    env.assert(predicate::str::contains("\"ASYN\""));
    env.assert(predicate::str::contains("R4-41"));
}

#[test]
fn test_init_duplicate_module() {
    let fixture = TestFixture::new().with_env(envs::BUILDABLE);
    fixture
        .command_with_env()
        .args(["init", "module", "ASYN", "--url", "https://example.org/asyn"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_init_module_rejects_url_without_directory_name() {
    let fixture = TestFixture::new().with_env(envs::EMPTY);
    fixture
        .command_with_env()
        .args(["init", "module", "TOOLS", "--url", "https://github.com/org/.epics-tools"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not name a checkout directory"));

    fixture
        .child("env.json")
        .assert(predicate::str::contains("TOOLS").not());
}
