//! End-to-end tests for `epicsenv build`. Modules are marked cloned and use
//! `true`/`false` as build commands, so nothing touches the network.

mod common;
use common::prelude::*;

#[test]
fn test_build_env_succeeds() {
    let fixture = TestFixture::new()
        .with_env(envs::BUILDABLE)
        .with_checkout("asyn");

    fixture
        .command_with_env()
        .args(["build", "env"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Environment built."));

    let env = fixture.child("env.json");
    env.assert(predicate::str::contains("\"STATE\": 3"));
    env.assert(predicate::str::contains("\"STATE\": 1").not());

    let release = fixture.child("build/asyn/configure/RELEASE");
    release.assert(predicate::str::contains("EPICS_BASE="));
    release.assert(predicate::str::contains("/somewhere/else").not());
    fixture
        .child("build/asyn/configure/CONFIG_SITE")
        .assert(predicate::str::contains("TIRPC=YES"));
}

#[test]
fn test_build_env_reports_failures() {
    let fixture = TestFixture::new()
        .with_env(envs::BROKEN_BASE)
        .with_checkout("asyn");

    fixture
        .command_with_env()
        .args(["build", "env"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed to build the following modules"))
        .stdout(predicate::str::contains("  - ASYN"))
        .stdout(predicate::str::contains("  - EPICS_BASE"))
        .stderr(predicate::str::contains("2 module(s) failed to build"));

    fixture
        .child("env.json")
        .assert(predicate::str::contains("\"STATE\": 3").not());
}

#[test]
fn test_build_module_builds_dependencies() {
    let fixture = TestFixture::new()
        .with_env(envs::BUILDABLE)
        .with_checkout("asyn");

    fixture
        .command_with_env()
        .args(["build", "module", "EPICS_BASE", "-t", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Module EPICS_BASE built."));

    fixture
        .child("build/asyn/configure/CONFIG_SITE")
        .assert(predicate::path::missing());
}

#[test]
fn test_build_module_dependency_failure() {
    let fixture = TestFixture::new()
        .with_env(envs::BROKEN_BASE)
        .with_checkout("asyn");

    fixture
        .command_with_env()
        .args(["build", "module", "ASYN"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dependency EPICS_BASE failed"));
}

#[test]
fn test_build_unknown_module() {
    let fixture = TestFixture::new().with_env(envs::BUILDABLE);
    fixture
        .command_with_env()
        .args(["build", "module", "MOTOR"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Module MOTOR not found"));
}
