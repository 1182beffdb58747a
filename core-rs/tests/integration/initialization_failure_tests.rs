//! Initialization Failure Integration Test
//!
//! Kept alone in its own test binary: it reads the process-wide live claim
//! counter, which other tests in the same process would disturb.

use std::fs;

use tempfile::TempDir;
use testenv_core::{live_claims, EnvError, EnvironmentOptions};

#[test]
fn test_failed_directory_creation_leaves_no_ports_held() {
    testenv_core::logging::init();
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, b"a file where the temp root should be").unwrap();

    let before = live_claims();

    let err = EnvironmentOptions::new()
        .temp_root(&blocker)
        .initialize()
        .unwrap_err();

    assert!(matches!(err, EnvError::Io { .. }));
    assert_eq!(live_claims(), before, "ports still held after failed initialize");

    // Sanity check that the counter tracks a successful initialize
    let mut env = EnvironmentOptions::new()
        .temp_root(temp.path().join("ok"))
        .initialize()
        .unwrap();
    assert_eq!(live_claims(), before + 3);

    env.dispose();
    assert_eq!(live_claims(), before);
}
