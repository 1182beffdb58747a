//! Concurrent Initialization Integration Tests
//!
//! Many environments created at once must never share a port or a directory.
//! No lock is involved: exclusivity comes from the OS bind and from UUID names.

use std::collections::HashSet;
use std::path::PathBuf;
use std::thread;

use tempfile::TempDir;
use testenv_core::{EnvironmentOptions, ReservedPorts, TestEnvironment};

const ENVIRONMENTS: usize = 20;

#[test]
fn test_twenty_environments_share_no_ports() {
    testenv_core::logging::init();
    let temp = TempDir::new().unwrap();
    let options = EnvironmentOptions::new().temp_root(temp.path());

    let environments: Vec<TestEnvironment> = thread::scope(|scope| {
        let handles: Vec<_> = (0..ENVIRONMENTS)
            .map(|_| scope.spawn(|| options.initialize().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let ports: Vec<u16> = environments
        .iter()
        .flat_map(|env| env.ports().unwrap().to_vec())
        .collect();
    let unique: HashSet<u16> = ports.iter().copied().collect();

    assert_eq!(ports.len(), ENVIRONMENTS * 3);
    assert_eq!(unique.len(), ENVIRONMENTS * 3, "duplicate port handed out");

    let directories: HashSet<PathBuf> = environments
        .iter()
        .map(|env| env.base_directory().unwrap().to_path_buf())
        .collect();
    assert_eq!(directories.len(), ENVIRONMENTS);

    for mut env in environments {
        assert!(env.dispose());
    }
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn test_concurrent_reservations_are_disjoint() {
    let sets: Vec<ReservedPorts> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| ReservedPorts::reserve(5).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut seen = HashSet::new();
    for set in &sets {
        for &port in set.ports().unwrap() {
            assert!(seen.insert(port), "port {} reserved twice", port);
        }
    }
    assert_eq!(seen.len(), 40);
}

#[test]
fn test_environments_dispose_from_other_threads() {
    let temp = TempDir::new().unwrap();
    let options = EnvironmentOptions::new().temp_root(temp.path());

    let environments: Vec<TestEnvironment> =
        (0..4).map(|_| options.initialize().unwrap()).collect();

    thread::scope(|scope| {
        for mut env in environments {
            scope.spawn(move || assert!(env.dispose()));
        }
    });

    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}
