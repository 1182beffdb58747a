/**
 * environment module
 * Per-test sandbox provisioning: unique directory, reserved ports, settings snapshot
 */

pub mod config;
pub mod fixture;

pub use config::{
    resolve_temp_root, resolve_temp_root_with, EnvironmentOptions, CI_BUILD_FOLDER_VAR,
    CI_TEMP_SEGMENT, TEMP_NAMESPACE,
};
pub use fixture::TestEnvironment;
