/**
 * config.rs
 * Temp-root resolution and initialization options
 *
 * Resolution rule:
 * - CI build folder variable set and non-blank → <value>/temp
 * - otherwise                                   → <platform temp>/Knapcode.TorSharp.Tests
 */

use std::env;
use std::path::PathBuf;

use crate::errors::Result;

use super::fixture::TestEnvironment;

/// CI variable naming the build checkout folder
pub const CI_BUILD_FOLDER_VAR: &str = "APPVEYOR_BUILD_FOLDER";

/// Segment appended to the CI build folder
pub const CI_TEMP_SEGMENT: &str = "temp";

/// Namespace directory under the platform temp dir
pub const TEMP_NAMESPACE: &str = "Knapcode.TorSharp.Tests";

/// Resolve the temp root from the process environment
pub fn resolve_temp_root() -> PathBuf {
    resolve_temp_root_with(|name| env::var(name).ok())
}

/// Resolve the temp root using `lookup` for environment variables
///
/// Blank or whitespace-only values count as unset.
pub fn resolve_temp_root_with<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(CI_BUILD_FOLDER_VAR) {
        Some(folder) if !folder.trim().is_empty() => PathBuf::from(folder).join(CI_TEMP_SEGMENT),
        _ => env::temp_dir().join(TEMP_NAMESPACE),
    }
}

/// Options for creating a [`TestEnvironment`]
///
/// # Example
/// ```no_run
/// use testenv_core::EnvironmentOptions;
///
/// let env = EnvironmentOptions::new()
///     .temp_root("/tmp/my-tests")
///     .delete_on_dispose(false)
///     .initialize()?;
/// # Ok::<(), testenv_core::EnvError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EnvironmentOptions {
    temp_root: Option<PathBuf>,
    delete_on_dispose: bool,
}

impl Default for EnvironmentOptions {
    fn default() -> Self {
        EnvironmentOptions {
            temp_root: None,
            delete_on_dispose: true,
        }
    }
}

impl EnvironmentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `root` instead of the resolved temp root
    pub fn temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Initial value of the fixture's delete-on-dispose flag
    pub fn delete_on_dispose(mut self, delete: bool) -> Self {
        self.delete_on_dispose = delete;
        self
    }

    /// Temp root these options resolve to, reading the environment if no override is set
    pub fn resolved_temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(resolve_temp_root)
    }

    pub fn initial_delete_on_dispose(&self) -> bool {
        self.delete_on_dispose
    }

    pub fn initialize(&self) -> Result<TestEnvironment> {
        TestEnvironment::initialize_with(self)
    }
}
