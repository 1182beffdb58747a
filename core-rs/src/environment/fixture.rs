//! Disposable test environment: one sandbox directory plus three held ports
//!
//! A `TestEnvironment` is either Active or Disposed. Every accessor checks the
//! state first and returns `EnvError::InvalidState` once disposed; `dispose`
//! itself is the one operation that stays callable and becomes a no-op.

use std::env;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{EnvError, Result};
use crate::port::ReservedPorts;
use crate::settings::{PortRoles, ToolSettings, PORT_ROLE_COUNT};

use super::config::EnvironmentOptions;

enum Lifecycle {
    Active {
        base_directory: PathBuf,
        ports: ReservedPorts,
    },
    Disposed,
}

/// Sandbox directory and reserved ports scoped to a single test
pub struct TestEnvironment {
    id: Uuid,
    delete_on_dispose: bool,
    state: Lifecycle,
}

impl TestEnvironment {
    /// Create an environment under the resolved temp root
    ///
    /// # Example
    /// ```no_run
    /// use testenv_core::TestEnvironment;
    ///
    /// let mut env = TestEnvironment::initialize()?;
    /// let settings = env.build_settings()?;
    /// // ... run the test against `settings` ...
    /// env.dispose();
    /// # Ok::<(), testenv_core::EnvError>(())
    /// ```
    pub fn initialize() -> Result<Self> {
        Self::initialize_with(&EnvironmentOptions::default())
    }

    /// Create an environment according to `options`
    ///
    /// # Errors
    /// - `ResourceExhausted` if the ports cannot be reserved
    /// - `Io` if the base directory cannot be created; the ports are
    ///   released before the error is returned
    pub fn initialize_with(options: &EnvironmentOptions) -> Result<Self> {
        let id = Uuid::new_v4();
        let base_directory = absolute(options.resolved_temp_root().join(id.to_string()))?;

        let mut ports = ReservedPorts::reserve(PORT_ROLE_COUNT)?;

        if let Err(e) = fs::create_dir_all(&base_directory) {
            ports.release();
            return Err(EnvError::io(base_directory, e));
        }

        debug!(%id, base_directory = %base_directory.display(), "initialized test environment");

        Ok(TestEnvironment {
            id,
            delete_on_dispose: options.initial_delete_on_dispose(),
            state: Lifecycle::Active {
                base_directory,
                ports,
            },
        })
    }

    /// Unique identifier; also the directory name and the control password
    pub fn id(&self) -> Result<Uuid> {
        self.active()?;
        Ok(self.id)
    }

    pub fn base_directory(&self) -> Result<&Path> {
        let (base_directory, _) = self.active()?;
        Ok(base_directory)
    }

    /// Reserved ports in role order: privoxy, tor_socks, tor_control
    pub fn ports(&self) -> Result<&[u16]> {
        let (_, ports) = self.active()?;
        ports.ports()
    }

    pub fn delete_on_dispose(&self) -> bool {
        self.delete_on_dispose
    }

    /// # Errors
    /// `InvalidState` once disposed
    pub fn set_delete_on_dispose(&mut self, delete: bool) -> Result<()> {
        self.active()?;
        self.delete_on_dispose = delete;
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.state, Lifecycle::Disposed)
    }

    /// Settings snapshot for the library under test
    ///
    /// Tool directories are computed, not created; the consumer creates them.
    pub fn build_settings(&self) -> Result<ToolSettings> {
        let (base_directory, ports) = self.active()?;
        let roles = PortRoles::from_positional(ports.ports()?)?;
        Ok(ToolSettings::new(base_directory, roles, self.id.to_string()))
    }

    /// Release the ports and, if enabled, delete the directory tree
    ///
    /// Never fails. A deletion error is logged and dropped. Returns `true`
    /// if this call performed the disposal, `false` if it had already happened.
    pub fn dispose(&mut self) -> bool {
        let (base_directory, mut ports) = match mem::replace(&mut self.state, Lifecycle::Disposed) {
            Lifecycle::Active {
                base_directory,
                ports,
            } => (base_directory, ports),
            Lifecycle::Disposed => return false,
        };

        ports.release();

        if self.delete_on_dispose {
            if let Err(e) = fs::remove_dir_all(&base_directory) {
                warn!(
                    id = %self.id,
                    base_directory = %base_directory.display(),
                    error = %e,
                    "failed to delete test environment directory"
                );
            }
        }

        debug!(id = %self.id, "disposed test environment");
        true
    }

    fn active(&self) -> Result<(&Path, &ReservedPorts)> {
        match &self.state {
            Lifecycle::Active {
                base_directory,
                ports,
            } => Ok((base_directory.as_path(), ports)),
            Lifecycle::Disposed => Err(EnvError::InvalidState(
                "the test environment has already been disposed".to_string(),
            )),
        }
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for TestEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("TestEnvironment");
        s.field("id", &self.id)
            .field("delete_on_dispose", &self.delete_on_dispose);
        match &self.state {
            Lifecycle::Active {
                base_directory,
                ports,
            } => s
                .field("base_directory", base_directory)
                .field("ports", ports)
                .finish(),
            Lifecycle::Disposed => s.field("disposed", &true).finish(),
        }
    }
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = env::current_dir().map_err(|e| EnvError::io(&path, e))?;
    Ok(cwd.join(path))
}
