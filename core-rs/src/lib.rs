//! # testenv core - ephemeral per-test environments
//!
//! Provisions an isolated sandbox for one test run: a freshly created, uniquely
//! named directory and three exclusively held loopback ports, exposed as a
//! [`ToolSettings`] snapshot for the library under test.
//!
//! ## Core Principle
//!
//! **The OS is the coordinator**: ports are held by keeping a bound listener open,
//! and directories are named from a v4 UUID. Concurrent tests in any number of
//! processes never collide, with no shared lock or registry.
//!
//! ## Lifecycle
//!
//! ```text
//!  initialize() ──► Active ──dispose()──► Disposed
//!                     │                      │
//!         base_directory / build_settings    every accessor → InvalidState
//!                                            dispose() again → no-op
//! ```

pub mod errors;
pub mod port;
pub mod settings;
pub mod environment;
pub mod logging;

pub use errors::{EnvError, Result};
pub use port::{is_port_bindable, live_claims, LoopbackSource, PortClaim, PortSource, ReservedPorts};
pub use settings::{PortRoles, ToolSettings};
pub use environment::{resolve_temp_root, EnvironmentOptions, TestEnvironment};

/// Ports reserved by every test environment
pub const PORTS_PER_ENVIRONMENT: usize = settings::PORT_ROLE_COUNT;
