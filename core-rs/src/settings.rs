//! Tool settings snapshot handed to the library under test
//!
//! The three reserved ports are bound to named roles once, here, so nothing
//! downstream indexes into a raw port list.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{EnvError, Result};

/// Directory segment for downloaded tool archives
pub const ZIPPED_SEGMENT: &str = "Zipped";

/// Directory segment for extracted tool binaries
pub const EXTRACTED_SEGMENT: &str = "Extracted";

/// Directory segment for Tor runtime data
pub const TOR_DATA_SEGMENT: &str = "TorData";

/// Number of ports a settings snapshot needs
pub const PORT_ROLE_COUNT: usize = 3;

/// Reserved ports bound to the role each one plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRoles {
    /// HTTP proxy listener (position 0)
    pub privoxy: u16,
    /// SOCKS listener (position 1)
    pub tor_socks: u16,
    /// Control channel (position 2)
    pub tor_control: u16,
}

impl PortRoles {
    /// Bind positional ports to roles: privoxy, tor_socks, tor_control
    ///
    /// # Errors
    /// `PortRoles` unless exactly three ports are given
    pub fn from_positional(ports: &[u16]) -> Result<Self> {
        match ports {
            [privoxy, tor_socks, tor_control] => Ok(PortRoles {
                privoxy: *privoxy,
                tor_socks: *tor_socks,
                tor_control: *tor_control,
            }),
            _ => Err(EnvError::PortRoles(format!(
                "expected {} ports, got {}",
                PORT_ROLE_COUNT,
                ports.len()
            ))),
        }
    }

    /// Ports back in positional order
    pub fn to_positional(&self) -> [u16; PORT_ROLE_COUNT] {
        [self.privoxy, self.tor_socks, self.tor_control]
    }
}

/// Settings snapshot consumed by the tool-management library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    pub zipped_tools_directory: PathBuf,
    pub extracted_tools_directory: PathBuf,
    pub tor_data_directory: PathBuf,
    pub privoxy_port: u16,
    pub tor_socks_port: u16,
    pub tor_control_port: u16,
    pub tor_control_password: String,
    /// Force the consumer to fetch tools again instead of reusing a cache
    pub reload_tools: bool,
}

impl ToolSettings {
    /// Build a snapshot rooted at `base_directory`
    pub fn new(base_directory: &Path, roles: PortRoles, control_password: impl Into<String>) -> Self {
        ToolSettings {
            zipped_tools_directory: base_directory.join(ZIPPED_SEGMENT),
            extracted_tools_directory: base_directory.join(EXTRACTED_SEGMENT),
            tor_data_directory: base_directory.join(TOR_DATA_SEGMENT),
            privoxy_port: roles.privoxy,
            tor_socks_port: roles.tor_socks,
            tor_control_port: roles.tor_control,
            tor_control_password: control_password.into(),
            reload_tools: true,
        }
    }

    pub fn ports(&self) -> PortRoles {
        PortRoles {
            privoxy: self.privoxy_port,
            tor_socks: self.tor_socks_port,
            tor_control: self.tor_control_port,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
