//! SFTP backend configuration
//!
//! Connection settings consumed by [`crate::SftpBackend`]. Loading and
//! merging of configuration files belongs to the calling application; this
//! crate only defines the value object and its validation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use rstore_core::{Error, Result};

fn default_port() -> u16 {
    22
}

fn default_true() -> bool {
    true
}

/// Connection settings for one SFTP endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SftpConfig {
    /// Server hostname or IP address
    pub address: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login user
    pub username: String,

    /// Path to the private key used for public-key authentication
    pub key_file: PathBuf,

    /// Remote root directory; every key is resolved relative to it
    #[serde(default)]
    pub root_path: String,

    /// Verify the server host key against `~/.ssh/known_hosts`.
    ///
    /// Disabling this accepts any server identity and should be reserved for
    /// throwaway test environments.
    #[serde(default = "default_true")]
    pub verify_host_key: bool,
}

impl SftpConfig {
    /// Check that all required fields are present
    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(Error::Config("SFTP address is required".into()));
        }
        if self.username.is_empty() {
            return Err(Error::Config("SFTP username is required".into()));
        }
        if self.key_file.as_os_str().is_empty() {
            return Err(Error::Config("SFTP key file is required".into()));
        }
        Ok(())
    }
}
