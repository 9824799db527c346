//! SSH session establishment
//!
//! Wraps russh and russh-sftp: key loading, host-key policy, dial,
//! public-key authentication and the SFTP subsystem channel. Everything else
//! in this crate talks to the resulting [`SftpSession`].

use std::sync::Arc;

use russh::client;
use russh::keys::{PrivateKeyWithHashAlg, decode_secret_key};
use russh_sftp::client::SftpSession;
use russh_sftp::client::error::Error as SftpError;
use russh_sftp::protocol::StatusCode;

use rstore_core::{Error, Result};

use crate::config::SftpConfig;

/// Host-key verification policy for the SSH handshake.
///
/// When verification is on, the server key is checked against the user's
/// known_hosts; unknown or mismatched keys reject the connection. When off,
/// any server identity is accepted.
struct HostKeyPolicy {
    host: String,
    port: u16,
    verify: bool,
}

impl client::Handler for HostKeyPolicy {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        if !self.verify {
            return Ok(true);
        }
        match russh::keys::check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(known) => Ok(known),
            Err(e) => {
                tracing::warn!(host = %self.host, error = %e, "known_hosts check failed");
                Ok(false)
            }
        }
    }
}

/// An authenticated SSH connection with an open SFTP channel
pub(crate) struct SshSession {
    handle: client::Handle<HostKeyPolicy>,
    sftp: SftpSession,
}

impl SshSession {
    pub(crate) fn sftp(&self) -> &SftpSession {
        &self.sftp
    }

    /// Send a disconnect and drop the connection
    pub(crate) async fn close(self) -> Result<()> {
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(|e| Error::Connection(format!("disconnect: {e}")))
    }
}

/// Dial, authenticate and open the SFTP subsystem described by `config`
pub(crate) async fn establish(config: &SftpConfig) -> Result<SshSession> {
    config.validate()?;

    let key_data = std::fs::read_to_string(&config.key_file).map_err(|e| {
        Error::Credential(format!("read {}: {e}", config.key_file.display()))
    })?;
    let key = decode_secret_key(&key_data, None).map_err(|e| {
        Error::Credential(format!("parse {}: {e}", config.key_file.display()))
    })?;

    let policy = HostKeyPolicy {
        host: config.address.clone(),
        port: config.port,
        verify: config.verify_host_key,
    };

    let ssh_config = Arc::new(client::Config::default());
    let mut handle = client::connect(
        ssh_config,
        (config.address.as_str(), config.port),
        policy,
    )
    .await
    .map_err(|e| Error::Connection(format!("dial {}:{}: {e}", config.address, config.port)))?;

    let hash_alg = handle
        .best_supported_rsa_hash()
        .await
        .map_err(|e| Error::Connection(format!("negotiate rsa hash: {e}")))?
        .flatten();

    let auth = handle
        .authenticate_publickey(
            &config.username,
            PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
        )
        .await
        .map_err(|e| Error::Connection(format!("authenticate {}: {e}", config.username)))?;
    if !auth.success() {
        return Err(Error::Credential(format!(
            "server rejected public key for {}",
            config.username
        )));
    }

    let channel = handle
        .channel_open_session()
        .await
        .map_err(|e| Error::Connection(format!("open channel: {e}")))?;
    channel
        .request_subsystem(true, "sftp")
        .await
        .map_err(|e| Error::Connection(format!("request sftp subsystem: {e}")))?;

    let sftp = SftpSession::new(channel.into_stream())
        .await
        .map_err(|e| Error::Connection(format!("start sftp session: {e}")))?;

    tracing::debug!(
        host = %config.address,
        port = config.port,
        user = %config.username,
        "sftp session established"
    );

    Ok(SshSession { handle, sftp })
}

/// Whether an SFTP error means the addressed entry does not exist
pub(crate) fn is_missing(err: &SftpError) -> bool {
    matches!(err, SftpError::Status(status) if status.status_code == StatusCode::NoSuchFile)
}
