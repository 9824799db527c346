//! rstore-sftp: SFTP storage backend for remote-store
//!
//! This crate implements the `RemoteStorage` trait from rstore-core over an
//! SSH/SFTP session, using russh for the transport and russh-sftp for the
//! file-transfer subsystem. It is the only crate that depends on either.

pub mod backend;
pub mod config;
mod session;

pub use backend::SftpBackend;
pub use config::SftpConfig;
