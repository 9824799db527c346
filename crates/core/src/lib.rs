//! rstore-core: contract shared by remote-store storage backends
//!
//! This crate provides everything a backup/restore pipeline needs to talk to
//! a storage backend without knowing which one it is:
//! - The `RemoteStorage` trait (connect, stat, walk, read, write, delete)
//! - The `RemoteFile` metadata snapshot
//! - Remote path joining and relativization
//!
//! This crate is independent of any transport SDK; concrete backends such as
//! rstore-sftp implement the trait on top of their own wire libraries.

pub mod error;
pub mod path;
pub mod remote;
pub mod traits;

pub use error::{Error, Result};
pub use remote::RemoteFile;
pub use traits::{ByteReader, RemoteStorage, WalkVisitor};
