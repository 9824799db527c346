//! RemoteStorage trait definition
//!
//! This trait is the full contract a storage backend exposes to the
//! backup/restore pipeline. It keeps the pipeline decoupled from any
//! particular transport so backends remain interchangeable behind
//! `Box<dyn RemoteStorage>` / `Arc<dyn RemoteStorage>`.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::Result;
use crate::remote::RemoteFile;

/// Owned byte stream handed out by [`RemoteStorage::get_file_reader`].
///
/// The caller owns the stream and must drop it to release the remote handle.
pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;

/// Callback invoked once per entry during [`RemoteStorage::walk`].
///
/// Returning an error aborts the walk immediately; the error is handed back
/// to the walk caller unchanged.
pub type WalkVisitor<'a> = &'a mut (dyn FnMut(RemoteFile) -> Result<()> + Send);

/// Trait for remote storage backends
///
/// One logical session per backend: call [`connect`](Self::connect) once,
/// then issue any number of operations against it. Operations are sequential;
/// the backend is not designed for interleaved invocation without external
/// synchronization. No operation retries internally: transient failures
/// surface immediately and retry policy belongs to the caller.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Establish the transport session. Must be called before any other
    /// operation; calling it again replaces the previous session.
    async fn connect(&mut self) -> Result<()>;

    /// Close the transport session. Subsequent operations fail until
    /// [`connect`](Self::connect) is called again.
    async fn disconnect(&mut self) -> Result<()>;

    /// Fixed identifier for this backend type
    fn kind(&self) -> &'static str;

    /// Stat a single remote entry addressed by key
    async fn stat_file(&self, key: &str) -> Result<RemoteFile>;

    /// Delete the entry addressed by key; directories are removed
    /// recursively. Deleting a missing key is an error.
    async fn delete_file(&self, key: &str) -> Result<()>;

    /// Visit entries under `sub_path`.
    ///
    /// Flat mode lists immediate children with their raw entry names.
    /// Recursive mode traverses the subtree depth-first, yielding both files
    /// and directories with names relative to the walk root.
    async fn walk(&self, sub_path: &str, recursive: bool, visit: WalkVisitor<'_>) -> Result<()>;

    /// Open the remote object at key for reading
    async fn get_file_reader(&self, key: &str) -> Result<ByteReader>;

    /// Write the whole of `source` to the object at key, creating parent
    /// directories as needed and truncating any existing object.
    async fn put_file(
        &self,
        key: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()>;
}
