//! SFTP backend implementation
//!
//! Implements the RemoteStorage trait from rstore-core on top of one SFTP
//! session. Every key the pipeline supplies is resolved against the
//! configured remote root before any wire operation is issued.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::future::BoxFuture;
use jiff::Timestamp;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::{FileAttributes, OpenFlags};
use tokio::io::{AsyncRead, AsyncWriteExt};

use rstore_core::{ByteReader, Error, RemoteFile, RemoteStorage, Result, WalkVisitor, path};

use crate::config::SftpConfig;
use crate::session::{self, SshSession};

/// SFTP storage backend
///
/// Construct with [`SftpBackend::new`], call
/// [`connect`](RemoteStorage::connect) once, then issue operations against
/// the single session. Dropping the backend drops the connection;
/// [`disconnect`](RemoteStorage::disconnect) closes it explicitly.
pub struct SftpBackend {
    config: SftpConfig,
    session: Option<SshSession>,
    /// Remote directories confirmed to exist, so repeated writes into the
    /// same directory skip the mkdir chain.
    dir_cache: Mutex<HashSet<String>>,
}

impl SftpBackend {
    /// Create an unconnected backend from configuration
    pub fn new(config: SftpConfig) -> Self {
        Self {
            config,
            session: None,
            dir_cache: Mutex::new(HashSet::new()),
        }
    }

    fn sftp(&self) -> Result<&SftpSession> {
        self.session
            .as_ref()
            .map(SshSession::sftp)
            .ok_or_else(|| Error::Connection("not connected".into()))
    }

    fn resolve(&self, key: &str) -> String {
        path::join(&self.config.root_path, key)
    }

    fn remote_file(attrs: &FileAttributes, name: impl Into<String>) -> RemoteFile {
        let modified = attrs
            .mtime
            .and_then(|secs| Timestamp::from_second(i64::from(secs)).ok());
        RemoteFile::new(attrs.size.unwrap_or(0), modified, name)
    }

    fn dir_confirmed(&self, dir: &str) -> bool {
        self.dir_cache
            .lock()
            .map(|cache| cache.contains(dir))
            .unwrap_or(false)
    }

    fn confirm_dir(&self, dir: &str) {
        if let Ok(mut cache) = self.dir_cache.lock() {
            cache.insert(dir.to_string());
        }
    }

    fn forget_dir(&self, dir: &str) {
        if let Ok(mut cache) = self.dir_cache.lock() {
            cache.remove(dir);
        }
    }

    /// Create the directory chain above `file_path`, memoizing directories
    /// already confirmed.
    ///
    /// Failures are logged and swallowed: the open or create that follows
    /// reports the authoritative error for the write path.
    async fn ensure_parent_dirs(&self, sftp: &SftpSession, file_path: &str) {
        let dir = path::parent(file_path);
        if dir == "." || dir == "/" || self.dir_confirmed(&dir) {
            return;
        }

        let mut prefix = if dir.starts_with('/') {
            "/".to_string()
        } else {
            String::new()
        };
        for segment in dir.split('/').filter(|s| !s.is_empty()) {
            prefix = path::join(&prefix, segment);
            if self.dir_confirmed(&prefix) {
                continue;
            }
            if sftp.metadata(prefix.as_str()).await.is_ok() {
                self.confirm_dir(&prefix);
                continue;
            }
            match sftp.create_dir(prefix.as_str()).await {
                Ok(()) => self.confirm_dir(&prefix),
                Err(e) => {
                    tracing::debug!(dir = %prefix, error = %e, "mkdir failed, deferring to the open that follows");
                }
            }
        }
    }

    /// Best-effort recursive delete.
    ///
    /// Collects the subtree first, then executes every removal even when
    /// collection or an earlier removal already failed: files go first, then
    /// directories children-before-parents, the top directory last. The
    /// first error recorded is returned; entries discovered before a listing
    /// failure are still removed.
    async fn delete_directory(&self, dir_path: &str) -> Result<()> {
        let sftp = self.sftp()?;

        let mut first_err: Option<Error> = None;
        let mut files: Vec<String> = Vec::new();
        let mut dirs: Vec<String> = Vec::new();
        let mut pending = vec![dir_path.to_string()];

        while let Some(dir) = pending.pop() {
            dirs.push(dir.clone());
            match sftp.read_dir(dir.as_str()).await {
                Ok(entries) => {
                    for entry in entries {
                        let name = entry.file_name();
                        if name == "." || name == ".." {
                            continue;
                        }
                        let entry_path = path::join(&dir, &name);
                        if entry.metadata().is_dir() {
                            pending.push(entry_path);
                        } else {
                            files.push(entry_path);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(dir = %dir, error = %e, "listing failed, removing entries already discovered");
                    first_err.get_or_insert(Error::Delete(format!("list {dir}: {e}")));
                }
            }
        }

        for file in &files {
            if let Err(e) = sftp.remove_file(file.as_str()).await {
                first_err.get_or_insert(Error::Delete(format!("remove {file}: {e}")));
            }
        }
        // dirs is in parent-before-child order; remove deepest first
        for dir in dirs.iter().rev() {
            if let Err(e) = sftp.remove_dir(dir.as_str()).await {
                first_err.get_or_insert(Error::Delete(format!("rmdir {dir}: {e}")));
            }
            self.forget_dir(dir);
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Depth-first traversal under `current`, yielding each entry to `visit`
/// with its path relative to `root`. Directories are yielded before being
/// descended into; entry order within a directory is the server's listing
/// order.
fn walk_dir<'a>(
    sftp: &'a SftpSession,
    root: &'a str,
    current: String,
    visit: &'a mut (dyn FnMut(RemoteFile) -> Result<()> + Send),
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let entries = sftp
            .read_dir(current.as_str())
            .await
            .map_err(|e| Error::Walk(format!("list {current}: {e}")))?;

        for entry in entries {
            let name = entry.file_name();
            if name == "." || name == ".." {
                continue;
            }
            let entry_path = path::join(&current, &name);
            let attrs = entry.metadata();
            visit(SftpBackend::remote_file(
                &attrs,
                path::relative_to(root, &entry_path),
            ))?;
            if attrs.is_dir() {
                walk_dir(sftp, root, entry_path, &mut *visit).await?;
            }
        }
        Ok(())
    })
}

#[async_trait]
impl RemoteStorage for SftpBackend {
    async fn connect(&mut self) -> Result<()> {
        let session = session::establish(&self.config).await?;
        if let Some(old) = self.session.replace(session) {
            if let Err(e) = old.close().await {
                tracing::debug!(error = %e, "closing replaced session failed");
            }
        }
        if let Ok(mut cache) = self.dir_cache.lock() {
            cache.clear();
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }

    fn kind(&self) -> &'static str {
        "SFTP"
    }

    async fn stat_file(&self, key: &str) -> Result<RemoteFile> {
        let sftp = self.sftp()?;
        let file_path = self.resolve(key);

        let attrs = sftp.metadata(file_path.as_str()).await.map_err(|e| {
            if session::is_missing(&e) {
                Error::NotFound(file_path.clone())
            } else {
                Error::Stat(format!("{file_path}: {e}"))
            }
        })?;

        Ok(Self::remote_file(&attrs, path::base_name(&file_path)))
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        let sftp = self.sftp()?;
        let file_path = self.resolve(key);

        // Missing keys are an error, not an idempotent success
        let attrs = sftp.metadata(file_path.as_str()).await.map_err(|e| {
            if session::is_missing(&e) {
                Error::NotFound(file_path.clone())
            } else {
                Error::Delete(format!("{file_path}: {e}"))
            }
        })?;

        if attrs.is_dir() {
            self.delete_directory(&file_path).await
        } else {
            sftp.remove_file(file_path.as_str())
                .await
                .map_err(|e| Error::Delete(format!("{file_path}: {e}")))
        }
    }

    async fn walk(&self, sub_path: &str, recursive: bool, visit: WalkVisitor<'_>) -> Result<()> {
        let sftp = self.sftp()?;
        let dir = path::join(&self.config.root_path, sub_path);

        if recursive {
            walk_dir(sftp, &dir, dir.clone(), visit).await
        } else {
            let entries = sftp
                .read_dir(dir.as_str())
                .await
                .map_err(|e| Error::Walk(format!("list {dir}: {e}")))?;
            for entry in entries {
                let name = entry.file_name();
                if name == "." || name == ".." {
                    continue;
                }
                visit(Self::remote_file(&entry.metadata(), name))?;
            }
            Ok(())
        }
    }

    async fn get_file_reader(&self, key: &str) -> Result<ByteReader> {
        let sftp = self.sftp()?;
        let file_path = self.resolve(key);

        self.ensure_parent_dirs(sftp, &file_path).await;

        let file = sftp
            .open_with_flags(file_path.as_str(), OpenFlags::READ | OpenFlags::WRITE)
            .await
            .map_err(|e| {
                if session::is_missing(&e) {
                    Error::NotFound(file_path.clone())
                } else {
                    Error::Open(format!("{file_path}: {e}"))
                }
            })?;

        Ok(Box::new(file))
    }

    async fn put_file(
        &self,
        key: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()> {
        let sftp = self.sftp()?;
        let file_path = self.resolve(key);

        self.ensure_parent_dirs(sftp, &file_path).await;

        let mut remote = sftp
            .create(file_path.as_str())
            .await
            .map_err(|e| Error::Create(format!("{file_path}: {e}")))?;

        // Close the remote handle on both exit paths before reporting
        let copied = tokio::io::copy(source, &mut remote).await;
        let closed = remote.shutdown().await;

        copied.map_err(|e| Error::Copy(format!("{file_path}: {e}")))?;
        closed.map_err(|e| Error::Copy(format!("close {file_path}: {e}")))?;
        Ok(())
    }
}
