//! Protocol-independent client core.
//!
//! The two backends differ only in how they talk to the remote side, so the
//! retrieval and download algorithms are written once against the small
//! [`Connection`] capability trait and the backends stay thin.

mod ftp;
mod sftp;

use std::{future::Future, pin::Pin, time::Duration};
use tokio::sync::mpsc;

use crate::{
    entry::RemoteEntry,
    error::{Error, Result},
    utils, Protocol,
};

/// A single connection attempt, no retries.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One record of a remote directory listing.
#[derive(Debug, Clone)]
pub(crate) struct ListedEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Capability surface a protocol backend provides: list one remote directory
/// and stream one remote file into an already opened local one.
#[async_trait]
pub(crate) trait Connection: Send {
    async fn list_dir(&mut self, full_path: &str) -> Result<Vec<ListedEntry>>;

    /// Streams the remote file into `local`. Implementations return
    /// [`Error::RemoteStream`] when they can distinguish a remote-open
    /// failure from a transfer failure.
    async fn retrieve(&mut self, remote_path: &str, local: tokio::fs::File) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Unified FTP/SFTP client.
///
/// A client exclusively owns one connection for its whole lifetime. Calls
/// take `&mut self`, so a single instance cannot run overlapping operations;
/// configuration may be changed freely between calls.
pub struct Client {
    connection: Box<dyn Connection>,
    protocol: Protocol,
    /// Root of the remote tree. Empty means relative paths are remote-absolute.
    remote_boot_dir: String,
    /// Root of the mirrored local tree. Empty means working-directory relative.
    local_boot_dir: String,
    /// Create local directories as their remote counterparts are discovered.
    create_absent_parent: bool,
    /// Extension allow-list. Empty means every file is emitted.
    filter_file_extends: Vec<String>,
}

impl Client {
    /// Dials the remote endpoint over the selected protocol and wraps the
    /// connection in a client with default configuration.
    ///
    /// One connection attempt with a fixed 10 second timeout; dial and
    /// handshake failures surface unwrapped.
    pub async fn build(
        protocol: Protocol,
        host: &str,
        port: u16,
        user: &str,
        password: &str,
    ) -> Result<Self> {
        let connection: Box<dyn Connection> = match protocol {
            Protocol::Ftp => Box::new(ftp::FtpConnection::dial(host, port, user, password).await?),
            Protocol::Sftp => {
                Box::new(sftp::SftpConnection::dial(host, port, user, password).await?)
            }
        };
        debug!("{} client connected to {}:{}", protocol, host, port);

        Ok(Self::with_connection(protocol, connection))
    }

    fn with_connection(protocol: Protocol, connection: Box<dyn Connection>) -> Self {
        Self {
            connection,
            protocol,
            remote_boot_dir: String::new(),
            local_boot_dir: String::new(),
            create_absent_parent: true,
            filter_file_extends: Vec::new(),
        }
    }

    /// Protocol the connection was built with.
    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Sets the root directory of the remote file store.
    pub fn set_remote_boot_dir<T: Into<String>>(&mut self, path: T) {
        self.remote_boot_dir = path.into();
    }

    /// Sets the root directory of the local file store.
    pub fn set_local_boot_dir<T: Into<String>>(&mut self, path: T) {
        self.local_boot_dir = path.into();
    }

    /// Sets whether retrieval creates local directories for discovered
    /// remote ones.
    pub fn set_create_absent_parent(&mut self, create: bool) {
        self.create_absent_parent = create;
    }

    /// Sets the extension allow-list applied to remote files, extension
    /// names without the leading dot. An empty list emits every file.
    pub fn set_filter_file_extends<I, T>(&mut self, extends: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.filter_file_extends = extends.into_iter().map(Into::into).collect();
    }

    /// Recursively retrieves every directory and file under
    /// `relative_dir_path` (resolved against the remote boot directory) and
    /// emits each discovered entry on `tx`, depth-first and pre-order: a
    /// directory is emitted before its contents are explored and before its
    /// following siblings.
    ///
    /// The caller owns the channel and must drain the receiving half
    /// concurrently; with a bounded channel a full buffer blocks the
    /// traversal until the caller catches up. Keep the receiver alive until
    /// this call returns, dropping it mid-retrieval is reported as
    /// [`Error::ChannelClosed`].
    ///
    /// The first failing listing, local directory creation or send aborts
    /// the traversal without visiting further siblings. Entries already
    /// emitted stay on the channel and already created local directories
    /// are kept.
    ///
    /// Symbolic-link cycles are not detected; both backends report links as
    /// non-directories, so a cycle is only reachable when the server itself
    /// dereferences links in listings.
    pub async fn retrieve_all(
        &mut self,
        relative_dir_path: &str,
        tx: &mpsc::Sender<RemoteEntry>,
    ) -> Result<()> {
        self.retrieve_dir(relative_dir_path.to_owned(), tx).await
    }

    fn retrieve_dir<'a>(
        &'a mut self,
        relative_dir_path: String,
        tx: &'a mpsc::Sender<RemoteEntry>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let full_path = utils::remote_full_path(&self.remote_boot_dir, &relative_dir_path);
            let listed = self.connection.list_dir(&full_path).await?;

            let check_ext = !self.filter_file_extends.is_empty();
            for entry in listed {
                if entry.is_dir {
                    tx.send(RemoteEntry::new(
                        entry.name.clone(),
                        relative_dir_path.clone(),
                        false,
                    ))
                    .await
                    .map_err(|_| Error::ChannelClosed)?;

                    if self.create_absent_parent {
                        let local_dir = utils::local_dir_path(
                            &self.local_boot_dir,
                            &relative_dir_path,
                            &entry.name,
                        );
                        utils::ensure_dir(&local_dir).await?;
                    }

                    let child = utils::child_relative_path(&relative_dir_path, &entry.name);
                    self.retrieve_dir(child, tx).await?;
                } else if !check_ext
                    || utils::matches_extension(&entry.name, &self.filter_file_extends)
                {
                    tx.send(RemoteEntry::new(entry.name, relative_dir_path.clone(), true))
                        .await
                        .map_err(|_| Error::ChannelClosed)?;
                }
            }

            Ok(())
        })
    }

    /// Downloads one remote file into `local_file_path`, byte for byte.
    ///
    /// The local file is opened read-write-create before any remote
    /// interaction; an open failure is reported as [`Error::LocalStream`].
    /// If the transfer fails after the local file was created, the file is
    /// deleted again (best effort, a failed deletion is only logged) and the
    /// result is either [`Error::RemoteStream`] for a distinct remote-open
    /// failure or [`Error::LocalWrite`]. A finished download therefore
    /// leaves either a fully written local file or none at all.
    pub async fn download(&mut self, remote_file_path: &str, local_file_path: &str) -> Result<()> {
        let local = open_local(local_file_path).await?;

        match self.connection.retrieve(remote_file_path, local).await {
            Ok(()) => Ok(()),
            Err(err) => {
                error!("download of remote file [{}] failed: {}", remote_file_path, err);
                if let Err(remove_err) = tokio::fs::remove_file(local_file_path).await {
                    error!(
                        "local file [{}] rollback failed: {}",
                        local_file_path, remove_err
                    );
                }
                match err {
                    Error::RemoteStream(_) => Err(err),
                    _ => Err(Error::LocalWrite(local_file_path.to_owned())),
                }
            }
        }
    }

    /// Closes the connection gracefully. Dropping the client tears the
    /// connection down as well, without the protocol-level goodbye.
    pub async fn close(mut self) -> Result<()> {
        self.connection.close().await
    }
}

async fn open_local(local_file_path: &str) -> Result<tokio::fs::File> {
    let mut options = tokio::fs::OpenOptions::new();
    let _ = options.read(true).write(true).create(true);
    #[cfg(unix)]
    let _ = options.mode(0o755);

    options.open(local_file_path).await.map_err(|err| {
        error!("local file [{}] open failed: {}", local_file_path, err);
        Error::LocalStream(local_file_path.to_owned())
    })
}


#[cfg(test)]
mod test_download {
    use std::io;
    use tokio::io::AsyncWriteExt;

    use super::*;

    /// Scripted remote file: `content == None` fails the remote open,
    /// `fail_after_write` drops the transfer after the payload was written,
    /// `unlink_local` removes the local file mid-transfer so the client's
    /// own rollback deletion has nothing left to delete.
    struct ScriptedPayload {
        content: Option<Vec<u8>>,
        fail_after_write: bool,
        unlink_local: Option<String>,
    }

    #[async_trait]
    impl Connection for ScriptedPayload {
        async fn list_dir(&mut self, _full_path: &str) -> Result<Vec<ListedEntry>> {
            unreachable!("download tests never list")
        }

        async fn retrieve(&mut self, remote_path: &str, mut local: tokio::fs::File) -> Result<()> {
            let Some(content) = self.content.as_deref() else {
                return Err(Error::RemoteStream(remote_path.to_owned()));
            };

            local.write_all(content).await?;
            local.flush().await?;

            if let Some(path) = &self.unlink_local {
                tokio::fs::remove_file(path).await.unwrap();
            }
            if self.fail_after_write {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "connection reset",
                )));
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn client(payload: ScriptedPayload) -> Client {
        Client::with_connection(Protocol::Ftp, Box::new(payload))
    }

    #[tokio::test]
    async fn test_round_trip_is_byte_identical() {
        let content = b"no longer, mr. nice guy\n".to_vec();
        let mut client = client(ScriptedPayload {
            content: Some(content.clone()),
            fail_after_write: false,
            unlink_local: None,
        });

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("out.bin");
        let local = local.to_str().unwrap();

        client.download("remote/out.bin", local).await.unwrap();

        let written = std::fs::read(local).unwrap();
        assert_eq!(written, content);
        assert_eq!(written.len() as u64, content.len() as u64);
    }

    #[tokio::test]
    async fn test_transfer_failure_rolls_the_local_file_back() {
        let mut client = client(ScriptedPayload {
            content: Some(b"partial".to_vec()),
            fail_after_write: true,
            unlink_local: None,
        });

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("partial.bin");

        let err = client
            .download("remote/partial.bin", local.to_str().unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LocalWrite(path) if path == local.to_str().unwrap()));
        assert!(!local.exists());
    }

    #[tokio::test]
    async fn test_failed_rollback_deletion_keeps_the_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("gone.bin");

        // the connection unlinks the local file before failing, so the
        // rollback deletion itself fails; the write error must still win
        let mut client = client(ScriptedPayload {
            content: Some(b"gone".to_vec()),
            fail_after_write: true,
            unlink_local: Some(local.to_str().unwrap().to_owned()),
        });

        let err = client
            .download("remote/gone.bin", local.to_str().unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LocalWrite(path) if path == local.to_str().unwrap()));
        assert!(!local.exists());
    }

    #[tokio::test]
    async fn test_remote_open_failure_is_distinct_and_rolled_back() {
        let mut client = client(ScriptedPayload {
            content: None,
            fail_after_write: false,
            unlink_local: None,
        });

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("never.bin");

        let err = client
            .download("remote/never.bin", local.to_str().unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RemoteStream(path) if path == "remote/never.bin"));
        assert!(!local.exists());
    }

    #[tokio::test]
    async fn test_local_open_failure_precedes_remote_interaction() {
        let mut client = client(ScriptedPayload {
            content: Some(b"unreached".to_vec()),
            fail_after_write: false,
            unlink_local: None,
        });

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("missing-parent/out.bin");

        let err = client
            .download("remote/out.bin", local.to_str().unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LocalStream(path) if path == local.to_str().unwrap()));
        assert!(!local.exists());
    }
}
