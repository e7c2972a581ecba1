use std::sync::Arc;

use russh::client::{self, Config, Handle};
use russh::Disconnect;
use russh_sftp::client::SftpSession;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use super::{Connection, ListedEntry, CONNECT_TIMEOUT};
use crate::error::{Error, Result};

/// Accepts any host key. Inherited reference behavior, a documented security
/// non-goal of this client.
struct InsecureHandler;

#[async_trait]
impl client::Handler for InsecureHandler {
    type Error = Error;

    async fn check_server_key(
        self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> std::result::Result<(Self, bool), Self::Error> {
        Ok((self, true))
    }
}

/// SFTP-backed connection: an SSH session from `russh` carrying the `sftp`
/// subsystem, driven through `russh-sftp`'s [`SftpSession`].
pub(crate) struct SftpConnection {
    session: SftpSession,
    // Dropping the handle tears down the SSH connection, keep it alive.
    handle: Handle<InsecureHandler>,
}

impl SftpConnection {
    pub async fn dial(host: &str, port: u16, user: &str, password: &str) -> Result<Self> {
        let config = Arc::new(Config::default());
        let mut handle = timeout(
            CONNECT_TIMEOUT,
            client::connect(config, (host, port), InsecureHandler),
        )
        .await??;

        if !handle.authenticate_password(user, password).await? {
            return Err(Error::AuthenticationFailed);
        }

        let channel = handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let session = SftpSession::new(channel.into_stream()).await?;

        Ok(Self { session, handle })
    }
}

#[async_trait]
impl Connection for SftpConnection {
    async fn list_dir(&mut self, full_path: &str) -> Result<Vec<ListedEntry>> {
        let dir = self.session.read_dir(full_path).await?;
        Ok(dir
            .map(|entry| ListedEntry {
                name: entry.file_name(),
                is_dir: entry.metadata().is_dir(),
            })
            .collect())
    }

    async fn retrieve(&mut self, remote_path: &str, mut local: tokio::fs::File) -> Result<()> {
        let mut remote = self.session.open(remote_path).await.map_err(|err| {
            error!("remote file [{}] open failed: {}", remote_path, err);
            Error::RemoteStream(remote_path.to_owned())
        })?;

        let _ = tokio::io::copy(&mut remote, &mut local).await?;
        local.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.session.close().await?;
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await?;
        Ok(())
    }
}
