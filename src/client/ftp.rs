use std::io;
use std::net::ToSocketAddrs;

use suppaftp::{list, types::FileType, FtpStream};
use tokio::task;

use super::{Connection, ListedEntry, CONNECT_TIMEOUT};
use crate::error::{Error, Result};

/// FTP-backed connection.
///
/// `suppaftp`'s stream is synchronous, so every protocol interaction runs on
/// the blocking pool; the stream is moved into the task and put back
/// afterwards. Directory listings come from `LIST` lines parsed by
/// [`suppaftp::list::File`], and retrieval fuses the remote open with the
/// copy into the local file.
pub(crate) struct FtpConnection {
    stream: Option<FtpStream>,
}

impl FtpConnection {
    pub async fn dial(host: &str, port: u16, user: &str, password: &str) -> Result<Self> {
        let endpoint = format!("{}:{}", host, port);
        let user = user.to_owned();
        let password = password.to_owned();

        let stream = task::spawn_blocking(move || -> Result<FtpStream> {
            let addr = endpoint.to_socket_addrs()?.next().ok_or_else(|| {
                Error::UnexpectedBehavior(format!("no address resolved for {}", endpoint))
            })?;

            let mut stream = FtpStream::connect_timeout(addr, CONNECT_TIMEOUT)?;
            stream.login(&user, &password)?;
            stream.transfer_type(FileType::Binary)?;
            Ok(stream)
        })
        .await??;

        Ok(Self {
            stream: Some(stream),
        })
    }

    /// Runs one blocking operation against the stream on the blocking pool.
    async fn with_stream<T, F>(&mut self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> Result<T> + Send + 'static,
    {
        let mut stream = self.stream.take().ok_or_else(|| {
            Error::UnexpectedBehavior("ftp stream lost by an earlier panic".to_owned())
        })?;

        let (stream, result) = task::spawn_blocking(move || {
            let result = op(&mut stream);
            (stream, result)
        })
        .await?;

        self.stream = Some(stream);
        result
    }
}

#[async_trait]
impl Connection for FtpConnection {
    async fn list_dir(&mut self, full_path: &str) -> Result<Vec<ListedEntry>> {
        let path = full_path.to_owned();
        let lines = self
            .with_stream(move |stream| Ok(stream.list(Some(&path))?))
            .await?;

        let mut entries = Vec::with_capacity(lines.len());
        for line in lines {
            let file = list::File::try_from(line.as_str()).map_err(|err| {
                Error::UnexpectedBehavior(format!("unparsable LIST line [{}]: {}", line, err))
            })?;
            if file.name() == "." || file.name() == ".." {
                continue;
            }
            entries.push(ListedEntry {
                name: file.name().to_owned(),
                is_dir: file.is_directory(),
            });
        }
        Ok(entries)
    }

    async fn retrieve(&mut self, remote_path: &str, local: tokio::fs::File) -> Result<()> {
        let remote = remote_path.to_owned();
        let mut local = local.into_std().await;

        self.with_stream(move |stream| {
            let mut data = stream.retr_as_stream(&remote)?;
            let copied = io::copy(&mut data, &mut local);
            // finalize even when the copy failed, otherwise the control
            // connection is stuck mid-RETR for every later call
            let finalized = stream.finalize_retr_stream(data);
            let _ = copied?;
            finalized?;
            Ok(())
        })
        .await
    }

    async fn close(&mut self) -> Result<()> {
        self.with_stream(|stream| Ok(stream.quit()?)).await
    }
}
