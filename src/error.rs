use std::io;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed as TimeElapsed;

pub type Result<T> = std::result::Result<T, Error>;

/// Enum for client errors
#[derive(Debug, Error)]
pub enum Error {
    /// The protocol tag is not one of the recognized ones
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),
    /// The server rejected the supplied credentials
    #[error("authentication failed")]
    AuthenticationFailed,
    /// Time limit for establishing the connection exceeded
    #[error("connect timeout")]
    Timeout,
    /// Any errors related to local I/O
    #[error("I/O: {0}")]
    Io(#[from] io::Error),
    /// SSH transport failure, surfaced unwrapped
    #[error(transparent)]
    Ssh(#[from] russh::Error),
    /// SFTP subsystem failure, surfaced unwrapped
    #[error(transparent)]
    Sftp(#[from] russh_sftp::client::error::Error),
    /// FTP failure, surfaced unwrapped
    #[error(transparent)]
    Ftp(#[from] suppaftp::FtpError),
    /// Opening the local file for writing failed
    #[error("local file [{0}]: stream creation failed")]
    LocalStream(String),
    /// Opening the remote file for reading failed
    #[error("remote file [{0}]: stream creation failed")]
    RemoteStream(String),
    /// Transferring remote bytes into the local file failed
    #[error("local file [{0}]: write failed")]
    LocalWrite(String),
    /// The caller dropped the receiving half of the entry channel mid-retrieval
    #[error("entry channel closed before retrieval finished")]
    ChannelClosed,
    /// Occurs when behavior differs from what the backend guarantees
    #[error("{0}")]
    UnexpectedBehavior(String),
}

impl From<TimeElapsed> for Error {
    fn from(_: TimeElapsed) -> Self {
        Self::Timeout
    }
}

impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        Self::UnexpectedBehavior(format!("blocking task failed: {}", err))
    }
}
