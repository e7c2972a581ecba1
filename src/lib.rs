//! Unified client for retrieving and downloading files over FTP and SFTP.
//!
//! Both protocols are exposed through a single [`Client`] type: recursive
//! directory retrieval streams discovered entries over a channel, and
//! download copies a remote file byte-for-byte into a local one. The protocol
//! backends are consumed as opaque connections (`russh`/`russh-sftp` for
//! SFTP, `suppaftp` for FTP); this crate only adds the shared traversal,
//! path-resolution and rollback semantics on top.
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use transfetch::{Client, Protocol};
//!
//! # async fn example() -> Result<(), transfetch::Error> {
//! let mut client = Client::build(Protocol::Sftp, "localhost", 22, "user", "pass").await?;
//! client.set_filter_file_extends(["log"]);
//!
//! let (tx, mut rx) = mpsc::channel(64);
//! let consumer = tokio::spawn(async move {
//!     while let Some(entry) = rx.recv().await {
//!         println!("{:?}", entry);
//!     }
//! });
//!
//! client.retrieve_all("reports", &tx).await?;
//! drop(tx);
//! consumer.await.unwrap();
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;

/// Client side
pub mod client;
mod entry;
mod error;
mod utils;

pub use client::Client;
pub use entry::RemoteEntry;
pub use error::{Error, Result};

use std::{fmt, str::FromStr};

/// Tag selecting the protocol a [`Client`] is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Ftp,
    Sftp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ftp => f.write_str("ftp"),
            Self::Sftp => f.write_str("sftp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ftp" => Ok(Self::Ftp),
            "sftp" => Ok(Self::Sftp),
            other => Err(Error::UnsupportedProtocol(other.to_owned())),
        }
    }
}
