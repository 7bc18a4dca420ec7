//! # sftpr - Async SFTP Client
//!
//! sftpr speaks the SFTP version 3 protocol over any duplex byte stream,
//! typically the stdio of a spawned sftp-server or ssh subprocess. One
//! connection carries any number of concurrent requests; each caller gets
//! exactly the response matching its own request id.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sftpr::connect::{open_location, Location, DEFAULT_SERVER_CMD};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let location = Location::detect("backup@host:/srv/data");
//!     let (client, mut server) = open_location(&location, DEFAULT_SERVER_CMD).await?;
//!
//!     let attrs = client.lstat(location.path()).await?;
//!     println!("{} bytes", attrs.size.unwrap_or(0));
//!
//!     client.close().await;
//!     server.wait().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Bring Your Own Stream
//!
//! ```rust,ignore
//! use sftpr::Client;
//!
//! // any (AsyncRead, AsyncWrite) pair works; the engine never spawns
//! // or configures the remote end itself
//! let client = Client::handshake(reader, writer).await?;
//! ```

pub mod client;
pub mod connect;
pub mod error;
pub mod file;
pub mod logging;
pub mod protocol;
pub mod walk;

// Re-export commonly used types
pub use client::Client;
pub use error::{ClientError, ConnectionError, StatusCode, StatusError};
pub use file::{DirEntry, RemoteDir, RemoteFile};
pub use protocol::{FileAttributes, OpenFlags};
pub use walk::{walk, WalkOptions, WalkReport, WalkSource};

// vim: ts=4
