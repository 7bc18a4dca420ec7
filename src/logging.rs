//! Logging prelude for convenient access to tracing macros.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! warn!("dropping frame for unknown request id {}", id);
//! debug!("negotiated version {}", version);
//! ```

pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// Logs go to stderr so the protocol can own stdout when the process is
/// itself spoken to over a pipe. INFO and above by default; control with
/// `RUST_LOG`:
///
/// ```bash
/// RUST_LOG=debug sftpr ls host:/srv
/// RUST_LOG=sftpr::protocol=trace sftpr get host:/srv/file
/// ```
pub fn init_tracing() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_writer(std::io::stderr)
		.init();
}
