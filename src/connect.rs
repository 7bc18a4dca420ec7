//! Transport setup for local and remote servers
//!
//! The engine itself only wants a readable and a writable half of a byte
//! stream. This module supplies the usual pair: the stdio of a locally
//! spawned sftp-server, or of ssh running the sftp subsystem on a remote
//! host. Which one is picked follows the `host:path` convention: a target
//! that does not start with `/`, `.` or `~` and contains a colon is remote.

use std::process::Stdio;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::info;

use crate::client::Client;
use crate::error::{ClientError, ConnectionError};

/// Stock OpenSSH server binary location on Debian-family systems
pub const DEFAULT_SERVER_CMD: &str = "/usr/lib/openssh/sftp-server";

/// Where a target string points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
	Local { path: String },
	Remote { host: String, path: String },
}

impl Location {
	/// Detect the location kind from a `[host:]path` target string
	pub fn detect(target: &str) -> Self {
		let looks_local =
			target.starts_with('/') || target.starts_with('.') || target.starts_with('~');
		if !looks_local {
			if let Some(colon) = target.find(':') {
				return Location::Remote {
					host: target[..colon].to_string(),
					path: target[colon + 1..].to_string(),
				};
			}
		}
		Location::Local { path: target.to_string() }
	}

	/// The path component, wherever it lives
	pub fn path(&self) -> &str {
		match self {
			Location::Local { path } => path,
			Location::Remote { path, .. } => path,
		}
	}

	pub fn is_remote(&self) -> bool {
		matches!(self, Location::Remote { .. })
	}
}

/// Keeps the spawned transport subprocess alive for the life of the
/// connection. Dropping it does not kill the child; call `wait` after
/// closing the client, or `kill` to tear it down early.
pub struct ServerProcess {
	child: Child,
}

impl ServerProcess {
	pub async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
		self.child.wait().await
	}

	pub async fn kill(&mut self) -> std::io::Result<()> {
		self.child.kill().await
	}
}

fn take_stdio(child: &mut Child) -> Result<(ChildStdout, ChildStdin), ConnectionError> {
	let stdin = child
		.stdin
		.take()
		.ok_or(ConnectionError::StdioUnavailable { what: "stdin".to_string() })?;
	let stdout = child
		.stdout
		.take()
		.ok_or(ConnectionError::StdioUnavailable { what: "stdout".to_string() })?;
	Ok((stdout, stdin))
}

/// Spawn an sftp-server binary locally and hand back its stdio halves.
/// `-e` keeps the server's log on stderr, leaving stdout to the protocol;
/// extra flags (`-R` for read-only, `-l LEVEL` for logging) pass through.
pub fn spawn_server(
	server_cmd: &str,
	extra_args: &[&str],
) -> Result<(ChildStdout, ChildStdin, ServerProcess), ConnectionError> {
	let mut child = Command::new(server_cmd)
		.arg("-e")
		.args(extra_args)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.spawn()
		.map_err(|e| ConnectionError::SpawnFailed { cmd: server_cmd.to_string(), source: e })?;
	let (stdout, stdin) = take_stdio(&mut child)?;
	Ok((stdout, stdin, ServerProcess { child }))
}

/// Spawn a read-write local server with default flags
pub fn spawn_local(server_cmd: &str) -> Result<(ChildStdout, ChildStdin, ServerProcess), ConnectionError> {
	spawn_server(server_cmd, &[])
}

/// Spawn ssh with the sftp subsystem on a remote host
pub fn spawn_remote(host: &str) -> Result<(ChildStdout, ChildStdin, ServerProcess), ConnectionError> {
	let mut child = Command::new("ssh")
		.arg(host)
		.arg("-s")
		.arg("sftp")
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.spawn()
		.map_err(|e| ConnectionError::SpawnFailed { cmd: format!("ssh {}", host), source: e })?;
	let (stdout, stdin) = take_stdio(&mut child)?;
	Ok((stdout, stdin, ServerProcess { child }))
}

/// Spawn the right transport for a location and complete the handshake
pub async fn open_location(
	location: &Location,
	server_cmd: &str,
) -> Result<(Client, ServerProcess), ClientError> {
	let (stdout, stdin, process) = match location {
		Location::Remote { host, .. } => {
			info!("connecting to {} over ssh", host);
			spawn_remote(host)?
		}
		Location::Local { .. } => spawn_local(server_cmd)?,
	};
	let client = Client::handshake(stdout, stdin).await?;
	Ok((client, process))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_detect_remote() {
		let loc = Location::detect("host.example.com:/srv/data");
		assert_eq!(
			loc,
			Location::Remote {
				host: "host.example.com".to_string(),
				path: "/srv/data".to_string()
			}
		);
		assert!(loc.is_remote());
	}

	#[test]
	fn test_detect_local_absolute() {
		assert_eq!(
			Location::detect("/var/tmp"),
			Location::Local { path: "/var/tmp".to_string() }
		);
	}

	#[test]
	fn test_detect_local_relative() {
		assert!(!Location::detect("./has:colon").is_remote());
		assert!(!Location::detect("~/has:colon").is_remote());
	}

	#[test]
	fn test_detect_bare_name_is_local() {
		assert_eq!(
			Location::detect("plain_dir"),
			Location::Local { path: "plain_dir".to_string() }
		);
	}

	#[test]
	fn test_path_accessor() {
		assert_eq!(Location::detect("h:/x").path(), "/x");
		assert_eq!(Location::detect("/x").path(), "/x");
	}
}

// vim: ts=4
