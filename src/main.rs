use clap::{Arg, ArgAction, Command};
use futures::StreamExt;
use std::error::Error;
use tokio::io::AsyncWriteExt;

use sftpr::connect::{open_location, Location, ServerProcess, DEFAULT_SERVER_CMD};
use sftpr::logging::init_tracing;
use sftpr::{Client, WalkOptions};

async fn open_target(
	target: &str,
	server_cmd: &str,
) -> Result<(Client, ServerProcess, Location), Box<dyn Error>> {
	let location = Location::detect(target);
	let (client, server) = open_location(&location, server_cmd).await?;
	Ok((client, server, location))
}

async fn finish(client: Client, mut server: ServerProcess) -> Result<(), Box<dyn Error>> {
	client.close().await;
	server.wait().await?;
	Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	init_tracing();

	let matches = Command::new("sftpr")
		.version("0.2.0")
		.about("SFTP client over a spawned sftp-server or ssh subsystem")
		.subcommand_required(true)
		.arg(
			Arg::new("server-cmd")
				.long("server-cmd")
				.value_name("PATH")
				.help("sftp-server binary used for local targets"),
		)
		.subcommand(
			Command::new("ls")
				.about("List a directory")
				.arg(Arg::new("target").required(true))
				.arg(
					Arg::new("long")
						.short('l')
						.long("long")
						.action(ArgAction::SetTrue)
						.help("Show the server's long listing lines"),
				),
		)
		.subcommand(
			Command::new("walk")
				.about("Recursively list a tree")
				.arg(Arg::new("target").required(true))
				.arg(
					Arg::new("fail-fast")
						.long("fail-fast")
						.action(ArgAction::SetTrue)
						.help("Stop at the first unreadable subtree"),
				),
		)
		.subcommand(
			Command::new("stat")
				.about("Print entry attributes")
				.arg(Arg::new("target").required(true)),
		)
		.subcommand(
			Command::new("get")
				.about("Copy a remote file to a local path")
				.arg(Arg::new("target").required(true))
				.arg(Arg::new("out").required(true)),
		)
		.subcommand(
			Command::new("put")
				.about("Copy a local file to a remote path")
				.arg(Arg::new("source").required(true))
				.arg(Arg::new("target").required(true)),
		)
		.subcommand(
			Command::new("rm").about("Remove a file").arg(Arg::new("target").required(true)),
		)
		.subcommand(
			Command::new("mv")
				.about("Rename an entry on one connection")
				.arg(Arg::new("from").required(true))
				.arg(Arg::new("to").required(true)),
		)
		.subcommand(
			Command::new("mkdir")
				.about("Create a directory")
				.arg(Arg::new("target").required(true)),
		)
		.subcommand(
			Command::new("rmdir")
				.about("Remove an empty directory")
				.arg(Arg::new("target").required(true)),
		)
		.get_matches();

	let server_cmd = matches
		.get_one::<String>("server-cmd")
		.cloned()
		.unwrap_or_else(|| DEFAULT_SERVER_CMD.to_string());

	if let Some(matches) = matches.subcommand_matches("ls") {
		let target = matches.get_one::<String>("target").ok_or("ls: target required")?;
		let long = matches.get_flag("long");
		let (client, server, location) = open_target(target, &server_cmd).await?;
		let dir = client.opendir(location.path()).await?;
		let entries = dir.into_entries();
		futures::pin_mut!(entries);
		while let Some(entry) = entries.next().await {
			let entry = entry?;
			if long {
				println!("{}", entry.longname);
			} else {
				println!("{}", entry.filename);
			}
		}
		return finish(client, server).await;
	}

	if let Some(matches) = matches.subcommand_matches("walk") {
		let target = matches.get_one::<String>("target").ok_or("walk: target required")?;
		let options = WalkOptions { stop_on_error: matches.get_flag("fail-fast") };
		let (client, server, location) = open_target(target, &server_cmd).await?;
		let report = client.walk(location.path(), &options).await;
		for entry in &report.entries {
			println!("{}", entry.path);
		}
		for err in &report.errors {
			eprintln!("{}: {}", err.path, err.error);
		}
		let failed = !report.errors.is_empty();
		finish(client, server).await?;
		if failed {
			return Err("walk finished with errors".into());
		}
		return Ok(());
	}

	if let Some(matches) = matches.subcommand_matches("stat") {
		let target = matches.get_one::<String>("target").ok_or("stat: target required")?;
		let (client, server, location) = open_target(target, &server_cmd).await?;
		let attrs = client.lstat(location.path()).await?;
		println!("path:  {}", location.path());
		println!("size:  {}", attrs.size.map(|s| s.to_string()).unwrap_or_else(|| "?".to_string()));
		if let Some(mode) = attrs.permissions {
			println!("mode:  {:o}", mode);
		}
		if let (Some(uid), Some(gid)) = (attrs.uid, attrs.gid) {
			println!("owner: {}:{}", uid, gid);
		}
		if let Some(mtime) = attrs.mtime {
			println!("mtime: {}", mtime);
		}
		return finish(client, server).await;
	}

	if let Some(matches) = matches.subcommand_matches("get") {
		let target = matches.get_one::<String>("target").ok_or("get: target required")?;
		let out_path = matches.get_one::<String>("out").ok_or("get: output path required")?;
		let (client, server, location) = open_target(target, &server_cmd).await?;
		let mut file = client.open(location.path()).await?;
		let mut out = tokio::fs::File::create(out_path).await?;
		let mut buf = vec![0u8; 32768];
		loop {
			let n = file.read(&mut buf).await?;
			if n == 0 {
				break;
			}
			out.write_all(&buf[..n]).await?;
		}
		out.flush().await?;
		file.close().await?;
		return finish(client, server).await;
	}

	if let Some(matches) = matches.subcommand_matches("put") {
		let source = matches.get_one::<String>("source").ok_or("put: source required")?;
		let target = matches.get_one::<String>("target").ok_or("put: target required")?;
		let data = tokio::fs::read(source).await?;
		let (client, server, location) = open_target(target, &server_cmd).await?;
		let mut file = client.create(location.path()).await?;
		let written = file.write(&data).await?;
		file.close().await?;
		eprintln!("wrote {} bytes", written);
		return finish(client, server).await;
	}

	if let Some(matches) = matches.subcommand_matches("rm") {
		let target = matches.get_one::<String>("target").ok_or("rm: target required")?;
		let (client, server, location) = open_target(target, &server_cmd).await?;
		client.remove(location.path()).await?;
		return finish(client, server).await;
	}

	if let Some(matches) = matches.subcommand_matches("mv") {
		let from = matches.get_one::<String>("from").ok_or("mv: source required")?;
		let to = matches.get_one::<String>("to").ok_or("mv: destination required")?;
		let (client, server, location) = open_target(from, &server_cmd).await?;
		let to_path = Location::detect(to);
		client.rename(location.path(), to_path.path()).await?;
		return finish(client, server).await;
	}

	if let Some(matches) = matches.subcommand_matches("mkdir") {
		let target = matches.get_one::<String>("target").ok_or("mkdir: target required")?;
		let (client, server, location) = open_target(target, &server_cmd).await?;
		client.mkdir(location.path()).await?;
		return finish(client, server).await;
	}

	if let Some(matches) = matches.subcommand_matches("rmdir") {
		let target = matches.get_one::<String>("target").ok_or("rmdir: target required")?;
		let (client, server, location) = open_target(target, &server_cmd).await?;
		client.rmdir(location.path()).await?;
		return finish(client, server).await;
	}

	Ok(())
}

// vim: ts=4
