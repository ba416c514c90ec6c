use std::path::PathBuf;

use clap::Parser;

/// HTTP front end for a page transition model.
#[derive(Parser)]
#[command(name = "page-markov-server", version)]
pub struct Cli {
	/// Path to TOML configuration file. Defaults are used if it is missing.
	#[arg(short, long, default_value = "page-markov.toml")]
	pub config: PathBuf,

	/// Override the bind address from config.
	#[arg(long)]
	pub host: Option<String>,

	/// Override the port from config.
	#[arg(short, long)]
	pub port: Option<u16>,

	/// Override the number of pages tracked by the model.
	#[arg(long)]
	pub pages: Option<usize>,

	/// Override the number of HTTP worker threads.
	#[arg(short, long)]
	pub workers: Option<usize>,

	/// Increase verbosity (-v info, -vv debug, -vvv trace).
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}
