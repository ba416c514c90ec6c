use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use tracing::info;

use crate::cli::Cli;

/// Server configuration, read from TOML and overridden by flags.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
	/// Bind address.
	#[serde(default = "default_host")]
	pub host: String,

	/// Bind port.
	#[serde(default = "default_port")]
	pub port: u16,

	/// Number of pages tracked by the shared model.
	#[serde(default = "default_pages")]
	pub pages: usize,

	/// HTTP worker threads.
	#[serde(default = "default_workers")]
	pub workers: usize,
}

fn default_host() -> String {
	"127.0.0.1".to_string()
}
fn default_port() -> u16 {
	5000
}
fn default_pages() -> usize {
	64
}
fn default_workers() -> usize {
	num_cpus::get()
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
			pages: default_pages(),
			workers: default_workers(),
		}
	}
}

impl ServerConfig {
	/// Parses a TOML document. Missing keys take their defaults.
	pub fn from_toml(text: &str) -> Result<Self> {
		toml::from_str(text).context("invalid server configuration")
	}

	/// Reads `path`, or returns the defaults if the file does not exist.
	pub fn load(path: &Path) -> Result<Self> {
		if !path.exists() {
			info!(path = %path.display(), "no config file, using defaults");
			return Ok(Self::default());
		}
		let text = fs::read_to_string(path)
			.with_context(|| format!("failed to read config: {}", path.display()))?;
		Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
	}

	/// Loads the file named by `--config`, then applies flag overrides.
	pub fn resolve(cli: &Cli) -> Result<Self> {
		let mut config = Self::load(&cli.config)?;
		if let Some(host) = &cli.host {
			config.host = host.clone();
		}
		if let Some(port) = cli.port {
			config.port = port;
		}
		if let Some(pages) = cli.pages {
			config.pages = pages;
		}
		if let Some(workers) = cli.workers {
			config.workers = workers;
		}
		config.validate()?;
		Ok(config)
	}

	/// Rejects values the server cannot start with.
	pub fn validate(&self) -> Result<()> {
		ensure!(self.pages >= 1, "pages must be at least 1");
		ensure!(self.workers >= 1, "workers must be at least 1");
		ensure!(!self.host.trim().is_empty(), "host must not be empty");
		Ok(())
	}
}
