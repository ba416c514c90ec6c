mod cli;
mod config;
mod handlers;
mod logging;

use std::sync::Mutex;

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use page_markov_core::Prefetcher;

use crate::cli::Cli;
use crate::config::ServerConfig;

/// Main entry point for the server.
///
/// Builds one prefetcher, wraps it in a `Mutex` for thread safety,
/// and serves it with Actix-web on the configured address.
#[actix_web::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	logging::init(cli.verbose);

	let config = ServerConfig::resolve(&cli)?;
	let prefetcher = Prefetcher::new(config.pages)
		.with_context(|| format!("failed to build a model for {} pages", config.pages))?;
	let shared_prefetcher = web::Data::new(Mutex::new(prefetcher));

	info!(
		host = %config.host,
		port = config.port,
		pages = config.pages,
		workers = config.workers,
		"starting server"
	);

	HttpServer::new(move || {
		App::new()
			.app_data(shared_prefetcher.clone())
			.configure(handlers::configure)
	})
		.workers(config.workers)
		.bind((config.host.as_str(), config.port))
		.with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
		.run()
		.await
		.context("server stopped with an error")
}
