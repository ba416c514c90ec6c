mod logging;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use page_markov_core::{Prefetcher, TransitionModel};

/// Walks through the page transition model and a simulated prefetcher.
#[derive(Parser)]
#[command(name = "page-markov-demo", version)]
struct Cli {
	/// Number of pages in the simulated trace.
	#[arg(short, long, default_value_t = 16)]
	pages: usize,

	/// Number of accesses in the simulated trace.
	#[arg(short, long, default_value_t = 10_000)]
	steps: usize,

	/// Probability of leaving the sequential scan for a random page.
	#[arg(short, long, default_value_t = 0.1)]
	jump: f64,

	/// RNG seed for the simulated trace.
	#[arg(long, default_value_t = 42)]
	seed: u64,

	/// Increase verbosity (-v info, -vv debug, -vvv trace).
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

fn print_matrix(model: &TransitionModel) {
	println!("Transition Matrix:");
	print!("{model}");
}

/// Four pages, a miss, a first batch of transitions, then a shift of page 1.
fn walkthrough() -> Result<()> {
	let mut model = TransitionModel::new(4)?;

	print_matrix(&model);
	// Nothing recorded yet: -1
	println!(
		"Predicted next page after accessing page 1: {}\n",
		model.predict_next_or_sentinel(1)
	);

	// Page 1 after page 0, page 2 after page 0, and so on
	for (from, to) in [(0, 1), (0, 2), (1, 2), (1, 3), (2, 3), (3, 0)] {
		model.record_transition(from, to)?;
	}
	print_matrix(&model);
	// Tie between 2 and 3: 2
	println!(
		"Predicted next page after accessing page 1: {}\n",
		model.predict_next_or_sentinel(1)
	);

	// Reinforce 1 -> 0 until it dominates the row
	model.record_transition(1, 0)?;
	model.record_transition(1, 0)?;
	print_matrix(&model);
	println!(
		"Predicted next page after accessing page 1: {}\n",
		model.predict_next_or_sentinel(1)
	);

	model.validate()?;
	Ok(())
}

/// Replays a sequential scan with random jumps through a prefetcher.
fn simulate(cli: &Cli) -> Result<()> {
	ensure!(
		(0.0..=1.0).contains(&cli.jump),
		"jump probability must be between 0.0 and 1.0, got {}",
		cli.jump
	);

	let mut prefetcher = Prefetcher::new(cli.pages).context("failed to build prefetcher")?;
	let mut rng = StdRng::seed_from_u64(cli.seed);

	info!(pages = cli.pages, steps = cli.steps, seed = cli.seed, "simulating access trace");
	let mut page = 0;
	for _ in 0..cli.steps {
		prefetcher.access(page)?;
		page = if rng.random::<f64>() < cli.jump {
			rng.random_range(0..cli.pages)
		} else {
			(page + 1) % cli.pages
		};
	}

	let stats = prefetcher.stats();
	info!(hits = stats.hits, misses = stats.misses, "simulation finished");
	println!(
		"Simulated {} accesses over {} pages: {} hits, {} misses, hit ratio {:.3}",
		stats.accesses,
		cli.pages,
		stats.hits,
		stats.misses,
		stats.hit_ratio()
	);
	Ok(())
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	logging::init(cli.verbose);

	walkthrough()?;
	simulate(&cli)
}
