pub mod fixture;

use std::{
	fs,
	path::{Path, PathBuf},
	sync::Arc,
};

use clap::Parser;
use color_eyre::eyre;
use serde::Serialize;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::EnvFilter;

use fixture::Fixture;
use sieve_config::Config;
use sieve_domain::{EntityKind, SearchRequest};
use sieve_service::{CountOutcome, SearchResults, SearchService};

#[derive(Debug, Parser)]
#[command(
	version = sieve_cli::VERSION,
	rename_all = "kebab",
	styles = sieve_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Search request as JSON.
	#[arg(long, short = 'r', value_name = "FILE")]
	pub request: PathBuf,
	/// Authorization facts as JSON. Without one the requester is a member of nothing.
	#[arg(long, short = 'f', value_name = "FILE")]
	pub fixture: Option<PathBuf>,
	/// Compile the count-only variant.
	#[arg(long)]
	pub count: bool,
	/// Send the compiled query to the configured engine and include the outcome.
	#[arg(long)]
	pub execute: bool,
}

/// What the engine would be asked.
#[derive(Debug, Serialize)]
pub struct Explanation {
	pub entity: EntityKind,
	pub count_only: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub routing: Option<String>,
	pub timeout_ms: u64,
	pub body: Value,
}

#[derive(Debug, Serialize)]
struct Report {
	generated_at: String,
	query: Explanation,
	#[serde(skip_serializing_if = "Option::is_none")]
	results: Option<SearchResults>,
	#[serde(skip_serializing_if = "Option::is_none")]
	count: Option<CountOutcome>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sieve_config::load(&args.config)?;

	init_tracing(&config)?;

	let request = load_request(&args.request)?;
	let fixture = match &args.fixture {
		Some(path) => Fixture::load(path)?,
		None => Fixture::default(),
	};
	let service = build_service(config, fixture)?;
	let query = explain(&service, request.clone(), args.count).await?;
	let mut report = Report {
		generated_at: OffsetDateTime::now_utc()
			.format(&Rfc3339)
			.map_err(|err| eyre::eyre!("Failed to format report timestamp: {err}"))?,
		query,
		results: None,
		count: None,
	};

	if args.execute {
		tracing::info!(entity = %report.query.entity, count_only = args.count, "Executing query.");

		if args.count {
			report.count = Some(service.count(request).await?);
		} else {
			report.results = Some(service.search(request).await?);
		}
	}

	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(())
}

pub fn build_service(config: Config, fixture: Fixture) -> color_eyre::Result<SearchService> {
	let fixture = Arc::new(fixture);

	Ok(SearchService::new(config, fixture.clone(), fixture)?)
}

/// Resolves authorization and compiles `request` without touching the engine.
pub async fn explain(
	service: &SearchService,
	request: SearchRequest,
	count_only: bool,
) -> color_eyre::Result<Explanation> {
	let mut request = service.validate(request)?;

	if count_only {
		request = request.into_count_only();
	}

	let compiled = service.compile(&request).await?;

	Ok(Explanation {
		entity: compiled.entity,
		count_only: compiled.count_only,
		routing: compiled.routing.clone(),
		timeout_ms: u64::try_from(compiled.timeout.as_millis()).unwrap_or(u64::MAX),
		body: compiled.body(),
	})
}

fn load_request(path: &Path) -> color_eyre::Result<SearchRequest> {
	let raw = fs::read_to_string(path)
		.map_err(|err| eyre::eyre!("Failed to read request {}: {err}", path.display()))?;
	let request: SearchRequest = serde_json::from_str(&raw)?;

	Ok(request)
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter).init();

	Ok(())
}
