mod aggregate;
mod app;
mod cache;
mod commands;
mod config;
mod event;
mod jira;
mod logging;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

use aggregate::{Pipeline, PipelineSettings};
use cache::CacheService;
use jira::client::JiraClient;

#[derive(Parser, Debug)]
#[command(name = "jira-aggregator")]
#[command(about = "Aggregates Jira board issues into a periodically refreshed cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/jira-aggregator/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Jira project key to use
  #[arg(short, long)]
  project: Option<String>,

  /// Fetch once, print the snapshot as JSON and exit
  #[arg(long)]
  once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override project if specified on command line
  let config = if let Some(project_key) = args.project {
    config::Config {
      project_key,
      ..config
    }
  } else {
    config
  };

  let _log_guard = logging::init(config.logging.dir.as_deref())?;

  let client = JiraClient::new(&config)?;
  let pipeline = Pipeline::new(Arc::new(client), PipelineSettings::from_config(&config));
  let service = CacheService::start(pipeline, config.cache.ttl).await?;

  if args.once {
    serde_json::to_writer_pretty(std::io::stdout().lock(), &service.snapshot())?;
    println!();
    service.shutdown();
    return Ok(());
  }

  app::App::new(service, std::io::stdout()).run().await
}
