//! Main application entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use eframe::egui;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ql_data::{EngineConfig, FixtureService, QueryService};

mod app;
mod panels;

use app::QueryLensApp;

const BUILTIN_FIXTURES: &str = include_str!("../fixtures/sample.json");

/// Command line options
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    fixtures: Option<PathBuf>,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Args::default();
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => {
                    args.config = Some(iter.next().context("--config needs a path")?.into());
                }
                "--fixtures" => {
                    args.fixtures = Some(iter.next().context("--fixtures needs a path")?.into());
                }
                other => anyhow::bail!("Unknown argument '{}' (expected --config or --fixtures)", other),
            }
        }
        Ok(args)
    }
}

fn load_service(runtime: &tokio::runtime::Runtime, path: Option<&PathBuf>) -> Result<Arc<dyn QueryService>> {
    let service = match path {
        Some(path) => runtime
            .block_on(FixtureService::load(path))
            .with_context(|| format!("Failed to load fixtures from {:?}", path))?,
        None => FixtureService::from_json("built-in fixtures", BUILTIN_FIXTURES)
            .context("Built-in fixtures are invalid")?,
    };
    Ok(Arc::new(service))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse()?;
    let config = EngineConfig::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let fixtures = args.fixtures.as_ref().or(config.fixture_path.as_ref());
    let service = load_service(&runtime, fixtures)?;

    info!("Starting QueryLens with {}", service.service_name());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([800.0, 600.0]),
        persist_window: false,
        ..Default::default()
    };

    eframe::run_native(
        "QueryLens",
        options,
        Box::new(move |cc| Box::new(QueryLensApp::new(cc, config, runtime, service))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
