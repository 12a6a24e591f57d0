//! Becas Simulator Binary
//!
//! Writes one CSV line per snapshot to stdout. Logging goes to stderr and is
//! controlled with `RUST_LOG`.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use becas_simulator::{CsvSink, Scenario, SimulationConfig, SIMULATOR_VERSION};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Becas simulator v{}", SIMULATOR_VERSION);

    // Load configuration
    let config = SimulationConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let stdout = std::io::stdout();
    let mut sink = CsvSink::new(stdout.lock());

    let outcome = match Scenario::new(config.clone()).run(&mut sink) {
        Ok(outcome) => outcome,
        Err(err) => {
            if err.is_fatal_defect() {
                error!(error = %err, "Conservation defect, aborting");
            } else {
                error!(error = %err, "Simulation stopped");
            }
            return Err(err.into());
        }
    };
    info!("Wrote {} CSV lines", sink.lines());

    if config.output.metrics_dump {
        let text = outcome
            .telemetry
            .encode()
            .context("encoding Prometheus metrics")?;
        std::io::stderr().write_all(text.as_bytes())?;
    }

    if let Some(path) = &config.output.report_json {
        let json = outcome.report.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
