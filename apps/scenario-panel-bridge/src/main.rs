use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scenario_panel_bridge::{JsonLinesChannel, replay, write_view};
use scenario_panel_core::{PanelConfig, ScenarioPanel};
use tracing_subscriber::EnvFilter;

/// Replays host messages and user actions through the scenario panel and
/// prints the commands it would send back to the host.
#[derive(Parser, Debug)]
#[command(name = "scenario-panel-bridge", version)]
struct Args {
    /// JSON-lines script; stdin when omitted.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Log filter; wins over RUST_LOG and SCENARIO_PANEL_LOG.
    #[arg(long)]
    log_filter: Option<String>,

    /// Print the final panel view after the outbound commands.
    #[arg(long)]
    emit_view: bool,

    /// Pretty-print the panel view.
    #[arg(long, requires = "emit_view")]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = PanelConfig::from_env().context("load panel configuration")?;

    let filter = match args.log_filter.as_deref() {
        Some(filter) => EnvFilter::try_new(filter).context("parse --log-filter")?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log_filter))
            .context("parse log filter")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let reader: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("open script {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let mut panel = ScenarioPanel::new(&config);
    let mut channel = JsonLinesChannel::new(io::stdout().lock());
    replay(&mut panel, reader, &mut channel)?;

    if args.emit_view {
        write_view(channel.writer_mut(), &panel.view(), args.pretty)?;
    }
    Ok(())
}
