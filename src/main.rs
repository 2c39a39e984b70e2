use anyhow::{Context, Result};
use clap::Parser;
use expectty::logging::init_logging;
use expectty::{
    ChannelKind, ConsoleReporter, Engine, Reporter, ScenarioConfig, TracingReporter, parse_file,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "expectty",
    about = "Run an expect script against interactive command-line programs",
    version
)]
struct Args {
    /// Path to the script file
    script: PathBuf,

    /// Suppress the instruction report (diagnostics still follow RUST_LOG)
    #[arg(long)]
    silent: bool,

    /// How to attach to launched programs
    #[arg(long, value_enum, default_value_t = ChannelKind::default())]
    channel: ChannelKind,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let commands = parse_file(&args.script)
        .with_context(|| format!("Failed to parse script file: {}", args.script.display()))?;

    let reporter: Arc<dyn Reporter> = if args.silent {
        Arc::new(TracingReporter)
    } else {
        Arc::new(ConsoleReporter::stdout())
    };
    let config = ScenarioConfig::default().with_channel(args.channel);

    Engine::new(config, reporter)
        .execute(commands)
        .await
        .context("Failed to execute script")?;

    Ok(())
}
