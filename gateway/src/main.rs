use anyhow::Context;
use clap::Parser;
use feed::config::GatewayConfig;
use feed::server::FeedServer;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod feed;
mod generator;

#[derive(Parser)]
#[command(author, version, about = "Synthetic motion-telemetry gateway")]
struct Args {
    /// Load a gateway config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 9000)]
    port: u16,
    /// Frames per second pushed to each connected client
    #[arg(long, default_value_t = 10.0)]
    rate: f32,
    /// Jitter amplitude added to every axis
    #[arg(long, default_value_t = 0.05)]
    noise: f64,
    /// Emit a high-vibration burst every N frames (0 disables bursts)
    #[arg(long, default_value_t = 120)]
    burst_every: u64,
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.config {
        GatewayConfig::load(path)?
    } else {
        GatewayConfig::from_args(args.port, args.rate, args.noise, args.burst_every, args.seed)
    };

    let server = FeedServer::new(config);
    server.publish_status("WebSocket feed running (Ctrl+C to stop)...");

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for signal handling")?;
    runtime.block_on(async {
        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
