use anyhow::Context;
use clap::Parser;
use log::debug;
use motioncore::{ClientConfig, Credentials, FeedEvent, SampleBuffer, StreamClient};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(author, version, about = "Headless monitor for the motion-telemetry feed")]
struct Args {
    /// Gateway WebSocket endpoint
    #[arg(long, default_value = "ws://127.0.0.1:9000/websocket")]
    url: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    pin: String,
    /// Sliding-window capacity held for charting consumers
    #[arg(long, default_value_t = 400)]
    capacity: usize,
    /// Print a stats line every N samples
    #[arg(long, default_value_t = 50)]
    stats_every: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = ClientConfig::with_url(args.url);
    config.buffer_capacity = args.capacity;

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating monitor runtime")?;

    runtime.block_on(async move {
        let buffer = SampleBuffer::with_capacity(config.buffer_capacity);
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let (client, handle) = StreamClient::new(config, buffer.clone(), events_tx);
        let metrics = client.metrics();
        let client_task = tokio::spawn(client.run());

        println!("[MONITOR] connecting as {}", args.email);
        handle.connect(Credentials::new(args.email, args.pin));

        let mut seen = 0usize;
        loop {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    println!("[MONITOR] shutting down");
                    handle.disconnect();
                }
                event = events.recv() => match event {
                    Some(FeedEvent::SampleReceived(sample)) => {
                        seen += 1;
                        debug!("sample magnitude {:.3}", sample.accel_magnitude);
                        if args.stats_every > 0 && seen % args.stats_every == 0 {
                            let (samples, decode_errors, reconnects) = metrics.snapshot();
                            println!(
                                "[MONITOR] samples {} (buffered {}), decode errors {}, reconnects {}, last magnitude {:.2}",
                                samples,
                                buffer.len(),
                                decode_errors,
                                reconnects,
                                sample.accel_magnitude
                            );
                        }
                    }
                    Some(FeedEvent::AlertRaised) => println!("[MONITOR] excessive vibration detected!"),
                    Some(FeedEvent::AlertCleared) => println!("[MONITOR] vibration back to normal"),
                    Some(FeedEvent::ConnectionEstablished) => println!("[MONITOR] connected"),
                    Some(FeedEvent::ConnectionClosed) => {
                        println!("[MONITOR] connection closed");
                        break;
                    }
                    Some(FeedEvent::DecodeError(_)) => {
                        // already logged by the client; nothing to render
                    }
                    None => break,
                },
            }
        }

        drop(handle);
        client_task.await.context("joining client task")??;
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
