use crate::feed::config::GatewayConfig;
use crate::generator::motion::FrameGenerator;
use futures_util::{SinkExt, StreamExt};
use motioncore::wire::Credentials;
use std::{net::SocketAddr, thread};
use tokio::runtime::Builder;
use warp::ws::{Message, WebSocket, Ws};
use warp::Filter;

/// Gateway that hosts the telemetry WebSocket endpoint and feeds each
/// authenticated session with synthetic motion frames.
pub struct FeedServer {
    config: GatewayConfig,
}

impl FeedServer {
    /// Builds the routes and spawns the serving thread.
    pub fn new(config: GatewayConfig) -> Self {
        let session_config = config.clone();
        let config_filter = warp::any().map(move || session_config.clone());

        let feed_route = warp::path("websocket")
            .and(warp::ws())
            .and(config_filter)
            .map(|upgrade: Ws, config: GatewayConfig| {
                upgrade.on_upgrade(move |socket| session(socket, config))
            });

        let address = SocketAddr::from(([127, 0, 0, 1], config.port));
        thread::spawn(move || {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build runtime");
            runtime.block_on(async move {
                warp::serve(feed_route).run(address).await;
            });
        });

        Self { config }
    }

    pub fn publish_status(&self, message: &str) {
        println!("[FEED] port {}: {}", self.config.port, message);
    }
}

/// One client session: a credentials handshake must arrive before any
/// frames flow; a literal `"close"` text ends the session cleanly.
async fn session(socket: WebSocket, config: GatewayConfig) {
    let (mut outbound, mut inbound) = socket.split();

    let handshake = match inbound.next().await {
        Some(Ok(message)) => message,
        _ => return,
    };
    let raw = match handshake.to_str() {
        Ok(text) => text.to_string(),
        Err(_) => {
            log::warn!("rejecting session: non-text handshake");
            return;
        }
    };
    let credentials = match Credentials::from_handshake(&raw)
        .and_then(|credentials| credentials.validate().map(|_| credentials))
    {
        Ok(credentials) => credentials,
        Err(err) => {
            log::warn!("rejecting session: {}", err);
            return;
        }
    };
    log::info!("feeding live data for {}", credentials.email);

    let mut generator = FrameGenerator::new(config.noise, config.burst_every, config.seed);
    let mut ticker = tokio::time::interval(config.frame_interval());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let frame = generator.next_frame();
                let payload = match serde_json::to_string(&frame) {
                    Ok(payload) => payload,
                    Err(err) => {
                        log::warn!("skipping frame: {}", err);
                        continue;
                    }
                };
                if outbound.send(Message::text(payload)).await.is_err() {
                    log::info!("feed for {} dropped", credentials.email);
                    break;
                }
            }
            message = inbound.next() => match message {
                Some(Ok(message)) if message.to_str() == Ok("close") => {
                    log::info!("{} said goodbye", credentials.email);
                    break;
                }
                Some(Ok(message)) if message.is_close() => break,
                None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
