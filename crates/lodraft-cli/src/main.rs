// lodraft entry point.
//
// Startup sequence:
// 1. Load config
// 2. Initialize tracing (log to file, filter from config)
// 3. Create the table channel and the engine, subscribe every table
// 4. Spawn the feed server task
// 5. Run the event loop until Ctrl+C or the feed goes away

use lodraft_core::config;
use lodraft_core::feed::{self, FeedEvent};
use lodraft_core::protocol::{FeedFrame, OutboundRequest, TableUpdate};
use lodraft_core::sync::{MemoryTables, TableSyncChannel};
use lodraft_engine::DraftEngine;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = config::load_config().context("failed to load configuration")?;

    // 2. Initialize tracing; RUST_LOG wins over the configured filter
    init_tracing(config.logging.filter.as_deref())?;
    info!("lodraft starting up");
    info!(
        "Config loaded: feed port {}, tick {}s",
        config.feed.port, config.timing.tick_secs
    );

    // 3. Channel and engine
    let (mut channel, mut updates) = TableSyncChannel::new(MemoryTables::new());
    let mut engine = DraftEngine::new(config.timing.clone(), 0.0);
    engine
        .attach(&mut channel)
        .context("failed to subscribe to draft tables")?;
    engine.pump(&mut updates);

    // 4. Feed server
    let (feed_tx, mut feed_rx) = mpsc::channel(256);
    let (out_tx, out_rx) = mpsc::channel::<OutboundRequest>(256);
    let port = config.feed.port;
    let feed_handle = tokio::spawn(async move {
        if let Err(e) = feed::run(port, feed_tx, out_rx).await {
            error!("Feed server error: {}", e);
        }
    });
    info!("Ready. Feed listening on 127.0.0.1:{}", port);

    // 5. Event loop
    let mut now = 0.0;
    let period = std::time::Duration::from_secs_f64(config.timing.tick_secs);
    let mut tick = tokio::time::interval(period);
    tick.tick().await;

    loop {
        tokio::select! {
            event = feed_rx.recv() => {
                match event {
                    Some(FeedEvent::Connected { addr }) => info!("Bridge connected from {}", addr),
                    Some(FeedEvent::Disconnected) => info!("Bridge disconnected"),
                    Some(FeedEvent::Frame(frame)) => match frame {
                        FeedFrame::Table { table, key, value } => {
                            channel.publish(TableUpdate::new(table, key, value));
                            engine.pump(&mut updates);
                        }
                        FeedFrame::Clock { now: t } => now = t,
                        FeedFrame::Roster(info) => engine.set_roster(info),
                        FeedFrame::Map { name } => engine.set_map(&name),
                    },
                    None => {
                        info!("Feed channel closed, shutting down");
                        break;
                    }
                }
            }

            _ = tick.tick() => engine.tick(now),

            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down");
                break;
            }
        }

        for request in engine.drain_outbox() {
            if out_tx.send(request).await.is_err() {
                error!("Feed server is gone; dropping outbound requests");
                break;
            }
        }
        for cue in engine.drain_feedback() {
            debug!("Feedback cue: {:?}", cue);
        }
        for notice in engine.drain_notices() {
            trace!("View notice: {:?}", notice);
        }
    }

    feed_handle.abort();
    info!("lodraft shut down cleanly");
    Ok(())
}

/// Initialize tracing to `logs/lodraft.log`.
fn init_tracing(filter: Option<&str>) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("lodraft.log"))?;
    let default_filter = filter.unwrap_or("lodraft=info,warn").to_string();

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
