//! Gomoku Host
//!
//! Runs the WebSocket host, or `demo` to play a scripted match through the
//! engine and check that a replay lands on the same state hash.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gomoku_engine::{
    Application, GomokuEngine, EngineConfig, Intent, VERSION,
    network::{GameServer, ServerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Gomoku Engine v{}", VERSION);

    if std::env::args().nth(1).as_deref() == Some("demo") {
        return demo_match();
    }

    let config = ServerConfig::from_env().context("reading GOMOKU_* configuration")?;
    info!(
        "Board {}x{}, tick {:?}, seed 0x{}",
        config.engine.board_width(),
        config.engine.board_width(),
        config.tick_interval,
        hex::encode(&config.seed)
    );

    let server = GameServer::new(config);
    tokio::select! {
        result = server.run() => result.context("server stopped")?,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received");
            server.shutdown();
        }
    }
    Ok(())
}

/// Scripted match: Black completes a row on its fifth stone.
fn demo_match() -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");

    let black = "0x1111111111111111111111111111111111111111";
    let white = "0x2222222222222222222222222222222222222222";
    let mut batches = vec![vec![Intent::join(black), Intent::join(white)]];
    for i in 0..5 {
        let mut batch = vec![Intent::play(black, 180 + i)];
        if i < 4 {
            batch.push(Intent::play(white, 200 + i));
        }
        batches.push(batch);
    }

    let run = |batches: &[Vec<Intent>]| -> anyhow::Result<GomokuEngine> {
        let mut engine = GomokuEngine::new(EngineConfig::default())?;
        engine.init(b"demo");
        for (n, batch) in batches.iter().enumerate() {
            let events = engine.step(batch);
            info!("Batch {}: {} intents, {} events", n, batch.len(), events.len());
        }
        Ok(engine)
    };

    let engine = run(&batches)?;
    let (done, payload) = engine.status();
    info!("Finished: {}", done);
    info!("Settlement payload: 0x{}", hex::encode(&payload));

    let hash = engine.state_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    info!("=== Verifying Determinism ===");
    let replay_hash = run(&batches)?.state_hash();
    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        anyhow::bail!("replay hash {} differs", hex::encode(replay_hash));
    }
    Ok(())
}
