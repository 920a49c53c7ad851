//! Modern Art event-log replay.
//!
//! Reads newline-delimited JSON events from a file (or stdin), folds them
//! through the reducer and prints the final state as JSON on stdout.

use modernart_core::Rules;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod report;
mod session;

use session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for the final state
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Rules from a JSON file, if one is configured
    let rules = match std::env::var("MODERNART_RULES") {
        Ok(path) => {
            let json = tokio::fs::read_to_string(&path).await?;
            info!(%path, "loaded rules");
            Rules::from_json(&json)?
        }
        Err(_) => Rules::default(),
    };
    let strict = std::env::var("MODERNART_STRICT").is_ok_and(|v| v == "1" || v == "true");

    let mut session = Session::new(rules, strict);

    match std::env::args().nth(1) {
        Some(path) => {
            info!(%path, "replaying event log");
            let file = tokio::fs::File::open(&path).await?;
            session.replay(BufReader::new(file)).await?;
        }
        None => {
            info!("replaying event log from stdin");
            session.replay(BufReader::new(tokio::io::stdin())).await?;
        }
    }

    let report = session.report();
    info!(
        events = report.events,
        applied = report.applied,
        rejected = report.rejected,
        faulted = report.faulted,
        malformed = report.malformed,
        round = report.round_index,
        "replay finished"
    );
    for (user, score) in &report.scores {
        info!(%user, score, "total score");
    }

    let mut stdout = tokio::io::stdout();
    let json = serde_json::to_vec_pretty(session.state())?;
    stdout.write_all(&json).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;

    Ok(())
}
