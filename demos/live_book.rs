//! Live order book - streams the Gemini top of book
//!
//! Usage:
//!   cargo run --example live_book
//!
//! Optional:
//!   GEMINI_SYMBOL=ethusd  # Market symbol (default: btcusd)
//!   GEMINI_ENV=sandbox    # Use sandbox environment (default: production)
//!   RUST_LOG=gemini_book=debug

use std::time::Instant;

use gemini_book::config::Environment;
use gemini_book::types::Side;
use gemini_book::{Config, LiveBook};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gemini_book=info".parse()?),
        )
        .init();

    let symbol = std::env::var("GEMINI_SYMBOL").unwrap_or_else(|_| "btcusd".to_string());
    let env = match std::env::var("GEMINI_ENV")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "sandbox" => Environment::Sandbox,
        _ => Environment::Production,
    };

    println!("=== Gemini Live Book: {symbol} ===");
    println!("(Press Ctrl+C to stop)\n");

    let config = Config::new(&symbol).with_environment(env);
    let live = LiveBook::start(config).await?;
    let mut updates = live.subscribe();

    let start_time = Instant::now();
    let mut update_count = 0u64;
    let mut last = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    println!("consumer stopped");
                    break;
                }
                update_count += 1;
                let top = *updates.borrow_and_update();

                // Only print when the top of book actually moves
                if last != Some((top.best_bid, top.best_ask)) {
                    last = Some((top.best_bid, top.best_ask));
                    println!(
                        "{top}\t| spread: {} | levels: {} bids, {} asks",
                        top.spread().map_or_else(|| "-".to_string(), |s| s.to_string()),
                        top.bid_level_count,
                        top.ask_level_count,
                    );
                }
            }
        }
    }

    let report = live.shutdown().await?;
    let elapsed = start_time.elapsed().as_secs_f64();

    println!("\n{}", report.book);
    println!("\n=== Top 5 ===");
    for side in [Side::Ask, Side::Bid] {
        for (price, quantity) in report.book.top_levels(side, 5) {
            println!("{:>4} {price} x {quantity}", side.as_str());
        }
    }
    println!(
        "\n{} updates in {:.1}s ({:.1}/s), {} events forwarded, {} rejected, {} resets",
        update_count,
        elapsed,
        update_count as f64 / elapsed.max(f64::EPSILON),
        report.feed.forwarded,
        report.feed.rejected,
        report.consumer.resets,
    );

    Ok(())
}
