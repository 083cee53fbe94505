//! Integration tests against the live Gemini market-data feed.
//!
//! The feed is public, so no credentials are needed, but these tests touch
//! the network and are skipped unless asked for.
//!
//! # Running
//!
//! ```bash
//! GEMINI_LIVE=1 cargo test --test integration_websocket
//! GEMINI_LIVE=1 GEMINI_SYMBOL=ethusd cargo test --test integration_websocket
//! ```

use std::time::Duration;

use gemini_book::feed::{FeedMessage, GeminiFeed, MarketFeed, ReconnectingFeed};
use gemini_book::types::messages::WireEvent;
use gemini_book::types::MarketDataMessage;
use gemini_book::{Config, LiveBook};
use tokio::time::timeout;

/// Helper to create a config from environment variables
fn create_config() -> Option<Config> {
    std::env::var("GEMINI_LIVE").ok()?;
    let symbol = std::env::var("GEMINI_SYMBOL").unwrap_or_else(|_| "btcusd".to_string());
    Some(Config::new(symbol))
}

/// Skip test unless live tests were requested
macro_rules! require_config {
    () => {
        match create_config() {
            Some(c) => c,
            None => {
                eprintln!("Skipping test: GEMINI_LIVE not set");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_websocket_connect() {
    let config = require_config!();

    let result = GeminiFeed::connect(&config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result);

    let mut feed = result.unwrap();
    assert_eq!(feed.next_sequence(), 0);

    let close_result = feed.close().await;
    assert!(close_result.is_ok(), "Failed to close: {:?}", close_result);
}

#[tokio::test]
async fn test_first_update_is_snapshot() {
    let config = require_config!();

    let mut feed = match GeminiFeed::connect(&config).await {
        Ok(feed) => feed,
        Err(e) => {
            eprintln!("Failed to connect: {}", e);
            return;
        }
    };

    let first = timeout(Duration::from_secs(10), feed.next())
        .await
        .expect("timed out waiting for snapshot")
        .expect("feed ended")
        .expect("feed error");

    match first {
        MarketDataMessage::Update(update) => {
            assert_eq!(update.socket_sequence, 0);
            let changes = update
                .events
                .iter()
                .filter_map(|e| match e {
                    WireEvent::Change(change) => Some(change),
                    _ => None,
                })
                .collect::<Vec<_>>();
            assert!(!changes.is_empty(), "snapshot carried no levels");
            assert!(changes.iter().all(|c| c.reason == "initial"));
            println!("snapshot with {} levels", changes.len());
        }
        other => panic!("expected snapshot update, got {:?}", other),
    }

    feed.close().await.ok();
}

#[tokio::test]
async fn test_reconnecting_feed_announces_connection() {
    let config = require_config!();

    let mut feed = ReconnectingFeed::connect(config).await.expect("connect");
    let first = timeout(Duration::from_secs(10), MarketFeed::next(&mut feed))
        .await
        .expect("timed out")
        .expect("feed ended")
        .expect("feed error");
    assert!(matches!(first, FeedMessage::Connected));
    assert_eq!(feed.reconnects(), 0);

    feed.close().await.ok();
}

#[tokio::test]
async fn test_live_book_seeds_from_snapshot() {
    let config = require_config!();

    let live = LiveBook::start(config).await.expect("start");
    let mut updates = live.subscribe();

    timeout(
        Duration::from_secs(15),
        updates.wait_for(|top| top.best_bid.is_some() && top.best_ask.is_some()),
    )
    .await
    .expect("timed out waiting for both sides")
    .expect("consumer stopped");

    let top = live.top_of_book();
    println!("top of book: {top}");
    assert!(top.bid_level_count > 0);
    assert!(top.ask_level_count > 0);

    let report = live.shutdown().await.expect("shutdown");
    println!("{}", report.book);
    assert!(report.book.verify().is_ok());
    assert!(report.feed.forwarded > 0);
}
