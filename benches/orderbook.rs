//! Benchmarks for order book operations.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use gemini_book::types::{Event, Reason, Side};
use gemini_book::OrderBook;
use rust_decimal::Decimal;

fn event(ticks: i64, remaining: i64, side: Side, reason: Reason) -> Event {
    Event::new(Decimal::new(ticks, 2), Decimal::from(remaining), side, reason)
        .expect("valid bench event")
}

/// Book with `size` bid levels below 100.00 and `size` ask levels above it
fn populated(size: i64) -> OrderBook {
    let mut book = OrderBook::new("BENCH");
    for i in 1..=size {
        book.apply(&event(10_000 - i, 1, Side::Bid, Reason::Snapshot));
        book.apply(&event(10_000 + i, 1, Side::Ask, Reason::Snapshot));
    }
    book
}

fn bench_orderbook_place_cancel(c: &mut Criterion) {
    let mut group = c.benchmark_group("orderbook_place_cancel");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut book = populated(size);
            let place = event(10_000 - size / 2, 3, Side::Bid, Reason::Place);
            let cancel = event(10_000 - size / 2, 3, Side::Bid, Reason::Cancel);

            b.iter(|| {
                // Entry joins an existing level, then leaves it
                book.apply(black_box(&place));
                book.apply(black_box(&cancel));
            });
        });
    }

    group.finish();
}

fn bench_orderbook_best_bid(c: &mut Criterion) {
    let mut group = c.benchmark_group("orderbook_best_bid");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let book = populated(size);

            b.iter(|| {
                black_box(book.best_bid());
            });
        });
    }

    group.finish();
}

fn bench_orderbook_remove_best(c: &mut Criterion) {
    let mut group = c.benchmark_group("orderbook_remove_best");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let book = populated(size);
            let remove = event(9_999, 0, Side::Bid, Reason::Cancel);

            // Removing the best level forces the next best to be found
            b.iter_batched(
                || book.clone(),
                |mut book| {
                    book.apply(black_box(&remove));
                    book
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_orderbook_top_of_book(c: &mut Criterion) {
    let book = populated(50);

    c.bench_function("orderbook_top_of_book", |b| {
        b.iter(|| {
            black_box(book.top_of_book());
        });
    });
}

criterion_group!(
    benches,
    bench_orderbook_place_cancel,
    bench_orderbook_best_bid,
    bench_orderbook_remove_best,
    bench_orderbook_top_of_book
);
criterion_main!(benches);
