//! Benchmarks for tokenops-analysis core components.
//!
//! Uses synthetic logs and cost records (no RPC).
//! Run with: `cargo bench --package tokenops-analysis`

use alloy::json_abi::JsonAbi;
use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tokenops_analysis::cost::compare;
use tokenops_analysis::events::EventCatalog;
use tokenops_analysis::units::format_units;
use tokenops_data::{OperationCost, RawLogEntry};

fn token_abi() -> JsonAbi {
    JsonAbi::parse([
        "event Transfer(address indexed from, address indexed to, uint256 value)",
        "event Approval(address indexed owner, address indexed spender, uint256 value)",
        "event Paused(address account)",
    ])
    .unwrap_or_default()
}

/// Every fifth log carries a selector the ABI does not know.
fn sample_logs(count: u64) -> Vec<RawLogEntry> {
    let transfer = keccak256("Transfer(address,address,uint256)");
    (0..count)
        .map(|i| {
            if i % 5 == 4 {
                return RawLogEntry::new(vec![B256::repeat_byte(0xee)], Bytes::new());
            }
            let from = Address::with_last_byte((i % 256) as u8);
            let to = Address::with_last_byte(((i + 1) % 256) as u8);
            RawLogEntry::new(
                vec![transfer, from.into_word(), to.into_word()],
                U256::from(i).to_be_bytes::<32>().to_vec(),
            )
        })
        .collect()
}

/// Benchmark: Summarize 1,000 mixed logs against a small token ABI.
fn bench_summarize_1k_logs(c: &mut Criterion) {
    let catalog = EventCatalog::new(&token_abi());
    let logs = sample_logs(1_000);

    c.bench_function("summarize_1k_logs", |b| {
        b.iter(|| catalog.summarize(black_box(&logs)));
    });
}

/// Benchmark: Compare one batch against 500 sequential operations.
fn bench_compare_500_ops(c: &mut Criterion) {
    let batch = OperationCost::new(2_500_000, Some(22_000_000_000));
    let sequential: Vec<OperationCost> = (0..500)
        .map(|i: u64| OperationCost::new(51_000 + i, Some(20_000_000_000 + u128::from(i))))
        .collect();

    c.bench_function("compare_500_ops", |b| {
        b.iter(|| compare(black_box(&batch), black_box(&sequential)));
    });
}

/// Benchmark: Format 10,000 token amounts.
fn bench_format_units(c: &mut Criterion) {
    c.bench_function("format_units_10k_calls", |b| {
        b.iter(|| {
            for i in 0..10_000u128 {
                let amount = U256::from(i * 1_234_567_890_123_456_789);
                format_units(black_box(amount), 18);
            }
        });
    });
}

criterion_group!(
    benches,
    bench_summarize_1k_logs,
    bench_compare_500_ops,
    bench_format_units
);
criterion_main!(benches);
