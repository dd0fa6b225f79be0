use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use headbook::{Command, Ledger, reconstruct};

const HEADS: [&str; 4] = ["Normal", "Food", "Travel", "Rent"];

/// Generates valid command sequences for benchmarking.
///
/// Pattern per head (repeating):
/// 1. Add 100
/// 2. Add 50
/// 3. Spend 30
/// 4. Transfer 10 to the next head
///
/// Heads never run short, so every command is accepted.
pub struct CommandGenerator {
    remaining: u32,
    step: u32,
}

impl CommandGenerator {
    pub fn new(count: u32) -> Self {
        Self {
            remaining: count,
            step: 0,
        }
    }
}

impl Iterator for CommandGenerator {
    type Item = Command;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let head = HEADS[(self.step / 4) as usize % HEADS.len()].to_string();
        let command = match self.step % 4 {
            0 => Command::Add {
                head,
                amount: 100.0,
                note: String::new(),
            },
            1 => Command::Add {
                head,
                amount: 50.0,
                note: String::new(),
            },
            2 => Command::Spend {
                head,
                amount: 30.0,
                note: String::new(),
            },
            _ => Command::Transfer {
                to: HEADS[(self.step / 4 + 1) as usize % HEADS.len()].to_string(),
                from: head,
                amount: 10.0,
            },
        };
        self.step += 1;

        Some(command)
    }
}

fn build_ledger(count: u32) -> Ledger {
    let mut ledger = Ledger::new();
    for command in CommandGenerator::new(count) {
        let _ = ledger.apply(command);
    }
    ledger
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");

    for count in [10_000u32, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut ledger = Ledger::new();
                for command in CommandGenerator::new(count) {
                    let _ = black_box(ledger.apply(command));
                }
                ledger
            });
        });
    }

    group.finish();
}

fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");

    for count in [10_000u32, 100_000] {
        let ledger = build_ledger(count);
        group.bench_with_input(BenchmarkId::new("all", count), &ledger, |b, ledger| {
            b.iter(|| black_box(reconstruct(ledger.history(), None)).len());
        });
        group.bench_with_input(BenchmarkId::new("one_head", count), &ledger, |b, ledger| {
            b.iter(|| black_box(reconstruct(ledger.history(), Some("Food"))).len());
        });
    }

    group.finish();
}

fn bench_consistency(c: &mut Criterion) {
    let ledger = build_ledger(100_000);
    c.bench_function("check_consistency_100k", |b| {
        b.iter(|| black_box(ledger.check_consistency()).is_ok());
    });
}

criterion_group!(benches, bench_apply, bench_reconstruct, bench_consistency);
criterion_main!(benches);
