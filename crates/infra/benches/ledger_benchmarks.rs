use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, TimeZone, Utc};
use folio_accounting::{Account, AccountType, Transaction};
use folio_core::{AccountId, Amount, Currency, UserId};
use folio_infra::{Ledger, LedgerConfig};

fn account(id: &str) -> AccountId {
    AccountId::new(id).unwrap()
}

fn seeded_ledger(accounts: usize) -> Ledger {
    let mut ledger = Ledger::in_memory(LedgerConfig::default());
    let user = UserId::new("bench").unwrap();
    ledger
        .create_account(
            Account::new(account("cash"), "1000", "Cash", AccountType::Asset),
            &user,
        )
        .unwrap();
    for i in 0..accounts {
        let id = format!("revenue-{i}");
        ledger
            .create_account(
                Account::new(account(&id), format!("4{i:03}"), id.clone(), AccountType::Income),
                &user,
            )
            .unwrap();
    }
    ledger
}

fn post_sale(ledger: &mut Ledger, revenue: &AccountId, value: i64) {
    let user = UserId::new("bench").unwrap();
    let usd = Currency::new("USD").unwrap();
    let valid_time = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();

    let txn = Transaction::new("sale", valid_time)
        .debit(account("cash"), Amount::new(value, usd.clone()))
        .credit(revenue.clone(), Amount::new(value, usd));
    let created = ledger.create_transaction(txn, &user).unwrap();
    ledger.post_transaction(created.id, &user).unwrap();
}

fn bench_posting(c: &mut Criterion) {
    let mut group = c.benchmark_group("posting");
    group.throughput(Throughput::Elements(1));

    group.bench_function("create_and_post", |b| {
        let mut ledger = seeded_ledger(1);
        let revenue = account("revenue-0");
        b.iter(|| post_sale(&mut ledger, &revenue, black_box(100)));
    });

    group.finish();
}

fn bench_trial_balance(c: &mut Criterion) {
    let mut group = c.benchmark_group("trial_balance");

    for postings in [10usize, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("recompute", postings),
            &postings,
            |b, &count| {
                let mut ledger = seeded_ledger(10);
                let revenues: Vec<AccountId> =
                    (0..10).map(|i| account(&format!("revenue-{i}"))).collect();
                for i in 0..count {
                    post_sale(&mut ledger, &revenues[i % revenues.len()], (i as i64 % 50) + 1);
                }
                let as_of = Utc::now() + Duration::days(1);

                b.iter(|| black_box(ledger.get_trial_balance(as_of, None).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");

    for postings in [100usize, 1000] {
        group.bench_with_input(BenchmarkId::new("rebuild", postings), &postings, |b, &count| {
            let mut ledger = seeded_ledger(1);
            let revenue = account("revenue-0");
            for i in 0..count {
                post_sale(&mut ledger, &revenue, (i as i64 % 50) + 1);
            }

            b.iter(|| black_box(ledger.replay().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_posting, bench_trial_balance, bench_replay);
criterion_main!(benches);
