use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::NaiveDate;
use stockbook_accounting::{JournalPostingEngine, PostingContext};
use stockbook_core::{CompanyId, ItemId, LocationId, RecordId, UserId};
use stockbook_infra::{InMemoryCompanyDirectory, InMemoryLedgerStore, InMemoryStockStore};
use stockbook_inventory::{CompanyFeatures, StockLedgerUpdater};
use stockbook_parties::{Counterparty, PartyId};
use stockbook_purchasing::{NewPurchase, NewPurchaseLine, Purchase, PurchaseId};
use stockbook_sales::{NewSale, NewSaleLine, Sale, SaleId};

fn sale(company_id: CompanyId, tax: i64) -> Sale {
    Sale::new(NewSale {
        id: SaleId::new(RecordId::new()),
        company_id,
        sale_number: Some("INV-BENCH".to_string()),
        sale_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        location_id: None,
        customer: Some(Counterparty::customer(PartyId::new(RecordId::new()), "Bench Customer")),
        lines: vec![NewSaleLine {
            item_id: ItemId::new(),
            quantity: 1,
            unit_price: 1000,
        }],
        subtotal: 1000,
        tax_amount: tax,
        total: 1000 + tax,
    })
    .unwrap()
}

fn purchase(company_id: CompanyId, location_id: LocationId, items: &[ItemId]) -> Purchase {
    Purchase::new(NewPurchase {
        id: PurchaseId::new(RecordId::new()),
        company_id,
        purchase_number: None,
        purchase_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        location_id: Some(location_id),
        vendor: None,
        lines: items
            .iter()
            .map(|item_id| NewPurchaseLine {
                item_id: *item_id,
                quantity: 3,
                unit_cost: 10,
            })
            .collect(),
        subtotal: 30 * items.len() as i64,
        tax_amount: 0,
        total: 30 * items.len() as i64,
    })
    .unwrap()
}

/// Posting latency as the month's journal grows (numbering scans existing entries).
fn bench_sale_posting(c: &mut Criterion) {
    let mut group = c.benchmark_group("sale_posting");

    for existing in [0usize, 1_000, 10_000].iter() {
        let company = CompanyId::new();
        let ledger = InMemoryLedgerStore::new();
        ledger.provision_standard_chart(company).unwrap();
        let engine = JournalPostingEngine::new(ledger);
        let ctx = PostingContext::now(UserId::new());
        for _ in 0..*existing {
            engine.post_from_sale(&sale(company, 0), &ctx).unwrap();
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(existing), existing, |b, _| {
            let document = sale(company, 180);
            b.iter(|| black_box(engine.post_from_sale(&document, &ctx).unwrap()));
        });
    }

    group.finish();
}

/// Stock updates per purchase for growing line counts.
fn bench_purchase_stock_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("purchase_stock_update");

    for lines in [1usize, 10, 100].iter() {
        let company = CompanyId::new();
        let companies = InMemoryCompanyDirectory::new();
        companies.upsert(company, CompanyFeatures::default());
        let updater = StockLedgerUpdater::new(InMemoryStockStore::new(), companies);
        let items: Vec<ItemId> = (0..*lines).map(|_| ItemId::new()).collect();
        let document = purchase(company, LocationId::new(), &items);

        group.throughput(Throughput::Elements(*lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), lines, |b, _| {
            b.iter(|| black_box(updater.on_purchase_created(&document).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sale_posting, bench_purchase_stock_update);
criterion_main!(benches);
