//! End-to-end tests over the in-memory adapters.
//!
//! Tests: OrderEntryService → StockLedgerUpdater → StockStore, and
//! JournalPostingEngine → LedgerStore.
//!
//! Verifies:
//! - Purchases and sales move stock exactly once and deletions reverse them
//! - Feature flags hand stock ownership to GRNs / delivery notes
//! - Journal entries balance, follow the line recipes, and number per company and month
//! - Any posting failure leaves the ledger untouched

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use proptest::prelude::*;

    use stockbook_accounting::{
        ExpenseInput, JournalPostingEngine, PostingContext, PostingError, Side, codes,
    };
    use stockbook_core::{CompanyId, ItemId, LocationId, RecordId, UserId};
    use stockbook_inventory::{
        CompanyFeatures, StockError, StockKey, StockLedgerUpdater, StockOutcome, StockOwner,
    };
    use stockbook_parties::{Counterparty, PartyId};
    use stockbook_purchasing::{NewPurchase, NewPurchaseLine, Purchase, PurchaseId};
    use stockbook_sales::{NewSale, NewSaleLine, Sale, SaleId};

    use crate::ledger_store::InMemoryLedgerStore;
    use crate::order_entry::{InMemoryDocumentStore, OrderEntryError, OrderEntryService};
    use crate::stock_store::{InMemoryCompanyDirectory, InMemoryStockStore};

    type Service = OrderEntryService<
        Arc<InMemoryDocumentStore>,
        Arc<InMemoryStockStore>,
        Arc<InMemoryCompanyDirectory>,
    >;

    struct Harness {
        company_id: CompanyId,
        location_id: LocationId,
        documents: Arc<InMemoryDocumentStore>,
        stocks: Arc<InMemoryStockStore>,
        companies: Arc<InMemoryCompanyDirectory>,
        service: Service,
    }

    impl Harness {
        fn new(features: CompanyFeatures) -> Self {
            stockbook_observability::init();

            let company_id = CompanyId::new();
            let documents = Arc::new(InMemoryDocumentStore::new());
            let stocks = Arc::new(InMemoryStockStore::new());
            let companies = Arc::new(InMemoryCompanyDirectory::new());
            companies.upsert(company_id, features);

            let service = OrderEntryService::new(
                documents.clone(),
                StockLedgerUpdater::new(stocks.clone(), companies.clone()),
            );

            Self {
                company_id,
                location_id: LocationId::new(),
                documents,
                stocks,
                companies,
                service,
            }
        }

        fn qty(&self, item_id: ItemId) -> i64 {
            self.stocks.quantity(&StockKey::new(item_id, self.location_id))
        }

        fn purchase(&self, lines: &[(ItemId, i64)]) -> Purchase {
            let subtotal: i64 = lines.iter().map(|(_, q)| q * 100).sum();
            Purchase::new(NewPurchase {
                id: PurchaseId::new(RecordId::new()),
                company_id: self.company_id,
                purchase_number: Some("PO-1001".to_string()),
                purchase_date: march(10),
                location_id: Some(self.location_id),
                vendor: Some(Counterparty::vendor(PartyId::new(RecordId::new()), "Globex")),
                lines: lines
                    .iter()
                    .map(|(item_id, quantity)| NewPurchaseLine {
                        item_id: *item_id,
                        quantity: *quantity,
                        unit_cost: 100,
                    })
                    .collect(),
                subtotal,
                tax_amount: 0,
                total: subtotal,
            })
            .unwrap()
        }

        fn sale(&self, lines: &[(ItemId, i64)]) -> Sale {
            let subtotal: i64 = lines.iter().map(|(_, q)| q * 250).sum();
            Sale::new(NewSale {
                id: SaleId::new(RecordId::new()),
                company_id: self.company_id,
                sale_number: None,
                sale_date: march(11),
                location_id: Some(self.location_id),
                customer: Some(Counterparty::customer(PartyId::new(RecordId::new()), "Acme Ltd")),
                lines: lines
                    .iter()
                    .map(|(item_id, quantity)| NewSaleLine {
                        item_id: *item_id,
                        quantity: *quantity,
                        unit_price: 250,
                    })
                    .collect(),
                subtotal,
                tax_amount: 0,
                total: subtotal,
            })
            .unwrap()
        }
    }

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn direct() -> CompanyFeatures {
        CompanyFeatures::default()
    }

    fn ledger_with_chart(company_id: CompanyId) -> InMemoryLedgerStore {
        let ledger = InMemoryLedgerStore::new();
        ledger.provision_standard_chart(company_id).unwrap();
        ledger
    }

    fn test_sale(company_id: CompanyId, subtotal: i64, tax: i64) -> Sale {
        Sale::new(NewSale {
            id: SaleId::new(RecordId::new()),
            company_id,
            sale_number: Some("INV-2026-001".to_string()),
            sale_date: march(15),
            location_id: None,
            customer: Some(Counterparty::customer(PartyId::new(RecordId::new()), "Acme Ltd")),
            lines: vec![NewSaleLine {
                item_id: ItemId::new(),
                quantity: 1,
                unit_price: subtotal,
            }],
            subtotal,
            tax_amount: tax,
            total: subtotal + tax,
        })
        .unwrap()
    }

    fn ctx() -> PostingContext {
        PostingContext::now(UserId::new())
    }

    // 1. Purchase with GRN disabled increments each line, creating rows from zero.
    #[test]
    fn purchase_increments_stock_from_zero() {
        let h = Harness::new(direct());
        let (a, b) = (ItemId::new(), ItemId::new());

        let outcome = h.service.record_purchase(h.purchase(&[(a, 5), (b, 3)])).unwrap();

        assert!(matches!(outcome, StockOutcome::Applied(ref rows) if rows.len() == 2));
        assert_eq!(h.qty(a), 5);
        assert_eq!(h.qty(b), 3);
    }

    // 2. Deleting the purchase restores the pre-creation quantities exactly.
    #[test]
    fn purchase_delete_is_exact_reversal() {
        let h = Harness::new(direct());
        let (a, b) = (ItemId::new(), ItemId::new());
        h.service.record_purchase(h.purchase(&[(a, 7)])).unwrap();
        let before = (h.qty(a), h.qty(b));

        let purchase = h.purchase(&[(a, 5), (b, 3)]);
        let purchase_id = purchase.id_typed();
        h.service.record_purchase(purchase).unwrap();
        h.service.delete_purchase(h.company_id, purchase_id).unwrap();

        assert_eq!((h.qty(a), h.qty(b)), before);
        assert_eq!(h.documents.purchase_count(h.company_id), 1);
    }

    // 3. Insufficient stock fails and mutates nothing.
    #[test]
    fn sale_beyond_available_stock_is_rejected() {
        let h = Harness::new(direct());
        let item = ItemId::new();
        h.service.record_purchase(h.purchase(&[(item, 2)])).unwrap();

        let err = h.service.record_sale(h.sale(&[(item, 5)])).unwrap_err();

        match err {
            OrderEntryError::Stock(StockError::InsufficientStock { available, required, .. }) => {
                assert_eq!((available, required), (2, 5));
            }
            other => panic!("expected insufficient stock, got {other:?}"),
        }
        assert_eq!(h.qty(item), 2);
    }

    // 4. With GRNs enabled, purchases never touch stock.
    #[test]
    fn grn_enabled_purchase_defers() {
        let h = Harness::new(CompanyFeatures {
            enable_grns: true,
            ..direct()
        });
        let item = ItemId::new();

        let outcome = h.service.record_purchase(h.purchase(&[(item, 9)])).unwrap();

        assert_eq!(outcome, StockOutcome::Deferred(StockOwner::DeferToGrn));
        assert!(h.stocks.list(h.company_id).is_empty());
        assert_eq!(h.documents.purchase_count(h.company_id), 1);
    }

    // 5. Sale with tax posts AR / Revenue / Tax with a well-formed number.
    #[test]
    fn sale_posting_with_tax() {
        let company = CompanyId::new();
        let engine = JournalPostingEngine::new(ledger_with_chart(company));

        let entry = engine.post_from_sale(&test_sale(company, 1000, 180), &ctx()).unwrap();

        let lines: Vec<_> = entry
            .lines()
            .iter()
            .map(|l| (l.account_code.as_str(), l.side(), l.debit_amount + l.credit_amount))
            .collect();
        assert_eq!(
            lines,
            vec![
                (codes::ACCOUNTS_RECEIVABLE, Side::Debit, 1180),
                (codes::SALES_REVENUE, Side::Credit, 1000),
                (codes::TAX_PAYABLE, Side::Credit, 180),
            ]
        );
        assert_eq!(entry.debit_total(), 1180);
        assert_eq!(entry.credit_total(), 1180);

        let number = entry.entry_number().to_string();
        assert!(number.starts_with("JE-2026-03-"));
        let seq = &number["JE-2026-03-".len()..];
        assert_eq!(seq.len(), 4);
        assert!(seq.bytes().all(|b| b.is_ascii_digit()));

        let stored = engine.store().entries(company);
        assert_eq!(stored, vec![entry]);
    }

    // 6. Zero tax means no tax line.
    #[test]
    fn sale_posting_without_tax_has_two_lines() {
        let company = CompanyId::new();
        let engine = JournalPostingEngine::new(ledger_with_chart(company));

        let entry = engine.post_from_sale(&test_sale(company, 640, 0), &ctx()).unwrap();

        assert_eq!(entry.lines().len(), 2);
        assert!(entry.lines().iter().all(|l| l.account_code != codes::TAX_PAYABLE));
    }

    // 7. Sequential numbers in one month start at 0001 and increase.
    #[test]
    fn entry_numbers_increase_within_month() {
        let company = CompanyId::new();
        let engine = JournalPostingEngine::new(ledger_with_chart(company));

        let numbers: Vec<String> = (0..3)
            .map(|_| {
                engine
                    .post_from_sale(&test_sale(company, 100, 0), &ctx())
                    .unwrap()
                    .entry_number()
                    .to_string()
            })
            .collect();

        assert_eq!(numbers, vec!["JE-2026-03-0001", "JE-2026-03-0002", "JE-2026-03-0003"]);
    }

    // 8. Missing account fails and rolls back for every posting kind.
    #[test]
    fn missing_account_rolls_back_every_posting_kind() {
        let company = CompanyId::new();
        let engine = JournalPostingEngine::new(InMemoryLedgerStore::new());

        let sale = engine.post_from_sale(&test_sale(company, 100, 10), &ctx());
        assert!(matches!(sale, Err(PostingError::AccountNotFound { ref code, .. }) if code == codes::ACCOUNTS_RECEIVABLE));

        let purchase = Purchase::new(NewPurchase {
            id: PurchaseId::new(RecordId::new()),
            company_id: company,
            purchase_number: None,
            purchase_date: march(2),
            location_id: None,
            vendor: None,
            lines: vec![NewPurchaseLine {
                item_id: ItemId::new(),
                quantity: 1,
                unit_cost: 10,
            }],
            subtotal: 10,
            tax_amount: 0,
            total: 10,
        })
        .unwrap();
        assert!(matches!(
            engine.post_from_purchase(&purchase, &ctx()),
            Err(PostingError::AccountNotFound { .. })
        ));

        let expense = ExpenseInput {
            company_id: company,
            expense_account_code: "6200".to_string(),
            amount: 75,
            entry_date: march(3),
            reference: "UTIL-03".to_string(),
            description: "Utilities".to_string(),
            party: None,
        };
        assert!(matches!(
            engine.post_from_expense(&expense, &ctx()),
            Err(PostingError::AccountNotFound { .. })
        ));

        assert_eq!(engine.store().entry_count(), 0);
    }

    // 9. An inactive tax account blocks posting even when a line would not use it.
    #[test]
    fn inactive_tax_account_blocks_posting() {
        let company = CompanyId::new();
        let ledger = ledger_with_chart(company);
        ledger.set_account_active(company, codes::TAX_PAYABLE, false).unwrap();
        let engine = JournalPostingEngine::new(ledger);

        let err = engine.post_from_sale(&test_sale(company, 500, 0), &ctx()).unwrap_err();

        assert_eq!(
            err,
            PostingError::AccountNotFound {
                company_id: company,
                code: codes::TAX_PAYABLE.to_string(),
            }
        );
        assert_eq!(engine.store().entry_count(), 0);
    }

    // 10. Sequences are per company.
    #[test]
    fn entry_sequences_are_per_company() {
        let (first, second) = (CompanyId::new(), CompanyId::new());
        let ledger = InMemoryLedgerStore::new();
        ledger.provision_standard_chart(first).unwrap();
        ledger.provision_standard_chart(second).unwrap();
        let engine = JournalPostingEngine::new(ledger);

        let a = engine.post_from_sale(&test_sale(first, 100, 0), &ctx()).unwrap();
        let b = engine.post_from_sale(&test_sale(second, 100, 0), &ctx()).unwrap();
        let c = engine.post_from_sale(&test_sale(first, 100, 0), &ctx()).unwrap();

        assert_eq!(a.entry_number().to_string(), "JE-2026-03-0001");
        assert_eq!(b.entry_number().to_string(), "JE-2026-03-0001");
        assert_eq!(c.entry_number().to_string(), "JE-2026-03-0002");
    }

    // 11. A rejected sale is not recorded.
    #[test]
    fn rejected_sale_is_not_recorded() {
        let h = Harness::new(direct());
        let item = ItemId::new();

        let sale = h.sale(&[(item, 1)]);
        let sale_id = sale.id_typed();
        assert!(h.service.record_sale(sale).is_err());

        assert_eq!(h.documents.sale(h.company_id, sale_id), None);
        assert_eq!(h.documents.sale_count(h.company_id), 0);
        assert!(h.stocks.list(h.company_id).is_empty());
    }

    #[test]
    fn sale_round_trip_and_delivery_note_deferral() {
        let h = Harness::new(direct());
        let item = ItemId::new();
        h.service.record_purchase(h.purchase(&[(item, 10)])).unwrap();

        let sale = h.sale(&[(item, 4)]);
        let sale_id = sale.id_typed();
        h.service.record_sale(sale).unwrap();
        assert_eq!(h.qty(item), 6);

        h.service.delete_sale(h.company_id, sale_id).unwrap();
        assert_eq!(h.qty(item), 10);

        // Deleting again reports not found and leaves stock alone.
        assert!(matches!(
            h.service.delete_sale(h.company_id, sale_id),
            Err(OrderEntryError::Domain(_))
        ));
        assert_eq!(h.qty(item), 10);

        // Switching delivery notes on hands sale movements over, without caching.
        h.companies.upsert(
            h.company_id,
            CompanyFeatures {
                enable_delivery_notes: true,
                ..direct()
            },
        );
        let outcome = h.service.record_sale(h.sale(&[(item, 25)])).unwrap();
        assert_eq!(outcome, StockOutcome::Deferred(StockOwner::DeferToDeliveryNote));
        assert_eq!(h.qty(item), 10);
    }

    #[test]
    fn concurrent_postings_get_distinct_numbers() {
        let company = CompanyId::new();
        let engine = Arc::new(JournalPostingEngine::new(ledger_with_chart(company)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    engine
                        .post_from_sale(&test_sale(company, 100, 0), &ctx())
                        .unwrap()
                        .entry_number()
                        .sequence()
                })
            })
            .collect();
        let mut sequences: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        sequences.sort_unstable();

        assert_eq!(sequences, (1..=8).collect::<Vec<u32>>());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: recording any batch of purchases and then deleting them in any
        /// order leaves every stock row at zero.
        #[test]
        fn purchases_then_deletions_net_to_zero(
            batches in prop::collection::vec(prop::collection::vec((0usize..4, 1i64..50), 1..5), 1..6),
            reverse in any::<bool>(),
        ) {
            let h = Harness::new(direct());
            let items: Vec<ItemId> = (0..4).map(|_| ItemId::new()).collect();

            let mut ids = Vec::new();
            for batch in &batches {
                let lines: Vec<(ItemId, i64)> = batch.iter().map(|(i, q)| (items[*i], *q)).collect();
                let purchase = h.purchase(&lines);
                ids.push(purchase.id_typed());
                h.service.record_purchase(purchase).unwrap();
            }
            if reverse {
                ids.reverse();
            }
            for id in ids {
                h.service.delete_purchase(h.company_id, id).unwrap();
            }

            for item in &items {
                prop_assert_eq!(h.qty(*item), 0);
            }
        }
    }
}
