use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rust_decimal::Decimal;
use stockledger_consignment::ConsignmentDraft;
use stockledger_core::{BrandId, ClientId, SupplierId};
use stockledger_infra::{InMemoryDatastore, LedgerConfig, ReconciliationChecker, TransactionCoordinator};
use stockledger_products::{NewProduct, ProductId, SaleFormat};
use stockledger_purchasing::PurchaseDraft;
use stockledger_sales::SaleDraft;
use std::sync::Arc;

type Coordinator = TransactionCoordinator<Arc<InMemoryDatastore>>;

fn seeded(products: usize, stock: i64) -> (Arc<InMemoryDatastore>, Coordinator, Vec<ProductId>) {
    let store = Arc::new(InMemoryDatastore::new());
    let coordinator = TransactionCoordinator::new(store.clone(), LedgerConfig::default());
    let ids = (0..products)
        .map(|i| {
            coordinator
                .register_product(NewProduct {
                    brand_id: BrandId::new(),
                    name: format!("product-{i}"),
                    sale_price: Decimal::new(1200, 2),
                    initial_cost: Decimal::new(500, 2),
                    initial_stock: stock,
                    units_per_case: 6,
                    min_stock: 0,
                })
                .unwrap()
                .id_typed()
        })
        .collect();
    (store, coordinator, ids)
}

/// Throughput of committed operations through the coordinator.
fn bench_coordinator(c: &mut Criterion) {
    let mut group = c.benchmark_group("coordinator");

    for ops in [100usize, 1_000] {
        group.throughput(Throughput::Elements(ops as u64));
        group.bench_with_input(BenchmarkId::new("purchase_sale_cycle", ops), &ops, |b, &ops| {
            b.iter(|| {
                let (_store, coordinator, ids) = seeded(10, 0);
                let client = ClientId::new();
                for i in 0..ops {
                    let p = ids[i % ids.len()];
                    coordinator
                        .record_purchase(PurchaseDraft::new(SupplierId::new(), "OC").line(
                            p,
                            5,
                            Decimal::new(400 + (i as i64 % 50), 2),
                        ))
                        .unwrap();
                    coordinator
                        .record_sale(SaleDraft::new(client, "F").line(p, SaleFormat::Unit, 3))
                        .unwrap();
                }
                black_box(coordinator);
            });
        });
    }

    group.finish();
}

/// Cost of a full reconciliation pass as the ledger grows.
fn bench_reconciliation(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconciliation");

    for movements in [1_000usize, 10_000] {
        let (store, coordinator, ids) = seeded(50, 1_000_000);
        let client = ClientId::new();
        for i in 0..movements / 2 {
            let p = ids[i % ids.len()];
            coordinator
                .record_sale(SaleDraft::new(client, "F").line(p, SaleFormat::Unit, 1))
                .unwrap();
            coordinator
                .deliver_consignment(ConsignmentDraft::new(client).line(p, 1))
                .unwrap();
        }
        let checker = ReconciliationChecker::new(store);

        group.throughput(Throughput::Elements(movements as u64));
        group.bench_with_input(BenchmarkId::new("check_all", movements), &movements, |b, _| {
            b.iter(|| black_box(checker.check_all().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_coordinator, bench_reconciliation);
criterion_main!(benches);
