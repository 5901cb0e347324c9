#![allow(dead_code)]

pub use tabula::testutil::{FlakyStore, ORDERS_CSV, orders_batch, orders_ref, seeded_store};

use tabula::service::TabulaService;
use tabula::store::DirStore;
use tempfile::TempDir;

/// Service over a directory store seeded with SALES.ORDERS.
pub fn orders_service() -> (TabulaService, TempDir) {
    let (store, dir) = seeded_store(&[("SALES", "ORDERS", ORDERS_CSV)]);
    (TabulaService::new(Box::new(store)), dir)
}

/// Service whose store can be made to fail on demand via the returned handle.
pub fn flaky_orders_service() -> (TabulaService, FlakyStore<DirStore>, TempDir) {
    let (store, dir) = seeded_store(&[("SALES", "ORDERS", ORDERS_CSV)]);
    let flaky = FlakyStore::new(store);
    let handle = flaky.clone();
    (TabulaService::new(Box::new(flaky)), handle, dir)
}
