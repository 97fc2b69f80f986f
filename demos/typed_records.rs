//! Typed structs in, JSON out.
//!
//! Records can be built from any `Serialize` struct; the field order of the
//! struct becomes the column order of the statement. Rows serialize as JSON
//! objects keyed by column name.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p dynamic-db-demos --example typed_records
//! ```

use dynamic_db::DynamicDb;
use dynamic_db_core::{PropertyBag, Record, record};
use dynamic_db_sqlite::SqliteExecutor;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct NewProduct<'a> {
    sku: &'a str,
    name: &'a str,
    price: f64,
    discontinued: bool,
}

fn main() {
    let executor = SqliteExecutor::open_in_memory().unwrap();
    executor
        .execute_batch(
            "CREATE TABLE Products (
                Id INTEGER PRIMARY KEY,
                Sku TEXT NOT NULL UNIQUE,
                Name TEXT NOT NULL,
                Price DECIMAL(10, 2) NOT NULL,
                Discontinued BOOLEAN NOT NULL DEFAULT 0
            );",
        )
        .unwrap();
    let db = DynamicDb::new(executor);

    let products = [
        NewProduct { sku: "BLT-10", name: "Bolt", price: 0.25, discontinued: false },
        NewProduct { sku: "NUT-10", name: "Nut", price: 0.1, discontinued: false },
        NewProduct { sku: "WSH-01", name: "Washer", price: 0.05, discontinued: true },
    ];
    let records: Vec<Record> = products
        .iter()
        .map(|p| Record::from_serialize(p).unwrap())
        .collect();

    let inserted = db.insert("Products", &records).unwrap();
    println!("{}", serde_json::to_string_pretty(&inserted).unwrap());

    let active = db
        .select("Products", &[record! { "Discontinued" => false }])
        .unwrap();
    for product in &active {
        println!(
            "{} costs {:.2}",
            product.get_str("Name").unwrap_or("?"),
            product.get_f64("Price").unwrap_or_default()
        );
    }

    // A row is a property bag, so it can go straight back as criteria.
    let washer = inserted[2].to_record();
    let removed = db.delete_by_keys("Products", &[washer]).unwrap();
    println!("Removed {}", serde_json::to_string(&removed[0]).unwrap());
}
