//! Seeding test data that cleans up after itself.
//!
//! `TestDb` remembers every row it inserts and deletes them, newest first,
//! when it goes out of scope. The database is configured from a YAML file
//! in a temporary directory.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p dynamic-db-demos --example seeded_tests
//! ```

use dynamic_db::{DynamicDb, TestDb};
use dynamic_db_core::record;
use dynamic_db_sqlite::{SqliteConfig, SqliteExecutor};

fn main() {
    let dir = std::env::temp_dir().join("dynamic_db_seeded_tests");
    std::fs::create_dir_all(&dir).unwrap();
    let config_path = dir.join("sqlite.yml");

    SqliteConfig::file(dir.join("orders.db")).save(&config_path).unwrap();
    let config = SqliteConfig::load(&config_path).unwrap();
    let executor = SqliteExecutor::from_config(&config).unwrap();
    executor
        .execute_batch(
            "DROP TABLE IF EXISTS OrderLines;
             DROP TABLE IF EXISTS Orders;
             CREATE TABLE Orders (Id INTEGER PRIMARY KEY, Customer TEXT NOT NULL);
             CREATE TABLE OrderLines (
                 OrderId INTEGER NOT NULL REFERENCES Orders (Id),
                 Line INTEGER NOT NULL,
                 Item TEXT NOT NULL,
                 PRIMARY KEY (OrderId, Line)
             );",
        )
        .unwrap();

    {
        let mut test_db = TestDb::new(DynamicDb::new(&executor));

        let order = test_db
            .insert_tracked("Orders", &[record! { "Customer" => "ACME" }])
            .unwrap();
        let order_id = order[0].get_i64("Id").unwrap();
        test_db
            .insert_tracked(
                "OrderLines",
                &[
                    record! { "OrderId" => order_id, "Line" => 1, "Item" => "Anvil" },
                    record! { "OrderId" => order_id, "Line" => 2, "Item" => "Rope" },
                ],
            )
            .unwrap();

        let lines = test_db
            .select("OrderLines", &[record! { "OrderId" => order_id }])
            .unwrap();
        println!("Order {order_id} has {} lines", lines.len());
        println!("Tracked batches: {}", test_db.tracked_batches());
    }

    // Lines were deleted before their order, so the foreign key held.
    let left: i64 = executor
        .connection()
        .query_row(
            "SELECT (SELECT COUNT(*) FROM Orders) + (SELECT COUNT(*) FROM OrderLines)",
            [],
            |row| row.get(0),
        )
        .unwrap();
    println!("Rows left after cleanup: {left}");
}
