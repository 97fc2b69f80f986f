//! Insert, select, update, and delete without mapping code.
//!
//! Creates an in-memory SQLite database with a `People` table and runs
//! every facade operation against it. Each write prints the rows it
//! affected, generated key and defaulted columns included.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p dynamic-db-demos --example quickstart
//! ```

use dynamic_db::{DynamicDb, Row};
use dynamic_db_core::{StatementKind, Value, record};
use dynamic_db_sqlite::SqliteExecutor;

fn print_rows(label: &str, rows: &[Row]) {
    println!("{label} ({} rows)", rows.len());
    for row in rows {
        let fields: Vec<String> = row
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!("  {}", fields.join(", "));
    }
    println!();
}

fn main() {
    let executor = SqliteExecutor::open_in_memory().unwrap();
    executor
        .execute_batch(
            "CREATE TABLE People (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                FirstName NVARCHAR(50) NOT NULL,
                LastName NVARCHAR(50),
                Age INTEGER,
                CreatedDate DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            );",
        )
        .unwrap();

    let db = DynamicDb::new(executor);

    let inserted = db
        .insert(
            "People",
            &[
                record! { "FirstName" => "John", "LastName" => "Smith", "Age" => 50 },
                record! { "FirstName" => "Jane", "LastName" => "Smith", "Age" => 40 },
                record! { "FirstName" => "Bob", "LastName" => Value::Null, "Age" => 40 },
            ],
        )
        .unwrap();
    print_rows("Inserted", &inserted);
    println!("Row type: {}", inserted[0].row_type());
    println!();

    // Each criteria item is AND-ed; the items are OR-ed.
    let found = db
        .select(
            "People",
            &[
                record! { "LastName" => "Smith", "Age" => 50 },
                record! { "LastName" => Value::Null },
            ],
        )
        .unwrap();
    print_rows("Smiths aged 50, or without a last name", &found);

    let updated = db
        .update("People", &record! { "Age" => 41 }, &[record! { "FirstName" => "Jane" }])
        .unwrap();
    print_rows("Updated", &updated);

    let total = db
        .query(
            "SELECT COUNT(*) AS Total, AVG(Age) AS AverageAge FROM People",
            &record! {},
            StatementKind::Text,
        )
        .unwrap();
    print_rows("Summary", &total);

    let deleted = db.delete("People", &[record! { "Age" => 40 }]).unwrap();
    print_rows("Deleted", &deleted);

    let cached = db.caches();
    println!(
        "Cached schemas: {}, cached table row types: {}",
        cached.schemas.len(),
        cached.row_types.table_types()
    );
}
