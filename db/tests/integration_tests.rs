use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dynamic_db::{
    Caches, Dialect, DynamicDb, DynamicDbError, Result, RowSink, SqlServerDialect,
    StatementExecutor, TestDb,
};
use dynamic_db_core::{
    ColumnShape, PropertyBag, RowShape, Statement, StatementKind, ValidationError, Value,
    ValueKind, record,
};

// ---------------------------------------------------------------------------
// A scripted SQL Server
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
#[error("Invalid column name '{0}'.")]
struct InvalidColumn(String);

enum Response {
    Rows(Vec<Vec<Value>>),
    Fail(&'static str),
}

struct FakeServer {
    identity: String,
    discoveries: Arc<AtomicUsize>,
    log: Mutex<Vec<Statement>>,
    responses: Mutex<VecDeque<Response>>,
}

impl FakeServer {
    fn new(identity: &str) -> Self {
        Self::sharing_counter(identity, Arc::new(AtomicUsize::new(0)))
    }

    fn sharing_counter(identity: &str, discoveries: Arc<AtomicUsize>) -> Self {
        Self {
            identity: identity.to_string(),
            discoveries,
            log: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
        }
    }

    fn respond(&self, response: Response) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn statements(&self) -> Vec<Statement> {
        self.log.lock().unwrap().clone()
    }

    fn discoveries(&self) -> usize {
        self.discoveries.load(Ordering::SeqCst)
    }
}

fn people_shape() -> RowShape {
    RowShape::new(vec![
        ColumnShape::new("Id", ValueKind::Integer, false),
        ColumnShape::new("FirstName", ValueKind::Text, false),
        ColumnShape::new("MiddleInitial", ValueKind::Text, true),
        ColumnShape::new("Age", ValueKind::Integer, true),
        ColumnShape::new("CreatedDate", ValueKind::Timestamp, false),
    ])
}

fn people_catalog() -> Vec<Vec<Value>> {
    let column = |name: &str, ty: &str, len: Option<i64>, scale: Option<i64>, nullable, pk| {
        vec![
            Value::from(name),
            Value::from(ty),
            Value::from(len),
            Value::Null,
            Value::from(scale),
            Value::Bool(nullable),
            Value::Bool(pk),
        ]
    };
    vec![
        column("Id", "int", None, Some(0), false, true),
        column("FirstName", "nvarchar", Some(50), None, false, false),
        column("MiddleInitial", "nchar", Some(1), None, true, false),
        column("Age", "int", None, Some(0), true, false),
        column("CreatedDate", "datetime2", None, Some(7), false, false),
    ]
}

fn person(id: i64, first_name: &str) -> Vec<Value> {
    vec![
        Value::Integer(id),
        Value::from(first_name),
        Value::Null,
        Value::Integer(50),
        Value::from("2024-05-01 10:30:00.1234567"),
    ]
}

impl StatementExecutor for FakeServer {
    fn connection_identity(&self) -> &str {
        &self.identity
    }

    fn dialect(&self) -> &dyn Dialect {
        &SqlServerDialect
    }

    fn execute(&self, statement: &Statement) -> Result<usize> {
        self.log.lock().unwrap().push(statement.clone());
        Ok(3)
    }

    fn query(&self, statement: &Statement, sink: &mut dyn RowSink) -> Result<()> {
        self.log.lock().unwrap().push(statement.clone());

        if statement.text.contains("INFORMATION_SCHEMA") {
            self.discoveries.fetch_add(1, Ordering::SeqCst);
            let catalog_shape = RowShape::new(
                (0..7)
                    .map(|i| ColumnShape::new(format!("c{i}"), ValueKind::Any, true))
                    .collect(),
            );
            sink.begin(&catalog_shape)?;
            if statement.parameter("Table") == Some(&Value::from("People")) {
                for row in people_catalog() {
                    sink.row(row)?;
                }
            }
            return Ok(());
        }

        let response = self.responses.lock().unwrap().pop_front();
        match response {
            Some(Response::Fail(column)) => Err(DynamicDbError::engine(InvalidColumn(column.into()))),
            Some(Response::Rows(rows)) => {
                sink.begin(&people_shape())?;
                for row in rows {
                    sink.row(row)?;
                }
                Ok(())
            }
            None => sink.begin(&people_shape()),
        }
    }
}

fn isolated(server: &FakeServer) -> DynamicDb<&FakeServer> {
    DynamicDb::with_caches(server, Arc::new(Caches::new()))
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn test_insert_returns_generated_columns() {
    let server = FakeServer::new("server-a");
    server.respond(Response::Rows(vec![person(1, "John")]));
    let db = isolated(&server);

    let rows = db
        .insert(
            "dbo.People",
            &[record! { "FirstName" => "John", "Age" => 50, "MiddleInitial" => Value::Null }],
        )
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_i64("Id"), Some(1));
    assert!(rows[0].is_null("MiddleInitial"));
    assert!(rows[0].get_timestamp("CreatedDate").is_some());

    let statements = server.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[1].text.starts_with("DECLARE @Record TABLE ([Id] INT)\n\nINSERT INTO dbo.People"));
    assert!(statements[1].text.contains("VALUES (@FirstName_0, @Age_0, NULL)"));
}

#[test]
fn test_select_never_consults_catalog() {
    let server = FakeServer::new("server-a");
    server.respond(Response::Rows(vec![person(1, "A"), person(2, "B")]));
    let db = isolated(&server);

    let rows = db.select("dbo.People", &[]).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(server.discoveries(), 0);
    assert_eq!(server.statements()[0].text, "SELECT *\nFROM dbo.People");
}

#[test]
fn test_delete_outputs_every_column() {
    let server = FakeServer::new("server-a");
    server.respond(Response::Rows(vec![person(4, "Gone")]));
    let db = isolated(&server);

    let rows = db.delete("dbo.People", &[record! { "Id" => 4 }]).unwrap();

    assert_eq!(rows[0].get_str("FirstName"), Some("Gone"));
    let text = &server.statements()[1].text;
    assert!(text.starts_with(
        "DECLARE @Record TABLE ([Id] INT, [FirstName] NVARCHAR(50), [MiddleInitial] NCHAR(1), [Age] INT, [CreatedDate] DATETIME2(7))"
    ));
    assert!(text.ends_with("SELECT *\nFROM @Record"));
}

#[test]
fn test_execute_returns_affected_count() {
    let server = FakeServer::new("server-a");
    let db = isolated(&server);

    let affected = db
        .execute(
            "UPDATE dbo.People SET Age = Age + 1 WHERE Age > @Age",
            &record! { "Age" => 30 },
            StatementKind::Text,
        )
        .unwrap();

    assert_eq!(affected, 3);
    assert_eq!(server.statements()[0].parameter("Age"), Some(&Value::Integer(30)));
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn test_shape_mismatch_issues_no_statement() {
    let server = FakeServer::new("server-a");
    let db = isolated(&server);

    let err = db
        .insert(
            "dbo.People",
            &[
                record! { "FirstName" => "A", "Age" => 1 },
                record! { "FirstName" => "B" },
            ],
        )
        .unwrap_err();

    assert!(matches!(err, DynamicDbError::InconsistentRecordShape { index: 1, .. }));
    assert!(server.statements().is_empty());
}

#[test]
fn test_invalid_table_name_fails_before_anything_runs() {
    let server = FakeServer::new("server-a");
    let db = isolated(&server);

    assert!(matches!(
        db.select("People; DROP TABLE People", &[]),
        Err(DynamicDbError::Validation(ValidationError::InvalidTableName(_)))
    ));
    assert!(matches!(
        db.delete("", &[]),
        Err(DynamicDbError::Validation(ValidationError::EmptyTableName))
    ));
    assert!(server.statements().is_empty());
}

#[test]
fn test_missing_table_is_schema_not_found() {
    let server = FakeServer::new("server-a");
    let db = isolated(&server);

    let err = db
        .update("dbo.Missing", &record! { "Age" => 1 }, &[])
        .unwrap_err();

    assert!(matches!(err, DynamicDbError::SchemaNotFound(ref table) if table == "dbo.Missing"));
    assert_eq!(server.statements().len(), 1);
}

#[test]
fn test_engine_error_is_not_reworded() {
    let server = FakeServer::new("server-a");
    server.respond(Response::Fail("Nope"));
    let db = isolated(&server);

    let err = db.select("dbo.People", &[record! { "Nope" => 1 }]).unwrap_err();

    assert_eq!(err.to_string(), "Invalid column name 'Nope'.");
    assert!(err.engine_error().unwrap().downcast_ref::<InvalidColumn>().is_some());
}

// ---------------------------------------------------------------------------
// Shared caches
// ---------------------------------------------------------------------------

#[test]
fn test_schema_discovered_once_per_database() {
    let caches = Arc::new(Caches::new());
    let counter = Arc::new(AtomicUsize::new(0));
    let first = FakeServer::sharing_counter("server-a", Arc::clone(&counter));
    let second = FakeServer::sharing_counter("server-a", Arc::clone(&counter));
    let elsewhere = FakeServer::sharing_counter("server-b", Arc::clone(&counter));

    for server in [&first, &second] {
        DynamicDb::with_caches(server, Arc::clone(&caches))
            .delete("dbo.People", &[])
            .unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    DynamicDb::with_caches(&elsewhere, Arc::clone(&caches))
        .delete("dbo.People", &[])
        .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(caches.schemas.len(), 2);
}

#[test]
fn test_concurrent_facades_share_one_schema_and_row_type() {
    let caches = Arc::new(Caches::new());
    let counter = Arc::new(AtomicUsize::new(0));

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let caches = Arc::clone(&caches);
                let counter = Arc::clone(&counter);
                scope.spawn(move || {
                    let server = FakeServer::sharing_counter("server-a", counter);
                    server.respond(Response::Rows(vec![person(i, "Worker")]));
                    let db = DynamicDb::with_caches(server, caches);
                    db.update("dbo.People", &record! { "Age" => i }, &[record! { "Id" => i }])
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap().len(), 1);
        }
    });

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(caches.schemas.len(), 1);
    assert_eq!(caches.row_types.table_types(), 1);
}

#[test]
fn test_routine_results_cached_free_text_not() {
    let server = FakeServer::new("server-a");
    let db = isolated(&server);

    for _ in 0..2 {
        db.query("dbo.ListPeople", &record! {}, StatementKind::Procedure)
            .unwrap();
        db.query("SELECT * FROM dbo.People", &record! {}, StatementKind::Text)
            .unwrap();
    }

    assert_eq!(db.caches().row_types.routine_types(), 1);
    assert_eq!(db.caches().row_types.table_types(), 0);
}

// ---------------------------------------------------------------------------
// TestDb
// ---------------------------------------------------------------------------

#[test]
fn test_test_db_deletes_tracked_rows_on_drop() {
    let server = FakeServer::new("server-a");
    server.respond(Response::Rows(vec![person(1, "A"), person(2, "B")]));
    {
        let mut harness = TestDb::new(isolated(&server));
        let rows = harness
            .insert_tracked(
                "dbo.People",
                &[record! { "FirstName" => "A" }, record! { "FirstName" => "B" }],
            )
            .unwrap();
        assert_eq!(rows[1].to_record().get("Id"), Some(&Value::Integer(2)));
        assert_eq!(harness.tracked_batches(), 1);
    }

    let statements = server.statements();
    let cleanup = statements.last().unwrap();
    assert!(cleanup.text.contains("DELETE FROM dbo.People\nOUTPUT DELETED.[Id]"));
    assert!(cleanup.text.contains("WHERE [Id] IN (@Id_0, @Id_1)"));
    assert_eq!(cleanup.parameter("Id_1"), Some(&Value::Integer(2)));
}

#[test]
fn test_test_db_cleanup_reports_failure_and_keeps_batch() {
    let server = FakeServer::new("server-a");
    server.respond(Response::Rows(vec![person(1, "A")]));
    server.respond(Response::Fail("Id"));

    let mut harness = TestDb::new(isolated(&server));
    harness
        .insert_tracked("dbo.People", &[record! { "FirstName" => "A" }])
        .unwrap();

    assert!(harness.cleanup().is_err());
    assert_eq!(harness.tracked_batches(), 1);

    assert_eq!(harness.cleanup().unwrap(), 0);
    assert_eq!(harness.tracked_batches(), 0);
}
