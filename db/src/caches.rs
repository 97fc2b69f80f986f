//! The shared cache service.

use std::sync::{Arc, OnceLock};

use crate::catalog::SchemaCatalog;
use crate::row_cache::RowTypeCache;

/// Schema and row-type caches shared by every [`DynamicDb`](crate::DynamicDb)
/// that holds the same `Arc<Caches>`.
///
/// Both caches are partitioned by connection identity, so one instance can
/// serve any number of databases. Entries live as long as the `Caches`.
#[derive(Debug, Default)]
pub struct Caches {
    pub schemas: SchemaCatalog,
    pub row_types: RowTypeCache,
}

impl Caches {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance used by [`DynamicDb::new`](crate::DynamicDb::new).
    pub fn process() -> Arc<Caches> {
        static PROCESS: OnceLock<Arc<Caches>> = OnceLock::new();
        Arc::clone(PROCESS.get_or_init(|| Arc::new(Caches::new())))
    }
}
