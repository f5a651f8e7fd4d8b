//! In-memory stand-ins for the pool, catalogs and query engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::query::TileQuery;
use crate::schema::SpatialCatalog;
use crate::service::{ConnectionSource, TileExecutor};

#[derive(Clone, Debug, Default)]
pub struct FakeTable {
    registered: Option<String>,
    columns: Vec<(String, String)>,
}

impl FakeTable {
    pub fn registered(geometry_column: &str) -> FakeTable {
        FakeTable {
            registered: Some(geometry_column.to_owned()),
            columns: vec![],
        }
    }

    pub fn unregistered() -> FakeTable {
        FakeTable::default()
    }

    pub fn column(mut self, name: &str, udt_name: &str) -> FakeTable {
        self.columns.push((name.to_owned(), udt_name.to_owned()));
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
    fallback_scans: AtomicUsize,
    tile_queries: AtomicUsize,
}

#[derive(Clone, Debug)]
pub struct FakeDatabase {
    tables: HashMap<String, FakeTable>,
    tile: Option<Vec<u8>>,
    broken_catalog: bool,
    failing_query: bool,
    stalled_query: bool,
    unavailable: bool,
    counters: Arc<Counters>,
}

impl FakeDatabase {
    pub fn new() -> FakeDatabase {
        FakeDatabase {
            tables: HashMap::new(),
            tile: Some(vec![0x1a, 0x02, 0x78, 0x01]),
            broken_catalog: false,
            failing_query: false,
            stalled_query: false,
            unavailable: false,
            counters: Arc::default(),
        }
    }

    pub fn with_table(mut self, name: &str, table: FakeTable) -> FakeDatabase {
        self.tables.insert(name.to_owned(), table);
        self
    }

    /// `None` stands for both a missing row and a NULL blob.
    pub fn with_tile(mut self, tile: Option<Vec<u8>>) -> FakeDatabase {
        self.tile = tile;
        self
    }

    pub fn with_broken_catalog(mut self) -> FakeDatabase {
        self.broken_catalog = true;
        self
    }

    pub fn with_failing_query(mut self) -> FakeDatabase {
        self.failing_query = true;
        self
    }

    pub fn with_stalled_query(mut self) -> FakeDatabase {
        self.stalled_query = true;
        self
    }

    pub fn unavailable(mut self) -> FakeDatabase {
        self.unavailable = true;
        self
    }

    /// Hands out a connection directly, bypassing availability checks.
    pub fn connect(&self) -> FakeConnection {
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        FakeConnection { db: self.clone() }
    }

    pub fn acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    pub fn fallback_scans(&self) -> usize {
        self.counters.fallback_scans.load(Ordering::SeqCst)
    }

    pub fn tile_queries(&self) -> usize {
        self.counters.tile_queries.load(Ordering::SeqCst)
    }

    fn catalog_error(&self) -> Result<(), sqlx::Error> {
        if self.broken_catalog {
            Err(sqlx::Error::Protocol(String::from("catalog unavailable")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConnectionSource for FakeDatabase {
    type Connection = FakeConnection;

    async fn acquire(&self) -> Result<FakeConnection, sqlx::Error> {
        if self.unavailable {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.connect())
    }
}

/// Counts itself as released when dropped, like a pooled connection.
#[derive(Debug)]
pub struct FakeConnection {
    db: FakeDatabase,
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.db.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SpatialCatalog for FakeConnection {
    async fn registered_geometry_column(
        &mut self,
        _db_schema: &str,
        table: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        self.db.catalog_error()?;
        Ok(self
            .db
            .tables
            .get(table)
            .and_then(|t| t.registered.clone()))
    }

    async fn first_spatial_column(
        &mut self,
        _db_schema: &str,
        table: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        self.db.catalog_error()?;
        self.db.counters.fallback_scans.fetch_add(1, Ordering::SeqCst);
        Ok(self.db.tables.get(table).and_then(|t| {
            t.columns
                .iter()
                .find(|(_, udt)| udt == "geometry" || udt == "geography")
                .map(|(name, _)| name.clone())
        }))
    }

    async fn columns_except(
        &mut self,
        _db_schema: &str,
        table: &str,
        excluded: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        self.db.catalog_error()?;
        Ok(self
            .db
            .tables
            .get(table)
            .map(|t| {
                t.columns
                    .iter()
                    .filter(|(name, _)| name != excluded)
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl TileExecutor for FakeConnection {
    async fn fetch_tile(&mut self, _query: &TileQuery) -> Result<Option<Vec<u8>>, sqlx::Error> {
        self.db.counters.tile_queries.fetch_add(1, Ordering::SeqCst);
        if self.db.stalled_query {
            futures::future::pending::<()>().await;
        }
        if self.db.failing_query {
            return Err(sqlx::Error::Protocol(String::from("query failed")));
        }
        Ok(self.db.tile.clone())
    }
}
