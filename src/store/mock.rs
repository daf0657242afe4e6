//! In-memory table store for unit testing.
//!
//! This module provides a store that can be used in tests and local
//! runs without making real network requests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::records::{Row, Table};

use super::{IsFilter, TableStore};

/// Configuration for mock store behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether to fail select requests.
    pub fail_select: bool,
    /// Whether to fail insert requests.
    pub fail_insert: bool,
    /// Whether inserts store the row but return no representation.
    pub empty_insert: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

/// In-memory table store.
///
/// Clones share the same tables, so a test can keep a handle while the
/// router owns another.
#[derive(Debug, Clone)]
pub struct MockTableStore {
    /// Mock configuration.
    config: MockConfig,
    /// Rows per table, in insertion order.
    tables: Arc<DashMap<Table, Vec<Row>>>,
    /// Column defaults applied on insert.
    defaults: Arc<DashMap<Table, Row>>,
    /// Next `id` to assign.
    next_id: Arc<AtomicU64>,
}

impl MockTableStore {
    /// Create a new mock store with default configuration.
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create a mock store with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            tables: Arc::new(DashMap::new()),
            defaults: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// A store whose every call fails, as if the database were down.
    pub fn unavailable() -> Self {
        Self::with_config(MockConfig {
            fail_select: true,
            fail_insert: true,
            ..MockConfig::default()
        })
    }

    /// Set a column default applied to rows inserted without that column.
    pub fn with_column_default(self, table: Table, column: &str, value: Value) -> Self {
        self.defaults
            .entry(table)
            .or_default()
            .insert(column.to_string(), value);
        self
    }

    /// Add a row directly, bypassing defaults and fault injection.
    pub fn seed(&self, table: Table, row: Row) {
        self.tables.entry(table).or_default().push(row);
    }

    /// All rows currently stored in `table`.
    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.tables
            .get(&table)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }

    /// Clear all mock data.
    pub fn clear(&self) {
        self.tables.clear();
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    /// Fill in defaults, `id` and `created_at` the way the database would.
    fn materialize(&self, table: Table, mut row: Row) -> Row {
        if let Some(defaults) = self.defaults.get(&table) {
            for (column, value) in defaults.iter() {
                if !row.contains_key(column) {
                    row.insert(column.clone(), value.clone());
                }
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        row.insert("id".to_string(), Value::from(id));

        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map(Value::String)
            .unwrap_or(Value::Null);
        row.entry("created_at").or_insert(created_at);

        row
    }
}

impl Default for MockTableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableStore for MockTableStore {
    async fn select(&self, table: Table, filter: &IsFilter) -> Result<Vec<Row>, StoreError> {
        self.simulate_latency().await;

        if self.config.fail_select {
            return Err(StoreError::Unavailable("Mock select failure".to_string()));
        }

        Ok(self
            .rows(table)
            .into_iter()
            .filter(|row| filter.matches(row))
            .collect())
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Vec<Row>, StoreError> {
        self.simulate_latency().await;

        if self.config.fail_insert {
            return Err(StoreError::Unavailable("Mock insert failure".to_string()));
        }

        let stored = self.materialize(table, row);
        self.tables.entry(table).or_default().push(stored.clone());

        if self.config.empty_insert {
            return Ok(Vec::new());
        }
        Ok(vec![stored])
    }
}
