//! Table store module.
//!
//! This module handles:
//! - The `TableStore` seam the HTTP handlers talk to
//! - The hosted Postgres REST gateway client
//! - An in-memory store with fault injection for testing

pub mod mock;
pub mod supabase;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::records::{Row, Table};

pub use mock::{MockConfig, MockTableStore};
pub use supabase::SupabaseClient;

/// `column IS value` filter, where `None` means SQL `NULL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsFilter {
    /// Column to test.
    pub column: String,
    /// Expected value.
    pub value: Option<bool>,
}

impl IsFilter {
    /// Filter on a boolean value.
    pub fn new(column: impl Into<String>, value: bool) -> Self {
        Self {
            column: column.into(),
            value: Some(value),
        }
    }

    /// Filter on `NULL`.
    pub fn null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: None,
        }
    }

    /// Operator form used in REST query strings, e.g. `is.false`.
    pub fn to_query_value(&self) -> String {
        format!("is.{}", self)
    }

    /// Whether `row` satisfies the filter.
    ///
    /// A missing column behaves like `NULL`.
    pub fn matches(&self, row: &Row) -> bool {
        match (self.value, row.get(&self.column)) {
            (None, None) | (None, Some(Value::Null)) => true,
            (Some(expected), Some(Value::Bool(actual))) => expected == *actual,
            _ => false,
        }
    }
}

impl fmt::Display for IsFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(true) => f.write_str("true"),
            Some(false) => f.write_str("false"),
            None => f.write_str("null"),
        }
    }
}

/// Row-oriented access to the remote database.
#[async_trait]
pub trait TableStore: Send + Sync + fmt::Debug {
    /// All rows of `table` matching `filter`, in store order.
    async fn select(&self, table: Table, filter: &IsFilter) -> Result<Vec<Row>, StoreError>;

    /// Insert one row and return the stored representation.
    async fn insert(&self, table: Table, row: Row) -> Result<Vec<Row>, StoreError>;
}
