use std::collections::HashMap;
use std::sync::Arc;

use crate::types::Value;

/// A result row keyed by column name.
///
/// Column names are shared across every row of one result set, together
/// with a name-to-index cache so repeated lookups avoid string scans.
/// When a query yields two columns with the same name, lookups resolve to
/// the later column; the earlier one stays reachable by index.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    column_names: Arc<Vec<String>>,
    values: Vec<Value>,
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl MappedRow {
    /// Create a row, building its own lookup cache.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        let cache = Arc::new(build_column_index(&column_names));
        Self {
            column_names,
            values,
            column_index_cache: cache,
        }
    }

    /// Create a row reusing a cache built once per result set.
    pub(crate) fn with_shared(
        column_names: Arc<Vec<String>>,
        column_index_cache: Arc<HashMap<String, usize>>,
        values: Vec<Value>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index_cache,
        }
    }

    /// Get the index of a column by name, or None if not found.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }

        // Fall back to a scan; rposition keeps duplicate-name resolution
        // consistent with the cache.
        self.column_names
            .iter()
            .rposition(|col| col == column_name)
    }

    /// Get a value by column name, or None if the column wasn't found.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&Value> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value by column index, or None if the index is out of bounds.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

pub(crate) fn build_column_index(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}
