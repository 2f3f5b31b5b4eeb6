//! Table selection.
//!
//! Enumerates every candidate a backend knows about, keeps the ones the
//! filter accepts and converts them. Only after the whole candidate space
//! has been scanned is an empty result reported as `NoMatch`.

use crate::error::{ModelError, ModelResult, NoMatchKind};
use crate::introspect::SchemaIntrospector;
use crate::model::TableDescriptor;
use crate::pattern::TableFilter;
use std::collections::HashMap;
use std::path::PathBuf;

/// Selected tables keyed by name, iterated in discovery order.
///
/// Inserting a name that is already present replaces its descriptor but
/// keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct SelectionMap {
    entries: Vec<(String, TableDescriptor)>,
    positions: HashMap<String, usize>,
}

impl SelectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, table: TableDescriptor) {
        let name = name.into();
        match self.positions.get(&name) {
            Some(&at) => self.entries[at].1 = table,
            None => {
                self.positions.insert(name.clone(), self.entries.len());
                self.entries.push((name, table));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TableDescriptor> {
        self.positions.get(name).map(|&at| &self.entries[at].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableDescriptor)> {
        self.entries.iter().map(|(name, table)| (name.as_str(), table))
    }
}

/// What gets handed to the generator.
#[derive(Debug, Clone)]
pub enum Selection {
    /// DDL files, parsed by the generator itself.
    Files {
        files: Vec<PathBuf>,
        database: Option<String>,
    },
    /// Tables read from a live database.
    Tables(SelectionMap),
}

impl Selection {
    pub fn len(&self) -> usize {
        match self {
            Selection::Files { files, .. } => files.len(),
            Selection::Tables(tables) => tables.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Select and convert the tables of `scope` that `filter` accepts.
///
/// Any catalog or conversion failure aborts the whole selection.
pub async fn select_tables<I>(
    introspector: &I,
    scope: &str,
    filter: &TableFilter,
) -> ModelResult<SelectionMap>
where
    I: SchemaIntrospector + ?Sized,
{
    if filter.is_empty() {
        return Err(ModelError::invalid(
            "expected table or table globbing patterns, but nothing found",
        ));
    }

    let candidates = introspector.tables(scope).await?;
    tracing::debug!(scope, candidates = candidates.len(), "enumerated tables");

    let mut selected = SelectionMap::new();
    for name in candidates {
        if !filter.matches(&name) {
            continue;
        }

        let raw = introspector.columns(scope, &name).await?;
        let table = introspector.convert(raw)?;
        selected.insert(name, table);
    }

    if selected.is_empty() {
        return Err(ModelError::NoMatch(NoMatchKind::Tables));
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnDescriptor, DataType};

    fn table(name: &str) -> TableDescriptor {
        let id = ColumnDescriptor {
            name: "id".to_string(),
            data_type: DataType::BigInt,
            raw_type: "bigint".to_string(),
            nullable: false,
            auto_increment: true,
            default: None,
            comment: String::new(),
            position: 1,
        };
        TableDescriptor {
            scope: "shop".to_string(),
            name: name.to_string(),
            columns: vec![id.clone()],
            primary_key: id,
            unique_indexes: vec![],
            normal_indexes: vec![],
        }
    }

    #[test]
    fn test_selection_map_keeps_first_position() {
        let mut map = SelectionMap::new();
        map.insert("users", table("users"));
        map.insert("orders", table("orders"));
        let mut replacement = table("users");
        replacement.scope = "other".to_string();
        map.insert("users", replacement);

        assert_eq!(map.len(), 2);
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["users", "orders"]);
        assert_eq!(map.get("users").unwrap().scope, "other");
        assert!(map.contains("orders"));
        assert!(!map.contains("items"));
    }

    #[test]
    fn test_selection_len() {
        let files = Selection::Files {
            files: vec![PathBuf::from("a.sql")],
            database: None,
        };
        assert_eq!(files.len(), 1);
        assert!(Selection::Tables(SelectionMap::new()).is_empty());
    }
}
