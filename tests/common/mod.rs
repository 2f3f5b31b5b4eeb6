//! Shared fixtures: an in-memory catalog and a recording generator.

#![allow(dead_code)]

use async_trait::async_trait;
use modelgen::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory catalog standing in for a live database.
pub struct FakeCatalog {
    pub dialect: Dialect,
    pub scope: String,
    pub tables: Vec<RawTable>,
    pub enumerations: AtomicUsize,
    pub fetches: AtomicUsize,
    pub broken: Option<String>,
}

impl FakeCatalog {
    pub fn new(scope: &str, names: &[&str]) -> Self {
        Self {
            dialect: Dialect::Mysql,
            scope: scope.to_string(),
            tables: names.iter().map(|n| raw_table(scope, n)).collect(),
            enumerations: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            broken: None,
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaIntrospector for FakeCatalog {
    async fn tables(&self, scope: &str) -> ModelResult<Vec<String>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if scope != self.scope {
            return Err(ModelError::Introspection(format!("unknown scope {}", scope)));
        }
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn columns(&self, scope: &str, table: &str) -> ModelResult<RawTable> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.broken.as_deref() == Some(table) {
            return Err(ModelError::Introspection(format!("lost connection reading {}", table)));
        }
        self.tables
            .iter()
            .find(|t| t.scope == scope && t.name == table)
            .cloned()
            .ok_or_else(|| ModelError::Introspection(format!("no table {}", table)))
    }

    fn convert(&self, raw: RawTable) -> ModelResult<TableDescriptor> {
        modelgen::introspect::convert(raw, self.dialect)
    }
}

/// A table with an auto-increment `id` primary key and a `name` column.
pub fn raw_table(scope: &str, name: &str) -> RawTable {
    RawTable {
        scope: scope.to_string(),
        name: name.to_string(),
        columns: vec![
            RawColumn {
                name: "id".to_string(),
                data_type: "bigint".to_string(),
                column_type: "bigint".to_string(),
                extra: "auto_increment".to_string(),
                position: 1,
                indexes: vec![RawIndex {
                    name: "PRIMARY".to_string(),
                    non_unique: false,
                    seq: 1,
                }],
                ..Default::default()
            },
            RawColumn {
                name: "name".to_string(),
                data_type: "varchar".to_string(),
                column_type: "varchar(64)".to_string(),
                nullable: true,
                position: 2,
                ..Default::default()
            },
        ],
    }
}

/// Records every call; optionally fails on the n-th one (1-based).
#[derive(Default)]
pub struct Recorder {
    pub calls: Vec<String>,
    pub fail_on: Option<usize>,
}

impl Recorder {
    pub fn failing_on(n: usize) -> Self {
        Self {
            calls: Vec::new(),
            fail_on: Some(n),
        }
    }

    fn record(&mut self, entry: String) -> ModelResult<()> {
        self.calls.push(entry.clone());
        if self.fail_on == Some(self.calls.len()) {
            return Err(ModelError::Generation {
                target: entry,
                reason: "template exploded".to_string(),
            });
        }
        Ok(())
    }
}

impl ModelGenerator for Recorder {
    fn generate_file(&mut self, path: &Path, _cache: bool, _database: Option<&str>) -> ModelResult<()> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        self.record(name)
    }

    fn generate_table(&mut self, table: &TableDescriptor, _cache: bool) -> ModelResult<()> {
        self.record(table.name.clone())
    }
}

/// A fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("modelgen-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
