//! Schema introspection.
//!
//! Each backend implements [`SchemaIntrospector`]: enumerate the tables of a
//! scope, fetch the raw catalog rows for one table, and convert those rows
//! into a [`TableDescriptor`]. The conversion itself is shared; only the
//! type mapping differs per [`Dialect`].

pub mod mysql;
pub mod postgres;

use crate::error::{ModelError, ModelResult};
use crate::model::{ColumnDescriptor, DataType, IndexDescriptor, TableDescriptor};
use async_trait::async_trait;
use std::collections::BTreeMap;

pub use mysql::{MysqlIntrospector, MysqlSession};
pub use postgres::{PostgresIntrospector, PostgresSession};

/// Index name the catalogs use for the primary key.
pub const PRIMARY_INDEX: &str = "PRIMARY";

/// Options fixed at adapter construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrospectOptions {
    /// Let the driver log every catalog statement.
    pub log_statements: bool,
}

/// Catalog capabilities a selection pipeline needs from a backend.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// All table names in `scope`, in catalog order.
    async fn tables(&self, scope: &str) -> ModelResult<Vec<String>>;

    /// Raw column and index rows for one table.
    async fn columns(&self, scope: &str, table: &str) -> ModelResult<RawTable>;

    /// Turn raw rows into a descriptor.
    fn convert(&self, raw: RawTable) -> ModelResult<TableDescriptor>;
}

/// SQL flavour, used for type mapping and generated placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Mysql,
    Postgres,
}

impl Dialect {
    /// Map a catalog data type to a [`DataType`].
    ///
    /// `column_type` is the full spelling (MySQL `COLUMN_TYPE`), used to
    /// spot `unsigned`.
    pub fn map_type(&self, data_type: &str, column_type: &str) -> Option<DataType> {
        let data_type = data_type.trim().to_lowercase();
        match self {
            Dialect::Mysql => map_mysql_type(&data_type, &column_type.to_lowercase()),
            Dialect::Postgres => map_pg_type(&data_type),
        }
    }

    /// Bind placeholder for a single-parameter lookup.
    pub const fn placeholder(&self) -> &'static str {
        match self {
            Dialect::Mysql => "?",
            Dialect::Postgres => "$1",
        }
    }
}

fn map_mysql_type(data_type: &str, column_type: &str) -> Option<DataType> {
    let unsigned = column_type.contains("unsigned");
    let ty = match data_type {
        "bool" | "boolean" => DataType::Bool,
        "tinyint" if unsigned => DataType::UnsignedTinyInt,
        "tinyint" => DataType::TinyInt,
        "smallint" if unsigned => DataType::UnsignedSmallInt,
        "smallint" => DataType::SmallInt,
        "mediumint" | "int" | "integer" if unsigned => DataType::UnsignedInt,
        "mediumint" | "int" | "integer" | "year" => DataType::Int,
        "bigint" if unsigned => DataType::UnsignedBigInt,
        "bigint" => DataType::BigInt,
        "float" => DataType::Float,
        "double" | "real" => DataType::Double,
        "decimal" | "numeric" => DataType::Decimal,
        "char" => DataType::Char,
        "varchar" => DataType::Varchar,
        "tinytext" | "text" | "mediumtext" | "longtext" => DataType::Text,
        "json" => DataType::Json,
        "date" => DataType::Date,
        "time" => DataType::Time,
        "datetime" => DataType::DateTime,
        "timestamp" => DataType::Timestamp,
        "bit" | "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
            DataType::Binary
        }
        "enum" | "set" => DataType::Enum,
        _ => return None,
    };
    Some(ty)
}

fn map_pg_type(udt_name: &str) -> Option<DataType> {
    let ty = match udt_name {
        "bool" | "boolean" => DataType::Bool,
        "int2" | "smallint" | "smallserial" => DataType::SmallInt,
        "int4" | "int" | "integer" | "serial" => DataType::Int,
        "int8" | "bigint" | "bigserial" => DataType::BigInt,
        "float4" | "real" => DataType::Float,
        "float8" | "double precision" => DataType::Double,
        "numeric" | "decimal" | "money" => DataType::Decimal,
        "bpchar" | "char" | "character" => DataType::Char,
        "varchar" | "character varying" => DataType::Varchar,
        "text" | "citext" | "name" => DataType::Text,
        "json" | "jsonb" => DataType::Json,
        "uuid" => DataType::Uuid,
        "date" => DataType::Date,
        "time" | "timetz" => DataType::Time,
        "timestamp" => DataType::Timestamp,
        "timestamptz" => DataType::TimestampTz,
        "bytea" => DataType::Binary,
        _ => return None,
    };
    Some(ty)
}

/// Raw catalog rows for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub scope: String,
    pub name: String,
    pub columns: Vec<RawColumn>,
}

/// One `COLUMNS` row, with the index memberships of that column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    pub data_type: String,
    pub column_type: String,
    pub extra: String,
    pub comment: String,
    pub default: Option<String>,
    pub nullable: bool,
    pub position: u32,
    pub indexes: Vec<RawIndex>,
}

/// One `STATISTICS` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIndex {
    pub name: String,
    pub non_unique: bool,
    pub seq: u32,
}

/// Build a descriptor from raw rows.
///
/// Requires exactly one primary key column and a mapping for every column
/// type.
pub fn convert(raw: RawTable, dialect: Dialect) -> ModelResult<TableDescriptor> {
    let RawTable {
        scope,
        name,
        mut columns,
    } = raw;
    columns.sort_by_key(|c| c.position);

    // index name -> (unique, [(seq, column)])
    let mut indexes: BTreeMap<String, (bool, Vec<(u32, String)>)> = BTreeMap::new();
    let mut descriptors = Vec::with_capacity(columns.len());

    for col in &columns {
        let data_type = dialect.map_type(&col.data_type, &col.column_type).ok_or_else(|| {
            ModelError::conversion(
                &name,
                format!(
                    "unsupported column type '{}' for column '{}'",
                    col.data_type, col.name
                ),
            )
        })?;

        for idx in &col.indexes {
            let entry = indexes
                .entry(idx.name.clone())
                .or_insert_with(|| (!idx.non_unique, Vec::new()));
            entry.1.push((idx.seq, col.name.clone()));
        }

        let auto_increment = col.extra.to_lowercase().contains("auto_increment")
            || col
                .default
                .as_deref()
                .is_some_and(|d| d.starts_with("nextval("));

        descriptors.push(ColumnDescriptor {
            name: col.name.clone(),
            data_type,
            raw_type: if col.column_type.is_empty() {
                col.data_type.clone()
            } else {
                col.column_type.clone()
            },
            nullable: col.nullable,
            auto_increment,
            default: col.default.clone(),
            comment: trim_newlines(&col.comment),
            position: col.position,
        });
    }

    let primary = match indexes.remove(PRIMARY_INDEX) {
        Some((_, cols)) if cols.len() > 1 => {
            return Err(ModelError::conversion(
                &name,
                format!("scope {}: joint primary key is not supported", scope),
            ));
        }
        Some((_, cols)) if !cols.is_empty() => cols[0].1.clone(),
        _ => {
            return Err(ModelError::conversion(
                &name,
                format!("scope {}: missing primary key", scope),
            ));
        }
    };

    let primary_key = descriptors
        .iter()
        .find(|c| c.name == primary)
        .cloned()
        .ok_or_else(|| ModelError::conversion(&name, "primary key column not found"))?;

    let mut unique_indexes = Vec::new();
    let mut normal_indexes = Vec::new();
    for (index_name, (unique, mut cols)) in indexes {
        cols.sort_by_key(|(seq, _)| *seq);
        let index = IndexDescriptor {
            name: index_name,
            columns: cols.into_iter().map(|(_, c)| c).collect(),
        };
        if unique {
            unique_indexes.push(index);
        } else {
            normal_indexes.push(index);
        }
    }

    Ok(TableDescriptor {
        scope,
        name,
        columns: descriptors,
        primary_key,
        unique_indexes,
        normal_indexes,
    })
}

fn trim_newlines(s: &str) -> String {
    s.replace("\r\n", " ").replace(['\r', '\n'], " ")
}
