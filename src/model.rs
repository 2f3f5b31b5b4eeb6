//! Backend-agnostic table descriptors.
//!
//! Every input mode ends up here: DDL files, MySQL and PostgreSQL catalogs
//! all produce the same `TableDescriptor`, which is what the generator sees.

use std::fmt;

/// Canonical column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    /// MySQL `UNSIGNED` integer columns.
    UnsignedTinyInt,
    UnsignedSmallInt,
    UnsignedInt,
    UnsignedBigInt,
    Float,
    Double,
    Decimal,
    Char,
    Varchar,
    Text,
    Json,
    Uuid,
    Date,
    Time,
    DateTime,
    Timestamp,
    TimestampTz,
    Binary,
    Enum,
}

impl DataType {
    /// Human-readable name for messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Int => "INT",
            Self::BigInt => "BIGINT",
            Self::UnsignedTinyInt => "TINYINT UNSIGNED",
            Self::UnsignedSmallInt => "SMALLINT UNSIGNED",
            Self::UnsignedInt => "INT UNSIGNED",
            Self::UnsignedBigInt => "BIGINT UNSIGNED",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::Char => "CHAR",
            Self::Varchar => "VARCHAR",
            Self::Text => "TEXT",
            Self::Json => "JSON",
            Self::Uuid => "UUID",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::DateTime => "DATETIME",
            Self::Timestamp => "TIMESTAMP",
            Self::TimestampTz => "TIMESTAMPTZ",
            Self::Binary => "BINARY",
            Self::Enum => "ENUM",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: DataType,
    /// The type as the database spelled it, e.g. `varchar(255)`.
    pub raw_type: String,
    pub nullable: bool,
    pub auto_increment: bool,
    pub default: Option<String>,
    pub comment: String,
    pub position: u32,
}

/// A named index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    /// Column names in index order.
    pub columns: Vec<String>,
}

/// One relational table, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Database (MySQL) or schema (PostgreSQL) the table lives in.
    pub scope: String,
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: ColumnDescriptor,
    pub unique_indexes: Vec<IndexDescriptor>,
    pub normal_indexes: Vec<IndexDescriptor>,
}

impl TableDescriptor {
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}
