//! # modelgen
//!
//! Generate Rust model code from a database schema.
//!
//! Three input modes feed the same pipeline:
//!
//! | Mode                  | Selector                         | Candidates               |
//! |-----------------------|----------------------------------|--------------------------|
//! | `mysql ddl`           | `--src ./sql/*.sql`              | files in a directory     |
//! | `mysql datasource`    | `--table 'user*' --table orders` | tables of the database   |
//! | `pg datasource`       | `--table 'user*' --schema app`   | tables of the schema     |
//!
//! Every mode resolves to a non-empty [`select::Selection`], which
//! [`dispatch::dispatch`] hands to a [`codegen::ModelGenerator`] one entry at
//! a time, stopping at the first failure.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use modelgen::prelude::*;
//!
//! let tables = select_tables(&introspector, "shop", &TableFilter::Set(PatternSet::build(["user*"]))).await?;
//! let mut generator = RustGenerator::new("./model", Config::new("go_zero")?, Console::new(false))?;
//! dispatch(&Selection::Tables(tables), true, &mut generator)?;
//! ```

pub mod codegen;
pub mod commands;
pub mod config;
pub mod console;
pub mod ddl;
pub mod dispatch;
pub mod error;
pub mod files;
pub mod introspect;
pub mod model;
pub mod pattern;
pub mod select;

pub mod prelude {
    pub use crate::codegen::{ModelGenerator, RustGenerator};
    pub use crate::config::{Config, NamingStyle};
    pub use crate::console::Console;
    pub use crate::dispatch::dispatch;
    pub use crate::error::*;
    pub use crate::introspect::{
        Dialect, IntrospectOptions, RawColumn, RawIndex, RawTable, SchemaIntrospector,
    };
    pub use crate::model::*;
    pub use crate::pattern::{Glob, PatternSet, TableFilter};
    pub use crate::select::{select_tables, Selection, SelectionMap};
}
