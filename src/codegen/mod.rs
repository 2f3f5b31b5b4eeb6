//! Generation backends.
//!
//! A backend receives one entry at a time: either a DDL file (which it parses
//! itself) or a table descriptor read from a live database.

pub mod rust;

use crate::error::ModelResult;
use crate::model::TableDescriptor;
use std::path::Path;

pub use rust::RustGenerator;

/// A code generation backend.
pub trait ModelGenerator {
    /// Generate models for every table defined in a DDL file.
    fn generate_file(&mut self, path: &Path, cache: bool, database: Option<&str>) -> ModelResult<()>;

    /// Generate the model for one table.
    fn generate_table(&mut self, table: &TableDescriptor, cache: bool) -> ModelResult<()>;
}

impl<G: ModelGenerator + ?Sized> ModelGenerator for &mut G {
    fn generate_file(&mut self, path: &Path, cache: bool, database: Option<&str>) -> ModelResult<()> {
        (**self).generate_file(path, cache, database)
    }

    fn generate_table(&mut self, table: &TableDescriptor, cache: bool) -> ModelResult<()> {
        (**self).generate_table(table, cache)
    }
}
