//! Hands a selection to a generator, one entry at a time.

use crate::codegen::ModelGenerator;
use crate::error::ModelResult;
use crate::select::Selection;

/// Invoke `generator` once per selected entry, in selection order.
///
/// Stops at the first failure and returns that error as the generator
/// produced it. Files written for earlier entries stay on disk.
pub fn dispatch<G>(selection: &Selection, cache: bool, generator: &mut G) -> ModelResult<()>
where
    G: ModelGenerator + ?Sized,
{
    match selection {
        Selection::Files { files, database } => {
            for file in files {
                tracing::debug!(file = %file.display(), "generating from ddl");
                generator.generate_file(file, cache, database.as_deref())?;
            }
        }
        Selection::Tables(tables) => {
            for (name, table) in tables.iter() {
                tracing::debug!(table = name, "generating from table");
                generator.generate_table(table, cache)?;
            }
        }
    }
    Ok(())
}
