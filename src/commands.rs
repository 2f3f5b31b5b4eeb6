//! The three entry points: MySQL DDL files, a live MySQL database and a
//! live PostgreSQL database.
//!
//! Each run validates its selectors before touching the network or the file
//! system, then selects, then generates. The generator is only built once
//! the selection is known to be non-empty.

use crate::codegen::{ModelGenerator, RustGenerator};
use crate::config::{self, Config};
use crate::console::Console;
use crate::dispatch::dispatch;
use crate::error::{ModelError, ModelResult};
use crate::files::match_files;
use crate::introspect::{
    Dialect, IntrospectOptions, MysqlIntrospector, MysqlSession, PostgresIntrospector,
    PostgresSession, SchemaIntrospector,
};
use crate::pattern::{PatternSet, TableFilter};
use crate::select::{select_tables, Selection};
use std::path::PathBuf;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub dir: PathBuf,
    pub style: String,
    pub cache: bool,
    pub idea: bool,
    pub home: Option<PathBuf>,
    pub remote: Option<String>,
    pub branch: Option<String>,
}

impl OutputOptions {
    /// Resolve the template home and load the configuration.
    ///
    /// A failed `--remote` clone is reported and the local home is used.
    pub fn load_config(&self, console: &Console) -> ModelResult<Config> {
        let mut home = self.home.clone();
        if let Some(remote) = self.remote.as_deref().filter(|r| !r.trim().is_empty()) {
            match config::clone_remote(remote.trim(), self.branch.as_deref()) {
                Ok(repo) => home = Some(repo),
                Err(e) => console.warning(format!("ignoring --remote: {}", e)),
            }
        }
        let home = home.or_else(config::default_home);
        Config::load(&self.style, home.as_deref())
    }

    fn generator(&self, config: Config, console: Console, dialect: Dialect) -> ModelResult<RustGenerator> {
        Ok(RustGenerator::new(&self.dir, config, console)?.with_dialect(dialect))
    }
}

/// `modelgen mysql ddl`
#[derive(Debug, Clone, Default)]
pub struct DdlRequest {
    pub src: String,
    pub database: Option<String>,
    pub output: OutputOptions,
}

/// `modelgen mysql datasource`
#[derive(Debug, Clone, Default)]
pub struct MysqlRequest {
    pub url: String,
    /// Raw `--table` values; each may be a comma separated list.
    pub tables: Vec<String>,
    pub output: OutputOptions,
}

impl MysqlRequest {
    /// Check the selectors and derive the session. No I/O.
    pub fn validate(&self) -> ModelResult<(MysqlSession, TableFilter)> {
        if self.url.trim().is_empty() {
            return Err(ModelError::invalid(
                "expected data source of mysql, but nothing found",
            ));
        }
        let patterns = PatternSet::build(&self.tables);
        if patterns.is_empty() {
            return Err(ModelError::invalid(
                "expected table or table globbing patterns, but nothing found",
            ));
        }
        let session = MysqlSession::parse(&self.url)?;
        Ok((session, TableFilter::Set(patterns)))
    }
}

/// `modelgen pg datasource`
#[derive(Debug, Clone, Default)]
pub struct PostgresRequest {
    pub url: String,
    pub table: String,
    pub schema: Option<String>,
    pub output: OutputOptions,
}

impl PostgresRequest {
    /// Check the selectors and derive the session. No I/O.
    pub fn validate(&self) -> ModelResult<(PostgresSession, TableFilter)> {
        if self.url.trim().is_empty() {
            return Err(ModelError::invalid(
                "expected data source of postgresql, but nothing found",
            ));
        }
        if self.table.trim().is_empty() {
            return Err(ModelError::invalid(
                "expected table or table globbing patterns, but nothing found",
            ));
        }
        let session = PostgresSession::new(&self.url, self.schema.as_deref())?;
        Ok((session, TableFilter::raw(&self.table)))
    }
}

/// Generate models from DDL files.
pub fn mysql_ddl(req: &DdlRequest) -> ModelResult<usize> {
    let console = Console::new(req.output.idea);
    if req.src.trim().is_empty() {
        return Err(ModelError::invalid(
            "expected path or path globbing patterns, but nothing found",
        ));
    }
    let config = req.output.load_config(&console)?;

    let count = generate_from_ddl(&req.src, req.database.as_deref(), req.output.cache, || {
        req.output.generator(config, console, Dialect::Mysql)
    })?;
    console.success("Done.");
    Ok(count)
}

/// Generate models from a live MySQL database.
pub async fn mysql_datasource(req: &MysqlRequest) -> ModelResult<usize> {
    let console = Console::new(req.output.idea);
    let (session, filter) = req.validate()?;
    let config = req.output.load_config(&console)?;

    let introspector = MysqlIntrospector::connect(&session, IntrospectOptions::default()).await?;
    let count = generate_from_datasource(&introspector, &session.database, &filter, req.output.cache, || {
        req.output.generator(config, console, Dialect::Mysql)
    })
    .await?;
    console.success("Done.");
    Ok(count)
}

/// Generate models from a live PostgreSQL database.
pub async fn pg_datasource(req: &PostgresRequest) -> ModelResult<usize> {
    let console = Console::new(req.output.idea);
    let (session, filter) = req.validate()?;
    let config = req.output.load_config(&console)?;

    let introspector = PostgresIntrospector::connect(&session, IntrospectOptions::default()).await?;
    let count = generate_from_datasource(&introspector, &session.schema, &filter, req.output.cache, || {
        req.output.generator(config, console, Dialect::Postgres)
    })
    .await?;
    console.success("Done.");
    Ok(count)
}

/// Resolve `src`, then generate once per file. Returns the number of files.
pub fn generate_from_ddl<G, F>(
    src: &str,
    database: Option<&str>,
    cache: bool,
    make_generator: F,
) -> ModelResult<usize>
where
    G: ModelGenerator,
    F: FnOnce() -> ModelResult<G>,
{
    let files = match_files(src)?;
    let selection = Selection::Files {
        files,
        database: database
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    };
    let mut generator = make_generator()?;
    dispatch(&selection, cache, &mut generator)?;
    Ok(selection.len())
}

/// Select tables through `introspector`, then generate once per table.
/// Returns the number of tables.
pub async fn generate_from_datasource<I, G, F>(
    introspector: &I,
    scope: &str,
    filter: &TableFilter,
    cache: bool,
    make_generator: F,
) -> ModelResult<usize>
where
    I: SchemaIntrospector + ?Sized,
    G: ModelGenerator,
    F: FnOnce() -> ModelResult<G>,
{
    let tables = select_tables(introspector, scope, filter).await?;
    let selection = Selection::Tables(tables);
    let mut generator = make_generator()?;
    dispatch(&selection, cache, &mut generator)?;
    Ok(selection.len())
}
