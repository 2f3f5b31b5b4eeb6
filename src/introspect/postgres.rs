//! PostgreSQL catalog adapter.

use super::{
    IntrospectOptions, RawColumn, RawIndex, RawTable, SchemaIntrospector, convert, Dialect,
    PRIMARY_INDEX,
};
use crate::error::{ModelError, ModelResult};
use crate::model::TableDescriptor;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{ConnectOptions, Row};
use std::collections::HashMap;
use std::str::FromStr;

/// Schema used when none is given.
pub const DEFAULT_SCHEMA: &str = "public";

const SQL_LIST_TABLES: &str =
    "SELECT tablename::text AS table_name FROM pg_tables WHERE schemaname = $1 ORDER BY tablename";

const SQL_COLUMNS: &str = "
    SELECT c.column_name::text AS column_name,
           c.udt_name::text AS udt_name,
           c.data_type::text AS data_type,
           c.column_default::text AS column_default,
           c.is_nullable::text AS is_nullable,
           c.is_identity::text AS is_identity,
           c.ordinal_position::int4 AS ordinal_position,
           col_description(format('%I.%I', c.table_schema, c.table_name)::regclass::oid,
                           c.ordinal_position::int4) AS column_comment
    FROM information_schema.columns c
    WHERE c.table_schema = $1 AND c.table_name = $2
    ORDER BY c.ordinal_position
";

const SQL_INDEXES: &str = "
    SELECT ix.relname::text AS index_name,
           a.attname::text AS column_name,
           i.indisprimary AS is_primary,
           i.indisunique AS is_unique,
           array_position(i.indkey::int2[], a.attnum)::int4 AS seq
    FROM pg_class t
    JOIN pg_namespace n ON n.oid = t.relnamespace
    JOIN pg_index i ON i.indrelid = t.oid
    JOIN pg_class ix ON ix.oid = i.indexrelid
    JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(i.indkey)
    WHERE n.nspname = $1 AND t.relname = $2
";

/// Connection context for a PostgreSQL run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresSession {
    pub url: String,
    pub schema: String,
}

impl PostgresSession {
    /// A blank or absent schema falls back to `public`.
    pub fn new(url: &str, schema: Option<&str>) -> ModelResult<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ModelError::invalid(
                "expected data source of postgresql, but nothing found",
            ));
        }
        let schema = schema
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SCHEMA);
        Ok(Self {
            url: url.to_string(),
            schema: schema.to_string(),
        })
    }
}

/// Reads table metadata from PostgreSQL system catalogs.
pub struct PostgresIntrospector {
    pool: PgPool,
}

impl PostgresIntrospector {
    pub async fn connect(session: &PostgresSession, options: IntrospectOptions) -> ModelResult<Self> {
        let mut connect = PgConnectOptions::from_str(&session.url)?;
        if !options.log_statements {
            connect = connect.disable_statement_logging();
        }

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(connect)
            .await
            .map_err(|e| ModelError::Introspection(format!("connect postgresql: {}", e)))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SchemaIntrospector for PostgresIntrospector {
    async fn tables(&self, scope: &str) -> ModelResult<Vec<String>> {
        let rows = sqlx::query(SQL_LIST_TABLES)
            .bind(scope)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("table_name").map_err(ModelError::from))
            .collect()
    }

    async fn columns(&self, scope: &str, table: &str) -> ModelResult<RawTable> {
        let index_rows = sqlx::query(SQL_INDEXES)
            .bind(scope)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        let mut indexes: HashMap<String, Vec<RawIndex>> = HashMap::new();
        for row in &index_rows {
            let column: String = row.try_get("column_name")?;
            let is_primary: bool = row.try_get("is_primary")?;
            let is_unique: bool = row.try_get("is_unique")?;
            let name = if is_primary {
                PRIMARY_INDEX.to_string()
            } else {
                row.try_get("index_name")?
            };
            indexes.entry(column).or_default().push(RawIndex {
                name,
                non_unique: !is_unique,
                seq: row.try_get::<Option<i32>, _>("seq")?.unwrap_or(1) as u32,
            });
        }

        let column_rows = sqlx::query(SQL_COLUMNS)
            .bind(scope)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        let mut columns = Vec::with_capacity(column_rows.len());
        for row in &column_rows {
            let name: String = row.try_get("column_name")?;
            let nullable: String = row.try_get("is_nullable")?;
            let identity: Option<String> = row.try_get("is_identity")?;
            let extra = if identity.as_deref() == Some("YES") {
                "auto_increment".to_string()
            } else {
                String::new()
            };
            columns.push(RawColumn {
                indexes: indexes.remove(&name).unwrap_or_default(),
                name,
                data_type: row.try_get("udt_name")?,
                column_type: row.try_get("data_type")?,
                extra,
                comment: row
                    .try_get::<Option<String>, _>("column_comment")?
                    .unwrap_or_default(),
                default: row.try_get("column_default")?,
                nullable: nullable.eq_ignore_ascii_case("YES"),
                position: row.try_get::<i32, _>("ordinal_position")? as u32,
            });
        }

        tracing::debug!(scope, table, columns = columns.len(), "fetched postgresql columns");
        Ok(RawTable {
            scope: scope.to_string(),
            name: table.to_string(),
            columns,
        })
    }

    fn convert(&self, raw: RawTable) -> ModelResult<TableDescriptor> {
        convert(raw, Dialect::Postgres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_defaults_to_public() {
        let url = "postgres://postgres@localhost/shop";
        let implicit = PostgresSession::new(url, None).unwrap();
        let blank = PostgresSession::new(url, Some("  ")).unwrap();
        let explicit = PostgresSession::new(url, Some("public")).unwrap();
        assert_eq!(implicit.schema, "public");
        assert_eq!(implicit, blank);
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn test_custom_schema() {
        let session = PostgresSession::new("postgres://localhost/shop", Some("billing")).unwrap();
        assert_eq!(session.schema, "billing");
    }

    #[test]
    fn test_empty_url() {
        assert!(matches!(
            PostgresSession::new(" ", None),
            Err(ModelError::InvalidInput(_))
        ));
    }
}
