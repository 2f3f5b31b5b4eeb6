//! Rust model generator.
//!
//! For a table `user_roles` (snake style) two files are written:
//! - `user_roles_model_gen.rs`, rewritten on every run
//! - `user_roles_model.rs`, created once and then left to the user

use super::ModelGenerator;
use crate::config::{capitalize, split_words, Config, NamingStyle};
use crate::console::Console;
use crate::ddl;
use crate::error::{ModelError, ModelResult};
use crate::introspect::Dialect;
use crate::model::{ColumnDescriptor, DataType, TableDescriptor};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const GENERATED_BANNER: &str = "// Code generated by modelgen. DO NOT EDIT.";

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "yield",
];

/// Writes Rust model files into a directory.
pub struct RustGenerator {
    dir: PathBuf,
    config: Config,
    dialect: Dialect,
    console: Console,
    written: Vec<PathBuf>,
}

impl RustGenerator {
    /// Create a generator writing into `dir`, creating it if needed.
    pub fn new(dir: impl AsRef<Path>, config: Config, console: Console) -> ModelResult<Self> {
        let dir = dir.as_ref();
        let dir = if dir.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            dir.to_path_buf()
        };
        std::fs::create_dir_all(&dir)
            .map_err(|e| ModelError::generation(dir.display().to_string(), e))?;

        Ok(Self {
            dir,
            config,
            dialect: Dialect::Mysql,
            console,
            written: Vec::new(),
        })
    }

    /// Emit queries for PostgreSQL instead of MySQL.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn file_stem(&self, table: &str, suffix: &str) -> String {
        self.config.style.format(&format!("{}_{}", table, suffix))
    }

    /// Source of the always-regenerated file.
    pub fn render(&self, table: &TableDescriptor, cache: bool) -> String {
        let settings = &self.config.templates;
        let struct_name = struct_name(&table.name);
        let mut out = String::new();

        out.push_str(GENERATED_BANNER);
        out.push('\n');
        if let Some(header) = &settings.header {
            out.push_str(header.trim_end());
            out.push('\n');
        }
        out.push('\n');

        let _ = writeln!(out, "/// Row of table `{}`.", table.name);
        if !settings.derives.is_empty() {
            let _ = writeln!(out, "#[derive({})]", settings.derives.join(", "));
        }
        let _ = writeln!(out, "pub struct {} {{", struct_name);
        for col in &table.columns {
            if !col.comment.is_empty() {
                let _ = writeln!(out, "    /// {}", col.comment);
            }
            let _ = writeln!(out, "    pub {}: {},", field_name(&col.name), rust_type(col));
        }
        out.push_str("}\n\n");

        let fields: Vec<String> = table.columns.iter().map(|c| format!("\"{}\"", c.name)).collect();
        let _ = writeln!(out, "impl {} {{", struct_name);
        let _ = writeln!(out, "    pub const TABLE: &'static str = \"{}\";", table.name);
        let _ = writeln!(
            out,
            "    pub const PRIMARY_KEY: &'static str = \"{}\";",
            table.primary_key.name
        );
        let _ = writeln!(
            out,
            "    pub const FIELDS: &'static [&'static str] = &[{}];",
            fields.join(", ")
        );
        let _ = writeln!(
            out,
            "    pub const FIND_ONE: &'static str = \"{}\";",
            self.find_one_sql(table)
        );

        if cache {
            out.push('\n');
            for (key, columns) in cache_keys(table) {
                let _ = writeln!(
                    out,
                    "    pub const {}: &'static str = \"{}\";",
                    const_name(&format!("cache_{}_prefix", key)),
                    self.cache_prefix(table, &columns)
                );
            }
        }
        out.push_str("}\n");
        out
    }

    fn render_custom(&self, table: &TableDescriptor) -> String {
        let gen_module = self.file_stem(&table.name, "model_gen");
        let mut out = String::new();
        let _ = writeln!(out, "//! Custom logic for `{}`. modelgen never overwrites this file.", table.name);
        out.push('\n');
        let _ = writeln!(out, "pub use super::{}::{};", gen_module, struct_name(&table.name));
        out
    }

    fn find_one_sql(&self, table: &TableDescriptor) -> String {
        let quote = |name: &str| match self.dialect {
            Dialect::Mysql => format!("`{}`", name),
            Dialect::Postgres => format!("\\\"{}\\\"", name),
        };
        let columns: Vec<String> = table.columns.iter().map(|c| quote(&c.name)).collect();
        let table_name = match self.dialect {
            Dialect::Postgres if !table.scope.is_empty() => {
                format!("{}.{}", quote(&table.scope), quote(&table.name))
            }
            _ => quote(&table.name),
        };
        format!(
            "SELECT {} FROM {} WHERE {} = {} LIMIT 1",
            columns.join(", "),
            table_name,
            quote(&table.primary_key.name),
            self.dialect.placeholder()
        )
    }

    fn cache_prefix(&self, table: &TableDescriptor, columns: &[String]) -> String {
        let mut parts = vec![self.config.templates.cache_prefix.clone()];
        if !table.scope.is_empty() {
            parts.push(table.scope.clone());
        }
        parts.push(table.name.clone());
        parts.extend(columns.iter().cloned());
        format!("{}:", parts.join(":"))
    }

    fn write(&mut self, path: PathBuf, content: &str) -> ModelResult<()> {
        std::fs::write(&path, content)
            .map_err(|e| ModelError::generation(path.display().to_string(), e))?;
        tracing::debug!(path = %path.display(), "wrote model file");
        self.written.push(path);
        Ok(())
    }
}

impl ModelGenerator for RustGenerator {
    fn generate_file(&mut self, path: &Path, cache: bool, database: Option<&str>) -> ModelResult<()> {
        let tables = ddl::parse_file(path, database)?;
        for table in &tables {
            self.generate_table(table, cache)?;
        }
        Ok(())
    }

    fn generate_table(&mut self, table: &TableDescriptor, cache: bool) -> ModelResult<()> {
        let generated = self.dir.join(format!("{}.rs", self.file_stem(&table.name, "model_gen")));
        let content = self.render(table, cache);
        self.write(generated, &content)?;

        let custom = self.dir.join(format!("{}.rs", self.file_stem(&table.name, "model")));
        if custom.exists() {
            tracing::debug!(path = %custom.display(), "keeping existing custom model");
        } else {
            let content = self.render_custom(table);
            self.write(custom, &content)?;
        }

        self.console.info(format!("generated model for table {}", table.name));
        Ok(())
    }
}

/// Cache key names and their columns: the primary key, then every unique index.
fn cache_keys(table: &TableDescriptor) -> Vec<(String, Vec<String>)> {
    let mut keys = vec![(
        table.primary_key.name.clone(),
        vec![table.primary_key.name.clone()],
    )];
    for index in &table.unique_indexes {
        keys.push((index.columns.join("_"), index.columns.clone()));
    }
    keys
}

/// `user_roles` -> `UserRoles`
pub fn struct_name(table: &str) -> String {
    split_words(table).iter().map(|w| capitalize(w)).collect()
}

/// Column name as a Rust field, escaping keywords.
pub fn field_name(column: &str) -> String {
    let name = NamingStyle::Snake.format(column);
    if RUST_KEYWORDS.contains(&name.as_str()) {
        format!("r#{}", name)
    } else {
        name
    }
}

fn const_name(name: &str) -> String {
    split_words(name).join("_").to_uppercase()
}

/// Rust type for a column; nullable columns become `Option<T>`.
pub fn rust_type(col: &ColumnDescriptor) -> String {
    let base = match col.data_type {
        DataType::Bool => "bool",
        DataType::TinyInt => "i8",
        DataType::SmallInt => "i16",
        DataType::Int => "i32",
        DataType::BigInt => "i64",
        DataType::UnsignedTinyInt => "u8",
        DataType::UnsignedSmallInt => "u16",
        DataType::UnsignedInt => "u32",
        DataType::UnsignedBigInt => "u64",
        DataType::Float => "f32",
        DataType::Double => "f64",
        DataType::Decimal
        | DataType::Char
        | DataType::Varchar
        | DataType::Text
        | DataType::Enum => "String",
        DataType::Json => "serde_json::Value",
        DataType::Uuid => "uuid::Uuid",
        DataType::Date => "chrono::NaiveDate",
        DataType::Time => "chrono::NaiveTime",
        DataType::DateTime | DataType::Timestamp => "chrono::NaiveDateTime",
        DataType::TimestampTz => "chrono::DateTime<chrono::Utc>",
        DataType::Binary => "Vec<u8>",
    };
    if col.nullable {
        format!("Option<{}>", base)
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IndexDescriptor;
    use pretty_assertions::assert_eq;

    fn col(name: &str, data_type: DataType, nullable: bool) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            data_type,
            raw_type: data_type.name().to_lowercase(),
            nullable,
            auto_increment: false,
            default: None,
            comment: String::new(),
            position: 0,
        }
    }

    fn user_roles() -> TableDescriptor {
        let id = col("id", DataType::BigInt, false);
        let mut code = col("code", DataType::Varchar, false);
        code.comment = "role code".to_string();
        TableDescriptor {
            scope: "shop".to_string(),
            name: "user_roles".to_string(),
            columns: vec![id.clone(), code, col("type", DataType::Int, true)],
            primary_key: id,
            unique_indexes: vec![IndexDescriptor {
                name: "uk_code".to_string(),
                columns: vec!["code".to_string()],
            }],
            normal_indexes: vec![],
        }
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("modelgen-rust-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_names_and_types() {
        assert_eq!(struct_name("user_roles"), "UserRoles");
        assert_eq!(field_name("type"), "r#type");
        assert_eq!(field_name("createTime"), "create_time");
        assert_eq!(rust_type(&col("x", DataType::Int, true)), "Option<i32>");
        assert_eq!(rust_type(&col("x", DataType::UnsignedInt, false)), "u32");
        assert_eq!(rust_type(&col("x", DataType::UnsignedTinyInt, true)), "Option<u8>");
        assert_eq!(rust_type(&col("x", DataType::TimestampTz, false)), "chrono::DateTime<chrono::Utc>");
    }

    #[test]
    fn test_render_struct_and_cache_keys() {
        let generator = RustGenerator::new(scratch("render"), Config::default(), Console::new(true)).unwrap();
        let code = generator.render(&user_roles(), true);

        assert!(code.starts_with(GENERATED_BANNER));
        assert!(code.contains("#[derive(Debug, Clone)]\npub struct UserRoles {"));
        assert!(code.contains("    /// role code\n    pub code: String,"));
        assert!(code.contains("    pub r#type: Option<i32>,"));
        assert!(code.contains("pub const CACHE_ID_PREFIX: &'static str = \"cache:shop:user_roles:id:\";"));
        assert!(code.contains("pub const CACHE_CODE_PREFIX: &'static str = \"cache:shop:user_roles:code:\";"));
        assert!(code.contains("WHERE `id` = ? LIMIT 1"));

        let uncached = generator.render(&user_roles(), false);
        assert!(!uncached.contains("CACHE_"));
    }

    #[test]
    fn test_postgres_placeholder() {
        let generator = RustGenerator::new(scratch("pg"), Config::default(), Console::new(true))
            .unwrap()
            .with_dialect(Dialect::Postgres);
        let code = generator.render(&user_roles(), false);
        assert!(code.contains("FROM \\\"shop\\\".\\\"user_roles\\\" WHERE \\\"id\\\" = $1 LIMIT 1"));
    }

    #[test]
    fn test_generate_keeps_custom_file() {
        let dir = scratch("files");
        let mut generator = RustGenerator::new(&dir, Config::default(), Console::new(true)).unwrap();
        generator.generate_table(&user_roles(), false).unwrap();

        let custom = dir.join("user_roles_model.rs");
        assert!(dir.join("user_roles_model_gen.rs").is_file());
        std::fs::write(&custom, "// mine\n").unwrap();

        generator.generate_table(&user_roles(), true).unwrap();
        assert_eq!(std::fs::read_to_string(&custom).unwrap(), "// mine\n");
        assert_eq!(generator.written().len(), 3);
    }

    #[test]
    fn test_style_controls_file_names() {
        let dir = scratch("style");
        let config = Config::new("goZero").unwrap();
        let mut generator = RustGenerator::new(&dir, config, Console::new(true)).unwrap();
        generator.generate_table(&user_roles(), false).unwrap();
        assert!(dir.join("userRolesModelGen.rs").is_file());
        assert!(dir.join("userRolesModel.rs").is_file());
    }
}
