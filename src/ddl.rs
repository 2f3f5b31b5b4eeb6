//! MySQL DDL reader using nom.
//!
//! Only `CREATE TABLE` statements are read; every other statement in a file
//! (`SET`, `DROP`, `INSERT`, ...) is skipped. Each table goes through the
//! same conversion as a live MySQL catalog, so the rules about primary keys
//! and supported types are identical.
//!
//! ```text
//! CREATE TABLE `user` (
//!   `id` bigint unsigned NOT NULL AUTO_INCREMENT,
//!   `name` varchar(255) NOT NULL DEFAULT '' COMMENT 'display name',
//!   PRIMARY KEY (`id`),
//!   UNIQUE KEY `name_index` (`name`)
//! ) ENGINE=InnoDB;
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{anychar, char, multispace1, not_line_ending},
    combinator::{map, recognize, value},
    multi::many0,
    sequence::{pair, preceded, tuple},
    IResult,
};
use std::path::Path;

use crate::error::{ModelError, ModelResult};
use crate::introspect::{convert, Dialect, RawColumn, RawIndex, RawTable, PRIMARY_INDEX};
use crate::model::TableDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    /// Backquoted identifier.
    Ident(String),
    /// String literal, unescaped.
    Str(String),
    /// Raw text between balanced parentheses.
    Group(String),
    Comma,
    Semi,
    Other(char),
}

impl Token {
    fn is_word(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    fn name(&self) -> Option<&str> {
        match self {
            Token::Word(w) | Token::Ident(w) => Some(w),
            _ => None,
        }
    }

    fn render(&self) -> String {
        match self {
            Token::Word(w) => w.clone(),
            Token::Ident(w) => format!("`{}`", w),
            Token::Str(s) => format!("'{}'", s.replace('\'', "''")),
            Token::Group(g) => format!("({})", g),
            Token::Comma => ",".to_string(),
            Token::Semi => ";".to_string(),
            Token::Other(c) => c.to_string(),
        }
    }
}

/// Parse every `CREATE TABLE` in a DDL file.
///
/// `database` overrides the scope recorded on each table.
pub fn parse_file(path: &Path, database: Option<&str>) -> ModelResult<Vec<TableDescriptor>> {
    let content = std::fs::read_to_string(path)?;
    parse_sql(&content, &path.display().to_string(), database)
}

/// Parse every `CREATE TABLE` in `sql`. `file` is used in error messages.
pub fn parse_sql(sql: &str, file: &str, database: Option<&str>) -> ModelResult<Vec<TableDescriptor>> {
    let tokens = tokenize(sql, file)?;
    let database = database.map(str::trim).filter(|d| !d.is_empty());

    let mut tables = Vec::new();
    for statement in tokens.split(|t| *t == Token::Semi) {
        if let Some(mut raw) = create_table(statement, file)? {
            if let Some(db) = database {
                raw.scope = db.to_string();
            }
            tables.push(convert(raw, Dialect::Mysql)?);
        }
    }

    if tables.is_empty() {
        return Err(ModelError::Parse {
            file: file.to_string(),
            message: "no CREATE TABLE statement found".to_string(),
        });
    }
    Ok(tables)
}

fn tokenize(input: &str, file: &str) -> ModelResult<Vec<Token>> {
    match tuple((many0(preceded(junk, token)), junk))(input) {
        Ok(("", (tokens, _))) => Ok(tokens),
        Ok((rest, _)) => Err(syntax_error(file, input, rest)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(syntax_error(file, input, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(ModelError::Parse {
            file: file.to_string(),
            message: "unexpected end of input".to_string(),
        }),
    }
}

fn syntax_error(file: &str, input: &str, rest: &str) -> ModelError {
    let offset = input.len() - rest.len();
    let line = input[..offset].lines().count().max(1);
    ModelError::Parse {
        file: file.to_string(),
        message: format!("unterminated quote or parenthesis near line {}", line),
    }
}

/// Whitespace and comments.
fn junk(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            multispace1,
            recognize(pair(tag("--"), not_line_ending)),
            recognize(pair(char('#'), not_line_ending)),
            recognize(tuple((tag("/*"), take_until("*/"), tag("*/")))),
        ))),
    )(input)
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((
        map(quoted('\''), Token::Str),
        map(quoted('"'), Token::Str),
        map(quoted('`'), Token::Ident),
        map(group, |g| Token::Group(g.to_string())),
        value(Token::Comma, char(',')),
        value(Token::Semi, char(';')),
        map(
            take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
            |w: &str| Token::Word(w.to_string()),
        ),
        map(anychar, Token::Other),
    ))(input)
}

/// A quoted run; doubled quotes and backslash escapes are unescaped.
fn quoted(q: char) -> impl Fn(&str) -> IResult<&str, String> {
    move |input: &str| {
        let (mut rest, _) = char(q)(input)?;
        let mut out = String::new();
        loop {
            let mut chars = rest.chars();
            match chars.next() {
                None => {
                    return Err(nom::Err::Failure(nom::error::Error::new(
                        input,
                        nom::error::ErrorKind::Char,
                    )));
                }
                Some('\\') if q != '`' => {
                    if let Some(c) = chars.next() {
                        out.push(c);
                    }
                    rest = chars.as_str();
                }
                Some(c) if c == q => {
                    let after = chars.as_str();
                    match after.strip_prefix(q) {
                        Some(next) => {
                            out.push(q);
                            rest = next;
                        }
                        None => return Ok((after, out)),
                    }
                }
                Some(c) => {
                    out.push(c);
                    rest = chars.as_str();
                }
            }
        }
    }
}

/// Balanced parentheses, quote aware. Yields the inner text.
fn group(input: &str) -> IResult<&str, &str> {
    let (body, _) = char('(')(input)?;
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && q != '`' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&body[i + 1..], &body[..i]));
                }
            }
            _ => {}
        }
    }

    Err(nom::Err::Failure(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// `CREATE [TEMPORARY] TABLE [IF NOT EXISTS] name (body) options`
fn create_table(tokens: &[Token], file: &str) -> ModelResult<Option<RawTable>> {
    let mut rest = tokens;
    if !rest.first().is_some_and(|t| t.is_word("CREATE")) {
        return Ok(None);
    }
    rest = &rest[1..];
    if rest.first().is_some_and(|t| t.is_word("TEMPORARY")) {
        rest = &rest[1..];
    }
    if !rest.first().is_some_and(|t| t.is_word("TABLE")) {
        return Ok(None);
    }
    rest = &rest[1..];
    if rest.len() >= 3 && rest[0].is_word("IF") && rest[1].is_word("NOT") && rest[2].is_word("EXISTS") {
        rest = &rest[3..];
    }

    // name or scope.name
    let Some(mut name) = rest.first().and_then(Token::name) else {
        return Err(parse_error(file, "expected a table name after CREATE TABLE"));
    };
    let mut scope = "";
    rest = &rest[1..];
    if rest.first() == Some(&Token::Other('.')) {
        let Some(table) = rest.get(1).and_then(Token::name) else {
            return Err(parse_error(file, format!("expected a table name after '{}.'", name)));
        };
        scope = name;
        name = table;
        rest = &rest[2..];
    }

    let Some(Token::Group(body)) = rest.first() else {
        tracing::debug!(table = name, "skipping CREATE TABLE without column list");
        return Ok(None);
    };

    let body_tokens = tokenize(body, file)?;
    let mut table = TableBuilder::new(scope, name);
    for definition in body_tokens.split(|t| *t == Token::Comma) {
        if !definition.is_empty() {
            table.definition(definition, file)?;
        }
    }
    Ok(Some(table.finish()))
}

fn parse_error(file: &str, message: impl Into<String>) -> ModelError {
    ModelError::Parse {
        file: file.to_string(),
        message: message.into(),
    }
}

/// Collects column and index definitions of one table.
struct TableBuilder {
    scope: String,
    name: String,
    columns: Vec<RawColumn>,
}

impl TableBuilder {
    fn new(scope: &str, name: &str) -> Self {
        Self {
            scope: scope.to_string(),
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    fn definition(&mut self, tokens: &[Token], file: &str) -> ModelResult<()> {
        let first = &tokens[0];
        if first.is_word("CONSTRAINT") {
            let rest = &tokens[1..];
            let skip_name = rest.first().is_some_and(|t| {
                !(t.is_word("PRIMARY") || t.is_word("UNIQUE") || t.is_word("FOREIGN") || t.is_word("CHECK"))
            });
            let rest = if skip_name { &rest[1..] } else { rest };
            return if rest.is_empty() { Ok(()) } else { self.definition(rest, file) };
        }
        if first.is_word("PRIMARY") {
            let cols = index_columns(tokens, file)?;
            self.add_index(PRIMARY_INDEX, false, &cols, file)
        } else if first.is_word("UNIQUE") {
            let mut rest = &tokens[1..];
            if rest.first().is_some_and(|t| t.is_word("KEY") || t.is_word("INDEX")) {
                rest = &rest[1..];
            }
            let cols = index_columns(tokens, file)?;
            let name = rest
                .first()
                .and_then(Token::name)
                .map(str::to_string)
                .unwrap_or_else(|| cols[0].clone());
            self.add_index(&name, false, &cols, file)
        } else if first.is_word("KEY") || first.is_word("INDEX") {
            let cols = index_columns(tokens, file)?;
            let name = tokens
                .get(1)
                .and_then(Token::name)
                .map(str::to_string)
                .unwrap_or_else(|| cols[0].clone());
            self.add_index(&name, true, &cols, file)
        } else if ["FULLTEXT", "SPATIAL", "FOREIGN", "CHECK"].iter().any(|k| first.is_word(k)) {
            Ok(())
        } else {
            self.column(tokens, file)
        }
    }

    fn column(&mut self, tokens: &[Token], file: &str) -> ModelResult<()> {
        let Some(name) = tokens[0].name() else {
            return Err(parse_error(
                file,
                format!("unexpected '{}' in table {}", tokens[0].render(), self.name),
            ));
        };
        let Some(data_type) = tokens.get(1).and_then(|t| match t {
            Token::Word(w) => Some(w.to_lowercase()),
            _ => None,
        }) else {
            return Err(parse_error(file, format!("column {}.{} has no type", self.name, name)));
        };

        let mut column = RawColumn {
            name: name.to_string(),
            column_type: data_type.clone(),
            data_type,
            nullable: true,
            position: self.columns.len() as u32 + 1,
            ..Default::default()
        };
        let mut inline_primary = false;
        let mut inline_unique = false;

        let mut i = 2;
        if let Some(Token::Group(args)) = tokens.get(i) {
            column.column_type = format!("{}({})", column.column_type, args.trim());
            i += 1;
        }
        // double precision, character varying
        if let Some(Token::Word(w)) = tokens.get(i) {
            if w.eq_ignore_ascii_case("precision") || w.eq_ignore_ascii_case("varying") {
                column.data_type = format!("{} {}", column.data_type, w.to_lowercase());
                column.column_type = column.data_type.clone();
                i += 1;
            }
        }

        while i < tokens.len() {
            let t = &tokens[i];
            i += 1;
            if t.is_word("UNSIGNED") || t.is_word("ZEROFILL") || t.is_word("SIGNED") {
                column.column_type.push(' ');
                column.column_type.push_str(&t.render().to_lowercase());
            } else if t.is_word("NOT") && tokens.get(i).is_some_and(|n| n.is_word("NULL")) {
                column.nullable = false;
                i += 1;
            } else if t.is_word("NULL") {
                column.nullable = true;
            } else if t.is_word("DEFAULT") {
                let (value, used) = default_value(&tokens[i..]);
                column.default = value;
                i += used;
            } else if t.is_word("AUTO_INCREMENT") {
                column.extra = "auto_increment".to_string();
            } else if t.is_word("COMMENT") {
                if let Some(Token::Str(s)) = tokens.get(i) {
                    column.comment = s.clone();
                    i += 1;
                }
            } else if t.is_word("PRIMARY") && tokens.get(i).is_some_and(|n| n.is_word("KEY")) {
                inline_primary = true;
                i += 1;
            } else if t.is_word("UNIQUE") {
                inline_unique = true;
                if tokens.get(i).is_some_and(|n| n.is_word("KEY")) {
                    i += 1;
                }
            } else if t.is_word("COLLATE") || t.is_word("CHARSET") {
                i += 1;
            } else if t.is_word("CHARACTER") && tokens.get(i).is_some_and(|n| n.is_word("SET")) {
                i += 2;
            } else if t.is_word("ON") && tokens.get(i).is_some_and(|n| n.is_word("UPDATE")) {
                let (_, used) = default_value(&tokens[i + 1..]);
                i += 1 + used;
            }
        }

        let name = column.name.clone();
        self.columns.push(column);
        if inline_primary {
            self.add_index(PRIMARY_INDEX, false, &[name.clone()], file)?;
        }
        if inline_unique {
            self.add_index(&name, false, &[name.clone()], file)?;
        }
        Ok(())
    }

    fn add_index(&mut self, index: &str, non_unique: bool, cols: &[String], file: &str) -> ModelResult<()> {
        for (seq, col) in cols.iter().enumerate() {
            let Some(column) = self.columns.iter_mut().find(|c| c.name == *col) else {
                return Err(parse_error(
                    file,
                    format!("index {} on {} names unknown column {}", index, self.name, col),
                ));
            };
            if index == PRIMARY_INDEX {
                column.nullable = false;
            }
            column.indexes.push(RawIndex {
                name: index.to_string(),
                non_unique,
                seq: seq as u32 + 1,
            });
        }
        Ok(())
    }

    fn finish(self) -> RawTable {
        RawTable {
            scope: self.scope,
            name: self.name,
            columns: self.columns,
        }
    }
}

/// Column names from the first parenthesised list in an index definition.
fn index_columns(tokens: &[Token], file: &str) -> ModelResult<Vec<String>> {
    let Some(list) = tokens.iter().find_map(|t| match t {
        Token::Group(g) => Some(g),
        _ => None,
    }) else {
        return Err(parse_error(file, "index definition without a column list"));
    };

    let inner = tokenize(list, file)?;
    let cols: Vec<String> = inner
        .split(|t| *t == Token::Comma)
        .filter_map(|part| part.first().and_then(Token::name).map(str::to_string))
        .collect();
    if cols.is_empty() {
        return Err(parse_error(file, "index definition with an empty column list"));
    }
    Ok(cols)
}

/// Value after `DEFAULT`; returns it and the number of tokens consumed.
fn default_value(tokens: &[Token]) -> (Option<String>, usize) {
    if let [Token::Other(sign @ ('-' | '+')), rest @ ..] = tokens {
        if let Some((n, used)) = number(rest) {
            return (Some(format!("{}{}", sign, n)), used + 1);
        }
    }
    if let Some((n, used)) = number(tokens) {
        return (Some(n), used);
    }
    match tokens {
        [Token::Word(w), Token::Group(args), ..] => (Some(format!("{}({})", w, args)), 2),
        [t, ..] if t.is_word("NULL") => (None, 1),
        [Token::Str(s), ..] => (Some(s.clone()), 1),
        [t, ..] => (Some(t.render()), 1),
        [] => (None, 0),
    }
}

/// An unsigned numeric literal, which the lexer splits at `.`.
fn number(tokens: &[Token]) -> Option<(String, usize)> {
    fn starts_numeric(w: &str) -> bool {
        w.starts_with(|c: char| c.is_ascii_digit())
    }
    match tokens {
        [Token::Word(int), Token::Other('.'), Token::Word(frac), ..]
            if int.chars().all(|c| c.is_ascii_digit()) && starts_numeric(frac) =>
        {
            Some((format!("{}.{}", int, frac), 3))
        }
        [Token::Other('.'), Token::Word(frac), ..] if starts_numeric(frac) => {
            Some((format!(".{}", frac), 2))
        }
        [Token::Word(int), ..] if starts_numeric(int) => Some((int.clone(), 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataType;
    use pretty_assertions::assert_eq;

    const USER_DDL: &str = r#"
        -- users of the shop
        SET NAMES utf8mb4;
        /* dump header */
        DROP TABLE IF EXISTS `user`;
        CREATE TABLE IF NOT EXISTS `user` (
          `id` bigint(20) unsigned NOT NULL AUTO_INCREMENT,
          `name` varchar(255) COLLATE utf8mb4_bin NOT NULL DEFAULT '' COMMENT 'the user''s name',
          `mobile` char(11) NOT NULL,
          `type` tinyint(1) DEFAULT -1,
          `age` int(10) unsigned NOT NULL DEFAULT 0,
          `create_time` timestamp NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
          PRIMARY KEY (`id`),
          UNIQUE KEY `mobile_index` (`mobile`),
          KEY `name_type` (`name`(10), `type`)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COMMENT='user table';
    "#;

    #[test]
    fn test_parse_create_table() {
        let tables = parse_sql(USER_DDL, "user.sql", None).unwrap();
        assert_eq!(tables.len(), 1);
        let user = &tables[0];
        assert_eq!(user.name, "user");
        assert_eq!(user.primary_key.name, "id");
        assert!(user.primary_key.auto_increment);
        assert_eq!(user.primary_key.data_type, DataType::UnsignedBigInt);

        let name = user.column("name").unwrap();
        assert_eq!(name.data_type, DataType::Varchar);
        assert_eq!(name.raw_type, "varchar(255)");
        assert!(!name.nullable);
        assert_eq!(name.default.as_deref(), Some(""));
        assert_eq!(name.comment, "the user's name");

        assert_eq!(user.column("type").unwrap().default.as_deref(), Some("-1"));
        let age = user.column("age").unwrap();
        assert_eq!(age.data_type, DataType::UnsignedInt);
        assert_eq!(age.raw_type, "int(10) unsigned");
        let created = user.column("create_time").unwrap();
        assert!(created.nullable);
        assert_eq!(created.default.as_deref(), Some("CURRENT_TIMESTAMP"));

        assert_eq!(user.unique_indexes.len(), 1);
        assert_eq!(user.unique_indexes[0].name, "mobile_index");
        assert_eq!(user.normal_indexes[0].columns, vec!["name", "type"]);
    }

    #[test]
    fn test_database_override_and_qualified_name() {
        let sql = "CREATE TABLE shop.orders (id int PRIMARY KEY, sn varchar(32) UNIQUE);";
        let tables = parse_sql(sql, "orders.sql", None).unwrap();
        assert_eq!(tables[0].scope, "shop");
        assert_eq!(tables[0].name, "orders");
        assert_eq!(tables[0].unique_indexes[0].columns, vec!["sn"]);

        let tables = parse_sql(sql, "orders.sql", Some("archive")).unwrap();
        assert_eq!(tables[0].scope, "archive");
    }

    #[test]
    fn test_multiple_tables() {
        let sql = "create table a (id int not null, primary key (id));\n\
                   create table b (id bigint, constraint pk_b primary key (id));";
        let tables = parse_sql(sql, "ab.sql", None).unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(!tables[1].primary_key.nullable);
    }

    #[test]
    fn test_decimal_defaults() {
        let sql = "CREATE TABLE prices (\n\
                   id int PRIMARY KEY,\n\
                   ratio double DEFAULT 0.5,\n\
                   discount decimal(10,2) NOT NULL DEFAULT -1.25,\n\
                   fraction float DEFAULT .75,\n\
                   big double DEFAULT 1.5e3\n\
                   );";
        let table = &parse_sql(sql, "prices.sql", None).unwrap()[0];
        let default = |name: &str| table.column(name).unwrap().default.clone();
        assert_eq!(default("ratio").as_deref(), Some("0.5"));
        assert_eq!(default("discount").as_deref(), Some("-1.25"));
        assert_eq!(default("fraction").as_deref(), Some(".75"));
        assert_eq!(default("big").as_deref(), Some("1.5e3"));
        assert!(!table.column("discount").unwrap().nullable);
    }

    #[test]
    fn test_no_create_table() {
        let err = parse_sql("SELECT 1;", "empty.sql", None).unwrap_err();
        assert!(matches!(err, ModelError::Parse { .. }));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse_sql("CREATE TABLE t (id int COMMENT 'oops", "bad.sql", None).unwrap_err();
        assert!(matches!(err, ModelError::Parse { .. }));
    }

    #[test]
    fn test_missing_primary_key_is_conversion_error() {
        let err = parse_sql("CREATE TABLE t (id int);", "t.sql", None).unwrap_err();
        assert!(matches!(err, ModelError::Conversion { .. }));
    }
}
