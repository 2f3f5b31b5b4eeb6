//! Table name patterns.
//!
//! `--table` may be given several times and each value may hold a comma
//! separated list, so `-t a,b -t b,c` and `-t a -t b -t c` select the same
//! tables. Matching uses shell-style globs on a single flat name.

use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compile a shell-style glob.
///
/// Runs of `*` collapse to one `*`, `\x` matches `x` literally and `[^...]`
/// is a negated class, as in `[!...]`.
pub fn compile(raw: &str) -> Result<Pattern, String> {
    let mut out = String::with_capacity(raw.len() + 2);
    let mut chars = raw.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        if in_class {
            match c {
                '\\' => match chars.next() {
                    Some(x) => out.push(x),
                    None => return Err("trailing backslash".to_string()),
                },
                ']' => {
                    in_class = false;
                    out.push(c);
                }
                _ => out.push(c),
            }
            continue;
        }
        match c {
            '\\' => match chars.next() {
                Some(x @ ('*' | '?' | '[' | ']')) => {
                    out.push('[');
                    out.push(x);
                    out.push(']');
                }
                Some(x) => out.push(x),
                None => return Err("trailing backslash".to_string()),
            },
            '*' => {
                out.push('*');
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
            }
            '[' => {
                in_class = true;
                out.push('[');
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('!');
                }
            }
            _ => out.push(c),
        }
    }

    Pattern::new(&out).map_err(|e| e.to_string())
}

/// A table name glob, compiled once.
///
/// A malformed glob is reported when it is built and never matches.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Glob {
    raw: String,
    pattern: Option<Pattern>,
}

impl Glob {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let pattern = match compile(&raw) {
            Ok(p) => Some(p),
            Err(error) => {
                tracing::warn!(pattern = %raw, %error, "ignoring malformed table pattern");
                None
            }
        };
        Self { raw, pattern }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_valid(&self) -> bool {
        self.pattern.is_some()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|p| p.matches_with(name, MATCH_OPTIONS))
    }
}

/// A deduplicated set of glob patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: BTreeSet<Glob>,
}

impl PatternSet {
    /// Build a set from raw flag values, splitting each on commas.
    pub fn build<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields: BTreeSet<String> = raw
            .into_iter()
            .flat_map(|value| {
                value
                    .as_ref()
                    .split(',')
                    .map(|field| field.trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|field| !field.is_empty())
            .collect();
        Self {
            patterns: fields.into_iter().map(Glob::new).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Glob> {
        self.patterns.iter()
    }

    /// True if any pattern matches `name`. Malformed patterns are skipped.
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }
}

/// Match a single glob against a flat name.
pub fn match_one(pattern: &str, name: &str) -> bool {
    Glob::new(pattern).matches(name)
}

/// Which tables a datasource run keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableFilter {
    /// Any of a set of patterns (MySQL).
    Set(PatternSet),
    /// One raw pattern (PostgreSQL).
    Raw(Glob),
}

impl TableFilter {
    /// A single raw pattern, trimmed.
    pub fn raw(pattern: &str) -> Self {
        TableFilter::Raw(Glob::new(pattern.trim()))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TableFilter::Set(set) => set.is_empty(),
            TableFilter::Raw(glob) => glob.as_str().is_empty(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            TableFilter::Set(set) => set.matches(name),
            TableFilter::Raw(glob) => glob.matches(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_dedups_across_inputs() {
        let set = PatternSet::build(["a,b", "b,c"]);
        let got: Vec<&str> = set.iter().map(Glob::as_str).collect();
        assert_eq!(got, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_build_drops_empty_fields() {
        let set = PatternSet::build(["users,, ", ",orders"]);
        assert_eq!(set.len(), 2);
        assert!(PatternSet::build([",", ""]).is_empty());
        assert!(PatternSet::build(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_literal_pattern_matches_itself() {
        let set = PatternSet::build(["users", "orders"]);
        assert!(set.matches("users"));
        assert!(set.matches("orders"));
        assert!(!set.matches("user"));
    }

    #[test]
    fn test_glob_semantics() {
        assert!(match_one("user*", "users"));
        assert!(match_one("user*", "user_roles"));
        assert!(!match_one("user*", "orders"));
        assert!(match_one("user?", "users"));
        assert!(!match_one("user?", "user"));
        assert!(match_one("[ou]*", "orders"));
        assert!(!match_one("[!ou]*", "users"));
        assert!(match_one("*", "anything"));
    }

    #[test]
    fn test_malformed_pattern_is_skipped() {
        let set = PatternSet::build(["[users", "orders"]);
        assert!(!set.matches("[users"));
        assert!(set.matches("orders"));
    }

    #[test]
    fn test_malformed_pattern_compiled_once() {
        let set = PatternSet::build(["[users", "[users,orders"]);
        let validity: Vec<(&str, bool)> = set.iter().map(|g| (g.as_str(), g.is_valid())).collect();
        assert_eq!(validity, vec![("[users", false), ("orders", true)]);
        for name in ["users", "orders", "[users"] {
            assert_eq!(set.matches(name), name == "orders");
        }
    }

    #[test]
    fn test_repeated_stars_collapse() {
        assert!(match_one("user**", "users"));
        assert!(match_one("user**", "user_roles"));
        assert!(match_one("**", "orders"));
        assert!(match_one("a***b", "a_long_b"));
        assert!(!match_one("user**", "orders"));
    }

    #[test]
    fn test_backslash_escapes() {
        assert!(match_one("a\\*b", "a*b"));
        assert!(!match_one("a\\*b", "axb"));
        assert!(match_one("what\\?", "what?"));
        assert!(!match_one("what\\?", "whats"));
        assert!(match_one("\\[x\\]", "[x]"));
        assert!(match_one("\\u", "u"));
        assert!(!Glob::new("users\\").is_valid());
    }

    #[test]
    fn test_caret_negates_class() {
        assert!(match_one("[^o]*", "users"));
        assert!(!match_one("[^o]*", "orders"));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = PatternSet::default();
        assert!(!set.matches("users"));
    }

    #[test]
    fn test_table_filter() {
        let raw = TableFilter::raw(" user* ");
        assert!(raw.matches("users"));
        assert!(!raw.is_empty());
        assert!(TableFilter::raw("  ").is_empty());
        assert!(TableFilter::Set(PatternSet::default()).is_empty());
    }
}
