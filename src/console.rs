//! Console output.
//!
//! Terminal users get colored lines. With `--idea` the output is plain and
//! tagged so IDE plugins can parse it.

use colored::*;

/// User-facing message sink. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Console {
    idea: bool,
}

impl Console {
    pub fn new(idea: bool) -> Self {
        Self { idea }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        if self.idea {
            println!("[INFO] {}", msg);
        } else {
            println!("{}", msg);
        }
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        if self.idea {
            println!("[SUCCESS] {}", msg);
        } else {
            println!("{} {}", "✓".green(), msg.green().bold());
        }
    }

    pub fn warning(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        if self.idea {
            println!("[WARNING] {}", msg);
        } else {
            println!("{} {}", "⚠".yellow(), msg.yellow());
        }
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        if self.idea {
            eprintln!("[ERROR] {}", msg);
        } else {
            eprintln!("{} {}", "Error:".red().bold(), msg);
        }
    }
}
