//! Deployable scripts and the statement splitter.
//!
//! SQL scripts are split on `;` with a plain textual split: terminators inside
//! string literals or dollar-quoted bodies are not recognised, so such scripts
//! must be written as `.proc` files, which always run as a single statement.

use crate::error::{CoreError, CoreResult};
use crate::manifest::ManifestRow;
use std::fmt;
use std::path::{Path, PathBuf};

/// Statement terminator for `sql` scripts
pub const STATEMENT_TERMINATOR: char = ';';

/// File extensions recognised as deployable scripts
pub const SCRIPT_EXTENSIONS: &[&str] = &["sql", "proc"];

/// How a script body is turned into statements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Plain SQL, split on the statement terminator
    Sql,
    /// Stored procedure, executed as one opaque statement
    Procedure,
}

impl ScriptKind {
    /// Kind for a file path, by extension. `None` if it is not a script file.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("sql") => Some(ScriptKind::Sql),
            Some("proc") => Some(ScriptKind::Procedure),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptKind::Sql => write!(f, "sql"),
            ScriptKind::Procedure => write!(f, "procedure"),
        }
    }
}

/// Where a script's body comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Script file on disk
    File(PathBuf),
    /// SQL text carried directly in the manifest
    Inline(String),
}

/// A script targeted at one database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Identifier, unique within `database`
    pub name: String,
    /// Target database name
    pub database: String,
    /// Body location
    pub source: ScriptSource,
    /// Splitting rule
    pub kind: ScriptKind,
}

impl Script {
    /// Build a script from a manifest row.
    ///
    /// Commands ending in a script extension are file paths, resolved against
    /// `<schemas_path>/<db>/` when relative; anything else is inline SQL.
    pub fn from_manifest_row(row: &ManifestRow, schemas_path: &Path) -> Self {
        let command = row.command.trim();
        let candidate = Path::new(command);
        let (source, kind) = match ScriptKind::from_path(candidate) {
            Some(kind) => {
                let path = if candidate.is_absolute() {
                    candidate.to_path_buf()
                } else {
                    schemas_path.join(&row.db).join(candidate)
                };
                (ScriptSource::File(path), kind)
            }
            None => (ScriptSource::Inline(command.to_string()), ScriptKind::Sql),
        };

        Self {
            name: row.name.clone(),
            database: row.db.clone(),
            source,
            kind,
        }
    }

    /// Build a script from a file on disk, named by its file stem.
    ///
    /// Returns `None` when the extension is not a script extension.
    pub fn from_file(database: &str, path: &Path) -> Option<Self> {
        let kind = ScriptKind::from_path(path)?;
        let name = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            name,
            database: database.to_string(),
            source: ScriptSource::File(path.to_path_buf()),
            kind,
        })
    }

    /// Read the body (for file scripts) and split it into statements
    pub fn load_statements(&self) -> CoreResult<Vec<String>> {
        match &self.source {
            ScriptSource::File(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
                        path: path.display().to_string(),
                        source: e,
                    })?;
                Ok(split_statements(&content, self.kind))
            }
            ScriptSource::Inline(body) => Ok(split_statements(body, self.kind)),
        }
    }

    /// Human-readable location, used in log lines
    pub fn location(&self) -> String {
        match &self.source {
            ScriptSource::File(path) => path.display().to_string(),
            ScriptSource::Inline(_) => format!("<inline {}>", self.name),
        }
    }
}

/// Split a script body into executable statements.
///
/// `Sql` bodies are split on `;`, dropping blank and comment-only chunks.
/// `Procedure` bodies are returned whole.
pub fn split_statements(content: &str, kind: ScriptKind) -> Vec<String> {
    match kind {
        ScriptKind::Procedure => {
            if content.trim().is_empty() {
                Vec::new()
            } else {
                vec![content.to_string()]
            }
        }
        ScriptKind::Sql => content
            .split(STATEMENT_TERMINATOR)
            .map(str::trim)
            .filter(|stmt| !is_blank_or_comment(stmt))
            .map(str::to_string)
            .collect(),
    }
}

/// True if the statement has no executable content: outside `/* */` blocks,
/// every non-blank line is a `--` or `#` comment.
pub fn is_blank_or_comment(statement: &str) -> bool {
    strip_block_comments(statement)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .all(|line| line.starts_with("--") || line.starts_with('#'))
}

/// Remove `/* ... */` comments. An unterminated block runs to the end.
fn strip_block_comments(statement: &str) -> String {
    let mut out = String::with_capacity(statement.len());
    let mut rest = statement;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => {
                // Keep a separator so `a/* x */b` stays two tokens
                out.push(' ');
                rest = &rest[start + 2 + end + 2..];
            }
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
