//! Import insertion for missing `require` declarations.
//!
//! Finds where the file's import header ends and inserts one
//! `local X = require '...'` line per distinct reference. The anchor is
//! recomputed from the current lines before every insertion, since each
//! insertion moves the end of the header.

use crate::classify::{GENERATED_PREFIX, Reference, ReferenceKind};
use crate::error::ImportError;
use crate::source::{SourceLines, body};
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

static IMPORT_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^local\s+(\w+)\s*=\s*require\b").unwrap());
static EMPTY_MODULE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*local\s+M\s*=\s*\{\s*\}\s*$").unwrap());

/// Namespaces the derived `require` paths live under.
#[derive(Debug, Clone)]
pub struct Namespaces {
    pub sys: String,
    pub generated: String,
}

/// Where the next import goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Directly after the last import declaration of the header.
    AfterImport(usize),
    /// Directly after `local M = {}`; no import exists yet.
    AfterModuleTable(usize),
    /// No header at all.
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderScan {
    Init,
    HeadRequireFound,
}

/// An import that was added to the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insertion {
    pub identifier: String,
    pub kind: ReferenceKind,
    /// 0-based index of the inserted line.
    pub line: usize,
    pub text: String,
}

/// A reference that could not be turned into an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub identifier: String,
    pub reason: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportOutcome {
    pub inserted: Vec<Insertion>,
    pub rejected: Vec<Rejection>,
}

fn is_comment(line: &str) -> bool {
    line.starts_with("--")
}

fn is_blank(line: &str) -> bool {
    body(line).trim().is_empty()
}

/// Locates the insertion anchor in the current contents of `lines`.
pub fn find_anchor(lines: &SourceLines) -> Anchor {
    let mut state = HeaderScan::Init;
    let mut table_anchor = None;
    let mut import_anchor = None;

    for (cursor, line) in lines.iter().enumerate() {
        let text = body(line);
        match state {
            HeaderScan::Init => {
                if is_comment(text) {
                    continue;
                } else if EMPTY_MODULE_TABLE.is_match(text) {
                    table_anchor.get_or_insert(cursor + 1);
                } else if IMPORT_DECL.is_match(text) {
                    import_anchor = Some(cursor + 1);
                    state = HeaderScan::HeadRequireFound;
                }
            }
            HeaderScan::HeadRequireFound => {
                if is_comment(text) || IMPORT_DECL.is_match(text) {
                    import_anchor = Some(cursor + 1);
                } else {
                    break;
                }
            }
        }
    }

    match (import_anchor, table_anchor) {
        (Some(pos), _) => Anchor::AfterImport(pos),
        (None, Some(pos)) => Anchor::AfterModuleTable(pos),
        (None, None) => Anchor::Top,
    }
}

/// Identifiers that already have a top-level `require` declaration.
pub fn declared_imports(lines: &SourceLines) -> HashSet<String> {
    lines
        .iter()
        .filter_map(|line| IMPORT_DECL.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Derives the `require` path for `reference`.
pub fn module_path(reference: &Reference, namespaces: &Namespaces) -> Result<String, ImportError> {
    let identifier = reference.identifier();
    match reference.kind() {
        ReferenceKind::SiblingSystem => Ok(format!("{}.{}", namespaces.sys, identifier)),
        ReferenceKind::GeneratedModule => {
            let tail = identifier
                .strip_prefix(GENERATED_PREFIX)
                .ok_or_else(|| ImportError::PrefixMismatch(identifier.to_string()))?;
            let snake = pascal_to_snake(tail)
                .ok_or_else(|| ImportError::NotPascalCase(identifier.to_string()))?;
            Ok(format!("{}.{}", namespaces.generated, snake))
        }
    }
}

/// `ItemData` -> `item_data`. Only strict ASCII PascalCase is accepted.
fn pascal_to_snake(tail: &str) -> Option<String> {
    let mut chars = tail.chars();
    let first = chars.next().filter(char::is_ascii_uppercase)?;
    let mut out = String::with_capacity(tail.len() + 4);
    out.push(first.to_ascii_lowercase());
    for c in chars {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_lowercase() {
            out.push(c);
        } else {
            return None;
        }
    }
    Some(out)
}

/// Inserts one import per distinct identifier in `references`.
///
/// Later duplicates and identifiers that are already imported are skipped.
/// Generated-module identifiers that fail path derivation are reported in
/// [`ImportOutcome::rejected`] and leave the file untouched.
pub fn insert_all(
    lines: &mut SourceLines,
    references: &[Reference],
    namespaces: &Namespaces,
) -> ImportOutcome {
    let mut outcome = ImportOutcome::default();
    let mut seen = declared_imports(lines);

    for reference in references {
        let identifier = reference.identifier();
        if !seen.insert(identifier.to_string()) {
            continue;
        }

        let path = match module_path(reference, namespaces) {
            Ok(path) => path,
            Err(err) => {
                warn!("skipping {}: {}", identifier, err);
                outcome.rejected.push(Rejection {
                    identifier: identifier.to_string(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let ending = lines.line_ending();
        let text = format!("local {} = require '{}'{}", identifier, path, ending);
        let anchor = find_anchor(lines);
        debug!("inserting {} at {:?}", identifier, anchor);
        let line = match anchor {
            Anchor::AfterImport(pos) => {
                lines.insert(pos, text.clone());
                pos
            }
            Anchor::AfterModuleTable(pos) => {
                if !lines.get(pos).is_some_and(is_blank) {
                    lines.insert(pos, ending.to_string());
                }
                lines.insert(pos, text.clone());
                pos
            }
            Anchor::Top => {
                lines.insert(0, text.clone());
                0
            }
        };

        outcome.inserted.push(Insertion {
            identifier: identifier.to_string(),
            kind: reference.kind(),
            line,
            text,
        });
    }

    outcome
}
