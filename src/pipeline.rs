//! End-to-end patching of one source file.
//!
//! Resolves the analyzer config, runs the analyzer, inserts missing imports,
//! scans the patched source for hooks and, for files under `game/sys/`,
//! prepares the registration file edit. Nothing is written here: the caller
//! decides whether to commit the [`Patch`].

use crate::analyzer;
use crate::classify::Reference;
use crate::config::{CONFIG_FILE_NAME, Settings};
use crate::paths::{canonical_module_name, find_ancestor_file};
use crate::registry::{self, RegistrationOutcome};
use crate::rewriter::{self, ImportOutcome, Namespaces};
use crate::scanner::{HookFlag, scan_hooks};
use crate::source::SourceLines;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The pending registration file rewrite.
#[derive(Debug, Clone)]
pub struct RegistrationPatch {
    pub path: PathBuf,
    pub lines: SourceLines,
    pub outcome: RegistrationOutcome,
}

/// Summary of a run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PatchReport {
    pub source: PathBuf,
    pub module: Option<String>,
    pub hooks: Vec<HookFlag>,
    pub imports: ImportOutcome,
    pub registration_file: Option<PathBuf>,
    pub registration: Option<RegistrationOutcome>,
}

impl PatchReport {
    pub fn registration_changed(&self) -> bool {
        self.registration.as_ref().is_some_and(|r| r.changed)
    }
}

/// Everything a run computed, held in memory until committed.
#[derive(Debug, Clone)]
pub struct Patch {
    pub source: SourceLines,
    pub registration: Option<RegistrationPatch>,
    pub report: PatchReport,
}

impl Patch {
    /// Writes the registration file if it changed, with `\n` line endings.
    pub fn write_registration(&self) -> Result<bool> {
        match &self.registration {
            Some(reg) if reg.outcome.changed => {
                std::fs::write(&reg.path, reg.lines.to_unix_text())
                    .with_context(|| format!("Failed to write {}", reg.path.display()))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Locates the analyzer config for `source`, honouring an explicit override.
pub fn resolve_config(source: &Path, settings: &Settings) -> Result<PathBuf> {
    if let Some(config) = &settings.config {
        anyhow::ensure!(config.is_file(), "Config file {} not found", config.display());
        return Ok(config.clone());
    }
    let dir = source.parent().unwrap_or(Path::new("."));
    find_ancestor_file(dir, Path::new(CONFIG_FILE_NAME)).with_context(|| {
        format!(
            "No {} found in {} or any parent directory",
            CONFIG_FILE_NAME,
            dir.display()
        )
    })
}

/// Runs the analyzer on `source` and patches it in memory.
pub fn run(source: &Path, settings: &Settings) -> Result<Patch> {
    let source = std::path::absolute(source)
        .with_context(|| format!("Failed to resolve {}", source.display()))?;
    let config = resolve_config(&source, settings)?;
    debug!("using config {}", config.display());

    let references = analyzer::analyze(&settings.analyzer, &source, &config, settings.timeout)
        .context("Static analysis failed")?;
    let lines = SourceLines::read(&source)?;
    patch_lines(&source, lines, &references, settings)
}

/// Applies already-collected references to `lines` read from `source`.
pub fn patch_lines(
    source: &Path,
    mut lines: SourceLines,
    references: &[Reference],
    settings: &Settings,
) -> Result<Patch> {
    let namespaces = Namespaces {
        sys: settings.sys_namespace.clone(),
        generated: settings.gen_namespace.clone(),
    };
    let imports = rewriter::insert_all(&mut lines, references, &namespaces);
    info!(
        "{} import(s) inserted into {}",
        imports.inserted.len(),
        source.display()
    );

    let hooks = scan_hooks(&lines);
    let module = canonical_module_name(source);
    let mut report = PatchReport {
        source: source.to_path_buf(),
        module: module.clone(),
        hooks: hooks.iter().copied().collect(),
        imports,
        ..PatchReport::default()
    };

    let registration = match module {
        Some(module) if settings.register && !hooks.is_empty() => {
            let dir = source.parent().unwrap_or(Path::new("."));
            let path = find_ancestor_file(dir, &settings.registration_file).with_context(|| {
                format!(
                    "No {} found above {}",
                    settings.registration_file.display(),
                    dir.display()
                )
            })?;
            let mut reg_lines = SourceLines::read(&path)?;
            let outcome = registry::apply(&mut reg_lines, &module, &hooks)
                .with_context(|| format!("Cannot register {} in {}", module, path.display()))?;
            report.registration_file = Some(path.clone());
            report.registration = Some(outcome.clone());
            Some(RegistrationPatch {
                path,
                lines: reg_lines,
                outcome,
            })
        }
        Some(module) => {
            debug!("{} defines no hooks or registration is disabled", module);
            None
        }
        None => {
            debug!("{} is not a system module, skipping registration", source.display());
            None
        }
    };

    Ok(Patch {
        source: lines,
        registration,
        report,
    })
}
