//! Lifecycle hook detection.
//!
//! A system opts into a scheduler phase by defining `function M.awake(...)`,
//! `function M.start(...)` or `function M.update(...)` at the top level.

use crate::source::SourceLines;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static HOOK_DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^function\s+M\.(\w+)\s*\(").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookFlag {
    Awake,
    Start,
    Update,
}

impl HookFlag {
    pub const ALL: [HookFlag; 3] = [HookFlag::Awake, HookFlag::Start, HookFlag::Update];

    /// The function name and registration label for this hook.
    pub fn label(self) -> &'static str {
        match self {
            HookFlag::Awake => "awake",
            HookFlag::Start => "start",
            HookFlag::Update => "update",
        }
    }

    pub fn from_label(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.label() == name)
    }
}

impl fmt::Display for HookFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub type HookFlags = BTreeSet<HookFlag>;

/// Collects the hooks a module defines.
pub fn scan_hooks(lines: &SourceLines) -> HookFlags {
    lines
        .iter()
        .filter_map(|line| HOOK_DEFINITION.captures(line))
        .filter_map(|caps| HookFlag::from_label(&caps[1]))
        .collect()
}
