//! Identifier classification by naming convention.
//!
//! `SPhysics` names a sibling system, `GenItemData` names a generated data
//! module. Everything else is not ours to fix and is dropped silently.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Prefix shared by every generated-module identifier.
pub const GENERATED_PREFIX: &str = "Gen";

static SIBLING_SYSTEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^S[A-Z]\w+$").unwrap());
static GENERATED_MODULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Gen[A-Z]\w*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReferenceKind {
    SiblingSystem,
    GeneratedModule,
}

/// A classified identifier that needs an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    kind: ReferenceKind,
    identifier: String,
}

impl Reference {
    /// Classifies `identifier`, returning `None` when no convention applies.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        classify(identifier).map(|kind| Self {
            kind,
            identifier: identifier.to_string(),
        })
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

pub fn classify(identifier: &str) -> Option<ReferenceKind> {
    if GENERATED_MODULE.is_match(identifier) {
        Some(ReferenceKind::GeneratedModule)
    } else if SIBLING_SYSTEM.is_match(identifier) {
        Some(ReferenceKind::SiblingSystem)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_systems_use_s_prefix() {
        assert_eq!(classify("SPhysics"), Some(ReferenceKind::SiblingSystem));
        assert_eq!(classify("SUI"), Some(ReferenceKind::SiblingSystem));
    }

    #[test]
    fn generated_modules_use_gen_prefix() {
        assert_eq!(classify("GenItemData"), Some(ReferenceKind::GeneratedModule));
        assert_eq!(classify("GenX"), Some(ReferenceKind::GeneratedModule));
    }

    #[test]
    fn rejects_other_identifiers() {
        for ident in ["Sound", "SX", "sPhysics", "Generic", "Gen", "genItem", "print", "M", ""] {
            assert_eq!(classify(ident), None, "{ident} should not classify");
        }
    }

    #[test]
    fn rejects_partial_matches() {
        assert_eq!(classify("SFoo.bar"), None);
        assert_eq!(classify("GenItem-Data"), None);
    }

    #[test]
    fn reference_keeps_identifier() {
        let reference = Reference::from_identifier("GenItemData").unwrap();
        assert_eq!(reference.kind(), ReferenceKind::GeneratedModule);
        assert_eq!(reference.identifier(), "GenItemData");
        assert!(Reference::from_identifier("print").is_none());
    }
}
