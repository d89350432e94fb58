//! luassist library: fix missing requires and system registrations in Lua
//! game modules.
//!
//! The workflow for one source file has four phases:
//!
//! 1. **Analysis**: run luacheck and collect "accessing undefined variable"
//!    diagnostics for identifiers that follow a naming convention
//! 2. **Imports**: insert a `local X = require '...'` line per missing identifier
//! 3. **Hooks**: find which lifecycle hooks (`awake`, `start`, `update`) the
//!    patched module defines
//! 4. **Registration**: add the module to each matching list in `data/sys_def.lua`
//!
//! All edits are line based; there is no Lua parser, so hand-written
//! formatting outside the inserted lines is preserved exactly.
//!
//! # Example
//!
//! ```
//! use luassist::classify::Reference;
//! use luassist::rewriter::{Namespaces, insert_all};
//! use luassist::source::SourceLines;
//!
//! let mut lines = SourceLines::from_text("local M = {}\n\nreturn M\n");
//! let refs = vec![Reference::from_identifier("GenItemData").unwrap()];
//! let namespaces = Namespaces { sys: "game.sys".into(), generated: "gen".into() };
//! insert_all(&mut lines, &refs, &namespaces);
//!
//! assert_eq!(
//!     lines.to_text(),
//!     "local M = {}\nlocal GenItemData = require 'gen.item_data'\n\nreturn M\n"
//! );
//! ```

pub mod analyzer;
pub mod classify;
pub mod config;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod registry;
pub mod rewriter;
pub mod scanner;
pub mod source;

// Re-export commonly used types at crate root
pub use classify::{Reference, ReferenceKind};
pub use config::Settings;
pub use pipeline::{Patch, PatchReport};
pub use scanner::HookFlag;
pub use source::SourceLines;
