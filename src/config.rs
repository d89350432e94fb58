//! Runtime settings shared by the pipeline stages.

use std::path::PathBuf;
use std::time::Duration;

/// Default analyzer executable.
pub const DEFAULT_ANALYZER: &str = "luacheck";
/// File name searched for in ancestor directories to configure the analyzer.
pub const CONFIG_FILE_NAME: &str = ".luacheckrc";
/// Registration file path, relative to the project root.
pub const DEFAULT_REGISTRATION_FILE: &str = "data/sys_def.lua";
pub const DEFAULT_SYS_NAMESPACE: &str = "game.sys";
pub const DEFAULT_GEN_NAMESPACE: &str = "gen";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Settings {
    /// Analyzer executable name or path.
    pub analyzer: String,
    /// Upper bound on how long the analyzer may run.
    pub timeout: Duration,
    /// Explicit analyzer config; skips the ancestor search when set.
    pub config: Option<PathBuf>,
    /// Registration file path relative to an ancestor directory.
    pub registration_file: PathBuf,
    /// Lua namespace sibling systems are required from.
    pub sys_namespace: String,
    /// Lua namespace generated modules are required from.
    pub gen_namespace: String,
    /// Whether to touch the registration file at all.
    pub register: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            analyzer: DEFAULT_ANALYZER.to_string(),
            timeout: DEFAULT_TIMEOUT,
            config: None,
            registration_file: PathBuf::from(DEFAULT_REGISTRATION_FILE),
            sys_namespace: DEFAULT_SYS_NAMESPACE.to_string(),
            gen_namespace: DEFAULT_GEN_NAMESPACE.to_string(),
            register: true,
        }
    }
}
