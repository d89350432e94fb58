//! Command-line interface definitions.
//!
//! One positional source file; the patched source goes to stdout and the
//! registration file is updated on the side.

use clap::Parser;
use luassist::Settings;
use luassist::config::{
    DEFAULT_ANALYZER, DEFAULT_GEN_NAMESPACE, DEFAULT_REGISTRATION_FILE, DEFAULT_SYS_NAMESPACE,
};
use std::path::PathBuf;
use std::time::Duration;

/// Insert missing requires into a Lua system and register its hooks.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Lua source file to patch. The patched source is written to stdout.
    pub src_file: PathBuf,

    /// Analyzer config. Defaults to the nearest `.luacheckrc` above the source file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Registration file, searched for relative to each ancestor directory.
    #[arg(long, default_value = DEFAULT_REGISTRATION_FILE)]
    pub registration: PathBuf,

    /// Analyzer executable.
    #[arg(long, default_value = DEFAULT_ANALYZER)]
    pub analyzer: String,

    /// Seconds to wait for the analyzer before giving up.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Namespace sibling systems are required from.
    #[arg(long, default_value = DEFAULT_SYS_NAMESPACE)]
    pub sys_namespace: String,

    /// Namespace generated modules are required from.
    #[arg(long, default_value = DEFAULT_GEN_NAMESPACE)]
    pub gen_namespace: String,

    /// Do not touch the registration file.
    #[arg(long)]
    pub no_register: bool,

    /// Report what would change instead of printing the source; writes nothing.
    #[arg(long)]
    pub check: bool,

    /// With --check, emit the report as JSON.
    #[arg(long, requires = "check")]
    pub json: bool,

    /// Confirm before rewriting the registration file.
    #[arg(short, long, conflicts_with = "check")]
    pub interactive: bool,

    /// Print debug logging to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn settings(&self) -> Settings {
        Settings {
            analyzer: self.analyzer.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            config: self.config.clone(),
            registration_file: self.registration.clone(),
            sys_namespace: self.sys_namespace.clone(),
            gen_namespace: self.gen_namespace.clone(),
            register: !self.no_register,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_settings_defaults() {
        let args = Args::try_parse_from(["luassist", "game/sys/SPlayer.lua"]).unwrap();
        let settings = args.settings();
        let defaults = Settings::default();
        assert_eq!(settings.analyzer, defaults.analyzer);
        assert_eq!(settings.timeout, defaults.timeout);
        assert_eq!(settings.registration_file, defaults.registration_file);
        assert_eq!(settings.sys_namespace, defaults.sys_namespace);
        assert_eq!(settings.gen_namespace, defaults.gen_namespace);
        assert!(settings.register);
        assert!(settings.config.is_none());
    }

    #[test]
    fn json_requires_check() {
        assert!(Args::try_parse_from(["luassist", "x.lua", "--json"]).is_err());
        assert!(Args::try_parse_from(["luassist", "x.lua", "--check", "--json"]).is_ok());
    }

    #[test]
    fn source_file_is_required() {
        assert!(Args::try_parse_from(["luassist"]).is_err());
    }
}
