//! Configuration management for mkinitramfs.
//!
//! Reads defaults from the environment (after `.env` has been loaded by the
//! binary). Command-line flags take precedence over everything here.

use std::collections::HashMap;

use log::LevelFilter;

use crate::initramfs::{DEFAULT_INIT, DEFAULT_SHELL};

/// Environment variable overriding the default `init` symlink target.
pub const INIT_ENV: &str = "MKINITRAMFS_INIT";
/// Environment variable overriding the default shell. May be empty.
pub const DEFAULTSH_ENV: &str = "MKINITRAMFS_DEFAULTSH";
/// Environment variable selecting the log level.
pub const LOG_ENV: &str = "MKINITRAMFS_LOG";

/// mkinitramfs configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Default target of the `init` symlink (default: bbin/init)
    pub init_target: String,
    /// Default shell name for `bin/defaultsh` (default: elvish, empty disables)
    pub default_shell: String,
    /// Log level (default: info)
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            init_target: DEFAULT_INIT.to_string(),
            default_shell: DEFAULT_SHELL.to_string(),
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Self {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// An empty `MKINITRAMFS_DEFAULTSH` disables the shell link; an empty
    /// `MKINITRAMFS_INIT` is ignored. Unknown log levels fall back to info.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let init_target = lookup(INIT_ENV)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.init_target);

        let default_shell = lookup(DEFAULTSH_ENV)
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.default_shell);

        let log_level = lookup(LOG_ENV)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.log_level);

        Self {
            init_target,
            default_shell,
            log_level,
        }
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  {}: {}", INIT_ENV, self.init_target);
        if self.default_shell.is_empty() {
            println!("  {}: (disabled)", DEFAULTSH_ENV);
        } else {
            println!("  {}: {}", DEFAULTSH_ENV, self.default_shell);
        }
        println!("  {}: {}", LOG_ENV, self.log_level);
    }
}
