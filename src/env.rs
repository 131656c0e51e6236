use crate::ExitCode;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, session-owned view of the process environment.
///
/// The environment contains:
/// - `vars`: the variables visible to expansion and to executed commands,
///   including the synthetic `?` entry holding the last exit status.
/// - `current_dir`: the working directory for command execution.
/// - `home_dir`: the home directory, used by bare `cd` and for history.
///
/// Note: fields are public for simplicity; every mutation happens on the
/// single session thread.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// The home directory, falling back to `/` when HOME is unset or empty.
    pub home_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment`.
    ///
    /// Copies variables from `std::env::vars()`, initializes `current_dir`
    /// from `std::env::current_dir()` and seeds the `?` entry with `0`.
    pub fn new() -> Self {
        let mut vars: HashMap<String, String> = stdenv::vars().collect();
        vars.insert("?".to_string(), "0".to_string());
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        let home_dir = match vars.get("HOME") {
            Some(home) if !home.is_empty() => PathBuf::from(home),
            _ => PathBuf::from("/"),
        };
        Self {
            vars,
            current_dir,
            home_dir,
        }
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override an environment variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Remove an environment variable, if present.
    pub fn remove_var(&mut self, key: &str) {
        self.vars.remove(key);
    }

    /// Record the exit status of the most recently executed segment in `?`.
    pub fn set_status(&mut self, status: ExitCode) {
        self.set_var("?", status.to_string());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
