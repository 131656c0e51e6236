//! Launching external commands: PATH resolution and synchronous spawn/wait.

use crate::ExitCode;
use crate::env::Environment;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Resolve a command path the way the shell launches it.
///
/// - Absolute path: returned if it exists.
/// - Anything with more than one component (`bin/sh`, `./foo`): resolved
///   relative to the current directory if it exists.
/// - Single component: searched in each directory of `search_paths` (PATH),
///   first existing match wins.
/// - Empty path: `None`.
pub(crate) fn find_command_path(search_paths: &OsStr, cmd: &Path) -> Option<PathBuf> {
    if cmd.as_os_str().is_empty() {
        return None;
    }
    if cmd.is_absolute() {
        return cmd.exists().then(|| cmd.to_path_buf());
    }
    if cmd.components().count() > 1 {
        return cmd.exists().then(|| cmd.to_path_buf());
    }
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| candidate.exists())
}

/// Spawn `args` as a child process and block until it terminates.
///
/// The child inherits the terminal, receives the environment store's
/// variables (minus the synthetic `?` entry) and runs in the store's current
/// directory. While the child runs the shell ignores SIGINT, so an interrupt
/// reaches the child and not the shell; the default disposition is restored
/// as soon as the child is gone.
///
/// Lookup and spawn failures are reported here and yield status 127.
pub(crate) fn run(args: &[String], env: &Environment) -> ExitCode {
    let search_paths = env.get_var("PATH").unwrap_or_default();
    let Some(program) = find_command_path(OsStr::new(&search_paths), Path::new(&args[0])) else {
        eprintln!("{}: command not found", args[0]);
        return 127;
    };

    let spawned = Command::new(&program)
        .args(&args[1..])
        .env_clear()
        .envs(env.vars.iter().filter(|(key, _)| key.as_str() != "?"))
        .current_dir(&env.current_dir)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            eprintln!("{}: {}", args[0], e);
            return 127;
        }
    };

    ignore_interrupts();
    let waited = child.wait();
    restore_interrupts();

    match waited {
        Ok(status) => status.code().unwrap_or_else(|| signal_status(status)),
        Err(e) => {
            eprintln!("{}: {}", args[0], e);
            127
        }
    }
}

#[cfg(unix)]
fn signal_status(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => 128 + signal,
        None => -1,
    }
}

#[cfg(not(unix))]
fn signal_status(_status: ExitStatus) -> ExitCode {
    -1
}

#[cfg(unix)]
fn ignore_interrupts() {
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_IGN);
    }
}

#[cfg(unix)]
fn restore_interrupts() {
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
fn ignore_interrupts() {}

#[cfg(not(unix))]
fn restore_interrupts() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    #[test]
    #[cfg(unix)]
    fn test_absolute_existing_path_resolves() {
        let res = find_command_path(osstr("/bin"), Path::new("/bin/sh"));
        assert_eq!(res, Some(PathBuf::from("/bin/sh")));
    }

    #[test]
    #[cfg(unix)]
    fn test_absolute_missing_path_does_not_resolve() {
        let res = find_command_path(osstr("/bin"), Path::new("/bin/nonexisting_xyz"));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn test_single_component_found_via_path_search() {
        let res = find_command_path(osstr("/nonexistent:/bin"), Path::new("sh"));
        assert_eq!(res, Some(PathBuf::from("/bin/sh")));
    }

    #[test]
    #[cfg(unix)]
    fn test_single_component_not_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("no_such_command_xyz"));
        assert!(res.is_none());
    }

    #[test]
    fn test_empty_path_does_not_resolve() {
        let res = find_command_path(OsStr::new("/bin"), Path::new(""));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn test_run_propagates_child_exit_status() {
        let mut env = Environment::new();
        env.set_var("PATH", "/usr/bin:/bin");
        let args = vec!["sh".to_string(), "-c".to_string(), "exit 7".to_string()];
        assert_eq!(run(&args, &env), 7);
    }

    #[test]
    fn test_run_reports_missing_command_as_127() {
        let env = Environment::new();
        let args = vec!["definitely_no_such_command_xyz".to_string()];
        assert_eq!(run(&args, &env), 127);
    }
}
