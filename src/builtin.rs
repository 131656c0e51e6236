//! The builtin dispatcher: commands handled in-process.
//!
//! [`dispatch`] inspects a resolved argument list and either executes a
//! builtin or reports [`BuiltinStatus::NotBuiltin`] so the driver forwards
//! the list to external process creation. Builtins write their regular
//! output through the provided `Write` handle; diagnostics go to stderr.

use crate::ExitCode;
use crate::external;
use crate::interpreter::Interpreter;
use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Names the dispatcher recognizes, exposed for the completion candidate set.
pub(crate) const BUILTIN_NAMES: &[&str] = &[
    "exit", "logout", "cd", "chdir", "export", "setenv", "getenv", "builtin", "command", "echo",
    ":", ".", "source", "alias", "unalias",
];

/// PATH substituted by `command -p` for the duration of a single call.
const SAFE_PATH: &str = "/usr/bin:/bin";

/// Outcome of asking the dispatcher to handle an argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuiltinStatus {
    /// argv[0] names no builtin; forward to external process creation.
    NotBuiltin,
    /// Terminate the whole session, returning this code to the host.
    Exit(ExitCode),
    /// The builtin ran and succeeded.
    Success,
    /// The builtin ran and failed; carries the status recorded in `?`.
    Failure(ExitCode),
    /// Wrong number or format of arguments; reported by the caller, the
    /// session continues.
    UsageError,
    /// A leading `NAME=VALUE` was applied to the environment; dispatch again
    /// with the argument list shifted forward by one.
    ReparseWithShift,
}

/// Handle one argument list. `args` must be non-empty.
pub(crate) fn dispatch(
    args: &[String],
    sh: &mut Interpreter,
    out: &mut dyn Write,
) -> Result<BuiltinStatus> {
    debug_assert!(!args.is_empty());

    if let Some((name, value)) = split_assignment(&args[0]) {
        let (name, value) = (name.to_string(), value.to_string());
        sh.env.set_var(name, value);
        return Ok(if args.len() == 1 {
            BuiltinStatus::Success
        } else {
            BuiltinStatus::ReparseWithShift
        });
    }

    match args[0].as_str() {
        "exit" | "logout" => exit_shell(args),
        "cd" | "chdir" => change_dir(args, sh),
        "export" | "setenv" => export_vars(args, sh),
        "getenv" => get_env(args, sh, out),
        "builtin" => run_builtin(args, sh, out),
        "command" => run_command(args, sh),
        "echo" => echo(args, out),
        "alias" => alias_cmd(args, sh, out),
        // accepted no-ops: `:` by contract, `.`/`source` because scripts are
        // not interpreted, `unalias` for compatibility
        ":" | "." | "source" | "unalias" => Ok(BuiltinStatus::Success),
        _ => Ok(BuiltinStatus::NotBuiltin),
    }
}

/// `NAME=VALUE` with a plausible variable name on the left.
fn split_assignment(word: &str) -> Option<(&str, &str)> {
    let (name, value) = word.split_once('=')?;
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, value))
}

fn exit_shell(args: &[String]) -> Result<BuiltinStatus> {
    match args {
        [_] => Ok(BuiltinStatus::Exit(0)),
        [_, code] => match code.parse::<ExitCode>() {
            Ok(code) => Ok(BuiltinStatus::Exit(code)),
            Err(_) => Ok(BuiltinStatus::UsageError),
        },
        _ => Ok(BuiltinStatus::UsageError),
    }
}

fn change_dir(args: &[String], sh: &mut Interpreter) -> Result<BuiltinStatus> {
    let target = match args {
        [_] => sh.env.home_dir.clone(),
        [_, path] => PathBuf::from(path),
        _ => return Ok(BuiltinStatus::UsageError),
    };

    let dest = if target.is_absolute() {
        target
    } else {
        sh.env.current_dir.join(target)
    };

    let changed = fs::canonicalize(&dest).and_then(|dir| {
        std::env::set_current_dir(&dir)?;
        Ok(dir)
    });
    match changed {
        Ok(dir) => {
            sh.env.set_var("PWD", dir.to_string_lossy());
            sh.env.current_dir = dir;
            Ok(BuiltinStatus::Success)
        }
        Err(e) => {
            eprintln!("cd: {}: {}", dest.display(), e);
            Ok(BuiltinStatus::Failure(1))
        }
    }
}

fn export_vars(args: &[String], sh: &mut Interpreter) -> Result<BuiltinStatus> {
    if args.len() < 2 {
        return Ok(BuiltinStatus::UsageError);
    }
    // validate everything up front so a malformed entry applies nothing
    let mut pairs = Vec::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        match arg.split_once('=') {
            Some((name, value)) if !name.is_empty() => pairs.push((name, value)),
            _ => return Ok(BuiltinStatus::UsageError),
        }
    }
    for (name, value) in pairs {
        sh.env.set_var(name, value);
    }
    Ok(BuiltinStatus::Success)
}

fn get_env(args: &[String], sh: &mut Interpreter, out: &mut dyn Write) -> Result<BuiltinStatus> {
    if args.len() != 2 {
        return Ok(BuiltinStatus::UsageError);
    }
    match sh.env.get_var(&args[1]) {
        Some(value) => {
            writeln!(out, "{value}")?;
            Ok(BuiltinStatus::Success)
        }
        None => {
            eprintln!("getenv: {}: no such variable", args[1]);
            Ok(BuiltinStatus::Failure(1))
        }
    }
}

/// `builtin <name> [...]`: re-dispatch with the first argument consumed,
/// never falling through to an external command of the same name. Assignment
/// prefixes in the inner list are shifted off here so the reparse signal
/// stays within this argument frame.
fn run_builtin(args: &[String], sh: &mut Interpreter, out: &mut dyn Write) -> Result<BuiltinStatus> {
    if args.len() < 2 {
        return Ok(BuiltinStatus::UsageError);
    }
    let mut rest = &args[1..];
    loop {
        match dispatch(rest, sh, out)? {
            BuiltinStatus::NotBuiltin => {
                eprintln!("builtin: {}: not a shell builtin", rest[0]);
                return Ok(BuiltinStatus::Failure(1));
            }
            BuiltinStatus::ReparseWithShift => {
                rest = &rest[1..];
                if rest.is_empty() {
                    return Ok(BuiltinStatus::Success);
                }
            }
            status => return Ok(status),
        }
    }
}

/// `command [-p] <name> [...]`: forward straight to external process
/// creation. With `-p` a fixed safe PATH is substituted for this single call
/// and the prior value restored afterwards, child failure included.
fn run_command(args: &[String], sh: &mut Interpreter) -> Result<BuiltinStatus> {
    let (safe_path, rest) = match args.get(1).map(String::as_str) {
        Some("-p") => (true, &args[2..]),
        _ => (false, &args[1..]),
    };
    if rest.is_empty() {
        return Ok(BuiltinStatus::UsageError);
    }

    let code = if safe_path {
        let saved = sh.env.get_var("PATH");
        sh.env.set_var("PATH", SAFE_PATH);
        let code = external::run(rest, &sh.env);
        match saved {
            Some(prev) => sh.env.set_var("PATH", prev),
            None => sh.env.remove_var("PATH"),
        }
        code
    } else {
        external::run(rest, &sh.env)
    };

    Ok(if code == 0 {
        BuiltinStatus::Success
    } else {
        BuiltinStatus::Failure(code)
    })
}

/// `echo [-e] args...`: joins the arguments with single spaces. `-e` (first
/// argument only) suppresses the trailing newline; there is no escape
/// sequence interpretation.
fn echo(args: &[String], out: &mut dyn Write) -> Result<BuiltinStatus> {
    let (newline, rest) = match args.get(1).map(String::as_str) {
        Some("-e") => (false, &args[2..]),
        _ => (true, &args[1..]),
    };
    let joined = rest.join(" ");
    if newline {
        writeln!(out, "{joined}")?;
    } else {
        write!(out, "{joined}")?;
        out.flush()?;
    }
    Ok(BuiltinStatus::Success)
}

fn alias_cmd(args: &[String], sh: &mut Interpreter, out: &mut dyn Write) -> Result<BuiltinStatus> {
    if args.len() == 1 {
        for entry in sh.aliases.iter() {
            writeln!(out, "alias {}='{}'", entry.name, entry.expansion)?;
        }
        return Ok(BuiltinStatus::Success);
    }

    let mut pairs = Vec::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        match arg.split_once('=') {
            Some((name, expansion)) if !name.is_empty() => {
                pairs.push((name.to_string(), expansion.to_string()));
            }
            _ => return Ok(BuiltinStatus::UsageError),
        }
    }
    for (name, expansion) in pairs {
        sh.register_command(&name);
        sh.aliases.define(name, expansion);
    }
    Ok(BuiltinStatus::Success)
}
