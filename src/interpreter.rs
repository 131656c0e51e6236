//! The execution driver: ties splitter, tokenizer, aliases and dispatch
//! together and runs the interactive loop.

use crate::ExitCode;
use crate::alias::AliasTable;
use crate::builtin::{self, BUILTIN_NAMES, BuiltinStatus};
use crate::complete::ShellHelper;
use crate::control::split_segments;
use crate::env::Environment;
use crate::external;
use crate::lexer::{self, LexError};
use anyhow::Result;
use regex::{Captures, Regex};
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{Config, Editor};
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

/// Colored `user@host:dir$ ` prompt used when PS1 is unset.
const DEFAULT_PROMPT: &str =
    "\x1b[0;95m%1$s\x1b[0;32m@\x1b[0;36m%2$s\x1b[0;32m:\x1b[0;91m%3$s\x1b[0;32m$\x1b[0m ";

const HISTORY_SIZE: usize = 1024;

/// Upper bound on cached PATH entries, to keep startup cheap on huge PATHs.
const MAX_CACHED_COMMANDS: usize = 32768;

/// The interactive shell session.
///
/// Owns every piece of session state: the environment store, the alias
/// table, the cached command names (builtins, aliases and PATH entries) and
/// the current-directory listing used for hints and completion. All of it is
/// mutated only between reads of a line, on the single session thread.
pub struct Interpreter {
    pub(crate) env: Environment,
    pub(crate) aliases: AliasTable,
    pub(crate) commands: Vec<String>,
    pub(crate) files: Vec<String>,
    last_status: ExitCode,
}

/// What became of one dispatched segment.
enum SegmentOutcome {
    Status(ExitCode),
    Exit(ExitCode),
}

impl Interpreter {
    /// Create a session capturing the current process environment and
    /// scanning PATH for the command-name cache.
    pub fn new() -> Self {
        let env = Environment::new();
        let commands = build_command_cache(&env);
        let files = list_dir(&env.current_dir);
        Self {
            env,
            aliases: AliasTable::new(),
            commands,
            files,
            last_status: 0,
        }
    }

    /// Add a name to the completion candidate set (used when aliases are
    /// registered).
    pub(crate) fn register_command(&mut self, name: &str) {
        if !self.commands.iter().any(|c| c == name) {
            self.commands.push(name.to_string());
        }
    }

    fn refresh_files(&mut self) {
        self.files = list_dir(&self.env.current_dir);
    }

    /// Evaluate one input line: split it into control-flow segments and run
    /// each eligible segment in order. Returns `Some(code)` when an
    /// `exit`/`logout` asked to end the session.
    pub fn eval_line(&mut self, line: &str, out: &mut dyn Write) -> Result<Option<ExitCode>> {
        for segment in split_segments(line) {
            // evaluated against the status of the last segment that actually
            // ran; a skipped segment leaves it untouched
            if !segment.relation.should_run(self.last_status) {
                continue;
            }

            let args = match lexer::tokenize(segment.text, &self.env) {
                Ok(args) => args,
                Err(e) => {
                    eprintln!("crabsh: {e}");
                    continue;
                }
            };
            if args.is_empty() {
                continue;
            }

            let args = match self.expand_aliases(args) {
                Ok(args) => args,
                Err(e) => {
                    eprintln!("crabsh: {e}");
                    continue;
                }
            };
            if args.is_empty() {
                continue;
            }

            match self.dispatch_segment(args, out)? {
                SegmentOutcome::Exit(code) => return Ok(Some(code)),
                SegmentOutcome::Status(code) => {
                    self.last_status = code;
                    self.env.set_status(code);
                }
            }

            // the command may have created or removed files
            self.refresh_files();
        }
        Ok(None)
    }

    /// Replace argv[0] by its alias expansion, repeatedly. Re-tokenizes the
    /// stored expansion text and appends the original arguments. Stops when
    /// the new argv[0] is the alias just expanded (`alias ls=ls` expands
    /// once); a visited set additionally terminates longer cycles.
    fn expand_aliases(&self, mut args: Vec<String>) -> Result<Vec<String>, LexError> {
        let mut visited: Vec<String> = Vec::new();
        loop {
            let Some(head) = args.first() else {
                return Ok(args);
            };
            if visited.iter().any(|v| v == head) {
                return Ok(args);
            }
            let Some(expansion) = self.aliases.lookup(head) else {
                return Ok(args);
            };

            let name = head.clone();
            let mut replacement = lexer::tokenize(expansion, &self.env)?;
            replacement.extend(args.into_iter().skip(1));
            args = replacement;

            if args.first().is_some_and(|head| *head == name) {
                return Ok(args);
            }
            visited.push(name);
        }
    }

    /// Run one resolved argument list, looping on `ReparseWithShift` and
    /// forwarding to external process creation when nothing internal claims
    /// it.
    fn dispatch_segment(&mut self, mut args: Vec<String>, out: &mut dyn Write) -> Result<SegmentOutcome> {
        loop {
            match builtin::dispatch(&args, self, out)? {
                BuiltinStatus::NotBuiltin => {
                    return Ok(SegmentOutcome::Status(external::run(&args, &self.env)));
                }
                BuiltinStatus::Exit(code) => return Ok(SegmentOutcome::Exit(code)),
                BuiltinStatus::Success => return Ok(SegmentOutcome::Status(0)),
                BuiltinStatus::Failure(code) => return Ok(SegmentOutcome::Status(code)),
                BuiltinStatus::UsageError => {
                    eprintln!("{}: wrong number of arguments!", args[0]);
                    return Ok(SegmentOutcome::Status(2));
                }
                BuiltinStatus::ReparseWithShift => {
                    args.remove(0);
                    if args.is_empty() {
                        return Ok(SegmentOutcome::Status(0));
                    }
                }
            }
        }
    }

    fn render_prompt(&self) -> String {
        let ps1 = self
            .env
            .get_var("PS1")
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());
        let user = self.env.get_var("USER").unwrap_or_else(|| "user".to_string());
        let host = self
            .env
            .get_var("HOSTNAME")
            .unwrap_or_else(|| "localhost".to_string());
        let dir = self.env.current_dir.to_string_lossy();
        render_slots(&ps1, [user.as_str(), host.as_str(), dir.as_ref()])
    }

    /// Run the interactive loop until `exit`/`logout` or end-of-input.
    /// Returns the code to hand back to the host.
    pub fn repl(&mut self, history: Option<&Path>) -> Result<ExitCode> {
        let config = Config::builder().max_history_size(HISTORY_SIZE)?.build();
        let mut rl: Editor<ShellHelper, FileHistory> = Editor::with_config(config)?;
        rl.set_helper(Some(ShellHelper::new(
            self.commands.clone(),
            self.files.clone(),
        )));
        if let Some(path) = history {
            let _ = rl.load_history(path);
        }

        let code = loop {
            let prompt = self.render_prompt();
            match rl.readline(&prompt) {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    if let Some(code) = self.eval_line(&line, &mut std::io::stdout())? {
                        break code;
                    }
                    if let Some(helper) = rl.helper_mut() {
                        helper.update(&self.commands, &self.files);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break 0,
                Err(e) => return Err(e.into()),
            }
        };

        if let Some(path) = history {
            let _ = rl.save_history(path);
        }
        Ok(code)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill the printf-style positional slots of a PS1 template: `%1$s` is the
/// user, `%2$s` the host, `%3$s` the current directory; a plain `%s`
/// consumes the slots in order.
fn render_slots(template: &str, slots: [&str; 3]) -> String {
    static SLOT: OnceLock<Regex> = OnceLock::new();
    let re = SLOT.get_or_init(|| Regex::new(r"%(?:([1-9])\$)?s").unwrap());

    let mut next = 0usize;
    re.replace_all(template, |caps: &Captures| {
        let idx = match caps.get(1) {
            Some(m) => m.as_str().parse::<usize>().unwrap() - 1,
            None => {
                let i = next;
                next += 1;
                i
            }
        };
        slots.get(idx).copied().unwrap_or("").to_string()
    })
    .into_owned()
}

fn build_command_cache(env: &Environment) -> Vec<String> {
    let mut commands: Vec<String> = BUILTIN_NAMES.iter().map(|s| s.to_string()).collect();
    let search_paths = env
        .get_var("PATH")
        .unwrap_or_else(|| "/usr/bin:/bin".to_string());
    for dir in std::env::split_paths(&search_paths) {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            commands.push(entry.file_name().to_string_lossy().into_owned());
            if commands.len() >= MAX_CACHED_COMMANDS {
                return commands;
            }
        }
    }
    commands
}

fn list_dir(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}
