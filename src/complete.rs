//! rustyline integration: tab completion and inline hints.
//!
//! The first word of a line completes against the cached command names
//! (builtins, aliases, PATH entries), every later word against the current
//! directory listing. Hints show the rest of the first candidate in color,
//! green for commands and magenta for files.

use rustyline::Helper;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hint, Hinter};
use rustyline::validate::Validator;

const COMMAND_COLOR: &str = "\x1b[32m";
const FILE_COLOR: &str = "\x1b[35m";
const RESET_COLOR: &str = "\x1b[0m";

/// Candidate sets snapshotted from the session; refreshed by the driver
/// after every evaluated line.
pub(crate) struct ShellHelper {
    commands: Vec<String>,
    files: Vec<String>,
}

impl ShellHelper {
    pub(crate) fn new(commands: Vec<String>, files: Vec<String>) -> Self {
        Self { commands, files }
    }

    pub(crate) fn update(&mut self, commands: &[String], files: &[String]) {
        self.commands = commands.to_vec();
        self.files = files.to_vec();
    }

    /// Candidates for the token at word index `word`: commands first for the
    /// leading word, files for every other position.
    fn collect(&self, word: usize, token: &str) -> Vec<Pair> {
        let mut out = Vec::new();
        if word == 0 {
            push_matches(&mut out, &self.commands, token);
        }
        push_matches(&mut out, &self.files, token);
        out
    }

    /// The colored hint for `token` at word index `word`, or `None` when no
    /// candidate strictly extends the token.
    fn hint_for(&self, word: usize, token: &str) -> Option<ShellHint> {
        if token.is_empty() {
            return None;
        }
        if word == 0 {
            if let Some(name) = self.commands.iter().find(|c| c.starts_with(token)) {
                if let Some(hint) = make_hint(name, token, COMMAND_COLOR) {
                    return Some(hint);
                }
            }
        }
        self.files
            .iter()
            .find(|f| f.starts_with(token))
            .and_then(|name| make_hint(name, token, FILE_COLOR))
    }
}

fn push_matches(out: &mut Vec<Pair>, candidates: &[String], token: &str) {
    for name in candidates {
        if name.starts_with(token) {
            out.push(Pair {
                display: name.clone(),
                replacement: escape_spaces(name),
            });
        }
    }
}

fn make_hint(candidate: &str, token: &str, color: &str) -> Option<ShellHint> {
    let suffix = escape_spaces(candidate);
    let suffix = suffix.strip_prefix(token)?;
    if suffix.is_empty() {
        return None;
    }
    Some(ShellHint {
        display: format!("{color}{suffix}{RESET_COLOR}"),
        text: suffix.to_string(),
    })
}

/// Names with spaces are inserted backslash-escaped so the tokenizer reads
/// them back as one argument.
fn escape_spaces(name: &str) -> String {
    name.replace(' ', "\\ ")
}

/// Byte offset, word index and text of the token the cursor sits in. A
/// backslash keeps the following character inside the current token.
fn last_token(line: &str) -> (usize, usize, &str) {
    let bytes = line.as_bytes();
    let mut start = 0;
    let mut word = 0;
    let mut in_word = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                if !in_word {
                    start = i;
                    in_word = true;
                }
                i += 2;
            }
            b' ' | b'\t' => {
                if in_word {
                    word += 1;
                    in_word = false;
                }
                i += 1;
            }
            _ => {
                if !in_word {
                    start = i;
                    in_word = true;
                }
                i += 1;
            }
        }
    }
    if !in_word {
        start = line.len();
    }
    (start, word, &line[start..])
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, word, token) = last_token(&line[..pos]);
        Ok((start, self.collect(word, token)))
    }
}

/// A hint with an ANSI-colored display form and a plain completion form.
pub(crate) struct ShellHint {
    display: String,
    text: String,
}

impl Hint for ShellHint {
    fn display(&self) -> &str {
        &self.display
    }

    fn completion(&self) -> Option<&str> {
        Some(&self.text)
    }
}

impl Hinter for ShellHelper {
    type Hint = ShellHint;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<ShellHint> {
        // hint only at the end of the line
        if pos < line.len() {
            return None;
        }
        let (_, word, token) = last_token(line);
        self.hint_for(word, token)
    }
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper() -> ShellHelper {
        ShellHelper::new(
            vec!["echo".to_string(), "exit".to_string(), "export".to_string()],
            vec!["notes.txt".to_string(), "my file".to_string()],
        )
    }

    #[test]
    fn test_last_token_positions() {
        assert_eq!(last_token("echo"), (0, 0, "echo"));
        assert_eq!(last_token("echo fi"), (5, 1, "fi"));
        assert_eq!(last_token("echo a b"), (7, 2, "b"));
        assert_eq!(last_token("echo "), (5, 1, ""));
        assert_eq!(last_token(""), (0, 0, ""));
    }

    #[test]
    fn test_last_token_honors_escaped_spaces() {
        assert_eq!(last_token("cat my\\ fi"), (4, 1, "my\\ fi"));
    }

    #[test]
    fn test_escape_spaces() {
        assert_eq!(escape_spaces("plain"), "plain");
        assert_eq!(escape_spaces("my file"), "my\\ file");
    }

    #[test]
    fn test_first_word_completes_commands_then_files() {
        let h = helper();
        let pairs = h.collect(0, "e");
        let names: Vec<&str> = pairs.iter().map(|p| p.display.as_str()).collect();
        assert_eq!(names, ["echo", "exit", "export"]);
    }

    #[test]
    fn test_later_words_complete_files_only() {
        let h = helper();
        let pairs = h.collect(1, "no");
        let names: Vec<&str> = pairs.iter().map(|p| p.display.as_str()).collect();
        assert_eq!(names, ["notes.txt"]);
    }

    #[test]
    fn test_replacement_escapes_spaces() {
        let h = helper();
        let pairs = h.collect(1, "my");
        assert_eq!(pairs[0].replacement, "my\\ file");
    }

    #[test]
    fn test_hint_is_candidate_suffix() {
        let h = helper();
        let hint = h.hint_for(0, "ec").unwrap();
        assert_eq!(hint.text, "ho");
        assert!(hint.display.contains("ho"));
        assert!(hint.display.starts_with(COMMAND_COLOR));
    }

    #[test]
    fn test_hint_falls_back_to_files_on_later_words() {
        let h = helper();
        let hint = h.hint_for(1, "not").unwrap();
        assert_eq!(hint.text, "es.txt");
        assert!(hint.display.starts_with(FILE_COLOR));
    }

    #[test]
    fn test_no_hint_for_empty_or_exact_token() {
        let h = helper();
        assert!(h.hint_for(0, "").is_none());
        assert!(h.hint_for(0, "echo").is_none());
    }
}
