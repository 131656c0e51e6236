//! Tokenization of a single command segment into an argument list.
//!
//! The scanner is a small finite state machine over the segment text. It
//! never rewrites its input; decided characters are appended to a fresh
//! buffer. Words are accumulated as parts (literal text or a variable
//! reference) and only joined against the environment at the end, which is
//! what makes `foo$BAR` concatenate in place while `foo $BAR` stays two
//! separate arguments.

use crate::env::Environment;
use std::error::Error;
use std::fmt;

/// Errors that can occur while scanning a command segment.
///
/// All of them abort the current segment only; the session continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    /// A single or double quote was opened but never closed.
    UnterminatedQuote,
    /// A `${` reference is missing its closing `}`.
    UnterminatedBrace,
    /// A `${...}` reference contains whitespace.
    BadVariableName,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnterminatedQuote => write!(f, "syntax error: unterminated quote"),
            LexError::UnterminatedBrace => {
                write!(f, "syntax error: missing `}}` in variable reference")
            }
            LexError::BadVariableName => {
                write!(f, "syntax error: whitespace in variable name")
            }
        }
    }
}

impl Error for LexError {}

/// A piece of a word: literal text, or a variable reference to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WordPart {
    Literal(String),
    Var(String),
}

/// One scanned word. `quoted` records whether any quoting was involved so
/// that `''` still yields an (empty) argument after expansion.
#[derive(Debug)]
struct Word {
    parts: Vec<WordPart>,
    quoted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Between,
    Word,
    SingleQuote,
    DoubleQuote,
}

struct Scanner {
    input: Vec<char>,
    pos: usize,
    state: State,
    parts: Vec<WordPart>,
    buffer: String,
    quoted: bool,
    started: bool,
    words: Vec<Word>,
}

impl Scanner {
    fn new(segment: &str) -> Self {
        Scanner {
            input: segment.chars().collect(),
            pos: 0,
            state: State::Between,
            parts: Vec::new(),
            buffer: String::new(),
            quoted: false,
            started: false,
            words: Vec::new(),
        }
    }

    fn scan(mut self) -> Result<Vec<Word>, LexError> {
        while let Some(ch) = self.next_char() {
            match self.state {
                State::Between => self.on_between(ch)?,
                State::Word => self.on_word(ch)?,
                State::SingleQuote => self.on_single_quote(ch),
                State::DoubleQuote => self.on_double_quote(ch)?,
            }
        }

        if matches!(self.state, State::SingleQuote | State::DoubleQuote) {
            return Err(LexError::UnterminatedQuote);
        }

        self.finish_word();
        Ok(self.words)
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn begin_word(&mut self) {
        self.started = true;
        self.state = State::Word;
    }

    fn flush_part(&mut self) {
        if !self.buffer.is_empty() {
            self.parts
                .push(WordPart::Literal(std::mem::take(&mut self.buffer)));
        }
    }

    fn finish_word(&mut self) {
        self.flush_part();
        if self.started {
            self.words.push(Word {
                parts: std::mem::take(&mut self.parts),
                quoted: self.quoted,
            });
        }
        self.started = false;
        self.quoted = false;
        self.state = State::Between;
    }

    fn on_between(&mut self, ch: char) -> Result<(), LexError> {
        match ch {
            ' ' | '\t' => {}
            '\'' => {
                self.begin_word();
                self.quoted = true;
                self.state = State::SingleQuote;
            }
            '"' => {
                self.begin_word();
                self.quoted = true;
                self.state = State::DoubleQuote;
            }
            '\\' => {
                self.begin_word();
                self.escape_next();
            }
            '$' => {
                self.begin_word();
                self.scan_var()?;
            }
            c => {
                self.begin_word();
                self.buffer.push(c);
            }
        }
        Ok(())
    }

    fn on_word(&mut self, ch: char) -> Result<(), LexError> {
        match ch {
            ' ' | '\t' => self.finish_word(),
            '\'' => {
                self.quoted = true;
                self.state = State::SingleQuote;
            }
            '"' => {
                self.quoted = true;
                self.state = State::DoubleQuote;
            }
            '\\' => self.escape_next(),
            '$' => self.scan_var()?,
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn on_single_quote(&mut self, ch: char) {
        // everything is literal here, including `$` and `\`
        if ch == '\'' {
            self.state = State::Word;
        } else {
            self.buffer.push(ch);
        }
    }

    fn on_double_quote(&mut self, ch: char) -> Result<(), LexError> {
        match ch {
            '"' => self.state = State::Word,
            '\\' => self.escape_next(),
            '$' => self.scan_var()?,
            c => self.buffer.push(c),
        }
        Ok(())
    }

    /// `\X` emits the literal `X`; a trailing backslash stays a backslash.
    fn escape_next(&mut self) {
        match self.next_char() {
            Some(c) => self.buffer.push(c),
            None => self.buffer.push('\\'),
        }
    }

    /// Called after a `$`. Reads `{NAME}` up to the matching brace, or a bare
    /// NAME as the maximal run of characters that can belong to a variable
    /// name. A lone `$` stays literal.
    fn scan_var(&mut self) -> Result<(), LexError> {
        if self.peek_char() == Some('{') {
            self.next_char();
            let mut name = String::new();
            loop {
                match self.next_char() {
                    Some('}') => break,
                    Some(' ') | Some('\t') => return Err(LexError::BadVariableName),
                    Some(c) => name.push(c),
                    None => return Err(LexError::UnterminatedBrace),
                }
            }
            self.flush_part();
            self.parts.push(WordPart::Var(name));
            return Ok(());
        }

        let mut name = String::new();
        while let Some(c) = self.peek_char() {
            if matches!(c, ' ' | '\t' | '"' | '\'' | '$' | '\\' | '=' | '}') {
                break;
            }
            name.push(c);
            self.next_char();
        }

        if name.is_empty() {
            self.buffer.push('$');
        } else {
            self.flush_part();
            self.parts.push(WordPart::Var(name));
        }
        Ok(())
    }
}

/// Split one command segment into its argument list, resolving quotes,
/// escapes and variable references against `env`.
///
/// Unset variables expand to the empty contribution. An unquoted word that
/// expands to nothing produces no argument; a quoted empty (`''` or `""`)
/// produces one empty argument.
pub fn tokenize(segment: &str, env: &Environment) -> Result<Vec<String>, LexError> {
    let words = Scanner::new(segment).scan()?;

    let mut args = Vec::with_capacity(words.len());
    for word in words {
        let mut text = String::new();
        for part in &word.parts {
            match part {
                WordPart::Literal(s) => text.push_str(s),
                WordPart::Var(name) => {
                    if let Some(value) = env.get_var(name) {
                        text.push_str(&value);
                    }
                }
            }
        }
        if !text.is_empty() || word.quoted {
            args.push(text);
        }
    }
    Ok(args)
}
