//! Shell-word expansion for COPY/ADD sources.
//!
//! Follows the container builder's word lexer with `\` as the escape
//! character: quotes are removed, escapes resolved, and `$VAR`-style
//! references expanded from the `ENV` values seen so far. Unknown
//! variables expand to nothing.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

/// Expand a single word against `env`.
pub fn process_word(word: &str, env: &HashMap<String, String>) -> Result<String, ShellError> {
    Lexer {
        chars: word.chars().peekable(),
        env,
        word,
    }
    .process()
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    env: &'a HashMap<String, String>,
    word: &'a str,
}

impl Lexer<'_> {
    fn process(mut self) -> Result<String, ShellError> {
        let mut out = String::new();
        while let Some(ch) = self.chars.next() {
            match ch {
                '\'' => out.push_str(&self.single_quoted()?),
                '"' => out.push_str(&self.double_quoted()?),
                '$' => out.push_str(&self.dollar()?),
                '\\' => {
                    if let Some(next) = self.chars.next() {
                        out.push(next);
                    }
                }
                c => out.push(c),
            }
        }
        Ok(out)
    }

    fn single_quoted(&mut self) -> Result<String, ShellError> {
        let mut out = String::new();
        for ch in self.chars.by_ref() {
            if ch == '\'' {
                return Ok(out);
            }
            out.push(ch);
        }
        Err(self.error("unterminated single quote"))
    }

    fn double_quoted(&mut self) -> Result<String, ShellError> {
        let mut out = String::new();
        while let Some(ch) = self.chars.next() {
            match ch {
                '"' => return Ok(out),
                '$' => out.push_str(&self.dollar()?),
                '\\' => match self.chars.peek() {
                    Some(&(next @ ('"' | '$' | '\\'))) => {
                        out.push(next);
                        self.chars.next();
                    }
                    _ => out.push('\\'),
                },
                c => out.push(c),
            }
        }
        Err(self.error("unterminated double quote"))
    }

    /// Called just after a `$`.
    fn dollar(&mut self) -> Result<String, ShellError> {
        match self.chars.peek() {
            Some('{') => {
                self.chars.next();
                self.braced()
            }
            Some(&c) if is_name_start(c) => {
                let name = self.name();
                Ok(self.lookup(&name).unwrap_or_default())
            }
            _ => Ok("$".to_owned()),
        }
    }

    /// Called just after `${`.
    fn braced(&mut self) -> Result<String, ShellError> {
        let name = self.name();
        if name.is_empty() {
            return Err(self.error("bad substitution"));
        }

        let colon = self.chars.next_if_eq(&':').is_some();
        let Some(op) = self.chars.next() else {
            return Err(self.error("missing '}'"));
        };
        if op == '}' && !colon {
            return Ok(self.lookup(&name).unwrap_or_default());
        }

        let word = self.until_close_brace()?;
        let value = self.lookup(&name);
        // With `:`, an empty value is treated the same as unset.
        let set = match &value {
            Some(v) => !(colon && v.is_empty()),
            None => false,
        };

        match op {
            '-' => Ok(if set { value.unwrap_or_default() } else { word }),
            '+' => Ok(if set { word } else { String::new() }),
            '?' if set => Ok(value.unwrap_or_default()),
            '?' => Err(ShellError::Unset {
                name,
                message: if word.is_empty() {
                    "parameter not set".to_owned()
                } else {
                    word
                },
            }),
            _ => Err(self.error("unsupported modifier")),
        }
    }

    /// The modifier word of `${name:-word}`, itself expanded.
    fn until_close_brace(&mut self) -> Result<String, ShellError> {
        let mut out = String::new();
        while let Some(ch) = self.chars.next() {
            match ch {
                '}' => return Ok(out),
                '$' => out.push_str(&self.dollar()?),
                '\'' => out.push_str(&self.single_quoted()?),
                '"' => out.push_str(&self.double_quoted()?),
                '\\' => {
                    if let Some(next) = self.chars.next() {
                        out.push(next);
                    }
                }
                c => out.push(c),
            }
        }
        Err(self.error("missing '}'"))
    }

    fn name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.chars.next_if(|&c| is_name_char(c)) {
            name.push(c);
        }
        name
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn error(&self, reason: &'static str) -> ShellError {
        ShellError::Syntax {
            word: self.word.to_owned(),
            reason,
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("{reason} in {word:?}")]
    Syntax { word: String, reason: &'static str },
    #[error("{name}: {message}")]
    Unset { name: String, message: String },
}
