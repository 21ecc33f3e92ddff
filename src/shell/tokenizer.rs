//! Command-line tokenizer.
//!
//! Splits a line into words (single quotes are literal, double quotes allow
//! `\"` and `\\`, a backslash outside quotes escapes the next character),
//! then sorts the words after the command name into flags and arguments.
//! `-abc` expands to `-a -b -c`, `--` ends flag parsing and quoted words
//! are always arguments.

use crate::error::ShellError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub name: String,
    pub args: Vec<String>,
    pub flags: Vec<String>,
}

#[derive(Debug)]
struct Word {
    text: String,
    quoted: bool,
}

fn split_words(line: &str) -> Result<Vec<Word>, ShellError> {
    let mut words = Vec::new();
    let mut current: Option<Word> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if let Some(word) = current.take() {
                    words.push(word);
                }
            }
            '\'' => {
                let word = current.get_or_insert_with(|| Word {
                    text: String::new(),
                    quoted: true,
                });
                word.quoted = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => word.text.push(ch),
                        None => return Err(ShellError::validation("unterminated single quote")),
                    }
                }
            }
            '"' => {
                let word = current.get_or_insert_with(|| Word {
                    text: String::new(),
                    quoted: true,
                });
                word.quoted = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\')) => word.text.push(ch),
                            Some(ch) => {
                                word.text.push('\\');
                                word.text.push(ch);
                            }
                            None => {
                                return Err(ShellError::validation("unterminated double quote"))
                            }
                        },
                        Some(ch) => word.text.push(ch),
                        None => return Err(ShellError::validation("unterminated double quote")),
                    }
                }
            }
            '\\' => {
                let word = current.get_or_insert_with(|| Word {
                    text: String::new(),
                    quoted: false,
                });
                match chars.next() {
                    Some(ch) => {
                        word.text.push(ch);
                        // An escaped leading dash is not a flag.
                        if ch == '-' && word.text.len() == 1 {
                            word.quoted = true;
                        }
                    }
                    None => return Err(ShellError::validation("trailing backslash")),
                }
            }
            c => current
                .get_or_insert_with(|| Word {
                    text: String::new(),
                    quoted: false,
                })
                .text
                .push(c),
        }
    }
    if let Some(word) = current {
        words.push(word);
    }
    Ok(words)
}

/// Parse one input line. Returns `None` for a blank line.
pub fn parse_line(line: &str) -> Result<Option<ParsedLine>, ShellError> {
    let mut words = split_words(line)?.into_iter();
    let name = match words.next() {
        Some(word) => word.text,
        None => return Ok(None),
    };

    let mut args = Vec::new();
    let mut flags = Vec::new();
    let mut flags_done = false;
    for word in words {
        let text = word.text;
        if flags_done || word.quoted || text == "-" || !text.starts_with('-') {
            args.push(text);
        } else if text == "--" {
            flags_done = true;
        } else if text.starts_with("--") {
            flags.push(text);
        } else {
            flags.extend(text.chars().skip(1).map(|c| format!("-{}", c)));
        }
    }
    Ok(Some(ParsedLine { name, args, flags }))
}
