//! Splitter for the one-dimensional textual array literal `{e1,e2,...}`.
//!
//! Only the top-level comma list is split. A nested `{...}` element is handed
//! back verbatim, braces included. Every element string lives in the arena.

use std::iter::Peekable;
use std::str::CharIndices;

use pgtree_api::arena::{Arena, ArenaString};
use pgtree_api::error::DecodeError;

/// One decoded element of an array literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayElement<'a> {
    pub text: &'a str,
    /// Whether the element was written in double quotes.
    pub quoted: bool,
}

impl ArrayElement<'_> {
    /// A bare `NULL` marks a missing element; a quoted `"NULL"` is the text.
    pub fn is_null(&self) -> bool {
        !self.quoted && self.text.eq_ignore_ascii_case("NULL")
    }
}

pub struct ArrayTextParser;

impl ArrayTextParser {
    /// Element strings in source order; `{}` yields an empty slice.
    pub fn parse<'a>(arena: &'a Arena, input: &str) -> Result<&'a [&'a str], DecodeError> {
        let elements = Self::parse_elements(arena, input)?;
        Ok(arena.alloc_slice_fill_iter(elements.iter().map(|e| e.text)))
    }

    pub fn parse_elements<'a>(
        arena: &'a Arena,
        input: &str,
    ) -> Result<&'a [ArrayElement<'a>], DecodeError> {
        Cursor::new(arena, input).literal()
    }
}

struct Cursor<'a, 'i> {
    arena: &'a Arena,
    input: &'i str,
    chars: Peekable<CharIndices<'i>>,
}

impl<'a, 'i> Cursor<'a, 'i> {
    fn new(arena: &'a Arena, input: &'i str) -> Self {
        Self {
            arena,
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn literal(mut self) -> Result<&'a [ArrayElement<'a>], DecodeError> {
        self.skip_whitespace();
        self.skip_dimensions()?;
        match self.chars.next() {
            Some((_, '{')) => {}
            _ => return Err(self.error("array literal must start with '{'")),
        }

        let mut elements = self.arena.vec();
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.chars.next();
        } else {
            loop {
                self.skip_whitespace();
                let element = match self.peek() {
                    None => return Err(self.error("unterminated array literal")),
                    Some('"') => self.quoted()?,
                    Some('{') => self.nested()?,
                    Some(',') | Some('}') => return Err(self.error("empty array element")),
                    Some(_) => self.bare()?,
                };
                elements.push(element);

                self.skip_whitespace();
                match self.chars.next() {
                    Some((_, ',')) => continue,
                    Some((_, '}')) => break,
                    Some((offset, c)) => {
                        return Err(DecodeError::parse(format!(
                            "unexpected '{c}' at offset {offset} in array literal"
                        )));
                    }
                    None => return Err(self.error("unterminated array literal")),
                }
            }
        }

        self.skip_whitespace();
        if let Some((offset, _)) = self.chars.peek() {
            return Err(DecodeError::parse(format!(
                "trailing input after array literal at offset {offset}"
            )));
        }
        Ok(elements.into_bump_slice())
    }

    /// `[lo:hi]` decorations followed by `=`, as printed for non-default bounds.
    fn skip_dimensions(&mut self) -> Result<(), DecodeError> {
        if self.peek() != Some('[') {
            return Ok(());
        }
        while let Some((_, c)) = self.chars.next() {
            if c == '=' {
                self.skip_whitespace();
                return Ok(());
            }
        }
        Err(self.error("unterminated dimension decoration"))
    }

    fn quoted(&mut self) -> Result<ArrayElement<'a>, DecodeError> {
        self.chars.next();
        let mut text = self.arena.string();
        loop {
            match self.chars.next() {
                Some((_, '"')) => break,
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, c)) => text.push(c),
                    None => return Err(self.error("unterminated quoted element")),
                },
                Some((_, c)) => text.push(c),
                None => return Err(self.error("unterminated quoted element")),
            }
        }
        Ok(ArrayElement {
            text: text.into_bump_str(),
            quoted: true,
        })
    }

    fn bare(&mut self) -> Result<ArrayElement<'a>, DecodeError> {
        let mut text: ArenaString<'a> = self.arena.string();
        // Length up to the last character that is not unescaped whitespace.
        let mut keep = 0;
        while let Some(c) = self.peek() {
            match c {
                ',' | '}' => break,
                '\\' => {
                    self.chars.next();
                    match self.chars.next() {
                        Some((_, escaped)) => text.push(escaped),
                        None => return Err(self.error("unterminated array literal")),
                    }
                    keep = text.len();
                }
                _ => {
                    self.chars.next();
                    text.push(c);
                    if !c.is_ascii_whitespace() {
                        keep = text.len();
                    }
                }
            }
        }
        text.truncate(keep);
        Ok(ArrayElement {
            text: text.into_bump_str(),
            quoted: false,
        })
    }

    fn nested(&mut self) -> Result<ArrayElement<'a>, DecodeError> {
        let Some((start, _)) = self.chars.next() else {
            return Err(self.error("unterminated array literal"));
        };
        let mut depth = 1usize;
        let mut in_quotes = false;
        while let Some((offset, c)) = self.chars.next() {
            match c {
                '\\' => {
                    self.chars.next();
                }
                '"' => in_quotes = !in_quotes,
                '{' if !in_quotes => depth += 1,
                '}' if !in_quotes => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(ArrayElement {
                            text: self.arena.alloc_str(&self.input[start..=offset]),
                            quoted: false,
                        });
                    }
                }
                _ => {}
            }
        }
        Err(self.error("unterminated nested array element"))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.chars.next();
        }
    }

    fn error(&self, what: &str) -> DecodeError {
        DecodeError::parse(format!("{what}: {:?}", self.input))
    }
}
