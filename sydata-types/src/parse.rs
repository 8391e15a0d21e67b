//! Recursive-descent parser for the text form of [`TypeTag`].

use rustc_hash::FxHashMap;
use sydata_result::{Error, Result};

use crate::TypeTag;

/// Alias name to target, consulted for bare identifiers.
pub type AliasMap = FxHashMap<String, TypeTag>;

pub(crate) struct Parser<'a> {
    src: &'a str,
    pos: usize,
    aliases: Option<&'a AliasMap>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str, aliases: Option<&'a AliasMap>) -> Self {
        Self {
            src,
            pos: 0,
            aliases,
        }
    }

    pub(crate) fn parse_all(mut self) -> Result<TypeTag> {
        let tag = self.parse_type()?;
        self.skip_ws();
        if self.pos != self.src.len() {
            return Err(self.error("trailing input"));
        }
        Ok(tag)
    }

    fn parse_type(&mut self) -> Result<TypeTag> {
        let lhs = self.parse_atom()?;
        self.skip_ws();
        if self.eat_str("->") {
            let rhs = self.parse_type()?;
            return Ok(TypeTag::function(lhs, rhs));
        }
        Ok(lhs)
    }

    fn parse_atom(&mut self) -> Result<TypeTag> {
        self.skip_ws();
        match self.peek() {
            Some('[') => {
                self.bump();
                let inner = self.parse_type()?;
                self.expect(']')?;
                Ok(TypeTag::list(inner))
            }
            Some('{') => {
                self.bump();
                let first = self.parse_type()?;
                self.skip_ws();
                let tag = if self.eat(':') {
                    let value = self.parse_type()?;
                    TypeTag::Dict {
                        key: Box::new(first),
                        value: Box::new(value),
                    }
                } else {
                    TypeTag::dict(first)
                };
                self.expect('}')?;
                Ok(tag)
            }
            Some('(') => {
                self.bump();
                self.parse_parenthesized()
            }
            Some('<') => {
                self.bump();
                self.skip_ws();
                let name = self.ident()?;
                self.expect('>')?;
                Ok(TypeTag::Generic(name.to_string()))
            }
            Some(c) if is_ident_start(c) => {
                let name = self.ident()?;
                self.named(name)
            }
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// Body of `( ... )`: empty tuple, record, grouping or tuple.
    fn parse_parenthesized(&mut self) -> Result<TypeTag> {
        self.skip_ws();
        if self.eat(')') {
            return Ok(TypeTag::Tuple(Vec::new()));
        }
        if self.at_field_label() {
            let mut fields = Vec::new();
            loop {
                self.skip_ws();
                if self.eat(')') {
                    break;
                }
                let name = self.ident()?.to_string();
                self.expect(':')?;
                let ty = self.parse_type()?;
                fields.push((name, ty));
                self.skip_ws();
                if !self.eat(',') {
                    self.expect(')')?;
                    break;
                }
            }
            return Ok(TypeTag::Record(fields));
        }

        let first = self.parse_type()?;
        self.skip_ws();
        if self.eat(')') {
            return Ok(first);
        }
        self.expect(',')?;
        let mut items = vec![first];
        loop {
            self.skip_ws();
            if self.eat(')') {
                break;
            }
            items.push(self.parse_type()?);
            self.skip_ws();
            if !self.eat(',') {
                self.expect(')')?;
                break;
            }
        }
        Ok(TypeTag::Tuple(items))
    }

    fn named(&self, name: &str) -> Result<TypeTag> {
        match name {
            "table" => Ok(TypeTag::Table),
            "text" => Ok(TypeTag::Text),
            _ => self
                .aliases
                .and_then(|m| m.get(name))
                .map(|target| TypeTag::alias(name, target.clone()))
                .ok_or_else(|| {
                    Error::InvalidArgumentError(format!("unknown type name '{name}'"))
                }),
        }
    }

    /// Lookahead for `ident :` without consuming input.
    fn at_field_label(&self) -> bool {
        let rest = &self.src[self.pos..];
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if is_ident_start(c) => {}
            _ => return false,
        }
        let end = chars
            .find(|(_, c)| !is_ident_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        rest[end..].trim_start().starts_with(':')
    }

    fn ident(&mut self) -> Result<&'a str> {
        let rest = &self.src[self.pos..];
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if is_ident_start(c) => {}
            _ => return Err(self.error("expected identifier")),
        }
        let end = chars
            .find(|(_, c)| !is_ident_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        Ok(&rest[..end])
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.src[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        self.skip_ws();
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, what: &str) -> Error {
        Error::InvalidArgumentError(format!(
            "invalid type '{}': {what} at offset {}",
            self.src, self.pos
        ))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
