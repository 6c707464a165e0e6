//! Recursive-descent parser for LuaLS type expressions.
//!
//! ```text
//! union    := postfix ( '|' postfix )*
//! postfix  := primary ( '[]' | '?' )*
//! primary  := '(' union ')' | literal | 'fun' '(' params ')' [ ':' union ]
//!           | '{' fields '}' | name [ '<' union (',' union)* '>' ]
//! ```
//!
//! Parsing never fails: when the grammar does not match, the first
//! whitespace-delimited token is kept as an opaque name.

use crate::model::{Primitive, TypeRef};

/// Parse a complete type expression. Trailing text that is not part of the
/// type makes the whole input opaque.
pub fn parse_type(src: &str) -> TypeRef {
    let src = src.trim();
    let (ty, rest) = parse_type_prefix(src);
    match ty {
        Some(ty) if rest.trim().is_empty() => ty,
        _ => TypeRef::Named(src.to_string()),
    }
}

/// Parse a type expression at the start of `src` and return it with the
/// unconsumed remainder. `None` only when `src` is blank.
pub fn parse_type_prefix(src: &str) -> (Option<TypeRef>, &str) {
    let src = src.trim_start();
    if src.is_empty() {
        return (None, src);
    }

    let mut parser = TypeParser { src, pos: 0 };
    if let Some(ty) = parser.union() {
        return (Some(ty), &src[parser.pos..]);
    }

    // Opaque fallback: keep the first token verbatim.
    let end = src.find(char::is_whitespace).unwrap_or(src.len());
    (Some(TypeRef::Named(src[..end].to_string())), &src[end..])
}

struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    /// Like `eat`, but allows whitespace before `c`; rewinds on failure.
    fn eat_spaced(&mut self, c: char) -> bool {
        let save = self.pos;
        self.skip_ws();
        if self.eat(c) {
            self.skip_ws();
            true
        } else {
            self.pos = save;
            false
        }
    }

    fn union(&mut self) -> Option<TypeRef> {
        let mut alts = vec![self.postfix()?];
        loop {
            let save = self.pos;
            if !self.eat_spaced('|') {
                break;
            }
            match self.postfix() {
                Some(alt) => alts.push(alt),
                None => {
                    self.pos = save;
                    break;
                }
            }
        }
        Some(if alts.len() == 1 {
            alts.remove(0)
        } else {
            TypeRef::Union(alts)
        })
    }

    fn postfix(&mut self) -> Option<TypeRef> {
        let mut ty = self.primary()?;
        loop {
            if self.eat_str("[]") {
                ty = TypeRef::Array(Box::new(ty));
            } else if self.eat('?') {
                ty = TypeRef::Optional(Box::new(ty));
            } else {
                return Some(ty);
            }
        }
    }

    fn primary(&mut self) -> Option<TypeRef> {
        let save = self.pos;
        let parsed = match self.peek()? {
            '(' => self.group(),
            '"' | '\'' | '`' => self.string_literal(),
            '{' => self.table(),
            c if c.is_ascii_digit() || c == '-' => self.number_literal(),
            c if is_name_start(c) => self.named(),
            _ => None,
        };
        if parsed.is_none() {
            self.pos = save;
        }
        parsed
    }

    fn group(&mut self) -> Option<TypeRef> {
        self.eat('(');
        self.skip_ws();
        let inner = self.union()?;
        self.skip_ws();
        self.eat(')').then_some(inner)
    }

    fn string_literal(&mut self) -> Option<TypeRef> {
        let start = self.pos;
        let quote = self.peek()?;
        self.eat(quote);
        let close = self.rest().find(quote)?;
        self.pos += close + quote.len_utf8();
        Some(TypeRef::Literal(self.src[start..self.pos].to_string()))
    }

    fn number_literal(&mut self) -> Option<TypeRef> {
        let start = self.pos;
        self.eat('-');
        let digits = self
            .rest()
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(self.rest().len());
        if digits == 0 {
            return None;
        }
        self.pos += digits;
        Some(TypeRef::Literal(self.src[start..self.pos].to_string()))
    }

    fn ident(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        if !rest.chars().next().is_some_and(is_name_start) {
            return None;
        }
        let len = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
        // Never swallow a trailing dot (end of sentence in descriptions).
        let name = rest[..len].trim_end_matches('.');
        self.pos += name.len();
        Some(name)
    }

    fn named(&mut self) -> Option<TypeRef> {
        let name = self.ident()?;

        if name == "fun" && self.peek() == Some('(') {
            return self.function();
        }

        if self.eat('<') {
            let mut args = Vec::new();
            loop {
                self.skip_ws();
                args.push(self.union()?);
                if self.eat_spaced(',') {
                    continue;
                }
                self.skip_ws();
                if self.eat('>') {
                    break;
                }
                return None;
            }
            return Some(TypeRef::Container {
                name: name.to_string(),
                args,
            });
        }

        Some(match name {
            "true" | "false" => TypeRef::Literal(name.to_string()),
            _ => match Primitive::from_name(name) {
                Some(prim) => TypeRef::Primitive(prim),
                None => TypeRef::Named(name.to_string()),
            },
        })
    }

    fn function(&mut self) -> Option<TypeRef> {
        self.eat('(');
        let mut params = Vec::new();
        self.skip_ws();
        if !self.eat(')') {
            loop {
                self.skip_ws();
                let name = if self.eat_str("...") {
                    "...".to_string()
                } else {
                    let mut name = self.ident()?.to_string();
                    if self.eat('?') {
                        name.push('?');
                    }
                    name
                };
                let ty = if self.eat_spaced(':') {
                    self.union()?
                } else {
                    TypeRef::any()
                };
                params.push((name, ty));
                if self.eat_spaced(',') {
                    continue;
                }
                self.skip_ws();
                if self.eat(')') {
                    break;
                }
                return None;
            }
        }

        let mut returns = Vec::new();
        let save = self.pos;
        if self.eat_spaced(':') {
            match self.union() {
                Some(ret) => returns.push(ret),
                None => self.pos = save,
            }
        }
        Some(TypeRef::Function { params, returns })
    }

    fn table(&mut self) -> Option<TypeRef> {
        self.eat('{');
        let mut fields = Vec::new();
        self.skip_ws();
        if self.eat('}') {
            return Some(TypeRef::Table(fields));
        }
        loop {
            self.skip_ws();
            let key = if self.eat('[') {
                let key = self.union()?;
                if !self.eat(']') {
                    return None;
                }
                format!("[{}]", key)
            } else {
                self.ident()?.to_string()
            };
            if !self.eat_spaced(':') {
                return None;
            }
            fields.push((key, self.union()?));
            if self.eat_spaced(',') {
                continue;
            }
            self.skip_ws();
            if self.eat('}') {
                return Some(TypeRef::Table(fields));
            }
            return None;
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}
