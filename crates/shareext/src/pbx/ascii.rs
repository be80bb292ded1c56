//! Reader and writer for the NeXTSTEP text property list used by `project.pbxproj`
//!
//! The format has four value types:
//!
//! | Type | Syntax |
//! |------|--------|
//! | String | `word` or `"quoted \"text\""` |
//! | Array | `( value, value, )` |
//! | Dictionary | `{ key = value; }` |
//! | Data | `<0fbd 7777>` |
//!
//! `/* ... */` and `// ...` comments may appear anywhere between tokens.
//! Values map onto [`plist::Value`] so the rest of the crate works with the
//! same tree type as XML property lists. Numbers are kept as strings, which
//! is how Xcode treats them too.
//!
//! The writer reproduces Xcode's layout: objects grouped into
//! `/* Begin <isa> section */` blocks, build files and file references on a
//! single line, and `/* name */` annotations after object identifiers.

use crate::{Error, Result};
use plist::{Dictionary, Value};
use std::collections::{BTreeMap, HashMap};

/// Header line Xcode writes and expects.
pub const HEADER: &str = "// !$*UTF8*$!";

/// Object types written on a single line.
const INLINE_ISAS: &[&str] = &["PBXBuildFile", "PBXFileReference"];

/// Parse a complete document into its root value.
///
/// # Errors
///
/// Returns [`Error::ProjectParse`] with the 1-based line of the first bad token.
pub fn parse(text: &str) -> Result<Value> {
    let mut parser = Parser::new(text);
    let value = parser.parse_value()?;
    parser.skip_trivia()?;
    if parser.peek().is_some() {
        return Err(parser.error("trailing content after root object"));
    }
    Ok(value)
}

fn is_unquoted_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '+' | '/' | ':' | '.' | '-')
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::ProjectParse {
            line: self.line,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_trivia()?;
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if rest.starts_with("/*") {
                let start_line = self.line;
                self.bump();
                self.bump();
                loop {
                    if self.rest().starts_with("*/") {
                        self.bump();
                        self.bump();
                        break;
                    }
                    if self.bump().is_none() {
                        return Err(Error::ProjectParse {
                            line: start_line,
                            message: "unterminated comment".into(),
                        });
                    }
                }
            } else if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            } else {
                return Ok(());
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.parse_dictionary().map(Value::Dictionary),
            Some('(') => self.parse_array().map(Value::Array),
            Some('<') => self.parse_data().map(Value::Data),
            Some(_) => self.parse_string().map(Value::String),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_dictionary(&mut self) -> Result<Dictionary> {
        self.bump();
        let mut dict = Dictionary::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.bump();
                return Ok(dict);
            }
            let key = self.parse_string()?;
            self.expect('=')?;
            let value = self.parse_value()?;
            self.expect(';')?;
            dict.insert(key, value);
        }
    }

    fn parse_array(&mut self) -> Result<Vec<Value>> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(')') {
                self.bump();
                return Ok(items);
            }
            items.push(self.parse_value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {}
                Some(c) => return Err(self.error(format!("expected ',' or ')', found '{c}'"))),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn parse_data(&mut self) -> Result<Vec<u8>> {
        self.bump();
        let mut digits = Vec::new();
        loop {
            match self.bump() {
                Some('>') => break,
                Some(c) if c.is_whitespace() => {}
                Some(c) => match c.to_digit(16) {
                    Some(d) => digits.push(d as u8),
                    None => return Err(self.error(format!("invalid hex digit '{c}' in data"))),
                },
                None => return Err(self.error("unterminated data")),
            }
        }
        if digits.len() % 2 != 0 {
            return Err(self.error("odd number of hex digits in data"));
        }
        Ok(digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
    }

    fn parse_string(&mut self) -> Result<String> {
        self.skip_trivia()?;
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                self.parse_quoted(q)
            }
            Some(c) if is_unquoted_char(c) => {
                let start = self.pos;
                while self.peek().is_some_and(is_unquoted_char) {
                    self.bump();
                }
                Ok(self.src[start..self.pos].to_string())
            }
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String> {
        let start_line = self.line;
        let mut out = String::new();
        loop {
            let c = self.bump().ok_or_else(|| Error::ProjectParse {
                line: start_line,
                message: "unterminated string".into(),
            })?;
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let escaped = self
                .bump()
                .ok_or_else(|| self.error("unterminated escape sequence"))?;
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'a' => out.push('\u{07}'),
                'b' => out.push('\u{08}'),
                'f' => out.push('\u{0c}'),
                'v' => out.push('\u{0b}'),
                'U' | 'u' => {
                    let mut code = 0u32;
                    for _ in 0..4 {
                        let digit = self
                            .bump()
                            .and_then(|h| h.to_digit(16))
                            .ok_or_else(|| self.error("invalid unicode escape"))?;
                        code = code * 16 + digit;
                    }
                    out.push(char::from_u32(code).ok_or_else(|| self.error("invalid code point"))?);
                }
                '0'..='7' => {
                    let mut code = escaped.to_digit(8).unwrap_or(0);
                    for _ in 0..2 {
                        match self.peek().and_then(|o| o.to_digit(8)) {
                            Some(d) => {
                                code = code * 8 + d;
                                self.bump();
                            }
                            None => break,
                        }
                    }
                    out.push(char::from_u32(code).ok_or_else(|| self.error("invalid code point"))?);
                }
                other => out.push(other),
            }
        }
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Quote a string when it cannot be written bare.
pub fn quote(s: &str) -> String {
    let bare = !s.is_empty()
        && s.chars().all(|c| is_unquoted_char(c) && c != '-')
        && !s.contains("//")
        && !s.contains("___");
    if bare {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Serializes a project document.
///
/// `comments` maps object identifiers to the annotation written after them.
pub struct Writer<'c> {
    comments: &'c HashMap<String, String>,
    out: String,
}

impl<'c> Writer<'c> {
    pub fn new(comments: &'c HashMap<String, String>) -> Self {
        Self {
            comments,
            out: String::new(),
        }
    }

    /// Write the root dictionary. Its `objects` entry is laid out in sections.
    pub fn write_document(mut self, root: &Dictionary) -> String {
        self.out.push_str(HEADER);
        self.out.push_str("\n{\n");
        for (key, value) in root {
            self.indent(1);
            self.out.push_str(&quote(key));
            self.out.push_str(" = ");
            match (key.as_str(), value) {
                ("objects", Value::Dictionary(objects)) => self.write_objects(objects),
                _ => self.write_value(value, 1, false),
            }
            self.out.push_str(";\n");
        }
        self.out.push_str("}\n");
        self.out
    }

    fn write_objects(&mut self, objects: &Dictionary) {
        let mut sections: BTreeMap<&str, Vec<(&String, &Value)>> = BTreeMap::new();
        for (id, object) in objects {
            let isa = object
                .as_dictionary()
                .and_then(|d| d.get("isa"))
                .and_then(Value::as_string)
                .unwrap_or("");
            sections.entry(isa).or_default().push((id, object));
        }

        self.out.push_str("{\n");
        for (isa, entries) in sections {
            self.out.push_str(&format!("\n/* Begin {isa} section */\n"));
            let inline = INLINE_ISAS.contains(&isa);
            for (id, object) in entries {
                self.indent(2);
                self.write_string(id);
                self.out.push_str(" = ");
                self.write_value(object, 2, inline);
                self.out.push_str(";\n");
            }
            self.out.push_str(&format!("/* End {isa} section */\n"));
        }
        self.indent(1);
        self.out.push('}');
    }

    fn write_string(&mut self, s: &str) {
        self.out.push_str(&quote(s));
        if let Some(comment) = self.comments.get(s) {
            self.out.push_str(" /* ");
            // a literal "*/" would end the comment early
            self.out.push_str(&comment.replace("*/", "* /"));
            self.out.push_str(" */");
        }
    }

    fn write_value(&mut self, value: &Value, depth: usize, inline: bool) {
        match value {
            Value::Dictionary(dict) => {
                self.out.push('{');
                if !inline {
                    self.out.push('\n');
                }
                for (key, v) in dict {
                    if !inline {
                        self.indent(depth + 1);
                    }
                    self.out.push_str(&quote(key));
                    self.out.push_str(" = ");
                    self.write_value(v, depth + 1, inline);
                    self.out.push(';');
                    self.out.push(if inline { ' ' } else { '\n' });
                }
                if !inline {
                    self.indent(depth);
                }
                self.out.push('}');
            }
            Value::Array(items) => {
                self.out.push('(');
                if !inline {
                    self.out.push('\n');
                }
                for item in items {
                    if !inline {
                        self.indent(depth + 1);
                    }
                    self.write_value(item, depth + 1, inline);
                    self.out.push(',');
                    self.out.push(if inline { ' ' } else { '\n' });
                }
                if !inline {
                    self.indent(depth);
                }
                self.out.push(')');
            }
            Value::String(s) => self.write_string(s),
            Value::Data(bytes) => {
                self.out.push('<');
                for b in bytes {
                    self.out.push_str(&format!("{b:02x}"));
                }
                self.out.push('>');
            }
            Value::Boolean(b) => self.out.push_str(if *b { "YES" } else { "NO" }),
            Value::Integer(i) => self.out.push_str(&i.to_string()),
            Value::Real(r) => self.out.push_str(&r.to_string()),
            other => self.out.push_str(&quote(&format!("{other:?}"))),
        }
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push('\t');
        }
    }
}
