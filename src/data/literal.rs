//! Textual list literals used for sequence columns in the flat file
//!
//! Sequence cells are stored as `[28, 12]` or `['Action', 'Adventure']`.
//! Parsing is strict: anything that is not a complete list literal yields
//! `None`, and callers fall back to an empty sequence.
//!
//! Strings understand the usual backslash escapes, including `\xNN`,
//! `\uNNNN`, `\UNNNNNNNN` and octal. Named escapes (`\N{...}`) are kept as
//! raw text. Integers may use `_` separators and `0x`/`0o`/`0b` prefixes.

use std::iter::Peekable;
use std::str::Chars;

use super::Value;

/// Deepest list nesting accepted before a literal is rejected
const MAX_DEPTH: usize = 200;

/// Parses a list literal such as `[28, 12]` or `["Sci-Fi", 'Drama']`
///
/// Items may be integers, floats, quoted strings, `True`/`False`/`None` or
/// nested lists. Returns `None` for malformed text and for well-formed
/// literals that are not lists.
pub fn parse_list(text: &str) -> Option<Vec<Value>> {
    let mut parser = Parser {
        chars: text.chars().peekable(),
        depth: 0,
    };
    let value = parser.value()?;
    parser.skip_whitespace();
    if parser.chars.peek().is_some() {
        return None;
    }
    match value {
        Value::List(items) => Some(items),
        _ => None,
    }
}

/// Normalizes a cell into a sequence, falling back to an empty one
///
/// Lists pass through unchanged, text is parsed with [`parse_list`], and
/// nulls, empty text, scalars and malformed literals all become `[]`.
pub fn parse_sequence(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.clone(),
        Value::Text(text) if text.is_empty() => Vec::new(),
        Value::Text(text) => parse_list(text).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Formats a sequence as a list literal that [`parse_list`] reads back
pub fn format_list(items: &[Value]) -> String {
    let rendered: Vec<String> = items.iter().map(format_item).collect();
    format!("[{}]", rendered.join(", "))
}

pub(crate) fn format_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

/// Formats a float so that it never reads back as an integer
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let s = f.to_string();
    if s.contains('.') || s.contains('e') {
        s
    } else {
        format!("{}.0", s)
    }
}

fn format_item(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(b) => format_bool(*b).to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Text(s) => quote(s),
        Value::Date(d) => quote(&d.format("%Y-%m-%d").to_string()),
        Value::List(items) => format_list(items),
    }
}

/// Quotes a string, preferring single quotes unless the text contains one
fn quote(s: &str) -> String {
    let delimiter = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(delimiter);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn value(&mut self) -> Option<Value> {
        self.skip_whitespace();
        let next = *self.chars.peek()?;
        match next {
            '[' => self.list(),
            quote @ ('\'' | '"') => self.string(quote),
            _ => self.atom(),
        }
    }

    fn list(&mut self) -> Option<Value> {
        self.chars.next(); // '['
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.chars.peek() == Some(&']') {
                self.chars.next();
                break;
            }
            items.push(self.value()?);
            self.skip_whitespace();
            match self.chars.next()? {
                ',' => continue,
                ']' => break,
                _ => return None,
            }
        }
        self.depth -= 1;
        Some(Value::List(items))
    }

    fn string(&mut self, quote: char) -> Option<Value> {
        self.chars.next(); // opening quote
        let mut out = String::new();
        loop {
            match self.chars.next()? {
                '\\' => self.escape(&mut out)?,
                c if c == quote => break,
                c => out.push(c),
            }
        }
        Some(Value::Text(out))
    }

    fn escape(&mut self, out: &mut String) -> Option<()> {
        match self.chars.next()? {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            // line continuation
            '\n' => {}
            c @ ('\\' | '\'' | '"') => out.push(c),
            'x' => out.push(self.hex_char(2)?),
            'u' => out.push(self.hex_char(4)?),
            'U' => out.push(self.hex_char(8)?),
            c @ '0'..='7' => {
                let mut code = c.to_digit(8)?;
                for _ in 0..2 {
                    match self.chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            self.chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code)?);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Some(())
    }

    /// Reads exactly `len` hex digits as a code point
    fn hex_char(&mut self, len: usize) -> Option<char> {
        let mut code = 0u32;
        for _ in 0..len {
            code = code * 16 + self.chars.next()?.to_digit(16)?;
        }
        char::from_u32(code)
    }

    fn atom(&mut self) -> Option<Value> {
        let mut token = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == ',' || c == ']' || c.is_whitespace() {
                break;
            }
            token.push(c);
            self.chars.next();
        }

        match token.as_str() {
            "" => None,
            "True" => Some(Value::Bool(true)),
            "False" => Some(Value::Bool(false)),
            "None" => Some(Value::Null),
            _ => parse_number(&token),
        }
    }
}

fn parse_number(token: &str) -> Option<Value> {
    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    if !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let radix = match body.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &body[2..];
        let digits = digits.strip_prefix('_').unwrap_or(digits);
        if digits.is_empty() || !separated_digits(digits, |c| c.is_digit(radix)) {
            return None;
        }
        let value = i64::from_str_radix(&digits.replace('_', ""), radix).ok()?;
        return Some(Value::Int(if negative { value.checked_neg()? } else { value }));
    }

    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E' | '_'))
        || !separated_digits(body, |c| c.is_ascii_digit())
    {
        return None;
    }
    let number = format!("{}{}", if negative { "-" } else { "" }, body.replace('_', ""));
    if let Ok(i) = number.parse::<i64>() {
        return Some(Value::Int(i));
    }
    number.parse::<f64>().ok().map(Value::Float)
}

/// Whether every `_` in `text` sits between two digits
fn separated_digits(text: &str, is_digit: impl Fn(char) -> bool) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars.iter().enumerate().all(|(i, &c)| {
        c != '_'
            || (i > 0
                && chars.get(i + 1).is_some_and(|&next| is_digit(next))
                && is_digit(chars[i - 1]))
    })
}
