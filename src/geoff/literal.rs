//! JSON-like literal values: strings, numbers, booleans, null and
//! homogeneous arrays.

use crate::model::Value;
use crate::{Error, Result};
use super::scanner::Scanner;

/// A number as read, before any array-level promotion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

fn starts_number(ch: char) -> bool {
    ch == '-' || ch.is_ascii_digit()
}

fn starts_boolean(ch: char) -> bool {
    ch == 't' || ch == 'f'
}

fn starts_string(ch: char) -> bool {
    ch == '"'
}

/// Read a double-quoted JSON string and unescape it.
pub fn read_string<I: Iterator<Item = char>>(sc: &mut Scanner<I>) -> Result<String> {
    let start = sc.position();
    let mut raw = String::new();
    raw.push(sc.read_exact('"')?);
    loop {
        if !sc.has_more() {
            return Err(Error::UnexpectedEndOfInput { position: sc.position() });
        }
        raw.push_str(&sc.read_until('"'));
        if raw.ends_with('"') && !ends_with_escape(&raw[..raw.len() - 1]) {
            break;
        }
    }
    serde_json::from_str::<String>(&raw).map_err(|e| Error::InvalidStringLiteral {
        position: start,
        message: e.to_string(),
    })
}

/// True when `s` ends in an odd run of backslashes, i.e. the next character
/// is escaped.
fn ends_with_escape(s: &str) -> bool {
    s.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn read_digits<I: Iterator<Item = char>>(sc: &mut Scanner<I>, into: &mut String) -> Result<usize> {
    let mut count = 0;
    while sc.next_matches(|c| c.is_ascii_digit()) {
        into.push(sc.read()?);
        count += 1;
    }
    Ok(count)
}

/// Read an integer or real number. A fractional part or exponent makes it real.
pub fn read_number<I: Iterator<Item = char>>(sc: &mut Scanner<I>) -> Result<Number> {
    let start = sc.position();
    let mut text = String::new();
    let mut is_real = false;
    let invalid = |text: &str| Error::InvalidNumberLiteral {
        position: start,
        text: text.to_string(),
    };

    if sc.next_is('-') {
        text.push(sc.read()?);
    }
    if read_digits(sc, &mut text)? == 0 {
        return Err(invalid(&text));
    }
    if sc.next_is('.') {
        is_real = true;
        text.push(sc.read()?);
        if read_digits(sc, &mut text)? == 0 {
            return Err(invalid(&text));
        }
    }
    if sc.next_is('e') || sc.next_is('E') {
        is_real = true;
        text.push(sc.read()?);
        if sc.next_is('+') || sc.next_is('-') {
            text.push(sc.read()?);
        }
        if read_digits(sc, &mut text)? == 0 {
            return Err(invalid(&text));
        }
    }

    if is_real {
        match text.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Number::Float(f)),
            _ => Err(invalid(&text)),
        }
    } else {
        text.parse::<i64>().map(Number::Int).map_err(|_| invalid(&text))
    }
}

/// Read `true` or `false`.
pub fn read_boolean<I: Iterator<Item = char>>(sc: &mut Scanner<I>) -> Result<bool> {
    let position = sc.position();
    let (word, value) = match sc.peek() {
        Some('t') => ("true", true),
        Some('f') => ("false", false),
        Some(_) => return Err(Error::InvalidBooleanLiteral { position }),
        None => return Err(Error::UnexpectedEndOfInput { position }),
    };
    for expected in word.chars() {
        if !sc.next_is(expected) {
            return Err(Error::InvalidBooleanLiteral { position });
        }
        sc.read()?;
    }
    Ok(value)
}

/// Read `null`.
pub fn read_null<I: Iterator<Item = char>>(sc: &mut Scanner<I>) -> Result<Value> {
    for ch in "null".chars() {
        sc.read_exact(ch)?;
    }
    Ok(Value::Null)
}

/// Read the comma-separated elements of an array whose first element has
/// already been classified. Every element must start like the first.
fn read_elements<I, T>(
    sc: &mut Scanner<I>,
    kind: &'static str,
    starts: fn(char) -> bool,
    read: fn(&mut Scanner<I>) -> Result<T>,
) -> Result<Vec<T>>
where
    I: Iterator<Item = char>,
{
    let mut items = Vec::new();
    loop {
        match sc.peek() {
            Some(ch) if starts(ch) => items.push(read(sc)?),
            Some(found) => {
                return Err(Error::MixedArrayType { position: sc.position(), expected: kind, found });
            }
            None => return Err(Error::UnexpectedEndOfInput { position: sc.position() }),
        }
        sc.skip_whitespace();
        if !sc.next_is(',') {
            break;
        }
        sc.read()?;
        sc.skip_whitespace();
    }
    sc.read_exact(']')?;
    Ok(items)
}

/// Read a homogeneous array. `[]` reads as `Null`.
pub fn read_array<I: Iterator<Item = char>>(sc: &mut Scanner<I>) -> Result<Value> {
    sc.read_exact('[')?;
    sc.skip_whitespace();
    match sc.peek() {
        Some(']') => {
            sc.read()?;
            Ok(Value::Null)
        }
        Some(ch) if starts_string(ch) => {
            read_elements(sc, "string", starts_string, read_string).map(Value::StringArray)
        }
        Some(ch) if starts_boolean(ch) => {
            read_elements(sc, "boolean", starts_boolean, read_boolean).map(Value::BoolArray)
        }
        Some(ch) if starts_number(ch) => {
            let numbers = read_elements(sc, "number", starts_number, read_number)?;
            let ints: Option<Vec<i64>> = numbers.iter()
                .map(|n| match n {
                    Number::Int(i) => Some(*i),
                    Number::Float(_) => None,
                })
                .collect();
            Ok(match ints {
                Some(ints) => Value::IntArray(ints),
                None => Value::FloatArray(numbers.into_iter().map(Number::as_f64).collect()),
            })
        }
        _ => Err(sc.unexpected("array element")),
    }
}

/// Read any literal value, dispatching on the next character.
pub fn read_value<I: Iterator<Item = char>>(sc: &mut Scanner<I>) -> Result<Value> {
    match sc.peek() {
        Some('[') => read_array(sc),
        Some(ch) if starts_string(ch) => read_string(sc).map(Value::String),
        Some(ch) if starts_number(ch) => read_number(sc).map(Value::from),
        Some(ch) if starts_boolean(ch) => read_boolean(sc).map(Value::Bool),
        Some('n') => read_null(sc),
        _ => Err(sc.unexpected("value")),
    }
}
