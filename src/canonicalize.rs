//! JSON Canonicalization Scheme (JCS)
//!
//! Implements RFC 8785 so that the same logical JSON document always yields
//! the same bytes. Every fingerprint and signature in the ledger is computed
//! over this form, which makes hash equality reflect semantic equality rather
//! than incidental key order or whitespace.

use crate::errors::{ContentError, ContentResult};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

/// Serialize any value to its canonical JSON string
pub fn to_canonical_string<T: Serialize + ?Sized>(material: &T) -> ContentResult<String> {
    let value = serde_json::to_value(material)
        .map_err(|e| ContentError::encoding("canonical serialization", e))?;
    canonicalize_json(&value)
}

/// Canonicalize a JSON value according to RFC 8785 (JCS)
pub fn canonicalize_json(value: &Value) -> ContentResult<String> {
    let mut output = String::new();
    serialize_value(value, &mut output)?;
    Ok(output)
}

fn serialize_value(value: &Value, output: &mut String) -> ContentResult<()> {
    match value {
        Value::Object(map) => serialize_object(map, output)?,
        Value::Array(arr) => serialize_array(arr, output)?,
        Value::String(s) => serialize_string(s, output)?,
        Value::Number(n) => serialize_number(n, output)?,
        Value::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
        Value::Null => output.push_str("null"),
    }
    Ok(())
}

/// Objects are emitted with keys in lexicographic order
fn serialize_object(
    map: &serde_json::Map<String, Value>,
    output: &mut String,
) -> ContentResult<()> {
    output.push('{');

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        serialize_string(key, output)?;
        output.push(':');
        serialize_value(&map[*key], output)?;
    }

    output.push('}');
    Ok(())
}

fn serialize_array(arr: &[Value], output: &mut String) -> ContentResult<()> {
    output.push('[');
    for (i, item) in arr.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        serialize_value(item, output)?;
    }
    output.push(']');
    Ok(())
}

fn serialize_string(s: &str, output: &mut String) -> ContentResult<()> {
    output.push('"');

    for ch in s.chars() {
        match ch {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\u{08}' => output.push_str("\\b"),
            '\u{0C}' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            ch if (ch as u32) < 0x20 => {
                write!(output, "\\u{:04x}", ch as u32)
                    .map_err(|e| ContentError::encoding("string escape", e))?;
            }
            ch => output.push(ch),
        }
    }

    output.push('"');
    Ok(())
}

/// Numbers follow ECMAScript Number.prototype.toString(). Integers that
/// serde_json holds as i64/u64 are written exactly.
fn serialize_number(num: &serde_json::Number, output: &mut String) -> ContentResult<()> {
    if let Some(i) = num.as_i64() {
        write!(output, "{i}").map_err(|e| ContentError::encoding("number", e))?;
    } else if let Some(u) = num.as_u64() {
        write!(output, "{u}").map_err(|e| ContentError::encoding("number", e))?;
    } else if let Some(f) = num.as_f64() {
        if !f.is_finite() {
            return Err(ContentError::encoding(
                "number",
                "non-finite numbers have no canonical form",
            ));
        }
        output.push_str(&format_f64(f));
    } else {
        return Err(ContentError::encoding("number", "invalid number format"));
    }
    Ok(())
}

/// ECMAScript rendering of a finite double.
///
/// Rust's `{:e}` yields the shortest round-tripping digit string, which is
/// the same digit string ECMAScript picks; only the layout differs.
fn format_f64(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }

    let scientific = format!("{:e}", f.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    // value = 0.<digits> * 10^n
    let k = digits.len() as i32;
    let n = exponent + 1;

    let mut out = String::new();
    if f < 0.0 {
        out.push('-');
    }

    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat('0').take((n - k) as usize));
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        out.push_str(int);
        out.push('.');
        out.push_str(frac);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-n) as usize));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        out.push('e');
        out.push(if n - 1 < 0 { '-' } else { '+' });
        out.push_str(&(n - 1).abs().to_string());
    }
    out
}
