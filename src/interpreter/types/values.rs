//! Runtime value types
//!
//! Operators follow loose scripting semantics: `+` concatenates when either
//! side is a string, `==` coerces, everything else converts to a number.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Runtime value type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Val {
    /// Value of a variable that was never assigned
    #[default]
    Undefined,
    /// Value of a read from an exhausted input sequence
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
}

impl Val {
    /// Check if value is truthy (for conditionals)
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Undefined | Val::Null => false,
            Val::Bool(b) => *b,
            Val::Num(n) => *n != 0.0 && !n.is_nan(),
            Val::Str(s) => !s.is_empty(),
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Val::Undefined | Val::Null)
    }

    /// Numeric coercion
    pub fn to_number(&self) -> f64 {
        match self {
            Val::Undefined => f64::NAN,
            Val::Null => 0.0,
            Val::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Val::Num(n) => *n,
            Val::Str(s) => parse_number(s),
        }
    }

    /// Strict equality (`===`): same variant and same value
    pub fn strict_eq(&self, other: &Val) -> bool {
        match (self, other) {
            (Val::Num(a), Val::Num(b)) => a == b,
            _ => self == other,
        }
    }

    /// Loose equality (`==`)
    pub fn loose_eq(&self, other: &Val) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Val::Bool(_), _) => Val::Num(self.to_number()).loose_eq(other),
            (_, Val::Bool(_)) => self.loose_eq(&Val::Num(other.to_number())),
            (Val::Num(a), Val::Str(_)) => *a == other.to_number(),
            (Val::Str(_), Val::Num(b)) => self.to_number() == *b,
            _ => self.strict_eq(other),
        }
    }

    /// Relational comparison; `None` when either side is NaN
    pub fn compare(&self, other: &Val) -> Option<Ordering> {
        match (self, other) {
            (Val::Str(a), Val::Str(b)) => Some(a.cmp(b)),
            _ => self.to_number().partial_cmp(&other.to_number()),
        }
    }

    /// `+`: concatenation if either side is a string, numeric addition otherwise
    pub fn add(&self, other: &Val) -> Val {
        match (self, other) {
            (Val::Str(_), _) | (_, Val::Str(_)) => Val::Str(format!("{}{}", self, other)),
            _ => Val::Num(self.to_number() + other.to_number()),
        }
    }

    /// Character length of a string value
    pub fn length(&self) -> Option<usize> {
        match self {
            Val::Str(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    /// Character at `index` of a string value
    pub fn char_at(&self, index: &Val) -> Val {
        let Val::Str(s) = self else {
            return Val::Undefined;
        };
        let n = index.to_number();
        if n.fract() != 0.0 || n < 0.0 || n.is_nan() {
            return Val::Undefined;
        }
        s.chars()
            .nth(n as usize)
            .map(|c| Val::Str(c.to_string()))
            .unwrap_or(Val::Undefined)
    }
}

/// String to number the way a scripting language reads it: whitespace is
/// ignored, the empty string is zero, anything unparseable is NaN.
fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    let numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        exponent_form(n)
    } else if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// `1e+21`, `1.5e-7`
fn exponent_form(n: f64) -> String {
    let formatted = format!("{:e}", n);
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => formatted,
    }
}

impl Val {
    /// Plain JSON rendering; `undefined` and non-finite numbers become `null`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Val::Undefined | Val::Null => serde_json::Value::Null,
            Val::Bool(b) => serde_json::Value::Bool(*b),
            Val::Num(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Val::Str(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Value of a JSON scalar; arrays and objects have no counterpart
    pub fn from_json(value: serde_json::Value) -> Option<Val> {
        match value {
            serde_json::Value::Null => Some(Val::Null),
            serde_json::Value::Bool(b) => Some(Val::Bool(b)),
            serde_json::Value::Number(n) => n.as_f64().map(Val::Num),
            serde_json::Value::String(s) => Some(Val::Str(s)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Undefined => write!(f, "undefined"),
            Val::Null => write!(f, "null"),
            Val::Bool(b) => write!(f, "{}", b),
            Val::Num(n) => write!(f, "{}", format_number(*n)),
            Val::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::Str(s.to_string())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::Str(s)
    }
}

impl From<f64> for Val {
    fn from(n: f64) -> Self {
        Val::Num(n)
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_conversion() {
        assert_eq!(Val::Num(3.0).to_json(), serde_json::json!(3.0));
        assert_eq!(Val::Undefined.to_json(), serde_json::Value::Null);
        assert_eq!(Val::Num(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(Val::from("a").to_json(), serde_json::json!("a"));

        assert_eq!(Val::from_json(serde_json::json!(2)), Some(Val::Num(2.0)));
        assert_eq!(Val::from_json(serde_json::json!(true)), Some(Val::Bool(true)));
        assert_eq!(Val::from_json(serde_json::json!([1])), None);
    }

    #[test]
    fn test_display_numbers() {
        assert_eq!(Val::Num(4.0).to_string(), "4");
        assert_eq!(Val::Num(-0.0).to_string(), "0");
        assert_eq!(Val::Num(2.5).to_string(), "2.5");
        assert_eq!(Val::Num(f64::NAN).to_string(), "NaN");
        assert_eq!(Val::Num(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Val::Undefined.to_string(), "undefined");
    }

    #[test]
    fn test_display_large_and_tiny_numbers_in_exponent_form() {
        assert_eq!(Val::Num(1e21).to_string(), "1e+21");
        assert_eq!(Val::Num(-1e21).to_string(), "-1e+21");
        assert_eq!(Val::Num(1.23e22).to_string(), "1.23e+22");
        assert_eq!(Val::Num(1e-7).to_string(), "1e-7");
        assert_eq!(Val::Num(2.5e-8).to_string(), "2.5e-8");
        assert_eq!(Val::Num(0.000001).to_string(), "0.000001");
        assert_eq!(Val::Num(1e20).to_string(), "100000000000000000000");
    }

    #[test]
    fn test_add_concatenates_when_either_side_is_string() {
        assert_eq!(Val::from("a").add(&Val::Num(1.0)), Val::from("a1"));
        assert_eq!(Val::Num(1.0).add(&Val::from("2")), Val::from("12"));
        assert_eq!(Val::Num(1.0).add(&Val::Num(2.0)), Val::Num(3.0));
        assert_eq!(Val::Null.add(&Val::Num(2.0)), Val::Num(2.0));
        assert_eq!(Val::Bool(true).add(&Val::Num(1.0)), Val::Num(2.0));
    }

    #[test]
    fn test_loose_equality_coerces() {
        assert!(Val::Num(1.0).loose_eq(&Val::from("1")));
        assert!(Val::from(" 2 ").loose_eq(&Val::Num(2.0)));
        assert!(Val::Bool(true).loose_eq(&Val::Num(1.0)));
        assert!(Val::Bool(false).loose_eq(&Val::from("")));
        assert!(Val::Null.loose_eq(&Val::Undefined));
        assert!(!Val::Null.loose_eq(&Val::Num(0.0)));
        assert!(!Val::Num(f64::NAN).loose_eq(&Val::Num(f64::NAN)));
    }

    #[test]
    fn test_strict_equality_requires_same_variant() {
        assert!(!Val::Num(1.0).strict_eq(&Val::from("1")));
        assert!(Val::from("x").strict_eq(&Val::from("x")));
        assert!(!Val::Null.strict_eq(&Val::Undefined));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Val::Undefined.is_truthy());
        assert!(!Val::Num(0.0).is_truthy());
        assert!(!Val::from("").is_truthy());
        assert!(Val::from("0").is_truthy());
        assert!(Val::Num(-3.0).is_truthy());
    }

    #[test]
    fn test_compare_strings_and_numbers() {
        assert_eq!(Val::from("b").compare(&Val::from("a")), Some(Ordering::Greater));
        assert_eq!(Val::from("10").compare(&Val::Num(9.0)), Some(Ordering::Greater));
        assert_eq!(Val::Undefined.compare(&Val::Num(1.0)), None);
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(Val::from("").to_number(), 0.0);
        assert_eq!(Val::from("0x1f").to_number(), 31.0);
        assert!(Val::from("inf").to_number().is_nan());
        assert!(Val::from("12px").to_number().is_nan());
    }

    #[test]
    fn test_char_at_and_length() {
        let s = Val::from("héllo");
        assert_eq!(s.length(), Some(5));
        assert_eq!(s.char_at(&Val::Num(1.0)), Val::from("é"));
        assert_eq!(s.char_at(&Val::Num(9.0)), Val::Undefined);
        assert_eq!(s.char_at(&Val::Num(1.5)), Val::Undefined);
    }
}
