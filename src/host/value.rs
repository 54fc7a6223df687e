// String-backed command values with integer conversion.
use std::fmt;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Value(String);

impl Value {
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Accepts optional sign, surrounding whitespace, and `0x`/`0o`/`0b` radix prefixes.
    pub fn to_int(&self) -> Result<i64, Error> {
        let text = self.0.trim();
        let (negative, digits) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (radix, digits) = match digits.get(..2) {
            Some("0x") | Some("0X") => (16, &digits[2..]),
            Some("0o") | Some("0O") => (8, &digits[2..]),
            Some("0b") | Some("0B") => (2, &digits[2..]),
            _ => (10, digits),
        };
        if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
            return Err(Error::new(ErrorKind::Conversion)
                .with_message(format!("expected integer but got \"{}\"", self.0)));
        }
        let magnitude = i128::from_str_radix(digits, radix).map_err(|err| {
            Error::new(ErrorKind::Conversion)
                .with_message("integer value too large to represent")
                .with_source(err)
        })?;
        let signed = if negative { -magnitude } else { magnitude };
        i64::try_from(signed).map_err(|err| {
            Error::new(ErrorKind::Conversion)
                .with_message("integer value too large to represent")
                .with_source(err)
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// Joins elements into a list, bracing any element that would not survive word splitting.
pub fn format_list<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items
        .into_iter()
        .map(list_element)
        .collect::<Vec<_>>()
        .join(" ")
}

fn list_element(item: &str) -> String {
    let needs_braces = item.is_empty()
        || item
            .chars()
            .any(|ch| ch.is_whitespace() || matches!(ch, '{' | '}' | '"' | ';' | '#'));
    if needs_braces {
        format!("{{{item}}}")
    } else {
        item.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{Value, format_list};
    use crate::core::error::ErrorKind;

    #[test]
    fn integer_conversion_accepts_common_forms() {
        assert_eq!(Value::from("7").to_int().expect("int"), 7);
        assert_eq!(Value::from(" -12 ").to_int().expect("int"), -12);
        assert_eq!(Value::from("+3").to_int().expect("int"), 3);
        assert_eq!(Value::from("0x1f").to_int().expect("int"), 31);
        assert_eq!(Value::from("0b101").to_int().expect("int"), 5);
        assert_eq!(
            Value::from("-9223372036854775808").to_int().expect("int"),
            i64::MIN
        );
    }

    #[test]
    fn integer_conversion_reports_offending_text() {
        let err = Value::from("abc").to_int().expect_err("not an int");
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert_eq!(err.message(), Some("expected integer but got \"abc\""));
        assert!(Value::from("").to_int().is_err());
        assert!(Value::from("1.5").to_int().is_err());
        assert!(Value::from("0x").to_int().is_err());
        let err = Value::from("9223372036854775808").to_int().expect_err("overflow");
        assert_eq!(err.message(), Some("integer value too large to represent"));
    }

    #[test]
    fn list_formatting_braces_only_when_needed() {
        assert_eq!(format_list(["unsafe", "command", "invoked"]), "unsafe command invoked");
        assert_eq!(format_list(["a b", "", "c"]), "{a b} {} c");
    }
}
