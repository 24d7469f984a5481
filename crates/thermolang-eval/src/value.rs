use std::fmt;

/// A runtime value. Expressions produce either a signed integer or text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Text(_) => "Text",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Integer(_) => None,
        }
    }

    /// Nonzero integers are true. Text has no truth value.
    pub fn truthiness(&self) -> Option<bool> {
        self.as_integer().map(|n| n != 0)
    }

    pub fn from_bool(b: bool) -> Self {
        Value::Integer(i64::from(b))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert_eq!(Value::Integer(1).truthiness(), Some(true));
        assert_eq!(Value::Integer(-3).truthiness(), Some(true));
        assert_eq!(Value::Integer(0).truthiness(), Some(false));
        assert_eq!(Value::from("yes").truthiness(), None);
    }

    #[test]
    fn test_from_bool() {
        assert_eq!(Value::from_bool(true), Value::Integer(1));
        assert_eq!(Value::from_bool(false), Value::Integer(0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(-7).to_string(), "-7");
        assert_eq!(Value::from("cool").to_string(), "\"cool\"");
    }
}
