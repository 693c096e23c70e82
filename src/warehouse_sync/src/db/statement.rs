//! Backend-neutral parameterized statements.

use std::fmt;

/// A bind value. Variants map one-to-one to diesel SQL types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// `Text`
    Text(String),
    /// `BigInt`
    BigInt(i64),
    /// `Nullable<BigInt>`; `None` binds a typed NULL.
    NullableBigInt(Option<i64>),
    /// `Bool`
    Bool(bool),
    /// `Double`
    Double(f64),
}

impl fmt::Display for SqlValue {
    /// SQL literal form, used only for audit output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            SqlValue::BigInt(n) | SqlValue::NullableBigInt(Some(n)) => write!(f, "{n}"),
            SqlValue::NullableBigInt(None) => f.write_str("NULL"),
            SqlValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            SqlValue::Double(x) => write!(f, "{x}"),
        }
    }
}

/// Placeholder style of the target backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `$1, $2, ...`
    Postgres,
    /// `?, ?, ...`
    Sqlite,
}

impl Dialect {
    /// Placeholder for the `n`-th bind, 1-based.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${n}"),
            Dialect::Sqlite => "?".to_string(),
        }
    }
}

/// SQL text with positional binds.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL with backend placeholders.
    pub sql: String,
    /// Values for the placeholders, in order.
    pub params: Vec<SqlValue>,
}

impl Statement {
    /// Appends a bind and returns its placeholder.
    pub fn push(&mut self, dialect: Dialect, value: SqlValue) -> String {
        self.params.push(value);
        dialect.placeholder(self.params.len())
    }
}

impl fmt::Display for Statement {
    /// The SQL followed by a `-- binds:` comment listing every value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{};", self.sql)?;
        write!(f, "-- binds: [")?;
        for (i, v) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        writeln!(f, "]")
    }
}
