use thiserror::Error;

/// Path separator for lookup expressions (`parent__parent__label`)
pub const LOOKUP_SEPARATOR: &str = "__";

/// Comparison applied by a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupModifier {
    Exact,
    /// Case-insensitive substring
    IContains,
    /// Calendar-date equality on a datetime field
    Date,
}

impl LookupModifier {
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            LookupModifier::Exact => None,
            LookupModifier::IContains => Some("icontains"),
            LookupModifier::Date => Some("date"),
        }
    }
}

/// One filter expression over a relation path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub path: Vec<String>,
    pub modifier: LookupModifier,
    pub value: String,
}

impl Lookup {
    pub fn new(path: Vec<String>, modifier: LookupModifier, value: impl Into<String>) -> Self {
        Self {
            path,
            modifier,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.join(LOOKUP_SEPARATOR))?;
        if let Some(suffix) = self.modifier.suffix() {
            write!(f, "{}{}", LOOKUP_SEPARATOR, suffix)?;
        }
        Ok(())
    }
}

/// One ordering key over a relation path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub path: Vec<String>,
    pub descending: bool,
}

impl OrderKey {
    pub fn asc(path: Vec<String>) -> Self {
        Self {
            path,
            descending: false,
        }
    }

    pub fn desc(path: Vec<String>) -> Self {
        Self {
            path,
            descending: true,
        }
    }
}

impl std::fmt::Display for OrderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.descending {
            write!(f, "-")?;
        }
        write!(f, "{}", self.path.join(LOOKUP_SEPARATOR))
    }
}

/// A collection refused to evaluate an expression
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Rejected expression `{expression}`: {reason}")]
pub struct QueryRejected {
    pub expression: String,
    pub reason: String,
}

impl QueryRejected {
    pub fn new(expression: impl ToString, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}
