use super::expr::QueryRejected;

/// Why search or sort left the collection untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Field name or query text (or every sort token) was empty
    EmptyInput,
    NotSearchable { column: String },
    /// A computed field's handler produced no expressions
    EmptyExpression,
    /// Tree-relative path needs a sample record and there is none
    EmptyCollection,
    NoAnchor { column: String },
    NoAncestorAtDepth { column: String, depth: usize },
    Ancestry { message: String },
    Rejected(QueryRejected),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::EmptyInput => write!(f, "empty input"),
            FallbackReason::NotSearchable { column } => {
                write!(f, "column `{}` is not searchable", column)
            }
            FallbackReason::EmptyExpression => write!(f, "handler produced no expression"),
            FallbackReason::EmptyCollection => write!(f, "collection is empty"),
            FallbackReason::NoAnchor { column } => {
                write!(f, "column `{}` has no ancestry anchor", column)
            }
            FallbackReason::NoAncestorAtDepth { column, depth } => {
                write!(f, "column `{}` has no ancestor at depth {}", column, depth)
            }
            FallbackReason::Ancestry { message } => write!(f, "ancestry failed: {}", message),
            FallbackReason::Rejected(rejected) => write!(f, "{}", rejected),
        }
    }
}

/// Result of a search or sort: the shaped collection, or the input unchanged
#[derive(Debug)]
pub enum QueryOutcome<C> {
    Applied(C),
    FellBack { collection: C, reason: FallbackReason },
}

impl<C> QueryOutcome<C> {
    pub fn into_inner(self) -> C {
        match self {
            QueryOutcome::Applied(c) => c,
            QueryOutcome::FellBack { collection, .. } => collection,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, QueryOutcome::Applied(_))
    }

    pub fn reason(&self) -> Option<&FallbackReason> {
        match self {
            QueryOutcome::Applied(_) => None,
            QueryOutcome::FellBack { reason, .. } => Some(reason),
        }
    }
}
