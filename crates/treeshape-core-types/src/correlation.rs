//! Correlation ids tying the log lines and structured errors of one
//! invocation together
//!
//! A request id is minted per invocation unless the caller hands one in; a
//! trace id only exists when an outer layer propagates it.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a fresh time-ordered id (UUIDv7)
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

correlation_id!(
    /// Identifier of a single shape or reconcile invocation
    RequestId
);

correlation_id!(
    /// Trace identifier propagated from the invoking layer
    TraceId
);

/// Correlation ids carried through one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub trace_id: Option<TraceId>,
}

impl RequestContext {
    /// Adopt the ids handed in by the caller, minting a request id if absent
    ///
    /// Blank ids count as absent.
    pub fn from_parts(request_id: Option<String>, trace_id: Option<String>) -> Self {
        let present = |id: Option<String>| id.filter(|s| !s.trim().is_empty());
        Self {
            request_id: present(request_id)
                .map(RequestId::from)
                .unwrap_or_else(RequestId::generate),
            trace_id: present(trace_id).map(TraceId::from),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::from_parts(None, None)
    }
}
