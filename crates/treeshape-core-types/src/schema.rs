//! Canonical schema constants for structured logging
//!
//! Every log line emitted through the logging macros uses these keys.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Record identifiers
pub const FIELD_ENTITY: &str = "entity";
pub const FIELD_RECORD_KEY: &str = "record_key";
pub const FIELD_COLUMN: &str = "column";

// Collection sizes
pub const FIELD_COUNT: &str = "count";
pub const FIELD_PAGE: &str = "page";
pub const FIELD_OPS_LEN: &str = "ops_len";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_FALLBACK: &str = "fallback";
