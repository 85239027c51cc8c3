use thiserror::Error;
use treeshape_core_types::{RequestContext, RequestId, TraceId};

/// Result type alias using ShapeError
pub type Result<T> = std::result::Result<T, ShapeError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling,
/// tests and outer API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Configuration
    Configuration,

    // Structural
    NotFound,
    UnknownEntity,
    UnknownField,
    CycleDetected,

    // Data
    InvalidValue,
    Serialization,

    // Write path
    PartialFailure,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::UnknownEntity => "ERR_UNKNOWN_ENTITY",
            ExErrorKind::UnknownField => "ERR_UNKNOWN_FIELD",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::InvalidValue => "ERR_INVALID_VALUE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::PartialFailure => "ERR_PARTIAL_FAILURE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification for programmatic handling plus context for
/// debugging: the operation, the entity/field/key involved and correlation ids.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity: Option<String>,
    field: Option<String>,
    record_key: Option<i64>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity: None,
            field: None,
            record_key: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Add field (or configuration key) context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add record key context
    pub fn with_record_key(mut self, key: i64) -> Self {
        self.record_key = Some(key);
        self
    }

    /// Stamp the correlation ids of the invocation that raised the error
    pub fn with_context(mut self, ctx: &RequestContext) -> Self {
        self.request_id = Some(ctx.request_id.clone());
        self.trace_id = ctx.trace_id.clone();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// Field name or configuration key the error is about, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn record_key(&self) -> Option<i64> {
        self.record_key
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity) = &self.entity {
            write!(f, " (entity: {})", entity)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        if let Some(key) = self.record_key {
            write!(f, " (key: {})", key)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for shaping and reconciliation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    // ===== Configuration Errors =====
    /// Required or malformed configuration; `key` names the offending entry
    #[error("Configuration error for `{key}`: {reason}")]
    Configuration { key: String, reason: String },

    // ===== Structural Errors =====
    /// Parent pointers loop back onto an already visited record
    #[error("Cycle detected in parent chain of {entity} at key {key}")]
    CycleDetected { entity: String, key: i64 },

    /// No schema registered for the entity
    #[error("Unknown entity: {entity}")]
    UnknownEntity { entity: String },

    /// Record not present in the collaborator's storage
    #[error("Record not found: {entity} {key}")]
    RecordNotFound { entity: String, key: i64 },

    /// Field not declared on the entity schema
    #[error("Unknown field `{field}` on {entity}")]
    UnknownField { entity: String, field: String },

    // ===== Data Errors =====
    /// Value cannot be decoded into the field's kind
    #[error("Invalid value for `{field}` on {entity}: {reason}")]
    InvalidValue {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    // ===== Write Path Errors =====
    /// One operation of an applied set failed; earlier operations stay applied
    #[error(
        "Reconciliation failed at operation {index} ({op}) after {applied} applied operation(s): {cause}"
    )]
    PartialReconciliation {
        index: usize,
        op: String,
        applied: usize,
        cause: Box<ShapeError>,
    },
}

impl ShapeError {
    /// Shorthand for a configuration error naming `key`
    pub fn configuration(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ShapeError::Configuration {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<ShapeError> for ExError {
    fn from(err: ShapeError) -> Self {
        match err {
            ShapeError::Configuration { key, reason } => {
                ExError::new(ExErrorKind::Configuration)
                    .with_field(key)
                    .with_message(reason)
            }

            ShapeError::CycleDetected { entity, key } => ExError::new(ExErrorKind::CycleDetected)
                .with_entity(entity)
                .with_record_key(key)
                .with_op("walk_ancestors")
                .with_message("Parent chain revisits a record"),

            ShapeError::UnknownEntity { entity } => ExError::new(ExErrorKind::UnknownEntity)
                .with_entity(entity)
                .with_message("No schema registered"),

            ShapeError::RecordNotFound { entity, key } => ExError::new(ExErrorKind::NotFound)
                .with_entity(entity)
                .with_record_key(key)
                .with_message("Record not found"),

            ShapeError::UnknownField { entity, field } => ExError::new(ExErrorKind::UnknownField)
                .with_entity(entity)
                .with_field(field)
                .with_message("Field not declared on schema"),

            ShapeError::InvalidValue {
                entity,
                field,
                reason,
            } => ExError::new(ExErrorKind::InvalidValue)
                .with_entity(entity)
                .with_field(field)
                .with_message(reason),

            ShapeError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            ShapeError::PartialReconciliation {
                index,
                op,
                applied,
                cause,
            } => ExError::new(ExErrorKind::PartialFailure)
                .with_op("reconcile_and_apply")
                .with_message(format!(
                    "operation {} ({}) failed after {} applied",
                    index, op, applied
                ))
                .with_source(ExError::from(*cause)),
        }
    }
}

impl From<serde_json::Error> for ShapeError {
    fn from(err: serde_json::Error) -> Self {
        ShapeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ShapeError {
    fn from(err: toml::de::Error) -> Self {
        ShapeError::Serialization {
            message: err.to_string(),
        }
    }
}
