//! treeshape core - record shaping and bulk reconciliation
//!
//! This crate sits between a queryable collection of tree-structured records
//! and an API-facing representation. It provides:
//! - Field projection with computed and dotted-path fields
//! - Ancestor resolution over self-referencing parent pointers
//! - Search/sort shaping restricted to whitelisted columns
//! - Pagination with pre/post hooks
//! - Reconciliation of a submitted list into create/update/soft-delete operations
//!
//! Storage, transactions and authorization belong to collaborators. An
//! in-memory [`Store`] implementing the collaborator traits ships in [`ops`].

pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod pagination;
pub mod projection;
pub mod query;
pub mod reconcile;
pub mod shape;
pub mod traversal;

// Re-export commonly used types
pub use config::{QueryParams, ShapeConfig, ShapePlan};
pub use errors::{ExError, ExErrorKind, Result, ShapeError};
pub use model::{FieldKind, RawData, Record, RecordRef, RecordSchema, Status, Value, ValueType};
pub use ops::{QueryableCollection, RecordResolver, RecordSet, StorageWriter, Store};
pub use reconcile::{reconcile, reconcile_and_apply, reconcile_store, ReconciliationOperation};
pub use shape::{
    shape, shape_collection, shape_record, PaginatedResponse, Representation, ShapeTarget, Shaped,
};
