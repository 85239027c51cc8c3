use crate::model::{Record, RecordRef, RecordSchema};

/// Read access to schemas and records, supplied by the storage collaborator
///
/// `resolve` returns `None` for dangling references; callers treat that as
/// the end of a path or chain rather than an error.
pub trait RecordResolver {
    fn schema(&self, entity: &str) -> Option<&RecordSchema>;

    fn resolve(&self, reference: &RecordRef) -> Option<&Record>;
}
