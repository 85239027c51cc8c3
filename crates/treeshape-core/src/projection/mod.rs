//! Output field selection and per-record decoration

pub mod derived;
pub mod fields;
pub mod files;
pub mod render;

pub use derived::{apply_ancestry, resolve_anchor, Anchor, CascaderSpec, RecursiveSpec};
pub use fields::{ComputeFn, FieldOrigin, FieldSource, FieldSpec, ProjectedField, Projection};
pub use files::{apply_files, format_file, FileSpec};
pub use render::render_fields;
