//! Path resolution and ancestor walks over self-referencing records

pub mod ancestors;
pub mod path;

pub use ancestors::{
    ancestor_at, cascader, cascader_of, chain, hop_path, lookup_path, recursive, relation_path,
    walk,
};
pub use path::{resolve_path, resolve_segments, split_path};
