pub mod collection;
pub mod dataset;
pub mod resolver;
pub mod store;
pub mod writer;

pub use collection::{QueryableCollection, RecordSet};
pub use dataset::Dataset;
pub use resolver::RecordResolver;
pub use store::Store;
pub use writer::{EntityWriter, StorageWriter};
