pub mod handlers;
pub mod record;
pub mod schema;
pub mod value;

pub use handlers::{Capabilities, HandlerRegistry, SearchHandler, SortHandler};
pub use record::{Record, RecordRef, Status};
pub use schema::{FieldDef, FieldKind, RecordSchema, DEFAULT_PRIMARY_KEY};
pub use value::{RawData, Value, ValueType};
