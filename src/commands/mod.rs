pub mod export;
pub mod schema;
pub mod serialize;

pub use export::{ExportCommand, ExportOptions};
pub use schema::SchemaCommand;
pub use serialize::SerializeCommand;
