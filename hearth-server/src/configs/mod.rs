pub mod schema;
pub mod settings;
pub mod storage;

pub use schema::SchemaManager;
pub use settings::{Database, Logger, Poller, Settings, Vendor};
pub use storage::Storage;
