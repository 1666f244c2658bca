pub mod error;
pub mod schema;
pub mod seed;
pub mod settings;
pub mod store;

pub use error::{Result, StoreError};
pub use seed::{CatalogFile, ImportReport, builtin_catalog, import_builtin, import_catalog, read_catalog};
pub use settings::{DataDir, Settings};
pub use store::{ScanRecord, Store};
