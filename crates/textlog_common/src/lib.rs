//! Text Log Common - error records, the per-day text log and its table mirror
//!
//! A `LogStore` appends one line per `ErrorRecord` to `<folder>/YYYY_MM_DD.txt`,
//! rejects repeated trace ids, and answers level lookups from a lazily built
//! index. Optionally every record is mirrored into an SQLite `errors` table.

pub mod config;
pub mod error;
pub mod line;
pub mod record;
pub mod store;
pub mod table;

pub use config::TextLogConfig;
pub use error::{IdStore, LogError, Result};
pub use record::ErrorRecord;
pub use store::LogStore;
pub use table::ErrorTable;
