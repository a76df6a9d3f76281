pub mod authors;
pub mod config;
pub mod core;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod record;
pub mod selector;
pub mod session;
pub mod transform;
mod utils;

pub use crate::core::{CategoryBatch, RecordSink, RunSummary, SintaCore};

pub use config::PortalConfig;
pub use error::{Error, ErrorKind, ExtractionError};
pub use extract::Category;
pub use record::CategoryRecord;
pub use session::{Credentials, PortalSession, SessionManager, SessionPhase};
