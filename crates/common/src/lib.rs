pub mod config;
pub mod error;
pub mod source;
pub mod types;

pub use config::{Config, DataMode};
pub use error::{AnalysisError, Error, Result};
pub use source::{MarketDataSource, NotificationSink};
pub use types::*;
