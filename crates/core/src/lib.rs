pub mod channels;
pub mod config;
pub mod error;
pub mod text;
pub mod types;

pub use channels::{ChannelClass, ChannelTaxonomy};
pub use config::AppConfig;
pub use error::{InsightsError, InsightsResult};
pub use types::{Dimension, EventRecord, Metric};
