pub mod config;
pub mod engine;
pub mod error;
pub mod network;
pub mod util;

pub use config::Config;
pub use engine::Clustergram;
pub use error::{ClustergramError, Result};
pub use network::{Axis, Snapshot, load_snapshot};
