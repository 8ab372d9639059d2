use thiserror::Error;

use crate::network::Axis;

#[derive(Debug, Error)]
pub enum ClustergramError {
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("viewport {width}x{height} leaves no room for the matrix")]
    DegenerateViewport { width: f64, height: f64 },

    #[error("no {axis} node named {name:?}")]
    UnknownNode { axis: Axis, name: String },

    #[error("could not parse clustergram JSON")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T, E = ClustergramError> = std::result::Result<T, E>;
