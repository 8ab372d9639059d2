mod load;
mod model;
mod parse;

pub use load::{load_snapshot, load_snapshot_value};
pub use model::{
    Axis, Category, DendroGroup, FilterKey, FilterValue, Link, Node, Snapshot, View,
};
pub(crate) use model::index_by_name;
