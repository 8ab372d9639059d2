use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::model::FilterValue;

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawNetwork {
    #[serde(default)]
    pub(super) row_nodes: Vec<RawNode>,
    #[serde(default)]
    pub(super) col_nodes: Vec<RawNode>,
    #[serde(default)]
    pub(super) links: Vec<RawLink>,
    #[serde(default)]
    pub(super) views: Vec<RawView>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawNode {
    #[serde(default)]
    pub(super) id: Option<Value>,
    pub(super) name: String,
    #[serde(default)]
    pub(super) ini: Option<f64>,
    #[serde(default)]
    pub(super) rank: Option<f64>,
    #[serde(default)]
    pub(super) clust: Option<f64>,
    #[serde(default)]
    pub(super) value: Option<f64>,
    #[serde(default)]
    pub(super) cl: Option<Value>,
    #[serde(default)]
    pub(super) cl_index: Option<f64>,
    #[serde(default)]
    pub(super) group: Option<Vec<f64>>,
    #[serde(flatten)]
    pub(super) attributes: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawLink {
    pub(super) source: i64,
    pub(super) target: i64,
    #[serde(default)]
    pub(super) value: f64,
    #[serde(default)]
    pub(super) value_up: Option<f64>,
    #[serde(default, alias = "value_down")]
    pub(super) value_dn: Option<f64>,
    #[serde(default)]
    pub(super) highlight: Option<i64>,
    #[serde(default)]
    pub(super) info: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(super) struct RawViewNodes {
    #[serde(default)]
    pub(super) row_nodes: Vec<RawNode>,
    #[serde(default)]
    pub(super) col_nodes: Vec<RawNode>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawView {
    #[serde(default)]
    pub(super) filter_row: Option<FilterValue>,
    #[serde(default)]
    pub(super) filt: Option<FilterValue>,
    #[serde(default)]
    pub(super) filter_row_value: Option<FilterValue>,
    #[serde(default)]
    pub(super) filter_row_sum: Option<FilterValue>,
    #[serde(default)]
    pub(super) filter_row_num: Option<FilterValue>,
    #[serde(default, rename = "N_row_sum")]
    pub(super) n_row_sum: Option<FilterValue>,
    #[serde(default)]
    pub(super) enr_score_type: Option<String>,
    #[serde(default)]
    pub(super) col_cat: Option<String>,
    #[serde(default)]
    pub(super) nodes: RawViewNodes,
}

pub(super) fn parse_network(raw: &str) -> serde_json::Result<RawNetwork> {
    serde_json::from_str(raw)
}

/// Display form of a dataset name: underscores become spaces.
pub(super) fn normalize_name(name: &str) -> String {
    name.replace('_', " ")
}

pub(super) fn value_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
