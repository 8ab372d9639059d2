use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Col,
}

impl Axis {
    pub fn label(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Col => "col",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Row => Self::Col,
            Self::Col => Self::Row,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category membership carried by a node (`cl` / `cl_index` in the dataset).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Category {
    pub label: String,
    pub index: Option<f64>,
}

/// Dendrogram group path: the group id of the node at each cut level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DendroGroup(pub Vec<i64>);

impl DendroGroup {
    pub fn at(&self, level: usize) -> Option<i64> {
        self.0.get(level).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub ini: f64,
    pub rank: f64,
    pub clust: f64,
    pub value: Option<f64>,
    pub category: Option<Category>,
    pub group: Option<DendroGroup>,
    pub attributes: BTreeMap<String, Value>,
}

impl Node {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            ini: 0.0,
            rank: 0.0,
            clust: 0.0,
            value: None,
            category: None,
            group: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn class_index(&self) -> Option<f64> {
        self.category.as_ref().and_then(|category| category.index)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub row_name: String,
    pub col_name: String,
    pub value: f64,
    pub value_up: Option<f64>,
    pub value_down: Option<f64>,
    pub highlight: Option<i64>,
    pub info: Option<String>,
}

impl Link {
    pub fn key(&self) -> (&str, &str) {
        (&self.row_name, &self.col_name)
    }

    pub fn is_updn(&self) -> bool {
        self.value_up.is_some() || self.value_down.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Label(String),
}

impl FilterValue {
    /// Loose equality: `"0.5"` and `0.5` name the same cut.
    pub fn matches(&self, other: &FilterValue) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => (a - b).abs() <= f64::EPSILON * a.abs().max(1.0),
            (Self::Label(a), Self::Label(b)) => a == b,
            (Self::Number(number), Self::Label(label)) | (Self::Label(label), Self::Number(number)) => {
                label.trim().parse::<f64>().is_ok_and(|parsed| parsed == *number)
            }
        }
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Label(value.to_owned())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    FilterRow,
    FilterRowValue,
    FilterRowSum,
    FilterRowNum,
    #[serde(rename = "N_row_sum")]
    TopRowSum,
}

impl FilterKey {
    pub fn label(self) -> &'static str {
        match self {
            Self::FilterRow => "filter_row",
            Self::FilterRowValue => "filter_row_value",
            Self::FilterRowSum => "filter_row_sum",
            Self::FilterRowNum => "filter_row_num",
            Self::TopRowSum => "N_row_sum",
        }
    }

    /// Accepts the legacy `filt` spelling of `filter_row`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "filter_row" | "filt" => Some(Self::FilterRow),
            "filter_row_value" => Some(Self::FilterRowValue),
            "filter_row_sum" => Some(Self::FilterRowSum),
            "filter_row_num" => Some(Self::FilterRowNum),
            "N_row_sum" => Some(Self::TopRowSum),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct View {
    pub filters: BTreeMap<&'static str, FilterValue>,
    pub enr_score_type: Option<String>,
    pub col_cat: Option<String>,
    pub row_nodes: Vec<Node>,
    pub col_nodes: Vec<Node>,
}

impl View {
    pub fn filter(&self, key: FilterKey) -> Option<&FilterValue> {
        self.filters.get(key.label())
    }
}

/// One loaded dataset or one selected view of it.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub row_nodes: Vec<Node>,
    pub col_nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub all_links: Arc<Vec<Link>>,
    pub views: Arc<Vec<View>>,
}

impl Snapshot {
    pub fn nodes(&self, axis: Axis) -> &[Node] {
        match axis {
            Axis::Row => &self.row_nodes,
            Axis::Col => &self.col_nodes,
        }
    }

    pub fn node_count(&self, axis: Axis) -> usize {
        self.nodes(axis).len()
    }

    pub fn names(&self, axis: Axis) -> Vec<&str> {
        self.nodes(axis).iter().map(|node| node.name.as_str()).collect()
    }

    pub fn index_by_name(&self, axis: Axis) -> HashMap<&str, usize> {
        index_by_name(self.nodes(axis))
    }

    pub fn position_of(&self, axis: Axis, name: &str) -> Option<usize> {
        self.nodes(axis).iter().position(|node| node.name == name)
    }

    pub fn max_label_chars(&self, axis: Axis) -> usize {
        self.nodes(axis)
            .iter()
            .map(|node| node.name.chars().count())
            .max()
            .unwrap_or(0)
    }

    pub fn show_dendrogram(&self) -> bool {
        self.row_nodes.first().is_some_and(|node| node.group.is_some())
            || self.col_nodes.first().is_some_and(|node| node.group.is_some())
    }

    pub fn show_categories(&self) -> bool {
        self.row_nodes.first().is_some_and(|node| node.category.is_some())
            || self.col_nodes.first().is_some_and(|node| node.category.is_some())
    }

    pub fn has_updn_links(&self) -> bool {
        self.links.first().is_some_and(Link::is_updn)
    }

    pub fn max_abs_link(&self) -> f64 {
        let source: &[Link] = if self.all_links.is_empty() {
            &self.links
        } else {
            &self.all_links
        };
        source
            .iter()
            .map(|link| link.value.abs())
            .fold(0.0, f64::max)
    }

    pub fn max_abs_node_value(&self, axis: Axis) -> Option<f64> {
        self.nodes(axis)
            .iter()
            .filter_map(|node| node.value)
            .map(f64::abs)
            .reduce(f64::max)
    }

    /// Column names grouped by category label, in first-appearance order.
    pub fn class_dict(&self) -> Vec<(String, Vec<String>)> {
        let mut dict: Vec<(String, Vec<String>)> = Vec::new();
        for node in &self.col_nodes {
            let Some(category) = &node.category else {
                continue;
            };
            match dict.iter_mut().find(|(label, _)| *label == category.label) {
                Some((_, names)) => names.push(node.name.clone()),
                None => dict.push((category.label.clone(), vec![node.name.clone()])),
            }
        }
        dict
    }
}

pub(crate) fn index_by_name(nodes: &[Node]) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (position, node) in nodes.iter().enumerate() {
        index.entry(node.name.as_str()).or_insert(position);
    }
    index
}
