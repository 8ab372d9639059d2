use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::network::{FilterKey, FilterValue, Link, Snapshot, View, index_by_name};

const DEFAULT_VIEW: &str = "default";

/// Which catalog entry to show.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawViewRequest", into = "RawViewRequest")]
pub enum ViewRequest {
    /// The first catalog entry.
    Default,
    Filter {
        key: FilterKey,
        value: FilterValue,
        enr_score_type: Option<String>,
        col_cat: Option<String>,
    },
}

impl ViewRequest {
    pub fn filter(key: FilterKey, value: impl Into<FilterValue>) -> Self {
        Self::Filter {
            key,
            value: value.into(),
            enr_score_type: None,
            col_cat: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawViewRequest {
    Named(String),
    Keyed(BTreeMap<String, FilterValue>),
}

impl TryFrom<RawViewRequest> for ViewRequest {
    type Error = String;

    fn try_from(raw: RawViewRequest) -> Result<Self, Self::Error> {
        let mut entries = match raw {
            RawViewRequest::Named(name) if name == DEFAULT_VIEW => return Ok(Self::Default),
            RawViewRequest::Named(name) => return Err(format!("unknown view {name:?}")),
            RawViewRequest::Keyed(entries) => entries,
        };

        let mut secondary = |field: &str| match entries.remove(field) {
            Some(FilterValue::Label(label)) => Ok(Some(label)),
            Some(FilterValue::Number(number)) => Err(format!("{field} must be a string, got {number}")),
            None => Ok(None),
        };
        let enr_score_type = secondary("enr_score_type")?;
        let col_cat = secondary("col_cat")?;

        let mut filters = entries.into_iter();
        let (Some((label, value)), None) = (filters.next(), filters.next()) else {
            return Err("view request needs exactly one filter key".to_owned());
        };
        let key = FilterKey::from_label(&label).ok_or_else(|| format!("unknown filter key {label:?}"))?;

        Ok(Self::Filter {
            key,
            value,
            enr_score_type,
            col_cat,
        })
    }
}

impl From<ViewRequest> for RawViewRequest {
    fn from(request: ViewRequest) -> Self {
        let ViewRequest::Filter {
            key,
            value,
            enr_score_type,
            col_cat,
        } = request
        else {
            return Self::Named(DEFAULT_VIEW.to_owned());
        };

        let mut entries = BTreeMap::from([(key.label().to_owned(), value)]);
        if let Some(score) = enr_score_type {
            entries.insert("enr_score_type".to_owned(), FilterValue::Label(score));
        }
        if let Some(category) = col_cat {
            entries.insert("col_cat".to_owned(), FilterValue::Label(category));
        }
        Self::Keyed(entries)
    }
}

/// Catalog entry for `request`, narrowed by category when categories are
/// shown and by score type when several remain. Falls back to the first
/// entry when nothing matches.
pub fn find_view<'a>(catalog: &'a [View], request: &ViewRequest, show_categories: bool) -> Option<&'a View> {
    let ViewRequest::Filter {
        key,
        value,
        enr_score_type,
        col_cat,
    } = request
    else {
        return catalog.first();
    };

    let mut matches = catalog
        .iter()
        .filter(|view| view.filter(*key).is_some_and(|candidate| candidate.matches(value)))
        .collect::<Vec<_>>();

    if show_categories && let Some(category) = col_cat {
        matches.retain(|view| view.col_cat.as_deref() == Some(category.as_str()));
    }
    if matches.len() > 1 && let Some(score) = enr_score_type {
        let scored = matches
            .iter()
            .copied()
            .filter(|view| view.enr_score_type.as_deref() == Some(score.as_str()))
            .collect::<Vec<_>>();
        if !scored.is_empty() {
            matches = scored;
        }
    }

    match matches.first() {
        Some(view) => Some(*view),
        None => {
            debug!(
                "no view matches {}={:?}, using the first catalog entry",
                key.label(),
                value
            );
            catalog.first()
        }
    }
}

/// Snapshot for `request`. An empty catalog leaves the dataset unchanged.
pub fn select_view(parent: &Snapshot, request: &ViewRequest, show_categories: bool) -> Snapshot {
    let Some(view) = find_view(&parent.views, request, show_categories) else {
        debug!("view catalog is empty, keeping the current dataset");
        return parent.clone();
    };
    let snapshot = filter_using_nodes(parent, view);
    info!(
        "selected view: {} rows, {} cols, {} links",
        snapshot.row_nodes.len(),
        snapshot.col_nodes.len(),
        snapshot.links.len()
    );
    snapshot
}

/// Re-indexes the full link list against the view's node arrays.
pub fn filter_using_nodes(parent: &Snapshot, view: &View) -> Snapshot {
    let source: &[Link] = if parent.all_links.is_empty() {
        &parent.links
    } else {
        &parent.all_links
    };

    let rows = index_by_name(&view.row_nodes);
    let cols = index_by_name(&view.col_nodes);
    let links = source
        .iter()
        .filter_map(|link| {
            let source = *rows.get(link.row_name.as_str())?;
            let target = *cols.get(link.col_name.as_str())?;
            Some(Link {
                source,
                target,
                ..link.clone()
            })
        })
        .collect();

    Snapshot {
        row_nodes: view.row_nodes.clone(),
        col_nodes: view.col_nodes.clone(),
        links,
        all_links: parent.all_links.clone(),
        views: parent.views.clone(),
    }
}

/// Distinct values of `key` in catalog order.
pub fn filter_steps(catalog: &[View], key: FilterKey) -> Vec<FilterValue> {
    let mut steps: Vec<FilterValue> = Vec::new();
    for value in catalog.iter().filter_map(|view| view.filter(key)) {
        if !steps.iter().any(|step| step.matches(value)) {
            steps.push(value.clone());
        }
    }
    steps
}
