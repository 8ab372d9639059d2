use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use crate::network::{Axis, Link, Node, Snapshot, index_by_name};

/// Delay before structural changes, per non-empty phase.
pub const PHASE_DELAY_MS: u64 = 1000;
/// Share of the large-matrix threshold past which nothing animates.
pub const ANIMATION_LINK_FRACTION: f64 = 0.35;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum NodeChange {
    Enter { name: String, index: usize },
    Update { name: String, old_index: usize, new_index: usize },
    Exit { name: String, old_index: usize },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AxisDiff {
    pub entering: Vec<String>,
    pub exiting: Vec<String>,
    pub persisting: Vec<String>,
    pub changes: Vec<NodeChange>,
}

impl AxisDiff {
    pub fn between(old: &[Node], new: &[Node]) -> Self {
        let old_index = index_by_name(old);
        let new_index = index_by_name(new);
        let mut diff = Self::default();

        for (index, node) in new.iter().enumerate() {
            if new_index.get(node.name.as_str()) != Some(&index) {
                continue;
            }
            match old_index.get(node.name.as_str()) {
                Some(&old_index) => {
                    diff.persisting.push(node.name.clone());
                    diff.changes.push(NodeChange::Update {
                        name: node.name.clone(),
                        old_index,
                        new_index: index,
                    });
                }
                None => {
                    diff.entering.push(node.name.clone());
                    diff.changes.push(NodeChange::Enter {
                        name: node.name.clone(),
                        index,
                    });
                }
            }
        }
        let mut gone = HashSet::new();
        for (old_index, node) in old.iter().enumerate() {
            let name = node.name.as_str();
            if new_index.contains_key(name) || !gone.insert(name) {
                continue;
            }
            diff.exiting.push(node.name.clone());
            diff.changes.push(NodeChange::Exit {
                name: node.name.clone(),
                old_index,
            });
        }
        diff
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LinkDiff {
    pub entering: Vec<(String, String)>,
    pub exiting: Vec<(String, String)>,
    pub persisting: Vec<(String, String)>,
}

impl LinkDiff {
    pub fn between(old: &[Link], new: &[Link]) -> Self {
        let old_keys = old.iter().map(Link::key).collect::<HashSet<_>>();
        let new_keys = new.iter().map(Link::key).collect::<HashSet<_>>();
        let owned = |(row, col): (&str, &str)| (row.to_owned(), col.to_owned());

        let mut diff = Self::default();
        for link in new {
            if old_keys.contains(&link.key()) {
                diff.persisting.push(owned(link.key()));
            } else {
                diff.entering.push(owned(link.key()));
            }
        }
        diff.exiting = old
            .iter()
            .filter(|link| !new_keys.contains(&link.key()))
            .map(|link| owned(link.key()))
            .collect();
        diff
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Delays {
    pub exit_ms: u64,
    /// Measured from the start of the reconciliation, after the exit delay.
    pub enter_ms: u64,
    pub animate: bool,
}

impl Delays {
    pub fn new(has_exits: bool, has_entries: bool, animate: bool) -> Self {
        if !animate {
            return Self::default();
        }
        let exit_ms = if has_exits { PHASE_DELAY_MS } else { 0 };
        let enter_ms = exit_ms + if has_entries { PHASE_DELAY_MS } else { 0 };
        Self {
            exit_ms,
            enter_ms,
            animate,
        }
    }
}

/// True while link counts stay within the animated share of `threshold`.
pub fn should_animate(link_counts: &[usize], threshold: usize) -> bool {
    let cutoff = ANIMATION_LINK_FRACTION * threshold as f64;
    link_counts.iter().all(|&count| count as f64 <= cutoff)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReconcilePlan {
    pub rows: AxisDiff,
    pub cols: AxisDiff,
    pub links: LinkDiff,
    pub delays: Delays,
}

impl ReconcilePlan {
    pub fn axis(&self, axis: Axis) -> &AxisDiff {
        match axis {
            Axis::Row => &self.rows,
            Axis::Col => &self.cols,
        }
    }

    pub fn has_exits(&self) -> bool {
        !self.rows.exiting.is_empty() || !self.cols.exiting.is_empty()
    }

    pub fn has_entries(&self) -> bool {
        !self.rows.entering.is_empty() || !self.cols.entering.is_empty()
    }
}

pub fn diff(old: &Snapshot, new: &Snapshot, large_matrix_threshold: usize) -> ReconcilePlan {
    let rows = AxisDiff::between(&old.row_nodes, &new.row_nodes);
    let cols = AxisDiff::between(&old.col_nodes, &new.col_nodes);
    let links = LinkDiff::between(&old.links, &new.links);

    let animate = should_animate(&[old.links.len(), new.links.len()], large_matrix_threshold);
    let mut plan = ReconcilePlan {
        rows,
        cols,
        links,
        delays: Delays::default(),
    };
    plan.delays = Delays::new(plan.has_exits(), plan.has_entries(), animate);

    debug!(
        "reconcile: rows +{} -{} ={}, cols +{} -{} ={}, links +{} -{}, animate {}",
        plan.rows.entering.len(),
        plan.rows.exiting.len(),
        plan.rows.persisting.len(),
        plan.cols.entering.len(),
        plan.cols.exiting.len(),
        plan.cols.persisting.len(),
        plan.links.entering.len(),
        plan.links.exiting.len(),
        animate
    );
    plan
}
