use serde::Serialize;

use crate::network::Node;

pub const DEFAULT_GROUP_LEVEL: usize = 5;
pub const MAX_GROUP_LEVEL: usize = 10;
const BREAKDOWN_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Group id of `node` at `level`, if it carries a dendrogram path.
pub fn group_at(node: &Node, level: usize) -> Option<i64> {
    node.group.as_ref().and_then(|group| group.at(level))
}

/// Names of every node sharing the group of `nodes[index]` at `level`.
pub fn group_members(nodes: &[Node], index: usize, level: usize) -> Vec<String> {
    let Some(group) = nodes.get(index).and_then(|node| group_at(node, level)) else {
        return Vec::new();
    };
    nodes
        .iter()
        .filter(|node| group_at(node, level) == Some(group))
        .map(|node| node.name.clone())
        .collect()
}

/// Category histogram of the group around `nodes[index]`, largest first.
pub fn category_breakdown(nodes: &[Node], index: usize, level: usize) -> Vec<CategoryCount> {
    let Some(group) = nodes.get(index).and_then(|node| group_at(node, level)) else {
        return Vec::new();
    };

    let mut counts: Vec<CategoryCount> = Vec::new();
    let members = nodes
        .iter()
        .filter(|node| group_at(node, level) == Some(group))
        .filter_map(|node| node.category.as_ref());
    for category in members {
        match counts.iter_mut().find(|entry| entry.category == category.label) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                category: category.label.clone(),
                count: 1,
            }),
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(BREAKDOWN_LIMIT);
    counts
}
