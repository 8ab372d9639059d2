use serde::{Deserialize, Serialize};

use crate::network::Node;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Ini,
    Rank,
    #[default]
    Clust,
    Class,
}

impl OrderKind {
    pub const ALL: [OrderKind; 4] = [Self::Ini, Self::Rank, Self::Clust, Self::Class];

    pub fn label(self) -> &'static str {
        match self {
            Self::Ini => "ini",
            Self::Rank => "rank",
            Self::Clust => "clust",
            Self::Class => "class",
        }
    }
}

/// Named permutations of one axis' node indices.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderSet {
    ini: Vec<usize>,
    rank: Vec<usize>,
    clust: Vec<usize>,
    class: Option<Vec<usize>>,
}

impl OrderSet {
    pub fn compute(nodes: &[Node]) -> Self {
        // The first node decides; later nodes without an index sort last.
        let has_class = nodes.first().is_some_and(|node| node.class_index().is_some());

        Self {
            ini: sort_descending_by(nodes.len(), |index| nodes[index].ini),
            rank: sort_descending_by(nodes.len(), |index| nodes[index].rank),
            clust: sort_descending_by(nodes.len(), |index| nodes[index].clust),
            class: has_class.then(|| {
                sort_descending_by(nodes.len(), |index| {
                    nodes[index].class_index().unwrap_or(f64::NEG_INFINITY)
                })
            }),
        }
    }

    /// The permutation for `kind`; `None` only for a missing class ordering.
    pub fn get(&self, kind: OrderKind) -> Option<&[usize]> {
        match kind {
            OrderKind::Ini => Some(&self.ini),
            OrderKind::Rank => Some(&self.rank),
            OrderKind::Clust => Some(&self.clust),
            OrderKind::Class => self.class.as_deref(),
        }
    }

    pub fn has_class(&self) -> bool {
        self.class.is_some()
    }
}

/// Stable descending sort of `0..len` by `key`; ties keep array order.
pub fn sort_descending_by(len: usize, key: impl Fn(usize) -> f64) -> Vec<usize> {
    let keys = (0..len).map(&key).collect::<Vec<_>>();
    let mut order = (0..len).collect::<Vec<_>>();
    order.sort_by(|&a, &b| keys[b].total_cmp(&keys[a]));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Category;

    fn node(name: &str, ini: f64, rank: f64, clust: f64) -> Node {
        Node {
            ini,
            rank,
            clust,
            ..Node::named(name)
        }
    }

    #[test]
    fn orders_sort_descending() {
        let nodes = vec![
            node("A", 2.0, 1.0, 0.0),
            node("B", 0.0, 3.0, 2.0),
            node("C", 1.0, 2.0, 1.0),
        ];
        let orders = OrderSet::compute(&nodes);

        assert_eq!(orders.get(OrderKind::Ini), Some(&[0, 2, 1][..]));
        assert_eq!(orders.get(OrderKind::Rank), Some(&[1, 2, 0][..]));
        assert_eq!(orders.get(OrderKind::Clust), Some(&[1, 2, 0][..]));
        assert_eq!(orders.get(OrderKind::Class), None);
    }

    #[test]
    fn ties_keep_array_order() {
        let nodes = vec![
            node("A", 1.0, 0.0, 0.0),
            node("B", 5.0, 0.0, 0.0),
            node("C", 1.0, 0.0, 0.0),
            node("D", 1.0, 0.0, 0.0),
        ];
        let orders = OrderSet::compute(&nodes);

        assert_eq!(orders.get(OrderKind::Ini), Some(&[1, 0, 2, 3][..]));
        assert_eq!(orders.get(OrderKind::Rank), Some(&[0, 1, 2, 3][..]));
    }

    #[test]
    fn class_order_follows_the_first_node() {
        let mut nodes = vec![
            node("A", 0.0, 0.0, 0.0),
            node("B", 0.0, 0.0, 0.0),
            node("C", 0.0, 0.0, 0.0),
        ];
        nodes[1].category = Some(Category {
            label: "y".to_owned(),
            index: Some(2.0),
        });
        assert!(!OrderSet::compute(&nodes).has_class());

        nodes[0].category = Some(Category {
            label: "x".to_owned(),
            index: Some(1.0),
        });
        let orders = OrderSet::compute(&nodes);
        assert_eq!(orders.get(OrderKind::Class), Some(&[1, 0, 2][..]));
    }
}
