use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use crate::error::Result;

use super::model::{Category, DendroGroup, FilterKey, Link, Node, Snapshot, View};
use super::parse::{
    RawLink, RawNetwork, RawNode, RawView, normalize_name, parse_network, value_label,
};

pub fn load_snapshot(raw: &str, transpose: bool) -> Result<Snapshot> {
    let network = parse_network(raw)?;
    Ok(build_snapshot(network, transpose))
}

pub fn load_snapshot_value(value: Value, transpose: bool) -> Result<Snapshot> {
    let network: RawNetwork = serde_json::from_value(value)?;
    Ok(build_snapshot(network, transpose))
}

fn build_snapshot(network: RawNetwork, transpose: bool) -> Snapshot {
    let RawNetwork {
        row_nodes,
        col_nodes,
        links,
        views,
    } = network;

    let mut row_nodes = row_nodes.into_iter().map(convert_node).collect::<Vec<_>>();
    let mut col_nodes = col_nodes.into_iter().map(convert_node).collect::<Vec<_>>();
    let mut links = links;

    if transpose {
        std::mem::swap(&mut row_nodes, &mut col_nodes);
        for link in &mut links {
            std::mem::swap(&mut link.source, &mut link.target);
        }
    }

    let raw_count = links.len();
    let links = links
        .into_iter()
        .filter_map(|link| resolve_link(link, &row_nodes, &col_nodes))
        .collect::<Vec<_>>();
    if links.len() < raw_count {
        warn!(
            "dropped {} links referencing nodes outside the {}x{} matrix",
            raw_count - links.len(),
            row_nodes.len(),
            col_nodes.len()
        );
    }

    let views = views
        .into_iter()
        .map(|view| convert_view(view, transpose))
        .collect::<Vec<_>>();

    debug!(
        "loaded network: {} rows, {} cols, {} links, {} views",
        row_nodes.len(),
        col_nodes.len(),
        links.len(),
        views.len()
    );

    let all_links = Arc::new(links.clone());
    Snapshot {
        row_nodes,
        col_nodes,
        links,
        all_links,
        views: Arc::new(views),
    }
}

fn resolve_link(link: RawLink, row_nodes: &[Node], col_nodes: &[Node]) -> Option<Link> {
    let source = usize::try_from(link.source).ok()?;
    let target = usize::try_from(link.target).ok()?;
    let row = row_nodes.get(source)?;
    let col = col_nodes.get(target)?;

    Some(Link {
        source,
        target,
        row_name: row.name.clone(),
        col_name: col.name.clone(),
        value: link.value,
        value_up: link.value_up,
        value_down: link.value_dn,
        highlight: link.highlight,
        info: link.info,
    })
}

fn convert_node(raw: RawNode) -> Node {
    let name = normalize_name(&raw.name);
    let id = raw
        .id
        .as_ref()
        .map(value_label)
        .unwrap_or_else(|| name.clone());

    let category = raw.cl.as_ref().map(|label| Category {
        label: value_label(label),
        index: raw.cl_index,
    });
    let group = raw
        .group
        .map(|path| DendroGroup(path.into_iter().map(|id| id as i64).collect()));

    Node {
        id,
        name,
        ini: raw.ini.unwrap_or(0.0),
        rank: raw.rank.unwrap_or(0.0),
        clust: raw.clust.unwrap_or(0.0),
        value: raw.value,
        category,
        group,
        attributes: raw.attributes,
    }
}

fn convert_view(raw: RawView, transpose: bool) -> View {
    let mut filters = BTreeMap::new();
    let entries = [
        (FilterKey::FilterRow, raw.filter_row.or(raw.filt)),
        (FilterKey::FilterRowValue, raw.filter_row_value),
        (FilterKey::FilterRowSum, raw.filter_row_sum),
        (FilterKey::FilterRowNum, raw.filter_row_num),
        (FilterKey::TopRowSum, raw.n_row_sum),
    ];
    for (key, value) in entries {
        if let Some(value) = value {
            filters.insert(key.label(), value);
        }
    }

    let mut row_nodes = raw
        .nodes
        .row_nodes
        .into_iter()
        .map(convert_node)
        .collect::<Vec<_>>();
    let mut col_nodes = raw
        .nodes
        .col_nodes
        .into_iter()
        .map(convert_node)
        .collect::<Vec<_>>();
    if transpose {
        std::mem::swap(&mut row_nodes, &mut col_nodes);
    }

    View {
        filters,
        enr_score_type: raw.enr_score_type,
        col_cat: raw.col_cat,
        row_nodes,
        col_nodes,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::network::{Axis, FilterValue};

    fn sample() -> Value {
        json!({
            "row_nodes": [
                {"name": "GENE_A", "ini": 2, "rank": 1, "clust": 0, "group": [1, 1, 2]},
                {"name": "GENE_B", "ini": 1, "rank": 2, "clust": 1, "group": [1, 2, 3]}
            ],
            "col_nodes": [
                {"name": "cond_1", "cl": "treated", "cl_index": 1, "tissue": "liver"},
                {"name": "cond_2", "cl": "control", "cl_index": 0}
            ],
            "links": [
                {"source": 0, "target": 1, "value": 0.5, "info": "a"},
                {"source": 1, "target": 0, "value": -2.0, "highlight": 1},
                {"source": 5, "target": 0, "value": 1.0},
                {"source": 0, "target": -1, "value": 1.0}
            ],
            "views": [
                {"N_row_sum": "all", "nodes": {"row_nodes": [{"name": "GENE_A"}], "col_nodes": []}},
                {"filt": 0.1, "nodes": {"row_nodes": [], "col_nodes": []}}
            ]
        })
    }

    #[test]
    fn drops_out_of_range_links_and_names_the_rest() {
        let snapshot = load_snapshot_value(sample(), false).expect("valid network");

        assert_eq!(snapshot.links.len(), 2);
        assert_eq!(snapshot.links[0].key(), ("GENE A", "cond 2"));
        assert_eq!(snapshot.links[1].highlight, Some(1));
        assert_eq!(snapshot.all_links.len(), 2);
    }

    #[test]
    fn resolves_node_capabilities_once() {
        let snapshot = load_snapshot_value(sample(), false).expect("valid network");

        assert!(snapshot.show_dendrogram());
        assert!(snapshot.show_categories());
        assert_eq!(snapshot.row_nodes[1].group.as_ref().and_then(|g| g.at(2)), Some(3));
        assert_eq!(snapshot.col_nodes[0].class_index(), Some(1.0));
        assert_eq!(snapshot.col_nodes[0].attributes.get("tissue"), Some(&json!("liver")));
    }

    #[test]
    fn transpose_swaps_axes_and_link_ends() {
        let snapshot = load_snapshot_value(sample(), true).expect("valid network");

        assert_eq!(snapshot.names(Axis::Row), vec!["cond 1", "cond 2"]);
        assert_eq!(snapshot.names(Axis::Col), vec!["GENE A", "GENE B"]);
        let link = &snapshot.links[0];
        assert_eq!((link.source, link.target), (1, 0));
        assert_eq!(link.key(), ("cond 2", "GENE A"));
        assert_eq!(snapshot.views[0].col_nodes[0].name, "GENE A");
    }

    #[test]
    fn legacy_filt_key_is_read_as_filter_row() {
        let snapshot = load_snapshot_value(sample(), false).expect("valid network");

        let view = &snapshot.views[1];
        assert_eq!(view.filter(FilterKey::FilterRow), Some(&FilterValue::Number(0.1)));
        assert_eq!(
            snapshot.views[0].filter(FilterKey::TopRowSum),
            Some(&FilterValue::Label("all".to_owned()))
        );
    }
}
