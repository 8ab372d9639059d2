mod dendro;
mod geometry;
mod labels;
mod matrix;
mod orders;
mod reconcile;
mod render;
mod scale;
mod search;
mod transition;
mod views;
mod zoom;

use log::{debug, info};
use serde::Serialize;

use crate::config::Config;
use crate::error::{ClustergramError, Result};
use crate::network::{Axis, FilterKey, FilterValue, Node, Snapshot, load_snapshot};

pub use dendro::{CategoryCount, DEFAULT_GROUP_LEVEL, MAX_GROUP_LEVEL, category_breakdown, group_members};
pub use geometry::{
    AxisPair, Extent, Geometry, GeometryOptions, MAX_LABEL_CHARS, Offset, label_keep_for, label_width_for, plan,
};
pub use labels::{AverageCharWidth, FontPolicy, LabelInputs, LabelPlacement, TextMetrics, TrimRule, font_policy, place_labels};
pub use matrix::{Cell, MatrixIndex};
pub use orders::{OrderKind, OrderSet, sort_descending_by};
pub use reconcile::{AxisDiff, Delays, LinkDiff, NodeChange, ReconcilePlan, diff, should_animate};
pub use render::{CellPlacement, OpacityScale, OpacityScaleKind, RenderPlan, TileHalf, TileStyle, TileType, fill_color, place_cells};
pub use scale::BandScale;
pub use search::{Suggestion, find_exact, suggest};
pub use transition::{
    LARGE_REORDER_SETTLE_MS, Phase, REORDER_SETTLE_MS, Scheduler, TRANSITION_MS, TaskQueue, TransitionEvent,
    TransitionMachine, TransitionTask,
};
pub use views::{ViewRequest, filter_steps, filter_using_nodes, find_view, select_view};
pub use zoom::{Transform, TransformSet, ZoomController, ZoomState};

/// Outcome of an accepted reorder request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Reordered {
    pub generation: u64,
    pub animate: bool,
    pub settle_ms: u64,
}

/// Everything derived from one snapshot; rebuilt as a unit.
#[derive(Clone, Debug)]
struct Layout {
    snapshot: Snapshot,
    matrix: MatrixIndex,
    row_orders: OrderSet,
    col_orders: OrderSet,
    row_scale: BandScale,
    col_scale: BandScale,
    geometry: Geometry,
}

impl Layout {
    fn build(snapshot: Snapshot, config: &Config, window: (f64, f64), order: AxisPair<OrderKind>) -> Result<Self> {
        let geometry = plan_geometry(&snapshot, config, window)?;
        let row_orders = OrderSet::compute(&snapshot.row_nodes);
        let col_orders = OrderSet::compute(&snapshot.col_nodes);
        let row_scale = BandScale::new(permutation(&row_orders, order.row), geometry.matrix_height);
        let col_scale = BandScale::new(permutation(&col_orders, order.col), geometry.matrix_width);

        Ok(Self {
            matrix: MatrixIndex::from_snapshot(&snapshot),
            snapshot,
            row_orders,
            col_orders,
            row_scale,
            col_scale,
            geometry,
        })
    }

    fn orders(&self, axis: Axis) -> &OrderSet {
        match axis {
            Axis::Row => &self.row_orders,
            Axis::Col => &self.col_orders,
        }
    }

    fn scale_mut(&mut self, axis: Axis) -> &mut BandScale {
        match axis {
            Axis::Row => &mut self.row_scale,
            Axis::Col => &mut self.col_scale,
        }
    }
}

fn plan_geometry(snapshot: &Snapshot, config: &Config, window: (f64, f64)) -> Result<Geometry> {
    let (viewport_width, viewport_height) = config.container_size(window.0, window.1);
    plan(
        &Extent {
            viewport_width,
            viewport_height,
            row_count: snapshot.row_nodes.len(),
            col_count: snapshot.col_nodes.len(),
            max_label_chars: AxisPair::new(
                snapshot.max_label_chars(Axis::Row),
                snapshot.max_label_chars(Axis::Col),
            ),
        },
        &GeometryOptions::from_config(config, snapshot.show_dendrogram()),
    )
}

/// The requested permutation, or the cluster order when `class` is missing.
fn permutation(orders: &OrderSet, kind: OrderKind) -> Vec<usize> {
    orders
        .get(kind)
        .or_else(|| orders.get(OrderKind::Clust))
        .map(<[usize]>::to_vec)
        .unwrap_or_default()
}

/// Live clustergram state: the current snapshot, its layout, the zoom and
/// the staged transitions driven by `S`.
pub struct Clustergram<S: Scheduler = TaskQueue> {
    config: Config,
    window: (f64, f64),
    layout: Layout,
    order: AxisPair<OrderKind>,
    zoom: ZoomController,
    transition: TransitionMachine,
    scheduler: S,
    group_level: AxisPair<usize>,
    opacity_slider: f64,
    metrics: Box<dyn TextMetrics>,
}

impl Clustergram<TaskQueue> {
    pub fn new(snapshot: Snapshot, config: Config, window_width: f64, window_height: f64) -> Result<Self> {
        Self::with_scheduler(snapshot, config, window_width, window_height, TaskQueue::new())
    }

    /// Parses a dataset, transposing it when the config asks for it.
    pub fn from_json(raw: &str, config: Config, window_width: f64, window_height: f64) -> Result<Self> {
        let snapshot = load_snapshot(raw, config.transpose)?;
        Self::new(snapshot, config, window_width, window_height)
    }
}

impl<S: Scheduler> Clustergram<S> {
    pub fn with_scheduler(
        snapshot: Snapshot,
        config: Config,
        window_width: f64,
        window_height: f64,
        scheduler: S,
    ) -> Result<Self> {
        let snapshot = match &config.ini_view {
            Some(request) => {
                let request = with_category(request, &config, snapshot.show_categories());
                select_view(&snapshot, &request, snapshot.show_categories())
            }
            None => snapshot,
        };
        let order = AxisPair::new(config.initial_order(Axis::Row), config.initial_order(Axis::Col));
        let window = (window_width, window_height);
        let layout = Layout::build(snapshot, &config, window, order)?;
        let zoom = ZoomController::new(&layout.geometry);

        info!(
            "clustergram ready: {}x{} matrix, {} links, {:.0}x{:.0} px",
            layout.snapshot.row_nodes.len(),
            layout.snapshot.col_nodes.len(),
            layout.snapshot.links.len(),
            layout.geometry.matrix_width,
            layout.geometry.matrix_height
        );

        Ok(Self {
            config,
            window,
            layout,
            order,
            zoom,
            transition: TransitionMachine::default(),
            scheduler,
            group_level: AxisPair::new(DEFAULT_GROUP_LEVEL, DEFAULT_GROUP_LEVEL),
            opacity_slider: 0.0,
            metrics: Box::new(AverageCharWidth::default()),
        })
    }

    pub fn set_text_metrics(&mut self, metrics: Box<dyn TextMetrics>) {
        self.metrics = metrics;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.layout.snapshot
    }

    pub fn geometry(&self) -> &Geometry {
        &self.layout.geometry
    }

    pub fn matrix(&self) -> &MatrixIndex {
        &self.layout.matrix
    }

    pub fn scale(&self, axis: Axis) -> &BandScale {
        match axis {
            Axis::Row => &self.layout.row_scale,
            Axis::Col => &self.layout.col_scale,
        }
    }

    pub fn order(&self, axis: Axis) -> OrderKind {
        self.order.get(axis)
    }

    pub fn zoom_state(&self) -> ZoomState {
        self.zoom.state()
    }

    pub fn is_running(&self) -> bool {
        self.transition.is_running()
    }

    pub fn phase(&self) -> Phase {
        self.transition.phase()
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    fn is_large(&self) -> bool {
        self.layout.snapshot.links.len() > self.config.large_matrix_threshold
    }

    /// Recomputes geometry for a new window size, keeping orders and zoom.
    pub fn resize(&mut self, window_width: f64, window_height: f64) -> Result<TransformSet> {
        let window = (window_width, window_height);
        let geometry = plan_geometry(&self.layout.snapshot, &self.config, window)?;
        self.window = window;
        self.layout.row_scale.rescale(geometry.matrix_height);
        self.layout.col_scale.rescale(geometry.matrix_width);
        self.layout.geometry = geometry;
        Ok(self.zoom.rebind(&self.layout.geometry))
    }

    /// Switches `axis` to a named order. Ignored while a transition runs.
    pub fn reorder(&mut self, axis: Axis, kind: OrderKind) -> Option<Reordered> {
        if self.transition.is_running() {
            debug!("reorder of {axis} ignored while a transition is running");
            return None;
        }
        let domain = permutation(self.layout.orders(axis), kind);
        self.layout.scale_mut(axis).set_domain(domain);
        self.order.set(axis, kind);

        let settle_ms = REORDER_SETTLE_MS;
        let animate = !self.is_large();
        let generation = self.transition.start_reorder(settle_ms, animate, &mut self.scheduler);
        Some(Reordered {
            generation,
            animate,
            settle_ms,
        })
    }

    /// Sorts the other axis by the cell values along the named node.
    pub fn reorder_by_node(&mut self, axis: Axis, name: &str) -> Result<Option<Reordered>> {
        let index = self
            .layout
            .snapshot
            .position_of(axis, name)
            .ok_or_else(|| ClustergramError::UnknownNode {
                axis,
                name: name.to_owned(),
            })?;
        if self.transition.is_running() {
            debug!("reorder by {axis} {name:?} ignored while a transition is running");
            return Ok(None);
        }

        let values = match axis {
            Axis::Row => self.layout.matrix.row_values(index),
            Axis::Col => self.layout.matrix.col_values(index),
        };
        let domain = sort_descending_by(values.len(), |position| values[position]);
        self.layout.scale_mut(axis.other()).set_domain(domain);

        let large = self.is_large();
        let settle_ms = if large {
            LARGE_REORDER_SETTLE_MS
        } else {
            REORDER_SETTLE_MS
        };
        let generation = self.transition.start_reorder(settle_ms, !large, &mut self.scheduler);
        Ok(Some(Reordered {
            generation,
            animate: !large,
            settle_ms,
        }))
    }

    pub fn apply_gesture(&mut self, scale: f64, translate_x: f64, translate_y: f64) -> TransformSet {
        self.zoom.apply_gesture(scale, translate_x, translate_y)
    }

    /// Centers row `index` at `target_zoom`; `None` while a transition runs.
    pub fn focus_row(&mut self, index: usize, target_zoom: f64) -> Option<TransformSet> {
        let scale = &self.layout.row_scale;
        let center = scale.offset(index) + scale.bandwidth() / 2.0;
        self.zoom.focus_on(center, target_zoom, self.transition.is_running())
    }

    /// Exact row search; a hit zooms to the switch level and centers the row.
    pub fn find_row(&mut self, name: &str) -> Result<Option<TransformSet>> {
        let index = find_exact(&self.layout.snapshot.row_nodes, name).ok_or_else(|| {
            ClustergramError::UnknownNode {
                axis: Axis::Row,
                name: name.trim().to_owned(),
            }
        })?;
        let zoom = self.zoom.zoom_switch();
        Ok(self.focus_row(index, zoom))
    }

    pub fn suggest(&self, axis: Axis, query: &str, limit: usize) -> Vec<Suggestion> {
        suggest(self.layout.snapshot.nodes(axis), query, limit)
    }

    pub fn reset_zoom(&mut self) -> TransformSet {
        self.zoom.reset()
    }

    /// Moves to another catalog view and schedules the staged transition.
    pub fn update_view(&mut self, request: &ViewRequest) -> Result<ReconcilePlan> {
        let show_categories = self.layout.snapshot.show_categories();
        let request = with_category(request, &self.config, show_categories);
        let next = select_view(&self.layout.snapshot, &request, show_categories);

        let plan = diff(&self.layout.snapshot, &next, self.config.large_matrix_threshold);
        self.layout = Layout::build(next, &self.config, self.window, self.order)?;
        self.zoom = ZoomController::new(&self.layout.geometry);
        self.transition.start_reconcile(plan.delays, &mut self.scheduler);
        Ok(plan)
    }

    /// Fires every staged task due by `now_ms`.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<TransitionEvent> {
        self.transition.advance_to(now_ms, &mut self.scheduler)
    }

    pub fn set_group_level(&mut self, axis: Axis, level: usize) {
        self.group_level.set(axis, level.min(MAX_GROUP_LEVEL));
    }

    pub fn group_level(&self, axis: Axis) -> usize {
        self.group_level.get(axis)
    }

    pub fn set_opacity_slider(&mut self, slider: f64) {
        self.opacity_slider = slider.clamp(0.0, 1.0);
    }

    pub fn set_category(&mut self, col_cat: impl Into<String>) {
        self.config.current_col_cat = col_cat.into();
    }

    fn node_index(&self, axis: Axis, name: &str) -> Result<usize> {
        self.layout
            .snapshot
            .position_of(axis, name)
            .ok_or_else(|| ClustergramError::UnknownNode {
                axis,
                name: name.to_owned(),
            })
    }

    pub fn group_members(&self, axis: Axis, name: &str) -> Result<Vec<String>> {
        let index = self.node_index(axis, name)?;
        Ok(group_members(self.layout.snapshot.nodes(axis), index, self.group_level.get(axis)))
    }

    pub fn category_breakdown(&self, axis: Axis, name: &str) -> Result<Vec<CategoryCount>> {
        let index = self.node_index(axis, name)?;
        Ok(category_breakdown(self.layout.snapshot.nodes(axis), index, self.group_level.get(axis)))
    }

    pub fn filter_steps(&self, key: FilterKey) -> Vec<FilterValue> {
        filter_steps(&self.layout.snapshot.views, key)
    }

    fn labels(&self, axis: Axis, nodes: &[Node]) -> Vec<LabelPlacement> {
        place_labels(&LabelInputs {
            axis,
            nodes,
            scale: self.scale(axis),
            geometry: &self.layout.geometry,
            zoom: &self.zoom,
            metrics: self.metrics.as_ref(),
            group_level: self.group_level.get(axis),
            bar_max: self.layout.snapshot.max_abs_node_value(axis),
            bar_colors: &self.config.bar_colors,
        })
    }

    pub fn render_plan(&self) -> RenderPlan {
        let layout = &self.layout;
        let tile_type = TileType::for_snapshot(&layout.snapshot);
        let style = TileStyle {
            opacity: OpacityScale::new(
                self.config.opacity_scale,
                &layout.snapshot,
                self.config.input_domain,
                self.opacity_slider,
            ),
            colors: &self.config.tile_colors,
            tile_type,
        };

        RenderPlan {
            geometry: layout.geometry.clone(),
            tile_type,
            zoom: self.zoom.state(),
            transforms: self.zoom.transforms(),
            phase: self.transition.phase(),
            running_transition: self.transition.is_running(),
            animate: self.transition.animates(),
            cells: place_cells(&layout.matrix, &layout.row_scale, &layout.col_scale, &layout.geometry, &style),
            row_labels: self.labels(Axis::Row, &layout.snapshot.row_nodes),
            col_labels: self.labels(Axis::Col, &layout.snapshot.col_nodes),
        }
    }
}

/// Fills in the active column category for keyed requests that omit one.
fn with_category(request: &ViewRequest, config: &Config, show_categories: bool) -> ViewRequest {
    match request {
        ViewRequest::Filter {
            key,
            value,
            enr_score_type,
            col_cat: None,
        } if show_categories => ViewRequest::Filter {
            key: *key,
            value: value.clone(),
            enr_score_type: enr_score_type.clone(),
            col_cat: Some(config.current_col_cat.clone()),
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::network::load_snapshot_value;

    fn dataset() -> Snapshot {
        load_snapshot_value(
            json!({
                "row_nodes": [
                    {"name": "alpha", "ini": 3, "rank": 1, "clust": 2},
                    {"name": "beta", "ini": 2, "rank": 3, "clust": 1},
                    {"name": "gamma", "ini": 1, "rank": 2, "clust": 3}
                ],
                "col_nodes": [
                    {"name": "x", "ini": 2, "rank": 1, "clust": 1},
                    {"name": "y", "ini": 1, "rank": 2, "clust": 2}
                ],
                "links": [
                    {"source": 0, "target": 0, "value": 1.0},
                    {"source": 0, "target": 1, "value": 4.0},
                    {"source": 1, "target": 0, "value": -2.0},
                    {"source": 2, "target": 1, "value": 0.5}
                ],
                "views": [
                    {"N_row_sum": "all", "nodes": {
                        "row_nodes": [{"name": "alpha"}, {"name": "beta"}, {"name": "gamma"}],
                        "col_nodes": [{"name": "x"}, {"name": "y"}]}},
                    {"N_row_sum": 2, "nodes": {
                        "row_nodes": [{"name": "alpha"}, {"name": "delta"}],
                        "col_nodes": [{"name": "x"}, {"name": "y"}]}}
                ]
            }),
            false,
        )
        .expect("valid dataset")
    }

    fn clustergram() -> Clustergram {
        Clustergram::new(dataset(), Config::default(), 900.0, 700.0).expect("valid layout")
    }

    #[test]
    fn named_reorder_moves_bands_and_guards_the_flag() {
        let mut clustergram = clustergram();
        let reordered = clustergram.reorder(Axis::Row, OrderKind::Rank).expect("idle");
        assert!(reordered.animate);
        assert_eq!(clustergram.scale(Axis::Row).domain(), &[1, 2, 0]);
        assert!(clustergram.is_running());
        assert_eq!(clustergram.reorder(Axis::Row, OrderKind::Ini), None);

        clustergram.advance_to(REORDER_SETTLE_MS);
        assert!(!clustergram.is_running());
        assert!(clustergram.reorder(Axis::Row, OrderKind::Ini).is_some());
    }

    #[test]
    fn missing_class_order_falls_back_to_clust() {
        let mut clustergram = clustergram();
        clustergram.reorder(Axis::Col, OrderKind::Class);
        assert_eq!(clustergram.scale(Axis::Col).domain(), &[1, 0]);
    }

    #[test]
    fn reorder_by_row_sorts_columns() {
        let mut clustergram = clustergram();
        clustergram
            .reorder_by_node(Axis::Row, "alpha")
            .expect("known row")
            .expect("idle");
        assert_eq!(clustergram.scale(Axis::Col).domain(), &[1, 0]);

        let error = clustergram.reorder_by_node(Axis::Col, "nope").expect_err("unknown column");
        assert!(matches!(error, ClustergramError::UnknownNode { axis: Axis::Col, .. }));
    }

    #[test]
    fn search_focuses_at_zoom_switch() {
        let mut clustergram = clustergram();
        let transforms = clustergram.find_row("gamma").expect("known row").expect("idle");

        assert_eq!(transforms.matrix.scale_y, clustergram.zoom_state().scale);
        assert!(clustergram.find_row("omega").is_err());

        clustergram.reorder(Axis::Row, OrderKind::Rank);
        assert_eq!(clustergram.find_row("gamma").expect("known row"), None);
    }

    #[test]
    fn view_update_diffs_and_stages() {
        let mut clustergram = clustergram();
        let plan = clustergram
            .update_view(&ViewRequest::filter(FilterKey::TopRowSum, 2.0))
            .expect("valid view");

        assert_eq!(plan.rows.entering, vec!["delta"]);
        assert_eq!(plan.rows.exiting, vec!["beta", "gamma"]);
        assert_eq!(plan.delays, Delays { exit_ms: 1000, enter_ms: 2000, animate: true });
        assert_eq!(clustergram.snapshot().row_nodes.len(), 2);
        assert_eq!(clustergram.snapshot().links.len(), 2);
        assert_eq!(clustergram.phase(), Phase::Exiting);

        clustergram.advance_to(3000);
        assert_eq!(clustergram.phase(), Phase::Settled);
        assert!(!clustergram.is_running());
    }

    #[test]
    fn render_plan_covers_nonzero_cells_and_labels() {
        let clustergram = clustergram();
        let plan = clustergram.render_plan();

        assert_eq!(plan.cells.len(), 4);
        assert_eq!(plan.row_labels.len(), 3);
        assert_eq!(plan.col_labels.len(), 2);
        assert_eq!(plan.tile_type, TileType::Simple);
        assert!(plan.cells.iter().all(|cell| cell.fill_opacity <= 1.0));
        assert_eq!(plan.transforms.matrix, Transform::IDENTITY);
    }

    #[test]
    fn resize_replans_geometry() {
        let mut clustergram = clustergram();
        let before = clustergram.geometry().matrix_width;
        clustergram.resize(1400.0, 700.0).expect("room to grow");
        assert!(clustergram.geometry().matrix_width >= before);
        assert_eq!(clustergram.scale(Axis::Col).range(), clustergram.geometry().matrix_width);
    }
}
