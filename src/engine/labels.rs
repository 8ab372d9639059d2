use serde::Serialize;

use crate::engine::geometry::{Geometry, MAX_LABEL_CHARS};
use crate::engine::render::fill_color;
use crate::engine::scale::BandScale;
use crate::engine::zoom::ZoomController;
use crate::network::{Axis, Node};
use crate::util::{LinearScale, display_name, truncate_chars};

const ROW_TRIM_FRACTION: f64 = 0.9;
const COL_BAR_FRACTION: f64 = 0.75;
/// Characters given up to the trailing marker when trimming.
const TRIM_RESERVE: usize = 3;

/// Measures rendered text; the renderer owns the real font.
pub trait TextMetrics {
    fn text_width(&self, text: &str, font_size: f64) -> f64;
}

/// Every glyph is `ratio × font_size` wide.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AverageCharWidth(pub f64);

impl Default for AverageCharWidth {
    fn default() -> Self {
        Self(0.6)
    }
}

impl TextMetrics for AverageCharWidth {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabelPlacement {
    pub index: usize,
    pub name: String,
    pub text: String,
    pub offset: f64,
    pub font_size: f64,
    pub truncated: bool,
    pub group: Option<i64>,
    pub bar_width: Option<f64>,
    pub bar_color: Option<String>,
}

/// How labels on one axis are sized at the current zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontPolicy {
    pub font_size: f64,
    pub trim: Option<TrimRule>,
}

/// Cut labels whose on-screen width at `zoom` passes `max_width`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrimRule {
    pub max_width: f64,
    pub zoom: f64,
}

fn axis_zoom(axis: Axis, zoom: &ZoomController) -> f64 {
    match axis {
        Axis::Row => zoom.zoom_y(),
        Axis::Col => zoom.state().scale / zoom.zoom_switch(),
    }
}

pub fn font_policy(
    axis: Axis,
    nodes: &[Node],
    geometry: &Geometry,
    zoom: &ZoomController,
    metrics: &dyn TextMetrics,
) -> FontPolicy {
    let default_font = geometry.default_font.get(axis);
    let allotted = geometry.label_width.get(axis);
    let scale = axis_zoom(axis, zoom);

    let widest = |cut: usize| {
        nodes
            .iter()
            .map(|node| metrics.text_width(&display_name(&node.name, cut).0, default_font))
            .fold(0.0, f64::max)
    };

    // The keep fraction already accounts for display truncation.
    let untruncated = widest(usize::MAX);
    let keep_width = untruncated * geometry.label_keep.get(axis) * scale;
    if keep_width > allotted {
        return FontPolicy {
            font_size: default_font * allotted / keep_width,
            trim: None,
        };
    }

    let needs_trim = geometry.label_keep.get(axis) < 1.0 || untruncated > allotted;
    let max_width = match axis {
        Axis::Row => allotted * ROW_TRIM_FRACTION,
        Axis::Col => allotted,
    };
    FontPolicy {
        font_size: default_font,
        trim: needs_trim.then_some(TrimRule { max_width, zoom: scale }),
    }
}

fn trim_text(text: String, font_size: f64, rule: TrimRule, metrics: &dyn TextMetrics) -> (String, bool) {
    let actual = metrics.text_width(&text, font_size) * rule.zoom;
    if actual <= rule.max_width || actual <= 0.0 {
        return (text, false);
    }
    let length = text.chars().count() as f64;
    let keep = ((length * rule.max_width / actual).floor() as usize).saturating_sub(TRIM_RESERVE);
    (truncate_chars(&text, keep), true)
}

/// Value-bar scale for an axis; `max_value` is the largest absolute node value.
pub fn bar_scale(axis: Axis, max_value: Option<f64>, geometry: &Geometry) -> Option<LinearScale> {
    let max = max_value?;
    let extent = match axis {
        Axis::Row => geometry.label_width.row,
        Axis::Col => COL_BAR_FRACTION * geometry.label_width.col,
    };
    Some(LinearScale::new((0.0, max), (0.0, extent)))
}

pub struct LabelInputs<'a> {
    pub axis: Axis,
    pub nodes: &'a [Node],
    pub scale: &'a BandScale,
    pub geometry: &'a Geometry,
    pub zoom: &'a ZoomController,
    pub metrics: &'a dyn TextMetrics,
    pub group_level: usize,
    pub bar_max: Option<f64>,
    pub bar_colors: &'a [String; 2],
}

/// Labels in node order with their band offsets and display text.
pub fn place_labels(inputs: &LabelInputs<'_>) -> Vec<LabelPlacement> {
    let LabelInputs {
        axis,
        nodes,
        scale,
        geometry,
        zoom,
        metrics,
        group_level,
        bar_max,
        bar_colors,
    } = *inputs;

    let policy = font_policy(axis, nodes, geometry, zoom, metrics);
    let bars = bar_scale(axis, bar_max, geometry);
    let bar_zoom = match axis {
        Axis::Row => zoom.zoom_y(),
        Axis::Col => zoom.zoom_x(),
    };

    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let (text, mut truncated) = display_name(&node.name, MAX_LABEL_CHARS);
            let text = match policy.trim {
                Some(rule) => {
                    let (text, trimmed) = trim_text(text, policy.font_size, rule, metrics);
                    truncated |= trimmed;
                    text
                }
                None => text,
            };

            LabelPlacement {
                index,
                name: node.name.clone(),
                text,
                offset: scale.offset(index),
                font_size: policy.font_size,
                truncated,
                group: node.group.as_ref().and_then(|group| group.at(group_level)),
                bar_width: bars
                    .zip(node.value)
                    .map(|(bars, value)| bars.map(value.abs()) / bar_zoom),
                bar_color: node.value.map(|value| fill_color(value, bar_colors).to_owned()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::{AxisPair, Extent, GeometryOptions, plan};
    use crate::network::DendroGroup;

    fn geometry(rows: usize, row_chars: usize) -> Geometry {
        plan(
            &Extent {
                viewport_width: 800.0,
                viewport_height: 600.0,
                row_count: rows,
                col_count: 10,
                max_label_chars: AxisPair::new(row_chars, 6),
            },
            &GeometryOptions::default(),
        )
        .expect("valid geometry")
    }

    fn nodes(names: &[&str]) -> Vec<Node> {
        names.iter().map(|name| Node::named(*name)).collect()
    }

    fn colors() -> [String; 2] {
        ["red".to_owned(), "blue".to_owned()]
    }

    #[test]
    fn short_labels_keep_default_font() {
        let geometry = geometry(40, 4);
        let zoom = ZoomController::new(&geometry);
        let nodes = nodes(&["A1", "B22", "C333"]);

        let policy = font_policy(Axis::Row, &nodes, &geometry, &zoom, &AverageCharWidth::default());
        assert_eq!(policy.font_size, geometry.default_font.row);
        assert_eq!(policy.trim, None);
    }

    #[test]
    fn font_shrinks_when_zoomed_labels_overflow() {
        let name = "ABCDEFGHIJKLMNOPQRST";
        let geometry = geometry(40, 20);
        assert_eq!(geometry.label_keep.row, 0.5);
        let mut zoom = ZoomController::new(&geometry);
        let nodes = nodes(&[name]);
        let metrics = AverageCharWidth::default();

        let policy = font_policy(Axis::Row, &nodes, &geometry, &zoom, &metrics);
        assert_eq!(policy.font_size, geometry.default_font.row);
        assert!(policy.trim.is_some());

        zoom.apply_gesture(zoom.max_zoom(), 0.0, 0.0);
        let policy = font_policy(Axis::Row, &nodes, &geometry, &zoom, &metrics);
        assert!(policy.font_size < geometry.default_font.row);
        assert_eq!(policy.trim, None);
        let kept = metrics.text_width(name, policy.font_size) * 0.5 * zoom.zoom_y();
        assert!((kept - geometry.label_width.row).abs() < 1e-9);
    }

    #[test]
    fn long_names_are_cut_for_display() {
        let geometry = geometry(40, 14);
        let zoom = ZoomController::new(&geometry);
        let nodes = nodes(&["TRANSCRIPTION_FACTOR_7", "AB"]);
        let band = BandScale::new(vec![1, 0], geometry.matrix_height);

        let labels = place_labels(&LabelInputs {
            axis: Axis::Row,
            nodes: &nodes,
            scale: &band,
            geometry: &geometry,
            zoom: &zoom,
            metrics: &AverageCharWidth::default(),
            group_level: 5,
            bar_max: None,
            bar_colors: &colors(),
        });

        assert_eq!(labels[0].bar_color, None);
        assert!(labels[0].truncated);
        assert!(labels[0].text.ends_with(".."));
        assert!(labels[0].text.chars().count() <= MAX_LABEL_CHARS + 2);
        assert_eq!(labels[1].text, "AB");
        assert!(!labels[1].truncated);
        assert_eq!(labels[1].offset, 0.0);
        assert_eq!(labels[0].offset, band.bandwidth());
    }

    #[test]
    fn trimming_respects_on_screen_budget() {
        let metrics = AverageCharWidth(1.0);
        let rule = TrimRule {
            max_width: 50.0,
            zoom: 1.0,
        };

        let (text, trimmed) = trim_text("abcdefghij".to_owned(), 10.0, rule, &metrics);
        assert!(trimmed);
        assert_eq!(text, "ab..");

        let (text, trimmed) = trim_text("abcd".to_owned(), 10.0, rule, &metrics);
        assert!(!trimmed);
        assert_eq!(text, "abcd");
    }

    #[test]
    fn labels_carry_group_and_value_bar() {
        let geometry = geometry(2, 4);
        let mut zoom = ZoomController::new(&geometry);
        let mut nodes = nodes(&["up", "down"]);
        nodes[0].value = Some(4.0);
        nodes[1].value = Some(-2.0);
        nodes[0].group = Some(DendroGroup(vec![1, 2, 3]));
        let band = BandScale::new(vec![0, 1], geometry.matrix_height);
        zoom.apply_gesture(2.0, 0.0, 0.0);

        let labels = place_labels(&LabelInputs {
            axis: Axis::Row,
            nodes: &nodes,
            scale: &band,
            geometry: &geometry,
            zoom: &zoom,
            metrics: &AverageCharWidth::default(),
            group_level: 1,
            bar_max: Some(4.0),
            bar_colors: &colors(),
        });

        assert_eq!(labels[0].group, Some(2));
        assert_eq!(labels[1].group, None);
        let full = geometry.label_width.row / zoom.zoom_y();
        assert_eq!(labels[0].bar_width, Some(full));
        assert_eq!(labels[1].bar_width, Some(full / 2.0));
        assert_eq!(labels[0].bar_color.as_deref(), Some("red"));
        assert_eq!(labels[1].bar_color.as_deref(), Some("blue"));
    }
}
