use serde::{Deserialize, Serialize};

use crate::engine::geometry::Geometry;
use crate::engine::labels::LabelPlacement;
use crate::engine::matrix::{Cell, MatrixIndex};
use crate::engine::scale::BandScale;
use crate::engine::transition::Phase;
use crate::engine::zoom::{TransformSet, ZoomState};
use crate::network::Snapshot;
use crate::util::{LinearScale, LogScale};

const LOG_FLOOR: f64 = 0.001;
const SLIDER_WEIGHT: f64 = 0.9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpacityScaleKind {
    #[default]
    Linear,
    Log,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TileType {
    Simple,
    Updn,
}

impl TileType {
    pub fn for_snapshot(snapshot: &Snapshot) -> Self {
        if snapshot.has_updn_links() {
            Self::Updn
        } else {
            Self::Simple
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Transfer {
    Linear(LinearScale),
    Log(LogScale),
}

/// Maps `|value|` to a fill opacity in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpacityScale {
    transfer: Transfer,
    max: f64,
}

impl OpacityScale {
    /// `input_domain` of zero derives the maximum from the unfiltered links.
    /// `slider` in `[0, 1]` narrows the domain.
    pub fn new(kind: OpacityScaleKind, snapshot: &Snapshot, input_domain: f64, slider: f64) -> Self {
        let base = if input_domain != 0.0 {
            input_domain.abs()
        } else {
            snapshot.max_abs_link()
        };
        Self::with_max(kind, base * (1.0 - SLIDER_WEIGHT * slider.clamp(0.0, 1.0)))
    }

    pub fn with_max(kind: OpacityScaleKind, max: f64) -> Self {
        let transfer = match kind {
            OpacityScaleKind::Linear => Transfer::Linear(LinearScale::new((0.0, max), (0.0, 1.0))),
            OpacityScaleKind::Log => Transfer::Log(LogScale::new((LOG_FLOOR, max), (0.0, 1.0))),
        };
        Self { transfer, max }
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn opacity(&self, value: f64) -> f64 {
        let magnitude = value.abs();
        match self.transfer {
            // A zero domain leaves every non-zero tile fully opaque.
            Transfer::Linear(_) if self.max <= 0.0 => {
                if magnitude > 0.0 { 1.0 } else { 0.0 }
            }
            Transfer::Linear(scale) => scale.map(magnitude),
            Transfer::Log(scale) => scale.map(magnitude),
        }
    }
}

/// Positive values take the first color, negative values the second.
pub fn fill_color(value: f64, colors: &[String; 2]) -> &str {
    if value >= 0.0 { &colors[0] } else { &colors[1] }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileHalf {
    pub y: f64,
    pub height: f64,
    pub value: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellPlacement {
    pub row: usize,
    pub col: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub value: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub highlight: bool,
    pub info: Option<String>,
    /// Up and down halves for `updn` tiles.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub halves: Vec<TileHalf>,
}

pub struct TileStyle<'a> {
    pub opacity: OpacityScale,
    pub colors: &'a [String; 2],
    pub tile_type: TileType,
}

fn place_cell(cell: &Cell, rows: &BandScale, cols: &BandScale, geometry: &Geometry, style: &TileStyle<'_>) -> CellPlacement {
    let x = cols.offset(cell.col);
    let y = rows.offset(cell.row);
    let height = geometry.rect_height;

    let halves = match style.tile_type {
        TileType::Simple => Vec::new(),
        TileType::Updn => [(y, cell.value_up), (y + height / 2.0, cell.value_down)]
            .into_iter()
            .filter(|(_, value)| *value != 0.0)
            .map(|(y, value)| TileHalf {
                y,
                height: height / 2.0,
                value,
                fill_color: fill_color(value, style.colors).to_owned(),
                fill_opacity: style.opacity.opacity(value),
            })
            .collect(),
    };

    CellPlacement {
        row: cell.row,
        col: cell.col,
        x,
        y,
        width: geometry.rect_width,
        height,
        value: cell.value,
        fill_color: fill_color(cell.value, style.colors).to_owned(),
        fill_opacity: style.opacity.opacity(cell.value),
        highlight: cell.highlight != 0,
        info: cell.info.clone(),
        halves,
    }
}

/// Non-zero tiles, row-major by logical index.
pub fn place_cells(
    matrix: &MatrixIndex,
    rows: &BandScale,
    cols: &BandScale,
    geometry: &Geometry,
    style: &TileStyle<'_>,
) -> Vec<CellPlacement> {
    matrix
        .nonzero_cells()
        .map(|cell| place_cell(cell, rows, cols, geometry, style))
        .collect()
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderPlan {
    pub geometry: Geometry,
    pub tile_type: TileType,
    pub zoom: ZoomState,
    pub transforms: TransformSet,
    pub phase: Phase,
    pub running_transition: bool,
    pub animate: bool,
    pub cells: Vec<CellPlacement>,
    pub row_labels: Vec<LabelPlacement>,
    pub col_labels: Vec<LabelPlacement>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::{AxisPair, Extent, GeometryOptions, plan};
    use crate::network::Link;

    fn colors() -> [String; 2] {
        ["#FF0000".to_owned(), "#1C86EE".to_owned()]
    }

    fn link(source: usize, target: usize, value: f64, up: Option<f64>, down: Option<f64>) -> Link {
        Link {
            source,
            target,
            row_name: format!("r{source}"),
            col_name: format!("c{target}"),
            value,
            value_up: up,
            value_down: down,
            highlight: Some(1),
            info: None,
        }
    }

    #[test]
    fn linear_opacity_is_clamped() {
        let scale = OpacityScale::with_max(OpacityScaleKind::Linear, 4.0);
        assert_eq!(scale.opacity(2.0), 0.5);
        assert_eq!(scale.opacity(-2.0), 0.5);
        assert_eq!(scale.opacity(9.0), 1.0);
    }

    #[test]
    fn log_opacity_saturates_at_max() {
        let scale = OpacityScale::with_max(OpacityScaleKind::Log, 10.0);
        assert!((scale.opacity(10.0) - 1.0).abs() < 1e-12);
        assert!(scale.opacity(0.01) < scale.opacity(1.0));
        assert_eq!(scale.opacity(0.0), 0.0);
    }

    #[test]
    fn slider_and_input_domain_shape_the_maximum() {
        let snapshot = Snapshot {
            row_nodes: Vec::new(),
            col_nodes: Vec::new(),
            links: vec![link(0, 0, -5.0, None, None)],
            all_links: Default::default(),
            views: Default::default(),
        };

        assert_eq!(OpacityScale::new(OpacityScaleKind::Linear, &snapshot, 0.0, 0.0).max(), 5.0);
        assert_eq!(OpacityScale::new(OpacityScaleKind::Linear, &snapshot, 2.0, 0.0).max(), 2.0);
        let narrowed = OpacityScale::new(OpacityScaleKind::Linear, &snapshot, 0.0, 1.0).max();
        assert!((narrowed - 0.5).abs() < 1e-12);
    }

    #[test]
    fn colors_follow_sign() {
        let colors = colors();
        assert_eq!(fill_color(1.0, &colors), "#FF0000");
        assert_eq!(fill_color(-1.0, &colors), "#1C86EE");
    }

    #[test]
    fn updn_tiles_split_into_halves() {
        let geometry = plan(
            &Extent {
                viewport_width: 800.0,
                viewport_height: 600.0,
                row_count: 2,
                col_count: 2,
                max_label_chars: AxisPair::new(4, 4),
            },
            &GeometryOptions::default(),
        )
        .expect("valid geometry");
        let matrix = MatrixIndex::build(2, 2, &[link(1, 0, 1.0, Some(3.0), Some(-2.0))]);
        let rows = BandScale::new(vec![1, 0], geometry.matrix_height);
        let cols = BandScale::new(vec![0, 1], geometry.matrix_width);
        let colors = colors();
        let style = TileStyle {
            opacity: OpacityScale::with_max(OpacityScaleKind::Linear, 3.0),
            colors: &colors,
            tile_type: TileType::Updn,
        };

        let cells = place_cells(&matrix, &rows, &cols, &geometry, &style);
        assert_eq!(cells.len(), 1);
        let cell = &cells[0];
        assert_eq!((cell.row, cell.col, cell.y), (1, 0, 0.0));
        assert!(cell.highlight);
        assert_eq!(cell.halves.len(), 2);
        assert_eq!(cell.halves[0].fill_color, "#FF0000");
        assert_eq!(cell.halves[1].fill_color, "#1C86EE");
        assert_eq!(cell.halves[1].y, geometry.rect_height / 2.0);
    }
}
