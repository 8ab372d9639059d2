use serde::{Deserialize, Serialize};

use crate::engine::{OpacityScaleKind, OrderKind, ViewRequest};
use crate::error::Result;
use crate::network::Axis;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportSizing {
    /// Fill the host window minus the active outer margins.
    #[default]
    Auto,
    Fixed { width: f64, height: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub row_label_scale: f64,
    pub col_label_scale: f64,
    pub super_label_scale: f64,
    pub row_label: Option<String>,
    pub col_label: Option<String>,
    pub transpose: bool,
    pub tile_colors: [String; 2],
    pub bar_colors: [String; 2],
    pub input_domain: f64,
    pub opacity_scale: OpacityScaleKind,
    pub viewport: ViewportSizing,
    pub outer_margins: Margins,
    pub outer_margins_expand: Option<Margins>,
    pub ini_expand: bool,
    pub grey_border_width: f64,
    pub uni_margin: f64,
    pub force_square: bool,
    pub order: Option<OrderKind>,
    pub row_order: Option<OrderKind>,
    pub col_order: Option<OrderKind>,
    /// Route `row_order` to the column permutation and `col_order` to the
    /// row permutation, matching datasets authored against that wiring.
    pub swap_axis_orders: bool,
    pub ini_view: Option<ViewRequest>,
    pub current_col_cat: String,
    pub large_matrix_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            row_label_scale: 1.0,
            col_label_scale: 1.0,
            super_label_scale: 1.0,
            row_label: None,
            col_label: None,
            transpose: false,
            tile_colors: ["#FF0000".to_owned(), "#1C86EE".to_owned()],
            bar_colors: ["#FF0000".to_owned(), "#1C86EE".to_owned()],
            input_domain: 0.0,
            opacity_scale: OpacityScaleKind::Linear,
            viewport: ViewportSizing::Auto,
            outer_margins: Margins::default(),
            outer_margins_expand: None,
            ini_expand: false,
            grey_border_width: 3.0,
            uni_margin: 4.0,
            force_square: false,
            order: None,
            row_order: None,
            col_order: None,
            swap_axis_orders: false,
            ini_view: None,
            current_col_cat: "all_category".to_owned(),
            large_matrix_threshold: 10_000,
        }
    }
}

impl Config {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn active_margins(&self) -> Margins {
        match (self.ini_expand, self.outer_margins_expand) {
            (true, Some(expanded)) => expanded,
            _ => self.outer_margins,
        }
    }

    /// Size of the drawing container for a host window of the given size.
    pub fn container_size(&self, window_width: f64, window_height: f64) -> (f64, f64) {
        match self.viewport {
            ViewportSizing::Fixed { width, height } => (width, height),
            ViewportSizing::Auto => {
                let margins = self.active_margins();
                (
                    window_width - margins.left - margins.right,
                    window_height - margins.top - margins.bottom,
                )
            }
        }
    }

    pub fn initial_order(&self, axis: Axis) -> OrderKind {
        let shared = self.order.unwrap_or_default();
        let requested = match (axis, self.swap_axis_orders) {
            (Axis::Row, false) | (Axis::Col, true) => self.row_order,
            (Axis::Col, false) | (Axis::Row, true) => self.col_order,
        };
        requested.unwrap_or(shared)
    }

    /// Axis titles after transposition; `None` unless both are set.
    pub fn super_labels(&self) -> Option<(&str, &str)> {
        let row = self.row_label.as_deref()?;
        let col = self.col_label.as_deref()?;
        if self.transpose {
            Some((col, row))
        } else {
            Some((row, col))
        }
    }

    pub fn label_scale(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Row => self.row_label_scale,
            Axis::Col => self.col_label_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = Config::from_json_str(r#"{"row_label_scale": 1.5}"#).expect("valid config");

        assert_eq!(config.row_label_scale, 1.5);
        assert_eq!(config.col_label_scale, 1.0);
        assert_eq!(config.grey_border_width, 3.0);
        assert_eq!(config.large_matrix_threshold, 10_000);
        assert_eq!(config.current_col_cat, "all_category");
        assert_eq!(config.initial_order(Axis::Row), OrderKind::Clust);
    }

    #[test]
    fn per_axis_order_overrides_shared_order() {
        let config = Config::from_json_str(r#"{"order": "rank", "col_order": "ini"}"#)
            .expect("valid config");

        assert_eq!(config.initial_order(Axis::Row), OrderKind::Rank);
        assert_eq!(config.initial_order(Axis::Col), OrderKind::Ini);
    }

    #[test]
    fn swapped_wiring_routes_row_order_to_columns() {
        let config = Config::from_json_str(r#"{"row_order": "rank", "swap_axis_orders": true}"#)
            .expect("valid config");

        assert_eq!(config.initial_order(Axis::Col), OrderKind::Rank);
        assert_eq!(config.initial_order(Axis::Row), OrderKind::Clust);
    }

    #[test]
    fn auto_viewport_subtracts_active_margins() {
        let config = Config::from_json_str(
            r#"{"outer_margins": {"top": 10, "left": 20},
                "outer_margins_expand": {"top": 0, "left": 0},
                "viewport": "auto"}"#,
        )
        .expect("valid config");
        assert_eq!(config.container_size(1000.0, 700.0), (980.0, 690.0));

        let expanded = Config {
            ini_expand: true,
            ..config
        };
        assert_eq!(expanded.container_size(1000.0, 700.0), (1000.0, 700.0));
    }

    #[test]
    fn fixed_viewport_ignores_window() {
        let config = Config::from_json_str(r#"{"viewport": {"fixed": {"width": 800, "height": 600}}}"#)
            .expect("valid config");
        assert_eq!(config.container_size(1920.0, 1080.0), (800.0, 600.0));
    }

    #[test]
    fn super_labels_follow_transpose() {
        let config = Config {
            row_label: Some("genes".to_owned()),
            col_label: Some("samples".to_owned()),
            transpose: true,
            ..Config::default()
        };
        assert_eq!(config.super_labels(), Some(("samples", "genes")));
    }
}
