use log::debug;
use serde::Serialize;

use crate::config::Config;
use crate::error::{ClustergramError, Result};
use crate::network::Axis;
use crate::util::LinearScale;

const MIN_LABEL_CHARS: f64 = 5.0;
/// Labels longer than this are cut for display.
pub const MAX_LABEL_CHARS: usize = 10;
const MIN_LABEL_WIDTH: f64 = 65.0;
const MAX_LABEL_WIDTH: f64 = 115.0;
const SPILLOVER_FRACTION: f64 = 0.7;
const SUPER_LABEL_WIDTH: f64 = 20.0;
const SYMBOL_WIDTH: f64 = 11.0;
const BORDER_FRACTION: f64 = 55.0;
const ROW_FONT_FACTOR: f64 = 1.01;
const COL_FONT_FACTOR: f64 = 0.87;
const BOTTOM_BORDER_MULTIPLE: f64 = 5.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AxisPair<T> {
    pub row: T,
    pub col: T,
}

impl<T: Copy> AxisPair<T> {
    pub fn new(row: T, col: T) -> Self {
        Self { row, col }
    }

    pub fn get(&self, axis: Axis) -> T {
        match axis {
            Axis::Row => self.row,
            Axis::Col => self.col,
        }
    }

    pub fn set(&mut self, axis: Axis, value: T) {
        match axis {
            Axis::Row => self.row = value,
            Axis::Col => self.col = value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Offset {
    pub left: f64,
    pub top: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryOptions {
    pub label_scale: AxisPair<f64>,
    pub super_label_scale: f64,
    pub super_labels: bool,
    pub grey_border_width: f64,
    pub uni_margin: f64,
    pub force_square: bool,
    pub show_dendrogram: bool,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            label_scale: AxisPair::new(1.0, 1.0),
            super_label_scale: 1.0,
            super_labels: false,
            grey_border_width: 3.0,
            uni_margin: 4.0,
            force_square: false,
            show_dendrogram: false,
        }
    }
}

impl GeometryOptions {
    pub fn from_config(config: &Config, show_dendrogram: bool) -> Self {
        Self {
            label_scale: AxisPair::new(config.label_scale(Axis::Row), config.label_scale(Axis::Col)),
            super_label_scale: config.super_label_scale,
            super_labels: config.super_labels().is_some(),
            grey_border_width: config.grey_border_width,
            uni_margin: config.uni_margin,
            force_square: config.force_square,
            show_dendrogram,
        }
    }
}

/// What the planner needs to know about the current dataset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub row_count: usize,
    pub col_count: usize,
    pub max_label_chars: AxisPair<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Geometry {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub row_count: usize,
    pub col_count: usize,
    pub matrix_width: f64,
    pub matrix_height: f64,
    /// Band width of one column.
    pub cell_width: f64,
    /// Band height of one row.
    pub cell_height: f64,
    pub rect_width: f64,
    pub rect_height: f64,
    pub border_width: f64,
    pub label_width: AxisPair<f64>,
    pub label_keep: AxisPair<f64>,
    pub super_label_width: f64,
    pub class_room: AxisPair<f64>,
    pub label_background: AxisPair<f64>,
    pub label_margin: Offset,
    pub matrix_margin: Offset,
    pub spillover_x_offset: f64,
    pub force_square: bool,
    pub zoom_switch: f64,
    pub real_zoom: f64,
    pub default_font: AxisPair<f64>,
}

impl Geometry {
    pub fn max_zoom(&self) -> f64 {
        (self.real_zoom * self.zoom_switch).max(1.0)
    }

    pub fn band(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Row => self.cell_height,
            Axis::Col => self.cell_width,
        }
    }

    pub fn matrix_extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Row => self.matrix_height,
            Axis::Col => self.matrix_width,
        }
    }
}

pub fn label_width_for(max_chars: usize, scale: f64) -> f64 {
    LinearScale::new(
        (MIN_LABEL_CHARS, MAX_LABEL_CHARS as f64),
        (MIN_LABEL_WIDTH, MAX_LABEL_WIDTH),
    )
    .map(max_chars as f64)
        * scale
}

/// Share of the longest label that survives display truncation.
pub fn label_keep_for(max_chars: usize) -> f64 {
    if max_chars <= MAX_LABEL_CHARS {
        1.0
    } else {
        MAX_LABEL_CHARS as f64 / max_chars as f64
    }
}

pub fn plan(extent: &Extent, options: &GeometryOptions) -> Result<Geometry> {
    let Extent {
        viewport_width,
        viewport_height,
        row_count,
        col_count,
        max_label_chars,
    } = *extent;

    if row_count == 0 || col_count == 0 {
        return Err(ClustergramError::InvalidDataset(format!(
            "matrix needs at least one row and one column, got {row_count}x{col_count}"
        )));
    }
    if !viewport_width.is_finite() || !viewport_height.is_finite() {
        return Err(ClustergramError::DegenerateViewport {
            width: viewport_width,
            height: viewport_height,
        });
    }

    let label_width = AxisPair::new(
        label_width_for(max_label_chars.row, options.label_scale.row),
        label_width_for(max_label_chars.col, options.label_scale.col),
    );
    let label_keep = AxisPair::new(
        label_keep_for(max_label_chars.row),
        label_keep_for(max_label_chars.col),
    );

    let super_label_width = if options.super_labels {
        SUPER_LABEL_WIDTH * options.super_label_scale
    } else {
        0.0
    };

    let class_room = if options.show_dendrogram {
        AxisPair::new(2.0 * SYMBOL_WIDTH, SYMBOL_WIDTH)
    } else {
        AxisPair::new(SYMBOL_WIDTH, 0.0)
    };

    let label_background = AxisPair::new(
        label_width.row + class_room.row + options.uni_margin,
        label_width.col + class_room.col + options.uni_margin,
    );
    let label_margin = Offset {
        left: options.grey_border_width + super_label_width,
        top: options.grey_border_width + super_label_width,
    };
    let matrix_margin = Offset {
        left: label_margin.left + label_background.row,
        top: label_margin.top + label_background.col,
    };
    let spillover_x_offset = label_width.col * SPILLOVER_FRACTION;

    let mut matrix_width = viewport_width
        - (super_label_width + label_width.row + class_room.row)
        - options.grey_border_width
        - spillover_x_offset;
    let available_height = viewport_height
        - (super_label_width + label_width.col + class_room.col)
        - BOTTOM_BORDER_MULTIPLE * options.grey_border_width;

    if matrix_width <= 0.0 || available_height <= 0.0 {
        return Err(ClustergramError::DegenerateViewport {
            width: viewport_width,
            height: viewport_height,
        });
    }

    let rows = row_count as f64;
    let cols = col_count as f64;

    // Rotated column labels must fit under the column label band.
    let triangle_height = matrix_width / cols / 2.0;
    if triangle_height > label_width.col {
        matrix_width *= label_width.col / triangle_height;
    }

    let (matrix_height, mut force_square) = if matrix_width / cols < available_height / rows {
        let square_height = matrix_width * (rows / cols);
        if square_height > available_height {
            (available_height, false)
        } else {
            (square_height, true)
        }
    } else {
        (available_height, false)
    };
    if options.force_square {
        force_square = true;
    }

    let cell_width = matrix_width / cols;
    let cell_height = matrix_height / rows;
    let zoom_switch = (cell_width / cell_height).max(1.0);
    let border_width = cell_width / BORDER_FRACTION;

    let geometry = Geometry {
        viewport_width,
        viewport_height,
        row_count,
        col_count,
        matrix_width,
        matrix_height,
        cell_width,
        cell_height,
        rect_width: cell_width - border_width,
        rect_height: cell_height - border_width / zoom_switch,
        border_width,
        label_width,
        label_keep,
        super_label_width,
        class_room,
        label_background,
        label_margin,
        matrix_margin,
        spillover_x_offset,
        force_square,
        zoom_switch,
        real_zoom: label_width.col / (cell_width / 2.0),
        default_font: AxisPair::new(cell_height * ROW_FONT_FACTOR, cell_width * COL_FONT_FACTOR),
    };

    debug!(
        "planned geometry: matrix {:.1}x{:.1} for {}x{} cells, zoom switch {:.3}, force square {}",
        geometry.matrix_width,
        geometry.matrix_height,
        row_count,
        col_count,
        geometry.zoom_switch,
        geometry.force_square
    );

    Ok(geometry)
}
