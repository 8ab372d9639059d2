use log::debug;
use serde::Serialize;

use crate::engine::geometry::Geometry;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ZoomState {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Transform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
    };
}

/// Transforms for the matrix group and each container drawn around it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TransformSet {
    pub matrix: Transform,
    /// Row labels and row category bars: vertical pan and zoom only.
    pub row_labels: Transform,
    /// Column labels grow isotropically with the column zoom.
    pub col_labels: Transform,
    pub col_bars: Transform,
}

impl TransformSet {
    fn new(translate_x: f64, translate_y: f64, zoom_x: f64, zoom_y: f64) -> Self {
        Self {
            matrix: Transform {
                translate_x,
                translate_y,
                scale_x: zoom_x,
                scale_y: zoom_y,
            },
            row_labels: Transform {
                translate_x: 0.0,
                translate_y,
                scale_x: 1.0,
                scale_y: zoom_y,
            },
            col_labels: Transform {
                translate_x,
                translate_y: 0.0,
                scale_x: zoom_x,
                scale_y: zoom_x,
            },
            col_bars: Transform {
                translate_x,
                translate_y: 0.0,
                scale_x: zoom_x,
                scale_y: 1.0,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ZoomController {
    state: ZoomState,
    matrix_width: f64,
    matrix_height: f64,
    zoom_switch: f64,
    max_zoom: f64,
}

impl ZoomController {
    pub fn new(geometry: &Geometry) -> Self {
        Self {
            state: ZoomState::default(),
            matrix_width: geometry.matrix_width,
            matrix_height: geometry.matrix_height,
            zoom_switch: geometry.zoom_switch,
            max_zoom: geometry.max_zoom(),
        }
    }

    /// Rebinds to a new geometry and re-clamps the current state against it.
    pub fn rebind(&mut self, geometry: &Geometry) -> TransformSet {
        let ZoomState {
            scale,
            translate_x,
            translate_y,
        } = self.state;
        *self = Self::new(geometry);
        self.apply_gesture(scale, translate_x, translate_y)
    }

    pub fn state(&self) -> ZoomState {
        self.state
    }

    pub fn zoom_switch(&self) -> f64 {
        self.zoom_switch
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Horizontal zoom factor; stays at 1 until the scale passes the switch.
    pub fn zoom_x(&self) -> f64 {
        if self.state.scale < self.zoom_switch {
            1.0
        } else {
            self.state.scale / self.zoom_switch
        }
    }

    pub fn zoom_y(&self) -> f64 {
        self.state.scale
    }

    /// Clamps a raw gesture into the allowed pan window and stores it.
    ///
    /// Translations are relative to the matrix origin.
    pub fn apply_gesture(&mut self, scale: f64, translate_x: f64, translate_y: f64) -> TransformSet {
        let scale = if scale.is_finite() {
            scale.clamp(1.0, self.max_zoom)
        } else {
            1.0
        };

        let min_y = -(scale - 1.0) * self.matrix_height;
        let translate_y = clamp_pan(translate_y, min_y);

        let (translate_x, zoom_x) = if scale < self.zoom_switch {
            (0.0, 1.0)
        } else {
            let zoom_x = scale / self.zoom_switch;
            let min_x = -(zoom_x - 1.0) * self.matrix_width;
            (clamp_pan(translate_x, min_x), zoom_x)
        };

        self.state = ZoomState {
            scale,
            translate_x,
            translate_y,
        };
        TransformSet::new(translate_x, translate_y, zoom_x, scale)
    }

    /// Centers the band whose middle sits at `band_center` (unzoomed matrix
    /// pixels) at `target_zoom`. Refused while a transition is running.
    pub fn focus_on(
        &mut self,
        band_center: f64,
        target_zoom: f64,
        transition_running: bool,
    ) -> Option<TransformSet> {
        if transition_running {
            debug!("focus request ignored while a transition is running");
            return None;
        }
        let scale = if target_zoom.is_finite() {
            target_zoom.clamp(1.0, self.max_zoom)
        } else {
            1.0
        };
        let translate_y = self.matrix_height / 2.0 - scale * band_center;
        Some(self.apply_gesture(scale, 0.0, translate_y))
    }

    pub fn reset(&mut self) -> TransformSet {
        self.state = ZoomState::default();
        self.transforms()
    }

    pub fn transforms(&self) -> TransformSet {
        TransformSet::new(
            self.state.translate_x,
            self.state.translate_y,
            self.zoom_x(),
            self.zoom_y(),
        )
    }
}

fn clamp_pan(value: f64, min: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min.min(0.0), 0.0)
    } else {
        0.0
    }
}
