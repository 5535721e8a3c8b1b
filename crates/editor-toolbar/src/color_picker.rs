use std::rc::Rc;

use tracing::{debug, trace};

use crate::color::{
    Hsv, ParsedColor, Rgb, clamp, hex_to_rgb, hsv_to_hex, parse_color, rgb_to_hex, rgb_to_hsv,
};
use crate::geometry::Rect;
use crate::suppression::{SelectionSuppression, SuppressionGuard};

pub type ColorChangeHandler = Rc<dyn Fn(&str)>;
pub type ColorClearHandler = Rc<dyn Fn()>;
pub type DragStateHandler = Rc<dyn Fn(bool)>;

/// The two draggable surfaces of the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerSurface {
    /// 2D pad: x is saturation, y is inverted value.
    SaturationValue,
    Hue,
}

struct PickerDrag {
    surface: PickerSurface,
    bounds: Rect,
    _suppression: Option<SuppressionGuard>,
}

/// Hex field, saturation/value pad and hue strip over one HSV value.
///
/// Every pointer-driven change reports the new hex right away. A drag
/// keeps following the pointer outside the surface, clamped to its edges,
/// until [`ColorPicker::pointer_up`].
pub struct ColorPicker {
    hsv: Hsv,
    hex_input: String,
    allow_transparent: bool,
    clear_label: String,
    drag: Option<PickerDrag>,
    suppression: Option<SelectionSuppression>,
    on_change: ColorChangeHandler,
    on_clear: Option<ColorClearHandler>,
    on_drag_state_change: Option<DragStateHandler>,
}

impl ColorPicker {
    /// Starts from `value`; anything that is not an RGB color starts from
    /// black.
    pub fn new(value: &str, on_change: impl Fn(&str) + 'static) -> Self {
        let rgb = initial_rgb(value);
        Self {
            hsv: rgb_to_hsv(rgb),
            hex_input: rgb_to_hex(rgb),
            allow_transparent: false,
            clear_label: "Clear".to_string(),
            drag: None,
            suppression: None,
            on_change: Rc::new(on_change),
            on_clear: None,
            on_drag_state_change: None,
        }
    }

    pub fn allow_transparent(mut self, allow: bool) -> Self {
        self.allow_transparent = allow;
        self
    }

    pub fn clear_label(mut self, label: impl Into<String>) -> Self {
        self.clear_label = label.into();
        self
    }

    pub fn on_clear(mut self, handler: impl Fn() + 'static) -> Self {
        self.on_clear = Some(Rc::new(handler));
        self
    }

    pub fn on_drag_state_change(mut self, handler: impl Fn(bool) + 'static) -> Self {
        self.on_drag_state_change = Some(Rc::new(handler));
        self
    }

    /// Text selection is suppressed through `suppression` while dragging.
    pub fn with_suppression(mut self, suppression: SelectionSuppression) -> Self {
        self.suppression = Some(suppression);
        self
    }

    pub fn hsv(&self) -> Hsv {
        self.hsv
    }

    pub fn hex(&self) -> String {
        hsv_to_hex(self.hsv)
    }

    pub fn hex_input(&self) -> &str {
        &self.hex_input
    }

    pub fn clear_button_label(&self) -> Option<&str> {
        (self.allow_transparent || self.on_clear.is_some()).then_some(self.clear_label.as_str())
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Thumb position on the pad as fractions of its width and height.
    pub fn saturation_value_thumb(&self) -> (f64, f64) {
        (self.hsv.s, 1.0 - self.hsv.v)
    }

    pub fn hue_thumb(&self) -> f64 {
        self.hsv.h / 360.0
    }

    pub fn set_hex_input(&mut self, input: impl Into<String>) {
        self.hex_input = input.into();
    }

    /// Commits the hex field (blur or Enter). Invalid input reverts the
    /// field to the current color without reporting a change.
    pub fn commit_hex_input(&mut self) -> bool {
        let input = self.hex_input.trim();
        let candidate = if input.starts_with('#') {
            input.to_string()
        } else {
            format!("#{input}")
        };
        let Some(rgb) = hex_to_rgb(&candidate) else {
            debug!(input = %self.hex_input, "hex input reverted");
            self.hex_input = self.hex();
            return false;
        };

        let hex = rgb_to_hex(rgb);
        self.hsv = rgb_to_hsv(rgb);
        self.hex_input = hex.clone();
        (self.on_change)(&hex);
        true
    }

    pub fn pointer_down(&mut self, surface: PickerSurface, bounds: Rect, x: f32, y: f32) {
        // A second press without a release replaces the first drag.
        self.drag = None;
        let suppression = self
            .suppression
            .as_ref()
            .map(|suppression| suppression.acquire("color picker drag"));
        self.drag = Some(PickerDrag {
            surface,
            bounds,
            _suppression: suppression,
        });
        trace!(?surface, "color picker drag started");
        if let Some(handler) = &self.on_drag_state_change {
            handler(true);
        }
        self.update_from_pointer(surface, bounds, x, y);
    }

    /// Window-level pointer movement. Ignored unless a drag is active.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some(drag) = &self.drag {
            let (surface, bounds) = (drag.surface, drag.bounds);
            self.update_from_pointer(surface, bounds, x, y);
        }
    }

    pub fn pointer_up(&mut self) {
        if self.drag.take().is_none() {
            return;
        }
        trace!("color picker drag ended");
        if let Some(handler) = &self.on_drag_state_change {
            handler(false);
        }
    }

    pub fn clear(&mut self) {
        match &self.on_clear {
            Some(on_clear) => on_clear(),
            None => (self.on_change)("transparent"),
        }
    }

    fn update_from_pointer(&mut self, surface: PickerSurface, bounds: Rect, x: f32, y: f32) {
        let fraction_x = f64::from((x - bounds.left) / bounds.width);
        match surface {
            PickerSurface::SaturationValue => {
                let fraction_y = f64::from((y - bounds.top) / bounds.height);
                let s = clamp(fraction_x, 0.0, 1.0);
                let v = clamp(1.0 - fraction_y, 0.0, 1.0);
                self.apply_hsv(Hsv { s, v, ..self.hsv });
            }
            PickerSurface::Hue => {
                let mut h = clamp(fraction_x * 360.0, 0.0, 360.0);
                if h >= 360.0 {
                    h = 0.0;
                }
                self.apply_hsv(Hsv { h, ..self.hsv });
            }
        }
    }

    fn apply_hsv(&mut self, hsv: Hsv) {
        self.hsv = hsv;
        let hex = hsv_to_hex(hsv);
        self.hex_input = hex.clone();
        (self.on_change)(&hex);
    }
}

fn initial_rgb(value: &str) -> Rgb {
    match parse_color(value) {
        Some(ParsedColor::Rgb(rgb)) => rgb,
        Some(ParsedColor::Transparent) | None => Rgb::BLACK,
    }
}
