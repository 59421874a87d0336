use egui::{Pos2, Vec2};

pub const MIN_SCALE: f32 = 0.3;
pub const MAX_SCALE: f32 = 3.0;

/// Scale and offset mapping model space onto the canvas.
///
/// The scale is applied around the canvas center and the offset is a plain
/// translation on top: `screen = center + (model - center) * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scale: f32,
    pub offset: Vec2,
}

impl Default for Viewport {
    fn default() -> Self { Self { scale: 1.0, offset: Vec2::ZERO } }
}

impl Viewport {
    pub fn new(scale: f32, offset: Vec2) -> Self {
        Self { scale: clamp_scale(scale), offset }
    }

    pub fn scale(&self) -> f32 { self.scale }

    pub fn set_scale(&mut self, scale: f32) { self.scale = clamp_scale(scale); }

    // Multiplicative zoom, clamped to the allowed range
    pub fn zoom_by(&mut self, factor: f32) {
        // NaN or infinite factors leave the scale unchanged
        if factor.is_finite() {
            self.set_scale(self.scale * factor);
        }
    }

    pub fn reset(&mut self) { *self = Self::default(); }

    pub fn to_screen(&self, p: Pos2, center: Pos2) -> Pos2 {
        Pos2::new(
            (p.x - center.x) * self.scale + center.x + self.offset.x,
            (p.y - center.y) * self.scale + center.y + self.offset.y,
        )
    }

    pub fn from_screen(&self, p: Pos2, center: Pos2) -> Pos2 {
        Pos2::new(
            ((p.x - self.offset.x) - center.x) / self.scale + center.x,
            ((p.y - self.offset.y) - center.y) / self.scale + center.y,
        )
    }
}

fn clamp_scale(scale: f32) -> f32 {
    // NaN would poison every later transform
    if scale.is_nan() { return 1.0; }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}
