use std::ops::{Deref, DerefMut};

use crate::foundation::core::Frame;
use crate::foundation::error::OvermarkResult;
use crate::render::composite::over_at;

/// Drawable frame with a global opacity multiplier applied to every layer drawn onto it.
#[derive(Debug)]
pub struct Surface {
    frame: Frame,
    opacity: f32,
}

impl Surface {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            opacity: 1.0,
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }

    /// Current global opacity in `[0, 1]`.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set the global opacity until the returned scope is dropped.
    ///
    /// The previous value comes back on drop, whether the caller returns normally, bails out
    /// with `?`, or unwinds.
    pub fn scoped_opacity(&mut self, alpha: f32) -> OpacityScope<'_> {
        let previous = self.opacity;
        self.opacity = alpha.clamp(0.0, 1.0);
        OpacityScope {
            surface: self,
            previous,
        }
    }

    /// Run `f` with the global opacity set to `alpha`.
    pub fn with_opacity<T>(&mut self, alpha: f32, f: impl FnOnce(&mut Surface) -> T) -> T {
        let mut scope = self.scoped_opacity(alpha);
        f(&mut scope)
    }

    /// Composite a premultiplied layer with its top-left corner at `(x, y)`.
    ///
    /// Pixels outside the surface are clipped.
    pub fn draw_layer(&mut self, x: i64, y: i64, layer: &Frame) -> OvermarkResult<()> {
        let (w, h) = (self.frame.width, self.frame.height);
        over_at(
            &mut self.frame.data,
            w,
            h,
            &layer.data,
            layer.width,
            layer.height,
            (x, y),
            self.opacity,
        )
    }
}

/// Guard returned by [`Surface::scoped_opacity`].
pub struct OpacityScope<'a> {
    surface: &'a mut Surface,
    previous: f32,
}

impl Deref for OpacityScope<'_> {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        self.surface
    }
}

impl DerefMut for OpacityScope<'_> {
    fn deref_mut(&mut self) -> &mut Surface {
        self.surface
    }
}

impl Drop for OpacityScope<'_> {
    fn drop(&mut self) {
        self.surface.opacity = self.previous;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
