//! Display sizing policy.
//!
//! Recomputes the display surface from the space the host offers. The logical
//! resolution never changes here.

use log::debug;

use crate::coords::Viewport;
use crate::device::GpuBackend;
use crate::error::ResourceError;

use super::context::RenderContext;

/// How the logical frame is fitted into the available area.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ResponsiveStrategy {
    /// Fill the available area, optionally preserving aspect ratio.
    Stretch,
    /// Grow by a single factor of at least 1.
    #[default]
    Scale,
}

/// Display size chosen for the current host size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DisplayLayout {
    pub width: f32,
    pub height: f32,
    /// Logical-to-display factor. For a non-uniform stretch this is the
    /// horizontal factor.
    pub scale: f32,
}

impl DisplayLayout {
    #[inline]
    pub fn viewport(self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

/// Pure layout computation.
///
/// `Scale` picks its factor with a literal width-versus-height test of the
/// available area: `ah / lh` when `aw > ah`, otherwise `aw / lw`. On a wide
/// area with a taller logical aspect this can overflow the width; the host is
/// expected to clip.
pub fn compute(
    logical: Viewport,
    available: Viewport,
    strategy: ResponsiveStrategy,
    aspect_lock: bool,
    pixel_perfect: bool,
) -> DisplayLayout {
    let (lw, lh) = (logical.width, logical.height);
    let (aw, ah) = (available.width, available.height);

    match strategy {
        ResponsiveStrategy::Stretch if !aspect_lock => DisplayLayout {
            width: aw,
            height: ah,
            scale: aw / lw,
        },
        ResponsiveStrategy::Stretch => {
            let scale = (aw / lw).min(ah / lh);
            DisplayLayout {
                width: lw * scale,
                height: lh * scale,
                scale,
            }
        }
        ResponsiveStrategy::Scale => {
            let mut scale = if aw > ah { ah / lh } else { aw / lw };
            scale = scale.max(1.0);
            if pixel_perfect {
                scale = scale.floor();
            }
            DisplayLayout {
                width: lw * scale,
                height: lh * scale,
                scale,
            }
        }
    }
}

/// Recomputes the display size for `available` and applies it through
/// [`RenderContext::set_projection`]. Called on host resize only.
pub fn apply<B: GpuBackend>(
    ctx: &mut RenderContext<B>,
    available: Viewport,
) -> Result<DisplayLayout, ResourceError> {
    let logical = ctx.logical_size();
    let policy = ctx.responsive_policy();
    let layout = compute(
        logical,
        available,
        policy.strategy,
        policy.aspect_lock,
        policy.pixel_perfect,
    );

    debug!(
        "responsive layout: available {}x{} -> display {}x{} (scale {})",
        available.width, available.height, layout.width, layout.height, layout.scale
    );

    ctx.set_projection(logical.width, logical.height, Some(layout.viewport()))?;
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use crate::config::StageConfig;
    use crate::device::recording::RecordingBackend;
    use crate::math::AffineMatrix;
    use crate::render::ResponsivePolicy;

    const LOGICAL: Viewport = Viewport::new(400.0, 240.0);

    #[test]
    fn pixel_perfect_scale_floors_the_factor() {
        let layout = compute(
            LOGICAL,
            Viewport::new(850.0, 500.0),
            ResponsiveStrategy::Scale,
            true,
            true,
        );
        assert_eq!(layout.scale, 2.0);
        assert_eq!((layout.width, layout.height), (800.0, 480.0));
    }

    #[test]
    fn scale_without_pixel_perfect_keeps_fraction() {
        let layout = compute(
            LOGICAL,
            Viewport::new(850.0, 500.0),
            ResponsiveStrategy::Scale,
            true,
            false,
        );
        assert_relative_eq!(layout.scale, 500.0 / 240.0);
    }

    #[test]
    fn scale_never_shrinks_below_one() {
        let layout = compute(
            LOGICAL,
            Viewport::new(200.0, 100.0),
            ResponsiveStrategy::Scale,
            true,
            true,
        );
        assert_eq!(layout.scale, 1.0);
        assert_eq!((layout.width, layout.height), (400.0, 240.0));
    }

    #[test]
    fn tall_area_scales_by_width() {
        let layout = compute(
            LOGICAL,
            Viewport::new(1300.0, 2000.0),
            ResponsiveStrategy::Scale,
            true,
            true,
        );
        assert_eq!(layout.scale, 3.0);
    }

    #[test]
    fn stretch_without_lock_fills_area() {
        let layout = compute(
            LOGICAL,
            Viewport::new(1000.0, 300.0),
            ResponsiveStrategy::Stretch,
            false,
            false,
        );
        assert_eq!((layout.width, layout.height), (1000.0, 300.0));
    }

    #[test]
    fn stretch_with_lock_fits_inside() {
        let layout = compute(
            LOGICAL,
            Viewport::new(1000.0, 300.0),
            ResponsiveStrategy::Stretch,
            true,
            false,
        );
        assert_relative_eq!(layout.scale, 1.25);
        assert_relative_eq!(layout.width, 500.0);
        assert_relative_eq!(layout.height, 300.0);
    }

    #[test]
    fn apply_follows_the_installed_policy() {
        let mut ctx =
            RenderContext::new(RecordingBackend::new(), StageConfig::with_view(400.0, 240.0))
                .unwrap();
        ctx.set_responsive_policy(ResponsivePolicy {
            strategy: ResponsiveStrategy::Stretch,
            aspect_lock: false,
            pixel_perfect: false,
        });

        apply(&mut ctx, Viewport::new(1000.0, 300.0)).unwrap();

        assert_eq!(ctx.display_size(), Viewport::new(1000.0, 300.0));
        assert_eq!(
            ctx.display_projection(),
            AffineMatrix::projection(1000.0, 300.0)
        );
    }

    #[test]
    fn apply_resizes_display_but_not_logical() {
        let mut ctx =
            RenderContext::new(RecordingBackend::new(), StageConfig::with_view(400.0, 240.0))
                .unwrap();

        let layout = apply(&mut ctx, Viewport::new(850.0, 500.0)).unwrap();

        assert_eq!(layout.viewport(), Viewport::new(800.0, 480.0));
        assert_eq!(ctx.display_size(), Viewport::new(800.0, 480.0));
        assert_eq!(ctx.logical_size(), LOGICAL);
    }
}
