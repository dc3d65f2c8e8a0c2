//! Atmospheric glow halo
//!
//! A single radial-gradient circle centered on the glow surface, sized to
//! roughly 1.5x the projected globe radius.

use crate::camera::Projection;
use crate::color::Rgba;
use crate::config::ColorStops;
use glam::Vec2;
use serde::Serialize;
use std::f64::consts::PI;

/// Radius used whenever the camera projection is unavailable
pub const DEFAULT_GLOW_RADIUS: f32 = 200.0;

/// Glow extends this far past the globe edge
const GLOW_SCALE: f64 = 1.5;

/// Blur extent as a fraction of the radius
const BLUR_FRACTION: f32 = 0.1;

/// Initial radius as a fraction of the smaller surface side, before any projection is seen
const VIEWPORT_FRACTION: f32 = 0.1;

/// Gradient stop offsets for inner, middle, outer and fade colors
pub const STOP_OFFSETS: [f32; 4] = [0.0, 0.3, 0.6, 1.0];

/// Projected globe radius in pixels.
///
/// Diverges as the latitude approaches +/-90 degrees; no clamp is applied.
pub fn globe_radius_pixels(world_size: f64, latitude_degrees: f64) -> f64 {
    world_size / (2.0 * PI) / latitude_degrees.to_radians().cos()
}

/// Glow circle radius for the given projection, or the fallback when it is missing
pub fn glow_radius(projection: Option<&Projection>) -> f32 {
    match projection {
        Some(p) => (GLOW_SCALE * globe_radius_pixels(p.world_size, p.center_lat)).ceil() as f32,
        None => DEFAULT_GLOW_RADIUS,
    }
}

pub fn blur_extent(radius: f32) -> f32 {
    radius * BLUR_FRACTION
}

/// One stop of the radial gradient
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientStop {
    /// 0.0 (center) to 1.0 (edge)
    pub offset: f32,
    pub color: Rgba,
}

/// Build the four ordered gradient stops from the configured colors
pub fn gradient(colors: &ColorStops) -> [GradientStop; 4] {
    let palette = [colors.inner, colors.middle, colors.outer, colors.fade];
    std::array::from_fn(|i| GradientStop {
        offset: STOP_OFFSETS[i],
        color: palette[i],
    })
}

/// The live glow circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlowState {
    pub center: Vec2,
    pub radius: f32,
    pub blur: f32,
    pub opacity: f32,
}

impl GlowState {
    /// Glow for a freshly created surface
    ///
    /// Without a projection the radius starts at a tenth of the smaller
    /// surface side; the first refresh replaces it.
    pub fn new(width: u32, height: u32, projection: Option<&Projection>, opacity: f32) -> Self {
        let radius = match projection {
            Some(_) => glow_radius(projection),
            None => width.min(height) as f32 * VIEWPORT_FRACTION,
        };
        Self {
            center: surface_center(width, height),
            radius,
            blur: blur_extent(radius),
            opacity,
        }
    }

    /// Recenter on the surface and resize from the current projection
    pub fn refresh(&mut self, width: u32, height: u32, projection: Option<&Projection>) {
        self.center = surface_center(width, height);
        self.radius = glow_radius(projection);
        self.blur = blur_extent(self.radius);
    }
}

fn surface_center(width: u32, height: u32) -> Vec2 {
    Vec2::new(width as f32 / 2.0, height as f32 / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn projection(world_size: f64, center_lat: f64) -> Projection {
        Projection {
            world_size,
            center_lat,
        }
    }

    #[test]
    fn equator_reference_radius() {
        assert_relative_eq!(globe_radius_pixels(1000.0, 0.0), 1000.0 / (2.0 * PI));
        assert_eq!(glow_radius(Some(&projection(1000.0, 0.0))), 239.0);
    }

    #[test]
    fn radius_is_pure() {
        let p = projection(4096.0, 37.5);
        assert_eq!(glow_radius(Some(&p)), glow_radius(Some(&p)));
    }

    #[test]
    fn latitude_enlarges_globe() {
        let equator = globe_radius_pixels(512.0, 0.0);
        let sixty = globe_radius_pixels(512.0, 60.0);
        assert_relative_eq!(sixty, equator * 2.0, max_relative = 1e-9);
        assert_relative_eq!(globe_radius_pixels(512.0, -60.0), sixty, max_relative = 1e-9);
    }

    #[test]
    fn polar_latitude_is_not_clamped() {
        // Known edge case: the radius grows without bound toward the poles
        let near_pole = glow_radius(Some(&projection(1000.0, 89.999)));
        assert!(near_pole > 1.0e6);
        assert!(glow_radius(Some(&projection(1000.0, 89.9999))) > near_pole);
    }

    #[test]
    fn missing_projection_falls_back() {
        assert_eq!(glow_radius(None), DEFAULT_GLOW_RADIUS);
    }

    #[test]
    fn blur_is_a_tenth() {
        assert_relative_eq!(blur_extent(239.0), 23.9);
    }

    #[test]
    fn initial_state_uses_viewport_without_projection() {
        let glow = GlowState::new(800, 600, None, 1.0);
        assert_eq!(glow.center, Vec2::new(400.0, 300.0));
        assert_relative_eq!(glow.radius, 60.0);
        assert_relative_eq!(glow.blur, 6.0);
    }

    #[test]
    fn refresh_tracks_surface_and_projection() {
        let mut glow = GlowState::new(800, 600, Some(&projection(1000.0, 0.0)), 0.8);
        assert_eq!(glow.radius, 239.0);

        glow.refresh(1024, 768, None);
        assert_eq!(glow.center, Vec2::new(512.0, 384.0));
        assert_eq!(glow.radius, DEFAULT_GLOW_RADIUS);
        assert_relative_eq!(glow.blur, 20.0);
        assert_relative_eq!(glow.opacity, 0.8);
    }

    #[test]
    fn gradient_stops_are_ordered() {
        let stops = gradient(&ColorStops::default());
        let offsets: Vec<f32> = stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.3, 0.6, 1.0]);
        assert_eq!(stops[0].color, Rgba::new(120, 180, 255, 0.9));
        assert_eq!(stops[3].color, Rgba::new(40, 80, 220, 0.0));
    }
}
