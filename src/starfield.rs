//! Star field generation and camera-driven repositioning
//!
//! Stars live in the pixel space of the star surface. Depth (`z`) is
//! synthetic and only drives paint order and the initial opacity hint:
//! the field is sorted by `z` so farther stars are painted first.

use crate::camera::CameraDelta;
use crate::color::{Rgb, hsl_to_rgb};
use crate::error::OverlayError;
use glam::Vec3;
use log::debug;
use rand::Rng;
use serde::Deserialize;

/// Upper bound (exclusive) of the synthetic depth range
pub const MAX_DEPTH: f32 = 50.0;

const STAR_HUE: f32 = 0.6;
const STAR_SATURATION: f32 = 0.2;
const MIN_SIZE: f32 = 0.5;
const MAX_SIZE: f32 = 2.5;
const MIN_BRIGHTNESS: f32 = 0.4;
const MAX_BRIGHTNESS: f32 = 1.0;
const MIN_OPACITY: f32 = 0.4;
const MAX_OPACITY: f32 = 1.0;

/// One decorative star
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub position: Vec3,
    /// Position at creation time, kept for reference only
    pub initial_position: Vec3,
    pub size: f32,
    pub color: Rgb,
    pub opacity: f32,
}

/// How strongly each camera delta moves the stars, in pixels per unit
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotionFactors {
    pub bearing: f32,
    pub pitch: f32,
    pub lng: f32,
}

impl Default for MotionFactors {
    fn default() -> Self {
        Self {
            bearing: 0.5,
            pitch: 0.5,
            lng: 2.0,
        }
    }
}

/// Linearly remap `value` from `[in_min, in_max]` onto `[out_min, out_max]`
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Generate `count` stars scattered over a `width` x `height` surface,
/// sorted ascending by depth.
pub fn generate<R: Rng>(rng: &mut R, count: usize, width: u32, height: u32) -> Vec<Star> {
    let mut stars: Vec<Star> = (0..count)
        .map(|_| {
            let position = Vec3::new(
                sample_span(rng, width as f32),
                sample_span(rng, height as f32),
                rng.random_range(0.0..MAX_DEPTH),
            );
            let size = rng.random_range(MIN_SIZE..MAX_SIZE);
            let brightness = rng.random_range(MIN_BRIGHTNESS..MAX_BRIGHTNESS);

            Star {
                position,
                initial_position: position,
                size,
                color: hsl_to_rgb(STAR_HUE, STAR_SATURATION, brightness),
                opacity: depth_opacity(position.z),
            }
        })
        .collect();

    stars.sort_by(|a, b| a.position.z.total_cmp(&b.position.z));
    stars
}

/// Opacity hint for a star at depth `z`
pub fn depth_opacity(z: f32) -> f32 {
    map_range(z, 0.0, MAX_DEPTH, MIN_OPACITY, MAX_OPACITY)
}

fn sample_span<R: Rng>(rng: &mut R, span: f32) -> f32 {
    if span > 0.0 {
        rng.random_range(0.0..span)
    } else {
        0.0
    }
}

/// Shift every star by the camera delta, wrapping around the surface edges.
///
/// Fails without touching any star if either dimension is zero.
pub fn apply_motion(
    stars: &mut [Star],
    delta: &CameraDelta,
    width: u32,
    height: u32,
    factors: &MotionFactors,
) -> Result<(), OverlayError> {
    if width == 0 || height == 0 {
        return Err(OverlayError::EmptyViewport { width, height });
    }

    let w = f64::from(width);
    let h = f64::from(height);
    let dx = shift(delta.bearing, factors.bearing, w) + shift(delta.lng, factors.lng, w);
    let dy = shift(delta.pitch, factors.pitch, h);

    for star in stars.iter_mut() {
        star.position.x = wrap(f64::from(star.position.x) + dx, width);
        star.position.y = wrap(f64::from(star.position.y) + dy, height);
    }

    Ok(())
}

/// Pixel shift of one delta component, reduced modulo the surface extent.
///
/// A product that overflows to infinity (or a NaN delta) moves nothing.
fn shift(delta: f64, factor: f32, extent: f64) -> f64 {
    let pixels = delta * f64::from(factor);
    if pixels.is_finite() { pixels % extent } else { 0.0 }
}

fn wrap(value: f64, extent: u32) -> f32 {
    let extent_px = f64::from(extent);
    let mut v = value % extent_px;
    if v < 0.0 {
        v += extent_px;
    }
    // A tiny negative remainder plus the extent, or the narrowing itself, can round up to it
    let v = v as f32;
    if v >= extent as f32 { 0.0 } else { v }
}

/// The live set of stars together with the surface they were laid out on
#[derive(Debug, Default)]
pub struct StarField {
    stars: Vec<Star>,
    width: u32,
    height: u32,
}

impl StarField {
    /// Lay out a fresh field using the thread-local rng
    pub fn new(count: usize, width: u32, height: u32) -> Self {
        Self::with_rng(&mut rand::rng(), count, width, height)
    }

    pub fn with_rng<R: Rng>(rng: &mut R, count: usize, width: u32, height: u32) -> Self {
        debug!("Generating {} stars on {}x{}", count, width, height);
        Self {
            stars: generate(rng, count, width, height),
            width,
            height,
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn stars_mut(&mut self) -> &mut [Star] {
        &mut self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Move the field by a camera delta on its own surface
    pub fn apply(&mut self, delta: &CameraDelta, factors: &MotionFactors) -> Result<(), OverlayError> {
        apply_motion(&mut self.stars, delta, self.width, self.height, factors)
    }

    /// Initial opacity of every star, in paint order
    pub fn opacities(&self) -> Vec<f32> {
        self.stars.iter().map(|s| s.opacity).collect()
    }
}
