//! # Target and Burst Initialization
//!
//! Maps a decoded image onto per-particle target positions and seeds burst
//! starting positions. Image decoding itself lives outside the core; the
//! boundary type here is a plain pixel grid.
//!
//! Targets are derived once at initialization (and again on full
//! re-initialization); burst positions are re-seeded every time the BURST
//! stage is entered.

use cgmath::Vector2;
use rand::Rng;

use crate::error::{EngineError, Result};
use crate::particles::store::ParticleStore;

/// A decoded image reduced to its pixel grid
///
/// Produced by an external image-loading collaborator. Row-major RGB, one
/// triple per pixel.
#[derive(Clone, Debug)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    rgb: Vec<[u8; 3]>,
}

impl PixelGrid {
    /// Creates a grid, validating that the pixel buffer matches the dimensions
    pub fn new(width: usize, height: usize, rgb: Vec<[u8; 3]>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidArgument(
                "image dimensions must be positive".to_string(),
            ));
        }
        if rgb.len() != width * height {
            return Err(EngineError::InvalidArgument(format!(
                "pixel buffer length {} does not match {}x{}",
                rgb.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, rgb })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        self.rgb[y * self.width + x]
    }
}

/// Letterbox transform mapping image pixels into the unit square
///
/// Preserves the image aspect ratio; the shorter axis is centered.
#[derive(Clone, Copy, Debug)]
struct Letterbox {
    scale: f32,
    offset: Vector2<f32>,
}

impl Letterbox {
    fn fit(width: usize, height: usize) -> Self {
        let w = width as f32;
        let h = height as f32;
        let scale = 1.0 / w.max(h);
        let offset = Vector2::new((1.0 - w * scale) * 0.5, (1.0 - h * scale) * 0.5);
        Self { scale, offset }
    }

    fn apply(&self, x: f32, y: f32) -> Vector2<f32> {
        Vector2::new(
            self.offset.x + x * self.scale,
            self.offset.y + y * self.scale,
        )
    }
}

/// Samples image pixel coordinates into per-particle target positions
///
/// Uniform random sampling across the image, with replacement, letterboxed
/// to preserve aspect ratio and normalized to the unit square.
pub fn map_image_to_targets(grid: &PixelGrid, store: &mut ParticleStore) {
    let letterbox = Letterbox::fit(grid.width(), grid.height());
    let mut rng = rand::rng();
    for target in store.targets_mut() {
        let px = rng.random_range(0..grid.width());
        let py = rng.random_range(0..grid.height());
        // sample at the pixel center
        *target = letterbox.apply(px as f32 + 0.5, py as f32 + 0.5);
    }
}

/// Seeds burst starting positions around the given centers
///
/// Each particle picks a random center, then a uniform angle and a uniform
/// radial distance within `radius`. Radial sampling is distance-uniform,
/// not area-uniform, so density is higher near the center. An empty center
/// list falls back to the scene center.
pub fn seed_burst_positions(store: &mut ParticleStore, centers: &[Vector2<f32>], radius: f32) {
    let default_center = [Vector2::new(0.5, 0.5)];
    let centers: &[Vector2<f32>] = if centers.is_empty() {
        &default_center
    } else {
        centers
    };

    let mut rng = rand::rng();
    for p in store.positions_mut() {
        let center = centers[rng.random_range(0..centers.len())];
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let dist = rng.random::<f32>() * radius;
        *p = center + Vector2::new(angle.cos(), angle.sin()) * dist;
    }
    store.clamp_positions();
}
