//! Trail accumulation buffer.
//!
//! A persistent grayscale image, independent of particle state, that gives
//! tracks their phosphorescent afterglow. Each step the previous image is
//! multiplied by a decay factor into the other half of a double buffer
//! (overwrite, no blending), then every live particle is splatted on top
//! additively. The two halves swap roles exactly like the particle
//! generations do.
//!
//! The buffer's resolution is unrelated to the particle count, so a coarse
//! buffer works as a cheap density view.
//!
//! # Example
//!
//! ```
//! use cloudchamber::trails::{Orthographic, TrailBuffer, View};
//!
//! let mut trails = TrailBuffer::new(128, 128).unwrap();
//! let projection = Orthographic::new(View::TopDown, 20.0);
//! trails.update(0.95, std::iter::empty(), &projection);
//! assert_eq!(trails.total_intensity(), 0.0);
//! ```

use std::path::Path;

use glam::Vec3;
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::error::{ChamberError, Result};
use crate::isotope::ParticleKind;
use crate::particle::Particle;

/// World units covered by one unit of point-sprite size.
const SPRITE_WORLD_PER_SIZE: f32 = 0.01;

/// Smallest splat radius in pixels, so distant or tiny particles still land.
const MIN_RADIUS_PX: f32 = 0.75;

/// A projected splat center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    /// Pixel column (may be fractional or off-image).
    pub x: f32,
    /// Pixel row (may be fractional or off-image).
    pub y: f32,
    /// Pixels per world unit at this point.
    pub scale: f32,
}

/// Maps world positions onto the accumulation image.
///
/// Camera and perspective math live with the renderer; the engine only
/// needs somewhere to put each splat.
pub trait Projection: Send + Sync {
    /// Project `world` onto an image of `width` x `height` pixels.
    ///
    /// `None` means the point is not visible at all.
    fn project(&self, world: Vec3, width: u32, height: u32) -> Option<ScreenPoint>;
}

/// Axis-aligned view direction for [`Orthographic`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Looking down the -Y axis; X right, Z down the image.
    #[default]
    TopDown,
    /// Looking down the -Z axis; X right, Y up the image.
    Front,
}

impl std::str::FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "topdown" | "top" => Ok(View::TopDown),
            "front" => Ok(View::Front),
            other => Err(format!("unknown view {:?} (expected topdown or front)", other)),
        }
    }
}

/// Orthographic projection fitting the whole chamber into the image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orthographic {
    pub view: View,
    pub bounds: f32,
}

impl Orthographic {
    pub fn new(view: View, bounds: f32) -> Self {
        Self { view, bounds }
    }
}

impl Projection for Orthographic {
    fn project(&self, world: Vec3, width: u32, height: u32) -> Option<ScreenPoint> {
        let (u, v) = match self.view {
            View::TopDown => (world.x, world.z),
            View::Front => (world.x, -world.y),
        };
        let scale = width.min(height) as f32 / (2.0 * self.bounds);
        Some(ScreenPoint {
            x: width as f32 * 0.5 + u * scale,
            y: height as f32 * 0.5 + v * scale,
            scale,
        })
    }
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Core intensity and halo weight per species.
#[inline]
fn kind_response(kind: ParticleKind) -> (f32, f32) {
    match kind {
        ParticleKind::Beta => (0.9, 0.6),
        ParticleKind::Alpha => (1.3, 1.0),
    }
}

/// Double-buffered decaying image.
#[derive(Clone, Debug)]
pub struct TrailBuffer {
    width: u32,
    height: u32,
    images: [Vec<f32>; 2],
    current: usize,
}

impl TrailBuffer {
    /// Two black images of `width` x `height`.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ChamberError::InvalidConfig(format!(
                "trail buffer must be at least 1x1, got {}x{}",
                width, height
            )));
        }
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            images: [vec![0.0; len], vec![0.0; len]],
            current: 0,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The most recently produced image, row-major.
    #[inline]
    pub fn current(&self) -> &[f32] {
        &self.images[self.current]
    }

    /// Index (0 or 1) of the image currently presented.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.current()[(y * self.width + x) as usize])
    }

    /// Sum of every pixel of the current image.
    pub fn total_intensity(&self) -> f32 {
        self.current().iter().sum()
    }

    /// Decay the current image into the other half, splat `particles`, and
    /// present the result.
    pub fn update<'a, I>(&mut self, decay: f32, particles: I, projection: &dyn Projection)
    where
        I: IntoIterator<Item = &'a Particle>,
    {
        let decay = decay.clamp(0.0, 1.0);
        let target = 1 - self.current;
        {
            let [a, b] = &mut self.images;
            let (src, dst) = if target == 1 { (&*a, b) } else { (&*b, a) };
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d = s * decay;
            }
        }

        for p in particles.into_iter().filter(|p| p.is_active()) {
            if let Some(point) = projection.project(p.position, self.width, self.height) {
                self.splat(target, p, point);
            }
        }

        self.current = target;
    }

    fn splat(&mut self, target: usize, p: &Particle, point: ScreenPoint) {
        let radius = (p.size * SPRITE_WORLD_PER_SIZE * point.scale).max(MIN_RADIUS_PX);
        let (core, glow) = kind_response(p.kind());
        let intensity = p.brightness * core * glow;
        if intensity <= 0.0 {
            return;
        }

        let x0 = (point.x - radius).floor().max(0.0);
        let y0 = (point.y - radius).floor().max(0.0);
        let x1 = (point.x + radius).ceil().min(self.width as f32 - 1.0);
        let y1 = (point.y + radius).ceil().min(self.height as f32 - 1.0);
        if x0 > x1 || y0 > y1 {
            return;
        }

        let width = self.width as usize;
        let image = &mut self.images[target];
        for py in y0 as usize..=y1 as usize {
            for px in x0 as usize..=x1 as usize {
                let dx = px as f32 + 0.5 - point.x;
                let dy = py as f32 + 0.5 - point.y;
                let r = (dx * dx + dy * dy).sqrt() / radius;
                let weight = smoothstep(1.0, 0.6, r);
                if weight > 0.0 {
                    image[py * width + px] += intensity * weight;
                }
            }
        }
    }

    /// Reset both images to black.
    pub fn clear(&mut self) {
        for image in &mut self.images {
            image.fill(0.0);
        }
    }

    /// Reallocate at a new resolution. The trail history is discarded.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        *self = Self::new(width, height)?;
        Ok(())
    }

    /// 8-bit grayscale copy of the current image, saturating at 1.0.
    pub fn to_image(&self) -> GrayImage {
        let current = self.current();
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let v = current[(y * self.width + x) as usize];
            Luma([(v.clamp(0.0, 1.0) * 255.0).round() as u8])
        })
    }

    /// Write the current image as a PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.to_image()
            .save_with_format(path, image::ImageFormat::Png)?;
        log::info!("Wrote {}x{} trail image to {}", self.width, self.height, path.display());
        Ok(())
    }
}
