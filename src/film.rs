use crate::{Float, Point2i, Bounds2i, Error};
use crate::spectrum::Spectrum;
use image::{ImageBuffer, Rgb};
use parking_lot::Mutex;

/// Linear RGB radiance image produced by `Film::resolve`.
pub type Image = image::Rgb32FImage;

/// Accumulated samples of a single pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pixel {
    pub radiance_sum: Spectrum,
    pub weight_sum: Float,
}

impl Pixel {
    pub fn value(&self) -> Spectrum {
        if self.weight_sum > 0.0 {
            self.radiance_sum / self.weight_sum
        } else {
            Spectrum::zero()
        }
    }
}

/// The shared framebuffer. Every sample lands in the pixel it was taken in.
pub struct Film {
    resolution: Point2i,
    pixels: Mutex<Vec<Pixel>>,
}

impl Film {
    pub fn new(resolution: Point2i) -> Result<Self, Error> {
        if resolution.x <= 0 || resolution.y <= 0 {
            return Err(Error::InvalidParameter {
                what: "film resolution",
                reason: format!("{}x{} is empty", resolution.x, resolution.y),
            });
        }
        let n_pixels = (resolution.x * resolution.y) as usize;
        Ok(Self {
            resolution,
            pixels: Mutex::new(vec![Pixel::default(); n_pixels]),
        })
    }

    pub fn resolution(&self) -> Point2i {
        self.resolution
    }

    pub fn bounds(&self) -> Bounds2i {
        Bounds2i::from_resolution(self.resolution.x as u32, self.resolution.y as u32)
    }

    /// A local accumulation buffer for the part of `bounds` that lies on the film.
    pub fn tile(&self, bounds: Bounds2i) -> FilmTile {
        let bounds = bounds.intersection(&self.bounds());
        let area = if bounds.is_empty() { 0 } else { bounds.area() as usize };
        FilmTile { bounds, pixels: vec![Pixel::default(); area] }
    }

    pub fn merge_tile(&self, tile: FilmTile) {
        if tile.pixels.is_empty() {
            return;
        }
        let width = self.resolution.x;
        let mut pixels = self.pixels.lock();
        for (p, tile_pixel) in tile.bounds.iter_points().zip(tile.pixels.iter()) {
            let pixel = &mut pixels[(p.y * width + p.x) as usize];
            pixel.radiance_sum += tile_pixel.radiance_sum;
            pixel.weight_sum += tile_pixel.weight_sum;
        }
    }

    /// Copy of the raw per-pixel sums in row-major order.
    pub fn pixel_sums(&self) -> Vec<Pixel> {
        self.pixels.lock().clone()
    }

    pub fn pixel(&self, p: Point2i) -> Option<Pixel> {
        if !self.bounds().contains_exclusive(p) {
            return None;
        }
        Some(self.pixels.lock()[(p.y * self.resolution.x + p.x) as usize])
    }

    /// Radiance per pixel, that is the radiance sum divided by the weight sum. Pixels without
    /// samples are black.
    pub fn resolve(&self) -> Image {
        let pixels = self.pixels.lock();
        let width = self.resolution.x as u32;
        ImageBuffer::from_fn(width, self.resolution.y as u32, |x, y| {
            let [r, g, b] = pixels[(y * width + x) as usize].value().to_rgb();
            Rgb([r, g, b])
        })
    }
}

/// Samples for one rectangle of the film, owned by a single worker until merged.
pub struct FilmTile {
    bounds: Bounds2i,
    pixels: Vec<Pixel>,
}

impl FilmTile {
    pub fn bounds(&self) -> Bounds2i {
        self.bounds
    }

    /// Add a weighted sample to pixel `p`. Samples outside the tile are dropped.
    pub fn add_sample(&mut self, p: Point2i, radiance: Spectrum, weight: Float) {
        if !self.bounds.contains_exclusive(p) {
            tracing::debug!(?p, "sample outside of its tile");
            return;
        }
        let width = self.bounds.max.x - self.bounds.min.x;
        let offset = (p.y - self.bounds.min.y) * width + (p.x - self.bounds.min.x);
        let pixel = &mut self.pixels[offset as usize];
        pixel.radiance_sum += radiance * weight;
        pixel.weight_sum += weight;
    }
}
