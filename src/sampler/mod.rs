use crate::{Float, Point2f, Point2i};
use crate::camera::CameraSample;
use cgmath::EuclideanSpace;

pub mod random;

pub use random::RandomSampler;

/// A source of sample values for one pixel sample at a time.
///
/// Samplers are owned by a single worker. Workers obtain their own instance through
/// `clone_with_seed` so that each one draws from an independent stream.
pub trait Sampler: Sync + Send {
    fn start_pixel(&mut self, pixel: Point2i);

    /// Advance to the next sample of the current pixel, returning false once all
    /// `samples_per_pixel` samples have been taken.
    fn start_next_sample(&mut self) -> bool;

    fn get_1d(&mut self) -> Float;

    fn get_2d(&mut self) -> Point2f;

    fn get_3d(&mut self) -> [Float; 3] {
        [self.get_1d(), self.get_1d(), self.get_1d()]
    }

    fn get_4d(&mut self) -> [Float; 4] {
        let a = self.get_2d();
        let b = self.get_2d();
        [a.x, a.y, b.x, b.y]
    }

    fn clone_with_seed(&self, seed: u64) -> Box<dyn Sampler>;

    fn samples_per_pixel(&self) -> usize;

    fn get_camera_sample(&mut self, p_raster: Point2i) -> CameraSample {
        let p_film = Point2f::new(p_raster.x as Float, p_raster.y as Float) + self.get_2d().to_vec();

        CameraSample {
            p_film,
            p_lens: self.get_2d(),
            time: self.get_1d(),
        }
    }
}
