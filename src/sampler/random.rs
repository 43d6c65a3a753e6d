use crate::{Point2i, Point2f, Float};
use crate::sampler::Sampler;
use rand_xoshiro::Xoshiro256Plus;
use rand::{SeedableRng, Rng};

/// Independent uniform samples from a xoshiro256+ stream.
#[derive(Clone)]
pub struct RandomSampler {
    rng: Xoshiro256Plus,
    seed: u64,
    samples_per_pixel: usize,
    current_sample: usize,
}

impl RandomSampler {
    pub fn new_with_seed(samples_per_pixel: usize, seed: u64) -> Self {
        Self {
            rng: Xoshiro256Plus::seed_from_u64(seed),
            seed,
            samples_per_pixel,
            current_sample: 0,
        }
    }
}

impl Sampler for RandomSampler {
    fn start_pixel(&mut self, _pixel: Point2i) {
        self.current_sample = 0;
    }

    fn start_next_sample(&mut self) -> bool {
        self.current_sample += 1;
        self.current_sample < self.samples_per_pixel
    }

    fn get_1d(&mut self) -> Float {
        // gen::<f32>() is in [0, 1)
        self.rng.gen()
    }

    fn get_2d(&mut self) -> Point2f {
        Point2f::new(self.rng.gen(), self.rng.gen())
    }

    fn clone_with_seed(&self, seed: u64) -> Box<dyn Sampler> {
        // mix in the prototype's seed so that different base seeds give different images
        let mixed = self.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ seed;
        Box::new(Self::new_with_seed(self.samples_per_pixel, mixed))
    }

    fn samples_per_pixel(&self) -> usize {
        self.samples_per_pixel
    }
}
