use crate::{Bounds2i, Float, Error, RenderError};
use crate::film::{Film, FilmTile};
use crate::integrator::Integrator;
use crate::progress::ProgressReporter;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::settings::RenderSettings;
use bumpalo::Bump;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

/// Shared flag asking a render to stop. Workers check it before taking a new tile.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Completed,
    /// The film holds every tile that was finished before the render stopped
    Cancelled { completed_tiles: usize, total_tiles: usize },
}

/// Splits the film into tiles and renders them on a pool of workers.
#[derive(Clone)]
pub struct Renderer {
    settings: RenderSettings,
    integrator: Arc<dyn Integrator>,
}

impl Renderer {
    pub fn new(settings: RenderSettings, integrator: impl Integrator + 'static) -> Result<Self, Error> {
        settings.validate()?;
        Ok(Self { settings, integrator: Arc::new(integrator) })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Render the scene into `film`, blocking until every tile is done.
    pub fn render(
        &self,
        scene: &Scene,
        sampler_prototype: &dyn Sampler,
        film: &Film,
        reporter: &dyn ProgressReporter,
    ) -> Result<RenderOutcome, RenderError> {
        let progress = AtomicUsize::new(0);
        self.render_with_cancel(scene, sampler_prototype, film, reporter, &CancelToken::new(), &progress)
    }

    /// Like `render`, stopping early once `cancel` is set. Every merged tile also increments
    /// `completed_tiles`; the outcome only counts tiles merged by this call. The reporter sees
    /// `end_stage` and `end` whether or not a worker failed.
    pub fn render_with_cancel(
        &self,
        scene: &Scene,
        sampler_prototype: &dyn Sampler,
        film: &Film,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
        completed_tiles: &AtomicUsize,
    ) -> Result<RenderOutcome, RenderError> {
        let tiles: Vec<Bounds2i> = film.bounds().iter_tiles(self.settings.tile_size).collect();
        let total_tiles = tiles.len();
        let worker_count = self.settings.resolved_worker_count().min(total_tiles.max(1));

        let span = info_span!("render", tiles = total_tiles, workers = worker_count);
        let _enter = span.enter();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("render-worker-{}", i))
            .build()?;

        let start = Instant::now();
        reporter.begin();
        reporter.new_stage("rendering");

        let next_tile = AtomicUsize::new(0);
        let merged = AtomicUsize::new(0);
        let failure: Mutex<Option<String>> = Mutex::new(None);

        pool.scope(|s| {
            for _ in 0..worker_count {
                s.spawn(|_| {
                    let _enter = span.enter();
                    loop {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let tile_index = next_tile.fetch_add(1, Ordering::Relaxed);
                        let Some(&bounds) = tiles.get(tile_index) else {
                            break;
                        };

                        // reporter panics are caught here as well
                        let result = panic::catch_unwind(AssertUnwindSafe(|| {
                            let tile = self.render_tile(tile_index, bounds, scene, sampler_prototype, film);
                            film.merge_tile(tile);
                            let done = merged.fetch_add(1, Ordering::AcqRel) + 1;
                            completed_tiles.fetch_add(1, Ordering::AcqRel);
                            let percent = 100.0 * done as Float / total_tiles as Float;
                            reporter.progress(percent, Some(&|| film.resolve()));
                        }));
                        if let Err(payload) = result {
                            let msg = panic_message(payload.as_ref());
                            error!(tile = tile_index, %msg, "render worker panicked");
                            reporter.error(&msg);
                            cancel.cancel();
                            failure.lock().get_or_insert(msg);
                            break;
                        }
                    }
                });
            }
        });

        reporter.end_stage();
        reporter.end();

        if let Some(msg) = failure.into_inner() {
            return Err(RenderError::WorkerPanicked(msg));
        }

        let completed = merged.into_inner();
        info!(elapsed = ?start.elapsed(), completed_tiles = completed, "render finished");
        if completed < total_tiles {
            Ok(RenderOutcome::Cancelled { completed_tiles: completed, total_tiles })
        } else {
            Ok(RenderOutcome::Completed)
        }
    }

    /// Start rendering on a background thread.
    pub fn render_async(
        &self,
        scene: Arc<Scene>,
        sampler_prototype: Box<dyn Sampler>,
        film: Arc<Film>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<RenderHandle, RenderError> {
        let cancel = CancelToken::new();
        let completed_tiles = Arc::new(AtomicUsize::new(0));
        let counts = film.bounds().tile_counts(self.settings.tile_size);
        let total_tiles = (counts.x * counts.y) as usize;

        let renderer = self.clone();
        let thread = std::thread::Builder::new()
            .name("render".to_string())
            .spawn({
                let cancel = cancel.clone();
                let completed_tiles = Arc::clone(&completed_tiles);
                move || {
                    renderer.render_with_cancel(
                        &scene,
                        sampler_prototype.as_ref(),
                        &film,
                        reporter.as_ref(),
                        &cancel,
                        &completed_tiles,
                    )
                }
            })
            .map_err(RenderError::Spawn)?;

        Ok(RenderHandle { cancel, completed_tiles, total_tiles, thread })
    }

    fn render_tile(
        &self,
        tile_index: usize,
        bounds: Bounds2i,
        scene: &Scene,
        sampler_prototype: &dyn Sampler,
        film: &Film,
    ) -> FilmTile {
        let mut tile = film.tile(bounds);
        let mut sampler = sampler_prototype.clone_with_seed(tile_seed(self.settings.seed, tile_index));
        let mut arena = Bump::new();
        let camera = scene.camera();
        let mut rejected = 0;

        for pixel in bounds.iter_points() {
            sampler.start_pixel(pixel);
            for _ in 0..self.settings.samples_per_pixel {
                let camera_sample = sampler.get_camera_sample(pixel);
                if let Some(camera_ray) = camera.generate_ray(camera_sample) {
                    if camera_ray.weight > 0.0 {
                        let estimate = self.integrator.incident_radiance(
                            &camera_ray.ray,
                            scene,
                            sampler.as_mut(),
                            &arena,
                        );
                        rejected += estimate.rejected;
                        tile.add_sample(pixel, estimate.radiance, camera_ray.weight);
                    }
                }
                arena.reset();
                sampler.start_next_sample();
            }
        }

        if rejected > 0 {
            warn!(tile = tile_index, rejected, "dropped non-finite or negative radiance");
        } else {
            debug!(tile = tile_index, "tile done");
        }
        tile
    }
}

/// Seed for the sampler of one tile. Depends only on the tile, never on the worker that
/// renders it.
fn tile_seed(base: u64, tile_index: usize) -> u64 {
    // splitmix64 finalizer
    let mut z = base.wrapping_add((tile_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A render running on a background thread.
pub struct RenderHandle {
    cancel: CancelToken,
    completed_tiles: Arc<AtomicUsize>,
    total_tiles: usize,
    thread: JoinHandle<Result<RenderOutcome, RenderError>>,
}

impl RenderHandle {
    /// Ask the render to stop. Tiles in flight are still finished and merged.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Block until the render is over.
    pub fn wait(self) -> Result<RenderOutcome, RenderError> {
        self.thread
            .join()
            .unwrap_or_else(|payload| Err(RenderError::WorkerPanicked(panic_message(payload.as_ref()))))
    }

    /// Percentage of tiles merged so far.
    pub fn progress(&self) -> Float {
        if self.total_tiles == 0 {
            return 100.0;
        }
        100.0 * self.completed_tiles.load(Ordering::Acquire) as Float / self.total_tiles as Float
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_seeds_differ() {
        let seeds: std::collections::HashSet<u64> = (0..1000).map(|i| tile_seed(7, i)).collect();
        assert_eq!(seeds.len(), 1000);
        assert_ne!(tile_seed(0, 3), tile_seed(1, 3));
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("boom {}", 1)).err();
        let msg = payload.map(|p| panic_message(p.as_ref()));
        assert_eq!(msg.as_deref(), Some("boom 1"));
    }
}
