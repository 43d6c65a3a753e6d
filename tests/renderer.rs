mod common;

use bumpalo::Bump;
use fountain::film::{Film, Image};
use fountain::integrator::{Integrator, RadianceEstimate};
use fountain::progress::{NoopReporter, ProgressReporter};
use fountain::renderer::{CancelToken, RenderOutcome, Renderer};
use fountain::sampler::{RandomSampler, Sampler};
use fountain::scene::{Scene, SceneBuilder};
use fountain::settings::RenderSettings;
use fountain::entity::Entity;
use fountain::shapes::Sphere;
use fountain::spectrum::Spectrum;
use fountain::{point3f, Bounds2i, Float, Point2i, Ray, RenderError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Returns the same radiance for every ray.
struct ConstantIntegrator(Float);

impl Integrator for ConstantIntegrator {
    fn incident_radiance(&self, _ray: &Ray, _scene: &Scene, _sampler: &mut dyn Sampler, _arena: &Bump) -> RadianceEstimate {
        let mut estimate = RadianceEstimate::zero();
        estimate.add(Spectrum::uniform(self.0));
        estimate
    }
}

struct PanickingIntegrator;

impl Integrator for PanickingIntegrator {
    fn incident_radiance(&self, ray: &Ray, _scene: &Scene, _sampler: &mut dyn Sampler, _arena: &Bump) -> RadianceEstimate {
        if ray.origin.x > 0.5 {
            panic!("integrator exploded");
        }
        RadianceEstimate::zero()
    }
}

struct SlowIntegrator;

impl Integrator for SlowIntegrator {
    fn incident_radiance(&self, _ray: &Ray, _scene: &Scene, _sampler: &mut dyn Sampler, _arena: &Bump) -> RadianceEstimate {
        std::thread::sleep(Duration::from_millis(1));
        RadianceEstimate::zero()
    }
}

#[derive(Default)]
struct RecordingReporter {
    percents: Mutex<Vec<Float>>,
    errors: Mutex<Vec<String>>,
    preview_size: Mutex<Option<(u32, u32)>>,
    ended: AtomicUsize,
}

impl ProgressReporter for RecordingReporter {
    fn progress(&self, percent: Float, preview: Option<&dyn Fn() -> Image>) {
        self.percents.lock().push(percent);
        if let Some(preview) = preview {
            self.preview_size.lock().get_or_insert_with(|| preview().dimensions());
        }
    }

    fn end(&self) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }

    fn error(&self, msg: &str) {
        self.errors.lock().push(msg.to_string());
    }
}

fn scene(res: Point2i) -> anyhow::Result<Scene> {
    Ok(SceneBuilder::new()
        .entity(Entity::new(Arc::new(Sphere::at(point3f!(0, 0, 5), 1.0)?)))
        .camera(common::ortho_camera(res)?)
        .build()?)
}

#[test]
fn tiles_cover_the_image_exactly_once() {
    for (w, h, tile) in [(16, 16, 4), (17, 9, 4), (5, 31, 8), (3, 3, 16), (1, 1, 1)] {
        let bounds = Bounds2i::from_resolution(w, h);
        let mut hits: HashMap<(i32, i32), usize> = HashMap::new();
        for t in bounds.iter_tiles(tile) {
            assert!(!t.is_empty());
            for p in t.iter_points() {
                *hits.entry((p.x, p.y)).or_default() += 1;
            }
        }
        assert_eq!(hits.len(), (w * h) as usize);
        assert!(hits.values().all(|&n| n == 1));
        for (x, y) in hits.keys() {
            assert!(*x >= 0 && *x < w as i32 && *y >= 0 && *y < h as i32);
        }
    }
}

#[test]
fn every_pixel_gets_every_sample() -> anyhow::Result<()> {
    let res = Point2i::new(13, 7);
    let settings = RenderSettings { tile_size: 4, samples_per_pixel: 3, worker_count: Some(3), seed: 0 };
    let renderer = Renderer::new(settings, ConstantIntegrator(0.25))?;
    let film = Film::new(res)?;
    let reporter = RecordingReporter::default();
    let outcome = renderer.render(&scene(res)?, &RandomSampler::new_with_seed(3, 0), &film, &reporter)?;
    assert_eq!(outcome, RenderOutcome::Completed);

    for pixel in film.pixel_sums() {
        assert_eq!(pixel.weight_sum, 3.0);
        assert_eq!(pixel.value(), Spectrum::uniform(0.25));
    }

    // 4 x 2 tiles
    let percents = reporter.percents.lock().clone();
    assert_eq!(percents.len(), 8);
    assert_eq!(percents.iter().cloned().fold(0.0, Float::max), 100.0);
    assert_eq!(*reporter.preview_size.lock(), Some((13, 7)));
    assert_eq!(reporter.ended.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn cancelled_before_start_renders_nothing() -> anyhow::Result<()> {
    let res = Point2i::new(8, 8);
    let settings = RenderSettings { tile_size: 4, samples_per_pixel: 1, ..Default::default() };
    let renderer = Renderer::new(settings, ConstantIntegrator(1.0))?;
    let film = Film::new(res)?;
    let cancel = CancelToken::new();
    cancel.cancel();
    let completed = AtomicUsize::new(0);
    let outcome = renderer.render_with_cancel(
        &scene(res)?, &RandomSampler::new_with_seed(1, 0), &film, &NoopReporter, &cancel, &completed,
    )?;
    assert_eq!(outcome, RenderOutcome::Cancelled { completed_tiles: 0, total_tiles: 4 });
    assert!(film.pixel_sums().iter().all(|p| p.weight_sum == 0.0));
    Ok(())
}

#[test]
fn worker_panic_is_reported() -> anyhow::Result<()> {
    let res = Point2i::new(8, 8);
    let settings = RenderSettings { tile_size: 4, samples_per_pixel: 1, worker_count: Some(2), seed: 0 };
    let renderer = Renderer::new(settings, PanickingIntegrator)?;
    let film = Film::new(res)?;
    let reporter = RecordingReporter::default();
    let result = renderer.render(&scene(res)?, &RandomSampler::new_with_seed(1, 0), &film, &reporter);

    match result {
        Err(RenderError::WorkerPanicked(msg)) => assert!(msg.contains("integrator exploded")),
        other => panic!("expected a worker panic, got {:?}", other.map(|_| ())),
    }
    assert!(!reporter.errors.lock().is_empty());
    assert_eq!(reporter.ended.load(Ordering::SeqCst), 1);
    Ok(())
}

/// Panics on the first progress update.
#[derive(Default)]
struct PanickingReporter {
    errors: Mutex<Vec<String>>,
    ended: AtomicUsize,
}

impl ProgressReporter for PanickingReporter {
    fn progress(&self, _percent: Float, _preview: Option<&dyn Fn() -> Image>) {
        panic!("reporter exploded");
    }

    fn end(&self) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }

    fn error(&self, msg: &str) {
        self.errors.lock().push(msg.to_string());
    }
}

#[test]
fn reporter_panic_fails_the_render() -> anyhow::Result<()> {
    let res = Point2i::new(8, 8);
    let settings = RenderSettings { tile_size: 4, samples_per_pixel: 1, worker_count: Some(2), seed: 0 };
    let renderer = Renderer::new(settings, ConstantIntegrator(1.0))?;
    let film = Film::new(res)?;
    let reporter = PanickingReporter::default();
    let result = renderer.render(&scene(res)?, &RandomSampler::new_with_seed(1, 0), &film, &reporter);

    match result {
        Err(RenderError::WorkerPanicked(msg)) => assert!(msg.contains("reporter exploded")),
        other => panic!("expected a worker panic, got {:?}", other.map(|_| ())),
    }
    assert!(!reporter.errors.lock().is_empty());
    assert_eq!(reporter.ended.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn outcome_ignores_prior_counter_value() -> anyhow::Result<()> {
    let res = Point2i::new(8, 8);
    let settings = RenderSettings { tile_size: 4, samples_per_pixel: 1, ..Default::default() };
    let renderer = Renderer::new(settings, ConstantIntegrator(1.0))?;
    let film = Film::new(res)?;
    let completed = AtomicUsize::new(5);
    let outcome = renderer.render_with_cancel(
        &scene(res)?, &RandomSampler::new_with_seed(1, 0), &film, &NoopReporter, &CancelToken::new(), &completed,
    )?;
    assert_eq!(outcome, RenderOutcome::Completed);
    assert_eq!(completed.load(Ordering::SeqCst), 9);

    // a stale count must not make a cancelled render look complete
    let cancel = CancelToken::new();
    cancel.cancel();
    let completed = AtomicUsize::new(100);
    let outcome = renderer.render_with_cancel(
        &scene(res)?, &RandomSampler::new_with_seed(1, 0), &Film::new(res)?, &NoopReporter, &cancel, &completed,
    )?;
    assert_eq!(outcome, RenderOutcome::Cancelled { completed_tiles: 0, total_tiles: 4 });
    Ok(())
}

#[test]
fn oversized_tiles_still_cover_the_film() -> anyhow::Result<()> {
    let res = Point2i::new(9, 5);
    for tile_size in [i32::MAX as u32, u32::MAX] {
        let settings = RenderSettings { tile_size, samples_per_pixel: 2, worker_count: Some(2), seed: 0 };
        let renderer = Renderer::new(settings, ConstantIntegrator(0.5))?;
        let film = Film::new(res)?;
        let outcome = renderer.render(&scene(res)?, &RandomSampler::new_with_seed(2, 0), &film, &NoopReporter)?;
        assert_eq!(outcome, RenderOutcome::Completed);
        assert!(film.pixel_sums().iter().all(|p| p.weight_sum == 2.0));
    }
    Ok(())
}

#[test]
fn invalid_settings_are_rejected() {
    let settings = RenderSettings { samples_per_pixel: 0, ..Default::default() };
    assert!(Renderer::new(settings, ConstantIntegrator(1.0)).is_err());
}

#[test]
fn async_render_completes() -> anyhow::Result<()> {
    let res = Point2i::new(12, 12);
    let settings = RenderSettings { tile_size: 4, samples_per_pixel: 2, worker_count: Some(2), seed: 0 };
    let renderer = Renderer::new(settings, ConstantIntegrator(2.0))?;
    let film = Arc::new(Film::new(res)?);
    let handle = renderer.render_async(
        Arc::new(scene(res)?),
        Box::new(RandomSampler::new_with_seed(2, 0)),
        Arc::clone(&film),
        Arc::new(NoopReporter),
    )?;
    let outcome = handle.wait()?;
    assert_eq!(outcome, RenderOutcome::Completed);
    assert!(film.pixel_sums().iter().all(|p| p.value() == Spectrum::uniform(2.0)));
    Ok(())
}

#[test]
fn async_render_can_be_stopped() -> anyhow::Result<()> {
    let res = Point2i::new(64, 64);
    let settings = RenderSettings { tile_size: 8, samples_per_pixel: 2, worker_count: Some(2), seed: 0 };
    let renderer = Renderer::new(settings, SlowIntegrator)?;
    let film = Arc::new(Film::new(res)?);
    let handle = renderer.render_async(
        Arc::new(scene(res)?),
        Box::new(RandomSampler::new_with_seed(2, 0)),
        Arc::clone(&film),
        Arc::new(NoopReporter),
    )?;
    handle.stop();
    assert!(handle.progress() < 100.0);
    match handle.wait()? {
        RenderOutcome::Cancelled { completed_tiles, total_tiles } => {
            assert_eq!(total_tiles, 64);
            assert!(completed_tiles < total_tiles);
            // only whole tiles reach the film
            let sums = film.pixel_sums();
            assert!(sums.iter().all(|p| p.weight_sum == 0.0 || p.weight_sum == 2.0));
            let full = sums.iter().filter(|p| p.weight_sum == 2.0).count();
            assert_eq!(full, completed_tiles * 64);
        }
        RenderOutcome::Completed => panic!("render was not stopped"),
    }
    Ok(())
}
