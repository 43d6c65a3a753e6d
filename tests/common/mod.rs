#![allow(dead_code)]

use fountain::camera::{OrthographicCamera, PerspectiveCamera, default_screen_window};
use fountain::film::Film;
use fountain::integrator::PathIntegrator;
use fountain::progress::NoopReporter;
use fountain::renderer::{RenderOutcome, Renderer};
use fountain::sampler::RandomSampler;
use fountain::scene::Scene;
use fountain::settings::{PathSettings, RenderSettings};
use fountain::spectrum::Spectrum;
use fountain::{Float, Point2i, Transform};

/// Orthographic camera at the origin looking down +z, seeing [-1, 1] on x and y.
pub fn ortho_camera(res: Point2i) -> anyhow::Result<OrthographicCamera> {
    Ok(OrthographicCamera::new(Transform::IDENTITY, res, default_screen_window(res), (0.0, 1.0))?)
}

pub fn pinhole_camera(res: Point2i, fov: Float) -> anyhow::Result<PerspectiveCamera> {
    Ok(PerspectiveCamera::new(Transform::IDENTITY, res, default_screen_window(res), (0.0, 1.0), 0.0, 1.0, fov)?)
}

pub fn render(scene: &Scene, res: Point2i, settings: RenderSettings, path: PathSettings) -> anyhow::Result<Film> {
    let film = Film::new(res)?;
    let sampler = RandomSampler::new_with_seed(settings.samples_per_pixel as usize, settings.seed);
    let renderer = Renderer::new(settings, PathIntegrator::new(path)?)?;
    let outcome = renderer.render(scene, &sampler, &film, &NoopReporter)?;
    assert_eq!(outcome, RenderOutcome::Completed);
    Ok(film)
}

/// Average of the resolved pixels selected by `keep`.
pub fn mean_where(film: &Film, keep: impl Fn(Point2i) -> bool) -> Spectrum {
    let mut sum = Spectrum::zero();
    let mut n = 0;
    for p in film.bounds().iter_points().filter(|&p| keep(p)) {
        if let Some(pixel) = film.pixel(p) {
            sum += pixel.value();
            n += 1;
        }
    }
    assert!(n > 0, "no pixels selected");
    sum / n as Float
}
