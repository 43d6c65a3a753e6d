use fountain::demo::cornell_box;
use fountain::film::{Film, Pixel};
use fountain::integrator::PathIntegrator;
use fountain::progress::NoopReporter;
use fountain::renderer::Renderer;
use fountain::sampler::RandomSampler;
use fountain::settings::{PathSettings, RenderSettings};
use fountain::Point2i;
use pretty_assertions::assert_eq;

fn render_sums(workers: usize, seed: u64) -> anyhow::Result<Vec<Pixel>> {
    let res = Point2i::new(20, 14);
    let scene = cornell_box(res)?;
    let settings = RenderSettings { tile_size: 6, samples_per_pixel: 4, worker_count: Some(workers), seed };
    let path = PathSettings { min_depth: 2, max_depth: 5, ..Default::default() };
    let renderer = Renderer::new(settings, PathIntegrator::new(path)?)?;
    let film = Film::new(res)?;
    renderer.render(&scene, &RandomSampler::new_with_seed(4, seed), &film, &NoopReporter)?;
    Ok(film.pixel_sums())
}

#[test]
fn same_seed_is_bit_identical() -> anyhow::Result<()> {
    let a = render_sums(1, 42)?;
    let b = render_sums(1, 42)?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn worker_count_does_not_change_the_image() -> anyhow::Result<()> {
    let one = render_sums(1, 7)?;
    let many = render_sums(4, 7)?;
    assert_eq!(one, many);
    Ok(())
}

#[test]
fn different_seeds_differ() -> anyhow::Result<()> {
    let a = render_sums(2, 1)?;
    let b = render_sums(2, 2)?;
    assert!(a != b);
    Ok(())
}
