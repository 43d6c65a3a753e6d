use crate::integrator::{Integrator, RadianceEstimate, Scatterer, mis_weight};
use crate::interaction::SurfaceHit;
use crate::light::MAX_INTERFACE_CROSSINGS;
use crate::material::TransportMode;
use crate::medium::{Medium, PhaseFunction};
use crate::reflection::BxDFType;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::settings::{PathSettings, RouletteStrategy};
use crate::spectrum::Spectrum;
use crate::{Float, Ray, Vec3f, Error, abs_dot};
use bumpalo::Bump;
use cgmath::InnerSpace;

/// The vertex a path segment started from, kept for weighting emission found by the segment.
#[derive(Clone, Copy)]
struct PrevVertex {
    hit: SurfaceHit,
    pdf: Float,
    delta: bool,
}

/// Unidirectional path tracer with next event estimation and multiple importance sampling.
pub struct PathIntegrator {
    settings: PathSettings,
}

impl PathIntegrator {
    pub fn new(settings: PathSettings) -> Result<Self, Error> {
        settings.validate()?;
        Ok(PathIntegrator { settings })
    }

    pub fn settings(&self) -> &PathSettings {
        &self.settings
    }

    /// Weight of a contribution found by following a scattered direction, given the density the
    /// light would have sampled it with.
    fn emission_weight(&self, prev: Option<PrevVertex>, light_pdf: impl FnOnce(&SurfaceHit) -> Float) -> Float {
        match prev {
            None => 1.0,
            Some(p) if p.delta => 1.0,
            Some(p) => mis_weight(self.settings.mis, p.pdf, light_pdf(&p.hit)),
        }
    }

    /// Sample one light and return its contribution through `scatterer` at `hit`.
    /// `medium_towards` gives the medium a shadow ray leaving in a direction starts in.
    fn sample_one_light<'s>(
        &self,
        scene: &'s Scene,
        hit: &SurfaceHit,
        scatterer: &Scatterer,
        medium_towards: impl Fn(Vec3f) -> Option<&'s dyn Medium>,
        sampler: &mut dyn Sampler,
    ) -> Spectrum {
        let u_light = sampler.get_1d();
        let u = sampler.get_2d();
        let Some((_, light, selection_pdf)) = scene.sample_light(u_light) else {
            return Spectrum::zero();
        };
        let Some(ls) = light.sample_incident_radiance(hit, u) else {
            return Spectrum::zero();
        };
        if ls.pdf == 0.0 || ls.radiance.is_black() {
            return Spectrum::zero();
        }

        let (f, scatter_pdf) = scatterer.eval(ls.wi);
        if f.is_black() {
            return Spectrum::zero();
        }

        let tr = if self.settings.volumetric {
            ls.vis.transmittance(scene, medium_towards(ls.wi), light.ignores_first_medium())
        } else if ls.vis.unblocked(scene) {
            Spectrum::uniform(1.0)
        } else {
            Spectrum::zero()
        };
        if tr.is_black() {
            return Spectrum::zero();
        }

        let light_pdf = ls.pdf * selection_pdf;
        let weight = if light.flags().is_delta_light() {
            1.0
        } else {
            mis_weight(self.settings.mis, light_pdf, scatter_pdf)
        };
        f * ls.radiance * tr * weight / light_pdf
    }

    /// Apply Russian roulette to a path that has made `depth` bounces. Returns whether it survives.
    fn survives_roulette(&self, depth: u32, beta: &mut Spectrum, sampler: &mut dyn Sampler) -> bool {
        if depth < self.settings.min_depth {
            return true;
        }
        let p = match self.settings.roulette {
            RouletteStrategy::Constant(p) => p,
            RouletteStrategy::Throughput => beta.max_component_value().clamp(0.05, 1.0),
        };
        if p >= 1.0 {
            return true;
        }
        if sampler.get_1d() >= p {
            return false;
        }
        *beta /= p;
        true
    }
}

impl Integrator for PathIntegrator {
    fn incident_radiance(
        &self,
        ray: &Ray,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        arena: &Bump,
    ) -> RadianceEstimate {
        let mut estimate = RadianceEstimate::zero();
        let mut beta = Spectrum::uniform(1.0);
        let mut ray = *ray;
        let mut medium = if self.settings.volumetric { scene.camera_medium() } else { None };
        let mut prev: Option<PrevVertex> = None;

        let mut bounces = 0;
        // consecutive scattering events in media since the last surface
        let mut medium_events = 0;
        let mut crossings = 0;

        loop {
            let isect = scene.intersect(&ray);

            if let (Some(m), Some(i)) = (medium, &isect) {
                let segment = ray.clipped(i.t);
                if medium_events >= m.max_scattering_count() {
                    beta *= m.absorption(&segment);
                } else {
                    let ms = m.sample(&segment, sampler);
                    beta *= ms.weight;
                    if beta.is_black() {
                        break;
                    }
                    if let Some(mi) = ms.interaction {
                        medium_events += 1;
                        crossings = 0;
                        if bounces >= self.settings.max_depth {
                            break;
                        }

                        let phase = m.phase();
                        let scatterer = Scatterer::Medium { phase, wo: mi.wo };
                        estimate.add(beta * self.sample_one_light(scene, &mi.hit, &scatterer, |_| Some(m), sampler));

                        let (wi, pdf) = phase.sample_p(mi.wo, sampler.get_2d());
                        prev = Some(PrevVertex { hit: mi.hit, pdf, delta: false });
                        ray = mi.hit.spawn_ray(wi);
                        if !self.survives_roulette(bounces, &mut beta, sampler) {
                            break;
                        }
                        bounces += 1;
                        continue;
                    }
                }
            }

            let Some(isect) = isect else {
                let dir = ray.dir.normalize();
                for (id, light) in scene.infinite_lights() {
                    let le = light.environment_emitted_radiance(&ray);
                    if le.is_black() {
                        continue;
                    }
                    let weight = self.emission_weight(prev, |reference| {
                        scene.light_selection_pdf(id) * light.pdf_incident_radiance(reference, dir)
                    });
                    estimate.add(beta * le * weight);
                }
                break;
            };

            let wo = isect.si.wo;
            let le = isect.emitted_radiance(wo);
            if !le.is_black() {
                let weight = match (isect.entity.area_light(), isect.entity.light_id()) {
                    (Some(light), Some(id)) => self.emission_weight(prev, |reference| {
                        scene.light_selection_pdf(id) * light.pdf_from_hit(reference, &isect.si.hit)
                    }),
                    _ => 1.0,
                };
                estimate.add(beta * le * weight);
            }

            let material = match isect.entity.material() {
                Some(material) => material,
                // emitters without a surface absorb everything that reaches them
                None if isect.entity.area_light().is_some() => break,
                None => {
                    crossings += 1;
                    if crossings > MAX_INTERFACE_CROSSINGS {
                        tracing::debug!("path crossed too many medium interfaces");
                        break;
                    }
                    if self.settings.volumetric {
                        medium = isect.medium(ray.dir, medium);
                    }
                    ray = isect.si.spawn_ray(ray.dir);
                    continue;
                }
            };
            crossings = 0;
            medium_events = 0;

            if bounces >= self.settings.max_depth {
                break;
            }

            let bsdf = material.compute_scattering_functions(&isect.si, arena, TransportMode::Radiance);

            if bsdf.num_components(BxDFType::ALL & !BxDFType::SPECULAR) > 0 {
                let scatterer = Scatterer::Surface { bsdf: &bsdf, wo };
                let direct = self.sample_one_light(
                    scene,
                    &isect.si.hit,
                    &scatterer,
                    |wi| if self.settings.volumetric { isect.medium(wi, medium) } else { None },
                    sampler,
                );
                estimate.add(beta * direct);
            }

            let Some(bs) = bsdf.sample_f(wo, sampler.get_2d(), BxDFType::ALL) else {
                break;
            };
            if bs.f.is_black() || bs.pdf == 0.0 {
                break;
            }
            beta *= bs.f * abs_dot(bs.wi, bsdf.shading_normal()) / bs.pdf;
            prev = Some(PrevVertex { hit: isect.si.hit, pdf: bs.pdf, delta: bs.is_delta() });
            if self.settings.volumetric {
                medium = isect.medium(bs.wi, medium);
            }
            ray = isect.si.spawn_ray(bs.wi);

            if !self.survives_roulette(bounces, &mut beta, sampler) {
                break;
            }
            bounces += 1;
        }

        estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{OrthographicCamera, default_screen_window};
    use crate::entity::Entity;
    use crate::light::{InfiniteAreaLight, PointLight};
    use crate::material::MatteMaterial;
    use crate::sampler::RandomSampler;
    use crate::scene::{Scene, SceneBuilder};
    use crate::shapes::Sphere;
    use crate::{Point2i, Transform};
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    fn camera() -> anyhow::Result<OrthographicCamera> {
        let res = Point2i::new(4, 4);
        Ok(OrthographicCamera::new(Transform::IDENTITY, res, default_screen_window(res), (0.0, 1.0))?)
    }

    fn mean_radiance(integrator: &PathIntegrator, scene: &Scene, ray: Ray, n: usize) -> Spectrum {
        let mut sampler = RandomSampler::new_with_seed(1, 17);
        let mut arena = Bump::new();
        let mut sum = Spectrum::zero();
        for _ in 0..n {
            sum += integrator.incident_radiance(&ray, scene, &mut sampler, &arena).radiance;
            arena.reset();
        }
        sum / n as Float
    }

    #[test]
    fn test_rejects_bad_settings() {
        let settings = PathSettings { min_depth: 3, max_depth: 1, ..Default::default() };
        assert!(PathIntegrator::new(settings).is_err());
    }

    #[test]
    fn test_escaped_ray_sees_environment() -> anyhow::Result<()> {
        let scene = SceneBuilder::new()
            .entity(Entity::new(Arc::new(Sphere::at(point3f!(0, 0, 50), 1.0)?)))
            .light(InfiniteAreaLight::new_uniform(Spectrum::uniform(0.7))?)
            .camera(camera()?)
            .build()?;
        let integrator = PathIntegrator::new(PathSettings::default())?;
        let l = mean_radiance(&integrator, &scene, Ray::new(point3f!(5, 0, 0), vec3f!(1, 0, 0)), 4);
        assert_abs_diff_eq!(l[0], 0.7, epsilon = 1.0e-5);
        Ok(())
    }

    #[test]
    fn test_direct_only_point_light() -> anyhow::Result<()> {
        // a diffuse sphere lit by a point light straight behind the camera
        let kd = 0.5;
        let intensity = 4.0;
        let scene = SceneBuilder::new()
            .entity(Entity::new(Arc::new(Sphere::at(point3f!(0, 0, 5), 1.0)?))
                .with_material(Arc::new(MatteMaterial::constant(Spectrum::uniform(kd), 0.0)?)))
            .light(PointLight::at(point3f!(0, 0, 0), Spectrum::uniform(intensity))?)
            .camera(camera()?)
            .build()?;
        let settings = PathSettings { min_depth: 0, max_depth: 1, ..Default::default() };
        let integrator = PathIntegrator::new(settings)?;
        let l = mean_radiance(&integrator, &scene, Ray::new(point3f!(0, 0, 0), vec3f!(0, 0, 1)), 8);

        // the hit is 4 units away and faces the light
        let expected = kd / crate::consts::PI * intensity / 16.0;
        assert_abs_diff_eq!(l[0], expected, epsilon = 1.0e-4);
        Ok(())
    }

    #[test]
    fn test_light_proxy_absorbs() -> anyhow::Result<()> {
        let scene = SceneBuilder::new()
            .entity(Entity::new(Arc::new(Sphere::at(point3f!(0, 0, 5), 1.0)?))
                .with_diffuse_emission(Spectrum::uniform(2.0), false)?)
            .light(InfiniteAreaLight::new_uniform(Spectrum::uniform(1.0))?)
            .camera(camera()?)
            .build()?;
        let integrator = PathIntegrator::new(PathSettings::default())?;
        let l = mean_radiance(&integrator, &scene, Ray::new(point3f!(0, 0, 0), vec3f!(0, 0, 1)), 16);
        // only the emission, nothing from behind the light
        assert_abs_diff_eq!(l[1], 2.0, epsilon = 1.0e-5);
        Ok(())
    }

    #[test]
    fn test_interface_only_entity_is_invisible() -> anyhow::Result<()> {
        let scene = SceneBuilder::new()
            .entity(Entity::new(Arc::new(Sphere::at(point3f!(0, 0, 5), 1.0)?)))
            .light(InfiniteAreaLight::new_uniform(Spectrum::uniform(0.25))?)
            .camera(camera()?)
            .build()?;
        let settings = PathSettings { min_depth: 0, max_depth: 0, ..Default::default() };
        let integrator = PathIntegrator::new(settings)?;
        let l = mean_radiance(&integrator, &scene, Ray::new(point3f!(0, 0, 0), vec3f!(0, 0, 1)), 4);
        assert_abs_diff_eq!(l[2], 0.25, epsilon = 1.0e-6);
        Ok(())
    }
}
