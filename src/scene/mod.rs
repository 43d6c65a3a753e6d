use crate::bvh::{Bvh, BvhOptions};
use crate::camera::Camera;
use crate::entity::{Entity, Intersection};
use crate::light::{Light, LightFlags, LightId};
use crate::medium::{Medium, MediumRef};
use crate::sampling::Distribution1D;
use crate::{Bounds3f, Float, Ray, Error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// How `Scene::sample_light` picks a light for next event estimation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightSelection {
    Uniform,
    /// Proportional to the luminance of each light's total power
    #[default]
    Power,
}

/// Everything a render needs to know about the world. Immutable once built.
pub struct Scene {
    bvh: Bvh,
    lights: Vec<Arc<dyn Light>>,
    infinite_lights: Vec<LightId>,
    light_distribution: Option<Distribution1D>,
    camera: Box<dyn Camera>,
    camera_medium: Option<MediumRef>,
    /// Some entity lets rays pass through, so shadow rays must walk the whole segment
    has_passthrough: bool,
}

impl Scene {
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'_>> {
        self.bvh.intersect(ray)
    }

    pub fn intersect_test(&self, ray: &Ray) -> bool {
        self.bvh.intersect_test(ray)
    }

    pub fn world_bound(&self) -> Bounds3f {
        self.bvh.bounds()
    }

    pub fn entities(&self) -> &[Entity] {
        self.bvh.entities()
    }

    pub fn camera(&self) -> &dyn Camera {
        self.camera.as_ref()
    }

    /// The medium camera rays start in.
    pub fn camera_medium(&self) -> Option<&dyn Medium> {
        self.camera_medium.as_deref()
    }

    pub fn lights(&self) -> &[Arc<dyn Light>] {
        &self.lights
    }

    pub fn light(&self, id: LightId) -> Option<&dyn Light> {
        self.lights.get(id.0).map(|l| l.as_ref())
    }

    pub fn infinite_lights(&self) -> impl Iterator<Item=(LightId, &dyn Light)> + '_ {
        self.infinite_lights.iter().map(move |&id| (id, self.lights[id.0].as_ref()))
    }

    /// Whether visibility between two points can depend on anything other than plain occlusion.
    pub fn has_media(&self, medium: Option<&dyn Medium>) -> bool {
        medium.is_some() || self.has_passthrough
    }

    /// Choose a light with the sample `u`, returning it with its discrete selection probability.
    pub fn sample_light(&self, u: Float) -> Option<(LightId, &dyn Light, Float)> {
        if self.lights.is_empty() {
            return None;
        }
        let (idx, pdf) = match &self.light_distribution {
            Some(distrib) => distrib.sample_discrete(u),
            None => {
                let n = self.lights.len();
                (((u * n as Float) as usize).min(n - 1), 1.0 / n as Float)
            }
        };
        if pdf == 0.0 {
            return None;
        }
        Some((LightId(idx), self.lights[idx].as_ref(), pdf))
    }

    /// The probability of `sample_light` choosing the light `id`.
    pub fn light_selection_pdf(&self, id: LightId) -> Float {
        if id.0 >= self.lights.len() {
            return 0.0;
        }
        match &self.light_distribution {
            Some(distrib) => distrib.discrete_pdf(id.0),
            None => 1.0 / self.lights.len() as Float,
        }
    }
}

/// Programmatic assembly of a `Scene`.
pub struct SceneBuilder {
    entities: Vec<Entity>,
    lights: Vec<Box<dyn Light>>,
    camera: Option<Box<dyn Camera>>,
    camera_medium: Option<MediumRef>,
    light_selection: LightSelection,
    bvh_options: BvhOptions,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            lights: Vec::new(),
            camera: None,
            camera_medium: None,
            light_selection: LightSelection::default(),
            bvh_options: BvhOptions::default(),
        }
    }

    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn entities(mut self, entities: impl IntoIterator<Item=Entity>) -> Self {
        self.entities.extend(entities);
        self
    }

    /// Add a light that is not attached to any entity.
    pub fn light(mut self, light: impl Light + 'static) -> Self {
        self.lights.push(Box::new(light));
        self
    }

    pub fn camera(mut self, camera: impl Camera + 'static) -> Self {
        self.camera = Some(Box::new(camera));
        self
    }

    pub fn camera_medium(mut self, medium: Option<MediumRef>) -> Self {
        self.camera_medium = medium;
        self
    }

    pub fn light_selection(mut self, light_selection: LightSelection) -> Self {
        self.light_selection = light_selection;
        self
    }

    pub fn bvh_options(mut self, bvh_options: BvhOptions) -> Self {
        self.bvh_options = bvh_options;
        self
    }

    /// Build the aggregate, give every light its id and let lights that depend on the size of
    /// the world see its bounds. Area lights come first in id order.
    pub fn build(self) -> Result<Scene, Error> {
        let camera = self.camera.ok_or(Error::MissingCamera)?;
        let mut bvh = Bvh::build(self.entities, self.bvh_options)?;
        let world_bound = bvh.bounds();

        let mut lights: Vec<Arc<dyn Light>> = Vec::new();
        let mut has_passthrough = false;
        for entity in bvh.entities_mut() {
            has_passthrough |= !entity.occludes();
            if let Some(area_light) = entity.area_light_arc() {
                let light = Arc::clone(area_light).as_light();
                entity.light_id = Some(LightId(lights.len()));
                lights.push(light);
            }
        }
        let n_area_lights = lights.len();

        let mut infinite_lights = Vec::new();
        for mut light in self.lights {
            light.preprocess(&world_bound);
            if light.flags() == LightFlags::Infinite {
                infinite_lights.push(LightId(lights.len()));
            }
            lights.push(Arc::from(light));
        }

        let light_distribution = match self.light_selection {
            LightSelection::Uniform => None,
            LightSelection::Power if lights.is_empty() => None,
            LightSelection::Power => {
                let powers: Vec<Float> = lights.iter().map(|l| l.power().luminance()).collect();
                debug!(?powers, "light power distribution");
                Some(Distribution1D::new(&powers))
            }
        };

        info!(
            entities = bvh.entities().len(),
            area_lights = n_area_lights,
            lights = lights.len(),
            "scene built"
        );

        Ok(Scene {
            bvh,
            lights,
            infinite_lights,
            light_distribution,
            camera,
            camera_medium: self.camera_medium,
            has_passthrough,
        })
    }
}

#[allow(dead_code)]
fn _assert_sync() {
    fn is_sync<T: Sync + Send>() {}
    is_sync::<Scene>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{OrthographicCamera, default_screen_window};
    use crate::light::{PointLight, InfiniteAreaLight};
    use crate::shapes::Sphere;
    use crate::spectrum::Spectrum;
    use crate::{Point2i, Transform};
    use approx::assert_abs_diff_eq;

    fn camera() -> anyhow::Result<OrthographicCamera> {
        let res = Point2i::new(8, 8);
        Ok(OrthographicCamera::new(Transform::IDENTITY, res, default_screen_window(res), (0.0, 1.0))?)
    }

    fn sphere(x: Float) -> anyhow::Result<Entity> {
        Ok(Entity::new(Arc::new(Sphere::at(point3f!(x, 0, 5), 1.0)?)))
    }

    #[test]
    fn test_missing_camera() -> anyhow::Result<()> {
        let result = SceneBuilder::new().entity(sphere(0.0)?).build();
        assert!(matches!(result, Err(Error::MissingCamera)));
        Ok(())
    }

    #[test]
    fn test_no_lights() -> anyhow::Result<()> {
        let scene = SceneBuilder::new().entity(sphere(0.0)?).camera(camera()?).build()?;
        assert!(scene.sample_light(0.5).is_none());
        assert_eq!(scene.light_selection_pdf(LightId(0)), 0.0);
        Ok(())
    }

    #[test]
    fn test_selection_pdfs_sum_to_one() -> anyhow::Result<()> {
        for selection in [LightSelection::Uniform, LightSelection::Power] {
            let scene = SceneBuilder::new()
                .entity(sphere(0.0)?.with_diffuse_emission(Spectrum::uniform(2.0), false)?)
                .entity(sphere(3.0)?)
                .light(PointLight::at(point3f!(0, 4, 0), Spectrum::uniform(10.0))?)
                .light(PointLight::at(point3f!(0, -4, 0), Spectrum::uniform(1.0))?)
                .light_selection(selection)
                .camera(camera()?)
                .build()?;

            assert_eq!(scene.lights().len(), 3);
            let total: Float = (0..3).map(|i| scene.light_selection_pdf(LightId(i))).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1.0e-5);
            assert_eq!(scene.light_selection_pdf(LightId(7)), 0.0);

            for u in [0.0, 0.3, 0.7, 0.999] {
                let (id, _, pdf) = scene.sample_light(u).ok_or_else(|| anyhow::anyhow!("no light"))?;
                assert_abs_diff_eq!(pdf, scene.light_selection_pdf(id), epsilon = 1.0e-6);
            }
        }
        Ok(())
    }

    #[test]
    fn test_power_selection_prefers_bright_lights() -> anyhow::Result<()> {
        let scene = SceneBuilder::new()
            .entity(sphere(0.0)?)
            .light(PointLight::at(point3f!(0, 4, 0), Spectrum::uniform(9.0))?)
            .light(PointLight::at(point3f!(0, -4, 0), Spectrum::uniform(1.0))?)
            .camera(camera()?)
            .build()?;
        assert_abs_diff_eq!(scene.light_selection_pdf(LightId(0)), 0.9, epsilon = 1.0e-5);
        assert_abs_diff_eq!(scene.light_selection_pdf(LightId(1)), 0.1, epsilon = 1.0e-5);
        Ok(())
    }

    #[test]
    fn test_area_light_ids_point_back_to_entities() -> anyhow::Result<()> {
        let scene = SceneBuilder::new()
            .entity(sphere(0.0)?)
            .entity(sphere(3.0)?.with_diffuse_emission(Spectrum::uniform(1.0), true)?)
            .light(InfiniteAreaLight::new_uniform(Spectrum::uniform(0.5))?)
            .camera(camera()?)
            .build()?;

        let emitters: Vec<_> = scene.entities().iter().filter_map(|e| e.light_id()).collect();
        assert_eq!(emitters, vec![LightId(0)]);
        let infinite: Vec<_> = scene.infinite_lights().map(|(id, _)| id).collect();
        assert_eq!(infinite, vec![LightId(1)]);
        assert!(!scene.has_media(None));
        Ok(())
    }
}
