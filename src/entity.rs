use crate::{Float, Ray, Vec3f, Bounds3f, SurfaceInteraction, Error};
use crate::shapes::Shape;
use crate::material::Material;
use crate::medium::{Medium, MediumInterface};
use crate::light::{AreaLight, DiffuseAreaLight, LightId};
use crate::spectrum::Spectrum;
use cgmath::InnerSpace;
use std::sync::Arc;

/// Position of an entity in the aggregate's input list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

/// A shape together with what happens when a ray hits it.
///
/// An entity with neither a material nor an area light only marks a boundary between media and
/// is invisible otherwise.
pub struct Entity {
    pub(crate) id: EntityId,
    shape: Arc<dyn Shape>,
    material: Option<Arc<dyn Material>>,
    medium_interface: Option<MediumInterface>,
    area_light: Option<Arc<dyn AreaLight>>,
    pub(crate) light_id: Option<LightId>,
}

impl Entity {
    pub fn new(shape: Arc<dyn Shape>) -> Self {
        Self {
            id: EntityId(0),
            shape,
            material: None,
            medium_interface: None,
            area_light: None,
            light_id: None,
        }
    }

    pub fn with_material(self, material: Arc<dyn Material>) -> Self {
        Self { material: Some(material), ..self }
    }

    pub fn with_medium_interface(self, medium_interface: MediumInterface) -> Self {
        Self { medium_interface: Some(medium_interface), ..self }
    }

    pub fn with_area_light(self, area_light: Arc<dyn AreaLight>) -> Self {
        Self { area_light: Some(area_light), ..self }
    }

    /// Make the entity's own shape a diffuse emitter.
    pub fn with_diffuse_emission(self, emit: Spectrum, two_sided: bool) -> Result<Self, Error> {
        let light = DiffuseAreaLight::new(emit, Arc::clone(&self.shape), two_sided)?;
        Ok(self.with_area_light(Arc::new(light)))
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    pub fn material(&self) -> Option<&dyn Material> {
        self.material.as_deref()
    }

    pub fn medium_interface(&self) -> Option<&MediumInterface> {
        self.medium_interface.as_ref()
    }

    pub fn area_light(&self) -> Option<&dyn AreaLight> {
        self.area_light.as_deref()
    }

    pub(crate) fn area_light_arc(&self) -> Option<&Arc<dyn AreaLight>> {
        self.area_light.as_ref()
    }

    /// The id the scene assigned to this entity's area light.
    pub fn light_id(&self) -> Option<LightId> {
        self.light_id
    }

    /// Whether the entity blocks shadow rays.
    pub fn occludes(&self) -> bool {
        self.material.is_some() || self.area_light.is_some()
    }

    pub fn world_bound(&self) -> Bounds3f {
        self.shape.world_bound()
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'_>> {
        let (t, si) = self.shape.intersect(ray)?;
        Some(Intersection { t, si, entity: self })
    }

    pub fn intersect_test(&self, ray: &Ray) -> bool {
        self.shape.intersect_test(ray)
    }
}

pub struct Intersection<'s> {
    pub t: Float,
    pub si: SurfaceInteraction,
    pub entity: &'s Entity,
}

impl<'s> Intersection<'s> {
    /// The medium a ray leaving the hit in direction `w` travels through. Without an
    /// interface the ray stays in `current`.
    pub fn medium(&self, w: Vec3f, current: Option<&'s dyn Medium>) -> Option<&'s dyn Medium> {
        match &self.entity.medium_interface {
            Some(mi) => {
                let side = if w.dot(self.si.hit.n.0) > 0.0 { &mi.outside } else { &mi.inside };
                side.as_deref()
            }
            None => current,
        }
    }

    /// Radiance emitted from the hit point towards `w`, zero if the entity is not a light.
    pub fn emitted_radiance(&self, w: Vec3f) -> Spectrum {
        self.entity.area_light
            .as_ref()
            .map_or_else(Spectrum::zero, |light| light.emitted_radiance(&self.si.hit, w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Sphere;
    use crate::medium::{HomogeneousMedium, MediumRef};

    #[test]
    fn test_medium_side_follows_normal() -> anyhow::Result<()> {
        let fog: MediumRef = Arc::new(HomogeneousMedium::new(Spectrum::uniform(0.1), Spectrum::uniform(0.1), 0.0)?);
        let entity = Entity::new(Arc::new(Sphere::at(point3f!(0, 0, 0), 1.0)?))
            .with_medium_interface(MediumInterface::new(Some(fog), None));
        assert!(!entity.occludes());

        let ray = Ray::new(point3f!(0, 0, -3), vec3f!(0, 0, 1));
        let isect = entity.intersect(&ray).ok_or_else(|| anyhow::anyhow!("missed"))?;
        // continuing into the sphere enters the fog
        assert!(isect.medium(ray.dir, None).is_some());
        // reflecting back out stays in vacuum
        assert!(isect.medium(-ray.dir, None).is_none());
        Ok(())
    }

    #[test]
    fn test_plain_entity_keeps_current_medium() -> anyhow::Result<()> {
        let fog: Arc<dyn Medium> = Arc::new(HomogeneousMedium::new(Spectrum::uniform(0.1), Spectrum::uniform(0.1), 0.0)?);
        let entity = Entity::new(Arc::new(Sphere::at(point3f!(0, 0, 0), 1.0)?))
            .with_diffuse_emission(Spectrum::uniform(1.0), false)?;
        assert!(entity.occludes());
        let ray = Ray::new(point3f!(0, 0, -3), vec3f!(0, 0, 1));
        let isect = entity.intersect(&ray).ok_or_else(|| anyhow::anyhow!("missed"))?;
        assert!(isect.medium(ray.dir, Some(fog.as_ref())).is_some());
        assert_eq!(isect.emitted_radiance(-ray.dir), Spectrum::uniform(1.0));
        assert!(isect.emitted_radiance(ray.dir).is_black());
        Ok(())
    }
}
