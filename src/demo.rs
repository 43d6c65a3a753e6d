//! Built-in scenes for the demo binary, the benchmarks and end-to-end tests.

use crate::camera::{PerspectiveCamera, default_screen_window};
use crate::entity::Entity;
use crate::material::{GlassMaterial, Material, MatteMaterial, MetalMaterial};
use crate::scene::{Scene, SceneBuilder};
use crate::shapes::{Sphere, TriangleMesh};
use crate::spectrum::Spectrum;
use crate::{Point2i, Point3f, Transform, Error};
use std::sync::Arc;

/// Two triangles spanning the corners `p`, given in order around the quad.
pub fn quad(p: [Point3f; 4]) -> Result<Vec<Entity>, Error> {
    let mesh = Arc::new(TriangleMesh::new(&Transform::IDENTITY, vec![0, 1, 2, 0, 2, 3], p.to_vec(), None, None)?);
    Ok(mesh.triangles().map(|tri| Entity::new(Arc::new(tri))).collect())
}

fn walls(p: [Point3f; 4], material: &Arc<dyn Material>) -> Result<Vec<Entity>, Error> {
    Ok(quad(p)?.into_iter().map(|e| e.with_material(Arc::clone(material))).collect())
}

/// The classic box with a red left wall, a green right wall and a square light in the ceiling,
/// holding a glass ball and a brushed metal ball. The box spans [-1, 1] on every axis and the
/// camera looks down +z through its open front.
pub fn cornell_box(resolution: Point2i) -> Result<Scene, Error> {
    let white: Arc<dyn Material> = Arc::new(MatteMaterial::constant(Spectrum::uniform(0.73), 0.0)?);
    let red: Arc<dyn Material> = Arc::new(MatteMaterial::constant(Spectrum::rgb(0.63, 0.065, 0.05), 0.0)?);
    let green: Arc<dyn Material> = Arc::new(MatteMaterial::constant(Spectrum::rgb(0.14, 0.45, 0.091), 0.0)?);

    let mut entities = Vec::new();
    // floor, ceiling, back
    entities.extend(walls([point3f!(-1, -1, -1), point3f!(1, -1, -1), point3f!(1, -1, 1), point3f!(-1, -1, 1)], &white)?);
    entities.extend(walls([point3f!(-1, 1, -1), point3f!(-1, 1, 1), point3f!(1, 1, 1), point3f!(1, 1, -1)], &white)?);
    entities.extend(walls([point3f!(-1, -1, 1), point3f!(1, -1, 1), point3f!(1, 1, 1), point3f!(-1, 1, 1)], &white)?);
    entities.extend(walls([point3f!(-1, -1, -1), point3f!(-1, -1, 1), point3f!(-1, 1, 1), point3f!(-1, 1, -1)], &red)?);
    entities.extend(walls([point3f!(1, -1, -1), point3f!(1, 1, -1), point3f!(1, 1, 1), point3f!(1, -1, 1)], &green)?);

    let light_y = 0.995;
    for tri in quad([
        point3f!(-0.25, light_y, -0.25),
        point3f!(0.25, light_y, -0.25),
        point3f!(0.25, light_y, 0.25),
        point3f!(-0.25, light_y, 0.25),
    ])? {
        entities.push(tri.with_diffuse_emission(Spectrum::uniform(17.0), true)?);
    }

    let glass = GlassMaterial::constant(Spectrum::uniform(1.0), Spectrum::uniform(1.0), 1.5)?;
    entities.push(Entity::new(Arc::new(Sphere::at(point3f!(-0.4, -0.65, 0.2), 0.35)?)).with_material(Arc::new(glass)));
    let metal = MetalMaterial::constant(Spectrum::rgb(0.2, 0.92, 1.1), Spectrum::rgb(3.9, 2.45, 2.14), 0.25)?;
    entities.push(Entity::new(Arc::new(Sphere::at(point3f!(0.45, -0.7, -0.2), 0.3)?)).with_material(Arc::new(metal)));

    let camera_to_world = Transform::camera_look_at(point3f!(0, 0, -3.4), point3f!(0, 0, 0), vec3f!(0, 1, 0))?;
    let camera = PerspectiveCamera::new(
        camera_to_world,
        resolution,
        default_screen_window(resolution),
        (0.0, 1.0),
        0.0,
        1.0,
        39.0,
    )?;

    SceneBuilder::new().entities(entities).camera(camera).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cornell_box_builds() -> anyhow::Result<()> {
        let scene = cornell_box(Point2i::new(32, 32))?;
        // 5 walls and the light are two triangles each
        assert_eq!(scene.entities().len(), 14);
        assert_eq!(scene.lights().len(), 2);
        Ok(())
    }
}
