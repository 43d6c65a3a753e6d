use crate::{Point2f, Float, Ray, Bounds2f, Point2i, Point3f, Vec3f, Error};
use crate::geometry::{Transform, Transformable};
use crate::math::lerp;
use crate::sampling::concentric_sample_disk;
use cgmath::{InnerSpace, EuclideanSpace};

#[derive(Clone, Copy, Debug)]
pub struct CameraSample {
    pub p_film: Point2f,
    pub p_lens: Point2f,
    pub time: Float
}

/// A world-space ray leaving the camera, with the weight its radiance should be scaled by and
/// the directional density it was generated with.
#[derive(Clone, Copy, Debug)]
pub struct CameraRay {
    pub ray: Ray,
    pub weight: Float,
    pub pdf: Float,
}

pub trait Camera: Send + Sync {
    fn generate_ray(&self, sample: CameraSample) -> Option<CameraRay>;
}

/// The screen window that keeps square pixels for the given resolution, spanning [-1, 1] along
/// the shorter image axis.
pub fn default_screen_window(full_resolution: Point2i) -> Bounds2f {
    let aspect = full_resolution.x as Float / full_resolution.y as Float;
    if aspect > 1.0 {
        Bounds2f::with_bounds(Point2f::new(-aspect, -1.0), Point2f::new(aspect, 1.0))
    } else {
        Bounds2f::with_bounds(Point2f::new(-1.0, -1.0 / aspect), Point2f::new(1.0, 1.0 / aspect))
    }
}

struct CameraProjection {
    raster_to_camera: Transform,
}

impl CameraProjection {
    fn new(
        camera_to_screen: Transform,
        full_resolution: Point2i,
        screen_window: Bounds2f,
    ) -> Result<Self, Error> {
        if full_resolution.x <= 0 || full_resolution.y <= 0 {
            return Err(Error::InvalidParameter {
                what: "camera resolution",
                reason: format!("{}x{} is empty", full_resolution.x, full_resolution.y),
            });
        }
        if screen_window.is_empty() {
            return Err(Error::InvalidParameter {
                what: "camera screen window",
                reason: format!("{:?} is empty", screen_window),
            });
        }

        // raster y grows downwards, screen y upwards
        let screen_to_raster =
            Transform::scale(full_resolution.x as Float, full_resolution.y as Float, 1.0) *
            Transform::scale(
                1.0 / (screen_window.max.x - screen_window.min.x),
                1.0 / (screen_window.min.y - screen_window.max.y),
                1.0
            ) *
            Transform::translate(vec3f!(-screen_window.min.x, -screen_window.max.y, 0.0));

        let raster_to_screen = screen_to_raster.inverse();
        let raster_to_camera = camera_to_screen.inverse() * raster_to_screen;

        Ok(Self { raster_to_camera })
    }

    fn film_to_camera(&self, p_film: Point2f) -> Point3f {
        self.raster_to_camera.transform(Point3f::new(p_film.x, p_film.y, 0.0))
    }
}

pub struct PerspectiveCamera {
    camera_to_world: Transform,
    proj: CameraProjection,
    shutter_interval: (Float, Float),
    lens_radius: Float,
    focal_dist: Float,
    /// Area of the image on the z = 1 plane
    film_area: Float,
}

impl PerspectiveCamera {
    /// `fov` is in degrees and spans the shorter image axis. A `lens_radius` of zero gives a
    /// pinhole camera.
    pub fn new(
        camera_to_world: Transform,
        full_resolution: Point2i,
        screen_window: Bounds2f,
        shutter_interval: (Float, Float),
        lens_radius: Float,
        focal_dist: Float,
        fov: Float
    ) -> Result<Self, Error> {
        if !(fov > 0.0 && fov < 180.0) {
            return Err(Error::InvalidParameter { what: "field of view", reason: format!("{} is not in (0, 180)", fov) });
        }
        if !(lens_radius >= 0.0) || (lens_radius > 0.0 && !(focal_dist > 0.0)) {
            return Err(Error::InvalidParameter {
                what: "lens",
                reason: format!("radius {} with focal distance {}", lens_radius, focal_dist),
            });
        }

        let persp = Transform::perspective(fov, 1.0e-2, 1000.0);
        let proj = CameraProjection::new(persp, full_resolution, screen_window)?;
        let p_min = proj.film_to_camera(Point2f::new(0.0, 0.0));
        let p_max = proj.film_to_camera(Point2f::new(full_resolution.x as Float, full_resolution.y as Float));
        let p_min = p_min / p_min.z;
        let p_max = p_max / p_max.z;
        let film_area = ((p_max.x - p_min.x) * (p_max.y - p_min.y)).abs();

        Ok(Self {
            camera_to_world,
            proj,
            shutter_interval,
            lens_radius,
            focal_dist,
            film_area
        })
    }
}

impl Camera for PerspectiveCamera {
    fn generate_ray(&self, sample: CameraSample) -> Option<CameraRay> {
        let p_camera = self.proj.film_to_camera(sample.p_film);
        let dir = p_camera.to_vec().normalize();
        let cos_theta = dir.z;
        if !(cos_theta > 0.0) {
            return None;
        }

        let mut origin = Point3f::origin();
        let mut dir_lens = dir;
        if self.lens_radius > 0.0 {
            let p_lens = self.lens_radius * concentric_sample_disk(sample.p_lens);
            let ft = self.focal_dist / dir.z;
            let p_focus = Point3f::origin() + dir * ft;
            origin = Point3f::new(p_lens.x, p_lens.y, 0.0);
            dir_lens = (p_focus - origin).normalize();
        }

        let time = lerp(sample.time, self.shutter_interval.0, self.shutter_interval.1);
        let ray = Ray { origin, dir: dir_lens, t_min: 0.0, t_max: Float::INFINITY, time };
        let ray = self.camera_to_world.transform(ray);

        let pdf = 1.0 / (self.film_area * cos_theta * cos_theta * cos_theta);
        Some(CameraRay { ray, weight: 1.0, pdf })
    }
}

pub struct OrthographicCamera {
    camera_to_world: Transform,
    proj: CameraProjection,
    shutter_interval: (Float, Float),
}

impl OrthographicCamera {
    pub fn new(
        camera_to_world: Transform,
        full_resolution: Point2i,
        screen_window: Bounds2f,
        shutter_interval: (Float, Float),
    ) -> Result<Self, Error> {
        let proj = CameraProjection::new(Transform::orthographic(0.0, 1.0), full_resolution, screen_window)?;
        Ok(Self { camera_to_world, proj, shutter_interval })
    }
}

impl Camera for OrthographicCamera {
    fn generate_ray(&self, sample: CameraSample) -> Option<CameraRay> {
        let origin = self.proj.film_to_camera(sample.p_film);
        let dir = Vec3f::new(0.0, 0.0, 1.0);
        let time = lerp(sample.time, self.shutter_interval.0, self.shutter_interval.1);
        let ray = Ray { origin, dir, t_min: 0.0, t_max: Float::INFINITY, time };
        Some(CameraRay { ray: self.camera_to_world.transform(ray), weight: 1.0, pdf: 1.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn center_sample(res: Point2i) -> CameraSample {
        CameraSample {
            p_film: Point2f::new(res.x as Float / 2.0, res.y as Float / 2.0),
            p_lens: Point2f::new(0.5, 0.5),
            time: 0.0,
        }
    }

    #[test]
    fn test_perspective_center_ray_looks_forward() -> anyhow::Result<()> {
        let res = Point2i::new(64, 32);
        let tf = Transform::camera_look_at(point3f!(0, 0, -5), point3f!(0, 0, 0), vec3f!(0, 1, 0))?;
        let cam = PerspectiveCamera::new(tf, res, default_screen_window(res), (0.0, 1.0), 0.0, 1.0, 60.0)?;
        let cr = cam.generate_ray(center_sample(res)).ok_or_else(|| anyhow::anyhow!("no ray"))?;
        assert_abs_diff_eq!(cr.ray.dir, vec3f!(0, 0, 1), epsilon = 1.0e-4);
        assert_abs_diff_eq!(cr.ray.origin, point3f!(0, 0, -5), epsilon = 1.0e-4);

        // the top left corner ray points up and to the left in camera space
        let corner = CameraSample { p_film: Point2f::new(0.0, 0.0), ..center_sample(res) };
        let cr = cam.generate_ray(corner).ok_or_else(|| anyhow::anyhow!("no ray"))?;
        assert!(cr.ray.dir.y > 0.0);
        Ok(())
    }

    #[test]
    fn test_thin_lens_focuses() -> anyhow::Result<()> {
        let res = Point2i::new(16, 16);
        let cam = PerspectiveCamera::new(Transform::IDENTITY, res, default_screen_window(res), (0.0, 1.0), 0.5, 4.0, 45.0)?;
        for lens in [Point2f::new(0.1, 0.9), Point2f::new(0.8, 0.3)] {
            let cr = cam.generate_ray(CameraSample { p_lens: lens, ..center_sample(res) })
                .ok_or_else(|| anyhow::anyhow!("no ray"))?;
            let t = (4.0 - cr.ray.origin.z) / cr.ray.dir.z;
            let p = cr.ray.at(t);
            assert_abs_diff_eq!(p.x, 0.0, epsilon = 1.0e-4);
            assert_abs_diff_eq!(p.y, 0.0, epsilon = 1.0e-4);
        }
        Ok(())
    }

    #[test]
    fn test_orthographic_window() -> anyhow::Result<()> {
        let res = Point2i::new(10, 10);
        let window = Bounds2f::with_bounds(Point2f::new(-2.0, -2.0), Point2f::new(2.0, 2.0));
        let cam = OrthographicCamera::new(Transform::IDENTITY, res, window, (0.0, 1.0))?;
        let s = CameraSample { p_film: Point2f::new(0.0, 0.0), p_lens: Point2f::new(0.0, 0.0), time: 0.0 };
        let cr = cam.generate_ray(s).ok_or_else(|| anyhow::anyhow!("no ray"))?;
        assert_abs_diff_eq!(cr.ray.origin.x, -2.0, epsilon = 1.0e-4);
        assert_abs_diff_eq!(cr.ray.origin.y, 2.0, epsilon = 1.0e-4);
        assert_abs_diff_eq!(cr.ray.dir, vec3f!(0, 0, 1));
        Ok(())
    }

    #[test]
    fn test_rejects_bad_fov() {
        let res = Point2i::new(4, 4);
        assert!(PerspectiveCamera::new(Transform::IDENTITY, res, default_screen_window(res), (0.0, 1.0), 0.0, 1.0, 0.0).is_err());
    }
}
