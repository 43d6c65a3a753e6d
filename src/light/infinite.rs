use crate::spectrum::Spectrum;
use crate::sampling::Distribution2D;
use crate::texture::{TextureRef, constant};
use crate::{Point3f, Float, Point2f, Ray, Transform, Vec3f, Bounds3f, Error, spherical_phi, spherical_theta};
use crate::light::{Light, LiSample, LightFlags, VisibilityTester};
use crate::interaction::SurfaceHit;
use crate::consts::{PI, INV_2_PI, FRAC_1_PI};
use cgmath::{EuclideanSpace, InnerSpace};

/// Radiance arriving from infinitely far away in every direction, given by a lat-long map over
/// the light space sphere with +z at v = 0.
pub struct InfiniteAreaLight {
    l_map: TextureRef<Spectrum>,
    distribution: Distribution2D,
    average: Spectrum,

    world_center: Point3f,
    world_radius: Float,
    light_to_world: Transform,
    world_to_light: Transform,
    ignore_first_medium: bool,
}

impl InfiniteAreaLight {
    /// `resolution` is the (u, v) grid the map is tabulated on for importance sampling.
    pub fn new_envmap(
        envmap: TextureRef<Spectrum>,
        resolution: (usize, usize),
        light_to_world: Transform,
    ) -> Result<Self, Error> {
        let (width, height) = resolution;
        if width == 0 || height == 0 {
            return Err(Error::InvalidParameter {
                what: "environment map resolution",
                reason: format!("{}x{} is empty", width, height),
            });
        }

        let mut img = vec![0.0; width * height];
        let mut sum = Spectrum::zero();
        for j in 0..height {
            let v = (j as Float + 0.5) / height as Float;
            let sin_theta = (PI * v).sin();
            for i in 0..width {
                let u = (i as Float + 0.5) / width as Float;
                let l = envmap.evaluate(Point2f::new(u, v));
                if !l.is_finite() || l.has_negative() {
                    return Err(Error::InvalidParameter {
                        what: "environment map radiance",
                        reason: format!("{:?} at ({}, {})", l, u, v),
                    });
                }
                img[i + j * width] = l.luminance().max(0.0) * sin_theta;
                sum += l;
            }
        }
        let distribution = Distribution2D::new(&img, width, height);

        Ok(Self {
            l_map: envmap,
            distribution,
            average: sum / (width * height) as Float,

            world_center: Point3f::origin(),
            world_radius: 0.0,
            light_to_world,
            world_to_light: light_to_world.inverse(),
            ignore_first_medium: false,
        })
    }

    pub fn new_uniform(radiance: Spectrum) -> Result<Self, Error> {
        Self::new_envmap(constant(radiance), (1, 1), Transform::IDENTITY)
    }

    pub fn with_ignore_first_medium(self, ignore_first_medium: bool) -> Self {
        Self { ignore_first_medium, ..self }
    }

    fn lookup(&self, w_world: Vec3f) -> Spectrum {
        let w = self.world_to_light.transform(w_world).normalize();
        let st = Point2f::new(spherical_phi(w) * INV_2_PI, spherical_theta(w) * FRAC_1_PI);
        self.l_map.evaluate(st)
    }
}

impl Light for InfiniteAreaLight {
    fn flags(&self) -> LightFlags {
        LightFlags::Infinite
    }

    fn preprocess(&mut self, world_bound: &Bounds3f) {
        let (center, radius) = world_bound.bounding_sphere();
        self.world_center = center;
        self.world_radius = radius;
    }

    fn sample_incident_radiance(&self, reference: &SurfaceHit, u: Point2f) -> Option<LiSample> {
        let (uv, map_pdf) = self.distribution.sample_continuous(u);
        if map_pdf == 0.0 {
            return None;
        }

        // map (u, v) sample to spherical coordinates
        let theta = uv.y * PI;
        let phi = uv.x * 2.0 * PI;
        let sin_theta = theta.sin();
        if sin_theta == 0.0 {
            return None;
        }
        // convert sample point to direction
        let wi = self.light_to_world.transform(Vec3f::new(
            sin_theta * phi.cos(),
            sin_theta * phi.sin(),
            theta.cos()
        )).normalize();

        let pdf = map_pdf / (2.0 * PI * PI * sin_theta);
        let p_outside = reference.p + wi * (2.0 * self.world_radius.max(1.0));

        Some(LiSample {
            radiance: self.l_map.evaluate(uv),
            wi,
            pdf,
            vis: VisibilityTester {
                p0: *reference,
                p1: SurfaceHit::at_point(p_outside, reference.time),
            },
        })
    }

    fn pdf_incident_radiance(&self, _reference: &SurfaceHit, w: Vec3f) -> Float {
        let wi = self.world_to_light.transform(w).normalize();
        let theta = spherical_theta(wi);
        let phi = spherical_phi(wi);
        let sin_theta = theta.sin();
        if sin_theta == 0.0 {
            return 0.0;
        }
        self.distribution.pdf(Point2f::new(phi * INV_2_PI, theta * FRAC_1_PI)) / (2.0 * PI * PI * sin_theta)
    }

    fn power(&self) -> Spectrum {
        PI * self.world_radius * self.world_radius * self.average
    }

    fn environment_emitted_radiance(&self, ray: &Ray) -> Spectrum {
        self.lookup(ray.dir)
    }

    fn ignores_first_medium(&self) -> bool {
        self.ignore_first_medium
    }
}
