use crate::{Float, Vec3f, Point2f, Error};
use crate::consts::PI;
use crate::spectrum::Spectrum;
use crate::shapes::{Shape, solid_angle_pdf};
use crate::light::{AreaLight, Light, LiSample, LightFlags, VisibilityTester, check_radiance};
use crate::interaction::SurfaceHit;
use cgmath::InnerSpace;
use std::sync::Arc;

/// Uniform emission from the surface of a shape, on the side the normal points to unless
/// two-sided.
pub struct DiffuseAreaLight {
    emit: Spectrum,
    shape: Arc<dyn Shape>,
    area: Float,
    two_sided: bool,
    ignore_first_medium: bool,
}

impl DiffuseAreaLight {
    pub fn new(emit: Spectrum, shape: Arc<dyn Shape>, two_sided: bool) -> Result<Self, Error> {
        let area = shape.area();
        if !(area.is_finite() && area > 0.0) {
            return Err(Error::DegenerateGeometry(format!("area light shape with area {}", area)));
        }
        Ok(Self {
            emit: check_radiance("area light radiance", emit)?,
            shape,
            area,
            two_sided,
            ignore_first_medium: false,
        })
    }

    pub fn with_ignore_first_medium(self, ignore_first_medium: bool) -> Self {
        Self { ignore_first_medium, ..self }
    }
}

impl AreaLight for DiffuseAreaLight {
    fn emitted_radiance(&self, hit: &SurfaceHit, w: Vec3f) -> Spectrum {
        if self.two_sided || hit.n.dot(w) > 0.0 {
            self.emit
        } else {
            Spectrum::zero()
        }
    }

    fn pdf_from_hit(&self, reference: &SurfaceHit, hit: &SurfaceHit) -> Float {
        solid_angle_pdf(reference, hit, self.area)
    }

    fn as_light(self: Arc<Self>) -> Arc<dyn Light> {
        self
    }
}

impl Light for DiffuseAreaLight {
    fn flags(&self) -> LightFlags {
        LightFlags::Area
    }

    fn sample_incident_radiance(&self, reference: &SurfaceHit, u: Point2f) -> Option<LiSample> {
        let (p_shape, pdf) = self.shape.sample_from_ref(reference, u)?;
        if pdf == 0.0 {
            return None;
        }
        let wi = (p_shape.p - reference.p).normalize();
        let radiance = self.emitted_radiance(&p_shape, -wi);
        if radiance.is_black() {
            return None;
        }
        let vis = VisibilityTester {
            p0: *reference,
            p1: p_shape,
        };
        Some(LiSample {
            radiance,
            wi,
            pdf,
            vis
        })
    }

    fn pdf_incident_radiance(&self, reference: &SurfaceHit, wi: Vec3f) -> Float {
        self.shape.pdf_from_ref(reference, wi)
    }

    fn power(&self) -> Spectrum {
        let sides = if self.two_sided { 2.0 } else { 1.0 };
        sides * PI * self.area * self.emit
    }

    fn ignores_first_medium(&self) -> bool {
        self.ignore_first_medium
    }
}
