use crate::{Point3f, Transform, Bounds3f, Ray, Float, SurfaceInteraction, SurfaceHit, Normal3, Vec3f, Point2f, ComponentWiseExt, Error};
use crate::geometry::{max_dimension, permute_vec, permute_point, coordinate_system};
use crate::err_float::gamma;
use crate::interaction::DiffGeom;
use crate::sampling::uniform_sample_triangle;
use crate::shapes::Shape;
use cgmath::{EuclideanSpace, InnerSpace};
use std::sync::Arc;

/// Shared vertex data for a set of triangles. Vertices and normals are stored in world space.
#[derive(Debug)]
pub struct TriangleMesh {
    pub n_triangles: usize,

    vertex_indices: Vec<u32>,

    vertices: Vec<Point3f>,

    normals: Option<Vec<Normal3>>,

    tex_coords: Option<Vec<Point2f>>,
}

impl TriangleMesh {
    pub fn new(
        object_to_world: &Transform,
        vertex_indices: Vec<u32>,
        mut vertices: Vec<Point3f>,
        mut normals: Option<Vec<Normal3>>,
        tex_coords: Option<Vec<Point2f>>,
    ) -> Result<Self, Error> {
        if vertex_indices.len() % 3 != 0 {
            return Err(Error::DegenerateGeometry(
                format!("mesh index count {} is not a multiple of 3", vertex_indices.len())
            ));
        }
        let n_triangles = vertex_indices.len() / 3;
        let n_vertices = vertices.len();

        if let Some(&bad) = vertex_indices.iter().find(|&&i| i as usize >= n_vertices) {
            return Err(Error::DegenerateGeometry(
                format!("mesh index {} out of range for {} vertices", bad, n_vertices)
            ));
        }

        for v in &mut vertices {
            *v = object_to_world.transform(*v);
            if !v.is_finite() {
                return Err(Error::DegenerateGeometry(format!("non-finite mesh vertex {:?}", v)));
            }
        }

        if let Some(ref mut normals) = normals {
            if normals.len() != n_vertices {
                return Err(Error::DegenerateGeometry(
                    format!("{} normals for {} vertices", normals.len(), n_vertices)
                ));
            }
            for n in normals {
                *n = object_to_world.transform(*n);
            }
        }

        if let Some(ref tex_coords) = tex_coords {
            if tex_coords.len() != n_vertices {
                return Err(Error::DegenerateGeometry(
                    format!("{} texture coordinates for {} vertices", tex_coords.len(), n_vertices)
                ));
            }
        }

        Ok(Self {
            n_triangles,
            vertex_indices,
            vertices,
            normals,
            tex_coords
        })
    }

    /// One shape per triangle, all sharing the mesh.
    pub fn triangles(self: &Arc<Self>) -> impl Iterator<Item=Triangle> + '_ {
        (0..self.n_triangles).map(move |i| Triangle::new(Arc::clone(self), i))
    }
}

pub struct Triangle {
    mesh: Arc<TriangleMesh>,
    tri_id: usize,
}

impl Triangle {
    pub fn new(mesh: Arc<TriangleMesh>, tri_id: usize) -> Self {
        debug_assert!(tri_id < mesh.n_triangles);
        Self { mesh, tri_id }
    }

    fn indices(&self) -> [usize; 3] {
        let i = 3 * self.tri_id;
        let v = &self.mesh.vertex_indices;
        [v[i] as usize, v[i + 1] as usize, v[i + 2] as usize]
    }

    fn positions(&self) -> [Point3f; 3] {
        let v = self.indices();
        let verts = &self.mesh.vertices;
        [verts[v[0]], verts[v[1]], verts[v[2]]]
    }

    fn get_uvs(&self) -> [Point2f; 3] {
        self.mesh.tex_coords.as_ref().map_or_else(
            || [(0.0, 0.0).into(), (1.0, 0.0).into(), (1.0, 1.0).into()],
            |uvs| {
                let v = self.indices();
                [uvs[v[0]], uvs[v[1]], uvs[v[2]]]
            }
        )
    }

    fn interpolated_normal(&self, b: [Float; 3]) -> Option<Normal3> {
        let normals = self.mesh.normals.as_ref()?;
        let v = self.indices();
        let ns = b[0] * normals[v[0]].0 + b[1] * normals[v[1]].0 + b[2] * normals[v[2]].0;
        if ns.magnitude2() > 0.0 { Some(Normal3(ns.normalize())) } else { None }
    }

    /// Watertight ray/triangle test. Returns the barycentric coordinates and hit distance.
    fn hit(&self, ray: &Ray) -> Option<([Float; 3], Float)> {
        let [p0, p1, p2] = self.positions();

        // First compute an affine transformation that transforms the ray such that its origin is at
        // (0, 0, 0) and points along the +z axis.

        // translate vertices based on ray origin.
        let mut p0t = p0 - ray.origin.to_vec();
        let mut p1t = p1 - ray.origin.to_vec();
        let mut p2t = p2 - ray.origin.to_vec();

        // permute components of triangle vertices and ray dir
        let kz = max_dimension(ray.dir.abs());
        let kx = (kz + 1) % 3;
        let ky = (kx + 1) % 3;
        let dir = permute_vec(ray.dir, kx, ky, kz);
        p0t = permute_point(p0t, kx, ky, kz);
        p1t = permute_point(p1t, kx, ky, kz);
        p2t = permute_point(p2t, kx, ky, kz);

        // Apply a shear transformation to align the ray with the +z axis.
        // Only shear the x and y dimensions of the vertices at first, wait to apply the z shear
        // if the ray actually intersects the triangle.
        let shear_x = -dir.x / dir.z;
        let shear_y = -dir.y / dir.z;
        let shear_z = 1.0 / dir.z;
        p0t.x += shear_x * p0t.z;
        p0t.y += shear_y * p0t.z;
        p1t.x += shear_x * p1t.z;
        p1t.y += shear_y * p1t.z;
        p2t.x += shear_x * p2t.z;
        p2t.y += shear_y * p2t.z;

        // compute edge function coefficients
        let mut e0 = p1t.x * p2t.y - p1t.y * p2t.x; // p1 to p2
        let mut e1 = p2t.x * p0t.y - p2t.y * p0t.x; // p2 to p0
        let mut e2 = p0t.x * p1t.y - p0t.y * p1t.x; // p0 to p1

        // recompute in double precision when the origin lies exactly on an edge
        if e0 == 0.0 || e1 == 0.0 || e2 == 0.0 {
            let (x0, y0) = (p0t.x as f64, p0t.y as f64);
            let (x1, y1) = (p1t.x as f64, p1t.y as f64);
            let (x2, y2) = (p2t.x as f64, p2t.y as f64);
            e0 = (x1 * y2 - y1 * x2) as Float;
            e1 = (x2 * y0 - y2 * x0) as Float;
            e2 = (x0 * y1 - y0 * x1) as Float;
        }

        // if the edge function signs differ, then the point (0, 0) is not on the same side
        // of all three edges so therefore is outside the triangle.
        if (e0 < 0.0 || e1 < 0.0 || e2 < 0.0) && (e0 > 0.0 || e1 > 0.0 || e2 > 0.0) {
            return None;
        }

        let det = e0 + e1 + e2;
        if det == 0.0 { return None; }

        // Compute scaled hit distance to triangle and test against ray t range
        p0t.z *= shear_z;
        p1t.z *= shear_z;
        p2t.z *= shear_z;
        let t_scaled = e0 * p0t.z + e1 * p1t.z + e2 * p2t.z;
        if det < 0.0 && (t_scaled >= 0.0 || t_scaled < ray.t_max * det) {
            return None;
        } else if det > 0.0 && (t_scaled <= 0.0 || t_scaled > ray.t_max * det) {
            return None;
        }

        // now we know there is a valid intersection.
        // compute barycentric coordinates and actual t value.
        let inv_det = 1.0 / det;
        let b0 = e0 * inv_det;
        let b1 = e1 * inv_det;
        let b2 = e2 * inv_det;
        let t = t_scaled * inv_det;

        // make sure t is conservatively greater than zero
        let max_zt = vec3f!(p0t.z, p1t.z, p2t.z).abs().max_component();
        let delta_z = gamma(3) * max_zt;

        let max_xt = vec3f!(p0t.x, p1t.x, p2t.x).abs().max_component();
        let max_yt = vec3f!(p0t.y, p1t.y, p2t.y).abs().max_component();
        let delta_x = gamma(5) * (max_xt + max_zt);
        let delta_y = gamma(5) * (max_yt + max_zt);

        let delta_e = 2.0 * (gamma(2) * max_xt * max_yt + delta_y * max_xt + delta_x * max_yt);
        let max_e = vec3f!(e0, e1, e2).abs().max_component();
        let delta_t = 3.0 * (gamma(3) * max_e * max_zt + delta_e * max_zt + delta_z * max_e) * inv_det.abs();
        if t <= delta_t || t < ray.t_min {
            return None;
        }

        Some(([b0, b1, b2], t))
    }
}

impl Shape for Triangle {
    fn world_bound(&self) -> Bounds3f {
        let [p0, p1, p2] = self.positions();
        Bounds3f::with_bounds(p0, p1).join_point(&p2)
    }

    fn intersect(&self, ray: &Ray) -> Option<(Float, SurfaceInteraction)> {
        let (b, t) = self.hit(ray)?;
        let [p0, p1, p2] = self.positions();

        // compute triangle partial derivatives.
        let uv = self.get_uvs();
        let duv02 = uv[0] - uv[2];
        let duv12 = uv[1] - uv[2];
        let dp02 = p0 - p2;
        let dp12 = p1 - p2;

        let determinant = duv02[0] * duv12[1] - duv02[1] * duv12[0];
        let ng = dp02.cross(dp12);
        if ng.magnitude2() == 0.0 {
            return None;
        }
        let ng = ng.normalize();

        let degenerate_uv = determinant.abs() < 1.0e-8;
        let (dpdu, dpdv) = if degenerate_uv {
            coordinate_system(ng)
        } else {
            let inv_det = 1.0 / determinant;
            let dpdu = (duv12[1] * dp02 - duv02[1] * dp12) * inv_det;
            let dpdv = (-duv12[0] * dp02 + duv02[0] * dp12) * inv_det;
            if dpdu.cross(dpdv).magnitude2() == 0.0 { coordinate_system(ng) } else { (dpdu, dpdv) }
        };

        // interpolate uv coordinates and hit point using barycentric coordinates
        let p_hit = Point3f::from_vec(b[0] * p0.to_vec() + b[1] * p1.to_vec() + b[2] * p2.to_vec());
        let uv_hit = Point2f::from_vec(b[0] * uv[0].to_vec() + b[1] * uv[1].to_vec() + b[2] * uv[2].to_vec());

        let p_abs_sum = (b[0] * p0.to_vec()).abs() + (b[1] * p1.to_vec()).abs() + (b[2] * p2.to_vec()).abs();
        let p_err = gamma(7) * p_abs_sum;

        let diff_geom = DiffGeom {
            dpdu,
            dpdv,
            dndu: Normal3::zero(),
            dndv: Normal3::zero(),
        };

        let mut isect = SurfaceInteraction::new(
            p_hit,
            p_err,
            ray.time,
            uv_hit,
            -ray.dir,
            Normal3(ng),
            diff_geom
        );

        if let Some(ns) = self.interpolated_normal(b) {
            // Gram-Schmidt the shading tangent against the interpolated normal
            let ss = dpdu.normalize();
            let ts = ns.cross(ss);
            let (ss, ts) = if ts.magnitude2() > 0.0 {
                (ts.normalize().cross(ns.0), ts.normalize())
            } else {
                coordinate_system(ns.0)
            };
            let shading_geom = DiffGeom { dpdu: ss, dpdv: ts, ..diff_geom };
            isect.set_shading_geometry(ns, shading_geom);
        }

        Some((t, isect))
    }

    fn intersect_test(&self, ray: &Ray) -> bool {
        self.hit(ray).is_some()
    }

    fn area(&self) -> Float {
        let [p0, p1, p2] = self.positions();
        0.5 * (p1 - p0).cross(p2 - p0).magnitude()
    }

    fn sample(&self, u: Point2f) -> SurfaceHit {
        let [p0, p1, p2] = self.positions();
        let b = uniform_sample_triangle(u);
        let b2 = 1.0 - b[0] - b[1];
        let p = Point3f::from_vec(b[0] * p0.to_vec() + b[1] * p1.to_vec() + b2 * p2.to_vec());

        let mut n = Normal3((p1 - p0).cross(p2 - p0).normalize());
        if let Some(ns) = self.interpolated_normal([b[0], b[1], b2]) {
            n = n.faceforward(ns.0);
        }

        let p_abs_sum = (b[0] * p0.to_vec()).abs() + (b[1] * p1.to_vec()).abs() + (b2 * p2.to_vec()).abs();
        SurfaceHit { p, p_err: gamma(6) * p_abs_sum, time: 0.0, n }
    }
}
