use cgmath::{Point2, Vector2, EuclideanSpace, InnerSpace};
use crate::{Scalar, Float, Point2i, Point3f, Vec3f, Ray, ComponentWiseExt};
use crate::err_float::gamma;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2<S: Scalar> {
    pub min: Point2<S>,
    pub max: Point2<S>
}

pub type Bounds2i = Bounds2<i32>;
pub type Bounds2f = Bounds2<Float>;

impl<S: Scalar> Bounds2<S> {

    pub fn empty() -> Self {
        Self {
            min: Point2::new(S::max_value(), S::max_value()),
            max: Point2::new(S::min_value(), S::min_value())
        }
    }

    pub fn with_bounds(p1: Point2<S>, p2: Point2<S>) -> Self {
        Self {
            min: Point2::new(p1.x.min(p2.x), p1.y.min(p2.y)),
            max: Point2::new(p1.x.max(p2.x), p1.y.max(p2.y)),
        }
    }

    pub fn diagonal(&self) -> Vector2<S> {
        self.max - self.min
    }

    pub fn area(&self) -> S {
        let d = self.diagonal();
        d.x * d.y
    }

    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            min: Point2::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point2::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        }
    }

    /// Whether `p` is inside the bounds, treating the upper boundary as exclusive.
    pub fn contains_exclusive(&self, p: Point2<S>) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }
}

impl Bounds2<Float> {
    pub fn unit() -> Self {
        Self::with_bounds(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0))
    }
}

impl Bounds2<i32> {
    pub fn from_resolution(width: u32, height: u32) -> Self {
        Self::with_bounds(Point2i::new(0, 0), Point2i::new(width as i32, height as i32))
    }

    /// Iterate over every integer point in the bounds in row-major order, excluding the max edges.
    pub fn iter_points(self) -> impl Iterator<Item=Point2i> {
        (self.min.y..self.max.y)
            .flat_map(move |y| (self.min.x..self.max.x).map(move |x| Point2i::new(x, y)))
    }

    /// Split the bounds into a grid of tiles of at most `tile_size` pixels on each side, in
    /// row-major order. Tiles on the right and bottom edges are clipped to the bounds.
    pub fn iter_tiles(self, tile_size: u32) -> impl Iterator<Item=Bounds2i> {
        let n_tiles = self.tile_counts(tile_size);
        let tile_size = self.grid_tile_size(tile_size);
        (0..n_tiles.y).flat_map(move |ty| {
            (0..n_tiles.x).map(move |tx| {
                let min = Point2i::new(self.min.x + tx * tile_size, self.min.y + ty * tile_size);
                let max = Point2i::new(
                    Ord::min(min.x.saturating_add(tile_size), self.max.x),
                    Ord::min(min.y.saturating_add(tile_size), self.max.y)
                );
                Bounds2i::with_bounds(min, max)
            })
        })
    }

    pub fn tile_counts(&self, tile_size: u32) -> Vector2<i32> {
        let tile_size = self.grid_tile_size(tile_size) as u32;
        let d = self.diagonal();
        Vector2::new(
            (Ord::max(d.x, 0) as u32).div_ceil(tile_size) as i32,
            (Ord::max(d.y, 0) as u32).div_ceil(tile_size) as i32,
        )
    }

    /// Tiles never need to be larger than the longer side of the bounds.
    fn grid_tile_size(&self, tile_size: u32) -> i32 {
        let d = self.diagonal();
        let extent = Ord::max(Ord::max(d.x, d.y), 1) as u32;
        tile_size.clamp(1, extent) as i32
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds3f {
    pub min: Point3f,
    pub max: Point3f,
}

impl Bounds3f {
    /// An empty box that acts as the identity for `join`.
    pub fn empty() -> Self {
        Self {
            min: Point3f::new(Float::INFINITY, Float::INFINITY, Float::INFINITY),
            max: Point3f::new(Float::NEG_INFINITY, Float::NEG_INFINITY, Float::NEG_INFINITY),
        }
    }

    pub fn with_bounds(p1: Point3f, p2: Point3f) -> Self {
        Self {
            min: Point3f::new(p1.x.min(p2.x), p1.y.min(p2.y), p1.z.min(p2.z)),
            max: Point3f::new(p1.x.max(p2.x), p1.y.max(p2.y), p1.z.max(p2.z)),
        }
    }

    pub fn from_point(p: Point3f) -> Self {
        Self { min: p, max: p }
    }

    pub fn join(&self, other: &Self) -> Self {
        Self {
            min: Point3f::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y), self.min.z.min(other.min.z)),
            max: Point3f::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y), self.max.z.max(other.max.z)),
        }
    }

    pub fn join_point(&self, p: &Point3f) -> Self {
        self.join(&Self::from_point(*p))
    }

    pub fn diagonal(&self) -> Vec3f {
        self.max - self.min
    }

    pub fn centroid(&self) -> Point3f {
        self.min.midpoint(self.max)
    }

    pub fn surface_area(&self) -> Float {
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    pub fn maximum_extent(&self) -> usize {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn inside(&self, p: Point3f) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }

    pub fn bounding_sphere(&self) -> (Point3f, Float) {
        if self.is_empty() {
            return (Point3f::origin(), 0.0);
        }
        let center = self.centroid();
        let radius = if self.inside(center) { (self.max - center).magnitude() } else { 0.0 };
        (center, radius)
    }

    fn corner(&self, upper: bool) -> Point3f {
        if upper { self.max } else { self.min }
    }

    /// Slab test against a ray with precomputed reciprocal direction. The bounds are considered
    /// hit if the ray's `[t_min, t_max]` range overlaps the slab intersection interval.
    pub fn intersect_p(&self, ray: &Ray, inv_dir: Vec3f, dir_is_neg: [bool; 3]) -> bool {
        let mut t_min = (self.corner(dir_is_neg[0]).x - ray.origin.x) * inv_dir.x;
        let mut t_max = (self.corner(!dir_is_neg[0]).x - ray.origin.x) * inv_dir.x;
        let ty_min = (self.corner(dir_is_neg[1]).y - ray.origin.y) * inv_dir.y;
        let mut ty_max = (self.corner(!dir_is_neg[1]).y - ray.origin.y) * inv_dir.y;

        // robustness against rounding error in the slab distances
        t_max *= 1.0 + 2.0 * gamma(3);
        ty_max *= 1.0 + 2.0 * gamma(3);
        if t_min > ty_max || ty_min > t_max { return false; }
        if ty_min > t_min { t_min = ty_min; }
        if ty_max < t_max { t_max = ty_max; }

        let tz_min = (self.corner(dir_is_neg[2]).z - ray.origin.z) * inv_dir.z;
        let mut tz_max = (self.corner(!dir_is_neg[2]).z - ray.origin.z) * inv_dir.z;
        tz_max *= 1.0 + 2.0 * gamma(3);
        if t_min > tz_max || tz_min > t_max { return false; }
        if tz_min > t_min { t_min = tz_min; }
        if tz_max < t_max { t_max = tz_max; }

        (t_min < ray.t_max) && (t_max > ray.t_min)
    }
}
