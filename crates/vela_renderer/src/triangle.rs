//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::primitive::{Intersection, Primitive};
use vela_math::{Aabb, Ray, Vec2, Vec3};

/// A triangle primitive.
#[derive(Debug, Clone)]
pub struct Triangle {
    vertices: [Vec3; 3],
    normals: [Vec3; 3],
    texcoords: [Vec2; 3],
    /// Pre-computed face normal (unit length, zero for degenerate triangles)
    face_normal: Vec3,
    normal_interpolation: bool,
    material_id: usize,
    bbox: Aabb,
}

impl Triangle {
    /// Create a flat-shaded triangle from three vertices.
    ///
    /// Texture coordinates default to the barycentric coordinates of the hit.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material_id: usize) -> Self {
        let face_normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        if face_normal == Vec3::ZERO {
            log::warn!("Degenerate triangle {:?} {:?} {:?} has no face normal", v0, v1, v2);
        }

        Self {
            vertices: [v0, v1, v2],
            normals: [face_normal; 3],
            texcoords: [Vec2::ZERO, Vec2::X, Vec2::Y],
            face_normal,
            normal_interpolation: false,
            material_id,
            bbox: Aabb::from_vertices(v0, v1, v2),
        }
    }

    /// Use per-vertex normals, interpolated across the face (smooth shading).
    pub fn with_normals(mut self, normals: [Vec3; 3]) -> Self {
        self.normals = normals.map(|n| n.normalize_or_zero());
        self.normal_interpolation = true;
        self
    }

    /// Use per-vertex texture coordinates.
    pub fn with_texcoords(mut self, texcoords: [Vec2; 3]) -> Self {
        self.texcoords = texcoords;
        self
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        self.vertices
    }

    pub fn face_normal(&self) -> Vec3 {
        self.face_normal
    }
}

impl Primitive for Triangle {
    fn intersect(&self, ray: &Ray, rec: &mut Intersection) -> bool {
        let [v0, v1, v2] = self.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return false;
        }

        let f = 1.0 / a;
        let s = ray.origin() - v0;
        let u = f * s.dot(h);

        if !(0.0..=1.0).contains(&u) {
            return false;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);

        if v < 0.0 || u + v > 1.0 {
            return false;
        }

        let t = f * edge2.dot(q);

        if !rec.accepts(ray, t) {
            return false;
        }

        let w = 1.0 - u - v;

        let mut normal = self.face_normal;
        if self.normal_interpolation {
            let interpolated = (w * self.normals[0] + u * self.normals[1] + v * self.normals[2]).normalize_or_zero();
            // Opposing vertex normals can cancel out
            if interpolated != Vec3::ZERO {
                normal = interpolated;
            }
        }

        rec.was_found = true;
        rec.distance = t;
        rec.position = ray.at(t);
        rec.normal = normal;
        rec.front_face = ray.direction().dot(self.face_normal) < 0.0;
        rec.texcoord = w * self.texcoords[0] + u * self.texcoords[1] + v * self.texcoords[2];
        rec.wrap_texcoord = false;
        rec.material_id = self.material_id;

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn material_id(&self) -> Option<usize> {
        Some(self.material_id)
    }
}
