//! Pinhole camera for primary ray generation.

use vela_math::{Ray, Vec2, Vec3};

/// Camera for generating rays into the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    pub image_width: u32,
    pub image_height: u32,

    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,
    /// Vertical field of view in degrees
    vfov: f32,

    // Cached by initialize()
    pixel00_corner: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    w: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            vup: Vec3::Y,
            vfov: 90.0,
            pixel00_corner: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            w: Vec3::Z,
        };
        camera.initialize();
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width.max(1);
        self.image_height = height.max(1);
        self.initialize();
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self.initialize();
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn with_fov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self.initialize();
        self
    }

    /// Recompute the cached image plane. Called by every `with_*` method.
    pub fn initialize(&mut self) {
        let h = (self.vfov.to_radians() / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        self.w = (self.look_from - self.look_at).normalize_or_zero();
        let u = self.vup.cross(self.w).normalize_or_zero();
        let v = self.w.cross(u);

        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;
        self.pixel00_corner = self.look_from - self.w - viewport_u / 2.0 - viewport_v / 2.0;
    }

    /// Primary ray through pixel (x, y) at `offset` within the pixel.
    ///
    /// `offset` is in `[0, 1)²`; (0.5, 0.5) is the pixel center. The
    /// direction is unit length.
    pub fn get_ray(&self, x: u32, y: u32, offset: Vec2) -> Ray {
        let pixel_sample = self.pixel00_corner
            + (x as f32 + offset.x) * self.pixel_delta_u
            + (y as f32 + offset.y) * self.pixel_delta_v;

        let direction = (pixel_sample - self.look_from).normalize_or_zero();
        Ray::new(self.look_from, direction)
    }

    pub fn position(&self) -> Vec3 {
        self.look_from
    }

    pub fn forward(&self) -> Vec3 {
        -self.w
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
