use glam::{Mat4, Vec3};

const DEFAULT_UP: Vec3 = Vec3::Y;

/// Render-surface sizing derived from the window. Recomputing with the same
/// window size yields the same values, so hosts may call `resize` on every
/// frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub window: (u32, u32),
    /// Canvas size: the full window in landscape, a square in portrait.
    pub render_size: (u32, u32),
    pub aspect: f32,
    pub pixel_ratio: f32,
    /// Texel size fed to the antialiasing pass.
    pub fxaa_resolution: (f32, f32),
}

impl Viewport {
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        let mut viewport = Self {
            window: (0, 0),
            render_size: (0, 0),
            aspect: 1.0,
            pixel_ratio: if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 },
            fxaa_resolution: (0.0, 0.0),
        };
        viewport.resize(width, height);
        viewport
    }

    /// Returns false when the size did not change.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let width = width.max(1);
        let height = height.max(1);
        if self.window == (width, height) {
            return false;
        }
        self.window = (width, height);
        let landscape = width > height;
        self.aspect = if landscape { width as f32 / height as f32 } else { 1.0 };
        self.render_size = if landscape { (width, height) } else { (width, width) };
        self.fxaa_resolution =
            (1.0 / (width as f32 * self.pixel_ratio), 1.0 / (height as f32 * self.pixel_ratio));
        true
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720, 1.0)
    }
}

/// Perspective camera looking at the model origin.
#[derive(Debug, Clone)]
pub struct Camera {
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { target: Vec3::ZERO, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn view_matrix(&self, position: Vec3) -> Mat4 {
        // Looking straight down the up axis degenerates look_at; tilt the up vector instead.
        let forward = (self.target - position).normalize_or_zero();
        let up = if forward.cross(self.up).length_squared() < 1e-8 { Vec3::NEG_Z } else { self.up };
        Mat4::look_at_rh(position, self.target, up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self, position: Vec3, viewport: &Viewport) -> Mat4 {
        self.projection_matrix(viewport.aspect) * self.view_matrix(position)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(60f32.to_radians(), 0.1, 2000.0)
    }
}
