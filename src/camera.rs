use glam::Vec3;

/// A simple camera for ray generation.
///
/// Provides position, orientation, and vertical field of view. The tracer
/// takes a camera explicitly on every frame — there is no implicit "main
/// camera" anywhere in the crate.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub fov: f32, // radians, vertical
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            forward: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_3, // 60 degrees
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn looking_at(mut self, target_x: f32, target_y: f32, target_z: f32) -> Self {
        let target = Vec3::new(target_x, target_y, target_z);
        self.forward = (target - self.position).normalize_or_zero();
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    /// Compute the right vector from forward and up.
    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up).normalize_or_zero()
    }

    /// Recompute up to be orthogonal to forward and right.
    pub fn orthogonal_up(&self) -> Vec3 {
        self.right().cross(self.forward).normalize_or_zero()
    }

    /// The zoom factor fed to the ray-generation shaders: `tan(fov / 2)`.
    ///
    /// Together with the viewport aspect ratio this spans the image plane
    /// one unit in front of the camera.
    pub fn zoom(&self) -> f32 {
        (self.fov * 0.5).tan()
    }
}

/// Pixel dimensions of the image being traced.
///
/// Passed explicitly into [`PathTracer::update`](crate::PathTracer::update);
/// the resource manager compares it against the last-allocated size to decide
/// whether the render targets need recreating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const ZERO: Self = Self {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Aspect ratio (width / height). Zero when the viewport is empty.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_tan_of_half_fov() {
        let camera = Camera::new().with_fov(90.0);
        assert!((camera.zoom() - 1.0).abs() < 1e-6);

        let camera = Camera::new().with_fov(60.0);
        let expected = (30.0f32.to_radians()).tan();
        assert!((camera.zoom() - expected).abs() < 1e-6);
    }

    #[test]
    fn viewport_aspect() {
        assert_eq!(Viewport::new(1920, 1080).aspect(), 1920.0 / 1080.0);
        assert_eq!(Viewport::new(100, 0).aspect(), 0.0);
    }

    #[test]
    fn viewport_empty() {
        assert!(Viewport::ZERO.is_empty());
        assert!(Viewport::new(0, 720).is_empty());
        assert!(Viewport::new(1280, 0).is_empty());
        assert!(!Viewport::new(1280, 720).is_empty());
    }

    #[test]
    fn camera_basis_is_orthogonal() {
        let camera = Camera::new().at(1.0, 2.0, 3.0).looking_at(0.0, 0.0, 0.0);
        let right = camera.right();
        let up = camera.orthogonal_up();
        assert!(camera.forward.dot(right).abs() < 1e-5);
        assert!(camera.forward.dot(up).abs() < 1e-5);
        assert!(right.dot(up).abs() < 1e-5);
    }
}
