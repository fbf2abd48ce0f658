//! Triangle geometry and spatial transforms for ray tracing.
//!
//! This module provides the building blocks a traced scene is made of:
//!
//! - [`Vertex3d`] — The vertex format used by all meshes, containing position, normal, and UV data
//! - [`TraceMesh`] — CPU-side triangle geometry plus a world transform
//! - [`Transform`] — Position, rotation, and scale for placing meshes in 3D space
//!
//! Meshes stay on the CPU here. GPU residency — packed attribute buffers, the
//! per-mesh BLAS, the scene TLAS — is owned entirely by the acceleration module,
//! which re-uploads and rebuilds from this data when the scene changes.
//!
//! # Creating Meshes
//!
//! ```
//! use pharos::{TraceMesh, Transform, Vec3};
//!
//! // Built-in primitives
//! let cube = TraceMesh::cube();
//! let sphere = TraceMesh::sphere(32, 16);
//! let floor = TraceMesh::plane(10.0).with_transform(
//!     Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
//! );
//! ```
//!
//! # Vertex Layout
//!
//! [`Vertex3d`] occupies 32 bytes: position (12) at offset 0, normal (12) at
//! offset 12, uv (8) at offset 24. The same layout serves as BLAS vertex input
//! (positions at stride [`Vertex3d::STRIDE`]) and as the packed attribute
//! table the ray-generation shaders fetch normals from.

use glam::{Mat4, Vec3};

/// A vertex with position, normal, and texture coordinates.
///
/// Uses `#[repr(C)]` for a predictable memory layout and derives
/// [`bytemuck::Pod`] and [`bytemuck::Zeroable`] for safe casting to byte
/// slices on upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// The 3D position of this vertex in model space.
    pub position: [f32; 3],
    /// The surface normal vector (should be normalized).
    pub normal: [f32; 3],
    /// Texture coordinates, typically in the range [0, 1].
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// Byte stride between consecutive vertices in a packed buffer.
    pub const STRIDE: u64 = std::mem::size_of::<Vertex3d>() as u64;

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// CPU-side triangle geometry with a world transform.
///
/// A `TraceMesh` is what a [`Scene`](crate::Scene) is made of. The vertex and
/// index data live on the CPU; the acceleration module packs them into global
/// GPU buffers and builds a BLAS per mesh when the scene is (re)uploaded.
///
/// # Example
///
/// ```
/// use pharos::{TraceMesh, Transform, Vec3, Quat};
///
/// let mesh = TraceMesh::cube().with_transform(
///     Transform::new()
///         .position(Vec3::new(0.0, 1.0, -4.0))
///         .rotation(Quat::from_rotation_y(0.7)),
/// );
/// assert_eq!(mesh.triangle_count(), 12);
/// ```
#[derive(Clone, Debug)]
pub struct TraceMesh {
    vertices: Vec<Vertex3d>,
    indices: Vec<u32>,
    /// World transform applied via the TLAS instance, not baked into vertices.
    pub transform: Transform,
}

impl TraceMesh {
    /// Creates a mesh from raw vertex and index data.
    ///
    /// Indices are triangle lists (3 indices per triangle). An empty mesh is
    /// allowed but contributes nothing to the scene.
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            transform: Transform::default(),
        }
    }

    /// Sets the world transform, builder-style.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// The mesh's vertices.
    pub fn vertices(&self) -> &[Vertex3d] {
        &self.vertices
    }

    /// The mesh's triangle-list indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn triangle_count(&self) -> u32 {
        self.indices.len() as u32 / 3
    }

    /// Creates a unit cube centered at the origin.
    ///
    /// The cube spans from -0.5 to 0.5 on all axes. Each face has its own set
    /// of vertices with correct normals for flat shading.
    pub fn cube() -> Self {
        // Each face has its own vertices for correct normals
        #[rustfmt::skip]
        let vertices = vec![
            // Front face (Z+)
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
            // Back face (Z-)
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
            // Top face (Y+)
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
            // Bottom face (Y-)
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
            // Right face (X+)
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
            // Left face (X-)
            Vertex3d::new([-0.5, -0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 1.0]),
        ];

        #[rustfmt::skip]
        let indices: Vec<u32> = vec![
            0,  1,  2,  2,  3,  0,  // front
            4,  5,  6,  6,  7,  4,  // back
            8,  9,  10, 10, 11, 8,  // top
            12, 13, 14, 14, 15, 12, // bottom
            16, 17, 18, 18, 19, 16, // right
            20, 21, 22, 22, 23, 20, // left
        ];

        Self::new(vertices, indices)
    }

    /// Creates a UV sphere centered at the origin with configurable tessellation.
    ///
    /// The sphere has a radius of 0.5 and is generated using latitude/longitude
    /// subdivision: `segments` divisions around the equator, `rings` from pole
    /// to pole. 32×16 is a reasonable middle ground.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                let position = [x * 0.5, y * 0.5, z * 0.5];
                let normal = [x, y, z];
                let uv = [seg as f32 / segments as f32, ring as f32 / rings as f32];

                vertices.push(Vertex3d::new(position, normal, uv));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.push(current);
                indices.push(next);
                indices.push(current + 1);

                indices.push(current + 1);
                indices.push(next);
                indices.push(next + 1);
            }
        }

        Self::new(vertices, indices)
    }

    /// Creates a flat square plane on the XZ axis (horizontal ground plane).
    ///
    /// Centered at the origin with normals pointing up (+Y).
    pub fn plane(size: f32) -> Self {
        let half = size * 0.5;
        let vertices = vec![
            Vertex3d::new([-half, 0.0, -half], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([half, 0.0, -half], [0.0, 1.0, 0.0], [1.0, 0.0]),
            Vertex3d::new([half, 0.0, half], [0.0, 1.0, 0.0], [1.0, 1.0]),
            Vertex3d::new([-half, 0.0, half], [0.0, 1.0, 0.0], [0.0, 1.0]),
        ];

        let indices = vec![0, 1, 2, 2, 3, 0];

        Self::new(vertices, indices)
    }
}

/// A 3D transformation representing position, rotation, and scale.
///
/// `Transform` is the primary way to place meshes in a traced scene. It stores
/// translation, rotation (as a quaternion), and scale separately, combining
/// them on demand into a matrix or into the 3×4 row layout a TLAS instance
/// wants.
///
/// Transformations apply in the standard Scale → Rotate → Translate order.
///
/// # Example
///
/// ```
/// use pharos::{Transform, Vec3, Quat};
///
/// let transform = Transform::new()
///     .position(Vec3::new(0.0, 5.0, -10.0))
///     .rotation(Quat::from_rotation_y(std::f32::consts::PI / 4.0))
///     .uniform_scale(2.0);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    /// World-space position (translation).
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: glam::Quat,
    /// Scale factors for each axis.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: glam::Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Creates a new identity transform (origin, no rotation, unit scale).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transform positioned at the given location.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Sets the position (translation) component.
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the rotation component using a quaternion.
    pub fn rotation(mut self, rotation: glam::Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets non-uniform scale factors for each axis.
    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Sets uniform scale on all axes.
    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Converts this transform to a 4×4 transformation matrix (SRT order).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// The first three rows of the transform matrix, row-major.
    ///
    /// This is the 3×4 layout `wgpu::TlasInstance` expects: the full 4×4
    /// matrix minus its trivial `[0, 0, 0, 1]` bottom row.
    pub fn instance_rows(&self) -> [f32; 12] {
        let rows = self.matrix().transpose().to_cols_array();
        let mut out = [0.0; 12];
        out.copy_from_slice(&rows[..12]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec4};

    #[test]
    fn vertex_is_32_bytes() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 32);
        assert_eq!(Vertex3d::STRIDE, 32);
    }

    #[test]
    fn instance_rows_match_matrix() {
        let transform = Transform::new()
            .position(Vec3::new(1.0, 2.0, 3.0))
            .rotation(Quat::from_rotation_y(0.6))
            .scale(Vec3::new(2.0, 1.0, 0.5));

        let m = transform.matrix();
        let rows = transform.instance_rows();

        // Row i of the matrix must land in rows[i*4..i*4+4].
        for i in 0..3 {
            let row = Vec4::new(
                m.col(0)[i],
                m.col(1)[i],
                m.col(2)[i],
                m.col(3)[i],
            );
            for j in 0..4 {
                assert!((rows[i * 4 + j] - row[j]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn identity_instance_rows() {
        let rows = Transform::new().instance_rows();
        #[rustfmt::skip]
        let expected = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
        ];
        assert_eq!(rows, expected);
    }

    #[test]
    fn primitive_counts() {
        assert_eq!(TraceMesh::cube().triangle_count(), 12);
        assert_eq!(TraceMesh::plane(5.0).triangle_count(), 2);
        let sphere = TraceMesh::sphere(8, 4);
        assert_eq!(sphere.vertex_count(), 9 * 5);
        assert_eq!(sphere.triangle_count(), 8 * 4 * 2);
    }
}
