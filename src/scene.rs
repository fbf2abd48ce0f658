//! The collection of meshes a frame is traced against.

use crate::mesh::TraceMesh;

/// An ordered collection of [`TraceMesh`]es.
///
/// The scene is plain data — no spatial indexing happens here. The
/// acceleration module watches [`Scene::generation`] to know when mesh
/// geometry changed and its packed GPU buffers need rebuilding.
///
/// Transform edits via [`Scene::transform_mut`] deliberately do *not* bump
/// the generation: instance transforms are re-read every frame when the
/// acceleration structure is rebuilt, so moving meshes is free of any
/// re-upload.
///
/// # Example
///
/// ```
/// use pharos::{Scene, TraceMesh, Transform, Vec3};
///
/// let mut scene = Scene::new();
/// let floor = scene.push(TraceMesh::plane(20.0));
/// let ball = scene.push(
///     TraceMesh::sphere(32, 16)
///         .with_transform(Transform::from_position(Vec3::new(0.0, 0.5, 0.0))),
/// );
///
/// // Animate: no generation bump, no GPU re-upload
/// scene.transform_mut(ball).position.y = 1.0;
/// assert_eq!(scene.len(), 2);
/// ```
#[derive(Default)]
pub struct Scene {
    meshes: Vec<TraceMesh>,
    generation: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mesh to the scene, returning its index.
    ///
    /// Bumps the geometry generation: the acceleration structure will repack
    /// its buffers on the next frame.
    pub fn push(&mut self, mesh: TraceMesh) -> usize {
        self.meshes.push(mesh);
        self.generation += 1;
        self.meshes.len() - 1
    }

    /// Removes every mesh from the scene.
    pub fn clear(&mut self) {
        if !self.meshes.is_empty() {
            self.meshes.clear();
            self.generation += 1;
        }
    }

    /// Replaces the geometry of the mesh at `index`.
    ///
    /// The mesh keeps its current transform. Bumps the geometry generation.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn replace(&mut self, index: usize, mesh: TraceMesh) {
        let transform = self.meshes[index].transform;
        self.meshes[index] = mesh.with_transform(transform);
        self.generation += 1;
    }

    /// Mutable access to a mesh's transform.
    ///
    /// Transform-only edits never trigger a geometry repack.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn transform_mut(&mut self, index: usize) -> &mut crate::mesh::Transform {
        &mut self.meshes[index].transform
    }

    pub fn meshes(&self) -> &[TraceMesh] {
        &self.meshes
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Monotonic counter bumped on every geometry change.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn push_and_clear_bump_generation() {
        let mut scene = Scene::new();
        assert_eq!(scene.generation(), 0);

        scene.push(TraceMesh::cube());
        assert_eq!(scene.generation(), 1);

        scene.push(TraceMesh::plane(4.0));
        assert_eq!(scene.generation(), 2);

        scene.clear();
        assert_eq!(scene.generation(), 3);
        assert!(scene.is_empty());

        // Clearing an already-empty scene changes nothing
        scene.clear();
        assert_eq!(scene.generation(), 3);
    }

    #[test]
    fn transform_edits_do_not_bump_generation() {
        let mut scene = Scene::new();
        let idx = scene.push(TraceMesh::cube());
        let generation = scene.generation();

        scene.transform_mut(idx).position = Vec3::new(5.0, 0.0, 0.0);
        assert_eq!(scene.generation(), generation);
    }

    #[test]
    fn replace_keeps_transform() {
        let mut scene = Scene::new();
        let idx = scene.push(
            TraceMesh::cube()
                .with_transform(crate::Transform::from_position(Vec3::new(1.0, 2.0, 3.0))),
        );

        scene.replace(idx, TraceMesh::sphere(8, 4));
        assert_eq!(
            scene.meshes()[idx].transform.position,
            Vec3::new(1.0, 2.0, 3.0)
        );
        assert_eq!(scene.generation(), 2);
    }
}
