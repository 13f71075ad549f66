//! Indexed triangle mesh container shared by every geometry emitter.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// One mesh vertex: position, unit normal, texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { position, normal, uv }
    }
}

/// Vertex and index buffers ready for upload. Indices are triangle lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |t| {
            [
                &self.vertices[t[0] as usize],
                &self.vertices[t[1] as usize],
                &self.vertices[t[2] as usize],
            ]
        })
    }

    /// Flat `[x, y, z]` position buffer.
    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.position.to_array()).collect()
    }
}

/// Accumulates vertices and indices. Index values are absolute, so callers
/// read `next_index()` before pushing the vertices a face refers to.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    mesh: MeshData,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            mesh: MeshData {
                vertices: Vec::with_capacity(vertices),
                indices: Vec::with_capacity(indices),
            },
        }
    }

    #[inline]
    pub fn next_index(&self) -> u32 {
        self.mesh.vertices.len() as u32
    }

    #[inline]
    pub fn push_vertex(&mut self, v: Vertex) {
        self.mesh.vertices.push(v);
    }

    #[inline]
    pub fn push_indices(&mut self, indices: &[u32]) {
        self.mesh.indices.extend_from_slice(indices);
    }

    pub fn build(self) -> MeshData {
        self.mesh
    }
}

/// Triangulate an `n × n` vertex grid, duplicating vertices per triangle.
///
/// `grid` is row-major with the first index along +X and the second along
/// +Z. Each quad becomes two triangles wound counter-clockwise when viewed
/// from +Y.
pub(crate) fn triangulate_grid(grid: &[Vertex], n: usize) -> MeshData {
    if n < 2 {
        return MeshData::default();
    }
    let quads = (n - 1) * (n - 1);
    let mut mb = MeshBuilder::with_capacity(quads * 6, quads * 6);
    for i in 0..n - 1 {
        for j in 0..n - 1 {
            let top_left = grid[i * n + j];
            let bottom_left = grid[i * n + j + 1];
            let top_right = grid[(i + 1) * n + j];
            let bottom_right = grid[(i + 1) * n + j + 1];

            let base = mb.next_index();
            for v in [top_left, bottom_left, top_right, top_right, bottom_left, bottom_right] {
                mb.push_vertex(v);
            }
            mb.push_indices(&[base, base + 1, base + 2, base + 3, base + 4, base + 5]);
        }
    }
    mb.build()
}

/// Unnormalised face normal of a triangle.
pub fn face_normal(tri: [&Vertex; 3]) -> Vec3 {
    (tri[1].position - tri[0].position).cross(tri[2].position - tri[0].position)
}
