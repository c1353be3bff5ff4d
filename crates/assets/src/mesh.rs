//! Mesh loading from Wavefront OBJ files.
//!
//! OBJ files index positions and texture coordinates independently, so the
//! same attribute combination can appear many times across faces. The
//! loader flattens every face corner into a [`MeshVertex`] and deduplicates
//! on the full attribute tuple (position, color, texture coordinate), so
//! the GPU draws from a compact vertex list plus a `u32` index list.
//!
//! Dedup compares exact float bit patterns: two vertices collapse only when
//! every attribute is bitwise identical, which keeps the re-expanded
//! triangle list equal to the input.

use std::collections::HashMap;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use tracing::info;

use crate::error::{AssetError, AssetResult};

/// One vertex as produced by the mesh loader.
///
/// Matches the layout the renderer's vertex format expects: position,
/// color, texture coordinate.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// 3D position in object space.
    pub position: Vec3,
    /// Vertex color.
    pub color: Vec3,
    /// Texture coordinates (UV, V flipped to top-left origin).
    pub tex_coord: Vec2,
}

impl MeshVertex {
    /// Creates a new mesh vertex.
    #[inline]
    pub const fn new(position: Vec3, color: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position,
            color,
            tex_coord,
        }
    }

    /// Returns the bit-pattern key used for deduplication.
    ///
    /// Exact bitwise equality on every attribute. NaNs never compare equal
    /// through `==` but do collapse here; loaders do not emit NaN
    /// attributes in practice.
    fn key(&self) -> VertexKey {
        [
            self.position.x.to_bits(),
            self.position.y.to_bits(),
            self.position.z.to_bits(),
            self.color.x.to_bits(),
            self.color.y.to_bits(),
            self.color.z.to_bits(),
            self.tex_coord.x.to_bits(),
            self.tex_coord.y.to_bits(),
        ]
    }
}

/// Hashable dedup key: the bit patterns of all eight vertex floats.
type VertexKey = [u32; 8];

/// A loaded mesh: deduplicated vertices and a triangle index list.
#[derive(Debug, Default)]
pub struct MeshData {
    /// Unique vertices.
    pub vertices: Vec<MeshVertex>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Builds a mesh from a flat triangle-corner stream, deduplicating
    /// identical vertices.
    ///
    /// The output index list re-expands to exactly the input stream.
    pub fn from_triangles<I>(corners: I) -> Self
    where
        I: IntoIterator<Item = MeshVertex>,
    {
        let mut unique: HashMap<VertexKey, u32> = HashMap::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for vertex in corners {
            let index = *unique.entry(vertex.key()).or_insert_with(|| {
                let index = vertices.len() as u32;
                vertices.push(vertex);
                index
            });
            indices.push(index);
        }

        Self { vertices, indices }
    }

    /// Loads a mesh from a Wavefront OBJ file.
    ///
    /// All shapes in the file are merged into one mesh. Faces are
    /// triangulated by the loader. Vertices get a white color unless the
    /// file carries per-vertex colors; the V texture coordinate is flipped
    /// to the top-left origin the sampler expects.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or indexes attributes
    /// out of range.
    pub fn load_obj(path: &Path) -> AssetResult<Self> {
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                ..Default::default()
            },
        )?;

        let mut corners = Vec::new();

        for model in &models {
            let mesh = &model.mesh;

            for (corner, &index) in mesh.indices.iter().enumerate() {
                let position = read_vec3(&mesh.positions, index, path, "position")?;

                let color = if mesh.vertex_color.is_empty() {
                    Vec3::ONE
                } else {
                    read_vec3(&mesh.vertex_color, index, path, "vertex color")?
                };

                let tex_coord = if mesh.texcoords.is_empty() {
                    Vec2::ZERO
                } else {
                    let uv_index = if mesh.texcoord_indices.is_empty() {
                        index
                    } else {
                        mesh.texcoord_indices[corner]
                    };
                    let uv = read_vec2(&mesh.texcoords, uv_index, path, "texcoord")?;
                    // OBJ uses a bottom-left UV origin
                    Vec2::new(uv.x, 1.0 - uv.y)
                };

                corners.push(MeshVertex::new(position, color, tex_coord));
            }
        }

        let total = corners.len();
        let mesh = Self::from_triangles(corners);

        info!(
            "Loaded mesh {:?}: {} corners -> {} unique vertices, {} triangles",
            path,
            total,
            mesh.vertices.len(),
            mesh.triangle_count()
        );

        Ok(mesh)
    }

    /// Number of triangles in the mesh.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True if the mesh has no geometry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn read_vec3(data: &[f32], index: u32, path: &Path, what: &str) -> AssetResult<Vec3> {
    let base = index as usize * 3;
    if base + 3 > data.len() {
        return Err(AssetError::Malformed(format!(
            "{:?}: {} index {} out of range",
            path, what, index
        )));
    }
    Ok(Vec3::new(data[base], data[base + 1], data[base + 2]))
}

fn read_vec2(data: &[f32], index: u32, path: &Path, what: &str) -> AssetResult<Vec2> {
    let base = index as usize * 2;
    if base + 2 > data.len() {
        return Err(AssetError::Malformed(format!(
            "{:?}: {} index {} out of range",
            path, what, index
        )));
    }
    Ok(Vec2::new(data[base], data[base + 1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32, z: f32, u: f32, w: f32) -> MeshVertex {
        MeshVertex::new(Vec3::new(x, y, z), Vec3::ONE, Vec2::new(u, w))
    }

    #[test]
    fn test_dedup_collapses_identical_vertices() {
        // Two triangles sharing an edge: 6 corners, 4 unique vertices
        let corners = vec![
            v(0.0, 0.0, 0.0, 0.0, 0.0),
            v(1.0, 0.0, 0.0, 1.0, 0.0),
            v(1.0, 1.0, 0.0, 1.0, 1.0),
            v(0.0, 0.0, 0.0, 0.0, 0.0),
            v(1.0, 1.0, 0.0, 1.0, 1.0),
            v(0.0, 1.0, 0.0, 0.0, 1.0),
        ];

        let mesh = MeshData::from_triangles(corners.clone());

        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.vertices.len() <= corners.len());
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_dedup_reexpansion_reproduces_input() {
        let corners = vec![
            v(0.0, 0.0, 0.0, 0.0, 0.0),
            v(1.0, 0.0, 0.0, 1.0, 0.0),
            v(1.0, 1.0, 0.0, 1.0, 1.0),
            v(0.0, 0.0, 0.0, 0.0, 0.0),
            v(1.0, 1.0, 0.0, 1.0, 1.0),
            v(0.0, 1.0, 0.0, 0.0, 1.0),
        ];

        let mesh = MeshData::from_triangles(corners.clone());

        let expanded: Vec<MeshVertex> = mesh
            .indices
            .iter()
            .map(|&i| mesh.vertices[i as usize])
            .collect();

        assert_eq!(expanded, corners);
    }

    #[test]
    fn test_dedup_distinguishes_differing_attributes() {
        // Same position, different texture coordinate: stays distinct
        let corners = vec![
            v(0.0, 0.0, 0.0, 0.0, 0.0),
            v(0.0, 0.0, 0.0, 1.0, 0.0),
            v(0.0, 0.0, 0.0, 0.0, 1.0),
        ];

        let mesh = MeshData::from_triangles(corners);
        assert_eq!(mesh.vertices.len(), 3);
    }

    #[test]
    fn test_dedup_distinguishes_color() {
        let white = MeshVertex::new(Vec3::ZERO, Vec3::ONE, Vec2::ZERO);
        let red = MeshVertex::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec2::ZERO);
        let corners = vec![white, red, white];

        let mesh = MeshData::from_triangles(corners);
        assert_eq!(mesh.vertices.len(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 0]);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = MeshData::from_triangles(std::iter::empty());
        assert!(mesh.is_empty());
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_negative_zero_stays_distinct() {
        // -0.0 and 0.0 differ in bit pattern, so they stay distinct
        let a = v(0.0, 0.0, 0.0, 0.0, 0.0);
        let b = v(-0.0, 0.0, 0.0, 0.0, 0.0);

        let mesh = MeshData::from_triangles(vec![a, b, a]);
        assert_eq!(mesh.vertices.len(), 2);
    }
}
