use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use std::f32::consts::TAU;

use crate::error::TreeError;

/// Vertex data for tree meshes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TreeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default)]
pub struct TreeMesh {
    pub vertices: Vec<TreeVertex>,
    pub indices: Vec<u32>,
}

impl TreeMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Generate the cylinder every branch transform is defined against.
///
/// Unit radius, unit length along +Z, centred at the origin, capped at both ends.
/// Seam vertices are duplicated so texture coordinates wrap cleanly.
pub fn unit_cylinder(slices: u32, stacks: u32) -> Result<TreeMesh, TreeError> {
    if slices < 3 || stacks < 1 {
        return Err(TreeError::InvalidMesh { slices, stacks });
    }

    let ring = slices + 1;
    let side_vertices = (ring * (stacks + 1)) as usize;
    let mut vertices = Vec::with_capacity(side_vertices + 2 * (ring as usize + 1));
    let mut indices = Vec::with_capacity(((stacks * slices * 6) + (slices * 6)) as usize);

    // Side wall, bottom ring first
    for stack in 0..=stacks {
        let v = stack as f32 / stacks as f32;
        let z = v - 0.5;

        for slice in 0..=slices {
            let u = slice as f32 / slices as f32;
            let (sin, cos) = (u * TAU).sin_cos();

            vertices.push(TreeVertex {
                position: [cos, sin, z],
                normal: [cos, sin, 0.0],
                uv: [u, v],
            });
        }
    }

    for stack in 0..stacks {
        for slice in 0..slices {
            let i0 = stack * ring + slice;
            let i1 = i0 + 1;
            let i2 = i0 + ring;
            let i3 = i2 + 1;

            indices.extend([i0, i1, i3, i0, i3, i2]);
        }
    }

    for (z, facing) in [(0.5f32, 1.0f32), (-0.5, -1.0)] {
        let center = vertices.len() as u32;
        vertices.push(TreeVertex {
            position: [0.0, 0.0, z],
            normal: [0.0, 0.0, facing],
            uv: [0.5, 0.5],
        });

        for slice in 0..=slices {
            let (sin, cos) = (slice as f32 / slices as f32 * TAU).sin_cos();
            vertices.push(TreeVertex {
                position: [cos, sin, z],
                normal: [0.0, 0.0, facing],
                uv: [0.5 + cos * 0.5, 0.5 + sin * 0.5],
            });
        }

        for slice in 0..slices {
            let a = center + 1 + slice;
            let b = a + 1;
            // Counter-clockwise when seen from outside the cap
            if facing > 0.0 {
                indices.extend([center, a, b]);
            } else {
                indices.extend([center, b, a]);
            }
        }
    }

    Ok(TreeMesh { vertices, indices })
}

/// Generate the leaf every leaf transform is defined against.
///
/// A unit quad in the local XZ plane, growing from the origin along +Z and facing +Y.
pub fn unit_leaf() -> TreeMesh {
    let corners = [
        ([-0.5, 0.0, 0.0], [0.0, 0.0]),
        ([0.5, 0.0, 0.0], [1.0, 0.0]),
        ([0.5, 0.0, 1.0], [1.0, 1.0]),
        ([-0.5, 0.0, 1.0], [0.0, 1.0]),
    ];

    let vertices = corners
        .iter()
        .map(|&(position, uv)| TreeVertex {
            position,
            normal: [0.0, 1.0, 0.0],
            uv,
        })
        .collect();

    TreeMesh {
        vertices,
        indices: vec![0, 2, 1, 0, 3, 2],
    }
}

/// Bake one copy of `mesh` per placement transform into a single mesh.
pub fn instance_mesh<'a>(mesh: &TreeMesh, transforms: impl IntoIterator<Item = &'a Mat4>) -> TreeMesh {
    let mut baked = TreeMesh::default();

    for transform in transforms {
        let base_index = baked.vertices.len() as u32;
        let normal_matrix = Mat3::from_mat4(*transform).inverse().transpose();

        baked.vertices.extend(mesh.vertices.iter().map(|vertex| TreeVertex {
            position: transform
                .transform_point3(Vec3::from_array(vertex.position))
                .to_array(),
            normal: (normal_matrix * Vec3::from_array(vertex.normal))
                .normalize_or_zero()
                .to_array(),
            uv: vertex.uv,
        }));
        baked
            .indices
            .extend(mesh.indices.iter().map(|index| base_index + index));
    }

    if !baked.vertices.is_empty() {
        log::debug!(
            "Baked {} instances: {} vertices, {} triangles",
            baked.vertices.len() / mesh.vertices.len().max(1),
            baked.vertices.len(),
            baked.triangle_count()
        );
    }

    baked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{TreeMaker, TreeTransforms};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_cylinder_generation() {
        let mesh = unit_cylinder(8, 2).unwrap();
        // Side rings + two capped fans
        assert_eq!(mesh.vertices.len(), 9 * 3 + 2 * 10);
        assert_eq!(mesh.triangle_count(), 8 * 2 * 2 + 8 * 2);
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));

        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.position;
            assert!((-0.5..=0.5).contains(&z));
            assert!((x * x + y * y).sqrt() <= 1.0 + 1e-5);
            assert!((Vec3::from_array(vertex.normal).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_cylinder_faces_outward() {
        let mesh = unit_cylinder(6, 1).unwrap();
        for triangle in mesh.indices.chunks(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| Vec3::from_array(mesh.vertices[i as usize].position));
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_invalid_cylinder() {
        assert_eq!(
            unit_cylinder(2, 1).unwrap_err(),
            TreeError::InvalidMesh { slices: 2, stacks: 1 }
        );
        assert!(unit_cylinder(8, 0).is_err());
    }

    #[test]
    fn test_leaf_quad() {
        let leaf = unit_leaf();
        assert_eq!(leaf.vertices.len(), 4);
        assert_eq!(leaf.triangle_count(), 2);
        for triangle in leaf.indices.chunks(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| Vec3::from_array(leaf.vertices[i as usize].position));
            assert!((b - a).cross(c - a).dot(Vec3::Y) > 0.0);
        }
    }

    #[test]
    fn test_instancing_places_copies() {
        let leaf = unit_leaf();
        let transforms = [
            Mat4::IDENTITY,
            Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)),
            Mat4::from_scale(Vec3::new(2.0, 1.0, 4.0)),
        ];
        let baked = instance_mesh(&leaf, &transforms);

        assert_eq!(baked.vertices.len(), 12);
        assert_eq!(baked.indices.len(), 18);
        assert_eq!(&baked.indices[6..12], &[4, 6, 5, 4, 7, 6]);
        assert_eq!(baked.vertices[4].position, [9.5, 0.0, 0.0]);
        assert_eq!(baked.vertices[10].position, [1.0, 0.0, 4.0]);

        for vertex in &baked.vertices {
            assert!((Vec3::from_array(vertex.normal) - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn test_bake_generated_tree() {
        let mut rng = StdRng::seed_from_u64(54321);
        let maker = TreeMaker::initialize(1.0, 4, &mut rng).unwrap();
        let mut transforms = TreeTransforms::new();
        maker.make_tree(&mut transforms, &mut rng).unwrap();

        let cylinder = unit_cylinder(6, 1).unwrap();
        let bark = instance_mesh(&cylinder, &transforms.branches);
        assert_eq!(bark.vertices.len(), cylinder.vertices.len() * transforms.branches.len());
        assert_eq!(bark.indices.len(), cylinder.indices.len() * transforms.branches.len());

        let foliage = instance_mesh(&unit_leaf(), &transforms.leaves);
        assert_eq!(foliage.vertices.len(), 4 * transforms.leaves.len());
        assert!(!bytemuck::cast_slice::<TreeVertex, u8>(&foliage.vertices).is_empty());
    }
}
