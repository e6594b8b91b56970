//! The bounding cube mesh: 24 vertices (flat normals per face), 36 indices.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::shader::{NORMAL_SLOT, VERTEX_SLOT};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct CubeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl CubeVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = [
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: VERTEX_SLOT,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: std::mem::size_of::<[f32; 3]>() as u64,
            shader_location: NORMAL_SLOT,
        },
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Outward normal plus two in-face axes with `u × v = normal`, so corners
/// walked u-then-v are counter-clockwise seen from outside.
const FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

/// Face corners in `(u, v)`, counter-clockwise.
const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

pub(crate) const INDEX_COUNT: u32 = 36;

/// Vertices of the `[-1, 1]^3` cube.
pub(crate) fn vertices() -> Vec<CubeVertex> {
    FACES
        .iter()
        .flat_map(|&(n, u, v)| {
            CORNERS.map(|(a, b)| CubeVertex {
                position: (n + u * a + v * b).to_array(),
                normal: n.to_array(),
            })
        })
        .collect()
}

pub(crate) fn indices() -> Vec<u16> {
    (0..FACES.len() as u16)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect()
}
