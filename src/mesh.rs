use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use id_arena::{Arena, Id};
use wgpu::util::DeviceExt;
use wgpu::BufferUsages;

use crate::picking::Aabb;
use crate::scene_graph::Scene;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    position: Vec3,
    normal: Vec3,
}

pub type MeshId = Id<Mesh>;
pub type RenderMeshId = Id<RenderMesh>;

/// CPU-side mesh data plus its local bounds. `render_mesh` is filled in once
/// the renderer has uploaded the buffers.
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub bounds: Aabb,
    pub render_mesh: Option<RenderMeshId>,
}

// Outward normal and the two in-plane directions of each cube face, ordered so
// that u cross v equals the normal and the emitted quads wind counter-clockwise
// seen from outside.
const CUBE_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
];

impl Mesh {
    /// Axis-aligned cube centered on the origin, one quad per face.
    pub fn cube(name: impl Into<String>, edge: f32) -> Mesh {
        let half = edge * 0.5;

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in CUBE_FACES {
            let base = vertices.len() as u32;
            let center = normal * half;

            for (du, dv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                vertices.push(Vertex {
                    position: center + u * (du * half) + v * (dv * half),
                    normal,
                });
            }

            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Mesh {
            name: name.into(),
            vertices,
            indices,
            bounds: Aabb::new(Vec3::splat(-half), Vec3::splat(half)),
            render_mesh: None,
        }
    }
}

pub const RENDER_MESH_VBL: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
    ],
};

/// Per-draw instance data: the object's world matrix and its display color.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct Instance {
    pub model: Mat4,
    pub color: Vec4,
}

impl Instance {
    pub fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

pub struct Instances {
    instances: Vec<Instance>,
}

impl Instances {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
        }
    }

    pub fn add(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn write_to_buffer(&self, queue: &wgpu::Queue, instance_buffer: &InstanceBuffer) {
        queue.write_buffer(
            instance_buffer.buffer(),
            0,
            bytemuck::cast_slice(&self.instances),
        );
    }

    pub fn should_render(&self) -> bool {
        !self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

pub struct InstanceBuffer(wgpu::Buffer);

impl InstanceBuffer {
    // The whole keycube is 81 instances; one fixed-size buffer is plenty.
    const MAX_INSTANCES: u64 = 128;

    pub fn new(device: &wgpu::Device, name: impl Into<String>) -> Self {
        let name: String = name.into();

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("Instance buffer ({})", name)),
            size: std::mem::size_of::<Instance>() as u64 * Self::MAX_INSTANCES,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self(buffer)
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.0
    }
}

/// GPU buffers for one mesh plus the instances gathered for the current frame.
pub struct RenderMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    pub instances: Instances,
    pub instance_buffer: InstanceBuffer,
}

impl RenderMesh {
    pub fn from_mesh(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Vertex buffer ({})", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Index buffer ({})", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: BufferUsages::INDEX,
        });

        RenderMesh {
            vertex_buffer,
            index_buffer,
            num_indices: mesh.indices.len() as u32,
            instances: Instances::new(),
            instance_buffer: InstanceBuffer::new(device, mesh.name.clone()),
        }
    }
}

/// Collects one instance per mesh-bearing scene object, grouped by mesh.
pub fn gather_instances(scene: &Scene, render_meshes: &mut Arena<RenderMesh>) {
    for (_, render_mesh) in render_meshes.iter_mut() {
        render_mesh.instances.clear();
    }

    for (_, object) in scene.objects.iter() {
        let Some(mesh_id) = object.mesh_id else {
            continue;
        };
        let Some(render_mesh_id) = scene.get_mesh(mesh_id).and_then(|mesh| mesh.render_mesh) else {
            continue;
        };

        if let Some(render_mesh) = render_meshes.get_mut(render_mesh_id) {
            render_mesh.instances.add(Instance {
                model: *object.transform.get_world_matrix(),
                color: object.color.extend(1.0),
            });
        }
    }
}

pub fn draw_mesh_instances(
    render_pass: &mut wgpu::RenderPass,
    queue: &wgpu::Queue,
    render_mesh: &RenderMesh,
) {
    render_mesh
        .instances
        .write_to_buffer(queue, &render_mesh.instance_buffer);

    render_pass.set_vertex_buffer(0, render_mesh.vertex_buffer.slice(..));
    render_pass.set_vertex_buffer(1, render_mesh.instance_buffer.buffer().slice(..));
    render_pass.set_index_buffer(
        render_mesh.index_buffer.slice(..),
        wgpu::IndexFormat::Uint32,
    );
    render_pass.draw_indexed(
        0..render_mesh.num_indices,
        0,
        0..render_mesh.instances.len() as u32,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_one_quad_per_face() {
        let cube = Mesh::cube("Cube", 1.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
    }

    #[test]
    fn cube_vertices_lie_on_the_surface() {
        let cube = Mesh::cube("Cube", 1.0);
        for vertex in &cube.vertices {
            let p = vertex.position;
            assert!(p.abs().max_element() == 0.5, "vertex off the cube: {p}");
            // Each vertex sits on the face its normal points out of.
            assert_eq!(p.dot(vertex.normal), 0.5);
        }
    }

    #[test]
    fn cube_bounds_match_the_edge_length() {
        let cube = Mesh::cube("Cube", 0.15);
        assert_eq!(cube.bounds.min, Vec3::splat(-0.075));
        assert_eq!(cube.bounds.max, Vec3::splat(0.075));
    }
}
