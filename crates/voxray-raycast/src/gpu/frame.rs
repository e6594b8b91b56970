use std::collections::HashMap;

use voxray_engine::render::{RenderCtx, RenderTarget};
use wgpu::util::DeviceExt;

use crate::frame::{ClearColor, FrameBackend};
use crate::shader::{BindingSlot, SamplerLocation, ShaderProgram, UniformLocation, UniformValue};

use super::cube::{self, INDEX_COUNT};
use super::linker::{SlotKind, WgpuProgram, slot_kinds};
use super::texture::VolumeTexture;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Long-lived GPU objects shared by every frame: cube mesh, sampler,
/// placeholder volume and a depth buffer that follows the surface size.
pub struct WgpuResources {
    cube_vbo: wgpu::Buffer,
    cube_ibo: wgpu::Buffer,
    sampler: wgpu::Sampler,
    placeholder: VolumeTexture,
    depth: Option<(wgpu::TextureView, (u32, u32))>,
}

impl WgpuResources {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let cube_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("voxray cube vbo"),
            contents: bytemuck::cast_slice(&cube::vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("voxray cube ibo"),
            contents: bytemuck::cast_slice(&cube::indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("voxray volume sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            cube_vbo,
            cube_ibo,
            sampler,
            placeholder: VolumeTexture::placeholder(device, queue),
            depth: None,
        }
    }

    /// Recreates the depth buffer when the drawable size changed.
    fn ensure_depth(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        if self.depth.as_ref().is_some_and(|(_, s)| *s == size) {
            return;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("voxray depth"),
            size: wgpu::Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        log::debug!("depth buffer resized to {}x{}", size.0, size.1);
        self.depth = Some((texture.create_view(&Default::default()), size));
    }
}

/// [`FrameBackend`] that records state until the draw, then issues one render
/// pass: uniform staging is flushed with `write_buffer`, bind groups are built
/// from the current texture units and the cube is drawn.
pub struct WgpuFrame<'a, 'e> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    target: &'a mut RenderTarget<'e>,
    resources: &'a WgpuResources,

    clear: Option<ClearColor>,
    program: Option<ShaderProgram<WgpuProgram>>,
    staging: HashMap<BindingSlot, Vec<u8>>,
    units: HashMap<u32, VolumeTexture>,
    sampler_units: HashMap<BindingSlot, u32>,
    blend: bool,
    draws: u32,
}

impl<'a, 'e> WgpuFrame<'a, 'e> {
    pub fn new(
        ctx: &'a RenderCtx<'_>,
        target: &'a mut RenderTarget<'e>,
        resources: &'a mut WgpuResources,
    ) -> Self
    where
        'e: 'a,
    {
        resources.ensure_depth(ctx.device, ctx.size);
        Self {
            device: ctx.device,
            queue: ctx.queue,
            target,
            resources,
            clear: None,
            program: None,
            staging: HashMap::new(),
            units: HashMap::new(),
            sampler_units: HashMap::new(),
            blend: false,
            draws: 0,
        }
    }

    /// Issues a clear-only pass if nothing was drawn.
    pub fn finish(mut self) -> u32 {
        if self.clear.is_some() {
            let Some(depth) = self.resources.depth.as_ref().map(|(v, _)| v) else {
                return self.draws;
            };
            let pass = Self::begin_pass(self.target, depth, self.clear.take());
            drop(pass);
        }
        self.draws
    }

    fn begin_pass<'p>(
        target: &'p mut RenderTarget<'_>,
        depth: &'p wgpu::TextureView,
        clear: Option<ClearColor>,
    ) -> wgpu::RenderPass<'p> {
        let color_load = match clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: c.r,
                g: c.g,
                b: c.b,
                a: c.a,
            }),
            None => wgpu::LoadOp::Load,
        };
        let depth_load = match clear {
            Some(_) => wgpu::LoadOp::Clear(1.0),
            None => wgpu::LoadOp::Load,
        };

        target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("voxray raycast pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    fn bind_groups(&self, program: &ShaderProgram<WgpuProgram>) -> Vec<wgpu::BindGroup> {
        let gpu = program.handle();
        let slots = slot_kinds(program.layout());

        // Texture units as assigned through `set_sampler`, keyed by texture slot.
        let mut sampled: HashMap<BindingSlot, &VolumeTexture> = HashMap::new();
        for (_, loc) in program.layout().textures() {
            let texture = self
                .sampler_units
                .get(&loc.texture)
                .and_then(|unit| self.units.get(unit))
                .unwrap_or(&self.resources.placeholder);
            sampled.insert(loc.texture, texture);
        }

        gpu.groups
            .iter()
            .enumerate()
            .map(|(group, layout)| {
                let entries: Vec<wgpu::BindGroupEntry<'_>> = slots
                    .iter()
                    .filter(|(slot, _)| slot.group == group as u32)
                    .filter_map(|(slot, kind)| {
                        let resource = match kind {
                            SlotKind::Uniform { .. } => gpu
                                .uniform_buffers
                                .iter()
                                .find(|(s, _)| s == slot)
                                .map(|(_, b)| b.as_entire_binding())?,
                            SlotKind::Texture3d => wgpu::BindingResource::TextureView(
                                sampled
                                    .get(slot)
                                    .copied()
                                    .unwrap_or(&self.resources.placeholder)
                                    .view(),
                            ),
                            SlotKind::Sampler => {
                                wgpu::BindingResource::Sampler(&self.resources.sampler)
                            }
                        };
                        Some(wgpu::BindGroupEntry {
                            binding: slot.binding,
                            resource,
                        })
                    })
                    .collect();

                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("voxray bind group"),
                    layout,
                    entries: &entries,
                })
            })
            .collect()
    }
}

impl FrameBackend for WgpuFrame<'_, '_> {
    type Program = WgpuProgram;
    type Texture = VolumeTexture;

    fn clear(&mut self, color: ClearColor) {
        self.clear = Some(color);
    }

    fn use_program(&mut self, program: &ShaderProgram<WgpuProgram>) {
        self.staging = program
            .layout()
            .blocks()
            .iter()
            .map(|b| (b.slot, vec![0u8; b.size as usize]))
            .collect();
        self.program = Some(program.clone());
    }

    fn set_uniform(&mut self, location: &UniformLocation, value: UniformValue) {
        let written = self
            .staging
            .get_mut(&location.block)
            .is_some_and(|block| value.write_into(block, location.offset));
        if !written {
            log::trace!("uniform write at {:?} dropped", location);
        }
    }

    fn set_sampler(&mut self, location: &SamplerLocation, unit: u32) {
        self.sampler_units.insert(location.texture, unit);
    }

    fn enable_alpha_blend(&mut self) {
        self.blend = true;
    }

    fn disable_blend(&mut self) {
        self.blend = false;
    }

    fn bind_texture_3d(&mut self, unit: u32, texture: &VolumeTexture) {
        self.units.insert(unit, texture.clone());
    }

    fn draw_cube(&mut self) {
        let Some(program) = self.program.as_ref() else {
            log::warn!("draw without a bound program; skipped");
            return;
        };
        let gpu = program.handle();

        for (slot, buffer) in &gpu.uniform_buffers {
            if let Some(bytes) = self.staging.get(slot) {
                self.queue.write_buffer(buffer, 0, bytes);
            }
        }

        let bind_groups = self.bind_groups(program);
        let pipeline = if self.blend { &gpu.blended } else { &gpu.opaque };
        let Some(depth) = self.resources.depth.as_ref().map(|(v, _)| v) else {
            return;
        };

        let mut rpass = Self::begin_pass(self.target, depth, self.clear.take());
        rpass.set_pipeline(pipeline);
        for (index, group) in bind_groups.iter().enumerate() {
            rpass.set_bind_group(index as u32, group, &[]);
        }
        rpass.set_vertex_buffer(0, self.resources.cube_vbo.slice(..));
        rpass.set_index_buffer(self.resources.cube_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..INDEX_COUNT, 0, 0..1);
        drop(rpass);

        self.draws += 1;
    }
}
