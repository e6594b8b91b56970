use std::collections::BTreeMap;

use crate::shader::{
    BindingSlot, LinkedStages, ProgramLayout, ProgramLinker, ShaderError, ShaderStage,
};

use super::cube::CubeVertex;
use super::frame::DEPTH_FORMAT;

/// GPU side of a linked program.
///
/// Blending is baked into wgpu pipelines, so each program carries an opaque
/// and an alpha-blended variant of the same shaders.
#[derive(Debug, Clone)]
pub struct WgpuProgram {
    pub(crate) opaque: wgpu::RenderPipeline,
    pub(crate) blended: wgpu::RenderPipeline,
    pub(crate) groups: Vec<wgpu::BindGroupLayout>,
    pub(crate) uniform_buffers: Vec<(BindingSlot, wgpu::Buffer)>,
}

/// Kinds of resources a bind group entry can hold.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum SlotKind {
    Uniform { size: u32 },
    Texture3d,
    Sampler,
}

/// Every binding of the program, grouped and sorted.
pub(crate) fn slot_kinds(layout: &ProgramLayout) -> BTreeMap<BindingSlot, SlotKind> {
    let mut slots = BTreeMap::new();
    for block in layout.blocks() {
        slots.insert(block.slot, SlotKind::Uniform { size: block.size });
    }
    for (_, loc) in layout.textures() {
        slots.insert(loc.texture, SlotKind::Texture3d);
        if let Some(sampler) = loc.sampler {
            slots.insert(sampler, SlotKind::Sampler);
        }
    }
    slots
}

/// Builds [`WgpuProgram`]s for the surface's color format.
pub struct WgpuLinker<'a> {
    device: &'a wgpu::Device,
    color_format: wgpu::TextureFormat,
}

impl<'a> WgpuLinker<'a> {
    pub fn new(device: &'a wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            color_format,
        }
    }

    /// Rejects bindings the frame backend cannot feed.
    fn check_bindings(
        &self,
        stages: &LinkedStages,
        slots: &BTreeMap<BindingSlot, SlotKind>,
    ) -> Result<(), ShaderError> {
        for stage in [&stages.vertex, &stages.fragment] {
            for (_, var) in stage.module.global_variables.iter() {
                let Some(binding) = &var.binding else { continue };
                let slot = BindingSlot {
                    group: binding.group,
                    binding: binding.binding,
                };
                if !slots.contains_key(&slot) {
                    return Err(ShaderError::link(format!(
                        "{} stage binding `{}` at group {} binding {} is not a uniform block, \
                         3D texture or its sampler",
                        stage.stage,
                        var.name.as_deref().unwrap_or("?"),
                        slot.group,
                        slot.binding
                    )));
                }
            }
        }

        let limits = self.device.limits();
        if let Some(group) = slots.keys().map(|s| s.group).max()
            && group >= limits.max_bind_groups
        {
            return Err(ShaderError::link(format!(
                "bind group {group} exceeds the device limit of {} groups",
                limits.max_bind_groups
            )));
        }
        for (slot, kind) in slots {
            if let SlotKind::Uniform { size } = kind
                && u64::from(*size) > u64::from(limits.max_uniform_buffer_binding_size)
            {
                return Err(ShaderError::link(format!(
                    "uniform block at group {} binding {} is {size} bytes, device limit is {}",
                    slot.group, slot.binding, limits.max_uniform_buffer_binding_size
                )));
            }
        }
        Ok(())
    }

    fn bind_group_layouts(
        &self,
        slots: &BTreeMap<BindingSlot, SlotKind>,
    ) -> Vec<wgpu::BindGroupLayout> {
        let group_count = slots.keys().map(|s| s.group + 1).max().unwrap_or(0);
        (0..group_count)
            .map(|group| {
                let entries: Vec<wgpu::BindGroupLayoutEntry> = slots
                    .iter()
                    .filter(|(slot, _)| slot.group == group)
                    .map(|(slot, kind)| wgpu::BindGroupLayoutEntry {
                        binding: slot.binding,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: match *kind {
                            SlotKind::Uniform { size } => wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: std::num::NonZeroU64::new(u64::from(size)),
                            },
                            SlotKind::Texture3d => wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D3,
                                multisampled: false,
                            },
                            SlotKind::Sampler => {
                                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                            }
                        },
                        count: None,
                    })
                    .collect();

                self.device
                    .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        label: Some("voxray program bgl"),
                        entries: &entries,
                    })
            })
            .collect()
    }

    fn pipeline(
        &self,
        layout: &wgpu::PipelineLayout,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        blend: Option<wgpu::BlendState>,
        label: &str,
    ) -> wgpu::RenderPipeline {
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),

                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some(ShaderStage::Vertex.entry_point()),
                    compilation_options: Default::default(),
                    buffers: &[CubeVertex::layout()],
                },

                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some(ShaderStage::Fragment.entry_point()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.color_format,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            })
    }
}

impl ProgramLinker for WgpuLinker<'_> {
    type Program = WgpuProgram;

    fn link(&mut self, stages: &LinkedStages) -> Result<WgpuProgram, ShaderError> {
        let slots = slot_kinds(&stages.layout);
        self.check_bindings(stages, &slots)?;

        let vertex = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("voxray vertex shader"),
                source: wgpu::ShaderSource::Wgsl(stages.vertex.source.as_str().into()),
            });
        let fragment = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("voxray fragment shader"),
                source: wgpu::ShaderSource::Wgsl(stages.fragment.source.as_str().into()),
            });

        let groups = self.bind_group_layouts(&slots);
        let group_refs: Vec<&wgpu::BindGroupLayout> = groups.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("voxray pipeline layout"),
                bind_group_layouts: &group_refs,
                immediate_size: 0,
            });

        let opaque = self.pipeline(
            &pipeline_layout,
            &vertex,
            &fragment,
            None,
            "voxray raycast pipeline",
        );
        let blended = self.pipeline(
            &pipeline_layout,
            &vertex,
            &fragment,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            "voxray raycast pipeline (blended)",
        );

        let uniform_buffers = stages
            .layout
            .blocks()
            .iter()
            .map(|block| {
                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("voxray uniforms"),
                    size: u64::from(block.size),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (block.slot, buffer)
            })
            .collect();

        Ok(WgpuProgram {
            opaque,
            blended,
            groups,
            uniform_buffers,
        })
    }
}
