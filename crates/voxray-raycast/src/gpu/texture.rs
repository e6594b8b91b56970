use crate::volume::{TextureUploader, VolumeData, VolumeLoadError};

pub(crate) const VOLUME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// A 3D texture and the view the raycaster samples.
#[derive(Debug, Clone)]
pub struct VolumeTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl VolumeTexture {
    pub fn size(&self) -> wgpu::Extent3d {
        self.texture.size()
    }

    pub(crate) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    fn create(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        (width, height, depth): (u32, u32, u32),
        voxels: &[u8],
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: depth,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: VOLUME_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            voxels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                // R8: one byte per texel.
                bytes_per_row: Some(width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::D3),
            ..Default::default()
        });

        Self { texture, view }
    }

    /// 1×1×1 empty texture that keeps the volume binding complete when no
    /// dataset is bound.
    pub(crate) fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::create(device, queue, "voxray placeholder volume", (1, 1, 1), &[0])
    }
}

/// Uploads [`VolumeData`] as an `R8Unorm` 3D texture.
pub struct WgpuTextureUploader<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
}

impl<'a> WgpuTextureUploader<'a> {
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl TextureUploader for WgpuTextureUploader<'_> {
    type Texture = VolumeTexture;

    fn upload(&mut self, data: &VolumeData) -> Result<VolumeTexture, VolumeLoadError> {
        let dims = (data.width, data.height, data.depth);
        if dims.0 == 0 || dims.1 == 0 || dims.2 == 0 {
            return Err(VolumeLoadError::Upload(format!(
                "empty volume {}x{}x{}",
                dims.0, dims.1, dims.2
            )));
        }
        if data.voxels.len() != data.voxel_count() {
            return Err(VolumeLoadError::Upload(format!(
                "expected {} voxels, got {}",
                data.voxel_count(),
                data.voxels.len()
            )));
        }

        let max = self.device.limits().max_texture_dimension_3d;
        if dims.0 > max || dims.1 > max || dims.2 > max {
            return Err(VolumeLoadError::Upload(format!(
                "volume {}x{}x{} exceeds the device limit of {max} per axis",
                dims.0, dims.1, dims.2
            )));
        }

        Ok(VolumeTexture::create(
            self.device,
            self.queue,
            "voxray volume",
            dims,
            &data.voxels,
        ))
    }
}
