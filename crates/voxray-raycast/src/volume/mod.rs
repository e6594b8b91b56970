//! Volume datasets: the CPU payload, the loader that produces it and the
//! uploaded GPU resource.

mod loader;

use std::path::{Path, PathBuf};

use glam::Vec3;

pub use loader::ImageStackLoader;

/// Axis-aligned box in model space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The `[-1, 1]^3` box the bounding cube mesh spans.
    pub fn unit_cube() -> Self {
        Self::new(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// 8-bit scalar voxels, x fastest, then y, then slice.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeData {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub voxels: Vec<u8>,
    pub bounds: Bounds,
}

impl VolumeData {
    pub fn voxel_count(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }
}

/// A loaded dataset: its GPU texture and where it sits in model space.
#[derive(Debug)]
pub struct Volume<T> {
    pub texture: T,
    pub bounds: Bounds,
}

#[derive(Debug, thiserror::Error)]
pub enum VolumeLoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("no image slices found in {}", dir.display())]
    Empty { dir: PathBuf },

    #[error("cannot decode slice {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "slice {} is {}x{}, expected {}x{}",
        path.display(), found.0, found.1, expected.0, expected.1
    )]
    MismatchedSlice {
        path: PathBuf,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("texture upload failed: {0}")]
    Upload(String),
}

/// Reads a dataset directory into voxels.
pub trait VolumeLoader {
    fn load(&self, dir: &Path) -> Result<VolumeData, VolumeLoadError>;
}

/// Turns voxels into a bindable 3D texture.
pub trait TextureUploader {
    type Texture;

    fn upload(&mut self, data: &VolumeData) -> Result<Self::Texture, VolumeLoadError>;
}

/// Loads and uploads in one step. Nothing is returned unless both succeed.
pub fn load_volume<L, U>(
    loader: &L,
    uploader: &mut U,
    dir: &Path,
) -> Result<Volume<U::Texture>, VolumeLoadError>
where
    L: VolumeLoader + ?Sized,
    U: TextureUploader + ?Sized,
{
    let data = loader.load(dir)?;
    let texture = uploader.upload(&data)?;
    log::info!(
        "volume loaded from {}: {}x{}x{}",
        dir.display(),
        data.width,
        data.height,
        data.depth
    );
    Ok(Volume {
        texture,
        bounds: data.bounds,
    })
}
