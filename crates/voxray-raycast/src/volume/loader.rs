use std::path::{Path, PathBuf};

use super::{Bounds, VolumeData, VolumeLoadError, VolumeLoader};

const SLICE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff"];

/// Loads a directory of equally sized 2D images as consecutive z slices.
///
/// Slices are ordered by file name, so numbered exports (`slice_000.png`,
/// `slice_001.png`, ...) stack in the expected order. Color images are reduced
/// to luminance.
#[derive(Debug, Clone)]
pub struct ImageStackLoader {
    bounds: Bounds,
}

impl Default for ImageStackLoader {
    fn default() -> Self {
        Self {
            bounds: Bounds::unit_cube(),
        }
    }
}

impl ImageStackLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `bounds` for every dataset instead of the cube's `[-1, 1]^3`.
    pub fn with_bounds(bounds: Bounds) -> Self {
        Self { bounds }
    }

    fn slice_paths(dir: &Path) -> Result<Vec<PathBuf>, VolumeLoadError> {
        let io = |source| VolumeLoadError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io)? {
            let path = entry.map_err(io)?.path();
            let is_slice = path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| SLICE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if is_slice {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl VolumeLoader for ImageStackLoader {
    fn load(&self, dir: &Path) -> Result<VolumeData, VolumeLoadError> {
        if !dir.is_dir() {
            return Err(VolumeLoadError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }

        let paths = Self::slice_paths(dir)?;
        if paths.is_empty() {
            return Err(VolumeLoadError::Empty {
                dir: dir.to_path_buf(),
            });
        }

        let mut size: Option<(u32, u32)> = None;
        let mut voxels = Vec::new();
        for path in &paths {
            let slice = image::open(path)
                .map_err(|source| VolumeLoadError::Decode {
                    path: path.clone(),
                    source,
                })?
                .into_luma8();
            let found = slice.dimensions();
            match size {
                None => size = Some(found),
                Some(expected) if expected != found => {
                    return Err(VolumeLoadError::MismatchedSlice {
                        path: path.clone(),
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }
            voxels.extend_from_slice(slice.as_raw());
        }

        let (width, height) = size.unwrap_or_default();
        log::debug!(
            "read {} slices of {width}x{height} from {}",
            paths.len(),
            dir.display()
        );

        Ok(VolumeData {
            width,
            height,
            depth: paths.len() as u32,
            voxels,
            bounds: self.bounds,
        })
    }
}
