//! Staged image-to-voxel conversion
//!
//! Pure orchestration: every stage consumes the previous stage's output
//! and returns fresh data, so calls are re-entrant and independent.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::core::Error;
use crate::depth;
use crate::features::FeatureSet;
use crate::grid::PixelGrid;
use crate::palette::{self, Catalog};
use crate::segment;
use crate::voxel::{build_grid, optimize, FillMode, VoxelGrid};

/// Conversion parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Block count along the image's longest edge
    pub resolution: usize,
    /// Depth layer count (>= 1); the voxel Z extent
    pub depth_layers: u32,
    /// Catalog palette name
    pub palette: String,
    pub fill_mode: FillMode,
    /// Floyd-Steinberg error diffusion instead of direct mapping
    pub dithering: bool,
    /// Box-blur passes applied after the edge-aware filter
    pub smooth_iterations: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            resolution: 64,
            depth_layers: 10,
            palette: "minecraft".to_string(),
            fill_mode: FillMode::Surface,
            dithering: true,
            smooth_iterations: 2,
        }
    }
}

/// Run the full conversion: scale, estimate depth, quantize colors,
/// build and optimize the voxel grid
///
/// The palette is resolved before any pixel work so configuration
/// errors surface immediately.
pub fn convert(
    pixels: &PixelGrid,
    options: &ConvertOptions,
    catalog: &Catalog,
) -> Result<VoxelGrid, Error> {
    let palette = catalog.get(&options.palette)?;
    let layers = options.depth_layers.max(1);
    let start = Instant::now();

    let scaled = pixels.resized(options.resolution)?;
    log::info!(
        "scaled {}x{} image to {}x{} blocks",
        pixels.width(),
        pixels.height(),
        scaled.width(),
        scaled.height()
    );

    let features = FeatureSet::extract(&scaled);
    let foreground = segment::foreground_mask(&scaled, &features);
    let depth_field = depth::estimate(&scaled, &features, &foreground, options.smooth_iterations);
    let quantized_depth = depth::quantize(&depth_field, layers);
    log::info!(
        "depth estimated over {} layers in {:.0?}",
        layers,
        start.elapsed()
    );

    let blocks = if options.dithering {
        palette::map_to_blocks_dithered(&scaled, palette)
    } else {
        palette::map_to_blocks(&scaled, palette)
    };

    let grid = build_grid(&blocks, &quantized_depth, layers, options.fill_mode);
    let optimized = optimize(&grid);
    log::info!(
        "converted to {} visible voxels (of {} built) in {:.0?}",
        optimized.len(),
        grid.len(),
        start.elapsed()
    );
    Ok(optimized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rgba;

    fn sample_image() -> PixelGrid {
        PixelGrid::from_fn(32, 24, |x, y| {
            if (10..22).contains(&x) && (6..18).contains(&y) {
                Rgba::opaque(210, 40, 40)
            } else if y > 20 {
                Rgba::opaque(60, 140, 60)
            } else {
                Rgba::opaque(90, 90, 110)
            }
        })
        .unwrap()
    }

    #[test]
    fn test_convert_produces_voxels() {
        let catalog = Catalog::builtin();
        let options = ConvertOptions {
            resolution: 16,
            depth_layers: 5,
            ..ConvertOptions::default()
        };
        let grid = convert(&sample_image(), &options, &catalog).unwrap();
        assert!(!grid.is_empty());
        // Every coordinate sits inside the recomputed bounds.
        let b = *grid.bounds();
        for v in grid.voxels() {
            assert!(b.contains(v.x, v.y, v.z));
            assert!(v.faces.is_some());
            assert!((0..layers_max(&options)).contains(&v.z));
        }
    }

    fn layers_max(options: &ConvertOptions) -> i32 {
        options.depth_layers as i32
    }

    #[test]
    fn test_convert_rejects_unknown_palette() {
        let catalog = Catalog::builtin();
        let options = ConvertOptions {
            palette: "plastic".to_string(),
            ..ConvertOptions::default()
        };
        assert!(matches!(
            convert(&sample_image(), &options, &catalog),
            Err(Error::UnknownPalette(_))
        ));
    }

    #[test]
    fn test_convert_is_deterministic() {
        let catalog = Catalog::builtin();
        let options = ConvertOptions {
            resolution: 12,
            ..ConvertOptions::default()
        };
        let a = convert(&sample_image(), &options, &catalog).unwrap();
        let b = convert(&sample_image(), &options, &catalog).unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(a.bounds(), b.bounds());
        for (va, vb) in a.voxels().iter().zip(b.voxels()) {
            assert_eq!(va, vb);
        }
    }

    #[test]
    fn test_transparent_image_yields_empty_grid() {
        let catalog = Catalog::builtin();
        let img = PixelGrid::from_fn(8, 8, |_, _| Rgba::TRANSPARENT).unwrap();
        let grid = convert(&img, &ConvertOptions::default(), &catalog).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.bounds().size_x, 0);
    }

    #[test]
    fn test_solid_mode_builds_columns() {
        let catalog = Catalog::builtin();
        let surface = ConvertOptions {
            resolution: 16,
            depth_layers: 6,
            fill_mode: FillMode::Surface,
            ..ConvertOptions::default()
        };
        let solid = ConvertOptions {
            fill_mode: FillMode::Solid,
            ..surface.clone()
        };
        let img = sample_image();
        let s = convert(&img, &surface, &catalog).unwrap();
        let f = convert(&img, &solid, &catalog).unwrap();
        // Solid fill can only add voxels under the surface.
        assert!(f.len() >= s.len());
    }
}
