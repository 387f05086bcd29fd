//! Voxel emission from quantized color and depth fields

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::Error;
use crate::grid::Grid2;
use crate::palette::BlockField;
use crate::voxel::{Voxel, VoxelGrid};

/// How a pixel's depth column is filled with voxels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// One voxel at the quantized depth
    #[default]
    Surface,
    /// A full column from the base plane up to the depth
    Solid,
    /// Surface voxel plus a base voxel when the column has height
    Hollow,
}

impl FromStr for FillMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "surface" => Ok(FillMode::Surface),
            "solid" => Ok(FillMode::Solid),
            "hollow" => Ok(FillMode::Hollow),
            other => Err(Error::UnknownFillMode(other.to_string())),
        }
    }
}

/// Build the voxel grid from quantized blocks and depth layers
///
/// Image rows run top-down while the model Y axis runs bottom-up, so
/// `y = height - 1 - iy`; skipping that flip mirrors every model
/// vertically. Transparent pixels never emit voxels.
pub fn build_grid(
    blocks: &BlockField<'_>,
    depth: &Grid2<i32>,
    layers: u32,
    fill: FillMode,
) -> VoxelGrid {
    debug_assert_eq!((blocks.width(), blocks.height()), (depth.width(), depth.height()));
    let (width, height) = (blocks.width(), blocks.height());
    let mut voxels = Vec::new();

    for iy in 0..height {
        for ix in 0..width {
            let Some(cell) = blocks.get(ix, iy) else {
                continue;
            };
            let x = ix as i32;
            let y = (height - 1 - iy) as i32;
            let base_depth = depth.get(ix, iy);

            match fill {
                FillMode::Surface => {
                    voxels.push(Voxel::new(x, y, base_depth, cell.block.clone()));
                }
                FillMode::Solid => {
                    for z in 0..=base_depth {
                        voxels.push(Voxel::new(x, y, z, cell.block.clone()));
                    }
                }
                FillMode::Hollow => {
                    voxels.push(Voxel::new(x, y, base_depth, cell.block.clone()));
                    if base_depth > 0 {
                        voxels.push(Voxel::new(x, y, 0, cell.block.clone()));
                    }
                }
            }
        }
    }

    log::debug!(
        "built {} voxels from {}x{} blocks ({:?} fill)",
        voxels.len(),
        width,
        height,
        fill
    );
    VoxelGrid::new(voxels, width, height, layers)
}
