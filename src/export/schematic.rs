//! Schematic (.schematic) export
//!
//! Gzip-compressed NBT stream compatible with MCEdit/WorldEdit style
//! consumers. The Blocks/Data arrays are Y-major, then Z, then X; that
//! ordering is mandated by the format and reproduced exactly.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::core::Error;
use crate::export::nbt::{NbtWriter, TagType};
use crate::voxel::VoxelGrid;

/// Encode the grid and gzip the result
///
/// Interior cells culled by the visibility pass read as air (id 0,
/// data 0), as does every position with no voxel at all.
pub fn export_schematic(grid: &VoxelGrid) -> Result<Vec<u8>, Error> {
    let nbt = encode_nbt(grid)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&nbt)?;
    let compressed = encoder.finish()?;
    log::info!(
        "schematic: {} voxels, {} bytes NBT, {} bytes gzipped",
        grid.len(),
        nbt.len(),
        compressed.len()
    );
    Ok(compressed)
}

/// Uncompressed NBT byte stream for the grid
pub fn encode_nbt(grid: &VoxelGrid) -> Result<Vec<u8>, Error> {
    let bounds = grid.bounds();
    let (width, height, length) = (bounds.size_x, bounds.size_y, bounds.size_z);
    if width > i16::MAX as i32 || height > i16::MAX as i32 || length > i16::MAX as i32 {
        return Err(Error::SchematicTooLarge(width, height, length));
    }

    let size = (width * height * length) as usize;
    let mut blocks = vec![0u8; size];
    let mut data = vec![0u8; size];

    for y in 0..height {
        for z in 0..length {
            for x in 0..width {
                let voxel = grid.get(x + bounds.min_x, y + bounds.min_y, z + bounds.min_z);
                if let Some(v) = voxel {
                    let index = ((y * length + z) * width + x) as usize;
                    blocks[index] = v.block.id;
                    data[index] = v.block.data;
                }
            }
        }
    }

    let mut w = NbtWriter::new();
    w.begin_compound("Schematic");
    w.short_tag("Width", width as i16);
    w.short_tag("Height", height as i16);
    w.short_tag("Length", length as i16);
    w.string_tag("Materials", "Alpha");
    w.byte_array_tag("Blocks", &blocks);
    w.byte_array_tag("Data", &data);
    w.empty_list_tag("Entities", TagType::Compound);
    w.empty_list_tag("TileEntities", TagType::Compound);
    w.end_compound();
    Ok(w.into_bytes())
}
