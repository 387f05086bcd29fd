//! Block palettes and color quantization

pub mod block;
pub mod catalog;
pub mod quantize;

pub use block::Block;
pub use catalog::{Catalog, Palette};
pub use quantize::{
    find_closest_block, map_to_blocks, map_to_blocks_dithered, BlockField, QuantizedCell,
};
