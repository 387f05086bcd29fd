//! Serializers for the optimized voxel grid

pub mod nbt;
pub mod obj;
pub mod schematic;

pub use nbt::{NbtWriter, TagType};
pub use obj::{export_obj, ObjConfig, ObjExport};
pub use schematic::export_schematic;
