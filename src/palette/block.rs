//! Palette block entries

use serde::{Deserialize, Serialize};

/// A selectable output material
///
/// `color` is the only value used for matching; `id` and `data` are
/// opaque codes understood by the schematic consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub color: [u8; 3],
    pub id: u8,
    #[serde(default)]
    pub data: u8,
}

impl Block {
    pub fn color_i32(&self) -> [i32; 3] {
        [
            self.color[0] as i32,
            self.color[1] as i32,
            self.color[2] as i32,
        ]
    }
}
