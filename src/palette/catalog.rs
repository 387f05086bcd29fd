//! Built-in block catalogs
//!
//! Catalogs are immutable values constructed once and passed by
//! reference into the pipeline; nothing here is global or mutable.

use std::collections::HashSet;

use crate::core::Error;
use crate::palette::Block;

/// A named, non-empty ordered list of blocks
#[derive(Clone, Debug)]
pub struct Palette {
    name: String,
    blocks: Vec<Block>,
}

impl Palette {
    /// An empty palette is a configuration error, rejected up front
    pub fn new(name: impl Into<String>, blocks: Vec<Block>) -> Result<Self, Error> {
        let name = name.into();
        if blocks.is_empty() {
            return Err(Error::EmptyPalette(name));
        }
        Ok(Self { name, blocks })
    }

    /// Parse a palette from a JSON array of block entries
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, Error> {
        let blocks: Vec<Block> = serde_json::from_str(json)?;
        Self::new(name, blocks)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

/// The full set of named palettes available to the quantizer
#[derive(Clone, Debug)]
pub struct Catalog {
    palettes: Vec<Palette>,
}

impl Catalog {
    /// The built-in catalogs plus the derived `full` union
    ///
    /// The union keeps the first occurrence of each block name, walking
    /// the base catalogs in their enumeration order.
    pub fn builtin() -> Catalog {
        let base = vec![
            palette("minecraft", minecraft_blocks()),
            palette("terracotta", terracotta_blocks()),
            palette("wool", wool_blocks()),
            palette("concrete", concrete_blocks()),
        ];

        let mut seen = HashSet::new();
        let mut union = Vec::new();
        for p in &base {
            for block in p.blocks() {
                if seen.insert(block.name.clone()) {
                    union.push(block.clone());
                }
            }
        }

        let mut palettes = base;
        palettes.push(palette("full", union));
        Catalog { palettes }
    }

    /// Look up a palette by name
    pub fn get(&self, name: &str) -> Result<&Palette, Error> {
        self.palettes
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| Error::UnknownPalette(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.iter().map(|p| p.name())
    }

    /// Add a palette, replacing any existing one with the same name
    pub fn insert(&mut self, new: Palette) {
        self.palettes.retain(|p| p.name() != new.name());
        self.palettes.push(new);
    }
}

/// Internal constructor for the statically non-empty tables
fn palette(name: &str, blocks: Vec<Block>) -> Palette {
    debug_assert!(!blocks.is_empty());
    Palette {
        name: name.to_string(),
        blocks,
    }
}

fn block(name: &str, color: [u8; 3], id: u8, data: u8) -> Block {
    Block {
        name: name.to_string(),
        color,
        id,
        data,
    }
}

/// Vanilla base blocks
fn minecraft_blocks() -> Vec<Block> {
    let mut blocks = wool_blocks();
    blocks.extend([
        block("stone", [125, 125, 125], 1, 0),
        block("granite", [149, 103, 85], 1, 1),
        block("diorite", [188, 188, 188], 1, 3),
        block("andesite", [136, 136, 136], 1, 5),
        block("dirt", [134, 96, 67], 3, 0),
        block("oak_planks", [162, 130, 78], 5, 0),
        block("spruce_planks", [104, 78, 47], 5, 1),
        block("birch_planks", [196, 179, 123], 5, 2),
        block("jungle_planks", [160, 115, 80], 5, 3),
        block("acacia_planks", [168, 90, 50], 5, 4),
        block("dark_oak_planks", [66, 43, 20], 5, 5),
        block("cobblestone", [127, 127, 127], 4, 0),
        block("sand", [219, 207, 163], 12, 0),
        block("red_sand", [190, 102, 33], 12, 1),
        block("gravel", [131, 127, 126], 13, 0),
        block("gold_block", [246, 208, 61], 41, 0),
        block("iron_block", [220, 220, 220], 42, 0),
        block("diamond_block", [97, 219, 213], 57, 0),
        block("lapis_block", [38, 67, 138], 22, 0),
        block("emerald_block", [42, 176, 67], 133, 0),
        block("redstone_block", [171, 26, 10], 152, 0),
        block("coal_block", [21, 21, 21], 173, 0),
        block("obsidian", [15, 10, 24], 49, 0),
        block("netherrack", [111, 54, 53], 87, 0),
        block("soul_sand", [81, 62, 50], 88, 0),
        block("glowstone", [171, 131, 84], 89, 0),
        block("nether_brick", [44, 22, 26], 112, 0),
        block("end_stone", [221, 223, 165], 121, 0),
        block("purpur_block", [169, 125, 169], 201, 0),
        block("prismarine", [99, 156, 151], 168, 0),
        block("sea_lantern", [172, 199, 190], 169, 0),
        block("hay_block", [166, 139, 12], 170, 0),
        block("bone_block", [209, 206, 179], 216, 0),
        block("quartz_block", [235, 229, 222], 155, 0),
        block("brick", [150, 97, 83], 45, 0),
        block("bookshelf", [162, 130, 78], 47, 0),
        block("mossy_cobblestone", [110, 118, 94], 48, 0),
        block("ice", [145, 183, 253], 79, 0),
        block("packed_ice", [141, 180, 250], 174, 0),
        block("snow", [249, 254, 254], 80, 0),
        block("clay", [160, 166, 179], 82, 0),
        block("pumpkin", [198, 118, 24], 86, 0),
        block("melon", [111, 145, 30], 103, 0),
        block("mycelium", [111, 99, 105], 110, 0),
        block("sponge", [195, 192, 74], 19, 0),
    ]);
    blocks
}

/// Terracotta series, richer browns and warm tones
fn terracotta_blocks() -> Vec<Block> {
    vec![
        block("terracotta", [152, 94, 67], 172, 0),
        block("white_terracotta", [209, 178, 161], 159, 0),
        block("orange_terracotta", [161, 83, 37], 159, 1),
        block("magenta_terracotta", [149, 88, 108], 159, 2),
        block("light_blue_terracotta", [113, 108, 137], 159, 3),
        block("yellow_terracotta", [186, 133, 35], 159, 4),
        block("lime_terracotta", [103, 117, 52], 159, 5),
        block("pink_terracotta", [161, 78, 78], 159, 6),
        block("gray_terracotta", [57, 42, 35], 159, 7),
        block("light_gray_terracotta", [135, 106, 97], 159, 8),
        block("cyan_terracotta", [86, 91, 91], 159, 9),
        block("purple_terracotta", [118, 70, 86], 159, 10),
        block("blue_terracotta", [74, 59, 91], 159, 11),
        block("brown_terracotta", [77, 51, 35], 159, 12),
        block("green_terracotta", [76, 83, 42], 159, 13),
        block("red_terracotta", [143, 61, 46], 159, 14),
        block("black_terracotta", [37, 22, 16], 159, 15),
    ]
}

/// Wool series
fn wool_blocks() -> Vec<Block> {
    vec![
        block("white_wool", [233, 236, 236], 35, 0),
        block("orange_wool", [234, 126, 53], 35, 1),
        block("magenta_wool", [189, 68, 179], 35, 2),
        block("light_blue_wool", [58, 175, 217], 35, 3),
        block("yellow_wool", [248, 198, 39], 35, 4),
        block("lime_wool", [112, 185, 25], 35, 5),
        block("pink_wool", [237, 141, 172], 35, 6),
        block("gray_wool", [62, 68, 71], 35, 7),
        block("light_gray_wool", [142, 142, 134], 35, 8),
        block("cyan_wool", [21, 137, 145], 35, 9),
        block("purple_wool", [121, 42, 172], 35, 10),
        block("blue_wool", [53, 57, 157], 35, 11),
        block("brown_wool", [114, 71, 40], 35, 12),
        block("green_wool", [84, 109, 27], 35, 13),
        block("red_wool", [161, 39, 34], 35, 14),
        block("black_wool", [20, 21, 25], 35, 15),
    ]
}

/// Concrete series, the most vivid colors
fn concrete_blocks() -> Vec<Block> {
    vec![
        block("white_concrete", [207, 213, 214], 251, 0),
        block("orange_concrete", [224, 97, 0], 251, 1),
        block("magenta_concrete", [169, 48, 159], 251, 2),
        block("light_blue_concrete", [35, 137, 198], 251, 3),
        block("yellow_concrete", [241, 175, 21], 251, 4),
        block("lime_concrete", [94, 169, 24], 251, 5),
        block("pink_concrete", [214, 101, 143], 251, 6),
        block("gray_concrete", [54, 57, 61], 251, 7),
        block("light_gray_concrete", [125, 125, 115], 251, 8),
        block("cyan_concrete", [21, 119, 136], 251, 9),
        block("purple_concrete", [100, 31, 156], 251, 10),
        block("blue_concrete", [44, 46, 143], 251, 11),
        block("brown_concrete", [96, 59, 31], 251, 12),
        block("green_concrete", [73, 91, 36], 251, 13),
        block("red_concrete", [142, 32, 32], 251, 14),
        block("black_concrete", [8, 10, 15], 251, 15),
    ]
}
