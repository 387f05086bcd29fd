//! Nearest-block search and error-diffusion mapping

use crate::grid::{Grid2, PixelGrid};
use crate::palette::{Block, Palette};

/// Floyd-Steinberg distribution: offsets and weights, summing to 1
const DIFFUSION: [(isize, isize, f32); 4] = [
    (1, 0, 7.0 / 16.0),
    (-1, 1, 3.0 / 16.0),
    (0, 1, 5.0 / 16.0),
    (1, 1, 1.0 / 16.0),
];

/// One quantized pixel: the matched block and the color it replaced
#[derive(Clone, Copy, Debug)]
pub struct QuantizedCell<'a> {
    pub block: &'a Block,
    pub original_color: [u8; 3],
}

/// Per-pixel block assignments; `None` marks transparent pixels
pub type BlockField<'a> = Grid2<Option<QuantizedCell<'a>>>;

/// Perceptually weighted color distance
///
/// The red weight grows and the blue weight shrinks with the mean red
/// level; green is fixed at the highest weight since human vision
/// discriminates it best.
pub fn color_distance(c1: [i32; 3], c2: [i32; 3]) -> f32 {
    let r_mean = (c1[0] + c2[0]) as f32 / 2.0;
    let dr = (c1[0] - c2[0]) as f32;
    let dg = (c1[1] - c2[1]) as f32;
    let db = (c1[2] - c2[2]) as f32;

    let wr = 2.0 + r_mean / 256.0;
    let wg = 4.0;
    let wb = 2.0 + (255.0 - r_mean) / 256.0;

    (wr * dr * dr + wg * dg * dg + wb * db * db).sqrt()
}

/// Nearest palette entry under the weighted distance; ties keep the
/// earliest entry
pub fn find_closest_block<'a>(palette: &'a Palette, rgb: [i32; 3]) -> &'a Block {
    let blocks = palette.blocks();
    let mut best = &blocks[0];
    let mut best_dist = f32::INFINITY;
    for candidate in blocks {
        let dist = color_distance(rgb, candidate.color_i32());
        if dist < best_dist {
            best_dist = dist;
            best = candidate;
        }
    }
    best
}

/// Direct mapping: every opaque pixel gets its nearest block, no error
/// propagation
pub fn map_to_blocks<'a>(pixels: &PixelGrid, palette: &'a Palette) -> BlockField<'a> {
    Grid2::from_fn(pixels.width(), pixels.height(), |x, y| {
        let p = pixels.get(x, y);
        if !p.is_opaque() {
            return None;
        }
        let rgb = [p.r as i32, p.g as i32, p.b as i32];
        Some(QuantizedCell {
            block: find_closest_block(palette, rgb),
            original_color: p.rgb(),
        })
    })
}

#[derive(Clone, Copy)]
struct WorkPixel {
    r: f32,
    g: f32,
    b: f32,
    opaque: bool,
}

/// Floyd-Steinberg mapping
///
/// Strict row-major order: each pixel's working color already carries
/// all error diffused from earlier pixels when its own lookup runs.
/// Working colors are rounded to integers for the lookup but never
/// clamped, and the residual is measured against the rounded value.
pub fn map_to_blocks_dithered<'a>(pixels: &PixelGrid, palette: &'a Palette) -> BlockField<'a> {
    let (width, height) = (pixels.width(), pixels.height());
    let mut working = Grid2::from_fn(width, height, |x, y| {
        let p = pixels.get(x, y);
        WorkPixel {
            r: p.r as f32,
            g: p.g as f32,
            b: p.b as f32,
            opaque: p.is_opaque(),
        }
    });

    let mut out: BlockField<'a> = Grid2::filled(width, height, None);
    for y in 0..height {
        for x in 0..width {
            let w = working.get(x, y);
            if !w.opaque {
                continue;
            }
            let rgb = [
                w.r.round() as i32,
                w.g.round() as i32,
                w.b.round() as i32,
            ];
            let block = find_closest_block(palette, rgb);
            let error = [
                (rgb[0] - block.color[0] as i32) as f32,
                (rgb[1] - block.color[1] as i32) as f32,
                (rgb[2] - block.color[2] as i32) as f32,
            ];
            distribute_error(&mut working, x, y, error);
            out.set(
                x,
                y,
                Some(QuantizedCell {
                    block,
                    original_color: [
                        rgb[0].clamp(0, 255) as u8,
                        rgb[1].clamp(0, 255) as u8,
                        rgb[2].clamp(0, 255) as u8,
                    ],
                }),
            );
        }
    }
    out
}

fn distribute_error(working: &mut Grid2<WorkPixel>, x: usize, y: usize, error: [f32; 3]) {
    for (dx, dy, factor) in DIFFUSION {
        let (nx, ny) = (x as isize + dx, y as isize + dy);
        if !working.contains(nx, ny) {
            continue;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        let mut neighbor = working.get(nx, ny);
        if !neighbor.opaque {
            continue;
        }
        neighbor.r += error[0] * factor;
        neighbor.g += error[1] * factor;
        neighbor.b += error[2] * factor;
        working.set(nx, ny, neighbor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rgba;
    use crate::palette::Catalog;

    fn two_tone() -> Palette {
        Palette::new(
            "two_tone",
            vec![
                Block {
                    name: "dark".into(),
                    color: [0, 0, 0],
                    id: 1,
                    data: 0,
                },
                Block {
                    name: "light".into(),
                    color: [255, 255, 255],
                    id: 2,
                    data: 0,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_diffusion_weights_sum_to_one() {
        let total: f32 = DIFFUSION.iter().map(|&(_, _, w)| w).sum();
        assert_eq!(total, 1.0);
    }

    #[test]
    fn test_find_closest_is_idempotent() {
        let catalog = Catalog::builtin();
        let palette = catalog.get("minecraft").unwrap();
        for block in palette.blocks() {
            let found = find_closest_block(palette, block.color_i32());
            assert_eq!(found.color, block.color, "{}", block.name);
        }
    }

    #[test]
    fn test_out_of_range_lookup_is_total() {
        let palette = two_tone();
        assert_eq!(find_closest_block(&palette, [-80, -10, -40]).name, "dark");
        assert_eq!(find_closest_block(&palette, [300, 280, 310]).name, "light");
    }

    #[test]
    fn test_transparent_pixels_stay_unmapped() {
        let palette = two_tone();
        let img = PixelGrid::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba::opaque(10, 10, 10)
            } else {
                Rgba::new(10, 10, 10, 0)
            }
        })
        .unwrap();
        let mapped = map_to_blocks(&img, &palette);
        assert!(mapped.get(0, 0).is_some());
        assert!(mapped.get(1, 0).is_none());
        let dithered = map_to_blocks_dithered(&img, &palette);
        assert!(dithered.get(1, 0).is_none());
    }

    #[test]
    fn test_dithering_breaks_banding_on_gradient() {
        let palette = two_tone();
        // Smooth horizontal gradient; direct mapping produces one hard
        // band switch, dithering mixes both blocks around the middle.
        let img = PixelGrid::from_fn(64, 8, |x, _| {
            let v = (x * 255 / 63) as u8;
            Rgba::opaque(v, v, v)
        })
        .unwrap();

        let direct = map_to_blocks(&img, &palette);
        let mut switches = 0;
        for x in 1..64 {
            let a = direct.get(x - 1, 0).unwrap().block.id;
            let b = direct.get(x, 0).unwrap().block.id;
            if a != b {
                switches += 1;
            }
        }
        assert_eq!(switches, 1, "direct mapping should band exactly once");

        let dithered = map_to_blocks_dithered(&img, &palette);
        let mut mixed_rows = 0;
        for y in 0..8 {
            let mut row_switches = 0;
            for x in 1..64 {
                let a = dithered.get(x - 1, y).unwrap().block.id;
                let b = dithered.get(x, y).unwrap().block.id;
                if a != b {
                    row_switches += 1;
                }
            }
            if row_switches > 1 {
                mixed_rows += 1;
            }
        }
        assert!(mixed_rows > 4, "dithering should interleave blocks");
    }

    #[test]
    fn test_dithered_error_stays_bounded() {
        let palette = two_tone();
        // Mid-gray input: every pixel is 128 off either palette entry,
        // but diffusion keeps the running total error near zero.
        let img = PixelGrid::from_fn(16, 16, |_, _| Rgba::opaque(128, 128, 128)).unwrap();
        let dithered = map_to_blocks_dithered(&img, &palette);
        let mut total: i64 = 0;
        let mut cells = 0;
        for cell in dithered.iter().flatten() {
            total += 128 - cell.block.color[0] as i64;
            cells += 1;
        }
        assert_eq!(cells, 256);
        let mean_error = total as f64 / cells as f64;
        assert!(
            mean_error.abs() < 16.0,
            "mean residual error {mean_error} should stay near zero"
        );
    }

    #[test]
    fn test_palette_exact_image_needs_no_dither() {
        let catalog = Catalog::builtin();
        let palette = catalog.get("wool").unwrap();
        let img = PixelGrid::from_fn(4, 4, |x, y| {
            let b = &palette.blocks()[(y * 4 + x) % palette.blocks().len()];
            Rgba::opaque(b.color[0], b.color[1], b.color[2])
        })
        .unwrap();
        let direct = map_to_blocks(&img, palette);
        let dithered = map_to_blocks_dithered(&img, palette);
        for y in 0..4 {
            for x in 0..4 {
                let d = direct.get(x, y).unwrap();
                let f = dithered.get(x, y).unwrap();
                // Zero residual everywhere, so both mappings agree.
                assert_eq!(d.block.name, f.block.name);
                assert_eq!(d.block.color, img.get(x, y).rgb());
            }
        }
    }
}
