//! Depth fusion, edge-aware filtering and layer quantization
//!
//! The foreground mask dominates the fused depth; the remaining cue
//! fields contribute small corrections. A median split then forces a
//! depth gap between subject and background regardless of how flat the
//! input was.

use rayon::prelude::*;

use crate::features::FeatureSet;
use crate::grid::{Field, Grid2, PixelGrid};
use crate::segment::FOREGROUND_THRESHOLD;

const W_FOREGROUND: f32 = 0.70;
const W_SALIENCY: f32 = 0.07;
const W_CONTRAST: f32 = 0.06;
const W_POSITION: f32 = 0.05;
const W_SATURATION: f32 = 0.04;
const W_LUMINANCE: f32 = 0.04;
const W_SHARPNESS: f32 = 0.04;

/// Background pixels are pushed down by this factor before the median split
const BACKGROUND_ATTENUATION: f32 = 0.5;

/// Median fraction below which values count as background
const MEDIAN_SPLIT: f32 = 0.8;

/// Ceiling of the compressed background band
const BACKGROUND_CEILING: f32 = 0.25;

/// Floor of the expanded foreground band
const FOREGROUND_FLOOR: f32 = 0.4;

const BILATERAL_RADIUS: isize = 2;
const BILATERAL_SIGMA_SPATIAL: f32 = 1.5;
const BILATERAL_SIGMA_RANGE: f32 = 0.2;
/// How strongly edge magnitude suppresses smoothing across a neighbor
const BILATERAL_EDGE_ATTENUATION: f32 = 0.7;

/// Full depth estimate: fuse, boost, smooth, renormalize
///
/// An image whose opaque pixels all share one color carries no depth
/// evidence at all; the spatial priors are only modulators, so the
/// estimate settles at the neutral mid-depth instead of letting
/// normalization stretch prior noise across the full range.
pub fn estimate(
    pixels: &PixelGrid,
    features: &FeatureSet,
    foreground: &Field,
    smooth_iterations: usize,
) -> Field {
    if uniform_opaque_color(pixels) {
        log::debug!("depth: no color contrast, using neutral mid-depth");
        return Grid2::filled(pixels.width(), pixels.height(), 0.5);
    }
    let fused = fuse(features, foreground);
    let boosted = median_split_boost(&fused, pixels);
    let filtered = bilateral_filter(&boosted, &features.edge).normalized();
    box_smooth(&filtered, smooth_iterations)
}

fn uniform_opaque_color(pixels: &PixelGrid) -> bool {
    let mut first = None;
    for p in pixels.iter() {
        if !p.is_opaque() {
            continue;
        }
        match first {
            None => first = Some(p.rgb()),
            Some(c) => {
                if c != p.rgb() {
                    return false;
                }
            }
        }
    }
    true
}

/// Weighted combination of the foreground mask and the corrective cues
///
/// Pixels under the foreground threshold are additionally attenuated so
/// the background always recesses below the subject.
pub fn fuse(features: &FeatureSet, foreground: &Field) -> Field {
    Grid2::from_fn(foreground.width(), foreground.height(), |x, y| {
        let fg = foreground.get(x, y);
        let mut d = W_FOREGROUND * fg
            + W_SALIENCY * features.saliency.get(x, y)
            + W_CONTRAST * features.contrast.get(x, y)
            + W_POSITION * features.position.get(x, y)
            + W_SATURATION * features.saturation.get(x, y)
            + W_LUMINANCE * features.luminance.get(x, y)
            + W_SHARPNESS * features.sharpness.get(x, y);
        if fg < FOREGROUND_THRESHOLD {
            d *= BACKGROUND_ATTENUATION;
        }
        d.clamp(0.0, 1.0)
    })
}

/// Force a depth gap around 0.8x the median of the opaque pixels
///
/// Values below the split compress into [0, 0.25]; values at or above
/// expand into [0.4, 1.0]. A field with no spread passes through the
/// foreground branch untouched in shape and is fixed up by the final
/// normalization.
fn median_split_boost(depth: &Field, pixels: &PixelGrid) -> Field {
    let mut opaque: Vec<f32> = depth
        .enumerate()
        .filter(|&(x, y, _)| pixels.get(x, y).is_opaque())
        .map(|(_, _, d)| d)
        .collect();
    if opaque.is_empty() {
        return depth.clone();
    }
    opaque.sort_by(|a, b| a.total_cmp(b));
    let median = opaque[opaque.len() / 2];
    let split = MEDIAN_SPLIT * median;
    let (_, max) = depth.min_max();

    if split <= f32::EPSILON {
        return depth.clone();
    }
    depth.map(|d| {
        if d < split {
            (d / split) * BACKGROUND_CEILING
        } else if max - split <= f32::EPSILON {
            1.0
        } else {
            FOREGROUND_FLOOR + (1.0 - FOREGROUND_FLOOR) * (d - split) / (max - split)
        }
    })
}

/// Edge-aware smoothing filter
///
/// Neighbor weight = spatial Gaussian x depth-range Gaussian x an
/// edge-based attenuation, so flat regions blend while high-edge
/// regions keep their transitions.
pub fn bilateral_filter(depth: &Field, edges: &Field) -> Field {
    let (width, height) = (depth.width(), depth.height());
    let two_ss = 2.0 * BILATERAL_SIGMA_SPATIAL * BILATERAL_SIGMA_SPATIAL;
    let two_sr = 2.0 * BILATERAL_SIGMA_RANGE * BILATERAL_SIGMA_RANGE;

    let rows: Vec<Vec<f32>> = (0..height)
        .into_par_iter()
        .map(|y| {
            let mut row = Vec::with_capacity(width);
            for x in 0..width {
                let center = depth.get(x, y);
                let mut acc = 0.0;
                let mut total = 0.0;
                for dy in -BILATERAL_RADIUS..=BILATERAL_RADIUS {
                    for dx in -BILATERAL_RADIUS..=BILATERAL_RADIUS {
                        let (nx, ny) = (x as isize + dx, y as isize + dy);
                        let neighbor = depth.get_clamped(nx, ny);
                        let spatial = (-((dx * dx + dy * dy) as f32) / two_ss).exp();
                        let dd = neighbor - center;
                        let range = (-(dd * dd) / two_sr).exp();
                        let edge = edges.get_clamped(nx, ny);
                        let weight = spatial * range * (1.0 - BILATERAL_EDGE_ATTENUATION * edge);
                        acc += weight * neighbor;
                        total += weight;
                    }
                }
                row.push(if total > 0.0 { acc / total } else { center });
            }
            row
        })
        .collect();
    Grid2::from_rows(rows)
}

/// Simple 3x3 box-average smoothing, `iterations` passes
pub fn box_smooth(depth: &Field, iterations: usize) -> Field {
    let mut result = depth.clone();
    for _ in 0..iterations {
        let src = result;
        result = Grid2::from_fn(src.width(), src.height(), |x, y| {
            let mut sum = 0.0;
            let mut count = 0;
            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    let (nx, ny) = (x as isize + dx, y as isize + dy);
                    if src.contains(nx, ny) {
                        sum += src.get(nx as usize, ny as usize);
                        count += 1;
                    }
                }
            }
            sum / count as f32
        });
    }
    result
}

/// Map normalized depth onto integer layers `0..layers`
pub fn quantize(depth: &Field, layers: u32) -> Grid2<i32> {
    let scale = layers.saturating_sub(1) as f32;
    Grid2::from_fn(depth.width(), depth.height(), |x, y| {
        (depth.get(x, y) * scale).round() as i32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rgba;
    use crate::segment;

    fn estimate_for(pixels: &PixelGrid, smooth: usize) -> Field {
        let features = FeatureSet::extract(pixels);
        let fg = segment::foreground_mask(pixels, &features);
        estimate(pixels, &features, &fg, smooth)
    }

    #[test]
    fn test_uniform_white_depth_is_half() {
        let img = PixelGrid::from_fn(4, 4, |_, _| Rgba::opaque(255, 255, 255)).unwrap();
        let depth = estimate_for(&img, 0);
        assert!(depth.iter().all(|&v| (v - 0.5).abs() < 1e-6), "{depth:?}");
    }

    #[test]
    fn test_estimate_is_normalized() {
        let img = PixelGrid::from_fn(16, 16, |x, y| {
            if (5..11).contains(&x) && (5..11).contains(&y) {
                Rgba::opaque(250, 40, 40)
            } else {
                Rgba::opaque(60, 60, 70)
            }
        })
        .unwrap();
        let depth = estimate_for(&img, 0);
        let (min, max) = depth.min_max();
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn test_subject_ends_up_nearer_than_background() {
        let img = PixelGrid::from_fn(18, 18, |x, y| {
            if (6..12).contains(&x) && (6..12).contains(&y) {
                Rgba::opaque(240, 50, 50)
            } else {
                Rgba::opaque(90, 90, 100)
            }
        })
        .unwrap();
        let depth = estimate_for(&img, 1);
        assert!(depth.get(9, 9) > depth.get(1, 1) + 0.3);
    }

    #[test]
    fn test_median_split_leaves_a_gap() {
        let img = PixelGrid::from_fn(4, 4, |_, _| Rgba::opaque(128, 128, 128)).unwrap();
        let depth = Grid2::from_fn(4, 4, |x, _| if x < 2 { 0.1 } else { 0.9 });
        let boosted = median_split_boost(&depth, &img);
        for (x, _, v) in boosted.enumerate() {
            if x < 2 {
                assert!(v <= BACKGROUND_CEILING + 1e-6);
            } else {
                assert!(v >= FOREGROUND_FLOOR - 1e-6);
            }
        }
    }

    #[test]
    fn test_bilateral_preserves_hard_edges_better_than_box() {
        // Step field with a strong edge marked along the boundary.
        let depth = Grid2::from_fn(10, 10, |x, _| if x < 5 { 0.0 } else { 1.0 });
        let edges = Grid2::from_fn(10, 10, |x, _| if (4..=5).contains(&x) { 1.0 } else { 0.0 });
        let bilateral = bilateral_filter(&depth, &edges);
        let boxed = box_smooth(&depth, 1);
        // Just inside the high side of the step, the bilateral result
        // must stay closer to the original value than the box blur.
        let b = bilateral.get(5, 5);
        let s = boxed.get(5, 5);
        assert!((b - 1.0).abs() < (s - 1.0).abs(), "bilateral {b} box {s}");
    }

    #[test]
    fn test_quantize_layer_bounds() {
        let depth = Grid2::from_fn(3, 1, |x, _| x as f32 / 2.0);
        let q = quantize(&depth, 5);
        assert_eq!(q.get(0, 0), 0);
        assert_eq!(q.get(1, 0), 2);
        assert_eq!(q.get(2, 0), 4);
    }

    #[test]
    fn test_quantize_single_layer_is_flat() {
        let depth = Grid2::from_fn(3, 1, |x, _| x as f32 / 2.0);
        let q = quantize(&depth, 1);
        assert!(q.iter().all(|&z| z == 0));
    }
}
