//! Foreground/background segmentation
//!
//! Estimates, per pixel, the probability that the pixel belongs to the
//! subject rather than the background. No learned model: the background
//! color is sampled from the image border and every pixel is scored
//! against it with a handful of weighted signals.

use crate::features::{FeatureSet, MAX_RGB_DIST};
use crate::grid::{Field, Grid2, PixelGrid};

/// Foreground probability above this is treated as subject by depth fusion
pub const FOREGROUND_THRESHOLD: f32 = 0.3;

/// Fraction of each dimension sampled as the border band
const BORDER_BAND_FRACTION: f64 = 0.12;

/// Floor for the color-difference threshold signal
const MIN_COLOR_THRESHOLD: f32 = 30.0;

const W_DISTANCE: f32 = 0.35;
const W_SPATIAL: f32 = 0.20;
const W_THRESHOLD: f32 = 0.20;
const W_SATURATION: f32 = 0.15;
const W_EDGE: f32 = 0.10;

/// Background color estimate sampled from the image border
struct BorderStats {
    mean: [f32; 3],
    /// RMS of the per-channel standard deviations
    spread: f32,
}

fn border_stats(pixels: &PixelGrid) -> BorderStats {
    let (width, height) = (pixels.width(), pixels.height());
    let band_x = ((width as f64 * BORDER_BAND_FRACTION).round() as usize).max(1);
    let band_y = ((height as f64 * BORDER_BAND_FRACTION).round() as usize).max(1);

    let mut sum = [0.0f64; 3];
    let mut sum_sq = [0.0f64; 3];
    let mut count = 0u64;
    for (x, y, p) in pixels.enumerate() {
        let in_band =
            x < band_x || x >= width - band_x || y < band_y || y >= height - band_y;
        if !in_band || !p.is_opaque() {
            continue;
        }
        for (i, c) in p.rgb().into_iter().enumerate() {
            sum[i] += c as f64;
            sum_sq[i] += (c as f64) * (c as f64);
        }
        count += 1;
    }

    if count == 0 {
        // Fully transparent border: fall back to the whole-image mean.
        return BorderStats {
            mean: crate::features::mean_opaque_color(pixels),
            spread: 0.0,
        };
    }

    let n = count as f64;
    let mut mean = [0.0f32; 3];
    let mut variance_sum = 0.0f64;
    for i in 0..3 {
        let m = sum[i] / n;
        mean[i] = m as f32;
        variance_sum += sum_sq[i] / n - m * m;
    }
    BorderStats {
        mean,
        spread: (variance_sum / 3.0).max(0.0).sqrt() as f32,
    }
}

/// Estimate the per-pixel foreground probability field
///
/// Combines color distance from the border mean, a centered spatial
/// prior, a thresholded color-difference signal, saturation and edge
/// magnitude, then refines with two blur passes and an S-curve stretch.
pub fn foreground_mask(pixels: &PixelGrid, features: &FeatureSet) -> Field {
    let (width, height) = (pixels.width(), pixels.height());
    let stats = border_stats(pixels);
    let threshold = MIN_COLOR_THRESHOLD.max(1.5 * stats.spread);
    log::debug!(
        "segmentation: border mean ({:.0},{:.0},{:.0}) spread {:.1} threshold {:.1}",
        stats.mean[0], stats.mean[1], stats.mean[2], stats.spread, threshold
    );

    let sigma_x = width as f32 / 3.0;
    let sigma_y = height as f32 / 3.0;
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;

    let raw = Grid2::from_fn(width, height, |x, y| {
        let p = pixels.get(x, y);
        if !p.is_opaque() {
            return 0.0;
        }
        let dr = p.r as f32 - stats.mean[0];
        let dg = p.g as f32 - stats.mean[1];
        let db = p.b as f32 - stats.mean[2];
        let dist = (dr * dr + dg * dg + db * db).sqrt();

        let s_distance = dist / MAX_RGB_DIST;
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let s_spatial =
            (-(dx * dx / (2.0 * sigma_x * sigma_x) + dy * dy / (2.0 * sigma_y * sigma_y))).exp();
        let s_threshold = if dist > threshold { 1.0 } else { 0.0 };
        let s_saturation = features.saturation.get(x, y);
        let s_edge = features.edge.get(x, y);

        (W_DISTANCE * s_distance
            + W_SPATIAL * s_spatial
            + W_THRESHOLD * s_threshold
            + W_SATURATION * s_saturation
            + W_EDGE * s_edge)
            .clamp(0.0, 1.0)
    });

    // Soft but decisive separation: blur twice, stretch to the observed
    // range, then push values toward the extremes.
    let refined = gaussian_blur(&gaussian_blur(&raw, 2), 1);
    refined.normalized().map(smoothstep)
}

/// Separable Gaussian blur with kernel half-width `radius`
fn gaussian_blur(field: &Field, radius: usize) -> Field {
    let kernel = gaussian_kernel(radius);
    let r = radius as isize;

    let horizontal = Grid2::from_fn(field.width(), field.height(), |x, y| {
        let mut acc = 0.0;
        for (i, w) in kernel.iter().enumerate() {
            acc += w * field.get_clamped(x as isize + i as isize - r, y as isize);
        }
        acc
    });
    Grid2::from_fn(field.width(), field.height(), |x, y| {
        let mut acc = 0.0;
        for (i, w) in kernel.iter().enumerate() {
            acc += w * horizontal.get_clamped(x as isize, y as isize + i as isize - r);
        }
        acc
    })
}

fn gaussian_kernel(radius: usize) -> Vec<f32> {
    let sigma = (radius as f32 / 1.5).max(0.5);
    let mut kernel: Vec<f32> = (-(radius as isize)..=radius as isize)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= total;
    }
    kernel
}

/// S-curve contrast stretch `3t^2 - 2t^3`
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rgba;

    /// Red square centered on a gray background
    fn subject_image(size: usize) -> PixelGrid {
        PixelGrid::from_fn(size, size, |x, y| {
            let lo = size / 3;
            let hi = size - size / 3;
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                Rgba::opaque(220, 30, 30)
            } else {
                Rgba::opaque(120, 120, 120)
            }
        })
        .unwrap()
    }

    #[test]
    fn test_mask_is_normalized() {
        let img = subject_image(24);
        let mask = foreground_mask(&img, &FeatureSet::extract(&img));
        let (min, max) = mask.min_max();
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn test_subject_scores_above_background() {
        let img = subject_image(24);
        let mask = foreground_mask(&img, &FeatureSet::extract(&img));
        let center = mask.get(12, 12);
        let corner = mask.get(1, 1);
        assert!(
            center > FOREGROUND_THRESHOLD,
            "subject center {center} not above threshold"
        );
        assert!(center > corner + 0.3, "center {center} corner {corner}");
    }

    #[test]
    fn test_uniform_image_collapses_to_half() {
        let img = PixelGrid::from_fn(16, 16, |_, _| Rgba::opaque(80, 80, 80)).unwrap();
        let mask = foreground_mask(&img, &FeatureSet::extract(&img));
        // Not exactly constant before normalization (spatial prior varies),
        // but the range must stay defined and inside [0, 1].
        let (min, max) = mask.min_max();
        assert!((0.0..=1.0).contains(&min));
        assert!((0.0..=1.0).contains(&max));
    }

    #[test]
    fn test_gaussian_kernel_sums_to_one() {
        for radius in 1..4 {
            let k = gaussian_kernel(radius);
            assert_eq!(k.len(), radius * 2 + 1);
            let sum: f32 = k.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert!(smoothstep(0.25) < 0.25);
        assert!(smoothstep(0.75) > 0.75);
    }
}
