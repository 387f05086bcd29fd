//! Per-pixel depth-cue feature fields
//!
//! Every field is a pure function of the pixel grid. Transparent pixels
//! (alpha < 128) contribute 0 and never pull neighbor computations away
//! from neutral values.

use rayon::prelude::*;

use crate::grid::{Field, Grid2, PixelGrid};

/// Largest possible Euclidean distance between two RGB colors
pub const MAX_RGB_DIST: f32 = 441.672_96; // sqrt(255^2 * 3)

/// Gain applied to raw Sobel magnitude before clamping to [0, 1]
const EDGE_GAIN: f32 = 1.0;

/// Neighborhood radius for local luminance contrast
const CONTRAST_RADIUS: isize = 2;

/// Blend between global color distance and local contrast in the saliency field
const SALIENCY_GLOBAL_WEIGHT: f32 = 0.7;

/// Blend between vertical position and center falloff in the position bias
const POSITION_VERTICAL_WEIGHT: f32 = 0.6;

/// All scalar cue fields derived from one pixel grid
pub struct FeatureSet {
    pub luminance: Field,
    pub edge: Field,
    pub saturation: Field,
    pub saliency: Field,
    pub contrast: Field,
    pub position: Field,
    pub sharpness: Field,
}

impl FeatureSet {
    /// Extract every cue field from the pixel grid
    pub fn extract(pixels: &PixelGrid) -> FeatureSet {
        let luminance = luminance(pixels);
        let edge = sobel_edges(&luminance);
        let contrast = local_contrast(&luminance);
        FeatureSet {
            saturation: saturation(pixels),
            saliency: saliency(pixels, &contrast),
            position: position_bias(pixels.width(), pixels.height()),
            sharpness: sharpness(&luminance),
            luminance,
            edge,
            contrast,
        }
    }
}

/// Perceptual luminance in [0, 1]; 0 for transparent pixels
pub fn luminance(pixels: &PixelGrid) -> Field {
    Grid2::from_fn(pixels.width(), pixels.height(), |x, y| {
        let p = pixels.get(x, y);
        if !p.is_opaque() {
            return 0.0;
        }
        (0.299 * p.r as f32 + 0.587 * p.g as f32 + 0.114 * p.b as f32) / 255.0
    })
}

/// 3x3 Sobel gradient magnitude over luminance
///
/// The 1-pixel border is 0; interior magnitudes are clamped to [0, 1].
pub fn sobel_edges(luminance: &Field) -> Field {
    const SOBEL_X: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
    const SOBEL_Y: [[f32; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

    let (width, height) = (luminance.width(), luminance.height());
    let rows: Vec<Vec<f32>> = (0..height)
        .into_par_iter()
        .map(|y| {
            let mut row = Vec::with_capacity(width);
            for x in 0..width {
                if x == 0 || x == width - 1 || y == 0 || y == height - 1 {
                    row.push(0.0);
                    continue;
                }
                let mut gx = 0.0;
                let mut gy = 0.0;
                for ky in 0..3 {
                    for kx in 0..3 {
                        let lum = luminance.get(x + kx - 1, y + ky - 1);
                        gx += lum * SOBEL_X[ky][kx];
                        gy += lum * SOBEL_Y[ky][kx];
                    }
                }
                let magnitude = (gx * gx + gy * gy).sqrt();
                row.push((magnitude * EDGE_GAIN).min(1.0));
            }
            row
        })
        .collect();
    Grid2::from_rows(rows)
}

/// HSV-style saturation `(max - min) / max`; 0 for black or transparent pixels
pub fn saturation(pixels: &PixelGrid) -> Field {
    Grid2::from_fn(pixels.width(), pixels.height(), |x, y| {
        let p = pixels.get(x, y);
        if !p.is_opaque() {
            return 0.0;
        }
        let r = p.r as f32 / 255.0;
        let g = p.g as f32 / 255.0;
        let b = p.b as f32 / 255.0;
        let max = r.max(g).max(b);
        if max == 0.0 {
            return 0.0;
        }
        let min = r.min(g).min(b);
        (max - min) / max
    })
}

/// Mean color over all opaque pixels; black when nothing is opaque
pub fn mean_opaque_color(pixels: &PixelGrid) -> [f32; 3] {
    let mut sum = [0.0f64; 3];
    let mut count = 0u64;
    for p in pixels.iter() {
        if p.is_opaque() {
            sum[0] += p.r as f64;
            sum[1] += p.g as f64;
            sum[2] += p.b as f64;
            count += 1;
        }
    }
    if count == 0 {
        return [0.0; 3];
    }
    [
        (sum[0] / count as f64) as f32,
        (sum[1] / count as f64) as f32,
        (sum[2] / count as f64) as f32,
    ]
}

/// Absolute luminance difference to the radius-2 neighborhood mean
pub fn local_contrast(luminance: &Field) -> Field {
    Grid2::from_fn(luminance.width(), luminance.height(), |x, y| {
        let mut sum = 0.0;
        let mut count = 0;
        for dy in -CONTRAST_RADIUS..=CONTRAST_RADIUS {
            for dx in -CONTRAST_RADIUS..=CONTRAST_RADIUS {
                sum += luminance.get_clamped(x as isize + dx, y as isize + dy);
                count += 1;
            }
        }
        (luminance.get(x, y) - sum / count as f32).abs()
    })
}

/// Color distance to the image mean blended with local contrast
///
/// The global term is normalized by the maximum possible RGB distance.
/// Transparent pixels carry only the (neutral) local term of their
/// neighborhood, scaled to 0 through the zero-luminance convention.
pub fn saliency(pixels: &PixelGrid, contrast: &Field) -> Field {
    let mean = mean_opaque_color(pixels);
    Grid2::from_fn(pixels.width(), pixels.height(), |x, y| {
        let p = pixels.get(x, y);
        if !p.is_opaque() {
            return 0.0;
        }
        let dr = p.r as f32 - mean[0];
        let dg = p.g as f32 - mean[1];
        let db = p.b as f32 - mean[2];
        let global = (dr * dr + dg * dg + db * db).sqrt() / MAX_RGB_DIST;
        SALIENCY_GLOBAL_WEIGHT * global + (1.0 - SALIENCY_GLOBAL_WEIGHT) * contrast.get(x, y)
    })
}

/// Weak spatial prior: near content sits low and central in the frame
///
/// Vertical term runs bottom=1 to top=0; the center term is a Gaussian
/// falloff with sigma of a third of each dimension.
pub fn position_bias(width: usize, height: usize) -> Field {
    let sigma_x = width as f32 / 3.0;
    let sigma_y = height as f32 / 3.0;
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    Grid2::from_fn(width, height, |x, y| {
        let vertical = if height > 1 {
            y as f32 / (height as f32 - 1.0)
        } else {
            1.0
        };
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let center = (-(dx * dx / (2.0 * sigma_x * sigma_x) + dy * dy / (2.0 * sigma_y * sigma_y))).exp();
        POSITION_VERTICAL_WEIGHT * vertical + (1.0 - POSITION_VERTICAL_WEIGHT) * center
    })
}

/// Local Laplacian-variance sharpness; blurred regions read low
///
/// Cells within 3 pixels of the border settle at the neutral 0.5.
pub fn sharpness(luminance: &Field) -> Field {
    const WINDOW: isize = 3;
    const LAPLACIAN: [[f32; 3]; 3] = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

    let (width, height) = (luminance.width(), luminance.height());
    let rows: Vec<Vec<f32>> = (0..height)
        .into_par_iter()
        .map(|y| {
            let mut row = Vec::with_capacity(width);
            for x in 0..width {
                let (xi, yi) = (x as isize, y as isize);
                if xi < WINDOW
                    || xi >= width as isize - WINDOW
                    || yi < WINDOW
                    || yi >= height as isize - WINDOW
                {
                    row.push(0.5);
                    continue;
                }
                let mut sum = 0.0;
                let mut sum_sq = 0.0;
                let mut count = 0;
                for wy in -WINDOW..=WINDOW {
                    for wx in -WINDOW..=WINDOW {
                        let mut lap = 0.0;
                        for ky in -1isize..=1 {
                            for kx in -1isize..=1 {
                                let (lx, ly) = (xi + wx + kx, yi + wy + ky);
                                if luminance.contains(lx, ly) {
                                    lap += luminance.get(lx as usize, ly as usize)
                                        * LAPLACIAN[(ky + 1) as usize][(kx + 1) as usize];
                                }
                            }
                        }
                        sum += lap;
                        sum_sq += lap * lap;
                        count += 1;
                    }
                }
                let n = count as f32;
                let variance = sum_sq / n - (sum / n) * (sum / n);
                row.push((variance.abs().sqrt() * 10.0).min(1.0));
            }
            row
        })
        .collect();
    Grid2::from_rows(rows)
}
