//! Salience-weighted crop placement.
//!
//! A cover-fit thumbnail has to throw away part of the image along one axis.
//! Instead of always keeping the middle, [`attention_offset`] scores every
//! pixel of a downsampled copy and slides the crop window to where the score
//! is highest.
//!
//! A pixel's score is the sum of:
//!
//! - **Edge energy**: absolute luminance difference to its right and lower
//!   neighbours. Product shots put detail on the product, not the backdrop.
//! - **Saturation**: `(max - min) / max` of the RGB triple, scaled.
//! - **Skin tone**: a flat bonus for pixels matching a simple RGB skin rule.
//!
//! Flat images score evenly everywhere; ties resolve to the centred window so
//! the result degrades to a plain centre crop.

use super::calculations::centered_offset;
use image::{DynamicImage, GenericImageView, RgbImage};

/// Long edge of the copy used for scoring.
const ANALYSIS_EDGE: u32 = 256;
const SATURATION_WEIGHT: f32 = 96.0;
const SKIN_BONUS: f32 = 64.0;

/// Top-left corner of the `crop` window that keeps the most salient region of `image`.
///
/// Axes where the image is not larger than the crop get offset 0.
pub fn attention_offset(image: &DynamicImage, crop: (u32, u32)) -> (u32, u32) {
    let (width, height) = image.dimensions();
    let (crop_w, crop_h) = crop;
    if width <= crop_w && height <= crop_h {
        return (0, 0);
    }

    let small = if width.max(height) > ANALYSIS_EDGE {
        image.thumbnail(ANALYSIS_EDGE, ANALYSIS_EDGE)
    } else {
        image.clone()
    };
    let rgb = small.to_rgb8();
    let energy = energy_map(&rgb);
    let (sw, sh) = (rgb.width() as usize, rgb.height() as usize);

    let x = if width > crop_w {
        let scale = sw as f64 / width as f64;
        let columns: Vec<f64> = (0..sw)
            .map(|cx| (0..sh).map(|cy| energy[cy * sw + cx] as f64).sum())
            .collect();
        let window = scaled_window(crop_w, scale, sw);
        place(best_window(&columns, window), scale, width, crop_w)
    } else {
        0
    };

    let y = if height > crop_h {
        let scale = sh as f64 / height as f64;
        let rows: Vec<f64> = (0..sh)
            .map(|cy| energy[cy * sw..(cy + 1) * sw].iter().map(|&e| e as f64).sum())
            .collect();
        let window = scaled_window(crop_h, scale, sh);
        place(best_window(&rows, window), scale, height, crop_h)
    } else {
        0
    };

    (x, y)
}

fn scaled_window(crop: u32, scale: f64, len: usize) -> usize {
    ((crop as f64 * scale).round() as usize).clamp(1, len.max(1))
}

/// Map an offset in the scored copy back to full-size pixels.
fn place(offset: usize, scale: f64, extent: u32, crop: u32) -> u32 {
    ((offset as f64 / scale).round() as u32).min(extent.saturating_sub(crop))
}

/// Start index of the `window`-long span with the largest sum.
///
/// The centred span is the incumbent, so only a strictly better span moves the crop.
pub fn best_window(profile: &[f64], window: usize) -> usize {
    if window >= profile.len() {
        return 0;
    }
    let mut prefix = Vec::with_capacity(profile.len() + 1);
    prefix.push(0.0);
    for value in profile {
        prefix.push(prefix[prefix.len() - 1] + value);
    }
    let sum_at = |start: usize| prefix[start + window] - prefix[start];

    let mut best = centered_offset(profile.len() as u32, window as u32) as usize;
    let mut best_sum = sum_at(best);
    for start in 0..=profile.len() - window {
        let sum = sum_at(start);
        if sum > best_sum + 1e-6 {
            best = start;
            best_sum = sum;
        }
    }
    best
}

fn luminance(p: [u8; 3]) -> f32 {
    0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32
}

fn saturation(p: [u8; 3]) -> f32 {
    let max = p.iter().copied().max().unwrap_or(0) as f32;
    let min = p.iter().copied().min().unwrap_or(0) as f32;
    if max == 0.0 { 0.0 } else { (max - min) / max }
}

fn is_skin(p: [u8; 3]) -> bool {
    let [r, g, b] = p;
    r > 95 && g > 40 && b > 20 && r > g && r > b && r.saturating_sub(g.min(b)) > 15
}

/// Per-pixel salience score, row-major.
fn energy_map(rgb: &RgbImage) -> Vec<f32> {
    let (w, h) = rgb.dimensions();
    let mut energy = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            let p = rgb.get_pixel(x, y).0;
            let l = luminance(p);
            let right = if x + 1 < w {
                (l - luminance(rgb.get_pixel(x + 1, y).0)).abs()
            } else {
                0.0
            };
            let down = if y + 1 < h {
                (l - luminance(rgb.get_pixel(x, y + 1).0)).abs()
            } else {
                0.0
            };
            let skin = if is_skin(p) { SKIN_BONUS } else { 0.0 };
            energy.push(right + down + saturation(p) * SATURATION_WEIGHT + skin);
        }
    }
    energy
}
