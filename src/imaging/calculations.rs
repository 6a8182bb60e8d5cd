//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `(orig_w, orig_h)` inside a `max_w × max_h` box, preserving aspect ratio.
///
/// Width is constrained first; if the resulting height still exceeds the box,
/// height is constrained and width recomputed. Both are rounded to the nearest
/// pixel. Dimensions already inside the box are returned unchanged, so this
/// never upscales.
///
/// # Examples
/// ```
/// # use product_images::imaging::fit_dimensions;
/// // 2000x1000 landscape into a 1000 box → 1000x500
/// assert_eq!(fit_dimensions(2000, 1000, 1000, 1000), (1000, 500));
///
/// // Already small enough → untouched
/// assert_eq!(fit_dimensions(640, 480, 1000, 1000), (640, 480));
/// ```
pub fn fit_dimensions(orig_w: u32, orig_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if orig_w == 0 || orig_h == 0 {
        return (orig_w.min(max_w), orig_h.min(max_h));
    }

    let aspect = orig_w as f64 / orig_h as f64;
    let mut width = orig_w as f64;
    let mut height = orig_h as f64;

    if width > max_w as f64 {
        width = max_w as f64;
        height = width / aspect;
    }
    if height > max_h as f64 {
        height = max_h as f64;
        width = height * aspect;
    }

    (
        (width.round() as u32).max(1),
        (height.round() as u32).max(1),
    )
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Fill dimensions (at least one matches target)
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = ((h as f64 * src_aspect).round() as u32).max(tgt_w);
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = ((w as f64 / src_aspect).round() as u32).max(tgt_h);
        (w, h)
    }
}

/// Offset of a `window`-long span centred inside `extent`.
pub fn centered_offset(extent: u32, window: u32) -> u32 {
    extent.saturating_sub(window) / 2
}
