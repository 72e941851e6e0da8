//! Pure calculation functions for thumbnail geometry.
//!
//! All functions here are pure and testable without any I/O or images.

/// Centred window of `source` that has the aspect ratio of `target`.
///
/// Returns `(x, y, width, height)` in source pixels. The window spans the
/// full source along one axis and is trimmed along the other, so cropping
/// to it and then resizing to `target` fills the footprint without
/// distortion. The window never exceeds the source and is never empty, so
/// no intermediate larger than the decoded image is ever needed, however
/// extreme the source aspect ratio.
///
/// ```
/// # use wallcache::imaging::calculate_crop_window;
/// // 1920x1080 into 300x300 → keep the middle 1080x1080
/// assert_eq!(calculate_crop_window((1920, 1080), (300, 300)), (420, 0, 1080, 1080));
/// ```
pub fn calculate_crop_window(source: (u32, u32), target: (u32, u32)) -> (u32, u32, u32, u32) {
    let (src_w, src_h) = (source.0.max(1) as u64, source.1.max(1) as u64);
    let (tgt_w, tgt_h) = (target.0.max(1) as u64, target.1.max(1) as u64);

    // Compare src_w/src_h against tgt_w/tgt_h without floating point.
    let (crop_w, crop_h) = if src_w * tgt_h > src_h * tgt_w {
        // Source is wider: keep full height, trim the sides
        let w = (src_h * tgt_w + tgt_h / 2) / tgt_h;
        (w.clamp(1, src_w), src_h)
    } else {
        // Source is taller (or equal): keep full width, trim top and bottom
        let h = (src_w * tgt_h + tgt_w / 2) / tgt_w;
        (src_w, h.clamp(1, src_h))
    };

    (
        ((src_w - crop_w) / 2) as u32,
        ((src_h - crop_h) / 2) as u32,
        crop_w as u32,
        crop_h as u32,
    )
}
