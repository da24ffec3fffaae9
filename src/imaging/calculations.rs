//! Pure calculation functions for image geometry and size budgets.
//!
//! All functions here are pure and testable without any I/O or images.
//! Every offset and scaled length is rounded to the nearest whole pixel, so
//! centring may land one pixel off for odd differences.

use super::params::{FitMode, Region, RenderPlan};

/// Bytes per megabyte for size budgets.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Scale a length by `ratio`, rounding and keeping at least one pixel.
fn scale_length(length: u32, ratio: f64) -> u32 {
    ((length as f64 * ratio).round() as u32).max(1)
}

/// Calculate the output size of a bounded (never upscaling) compression.
///
/// # Arguments
/// * `source` - Decoded image dimensions (width, height)
/// * `bounds` - Maximum allowed (width, height)
/// * `maintain_aspect_ratio` - Uniform scale-down when true, per-axis clamp when false
///
/// # Returns
/// * `(width, height)` - Target dimensions
///
/// With aspect ratio preserved, the source is only touched when at least one
/// axis exceeds its bound; both axes are then scaled by
/// `min(max_w / w, max_h / h)`.
pub fn calculate_fit_dimensions(
    source: (u32, u32),
    bounds: (u32, u32),
    maintain_aspect_ratio: bool,
) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if !maintain_aspect_ratio {
        return (src_w.min(max_w), src_h.min(max_h));
    }

    if src_w <= max_w && src_h <= max_h {
        return (src_w, src_h);
    }

    let ratio = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    (
        scale_length(src_w, ratio).min(max_w.max(1)),
        scale_length(src_h, ratio).min(max_h.max(1)),
    )
}

/// Calculate the centred source region a cover resize keeps.
///
/// Returns the largest region with the target's aspect ratio. A relatively
/// wider source loses equal margins left and right; a taller (or equally
/// proportioned) source loses equal margins top and bottom.
pub fn calculate_cover_region(source: (u32, u32), target: (u32, u32)) -> Region {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Wider: full height, crop width
        let width = ((src_h as f64 * tgt_aspect).round() as u32).clamp(1, src_w);
        let x = ((src_w - width) as f64 / 2.0).round() as u32;
        Region {
            x,
            y: 0,
            width,
            height: src_h,
        }
    } else {
        // Taller or equal: full width, crop height
        let height = ((src_w as f64 / tgt_aspect).round() as u32).clamp(1, src_h);
        let y = ((src_h - height) as f64 / 2.0).round() as u32;
        Region {
            x: 0,
            y,
            width: src_w,
            height,
        }
    }
}

/// Calculate where a contain resize draws the whole source inside the canvas.
///
/// The source is scaled uniformly by `min(tgt_w / w, tgt_h / h)` (up or
/// down) and centred; the uncovered bars are left to the fill colour.
pub fn calculate_contain_placement(source: (u32, u32), target: (u32, u32)) -> Region {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let ratio = (tgt_w as f64 / src_w as f64).min(tgt_h as f64 / src_h as f64);
    let width = scale_length(src_w, ratio).min(tgt_w);
    let height = scale_length(src_h, ratio).min(tgt_h);

    Region {
        x: ((tgt_w - width) as f64 / 2.0).round() as u32,
        y: ((tgt_h - height) as f64 / 2.0).round() as u32,
        width,
        height,
    }
}

/// Resolve the render plan for an exact-size resize.
pub fn calculate_resize_plan(source: (u32, u32), target: (u32, u32), fit: FitMode) -> RenderPlan {
    let (width, height) = target;
    match fit {
        FitMode::Cover => RenderPlan::Cover {
            region: calculate_cover_region(source, target),
            width,
            height,
        },
        FitMode::Contain => RenderPlan::Contain {
            placement: calculate_contain_placement(source, target),
            width,
            height,
            fill: RenderPlan::LETTERBOX,
        },
    }
}

/// Whether an encoded buffer is over a megabyte budget.
pub fn exceeds_budget(size: usize, max_size_mb: f64) -> bool {
    size as f64 > max_size_mb * BYTES_PER_MB
}

/// Render a byte count as whole-or-fractional megabytes: `10`, `1.5`, `0.1`.
pub fn format_megabytes(bytes: u64) -> String {
    let mb = bytes as f64 / BYTES_PER_MB;
    let rendered = format!("{mb:.2}");
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_fit_dimensions tests
    // =========================================================================

    #[test]
    fn fit_landscape_over_bounds() {
        // 4000x3000 into 1920 box → ratio 0.48
        assert_eq!(
            calculate_fit_dimensions((4000, 3000), (1920, 1920), true),
            (1920, 1440)
        );
    }

    #[test]
    fn fit_portrait_over_bounds() {
        assert_eq!(
            calculate_fit_dimensions((3000, 4000), (1920, 1920), true),
            (1440, 1920)
        );
    }

    #[test]
    fn fit_only_height_over_bound() {
        // 1000x3000 → height limited: ratio 0.64
        assert_eq!(
            calculate_fit_dimensions((1000, 3000), (1920, 1920), true),
            (640, 1920)
        );
    }

    #[test]
    fn fit_within_bounds_unchanged() {
        assert_eq!(
            calculate_fit_dimensions((800, 600), (1920, 1920), true),
            (800, 600)
        );
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(calculate_fit_dimensions((10, 10), (512, 512), true), (10, 10));
        assert_eq!(calculate_fit_dimensions((10, 10), (512, 512), false), (10, 10));
    }

    #[test]
    fn fit_without_aspect_clamps_each_axis() {
        assert_eq!(
            calculate_fit_dimensions((4000, 1000), (1920, 1920), false),
            (1920, 1000)
        );
    }

    #[test]
    fn fit_extreme_panorama_keeps_one_pixel() {
        assert_eq!(
            calculate_fit_dimensions((100_000, 10), (1000, 1000), true),
            (1000, 1)
        );
    }

    #[test]
    fn fit_respects_bounds_and_aspect_across_grid() {
        let sources = [(4000, 3000), (3000, 4000), (1921, 1080), (7, 5000), (8192, 8191)];
        let bounds = [(1920, 1920), (512, 512), (800, 600), (100, 1000)];
        for &(w, h) in &sources {
            for &(max_w, max_h) in &bounds {
                let (tw, th) = calculate_fit_dimensions((w, h), (max_w, max_h), true);
                if w > max_w || h > max_h {
                    assert!(tw <= max_w && th <= max_h, "{w}x{h} in {max_w}x{max_h} → {tw}x{th}");
                }
                // Half a pixel of rounding per axis, cross-multiplied
                let skew = (tw as u64 * h as u64).abs_diff(th as u64 * w as u64);
                assert!(
                    skew <= w.max(h) as u64,
                    "{w}x{h} → {tw}x{th} distorts aspect"
                );
            }
        }
    }

    // =========================================================================
    // calculate_cover_region tests
    // =========================================================================

    #[test]
    fn cover_wider_source_crops_sides() {
        // 1600x900 → square: keep 900x900, 350px off each side
        assert_eq!(
            calculate_cover_region((1600, 900), (512, 512)),
            Region {
                x: 350,
                y: 0,
                width: 900,
                height: 900
            }
        );
    }

    #[test]
    fn cover_taller_source_crops_top_and_bottom() {
        // 600x800 → 4:3 target: keep 600x450, 175px off top and bottom
        assert_eq!(
            calculate_cover_region((600, 800), (400, 300)),
            Region {
                x: 0,
                y: 175,
                width: 600,
                height: 450
            }
        );
    }

    #[test]
    fn cover_same_aspect_keeps_everything() {
        assert_eq!(
            calculate_cover_region((800, 600), (400, 300)),
            Region {
                x: 0,
                y: 0,
                width: 800,
                height: 600
            }
        );
    }

    #[test]
    fn cover_odd_margin_rounds() {
        // 101x100 → square: 1px to remove, offset rounds to 1
        let region = calculate_cover_region((101, 100), (50, 50));
        assert_eq!(region.width, 100);
        assert_eq!(region.x, 1);
    }

    #[test]
    fn cover_region_stays_inside_source() {
        let cases = [
            ((1600, 900), (512, 512)),
            ((3, 2000), (1000, 1)),
            ((2000, 3), (1, 1000)),
            ((640, 480), (1920, 1080)),
        ];
        for (source, target) in cases {
            let r = calculate_cover_region(source, target);
            assert!(r.width >= 1 && r.height >= 1);
            assert!(r.x + r.width <= source.0, "{source:?} → {target:?}: {r:?}");
            assert!(r.y + r.height <= source.1, "{source:?} → {target:?}: {r:?}");
        }
    }

    // =========================================================================
    // calculate_contain_placement tests
    // =========================================================================

    #[test]
    fn contain_wide_source_letterboxes_vertically() {
        // 1600x900 → 512x512: ratio 0.32, 512x288 centred at y=112
        assert_eq!(
            calculate_contain_placement((1600, 900), (512, 512)),
            Region {
                x: 0,
                y: 112,
                width: 512,
                height: 288
            }
        );
    }

    #[test]
    fn contain_tall_source_pillarboxes() {
        assert_eq!(
            calculate_contain_placement((500, 1000), (400, 400)),
            Region {
                x: 100,
                y: 0,
                width: 200,
                height: 400
            }
        );
    }

    #[test]
    fn contain_upscales_small_source() {
        assert_eq!(
            calculate_contain_placement((100, 50), (400, 400)),
            Region {
                x: 0,
                y: 100,
                width: 400,
                height: 200
            }
        );
    }

    #[test]
    fn contain_same_aspect_fills_canvas() {
        assert_eq!(
            calculate_contain_placement((800, 600), (400, 300)),
            Region {
                x: 0,
                y: 0,
                width: 400,
                height: 300
            }
        );
    }

    #[test]
    fn resize_plan_matches_fit_mode() {
        assert!(matches!(
            calculate_resize_plan((1600, 900), (512, 512), FitMode::Cover),
            RenderPlan::Cover {
                width: 512,
                height: 512,
                ..
            }
        ));
        assert!(matches!(
            calculate_resize_plan((1600, 900), (512, 512), FitMode::Contain),
            RenderPlan::Contain {
                fill: [0, 0, 0],
                ..
            }
        ));
    }

    // =========================================================================
    // budget helpers
    // =========================================================================

    #[test]
    fn budget_boundary_is_inclusive() {
        let limit = (1.5 * BYTES_PER_MB) as usize;
        assert!(!exceeds_budget(limit, 1.5));
        assert!(exceeds_budget(limit + 1, 1.5));
    }

    #[test]
    fn fractional_budget_compares_exactly() {
        // 0.1 MB = 104857.6 bytes
        assert!(!exceeds_budget(104_857, 0.1));
        assert!(exceeds_budget(104_858, 0.1));
    }

    #[test]
    fn format_megabytes_trims_zeros() {
        assert_eq!(format_megabytes(10 * 1024 * 1024), "10");
        assert_eq!(format_megabytes(1536 * 1024), "1.5");
        assert_eq!(format_megabytes(0), "0");
    }
}
