use crate::braille::BrailleCanvas;
use crate::hash::{hash2, rand_simple};

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a thicker line (stroke weight >= 3, hover highlight)
pub fn draw_thick_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    draw_line(canvas, x0, y0, x1, y1);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1);
}

/// Draw a filled circle (settlement and cluster markers)
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Fill a projected polygon ring with scanline spans, dithering dot density
/// by `fill_opacity` (0..1). The dither pattern hashes pixel coordinates so
/// it is stable frame to frame instead of shimmering. Scanlines and spans
/// are clamped to the canvas so a zoomed-in polygon costs canvas-sized
/// work, not projected-extent work.
pub fn fill_polygon(canvas: &mut BrailleCanvas, ring: &[(i32, i32)], fill_opacity: f32) {
    if ring.len() < 3 || fill_opacity <= 0.0 {
        return;
    }

    let pw = canvas.pixel_width() as i32;
    let ph = canvas.pixel_height() as i32;
    let min_y = ring.iter().map(|p| p.1).min().unwrap_or(0).max(0);
    let max_y = ring.iter().map(|p| p.1).max().unwrap_or(0).min(ph - 1);
    let opacity = fill_opacity.min(1.0) as f64;

    let mut crossings: Vec<i32> = Vec::with_capacity(8);
    for y in min_y..=max_y {
        crossings.clear();

        // Even-odd edge crossings for this scanline
        let n = ring.len();
        let mut j = n - 1;
        for i in 0..n {
            let (ax, ay) = ring[i];
            let (bx, by) = ring[j];
            if (ay > y) != (by > y) {
                let x = ax as f64 + (y - ay) as f64 / (by - ay) as f64 * (bx - ax) as f64;
                crossings.push(x.round() as i32);
            }
            j = i;
        }
        crossings.sort_unstable();

        for span in crossings.chunks_exact(2) {
            let (start, end) = (span[0], span[1]);
            for x in start.max(0)..=end.min(pw - 1) {
                if rand_simple(hash2(x as u64, y as u64)) < opacity {
                    canvas.set_pixel_signed(x, y);
                }
            }
        }
    }
}

/// Liang-Barsky clip of a segment to the canvas pixel rectangle, with a
/// small margin so thick-stroke offset lines keep their edge dots.
/// `None` when the segment lies entirely outside.
fn clip_segment(
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    w: i32,
    h: i32,
) -> Option<(i32, i32, i32, i32)> {
    const MARGIN: f64 = 2.0;
    let (lo_x, lo_y) = (-MARGIN, -MARGIN);
    let (hi_x, hi_y) = (w as f64 + MARGIN, h as f64 + MARGIN);

    let (fx0, fy0) = (x0 as f64, y0 as f64);
    let dx = (x1 - x0) as f64;
    let dy = (y1 - y0) as f64;

    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-dx, fx0 - lo_x),
        (dx, hi_x - fx0),
        (-dy, fy0 - lo_y),
        (dy, hi_y - fy0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }

    Some((
        (fx0 + t0 * dx).round() as i32,
        (fy0 + t0 * dy).round() as i32,
        (fx0 + t1 * dx).round() as i32,
        (fy0 + t1 * dy).round() as i32,
    ))
}

/// Draw the outline of a projected ring, honoring stroke weight. Edges
/// are clipped to the canvas first so Bresenham never walks off-screen
/// pixel runs.
pub fn draw_ring(canvas: &mut BrailleCanvas, ring: &[(i32, i32)], weight: f32) {
    if ring.len() < 2 {
        return;
    }
    let pw = canvas.pixel_width() as i32;
    let ph = canvas.pixel_height() as i32;
    let thick = weight >= 3.0;
    let n = ring.len();
    for i in 0..n {
        let (ax, ay) = ring[i];
        let (bx, by) = ring[(i + 1) % n];
        let Some((x0, y0, x1, y1)) = clip_segment(ax, ay, bx, by, pw, ph) else {
            continue;
        };
        if thick {
            draw_thick_line(canvas, x0, y0, x1, y1);
        } else {
            draw_line(canvas, x0, y0, x1, y1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        let s = canvas.to_string();
        assert!(s.chars().all(|c| c != '\u{2800}'));
    }

    #[test]
    fn test_fill_full_opacity_covers_interior() {
        let mut canvas = BrailleCanvas::new(10, 5);
        let ring = [(0, 0), (19, 0), (19, 19), (0, 19)];
        fill_polygon(&mut canvas, &ring, 1.0);
        // Interior cells are occupied
        assert!(canvas.cell_occupied(4, 2));
        assert!(canvas.cell_occupied(1, 1));
    }

    #[test]
    fn test_fill_zero_opacity_draws_nothing() {
        let mut canvas = BrailleCanvas::new(10, 5);
        let ring = [(0, 0), (19, 0), (19, 19), (0, 19)];
        fill_polygon(&mut canvas, &ring, 0.0);
        for cx in 0..10 {
            for cy in 0..5 {
                assert!(!canvas.cell_occupied(cx, cy));
            }
        }
    }

    #[test]
    fn test_fill_dither_is_deterministic() {
        let ring = [(0, 0), (19, 0), (19, 19), (0, 19)];
        let mut a = BrailleCanvas::new(10, 5);
        let mut b = BrailleCanvas::new(10, 5);
        fill_polygon(&mut a, &ring, 0.4);
        fill_polygon(&mut b, &ring, 0.4);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_degenerate_ring_ignored() {
        let mut canvas = BrailleCanvas::new(4, 4);
        fill_polygon(&mut canvas, &[(1, 1), (2, 2)], 1.0);
        draw_ring(&mut canvas, &[(1, 1)], 1.0);
    }

    #[test]
    fn test_fill_cost_bounded_by_canvas_not_ring_extent() {
        // A deeply zoomed-in polygon projects far beyond the canvas;
        // fill work must stay proportional to the canvas, not the ring.
        let mut canvas = BrailleCanvas::new(100, 50);
        let ring = [(0, 0), (100_000, 0), (100_000, 100_000), (0, 100_000)];

        let started = std::time::Instant::now();
        fill_polygon(&mut canvas, &ring, 0.5);
        assert!(
            started.elapsed() < std::time::Duration::from_secs(1),
            "fill took {:?}",
            started.elapsed()
        );

        // The visible portion is still filled
        let occupied = (0..100)
            .flat_map(|cx| (0..50).map(move |cy| (cx, cy)))
            .filter(|&(cx, cy)| canvas.cell_occupied(cx, cy))
            .count();
        assert!(occupied > 4000, "only {occupied} cells filled");
    }

    #[test]
    fn test_ring_offscreen_edges_clipped() {
        // Edges crossing the canvas are drawn without walking their
        // off-screen runs; fully outside rings draw nothing.
        let mut canvas = BrailleCanvas::new(100, 50);
        let crossing = [(-100_000, 100), (100_000, 100), (100_000, 100_001)];

        let started = std::time::Instant::now();
        draw_ring(&mut canvas, &crossing, 1.0);
        assert!(
            started.elapsed() < std::time::Duration::from_secs(1),
            "outline took {:?}",
            started.elapsed()
        );
        // The horizontal edge at y=100 crosses the whole canvas
        assert!(canvas.cell_occupied(50, 25));

        let mut empty = BrailleCanvas::new(10, 10);
        draw_ring(&mut empty, &[(-500, -500), (-400, -500), (-400, -400)], 1.0);
        for cx in 0..10 {
            for cy in 0..10 {
                assert!(!empty.cell_occupied(cx, cy));
            }
        }
    }

    #[test]
    fn test_clip_keeps_interior_segment_exact() {
        let clipped = clip_segment(3, 4, 15, 12, 40, 40).unwrap();
        assert_eq!(clipped, (3, 4, 15, 12));
        assert!(clip_segment(-10, -10, -5, -20, 40, 40).is_none());
    }
}
