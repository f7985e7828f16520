//! Diagnostic overlay drawn onto an RGB frame.
//!
//! Colors: candidate polygons red, their vertices green, strip sample
//! positions blue, fitted edge lines cyan, refined corners yellow, marker
//! centers red. Combination connectors are green on a dictionary match and
//! red otherwise (only when `draw_all_links` is set).

use ::image::{Rgb, RgbImage};
use nalgebra::Point2;

use crate::tracker::{DetectionDebug, FrameCombinations, TrackerState};

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const CYAN: Rgb<u8> = Rgb([0, 255, 255]);
pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

fn set_pixel(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham segment between rounded endpoints.
pub fn draw_line(img: &mut RgbImage, a: Point2<f64>, b: Point2<f64>, color: Rgb<u8>) {
    if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
        return;
    }
    let (mut x0, mut y0) = (a.x.round() as i64, a.y.round() as i64);
    let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        set_pixel(img, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Filled disc.
pub fn draw_dot(img: &mut RgbImage, c: Point2<f64>, radius: i64, color: Rgb<u8>) {
    if !(c.x.is_finite() && c.y.is_finite()) {
        return;
    }
    let (cx, cy) = (c.x.round() as i64, c.y.round() as i64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                set_pixel(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn draw_polygon(img: &mut RgbImage, pts: &[Point2<f64>], color: Rgb<u8>) {
    for (i, &p) in pts.iter().enumerate() {
        draw_line(img, p, pts[(i + 1) % pts.len()], color);
    }
}

/// Candidate quads, strip samples, fitted lines and refined corners.
pub fn draw_debug(img: &mut RgbImage, debug: &DetectionDebug) {
    for cand in &debug.candidates {
        draw_polygon(img, &cand.quad, RED);
        for &v in &cand.quad {
            draw_dot(img, v, 2, GREEN);
        }
        for edge in &cand.edges {
            for &s in &edge.samples {
                draw_dot(img, s, 1, BLUE);
            }
            if let (Some(line), Some(first), Some(last)) =
                (edge.line, edge.points.first(), edge.points.last())
            {
                // Extend the fitted line over the span of its edge points.
                let s0 = (*first - line.point).dot(&line.direction) - 5.0;
                let s1 = (*last - line.point).dot(&line.direction) + 5.0;
                draw_line(img, line.at(s0), line.at(s1), CYAN);
            }
        }
        if let Some(corners) = &cand.corners {
            for &c in corners {
                draw_dot(img, c, 2, YELLOW);
            }
        }
    }
}

/// Marker centers.
pub fn draw_markers(img: &mut RgbImage, markers: &TrackerState) {
    for marker in markers.iter() {
        draw_dot(img, marker.center(), 5, RED);
    }
}

/// Connectors between marker centers.
pub fn draw_combinations(img: &mut RgbImage, combos: &FrameCombinations, draw_all_links: bool) {
    for link in &combos.links {
        let color = if link.is_match() {
            GREEN
        } else if draw_all_links {
            RED
        } else {
            continue;
        };
        draw_line(img, link.left_center, link.right_center, color);
    }
}
