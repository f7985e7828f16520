//! Binary image operations on `GrayImage`: threshold, erosion, flood fill,
//! quarter-turn rotation and region statistics.

use crate::{GrayImage, GrayImageView};

/// `255` where `v > threshold`, else `0`.
pub fn threshold_binary(src: &GrayImageView<'_>, threshold: u8) -> GrayImage {
    GrayImage {
        width: src.width,
        height: src.height,
        data: src
            .data
            .iter()
            .map(|&v| if v > threshold { 255 } else { 0 })
            .collect(),
    }
}

/// Grey-level erosion with a `(2r+1) x (2r+1)` square element.
///
/// Pixels outside the image do not take part in the minimum.
pub fn erode_square(src: &GrayImageView<'_>, radius: usize) -> GrayImage {
    let (w, h) = (src.width, src.height);
    if radius == 0 || w == 0 || h == 0 {
        return src.to_owned_image();
    }

    // Separable: horizontal pass then vertical pass.
    let mut tmp = vec![0u8; w * h];
    for y in 0..h {
        let row = &src.data[y * w..(y + 1) * w];
        for x in 0..w {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius).min(w - 1);
            tmp[y * w + x] = row[x0..=x1].iter().copied().min().unwrap_or(0);
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius).min(h - 1);
        for x in 0..w {
            out.data[y * w + x] = (y0..=y1).map(|yy| tmp[yy * w + x]).min().unwrap_or(0);
        }
    }
    out
}

/// Replace the 4-connected region of pixels equal to the seed value with
/// `value`. Returns the number of pixels changed.
pub fn flood_fill(img: &mut GrayImage, seed: (usize, usize), value: u8) -> usize {
    let (sx, sy) = seed;
    if sx >= img.width || sy >= img.height {
        return 0;
    }
    let target = img.get(sx, sy);
    if target == value {
        return 0;
    }

    let (w, h) = (img.width, img.height);
    let mut stack = vec![(sx, sy)];
    let mut filled = 0usize;
    while let Some((x, y)) = stack.pop() {
        let i = y * w + x;
        if img.data[i] != target {
            continue;
        }
        img.data[i] = value;
        filled += 1;
        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < w {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < h {
            stack.push((x, y + 1));
        }
    }
    filled
}

/// Flood fill from each of the four image corners in turn
/// (top-left, bottom-left, top-right, bottom-right).
pub fn flood_fill_corners(img: &mut GrayImage, value: u8) {
    if img.width == 0 || img.height == 0 {
        return;
    }
    let (xr, yb) = (img.width - 1, img.height - 1);
    for seed in [(0, 0), (0, yb), (xr, 0), (xr, yb)] {
        flood_fill(img, seed, value);
    }
}

/// Rotate by 90 degrees clockwise as seen on screen.
pub fn rotate_cw(src: &GrayImageView<'_>) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let mut out = GrayImage::new(h, w);
    for y in 0..h {
        for x in 0..w {
            // (x, y) -> (h - 1 - y, x)
            out.data[x * h + (h - 1 - y)] = src.data[y * w + x];
        }
    }
    out
}

/// Mean intensity of the whole image.
pub fn mean(src: &GrayImageView<'_>) -> f64 {
    if src.data.is_empty() {
        return 0.0;
    }
    src.data.iter().map(|&v| v as u64).sum::<u64>() as f64 / src.data.len() as f64
}

/// Mean intensity of the `w x h` window at `(x0, y0)`, clipped to the image.
pub fn region_mean(src: &GrayImageView<'_>, x0: usize, y0: usize, w: usize, h: usize) -> f64 {
    let x1 = (x0 + w).min(src.width);
    let y1 = (y0 + h).min(src.height);
    if x0 >= x1 || y0 >= y1 {
        return 0.0;
    }
    let mut sum = 0u64;
    for y in y0..y1 {
        sum += src.data[y * src.width + x0..y * src.width + x1]
            .iter()
            .map(|&v| v as u64)
            .sum::<u64>();
    }
    sum as f64 / ((x1 - x0) * (y1 - y0)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strictly_greater_than() {
        let img = GrayImage {
            width: 3,
            height: 1,
            data: vec![99, 100, 101],
        };
        assert_eq!(threshold_binary(&img.view(), 100).data, vec![0, 0, 255]);
    }

    #[test]
    fn erosion_grows_dark_strokes_by_one_pixel() {
        let mut img = GrayImage::filled(7, 7, 255);
        img.set(3, 3, 0);
        let out = erode_square(&img.view(), 1);
        for y in 0..7 {
            for x in 0..7 {
                let dark = (2..=4).contains(&x) && (2..=4).contains(&y);
                assert_eq!(out.get(x, y), if dark { 0 } else { 255 }, "({x},{y})");
            }
        }
    }

    #[test]
    fn erosion_ignores_the_outside_of_the_image() {
        let img = GrayImage::filled(4, 3, 200);
        assert_eq!(erode_square(&img.view(), 1), img);
    }

    #[test]
    fn flood_fill_stops_at_value_changes_and_diagonals() {
        let mut img = GrayImage::filled(6, 6, 255);
        for i in 0..6 {
            img.set(i, 0, 0);
            img.set(i, 5, 0);
            img.set(0, i, 0);
            img.set(5, i, 0);
        }
        img.set(2, 2, 0);
        img.set(3, 3, 0);
        assert_eq!(flood_fill(&mut img, (0, 0), 255), 20);
        assert_eq!(img.get(2, 2), 0);

        assert_eq!(flood_fill(&mut img, (2, 2), 128), 1);
        assert_eq!(img.get(3, 3), 0);
    }

    #[test]
    fn corner_fill_is_noop_on_white_corners() {
        let mut img = GrayImage::filled(5, 5, 255);
        img.set(2, 2, 0);
        let before = img.clone();
        flood_fill_corners(&mut img, 255);
        assert_eq!(img, before);
    }

    #[test]
    fn rotation_moves_bottom_left_to_top_left() {
        // 3x2 image:
        // 1 2 3
        // 4 5 6
        let img = GrayImage {
            width: 3,
            height: 2,
            data: vec![1, 2, 3, 4, 5, 6],
        };
        let r = rotate_cw(&img.view());
        assert_eq!((r.width, r.height), (2, 3));
        // 4 1
        // 5 2
        // 6 3
        assert_eq!(r.data, vec![4, 1, 5, 2, 6, 3]);

        let mut full = img.clone();
        for _ in 0..4 {
            full = rotate_cw(&full.view());
        }
        assert_eq!(full, img);
    }

    #[test]
    fn region_mean_clips_to_the_image() {
        let mut img = GrayImage::new(4, 4);
        img.set(3, 3, 200);
        assert_eq!(region_mean(&img.view(), 2, 2, 2, 2), 50.0);
        assert_eq!(region_mean(&img.view(), 3, 3, 10, 10), 200.0);
        assert_eq!(region_mean(&img.view(), 4, 0, 2, 2), 0.0);
        assert_eq!(mean(&img.view()), 12.5);
    }
}
