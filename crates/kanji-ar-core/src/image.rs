use serde::{Deserialize, Serialize};

/// Borrowed 8-bit single-channel image, row-major.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

/// Owned 8-bit single-channel image, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }
}

impl GrayImageView<'_> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    pub fn to_owned_image(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

/// Channel order of an interleaved 3-channel frame.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Borrowed interleaved 3-channel color frame.
#[derive(Clone, Copy, Debug)]
pub struct ColorImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub order: ChannelOrder,
    pub data: &'a [u8], // row-major, len = w*h*3
}

impl ColorImageView<'_> {
    /// Convert to luma with the BT.601 weights (0.299 R + 0.587 G + 0.114 B).
    pub fn to_gray(&self) -> GrayImage {
        let n = self.width * self.height;
        let mut out = Vec::with_capacity(n);
        for px in self.data.chunks_exact(3).take(n) {
            let (r, g, b) = match self.order {
                ChannelOrder::Rgb => (px[0], px[1], px[2]),
                ChannelOrder::Bgr => (px[2], px[1], px[0]),
            };
            let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            out.push(y.round().clamp(0.0, 255.0) as u8);
        }
        out.resize(n, 0);
        GrayImage {
            width: self.width,
            height: self.height,
            data: out,
        }
    }
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i64, y: i64) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i64 || y >= src.height as i64 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

/// Bilinear sample; pixels outside the image read as black.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f64, y: f64) -> f64 {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_gray(src, x0, y0) as f64;
    let p10 = get_gray(src, x0 + 1, y0) as f64;
    let p01 = get_gray(src, x0, y0 + 1) as f64;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f64;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f64, y: f64) -> u8 {
    sample_bilinear(src, x, y).round().clamp(0.0, 255.0) as u8
}

/// Bilinear sample that returns `fallback` unless the whole 2x2 support lies
/// inside the image.
#[inline]
pub fn sample_bilinear_or(src: &GrayImageView<'_>, x: f64, y: f64, fallback: f64) -> f64 {
    if !x.is_finite() || !y.is_finite() {
        return fallback;
    }
    let fx = x.floor();
    let fy = y.floor();
    if fx < 0.0 || fy < 0.0 || fx >= src.width as f64 - 1.0 || fy >= src.height as f64 - 1.0 {
        return fallback;
    }
    sample_bilinear(src, x, y)
}
