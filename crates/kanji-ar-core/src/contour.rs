//! Border following on binary images (Suzuki & Abe, 1985).
//!
//! Every border is reported, outer and hole alike, as a flat list without
//! hierarchy. Non-zero pixels are foreground; the image is treated as if it
//! were surrounded by a one pixel background frame.

use crate::GrayImageView;
use nalgebra::Point2;

/// Closed, ordered sequence of integer border pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point2<i32>>,
    /// `true` for the border between a hole and its enclosing component.
    pub is_hole: bool,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// Clockwise (image y-down) neighbour offsets, starting east: (drow, dcol).
const NEIGHBORS: [(isize, isize); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

struct LabelGrid {
    width: usize,
    labels: Vec<i32>,
}

impl LabelGrid {
    fn from_binary(img: &GrayImageView<'_>) -> Self {
        let width = img.width + 2;
        let height = img.height + 2;
        let mut labels = vec![0i32; width * height];
        for y in 0..img.height {
            for x in 0..img.width {
                if img.get(x, y) != 0 {
                    labels[(y + 1) * width + x + 1] = 1;
                }
            }
        }
        Self { width, labels }
    }

    #[inline]
    fn idx(&self, r: usize, c: usize) -> usize {
        r * self.width + c
    }

    #[inline]
    fn at(&self, r: usize, c: usize) -> i32 {
        self.labels[self.idx(r, c)]
    }

    #[inline]
    fn neighbor(&self, r: usize, c: usize, dir: usize) -> (usize, usize) {
        let (dr, dc) = NEIGHBORS[dir & 7];
        // Border pixels are always background and never traced from, so the
        // offsets stay inside the padded grid.
        ((r as isize + dr) as usize, (c as isize + dc) as usize)
    }

    fn direction_to(&self, r: usize, c: usize, nr: usize, nc: usize) -> usize {
        let dr = nr as isize - r as isize;
        let dc = nc as isize - c as isize;
        NEIGHBORS
            .iter()
            .position(|&d| d == (dr, dc))
            .unwrap_or(0)
    }

    fn follow(&mut self, start: (usize, usize), from: (usize, usize), nbd: i32) -> Vec<Point2<i32>> {
        let (r0, c0) = start;
        let from_dir = self.direction_to(r0, c0, from.0, from.1);

        // Step 3.1: clockwise search for the first non-zero neighbour.
        let mut first = None;
        for k in 0..8 {
            let dir = (from_dir + k) & 7;
            let (nr, nc) = self.neighbor(r0, c0, dir);
            if self.at(nr, nc) != 0 {
                first = Some((nr, nc));
                break;
            }
        }
        let Some(first) = first else {
            let i = self.idx(r0, c0);
            self.labels[i] = -nbd;
            return vec![Point2::new(c0 as i32 - 1, r0 as i32 - 1)];
        };

        let mut points = Vec::new();
        let mut prev = first;
        let mut cur = (r0, c0);
        loop {
            points.push(Point2::new(cur.1 as i32 - 1, cur.0 as i32 - 1));

            // Step 3.3: counter-clockwise search starting after `prev`.
            let prev_dir = self.direction_to(cur.0, cur.1, prev.0, prev.1);
            let mut east_examined_zero = false;
            let mut next = prev;
            for k in 1..=8 {
                let dir = (prev_dir + 8 - k) & 7;
                let (nr, nc) = self.neighbor(cur.0, cur.1, dir);
                if self.at(nr, nc) != 0 {
                    next = (nr, nc);
                    break;
                }
                if dir == 0 {
                    east_examined_zero = true;
                }
            }

            // Step 3.4: mark the current pixel.
            let i = self.idx(cur.0, cur.1);
            if east_examined_zero {
                self.labels[i] = -nbd;
            } else if self.labels[i] == 1 {
                self.labels[i] = nbd;
            }

            // Step 3.5: back at the start, about to repeat the first move.
            if next == (r0, c0) && cur == first {
                break;
            }
            prev = cur;
            cur = next;
        }
        points
    }
}

/// Extract every border of the foreground (non-zero) regions of `binary`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(binary), fields(width = binary.width, height = binary.height))
)]
pub fn find_contours(binary: &GrayImageView<'_>) -> Vec<Contour> {
    let mut grid = LabelGrid::from_binary(binary);
    let height = binary.height + 2;
    let width = binary.width + 2;
    let mut out = Vec::new();
    let mut nbd = 1i32;

    for r in 1..height - 1 {
        for c in 1..width - 1 {
            let f = grid.at(r, c);
            if f == 0 {
                continue;
            }
            let from = if f == 1 && grid.at(r, c - 1) == 0 {
                Some(((r, c - 1), false))
            } else if f >= 1 && grid.at(r, c + 1) == 0 {
                Some(((r, c + 1), true))
            } else {
                None
            };
            let Some((from, is_hole)) = from else {
                continue;
            };
            nbd += 1;
            let points = grid.follow((r, c), from, nbd);
            out.push(Contour { points, is_hole });
        }
    }
    out
}
