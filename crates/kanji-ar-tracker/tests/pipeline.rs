use approx::assert_abs_diff_eq;
use kanji_ar_tracker::{
    CombinationEntry, DetectorParams, FrameCombinations, GlyphEntry, GrayImage, GrayImageView,
    LabelDictionary, MarkerDetector, RecognizerError, RejectReason, Tracker,
};
use nalgebra::Point2;

const CROSS: &str = "十";
const BAR: &str = "一";

/// Dark pixel of the canonical 100x100 marker design at `(u, v)`.
fn canonical_dark(glyph: &str, u: usize, v: usize) -> bool {
    let border = u < 3 || v < 3 || u >= 97 || v >= 97;
    let block = u < 22 && v >= 78;
    let ink = match glyph {
        CROSS => {
            ((25..75).contains(&u) && (43..57).contains(&v))
                || ((43..57).contains(&u) && (25..75).contains(&v))
        }
        BAR => (20..80).contains(&u) && (42..58).contains(&v),
        _ => false,
    };
    border || block || ink
}

/// Draw a marker of `100 * scale` pixels at `(x0, y0)`, turned clockwise on
/// screen by `turns` quarter turns.
fn draw_marker(img: &mut GrayImage, x0: usize, y0: usize, scale: usize, glyph: &str, turns: u8) {
    for py in y0..y0 + 100 * scale {
        for px in x0..x0 + 100 * scale {
            let (mut u, mut v) = ((px - x0) / scale, (py - y0) / scale);
            for _ in 0..turns % 4 {
                (u, v) = (v, 99 - u);
            }
            if canonical_dark(glyph, u, v) {
                img.set(px, py, 0);
            }
        }
    }
}

/// Stand-in OCR: reads two sample pixels of the upright canonical image.
fn pixel_recognizer(image: &GrayImageView<'_>, _whitelist: &str) -> Result<String, RecognizerError> {
    let text = if image.get(50, 30) < 128 {
        CROSS
    } else if image.get(50, 50) < 128 {
        BAR
    } else {
        ""
    };
    Ok(text.to_string())
}

fn dictionary() -> LabelDictionary {
    LabelDictionary::new(vec![GlyphEntry::new(1, CROSS), GlyphEntry::new(2, BAR)])
        .unwrap()
        .with_combination(CombinationEntry::new(12, 1, 2))
        .unwrap()
}

fn detector(
    params: DetectorParams,
) -> MarkerDetector<fn(&GrayImageView<'_>, &str) -> Result<String, RecognizerError>> {
    MarkerDetector::new(params, dictionary(), pixel_recognizer as _)
}

fn single_marker_frame(turns: u8) -> GrayImage {
    let mut img = GrayImage::filled(640, 480, 255);
    draw_marker(&mut img, 220, 140, 2, CROSS, turns);
    img
}

fn ground_truth(x0: f64, y0: f64, side: f64) -> [Point2<f64>; 4] {
    [
        Point2::new(x0 - 0.5, y0 - 0.5),
        Point2::new(x0 + side - 0.5, y0 - 0.5),
        Point2::new(x0 + side - 0.5, y0 + side - 0.5),
        Point2::new(x0 - 0.5, y0 + side - 0.5),
    ]
}

#[test]
fn single_marker_is_found_with_subpixel_corners() {
    let img = single_marker_frame(0);
    let det = detector(DetectorParams::default());
    let state = det.detect(&img.view(), 100);

    assert_eq!(state.len(), 1);
    let marker = state.get(1).expect("cross marker");
    assert_eq!(marker.glyph, CROSS);
    assert_eq!(marker.rotations, 0);
    for (c, e) in marker
        .image_corners
        .iter()
        .zip(ground_truth(220.0, 140.0, 200.0).iter())
    {
        assert_abs_diff_eq!(c.x, e.x, epsilon = 0.1);
        assert_abs_diff_eq!(c.y, e.y, epsilon = 0.1);
    }

    // Camera-centered corners: principal point at (320, 240), y up.
    assert_abs_diff_eq!(marker.camera_corners[0].x, -100.5, epsilon = 0.1);
    assert_abs_diff_eq!(marker.camera_corners[0].y, 100.5, epsilon = 0.1);

    let r = marker.pose.rotation();
    assert_abs_diff_eq!(r, nalgebra::Matrix3::identity(), epsilon = 1e-2);
    let f = det.params().intrinsics.fy;
    let t = marker.pose.translation();
    assert_abs_diff_eq!(t.z, -f * 0.041 / 200.0, epsilon = 1e-3);
    assert!(t.x.abs() < 1e-3 && t.y.abs() < 1e-3);
}

#[test]
fn turned_marker_corners_follow_the_glyph() {
    let img = single_marker_frame(1);
    let state = detector(DetectorParams::default()).detect(&img.view(), 100);

    let marker = state.get(1).expect("cross marker");
    assert_eq!(marker.rotations, 3);
    // The glyph's top-left corner sits at the top-right of the frame quad.
    let tl = marker.image_corners[0];
    assert_abs_diff_eq!(tl.x, 419.5, epsilon = 0.1);
    assert_abs_diff_eq!(tl.y, 139.5, epsilon = 0.1);

    // Glyph x axis points down the image, i.e. along camera -y.
    let r = marker.pose.rotation();
    assert_abs_diff_eq!(r[(0, 0)], 0.0, epsilon = 1e-2);
    assert_abs_diff_eq!(r[(1, 0)], -1.0, epsilon = 1e-2);
    assert_abs_diff_eq!(r[(2, 2)], 1.0, epsilon = 1e-2);
}

#[test]
fn repeated_detection_is_identical() {
    let img = single_marker_frame(0);
    let det = detector(DetectorParams::default());
    let first = det.detect(&img.view(), 100);
    let second = det.detect(&img.view(), 100);
    assert_eq!(first, second);

    let mut tracker = Tracker::new(detector(DetectorParams::default()), 100);
    tracker.track(&img.view());
    let a = tracker.state().clone();
    tracker.reset();
    assert!(tracker.state().is_empty());
    tracker.track(&img.view());
    assert_eq!(tracker.state(), &a);
}

#[test]
fn two_markers_in_reading_order_form_a_combination() {
    let mut img = GrayImage::filled(640, 480, 255);
    draw_marker(&mut img, 50, 190, 1, CROSS, 0);
    draw_marker(&mut img, 250, 190, 1, BAR, 0);

    let det = detector(DetectorParams::default());
    let state = det.detect(&img.view(), 100);
    assert_eq!(state.len(), 2);
    assert_abs_diff_eq!(state.center(1).unwrap().x, 99.5, epsilon = 0.1);
    assert_abs_diff_eq!(state.center(2).unwrap().x, 299.5, epsilon = 0.1);

    let combos = FrameCombinations::resolve(&state, det.dictionary(), det.estimator(), 0.041);
    assert_eq!(combos.links.len(), 1);
    let link = &combos.links[0];
    assert_eq!((link.left_id, link.right_id), (1, 2));
    let resolved = link.combination.as_ref().expect("combination 12");
    assert_eq!(resolved.id, 12);
    assert!(resolved.pose.is_some());
}

#[test]
fn swapped_markers_draw_no_connector() {
    let mut img = GrayImage::filled(640, 480, 255);
    draw_marker(&mut img, 50, 190, 1, BAR, 0);
    draw_marker(&mut img, 250, 190, 1, CROSS, 0);

    let det = detector(DetectorParams::default());
    let state = det.detect(&img.view(), 100);
    assert_eq!(state.len(), 2);
    let combos = FrameCombinations::resolve(&state, det.dictionary(), det.estimator(), 0.041);
    assert_eq!(combos.links.len(), 1);
    assert_eq!(combos.links[0].left_id, 2);
    assert!(combos.matches().next().is_none());
}

#[test]
fn unreadable_and_unoriented_quads_are_skipped() {
    let mut img = GrayImage::filled(640, 480, 255);
    // Plain dark square: the border fill leaves nothing, out of band.
    for y in 100..200 {
        for x in 50..150 {
            img.set(x, y, 0);
        }
    }
    // Marker design without an orientation block.
    for y in 100..200 {
        for x in 300..400 {
            let (u, v) = (x - 300, y - 100);
            let border = u < 3 || v < 3 || u >= 97 || v >= 97;
            if border || ((20..80).contains(&u) && (42..58).contains(&v)) {
                img.set(x, y, 0);
            }
        }
    }

    let params = DetectorParams {
        collect_debug: true,
        ..DetectorParams::default()
    };
    let det = detector(params);
    let frame = det.detect_frame(&img.view(), 100);
    assert!(frame.markers.is_empty());

    let debug = frame.debug.expect("debug requested");
    assert_eq!(debug.accepted().count(), 0);
    let reasons: Vec<_> = debug.rejected().filter_map(|c| c.reject.clone()).collect();
    assert!(reasons.iter().any(|r| matches!(
        r,
        RejectReason::Canonical(kanji_ar_tracker::CanonicalError::FloodMeanOutOfBand { .. })
    )));
    assert!(reasons.iter().any(|r| matches!(
        r,
        RejectReason::Canonical(kanji_ar_tracker::CanonicalError::Unoriented { rotations: 4 })
    )));
}

#[test]
fn debug_collection_records_accepted_candidates() {
    let img = single_marker_frame(0);
    let det = detector(DetectorParams::default());
    let (state, debug) = det.detect_with_debug(&img.view(), 100);
    assert_eq!(state.len(), 1);
    assert_eq!(debug.threshold, 100);
    assert!(debug.contours >= 3);

    let accepted: Vec<_> = debug.accepted().collect();
    assert_eq!(accepted.len(), 1);
    let cand = accepted[0];
    assert_eq!(cand.label, Some(1));
    assert_eq!(cand.edges.len(), 4);
    assert!(cand.canonical.as_ref().is_some_and(|c| c.width == 100));
    assert!(cand.flood_mean.is_some_and(|m| m > 128.0 && m < 240.0));
}

#[test]
fn frames_without_debug_collection_carry_no_diagnostics() {
    let img = single_marker_frame(0);
    let quiet = detector(DetectorParams::default());
    let frame = quiet.detect_frame(&img.view(), 100);
    assert!(frame.debug.is_none());

    let verbose = detector(DetectorParams {
        collect_debug: true,
        ..DetectorParams::default()
    });
    let traced = verbose.detect_frame(&img.view(), 100);
    assert_eq!(traced.markers, frame.markers);
    assert!(traced.debug.is_some_and(|d| !d.candidates.is_empty()));
}

#[test]
fn color_frames_match_gray_frames() {
    let img = single_marker_frame(0);
    let rgb: Vec<u8> = img.data.iter().flat_map(|&v| [v, v, v]).collect();
    let color = kanji_ar_tracker::ColorImageView {
        width: img.width,
        height: img.height,
        order: Default::default(),
        data: &rgb,
    };
    let det = detector(DetectorParams::default());
    assert_eq!(det.detect_color(&color, 100), det.detect(&img.view(), 100));
}
