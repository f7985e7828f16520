use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kanji_ar_tracker::{
    DetectorParams, EdgeRefiner, GlyphEntry, GrayImage, GrayImageView, LabelDictionary,
    MarkerDetector, RecognizerError,
};
use nalgebra::Point2;

fn make_marker_frame(width: usize, height: usize, x0: usize, y0: usize, side: usize) -> GrayImage {
    let mut img = GrayImage::filled(width, height, 255);
    let border = side / 30 + 1;
    let block = side / 5;
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            let (u, v) = (x - x0, y - y0);
            let ring = u < border || v < border || u >= side - border || v >= side - border;
            let corner = u < block && v >= side - block;
            let bar = u >= side / 5 && u < side * 4 / 5 && v >= side * 2 / 5 && v < side * 3 / 5;
            if ring || corner || bar {
                img.set(x, y, 0);
            }
        }
    }
    img
}

fn bench_refine(c: &mut Criterion) {
    let img = make_marker_frame(640, 480, 220, 140, 200);
    let refiner = EdgeRefiner::default();
    let quad = [
        Point2::new(219.0, 140.0),
        Point2::new(420.0, 139.0),
        Point2::new(420.0, 340.0),
        Point2::new(219.0, 340.0),
    ];

    c.bench_function("refine_quad_200px", |b| {
        b.iter(|| {
            let refined = refiner.refine(black_box(&quad), black_box(&img.view()));
            black_box(refined.map(|r| r.corners))
        })
    });
}

fn bench_detect(c: &mut Criterion) {
    let img = make_marker_frame(640, 480, 220, 140, 200);
    let dictionary = LabelDictionary::new(vec![GlyphEntry::new(1, "一")]).unwrap();
    let detector = MarkerDetector::new(
        DetectorParams::default(),
        dictionary,
        |_: &GrayImageView<'_>, _: &str| -> Result<String, RecognizerError> {
            Ok("一".to_string())
        },
    );

    c.bench_function("detect_640x480_one_marker", |b| {
        b.iter(|| black_box(detector.detect(black_box(&img.view()), 100).len()))
    });
}

criterion_group!(refine, bench_refine, bench_detect);
criterion_main!(refine);
