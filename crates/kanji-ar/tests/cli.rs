use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn kanji_ar() -> Command {
    Command::cargo_bin("kanji-ar").unwrap()
}

/// 640x480 white frame with one 200 px cross marker at (220, 140).
fn write_marker_png(path: &Path) {
    let img = image::GrayImage::from_fn(640, 480, |x, y| {
        let inside = (220..420).contains(&x) && (140..340).contains(&y);
        if !inside {
            return image::Luma([255]);
        }
        let (u, v) = ((x - 220) / 2, (y - 140) / 2);
        let border = u < 3 || v < 3 || u >= 97 || v >= 97;
        let block = u < 22 && v >= 78;
        let cross = ((25..75).contains(&u) && (43..57).contains(&v))
            || ((43..57).contains(&u) && (25..75).contains(&v));
        image::Luma([if border || block || cross { 0 } else { 255 }])
    });
    img.save(path).unwrap();
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    std::fs::write(
        dir.join("meta.json"),
        r#"{"glyphs":[{"id":1,"glyph":"十"},{"id":2,"glyph":"一"}],"combinations":[{"id":12}]}"#,
    )
    .unwrap();
    let config = dir.join("tracker.json");
    std::fs::write(&config, r#"{"threshold":100,"dictionary_path":"meta.json"}"#).unwrap();
    config
}

#[test]
fn help_lists_subcommands() {
    kanji_ar()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("detect"))
        .stdout(predicate::str::contains("init-config"));
}

#[test]
fn init_config_writes_defaults() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("tracker.json");
    kanji_ar()
        .args(["init-config", "--out"])
        .arg(&out)
        .assert()
        .success();

    let raw = std::fs::read_to_string(&out).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["threshold"], 100);
    assert_eq!(value["dictionary_path"], "meta.json");
    assert!(value["detector"].is_object());
}

#[test]
fn detect_fails_on_missing_config() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("frame.png");
    write_marker_png(&image);
    kanji_ar()
        .args(["detect", "--image"])
        .arg(&image)
        .arg("--config")
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure();
}

#[cfg(unix)]
#[test]
fn detect_writes_report_overlay_and_canonical_images() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("frame.png");
    write_marker_png(&image);
    let config = write_config(dir.path());
    let report = dir.path().join("report.json");
    let overlay = dir.path().join("overlay.png");
    let canonical = dir.path().join("canonical");

    kanji_ar()
        .args(["detect", "--image"])
        .arg(&image)
        .arg("--config")
        .arg(&config)
        .arg("--report")
        .arg(&report)
        .arg("--overlay")
        .arg(&overlay)
        .arg("--canonical-dir")
        .arg(&canonical)
        .args([
            "--ocr-program",
            "sh",
            "--ocr-arg",
            "-c",
            "--ocr-arg",
            "cat > /dev/null; printf '十'",
        ])
        .assert()
        .success();

    let raw = std::fs::read_to_string(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let markers = value["markers"].as_array().unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0]["id"], 1);
    assert_eq!(markers[0]["glyph"], "十");

    let drawn = image::open(&overlay).unwrap();
    assert_eq!((drawn.width(), drawn.height()), (640, 480));
    let written = std::fs::read_dir(&canonical).unwrap().count();
    assert!(written >= 1);
}

#[cfg(unix)]
#[test]
fn detect_prints_report_to_stdout() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("frame.png");
    write_marker_png(&image);
    let config = write_config(dir.path());

    kanji_ar()
        .args(["detect", "--image"])
        .arg(&image)
        .arg("--config")
        .arg(&config)
        .args(["--threshold", "90", "--ocr-program", "sh", "--ocr-arg", "-c"])
        .args(["--ocr-arg", "cat > /dev/null; printf '一'"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"threshold\": 90"))
        .stdout(predicate::str::contains("\"glyph\": \"一\""));
}
