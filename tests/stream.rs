//! End-to-end tests against the pure-Rust engine.

use image::{DynamicImage, GenericImageView, ImageEncoder, RgbImage};
use imgsquash::config;
use imgsquash::{Codec, Contents, EncodeArg, FileError, FileObject, ProcessError, Squash};
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 3 % 256) as u8, (y * 3 % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

fn png_file(path: &str, width: u32, height: u32) -> FileObject {
    FileObject::new(path, png_bytes(width, height)).with_base("src")
}

fn decode(file: &FileObject) -> DynamicImage {
    image::load_from_memory(file.contents.as_bytes().unwrap()).unwrap()
}

fn relative_paths(files: &[FileObject]) -> Vec<String> {
    files
        .iter()
        .map(|f| f.relative().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn default_config_reencodes_to_same_format() {
    let out = Squash::new()
        .transform(png_file("src/images/test1.png", 80, 80))
        .unwrap();

    assert_eq!(relative_paths(&out), vec!["images/test1.png"]);
    assert_eq!(decode(&out[0]).dimensions(), (80, 80));
}

#[test]
fn unknown_format_is_emitted_unchanged() {
    let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;".to_vec();
    let stage = Squash::with_options(json!({ "avif": {}, "webp": {} })).unwrap();
    let out = stage
        .transform(FileObject::new("src/images/1x1.gif", gif.clone()))
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].path, Path::new("src/images/1x1.gif"));
    assert_eq!(out[0].contents.as_bytes().unwrap(), gif.as_slice());
}

#[test]
fn fans_out_to_every_requested_codec() {
    let stage = Squash::with_options(json!({ "oxipng": {}, "webp": {}, "avif": {} })).unwrap();
    let out = stage
        .transform(png_file("src/images/test1.png", 80, 80))
        .unwrap();

    assert_eq!(
        relative_paths(&out),
        vec!["images/test1.png", "images/test1.webp", "images/test1.avif"]
    );
    assert_eq!(decode(&out[0]).dimensions(), (80, 80));
    assert_eq!(decode(&out[1]).dimensions(), (80, 80));
    // ISO-BMFF: size (4 bytes) then the `ftyp` box type
    assert_eq!(&out[2].contents.as_bytes().unwrap()[4..8], b"ftyp");
}

#[test]
fn explicit_targets_replace_the_source_format() {
    let stage =
        Squash::with_options(json!({ "encodeOptions": { "avif": {}, "webp": {} } })).unwrap();
    let out = stage
        .transform(png_file("src/images/test1.png", 80, 80))
        .unwrap();

    assert_eq!(
        relative_paths(&out),
        vec!["images/test1.avif", "images/test1.webp"]
    );
    assert!(out.iter().all(|f| f.path.extension() != Some("png".as_ref())));
}

#[test]
fn jpeg_fans_out_to_jxl_and_jpg() {
    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 90)
        .write_image(
            decode(&png_file("x.png", 48, 32)).to_rgb8().as_raw(),
            48,
            32,
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    let stage =
        Squash::with_options(json!({ "encodeOptions": { "jxl": {}, "mozjpeg": {} } })).unwrap();
    let out = stage
        .transform(FileObject::new("src/images/test2.jpg", jpeg).with_base("src"))
        .unwrap();

    assert_eq!(
        relative_paths(&out),
        vec!["images/test2.jxl", "images/test2.jpg"]
    );
    assert_eq!(&out[0].contents.as_bytes().unwrap()[..2], &[0xFF, 0x0A]);
    assert_eq!(decode(&out[1]).dimensions(), (48, 32));
}

#[test]
fn avif_input_is_decoded_and_reencoded() {
    let avif = Squash::with_options(json!({ "avif": { "speed": 10 } }))
        .unwrap()
        .transform(png_file("src/a.png", 40, 24))
        .unwrap()
        .remove(0);
    let source = FileObject::new("src/a.avif", avif.contents.as_bytes().unwrap().to_vec());

    let out = Squash::with_options(json!({ "webp": {} }))
        .unwrap()
        .transform(source)
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].path, Path::new("src/a.webp"));
    assert_eq!(decode(&out[0]).dimensions(), (40, 24));
}

#[test]
fn callback_resizes_from_decoded_dimensions() {
    let stage = Squash::with_callback(|meta| {
        assert_eq!((meta.width, meta.height), (80, 80));
        Ok(json!({
            "preprocessOptions": {
                "resize": { "enabled": true, "width": meta.width / 2, "height": meta.height / 2 }
            }
        }))
    });
    let out = stage
        .transform(png_file("src/images/test1.png", 80, 80))
        .unwrap();

    assert_eq!(relative_paths(&out), vec!["images/test1.png"]);
    assert_eq!(decode(&out[0]).dimensions(), (40, 40));
}

#[test]
fn callback_may_compute_sizes_as_floats() {
    let stage = Squash::with_callback(|meta| {
        Ok(json!({
            "preprocessOptions": {
                "resize": { "enabled": true, "width": meta.width as f64 / 2.0 }
            }
        }))
    });
    let out = stage.transform(png_file("src/a.png", 16, 8)).unwrap();

    assert_eq!(decode(&out[0]).dimensions(), (8, 4));
}

#[test]
fn preprocess_runs_before_every_encode() {
    let stage = Squash::with_encode_and_preprocess(
        EncodeArg::Static(json!({ "oxipng": {}, "webp": {} })),
        &json!({
            "resize": { "enabled": true, "width": 40 },
            "quant": { "enabled": true, "numColors": 8, "dither": 0.0 },
            "rotate": { "enabled": true, "numRotations": 1 }
        }),
    )
    .unwrap();
    let out = stage.transform(png_file("src/a.png", 80, 40)).unwrap();

    for file in &out {
        let img = decode(file);
        // 80x40 → 40x20 → rotated
        assert_eq!(img.dimensions(), (20, 40));
        let colors: HashSet<[u8; 3]> = img.to_rgb8().pixels().map(|p| p.0).collect();
        assert!(colors.len() <= 8, "{} colors", colors.len());
    }
}

#[test]
fn missing_encoder_fails_only_that_file() {
    let stage = Squash::with_callback(|meta| {
        if meta.path.ends_with("b.png") {
            Ok(json!({ "wp2": {} }))
        } else {
            Ok(json!({ "webp": {} }))
        }
    })
    .concurrency(2);

    let results: Vec<_> = stage
        .stream(vec![
            png_file("src/a.png", 16, 16),
            png_file("src/b.png", 16, 16),
            png_file("src/c.png", 16, 16),
        ])
        .collect();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().path, Path::new("src/a.webp"));
    let err = results[1].as_ref().unwrap_err();
    assert!(!err.is_fatal());
    assert!(matches!(
        err,
        ProcessError::File {
            source: FileError::Engine(imgsquash::imaging::EngineError::EncodeFailed {
                codec: Codec::Wp2,
                ..
            }),
            ..
        }
    ));
    assert_eq!(results[2].as_ref().unwrap().path, Path::new("src/c.webp"));
}

#[test]
fn corrupt_image_is_a_per_file_error() {
    let stage = Squash::new();
    let results: Vec<_> = stage
        .stream(vec![
            FileObject::new("src/broken.png", b"\x89PNG not really".to_vec()),
            png_file("src/ok.png", 8, 8),
        ])
        .collect();

    assert!(matches!(
        &results[0],
        Err(ProcessError::File {
            source: FileError::Engine(_),
            ..
        })
    ));
    assert!(results[1].is_ok());
}

#[test]
fn stream_stops_on_unbuffered_contents() {
    let stage = Squash::new();
    let streamed = FileObject::new("src/live.png", Vec::new())
        .with_contents(Contents::Stream(Box::new(std::io::Cursor::new(png_bytes(4, 4)))));
    let results: Vec<_> = stage
        .stream(vec![png_file("src/a.png", 4, 4), streamed, png_file("src/c.png", 4, 4)])
        .collect();

    assert_eq!(results.len(), 2);
    assert!(results[1].as_ref().unwrap_err().is_fatal());
}

#[test]
fn parallel_fan_out_keeps_input_order() {
    let stage = Squash::with_options(json!({ "encodeOptions": { "webp": {}, "oxipng": {} } }))
        .unwrap()
        .concurrency(3);
    let inputs: Vec<FileObject> = (0..7)
        .map(|i| png_file(&format!("src/{i}.png"), 8 + i, 8))
        .collect();

    let out: Vec<FileObject> = stage.stream(inputs).collect::<Result<_, _>>().unwrap();

    assert_eq!(out.len(), 14);
    for (i, pair) in out.chunks(2).enumerate() {
        assert_eq!(pair[0].relative(), Path::new(&format!("{i}.webp")));
        assert_eq!(pair[1].relative(), Path::new(&format!("{i}.png")));
        assert_eq!(decode(&pair[0]).width(), 8 + i as u32);
    }
}

#[test]
fn config_file_drives_the_stage() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(config::CONFIG_FILE),
        r#"
[encode.webp]

[fit]
contain = 32
"#,
    )
    .unwrap();

    let squash_config = config::load_config(tmp.path()).unwrap();
    let stage = Squash::from_input(squash_config.to_input().unwrap());
    let out = stage.transform(png_file("src/wide.png", 128, 64)).unwrap();

    assert_eq!(relative_paths(&out), vec!["wide.webp"]);
    assert_eq!(decode(&out[0]).dimensions(), (32, 16));
}
