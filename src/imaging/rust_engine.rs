//! Pure Rust image engine on top of the `image` crate.
//!
//! No system libraries: everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP) | `image::ImageReader` with format sniffing |
//! | Decode (AVIF) | `avif-parse` (container) + `rav1d` (AV1 bitstream) |
//! | Resize | `image::DynamicImage::resize_exact` |
//! | Quantize | per-channel posterize + 4×4 ordered dither |
//! | Rotate | `rotate90` / `rotate180` / `rotate270` |
//! | Encode → PNG (`oxipng`) | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG (`mozjpeg`) | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless only) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e) |
//! | Encode → JPEG XL | `zune_jpegxl::JxlSimpleEncoder` (lossless only) |
//!
//! WebP2 has no pure-Rust encoder; requesting it fails with
//! [`EngineError::EncodeFailed`].

use super::engine::{EngineError, ImageEngine};
use super::geometry::Size;
use super::params::{
    AvifOptions, JpegOptions, JxlOptions, PngOptions, QuantOptions, ResizeMethod, WebpOptions,
};
use crate::registry::{Codec, EncodeOptions};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::Cursor;
use zune_core::bit_depth::BitDepth;
use zune_core::colorspace::ColorSpace;
use zune_core::options::EncoderOptions;
use zune_jpegxl::JxlSimpleEncoder;

/// Bayer threshold matrix for ordered dithering.
const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Pure Rust engine using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustEngine;

impl RustEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_for(method: ResizeMethod) -> FilterType {
    match method {
        ResizeMethod::Triangle => FilterType::Triangle,
        // No Mitchell filter in `image`; Catmull-Rom is the nearest cubic.
        ResizeMethod::Catrom | ResizeMethod::Mitchell => FilterType::CatmullRom,
        ResizeMethod::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Read a typed view of a codec's option bag.
fn codec_options<T: DeserializeOwned>(codec: Codec, options: &EncodeOptions) -> Result<T, EngineError> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| EngineError::EncodeFailed {
        codec,
        reason: format!("invalid options: {e}"),
    })
}

/// Per-channel level count whose full palette does not exceed `num_colors`.
fn levels_for(num_colors: u32) -> u32 {
    let mut levels = 2;
    while (levels + 1u32).pow(3) <= num_colors {
        levels += 1;
    }
    levels
}

fn encode_err(codec: Codec) -> impl Fn(image::ImageError) -> EngineError {
    move |e| EngineError::EncodeFailed {
        codec,
        reason: e.to_string(),
    }
}

fn encode_png(image: &DynamicImage, options: &PngOptions) -> Result<Vec<u8>, EngineError> {
    let compression = match options.level {
        0 | 1 => CompressionType::Fast,
        2..=4 => CompressionType::Default,
        _ => CompressionType::Best,
    };
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, compression, PngFilter::Adaptive);
    image
        .write_with_encoder(encoder)
        .map_err(encode_err(Codec::Oxipng))?;
    Ok(buf)
}

fn encode_jpeg(image: &DynamicImage, options: &JpegOptions) -> Result<Vec<u8>, EngineError> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, options.quality.value() as u8);
    rgb.write_with_encoder(encoder)
        .map_err(encode_err(Codec::MozJpeg))?;
    Ok(buf)
}

fn encode_webp(image: &DynamicImage, options: &WebpOptions) -> Result<Vec<u8>, EngineError> {
    if !options.lossless || options.quality.is_some() {
        tracing::debug!("lossy webp requested, encoding lossless");
    }
    let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
    let mut buf = Vec::new();
    rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buf))
        .map_err(encode_err(Codec::WebP))?;
    Ok(buf)
}

/// Encode AVIF using rav1e.
fn encode_avif(image: &DynamicImage, options: &AvifOptions) -> Result<Vec<u8>, EngineError> {
    let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
    let mut buf = Vec::new();
    let encoder = AvifEncoder::new_with_speed_quality(
        &mut buf,
        options.speed.clamp(1, 10),
        options.quality.value() as u8,
    );
    rgba.write_with_encoder(encoder)
        .map_err(encode_err(Codec::Avif))?;
    Ok(buf)
}

/// Lossless JPEG XL via zune-jpegxl.
fn encode_jxl(image: &DynamicImage, options: &JxlOptions) -> Result<Vec<u8>, EngineError> {
    if options.quality.is_some() {
        tracing::debug!("jxl quality ignored, encoding lossless");
    }
    let (pixels, colorspace) = if image.color().has_alpha() {
        (image.to_rgba8().into_raw(), ColorSpace::RGBA)
    } else {
        (image.to_rgb8().into_raw(), ColorSpace::RGB)
    };
    let options = EncoderOptions::new(
        image.width() as usize,
        image.height() as usize,
        colorspace,
        BitDepth::Eight,
    );
    JxlSimpleEncoder::new(&pixels, options)
        .encode()
        .map_err(|e| EngineError::EncodeFailed {
            codec: Codec::Jxl,
            reason: format!("{e:?}"),
        })
}

/// ISO-BMFF `ftyp` box with an AVIF major brand.
fn is_avif(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[4..8] == b"ftyp" && matches!(&bytes[8..12], b"avif" | b"avis")
}

fn avif_err(what: &str) -> EngineError {
    EngineError::DecodeFailed(format!("avif: {what}"))
}

/// Decode AVIF with avif-parse (container) and rav1d (AV1 payload).
///
/// The `image` crate's `"avif"` feature only provides the rav1e encoder;
/// its decoder needs the C library dav1d. `rav1d` is the pure Rust port.
fn decode_avif(bytes: &[u8]) -> Result<DynamicImage, EngineError> {
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::picture::Dav1dPicture;
    use rav1d::src::lib as ffi;
    use std::mem::MaybeUninit;
    use std::ptr::NonNull;

    let avif = avif_parse::read_avif(&mut Cursor::new(bytes))
        .map_err(|e| avif_err(&format!("container: {e:?}")))?;
    let av1_bytes: &[u8] = &avif.primary_item;

    let mut settings = MaybeUninit::<Dav1dSettings>::uninit();
    unsafe { ffi::dav1d_default_settings(NonNull::from(&mut settings).cast()) };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc = unsafe {
        ffi::dav1d_open(
            Some(NonNull::from(&mut ctx)),
            Some(NonNull::from(&mut settings)),
        )
    };
    if rc.0 != 0 {
        return Err(avif_err(&format!("decoder open failed ({})", rc.0)));
    }

    let mut data = Dav1dData::default();
    let buf_ptr =
        unsafe { ffi::dav1d_data_create(Some(NonNull::from(&mut data)), av1_bytes.len()) };
    if buf_ptr.is_null() {
        unsafe { ffi::dav1d_close(Some(NonNull::from(&mut ctx))) };
        return Err(avif_err("data allocation failed"));
    }
    unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf_ptr, av1_bytes.len()) };

    let rc = unsafe { ffi::dav1d_send_data(ctx, Some(NonNull::from(&mut data))) };
    if rc.0 != 0 {
        unsafe {
            ffi::dav1d_data_unref(Some(NonNull::from(&mut data)));
            ffi::dav1d_close(Some(NonNull::from(&mut ctx)));
        }
        return Err(avif_err(&format!("send data failed ({})", rc.0)));
    }

    let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
    let rc = unsafe { ffi::dav1d_get_picture(ctx, Some(NonNull::from(&mut pic))) };
    if rc.0 != 0 {
        unsafe { ffi::dav1d_close(Some(NonNull::from(&mut ctx))) };
        return Err(avif_err(&format!("no picture ({})", rc.0)));
    }

    let image = picture_to_rgb(&pic);
    unsafe {
        ffi::dav1d_picture_unref(Some(NonNull::from(&mut pic)));
        ffi::dav1d_close(Some(NonNull::from(&mut ctx)));
    }
    image.map(DynamicImage::ImageRgb8)
}

/// Copy a decoded rav1d picture out as 8-bit RGB.
fn picture_to_rgb(
    pic: &rav1d::include::dav1d::picture::Dav1dPicture,
) -> Result<image::RgbImage, EngineError> {
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };

    let plane = |i: usize| {
        pic.data[i]
            .map(|p| p.as_ptr() as *const u8)
            .ok_or_else(|| avif_err("missing picture plane"))
    };
    let width = pic.p.w as u32;
    let height = pic.p.h as u32;
    let layout = pic.p.layout;
    let y_ptr = plane(0)?;

    let planes = if layout == DAV1D_PIXEL_LAYOUT_I400 {
        YuvPlanes {
            y: y_ptr,
            u: y_ptr,
            v: y_ptr,
            y_stride: pic.stride[0],
            uv_stride: 0,
            width,
            height,
            bpc: pic.p.bpc as u32,
            subsample: (false, false),
            monochrome: true,
        }
    } else {
        let subsample = match layout {
            DAV1D_PIXEL_LAYOUT_I420 => (true, true),
            DAV1D_PIXEL_LAYOUT_I422 => (true, false),
            DAV1D_PIXEL_LAYOUT_I444 => (false, false),
            other => return Err(avif_err(&format!("unsupported pixel layout {other}"))),
        };
        YuvPlanes {
            y: y_ptr,
            u: plane(1)?,
            v: plane(2)?,
            y_stride: pic.stride[0],
            uv_stride: pic.stride[1],
            width,
            height,
            bpc: pic.p.bpc as u32,
            subsample,
            monochrome: false,
        }
    };

    image::RgbImage::from_raw(width, height, planes.to_rgb())
        .ok_or_else(|| avif_err("picture size mismatch"))
}

/// Borrowed YUV planes of a decoded picture.
struct YuvPlanes {
    y: *const u8,
    u: *const u8,
    v: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    /// Chroma subsampling (horizontal, vertical); I420 is `(true, true)`.
    subsample: (bool, bool),
    monochrome: bool,
}

impl YuvPlanes {
    /// Interleaved RGB8, BT.601 coefficients.
    fn to_rgb(&self) -> Vec<u8> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;
        let (ss_x, ss_y) = self.subsample;

        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);
        for row in 0..self.height {
            for col in 0..self.width {
                let y = sample(self.y, self.y_stride, col, row, self.bpc);
                let (r, g, b) = if self.monochrome {
                    (y, y, y)
                } else {
                    let cx = if ss_x { col / 2 } else { col };
                    let cy = if ss_y { row / 2 } else { row };
                    let cb = sample(self.u, self.uv_stride, cx, cy, self.bpc) - center;
                    let cr = sample(self.v, self.uv_stride, cx, cy, self.bpc) - center;
                    (
                        y + 1.402 * cr,
                        y - 0.344136 * cb - 0.714136 * cr,
                        y + 1.772 * cb,
                    )
                };
                for channel in [r, g, b] {
                    rgb.push((channel * scale).clamp(0.0, 255.0) as u8);
                }
            }
        }
        rgb
    }
}

/// One sample from a plane; above 8 bits per channel samples are stored as u16.
#[inline]
fn sample(ptr: *const u8, stride: isize, x: u32, y: u32, bpc: u32) -> f32 {
    if bpc <= 8 {
        (unsafe { *ptr.offset(y as isize * stride + x as isize) }) as f32
    } else {
        let offset = y as isize * stride + x as isize * 2;
        (unsafe { (ptr.offset(offset) as *const u16).read_unaligned() }) as f32
    }
}

impl ImageEngine for RustEngine {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, EngineError> {
        if is_avif(bytes) {
            return decode_avif(bytes);
        }
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| EngineError::DecodeFailed(e.to_string()))?
            .decode()
            .map_err(|e| EngineError::DecodeFailed(e.to_string()))
    }

    fn resize(
        &self,
        image: DynamicImage,
        size: Size,
        method: ResizeMethod,
    ) -> Result<DynamicImage, EngineError> {
        if (image.width(), image.height()) == (size.width, size.height) {
            return Ok(image);
        }
        Ok(image.resize_exact(size.width, size.height, filter_for(method)))
    }

    fn quantize(
        &self,
        image: DynamicImage,
        options: &QuantOptions,
    ) -> Result<DynamicImage, EngineError> {
        let levels = levels_for(options.num_colors);
        let step = 255.0 / (levels - 1) as f32;
        let max_level = (levels - 1) as f32;

        let mut rgba = image.to_rgba8();
        for (x, y, pixel) in rgba.enumerate_pixels_mut() {
            let bayer = BAYER_4X4[(y % 4) as usize][(x % 4) as usize] as f32;
            let offset = ((bayer + 0.5) / 16.0 - 0.5) * step * options.dither;
            for channel in pixel.0.iter_mut().take(3) {
                let level = ((*channel as f32 + offset) / step)
                    .round()
                    .clamp(0.0, max_level);
                *channel = (level * step).round() as u8;
            }
        }
        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn rotate(&self, image: DynamicImage, quarter_turns: u32) -> Result<DynamicImage, EngineError> {
        Ok(match quarter_turns % 4 {
            1 => image.rotate90(),
            2 => image.rotate180(),
            3 => image.rotate270(),
            _ => image,
        })
    }

    fn encode(
        &self,
        image: &DynamicImage,
        codec: Codec,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, EngineError> {
        match codec {
            Codec::Oxipng => encode_png(image, &codec_options(codec, options)?),
            Codec::MozJpeg => encode_jpeg(image, &codec_options(codec, options)?),
            Codec::WebP => encode_webp(image, &codec_options(codec, options)?),
            Codec::Avif => encode_avif(image, &codec_options(codec, options)?),
            Codec::Jxl => encode_jxl(image, &codec_options(codec, options)?),
            Codec::Wp2 => Err(EngineError::EncodeFailed {
                codec,
                reason: "no encoder available".to_string(),
            }),
        }
    }
}
