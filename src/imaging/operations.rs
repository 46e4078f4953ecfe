//! High-level image operations.
//!
//! These functions combine geometry with engine execution: they take a
//! resolved configuration, plan the preprocess steps, and call the engine
//! once per step and once per encode target.

use super::engine::ImageEngine;
use super::geometry::{GeometryError, Size, resize_dimensions};
use super::params::{QuantOptions, ResizeMethod};
use crate::error::FileError;
use crate::options::{PreprocessSpec, Resolved, ResolvedConfig};
use crate::registry::Codec;
use image::DynamicImage;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, FileError>;

/// One planned preprocess step, in application order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreprocessStep {
    Resize { size: Size, method: ResizeMethod },
    Quantize(QuantOptions),
    Rotate(u32),
}

/// One produced buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedOutput {
    /// Codec that produced the bytes; `None` for untouched originals.
    pub codec: Option<Codec>,
    /// Extension the output file gets, without the dot.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Everything one file turned into.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    /// In encode-target declaration order.
    pub outputs: Vec<EncodedOutput>,
    /// Dimensions after preprocessing; `None` when nothing was decoded.
    pub size: Option<Size>,
}

/// Plan preprocess steps without executing them.
///
/// Order is fixed: resize, quant, rotate. Disabled operations are skipped.
pub fn plan_preprocess(
    source: Size,
    spec: &PreprocessSpec,
) -> std::result::Result<Vec<PreprocessStep>, GeometryError> {
    let mut steps = Vec::new();

    if let Some(resize) = spec.active_resize() {
        let size = resize_dimensions(source, resize.width, resize.height, resize.fit_method)?;
        steps.push(PreprocessStep::Resize {
            size,
            method: resize.method,
        });
    }
    if let Some(quant) = spec.active_quant() {
        steps.push(PreprocessStep::Quantize(*quant));
    }
    if let Some(rotate) = spec.active_rotate() {
        let turns = rotate.quarter_turns();
        if turns != 0 {
            steps.push(PreprocessStep::Rotate(turns));
        }
    }

    Ok(steps)
}

/// Apply the preprocess spec to a decoded image.
pub fn preprocess(
    engine: &impl ImageEngine,
    image: DynamicImage,
    spec: &PreprocessSpec,
) -> Result<DynamicImage> {
    let source = Size::new(image.width(), image.height());
    let mut image = image;
    for step in plan_preprocess(source, spec)? {
        image = match step {
            PreprocessStep::Resize { size, method } => engine.resize(image, size, method)?,
            PreprocessStep::Quantize(options) => engine.quantize(image, &options)?,
            PreprocessStep::Rotate(turns) => engine.rotate(image, turns)?,
        };
    }
    Ok(image)
}

/// Preprocess once, then encode once per target.
///
/// The first failing target aborts the whole file.
pub fn process_decoded(
    engine: &impl ImageEngine,
    image: DynamicImage,
    config: &ResolvedConfig,
) -> Result<Processed> {
    let image = preprocess(engine, image, &config.preprocess)?;

    let outputs = config
        .encode
        .iter()
        .map(|(codec, options)| {
            let bytes = engine.encode(&image, codec, options)?;
            Ok(EncodedOutput {
                codec: Some(codec),
                extension: codec.extension().to_string(),
                bytes,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Processed {
        outputs,
        size: Some(Size::new(image.width(), image.height())),
    })
}

/// Run a resolved configuration against raw file bytes.
///
/// Passthrough hands the original bytes back tagged with `extension` and
/// never touches the engine.
pub fn process(
    engine: &impl ImageEngine,
    bytes: &[u8],
    extension: &str,
    resolved: &Resolved,
) -> Result<Processed> {
    match resolved {
        Resolved::Passthrough => Ok(Processed {
            outputs: vec![EncodedOutput {
                codec: None,
                extension: extension.to_string(),
                bytes: bytes.to_vec(),
            }],
            size: None,
        }),
        Resolved::Process(config) => {
            let image = engine.decode(bytes)?;
            process_decoded(engine, image, config)
        }
    }
}
