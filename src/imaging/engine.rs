//! Image engine trait and shared types.
//!
//! The [`ImageEngine`] trait is the boundary to the pixel work: decode,
//! the three preprocess operations, and encode. Everything above it (option
//! resolution, geometry, fan-out) is engine-agnostic.
//!
//! The production implementation is
//! [`RustEngine`](super::rust_engine::RustEngine), pure Rust and built on
//! the `image` crate. Tests use the recording `MockEngine` in this module.

use super::geometry::Size;
use super::params::{QuantOptions, ResizeMethod};
use crate::registry::{Codec, EncodeOptions};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    #[error("{operation} failed: {reason}")]
    PreprocessFailed {
        operation: &'static str,
        reason: String,
    },
    #[error("{codec} encode failed: {reason}")]
    EncodeFailed { codec: Codec, reason: String },
}

/// Trait for image engines.
///
/// Implementations hold no per-file state; every call is independent.
pub trait ImageEngine: Sync {
    /// Decode raw file bytes.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, EngineError>;

    /// Resample to exactly `size`.
    fn resize(
        &self,
        image: DynamicImage,
        size: Size,
        method: ResizeMethod,
    ) -> Result<DynamicImage, EngineError>;

    /// Reduce the palette.
    fn quantize(
        &self,
        image: DynamicImage,
        options: &QuantOptions,
    ) -> Result<DynamicImage, EngineError>;

    /// Rotate clockwise by `quarter_turns` × 90°.
    fn rotate(&self, image: DynamicImage, quarter_turns: u32) -> Result<DynamicImage, EngineError>;

    /// Encode to one codec.
    fn encode(
        &self,
        image: &DynamicImage,
        codec: Codec,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, EngineError>;
}
