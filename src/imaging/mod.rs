//! Image processing, pure Rust on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with format sniffing |
//! | **Resize** | `resize_exact` (Triangle, CatmullRom, Lanczos3) |
//! | **Quant** | per-channel posterize + ordered dither |
//! | **Rotate** | `rotate90` / `rotate180` / `rotate270` |
//! | **Encode** | PNG, JPEG, lossless WebP, AVIF (rav1e) |
//!
//! The module is split into:
//! - **Geometry**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Engine**: [`ImageEngine`] trait + [`RustEngine`]
//! - **Operations**: High-level functions combining geometry + engine

pub mod engine;
pub mod geometry;
pub mod operations;
pub mod params;
pub mod rust_engine;

pub use engine::{EngineError, ImageEngine};
pub use geometry::{GeometryError, Size, contain, cover};
pub use operations::{EncodedOutput, Processed, process, process_decoded};
pub use params::{FitMethod, QuantOptions, ResizeMethod, ResizeOptions, RotateOptions};
pub use rust_engine::RustEngine;
