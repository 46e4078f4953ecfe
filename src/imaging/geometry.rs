//! Pure calculation functions for resize geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! They are also what callback configurations reach through
//! [`FileMeta::contain`](crate::options::FileMeta::contain) and
//! [`FileMeta::cover`](crate::options::FileMeta::cover).

use super::params::FitMethod;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("image has a zero dimension ({width}x{height})")]
    EmptySource { width: u32, height: u32 },
    #[error("target size must be non-zero")]
    ZeroTarget,
    #[error("resize needs a width or a height")]
    NoTarget,
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn checked(self) -> Result<Self, GeometryError> {
        if self.width == 0 || self.height == 0 {
            return Err(GeometryError::EmptySource {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

/// `value * num / den`, rounded, never below one pixel.
fn scale(value: u32, num: u32, den: u32) -> u32 {
    ((value as f64 * num as f64 / den as f64).round() as u32).max(1)
}

/// Fit inside a `max × max` box, scaling down only.
///
/// # Examples
/// ```
/// # use imgsquash::imaging::{Size, contain};
/// // 400x200 into a 200 box → 200x100
/// assert_eq!(contain(Size::new(400, 200), 200).unwrap(), Size::new(200, 100));
///
/// // Already fits: unchanged
/// assert_eq!(contain(Size::new(80, 80), 200).unwrap(), Size::new(80, 80));
/// ```
pub fn contain(source: Size, max: u32) -> Result<Size, GeometryError> {
    let Size { width, height } = source.checked()?;
    if max == 0 {
        return Err(GeometryError::ZeroTarget);
    }
    if width <= max && height <= max {
        return Ok(source);
    }

    if width >= height {
        // Landscape or square: width is the longer edge
        Ok(Size::new(max, scale(height, max, width)))
    } else {
        Ok(Size::new(scale(width, max, height), max))
    }
}

/// Scale so the shorter side equals `min` exactly, up or down.
///
/// The longer side overshoots; cropping it back is left to the caller.
///
/// # Examples
/// ```
/// # use imgsquash::imaging::{Size, cover};
/// // 400x200 covering 100 → 200x100
/// assert_eq!(cover(Size::new(400, 200), 100).unwrap(), Size::new(200, 100));
///
/// // Scales up too
/// assert_eq!(cover(Size::new(80, 80), 200).unwrap(), Size::new(200, 200));
/// ```
pub fn cover(source: Size, min: u32) -> Result<Size, GeometryError> {
    let Size { width, height } = source.checked()?;
    if min == 0 {
        return Err(GeometryError::ZeroTarget);
    }

    if width <= height {
        // Portrait or square: width is the short edge
        Ok(Size::new(min, scale(height, min, width)))
    } else {
        Ok(Size::new(scale(width, min, height), min))
    }
}

/// Output dimensions of a resize operation.
///
/// - Only `width` or only `height`: the other follows the aspect ratio.
/// - Both with [`FitMethod::Stretch`]: exactly that size.
/// - Both with [`FitMethod::Contain`]: the largest aspect-preserving size
///   that fits the `width × height` box (may scale up).
pub fn resize_dimensions(
    source: Size,
    width: Option<u32>,
    height: Option<u32>,
    fit: FitMethod,
) -> Result<Size, GeometryError> {
    let src = source.checked()?;
    if width == Some(0) || height == Some(0) {
        return Err(GeometryError::ZeroTarget);
    }

    match (width, height) {
        (Some(w), Some(h)) => match fit {
            FitMethod::Stretch => Ok(Size::new(w, h)),
            FitMethod::Contain => {
                // Compare w/src.w against h/src.h without dividing
                let by_width = w as u64 * src.height as u64 <= h as u64 * src.width as u64;
                if by_width {
                    Ok(Size::new(w, scale(src.height, w, src.width)))
                } else {
                    Ok(Size::new(scale(src.width, h, src.height), h))
                }
            }
        },
        (Some(w), None) => Ok(Size::new(w, scale(src.height, w, src.width))),
        (None, Some(h)) => Ok(Size::new(scale(src.width, h, src.height), h)),
        (None, None) => Err(GeometryError::NoTarget),
    }
}
