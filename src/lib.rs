//! # imgsquash
//!
//! A per-file image transform stage for streaming build pipelines. Files come
//! in as in-memory [`FileObject`]s; each recognized image is decoded once,
//! optionally resized, quantized and rotated, then re-encoded to one or more
//! codecs. Everything else passes through untouched.
//!
//! # Architecture
//!
//! ```text
//! FileObject ─→ registry lookup ─→ decode ─→ resolve options ─→ preprocess ─→ encode × N ─→ FileObject × N
//!                   │ unknown / undecodable                          (resize → quant → rotate)
//!                   └──────────────────────────→ passthrough ─→ FileObject
//! ```
//!
//! Configuration is either static (parsed once, at construction) or a
//! callback evaluated per file against its decoded dimensions. Both accept the
//! same two object shapes:
//!
//! ```text
//! { "webp": {}, "avif": { "quality": 60 } }                       legacy
//! { "encodeOptions": { ... }, "preprocessOptions": { ... } }      explicit
//! ```
//!
//! A stream of files is transformed lazily by [`Squash::stream`]: one bad file
//! produces one `Err` and the stream moves on; only unbuffered contents stop it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`transform`] | The [`Squash`] stage, per-file state machine and [`TransformStream`] |
//! | [`options`] | Configuration shapes, per-codec default merging, per-file resolution |
//! | [`registry`] | Extension → codec table, decode capability, default encode options |
//! | [`imaging`] | Geometry helpers, the [`ImageEngine`](imaging::ImageEngine) trait and the `image`-crate engine |
//! | [`types`] | [`FileObject`] and its contents |
//! | [`naming`] | Extension lookup and replacement for derived file names |
//! | [`error`] | Per-file and stream errors |
//! | [`config`] | `squash.toml` loading, validation and merging for the CLI |
//! | [`output`] | CLI output formatting for progress events |
//!
//! # Pure-Rust Imaging
//!
//! Decoding and encoding go through the `image` crate, with `rav1d` for AVIF
//! input and `zune-jpegxl` for lossless JPEG XL output, so the library and
//! binary need no system libraries. `wp2` has no pure Rust encoder: it is
//! recognized in configuration and fails per file with an encode error.

pub mod config;
pub mod error;
pub mod imaging;
pub mod naming;
pub mod options;
pub mod output;
pub mod registry;
pub mod transform;
pub mod types;

pub use error::{FileError, ProcessError};
pub use options::{ConfigInput, FileMeta};
pub use registry::{Codec, FormatRegistry};
pub use transform::{EncodeArg, Squash, StageEvent, TransformStream};
pub use types::{Contents, FileObject};

#[cfg(test)]
pub(crate) mod test_helpers;
