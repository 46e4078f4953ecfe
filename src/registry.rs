//! Format registry: which extensions the stage recognizes and how they
//! re-encode by default.
//!
//! The registry is an immutable value built once ([`FormatRegistry::standard`])
//! and passed by reference into the resolver. [`FormatRegistry::global`] hands
//! out a shared instance for callers that don't need a custom table.
//!
//! | Extension | Codec | Decodable |
//! |---|---|---|
//! | `png` | oxipng | yes |
//! | `jpg`, `jpeg` | mozjpeg | yes |
//! | `webp` | webp | yes |
//! | `avif` | avif | yes |
//! | `jxl` | jxl | no |
//! | `wp2` | wp2 | no |
//!
//! Extensions that are missing, or present but not decodable, are passed
//! through unchanged: the stage cannot read their dimensions.

use crate::options::EncodeTargets;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Opaque, codec-specific option bag. Validated only by the engine.
pub type EncodeOptions = Map<String, Value>;

/// An output codec, named the way configurations name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Codec {
    MozJpeg,
    WebP,
    Avif,
    Jxl,
    Wp2,
    Oxipng,
}

impl Codec {
    pub const ALL: [Codec; 6] = [
        Codec::MozJpeg,
        Codec::WebP,
        Codec::Avif,
        Codec::Jxl,
        Codec::Wp2,
        Codec::Oxipng,
    ];

    /// Configuration key for this codec.
    pub fn name(self) -> &'static str {
        match self {
            Codec::MozJpeg => "mozjpeg",
            Codec::WebP => "webp",
            Codec::Avif => "avif",
            Codec::Jxl => "jxl",
            Codec::Wp2 => "wp2",
            Codec::Oxipng => "oxipng",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Extension given to files this codec produces.
    pub fn extension(self) -> &'static str {
        match self {
            Codec::MozJpeg => "jpg",
            Codec::WebP => "webp",
            Codec::Avif => "avif",
            Codec::Jxl => "jxl",
            Codec::Wp2 => "wp2",
            Codec::Oxipng => "png",
        }
    }

    /// Options applied underneath whatever the caller supplies.
    pub fn default_options(self) -> EncodeOptions {
        let value = match self {
            Codec::MozJpeg => json!({ "quality": 75 }),
            Codec::WebP => json!({ "lossless": true }),
            Codec::Avif => json!({ "quality": 80, "speed": 6 }),
            Codec::Jxl => json!({ "quality": 75 }),
            Codec::Wp2 => json!({ "quality": 75 }),
            Codec::Oxipng => json!({ "level": 2 }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatEntry {
    /// Lowercase, without the dot.
    pub extension: &'static str,
    /// Codec used to re-encode this format by default.
    pub codec: Codec,
    /// Whether the engine can decode this format.
    pub decodable: bool,
}

impl FormatEntry {
    /// Same-format target with the codec's default options.
    pub fn default_encode(&self) -> EncodeTargets {
        let mut targets = EncodeTargets::new();
        targets.insert(self.codec, self.codec.default_options());
        targets
    }
}

const STANDARD_ENTRIES: &[FormatEntry] = &[
    FormatEntry {
        extension: "png",
        codec: Codec::Oxipng,
        decodable: true,
    },
    FormatEntry {
        extension: "jpg",
        codec: Codec::MozJpeg,
        decodable: true,
    },
    FormatEntry {
        extension: "jpeg",
        codec: Codec::MozJpeg,
        decodable: true,
    },
    FormatEntry {
        extension: "webp",
        codec: Codec::WebP,
        decodable: true,
    },
    FormatEntry {
        extension: "avif",
        codec: Codec::Avif,
        decodable: true,
    },
    FormatEntry {
        extension: "jxl",
        codec: Codec::Jxl,
        decodable: false,
    },
    FormatEntry {
        extension: "wp2",
        codec: Codec::Wp2,
        decodable: false,
    },
];

static GLOBAL: LazyLock<FormatRegistry> = LazyLock::new(FormatRegistry::standard);

/// Extension → capability table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRegistry {
    entries: Vec<FormatEntry>,
}

impl FormatRegistry {
    /// Registry with caller-chosen entries.
    pub fn new(entries: Vec<FormatEntry>) -> Self {
        Self { entries }
    }

    /// The standard table (see the [module docs](self)).
    pub fn standard() -> Self {
        Self::new(STANDARD_ENTRIES.to_vec())
    }

    /// Process-wide shared standard registry.
    pub fn global() -> &'static FormatRegistry {
        &GLOBAL
    }

    /// Find an extension. Case-insensitive; a leading dot is ignored.
    pub fn lookup(&self, extension: &str) -> Option<&FormatEntry> {
        let ext = extension.trim_start_matches('.');
        self.entries
            .iter()
            .find(|e| e.extension.eq_ignore_ascii_case(ext))
    }

    /// Lookup that only succeeds for formats the engine can decode.
    pub fn processable(&self, extension: &str) -> Option<&FormatEntry> {
        self.lookup(extension).filter(|e| e.decodable)
    }

    /// Default encode targets for an extension.
    pub fn default_encode(&self, extension: &str) -> Option<EncodeTargets> {
        self.lookup(extension).map(FormatEntry::default_encode)
    }

    /// The defaults table keyed by dotted extension (`.png`, `.jpg`, ...).
    ///
    /// Useful for building an explicit per-extension dispatch in a callback
    /// configuration that still falls back to the stock behavior.
    pub fn default_encode_options(&self) -> BTreeMap<String, EncodeTargets> {
        self.entries
            .iter()
            .map(|e| (format!(".{}", e.extension), e.default_encode()))
            .collect()
    }

    pub fn entries(&self) -> &[FormatEntry] {
        &self.entries
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
