//! Option resolution: from whatever the caller configured to one concrete
//! [`ResolvedConfig`] per file.
//!
//! ## Accepted shapes
//!
//! A configuration object comes in one of two shapes, detected by
//! [`Options::parse`] and recorded as [`OptionsShape`]:
//!
//! ```text
//! Legacy    { "webp": {}, "avif": { "quality": 60 } }
//! Explicit  { "encodeOptions": { "webp": {} }, "preprocessOptions": { "rotate": {...} } }
//! ```
//!
//! The presence of `encodeOptions` or `preprocessOptions` makes an object
//! Explicit. Codec keys sitting next to them are ignored: explicit keys win.
//! Any other key is an error.
//!
//! ## Resolution
//!
//! [`resolve`] runs once per file:
//!
//! 1. Unknown or undecodable extension → [`Resolved::Passthrough`].
//! 2. A [`ConfigInput::Dynamic`] callback is invoked with the file's
//!    [`FileMeta`]; static options are used as parsed.
//! 3. An empty encode set becomes the registry's same-format default.
//! 4. Each target's options are layered over the codec defaults.

use crate::error::FileError;
use crate::imaging::geometry::{self, GeometryError, Size};
use crate::imaging::params::{QuantOptions, ResizeOptions, RotateOptions};
use crate::registry::{Codec, EncodeOptions, FormatEntry, FormatRegistry};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

/// Key holding encode targets in the explicit shape.
pub const ENCODE_KEY: &str = "encodeOptions";
/// Key holding preprocess operations in the explicit shape.
pub const PREPROCESS_KEY: &str = "preprocessOptions";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionsError {
    #[error("configuration must be an object, found {0}")]
    NotAnObject(&'static str),
    #[error(
        "unknown configuration key `{0}`, expected codec names or `encodeOptions`/`preprocessOptions`"
    )]
    UnknownKey(String),
    #[error("unknown codec `{0}`")]
    UnknownCodec(String),
    #[error("options for `{codec}` must be an object, found {found}")]
    InvalidCodecOptions { codec: Codec, found: &'static str },
    #[error("unknown preprocess operation `{0}`")]
    UnknownOperation(String),
    #[error("invalid `{operation}` options: {reason}")]
    InvalidOperation {
        operation: &'static str,
        reason: String,
    },
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Recursively layer `overlay` on top of `base`.
///
/// Objects merge key by key; any other overlay value replaces the base value.
pub fn merge_json(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => merge_json(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

// =============================================================================
// Encode targets
// =============================================================================

/// Requested output codecs, in declaration order, each with its option bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeTargets {
    targets: Vec<(Codec, EncodeOptions)>,
}

impl EncodeTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target, replacing the options of an existing one in place.
    pub fn insert(&mut self, codec: Codec, options: EncodeOptions) {
        match self.targets.iter_mut().find(|(c, _)| *c == codec) {
            Some(slot) => slot.1 = options,
            None => self.targets.push((codec, options)),
        }
    }

    pub fn get(&self, codec: Codec) -> Option<&EncodeOptions> {
        self.targets
            .iter()
            .find(|(c, _)| *c == codec)
            .map(|(_, o)| o)
    }

    pub fn codecs(&self) -> impl Iterator<Item = Codec> + '_ {
        self.targets.iter().map(|(c, _)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Codec, &EncodeOptions)> + '_ {
        self.targets.iter().map(|(c, o)| (*c, o))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Parse a `{ codec: options }` object.
    pub fn parse(value: &Value) -> Result<Self, OptionsError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Self::parse_map(map),
            other => Err(OptionsError::NotAnObject(kind(other))),
        }
    }

    fn parse_map(map: &Map<String, Value>) -> Result<Self, OptionsError> {
        let mut targets = Self::new();
        for (key, options) in map {
            let codec =
                Codec::from_name(key).ok_or_else(|| OptionsError::UnknownCodec(key.clone()))?;
            let options = match options {
                Value::Null => Map::new(),
                Value::Object(o) => o.clone(),
                other => {
                    return Err(OptionsError::InvalidCodecOptions {
                        codec,
                        found: kind(other),
                    });
                }
            };
            targets.insert(codec, options);
        }
        Ok(targets)
    }

    /// Layer every target's options over its codec defaults.
    pub fn with_codec_defaults(&self) -> Self {
        let targets = self
            .targets
            .iter()
            .map(|(codec, options)| {
                let merged = merge_json(
                    Value::Object(codec.default_options()),
                    Value::Object(options.clone()),
                );
                let options = match merged {
                    Value::Object(map) => map,
                    _ => options.clone(),
                };
                (*codec, options)
            })
            .collect();
        Self { targets }
    }
}

impl Serialize for EncodeTargets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.targets.len()))?;
        for (codec, options) in &self.targets {
            map.serialize_entry(codec.name(), options)?;
        }
        map.end()
    }
}

// =============================================================================
// Preprocess operations
// =============================================================================

/// Preprocess operations. Application order is fixed: resize, quant, rotate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PreprocessSpec {
    pub resize: Option<ResizeOptions>,
    pub quant: Option<QuantOptions>,
    pub rotate: Option<RotateOptions>,
}

fn parse_operation<T: serde::de::DeserializeOwned>(
    operation: &'static str,
    value: &Value,
) -> Result<T, OptionsError> {
    serde_json::from_value(value.clone()).map_err(|e| OptionsError::InvalidOperation {
        operation,
        reason: e.to_string(),
    })
}

impl PreprocessSpec {
    pub fn parse(value: &Value) -> Result<Self, OptionsError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => return Err(OptionsError::NotAnObject(kind(other))),
        };

        let mut spec = Self::default();
        for (name, options) in map {
            match name.as_str() {
                "resize" => {
                    let resize: ResizeOptions = parse_operation("resize", options)?;
                    resize
                        .validate()
                        .map_err(|reason| OptionsError::InvalidOperation {
                            operation: "resize",
                            reason,
                        })?;
                    spec.resize = Some(resize);
                }
                "quant" => {
                    let quant: QuantOptions = parse_operation("quant", options)?;
                    quant
                        .validate()
                        .map_err(|reason| OptionsError::InvalidOperation {
                            operation: "quant",
                            reason,
                        })?;
                    spec.quant = Some(quant);
                }
                "rotate" => spec.rotate = Some(parse_operation("rotate", options)?),
                other => return Err(OptionsError::UnknownOperation(other.to_string())),
            }
        }
        Ok(spec)
    }

    /// Enabled resize, if any.
    pub fn active_resize(&self) -> Option<&ResizeOptions> {
        self.resize.as_ref().filter(|r| r.enabled)
    }

    pub fn active_quant(&self) -> Option<&QuantOptions> {
        self.quant.as_ref().filter(|q| q.enabled)
    }

    pub fn active_rotate(&self) -> Option<&RotateOptions> {
        self.rotate.as_ref().filter(|r| r.enabled)
    }

    /// True when every operation is absent or disabled.
    pub fn is_noop(&self) -> bool {
        self.active_resize().is_none()
            && self.active_quant().is_none()
            && self.active_rotate().is_none()
    }
}

// =============================================================================
// Parsed configuration objects
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionsShape {
    /// Top-level keys are codec names.
    #[default]
    Legacy,
    /// `encodeOptions` / `preprocessOptions` keys.
    Explicit,
}

/// One configuration object after shape detection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    pub shape: OptionsShape,
    pub encode: EncodeTargets,
    /// `None` when the object said nothing about preprocessing.
    pub preprocess: Option<PreprocessSpec>,
}

impl Options {
    pub fn parse(value: &Value) -> Result<Self, OptionsError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => return Err(OptionsError::NotAnObject(kind(other))),
        };

        let explicit = map.contains_key(ENCODE_KEY) || map.contains_key(PREPROCESS_KEY);
        for key in map.keys() {
            let known = key == ENCODE_KEY || key == PREPROCESS_KEY || Codec::from_name(key).is_some();
            if !known {
                return Err(OptionsError::UnknownKey(key.clone()));
            }
        }

        if !explicit {
            return Ok(Self {
                shape: OptionsShape::Legacy,
                encode: EncodeTargets::parse_map(map)?,
                preprocess: None,
            });
        }

        let encode = match map.get(ENCODE_KEY) {
            Some(value) => EncodeTargets::parse(value)?,
            None => EncodeTargets::new(),
        };
        let preprocess = match map.get(PREPROCESS_KEY) {
            Some(Value::Null) | None => None,
            Some(value) => Some(PreprocessSpec::parse(value)?),
        };
        Ok(Self {
            shape: OptionsShape::Explicit,
            encode,
            preprocess,
        })
    }

    /// Options built from separate encode and preprocess values.
    pub fn from_parts(encode: &Value, preprocess: &Value) -> Result<Self, OptionsError> {
        Ok(Self {
            shape: OptionsShape::Legacy,
            encode: EncodeTargets::parse(encode)?,
            preprocess: Some(PreprocessSpec::parse(preprocess)?),
        })
    }
}

// =============================================================================
// Caller input
// =============================================================================

/// What a callback configuration learns about the file it is configuring.
#[derive(Debug, Clone, Copy)]
pub struct FileMeta<'a> {
    pub path: &'a Path,
    pub width: u32,
    pub height: u32,
}

impl FileMeta<'_> {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Fit inside a `max × max` box without upscaling.
    pub fn contain(&self, max: u32) -> Result<Size, GeometryError> {
        geometry::contain(self.size(), max)
    }

    /// Shorter side scaled to exactly `min`.
    pub fn cover(&self, min: u32) -> Result<Size, GeometryError> {
        geometry::cover(self.size(), min)
    }
}

/// Per-file configuration function.
pub type Callback = Box<dyn Fn(&FileMeta<'_>) -> Result<Value, FileError> + Send + Sync>;

/// Configuration supplied once for the lifetime of a stage.
pub enum ConfigInput {
    /// Parsed and validated up front.
    Static(Options),
    /// Evaluated for every file. `preprocess` fills in when the callback's
    /// result does not mention preprocessing.
    Dynamic {
        callback: Callback,
        preprocess: Option<PreprocessSpec>,
    },
}

impl Default for ConfigInput {
    fn default() -> Self {
        ConfigInput::Static(Options::default())
    }
}

impl std::fmt::Debug for ConfigInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigInput::Static(options) => f.debug_tuple("Static").field(options).finish(),
            ConfigInput::Dynamic { preprocess, .. } => f
                .debug_struct("Dynamic")
                .field("preprocess", preprocess)
                .finish_non_exhaustive(),
        }
    }
}

/// Concrete configuration for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub encode: EncodeTargets,
    pub preprocess: PreprocessSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Leave the file exactly as it is.
    Passthrough,
    Process(ResolvedConfig),
}

/// Produce the configuration for one file.
///
/// Unknown and undecodable extensions resolve to [`Resolved::Passthrough`]
/// without consulting the configuration.
pub fn resolve(
    extension: &str,
    meta: &FileMeta<'_>,
    input: &ConfigInput,
    registry: &FormatRegistry,
) -> Result<Resolved, FileError> {
    match registry.processable(extension) {
        Some(entry) => Ok(Resolved::Process(resolve_entry(entry, meta, input)?)),
        None => Ok(Resolved::Passthrough),
    }
}

/// Configuration for a file whose registry entry is already known.
pub fn resolve_entry(
    entry: &FormatEntry,
    meta: &FileMeta<'_>,
    input: &ConfigInput,
) -> Result<ResolvedConfig, FileError> {
    let (encode, preprocess) = match input {
        ConfigInput::Static(options) => (options.encode.clone(), options.preprocess),
        ConfigInput::Dynamic {
            callback,
            preprocess,
        } => {
            let value = callback(meta)?;
            let options = Options::parse(&value)?;
            (options.encode, options.preprocess.or(*preprocess))
        }
    };

    let encode = if encode.is_empty() {
        entry.default_encode()
    } else {
        encode.with_codec_defaults()
    };

    Ok(ResolvedConfig {
        encode,
        preprocess: preprocess.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(path: &Path) -> FileMeta<'_> {
        FileMeta {
            path,
            width: 80,
            height: 80,
        }
    }

    fn resolve_static(ext: &str, value: Value) -> Resolved {
        let input = ConfigInput::Static(Options::parse(&value).unwrap());
        let path = Path::new("test1.png");
        resolve(ext, &meta(path), &input, FormatRegistry::global()).unwrap()
    }

    fn codecs(resolved: &Resolved) -> Vec<Codec> {
        match resolved {
            Resolved::Process(config) => config.encode.codecs().collect(),
            Resolved::Passthrough => panic!("expected a processed config"),
        }
    }

    // =========================================================================
    // Shape detection
    // =========================================================================

    #[test]
    fn legacy_shape_keeps_declaration_order() {
        let options = Options::parse(&json!({ "oxipng": {}, "webp": {}, "avif": {} })).unwrap();
        assert_eq!(options.shape, OptionsShape::Legacy);
        assert_eq!(
            options.encode.codecs().collect::<Vec<_>>(),
            vec![Codec::Oxipng, Codec::WebP, Codec::Avif]
        );
        assert!(options.preprocess.is_none());
    }

    #[test]
    fn explicit_shape_parses_both_parts() {
        let options = Options::parse(&json!({
            "encodeOptions": { "avif": {}, "webp": {} },
            "preprocessOptions": { "rotate": { "enabled": true, "numRotations": 2 } }
        }))
        .unwrap();
        assert_eq!(options.shape, OptionsShape::Explicit);
        assert_eq!(
            options.encode.codecs().collect::<Vec<_>>(),
            vec![Codec::Avif, Codec::WebP]
        );
        let rotate = options.preprocess.unwrap().rotate.unwrap();
        assert_eq!(rotate.quarter_turns(), 2);
    }

    #[test]
    fn explicit_keys_take_precedence_over_legacy_keys() {
        let options = Options::parse(&json!({
            "oxipng": {},
            "encodeOptions": { "webp": {} }
        }))
        .unwrap();
        assert_eq!(options.shape, OptionsShape::Explicit);
        assert_eq!(
            options.encode.codecs().collect::<Vec<_>>(),
            vec![Codec::WebP]
        );
    }

    #[test]
    fn preprocess_only_explicit_has_empty_encode() {
        let options = Options::parse(&json!({
            "preprocessOptions": { "resize": { "enabled": true, "width": 40 } }
        }))
        .unwrap();
        assert!(options.encode.is_empty());
        assert_eq!(options.preprocess.unwrap().resize.unwrap().width, Some(40));
    }

    #[test]
    fn null_is_the_empty_legacy_object() {
        assert_eq!(Options::parse(&Value::Null).unwrap(), Options::default());
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        assert_eq!(
            Options::parse(&json!({ "gif": {} })),
            Err(OptionsError::UnknownKey("gif".into()))
        );
        assert_eq!(
            Options::parse(&json!({ "encodeOptions": {}, "extra": 1 })),
            Err(OptionsError::UnknownKey("extra".into()))
        );
    }

    #[test]
    fn non_object_is_rejected() {
        assert_eq!(
            Options::parse(&json!([1, 2])),
            Err(OptionsError::NotAnObject("an array"))
        );
    }

    #[test]
    fn unknown_codec_inside_encode_options() {
        assert_eq!(
            Options::parse(&json!({ "encodeOptions": { "bmp": {} } })),
            Err(OptionsError::UnknownCodec("bmp".into()))
        );
    }

    #[test]
    fn codec_options_must_be_objects() {
        assert_eq!(
            Options::parse(&json!({ "webp": 3 })),
            Err(OptionsError::InvalidCodecOptions {
                codec: Codec::WebP,
                found: "a number"
            })
        );
    }

    #[test]
    fn unknown_preprocess_operation() {
        assert_eq!(
            PreprocessSpec::parse(&json!({ "blur": {} })),
            Err(OptionsError::UnknownOperation("blur".into()))
        );
    }

    #[test]
    fn invalid_operation_parameters() {
        let err = PreprocessSpec::parse(&json!({ "quant": { "enabled": true, "numColors": 999 } }))
            .unwrap_err();
        assert!(matches!(
            err,
            OptionsError::InvalidOperation {
                operation: "quant",
                ..
            }
        ));
    }

    #[test]
    fn disabled_operations_are_noops() {
        let spec = PreprocessSpec::parse(&json!({
            "resize": { "enabled": false, "width": 10 },
            "rotate": { "numRotations": 1 }
        }))
        .unwrap();
        assert!(spec.is_noop());
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    #[test]
    fn empty_config_reencodes_same_format() {
        let resolved = resolve_static("png", json!({}));
        assert_eq!(codecs(&resolved), vec![Codec::Oxipng]);
        let resolved = resolve_static("jpeg", Value::Null);
        assert_eq!(codecs(&resolved), vec![Codec::MozJpeg]);
    }

    #[test]
    fn unknown_extension_passes_through_for_any_shape() {
        for value in [
            json!({}),
            json!({ "avif": {}, "webp": {} }),
            json!({ "encodeOptions": { "webp": {} } }),
        ] {
            assert_eq!(resolve_static("gif", value), Resolved::Passthrough);
        }
    }

    #[test]
    fn undecodable_extension_passes_through() {
        assert_eq!(resolve_static("avif", json!({})), Resolved::Passthrough);
    }

    #[test]
    fn caller_options_layer_over_codec_defaults() {
        let resolved = resolve_static("png", json!({ "avif": { "quality": 40 } }));
        let Resolved::Process(config) = resolved else {
            panic!("expected processing");
        };
        let avif = config.encode.get(Codec::Avif).unwrap();
        assert_eq!(avif.get("quality"), Some(&json!(40)));
        assert_eq!(avif.get("speed"), Some(&json!(6)));
    }

    #[test]
    fn merge_json_deep_nested() {
        let merged = merge_json(
            json!({ "a": { "b": 1, "c": 2 }, "d": 3 }),
            json!({ "a": { "c": 20 }, "e": 5 }),
        );
        assert_eq!(merged, json!({ "a": { "b": 1, "c": 20 }, "d": 3, "e": 5 }));
    }

    #[test]
    fn callback_sees_dimensions_and_path() {
        let input = ConfigInput::Dynamic {
            callback: Box::new(|meta| {
                assert_eq!(meta.path, Path::new("img/test1.png"));
                let half = meta.width / 2;
                Ok(json!({
                    "preprocessOptions": {
                        "resize": { "enabled": true, "width": half, "height": meta.height / 2 }
                    }
                }))
            }),
            preprocess: None,
        };
        let path = Path::new("img/test1.png");
        let Resolved::Process(config) =
            resolve("png", &meta(path), &input, FormatRegistry::global()).unwrap()
        else {
            panic!("expected processing");
        };
        let resize = config.preprocess.resize.unwrap();
        assert_eq!((resize.width, resize.height), (Some(40), Some(40)));
        assert_eq!(config.encode.codecs().collect::<Vec<_>>(), vec![Codec::Oxipng]);
    }

    #[test]
    fn callback_can_use_geometry_helpers() {
        let input = ConfigInput::Dynamic {
            callback: Box::new(|meta| {
                let size = meta.cover(200)?;
                Ok(json!({ "preprocessOptions": { "resize": {
                    "enabled": true, "width": size.width, "height": size.height
                } } }))
            }),
            preprocess: None,
        };
        let path = Path::new("a.png");
        let Resolved::Process(config) =
            resolve("png", &meta(path), &input, FormatRegistry::global()).unwrap()
        else {
            panic!("expected processing");
        };
        assert_eq!(config.preprocess.resize.unwrap().width, Some(200));
    }

    #[test]
    fn callback_geometry_error_is_a_file_error() {
        let input = ConfigInput::Dynamic {
            callback: Box::new(|meta| {
                meta.contain(0)?;
                Ok(json!({}))
            }),
            preprocess: None,
        };
        let path = Path::new("a.png");
        let err = resolve("png", &meta(path), &input, FormatRegistry::global()).unwrap_err();
        assert!(matches!(err, FileError::InvalidGeometry(GeometryError::ZeroTarget)));
    }

    #[test]
    fn malformed_callback_result_is_invalid_configuration() {
        let input = ConfigInput::Dynamic {
            callback: Box::new(|_| Ok(json!("webp"))),
            preprocess: None,
        };
        let path = Path::new("a.png");
        let err = resolve("png", &meta(path), &input, FormatRegistry::global()).unwrap_err();
        assert!(matches!(
            err,
            FileError::InvalidConfiguration(OptionsError::NotAnObject("a string"))
        ));
    }

    #[test]
    fn callback_is_not_invoked_for_passthrough() {
        let input = ConfigInput::Dynamic {
            callback: Box::new(|_| panic!("callback must not run for unknown formats")),
            preprocess: None,
        };
        let path = Path::new("1x1.gif");
        assert_eq!(
            resolve("gif", &meta(path), &input, FormatRegistry::global()).unwrap(),
            Resolved::Passthrough
        );
    }

    #[test]
    fn resolve_entry_uses_the_given_entry_defaults() {
        let entry = FormatEntry {
            extension: "img",
            codec: Codec::WebP,
            decodable: true,
        };
        let path = Path::new("scan.img");
        let config = resolve_entry(&entry, &meta(path), &ConfigInput::default()).unwrap();
        assert_eq!(config.encode.codecs().collect::<Vec<_>>(), vec![Codec::WebP]);
        assert!(config.preprocess.is_noop());
    }

    #[test]
    fn fallback_preprocess_fills_legacy_callback_result() {
        let fallback = PreprocessSpec::parse(&json!({ "rotate": { "enabled": true, "numRotations": 1 } }))
            .unwrap();
        let input = ConfigInput::Dynamic {
            callback: Box::new(|_| Ok(json!({ "webp": {} }))),
            preprocess: Some(fallback),
        };
        let path = Path::new("a.png");
        let Resolved::Process(config) =
            resolve("png", &meta(path), &input, FormatRegistry::global()).unwrap()
        else {
            panic!("expected processing");
        };
        assert_eq!(config.preprocess, fallback);
        assert_eq!(config.encode.codecs().collect::<Vec<_>>(), vec![Codec::WebP]);
    }

    #[test]
    fn from_parts_null_encode_uses_defaults() {
        let options =
            Options::from_parts(&Value::Null, &json!({ "resize": { "enabled": true, "width": 200 } }))
                .unwrap();
        assert!(options.encode.is_empty());
        assert_eq!(options.preprocess.unwrap().resize.unwrap().width, Some(200));
    }

    #[test]
    fn encode_targets_serialize_as_object() {
        let mut targets = EncodeTargets::new();
        targets.insert(Codec::WebP, Map::new());
        targets.insert(Codec::Avif, Codec::Avif.default_options());
        assert_eq!(
            serde_json::to_string(&targets).unwrap(),
            r#"{"webp":{},"avif":{"quality":80,"speed":6}}"#
        );
    }
}
