//! The transform stage.
//!
//! [`Squash`] owns a configuration, an engine and a registry reference, and
//! turns one [`FileObject`] into zero or more derivatives. Every file ends in
//! one of three states, reported as [`FileState`]:
//!
//! ```text
//! Null contents, unknown or undecodable extension   → PassedThrough (1 file)
//! decode → resolve → preprocess → encode per target → Emitted (N files)
//! any per-file error                                → Failed
//! ```
//!
//! Streaming contents are the one fatal input: [`ProcessError::UnsupportedInput`].
//!
//! ## Streams
//!
//! [`Squash::stream`] wraps any iterator of files. The next upstream file is
//! pulled only once the output buffer has drained. With
//! [`concurrency`](Squash::concurrency) above one, a window of that many files
//! is pulled and processed on the rayon pool, and results are emitted in input
//! order. Per-file errors are yielded as `Err` and the stream continues; a
//! fatal error is yielded and then the stream ends.
//!
//! ## Progress events
//!
//! When an event sender is attached, each finished file produces a
//! [`StageEvent`]. The CLI formats these with
//! [`format_stage_event`](crate::output::format_stage_event).

use crate::error::{FileError, ProcessError};
use crate::imaging::{ImageEngine, RustEngine, operations};
use crate::naming;
use crate::options::{
    Callback, ConfigInput, FileMeta, Options, OptionsError, PreprocessSpec, resolve_entry,
};
use crate::registry::{FormatEntry, FormatRegistry};
use crate::types::FileObject;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use tracing::{debug, warn};

/// First argument of the two-argument construction.
pub enum EncodeArg {
    /// Same-format re-encode.
    Default,
    /// Legacy-shape `{ codec: options }` object.
    Static(Value),
    /// Evaluated per file.
    Callback(Callback),
}

/// One produced file, as reported on events.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedFile {
    pub path: PathBuf,
    pub size: usize,
}

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileState {
    PassedThrough,
    Emitted(Vec<EmittedFile>),
    Failed(String),
}

/// Progress event sent once per finished file.
#[derive(Debug, Clone, PartialEq)]
pub struct StageEvent {
    pub path: PathBuf,
    /// Input size in bytes; 0 for directory markers and streams.
    pub input_size: usize,
    pub state: FileState,
}

/// The image transform stage.
pub struct Squash<E = RustEngine> {
    input: ConfigInput,
    engine: E,
    registry: &'static FormatRegistry,
    concurrency: usize,
    events: Option<Sender<StageEvent>>,
}

impl Squash {
    /// Same-format minification of every recognized image.
    pub fn new() -> Self {
        Self::from_input(ConfigInput::default())
    }

    /// Static configuration in either shape, validated here.
    pub fn with_options(value: Value) -> Result<Self, OptionsError> {
        let options = Options::parse(&value)?;
        Ok(Self::from_input(ConfigInput::Static(options)))
    }

    /// Per-file configuration computed from the decoded image.
    pub fn with_callback<F>(callback: F) -> Self
    where
        F: Fn(&FileMeta<'_>) -> Result<Value, FileError> + Send + Sync + 'static,
    {
        Self::from_input(ConfigInput::Dynamic {
            callback: Box::new(callback),
            preprocess: None,
        })
    }

    /// Separate encode and preprocess arguments.
    ///
    /// A callback's result that says nothing about preprocessing falls back
    /// to `preprocess`.
    pub fn with_encode_and_preprocess(
        encode: EncodeArg,
        preprocess: &Value,
    ) -> Result<Self, OptionsError> {
        let input = match encode {
            EncodeArg::Default => ConfigInput::Static(Options::from_parts(&Value::Null, preprocess)?),
            EncodeArg::Static(value) => ConfigInput::Static(Options::from_parts(&value, preprocess)?),
            EncodeArg::Callback(callback) => ConfigInput::Dynamic {
                callback,
                preprocess: Some(PreprocessSpec::parse(preprocess)?),
            },
        };
        Ok(Self::from_input(input))
    }

    /// Stage over an already built configuration.
    pub fn from_input(input: ConfigInput) -> Self {
        Self {
            input,
            engine: RustEngine::new(),
            registry: FormatRegistry::global(),
            concurrency: 1,
            events: None,
        }
    }
}

impl Default for Squash {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ImageEngine> Squash<E> {
    /// Swap the engine (tests use a recording mock).
    pub fn engine<F: ImageEngine>(self, engine: F) -> Squash<F> {
        Squash {
            input: self.input,
            engine,
            registry: self.registry,
            concurrency: self.concurrency,
            events: self.events,
        }
    }

    pub fn registry(mut self, registry: &'static FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Files processed in parallel by [`stream`](Self::stream). Minimum 1.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn events(mut self, tx: Sender<StageEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn input(&self) -> &ConfigInput {
        &self.input
    }

    /// Transform one file into its outputs.
    #[tracing::instrument(skip_all, fields(path = %file.path.display()))]
    pub fn transform(&self, file: FileObject) -> Result<Vec<FileObject>, ProcessError> {
        if file.contents.is_stream() {
            warn!("streaming contents rejected");
            self.emit(&file, 0, FileState::Failed("streaming contents".into()));
            return Err(ProcessError::UnsupportedInput { path: file.path });
        }
        let Some(bytes) = file.contents.as_bytes() else {
            debug!("no contents, passing through");
            self.emit(&file, 0, FileState::PassedThrough);
            return Ok(vec![file]);
        };

        let extension = naming::extension_of(&file.path).unwrap_or_default();
        let Some(entry) = self.registry.processable(&extension) else {
            debug!(%extension, "not a processable format, passing through");
            self.emit(&file, bytes.len(), FileState::PassedThrough);
            return Ok(vec![file]);
        };

        match self.process_buffer(&file, bytes, entry) {
            Ok(outputs) => {
                let emitted = outputs
                    .iter()
                    .map(|f| EmittedFile {
                        path: f.path.clone(),
                        size: f.contents.as_bytes().map_or(0, <[u8]>::len),
                    })
                    .collect();
                self.emit(&file, bytes.len(), FileState::Emitted(emitted));
                Ok(outputs)
            }
            Err(source) => {
                warn!(error = %source, "file failed");
                self.emit(&file, bytes.len(), FileState::Failed(source.to_string()));
                Err(ProcessError::File {
                    path: file.path,
                    source,
                })
            }
        }
    }

    /// Lazily transform a sequence of files.
    pub fn stream<I>(&self, source: I) -> TransformStream<'_, I::IntoIter, E>
    where
        I: IntoIterator<Item = FileObject>,
    {
        TransformStream {
            stage: self,
            source: source.into_iter(),
            ready: VecDeque::new(),
            done: false,
        }
    }

    /// Decode once, resolve against the decoded size, then fan out.
    fn process_buffer(
        &self,
        file: &FileObject,
        bytes: &[u8],
        entry: &FormatEntry,
    ) -> Result<Vec<FileObject>, FileError> {
        let image = self.engine.decode(bytes)?;
        let meta = FileMeta {
            path: &file.path,
            width: image.width(),
            height: image.height(),
        };

        let config = resolve_entry(entry, &meta, &self.input)?;
        debug!(
            width = meta.width,
            height = meta.height,
            targets = ?config.encode.codecs().collect::<Vec<_>>(),
            "resolved"
        );

        let processed = operations::process_decoded(&self.engine, image, &config)?;
        Ok(processed
            .outputs
            .into_iter()
            .map(|output| {
                let path = naming::replace_extension(&file.path, &output.extension);
                file.derive(path, output.bytes)
            })
            .collect())
    }

    /// Transform a window of files, in parallel when there is more than one.
    fn transform_window(&self, window: Vec<FileObject>) -> Vec<Result<Vec<FileObject>, ProcessError>> {
        if window.len() == 1 {
            return window.into_iter().map(|f| self.transform(f)).collect();
        }
        window.into_par_iter().map(|f| self.transform(f)).collect()
    }

    fn emit(&self, file: &FileObject, input_size: usize, state: FileState) {
        if let Some(tx) = &self.events {
            tx.send(StageEvent {
                path: file.path.clone(),
                input_size,
                state,
            })
            .ok();
        }
    }
}

/// Iterator adapter returned by [`Squash::stream`].
pub struct TransformStream<'s, I, E> {
    stage: &'s Squash<E>,
    source: I,
    ready: VecDeque<Result<FileObject, ProcessError>>,
    done: bool,
}

impl<I, E> Iterator for TransformStream<'_, I, E>
where
    I: Iterator<Item = FileObject>,
    E: ImageEngine,
{
    type Item = Result<FileObject, ProcessError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                if matches!(&item, Err(e) if e.is_fatal()) {
                    // Results already computed for later files are dropped
                    self.ready.clear();
                    self.done = true;
                }
                return Some(item);
            }
            if self.done {
                return None;
            }

            let window: Vec<FileObject> = self
                .source
                .by_ref()
                .take(self.stage.concurrency)
                .collect();
            if window.is_empty() {
                self.done = true;
                return None;
            }

            for result in self.stage.transform_window(window) {
                match result {
                    Ok(files) => self.ready.extend(files.into_iter().map(Ok)),
                    Err(e) => self.ready.push_back(Err(e)),
                }
            }
        }
    }
}
