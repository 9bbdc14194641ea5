//! The loading lifecycle around an external math engine
//!
//! Engines are expensive to start, so nothing waits for them. The first
//! caller that needs math kicks off a load through an [`EngineLoader`] and
//! carries on with plain text. The load reports back through a oneshot
//! channel; the [`Typesetter`] notices the result the next time anyone asks
//! and, on success, fires its ready callback exactly once.
//!
//! A failed load is final. Math keeps rendering as its source text for the
//! rest of the session.

use std::sync::Arc;

use futures::channel::oneshot;
use parking_lot::Mutex;

use mathlabel_core::{
    cache::{CacheMetrics, ContentCache},
    element::is_math_element,
    error::TypesetError,
    types::Notation,
    MathEngine, Result, TextElement,
};

/// Called once when the engine becomes ready, with the math classifier
pub type ReadyCallback = Box<dyn FnOnce(fn(&TextElement) -> bool) + Send>;

/// Markup shown in place of math the engine rejected, when even the
/// engine's own rendering of the marker fails
pub const FALLBACK_ERROR_MARKUP: &str = concat!(
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="3.8ex" height="2.262ex" "#,
    r#"style="vertical-align: -0.566ex;" viewBox="0 -750 1680 1000">"#,
    r#"<text x="0" y="0" font-size="750" font-family="serif" fill="red">ERR</text></svg>"#,
);

/// Source text the engine is asked to render as the error marker
const ERROR_SOURCE: &str = "ERR";

/// The receiving half of a load, handed to an [`EngineLoader`]
pub struct LoadCompletion {
    sender: oneshot::Sender<Result<Arc<dyn MathEngine>>>,
}

impl LoadCompletion {
    /// Report the outcome; a dropped completion counts as a failed load
    pub fn complete(self, result: Result<Arc<dyn MathEngine>>) {
        if self.sender.send(result).is_err() {
            log::debug!("typesetter dropped before engine load finished");
        }
    }
}

/// Starts an engine load without blocking
pub trait EngineLoader: Send + Sync {
    fn name(&self) -> &'static str;

    /// Begin loading and call `completion` when done, from any thread
    fn load(&self, completion: LoadCompletion);
}

/// Loader for an engine that is already in memory
pub struct ReadyLoader(pub Arc<dyn MathEngine>);

impl EngineLoader for ReadyLoader {
    fn name(&self) -> &'static str {
        "ready"
    }

    fn load(&self, completion: LoadCompletion) {
        completion.complete(Ok(self.0.clone()));
    }
}

/// Loader that never produces an engine; math stays plain text
pub struct NoEngine;

impl EngineLoader for NoEngine {
    fn name(&self) -> &'static str {
        "none"
    }

    fn load(&self, completion: LoadCompletion) {
        completion.complete(Err(TypesetError::LoadFailed("no engine configured".into()).into()));
    }
}

enum LoadState {
    Idle,
    Loading(oneshot::Receiver<Result<Arc<dyn MathEngine>>>),
    /// A caller is blocked on the receiver in [`Typesetter::wait_until_settled`]
    Waiting,
    Ready(ReadyEngine),
    Failed,
}

#[derive(Clone)]
struct ReadyEngine {
    engine: Arc<dyn MathEngine>,
    error_markup: Arc<str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MarkupKey {
    content: String,
    notation: Notation,
    display: bool,
}

/// Owns one engine's lifecycle and its conversion cache
pub struct Typesetter {
    loader: Arc<dyn EngineLoader>,
    state: Mutex<LoadState>,
    on_ready: Mutex<Option<ReadyCallback>>,
    markup: ContentCache<MarkupKey, Arc<str>>,
}

impl Typesetter {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            state: Mutex::new(LoadState::Idle),
            on_ready: Mutex::new(None),
            markup: ContentCache::new(),
        }
    }

    /// Register the one-shot ready callback, replacing any earlier one
    ///
    /// Registering after the engine is ready does nothing; the moment has
    /// passed.
    pub fn set_on_ready(&self, callback: ReadyCallback) {
        *self.on_ready.lock() = Some(callback);
    }

    /// Start a load unless one is running or finished
    pub fn ensure_loaded(&self) {
        let mut state = self.state.lock();
        if !matches!(*state, LoadState::Idle) {
            return;
        }
        let (sender, receiver) = oneshot::channel();
        *state = LoadState::Loading(receiver);
        drop(state);

        log::debug!("loading math engine via {}", self.loader.name());
        self.loader.load(LoadCompletion { sender });
        self.poll();
    }

    /// Pick up a finished load; returns whether the engine is ready
    pub fn poll(&self) -> bool {
        let mut state = self.state.lock();
        let outcome = match &mut *state {
            LoadState::Ready(_) => return true,
            LoadState::Loading(receiver) => match receiver.try_recv() {
                Ok(Some(result)) => result,
                Ok(None) => return false,
                Err(_) => Err(TypesetError::LoadFailed("loader went away".into()).into()),
            },
            _ => return false,
        };
        let ready = self.settle(&mut state, outcome);
        drop(state);
        if ready {
            self.fire_ready();
        }
        ready
    }

    pub fn is_loaded(&self) -> bool {
        self.poll()
    }

    /// Whether a load has failed for good
    pub fn has_failed(&self) -> bool {
        self.poll();
        matches!(*self.state.lock(), LoadState::Failed)
    }

    /// Block until the in-flight load finishes
    ///
    /// For batch tools only; interactive callers keep polling.
    pub fn wait_until_settled(&self) -> bool {
        self.ensure_loaded();
        let receiver = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, LoadState::Waiting) {
                LoadState::Loading(receiver) => receiver,
                other => {
                    *state = other;
                    return matches!(*state, LoadState::Ready(_));
                },
            }
        };
        let outcome = futures::executor::block_on(receiver)
            .unwrap_or_else(|_| Err(TypesetError::LoadFailed("loader went away".into()).into()));
        let mut state = self.state.lock();
        let ready = self.settle(&mut state, outcome);
        drop(state);
        if ready {
            self.fire_ready();
        }
        ready
    }

    fn settle(&self, state: &mut LoadState, outcome: Result<Arc<dyn MathEngine>>) -> bool {
        match outcome {
            Ok(engine) => {
                let error_markup: Arc<str> =
                    match engine.convert(ERROR_SOURCE, Notation::Tex, false) {
                        Ok(svg) => svg.into(),
                        Err(e) => {
                            log::warn!("{} cannot render the error marker: {}", engine.name(), e);
                            FALLBACK_ERROR_MARKUP.into()
                        },
                    };
                log::info!("math engine {} ready", engine.name());
                *state = LoadState::Ready(ReadyEngine {
                    engine,
                    error_markup,
                });
                true
            },
            Err(e) => {
                log::warn!("math engine failed to load, math stays plain text: {}", e);
                *state = LoadState::Failed;
                false
            },
        }
    }

    fn fire_ready(&self) {
        let callback = self.on_ready.lock().take();
        if let Some(callback) = callback {
            callback(is_math_element);
        }
    }

    fn ready(&self) -> Option<ReadyEngine> {
        self.poll();
        match &*self.state.lock() {
            LoadState::Ready(ready) => Some(ready.clone()),
            _ => None,
        }
    }

    /// Name of the ready engine, if any
    pub fn engine_name(&self) -> Option<&'static str> {
        self.ready().map(|r| r.engine.name())
    }

    /// Convert math source to markup; never fails
    ///
    /// Before the engine is ready this starts a load and returns `text`
    /// itself. Once ready, results are cached per notation and display
    /// mode, and input the engine rejects yields the error marker.
    pub fn convert(&self, text: &str, notation: Notation, display: bool) -> Arc<str> {
        let Some(ready) = self.ready() else {
            self.ensure_loaded();
            return Arc::from(text);
        };
        let key = MarkupKey {
            content: text.to_string(),
            notation,
            display,
        };
        self.markup.get_or_insert_with(key, || {
            match ready.engine.convert(text, notation, display) {
                Ok(svg) => svg.into(),
                Err(e) => {
                    log::warn!("{} rejected {:?}: {}", ready.engine.name(), text, e);
                    ready.error_markup.clone()
                },
            }
        })
    }

    /// The marker used for rejected math, once ready
    pub fn error_markup(&self) -> Option<Arc<str>> {
        self.ready().map(|r| r.error_markup)
    }

    pub fn cache_metrics(&self) -> CacheMetrics {
        self.markup.metrics()
    }

    pub fn cache_report(&self) -> String {
        self.markup.report("markup")
    }
}
