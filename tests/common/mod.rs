//! Shared fixtures for the integration tests: a scripted asset reader, a
//! recording scroll engine and tiny valid payloads.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::time::Instant;

use horizon::animation::{AnimationBinding, BindingId, ElementRef, Property};
use horizon::{AssetError, AssetReader, PropertySink, ScrollEngine, SequencerError};

/// Routes library logs through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

// ============================================================================
// Payloads
// ============================================================================

pub const MINIMAL_GLTF: &[u8] = br#"{"asset":{"version":"2.0"}}"#;

pub fn png_bytes() -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

pub fn transport(url: &str) -> AssetError {
    AssetError::Transport {
        url: url.to_string(),
        reason: "connection reset".to_string(),
    }
}

// ============================================================================
// Scripted reader
// ============================================================================

/// What the reader does for one call.
#[derive(Clone)]
pub enum Step {
    Ok { delay: Duration, bytes: Vec<u8> },
    Fail { delay: Duration, error: AssetError },
    Hang,
}

impl Step {
    pub fn model_after(ms: u64) -> Self {
        Self::Ok {
            delay: Duration::from_millis(ms),
            bytes: MINIMAL_GLTF.to_vec(),
        }
    }

    pub fn texture_after(ms: u64) -> Self {
        Self::Ok {
            delay: Duration::from_millis(ms),
            bytes: png_bytes(),
        }
    }

    pub fn fail_after(ms: u64, error: AssetError) -> Self {
        Self::Fail {
            delay: Duration::from_millis(ms),
            error,
        }
    }
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Step>,
    /// Replayed once `steps` runs out.
    last: Option<Step>,
}

/// Per-URL scripted responses; records every call with its (paused) time.
#[derive(Default)]
pub struct ScriptedReader {
    scripts: Mutex<FxHashMap<String, Script>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedReader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn script(self, url: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.set_script(url, steps);
        self
    }

    pub fn set_script(&self, url: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts.lock().insert(
            url.to_string(),
            Script {
                steps: steps.into_iter().collect(),
                last: None,
            },
        );
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|(u, _)| u == url).count()
    }

    pub fn call_times(&self, url: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, at)| *at)
            .collect()
    }

    fn next_step(&self, url: &str) -> Step {
        let mut scripts = self.scripts.lock();
        let Some(script) = scripts.get_mut(url) else {
            return Step::Fail {
                delay: Duration::ZERO,
                error: AssetError::NotFound(url.to_string()),
            };
        };
        match script.steps.pop_front() {
            Some(step) => {
                script.last = Some(step.clone());
                step
            }
            None => script.last.clone().unwrap_or(Step::Hang),
        }
    }
}

impl AssetReader for ScriptedReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>, AssetError> {
        self.calls.lock().push((uri.to_string(), Instant::now()));
        match self.next_step(uri) {
            Step::Ok { delay, bytes } => {
                tokio::time::sleep(delay).await;
                Ok(bytes)
            }
            Step::Fail { delay, error } => {
                tokio::time::sleep(delay).await;
                Err(error)
            }
            Step::Hang => std::future::pending().await,
        }
    }
}

// ============================================================================
// Recording engine
// ============================================================================

/// A scroll engine that counts calls and fails on demand.
#[derive(Default)]
pub struct RecordingEngine {
    pub not_ready: AtomicBool,
    pub scroll_to_top_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub registrations: AtomicUsize,
    pub kills: AtomicUsize,
    pub kill_all_calls: AtomicUsize,
    /// Number of upcoming `refresh` calls that fail.
    pub failing_refreshes: AtomicU32,
    /// Panic when registering the binding with this name.
    pub panic_on: Mutex<Option<String>>,
    active: Mutex<slotmap::SlotMap<BindingId, String>>,
}

impl RecordingEngine {
    pub fn active(&self) -> usize {
        self.active.lock().len()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl ScrollEngine for RecordingEngine {
    fn is_ready(&self) -> bool {
        !self.not_ready.load(Ordering::SeqCst)
    }

    fn scroll_to_top(&self) -> Result<(), SequencerError> {
        self.scroll_to_top_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn refresh(&self) -> Result<(), SequencerError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_refreshes.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_refreshes.store(failing - 1, Ordering::SeqCst);
            return Err(SequencerError::Engine("layout not measurable".to_string()));
        }
        Ok(())
    }

    fn register(&self, binding: &AnimationBinding) -> Result<BindingId, SequencerError> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        if self.panic_on.lock().as_deref() == Some(binding.name.as_str()) {
            panic!("engine exploded on {}", binding.name);
        }
        Ok(self.active.lock().insert(binding.name.clone()))
    }

    fn kill(&self, id: BindingId) {
        self.kills.fetch_add(1, Ordering::SeqCst);
        self.active.lock().remove(id);
    }

    fn kill_all(&self) {
        self.kill_all_calls.fetch_add(1, Ordering::SeqCst);
        self.active.lock().clear();
    }
}

// ============================================================================
// Recording sink
// ============================================================================

#[derive(Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<(ElementRef, Property, f32)>>,
}

impl RecordingSink {
    /// Last value written to `selector[index]`.
    pub fn last(&self, selector: &str, index: usize) -> Option<f32> {
        self.writes
            .lock()
            .iter()
            .rev()
            .find(|(element, _, _)| element.selector == selector && element.index == index)
            .map(|(_, _, value)| *value)
    }

    pub fn writes_to(&self, selector: &str) -> usize {
        self.writes
            .lock()
            .iter()
            .filter(|(element, _, _)| element.selector == selector)
            .count()
    }
}

impl PropertySink for RecordingSink {
    fn apply(&self, element: &ElementRef, property: Property, value: f32) {
        self.writes.lock().push((element.clone(), property, value));
    }
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}
