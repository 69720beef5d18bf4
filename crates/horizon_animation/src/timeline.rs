//! Scroll Timeline
//!
//! [`ScrollTimeline`] is the in-process [`ScrollEngine`]: the host UI feeds it
//! element geometry, viewport height, scroll offsets and frame deltas, and it
//! writes animated property values to a [`PropertySink`].
//!
//! # Trigger geometry
//!
//! Each registered binding resolves to one trigger per matched target. A
//! trigger's start and end offsets come from its anchor rect and the
//! binding's [`Edge`](crate::binding::Edge)s, and are only recomputed on
//! [`refresh`](ScrollEngine::refresh) or registration. Layout changes alone do
//! not move triggers.
//!
//! # Modes
//!
//! - `Scrub` triggers map scroll progress between start and end directly
//!   onto the tween.
//! - `OneShot` triggers hold the tween's first value until the start edge is
//!   crossed, then play once on frame ticks, independent of further scrolling.
//!
//! Property writes are collected under the lock and delivered after it is
//! released, so a sink may call back into the timeline.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use horizon_core::SequencerError;

use crate::binding::{Anchor, AnimationBinding, PlayMode, Property};
use crate::engine::{BindingId, ScrollEngine};
use crate::playhead::Playhead;

/// Vertical geometry of one laid-out element, in document pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRect {
    pub top: f32,
    pub height: f32,
}

impl ElementRect {
    #[must_use]
    pub const fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }
}

/// The `index`-th element matching `selector`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub selector: String,
    pub index: usize,
}

/// Receives animated values.
pub trait PropertySink: Send + Sync {
    fn apply(&self, element: &ElementRef, property: Property, value: f32);
}

type PropertyWrite = (ElementRef, Property, f32);

#[derive(Debug)]
struct Trigger {
    element: ElementRef,
    start: f32,
    end: f32,
    last_value: Option<f32>,
    playhead: Option<Playhead>,
}

impl Trigger {
    fn progress(&self, scroll: f32) -> f32 {
        ((scroll - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
struct ActiveBinding {
    binding: AnimationBinding,
    triggers: SmallVec<[Trigger; 4]>,
}

#[derive(Default)]
struct TimelineState {
    viewport_height: f32,
    scroll: f32,
    layout: FxHashMap<String, SmallVec<[ElementRect; 4]>>,
    bindings: SlotMap<BindingId, ActiveBinding>,
}

impl TimelineState {
    fn resolve_triggers(&self, binding: &AnimationBinding) -> SmallVec<[Trigger; 4]> {
        let Some(targets) = self.layout.get(&binding.target) else {
            return SmallVec::new();
        };

        let shared_anchor = match &binding.trigger.anchor {
            Anchor::SelfTarget => None,
            Anchor::Selector(selector) => match self.layout.get(selector).and_then(|r| r.first()) {
                Some(rect) => Some(*rect),
                // Anchor not on this page: the binding stays inert.
                None => return SmallVec::new(),
            },
        };

        targets
            .iter()
            .enumerate()
            .map(|(index, rect)| {
                let anchor = shared_anchor.unwrap_or(*rect);
                let vh = self.viewport_height;
                let start = binding.trigger.start.offset(anchor.top, anchor.height, vh);
                let mut end = binding.trigger.end.offset(anchor.top, anchor.height, vh);
                if end <= start {
                    end = start + 1.0;
                }
                Trigger {
                    element: ElementRef {
                        selector: binding.target.clone(),
                        index,
                    },
                    start,
                    end,
                    last_value: None,
                    playhead: None,
                }
            })
            .collect()
    }

    fn evaluate(&mut self, writes: &mut Vec<PropertyWrite>) {
        let scroll = self.scroll;
        for active in self.bindings.values_mut() {
            evaluate_binding(active, scroll, writes);
        }
    }
}

fn evaluate_binding(active: &mut ActiveBinding, scroll: f32, writes: &mut Vec<PropertyWrite>) {
    let ActiveBinding { binding, triggers } = active;
    for trigger in triggers.iter_mut() {
        let value = match binding.mode {
            PlayMode::Scrub => binding.tween.sample(trigger.progress(scroll)),
            PlayMode::OneShot { duration_ms } => {
                if trigger.playhead.is_none() && scroll >= trigger.start {
                    trigger.playhead = Some(Playhead::new(Duration::from_millis(duration_ms)));
                }
                match &trigger.playhead {
                    Some(playhead) => binding.tween.sample(playhead.progress()),
                    None => binding.tween.initial(),
                }
            }
        };
        push_if_changed(trigger, binding.property, value, writes);
    }
}

fn push_if_changed(trigger: &mut Trigger, property: Property, value: f32, writes: &mut Vec<PropertyWrite>) {
    if trigger.last_value != Some(value) {
        trigger.last_value = Some(value);
        writes.push((trigger.element.clone(), property, value));
    }
}

/// In-process scroll-trigger engine.
pub struct ScrollTimeline {
    state: Mutex<TimelineState>,
    sink: Arc<dyn PropertySink>,
}

impl ScrollTimeline {
    pub fn new(sink: Arc<dyn PropertySink>) -> Self {
        Self {
            state: Mutex::new(TimelineState::default()),
            sink,
        }
    }

    pub fn set_viewport_height(&self, height: f32) {
        self.state.lock().viewport_height = height.max(0.0);
    }

    /// Replaces the rects matched by `selector`. Takes effect on the next
    /// refresh.
    pub fn set_layout(&self, selector: &str, rects: impl IntoIterator<Item = ElementRect>) {
        self.state
            .lock()
            .layout
            .insert(selector.to_string(), rects.into_iter().collect());
    }

    pub fn remove_layout(&self, selector: &str) {
        self.state.lock().layout.remove(selector);
    }

    /// Moves the scroll position and re-evaluates every trigger.
    pub fn set_scroll(&self, offset: f32) {
        let mut writes = Vec::new();
        {
            let mut state = self.state.lock();
            state.scroll = offset.max(0.0);
            state.evaluate(&mut writes);
        }
        self.flush(writes);
    }

    /// Advances one-shot playheads by a frame delta.
    pub fn tick(&self, dt: Duration) {
        let dt = dt.as_secs_f32();
        let mut writes = Vec::new();
        {
            let mut state = self.state.lock();
            for active in state.bindings.values_mut() {
                let ActiveBinding { binding, triggers } = active;
                for trigger in triggers.iter_mut() {
                    let Some(playhead) = trigger.playhead.as_mut() else {
                        continue;
                    };
                    if playhead.advance(dt) {
                        let value = binding.tween.sample(playhead.progress());
                        push_if_changed(trigger, binding.property, value, &mut writes);
                    }
                }
            }
        }
        self.flush(writes);
    }

    #[must_use]
    pub fn scroll_offset(&self) -> f32 {
        self.state.lock().scroll
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.state.lock().bindings.len()
    }

    /// Number of elements a binding currently drives; `None` once killed.
    #[must_use]
    pub fn target_count(&self, id: BindingId) -> Option<usize> {
        self.state.lock().bindings.get(id).map(|b| b.triggers.len())
    }

    /// Start and end scroll offsets of each trigger of a binding.
    #[must_use]
    pub fn trigger_offsets(&self, id: BindingId) -> Option<Vec<(f32, f32)>> {
        self.state
            .lock()
            .bindings
            .get(id)
            .map(|b| b.triggers.iter().map(|t| (t.start, t.end)).collect())
    }

    fn flush(&self, writes: Vec<PropertyWrite>) {
        for (element, property, value) in writes {
            self.sink.apply(&element, property, value);
        }
    }
}

impl ScrollEngine for ScrollTimeline {
    fn is_ready(&self) -> bool {
        self.state.lock().viewport_height > 0.0
    }

    fn scroll_to_top(&self) -> Result<(), SequencerError> {
        self.set_scroll(0.0);
        Ok(())
    }

    fn refresh(&self) -> Result<(), SequencerError> {
        let mut writes = Vec::new();
        {
            let mut state = self.state.lock();
            if state.viewport_height <= 0.0 {
                return Err(SequencerError::Engine(
                    "viewport height has not been measured".to_string(),
                ));
            }

            let ids: Vec<BindingId> = state.bindings.keys().collect();
            for id in ids {
                let fresh = state.resolve_triggers(&state.bindings[id].binding);
                let active = &mut state.bindings[id];
                let mut previous: SmallVec<[Trigger; 4]> = std::mem::take(&mut active.triggers);
                active.triggers = fresh
                    .into_iter()
                    .map(|mut trigger| {
                        // Keep per-element playback state across refreshes.
                        if let Some(old) = previous
                            .iter_mut()
                            .find(|old| old.element == trigger.element)
                        {
                            trigger.last_value = old.last_value;
                            trigger.playhead = old.playhead.take();
                        }
                        trigger
                    })
                    .collect();
            }
            state.evaluate(&mut writes);
        }
        self.flush(writes);
        Ok(())
    }

    fn register(&self, binding: &AnimationBinding) -> Result<BindingId, SequencerError> {
        if binding.target.trim().is_empty() {
            return Err(SequencerError::Registration {
                binding: binding.name.clone(),
                reason: "empty target selector".to_string(),
            });
        }
        if binding.tween.values.is_empty() {
            return Err(SequencerError::Registration {
                binding: binding.name.clone(),
                reason: "tween has no keyframes".to_string(),
            });
        }

        let mut writes = Vec::new();
        let id = {
            let mut state = self.state.lock();
            let triggers = state.resolve_triggers(binding);
            if triggers.is_empty() {
                log::debug!("Binding {} matches no elements", binding.name);
            }
            let mut active = ActiveBinding {
                binding: binding.clone(),
                triggers,
            };
            evaluate_binding(&mut active, state.scroll, &mut writes);
            state.bindings.insert(active)
        };
        self.flush(writes);
        Ok(id)
    }

    fn kill(&self, id: BindingId) {
        self.state.lock().bindings.remove(id);
    }

    fn kill_all(&self) {
        self.state.lock().bindings.clear();
    }
}
