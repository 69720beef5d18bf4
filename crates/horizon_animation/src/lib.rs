//! Scroll-linked animation for the Horizon site runtime.
//!
//! - [`AnimationBinding`] / [`BindingCatalog`]: declarative scroll effects
//! - [`ScrollEngine`]: trigger engine seam, implemented by [`ScrollTimeline`]
//! - [`AnimationSequencer`]: exactly-once catalog registration after mount

pub mod binding;
pub mod easing;
pub mod engine;
pub mod mount;
pub mod playhead;
pub mod sequencer;
pub mod timeline;
pub mod tween;

pub use binding::{Anchor, AnimationBinding, BindingCatalog, Edge, PlayMode, Property, TriggerRegion};
pub use easing::Easing;
pub use engine::{BindingId, ScrollEngine};
pub use mount::{MountNotifier, MountSignal, mount_signal};
pub use playhead::Playhead;
pub use sequencer::{AnimationSequencer, SequencerConfig, SequencerState, SequencerStatus};
pub use timeline::{ElementRect, ElementRef, PropertySink, ScrollTimeline};
pub use tween::Tween;
