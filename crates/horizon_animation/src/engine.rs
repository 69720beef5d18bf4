use slotmap::new_key_type;

use horizon_core::SequencerError;

use crate::binding::AnimationBinding;

new_key_type! {
    /// Handle of a binding registered with a [`ScrollEngine`].
    pub struct BindingId;
}

/// The scroll-trigger engine driven by the sequencer.
///
/// Implementations own trigger geometry and property application. The
/// sequencer only orders calls into it and never touches layout itself.
pub trait ScrollEngine: Send + Sync {
    /// Whether trigger geometry can be computed (the viewport is measured).
    fn is_ready(&self) -> bool;

    fn scroll_to_top(&self) -> Result<(), SequencerError>;

    /// Recomputes every trigger's start and end offsets from current layout.
    fn refresh(&self) -> Result<(), SequencerError>;

    /// Registers a binding. Selectors that match nothing yield an inert
    /// binding, not an error.
    fn register(&self, binding: &AnimationBinding) -> Result<BindingId, SequencerError>;

    fn kill(&self, id: BindingId);

    fn kill_all(&self);
}
