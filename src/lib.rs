#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod config;
pub mod monitor;
pub mod platform;
pub mod site;

pub use horizon_animation as animation;
pub use horizon_assets as assets;

pub use config::{AnimationSettings, HostingSettings, LoaderSettings, SiteConfig};
pub use monitor::{PerformanceMonitor, PerformanceReport};
pub use platform::{DetectConnection, HostingProfile};
pub use site::Site;

pub use horizon_animation::{
    AnimationBinding, AnimationSequencer, BindingCatalog, ElementRect, ElementRef, MountNotifier,
    MountSignal, PropertySink, ScrollEngine, ScrollTimeline, SequencerConfig, SequencerState,
    SequencerStatus, mount_signal,
};
pub use horizon_assets::{
    AssetCache, AssetKind, AssetReader, AssetReaderVariant, AssetStatus, ConnectionProfile,
    EffectiveType, LoaderConfig, PreloadRequest, Priority,
};
pub use horizon_core::{AssetError, Error, Result, SequencerError, Subscription};
