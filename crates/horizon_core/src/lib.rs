//! Foundational types shared by the Horizon crates: the error taxonomy,
//! listener registries with unsubscribe handles, and frame timing.

pub mod errors;
pub mod fps_counter;
pub mod listeners;
pub mod time;

pub use errors::{AssetError, ConfigError, Error, Result, SequencerError};
pub use fps_counter::FpsCounter;
pub use listeners::{Listeners, Subscription, panic_message, run_isolated};
pub use time::FrameClock;
