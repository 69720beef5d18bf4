//! Asset loading for the Horizon site runtime.
//!
//! - [`AssetCache`]: deduplicating, retrying loader for models and textures
//! - [`ConnectionProfile`]: network snapshot that scales attempt deadlines
//! - [`AssetReader`]: byte sources (local files, HTTP with the `http` feature)
//! - [`PreloadRequest`]: prioritized batch preloading

pub mod cache;
pub mod connection;
pub mod decode;
pub mod io;
pub mod metrics;
pub mod preload;
pub mod progress;
pub mod record;

pub use cache::{AssetCache, LoaderConfig};
pub use connection::{ConnectionProfile, EffectiveType, TimeoutPolicy};
pub use decode::{LoadedAsset, Model, ModelHandle, TextureHandle, TextureImage};
pub use io::{AssetReader, AssetReaderVariant, FileAssetReader};
#[cfg(feature = "http")]
pub use io::HttpAssetReader;
pub use metrics::LoadMetrics;
pub use preload::{PreloadRequest, Priority};
pub use progress::{CompleteEvent, ProgressEvent, ProgressTracker};
pub use record::{AssetKind, AssetRecord, AssetStatus};
