//! Composition Root
//!
//! [`Site`] builds and owns the runtime's single asset cache, animation
//! sequencer and performance monitor. There are no globals: the host UI keeps
//! the `Site` and passes handles down to page components.
//!
//! ```rust,ignore
//! let (notifier, mount) = horizon::mount_signal();
//! let timeline = Arc::new(ScrollTimeline::new(sink));
//! let site = Site::from_config(SiteConfig::from_file("site.json")?, timeline.clone(), mount)?;
//!
//! // ...once the scroll container is in the DOM:
//! notifier.mounted();
//! let critical_ready = site.start().await;
//! ```

use std::sync::Arc;

use horizon_animation::{AnimationSequencer, MountSignal, ScrollEngine};
use horizon_assets::{AssetCache, AssetReader, AssetReaderVariant, ConnectionProfile};
use horizon_core::Result;
use horizon_core::time::Duration;

use crate::config::SiteConfig;
use crate::monitor::{PerformanceMonitor, PerformanceReport};
use crate::platform::{DetectConnection, HostingProfile};

pub struct Site<R: AssetReader = AssetReaderVariant> {
    config: SiteConfig,
    connection: ConnectionProfile,
    hosting: HostingProfile,
    assets: AssetCache<R>,
    animations: AnimationSequencer,
    monitor: Arc<PerformanceMonitor>,
}

impl Site<AssetReaderVariant> {
    /// Builds a site whose reader is picked from `config.asset_root`.
    pub fn from_config(
        config: SiteConfig,
        engine: Arc<dyn ScrollEngine>,
        mount: MountSignal,
    ) -> Result<Self> {
        let reader = AssetReaderVariant::from_source(&config.asset_root)?;
        Self::new(config, reader, engine, mount)
    }
}

impl<R: AssetReader> Site<R> {
    /// Builds a site, detecting connection and hosting profiles from the
    /// platform where the configuration does not pin them.
    pub fn new(
        config: SiteConfig,
        reader: R,
        engine: Arc<dyn ScrollEngine>,
        mount: MountSignal,
    ) -> Result<Self> {
        Self::with_profiles(
            config,
            reader,
            engine,
            mount,
            ConnectionProfile::detect(),
            HostingProfile::detect(),
        )
    }

    /// Builds a site from explicit profiles. Configured values still win.
    pub fn with_profiles(
        config: SiteConfig,
        reader: R,
        engine: Arc<dyn ScrollEngine>,
        mount: MountSignal,
        connection: ConnectionProfile,
        hosting: HostingProfile,
    ) -> Result<Self> {
        config.validate()?;

        let connection = config.connection.unwrap_or(connection);
        let hosting = HostingProfile {
            high_latency: config.hosting.high_latency.unwrap_or(hosting.high_latency),
        };

        let assets = AssetCache::new(reader, config.loader.to_loader_config()?, connection);
        let animations = AnimationSequencer::new(
            engine,
            mount,
            config.animation.catalog(),
            config.animation.to_sequencer_config(hosting.high_latency),
        );

        let monitor = Arc::new(PerformanceMonitor::default());
        let errors = Arc::clone(&monitor);
        assets.on_error(move |_| errors.record_load_error());

        log::debug!(
            "Site ready: connection {} (x{:.2} timeouts), high latency hosting: {}",
            connection.effective_type.as_str(),
            connection.timeout_multiplier(),
            hosting.high_latency
        );

        Ok(Self {
            config,
            connection,
            hosting,
            assets,
            animations,
            monitor,
        })
    }

    /// Preloads the configured critical assets while initializing the
    /// animation layer. Returns whether any critical asset loaded.
    ///
    /// Neither half can fail the other: asset errors reach the error
    /// listeners and animation errors the sequencer status.
    pub async fn start(&self) -> bool {
        let (critical_loaded, ()) = tokio::join!(
            self.assets.preload_critical(&self.config.critical_assets),
            self.animations.initialize(),
        );
        critical_loaded
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    #[must_use]
    pub fn connection(&self) -> &ConnectionProfile {
        &self.connection
    }

    #[must_use]
    pub fn hosting(&self) -> HostingProfile {
        self.hosting
    }

    #[must_use]
    pub fn assets(&self) -> &AssetCache<R> {
        &self.assets
    }

    #[must_use]
    pub fn animations(&self) -> &AnimationSequencer {
        &self.animations
    }

    #[must_use]
    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// Records a rendered frame; the returned delta drives one-shot playheads.
    pub fn frame(&self) -> Duration {
        self.monitor.frame()
    }

    #[must_use]
    pub fn report(&self) -> PerformanceReport {
        self.monitor.report(self.assets.metrics())
    }
}
