//! Site Composition Tests
//!
//! Tests for:
//! - Profile resolution (configured values over detected ones)
//! - `start`: preload and animation init side by side
//! - Load failures reaching the performance report
//! - Loading configuration from disk and picking the reader from it

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use horizon::{
    AssetError, AssetReaderVariant, ConnectionProfile, EffectiveType, HostingProfile,
    MountSignal, PreloadRequest, Site, SiteConfig,
};

use common::{RecordingEngine, ScriptedReader, Step};

fn site_with(
    config: SiteConfig,
    reader: &Arc<ScriptedReader>,
    engine: &Arc<RecordingEngine>,
    hosting: HostingProfile,
) -> Site<Arc<ScriptedReader>> {
    common::init_logging();
    Site::with_profiles(
        config,
        Arc::clone(reader),
        Arc::clone(engine) as _,
        MountSignal::already_mounted(),
        ConnectionProfile::default(),
        hosting,
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn configured_profiles_override_detection() {
    let mut config = SiteConfig::default();
    config.connection = Some(ConnectionProfile::for_tier(EffectiveType::TwoG));
    config.hosting.high_latency = Some(false);

    let reader = Arc::new(ScriptedReader::new());
    let engine = Arc::new(RecordingEngine::default());
    let site = site_with(
        config,
        &reader,
        &engine,
        HostingProfile { high_latency: true },
    );

    assert_eq!(site.connection().effective_type, EffectiveType::TwoG);
    assert!(!site.hosting().high_latency);
    assert!(!site.animations().config().high_latency);
    assert_eq!(site.assets().profile().effective_type, EffectiveType::TwoG);
}

#[tokio::test(start_paused = true)]
async fn detected_hosting_drives_settle_delay() {
    let reader = Arc::new(ScriptedReader::new());
    let engine = Arc::new(RecordingEngine::default());
    let site = site_with(
        SiteConfig::default(),
        &reader,
        &engine,
        HostingProfile { high_latency: true },
    );

    let start = Instant::now();
    let loaded = site.start().await;

    assert!(!loaded);
    assert_eq!(start.elapsed(), Duration::from_millis(200));
    assert!(site.animations().status().is_initialized);
}

#[tokio::test(start_paused = true)]
async fn start_preloads_and_initializes_together() {
    let mut config = SiteConfig::default();
    config.critical_assets = vec![
        PreloadRequest::model("model/Robot.glb", 1),
        PreloadRequest::texture("textures/missing.png", 2),
    ];

    let reader = Arc::new(
        ScriptedReader::new()
            .script("model/Robot.glb", [Step::model_after(50)])
            .script(
                "textures/missing.png",
                [Step::fail_after(0, AssetError::NotFound("textures/missing.png".into()))],
            ),
    );
    let engine = Arc::new(RecordingEngine::default());
    let site = site_with(config, &reader, &engine, HostingProfile::default());

    let start = Instant::now();
    let loaded = site.start().await;

    assert!(loaded);
    // Init (100 ms settle) outlasts the 50 ms model.
    assert_eq!(start.elapsed(), Duration::from_millis(100));
    assert!(site.assets().is_cached("model/Robot.glb"));
    assert!(site.animations().status().is_initialized);

    let report = site.report();
    assert_eq!(report.loads.loaded, 1);
    assert_eq!(report.loads.failed, 1);
    assert_eq!(report.load_errors, 1);
}

#[test]
fn config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("horizon-site-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{
            "asset_root": "public/assets",
            "loader": { "max_retries": 5, "retry_delay_ms": 250 },
            "animation": { "settle_delay_ms": 50 }
        }"#,
    )
    .unwrap();

    let config = SiteConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let loader = config.loader.to_loader_config().unwrap();
    assert_eq!(loader.max_retries, 5);
    assert_eq!(loader.base_retry_delay, Duration::from_millis(250));
    assert_eq!(
        config.animation.to_sequencer_config(false).settle_delay,
        Duration::from_millis(50)
    );

    let engine = Arc::new(RecordingEngine::default());
    let site = Site::from_config(config, engine as _, MountSignal::already_mounted()).unwrap();
    assert_eq!(site.assets().config().max_retries, 5);
}

#[test]
fn invalid_config_is_rejected() {
    assert!(SiteConfig::from_json_str(r#"{ "asset_root": "" }"#).is_err());
    assert!(SiteConfig::from_json_str(r#"{ "loader": { "texture_timeout_ms": 0 } }"#).is_err());
    assert!(SiteConfig::from_json_str("not json").is_err());
    assert!(SiteConfig::from_file("/definitely/not/here.json").is_err());
}

#[cfg(feature = "http")]
#[test]
fn reader_variant_follows_asset_root() {
    assert!(matches!(
        AssetReaderVariant::from_source("public/assets"),
        Ok(AssetReaderVariant::File(_))
    ));
    assert!(matches!(
        AssetReaderVariant::from_source("https://cdn.example.com/site"),
        Ok(AssetReaderVariant::Http(_))
    ));
}
