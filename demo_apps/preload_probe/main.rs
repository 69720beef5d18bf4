//! Preload Probe
//!
//! Loads a site configuration, preloads its critical assets while running the
//! animation sequencer against a synthetic page layout, then prints a JSON
//! summary of what loaded and how long it took.
//!
//! Usage:
//!
//! ```text
//! preload_probe [site.json]
//! HORIZON_CONNECTION=3g RUST_LOG=debug preload_probe site.json
//! ```

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use horizon::animation::Property;
use horizon::{
    AssetStatus, ConnectionProfile, ElementRect, ElementRef, PropertySink,
    ScrollTimeline, Site, SiteConfig, mount_signal,
};

/// Logs property writes instead of touching a DOM.
struct LogSink;

impl PropertySink for LogSink {
    fn apply(&self, element: &ElementRef, property: Property, value: f32) {
        log::debug!("{}[{}].{property:?} = {value:.3}", element.selector, element.index);
    }
}

#[derive(Serialize)]
struct AssetSummary {
    url: String,
    status: String,
    attempts: u32,
    duration_ms: Option<u128>,
    error: Option<String>,
}

#[derive(Serialize)]
struct Summary {
    connection: String,
    timeout_multiplier: f64,
    critical_loaded: bool,
    progress: f32,
    animations_ready: bool,
    animation_retries: u32,
    assets: Vec<AssetSummary>,
    average_load_ms: Option<u128>,
    load_errors: u32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => SiteConfig::from_file(&path).with_context(|| format!("reading {path}"))?,
        None => SiteConfig::default(),
    };
    log::info!(
        "Probing {} critical assets from {}",
        config.critical_assets.len(),
        config.asset_root
    );

    let timeline = Arc::new(ScrollTimeline::new(Arc::new(LogSink)));
    timeline.set_viewport_height(900.0);
    timeline.set_layout("#scroll-container", [ElementRect::new(0.0, 4000.0)]);
    timeline.set_layout(".looping-headline", [ElementRect::new(120.0, 180.0)]);
    timeline.set_layout(
        "[data-fade-in]",
        [ElementRect::new(1100.0, 400.0), ElementRect::new(1900.0, 400.0)],
    );

    let (notifier, mount) = mount_signal();
    let site = Site::from_config(config, timeline.clone(), mount)?;
    notifier.mounted();

    let critical_loaded = site.start().await;

    // Walk the page once so scrub and one-shot bindings are exercised.
    for offset in (0..=3000).step_by(300) {
        timeline.set_scroll(offset as f32);
        timeline.tick(site.frame());
    }

    let assets = site
        .config()
        .critical_assets
        .iter()
        .filter_map(|request| site.assets().record(&request.url))
        .map(|record| AssetSummary {
            status: match record.status {
                AssetStatus::Pending => "pending",
                AssetStatus::Loading => "loading",
                AssetStatus::Loaded => "loaded",
                AssetStatus::Failed => "failed",
            }
            .to_string(),
            attempts: record.attempts,
            duration_ms: record.duration().map(|d| d.as_millis()),
            error: record.last_error.as_ref().map(ToString::to_string),
            url: record.url,
        })
        .collect();

    let status = site.animations().status();
    let report = site.report();
    let connection: ConnectionProfile = *site.connection();
    let summary = Summary {
        connection: connection.effective_type.as_str().to_string(),
        timeout_multiplier: connection.timeout_multiplier(),
        critical_loaded,
        progress: site.assets().progress(),
        animations_ready: status.is_initialized,
        animation_retries: status.retry_attempts,
        assets,
        average_load_ms: report.loads.average().map(|d| d.as_millis()),
        load_errors: report.load_errors,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
