//! Platform detection.
//!
//! The only place the runtime looks at its environment. In the browser the
//! connection comes from `navigator.connection` and the hosting profile from
//! `location.hostname`; natively both come from environment variables:
//!
//! - `HORIZON_CONNECTION`: tier name (`slow-2g`, `2g`, `3g`, `4g`)
//! - `HORIZON_RTT_MS`: round-trip estimate in milliseconds
//! - `HORIZON_SAVE_DATA`: `1` or `true` to request reduced data use
//! - `HORIZON_HIGH_LATENCY`: `1` or `true` for high-latency hosting

use horizon_assets::{ConnectionProfile, EffectiveType};

/// Hosting environment traits that affect animation timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostingProfile {
    /// Content is served far from the client (CDN-fronted static hosting),
    /// so injected styles take longer to settle.
    pub high_latency: bool,
}

/// Suffixes of static hosts that inject content after first paint.
const HIGH_LATENCY_HOSTS: [&str; 2] = [".web.app", ".firebaseapp.com"];

impl HostingProfile {
    #[must_use]
    pub fn from_hostname(hostname: &str) -> Self {
        Self {
            high_latency: HIGH_LATENCY_HOSTS
                .iter()
                .any(|suffix| hostname.ends_with(suffix)),
        }
    }

    #[must_use]
    pub fn detect() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::window()
                .and_then(|window| window.location().hostname().ok())
                .map(|hostname| Self::from_hostname(&hostname))
                .unwrap_or_default()
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self {
                high_latency: env_flag("HORIZON_HIGH_LATENCY"),
            }
        }
    }
}

/// Platform detection for [`ConnectionProfile`].
pub trait DetectConnection: Sized {
    fn detect() -> Self;
}

impl DetectConnection for ConnectionProfile {
    fn detect() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            web::connection().unwrap_or_default()
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let Ok(tier) = std::env::var("HORIZON_CONNECTION") else {
                return Self::default();
            };
            let mut profile = Self::for_tier(EffectiveType::parse(&tier));
            if let Some(rtt) = std::env::var("HORIZON_RTT_MS")
                .ok()
                .and_then(|value| value.trim().parse().ok())
            {
                profile.round_trip_ms = rtt;
            }
            profile.save_data = env_flag("HORIZON_SAVE_DATA");
            log::debug!(
                "Connection profile from environment: {} ({} ms)",
                profile.effective_type.as_str(),
                profile.round_trip_ms
            );
            profile
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|value| matches!(value.trim(), "1" | "true" | "yes"))
}

#[cfg(target_arch = "wasm32")]
mod web {
    use horizon_assets::{ConnectionProfile, EffectiveType};
    use js_sys::Reflect;
    use wasm_bindgen::JsValue;

    fn field(target: &JsValue, name: &str) -> Option<JsValue> {
        Reflect::get(target, &JsValue::from_str(name))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
    }

    /// Reads `navigator.connection`; `None` where the API is unsupported.
    pub(super) fn connection() -> Option<ConnectionProfile> {
        let navigator = web_sys::window()?.navigator();
        let connection = field(&navigator, "connection")?;

        let defaults = ConnectionProfile::default();
        let effective_type = field(&connection, "effectiveType")
            .and_then(|value| value.as_string())
            .map_or(defaults.effective_type, |name| EffectiveType::parse(&name));
        let downlink_mbps = field(&connection, "downlink")
            .and_then(|value| value.as_f64())
            .unwrap_or(defaults.downlink_mbps);
        let round_trip_ms = field(&connection, "rtt")
            .and_then(|value| value.as_f64())
            .map_or(defaults.round_trip_ms, |rtt| rtt.max(0.0) as u32);
        let save_data = field(&connection, "saveData")
            .and_then(|value| value.as_bool())
            .unwrap_or(false);

        Some(ConnectionProfile {
            effective_type,
            downlink_mbps,
            round_trip_ms,
            save_data,
        })
    }
}
