//! Connection Profile
//!
//! An immutable snapshot of the network quality reported by the client,
//! taken once at startup by the composition root. The loader only ever reads
//! the derived [`ConnectionProfile::timeout_multiplier`]; it never probes the
//! network itself.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Network-quality tiers as reported by the Network Information API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EffectiveType {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "3g")]
    ThreeG,
    #[default]
    #[serde(rename = "4g", other)]
    FourG,
}

impl EffectiveType {
    /// Parses a reported tier name. Unknown names fall back to `4g`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => Self::Slow2g,
            "2g" => Self::TwoG,
            "3g" => Self::ThreeG,
            _ => Self::FourG,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow2g => "slow-2g",
            Self::TwoG => "2g",
            Self::ThreeG => "3g",
            Self::FourG => "4g",
        }
    }

    fn multiplier(self) -> f64 {
        match self {
            Self::Slow2g => 3.0,
            Self::TwoG => 2.5,
            Self::ThreeG => 1.5,
            Self::FourG => 1.0,
        }
    }
}

/// Round trips above this are treated as a congested link.
const HIGH_RTT_MS: u32 = 300;
const HIGH_RTT_FACTOR: f64 = 1.25;
const SAVE_DATA_FACTOR: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionProfile {
    pub effective_type: EffectiveType,
    pub downlink_mbps: f64,
    pub round_trip_ms: u32,
    pub save_data: bool,
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            effective_type: EffectiveType::FourG,
            downlink_mbps: 10.0,
            round_trip_ms: 50,
            save_data: false,
        }
    }
}

impl ConnectionProfile {
    /// A profile with tier-typical link figures.
    #[must_use]
    pub fn for_tier(effective_type: EffectiveType) -> Self {
        let (downlink_mbps, round_trip_ms) = match effective_type {
            EffectiveType::Slow2g => (0.05, 2000),
            EffectiveType::TwoG => (0.25, 1400),
            EffectiveType::ThreeG => (0.7, 270),
            EffectiveType::FourG => (10.0, 50),
        };
        Self {
            effective_type,
            downlink_mbps,
            round_trip_ms,
            save_data: false,
        }
    }

    /// Factor (>= 1.0) applied to base timeouts.
    #[must_use]
    pub fn timeout_multiplier(&self) -> f64 {
        let mut multiplier = self.effective_type.multiplier();
        if self.round_trip_ms > HIGH_RTT_MS {
            multiplier *= HIGH_RTT_FACTOR;
        }
        if self.save_data {
            multiplier *= SAVE_DATA_FACTOR;
        }
        multiplier
    }
}

/// Base deadline for one attempt and the ceiling scaling may not exceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub base: Duration,
    pub cap: Duration,
}

impl TimeoutPolicy {
    #[must_use]
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// `min(base * multiplier, cap)`.
    #[must_use]
    pub fn scaled(&self, profile: &ConnectionProfile) -> Duration {
        self.base
            .mul_f64(profile.timeout_multiplier())
            .min(self.cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_falls_back_to_4g() {
        assert_eq!(EffectiveType::parse("slow-2g"), EffectiveType::Slow2g);
        assert_eq!(EffectiveType::parse(" 3G "), EffectiveType::ThreeG);
        assert_eq!(EffectiveType::parse("5g"), EffectiveType::FourG);
        assert_eq!(EffectiveType::parse(""), EffectiveType::FourG);
    }

    #[test]
    fn slower_tiers_get_longer_but_capped_timeouts() {
        let policy = TimeoutPolicy::new(Duration::from_secs(10), Duration::from_secs(30));
        let fast = policy.scaled(&ConnectionProfile::for_tier(EffectiveType::FourG));
        let slow = policy.scaled(&ConnectionProfile::for_tier(EffectiveType::Slow2g));

        assert_eq!(fast, Duration::from_secs(10));
        assert!(slow > fast);
        assert!(slow <= policy.cap);
        assert!(fast <= policy.cap);
    }

    #[test]
    fn rtt_and_save_data_compound() {
        let profile = ConnectionProfile {
            effective_type: EffectiveType::ThreeG,
            downlink_mbps: 0.5,
            round_trip_ms: 400,
            save_data: true,
        };
        let expected = 1.5 * 1.25 * 1.25;
        assert!((profile.timeout_multiplier() - expected).abs() < 1e-9);
    }

    #[test]
    fn deserializes_tier_names() {
        let profile: ConnectionProfile =
            serde_json::from_str(r#"{ "effective_type": "2g", "save_data": true }"#).unwrap();
        assert_eq!(profile.effective_type, EffectiveType::TwoG);
        assert!(profile.save_data);
        assert_eq!(profile.round_trip_ms, 50);
    }
}
