use std::time::Duration;

use crate::record::AssetKind;

/// Running load statistics, fed by the cache each time a load cycle settles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadMetrics {
    pub loaded: u32,
    pub failed: u32,
    /// Attempts beyond the first, summed over all cycles.
    pub retries: u32,
    pub models: u32,
    pub textures: u32,
    accumulated: Duration,
    slowest: Option<(String, Duration)>,
}

impl LoadMetrics {
    pub(crate) fn record(&mut self, url: &str, kind: AssetKind, attempts: u32, elapsed: Duration, ok: bool) {
        if ok {
            self.loaded += 1;
        } else {
            self.failed += 1;
        }
        match kind {
            AssetKind::Model => self.models += 1,
            AssetKind::Texture => self.textures += 1,
        }
        self.retries += attempts.saturating_sub(1);
        self.accumulated += elapsed;

        if self.slowest.as_ref().is_none_or(|(_, slowest)| elapsed > *slowest) {
            self.slowest = Some((url.to_string(), elapsed));
        }
    }

    #[must_use]
    pub fn settled(&self) -> u32 {
        self.loaded + self.failed
    }

    /// Mean duration of settled cycles.
    #[must_use]
    pub fn average(&self) -> Option<Duration> {
        let settled = self.settled();
        (settled > 0).then(|| self.accumulated / settled)
    }

    #[must_use]
    pub fn slowest(&self) -> Option<(&str, Duration)> {
        self.slowest
            .as_ref()
            .map(|(url, elapsed)| (url.as_str(), *elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_counts_average_and_slowest() {
        let mut metrics = LoadMetrics::default();
        metrics.record("a.glb", AssetKind::Model, 1, Duration::from_millis(100), true);
        metrics.record("b.png", AssetKind::Texture, 3, Duration::from_millis(300), false);

        assert_eq!((metrics.loaded, metrics.failed, metrics.retries), (1, 1, 2));
        assert_eq!((metrics.models, metrics.textures), (1, 1));
        assert_eq!(metrics.average(), Some(Duration::from_millis(200)));
        assert_eq!(metrics.slowest(), Some(("b.png", Duration::from_millis(300))));
    }
}
