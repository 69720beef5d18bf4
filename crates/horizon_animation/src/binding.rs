use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::tween::Tween;

/// A point where an element edge meets a viewport line.
///
/// `element` is a fraction of the anchor element's height measured from its
/// top, `viewport` a fraction of the viewport height measured from its top.
/// The edge is reached at the scroll offset where both lines coincide:
/// `Edge::new(0.0, 1.0)` is "element top hits viewport bottom".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub element: f32,
    pub viewport: f32,
}

impl Edge {
    #[must_use]
    pub const fn new(element: f32, viewport: f32) -> Self {
        Self { element, viewport }
    }

    /// Scroll offset (px) at which this edge is reached.
    #[must_use]
    pub fn offset(&self, element_top: f32, element_height: f32, viewport_height: f32) -> f32 {
        element_top + self.element * element_height - self.viewport * viewport_height
    }
}

/// Which element's geometry drives a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Every matched target triggers on its own position.
    SelfTarget,
    /// All targets share the first element matching this selector.
    Selector(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRegion {
    pub anchor: Anchor,
    pub start: Edge,
    pub end: Edge,
}

/// Animated style property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Opacity,
    /// Percent of the element's own width.
    TranslateX,
    /// Pixels.
    TranslateY,
    Scale,
    /// Distance of the 3D camera from its target.
    CameraDistance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PlayMode {
    /// Value tracks scroll progress exactly.
    Scrub,
    /// Plays once over `duration_ms` when the start edge is crossed.
    OneShot { duration_ms: u64 },
}

/// One scroll-linked effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationBinding {
    pub name: String,
    /// Selector of the elements receiving the property.
    pub target: String,
    pub trigger: TriggerRegion,
    pub property: Property,
    pub tween: Tween,
    pub mode: PlayMode,
}

/// The fixed binding set registered by the sequencer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingCatalog {
    pub bindings: Vec<AnimationBinding>,
}

impl BindingCatalog {
    #[must_use]
    pub fn new(bindings: Vec<AnimationBinding>) -> Self {
        Self { bindings }
    }

    /// The landing-page catalog: headline parallax, fade-in on enter and
    /// section opacity holds.
    #[must_use]
    pub fn site_default() -> Self {
        Self::new(vec![
            AnimationBinding {
                name: "headline-parallax".into(),
                target: ".looping-headline".into(),
                trigger: TriggerRegion {
                    anchor: Anchor::Selector("#scroll-container".into()),
                    start: Edge::new(0.0, 0.0),
                    end: Edge::new(1.0, 1.0),
                },
                property: Property::TranslateX,
                tween: Tween::between(0.0, -50.0, Easing::Linear),
                mode: PlayMode::Scrub,
            },
            AnimationBinding {
                name: "fade-in".into(),
                target: "[data-fade-in]".into(),
                trigger: TriggerRegion {
                    anchor: Anchor::SelfTarget,
                    start: Edge::new(0.0, 0.85),
                    end: Edge::new(0.0, 0.6),
                },
                property: Property::Opacity,
                tween: Tween::between(0.0, 1.0, Easing::PowerOut(2)),
                mode: PlayMode::OneShot { duration_ms: 800 },
            },
            AnimationBinding {
                name: "section-hold".into(),
                target: ".section-hold".into(),
                trigger: TriggerRegion {
                    anchor: Anchor::SelfTarget,
                    start: Edge::new(0.0, 0.0),
                    end: Edge::new(1.0, 0.0),
                },
                property: Property::Opacity,
                tween: Tween::hold_then(1.0, 0.7, 0.0, Easing::PowerIn(1)),
                mode: PlayMode::Scrub,
            },
        ])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimationBinding> {
        self.bindings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_offset_matches_top_bottom_convention() {
        // Element at 1000px, 200px tall, viewport 800px.
        assert!((Edge::new(0.0, 1.0).offset(1000.0, 200.0, 800.0) - 200.0).abs() < 1e-4);
        assert!((Edge::new(1.0, 0.0).offset(1000.0, 200.0, 800.0) - 1200.0).abs() < 1e-4);
    }

    #[test]
    fn default_catalog_is_fixed_and_named() {
        let catalog = BindingCatalog::site_default();
        let names: Vec<_> = catalog.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["headline-parallax", "fade-in", "section-hold"]);
    }

    #[test]
    fn catalog_round_trips_through_json() {
        let catalog = BindingCatalog::site_default();
        let json = serde_json::to_string(&catalog).unwrap();
        let parsed: BindingCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, catalog);
    }
}
