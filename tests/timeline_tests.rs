//! Scroll Timeline Tests
//!
//! Tests for:
//! - Trigger geometry of the default catalog against a synthetic layout
//! - Scrub interpolation (headline parallax, section hold)
//! - One-shot playback driven by frame ticks
//! - Refresh after layout changes, kill / kill_all

mod common;

use std::sync::Arc;
use std::time::Duration;

use horizon::animation::{
    Anchor, AnimationBinding, Easing, Edge, PlayMode, Property, TriggerRegion, Tween,
};
use horizon::{BindingCatalog, ElementRect, ScrollEngine, ScrollTimeline};

use common::{RecordingSink, approx};

const VIEWPORT: f32 = 900.0;

/// A 4000px page: headline at the top, two fade-in cards, one held section.
fn page() -> (Arc<RecordingSink>, ScrollTimeline) {
    common::init_logging();
    let sink = Arc::new(RecordingSink::default());
    let timeline = ScrollTimeline::new(sink.clone());
    timeline.set_viewport_height(VIEWPORT);
    timeline.set_layout("#scroll-container", [ElementRect::new(0.0, 4000.0)]);
    timeline.set_layout(".looping-headline", [ElementRect::new(120.0, 180.0)]);
    timeline.set_layout(
        "[data-fade-in]",
        [ElementRect::new(1100.0, 400.0), ElementRect::new(1900.0, 400.0)],
    );
    timeline.set_layout(".section-hold", [ElementRect::new(2000.0, 1000.0)]);
    (sink, timeline)
}

fn register_catalog(timeline: &ScrollTimeline) -> Vec<horizon::animation::BindingId> {
    BindingCatalog::site_default()
        .iter()
        .map(|binding| timeline.register(binding).unwrap())
        .collect()
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn catalog_triggers_resolve_against_layout() {
    let (_sink, timeline) = page();
    let ids = register_catalog(&timeline);

    // Headline: container top at viewport top -> container bottom at viewport bottom.
    assert_eq!(timeline.trigger_offsets(ids[0]).unwrap(), vec![(0.0, 3100.0)]);
    // Fade-in: card top at 85% / 60% of the viewport.
    let fades = timeline.trigger_offsets(ids[1]).unwrap();
    assert_eq!(fades.len(), 2);
    assert!(approx(fades[0].0, 335.0) && approx(fades[0].1, 560.0));
    assert!(approx(fades[1].0, 1135.0));
    // Section hold: its own top to its own bottom at the viewport top.
    assert_eq!(timeline.trigger_offsets(ids[2]).unwrap(), vec![(2000.0, 3000.0)]);
}

#[test]
fn missing_anchor_selector_makes_binding_inert() {
    let (sink, timeline) = page();
    timeline.remove_layout("#scroll-container");
    let ids = register_catalog(&timeline);

    assert_eq!(timeline.target_count(ids[0]), Some(0));
    timeline.set_scroll(1500.0);
    assert_eq!(sink.last(".looping-headline", 0), None);
}

// ============================================================================
// Scrub
// ============================================================================

#[test]
fn headline_parallax_tracks_scroll() {
    let (sink, timeline) = page();
    register_catalog(&timeline);
    assert!(approx(sink.last(".looping-headline", 0).unwrap(), 0.0));

    timeline.set_scroll(1550.0);
    assert!(approx(sink.last(".looping-headline", 0).unwrap(), -25.0));

    timeline.set_scroll(3100.0);
    assert!(approx(sink.last(".looping-headline", 0).unwrap(), -50.0));

    // Scrubbing reverses with the scroll direction.
    timeline.set_scroll(775.0);
    assert!(approx(sink.last(".looping-headline", 0).unwrap(), -12.5));
}

#[test]
fn section_holds_then_fades() {
    let (sink, timeline) = page();
    register_catalog(&timeline);

    timeline.set_scroll(2500.0);
    assert!(approx(sink.last(".section-hold", 0).unwrap(), 1.0));

    // Halfway through the fade; PowerIn(1) is quadratic.
    timeline.set_scroll(2850.0);
    assert!(approx(sink.last(".section-hold", 0).unwrap(), 0.75));

    timeline.set_scroll(3600.0);
    assert!(approx(sink.last(".section-hold", 0).unwrap(), 0.0));
}

// ============================================================================
// One-shot
// ============================================================================

#[test]
fn fade_in_plays_once_on_ticks() {
    let (sink, timeline) = page();
    register_catalog(&timeline);
    assert!(approx(sink.last("[data-fade-in]", 0).unwrap(), 0.0));

    // Before the start edge nothing moves.
    timeline.set_scroll(300.0);
    timeline.tick(Duration::from_millis(400));
    assert!(approx(sink.last("[data-fade-in]", 0).unwrap(), 0.0));

    timeline.set_scroll(400.0);
    timeline.tick(Duration::from_millis(400));
    // PowerOut(2) at half time.
    assert!(approx(sink.last("[data-fade-in]", 0).unwrap(), 0.875));

    timeline.tick(Duration::from_millis(400));
    assert!(approx(sink.last("[data-fade-in]", 0).unwrap(), 1.0));

    // Second card has not been reached.
    assert!(approx(sink.last("[data-fade-in]", 1).unwrap(), 0.0));

    // Scrolling back does not replay or reverse.
    let writes = sink.writes_to("[data-fade-in]");
    timeline.set_scroll(0.0);
    timeline.tick(Duration::from_millis(400));
    assert_eq!(sink.writes_to("[data-fade-in]"), writes);
}

#[test]
fn one_shot_started_past_the_edge_plays_immediately() {
    let (sink, timeline) = page();
    timeline.set_scroll(2000.0);
    register_catalog(&timeline);

    timeline.tick(Duration::from_millis(800));
    assert!(approx(sink.last("[data-fade-in]", 0).unwrap(), 1.0));
    assert!(approx(sink.last("[data-fade-in]", 1).unwrap(), 1.0));
}

// ============================================================================
// Refresh & teardown
// ============================================================================

#[test]
fn refresh_picks_up_layout_changes() {
    let (sink, timeline) = page();
    let ids = register_catalog(&timeline);

    timeline.set_layout(".section-hold", [ElementRect::new(2500.0, 1000.0)]);
    assert_eq!(timeline.trigger_offsets(ids[2]).unwrap(), vec![(2000.0, 3000.0)]);

    timeline.refresh().unwrap();
    assert_eq!(timeline.trigger_offsets(ids[2]).unwrap(), vec![(2500.0, 3500.0)]);

    timeline.set_scroll(3350.0);
    assert!(approx(sink.last(".section-hold", 0).unwrap(), 0.75));
}

#[test]
fn refresh_keeps_one_shot_progress() {
    let (sink, timeline) = page();
    register_catalog(&timeline);
    timeline.set_scroll(400.0);
    timeline.tick(Duration::from_millis(400));

    timeline.refresh().unwrap();
    timeline.tick(Duration::from_millis(400));
    assert!(approx(sink.last("[data-fade-in]", 0).unwrap(), 1.0));
}

#[test]
fn scroll_to_top_resets_scrubs() {
    let (sink, timeline) = page();
    register_catalog(&timeline);
    timeline.set_scroll(3100.0);

    timeline.scroll_to_top().unwrap();
    assert!(approx(timeline.scroll_offset(), 0.0));
    assert!(approx(sink.last(".looping-headline", 0).unwrap(), 0.0));
}

#[test]
fn kill_all_stops_all_writes() {
    let (sink, timeline) = page();
    register_catalog(&timeline);
    timeline.kill_all();
    assert_eq!(timeline.binding_count(), 0);

    let before = sink.writes_to(".looping-headline");
    timeline.set_scroll(1500.0);
    assert_eq!(sink.writes_to(".looping-headline"), before);
}

#[test]
fn invalid_bindings_are_rejected() {
    let (_sink, timeline) = page();
    let binding = AnimationBinding {
        name: "broken".into(),
        target: "  ".into(),
        trigger: TriggerRegion {
            anchor: Anchor::SelfTarget,
            start: Edge::new(0.0, 1.0),
            end: Edge::new(1.0, 0.0),
        },
        property: Property::Scale,
        tween: Tween::between(0.9, 1.0, Easing::SineInOut),
        mode: PlayMode::Scrub,
    };
    assert!(timeline.register(&binding).is_err());
    assert_eq!(timeline.binding_count(), 0);
}
