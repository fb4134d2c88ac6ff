//! Transition evaluation of a fix against the active geofences
//!
//! Each region is classified as outside, boundary or inside using a fixed
//! margin around its radius:
//!
//! ```text
//!   distance < radius - margin            -> Inside
//!   radius - margin <= distance <= r + m  -> Boundary
//!   distance > radius + margin            -> Outside
//! ```
//!
//! The boundary band absorbs receiver jitter. A stay inside ends only when a
//! fix settles outside, so inside -> boundary -> inside never re-enters and
//! inside -> boundary -> outside exits exactly once.

use serde::{Deserialize, Serialize};

use crate::core::{Fix, DEFAULT_BOUNDARY_MARGIN_M};
use crate::geofence::registry::RegionState;
use crate::geofence::{GeofenceRegion, GeofenceRegistry, GeofenceStatus, TransitionMask};
use crate::processing::DistanceModel;

/// One geofence transition, produced and dispatched within a single `process()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// The region that triggered
    pub region: GeofenceRegion,
    /// Distance from the fix to the region center (meters)
    pub distance_m: f64,
    /// The single transition bit that fired
    pub bitmap: TransitionMask,
    /// Region status after this evaluation
    pub status: GeofenceStatus,
}

/// Computes transitions; stateless apart from its tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceEvaluator {
    boundary_margin_m: f64,
    distance_model: DistanceModel,
}

impl GeofenceEvaluator {
    pub fn new(boundary_margin_m: f64, distance_model: DistanceModel) -> Self {
        Self {
            boundary_margin_m,
            distance_model,
        }
    }

    pub fn boundary_margin_m(&self) -> f64 {
        self.boundary_margin_m
    }

    pub fn distance_model(&self) -> DistanceModel {
        self.distance_model
    }

    /// Classify a distance against a radius
    pub fn classify(&self, distance_m: f64, radius_m: f64) -> GeofenceStatus {
        if distance_m > radius_m + self.boundary_margin_m {
            GeofenceStatus::Outside
        } else if distance_m < radius_m - self.boundary_margin_m {
            GeofenceStatus::Inside
        } else {
            GeofenceStatus::Boundary
        }
    }

    /// Evaluate a fix against every active, unexpired region in registry order.
    ///
    /// Region status is updated whether or not the region's mask lets the
    /// transition through; the mask only filters what is returned.
    pub fn evaluate(&self, fix: &Fix, registry: &mut GeofenceRegistry, now_ms: u64) -> Vec<TransitionEvent> {
        let mut events = Vec::new();
        if !fix.valid {
            return events;
        }

        for active in registry.active_mut() {
            if active.is_expired(now_ms) {
                continue;
            }

            let region = active.region();
            let distance_m = self
                .distance_model
                .distance_m((fix.latitude, fix.longitude), (region.latitude, region.longitude));
            let status = self.classify(distance_m, region.radius_m);
            let responsiveness_ms = u64::from(region.responsiveness_ms);
            let transitions = region.transitions;

            let fired = advance(&mut active.state, status, responsiveness_ms, now_ms);
            if let Some(kind) = fired {
                if transitions.contains(kind) {
                    events.push(TransitionEvent {
                        region: active.region().clone(),
                        distance_m,
                        bitmap: kind,
                        status,
                    });
                }
            }
        }

        events
    }
}

impl Default for GeofenceEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_BOUNDARY_MARGIN_M, DistanceModel::default())
    }
}

/// Move a region to its new classification and report what transition fired
fn advance(
    state: &mut RegionState,
    status: GeofenceStatus,
    responsiveness_ms: u64,
    now_ms: u64,
) -> Option<TransitionMask> {
    state.status = status;

    match status {
        GeofenceStatus::Inside if !state.was_inside => {
            state.was_inside = true;
            state.inside_since_ms = Some(now_ms);
            state.dwell_reported = false;
            Some(TransitionMask::ENTER)
        }
        GeofenceStatus::Inside => {
            let since = *state.inside_since_ms.get_or_insert(now_ms);
            if !state.dwell_reported && now_ms.saturating_sub(since) >= responsiveness_ms {
                state.dwell_reported = true;
                Some(TransitionMask::DWELL)
            } else {
                None
            }
        }
        GeofenceStatus::Outside => {
            let exited = state.was_inside;
            state.was_inside = false;
            state.inside_since_ms = None;
            state.dwell_reported = false;
            exited.then_some(TransitionMask::EXIT)
        }
        GeofenceStatus::Boundary | GeofenceStatus::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EARTH_MEAN_RADIUS_M;
    use crate::geofence::Expiration;
    use proptest::prelude::*;

    /// Fix `distance_m` due north of (0, 0)
    fn fix_at(distance_m: f64) -> Fix {
        Fix::new((distance_m / EARTH_MEAN_RADIUS_M).to_degrees(), 0.0, 0.0)
    }

    fn registry_with(region: GeofenceRegion) -> GeofenceRegistry {
        let mut registry = GeofenceRegistry::new(8);
        registry.configure(vec![region], 0).unwrap();
        registry
    }

    fn origin_region(mask: TransitionMask) -> GeofenceRegion {
        GeofenceRegion::circle("origin", 0.0, 0.0, 100.0)
            .unwrap()
            .with_transitions(mask)
    }

    fn kinds(events: &[TransitionEvent]) -> Vec<TransitionMask> {
        events.iter().map(|e| e.bitmap).collect()
    }

    #[test]
    fn test_classify() {
        let evaluator = GeofenceEvaluator::new(5.0, DistanceModel::GreatCircle);
        assert_eq!(evaluator.classify(50.0, 100.0), GeofenceStatus::Inside);
        assert_eq!(evaluator.classify(96.0, 100.0), GeofenceStatus::Boundary);
        assert_eq!(evaluator.classify(105.0, 100.0), GeofenceStatus::Boundary);
        assert_eq!(evaluator.classify(105.1, 100.0), GeofenceStatus::Outside);
    }

    #[test]
    fn test_enter_then_exit() {
        let evaluator = GeofenceEvaluator::default();
        let mut registry = registry_with(origin_region(TransitionMask::ENTER | TransitionMask::EXIT));

        let step1 = evaluator.evaluate(&fix_at(500.0), &mut registry, 0);
        assert!(step1.is_empty());
        assert_eq!(registry.status_of("origin"), Some(GeofenceStatus::Outside));

        let step2 = evaluator.evaluate(&fix_at(50.0), &mut registry, 1_000);
        assert_eq!(kinds(&step2), vec![TransitionMask::ENTER]);
        assert_eq!(step2[0].status, GeofenceStatus::Inside);
        assert!((step2[0].distance_m - 50.0).abs() < 1e-6);

        let step3 = evaluator.evaluate(&fix_at(500.0), &mut registry, 2_000);
        assert_eq!(kinds(&step3), vec![TransitionMask::EXIT]);
        assert_eq!(step3[0].status, GeofenceStatus::Outside);
    }

    #[test]
    fn test_first_fix_inside_enters() {
        let evaluator = GeofenceEvaluator::default();
        let mut registry = registry_with(origin_region(TransitionMask::ENTER));
        let events = evaluator.evaluate(&fix_at(10.0), &mut registry, 0);
        assert_eq!(kinds(&events), vec![TransitionMask::ENTER]);
    }

    #[test]
    fn test_first_fix_on_boundary_is_baseline() {
        let evaluator = GeofenceEvaluator::default();
        let mut registry = registry_with(origin_region(TransitionMask::ALL));
        assert!(evaluator.evaluate(&fix_at(100.0), &mut registry, 0).is_empty());
        assert_eq!(registry.status_of("origin"), Some(GeofenceStatus::Boundary));
    }

    #[test]
    fn test_boundary_to_inside_enters() {
        let evaluator = GeofenceEvaluator::default();
        let mut registry = registry_with(origin_region(TransitionMask::ENTER));
        evaluator.evaluate(&fix_at(500.0), &mut registry, 0);
        assert!(evaluator.evaluate(&fix_at(101.0), &mut registry, 1).is_empty());
        let events = evaluator.evaluate(&fix_at(20.0), &mut registry, 2);
        assert_eq!(kinds(&events), vec![TransitionMask::ENTER]);
    }

    #[test]
    fn test_boundary_jitter_does_not_reenter() {
        let evaluator = GeofenceEvaluator::default();
        let mut registry = registry_with(origin_region(TransitionMask::ENTER | TransitionMask::EXIT));
        evaluator.evaluate(&fix_at(20.0), &mut registry, 0);

        assert!(evaluator.evaluate(&fix_at(99.0), &mut registry, 1).is_empty());
        assert!(evaluator.evaluate(&fix_at(20.0), &mut registry, 2).is_empty());
        assert!(evaluator.evaluate(&fix_at(102.0), &mut registry, 3).is_empty());

        let events = evaluator.evaluate(&fix_at(300.0), &mut registry, 4);
        assert_eq!(kinds(&events), vec![TransitionMask::EXIT]);
    }

    #[test]
    fn test_outside_boundary_outside_is_silent() {
        let evaluator = GeofenceEvaluator::default();
        let mut registry = registry_with(origin_region(TransitionMask::ALL));
        evaluator.evaluate(&fix_at(500.0), &mut registry, 0);
        assert!(evaluator.evaluate(&fix_at(100.0), &mut registry, 1).is_empty());
        assert!(evaluator.evaluate(&fix_at(500.0), &mut registry, 2).is_empty());
    }

    #[test]
    fn test_dwell_fires_once() {
        let evaluator = GeofenceEvaluator::default();
        let region = origin_region(TransitionMask::DWELL).with_responsiveness_ms(1_000);
        let mut registry = registry_with(region);

        let mut dwell_count = 0;
        for tick in 0..=30u64 {
            let events = evaluator.evaluate(&fix_at(50.0), &mut registry, tick * 100);
            assert!(events.iter().all(|e| e.bitmap == TransitionMask::DWELL));
            if !events.is_empty() {
                assert!(tick * 100 >= 1_000);
            }
            dwell_count += events.len();
        }
        assert_eq!(dwell_count, 1);
    }

    #[test]
    fn test_dwell_rearms_after_exit() {
        let evaluator = GeofenceEvaluator::default();
        let region = origin_region(TransitionMask::ALL).with_responsiveness_ms(500);
        let mut registry = registry_with(region);

        assert_eq!(kinds(&evaluator.evaluate(&fix_at(10.0), &mut registry, 0)), vec![TransitionMask::ENTER]);
        assert_eq!(kinds(&evaluator.evaluate(&fix_at(10.0), &mut registry, 600)), vec![TransitionMask::DWELL]);
        assert_eq!(kinds(&evaluator.evaluate(&fix_at(900.0), &mut registry, 700)), vec![TransitionMask::EXIT]);
        assert_eq!(kinds(&evaluator.evaluate(&fix_at(10.0), &mut registry, 800)), vec![TransitionMask::ENTER]);
        assert!(evaluator.evaluate(&fix_at(10.0), &mut registry, 1_000).is_empty());
        assert_eq!(kinds(&evaluator.evaluate(&fix_at(10.0), &mut registry, 1_300)), vec![TransitionMask::DWELL]);
    }

    #[test]
    fn test_mask_suppresses_but_tracks_state() {
        let evaluator = GeofenceEvaluator::default();
        let mut registry = registry_with(origin_region(TransitionMask::EXIT));

        assert!(evaluator.evaluate(&fix_at(10.0), &mut registry, 0).is_empty());
        assert_eq!(registry.status_of("origin"), Some(GeofenceStatus::Inside));

        let events = evaluator.evaluate(&fix_at(1_000.0), &mut registry, 1);
        assert_eq!(kinds(&events), vec![TransitionMask::EXIT]);
    }

    #[test]
    fn test_invalid_fix_is_ignored() {
        let evaluator = GeofenceEvaluator::default();
        let mut registry = registry_with(origin_region(TransitionMask::ALL));
        assert!(evaluator.evaluate(&Fix::invalid(), &mut registry, 0).is_empty());
        assert_eq!(registry.status_of("origin"), Some(GeofenceStatus::Unknown));
    }

    #[test]
    fn test_expired_region_skipped() {
        let evaluator = GeofenceEvaluator::default();
        let region = origin_region(TransitionMask::ENTER).with_expiration(Expiration::AfterMs(100));
        let mut registry = registry_with(region);

        assert!(evaluator.evaluate(&fix_at(10.0), &mut registry, 100).is_empty());
        assert_eq!(registry.status_of("origin"), Some(GeofenceStatus::Unknown));
    }

    #[test]
    fn test_events_follow_registry_order() {
        let evaluator = GeofenceEvaluator::default();
        let mut registry = GeofenceRegistry::new(8);
        registry
            .configure(
                vec![
                    GeofenceRegion::circle("wide", 0.0, 0.0, 1_000.0).unwrap(),
                    GeofenceRegion::circle("narrow", 0.0, 0.0, 100.0).unwrap(),
                    GeofenceRegion::circle("far", 10.0, 10.0, 100.0).unwrap(),
                ],
                0,
            )
            .unwrap();

        let events = evaluator.evaluate(&fix_at(10.0), &mut registry, 0);
        let ids: Vec<_> = events.iter().map(|e| e.region.id.as_str()).collect();
        assert_eq!(ids, vec!["wide", "narrow"]);
    }

    #[test]
    fn test_empty_registry() {
        let evaluator = GeofenceEvaluator::default();
        let mut registry = GeofenceRegistry::new(8);
        assert!(evaluator.evaluate(&fix_at(0.0), &mut registry, 0).is_empty());
    }

    fn summarize(events: &[TransitionEvent]) -> Vec<(String, u8, GeofenceStatus)> {
        events
            .iter()
            .map(|e| (e.region.id.to_string(), e.bitmap.bits(), e.status))
            .collect()
    }

    proptest! {
        /// Identical registries fed identical fixes produce identical event streams
        #[test]
        fn prop_evaluation_is_deterministic(
            distances in prop::collection::vec(0.0f64..2_000.0, 1..40),
            step_ms in 1u64..2_000,
        ) {
            let evaluator = GeofenceEvaluator::default();
            let regions = vec![
                GeofenceRegion::circle("a", 0.0, 0.0, 100.0).unwrap().with_responsiveness_ms(1_500),
                GeofenceRegion::circle("b", 0.0, 0.0, 800.0).unwrap(),
                GeofenceRegion::circle("c", 0.005, 0.0, 300.0).unwrap(),
            ];
            let mut first = GeofenceRegistry::new(8);
            first.configure(regions.clone(), 0).unwrap();
            let mut second = GeofenceRegistry::new(8);
            second.configure(regions, 0).unwrap();

            for (i, distance) in distances.iter().enumerate() {
                let now = i as u64 * step_ms;
                let a = evaluator.evaluate(&fix_at(*distance), &mut first, now);
                let b = evaluator.evaluate(&fix_at(*distance), &mut second, now);
                prop_assert_eq!(summarize(&a), summarize(&b));
            }
        }
    }
}
