//! Registry of the active geofence set and its per-region evaluation state

use std::collections::HashSet;

use crate::core::{DEFAULT_BOUNDARY_MARGIN_M, DEFAULT_MAX_GEOFENCES};
use crate::geofence::{GeofenceError, GeofenceId, GeofenceRegion, GeofenceStatus};

/// Evaluation state tracked for a single region
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RegionState {
    pub status: GeofenceStatus,
    /// Last settled side was inside; survives boundary excursions
    pub was_inside: bool,
    /// When the current stay inside began
    pub inside_since_ms: Option<u64>,
    /// Dwell already reported for the current stay
    pub dwell_reported: bool,
}

/// A configured region together with its evaluation state
#[derive(Debug, Clone)]
pub struct ActiveRegion {
    region: GeofenceRegion,
    deadline_ms: Option<u64>,
    pub(crate) state: RegionState,
}

impl ActiveRegion {
    pub fn region(&self) -> &GeofenceRegion {
        &self.region
    }

    pub fn status(&self) -> GeofenceStatus {
        self.state.status
    }

    /// Absolute expiry time, if the region expires
    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.deadline_ms.map_or(false, |deadline| now_ms >= deadline)
    }
}

/// A validated region set that has not been installed yet
#[derive(Debug, Clone)]
pub struct StagedGeofences {
    regions: Vec<GeofenceRegion>,
    configured_at_ms: u64,
}

impl StagedGeofences {
    pub fn regions(&self) -> &[GeofenceRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Ordered, capacity-bounded set of active geofences
#[derive(Debug, Clone)]
pub struct GeofenceRegistry {
    capacity: usize,
    boundary_margin_m: f64,
    active: Vec<ActiveRegion>,
}

impl GeofenceRegistry {
    /// Registry accepting regions classified with the default boundary margin
    pub fn new(capacity: usize) -> Self {
        Self::with_boundary_margin(capacity, DEFAULT_BOUNDARY_MARGIN_M)
    }

    /// Registry accepting regions classified with `boundary_margin_m`.
    /// Must match the margin of the evaluator that runs over it.
    pub fn with_boundary_margin(capacity: usize, boundary_margin_m: f64) -> Self {
        Self {
            capacity,
            boundary_margin_m,
            active: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn boundary_margin_m(&self) -> f64 {
        self.boundary_margin_m
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Validate a candidate set without touching the active one
    pub fn stage(&self, regions: Vec<GeofenceRegion>, now_ms: u64) -> Result<StagedGeofences, GeofenceError> {
        if regions.len() > self.capacity {
            return Err(GeofenceError::MaxExceeded {
                requested: regions.len(),
                capacity: self.capacity,
            });
        }

        let mut seen = HashSet::with_capacity(regions.len());
        for region in &regions {
            region.validate()?;
            // Nothing is ever strictly closer than radius - margin
            if region.radius_m <= self.boundary_margin_m {
                return Err(GeofenceError::RadiusWithinMargin {
                    id: region.id.to_string(),
                    radius_m: region.radius_m,
                    margin_m: self.boundary_margin_m,
                });
            }
            if !seen.insert(region.id.as_str()) {
                return Err(GeofenceError::DuplicateId {
                    id: region.id.to_string(),
                });
            }
        }

        let mut staged = Vec::new();
        staged
            .try_reserve_exact(regions.len())
            .map_err(|_| GeofenceError::NoMemory { requested: regions.len() })?;
        staged.extend(regions);

        Ok(StagedGeofences {
            regions: staged,
            configured_at_ms: now_ms,
        })
    }

    /// Replace the active set with a staged one. Every region starts `Unknown`.
    pub fn commit(&mut self, staged: StagedGeofences) {
        let configured_at_ms = staged.configured_at_ms;
        self.active = staged
            .regions
            .into_iter()
            .map(|region| ActiveRegion {
                deadline_ms: region.expiration.deadline_from(configured_at_ms),
                region,
                state: RegionState::default(),
            })
            .collect();
    }

    /// Validate and install in one step; on error the active set is unchanged
    pub fn configure(&mut self, regions: Vec<GeofenceRegion>, now_ms: u64) -> Result<(), GeofenceError> {
        let staged = self.stage(regions, now_ms)?;
        self.commit(staged);
        Ok(())
    }

    /// Regions in configuration order
    pub fn regions(&self) -> impl Iterator<Item = &GeofenceRegion> + '_ {
        self.active.iter().map(ActiveRegion::region)
    }

    pub fn active(&self) -> &[ActiveRegion] {
        &self.active
    }

    pub(crate) fn active_mut(&mut self) -> &mut [ActiveRegion] {
        &mut self.active
    }

    pub fn get(&self, id: &str) -> Option<&ActiveRegion> {
        self.active.iter().find(|active| active.region.id.as_str() == id)
    }

    pub fn status_of(&self, id: &str) -> Option<GeofenceStatus> {
        self.get(id).map(ActiveRegion::status)
    }

    /// Drop regions whose deadline has passed, keeping the order of the rest.
    /// Returns the ids removed.
    pub fn expire_and_prune(&mut self, now_ms: u64) -> Vec<GeofenceId> {
        let mut removed = Vec::new();
        self.active.retain(|active| {
            if active.is_expired(now_ms) {
                removed.push(active.region.id.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Forget every region's classification; regions themselves stay
    pub fn reset_evaluation(&mut self) {
        for active in &mut self.active {
            active.state = RegionState::default();
        }
    }
}

impl Default for GeofenceRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_GEOFENCES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geofence::Expiration;
    use proptest::prelude::*;

    fn region(id: &str) -> GeofenceRegion {
        GeofenceRegion::circle(id, 10.0, 20.0, 100.0).unwrap()
    }

    fn ids(registry: &GeofenceRegistry) -> Vec<String> {
        registry.regions().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn test_configure_preserves_order() {
        let mut registry = GeofenceRegistry::new(4);
        registry.configure(vec![region("c"), region("a"), region("b")], 0).unwrap();
        assert_eq!(ids(&registry), vec!["c", "a", "b"]);
        assert!(registry.active().iter().all(|a| a.status() == GeofenceStatus::Unknown));
    }

    #[test]
    fn test_empty_configuration() {
        let mut registry = GeofenceRegistry::new(4);
        registry.configure(vec![region("a")], 0).unwrap();
        registry.configure(Vec::new(), 0).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_capacity_exceeded_keeps_previous_set() {
        let mut registry = GeofenceRegistry::new(2);
        registry.configure(vec![region("a"), region("b")], 0).unwrap();

        let result = registry.configure(vec![region("x"), region("y"), region("z")], 0);
        assert_eq!(result, Err(GeofenceError::MaxExceeded { requested: 3, capacity: 2 }));
        assert_eq!(ids(&registry), vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_region_keeps_previous_set() {
        let mut registry = GeofenceRegistry::new(4);
        registry.configure(vec![region("a")], 0).unwrap();

        let bad = GeofenceRegion::circle("bad", 0.0, 0.0, -5.0).unwrap();
        let result = registry.configure(vec![region("x"), bad], 0);
        assert!(matches!(result, Err(GeofenceError::InvalidRadius { .. })));
        assert_eq!(ids(&registry), vec!["a"]);
    }

    #[test]
    fn test_radius_within_margin_rejected() {
        let mut registry = GeofenceRegistry::with_boundary_margin(4, 5.0);
        registry.configure(vec![region("a")], 0).unwrap();

        let tiny = GeofenceRegion::circle("tiny", 0.0, 0.0, 4.0).unwrap();
        let result = registry.configure(vec![tiny], 0);
        assert_eq!(
            result,
            Err(GeofenceError::RadiusWithinMargin { id: "tiny".to_string(), radius_m: 4.0, margin_m: 5.0 })
        );
        assert_eq!(ids(&registry), vec!["a"]);

        let edge = GeofenceRegion::circle("edge", 0.0, 0.0, 5.0).unwrap();
        assert!(registry.configure(vec![edge], 0).is_err());

        let smallest = GeofenceRegion::circle("smallest", 0.0, 0.0, 5.5).unwrap();
        assert!(registry.configure(vec![smallest], 0).is_ok());
    }

    #[test]
    fn test_zero_margin_accepts_small_radius() {
        let mut registry = GeofenceRegistry::with_boundary_margin(4, 0.0);
        let tiny = GeofenceRegion::circle("tiny", 0.0, 0.0, 0.5).unwrap();
        assert!(registry.configure(vec![tiny], 0).is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut registry = GeofenceRegistry::new(4);
        let result = registry.configure(vec![region("a"), region("a")], 0);
        assert_eq!(result, Err(GeofenceError::DuplicateId { id: "a".to_string() }));
    }

    #[test]
    fn test_expire_and_prune() {
        let mut registry = GeofenceRegistry::new(4);
        registry
            .configure(
                vec![
                    region("keep1"),
                    region("short").with_expiration(Expiration::AfterMs(1_000)),
                    region("keep2"),
                    region("long").with_expiration(Expiration::AfterMs(5_000)),
                ],
                10_000,
            )
            .unwrap();

        assert!(registry.expire_and_prune(10_999).is_empty());

        let removed = registry.expire_and_prune(11_000);
        assert_eq!(removed, vec![GeofenceId::new("short").unwrap()]);
        assert_eq!(ids(&registry), vec!["keep1", "keep2", "long"]);

        let removed = registry.expire_and_prune(20_000);
        assert_eq!(removed.len(), 1);
        assert_eq!(ids(&registry), vec!["keep1", "keep2"]);
    }

    #[test]
    fn test_reset_evaluation_keeps_regions() {
        let mut registry = GeofenceRegistry::new(4);
        registry.configure(vec![region("a")], 0).unwrap();
        registry.active_mut()[0].state.status = GeofenceStatus::Inside;

        registry.reset_evaluation();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.status_of("a"), Some(GeofenceStatus::Unknown));
    }

    proptest! {
        /// A rejected configuration never disturbs the active set
        #[test]
        fn prop_failed_configure_is_atomic(
            initial in 0usize..=4,
            extra in 1usize..4,
            bad_index in 0usize..4,
        ) {
            let mut registry = GeofenceRegistry::new(4);
            let valid: Vec<_> = (0..initial).map(|i| region(&format!("r{}", i))).collect();
            registry.configure(valid, 0).unwrap();
            let before = ids(&registry);

            // Over capacity
            let too_many: Vec<_> = (0..4 + extra).map(|i| region(&format!("n{}", i))).collect();
            prop_assert!(registry.configure(too_many, 0).is_err());
            prop_assert_eq!(ids(&registry), before.clone());

            // One invalid member
            let mut mixed: Vec<_> = (0..4).map(|i| region(&format!("m{}", i))).collect();
            mixed[bad_index].radius_m = 0.0;
            prop_assert!(registry.configure(mixed, 0).is_err());
            prop_assert_eq!(ids(&registry), before);
        }
    }
}
