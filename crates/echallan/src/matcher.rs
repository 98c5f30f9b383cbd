//! Face-match policy.
//!
//! A linear scan over enrolled descriptors. When nothing is close enough the
//! matcher falls back to a demo driver so the kiosk stays demoable without
//! enrolled faces. A demo fallback looks exactly like a real hit to a UI that
//! only reads `driver` and `distance`; [`MatchKind`] is the only thing that
//! tells them apart.

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::MatchingConfig;
use crate::records::{DriverSummary, FaceDescriptor};

/// How a match was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// An enrolled descriptor was within the threshold.
    Enrolled,
    /// Nothing qualified; the demo driver was substituted.
    DemoFallback,
}

/// Result of a match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceMatch {
    pub driver: DriverSummary,
    pub distance: f32,
    pub kind: MatchKind,
}

/// Matches query descriptors against a fixed list of drivers.
#[derive(Debug, Clone)]
pub struct FaceMatcher {
    drivers: Vec<DriverSummary>,
    threshold: f32,
    demo_distance: f32,
    demo_fallback: bool,
}

impl FaceMatcher {
    /// Build a matcher over `drivers` using the configured policy.
    #[must_use]
    pub fn new(drivers: Vec<DriverSummary>, config: &MatchingConfig) -> Self {
        let enrolled = drivers
            .iter()
            .filter(|d| d.face_descriptor.is_some())
            .count();
        debug!(
            drivers = drivers.len(),
            enrolled, "Face matcher initialized"
        );
        Self {
            drivers,
            threshold: config.threshold,
            demo_distance: config.demo_distance,
            demo_fallback: config.demo_fallback,
        }
    }

    /// Drivers this matcher scans, in scan order.
    #[must_use]
    pub fn drivers(&self) -> &[DriverSummary] {
        &self.drivers
    }

    /// Find the closest enrolled driver, or the demo fallback.
    ///
    /// Returns the first driver with the strictly smallest distance below the
    /// threshold. Otherwise returns the driver named by `demo_driver_id` (or
    /// the first driver if that id is absent or unknown) at the fixed demo
    /// distance. Returns `None` only for an empty driver list, or when the
    /// demo fallback is disabled and nothing qualified.
    #[must_use]
    pub fn find_best_match(
        &self,
        query: &FaceDescriptor,
        demo_driver_id: Option<&str>,
    ) -> Option<FaceMatch> {
        if self.drivers.is_empty() {
            return None;
        }

        if let Some(hit) = self.closest_enrolled(query) {
            return Some(hit);
        }

        if !self.demo_fallback {
            return None;
        }

        let demo = demo_driver_id
            .filter(|id| !id.is_empty())
            .and_then(|id| self.drivers.iter().find(|d| d.id == id))
            .or_else(|| self.drivers.first())?;

        debug!(driver = %demo.id, "No enrolled match, using demo driver");
        Some(FaceMatch {
            driver: demo.clone(),
            distance: self.demo_distance,
            kind: MatchKind::DemoFallback,
        })
    }

    fn closest_enrolled(&self, query: &FaceDescriptor) -> Option<FaceMatch> {
        let mut best: Option<(&DriverSummary, f32)> = None;

        for driver in &self.drivers {
            let Some(descriptor) = &driver.face_descriptor else {
                continue;
            };
            let Some(distance) = query.euclidean_distance(descriptor) else {
                debug!(
                    driver = %driver.id,
                    expected = query.len(),
                    actual = descriptor.len(),
                    "Skipping descriptor with mismatched length"
                );
                continue;
            };
            trace!(driver = %driver.id, distance, "Compared descriptor");

            let closer = best.map_or(true, |(_, d)| distance < d);
            if distance < self.threshold && closer {
                best = Some((driver, distance));
            }
        }

        best.map(|(driver, distance)| FaceMatch {
            driver: driver.clone(),
            distance,
            kind: MatchKind::Enrolled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(id: &str, descriptor: Option<Vec<f32>>) -> DriverSummary {
        DriverSummary {
            id: id.to_string(),
            name: format!("Driver {id}"),
            photo: String::new(),
            face_descriptor: descriptor.map(FaceDescriptor::new),
        }
    }

    fn matcher(drivers: Vec<DriverSummary>) -> FaceMatcher {
        FaceMatcher::new(drivers, &MatchingConfig::default())
    }

    fn origin() -> FaceDescriptor {
        FaceDescriptor::new(vec![0.0, 0.0])
    }

    #[test]
    fn test_closest_qualifying_driver_wins() {
        let m = matcher(vec![
            driver("FAR", Some(vec![0.6, 0.0])),
            driver("NEAR", Some(vec![0.3, 0.0])),
        ]);

        let hit = m.find_best_match(&origin(), None).unwrap();
        assert_eq!(hit.driver.id, "NEAR");
        assert!((hit.distance - 0.3).abs() < 1e-6);
        assert_eq!(hit.kind, MatchKind::Enrolled);
    }

    #[test]
    fn test_empty_driver_list_has_no_match() {
        let m = matcher(Vec::new());
        assert!(m.find_best_match(&origin(), None).is_none());
        assert!(m.find_best_match(&origin(), Some("GJ001")).is_none());
    }

    #[test]
    fn test_no_qualifying_match_falls_back_to_first_driver() {
        let m = matcher(vec![
            driver("GJ001", None),
            driver("GJ002", Some(vec![0.9, 0.0])),
        ]);

        let hit = m.find_best_match(&origin(), None).unwrap();
        assert_eq!(hit.driver.id, "GJ001");
        assert!((hit.distance - 0.35).abs() < f32::EPSILON);
        assert_eq!(hit.kind, MatchKind::DemoFallback);
    }

    #[test]
    fn test_fallback_prefers_selected_demo_driver() {
        let m = matcher(vec![driver("GJ001", None), driver("GJ002", None)]);

        let hit = m.find_best_match(&origin(), Some("GJ002")).unwrap();
        assert_eq!(hit.driver.id, "GJ002");
        assert_eq!(hit.kind, MatchKind::DemoFallback);
    }

    #[test]
    fn test_unknown_demo_driver_uses_first() {
        let m = matcher(vec![driver("GJ001", None), driver("GJ002", None)]);

        let hit = m.find_best_match(&origin(), Some("GJ999")).unwrap();
        assert_eq!(hit.driver.id, "GJ001");

        let hit = m.find_best_match(&origin(), Some("")).unwrap();
        assert_eq!(hit.driver.id, "GJ001");
    }

    #[test]
    fn test_real_match_beats_selected_demo_driver() {
        let m = matcher(vec![
            driver("GJ001", None),
            driver("GJ002", Some(vec![0.1, 0.0])),
        ]);

        let hit = m.find_best_match(&origin(), Some("GJ001")).unwrap();
        assert_eq!(hit.driver.id, "GJ002");
        assert_eq!(hit.kind, MatchKind::Enrolled);
    }

    #[test]
    fn test_threshold_is_strict() {
        let m = matcher(vec![driver("EDGE", Some(vec![0.5, 0.0]))]);

        let hit = m.find_best_match(&origin(), None).unwrap();
        assert_eq!(hit.kind, MatchKind::DemoFallback);
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        let m = matcher(vec![
            driver("FIRST", Some(vec![0.2, 0.0])),
            driver("SECOND", Some(vec![0.0, 0.2])),
        ]);

        let hit = m.find_best_match(&origin(), None).unwrap();
        assert_eq!(hit.driver.id, "FIRST");
    }

    #[test]
    fn test_mismatched_lengths_are_skipped() {
        let m = matcher(vec![
            driver("SHORT", Some(vec![0.0])),
            driver("OK", Some(vec![0.1, 0.1])),
        ]);

        let hit = m.find_best_match(&origin(), None).unwrap();
        assert_eq!(hit.driver.id, "OK");
    }

    #[test]
    fn test_demo_fallback_disabled() {
        let config = MatchingConfig {
            demo_fallback: false,
            ..MatchingConfig::default()
        };
        let m = FaceMatcher::new(vec![driver("GJ001", None)], &config);
        assert!(m.find_best_match(&origin(), None).is_none());
    }

    #[test]
    fn test_match_serializes_kind() {
        let m = matcher(vec![driver("GJ001", None)]);
        let hit = m.find_best_match(&origin(), None).unwrap();
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["kind"], "demo_fallback");
        assert_eq!(json["driver"]["id"], "GJ001");
    }
}
