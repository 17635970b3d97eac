//! Spatial proximity scoring for reported items.
//!
//! Distances are great-circle distances computed with the haversine
//! formula on a sphere of radius 6371 km. The distance is then mapped onto
//! a proximity score in `[0, 1]` by a fixed piecewise-linear table tuned
//! for "found in the same neighbourhood" matching.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Beyond this distance two reports are considered unrelated.
pub const MAX_SCORED_DISTANCE_KM: f64 = 50.0;

/// A geographical point with latitude and longitude in degrees.
///
/// Coordinates are not range checked. Out-of-range values simply produce
/// large distances and therefore a proximity score of `0.0`. The store only
/// accepts finite coordinates, see [`GeoPoint::is_finite`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new geographical point.
    pub fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }

    /// Whether both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Calculate the Haversine distance to another point in kilometers.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

/// Maps the distance between two reports onto a proximity score.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoScorer;

impl GeoScorer {
    /// Create a new geo scorer.
    pub fn new() -> Self {
        GeoScorer
    }

    /// Proximity score of two optional locations.
    ///
    /// Returns `0.0` when either location is missing.
    pub fn score(&self, a: Option<&GeoPoint>, b: Option<&GeoPoint>) -> f64 {
        match (a, b) {
            (Some(a), Some(b)) => self.score_distance(a.distance_to(b)),
            _ => 0.0,
        }
    }

    /// Proximity score of two known locations.
    pub fn score_points(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        self.score_distance(a.distance_to(b))
    }

    /// Piecewise-linear mapping from a distance in kilometers to a score.
    ///
    /// The score steps down from `1.0` at exactly 100 m to `0.89` just past
    /// it. A NaN distance falls through every band and scores `0.0`.
    pub fn score_distance(&self, distance_km: f64) -> f64 {
        let d = distance_km;
        if d <= 0.1 {
            1.0
        } else if d <= 1.0 {
            0.8 + (1.0 - d) * 0.1
        } else if d <= 10.0 {
            0.5 + (10.0 - d) / 9.0 * 0.3
        } else if d <= MAX_SCORED_DISTANCE_KM {
            0.1 + (MAX_SCORED_DISTANCE_KM - d) / 40.0 * 0.4
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_location_scores_one() {
        let scorer = GeoScorer::new();
        for point in [
            GeoPoint::new(40.7128, -74.0060),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(-89.9, 179.9),
            GeoPoint::new(135.0, 400.0),
        ] {
            assert_eq!(scorer.score(Some(&point), Some(&point)), 1.0);
        }
    }

    #[test]
    fn test_band_boundaries() {
        let scorer = GeoScorer::new();
        assert_eq!(scorer.score_distance(0.0), 1.0);
        assert_eq!(scorer.score_distance(0.1), 1.0);
        assert_eq!(scorer.score_distance(1.0), 0.8);
        assert_eq!(scorer.score_distance(10.0), 0.5);
        assert_eq!(scorer.score_distance(50.0), 0.1);
        assert_eq!(scorer.score_distance(50.0001), 0.0);
        assert_eq!(scorer.score_distance(12_000.0), 0.0);
    }

    #[test]
    fn test_step_just_past_first_band() {
        let scorer = GeoScorer::new();
        let score = scorer.score_distance(0.1 + 1e-9);
        assert!((score - 0.89).abs() < 1e-6);
    }

    #[test]
    fn test_bands_are_monotonic_inside() {
        let scorer = GeoScorer::new();
        let mut previous = scorer.score_distance(0.11);
        let mut d = 0.11;
        while d < 50.0 {
            d += 0.25;
            let score = scorer.score_distance(d);
            assert!(score <= previous + 1e-12);
            previous = score;
        }
    }

    #[test]
    fn test_missing_location_scores_zero() {
        let scorer = GeoScorer::new();
        let point = GeoPoint::new(40.7128, -74.0060);
        assert_eq!(scorer.score(None, Some(&point)), 0.0);
        assert_eq!(scorer.score(Some(&point), None), 0.0);
        assert_eq!(scorer.score(None, None), 0.0);
    }

    #[test]
    fn test_nearby_and_distant_points() {
        let scorer = GeoScorer::new();
        let origin = GeoPoint::new(40.7128, -74.0060);

        // ~500 m north
        let near = GeoPoint::new(40.7173, -74.0060);
        let score = scorer.score_points(&origin, &near);
        assert!((0.8..1.0).contains(&score));

        // ~222 km north
        let far = GeoPoint::new(42.7128, -74.0060);
        assert!(origin.distance_to(&far) > MAX_SCORED_DISTANCE_KM);
        assert_eq!(scorer.score_points(&origin, &far), 0.0);
    }

    #[test]
    fn test_non_finite_coordinates_score_zero() {
        let scorer = GeoScorer::new();
        let origin = GeoPoint::new(40.7128, -74.0060);
        let broken = GeoPoint::new(f64::NAN, 0.0);
        assert_eq!(scorer.score_points(&origin, &broken), 0.0);
    }

    #[test]
    fn test_is_finite() {
        assert!(GeoPoint::new(135.0, 400.0).is_finite());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_finite());
        assert!(!GeoPoint::new(0.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude is ~111.19 km on this sphere.
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        assert!((a.distance_to(&b) - 111.19).abs() < 0.01);
    }
}
