//! Geospatial path metrics.
//!
//! Great-circle distances, per-mode travel time estimates and the bounding
//! box used to prefilter nearby searches before exact refinement.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude used by the bounding-box prefilter.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

pub const WALKING_M_PER_MIN: f64 = 83.33;
pub const CYCLING_M_PER_MIN: f64 = 250.0;
pub const DRIVING_M_PER_MIN: f64 = 500.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid radius: {0} (must be a non-negative number of meters)")]
    InvalidRadius(f64),

    #[error("Radius {radius} exceeds the maximum of {max} meters")]
    RadiusTooLarge { radius: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a point, rejecting NaN and out-of-range coordinates.
    pub fn checked(lat: f64, lng: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::InvalidLatitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::InvalidLongitude(lng));
        }
        Ok(Self { lat, lng })
    }

    pub fn is_valid(&self) -> bool {
        Self::checked(self.lat, self.lng).is_ok()
    }

    /// Unrounded great-circle distance in meters.
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        haversine(*self, *other)
    }
}

/// Great-circle distance between two points in meters.
pub fn haversine(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h slightly outside [0, 1] for coincident or antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Total length of an ordered point sequence, rounded to the nearest meter.
pub fn path_distance(points: &[LatLng]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .windows(2)
        .map(|pair| haversine(pair[0], pair[1]))
        .sum::<f64>()
        .round()
}

/// Estimated travel minutes per mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelTime {
    pub walking: u32,
    pub cycling: u32,
    pub driving: u32,
}

impl TravelTime {
    pub fn estimate(distance_m: f64) -> Self {
        Self {
            walking: minutes_at(distance_m, WALKING_M_PER_MIN),
            cycling: minutes_at(distance_m, CYCLING_M_PER_MIN),
            driving: minutes_at(distance_m, DRIVING_M_PER_MIN),
        }
    }
}

fn minutes_at(distance_m: f64, meters_per_minute: f64) -> u32 {
    if !distance_m.is_finite() || distance_m <= 0.0 {
        return 0;
    }
    (distance_m / meters_per_minute).ceil() as u32
}

pub fn walking_minutes(distance_m: f64) -> u32 {
    minutes_at(distance_m, WALKING_M_PER_MIN)
}

/// Fills in distance and travel times that the caller did not supply.
///
/// A supplied value is anything greater than zero. Distance is derived only
/// when the path has at least two coordinates; each travel time is then
/// derived from the resulting distance.
pub fn derive_path_metrics(coordinates: &[LatLng], distance: f64, supplied: TravelTime) -> (f64, TravelTime) {
    let distance = if distance > 0.0 {
        distance
    } else if coordinates.len() >= 2 {
        path_distance(coordinates)
    } else {
        0.0
    };

    let estimate = TravelTime::estimate(distance);
    let time = TravelTime {
        walking: if supplied.walking > 0 { supplied.walking } else { estimate.walking },
        cycling: if supplied.cycling > 0 { supplied.cycling } else { estimate.cycling },
        driving: if supplied.driving > 0 { supplied.driving } else { estimate.driving },
    };

    (distance, time)
}

/// Equirectangular bounding box around a point.
///
/// Accuracy degrades pole-ward and with large radii since a degree of
/// longitude shrinks with cos(latitude). The box is only a prefilter; exact
/// membership is decided by [`within_radius`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn around(center: LatLng, radius_m: f64) -> Self {
        let lat_delta = radius_m / METERS_PER_DEGREE;
        let cos_lat = center.lat.to_radians().cos();

        let (min_lng, max_lng) = if cos_lat.abs() < 1e-9 {
            (-180.0, 180.0)
        } else {
            let lng_delta = radius_m / (METERS_PER_DEGREE * cos_lat.abs());
            let (lo, hi) = (center.lng - lng_delta, center.lng + lng_delta);
            // A window crossing the antimeridian widens to the full range
            if lo < -180.0 || hi > 180.0 {
                (-180.0, 180.0)
            } else {
                (lo, hi)
            }
        };

        Self {
            min_lat: (center.lat - lat_delta).max(-90.0),
            max_lat: (center.lat + lat_delta).min(90.0),
            min_lng,
            max_lng,
        }
    }

    pub fn contains(&self, point: LatLng) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat) && (self.min_lng..=self.max_lng).contains(&point.lng)
    }
}

pub fn within_radius(center: LatLng, point: LatLng, radius_m: f64) -> bool {
    haversine(center, point) <= radius_m
}

/// Validated input of a nearby search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    pub center: LatLng,
    pub radius_m: f64,
    pub limit: usize,
}

impl NearbyQuery {
    pub fn new(lat: f64, lng: f64, radius_m: f64, limit: usize) -> Result<Self, GeoError> {
        let center = LatLng::checked(lat, lng)?;
        if !radius_m.is_finite() || radius_m < 0.0 {
            return Err(GeoError::InvalidRadius(radius_m));
        }
        Ok(Self { center, radius_m, limit })
    }

    /// Rejects searches wider than `max_radius_m`.
    pub fn capped(self, max_radius_m: f64) -> Result<Self, GeoError> {
        if self.radius_m > max_radius_m {
            return Err(GeoError::RadiusTooLarge {
                radius: self.radius_m,
                max: max_radius_m,
            });
        }
        Ok(self)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.center, self.radius_m)
    }

    /// Keeps candidates inside the radius, nearest first, truncated to the limit.
    ///
    /// `locate` yields every point of a candidate that may match; the
    /// candidate's distance is the smallest of them.
    pub fn refine<T, F>(&self, candidates: Vec<T>, locate: F) -> Vec<(T, f64)>
    where
        F: Fn(&T) -> Vec<LatLng>,
    {
        let mut matches: Vec<(T, f64)> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let nearest = locate(&candidate)
                    .into_iter()
                    .map(|point| haversine(self.center, point))
                    .fold(f64::INFINITY, f64::min);
                (nearest <= self.radius_m).then_some((candidate, nearest))
            })
            .collect();

        matches.sort_by(|a, b| a.1.total_cmp(&b.1));
        matches.truncate(self.limit);
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_of_short_sequences_is_zero() {
        assert_eq!(path_distance(&[]), 0.0);
        assert_eq!(path_distance(&[LatLng::new(-25.4, 30.9)]), 0.0);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = path_distance(&[LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)]);
        assert!((d - 111_195.0).abs() <= 1.0, "got {}", d);
    }

    #[test]
    fn distance_is_symmetric_under_reversal() {
        let mut points = vec![
            LatLng::new(-25.4380, 30.9810),
            LatLng::new(-25.4392, 30.9825),
            LatLng::new(-25.4401, 30.9840),
            LatLng::new(-25.4415, 30.9838),
        ];
        let forward = path_distance(&points);
        points.reverse();
        assert_eq!(forward, path_distance(&points));
        assert!(forward > 0.0);
    }

    #[test]
    fn coincident_and_antipodal_points_are_finite() {
        let p = LatLng::new(12.5, -45.0);
        assert_eq!(haversine(p, p), 0.0);

        let d = haversine(LatLng::new(0.0, 0.0), LatLng::new(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);

        let poles = haversine(LatLng::new(90.0, 0.0), LatLng::new(-90.0, 0.0));
        assert!(poles.is_finite());
    }

    #[test]
    fn distance_rounds_to_nearest_meter() {
        let d = path_distance(&[LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.0001)]);
        assert_eq!(d, d.round());
        assert_eq!(d, 11.0);
    }

    #[test]
    fn walking_time_matches_reference_values() {
        assert_eq!(walking_minutes(0.0), 0);
        assert_eq!(walking_minutes(8333.0), 100);
        assert_eq!(walking_minutes(1.0), 1);
    }

    #[test]
    fn travel_time_uses_ceiling_per_mode() {
        let t = TravelTime::estimate(1000.0);
        assert_eq!(t, TravelTime { walking: 13, cycling: 4, driving: 2 });
        assert_eq!(TravelTime::estimate(0.0), TravelTime::default());
        assert_eq!(TravelTime::estimate(-5.0), TravelTime::default());
    }

    #[test]
    fn derive_fills_only_missing_values() {
        let coords = [LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)];

        let (distance, time) = derive_path_metrics(&coords, 0.0, TravelTime::default());
        assert_eq!(distance, path_distance(&coords));
        assert_eq!(time, TravelTime::estimate(distance));

        let supplied = TravelTime { walking: 7, cycling: 0, driving: 0 };
        let (distance, time) = derive_path_metrics(&coords, 2500.0, supplied);
        assert_eq!(distance, 2500.0);
        assert_eq!(time.walking, 7);
        assert_eq!(time.cycling, 10);
        assert_eq!(time.driving, 5);
    }

    #[test]
    fn derive_without_coordinates_keeps_zero_distance() {
        let (distance, time) = derive_path_metrics(&[LatLng::new(1.0, 1.0)], 0.0, TravelTime::default());
        assert_eq!(distance, 0.0);
        assert_eq!(time, TravelTime::default());
    }

    #[test]
    fn checked_rejects_out_of_range() {
        assert_eq!(LatLng::checked(91.0, 0.0), Err(GeoError::InvalidLatitude(91.0)));
        assert_eq!(LatLng::checked(0.0, -180.5), Err(GeoError::InvalidLongitude(-180.5)));
        assert!(LatLng::checked(f64::NAN, 0.0).is_err());
        assert!(LatLng::checked(-90.0, 180.0).is_ok());
    }

    #[test]
    fn bounding_box_contains_points_on_radius() {
        let center = LatLng::new(-25.44, 30.98);
        let bbox = BoundingBox::around(center, 1000.0);
        // 900 m due north and due east are inside the box
        assert!(bbox.contains(LatLng::new(center.lat + 900.0 / METERS_PER_DEGREE, center.lng)));
        let east = 900.0 / (METERS_PER_DEGREE * center.lat.to_radians().cos());
        assert!(bbox.contains(LatLng::new(center.lat, center.lng + east)));
        assert!(!bbox.contains(LatLng::new(center.lat + 0.05, center.lng)));
    }

    #[test]
    fn bounding_box_widens_at_pole_and_antimeridian() {
        let polar = BoundingBox::around(LatLng::new(90.0, 10.0), 500.0);
        assert_eq!((polar.min_lng, polar.max_lng), (-180.0, 180.0));
        assert_eq!(polar.max_lat, 90.0);

        let dateline = BoundingBox::around(LatLng::new(0.0, 179.999), 5000.0);
        assert_eq!((dateline.min_lng, dateline.max_lng), (-180.0, 180.0));
    }

    #[test]
    fn zero_radius_matches_only_exact_coordinates() {
        let query = NearbyQuery::new(-25.44, 30.98, 0.0, 10).unwrap();
        let candidates = vec![LatLng::new(-25.44, 30.98), LatLng::new(-25.44, 30.980001)];
        let matches = query.refine(candidates, |p| vec![*p]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, LatLng::new(-25.44, 30.98));
        assert_eq!(matches[0].1, 0.0);
    }

    #[test]
    fn refine_sorts_by_nearest_point_and_truncates() {
        let query = NearbyQuery::new(0.0, 0.0, 5000.0, 2).unwrap();
        let candidates = vec![
            ("far", vec![LatLng::new(0.0, 0.04)]),
            ("near-end", vec![LatLng::new(1.0, 1.0), LatLng::new(0.0, 0.001)]),
            ("mid", vec![LatLng::new(0.0, 0.02)]),
            ("outside", vec![LatLng::new(0.0, 0.1)]),
        ];
        let matches = query.refine(candidates, |(_, points)| points.clone());
        let names: Vec<&str> = matches.iter().map(|((name, _), _)| *name).collect();
        assert_eq!(names, vec!["near-end", "mid"]);
    }

    #[test]
    fn nearby_query_rejects_negative_radius() {
        assert_eq!(NearbyQuery::new(0.0, 0.0, -1.0, 10), Err(GeoError::InvalidRadius(-1.0)));
    }

    #[test]
    fn nearby_query_caps_radius() {
        let query = NearbyQuery::new(0.0, 0.0, 60_000.0, 10).unwrap();
        assert_eq!(
            query.capped(50_000.0),
            Err(GeoError::RadiusTooLarge { radius: 60_000.0, max: 50_000.0 })
        );
        assert!(NearbyQuery::new(0.0, 0.0, 50_000.0, 10).unwrap().capped(50_000.0).is_ok());
    }
}
