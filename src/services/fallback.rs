//! Sample payloads served by read endpoints while the store is unreachable.

use chrono::Utc;
use serde_json::{json, Value};

use crate::config;
use crate::database::DatabaseError;

/// True when the error means the store is down and offline data is enabled.
pub fn should_serve(err: &DatabaseError) -> bool {
    if !err.is_unavailable() || !config::config().api.enable_offline_fallback {
        return false;
    }
    tracing::warn!("Serving offline data: {}", err);
    true
}

pub fn buildings() -> Vec<Value> {
    let now = Utc::now();
    vec![
        json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "name": "Main Academic Building",
            "code": "MAB",
            "type": "Academic",
            "description": "Primary academic building with lecture halls and offices",
            "location": {
                "coordinates": { "latitude": -25.4358, "longitude": 30.9816 },
                "address": "Main Campus",
                "campus": "Main Campus"
            },
            "floors": 5,
            "capacity": 2000,
            "facilities": [],
            "status": "Active",
            "totalFacilities": 0,
            "primaryImage": null,
            "createdAt": now,
            "updatedAt": now
        }),
        json!({
            "id": "00000000-0000-0000-0000-000000000002",
            "name": "Student Center",
            "code": "SC",
            "type": "Sports",
            "description": "Student activities and recreational center",
            "location": {
                "coordinates": { "latitude": -25.4361, "longitude": 30.9822 },
                "address": "Main Campus",
                "campus": "Main Campus"
            },
            "floors": 3,
            "capacity": 1000,
            "facilities": [],
            "status": "Active",
            "totalFacilities": 0,
            "primaryImage": null,
            "createdAt": now,
            "updatedAt": now
        }),
    ]
}

pub fn overview(time_range: &str) -> Value {
    let now = Utc::now();
    json!({
        "totals": { "buildings": 15, "users": 250, "paths": 45, "campuses": 1 },
        "recent": { "buildings": 3, "users": 12, "paths": 5, "timeRange": time_range },
        "growth": { "buildings": 0, "users": 0, "paths": 0 },
        "breakdown": {
            "buildingsByType": { "Academic": 8, "Administrative": 4, "Sports": 3 },
            "usersByRole": { "student": 180, "staff": 50, "admin": 20 },
            "pathsByType": {
                "walking": { "count": 25, "totalDistance": 0, "avgPopularity": 0 },
                "cycling": { "count": 15, "totalDistance": 0, "avgPopularity": 0 },
                "vehicle": { "count": 5, "totalDistance": 0, "avgPopularity": 0 }
            }
        },
        "campusStats": [],
        "popularPaths": [
            { "id": "1", "name": "Main Campus Walk", "type": "walking", "popularity": 9.5, "distance": 0, "campus": "Main Campus" },
            { "id": "2", "name": "Library Route", "type": "walking", "popularity": 8.8, "distance": 0, "campus": "Main Campus" }
        ],
        "recentActivity": [
            { "id": "1", "type": "building_created", "name": "New Library Wing", "details": "Library", "createdAt": now },
            { "id": "2", "type": "user_registered", "name": "Sample User", "details": "student", "createdAt": now }
        ]
    })
}

pub fn quick_stats(campus: Option<&str>) -> Value {
    json!({
        "buildings": {
            "total": 15,
            "newest": { "name": "New Academic Building", "createdAt": Utc::now() }
        },
        "users": { "total": 250 },
        "paths": {
            "total": 45,
            "active": 42,
            "mostPopular": { "name": "Main Campus Walk", "popularity": 9.5 }
        },
        "campus": campus.unwrap_or("all")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_buildings_use_api_shape() {
        let sample = buildings();
        assert_eq!(sample.len(), 2);
        assert!(sample.iter().all(|b| b["location"]["campus"].is_string() && b["code"].is_string()));
    }

    #[test]
    fn quick_stats_echo_campus() {
        assert_eq!(quick_stats(None)["campus"], json!("all"));
        assert_eq!(quick_stats(Some("Mbombela"))["campus"], json!("Mbombela"));
    }

    #[test]
    fn only_unavailable_errors_fall_back() {
        assert!(!should_serve(&DatabaseError::NotFound("x".into())));
    }
}
