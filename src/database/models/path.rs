use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use super::{allowed_values, Table};
use crate::error::ApiError;
use crate::geo::{derive_path_metrics, LatLng, TravelTime};
use crate::validation::Validator;

text_enum! {
    pub enum PathType {
        Walking => "walking",
        Cycling => "cycling",
        Vehicle => "vehicle",
        Emergency => "emergency",
        Accessible => "accessible",
        Shuttle => "shuttle",
    }
}

text_enum! {
    pub enum PathCategory {
        Main => "main",
        Secondary => "secondary",
        Shortcut => "shortcut",
        Scenic => "scenic",
        Emergency => "emergency",
    }
}

text_enum! {
    pub enum PathStatus {
        Active => "active",
        Inactive => "inactive",
        UnderConstruction => "under_construction",
        Closed => "closed",
        Maintenance => "maintenance",
    }
}

text_enum! {
    pub enum Difficulty {
        Easy => "easy",
        Moderate => "moderate",
        Difficult => "difficult",
    }
}

text_enum! {
    pub enum Surface {
        Paved => "paved",
        Gravel => "gravel",
        Dirt => "dirt",
        Grass => "grass",
        Concrete => "concrete",
        Brick => "brick",
    }
}

text_enum! {
    pub enum LightingLevel {
        Excellent => "excellent",
        Good => "good",
        Fair => "fair",
        Poor => "poor",
        Unlit => "none",
    }
}

text_enum! {
    pub enum Condition {
        Excellent => "excellent",
        Good => "good",
        Fair => "fair",
        Poor => "poor",
    }
}

text_enum! {
    pub enum WaypointType {
        Landmark => "landmark",
        Intersection => "intersection",
        RestArea => "rest_area",
        Parking => "parking",
        Entrance => "entrance",
        Exit => "exit",
    }
}

text_enum! {
    pub enum Weekday {
        Monday => "monday",
        Tuesday => "tuesday",
        Wednesday => "wednesday",
        Thursday => "thursday",
        Friday => "friday",
        Saturday => "saturday",
        Sunday => "sunday",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl PathPoint {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub name: String,
    #[serde(default)]
    pub building_id: Option<Uuid>,
    pub coordinates: LatLng,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(default)]
    pub name: Option<String>,
    pub coordinates: LatLng,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default = "default_waypoint_type")]
    pub waypoint_type: WaypointType,
}

fn default_waypoint_type() -> WaypointType {
    WaypointType::Landmark
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathAccessibility {
    pub wheelchair_accessible: bool,
    pub visually_impaired_friendly: bool,
    pub hearing_impaired_friendly: bool,
    pub elevator_access: bool,
    pub ramp_access: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConditions {
    pub surface: Surface,
    pub lighting: LightingLevel,
    pub shelter: bool,
    pub maintenance: Condition,
}

impl Default for PathConditions {
    fn default() -> Self {
        Self {
            surface: Surface::Paved,
            lighting: LightingLevel::Good,
            shelter: false,
            maintenance: Condition::Good,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRestriction {
    pub day_of_week: Weekday,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub restricted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleRestrictions {
    pub cars: bool,
    pub motorcycles: bool,
    pub bicycles: bool,
    pub pedestrians: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialRestriction {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathRestrictions {
    pub time_restrictions: Vec<TimeRestriction>,
    pub vehicle_restrictions: VehicleRestrictions,
    pub special_restrictions: Vec<SpecialRestriction>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AverageUsers {
    pub daily: i64,
    pub weekly: i64,
    pub monthly: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakHour {
    pub hour: i32,
    #[serde(default)]
    pub usage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathUsage {
    pub popularity: f64,
    pub average_users: AverageUsers,
    pub peak_hours: Vec<PeakHour>,
}

impl Default for PathUsage {
    fn default() -> Self {
        Self {
            popularity: 5.0,
            average_users: AverageUsers::default(),
            peak_hours: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyFeature {
    pub coordinates: LatLng,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathSafety {
    pub emergency_phones: Vec<SafetyFeature>,
    pub security_cameras: Vec<SafetyFeature>,
    pub lighting: Condition,
    pub safety_rating: i32,
}

impl Default for PathSafety {
    fn default() -> Self {
        Self {
            emergency_phones: vec![],
            security_cameras: vec![],
            lighting: Condition::Good,
            safety_rating: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathImage {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PathRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub path_type: PathType,
    pub category: PathCategory,
    pub coordinates: Json<Vec<PathPoint>>,
    pub start_point: Json<Endpoint>,
    pub end_point: Json<Endpoint>,
    pub waypoints: Json<Vec<Waypoint>>,
    pub distance: f64,
    pub estimated_time: Json<TravelTime>,
    pub difficulty: Difficulty,
    pub accessibility: Json<PathAccessibility>,
    pub conditions: Json<PathConditions>,
    pub status: PathStatus,
    pub restrictions: Json<PathRestrictions>,
    pub usage: Json<PathUsage>,
    pub safety: Json<PathSafety>,
    pub images: Json<Vec<PathImage>>,
    pub tags: Vec<String>,
    pub created_by: Uuid,
    pub last_modified_by: Option<Uuid>,
    pub version: i32,
    pub is_public: bool,
    pub campus: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Table for PathRow {
    const TABLE: &'static str = "paths";
}

impl PathRow {
    pub fn endpoints(&self) -> Vec<LatLng> {
        vec![self.start_point.0.coordinates, self.end_point.0.coordinates]
    }
}

/// Path as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Path {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub path_type: PathType,
    pub category: PathCategory,
    pub coordinates: Vec<PathPoint>,
    pub start_point: Endpoint,
    pub end_point: Endpoint,
    pub waypoints: Vec<Waypoint>,
    pub distance: f64,
    pub estimated_time: TravelTime,
    pub difficulty: Difficulty,
    pub accessibility: PathAccessibility,
    pub conditions: PathConditions,
    pub status: PathStatus,
    pub restrictions: PathRestrictions,
    pub usage: PathUsage,
    pub safety: PathSafety,
    pub images: Vec<PathImage>,
    pub tags: Vec<String>,
    pub created_by: Uuid,
    pub last_modified_by: Option<Uuid>,
    pub version: i32,
    pub is_public: bool,
    pub campus: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_query: Option<f64>,
}

impl Path {
    pub fn with_query_distance(mut self, meters: f64) -> Self {
        self.distance_from_query = Some(meters.round());
        self
    }
}

impl From<PathRow> for Path {
    fn from(row: PathRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            path_type: row.path_type,
            category: row.category,
            coordinates: row.coordinates.0,
            start_point: row.start_point.0,
            end_point: row.end_point.0,
            waypoints: row.waypoints.0,
            distance: row.distance,
            estimated_time: row.estimated_time.0,
            difficulty: row.difficulty,
            accessibility: row.accessibility.0,
            conditions: row.conditions.0,
            status: row.status,
            restrictions: row.restrictions.0,
            usage: row.usage.0,
            safety: row.safety.0,
            images: row.images.0,
            tags: row.tags,
            created_by: row.created_by,
            last_modified_by: row.last_modified_by,
            version: row.version,
            is_public: row.is_public,
            campus: row.campus,
            created_at: row.created_at,
            updated_at: row.updated_at,
            distance_from_query: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PointInput {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointInput {
    pub name: Option<String>,
    pub building_id: Option<Uuid>,
    pub coordinates: Option<PointInput>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstimatedTimeInput {
    pub walking: Option<i64>,
    pub cycling: Option<i64>,
    pub driving: Option<i64>,
}

/// Request body for create and partial update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub path_type: Option<String>,
    pub category: Option<String>,
    pub coordinates: Option<Vec<PathPoint>>,
    pub start_point: Option<EndpointInput>,
    pub end_point: Option<EndpointInput>,
    pub waypoints: Option<Vec<Waypoint>>,
    pub distance: Option<f64>,
    pub estimated_time: Option<EstimatedTimeInput>,
    pub difficulty: Option<String>,
    pub accessibility: Option<PathAccessibility>,
    pub conditions: Option<PathConditions>,
    pub status: Option<String>,
    pub restrictions: Option<PathRestrictions>,
    pub usage: Option<PathUsage>,
    pub safety: Option<PathSafety>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
    pub campus: Option<String>,
}

/// Body of `PUT /paths/:id/usage`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageInput {
    pub popularity: Option<f64>,
    pub average_users: Option<AverageUsersInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AverageUsersInput {
    pub daily: Option<i64>,
    pub weekly: Option<i64>,
    pub monthly: Option<i64>,
}

impl UsageInput {
    /// Applies the supplied counters to the stored usage block.
    pub fn apply(self, usage: &mut PathUsage) -> Result<(), ApiError> {
        let mut v = Validator::new();
        if let Some(popularity) = self.popularity {
            v.check(
                popularity.is_finite() && (0.0..=10.0).contains(&popularity),
                "popularity",
                "Popularity must be between 0 and 10",
            );
            usage.popularity = popularity;
        }
        if let Some(users) = self.average_users {
            if let Some(daily) = users.daily {
                v.check(daily >= 0, "averageUsers.daily", "Daily users must be a non-negative integer");
                usage.average_users.daily = daily;
            }
            if let Some(weekly) = users.weekly {
                v.check(weekly >= 0, "averageUsers.weekly", "Weekly users must be a non-negative integer");
                usage.average_users.weekly = weekly;
            }
            if let Some(monthly) = users.monthly {
                v.check(monthly >= 0, "averageUsers.monthly", "Monthly users must be a non-negative integer");
                usage.average_users.monthly = monthly;
            }
        }
        v.finish()
    }
}

/// Body of `POST /paths/:id/images`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageInput {
    pub url: Option<String>,
    pub caption: Option<String>,
}

impl ImageInput {
    pub fn into_image(self, uploaded_by: Uuid) -> Result<PathImage, ApiError> {
        let url = self.url.map(|u| u.trim().to_string()).unwrap_or_default();
        let mut v = Validator::new();
        v.check(!url.is_empty(), "url", "Image URL is required");
        v.max_len("caption", self.caption.as_deref(), 200);
        v.finish()?;
        Ok(PathImage {
            url,
            caption: self.caption,
            uploaded_by: Some(uploaded_by),
            uploaded_at: Utc::now(),
        })
    }
}

/// Normalized path fields ready to persist, with derived metrics applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PathDraft {
    pub name: String,
    pub description: Option<String>,
    pub path_type: PathType,
    pub category: PathCategory,
    pub coordinates: Vec<PathPoint>,
    pub start_point: Endpoint,
    pub end_point: Endpoint,
    pub waypoints: Vec<Waypoint>,
    pub distance: f64,
    pub estimated_time: TravelTime,
    pub difficulty: Difficulty,
    pub accessibility: PathAccessibility,
    pub conditions: PathConditions,
    pub status: PathStatus,
    pub restrictions: PathRestrictions,
    pub usage: PathUsage,
    pub safety: PathSafety,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub campus: String,
}

fn blank_endpoint() -> Endpoint {
    Endpoint {
        name: String::new(),
        building_id: None,
        coordinates: LatLng::new(0.0, 0.0),
        description: None,
    }
}

impl PathDraft {
    fn blank() -> Self {
        Self {
            name: String::new(),
            description: None,
            path_type: PathType::Walking,
            category: PathCategory::Main,
            coordinates: vec![],
            start_point: blank_endpoint(),
            end_point: blank_endpoint(),
            waypoints: vec![],
            distance: 0.0,
            estimated_time: TravelTime::default(),
            difficulty: Difficulty::Easy,
            accessibility: PathAccessibility::default(),
            conditions: PathConditions::default(),
            status: PathStatus::Active,
            restrictions: PathRestrictions::default(),
            usage: PathUsage::default(),
            safety: PathSafety::default(),
            tags: vec![],
            is_public: true,
            campus: String::new(),
        }
    }

    /// Validates a create request and derives the missing metrics.
    pub fn create(input: PathInput) -> Result<Self, ApiError> {
        let mut v = Validator::new();
        v.check(input.name.is_some(), "name", "Path name is required");
        v.check(input.path_type.is_some(), "type", "Invalid path type");
        v.check(input.coordinates.is_some(), "coordinates", "Path must have at least 2 coordinate points");
        v.check(input.campus.is_some(), "campus", "Campus is required");
        for (field, endpoint) in [("startPoint", &input.start_point), ("endPoint", &input.end_point)] {
            let ep = endpoint.as_ref();
            v.check(ep.and_then(|e| e.name.as_ref()).is_some(), &format!("{}.name", field), "Point name is required");
            let coords = ep.and_then(|e| e.coordinates.as_ref());
            v.check(
                coords.and_then(|c| c.lat).is_some(),
                &format!("{}.coordinates.lat", field),
                "Latitude is required",
            );
            v.check(
                coords.and_then(|c| c.lng).is_some(),
                &format!("{}.coordinates.lng", field),
                "Longitude is required",
            );
        }

        let mut draft = Self::blank();
        draft.merge(input, &mut v);
        draft.finish(v)
    }

    /// Applies a partial update on top of the stored record.
    ///
    /// Changing the coordinates without a new distance re-derives the
    /// distance and every travel time not supplied in the same request.
    pub fn update(row: &PathRow, input: PathInput) -> Result<Self, ApiError> {
        let mut v = Validator::new();
        let mut draft = Self::from(row);

        let geometry_changed = input.coordinates.as_ref().is_some_and(|coords| {
            coords.len() != draft.coordinates.len()
                || coords.iter().zip(&draft.coordinates).any(|(a, b)| a.position() != b.position())
        });
        let distance_supplied = input.distance.is_some_and(|d| d > 0.0);
        let supplied_time = input.estimated_time.clone().unwrap_or_default();

        if (geometry_changed && !distance_supplied) || distance_supplied {
            if !distance_supplied {
                draft.distance = 0.0;
            }
            if supplied_time.walking.is_none() {
                draft.estimated_time.walking = 0;
            }
            if supplied_time.cycling.is_none() {
                draft.estimated_time.cycling = 0;
            }
            if supplied_time.driving.is_none() {
                draft.estimated_time.driving = 0;
            }
        }

        draft.merge(input, &mut v);
        draft.finish(v)
    }

    fn merge(&mut self, input: PathInput, v: &mut Validator) {
        if let Some(name) = input.name {
            self.name = name;
        }
        if input.description.is_some() {
            self.description = input.description;
        }
        if let Some(raw) = input.path_type {
            match raw.trim().parse::<PathType>() {
                Ok(t) => self.path_type = t,
                Err(_) => v.error("type", format!("Invalid path type. Allowed: {}", allowed_values(PathType::ALL))),
            }
        }
        if let Some(raw) = input.category {
            match raw.trim().parse::<PathCategory>() {
                Ok(c) => self.category = c,
                Err(_) => v.error("category", format!("Invalid category. Allowed: {}", allowed_values(PathCategory::ALL))),
            }
        }
        if let Some(coordinates) = input.coordinates {
            self.coordinates = coordinates;
        }
        if let Some(ep) = input.start_point {
            merge_endpoint(&mut self.start_point, ep);
        }
        if let Some(ep) = input.end_point {
            merge_endpoint(&mut self.end_point, ep);
        }
        if let Some(waypoints) = input.waypoints {
            self.waypoints = waypoints;
        }
        if let Some(distance) = input.distance {
            if distance.is_finite() && distance >= 0.0 {
                self.distance = distance;
            } else {
                v.error("distance", "Distance cannot be negative");
            }
        }
        if let Some(time) = input.estimated_time {
            for (field, value, slot) in [
                ("estimatedTime.walking", time.walking, &mut self.estimated_time.walking),
                ("estimatedTime.cycling", time.cycling, &mut self.estimated_time.cycling),
                ("estimatedTime.driving", time.driving, &mut self.estimated_time.driving),
            ] {
                if let Some(minutes) = value {
                    match u32::try_from(minutes) {
                        Ok(m) => *slot = m,
                        Err(_) => v.error(field, "Travel time cannot be negative"),
                    }
                }
            }
        }
        if let Some(raw) = input.difficulty {
            match raw.trim().parse::<Difficulty>() {
                Ok(d) => self.difficulty = d,
                Err(_) => v.error("difficulty", format!("Invalid difficulty. Allowed: {}", allowed_values(Difficulty::ALL))),
            }
        }
        if let Some(accessibility) = input.accessibility {
            self.accessibility = accessibility;
        }
        if let Some(conditions) = input.conditions {
            self.conditions = conditions;
        }
        if let Some(raw) = input.status {
            match raw.trim().parse::<PathStatus>() {
                Ok(s) => self.status = s,
                Err(_) => v.error("status", format!("Invalid status. Allowed: {}", allowed_values(PathStatus::ALL))),
            }
        }
        if let Some(restrictions) = input.restrictions {
            self.restrictions = restrictions;
        }
        if let Some(usage) = input.usage {
            self.usage = usage;
        }
        if let Some(safety) = input.safety {
            self.safety = safety;
        }
        if let Some(tags) = input.tags {
            self.tags = tags;
        }
        if let Some(is_public) = input.is_public {
            self.is_public = is_public;
        }
        if let Some(campus) = input.campus {
            self.campus = campus;
        }
    }

    fn finish(mut self, mut v: Validator) -> Result<Self, ApiError> {
        self.normalize();
        self.validate(&mut v);
        v.finish()?;
        self.apply_derived_metrics();
        Ok(self)
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.campus = self.campus.trim().to_string();
        self.description = self.description.take().map(|d| d.trim().to_string());
        self.start_point.name = self.start_point.name.trim().to_string();
        self.end_point.name = self.end_point.name.trim().to_string();

        // First occurrence wins
        let mut seen = HashSet::new();
        self.tags = self
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();

        let now = Utc::now();
        for point in &mut self.coordinates {
            point.timestamp.get_or_insert(now);
        }
    }

    fn validate(&self, v: &mut Validator) {
        v.text("name", &self.name, 1, 100);
        v.max_len("description", self.description.as_deref(), 500);
        v.check(!self.campus.is_empty(), "campus", "Campus is required");

        v.check(
            self.coordinates.len() >= 2,
            "coordinates",
            "Path must have at least 2 coordinate points",
        );
        for (i, point) in self.coordinates.iter().enumerate() {
            check_point(v, &format!("coordinates[{}]", i), point.position());
        }

        for (field, endpoint) in [("startPoint", &self.start_point), ("endPoint", &self.end_point)] {
            v.check(!endpoint.name.is_empty(), &format!("{}.name", field), "Point name is required");
            check_point(v, &format!("{}.coordinates", field), endpoint.coordinates);
        }
        for (i, waypoint) in self.waypoints.iter().enumerate() {
            check_point(v, &format!("waypoints[{}].coordinates", i), waypoint.coordinates);
        }

        let popularity = self.usage.popularity;
        v.check(
            popularity.is_finite() && (0.0..=10.0).contains(&popularity),
            "usage.popularity",
            "Popularity must be between 0 and 10",
        );
        v.check(
            self.usage.average_users.daily >= 0
                && self.usage.average_users.weekly >= 0
                && self.usage.average_users.monthly >= 0,
            "usage.averageUsers",
            "Average users cannot be negative",
        );
        for (i, peak) in self.usage.peak_hours.iter().enumerate() {
            v.range(&format!("usage.peakHours[{}].hour", i), peak.hour, 0, 23);
        }
        v.range("safety.safetyRating", self.safety.safety_rating, 1, 5);

        for (i, restriction) in self.restrictions.time_restrictions.iter().enumerate() {
            v.check(
                is_clock_time(&restriction.start_time) && is_clock_time(&restriction.end_time),
                &format!("restrictions.timeRestrictions[{}]", i),
                "Times must use the HH:MM format",
            );
        }
    }

    /// Fills in distance and travel times that were not supplied.
    fn apply_derived_metrics(&mut self) {
        let positions: Vec<LatLng> = self.coordinates.iter().map(PathPoint::position).collect();
        let (distance, time) = derive_path_metrics(&positions, self.distance, self.estimated_time);
        self.distance = distance;
        self.estimated_time = time;
    }
}

impl From<&PathRow> for PathDraft {
    fn from(row: &PathRow) -> Self {
        Self {
            name: row.name.clone(),
            description: row.description.clone(),
            path_type: row.path_type,
            category: row.category,
            coordinates: row.coordinates.0.clone(),
            start_point: row.start_point.0.clone(),
            end_point: row.end_point.0.clone(),
            waypoints: row.waypoints.0.clone(),
            distance: row.distance,
            estimated_time: row.estimated_time.0,
            difficulty: row.difficulty,
            accessibility: row.accessibility.0.clone(),
            conditions: row.conditions.0.clone(),
            status: row.status,
            restrictions: row.restrictions.0.clone(),
            usage: row.usage.0.clone(),
            safety: row.safety.0.clone(),
            tags: row.tags.clone(),
            is_public: row.is_public,
            campus: row.campus.clone(),
        }
    }
}

fn merge_endpoint(target: &mut Endpoint, input: EndpointInput) {
    if let Some(name) = input.name {
        target.name = name;
    }
    if input.building_id.is_some() {
        target.building_id = input.building_id;
    }
    if let Some(coords) = input.coordinates {
        if let Some(lat) = coords.lat {
            target.coordinates.lat = lat;
        }
        if let Some(lng) = coords.lng {
            target.coordinates.lng = lng;
        }
    }
    if input.description.is_some() {
        target.description = input.description;
    }
}

fn check_point(v: &mut Validator, field: &str, point: LatLng) {
    if LatLng::checked(point.lat, 0.0).is_err() {
        v.error(format!("{}.lat", field), "Latitude must be between -90 and 90");
    }
    if LatLng::checked(0.0, point.lng).is_err() {
        v.error(format!("{}.lng", field), "Longitude must be between -180 and 180");
    }
}

fn is_clock_time(value: &str) -> bool {
    let Some((h, m)) = value.split_once(':') else {
        return false;
    };
    h.len() == 2
        && m.len() == 2
        && h.parse::<u8>().is_ok_and(|h| h < 24)
        && m.parse::<u8>().is_ok_and(|m| m < 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> PathInput {
        serde_json::from_value(value).unwrap()
    }

    fn valid_body() -> serde_json::Value {
        json!({
            "name": " Library Walk ",
            "type": "walking",
            "coordinates": [
                { "lat": 0.0, "lng": 0.0 },
                { "lat": 0.0, "lng": 0.01 }
            ],
            "startPoint": { "name": "Library", "coordinates": { "lat": 0.0, "lng": 0.0 } },
            "endPoint": { "name": "Hall", "coordinates": { "lat": 0.0, "lng": 0.01 } },
            "tags": [" Shaded ", "QUIET", "shaded", "", "quiet"],
            "campus": "Main Campus"
        })
    }

    fn stored(draft: &PathDraft) -> PathRow {
        let now = Utc::now();
        PathRow {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            path_type: draft.path_type,
            category: draft.category,
            coordinates: Json(draft.coordinates.clone()),
            start_point: Json(draft.start_point.clone()),
            end_point: Json(draft.end_point.clone()),
            waypoints: Json(draft.waypoints.clone()),
            distance: draft.distance,
            estimated_time: Json(draft.estimated_time),
            difficulty: draft.difficulty,
            accessibility: Json(draft.accessibility.clone()),
            conditions: Json(draft.conditions.clone()),
            status: draft.status,
            restrictions: Json(draft.restrictions.clone()),
            usage: Json(draft.usage.clone()),
            safety: Json(draft.safety.clone()),
            images: Json(vec![]),
            tags: draft.tags.clone(),
            created_by: Uuid::new_v4(),
            last_modified_by: None,
            version: 1,
            is_public: draft.is_public,
            campus: draft.campus.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn create_derives_distance_and_times() {
        let draft = PathDraft::create(input(valid_body())).unwrap();
        assert_eq!(draft.name, "Library Walk");
        assert_eq!(draft.distance, 1112.0);
        assert_eq!(draft.estimated_time, TravelTime::estimate(1112.0));
        assert_eq!(draft.tags, vec!["shaded".to_string(), "quiet".to_string()]);
        assert!(draft.coordinates.iter().all(|p| p.timestamp.is_some()));
        assert_eq!(draft.usage.popularity, 5.0);
        assert_eq!(draft.safety.safety_rating, 3);
    }

    #[test]
    fn create_keeps_supplied_metrics() {
        let mut body = valid_body();
        body["distance"] = json!(1500.0);
        body["estimatedTime"] = json!({ "walking": 25 });
        let draft = PathDraft::create(input(body)).unwrap();
        assert_eq!(draft.distance, 1500.0);
        assert_eq!(draft.estimated_time.walking, 25);
        assert_eq!(draft.estimated_time.cycling, 6);
        assert_eq!(draft.estimated_time.driving, 3);
    }

    #[test]
    fn create_requires_two_coordinates() {
        let mut body = valid_body();
        body["coordinates"] = json!([{ "lat": 0.0, "lng": 0.0 }]);
        let err = PathDraft::create(input(body)).unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(errors), .. } => {
                assert!(errors.contains_key("coordinates"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn create_rejects_unknown_type_and_bad_points() {
        let mut body = valid_body();
        body["type"] = json!("teleport");
        body["endPoint"]["coordinates"]["lat"] = json!(120.0);
        let err = PathDraft::create(input(body)).unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(errors), .. } => {
                assert!(errors.contains_key("type"));
                assert!(errors.contains_key("endPoint.coordinates.lat"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn update_rederives_when_coordinates_change() {
        let original = PathDraft::create(input(valid_body())).unwrap();
        let row = stored(&original);

        let patch = input(json!({
            "coordinates": [
                { "lat": 0.0, "lng": 0.0 },
                { "lat": 0.0, "lng": 0.02 }
            ],
            "estimatedTime": { "cycling": 99 }
        }));
        let updated = PathDraft::update(&row, patch).unwrap();
        assert_eq!(updated.distance, 2224.0);
        assert_eq!(updated.estimated_time.walking, TravelTime::estimate(2224.0).walking);
        assert_eq!(updated.estimated_time.cycling, 99);
    }

    #[test]
    fn update_without_geometry_keeps_metrics() {
        let original = PathDraft::create(input(valid_body())).unwrap();
        let row = stored(&original);

        let updated = PathDraft::update(&row, input(json!({ "status": "closed" }))).unwrap();
        assert_eq!(updated.status, PathStatus::Closed);
        assert_eq!(updated.distance, original.distance);
        assert_eq!(updated.estimated_time, original.estimated_time);
    }

    #[test]
    fn usage_update_validates_ranges() {
        let mut usage = PathUsage::default();
        let ok: UsageInput = serde_json::from_value(json!({ "popularity": 8.5, "averageUsers": { "daily": 40 } })).unwrap();
        ok.apply(&mut usage).unwrap();
        assert_eq!(usage.popularity, 8.5);
        assert_eq!(usage.average_users.daily, 40);

        let bad: UsageInput = serde_json::from_value(json!({ "popularity": 11 })).unwrap();
        assert!(bad.apply(&mut usage).is_err());
    }

    #[test]
    fn clock_time_format() {
        assert!(is_clock_time("07:30"));
        assert!(is_clock_time("23:59"));
        assert!(!is_clock_time("24:00"));
        assert!(!is_clock_time("7:30"));
        assert!(!is_clock_time("07-30"));
    }
}
