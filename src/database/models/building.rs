use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use super::{allowed_values, Table};
use crate::error::ApiError;
use crate::geo::LatLng;
use crate::validation::Validator;

text_enum! {
    pub enum BuildingType {
        Academic => "Academic",
        Administrative => "Administrative",
        Residential => "Residential",
        Sports => "Sports",
        Library => "Library",
        Laboratory => "Laboratory",
        Other => "Other",
    }
}

impl BuildingType {
    /// Accepts canonical names in any case plus the portal's category vocabulary.
    pub fn from_input(value: &str) -> Option<Self> {
        let key = value.trim().to_lowercase();
        let mapped = match key.as_str() {
            "academic" => BuildingType::Academic,
            "general" | "offices" | "administrative" => BuildingType::Administrative,
            "library" => BuildingType::Library,
            "residential" => BuildingType::Residential,
            "recreational" | "sports" => BuildingType::Sports,
            "laboratory" => BuildingType::Laboratory,
            "food" | "dining" | "parking" | "maintenance" | "other" => BuildingType::Other,
            _ => return None,
        };
        Some(mapped)
    }
}

text_enum! {
    pub enum BuildingStatus {
        Active => "Active",
        UnderConstruction => "Under Construction",
        Maintenance => "Maintenance",
        Inactive => "Inactive",
    }
}

impl BuildingStatus {
    /// Accepts canonical names and `snake_case` aliases in any case.
    pub fn from_input(value: &str) -> Option<Self> {
        let key = value.trim().to_lowercase().replace('_', " ");
        Self::ALL.iter().copied().find(|s| s.as_str().to_lowercase() == key)
    }
}

text_enum! {
    pub enum FacilityType {
        Classroom => "Classroom",
        Laboratory => "Laboratory",
        Office => "Office",
        Auditorium => "Auditorium",
        Library => "Library",
        Cafeteria => "Cafeteria",
        Restroom => "Restroom",
        Other => "Other",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinates> for LatLng {
    fn from(c: Coordinates) -> Self {
        LatLng::new(c.latitude, c.longitude)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingLocation {
    pub coordinates: Coordinates,
    pub address: Option<String>,
    pub campus: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    #[serde(rename = "type")]
    pub facility_type: FacilityType,
    pub floor: i32,
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingImage {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildingAccessibility {
    pub wheelchair_accessible: bool,
    pub elevator_access: bool,
    pub parking_available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingContact {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub manager: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BuildingRow {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub building_type: BuildingType,
    pub floors: i32,
    pub capacity: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub campus: String,
    pub facilities: Json<Vec<Facility>>,
    pub status: BuildingStatus,
    pub year_built: Option<i32>,
    pub description: Option<String>,
    pub images: Json<Vec<BuildingImage>>,
    pub accessibility: Json<BuildingAccessibility>,
    pub contact: Json<BuildingContact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Table for BuildingRow {
    const TABLE: &'static str = "buildings";
}

impl BuildingRow {
    pub fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Building as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub building_type: BuildingType,
    pub floors: i32,
    pub capacity: i32,
    pub location: BuildingLocation,
    pub facilities: Vec<Facility>,
    pub status: BuildingStatus,
    pub year_built: Option<i32>,
    pub description: Option<String>,
    pub images: Vec<BuildingImage>,
    pub accessibility: BuildingAccessibility,
    pub contact: BuildingContact,
    pub total_facilities: usize,
    pub primary_image: Option<BuildingImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Building {
    pub fn with_distance(mut self, meters: f64) -> Self {
        self.distance = Some(meters.round());
        self
    }
}

impl From<BuildingRow> for Building {
    fn from(row: BuildingRow) -> Self {
        let images = row.images.0;
        let facilities = row.facilities.0;
        Self {
            id: row.id,
            name: row.name,
            code: row.code,
            building_type: row.building_type,
            floors: row.floors,
            capacity: row.capacity,
            location: BuildingLocation {
                coordinates: Coordinates { latitude: row.latitude, longitude: row.longitude },
                address: row.address,
                campus: row.campus,
            },
            total_facilities: facilities.len(),
            facilities,
            status: row.status,
            year_built: row.year_built,
            description: row.description,
            primary_image: primary_image(&images).cloned(),
            images,
            accessibility: row.accessibility.0,
            contact: row.contact.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            distance: None,
        }
    }
}

/// The image flagged primary, else the first image.
pub fn primary_image(images: &[BuildingImage]) -> Option<&BuildingImage> {
    images.iter().find(|img| img.is_primary).or_else(|| images.first())
}

/// When several images claim to be primary, only the first image keeps the flag.
pub fn normalize_primary_images(images: &mut [BuildingImage]) {
    if images.iter().filter(|img| img.is_primary).count() > 1 {
        for (index, image) in images.iter_mut().enumerate() {
            image.is_primary = index == 0;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoordinatesInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationInput {
    pub coordinates: Option<CoordinatesInput>,
    pub address: Option<String>,
    pub campus: Option<String>,
}

/// Request body for create and partial update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingInput {
    pub name: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub building_type: Option<String>,
    pub floors: Option<i32>,
    pub capacity: Option<i32>,
    pub location: Option<LocationInput>,
    pub facilities: Option<Vec<Facility>>,
    pub status: Option<String>,
    pub year_built: Option<i32>,
    pub description: Option<String>,
    pub images: Option<Vec<BuildingImage>>,
    pub accessibility: Option<BuildingAccessibility>,
    pub contact: Option<BuildingContact>,
}

/// Normalized building fields ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingDraft {
    pub name: String,
    pub code: String,
    pub building_type: BuildingType,
    pub floors: i32,
    pub capacity: i32,
    pub location: BuildingLocation,
    pub facilities: Vec<Facility>,
    pub status: BuildingStatus,
    pub year_built: Option<i32>,
    pub description: Option<String>,
    pub images: Vec<BuildingImage>,
    pub accessibility: BuildingAccessibility,
    pub contact: BuildingContact,
}

impl BuildingDraft {
    fn blank() -> Self {
        Self {
            name: String::new(),
            code: String::new(),
            building_type: BuildingType::Other,
            floors: 1,
            capacity: 1,
            location: BuildingLocation::default(),
            facilities: vec![],
            status: BuildingStatus::Active,
            year_built: None,
            description: None,
            images: vec![],
            accessibility: BuildingAccessibility::default(),
            contact: BuildingContact::default(),
        }
    }

    /// Validates a create request; every required field must be present.
    pub fn create(input: BuildingInput) -> Result<Self, ApiError> {
        let mut v = Validator::new();
        v.check(input.name.is_some(), "name", "Building name is required");
        v.check(input.code.is_some(), "code", "Building code is required");
        v.check(input.building_type.is_some(), "type", "Building type is required");
        v.check(input.floors.is_some(), "floors", "Number of floors is required");
        v.check(input.capacity.is_some(), "capacity", "Building capacity is required");

        let location = input.location.as_ref();
        let coords = location.and_then(|l| l.coordinates.as_ref());
        v.check(
            coords.and_then(|c| c.latitude).is_some(),
            "location.coordinates.latitude",
            "Latitude is required",
        );
        v.check(
            coords.and_then(|c| c.longitude).is_some(),
            "location.coordinates.longitude",
            "Longitude is required",
        );
        v.check(location.and_then(|l| l.campus.as_ref()).is_some(), "location.campus", "Campus is required");

        let mut draft = Self::blank();
        draft.merge(input, &mut v);
        draft.finish(v)
    }

    /// Applies a partial update on top of the stored record.
    pub fn update(row: &BuildingRow, input: BuildingInput) -> Result<Self, ApiError> {
        let mut v = Validator::new();
        let mut draft = Self::from(row);
        draft.merge(input, &mut v);
        draft.finish(v)
    }

    fn merge(&mut self, input: BuildingInput, v: &mut Validator) {
        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(code) = input.code {
            self.code = code;
        }
        if let Some(raw) = input.building_type {
            match BuildingType::from_input(&raw) {
                Some(t) => self.building_type = t,
                None => v.error(
                    "type",
                    format!("Invalid building type '{}'. Allowed: {}", raw, allowed_values(BuildingType::ALL)),
                ),
            }
        }
        if let Some(floors) = input.floors {
            self.floors = floors;
        }
        if let Some(capacity) = input.capacity {
            self.capacity = capacity;
        }
        if let Some(location) = input.location {
            if let Some(coords) = location.coordinates {
                if let Some(lat) = coords.latitude {
                    self.location.coordinates.latitude = lat;
                }
                if let Some(lng) = coords.longitude {
                    self.location.coordinates.longitude = lng;
                }
            }
            if location.address.is_some() {
                self.location.address = location.address;
            }
            if let Some(campus) = location.campus {
                self.location.campus = campus;
            }
        }
        if let Some(facilities) = input.facilities {
            self.facilities = facilities;
        }
        if let Some(raw) = input.status {
            match BuildingStatus::from_input(&raw) {
                Some(s) => self.status = s,
                None => v.error(
                    "status",
                    format!("Invalid status '{}'. Allowed: {}", raw, allowed_values(BuildingStatus::ALL)),
                ),
            }
        }
        if input.year_built.is_some() {
            self.year_built = input.year_built;
        }
        if input.description.is_some() {
            self.description = input.description;
        }
        if let Some(images) = input.images {
            self.images = images;
        }
        if let Some(accessibility) = input.accessibility {
            self.accessibility = accessibility;
        }
        if let Some(contact) = input.contact {
            self.contact = contact;
        }
    }

    fn finish(mut self, mut v: Validator) -> Result<Self, ApiError> {
        self.normalize();
        self.validate(&mut v);
        v.finish()?;
        Ok(self)
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.code = self.code.trim().to_uppercase();
        self.location.campus = self.location.campus.trim().to_string();
        self.location.address = self.location.address.take().map(|a| a.trim().to_string());
        self.description = self.description.take().map(|d| d.trim().to_string());
        self.contact.email = self.contact.email.take().map(|e| e.trim().to_lowercase());
        normalize_primary_images(&mut self.images);
    }

    fn validate(&self, v: &mut Validator) {
        v.text("name", &self.name, 1, 100);
        v.text("code", &self.code, 1, 10);
        v.range("floors", self.floors, 1, 50);
        v.check(self.capacity >= 1, "capacity", "Capacity must be at least 1");

        let coords = self.location.coordinates;
        if LatLng::checked(coords.latitude, 0.0).is_err() {
            v.error("location.coordinates.latitude", "Latitude must be between -90 and 90");
        }
        if LatLng::checked(0.0, coords.longitude).is_err() {
            v.error("location.coordinates.longitude", "Longitude must be between -180 and 180");
        }
        v.max_len("location.address", self.location.address.as_deref(), 200);
        v.check(!self.location.campus.is_empty(), "location.campus", "Campus is required");

        if let Some(year) = self.year_built {
            v.range("yearBuilt", year, 1900, Utc::now().year());
        }
        v.max_len("description", self.description.as_deref(), 500);

        for (i, facility) in self.facilities.iter().enumerate() {
            v.check(!facility.name.trim().is_empty(), &format!("facilities[{}].name", i), "Facility name is required");
            v.check(facility.floor >= 1, &format!("facilities[{}].floor", i), "Floor must be at least 1");
            if let Some(capacity) = facility.capacity {
                v.check(capacity >= 1, &format!("facilities[{}].capacity", i), "Capacity must be at least 1");
            }
        }
        for (i, image) in self.images.iter().enumerate() {
            v.check(!image.url.trim().is_empty(), &format!("images[{}].url", i), "Image URL is required");
        }
        if let Some(email) = self.contact.email.as_deref() {
            if !email.is_empty() {
                v.email("contact.email", email);
            }
        }
    }
}

impl From<&BuildingRow> for BuildingDraft {
    fn from(row: &BuildingRow) -> Self {
        Self {
            name: row.name.clone(),
            code: row.code.clone(),
            building_type: row.building_type,
            floors: row.floors,
            capacity: row.capacity,
            location: BuildingLocation {
                coordinates: Coordinates { latitude: row.latitude, longitude: row.longitude },
                address: row.address.clone(),
                campus: row.campus.clone(),
            },
            facilities: row.facilities.0.clone(),
            status: row.status,
            year_built: row.year_built,
            description: row.description.clone(),
            images: row.images.0.clone(),
            accessibility: row.accessibility.0.clone(),
            contact: row.contact.0.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> BuildingInput {
        serde_json::from_value(value).unwrap()
    }

    fn valid_body() -> serde_json::Value {
        json!({
            "name": "  Science Block ",
            "code": " sci-01 ",
            "type": "academic",
            "floors": 3,
            "capacity": 400,
            "location": {
                "coordinates": { "latitude": -25.4380, "longitude": 30.9810 },
                "campus": "Mbombela Campus"
            },
            "status": "under_construction",
            "contact": { "email": " Facilities@UMP.ac.za " }
        })
    }

    #[test]
    fn create_normalizes_code_type_and_status() {
        let draft = BuildingDraft::create(input(valid_body())).unwrap();
        assert_eq!(draft.name, "Science Block");
        assert_eq!(draft.code, "SCI-01");
        assert_eq!(draft.building_type, BuildingType::Academic);
        assert_eq!(draft.status, BuildingStatus::UnderConstruction);
        assert_eq!(draft.contact.email.as_deref(), Some("facilities@ump.ac.za"));
    }

    #[test]
    fn create_reports_missing_fields() {
        let err = BuildingDraft::create(input(json!({ "name": "Hall" }))).unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(errors), .. } => {
                assert!(errors.contains_key("code"));
                assert!(errors.contains_key("type"));
                assert!(errors.contains_key("location.coordinates.latitude"));
                assert!(errors.contains_key("location.campus"));
                assert!(!errors.contains_key("name"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn create_rejects_out_of_range_values() {
        let mut body = valid_body();
        body["location"]["coordinates"]["latitude"] = json!(95.0);
        body["floors"] = json!(60);
        body["code"] = json!("ABCDEFGHIJK");
        let err = BuildingDraft::create(input(body)).unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(errors), .. } => {
                assert!(errors.contains_key("location.coordinates.latitude"));
                assert!(errors.contains_key("floors"));
                assert!(errors.contains_key("code"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn type_mapping_covers_portal_vocabulary() {
        assert_eq!(BuildingType::from_input("food"), Some(BuildingType::Other));
        assert_eq!(BuildingType::from_input("offices"), Some(BuildingType::Administrative));
        assert_eq!(BuildingType::from_input("general"), Some(BuildingType::Administrative));
        assert_eq!(BuildingType::from_input("recreational"), Some(BuildingType::Sports));
        assert_eq!(BuildingType::from_input("Laboratory"), Some(BuildingType::Laboratory));
        assert_eq!(BuildingType::from_input("LIBRARY"), Some(BuildingType::Library));
        assert_eq!(BuildingType::from_input("castle"), None);
    }

    #[test]
    fn status_aliases() {
        assert_eq!(BuildingStatus::from_input("active"), Some(BuildingStatus::Active));
        assert_eq!(BuildingStatus::from_input("Under Construction"), Some(BuildingStatus::UnderConstruction));
        assert_eq!(BuildingStatus::from_input("MAINTENANCE"), Some(BuildingStatus::Maintenance));
        assert_eq!(BuildingStatus::from_input("demolished"), None);
    }

    #[test]
    fn only_first_image_stays_primary_when_several_claim_it() {
        let mut images = vec![
            BuildingImage { url: "a.jpg".into(), caption: None, is_primary: false },
            BuildingImage { url: "b.jpg".into(), caption: None, is_primary: true },
            BuildingImage { url: "c.jpg".into(), caption: None, is_primary: true },
        ];
        normalize_primary_images(&mut images);
        let flags: Vec<bool> = images.iter().map(|i| i.is_primary).collect();
        assert_eq!(flags, vec![true, false, false]);

        let mut single = vec![
            BuildingImage { url: "a.jpg".into(), caption: None, is_primary: false },
            BuildingImage { url: "b.jpg".into(), caption: None, is_primary: true },
        ];
        normalize_primary_images(&mut single);
        assert_eq!(primary_image(&single).map(|i| i.url.as_str()), Some("b.jpg"));
    }

    #[test]
    fn primary_image_falls_back_to_first() {
        let images = vec![
            BuildingImage { url: "a.jpg".into(), caption: None, is_primary: false },
            BuildingImage { url: "b.jpg".into(), caption: None, is_primary: false },
        ];
        assert_eq!(primary_image(&images).map(|i| i.url.as_str()), Some("a.jpg"));
        assert!(primary_image(&[]).is_none());
    }
}
