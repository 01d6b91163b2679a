use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;
use sqlx::types::Json;
use uuid::Uuid;

use super::group_counts;
use crate::database::manager::DatabaseError;
use crate::database::models::building::{BuildingDraft, BuildingRow, BuildingStatus};
use crate::database::repository::Repository;
use crate::filter::FilterData;
use crate::geo::NearbyQuery;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingStats {
    pub total: i64,
    pub by_type: BTreeMap<String, i64>,
    pub by_campus: BTreeMap<String, i64>,
    pub by_status: BTreeMap<String, i64>,
}

impl Repository<BuildingRow> {
    pub async fn insert(&self, draft: &BuildingDraft) -> Result<BuildingRow, DatabaseError> {
        let row = sqlx::query_as::<_, BuildingRow>(
            "INSERT INTO buildings (name, code, building_type, floors, capacity, latitude, longitude, address, campus,
                                    facilities, status, year_built, description, images, accessibility, contact)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING *",
        )
        .bind(&draft.name)
        .bind(&draft.code)
        .bind(draft.building_type.as_str())
        .bind(draft.floors)
        .bind(draft.capacity)
        .bind(draft.location.coordinates.latitude)
        .bind(draft.location.coordinates.longitude)
        .bind(&draft.location.address)
        .bind(&draft.location.campus)
        .bind(Json(&draft.facilities))
        .bind(draft.status.as_str())
        .bind(draft.year_built)
        .bind(&draft.description)
        .bind(Json(&draft.images))
        .bind(Json(&draft.accessibility))
        .bind(Json(&draft.contact))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, draft: &BuildingDraft) -> Result<Option<BuildingRow>, DatabaseError> {
        let row = sqlx::query_as::<_, BuildingRow>(
            "UPDATE buildings SET
                name = $2, code = $3, building_type = $4, floors = $5, capacity = $6,
                latitude = $7, longitude = $8, address = $9, campus = $10, facilities = $11,
                status = $12, year_built = $13, description = $14, images = $15,
                accessibility = $16, contact = $17, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.code)
        .bind(draft.building_type.as_str())
        .bind(draft.floors)
        .bind(draft.capacity)
        .bind(draft.location.coordinates.latitude)
        .bind(draft.location.coordinates.longitude)
        .bind(&draft.location.address)
        .bind(&draft.location.campus)
        .bind(Json(&draft.facilities))
        .bind(draft.status.as_str())
        .bind(draft.year_built)
        .bind(&draft.description)
        .bind(Json(&draft.images))
        .bind(Json(&draft.accessibility))
        .bind(Json(&draft.contact))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Active buildings within the radius, nearest first.
    pub async fn nearby(&self, query: &NearbyQuery) -> Result<Vec<(BuildingRow, f64)>, DatabaseError> {
        let bbox = query.bounding_box();
        let candidates = self
            .select_any(FilterData {
                where_clause: Some(json!({
                    "latitude": { "$between": [bbox.min_lat, bbox.max_lat] },
                    "longitude": { "$between": [bbox.min_lng, bbox.max_lng] },
                    "status": BuildingStatus::Active.as_str(),
                })),
                ..Default::default()
            })
            .await?;

        Ok(query.refine(candidates, |row| vec![row.location()]))
    }

    pub async fn stats(&self) -> Result<BuildingStats, DatabaseError> {
        let (total, by_type, by_campus, by_status) = tokio::try_join!(
            self.count(FilterData::default()),
            group_counts(&self.pool, "SELECT building_type, COUNT(*) FROM buildings GROUP BY building_type"),
            group_counts(&self.pool, "SELECT campus, COUNT(*) FROM buildings GROUP BY campus"),
            group_counts(&self.pool, "SELECT status, COUNT(*) FROM buildings GROUP BY status"),
        )?;
        Ok(BuildingStats { total, by_type, by_campus, by_status })
    }
}
