use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};
use sqlx::types::Json;
use uuid::Uuid;

use super::group_counts;
use crate::database::manager::DatabaseError;
use crate::database::models::path::{PathDraft, PathImage, PathRow, PathStatus, PathType, PathUsage};
use crate::database::repository::Repository;
use crate::filter::FilterData;
use crate::geo::NearbyQuery;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStats {
    pub total: i64,
    pub by_type: BTreeMap<String, i64>,
    pub by_campus: BTreeMap<String, i64>,
    pub by_status: BTreeMap<String, i64>,
    pub accessible_paths: i64,
    pub total_distance: f64,
    pub average_popularity: f64,
}

/// Active paths, optionally on one campus, plus extra conditions.
fn active_on(campus: Option<&str>, extra: Value) -> Value {
    let mut clause = Map::new();
    clause.insert("status".into(), json!(PathStatus::Active.as_str()));
    if let Some(campus) = campus {
        clause.insert("campus".into(), json!(campus));
    }
    if let Value::Object(more) = extra {
        clause.extend(more);
    }
    Value::Object(clause)
}

impl Repository<PathRow> {
    pub async fn insert(&self, draft: &PathDraft, created_by: Uuid) -> Result<PathRow, DatabaseError> {
        let row = sqlx::query_as::<_, PathRow>(
            "INSERT INTO paths (name, description, path_type, category, coordinates, start_point, end_point, waypoints,
                                distance, estimated_time, difficulty, accessibility, conditions, status, restrictions,
                                usage, safety, tags, created_by, last_modified_by, is_public, campus)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $19, $20, $21)
             RETURNING *",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.path_type.as_str())
        .bind(draft.category.as_str())
        .bind(Json(&draft.coordinates))
        .bind(Json(&draft.start_point))
        .bind(Json(&draft.end_point))
        .bind(Json(&draft.waypoints))
        .bind(draft.distance)
        .bind(Json(&draft.estimated_time))
        .bind(draft.difficulty.as_str())
        .bind(Json(&draft.accessibility))
        .bind(Json(&draft.conditions))
        .bind(draft.status.as_str())
        .bind(Json(&draft.restrictions))
        .bind(Json(&draft.usage))
        .bind(Json(&draft.safety))
        .bind(&draft.tags)
        .bind(created_by)
        .bind(draft.is_public)
        .bind(&draft.campus)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Rewrites every editable field and bumps the version in the same statement.
    pub async fn update(&self, id: Uuid, draft: &PathDraft, editor: Uuid) -> Result<Option<PathRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PathRow>(
            "UPDATE paths SET
                name = $2, description = $3, path_type = $4, category = $5, coordinates = $6,
                start_point = $7, end_point = $8, waypoints = $9, distance = $10, estimated_time = $11,
                difficulty = $12, accessibility = $13, conditions = $14, status = $15, restrictions = $16,
                usage = $17, safety = $18, tags = $19, is_public = $20, campus = $21,
                last_modified_by = $22, version = version + 1, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.path_type.as_str())
        .bind(draft.category.as_str())
        .bind(Json(&draft.coordinates))
        .bind(Json(&draft.start_point))
        .bind(Json(&draft.end_point))
        .bind(Json(&draft.waypoints))
        .bind(draft.distance)
        .bind(Json(&draft.estimated_time))
        .bind(draft.difficulty.as_str())
        .bind(Json(&draft.accessibility))
        .bind(Json(&draft.conditions))
        .bind(draft.status.as_str())
        .bind(Json(&draft.restrictions))
        .bind(Json(&draft.usage))
        .bind(Json(&draft.safety))
        .bind(&draft.tags)
        .bind(draft.is_public)
        .bind(&draft.campus)
        .bind(editor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn append_image(&self, id: Uuid, image: &PathImage, editor: Uuid) -> Result<Option<PathRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PathRow>(
            "UPDATE paths SET
                images = images || $2, last_modified_by = $3, version = version + 1, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(Json(vec![image]))
        .bind(editor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn set_usage(&self, id: Uuid, usage: &PathUsage, editor: Uuid) -> Result<Option<PathRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PathRow>(
            "UPDATE paths SET
                usage = $2, last_modified_by = $3, version = version + 1, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(Json(usage))
        .bind(editor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Active paths with either endpoint inside the radius, nearest first.
    pub async fn nearby(&self, query: &NearbyQuery, campus: Option<&str>) -> Result<Vec<(PathRow, f64)>, DatabaseError> {
        let bbox = query.bounding_box();
        let lat = json!({ "$between": [bbox.min_lat, bbox.max_lat] });
        let lng = json!({ "$between": [bbox.min_lng, bbox.max_lng] });
        let candidates = self
            .select_any(FilterData {
                where_clause: Some(active_on(
                    campus,
                    json!({
                        "$or": [
                            { "start_lat": lat, "start_lng": lng },
                            { "end_lat": lat, "end_lng": lng },
                        ]
                    }),
                )),
                ..Default::default()
            })
            .await?;

        Ok(query.refine(candidates, PathRow::endpoints))
    }

    pub async fn accessible(&self, campus: Option<&str>, limit: i32) -> Result<Vec<PathRow>, DatabaseError> {
        self.select_any(FilterData {
            where_clause: Some(active_on(campus, json!({ "wheelchair_accessible": true }))),
            order: Some(json!("popularity desc, name asc")),
            limit: Some(limit),
            offset: None,
        })
        .await
    }

    pub async fn popular(&self, campus: Option<&str>, limit: i32) -> Result<Vec<PathRow>, DatabaseError> {
        self.select_any(FilterData {
            where_clause: Some(active_on(campus, Value::Null)),
            order: Some(json!("popularity desc, name asc")),
            limit: Some(limit),
            offset: None,
        })
        .await
    }

    pub async fn of_type(&self, path_type: PathType, campus: Option<&str>) -> Result<Vec<PathRow>, DatabaseError> {
        self.select_any(FilterData {
            where_clause: Some(active_on(campus, json!({ "path_type": path_type.as_str() }))),
            order: Some(json!("name asc")),
            ..Default::default()
        })
        .await
    }

    pub async fn stats(&self) -> Result<PathStats, DatabaseError> {
        let totals = sqlx::query_as::<_, (i64, i64, f64, f64)>(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE wheelchair_accessible),
                    COALESCE(SUM(distance), 0)::float8,
                    COALESCE(AVG(popularity), 0)::float8
             FROM paths",
        )
        .fetch_one(&self.pool);

        let ((total, accessible_paths, total_distance, average_popularity), by_type, by_campus, by_status) = tokio::try_join!(
            async { totals.await.map_err(DatabaseError::from) },
            group_counts(&self.pool, "SELECT path_type, COUNT(*) FROM paths GROUP BY path_type"),
            group_counts(&self.pool, "SELECT campus, COUNT(*) FROM paths GROUP BY campus"),
            group_counts(&self.pool, "SELECT status, COUNT(*) FROM paths GROUP BY status"),
        )?;

        Ok(PathStats {
            total,
            by_type,
            by_campus,
            by_status,
            accessible_paths,
            total_distance,
            average_popularity: (average_popularity * 100.0).round() / 100.0,
        })
    }
}
