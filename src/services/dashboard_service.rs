use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{BuildingStatus, PathStatus, UserStatus};
use crate::error::ApiError;

/// Look-back window for overview counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::Quarter => "90d",
            TimeRange::Year => "1y",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            TimeRange::Week => Duration::days(7),
            TimeRange::Month => Duration::days(30),
            TimeRange::Quarter => Duration::days(90),
            TimeRange::Year => Duration::days(365),
        }
    }
}

impl FromStr for TimeRange {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(TimeRange::Week),
            "30d" => Ok(TimeRange::Month),
            "90d" => Ok(TimeRange::Quarter),
            "1y" => Ok(TimeRange::Year),
            _ => Err(ApiError::field("timeRange", "Invalid time range")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Buildings,
    Users,
    Paths,
    Usage,
    All,
}

impl Metric {
    fn includes(&self, other: Metric) -> bool {
        *self == Metric::All || *self == other
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Buildings => "buildings",
            Metric::Users => "users",
            Metric::Paths => "paths",
            Metric::Usage => "usage",
            Metric::All => "all",
        }
    }
}

impl FromStr for Metric {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buildings" => Ok(Metric::Buildings),
            "users" => Ok(Metric::Users),
            "paths" => Ok(Metric::Paths),
            "usage" => Ok(Metric::Usage),
            "all" => Ok(Metric::All),
            _ => Err(ApiError::field("metric", "Invalid metric")),
        }
    }
}

/// Bucket size for analytics series; doubles as the `date_trunc` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }

    fn trunc_field(&self) -> &'static str {
        match self {
            Period::Daily => "day",
            Period::Weekly => "week",
            Period::Monthly => "month",
        }
    }
}

impl FromStr for Period {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            _ => Err(ApiError::field("period", "Invalid period")),
        }
    }
}

/// Percent change from the previous window, rounded. A previous count of zero
/// reports 100 when anything was added and 0 otherwise.
pub fn growth(current: i64, previous: i64) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    (((current - previous) as f64 / previous as f64) * 100.0).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Buildings,
    Users,
    Paths,
}

impl Collection {
    fn table(&self) -> &'static str {
        match self {
            Collection::Buildings => "buildings",
            Collection::Users => "users",
            Collection::Paths => "paths",
        }
    }

    fn active_status(&self) -> &'static str {
        match self {
            Collection::Buildings => BuildingStatus::Active.as_str(),
            Collection::Users => UserStatus::Active.as_str(),
            Collection::Paths => PathStatus::Active.as_str(),
        }
    }

    /// Users are not tied to a campus.
    fn campus_clause(&self) -> &'static str {
        match self {
            Collection::Users => "($2::text IS NULL OR TRUE)",
            _ => "($2::text IS NULL OR campus = $2)",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Totals {
    pub buildings: i64,
    pub users: i64,
    pub paths: i64,
    pub campuses: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recent {
    pub buildings: i64,
    pub users: i64,
    pub paths: i64,
    pub time_range: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Growth {
    pub buildings: i64,
    pub users: i64,
    pub paths: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathTypeSummary {
    pub count: i64,
    pub total_distance: f64,
    pub avg_popularity: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub buildings_by_type: BTreeMap<String, i64>,
    pub users_by_role: BTreeMap<String, i64>,
    pub paths_by_type: BTreeMap<String, PathTypeSummary>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CampusStat {
    pub campus: String,
    pub buildings: i64,
    pub paths: i64,
    pub total_distance: f64,
    pub building_types: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PopularPath {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub path_type: String,
    pub popularity: f64,
    pub distance: f64,
    pub campus: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub name: String,
    pub details: String,
    pub campus: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub totals: Totals,
    pub recent: Recent,
    pub growth: Growth,
    pub breakdown: Breakdown,
    pub campus_stats: Vec<CampusStat>,
    pub popular_paths: Vec<PopularPath>,
    pub recent_activity: Vec<Activity>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub bucket: DateTime<Utc>,
    pub count: i64,
    pub kinds: Vec<String>,
    pub total_distance: Option<f64>,
    pub avg_popularity: Option<f64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    #[serde(rename = "type")]
    pub path_type: String,
    pub total_paths: i64,
    pub total_distance: f64,
    pub avg_popularity: f64,
    pub total_daily_users: i64,
    pub total_weekly_users: i64,
    pub total_monthly_users: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buildings: Option<Vec<SeriesPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<SeriesPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<SeriesPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Vec<UsageSummary>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analytics {
    pub metric: &'static str,
    pub period: &'static str,
    pub campus: String,
    pub analytics: AnalyticsSeries,
}

#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionCounts {
    pub buildings: i64,
    pub users: i64,
    pub paths: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub status: &'static str,
    pub database: &'static str,
    pub collections: CollectionCounts,
    pub issues: Vec<Issue>,
    pub last_checked: DateTime<Utc>,
    pub uptime: u64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Newest {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MostPopular {
    pub name: String,
    pub popularity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildingWidget {
    pub total: i64,
    pub newest: Option<Newest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserWidget {
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathWidget {
    pub total: i64,
    pub active: i64,
    pub most_popular: Option<MostPopular>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickStats {
    pub buildings: BuildingWidget,
    pub users: UserWidget,
    pub paths: PathWidget,
    pub campus: String,
}

/// Health findings from collection counts.
pub fn health_issues(counts: &CollectionCounts, inactive_buildings: i64, suspended_users: i64) -> Vec<Issue> {
    let mut issues = Vec::new();
    if counts.buildings == 0 {
        issues.push(Issue { kind: "warning", message: "No buildings found in database".to_string() });
    }
    if counts.users == 0 {
        issues.push(Issue { kind: "warning", message: "No users found in database".to_string() });
    }
    if inactive_buildings as f64 > counts.buildings as f64 * 0.1 {
        issues.push(Issue {
            kind: "warning",
            message: format!("High number of inactive buildings: {}", inactive_buildings),
        });
    }
    if suspended_users as f64 > counts.users as f64 * 0.05 {
        issues.push(Issue {
            kind: "warning",
            message: format!("High number of suspended users: {}", suspended_users),
        });
    }
    issues
}

/// Read-only aggregates behind the dashboard routes.
pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active records of one collection, optionally limited to a campus and a
    /// `[from, to)` creation window.
    async fn count_active(
        &self,
        collection: Collection,
        campus: Option<&str>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, DatabaseError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE status = $1 AND {}
               AND ($3::timestamptz IS NULL OR created_at >= $3)
               AND ($4::timestamptz IS NULL OR created_at < $4)",
            collection.table(),
            collection.campus_clause()
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(collection.active_status())
            .bind(campus)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn active_group_counts(
        &self,
        collection: Collection,
        column: &str,
        campus: Option<&str>,
    ) -> Result<BTreeMap<String, i64>, DatabaseError> {
        let sql = format!(
            "SELECT {col}, COUNT(*) FROM {table} WHERE status = $1 AND {campus} GROUP BY {col}",
            col = column,
            table = collection.table(),
            campus = collection.campus_clause()
        );
        let rows = sqlx::query_as::<_, (String, i64)>(&sql)
            .bind(collection.active_status())
            .bind(campus)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn paths_by_type(&self, campus: Option<&str>) -> Result<BTreeMap<String, PathTypeSummary>, DatabaseError> {
        let rows = sqlx::query_as::<_, (String, i64, f64, f64)>(
            "SELECT path_type, COUNT(*), COALESCE(SUM(distance), 0), COALESCE(AVG(popularity), 0)
             FROM paths WHERE status = $1 AND ($2::text IS NULL OR campus = $2)
             GROUP BY path_type",
        )
        .bind(PathStatus::Active.as_str())
        .bind(campus)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(kind, count, total_distance, avg)| {
                let summary = PathTypeSummary {
                    count,
                    total_distance,
                    avg_popularity: (avg * 10.0).round() / 10.0,
                };
                (kind, summary)
            })
            .collect())
    }

    async fn campus_stats(&self) -> Result<Vec<CampusStat>, DatabaseError> {
        let rows = sqlx::query_as::<_, CampusStat>(
            "SELECT b.campus,
                    COUNT(*) AS buildings,
                    COALESCE(p.paths, 0) AS paths,
                    COALESCE(p.total_distance, 0) AS total_distance,
                    COUNT(DISTINCT b.building_type) AS building_types
             FROM buildings b
             LEFT JOIN (
                 SELECT campus, COUNT(*) AS paths, SUM(distance) AS total_distance FROM paths GROUP BY campus
             ) p ON p.campus = b.campus
             WHERE b.status = $1
             GROUP BY b.campus, p.paths, p.total_distance
             ORDER BY buildings DESC",
        )
        .bind(BuildingStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn popular_paths(&self, campus: Option<&str>, limit: i64) -> Result<Vec<PopularPath>, DatabaseError> {
        let rows = sqlx::query_as::<_, PopularPath>(
            "SELECT id, name, path_type, popularity, distance, campus
             FROM paths WHERE status = $1 AND ($2::text IS NULL OR campus = $2)
             ORDER BY popularity DESC LIMIT $3",
        )
        .bind(PathStatus::Active.as_str())
        .bind(campus)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Newest buildings, paths and users since `since`, latest first.
    async fn recent_activity(&self, campus: Option<&str>, since: DateTime<Utc>) -> Result<Vec<Activity>, DatabaseError> {
        let rows = sqlx::query_as::<_, Activity>(
            "(SELECT id, 'building_created' AS activity_type, name, building_type AS details, campus,
                     created_at, NULL::uuid AS created_by
              FROM buildings WHERE status = $1 AND ($4::text IS NULL OR campus = $4) AND created_at >= $5
              ORDER BY created_at DESC LIMIT 5)
             UNION ALL
             (SELECT id, 'path_created', name, path_type, campus, created_at, created_by
              FROM paths WHERE status = $2 AND ($4::text IS NULL OR campus = $4) AND created_at >= $5
              ORDER BY created_at DESC LIMIT 5)
             UNION ALL
             (SELECT id, 'user_registered', first_name || ' ' || last_name, role, NULL, created_at, NULL
              FROM users WHERE status = $3 AND created_at >= $5
              ORDER BY created_at DESC LIMIT 5)
             ORDER BY created_at DESC
             LIMIT 10",
        )
        .bind(BuildingStatus::Active.as_str())
        .bind(PathStatus::Active.as_str())
        .bind(UserStatus::Active.as_str())
        .bind(campus)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn overview(&self, campus: Option<&str>, range: TimeRange) -> Result<Overview, DatabaseError> {
        let now = Utc::now();
        let start = now - range.duration();
        let previous_start = start - range.duration();

        let (buildings, users, paths) = tokio::try_join!(
            self.count_active(Collection::Buildings, campus, None, None),
            self.count_active(Collection::Users, campus, None, None),
            self.count_active(Collection::Paths, campus, None, None),
        )?;
        let (recent_buildings, recent_users, recent_paths) = tokio::try_join!(
            self.count_active(Collection::Buildings, campus, Some(start), None),
            self.count_active(Collection::Users, campus, Some(start), None),
            self.count_active(Collection::Paths, campus, Some(start), None),
        )?;
        let (prev_buildings, prev_users, prev_paths) = tokio::try_join!(
            self.count_active(Collection::Buildings, campus, Some(previous_start), Some(start)),
            self.count_active(Collection::Users, campus, Some(previous_start), Some(start)),
            self.count_active(Collection::Paths, campus, Some(previous_start), Some(start)),
        )?;
        let (buildings_by_type, users_by_role, paths_by_type) = tokio::try_join!(
            self.active_group_counts(Collection::Buildings, "building_type", campus),
            self.active_group_counts(Collection::Users, "role", campus),
            self.paths_by_type(campus),
        )?;
        let campus_stats = match campus {
            Some(_) => Vec::new(),
            None => self.campus_stats().await?,
        };
        let (popular_paths, recent_activity) = tokio::try_join!(
            self.popular_paths(campus, 5),
            self.recent_activity(campus, start),
        )?;

        Ok(Overview {
            totals: Totals {
                buildings,
                users,
                paths,
                campuses: if campus.is_some() { 1 } else { campus_stats.len() as i64 },
            },
            recent: Recent {
                buildings: recent_buildings,
                users: recent_users,
                paths: recent_paths,
                time_range: range.as_str(),
            },
            growth: Growth {
                buildings: growth(recent_buildings, prev_buildings),
                users: growth(recent_users, prev_users),
                paths: growth(recent_paths, prev_paths),
            },
            breakdown: Breakdown { buildings_by_type, users_by_role, paths_by_type },
            campus_stats,
            popular_paths,
            recent_activity,
        })
    }

    async fn series(
        &self,
        collection: Collection,
        kind_column: &str,
        period: Period,
        campus: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<Vec<SeriesPoint>, DatabaseError> {
        let (distance, popularity) = match collection {
            Collection::Paths => ("SUM(distance)", "AVG(popularity)"),
            _ => ("NULL::double precision", "NULL::double precision"),
        };
        let sql = format!(
            "SELECT date_trunc($1, created_at) AS bucket, COUNT(*) AS count,
                    array_agg(DISTINCT {kind}) AS kinds,
                    {distance} AS total_distance, {popularity} AS avg_popularity
             FROM {table}
             WHERE created_at >= $2 AND {campus}
             GROUP BY bucket ORDER BY bucket",
            kind = kind_column,
            distance = distance,
            popularity = popularity,
            table = collection.table(),
            campus = collection.campus_clause().replace("$2", "$3"),
        );
        let rows = sqlx::query_as::<_, SeriesPoint>(&sql)
            .bind(period.trunc_field())
            .bind(since)
            .bind(campus)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn usage(&self, campus: Option<&str>) -> Result<Vec<UsageSummary>, DatabaseError> {
        let rows = sqlx::query_as::<_, UsageSummary>(
            "SELECT path_type,
                    COUNT(*) AS total_paths,
                    COALESCE(SUM(distance), 0) AS total_distance,
                    COALESCE(AVG(popularity), 0) AS avg_popularity,
                    COALESCE(SUM((usage -> 'averageUsers' ->> 'daily')::bigint), 0)::bigint AS total_daily_users,
                    COALESCE(SUM((usage -> 'averageUsers' ->> 'weekly')::bigint), 0)::bigint AS total_weekly_users,
                    COALESCE(SUM((usage -> 'averageUsers' ->> 'monthly')::bigint), 0)::bigint AS total_monthly_users
             FROM paths WHERE status = $1 AND ($2::text IS NULL OR campus = $2)
             GROUP BY path_type
             ORDER BY avg_popularity DESC",
        )
        .bind(PathStatus::Active.as_str())
        .bind(campus)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Creation series over the last twelve months.
    pub async fn analytics(&self, metric: Metric, period: Period, campus: Option<&str>) -> Result<Analytics, DatabaseError> {
        let since = Utc::now() - Duration::days(365);
        let mut series = AnalyticsSeries::default();

        if metric.includes(Metric::Buildings) {
            series.buildings = Some(self.series(Collection::Buildings, "building_type", period, campus, since).await?);
        }
        if metric.includes(Metric::Users) {
            series.users = Some(self.series(Collection::Users, "role", period, None, since).await?);
        }
        if metric.includes(Metric::Paths) {
            series.paths = Some(self.series(Collection::Paths, "path_type", period, campus, since).await?);
        }
        if metric.includes(Metric::Usage) {
            series.usage = Some(self.usage(campus).await?);
        }

        Ok(Analytics {
            metric: metric.as_str(),
            period: period.as_str(),
            campus: campus.unwrap_or("all").to_string(),
            analytics: series,
        })
    }

    async fn count_where(&self, sql: &str) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn health(&self, db: &DatabaseManager, uptime_seconds: u64) -> Result<SystemHealth, DatabaseError> {
        db.health_check().await?;

        let (buildings, users, paths, inactive_buildings, suspended_users) = tokio::try_join!(
            self.count_where("SELECT COUNT(*) FROM buildings"),
            self.count_where("SELECT COUNT(*) FROM users"),
            self.count_where("SELECT COUNT(*) FROM paths"),
            self.count_where("SELECT COUNT(*) FROM buildings WHERE status <> 'Active'"),
            self.count_where("SELECT COUNT(*) FROM users WHERE status IN ('suspended', 'inactive')"),
        )?;
        let collections = CollectionCounts { buildings, users, paths };
        let issues = health_issues(&collections, inactive_buildings, suspended_users);

        Ok(SystemHealth {
            status: if issues.is_empty() { "healthy" } else { "warning" },
            database: "connected",
            collections,
            issues,
            last_checked: Utc::now(),
            uptime: uptime_seconds,
        })
    }

    pub async fn quick_stats(&self, campus: Option<&str>) -> Result<QuickStats, DatabaseError> {
        let (buildings, users, active_paths) = tokio::try_join!(
            self.count_active(Collection::Buildings, campus, None, None),
            self.count_active(Collection::Users, None, None, None),
            self.count_active(Collection::Paths, campus, None, None),
        )?;

        let total_paths = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM paths WHERE ($1::text IS NULL OR campus = $1)")
            .bind(campus)
            .fetch_one(&self.pool);
        let most_popular = sqlx::query_as::<_, MostPopular>(
            "SELECT name, popularity FROM paths WHERE ($1::text IS NULL OR campus = $1) ORDER BY popularity DESC LIMIT 1",
        )
        .bind(campus)
        .fetch_optional(&self.pool);
        let newest = sqlx::query_as::<_, Newest>(
            "SELECT name, created_at FROM buildings WHERE ($1::text IS NULL OR campus = $1) ORDER BY created_at DESC LIMIT 1",
        )
        .bind(campus)
        .fetch_optional(&self.pool);
        let (total_paths, most_popular, newest) = tokio::try_join!(total_paths, most_popular, newest)?;

        Ok(QuickStats {
            buildings: BuildingWidget { total: buildings, newest },
            users: UserWidget { total: users },
            paths: PathWidget { total: total_paths, active: active_paths, most_popular },
            campus: campus.unwrap_or("all").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_percentages() {
        assert_eq!(growth(0, 0), 0);
        assert_eq!(growth(3, 0), 100);
        assert_eq!(growth(15, 10), 50);
        assert_eq!(growth(5, 10), -50);
        assert_eq!(growth(1, 3), -67);
    }

    #[test]
    fn parses_query_vocabulary() {
        assert_eq!("90d".parse::<TimeRange>().unwrap().duration(), Duration::days(90));
        assert!("2w".parse::<TimeRange>().is_err());
        assert!(Metric::All.includes(Metric::Usage));
        assert!(!Metric::Users.includes(Metric::Paths));
        assert_eq!("weekly".parse::<Period>().unwrap().trunc_field(), "week");
        assert!("hourly".parse::<Period>().is_err());
    }

    #[test]
    fn health_flags_empty_and_inactive() {
        let counts = CollectionCounts { buildings: 10, users: 0, paths: 3 };
        let issues = health_issues(&counts, 2, 0);
        let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["No users found in database", "High number of inactive buildings: 2"]);

        let healthy = CollectionCounts { buildings: 10, users: 100, paths: 3 };
        assert!(health_issues(&healthy, 1, 5).is_empty());
    }
}
