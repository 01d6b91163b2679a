//! Store round trips against a real Postgres. Skipped unless
//! `TEST_DATABASE_URL` points at a disposable database.

use anyhow::Result;
use campus_nav_api::auth::{hash_password, LockoutPolicy};
use campus_nav_api::database::models::admin::{AdminDraft, AdminInput, AdminRow};
use campus_nav_api::database::models::building::{BuildingDraft, BuildingInput, BuildingRow};
use campus_nav_api::database::models::path::{PathDraft, PathImage, PathInput, PathRow, UsageInput};
use campus_nav_api::database::{DatabaseManager, Repository};
use campus_nav_api::geo::NearbyQuery;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn store() -> Result<Option<DatabaseManager>> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping store test");
        return Ok(None);
    };
    let pool = PgPoolOptions::new().max_connections(8).connect(&url).await?;
    let db = DatabaseManager::from_pool(pool);
    db.run_migrations().await?;
    Ok(Some(db))
}

fn draft(code: &str, lat: f64, lng: f64) -> BuildingDraft {
    let input: BuildingInput = serde_json::from_value(json!({
        "name": format!("Test Hall {}", code),
        "code": code,
        "type": "Academic",
        "floors": 2,
        "capacity": 120,
        "location": {
            "coordinates": { "latitude": lat, "longitude": lng },
            "campus": "Test Campus"
        }
    }))
    .expect("valid building body");
    BuildingDraft::create(input).expect("valid building draft")
}

fn unique_code() -> String {
    format!("T{}", &Uuid::new_v4().simple().to_string()[..6]).to_uppercase()
}

#[tokio::test]
async fn duplicate_building_codes_are_unique_violations() -> Result<()> {
    let Some(db) = store().await? else { return Ok(()) };
    let repo = Repository::<BuildingRow>::new(db.pool().clone());

    let code = unique_code();
    let first = repo.insert(&draft(&code, -25.4358, 30.9816)).await?;
    assert_eq!(first.code, code);

    let err = repo
        .insert(&draft(&code.to_lowercase(), -25.4358, 30.9816))
        .await
        .expect_err("second insert with the same code must fail");
    assert_eq!(err.unique_violation().as_deref(), Some("buildings_code_key"));

    repo.delete_id(first.id).await?;
    Ok(())
}

#[tokio::test]
async fn zero_radius_matches_exact_location_only() -> Result<()> {
    let Some(db) = store().await? else { return Ok(()) };
    let repo = Repository::<BuildingRow>::new(db.pool().clone());

    // Far from any seeded campus so other rows cannot interfere
    let (lat, lng) = (-71.234567, 12.345678);
    let here = repo.insert(&draft(&unique_code(), lat, lng)).await?;
    let near = repo.insert(&draft(&unique_code(), lat + 0.001, lng)).await?;

    let exact = repo.nearby(&NearbyQuery::new(lat, lng, 0.0, 10)?).await?;
    let ids: Vec<Uuid> = exact.iter().map(|(row, _)| row.id).collect();
    assert!(ids.contains(&here.id));
    assert!(!ids.contains(&near.id));

    let wider = repo.nearby(&NearbyQuery::new(lat, lng, 500.0, 10)?).await?;
    assert_eq!(wider.first().map(|(row, _)| row.id), Some(here.id));
    assert!(wider.iter().any(|(row, meters)| row.id == near.id && *meters > 100.0 && *meters < 120.0));

    repo.delete_id(here.id).await?;
    repo.delete_id(near.id).await?;
    Ok(())
}

fn path_draft(start: (f64, f64), end: (f64, f64)) -> PathDraft {
    let input: PathInput = serde_json::from_value(json!({
        "name": "Test Walk",
        "type": "walking",
        "coordinates": [
            { "lat": start.0, "lng": start.1 },
            { "lat": end.0, "lng": end.1 }
        ],
        "startPoint": { "name": "Gate", "coordinates": { "lat": start.0, "lng": start.1 } },
        "endPoint": { "name": "Hall", "coordinates": { "lat": end.0, "lng": end.1 } },
        "campus": "Test Campus"
    }))
    .expect("valid path body");
    PathDraft::create(input).expect("valid path draft")
}

fn path_input(body: Value) -> PathInput {
    serde_json::from_value(body).expect("valid path body")
}

#[tokio::test]
async fn building_update_round_trip() -> Result<()> {
    let Some(db) = store().await? else { return Ok(()) };
    let repo = Repository::<BuildingRow>::new(db.pool().clone());

    let created = repo.insert(&draft(&unique_code(), -25.4358, 30.9816)).await?;
    let input: BuildingInput = serde_json::from_value(json!({ "name": "Renamed Hall", "capacity": 450 }))?;
    let changes = BuildingDraft::update(&created, input).expect("valid partial update");

    let updated = repo.update(created.id, &changes).await?.expect("building still exists");
    assert_eq!(updated.name, "Renamed Hall");
    assert_eq!(updated.capacity, 450);
    assert_eq!(updated.code, created.code);
    assert_eq!(updated.floors, created.floors);

    let reloaded = repo.select_id(created.id).await?.expect("building persisted");
    assert_eq!(reloaded.name, "Renamed Hall");

    repo.delete_id(created.id).await?;
    assert!(repo.update(created.id, &changes).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn every_path_change_bumps_the_version() -> Result<()> {
    let Some(db) = store().await? else { return Ok(()) };
    let repo = Repository::<PathRow>::new(db.pool().clone());
    let editor = Uuid::new_v4();

    let created = repo.insert(&path_draft((-25.4358, 30.9816), (-25.4361, 30.9822)), editor).await?;
    assert_eq!(created.version, 1);

    // New geometry without a distance re-derives it
    let changes = PathDraft::update(
        &created,
        path_input(json!({
            "name": "Longer Walk",
            "coordinates": [
                { "lat": -25.4358, "lng": 30.9816 },
                { "lat": -25.4400, "lng": 30.9900 }
            ]
        })),
    )
    .expect("valid partial update");
    let updated = repo.update(created.id, &changes, editor).await?.expect("path exists");
    assert_eq!(updated.version, 2);
    assert_eq!(updated.name, "Longer Walk");
    assert!(updated.distance > created.distance);
    assert_eq!(updated.last_modified_by, Some(editor));

    let image = PathImage {
        url: "https://cdn.campus.example/walk.jpg".to_string(),
        caption: None,
        uploaded_by: Some(editor),
        uploaded_at: Utc::now(),
    };
    let with_image = repo.append_image(created.id, &image, editor).await?.expect("path exists");
    assert_eq!(with_image.version, 3);
    assert_eq!(with_image.images.0.len(), 1);

    let mut usage = with_image.usage.0.clone();
    let input: UsageInput = serde_json::from_value(json!({ "popularity": 8.5, "averageUsers": { "daily": 40 } }))?;
    input.apply(&mut usage).expect("valid usage");
    let with_usage = repo.set_usage(created.id, &usage, editor).await?.expect("path exists");
    assert_eq!(with_usage.version, 4);
    assert_eq!(with_usage.usage.0.popularity, 8.5);
    assert_eq!(with_usage.usage.0.average_users.daily, 40);

    repo.delete_id(created.id).await?;
    Ok(())
}

#[tokio::test]
async fn paths_match_nearby_on_either_endpoint() -> Result<()> {
    let Some(db) = store().await? else { return Ok(()) };
    let repo = Repository::<PathRow>::new(db.pool().clone());

    // Endpoints about 2.2 km apart, far from any seeded campus
    let start = (-72.5, 14.5);
    let end = (-72.52, 14.5);
    let path = repo.insert(&path_draft(start, end), Uuid::new_v4()).await?;

    for (lat, lng) in [start, end] {
        let found = repo.nearby(&NearbyQuery::new(lat, lng, 100.0, 10)?, None).await?;
        let hit = found.iter().find(|(row, _)| row.id == path.id);
        assert!(hit.is_some_and(|(_, meters)| *meters < 1.0), "no match near ({}, {})", lat, lng);
    }

    let midpoint = repo.nearby(&NearbyQuery::new(-72.51, 14.5, 100.0, 10)?, None).await?;
    assert!(midpoint.iter().all(|(row, _)| row.id != path.id));

    let other_campus = repo.nearby(&NearbyQuery::new(start.0, start.1, 100.0, 10)?, Some("Elsewhere")).await?;
    assert!(other_campus.iter().all(|(row, _)| row.id != path.id));

    repo.delete_id(path.id).await?;
    Ok(())
}

async fn lockout_admin(db: &DatabaseManager) -> Result<AdminRow> {
    let input: AdminInput = serde_json::from_value(json!({
        "firstName": "Lock",
        "lastName": "Out",
        "email": format!("lockout-{}@campus.example", Uuid::new_v4().simple()),
        "password": "Campus#2024"
    }))?;
    let draft = AdminDraft::register(input).expect("valid admin");
    let hash = hash_password("Campus#2024")?;
    Ok(Repository::<AdminRow>::new(db.pool().clone()).insert(&draft, &hash).await?)
}

#[tokio::test]
async fn concurrent_failures_all_count_toward_the_lock() -> Result<()> {
    let Some(db) = store().await? else { return Ok(()) };
    let admin = lockout_admin(&db).await?;
    let policy = LockoutPolicy { max_attempts: 5, lockout: Duration::minutes(120) };

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let pool = db.pool().clone();
            let id = admin.id;
            tokio::spawn(async move {
                Repository::<AdminRow>::new(pool).record_failed_login(id, &policy, Utc::now()).await
            })
        })
        .collect();
    for task in tasks {
        task.await??;
    }

    let repo = Repository::<AdminRow>::new(db.pool().clone());
    let stored = repo.select_id(admin.id).await?.expect("admin exists");
    assert_eq!(stored.login_attempts, 8);
    assert!(stored.lock_until.is_some_and(|until| until > Utc::now()));

    repo.delete_id(admin.id).await?;
    Ok(())
}

#[tokio::test]
async fn expired_lock_restarts_the_count() -> Result<()> {
    let Some(db) = store().await? else { return Ok(()) };
    let admin = lockout_admin(&db).await?;
    let repo = Repository::<AdminRow>::new(db.pool().clone());
    let policy = LockoutPolicy { max_attempts: 5, lockout: Duration::minutes(120) };

    let now = Utc::now();
    for attempt in 1..=4 {
        let (attempts, lock) = repo.record_failed_login(admin.id, &policy, now).await?;
        assert_eq!(attempts, attempt);
        assert!(lock.is_none());
    }
    let (attempts, lock) = repo.record_failed_login(admin.id, &policy, now).await?;
    assert_eq!(attempts, 5);
    assert_eq!(lock.map(|until| until.timestamp()), Some(policy.lock_expiry(now).timestamp()));

    let later = now + Duration::minutes(121);
    let (attempts, lock) = repo.record_failed_login(admin.id, &policy, later).await?;
    assert_eq!((attempts, lock), (1, None));

    repo.delete_id(admin.id).await?;
    Ok(())
}
