use hoster_data::DataError;
use sqlx::SqlitePool;

use crate::error::SqlxErrorExt;

/// Create every table and index the schema registry declares, in
/// dependency order — resources with `HardRef` foreign keys are created
/// after the resources they reference, so `sqlx` never hits a dangling
/// `REFERENCES` clause on a fresh database.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DataError> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await
        .map_err(|e| e.into_data_error())?;

    for resource in ordered_resources() {
        for statement in resource.generate_create_sql().split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(|e| e.into_data_error())?;
        }
    }
    Ok(())
}

/// `user` and the reference-data resources have no dependencies and must
/// be created first; everything else references `user` at minimum.
fn ordered_resources() -> Vec<&'static hoster_schema::Resource> {
    let all = hoster_schema::all_resources();
    let priority = |name: &str| -> u8 {
        match name {
            "user" => 0,
            "ssh_key" | "cloud_credential" => 1,
            "node" | "template" => 2,
            "deployment" | "cloud_provision" | "invoice" | "usage_event" => 3,
            _ => 4,
        }
    };
    let mut ordered: Vec<&'static hoster_schema::Resource> = all.iter().collect();
    ordered.sort_by_key(|r| priority(r.name));
    ordered
}
