//! Command-line maintenance entry points.
//! - `seed`: loads the standard departments and projects into an empty database

use anyhow::Result;
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::database::db::queries;

/// (name, code) of the standard departments.
pub const DEPARTMENTS: [(&str, &str); 5] = [
    ("Teknologi", "TECH"),
    ("Markedsføring", "MKT"),
    ("Salg", "SALES"),
    ("Drift", "OPS"),
    ("Økonomi", "FIN"),
];

/// (name, code, owning department code) of the standard projects.
pub const PROJECTS: [(&str, &str, &str); 11] = [
    ("Plattform Oppgradering", "TECH-001", "TECH"),
    ("Mobilapp Utvikling", "TECH-002", "TECH"),
    ("Infrastruktur Migrering", "TECH-003", "TECH"),
    ("Merkevare Kampanje Q1", "MKT-001", "MKT"),
    ("Digital Markedsføring", "MKT-002", "MKT"),
    ("Salgs Enablement", "SALES-001", "SALES"),
    ("CRM Implementering", "SALES-002", "SALES"),
    ("Prosess Optimalisering", "OPS-001", "OPS"),
    ("Forsyningskjede", "OPS-002", "OPS"),
    ("Finansiell Rapportering", "FIN-001", "FIN"),
    ("Budsjett Planlegging", "FIN-002", "FIN"),
];

/// Seed reference data. Returns `false` when departments already exist and
/// nothing was written.
pub async fn seed(pool: &Pool<Sqlite>) -> Result<bool> {
    let existing = queries::count_departments(pool).await?;
    if existing > 0 {
        info!(existing, "database already has departments, skipping seed");
        return Ok(false);
    }

    let mut department_ids = Vec::with_capacity(DEPARTMENTS.len());
    for (name, code) in DEPARTMENTS {
        let id = queries::create_department(pool, name, code).await?;
        department_ids.push((code, id));
    }
    info!(count = department_ids.len(), "created departments");

    for (name, code, department_code) in PROJECTS {
        let department_id = department_ids
            .iter()
            .find(|(dept_code, _)| *dept_code == department_code)
            .map(|(_, id)| *id)
            .ok_or_else(|| anyhow::anyhow!("unknown department code {department_code}"))?;
        queries::create_project(pool, name, code, department_id).await?;
    }
    info!(count = PROJECTS.len(), "created projects");

    Ok(true)
}
