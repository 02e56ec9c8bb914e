// src/repositories/vehicle_repository.rs
//
// Vehicle Repository
//
// Parse failures on read are explicit errors, never silent defaults.

use crate::db::ConnectionPool;
use crate::domain::vehicle::{MaintenanceReading, Vehicle};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row};
use std::sync::Arc;
use uuid::Uuid;

const VEHICLE_COLUMNS: &str = "id, report_number, brand, model, first_registration, mileage_km,
     vin, power_kw, fuel, color, photo_urls, report_url, maintenance, created_at, updated_at";

// ---------------------------------------------------------------------
// Repository contract
// ---------------------------------------------------------------------
pub trait VehicleRepository: Send + Sync {
    /// Insert or update by id
    fn save(&self, vehicle: &Vehicle) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>>;

    fn get_by_report_number(&self, report_number: &str) -> AppResult<Option<Vehicle>>;

    /// All vehicles ordered by report number
    fn list_all(&self) -> AppResult<Vec<Vehicle>>;

    /// Single-field write of the photo URL list
    fn update_photo_urls(&self, id: Uuid, photo_urls: &[String]) -> AppResult<()>;

    /// Single-field write of the report URL
    fn update_report_url(&self, id: Uuid, report_url: &str) -> AppResult<()>;
}

pub struct SqliteVehicleRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteVehicleRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn conversion_error(column: usize, message: String) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
        )
    }

    fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Self::conversion_error(column, format!("Invalid timestamp '{}': {}", value, e)))
    }

    fn row_to_vehicle(row: &Row) -> rusqlite::Result<Vehicle> {
        let id_str: String = row.get("id")?;
        let photo_urls_json: String = row.get("photo_urls")?;
        let maintenance_json: String = row.get("maintenance")?;
        let created_at_str: String = row.get("created_at")?;
        let updated_at_str: String = row.get("updated_at")?;

        let id = Uuid::parse_str(&id_str)
            .map_err(|e| Self::conversion_error(0, format!("Invalid vehicle UUID '{}': {}", id_str, e)))?;

        let photo_urls: Vec<String> = serde_json::from_str(&photo_urls_json)
            .map_err(|e| Self::conversion_error(10, format!("Invalid photo_urls JSON: {}", e)))?;

        let maintenance: Vec<MaintenanceReading> = serde_json::from_str(&maintenance_json)
            .map_err(|e| Self::conversion_error(12, format!("Invalid maintenance JSON: {}", e)))?;

        Ok(Vehicle {
            id,
            report_number: row.get("report_number")?,
            brand: row.get("brand")?,
            model: row.get("model")?,
            first_registration: row.get("first_registration")?,
            mileage_km: row.get::<_, Option<i64>>("mileage_km")?.map(|km| km as u64),
            vin: row.get("vin")?,
            power_kw: row.get::<_, Option<i64>>("power_kw")?.map(|kw| kw as u32),
            fuel: row.get("fuel")?,
            color: row.get("color")?,
            photo_urls,
            report_url: row.get("report_url")?,
            maintenance,
            created_at: Self::parse_timestamp(13, &created_at_str)?,
            updated_at: Self::parse_timestamp(14, &updated_at_str)?,
        })
    }

    fn ensure_updated(id: Uuid, changed: usize) -> AppResult<()> {
        if changed == 0 {
            log::warn!("Vehicle {} not found for update", id);
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------
// SQLite Implementation
// ---------------------------------------------------------------------
impl VehicleRepository for SqliteVehicleRepository {
    fn save(&self, vehicle: &Vehicle) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO vehicles (
                id, report_number, brand, model, first_registration, mileage_km,
                vin, power_kw, fuel, color, photo_urls, report_url, maintenance,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(id) DO UPDATE SET
                report_number = excluded.report_number,
                brand = excluded.brand,
                model = excluded.model,
                first_registration = excluded.first_registration,
                mileage_km = excluded.mileage_km,
                vin = excluded.vin,
                power_kw = excluded.power_kw,
                fuel = excluded.fuel,
                color = excluded.color,
                photo_urls = excluded.photo_urls,
                report_url = excluded.report_url,
                maintenance = excluded.maintenance,
                updated_at = excluded.updated_at",
            rusqlite::params![
                vehicle.id.to_string(),
                vehicle.report_number,
                vehicle.brand,
                vehicle.model,
                vehicle.first_registration,
                vehicle.mileage_km.map(|km| km as i64),
                vehicle.vin,
                vehicle.power_kw.map(i64::from),
                vehicle.fuel,
                vehicle.color,
                serde_json::to_string(&vehicle.photo_urls)?,
                vehicle.report_url,
                serde_json::to_string(&vehicle.maintenance)?,
                vehicle.created_at.to_rfc3339(),
                vehicle.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM vehicles WHERE id = ?1", VEHICLE_COLUMNS);

        let vehicle = conn
            .query_row(&sql, rusqlite::params![id.to_string()], Self::row_to_vehicle)
            .optional()?;
        Ok(vehicle)
    }

    fn get_by_report_number(&self, report_number: &str) -> AppResult<Option<Vehicle>> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM vehicles WHERE report_number = ?1", VEHICLE_COLUMNS);

        let vehicle = conn
            .query_row(&sql, rusqlite::params![report_number], Self::row_to_vehicle)
            .optional()?;
        Ok(vehicle)
    }

    fn list_all(&self) -> AppResult<Vec<Vehicle>> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM vehicles ORDER BY report_number", VEHICLE_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let vehicles = stmt
            .query_map([], Self::row_to_vehicle)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(vehicles)
    }

    fn update_photo_urls(&self, id: Uuid, photo_urls: &[String]) -> AppResult<()> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE vehicles SET photo_urls = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![
                serde_json::to_string(photo_urls)?,
                Utc::now().to_rfc3339(),
                id.to_string(),
            ],
        )?;
        Self::ensure_updated(id, changed)
    }

    fn update_report_url(&self, id: Uuid, report_url: &str) -> AppResult<()> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE vehicles SET report_url = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![report_url, Utc::now().to_rfc3339(), id.to_string()],
        )?;
        Self::ensure_updated(id, changed)
    }
}
