// src/repositories/inquiry_repository.rs
//
// Inquiry Repository
//
// An inquiry row plus one inquiry_vehicles row per selected vehicle,
// written in a single transaction.

use crate::db::ConnectionPool;
use crate::domain::inquiry::Inquiry;
use crate::error::AppResult;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use std::sync::Arc;
use uuid::Uuid;

pub trait InquiryRepository: Send + Sync {
    fn save(&self, inquiry: &Inquiry) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Inquiry>>;

    fn list_by_lead(&self, lead_id: Uuid) -> AppResult<Vec<Inquiry>>;

    /// Distinct vehicles referenced by any inquiry of this lead
    fn reserved_vehicle_ids(&self, lead_id: Uuid) -> AppResult<Vec<Uuid>>;
}

pub struct SqliteInquiryRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteInquiryRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn parse_uuid(column: usize, value: &str) -> rusqlite::Result<Uuid> {
        Uuid::parse_str(value).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Invalid UUID '{}': {}", value, e),
                )),
            )
        })
    }

    fn vehicle_ids_for(conn: &rusqlite::Connection, inquiry_id: Uuid) -> AppResult<Vec<Uuid>> {
        let mut stmt = conn.prepare(
            "SELECT vehicle_id FROM inquiry_vehicles WHERE inquiry_id = ?1 ORDER BY position",
        )?;
        let ids = stmt
            .query_map(rusqlite::params![inquiry_id.to_string()], |row| {
                let value: String = row.get(0)?;
                Self::parse_uuid(0, &value)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

/// Inquiry header columns, before vehicle ids are attached
type InquiryHeader = (Uuid, Uuid, String, String, Option<String>, DateTime<Utc>);

fn row_to_header(row: &rusqlite::Row) -> rusqlite::Result<InquiryHeader> {
    let id: String = row.get("id")?;
    let lead_id: String = row.get("lead_id")?;
    let created_at: String = row.get("created_at")?;

    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Invalid created_at timestamp '{}': {}", created_at, e),
                )),
            )
        })?;

    Ok((
        SqliteInquiryRepository::parse_uuid(0, &id)?,
        SqliteInquiryRepository::parse_uuid(1, &lead_id)?,
        row.get("name")?,
        row.get("email")?,
        row.get("message")?,
        created_at,
    ))
}

impl InquiryRepository for SqliteInquiryRepository {
    fn save(&self, inquiry: &Inquiry) -> AppResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO inquiries (id, lead_id, name, email, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                inquiry.id.to_string(),
                inquiry.lead_id.to_string(),
                inquiry.name,
                inquiry.email,
                inquiry.message,
                inquiry.created_at.to_rfc3339(),
            ],
        )?;

        for (position, vehicle_id) in inquiry.vehicle_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO inquiry_vehicles (inquiry_id, vehicle_id, position) VALUES (?1, ?2, ?3)",
                rusqlite::params![inquiry.id.to_string(), vehicle_id.to_string(), position as i64],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Inquiry>> {
        let conn = self.pool.get()?;
        let header = conn
            .query_row(
                "SELECT id, lead_id, name, email, message, created_at FROM inquiries WHERE id = ?1",
                rusqlite::params![id.to_string()],
                row_to_header,
            )
            .optional()?;

        let Some((id, lead_id, name, email, message, created_at)) = header else {
            return Ok(None);
        };

        Ok(Some(Inquiry {
            id,
            lead_id,
            name,
            email,
            message,
            vehicle_ids: Self::vehicle_ids_for(&conn, id)?,
            created_at,
        }))
    }

    fn list_by_lead(&self, lead_id: Uuid) -> AppResult<Vec<Inquiry>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, name, email, message, created_at
             FROM inquiries WHERE lead_id = ?1 ORDER BY created_at",
        )?;
        let headers = stmt
            .query_map(rusqlite::params![lead_id.to_string()], row_to_header)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut inquiries = Vec::with_capacity(headers.len());
        for (id, lead_id, name, email, message, created_at) in headers {
            inquiries.push(Inquiry {
                id,
                lead_id,
                name,
                email,
                message,
                vehicle_ids: Self::vehicle_ids_for(&conn, id)?,
                created_at,
            });
        }
        Ok(inquiries)
    }

    fn reserved_vehicle_ids(&self, lead_id: Uuid) -> AppResult<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT iv.vehicle_id
             FROM inquiry_vehicles iv
             JOIN inquiries i ON i.id = iv.inquiry_id
             WHERE i.lead_id = ?1
             ORDER BY iv.vehicle_id",
        )?;

        let ids = stmt
            .query_map(rusqlite::params![lead_id.to_string()], |row| {
                let value: String = row.get(0)?;
                Self::parse_uuid(0, &value)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, get_connection, initialize_database};
    use crate::domain::vehicle::Vehicle;
    use crate::repositories::{SqliteVehicleRepository, VehicleRepository};

    fn setup() -> (SqliteInquiryRepository, SqliteVehicleRepository) {
        let pool = Arc::new(create_memory_pool().unwrap());
        {
            let conn = get_connection(&pool).unwrap();
            initialize_database(&conn).unwrap();
        }
        (
            SqliteInquiryRepository::new(pool.clone()),
            SqliteVehicleRepository::new(pool),
        )
    }

    #[test]
    fn test_save_and_load_inquiry() {
        let (inquiries, vehicles) = setup();
        let a = Vehicle::new("0001".to_string(), "VW".to_string(), "Golf".to_string());
        let b = Vehicle::new("0002".to_string(), "VW".to_string(), "Polo".to_string());
        vehicles.save(&a).unwrap();
        vehicles.save(&b).unwrap();

        let lead = Uuid::new_v4();
        let inquiry = Inquiry::new(
            lead,
            "Max".to_string(),
            "max@example.com".to_string(),
            Some("Bitte um Rückruf".to_string()),
            vec![b.id, a.id],
        );
        inquiries.save(&inquiry).unwrap();

        let loaded = inquiries.get_by_id(inquiry.id).unwrap().unwrap();
        assert_eq!(loaded.vehicle_ids, vec![b.id, a.id]);
        assert_eq!(loaded.message.as_deref(), Some("Bitte um Rückruf"));

        assert_eq!(inquiries.list_by_lead(lead).unwrap().len(), 1);
        assert!(inquiries.list_by_lead(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn test_reserved_vehicle_ids_are_distinct() {
        let (inquiries, vehicles) = setup();
        let a = Vehicle::new("0001".to_string(), "VW".to_string(), "Golf".to_string());
        vehicles.save(&a).unwrap();

        let lead = Uuid::new_v4();
        for _ in 0..2 {
            let inquiry = Inquiry::new(
                lead,
                "Max".to_string(),
                "max@example.com".to_string(),
                None,
                vec![a.id],
            );
            inquiries.save(&inquiry).unwrap();
        }

        assert_eq!(inquiries.reserved_vehicle_ids(lead).unwrap(), vec![a.id]);
    }

    #[test]
    fn test_unknown_vehicle_rejected_by_foreign_key() {
        let (inquiries, _) = setup();
        let inquiry = Inquiry::new(
            Uuid::new_v4(),
            "Max".to_string(),
            "max@example.com".to_string(),
            None,
            vec![Uuid::new_v4()],
        );
        assert!(inquiries.save(&inquiry).is_err());
        assert!(inquiries.get_by_id(inquiry.id).unwrap().is_none());
    }
}
