use anyhow::{Context, anyhow};
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, named_params, params};

use super::{CrmDb, enum_col, row_id};
use crate::crm::filters::VisitFilter;
use crate::crm::models::*;
use crate::crm::payloads::{NewVisit, VisitPatch};
use crate::errors::{CrmError, CrmResult};

const VISIT_COLUMNS: &str =
    "id, customer_id, property_id, broker_id, visit_date, feedback, rating, notes, status, created_at";

fn visit_from_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
    Ok(Visit {
        id: row.get("id")?,
        customer_id: row.get("customer_id")?,
        property_id: row.get("property_id")?,
        broker_id: row.get("broker_id")?,
        visit_date: row.get("visit_date")?,
        feedback: row.get("feedback")?,
        rating: row.get("rating")?,
        notes: row.get("notes")?,
        status: enum_col(row, "status")?,
        created_at: row.get("created_at")?,
    })
}

impl CrmDb {
    // ── Visit CRUD ────────────────────────────────────────────────────

    /// Visits with their customer, property and broker, latest visit first.
    pub fn list_visits(&self, filter: &VisitFilter) -> CrmResult<Vec<VisitWithDetails>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM visits ORDER BY visit_date DESC, id DESC",
                VISIT_COLUMNS
            ))
            .context("Failed to prepare list_visits")?;
        let rows = stmt
            .query_map([], visit_from_row)
            .context("Failed to query visits")?;
        let mut visits = Vec::new();
        for row in rows {
            let visit = row.context("Failed to read visit row")?;
            let detailed = self.visit_details(visit)?;
            if filter.matches(&detailed) {
                visits.push(detailed);
            }
        }
        Ok(visits)
    }

    pub fn get_visit(&self, id: i64) -> CrmResult<Option<Visit>> {
        let visit = self
            .conn
            .query_row(
                &format!("SELECT {} FROM visits WHERE id = ?1", VISIT_COLUMNS),
                params![id],
                visit_from_row,
            )
            .optional()
            .context("Failed to query visit")?;
        Ok(visit)
    }

    pub fn get_visit_details(&self, id: i64) -> CrmResult<Option<VisitWithDetails>> {
        self.get_visit(id)?
            .map(|visit| self.visit_details(visit))
            .transpose()
    }

    /// Records the visit and stamps the customer's last interaction date.
    pub fn create_visit(&self, new: NewVisit) -> CrmResult<Visit> {
        let now = Utc::now();
        let visit = new.into_visit(now);
        let id = self.transaction(|db| {
            let id = db.save_visit(&visit)?;
            db.touch_customer(visit.customer_id, now)?;
            Ok(id)
        })?;
        self.get_visit(id)?
            .context("Visit not found after insert")
            .map_err(Into::into)
    }

    pub fn update_visit(&self, id: i64, patch: VisitPatch) -> CrmResult<Option<Visit>> {
        let Some(mut visit) = self.get_visit(id)? else {
            return Ok(None);
        };
        patch.apply_to(&mut visit);
        self.save_visit(&visit)?;
        self.get_visit(id)
    }

    pub fn delete_visit(&self, id: i64) -> CrmResult<bool> {
        let count = self
            .conn
            .execute("DELETE FROM visits WHERE id = ?1", params![id])
            .context("Failed to delete visit")?;
        Ok(count > 0)
    }

    fn save_visit(&self, v: &Visit) -> CrmResult<i64> {
        v.validate()?;
        self.ensure_exists("customers", "Customer", v.customer_id)?;
        self.ensure_exists("properties", "Property", v.property_id)?;
        if let Some(broker_id) = v.broker_id {
            self.ensure_exists("brokers", "Broker", broker_id)?;
        }

        self.conn
            .execute(
                "INSERT INTO visits (id, customer_id, property_id, broker_id, visit_date,
                     feedback, rating, notes, status, created_at)
                 VALUES (:id, :customer_id, :property_id, :broker_id, :visit_date,
                     :feedback, :rating, :notes, :status, :created_at)
                 ON CONFLICT(id) DO UPDATE SET
                     customer_id = excluded.customer_id, property_id = excluded.property_id,
                     broker_id = excluded.broker_id, visit_date = excluded.visit_date,
                     feedback = excluded.feedback, rating = excluded.rating,
                     notes = excluded.notes, status = excluded.status",
                named_params! {
                    ":id": row_id(v.id),
                    ":customer_id": v.customer_id,
                    ":property_id": v.property_id,
                    ":broker_id": v.broker_id,
                    ":visit_date": v.visit_date,
                    ":feedback": v.feedback,
                    ":rating": v.rating,
                    ":notes": v.notes,
                    ":status": v.status.as_str(),
                    ":created_at": v.created_at,
                },
            )
            .context("Failed to save visit")?;
        Ok(row_id(v.id).unwrap_or_else(|| self.conn.last_insert_rowid()))
    }

    fn visit_details(&self, visit: Visit) -> CrmResult<VisitWithDetails> {
        let customer = self.get_customer(visit.customer_id)?.ok_or_else(|| {
            CrmError::Database(anyhow!(
                "Visit {} references missing customer {}",
                visit.id,
                visit.customer_id
            ))
        })?;
        let property = self.get_property(visit.property_id)?.ok_or_else(|| {
            CrmError::Database(anyhow!(
                "Visit {} references missing property {}",
                visit.id,
                visit.property_id
            ))
        })?;
        let broker = match visit.broker_id {
            Some(id) => self.get_broker(id)?,
            None => None,
        };
        Ok(VisitWithDetails {
            visit,
            customer,
            property,
            broker,
        })
    }
}
