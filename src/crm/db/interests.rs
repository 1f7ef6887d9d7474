use anyhow::Context;
use chrono::Utc;
use rusqlite::{Row, named_params, params};

use super::{CrmDb, enum_col, opt_enum_col};
use crate::crm::models::*;
use crate::crm::payloads::NewPropertyInterest;
use crate::errors::CrmResult;

const INTEREST_COLUMNS: &str =
    "id, customer_id, property_id, interest_level, source, interaction_id, notes, created_at";

fn interest_from_row(row: &Row<'_>) -> rusqlite::Result<PropertyInterest> {
    Ok(PropertyInterest {
        id: row.get("id")?,
        customer_id: row.get("customer_id")?,
        property_id: row.get("property_id")?,
        interest_level: enum_col(row, "interest_level")?,
        source: opt_enum_col(row, "source")?,
        interaction_id: row.get("interaction_id")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}

impl CrmDb {
    // ── Property interests ────────────────────────────────────────────

    pub fn list_property_interests(&self) -> CrmResult<Vec<PropertyInterest>> {
        self.query_interests("1 = 1", [])
    }

    pub(super) fn interests_for_customer(&self, customer_id: i64) -> CrmResult<Vec<PropertyInterest>> {
        self.query_interests("customer_id = ?1", params![customer_id])
    }

    /// Record a customer's interest in a property. Recording it again for
    /// the same pair replaces the level, source, interaction and notes.
    pub fn upsert_property_interest(&self, new: NewPropertyInterest) -> CrmResult<PropertyInterest> {
        let interest = new.into_interest(Utc::now());
        interest.validate()?;
        self.ensure_exists("customers", "Customer", interest.customer_id)?;
        self.ensure_exists("properties", "Property", interest.property_id)?;
        if let Some(interaction_id) = interest.interaction_id {
            self.ensure_exists("interactions", "Interaction", interaction_id)?;
        }

        self.conn
            .execute(
                "INSERT INTO property_interests (customer_id, property_id, interest_level,
                     source, interaction_id, notes, created_at)
                 VALUES (:customer_id, :property_id, :interest_level, :source,
                     :interaction_id, :notes, :created_at)
                 ON CONFLICT(customer_id, property_id) DO UPDATE SET
                     interest_level = excluded.interest_level, source = excluded.source,
                     interaction_id = excluded.interaction_id, notes = excluded.notes",
                named_params! {
                    ":customer_id": interest.customer_id,
                    ":property_id": interest.property_id,
                    ":interest_level": interest.interest_level.as_str(),
                    ":source": interest.source.map(|s| s.as_str()),
                    ":interaction_id": interest.interaction_id,
                    ":notes": interest.notes,
                    ":created_at": interest.created_at,
                },
            )
            .context("Failed to save property interest")?;

        let saved = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM property_interests WHERE customer_id = ?1 AND property_id = ?2",
                    INTEREST_COLUMNS
                ),
                params![interest.customer_id, interest.property_id],
                interest_from_row,
            )
            .context("Property interest not found after upsert")?;
        Ok(saved)
    }

    pub fn delete_property_interest(&self, customer_id: i64, property_id: i64) -> CrmResult<bool> {
        let count = self
            .conn
            .execute(
                "DELETE FROM property_interests WHERE customer_id = ?1 AND property_id = ?2",
                params![customer_id, property_id],
            )
            .context("Failed to delete property interest")?;
        Ok(count > 0)
    }

    fn query_interests(
        &self,
        condition: &str,
        params: impl rusqlite::Params,
    ) -> CrmResult<Vec<PropertyInterest>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM property_interests WHERE {} ORDER BY id",
                INTEREST_COLUMNS, condition
            ))
            .context("Failed to prepare property interest query")?;
        let rows = stmt
            .query_map(params, interest_from_row)
            .context("Failed to query property interests")?;
        let mut interests = Vec::new();
        for row in rows {
            interests.push(row.context("Failed to read property interest row")?);
        }
        Ok(interests)
    }
}
