use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, named_params, params};

use super::{CrmDb, enum_col, json_col, month_start, row_id, to_json};
use crate::crm::filters::BrokerFilter;
use crate::crm::models::*;
use crate::crm::payloads::{BrokerPatch, NewBroker};
use crate::errors::CrmResult;

const BROKER_COLUMNS: &str = "id, name, email, phone, alternate_phone, address, city, state, \
     pincode, affiliation, company, experience, specialization, territory, commission_rate, \
     total_commission, total_deals, rating, notes, status, joined_date, created_at";

const RECENT_INTERACTIONS: usize = 5;

pub(super) fn broker_from_row(row: &Row<'_>) -> rusqlite::Result<Broker> {
    Ok(Broker {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        alternate_phone: row.get("alternate_phone")?,
        address: row.get("address")?,
        city: row.get("city")?,
        state: row.get("state")?,
        pincode: row.get("pincode")?,
        affiliation: enum_col(row, "affiliation")?,
        company: row.get("company")?,
        experience: row.get("experience")?,
        specialization: json_col(row, "specialization")?,
        territory: row.get("territory")?,
        commission_rate: row.get("commission_rate")?,
        total_commission: row.get("total_commission")?,
        total_deals: row.get("total_deals")?,
        rating: row.get("rating")?,
        notes: row.get("notes")?,
        status: enum_col(row, "status")?,
        joined_date: row.get("joined_date")?,
        created_at: row.get("created_at")?,
    })
}

impl CrmDb {
    // ── Broker CRUD ───────────────────────────────────────────────────

    pub fn list_brokers(&self, filter: &BrokerFilter) -> CrmResult<Vec<Broker>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM brokers ORDER BY id", BROKER_COLUMNS))
            .context("Failed to prepare list_brokers")?;
        let rows = stmt
            .query_map([], broker_from_row)
            .context("Failed to query brokers")?;
        let mut brokers = Vec::new();
        for row in rows {
            let b = row.context("Failed to read broker row")?;
            if filter.matches(&b) {
                brokers.push(b);
            }
        }
        Ok(brokers)
    }

    pub fn get_broker(&self, id: i64) -> CrmResult<Option<Broker>> {
        let broker = self
            .conn
            .query_row(
                &format!("SELECT {} FROM brokers WHERE id = ?1", BROKER_COLUMNS),
                params![id],
                broker_from_row,
            )
            .optional()
            .context("Failed to query broker")?;
        Ok(broker)
    }

    pub fn create_broker(&self, new: NewBroker) -> CrmResult<Broker> {
        let broker = new.into_broker(Utc::now());
        let id = self.save_broker(&broker)?;
        self.get_broker(id)?
            .context("Broker not found after insert")
            .map_err(Into::into)
    }

    pub fn update_broker(&self, id: i64, patch: BrokerPatch) -> CrmResult<Option<Broker>> {
        let Some(mut broker) = self.get_broker(id)? else {
            return Ok(None);
        };
        patch.apply_to(&mut broker);
        self.save_broker(&broker)?;
        self.get_broker(id)
    }

    /// Fails with `Conflict` while interactions still name this broker.
    /// Assigned customers and visits are unlinked.
    pub fn delete_broker(&self, id: i64) -> CrmResult<bool> {
        let count = self
            .conn
            .execute("DELETE FROM brokers WHERE id = ?1", params![id])
            .context("Failed to delete broker")?;
        Ok(count > 0)
    }

    fn save_broker(&self, b: &Broker) -> CrmResult<i64> {
        b.validate()?;
        let specialization = to_json(&b.specialization, "specialization")?;

        self.conn
            .execute(
                "INSERT INTO brokers (id, name, email, phone, alternate_phone, address, city,
                     state, pincode, affiliation, company, experience, specialization, territory,
                     commission_rate, total_commission, total_deals, rating, notes, status,
                     joined_date, created_at)
                 VALUES (:id, :name, :email, :phone, :alternate_phone, :address, :city,
                     :state, :pincode, :affiliation, :company, :experience, :specialization,
                     :territory, :commission_rate, :total_commission, :total_deals, :rating,
                     :notes, :status, :joined_date, :created_at)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name, email = excluded.email, phone = excluded.phone,
                     alternate_phone = excluded.alternate_phone, address = excluded.address,
                     city = excluded.city, state = excluded.state, pincode = excluded.pincode,
                     affiliation = excluded.affiliation, company = excluded.company,
                     experience = excluded.experience, specialization = excluded.specialization,
                     territory = excluded.territory, commission_rate = excluded.commission_rate,
                     total_commission = excluded.total_commission,
                     total_deals = excluded.total_deals, rating = excluded.rating,
                     notes = excluded.notes, status = excluded.status,
                     joined_date = excluded.joined_date",
                named_params! {
                    ":id": row_id(b.id),
                    ":name": b.name,
                    ":email": b.email,
                    ":phone": b.phone,
                    ":alternate_phone": b.alternate_phone,
                    ":address": b.address,
                    ":city": b.city,
                    ":state": b.state,
                    ":pincode": b.pincode,
                    ":affiliation": b.affiliation.as_str(),
                    ":company": b.company,
                    ":experience": b.experience,
                    ":specialization": specialization,
                    ":territory": b.territory,
                    ":commission_rate": b.commission_rate,
                    ":total_commission": b.total_commission,
                    ":total_deals": b.total_deals,
                    ":rating": b.rating,
                    ":notes": b.notes,
                    ":status": b.status.as_str(),
                    ":joined_date": b.joined_date,
                    ":created_at": b.created_at,
                },
            )
            .context("Failed to save broker")?;
        Ok(row_id(b.id).unwrap_or_else(|| self.conn.last_insert_rowid()))
    }

    /// A broker with their customers, newest interactions and this month's
    /// completed deal count.
    pub fn get_broker_stats(
        &self,
        id: i64,
        now: DateTime<Utc>,
        overdue_days: u32,
    ) -> CrmResult<Option<BrokerWithStats>> {
        let Some(broker) = self.get_broker(id)? else {
            return Ok(None);
        };
        let assigned_customers = self.customers_assigned_to(id)?;
        let mut recent_interactions =
            self.interactions_with_details("broker_id = ?1", params![id], now, overdue_days)?;
        recent_interactions.truncate(RECENT_INTERACTIONS);
        let monthly_deals = self.count(
            "SELECT COUNT(*) FROM interactions
             WHERE broker_id = ?1 AND status = 'completed' AND completed_date >= ?2",
            params![id, month_start(now)],
        )?;
        Ok(Some(BrokerWithStats {
            broker,
            assigned_customers,
            recent_interactions,
            monthly_deals,
        }))
    }
}
