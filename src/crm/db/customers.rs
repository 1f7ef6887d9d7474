use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, named_params, params};

use super::{CrmDb, enum_col, json_col, opt_enum_col, row_id, to_json};
use crate::crm::filters::CustomerFilter;
use crate::crm::models::*;
use crate::crm::payloads::{CustomerPatch, NewCustomer};
use crate::errors::CrmResult;

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, alternate_phone, address, city, state, \
     pincode, occupation, priority, purpose, budget_min, budget_max, property_type, \
     preferred_locations, bedrooms, bathrooms, min_area, max_area, furnishing, parking, amenities, \
     notes, status, assigned_broker_id, last_interaction_date, created_at";

/// How many interactions the customer detail view embeds.
const RECENT_INTERACTIONS: usize = 5;

pub(super) fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        alternate_phone: row.get("alternate_phone")?,
        address: row.get("address")?,
        city: row.get("city")?,
        state: row.get("state")?,
        pincode: row.get("pincode")?,
        occupation: row.get("occupation")?,
        priority: enum_col(row, "priority")?,
        purpose: enum_col(row, "purpose")?,
        budget_min: row.get("budget_min")?,
        budget_max: row.get("budget_max")?,
        property_type: opt_enum_col(row, "property_type")?,
        preferred_locations: json_col(row, "preferred_locations")?,
        bedrooms: row.get("bedrooms")?,
        bathrooms: row.get("bathrooms")?,
        min_area: row.get("min_area")?,
        max_area: row.get("max_area")?,
        furnishing: opt_enum_col(row, "furnishing")?,
        parking: row.get("parking")?,
        amenities: json_col(row, "amenities")?,
        notes: row.get("notes")?,
        status: enum_col(row, "status")?,
        assigned_broker_id: row.get("assigned_broker_id")?,
        last_interaction_date: row.get("last_interaction_date")?,
        created_at: row.get("created_at")?,
    })
}

impl CrmDb {
    // ── Customer CRUD ─────────────────────────────────────────────────

    pub fn list_customers(&self, filter: &CustomerFilter) -> CrmResult<Vec<Customer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM customers ORDER BY id", CUSTOMER_COLUMNS))
            .context("Failed to prepare list_customers")?;
        let rows = stmt
            .query_map([], customer_from_row)
            .context("Failed to query customers")?;
        let mut customers = Vec::new();
        for row in rows {
            let c = row.context("Failed to read customer row")?;
            if filter.matches(&c) {
                customers.push(c);
            }
        }
        Ok(customers)
    }

    pub fn get_customer(&self, id: i64) -> CrmResult<Option<Customer>> {
        let customer = self
            .conn
            .query_row(
                &format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS),
                params![id],
                customer_from_row,
            )
            .optional()
            .context("Failed to query customer")?;
        Ok(customer)
    }

    pub fn create_customer(&self, new: NewCustomer) -> CrmResult<Customer> {
        let customer = new.into_customer(Utc::now());
        let id = self.save_customer(&customer)?;
        self.get_customer(id)?
            .context("Customer not found after insert")
            .map_err(Into::into)
    }

    /// Load, merge the patch, validate the result and write it back.
    pub fn update_customer(&self, id: i64, patch: CustomerPatch) -> CrmResult<Option<Customer>> {
        let Some(mut customer) = self.get_customer(id)? else {
            return Ok(None);
        };
        patch.apply_to(&mut customer);
        self.save_customer(&customer)?;
        self.get_customer(id)
    }

    pub fn delete_customer(&self, id: i64) -> CrmResult<bool> {
        let count = self
            .conn
            .execute("DELETE FROM customers WHERE id = ?1", params![id])
            .context("Failed to delete customer")?;
        Ok(count > 0)
    }

    /// Record that the customer was just contacted.
    pub(super) fn touch_customer(&self, id: i64, at: DateTime<Utc>) -> CrmResult<()> {
        self.conn
            .execute(
                "UPDATE customers SET last_interaction_date = ?1 WHERE id = ?2",
                params![at, id],
            )
            .context("Failed to update last_interaction_date")?;
        Ok(())
    }

    /// Insert a new customer (id 0) or overwrite an existing one.
    fn save_customer(&self, c: &Customer) -> CrmResult<i64> {
        c.validate()?;
        if let Some(broker_id) = c.assigned_broker_id {
            self.ensure_exists("brokers", "Broker", broker_id)?;
        }
        let preferred_locations = to_json(&c.preferred_locations, "preferred locations")?;
        let amenities = to_json(&c.amenities, "amenities")?;

        self.conn
            .execute(
                "INSERT INTO customers (id, name, email, phone, alternate_phone, address, city,
                     state, pincode, occupation, priority, purpose, budget_min, budget_max,
                     property_type, preferred_locations, bedrooms, bathrooms, min_area, max_area,
                     furnishing, parking, amenities, notes, status, assigned_broker_id,
                     last_interaction_date, created_at)
                 VALUES (:id, :name, :email, :phone, :alternate_phone, :address, :city,
                     :state, :pincode, :occupation, :priority, :purpose, :budget_min, :budget_max,
                     :property_type, :preferred_locations, :bedrooms, :bathrooms, :min_area,
                     :max_area, :furnishing, :parking, :amenities, :notes, :status,
                     :assigned_broker_id, :last_interaction_date, :created_at)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name, email = excluded.email, phone = excluded.phone,
                     alternate_phone = excluded.alternate_phone, address = excluded.address,
                     city = excluded.city, state = excluded.state, pincode = excluded.pincode,
                     occupation = excluded.occupation, priority = excluded.priority,
                     purpose = excluded.purpose, budget_min = excluded.budget_min,
                     budget_max = excluded.budget_max, property_type = excluded.property_type,
                     preferred_locations = excluded.preferred_locations,
                     bedrooms = excluded.bedrooms, bathrooms = excluded.bathrooms,
                     min_area = excluded.min_area, max_area = excluded.max_area,
                     furnishing = excluded.furnishing, parking = excluded.parking,
                     amenities = excluded.amenities, notes = excluded.notes,
                     status = excluded.status, assigned_broker_id = excluded.assigned_broker_id,
                     last_interaction_date = excluded.last_interaction_date",
                named_params! {
                    ":id": row_id(c.id),
                    ":name": c.name,
                    ":email": c.email,
                    ":phone": c.phone,
                    ":alternate_phone": c.alternate_phone,
                    ":address": c.address,
                    ":city": c.city,
                    ":state": c.state,
                    ":pincode": c.pincode,
                    ":occupation": c.occupation,
                    ":priority": c.priority.as_str(),
                    ":purpose": c.purpose.as_str(),
                    ":budget_min": c.budget_min,
                    ":budget_max": c.budget_max,
                    ":property_type": c.property_type.map(|t| t.as_str()),
                    ":preferred_locations": preferred_locations,
                    ":bedrooms": c.bedrooms,
                    ":bathrooms": c.bathrooms,
                    ":min_area": c.min_area,
                    ":max_area": c.max_area,
                    ":furnishing": c.furnishing.map(|f| f.as_str()),
                    ":parking": c.parking,
                    ":amenities": amenities,
                    ":notes": c.notes,
                    ":status": c.status.as_str(),
                    ":assigned_broker_id": c.assigned_broker_id,
                    ":last_interaction_date": c.last_interaction_date,
                    ":created_at": c.created_at,
                },
            )
            .context("Failed to save customer")?;
        Ok(row_id(c.id).unwrap_or_else(|| self.conn.last_insert_rowid()))
    }

    pub(super) fn customers_assigned_to(&self, broker_id: i64) -> CrmResult<Vec<Customer>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM customers WHERE assigned_broker_id = ?1 ORDER BY id",
                CUSTOMER_COLUMNS
            ))
            .context("Failed to prepare customers_assigned_to")?;
        let rows = stmt
            .query_map(params![broker_id], customer_from_row)
            .context("Failed to query assigned customers")?;
        let mut customers = Vec::new();
        for row in rows {
            customers.push(row.context("Failed to read customer row")?);
        }
        Ok(customers)
    }

    /// A customer with their broker, newest interactions and property interests.
    pub fn get_customer_details(
        &self,
        id: i64,
        now: DateTime<Utc>,
        overdue_days: u32,
    ) -> CrmResult<Option<CustomerWithDetails>> {
        let Some(customer) = self.get_customer(id)? else {
            return Ok(None);
        };
        let assigned_broker = match customer.assigned_broker_id {
            Some(broker_id) => self.get_broker(broker_id)?,
            None => None,
        };
        let mut recent_interactions =
            self.interactions_with_details("customer_id = ?1", params![id], now, overdue_days)?;
        recent_interactions.truncate(RECENT_INTERACTIONS);
        let interested_properties = self.interests_for_customer(id)?;
        Ok(Some(CustomerWithDetails {
            customer,
            assigned_broker,
            recent_interactions,
            interested_properties,
        }))
    }
}
