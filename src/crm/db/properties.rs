use anyhow::Context;
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, named_params, params};

use super::{CrmDb, enum_col, json_col, opt_enum_col, row_id, to_json};
use crate::crm::filters::PropertyFilter;
use crate::crm::models::*;
use crate::crm::payloads::{NewProperty, PropertyPatch};
use crate::errors::CrmResult;

const PROPERTY_COLUMNS: &str = "id, title, description, category, price, location, address, \
     latitude, longitude, city, state, pincode, bedrooms, bathrooms, area, owner_name, \
     owner_contact, images, amenities, furnishing, parking, facing, floor, total_floors, age, \
     status, created_at";

pub(super) fn property_from_row(row: &Row<'_>) -> rusqlite::Result<Property> {
    Ok(Property {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        category: enum_col(row, "category")?,
        price: row.get("price")?,
        location: row.get("location")?,
        address: row.get("address")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        city: row.get("city")?,
        state: row.get("state")?,
        pincode: row.get("pincode")?,
        bedrooms: row.get("bedrooms")?,
        bathrooms: row.get("bathrooms")?,
        area: row.get("area")?,
        owner_name: row.get("owner_name")?,
        owner_contact: row.get("owner_contact")?,
        images: json_col(row, "images")?,
        amenities: json_col(row, "amenities")?,
        furnishing: opt_enum_col(row, "furnishing")?,
        parking: row.get("parking")?,
        facing: row.get("facing")?,
        floor: row.get("floor")?,
        total_floors: row.get("total_floors")?,
        age: row.get("age")?,
        status: enum_col(row, "status")?,
        created_at: row.get("created_at")?,
    })
}

impl CrmDb {
    // ── Property CRUD ─────────────────────────────────────────────────

    pub fn list_properties(&self, filter: &PropertyFilter) -> CrmResult<Vec<Property>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM properties ORDER BY id", PROPERTY_COLUMNS))
            .context("Failed to prepare list_properties")?;
        let rows = stmt
            .query_map([], property_from_row)
            .context("Failed to query properties")?;
        let mut properties = Vec::new();
        for row in rows {
            let p = row.context("Failed to read property row")?;
            if filter.matches(&p) {
                properties.push(p);
            }
        }
        Ok(properties)
    }

    pub fn get_property(&self, id: i64) -> CrmResult<Option<Property>> {
        let property = self
            .conn
            .query_row(
                &format!("SELECT {} FROM properties WHERE id = ?1", PROPERTY_COLUMNS),
                params![id],
                property_from_row,
            )
            .optional()
            .context("Failed to query property")?;
        Ok(property)
    }

    pub fn create_property(&self, new: NewProperty) -> CrmResult<Property> {
        let property = new.into_property(Utc::now());
        let id = self.save_property(&property)?;
        self.get_property(id)?
            .context("Property not found after insert")
            .map_err(Into::into)
    }

    pub fn update_property(&self, id: i64, patch: PropertyPatch) -> CrmResult<Option<Property>> {
        let Some(mut property) = self.get_property(id)? else {
            return Ok(None);
        };
        patch.apply_to(&mut property);
        self.save_property(&property)?;
        self.get_property(id)
    }

    /// Fails with `Conflict` while visits or interests still reference the listing.
    pub fn delete_property(&self, id: i64) -> CrmResult<bool> {
        let count = self
            .conn
            .execute("DELETE FROM properties WHERE id = ?1", params![id])
            .context("Failed to delete property")?;
        Ok(count > 0)
    }

    fn save_property(&self, p: &Property) -> CrmResult<i64> {
        p.validate()?;
        let images = to_json(&p.images, "images")?;
        let amenities = to_json(&p.amenities, "amenities")?;

        self.conn
            .execute(
                "INSERT INTO properties (id, title, description, category, price, location,
                     address, latitude, longitude, city, state, pincode, bedrooms, bathrooms,
                     area, owner_name, owner_contact, images, amenities, furnishing, parking,
                     facing, floor, total_floors, age, status, created_at)
                 VALUES (:id, :title, :description, :category, :price, :location,
                     :address, :latitude, :longitude, :city, :state, :pincode, :bedrooms,
                     :bathrooms, :area, :owner_name, :owner_contact, :images, :amenities,
                     :furnishing, :parking, :facing, :floor, :total_floors, :age, :status,
                     :created_at)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title, description = excluded.description,
                     category = excluded.category, price = excluded.price,
                     location = excluded.location, address = excluded.address,
                     latitude = excluded.latitude, longitude = excluded.longitude,
                     city = excluded.city, state = excluded.state, pincode = excluded.pincode,
                     bedrooms = excluded.bedrooms, bathrooms = excluded.bathrooms,
                     area = excluded.area, owner_name = excluded.owner_name,
                     owner_contact = excluded.owner_contact, images = excluded.images,
                     amenities = excluded.amenities, furnishing = excluded.furnishing,
                     parking = excluded.parking, facing = excluded.facing,
                     floor = excluded.floor, total_floors = excluded.total_floors,
                     age = excluded.age, status = excluded.status",
                named_params! {
                    ":id": row_id(p.id),
                    ":title": p.title,
                    ":description": p.description,
                    ":category": p.category.as_str(),
                    ":price": p.price,
                    ":location": p.location,
                    ":address": p.address,
                    ":latitude": p.latitude,
                    ":longitude": p.longitude,
                    ":city": p.city,
                    ":state": p.state,
                    ":pincode": p.pincode,
                    ":bedrooms": p.bedrooms,
                    ":bathrooms": p.bathrooms,
                    ":area": p.area,
                    ":owner_name": p.owner_name,
                    ":owner_contact": p.owner_contact,
                    ":images": images,
                    ":amenities": amenities,
                    ":furnishing": p.furnishing.map(|f| f.as_str()),
                    ":parking": p.parking,
                    ":facing": p.facing,
                    ":floor": p.floor,
                    ":total_floors": p.total_floors,
                    ":age": p.age,
                    ":status": p.status.as_str(),
                    ":created_at": p.created_at,
                },
            )
            .context("Failed to save property")?;
        Ok(row_id(p.id).unwrap_or_else(|| self.conn.last_insert_rowid()))
    }
}
