//! Request bodies for create, partial update and lifecycle actions.
//!
//! `New*` payloads carry required fields as plain values and fall back to the
//! record defaults for everything else. `*Patch` payloads make every field
//! optional; nullable columns use `double_option` so an explicit `null` clears
//! the value while an absent field leaves it alone.

use chrono::{DateTime, Utc};
use estate_common::serde_helpers::{
    decimal, double_option, opt_decimal, patch_decimal, present_decimal,
};
use serde::Deserialize;

use crate::errors::CrmResult;

use super::models::*;
use super::validate::Checks;

/// Checks a payload can run before it reaches storage.
///
/// Storage validates the merged record again, so these only need to catch
/// what can be judged from the payload alone.
pub trait Validate {
    fn validate(&self) -> CrmResult<()>;
}

/// Overwrite `slot` when the patch carries a value for it.
fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

// ── Customers ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub alternate_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub purpose: Purpose,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub budget_min: Option<f64>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub budget_max: Option<f64>,
    #[serde(default)]
    pub property_type: Option<PropertyType>,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    #[serde(default)]
    pub bedrooms: Option<i32>,
    #[serde(default)]
    pub bathrooms: Option<i32>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub min_area: Option<f64>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub max_area: Option<f64>,
    #[serde(default)]
    pub furnishing: Option<Furnishing>,
    #[serde(default)]
    pub parking: bool,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: CustomerStatus,
    #[serde(default)]
    pub assigned_broker_id: Option<i64>,
}

impl NewCustomer {
    /// Build the record to insert. The id is assigned by storage.
    pub fn into_customer(self, now: DateTime<Utc>) -> Customer {
        Customer {
            id: 0,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            alternate_phone: self.alternate_phone,
            address: self.address,
            city: self.city,
            state: self.state,
            pincode: self.pincode,
            occupation: self.occupation,
            priority: self.priority,
            purpose: self.purpose,
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            property_type: self.property_type,
            preferred_locations: self.preferred_locations,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            min_area: self.min_area,
            max_area: self.max_area,
            furnishing: self.furnishing,
            parking: self.parking,
            amenities: self.amenities,
            notes: self.notes,
            status: self.status,
            assigned_broker_id: self.assigned_broker_id,
            last_interaction_date: None,
            created_at: now,
        }
    }
}

impl Validate for NewCustomer {
    fn validate(&self) -> CrmResult<()> {
        self.clone().into_customer(Utc::now()).validate()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub alternate_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub pincode: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub occupation: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub purpose: Option<Purpose>,
    #[serde(default, deserialize_with = "patch_decimal")]
    pub budget_min: Option<Option<f64>>,
    #[serde(default, deserialize_with = "patch_decimal")]
    pub budget_max: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub property_type: Option<Option<PropertyType>>,
    pub preferred_locations: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bedrooms: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bathrooms: Option<Option<i32>>,
    #[serde(default, deserialize_with = "patch_decimal")]
    pub min_area: Option<Option<f64>>,
    #[serde(default, deserialize_with = "patch_decimal")]
    pub max_area: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub furnishing: Option<Option<Furnishing>>,
    pub parking: Option<bool>,
    pub amenities: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub status: Option<CustomerStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_broker_id: Option<Option<i64>>,
}

impl CustomerPatch {
    pub fn apply_to(self, c: &mut Customer) {
        set(&mut c.name, self.name.map(|s| s.trim().to_string()));
        set(&mut c.email, self.email.map(|s| s.trim().to_string()));
        set(&mut c.phone, self.phone.map(|s| s.trim().to_string()));
        set(&mut c.alternate_phone, self.alternate_phone);
        set(&mut c.address, self.address);
        set(&mut c.city, self.city);
        set(&mut c.state, self.state);
        set(&mut c.pincode, self.pincode);
        set(&mut c.occupation, self.occupation);
        set(&mut c.priority, self.priority);
        set(&mut c.purpose, self.purpose);
        set(&mut c.budget_min, self.budget_min);
        set(&mut c.budget_max, self.budget_max);
        set(&mut c.property_type, self.property_type);
        set(&mut c.preferred_locations, self.preferred_locations);
        set(&mut c.bedrooms, self.bedrooms);
        set(&mut c.bathrooms, self.bathrooms);
        set(&mut c.min_area, self.min_area);
        set(&mut c.max_area, self.max_area);
        set(&mut c.furnishing, self.furnishing);
        set(&mut c.parking, self.parking);
        set(&mut c.amenities, self.amenities);
        set(&mut c.notes, self.notes);
        set(&mut c.status, self.status);
        set(&mut c.assigned_broker_id, self.assigned_broker_id);
    }
}

impl Validate for CustomerPatch {
    fn validate(&self) -> CrmResult<()> {
        let mut checks = Checks::new();
        if let Some(name) = &self.name {
            checks = checks.required("name", name);
        }
        if let Some(email) = &self.email {
            checks = checks.required("email", email).email("email", email);
        }
        if let Some(phone) = &self.phone {
            checks = checks.required("phone", phone);
        }
        checks
            .non_negative("budgetMin", self.budget_min.flatten())
            .non_negative("budgetMax", self.budget_max.flatten())
            .non_negative("minArea", self.min_area.flatten())
            .non_negative("maxArea", self.max_area.flatten())
            .finish()
    }
}

// ── Properties ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: PropertyType,
    #[serde(deserialize_with = "decimal")]
    pub price: f64,
    pub location: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<i32>,
    #[serde(default)]
    pub bathrooms: Option<i32>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub area: Option<f64>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_contact: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub furnishing: Option<Furnishing>,
    #[serde(default)]
    pub parking: bool,
    #[serde(default)]
    pub facing: Option<String>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub total_floors: Option<i32>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub status: PropertyStatus,
}

impl NewProperty {
    pub fn into_property(self, now: DateTime<Utc>) -> Property {
        Property {
            id: 0,
            title: self.title.trim().to_string(),
            description: self.description,
            category: self.category,
            price: self.price,
            location: self.location.trim().to_string(),
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            city: self.city,
            state: self.state,
            pincode: self.pincode,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            owner_name: self.owner_name,
            owner_contact: self.owner_contact,
            images: self.images,
            amenities: self.amenities,
            furnishing: self.furnishing,
            parking: self.parking,
            facing: self.facing,
            floor: self.floor,
            total_floors: self.total_floors,
            age: self.age,
            status: self.status,
            created_at: now,
        }
    }
}

impl Validate for NewProperty {
    fn validate(&self) -> CrmResult<()> {
        self.clone().into_property(Utc::now()).validate()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub category: Option<PropertyType>,
    #[serde(default, deserialize_with = "present_decimal")]
    pub price: Option<f64>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_decimal")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "patch_decimal")]
    pub longitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub pincode: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bedrooms: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bathrooms: Option<Option<i32>>,
    #[serde(default, deserialize_with = "patch_decimal")]
    pub area: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub owner_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub owner_contact: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub furnishing: Option<Option<Furnishing>>,
    pub parking: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub facing: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub floor: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub total_floors: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub age: Option<Option<i32>>,
    pub status: Option<PropertyStatus>,
}

impl PropertyPatch {
    pub fn apply_to(self, p: &mut Property) {
        set(&mut p.title, self.title.map(|s| s.trim().to_string()));
        set(&mut p.description, self.description);
        set(&mut p.category, self.category);
        set(&mut p.price, self.price);
        set(&mut p.location, self.location.map(|s| s.trim().to_string()));
        set(&mut p.address, self.address);
        set(&mut p.latitude, self.latitude);
        set(&mut p.longitude, self.longitude);
        set(&mut p.city, self.city);
        set(&mut p.state, self.state);
        set(&mut p.pincode, self.pincode);
        set(&mut p.bedrooms, self.bedrooms);
        set(&mut p.bathrooms, self.bathrooms);
        set(&mut p.area, self.area);
        set(&mut p.owner_name, self.owner_name);
        set(&mut p.owner_contact, self.owner_contact);
        set(&mut p.images, self.images);
        set(&mut p.amenities, self.amenities);
        set(&mut p.furnishing, self.furnishing);
        set(&mut p.parking, self.parking);
        set(&mut p.facing, self.facing);
        set(&mut p.floor, self.floor);
        set(&mut p.total_floors, self.total_floors);
        set(&mut p.age, self.age);
        set(&mut p.status, self.status);
    }
}

impl Validate for PropertyPatch {
    fn validate(&self) -> CrmResult<()> {
        let mut checks = Checks::new();
        if let Some(title) = &self.title {
            checks = checks.required("title", title);
        }
        if let Some(location) = &self.location {
            checks = checks.required("location", location);
        }
        checks
            .non_negative("price", self.price)
            .non_negative("area", self.area.flatten())
            .within("latitude", self.latitude.flatten(), -90.0, 90.0)
            .within("longitude", self.longitude.flatten(), -180.0, 180.0)
            .finish()
    }
}

// ── Brokers ───────────────────────────────────────────────────────────

fn default_commission_rate() -> f64 {
    2.5
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBroker {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub alternate_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub affiliation: Affiliation,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub experience: Option<i32>,
    #[serde(default)]
    pub specialization: Vec<String>,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub commission_rate: Option<f64>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub total_commission: Option<f64>,
    #[serde(default)]
    pub total_deals: i32,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: BrokerStatus,
    #[serde(default)]
    pub joined_date: Option<DateTime<Utc>>,
}

impl NewBroker {
    pub fn into_broker(self, now: DateTime<Utc>) -> Broker {
        Broker {
            id: 0,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            alternate_phone: self.alternate_phone,
            address: self.address,
            city: self.city,
            state: self.state,
            pincode: self.pincode,
            affiliation: self.affiliation,
            company: self.company,
            experience: self.experience,
            specialization: self.specialization,
            territory: self.territory,
            commission_rate: self.commission_rate.unwrap_or_else(default_commission_rate),
            total_commission: self.total_commission.unwrap_or(0.0),
            total_deals: self.total_deals,
            rating: self.rating.unwrap_or(0.0),
            notes: self.notes,
            status: self.status,
            joined_date: self.joined_date,
            created_at: now,
        }
    }
}

impl Validate for NewBroker {
    fn validate(&self) -> CrmResult<()> {
        self.clone().into_broker(Utc::now()).validate()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub alternate_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub pincode: Option<Option<String>>,
    pub affiliation: Option<Affiliation>,
    #[serde(default, deserialize_with = "double_option")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub experience: Option<Option<i32>>,
    pub specialization: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub territory: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_decimal")]
    pub commission_rate: Option<f64>,
    #[serde(default, deserialize_with = "present_decimal")]
    pub total_commission: Option<f64>,
    pub total_deals: Option<i32>,
    #[serde(default, deserialize_with = "present_decimal")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub status: Option<BrokerStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub joined_date: Option<Option<DateTime<Utc>>>,
}

impl BrokerPatch {
    pub fn apply_to(self, b: &mut Broker) {
        set(&mut b.name, self.name.map(|s| s.trim().to_string()));
        set(&mut b.email, self.email.map(|s| s.trim().to_string()));
        set(&mut b.phone, self.phone.map(|s| s.trim().to_string()));
        set(&mut b.alternate_phone, self.alternate_phone);
        set(&mut b.address, self.address);
        set(&mut b.city, self.city);
        set(&mut b.state, self.state);
        set(&mut b.pincode, self.pincode);
        set(&mut b.affiliation, self.affiliation);
        set(&mut b.company, self.company);
        set(&mut b.experience, self.experience);
        set(&mut b.specialization, self.specialization);
        set(&mut b.territory, self.territory);
        set(&mut b.commission_rate, self.commission_rate);
        set(&mut b.total_commission, self.total_commission);
        set(&mut b.total_deals, self.total_deals);
        set(&mut b.rating, self.rating);
        set(&mut b.notes, self.notes);
        set(&mut b.status, self.status);
        set(&mut b.joined_date, self.joined_date);
    }
}

impl Validate for BrokerPatch {
    fn validate(&self) -> CrmResult<()> {
        let mut checks = Checks::new();
        if let Some(name) = &self.name {
            checks = checks.required("name", name);
        }
        if let Some(email) = &self.email {
            checks = checks.required("email", email).email("email", email);
        }
        if let Some(phone) = &self.phone {
            checks = checks.required("phone", phone);
        }
        checks
            .within("commissionRate", self.commission_rate, 0.0, 100.0)
            .non_negative("totalCommission", self.total_commission)
            .within("rating", self.rating, 0.0, 5.0)
            .finish()
    }
}

// ── Visits ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVisit {
    pub customer_id: i64,
    pub property_id: i64,
    #[serde(default)]
    pub broker_id: Option<i64>,
    pub visit_date: DateTime<Utc>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: VisitStatus,
}

impl NewVisit {
    pub fn into_visit(self, now: DateTime<Utc>) -> Visit {
        Visit {
            id: 0,
            customer_id: self.customer_id,
            property_id: self.property_id,
            broker_id: self.broker_id,
            visit_date: self.visit_date,
            feedback: self.feedback,
            rating: self.rating,
            notes: self.notes,
            status: self.status,
            created_at: now,
        }
    }
}

impl Validate for NewVisit {
    fn validate(&self) -> CrmResult<()> {
        self.clone().into_visit(Utc::now()).validate()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitPatch {
    pub customer_id: Option<i64>,
    pub property_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub broker_id: Option<Option<i64>>,
    pub visit_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub feedback: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub rating: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub status: Option<VisitStatus>,
}

impl VisitPatch {
    pub fn apply_to(self, v: &mut Visit) {
        set(&mut v.customer_id, self.customer_id);
        set(&mut v.property_id, self.property_id);
        set(&mut v.broker_id, self.broker_id);
        set(&mut v.visit_date, self.visit_date);
        set(&mut v.feedback, self.feedback);
        set(&mut v.rating, self.rating);
        set(&mut v.notes, self.notes);
        set(&mut v.status, self.status);
    }
}

impl Validate for VisitPatch {
    fn validate(&self) -> CrmResult<()> {
        Checks::new().rating("rating", self.rating.flatten()).finish()
    }
}

// ── Interactions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInteraction {
    pub customer_id: i64,
    pub broker_id: i64,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub shared_properties: Vec<i64>,
    #[serde(default)]
    pub shortlisted_properties: Vec<i64>,
    #[serde(default)]
    pub property_id: Option<i64>,
    #[serde(default)]
    pub visit_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer_feedback: Option<String>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_follow_up_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewInteraction {
    /// New interactions always start out pending.
    pub fn into_interaction(self, now: DateTime<Utc>) -> Interaction {
        Interaction {
            id: 0,
            customer_id: self.customer_id,
            broker_id: self.broker_id,
            kind: self.kind,
            title: self.title.trim().to_string(),
            description: self.description,
            shared_properties: self.shared_properties,
            shortlisted_properties: self.shortlisted_properties,
            property_id: self.property_id,
            visit_date: self.visit_date,
            customer_feedback: self.customer_feedback,
            rating: self.rating,
            scheduled_date: self.scheduled_date,
            completed_date: None,
            next_follow_up_date: self.next_follow_up_date,
            priority: self.priority,
            status: InteractionStatus::Pending,
            pause_reason: None,
            end_reason: None,
            reminder_sent: false,
            last_reminder_date: None,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Validate for NewInteraction {
    fn validate(&self) -> CrmResult<()> {
        self.clone().into_interaction(Utc::now()).validate()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionPatch {
    pub customer_id: Option<i64>,
    pub broker_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<InteractionType>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub shared_properties: Option<Vec<i64>>,
    pub shortlisted_properties: Option<Vec<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub property_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub visit_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub customer_feedback: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub rating: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub scheduled_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub completed_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub next_follow_up_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Priority>,
    pub status: Option<InteractionStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub pause_reason: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_reason: Option<Option<String>>,
    pub reminder_sent: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub last_reminder_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl InteractionPatch {
    /// Apply every field except `status`, which storage routes through the
    /// lifecycle rules.
    pub fn apply_to(self, i: &mut Interaction) {
        set(&mut i.customer_id, self.customer_id);
        set(&mut i.broker_id, self.broker_id);
        set(&mut i.kind, self.kind);
        set(&mut i.title, self.title.map(|s| s.trim().to_string()));
        set(&mut i.description, self.description);
        set(&mut i.shared_properties, self.shared_properties);
        set(&mut i.shortlisted_properties, self.shortlisted_properties);
        set(&mut i.property_id, self.property_id);
        set(&mut i.visit_date, self.visit_date);
        set(&mut i.customer_feedback, self.customer_feedback);
        set(&mut i.rating, self.rating);
        set(&mut i.scheduled_date, self.scheduled_date);
        set(&mut i.completed_date, self.completed_date);
        set(&mut i.next_follow_up_date, self.next_follow_up_date);
        set(&mut i.priority, self.priority);
        set(&mut i.pause_reason, self.pause_reason);
        set(&mut i.end_reason, self.end_reason);
        set(&mut i.reminder_sent, self.reminder_sent);
        set(&mut i.last_reminder_date, self.last_reminder_date);
        set(&mut i.notes, self.notes);
    }
}

impl Validate for InteractionPatch {
    fn validate(&self) -> CrmResult<()> {
        let mut checks = Checks::new();
        if let Some(title) = &self.title {
            checks = checks.required("title", title);
        }
        checks.rating("rating", self.rating.flatten()).finish()
    }
}

/// Body of `PATCH /api/interactions/{id}/complete`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer_feedback: Option<String>,
    #[serde(default)]
    pub rating: Option<i32>,
}

impl Validate for CompleteRequest {
    fn validate(&self) -> CrmResult<()> {
        Checks::new().rating("rating", self.rating).finish()
    }
}

/// Body of the pause and end actions.
#[derive(Debug, Clone, Deserialize)]
pub struct ReasonRequest {
    pub reason: String,
}

impl Validate for ReasonRequest {
    fn validate(&self) -> CrmResult<()> {
        Checks::new().required("reason", &self.reason).finish()
    }
}

// ── Property interests and categories ─────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPropertyInterest {
    pub customer_id: i64,
    pub property_id: i64,
    pub interest_level: InterestLevel,
    #[serde(default)]
    pub source: Option<InterestSource>,
    #[serde(default)]
    pub interaction_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewPropertyInterest {
    pub fn into_interest(self, now: DateTime<Utc>) -> PropertyInterest {
        PropertyInterest {
            id: 0,
            customer_id: self.customer_id,
            property_id: self.property_id,
            interest_level: self.interest_level,
            source: self.source,
            interaction_id: self.interaction_id,
            notes: self.notes,
            created_at: now,
        }
    }
}

impl Validate for NewPropertyInterest {
    fn validate(&self) -> CrmResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for NewCategory {
    fn validate(&self) -> CrmResult<()> {
        Checks::new().required("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubCategory {
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for NewSubCategory {
    fn validate(&self) -> CrmResult<()> {
        Checks::new().required("name", &self.name).finish()
    }
}
