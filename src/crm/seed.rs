//! Sample data set for demos and local development.
//!
//! Everything goes through the normal storage write path, so the sample rows
//! obey the same validation and referential rules as API writes.

use chrono::{Duration, Utc};
use estate_common::LifecycleAction;
use serde_json::json;
use tracing::info;

use super::db::CrmDb;
use super::payloads::*;
use crate::errors::{CrmError, CrmResult};

/// What `seed_sample_data` inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub customers: usize,
    pub properties: usize,
    pub brokers: usize,
    pub visits: usize,
    pub interactions: usize,
    pub interests: usize,
    pub categories: usize,
    pub sub_categories: usize,
}

impl std::fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} customers, {} properties, {} brokers, {} visits, {} interactions, \
             {} interests, {} categories, {} sub-categories",
            self.customers,
            self.properties,
            self.brokers,
            self.visits,
            self.interactions,
            self.interests,
            self.categories,
            self.sub_categories
        )
    }
}

const CATEGORIES: &[(&str, &str, &[&str])] = &[
    ("Flats", "Apartments in multi-storey buildings", &["1 BHK", "2 BHK", "3 BHK", "4+ BHK"]),
    ("Bungalow", "Independent houses", &["Independent House", "Villa", "Row House"]),
    ("Tenement", "Ground-level attached homes", &["Single Storey", "Duplex"]),
    ("Land", "Open plots", &["Residential Plot", "Commercial Plot", "Agricultural Land"]),
];

fn from_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> CrmResult<T> {
    serde_json::from_value(value).map_err(|e| CrmError::validation(format!("Invalid sample record: {}", e)))
}

/// Load the sample data set into an empty database.
///
/// Refuses to run when customers already exist so a second invocation
/// cannot duplicate rows. The whole set is written in one transaction.
pub fn seed_sample_data(db: &CrmDb) -> CrmResult<SeedSummary> {
    if db.row_count("customers")? > 0 {
        return Err(CrmError::Conflict(
            "Database already contains customers; seed only an empty database".to_string(),
        ));
    }
    let summary = db.transaction(insert_sample_data)?;
    info!(%summary, "Seeded sample data");
    Ok(summary)
}

fn insert_sample_data(db: &CrmDb) -> CrmResult<SeedSummary> {
    let mut summary = SeedSummary::default();
    let now = Utc::now();

    for (name, description, subs) in CATEGORIES {
        let category = db.create_category(NewCategory {
            name: name.to_string(),
            description: Some(description.to_string()),
        })?;
        summary.categories += 1;
        for sub in subs.iter() {
            db.create_subcategory(NewSubCategory {
                category_id: category.id,
                name: sub.to_string(),
                description: None,
            })?;
            summary.sub_categories += 1;
        }
    }

    let broker = db.create_broker(from_json(json!({
        "name": "Amit Mehta",
        "email": "amit.mehta@email.com",
        "phone": "+91 99887 76655",
        "address": "Powai, Mumbai",
        "city": "Mumbai",
        "state": "Maharashtra",
        "pincode": "400076",
        "affiliation": "internal",
        "experience": 8,
        "specialization": ["Luxury Apartments", "Commercial Properties"],
        "territory": "Western Suburbs",
        "commissionRate": "2.5",
        "totalCommission": "240000",
        "rating": "4.5",
        "notes": "Expert in luxury properties",
    }))?)?;
    summary.brokers += 1;

    let rajesh = db.create_customer(from_json(json!({
        "name": "Rajesh Kumar",
        "email": "rajesh.kumar@email.com",
        "phone": "+91 98765 43210",
        "address": "Andheri West, Mumbai",
        "city": "Mumbai",
        "state": "Maharashtra",
        "pincode": "400058",
        "occupation": "Software Engineer",
        "priority": "medium",
        "purpose": "buy",
        "budgetMin": "8000000",
        "budgetMax": "12000000",
        "propertyType": "flats",
        "preferredLocations": ["Andheri", "Bandra", "Juhu"],
        "bedrooms": 3,
        "parking": true,
        "assignedBrokerId": broker.id,
        "notes": "Looking for properties in Andheri area",
    }))?)?;
    let priya = db.create_customer(from_json(json!({
        "name": "Priya Sharma",
        "email": "priya.sharma@email.com",
        "phone": "+91 87654 32109",
        "alternatePhone": "+91 22345 67890",
        "address": "Bandra East, Mumbai",
        "city": "Mumbai",
        "state": "Maharashtra",
        "pincode": "400051",
        "occupation": "Business Owner",
        "priority": "high",
        "purpose": "buy",
        "budgetMin": "15000000",
        "budgetMax": "20000000",
        "propertyType": "bungalow",
        "preferredLocations": ["Bandra", "Khar", "Santacruz"],
        "amenities": ["Garden"],
        "assignedBrokerId": broker.id,
        "notes": "Prefers properties with garden space",
    }))?)?;
    summary.customers += 2;

    let sunrise = db.create_property(from_json(json!({
        "title": "Sunrise Apartments",
        "description": "Modern residential complex with swimming pool and landscaped gardens",
        "category": "flats",
        "price": "8500000",
        "location": "Andheri West, Mumbai",
        "address": "Plot No. 123, Andheri West, Mumbai - 400058",
        "latitude": "19.1359",
        "longitude": "72.8267",
        "city": "Mumbai",
        "state": "Maharashtra",
        "pincode": "400058",
        "bedrooms": 3,
        "bathrooms": 2,
        "area": "1200",
        "ownerName": "Sharma Builders",
        "ownerContact": "+91 99887 76655",
        "amenities": ["Swimming Pool", "Gym", "Garden", "Parking"],
        "furnishing": "semi-furnished",
        "parking": true,
        "facing": "east",
        "floor": 5,
        "totalFloors": 12,
        "age": 3,
    }))?)?;
    db.create_property(from_json(json!({
        "title": "Green Valley Bungalow",
        "description": "Elegant single-family home with large windows and modern architecture",
        "category": "bungalow",
        "price": "12000000",
        "location": "Bandra, Mumbai",
        "address": "Bungalow No. 45, Bandra West, Mumbai - 400050",
        "latitude": "19.0596",
        "longitude": "72.8295",
        "city": "Mumbai",
        "state": "Maharashtra",
        "pincode": "400050",
        "bedrooms": 4,
        "bathrooms": 3,
        "area": "2500",
        "ownerName": "Ravi Patel",
        "ownerContact": "+91 88776 65544",
        "amenities": ["Garden", "Terrace", "Parking", "Security"],
        "furnishing": "furnished",
        "parking": true,
        "facing": "north",
        "age": 5,
    }))?)?;
    summary.properties += 2;

    db.create_visit(NewVisit {
        customer_id: rajesh.id,
        property_id: sunrise.id,
        broker_id: Some(broker.id),
        visit_date: now - Duration::days(3),
        feedback: Some(
            "Very impressed with the amenities and location. Considering making an offer."
                .to_string(),
        ),
        rating: Some(5),
        notes: Some("Customer showed high interest".to_string()),
        status: Default::default(),
    })?;
    summary.visits += 1;

    let shared = db.create_interaction(from_json(json!({
        "customerId": rajesh.id,
        "brokerId": broker.id,
        "type": "digital_sharing",
        "title": "Shared Sunrise Apartments on WhatsApp",
        "description": "Shared property details and virtual tour link",
        "sharedProperties": [sunrise.id],
        "shortlistedProperties": [sunrise.id],
        "propertyId": sunrise.id,
        "priority": "high",
        "nextFollowUpDate": now + Duration::days(2),
        "notes": "Customer loved the amenities and location",
    }))?)?;
    db.complete_interaction(
        shared.id,
        CompleteRequest {
            completed_date: None,
            customer_feedback: Some("Very interested, wants to schedule visit".to_string()),
            rating: None,
        },
    )?;

    let follow_up = db.create_interaction(from_json(json!({
        "customerId": priya.id,
        "brokerId": broker.id,
        "type": "follow_up",
        "title": "Requirement follow-up call",
        "description": "Follow-up call to understand requirements better",
        "priority": "medium",
        "nextFollowUpDate": now + Duration::days(3),
        "notes": "Needs properties with garden space",
    }))?)?;
    db.transition_interaction(follow_up.id, LifecycleAction::Start)?;
    summary.interactions += 2;

    db.upsert_property_interest(NewPropertyInterest {
        customer_id: rajesh.id,
        property_id: sunrise.id,
        interest_level: estate_common::InterestLevel::High,
        source: Some(estate_common::InterestSource::DigitalSharing),
        interaction_id: Some(shared.id),
        notes: Some("Primary choice for the customer".to_string()),
    })?;
    summary.interests += 1;

    Ok(summary)
}
