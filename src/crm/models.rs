use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use estate_common::{
    Affiliation, BrokerStatus, CustomerStatus, Furnishing, InteractionStatus, InteractionType,
    InterestLevel, InterestSource, Priority, PropertyStatus, PropertyType, Purpose, VisitStatus,
};

/// A prospective buyer or tenant with preferences and budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub occupation: Option<String>,
    pub priority: Priority,
    pub purpose: Purpose,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub property_type: Option<PropertyType>,
    pub preferred_locations: Vec<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub furnishing: Option<Furnishing>,
    pub parking: bool,
    pub amenities: Vec<String>,
    pub notes: Option<String>,
    pub status: CustomerStatus,
    pub assigned_broker_id: Option<i64>,
    pub last_interaction_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A listed real-estate asset. Area is in square feet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: PropertyType,
    pub price: f64,
    pub location: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<f64>,
    pub owner_name: Option<String>,
    pub owner_contact: Option<String>,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub furnishing: Option<Furnishing>,
    pub parking: bool,
    pub facing: Option<String>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    /// Property age in years.
    pub age: Option<i32>,
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
}

/// An agent. `commission_rate` is a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broker {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub affiliation: Affiliation,
    pub company: Option<String>,
    /// Years of experience.
    pub experience: Option<i32>,
    pub specialization: Vec<String>,
    pub territory: Option<String>,
    pub commission_rate: f64,
    pub total_commission: f64,
    pub total_deals: i32,
    pub rating: f64,
    pub notes: Option<String>,
    pub status: BrokerStatus,
    pub joined_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A logged customer touchpoint with a status lifecycle.
///
/// Digital sharing uses `shared_properties`/`shortlisted_properties`;
/// property visits use `property_id`, `visit_date`, `customer_feedback`
/// and `rating`. The remaining fields are common to every type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: i64,
    pub customer_id: i64,
    pub broker_id: i64,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub title: String,
    pub description: Option<String>,
    pub shared_properties: Vec<i64>,
    pub shortlisted_properties: Vec<i64>,
    pub property_id: Option<i64>,
    pub visit_date: Option<DateTime<Utc>>,
    pub customer_feedback: Option<String>,
    pub rating: Option<i32>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub next_follow_up_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: InteractionStatus,
    pub pause_reason: Option<String>,
    pub end_reason: Option<String>,
    pub reminder_sent: bool,
    pub last_reminder_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A physical property visit by a customer, with feedback and rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: i64,
    pub customer_id: i64,
    pub property_id: i64,
    pub broker_id: Option<i64>,
    pub visit_date: DateTime<Utc>,
    pub feedback: Option<String>,
    pub rating: Option<i32>,
    pub notes: Option<String>,
    pub status: VisitStatus,
    pub created_at: DateTime<Utc>,
}

/// One customer's interest in one property. Unique per (customer, property).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInterest {
    pub id: i64,
    pub customer_id: i64,
    pub property_id: i64,
    pub interest_level: InterestLevel,
    pub source: Option<InterestSource>,
    pub interaction_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySubCategory {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// API view types

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitWithDetails {
    #[serde(flatten)]
    pub visit: Visit,
    pub customer: Customer,
    pub property: Property,
    pub broker: Option<Broker>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionWithDetails {
    #[serde(flatten)]
    pub interaction: Interaction,
    pub customer: Customer,
    pub broker: Broker,
    pub property: Option<Property>,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerWithDetails {
    #[serde(flatten)]
    pub customer: Customer,
    pub assigned_broker: Option<Broker>,
    pub recent_interactions: Vec<InteractionWithDetails>,
    pub interested_properties: Vec<PropertyInterest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerWithStats {
    #[serde(flatten)]
    pub broker: Broker,
    pub assigned_customers: Vec<Customer>,
    pub recent_interactions: Vec<InteractionWithDetails>,
    /// Interactions this broker completed in the current month.
    pub monthly_deals: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySubCategoryWithCategory {
    #[serde(flatten)]
    pub sub_category: PropertySubCategory,
    pub category: PropertyCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_customers: i64,
    pub active_properties: i64,
    pub visits_this_month: i64,
    pub total_revenue: f64,
    pub interactions_this_month: i64,
    pub hot_leads: i64,
    pub overdue_interactions: i64,
}
