//! Query-string filters for the list endpoints.
//!
//! Every parameter is optional. An empty value or `all` (what the UI's
//! select boxes send for "any") disables that filter. An unparseable value is
//! rejected so a typo does not silently return the whole table.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use super::models::*;

fn all_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

fn search_term<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty()))
}

/// True when any of `fields` contains the (already lowercased) needle.
fn contains_any<'a>(needle: &str, fields: impl IntoIterator<Item = Option<&'a str>>) -> bool {
    fields
        .into_iter()
        .flatten()
        .any(|f| f.to_lowercase().contains(needle))
}

fn eq_opt<T: PartialEq>(wanted: &Option<T>, actual: &T) -> bool {
    wanted.as_ref().is_none_or(|w| w == actual)
}

/// Price buckets from the listings page, in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceRange {
    /// Up to 50 lakh.
    UpTo50L,
    /// 50 lakh to 1 crore.
    From50LTo1Cr,
    /// 1 to 2 crore.
    From1CrTo2Cr,
    /// Above 2 crore.
    Above2Cr,
}

const LAKH_50: f64 = 5_000_000.0;
const CRORE_1: f64 = 10_000_000.0;
const CRORE_2: f64 = 20_000_000.0;

impl PriceRange {
    pub fn contains(self, price: f64) -> bool {
        match self {
            Self::UpTo50L => price <= LAKH_50,
            Self::From50LTo1Cr => price > LAKH_50 && price <= CRORE_1,
            Self::From1CrTo2Cr => price > CRORE_1 && price <= CRORE_2,
            Self::Above2Cr => price > CRORE_2,
        }
    }
}

impl FromStr for PriceRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A bare '+' in a query string decodes to a space, so "2Cr" is accepted too.
        match s.trim() {
            "0-50L" => Ok(Self::UpTo50L),
            "50L-1Cr" => Ok(Self::From50LTo1Cr),
            "1Cr-2Cr" => Ok(Self::From1CrTo2Cr),
            "2Cr+" | "2Cr" => Ok(Self::Above2Cr),
            other => Err(format!("Invalid price range: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFilter {
    #[serde(default, deserialize_with = "search_term")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub status: Option<CustomerStatus>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub assigned_broker_id: Option<i64>,
}

impl CustomerFilter {
    pub fn matches(&self, c: &Customer) -> bool {
        self.search.as_deref().is_none_or(|q| {
            contains_any(q, [Some(c.name.as_str()), Some(c.email.as_str()), Some(c.phone.as_str())])
        }) && eq_opt(&self.status, &c.status)
            && eq_opt(&self.priority, &c.priority)
            && self
                .assigned_broker_id
                .is_none_or(|b| c.assigned_broker_id == Some(b))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilter {
    #[serde(default, deserialize_with = "search_term")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub category: Option<PropertyType>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub status: Option<PropertyStatus>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub bedrooms: Option<i32>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub furnishing: Option<Furnishing>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub parking: Option<bool>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub price_range: Option<PriceRange>,
}

impl PropertyFilter {
    pub fn matches(&self, p: &Property) -> bool {
        self.search.as_deref().is_none_or(|q| {
            contains_any(q, [Some(p.title.as_str()), Some(p.location.as_str()), p.city.as_deref()])
        }) && eq_opt(&self.category, &p.category)
            && eq_opt(&self.status, &p.status)
            && self.city.as_deref().is_none_or(|city| {
                p.city
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(city))
            })
            && self.bedrooms.is_none_or(|b| p.bedrooms == Some(b))
            && self.furnishing.is_none_or(|f| p.furnishing == Some(f))
            && eq_opt(&self.parking, &p.parking)
            && self.price_range.is_none_or(|r| r.contains(p.price))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerFilter {
    #[serde(default, deserialize_with = "search_term")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub status: Option<BrokerStatus>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub affiliation: Option<Affiliation>,
}

impl BrokerFilter {
    pub fn matches(&self, b: &Broker) -> bool {
        self.search.as_deref().is_none_or(|q| {
            contains_any(q, [Some(b.name.as_str()), Some(b.email.as_str()), Some(b.phone.as_str())])
        }) && eq_opt(&self.status, &b.status)
            && eq_opt(&self.affiliation, &b.affiliation)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitFilter {
    #[serde(default, deserialize_with = "search_term")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub status: Option<VisitStatus>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub customer_id: Option<i64>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub property_id: Option<i64>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub broker_id: Option<i64>,
}

impl VisitFilter {
    pub fn matches(&self, v: &VisitWithDetails) -> bool {
        self.search.as_deref().is_none_or(|q| {
            contains_any(
                q,
                [
                    Some(v.customer.name.as_str()),
                    Some(v.property.title.as_str()),
                    Some(v.property.location.as_str()),
                ],
            )
        }) && eq_opt(&self.status, &v.visit.status)
            && eq_opt(&self.customer_id, &v.visit.customer_id)
            && eq_opt(&self.property_id, &v.visit.property_id)
            && self.broker_id.is_none_or(|b| v.visit.broker_id == Some(b))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionFilter {
    #[serde(default, deserialize_with = "search_term")]
    pub search: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "all_or_none")]
    pub kind: Option<InteractionType>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub status: Option<InteractionStatus>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub customer_id: Option<i64>,
    #[serde(default, deserialize_with = "all_or_none")]
    pub broker_id: Option<i64>,
    /// `overdue=true` keeps only overdue rows; `false` is the same as absent.
    #[serde(default, deserialize_with = "all_or_none")]
    pub overdue: Option<bool>,
}

impl InteractionFilter {
    pub fn matches(&self, i: &InteractionWithDetails) -> bool {
        self.search.as_deref().is_none_or(|q| {
            contains_any(
                q,
                [
                    Some(i.interaction.title.as_str()),
                    Some(i.customer.name.as_str()),
                    Some(i.broker.name.as_str()),
                ],
            )
        }) && eq_opt(&self.kind, &i.interaction.kind)
            && eq_opt(&self.status, &i.interaction.status)
            && eq_opt(&self.priority, &i.interaction.priority)
            && eq_opt(&self.customer_id, &i.interaction.customer_id)
            && eq_opt(&self.broker_id, &i.interaction.broker_id)
            && (self.overdue != Some(true) || i.overdue)
    }
}
