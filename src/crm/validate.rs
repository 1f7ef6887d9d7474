//! Field-level validation for CRM records.
//!
//! Validation runs on the fully-merged record right before it is written, so
//! create and partial-update share one rule set and a patch cannot leave a
//! record in a state that a create would have rejected.

use crate::errors::{CrmError, CrmResult};

use super::models::{Broker, Customer, Interaction, Property, PropertyInterest, Visit};

/// Accumulates every problem with a record instead of failing on the first.
#[derive(Debug, Default)]
pub struct Checks {
    problems: Vec<String>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.problems.push(format!("{} is required", field));
        }
        self
    }

    pub fn email(mut self, field: &str, value: &str) -> Self {
        if !value.trim().is_empty() && !looks_like_email(value) {
            self.problems
                .push(format!("{} must be a valid email address", field));
        }
        self
    }

    pub fn non_negative(mut self, field: &str, value: Option<f64>) -> Self {
        if let Some(v) = value {
            if v < 0.0 {
                self.problems.push(format!("{} must not be negative", field));
            }
        }
        self
    }

    pub fn non_negative_int(mut self, field: &str, value: Option<i32>) -> Self {
        if let Some(v) = value {
            if v < 0 {
                self.problems.push(format!("{} must not be negative", field));
            }
        }
        self
    }

    pub fn within(mut self, field: &str, value: Option<f64>, min: f64, max: f64) -> Self {
        if let Some(v) = value {
            if v < min || v > max {
                self.problems
                    .push(format!("{} must be between {} and {}", field, min, max));
            }
        }
        self
    }

    pub fn rating(mut self, field: &str, value: Option<i32>) -> Self {
        if let Some(v) = value {
            if !(1..=5).contains(&v) {
                self.problems
                    .push(format!("{} must be between 1 and 5", field));
            }
        }
        self
    }

    /// `low` must not exceed `high` when both are present.
    pub fn ordered<T: PartialOrd>(
        mut self,
        low_field: &str,
        low: Option<T>,
        high_field: &str,
        high: Option<T>,
    ) -> Self {
        if let (Some(l), Some(h)) = (low, high) {
            if l > h {
                self.problems
                    .push(format!("{} must not exceed {}", low_field, high_field));
            }
        }
        self
    }

    pub fn finish(self) -> CrmResult<()> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(CrmError::Validation(self.problems.join("; ")))
        }
    }
}

fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

impl Customer {
    pub fn validate(&self) -> CrmResult<()> {
        Checks::new()
            .required("name", &self.name)
            .required("email", &self.email)
            .email("email", &self.email)
            .required("phone", &self.phone)
            .non_negative("budgetMin", self.budget_min)
            .non_negative("budgetMax", self.budget_max)
            .ordered("budgetMin", self.budget_min, "budgetMax", self.budget_max)
            .non_negative("minArea", self.min_area)
            .non_negative("maxArea", self.max_area)
            .ordered("minArea", self.min_area, "maxArea", self.max_area)
            .non_negative_int("bedrooms", self.bedrooms)
            .non_negative_int("bathrooms", self.bathrooms)
            .finish()
    }
}

impl Property {
    pub fn validate(&self) -> CrmResult<()> {
        Checks::new()
            .required("title", &self.title)
            .required("location", &self.location)
            .non_negative("price", Some(self.price))
            .non_negative("area", self.area)
            .within("latitude", self.latitude, -90.0, 90.0)
            .within("longitude", self.longitude, -180.0, 180.0)
            .non_negative_int("bedrooms", self.bedrooms)
            .non_negative_int("bathrooms", self.bathrooms)
            .non_negative_int("totalFloors", self.total_floors)
            .non_negative_int("age", self.age)
            .ordered("floor", self.floor, "totalFloors", self.total_floors)
            .finish()
    }
}

impl Broker {
    pub fn validate(&self) -> CrmResult<()> {
        Checks::new()
            .required("name", &self.name)
            .required("email", &self.email)
            .email("email", &self.email)
            .required("phone", &self.phone)
            .non_negative_int("experience", self.experience)
            .within("commissionRate", Some(self.commission_rate), 0.0, 100.0)
            .non_negative("totalCommission", Some(self.total_commission))
            .non_negative_int("totalDeals", Some(self.total_deals))
            .within("rating", Some(self.rating), 0.0, 5.0)
            .finish()
    }
}

impl Interaction {
    pub fn validate(&self) -> CrmResult<()> {
        Checks::new()
            .required("title", &self.title)
            .rating("rating", self.rating)
            .finish()
    }
}

impl Visit {
    pub fn validate(&self) -> CrmResult<()> {
        Checks::new().rating("rating", self.rating).finish()
    }
}

impl PropertyInterest {
    pub fn validate(&self) -> CrmResult<()> {
        Checks::new().finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checks_collect_every_problem() {
        let err = Checks::new()
            .required("name", "  ")
            .rating("rating", Some(9))
            .finish()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "name is required; rating must be between 1 and 5"
        );
    }

    #[test]
    fn test_checks_pass_when_clean() {
        assert!(
            Checks::new()
                .required("name", "Asha")
                .email("email", "asha@example.com")
                .ordered("budgetMin", Some(1.0), "budgetMax", Some(2.0))
                .finish()
                .is_ok()
        );
    }

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("rajesh.kumar@email.com"));
        assert!(!looks_like_email("rajesh.kumar"));
        assert!(!looks_like_email("@email.com"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("a b@c.com"));
        assert!(!looks_like_email("a@@c.com"));
    }

    #[test]
    fn test_ordered_skips_missing_bounds() {
        assert!(
            Checks::new()
                .ordered("minArea", Some(900.0), "maxArea", None::<f64>)
                .finish()
                .is_ok()
        );
        assert!(
            Checks::new()
                .ordered("floor", Some(14), "totalFloors", Some(12))
                .finish()
                .is_err()
        );
    }
}
