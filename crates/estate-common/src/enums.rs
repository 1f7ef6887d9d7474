use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a column or request value is not one of an enum's wire strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed string enum with `as_str`, `Display`, `FromStr` and
/// serde support. Every variant is paired with its exact wire string.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum! {
    /// Lead priority for customers and interactions.
    pub enum Priority ("priority") {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

text_enum! {
    /// What the customer is looking to do with a property.
    pub enum Purpose ("purpose") {
        Buy => "buy",
        Rent => "rent",
        Lease => "lease",
    }
}

text_enum! {
    pub enum CustomerStatus ("customer status") {
        Active => "active",
        Inactive => "inactive",
        FollowUp => "follow-up",
        Converted => "converted",
        Closed => "closed",
    }
}

text_enum! {
    /// Listing category. Also used for a customer's preferred property type.
    pub enum PropertyType ("property type") {
        Flats => "flats",
        Bungalow => "bungalow",
        Tenement => "tenement",
        Land => "land",
    }
}

text_enum! {
    pub enum PropertyStatus ("property status") {
        Available => "available",
        Sold => "sold",
        Rented => "rented",
    }
}

text_enum! {
    pub enum Furnishing ("furnishing") {
        Furnished => "furnished",
        SemiFurnished => "semi-furnished",
        Unfurnished => "unfurnished",
    }
}

text_enum! {
    /// Whether a broker works in-house or for an outside agency.
    pub enum Affiliation ("affiliation") {
        Internal => "internal",
        External => "external",
    }
}

text_enum! {
    pub enum BrokerStatus ("broker status") {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

text_enum! {
    /// Kind of customer touchpoint.
    pub enum InteractionType ("interaction type") {
        DigitalSharing => "digital_sharing",
        FollowUp => "follow_up",
        PropertyVisit => "property_visit",
    }
}

text_enum! {
    /// Interaction lifecycle state. Transitions live in [`crate::lifecycle`].
    pub enum InteractionStatus ("interaction status") {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Paused => "paused",
        Ended => "ended",
    }
}

text_enum! {
    pub enum VisitStatus ("visit status") {
        Scheduled => "scheduled",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_enum! {
    pub enum InterestLevel ("interest level") {
        High => "high",
        Medium => "medium",
        Low => "low",
        Rejected => "rejected",
    }
}

text_enum! {
    /// How a customer came to be interested in a property.
    pub enum InterestSource ("interest source") {
        DigitalSharing => "digital_sharing",
        DirectInquiry => "direct_inquiry",
        BrokerRecommendation => "broker_recommendation",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl Default for Purpose {
    fn default() -> Self {
        Self::Buy
    }
}

impl Default for CustomerStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl Default for PropertyStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl Default for Affiliation {
    fn default() -> Self {
        Self::Internal
    }
}

impl Default for BrokerStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl Default for InteractionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for VisitStatus {
    fn default() -> Self {
        Self::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hyphenated_values_parse() {
        assert_eq!(
            "semi-furnished".parse::<Furnishing>().unwrap(),
            Furnishing::SemiFurnished
        );
        assert_eq!(
            "follow-up".parse::<CustomerStatus>().unwrap(),
            CustomerStatus::FollowUp
        );
    }

    #[test]
    fn test_every_variant_survives_as_str_and_parse() {
        for status in InteractionStatus::ALL {
            assert_eq!(status.as_str().parse::<InteractionStatus>().unwrap(), *status);
        }
        for furnishing in Furnishing::ALL {
            assert_eq!(furnishing.as_str().parse::<Furnishing>().unwrap(), *furnishing);
        }
    }

    #[test]
    fn test_unknown_value_names_the_kind() {
        let err = "hot".parse::<Priority>().unwrap_err();
        assert_eq!(err.kind, "priority");
        assert_eq!(err.to_string(), "Invalid priority: 'hot'");
    }

    #[test]
    fn test_serde_uses_wire_strings() {
        assert_eq!(
            serde_json::to_string(&InteractionStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&Furnishing::SemiFurnished).unwrap(),
            "\"semi-furnished\""
        );
        assert_eq!(
            serde_json::from_str::<InterestSource>("\"broker_recommendation\"").unwrap(),
            InterestSource::BrokerRecommendation
        );
        assert!(serde_json::from_str::<VisitStatus>("\"Completed\"").is_err());
    }

    #[test]
    fn test_defaults_match_column_defaults() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Purpose::default(), Purpose::Buy);
        assert_eq!(CustomerStatus::default(), CustomerStatus::Active);
        assert_eq!(PropertyStatus::default(), PropertyStatus::Available);
        assert_eq!(Affiliation::default(), Affiliation::Internal);
        assert_eq!(BrokerStatus::default(), BrokerStatus::Active);
        assert_eq!(InteractionStatus::default(), InteractionStatus::Pending);
        assert_eq!(VisitStatus::default(), VisitStatus::Completed);
    }
}
