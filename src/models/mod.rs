use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of housing offered by a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Apartment,
    House,
    Dormitory,
    Studio,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::Apartment,
        PropertyType::House,
        PropertyType::Dormitory,
        PropertyType::Studio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "Apartment",
            PropertyType::House => "House",
            PropertyType::Dormitory => "Dormitory",
            PropertyType::Studio => "Studio",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apartment" => Ok(PropertyType::Apartment),
            "house" => Ok(PropertyType::House),
            "dorm" | "dormitory" => Ok(PropertyType::Dormitory),
            "studio" => Ok(PropertyType::Studio),
            other => Err(format!("unknown property type: {other}")),
        }
    }
}

/// Bathroom count, or a shared facility (dormitories)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bathrooms {
    Count(f32),
    Shared(SharedMarker),
}

/// Wire form of the literal `"Shared"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharedMarker {
    Shared,
}

impl Bathrooms {
    pub const SHARED: Bathrooms = Bathrooms::Shared(SharedMarker::Shared);

    pub fn count(&self) -> Option<f32> {
        match self {
            Bathrooms::Count(n) => Some(*n),
            Bathrooms::Shared(_) => None,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Bathrooms::Shared(_))
    }
}

impl fmt::Display for Bathrooms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bathrooms::Count(n) => write!(f, "{n}"),
            Bathrooms::Shared(_) => f.write_str("Shared"),
        }
    }
}

/// A housing listing as stored in the hosted `listings` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<String>,
    pub price: f64,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub bedrooms: u32,
    pub bathrooms: Bathrooms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub square_feet: Option<u32>,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pets_allowed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furnished: Option<bool>,
    /// Free text such as "0.3 miles"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_from_campus: Option<String>,
    #[serde(default)]
    pub utilities_included: Vec<String>,
    #[serde(default)]
    pub nearby_places: Vec<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Listing {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }
}

/// A validated listing ready for insertion; id and timestamps are assigned on insert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub bedrooms: u32,
    pub bathrooms: Bathrooms,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub square_feet: Option<u32>,
    pub location: String,
    pub address: Option<String>,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_from: Option<NaiveDate>,
    pub is_available: bool,
}

/// A row of the hosted `favorites` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: String,
    pub user_id: String,
    pub listing_id: String,
    #[serde(default)]
    pub note: Option<String>,
    /// Single collection tag standing in for grouping
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Housing preferences kept on the profile
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rent: Option<f64>,
    #[serde(default)]
    pub housing_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looking_for: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roommates: Option<bool>,
}

/// A row of the hosted `users` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub preferences: Preferences,
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

/// The authenticated user as reported by the auth service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Session held by the client after sign-in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}
