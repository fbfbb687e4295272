//! Domain types shared by every crate in the workspace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorContext, RentalsError};

/// Account roles. The set is closed; anything else is rejected on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Realtor,
    Client,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Realtor, Role::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Realtor => "realtor",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RentalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "realtor" => Ok(Role::Realtor),
            "client" => Ok(Role::Client),
            other => Err(RentalsError::Validation {
                message: format!("invalid role: {}", other),
                field: Some("role".to_string()),
                context: ErrorContext::new("types")
                    .with_operation("parse_role")
                    .with_suggestion("Use one of: admin, realtor, client"),
            }),
        }
    }
}

/// A registered principal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    /// Opaque output of the password hasher, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, role: Role) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            password_hash: password_hash.into(),
            role,
            created_at: Utc::now(),
        }
    }
}

/// At most one per account; lives until the account is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account_id: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(account_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            token: token.into(),
            created_at: Utc::now(),
        }
    }
}

/// Partial update of an account
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountPatch {
    pub password: Option<String>,
    pub role: Option<String>,
}

/// A rental property offered by a realtor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub name: String,
    pub description: String,
    pub realtor_id: String,
    pub floor_area_meters: f64,
    #[serde(rename = "pricePerMonthUSD")]
    pub price_per_month_usd: f64,
    pub room_count: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

fn default_available() -> bool {
    true
}

/// Request body for creating a listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub realtor_id: String,
    pub floor_area_meters: f64,
    #[serde(rename = "pricePerMonthUSD")]
    pub price_per_month_usd: f64,
    pub room_count: u32,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

impl NewListing {
    pub fn into_listing(self) -> Listing {
        Listing {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            description: self.description,
            realtor_id: self.realtor_id,
            floor_area_meters: self.floor_area_meters,
            price_per_month_usd: self.price_per_month_usd,
            room_count: self.room_count,
            latitude: self.latitude,
            longitude: self.longitude,
            available: self.available,
            created_at: Utc::now(),
        }
    }
}

/// Partial update of a listing; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub realtor_id: Option<String>,
    pub floor_area_meters: Option<f64>,
    #[serde(rename = "pricePerMonthUSD")]
    pub price_per_month_usd: Option<f64>,
    pub room_count: Option<u32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub available: Option<bool>,
}

impl ListingPatch {
    pub fn apply(self, listing: &mut Listing) {
        if let Some(name) = self.name {
            listing.name = name;
        }
        if let Some(description) = self.description {
            listing.description = description;
        }
        if let Some(realtor_id) = self.realtor_id {
            listing.realtor_id = realtor_id;
        }
        if let Some(area) = self.floor_area_meters {
            listing.floor_area_meters = area;
        }
        if let Some(price) = self.price_per_month_usd {
            listing.price_per_month_usd = price;
        }
        if let Some(rooms) = self.room_count {
            listing.room_count = rooms;
        }
        if let Some(latitude) = self.latitude {
            listing.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            listing.longitude = longitude;
        }
        if let Some(available) = self.available {
            listing.available = available;
        }
    }
}

/// Exact-match filter used when searching listings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilter {
    pub floor_area_meters: Option<f64>,
    #[serde(rename = "pricePerMonthUSD")]
    pub price_per_month_usd: Option<f64>,
    pub room_count: Option<u32>,
}

impl ListingFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        self.floor_area_meters
            .is_none_or(|area| listing.floor_area_meters == area)
            && self
                .price_per_month_usd
                .is_none_or(|price| listing.price_per_month_usd == price)
            && self.room_count.is_none_or(|rooms| listing.room_count == rooms)
    }
}
