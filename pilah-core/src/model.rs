//! Domain data structures for facilities, waste line items, and pickup requests.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// A geographic position in decimal degrees.
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and within geographic ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.5},{:.5}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier of a collection facility.
pub struct FacilityId(pub String);

impl fmt::Display for FacilityId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A collection facility supplied by the facility directory.
pub struct Facility {
    /// Unique identifier.
    pub id: FacilityId,
    /// Human-friendly name.
    pub name: String,
    /// Location, when the directory knows it.
    pub coordinate: Option<Coordinate>,
    /// Contact phone number.
    pub contact_phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A facility paired with its distance from the reference coordinate.
pub struct RankedFacility {
    /// The facility as supplied.
    pub facility: Facility,
    /// Distance in kilometers, `None` when either endpoint is unknown.
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Identifier of a waste category such as `paper-koran`.
pub struct CategoryId(pub String);

impl CategoryId {
    /// Build an identifier from anything string-like.
    #[must_use]
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier of a top-level waste group.
pub struct GroupId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier of a fixed daily time slot.
pub struct TimeSlotId(pub String);

impl fmt::Display for TimeSlotId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One waste category and how many units of it are handed over.
pub struct LineItem {
    /// Category being collected.
    pub category_id: CategoryId,
    /// Units, between 1 and [`crate::MAX_QUANTITY`].
    pub quantity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// How the waste travels to the facility.
pub enum DeliveryBranch {
    /// The facility collects the waste from the user's address.
    FacilityPickup,
    /// The user brings the waste to the facility.
    SelfDelivery,
}

impl DeliveryBranch {
    /// Both branches in display order.
    pub const ALL: [DeliveryBranch; 2] = [DeliveryBranch::FacilityPickup, DeliveryBranch::SelfDelivery];

    /// Label shown to users.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DeliveryBranch::FacilityPickup => "Pickup by facility",
            DeliveryBranch::SelfDelivery => "Deliver it myself",
        }
    }
}

impl fmt::Display for DeliveryBranch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            DeliveryBranch::FacilityPickup => "facility-pickup",
            DeliveryBranch::SelfDelivery => "self-delivery",
        };
        write!(formatter, "{slug}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier handed back by the request store after persisting.
pub struct StoredRequestId(pub String);

impl fmt::Display for StoredRequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Immutable request produced at the end of a scheduling session.
pub struct PickupRequest {
    /// Chosen facility.
    pub facility_id: FacilityId,
    /// Facility name at the time of submission.
    pub facility_name: String,
    /// Day of the pickup or drop-off.
    pub scheduled_date: NaiveDate,
    /// Time slot on that day.
    pub scheduled_time_slot: TimeSlotId,
    /// Waste handed over, in the order it was added.
    pub line_items: Vec<LineItem>,
    /// Pickup or self-delivery.
    pub branch: DeliveryBranch,
    /// Where to collect from; only present for facility pickup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_address: Option<String>,
    /// Phone number of the requester, possibly empty for self-delivery.
    pub contact_phone: String,
    /// Free-text notes for the facility.
    pub notes: String,
    /// Moment the request was assembled.
    pub created_at: DateTime<Utc>,
}
