use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Current time at the precision timestamps are stored with.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Closed string enums: serialized, stored and parsed by the same lowercase tag.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ParseEnumError { kind: $kind, value: other.to_string() }),
                }
            }
        }
    };
}

text_enum!(Role, "role" {
    Farmer => "farmer",
    Buyer => "buyer",
    Service => "service",
});

text_enum!(OfferType, "offer type" {
    Crop => "crop",
    Service => "service",
    NeedFulfillment => "need_fulfillment",
});

text_enum!(
    /// `pending -> accepted | rejected`, `accepted -> completed`.
    OfferStatus, "offer status" {
        Pending => "pending",
        Accepted => "accepted",
        Rejected => "rejected",
        Completed => "completed",
    }
);

text_enum!(RentalStatus, "rental status" {
    Available => "available",
    Rented => "rented",
    Maintenance => "maintenance",
});

text_enum!(BuyerNeedStatus, "buyer need status" {
    Active => "active",
    Fulfilled => "fulfilled",
    Cancelled => "cancelled",
    Expired => "expired",
});

text_enum!(TaskKind, "task type" {
    FieldWork => "field_work",
    Fertilizer => "fertilizer",
    Harvest => "harvest",
    Irrigation => "irrigation",
    General => "general",
});

text_enum!(TaskStatus, "task status" {
    Pending => "pending",
    Completed => "completed",
});

impl OfferStatus {
    pub fn can_transition_to(self, next: OfferStatus) -> bool {
        matches!(
            (self, next),
            (OfferStatus::Pending, OfferStatus::Accepted)
                | (OfferStatus::Pending, OfferStatus::Rejected)
                | (OfferStatus::Accepted, OfferStatus::Completed)
        )
    }
}

// -- Users --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Opaque id issued by the external identity provider.
    pub clerk_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub organization: Option<String>,
    pub bio: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

// -- Offers --

/// The two participants of an offer. Each variant names exactly the pair of
/// roles that can meet in that kind of deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "offerType", rename_all = "snake_case")]
pub enum OfferParties {
    /// A buyer bidding on a farmer's crop.
    Crop { farmer: Uuid, buyer: Uuid },
    /// A service provider bidding on a farmer's service request.
    Service { farmer: Uuid, provider: Uuid },
    /// A farmer answering a buyer's posted requirement.
    NeedFulfillment { farmer: Uuid, buyer: Uuid },
}

impl OfferParties {
    /// Rebuild the typed pair from the flat storage layout. Returns `None`
    /// when the counterpart column required by `offer_type` is empty.
    pub fn from_columns(
        offer_type: OfferType,
        farmer: Uuid,
        buyer: Option<Uuid>,
        provider: Option<Uuid>,
    ) -> Option<Self> {
        match offer_type {
            OfferType::Crop => buyer.map(|buyer| OfferParties::Crop { farmer, buyer }),
            OfferType::Service => provider.map(|provider| OfferParties::Service { farmer, provider }),
            OfferType::NeedFulfillment => {
                buyer.map(|buyer| OfferParties::NeedFulfillment { farmer, buyer })
            }
        }
    }

    pub fn offer_type(&self) -> OfferType {
        match self {
            OfferParties::Crop { .. } => OfferType::Crop,
            OfferParties::Service { .. } => OfferType::Service,
            OfferParties::NeedFulfillment { .. } => OfferType::NeedFulfillment,
        }
    }

    pub fn farmer(&self) -> Uuid {
        match *self {
            OfferParties::Crop { farmer, .. }
            | OfferParties::Service { farmer, .. }
            | OfferParties::NeedFulfillment { farmer, .. } => farmer,
        }
    }

    pub fn buyer(&self) -> Option<Uuid> {
        match *self {
            OfferParties::Crop { buyer, .. } | OfferParties::NeedFulfillment { buyer, .. } => {
                Some(buyer)
            }
            OfferParties::Service { .. } => None,
        }
    }

    pub fn provider(&self) -> Option<Uuid> {
        match *self {
            OfferParties::Service { provider, .. } => Some(provider),
            _ => None,
        }
    }

    fn pair(&self) -> (Uuid, Uuid) {
        match *self {
            OfferParties::Crop { farmer, buyer } | OfferParties::NeedFulfillment { farmer, buyer } => {
                (farmer, buyer)
            }
            OfferParties::Service { farmer, provider } => (farmer, provider),
        }
    }

    pub fn involves(&self, user: Uuid) -> bool {
        let (farmer, other) = self.pair();
        user == farmer || user == other
    }

    /// The other side of the deal as seen by `user`. `None` when `user` is
    /// not a party, or when both slots hold the same id.
    pub fn counterpart(&self, user: Uuid) -> Option<Uuid> {
        let (farmer, other) = self.pair();
        if farmer == other {
            return None;
        }
        if user == farmer {
            Some(other)
        } else if user == other {
            Some(farmer)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: Uuid,
    #[serde(flatten)]
    pub parties: OfferParties,
    pub crop_id: Option<Uuid>,
    pub service_request_id: Option<Uuid>,
    pub buyer_need_id: Option<Uuid>,
    pub price_per_unit: Option<f64>,
    pub quantity_requested: Option<f64>,
    pub bid_amount: Option<String>,
    pub message: Option<String>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
}

// -- Messages --

/// A direct message. Content never changes after insert; `read` only flips
/// from false to true when the receiver opens the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender_id: Uuid, receiver_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content: content.into(),
            read: false,
            created_at: timestamp_now(),
        }
    }
}

/// A chat counterparty derived from offer history. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub unread_count: u32,
}

// -- Listings --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price_per_hour: f64,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: RentalStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerNeed {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub crop_name: String,
    pub quantity: f64,
    /// kg, tons, quintals
    pub unit: String,
    pub min_price: f64,
    pub max_price: f64,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub status: BuyerNeedStatus,
    pub created_at: DateTime<Utc>,
}

// -- Tasks --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
