//! Typed identifiers: fans, output pins, tracks and subscriptions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Handle returned when registering an event subscriber.
    SubscriptionId
);

/// Identifier of one physical fan, always within `0..FanId::COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct FanId(u8);

impl FanId {
    /// Number of fans wired to the controller board.
    pub const COUNT: usize = 4;

    /// Validate a raw fan number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::FanOutOfRange`] when `raw` is negative or
    /// not below [`FanId::COUNT`].
    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        u8::try_from(raw)
            .ok()
            .filter(|id| usize::from(*id) < Self::COUNT)
            .map(Self)
            .ok_or(ValidationError::FanOutOfRange {
                fan_id: raw,
                count: Self::COUNT,
            })
    }

    /// Every fan id, in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).filter_map(|idx| u8::try_from(idx).ok().map(Self))
    }

    /// Position of this fan in a per-fan array.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<i64> for FanId {
    type Error = ValidationError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<FanId> for u8 {
    fn from(id: FanId) -> Self {
        id.0
    }
}

impl fmt::Display for FanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// BCM number of a GPIO output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GpioPin(u8);

impl GpioPin {
    #[must_use]
    pub const fn new(bcm: u8) -> Self {
        Self(bcm)
    }

    #[must_use]
    pub const fn bcm(self) -> u8 {
        self.0
    }
}

impl fmt::Display for GpioPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a track in the [`TrackCatalog`](crate::playback::TrackCatalog).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
