//! Random 128-bit identifiers.
//!
//! Ids are drawn from the OS CSPRNG and rendered as 32 lowercase hex chars.
//! Nothing about an id reveals creation order.

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;
use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Raw id width in bytes.
pub const ID_SIZE: usize = 16;

/// Error returned when an id string is not 32 hex chars.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid id: {0}")]
pub struct ParseIdError(String);

macro_rules! random_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
        )]
        pub struct $name([u8; ID_SIZE]);

        impl $name {
            /// Draw a fresh random id.
            pub fn generate() -> Self {
                let mut bytes = [0u8; ID_SIZE];
                OsRng.fill_bytes(&mut bytes);
                Self(bytes)
            }

            pub fn from_bytes(bytes: [u8; ID_SIZE]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s.trim()).map_err(|_| ParseIdError(s.to_string()))?;
                let arr: [u8; ID_SIZE] =
                    bytes.try_into().map_err(|_| ParseIdError(s.to_string()))?;
                Ok(Self(arr))
            }
        }
    };
}

random_id!(
    /// Survey identifier.
    SurveyId
);
random_id!(
    /// Question identifier, also the key of a response's answer map.
    QuestionId
);
random_id!(
    /// Response identifier. Random so that storage order never encodes arrival order.
    ResponseId
);
