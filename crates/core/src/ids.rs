//! Typed record identifiers.
//!
//! Every table uses a `BIGSERIAL` key; wrapping them keeps an `ArtId` from
//! being passed where a `VariantId` is expected. Users come from the token
//! issuer and are identified by UUID.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! record_id {
    ($($(#[$meta:meta])* $name:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub i64);

            impl $name {
                pub fn get(self) -> i64 {
                    self.0
                }
            }

            impl From<i64> for $name {
                fn from(value: i64) -> Self {
                    Self(value)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

record_id! {
    /// Primary key of an artist profile.
    ArtistId;
    /// Primary key of a collection.
    CollectionId;
    /// Primary key of an art piece.
    ArtId;
    /// Primary key of an art variant.
    VariantId;
    /// Primary key of a media asset.
    MediaId;
    /// Primary key of an exhibition.
    ExhibitionId;
    BasketId;
    BasketItemId;
    OrderId;
    OrderItemId;
    MessageId;
}

/// Identity of an authenticated user (the token subject).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_numbers() {
        let id = ArtId(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let parsed: VariantId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, VariantId(7));
        assert_eq!(parsed.to_string(), "7");
    }
}
