//! Type-safe identifier wrappers.
//!
//! Territories are keyed by the stable string identifier the map layer
//! assigns them (e.g. `"ruhr"`, `"province-17"`). Wrapping the string keeps
//! territory keys from being confused with any other text at compile time.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`] value.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a territory (the smallest unit tracked for morale).
    TerritoryId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip_serde() {
        let original = TerritoryId::new("ruhr");
        let json = serde_json::to_string(&original).ok();
        assert_eq!(json.as_deref(), Some("\"ruhr\""));
        let restored: Result<TerritoryId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn id_display_matches_inner() {
        let id = TerritoryId::from("saar");
        assert_eq!(id.to_string(), "saar");
        assert_eq!(id.as_str(), "saar");
    }

    #[test]
    fn ids_order_lexically() {
        let a = TerritoryId::from("alpha");
        let b = TerritoryId::from("beta");
        assert!(a < b);
    }
}
