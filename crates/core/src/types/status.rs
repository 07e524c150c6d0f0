//! Closed string sets stored as `TEXT` columns.
//!
//! The database keeps these as lowercase strings guarded by `CHECK`
//! constraints; repositories read them as `String` and parse with `FromStr`.

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted value is not part of the set.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

text_enum! {
    /// Lifecycle of an order.
    OrderStatus, "order status" {
        /// Placed, stock reserved.
        Pending => "pending",
        Completed => "completed",
        /// Terminal.
        Cancelled => "cancelled",
    }
}

text_enum! {
    /// Role carried by a user account and its tokens.
    UserRole, "user role" {
        Admin => "admin",
        Customer => "customer",
    }
}

text_enum! {
    /// Where a product image is shown.
    ImageType, "image type" {
        Main => "main",
        Thumbnail => "thumbnail",
        Gallery => "gallery",
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Customer
    }
}

impl Default for ImageType {
    fn default() -> Self {
        Self::Gallery
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_from_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), *status);
        }
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), *role);
        }
    }

    #[test]
    fn test_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        let kind: ImageType = serde_json::from_str("\"thumbnail\"").unwrap();
        assert_eq!(kind, ImageType::Thumbnail);
    }

    #[test]
    fn test_unknown_value_is_rejected() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: shipped");
        assert!("Admin".parse::<UserRole>().is_err());
    }
}
