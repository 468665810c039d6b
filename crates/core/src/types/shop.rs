//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character not valid in a hostname.
    #[error("shop domain contains invalid character '{0}'")]
    InvalidCharacter(char),
    /// The input has no dot, so it cannot be a store hostname.
    #[error("shop domain must be a full hostname")]
    NotAHostname,
}

/// The owning storefront instance a configuration record belongs to.
///
/// Every record in the configuration store is partitioned by shop; lookups
/// scoped to one shop must never match another shop's rows. The domain is
/// the `*.myshopify.com` hostname Shopify hands to the app in session
/// tokens and proxy requests.
///
/// ## Constraints
///
/// - Length: 1-254 characters
/// - ASCII letters, digits, `-` and `.` only (hostname label characters)
/// - Must contain at least one dot
/// - Stored lowercase; input is folded on parse
///
/// ## Examples
///
/// ```
/// use monogram_core::ShopDomain;
///
/// assert!(ShopDomain::parse("demo-store.myshopify.com").is_ok());
/// assert!(ShopDomain::parse("Demo-Store.myshopify.com").is_ok());
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("no-dot").is_err());
/// assert!(ShopDomain::parse("bad host.myshopify.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a hostname.
    pub const MAX_LENGTH: usize = 254;

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, contains characters
    /// not valid in a hostname, or has no dot.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        if s.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '.')
        {
            return Err(ShopDomainError::InvalidCharacter(c));
        }

        if !s.contains('.') {
            return Err(ShopDomainError::NotAHostname);
        }

        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShopDomain {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShopDomain {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShopDomain {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_domains() {
        assert!(ShopDomain::parse("demo-store.myshopify.com").is_ok());
        assert!(ShopDomain::parse("a.b").is_ok());
        assert!(ShopDomain::parse("store-123.myshopify.com").is_ok());
    }

    #[test]
    fn test_parse_folds_case() {
        let shop = ShopDomain::parse("Demo-Store.MyShopify.com").unwrap();
        assert_eq!(shop.as_str(), "demo-store.myshopify.com");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(ShopDomain::parse(""), Err(ShopDomainError::Empty)));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}.myshopify.com", "a".repeat(250));
        assert!(matches!(
            ShopDomain::parse(&long),
            Err(ShopDomainError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_invalid_character() {
        assert!(matches!(
            ShopDomain::parse("bad host.myshopify.com"),
            Err(ShopDomainError::InvalidCharacter(' '))
        ));
        assert!(matches!(
            ShopDomain::parse("store/..myshopify.com"),
            Err(ShopDomainError::InvalidCharacter('/'))
        ));
    }

    #[test]
    fn test_parse_not_a_hostname() {
        assert!(matches!(
            ShopDomain::parse("localhost"),
            Err(ShopDomainError::NotAHostname)
        ));
    }

    #[test]
    fn test_distinct_shops_are_unequal() {
        let s1 = ShopDomain::parse("one.myshopify.com").unwrap();
        let s2 = ShopDomain::parse("two.myshopify.com").unwrap();
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_serde_roundtrip() {
        let shop = ShopDomain::parse("demo.myshopify.com").unwrap();
        let json = serde_json::to_string(&shop).unwrap();
        assert_eq!(json, "\"demo.myshopify.com\"");

        let parsed: ShopDomain = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, shop);
    }

    #[test]
    fn test_from_str() {
        let shop: ShopDomain = "demo.myshopify.com".parse().unwrap();
        assert_eq!(shop.as_str(), "demo.myshopify.com");
    }
}
