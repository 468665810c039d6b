//! Canonical product identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of Shopify global IDs, e.g. `gid://shopify/Product/123`.
const GID_SCHEME: &str = "gid://";

/// The canonical product identifier used as the configuration store key.
///
/// Product identifiers arrive in two forms depending on the caller: the bare
/// numeric form (`"8094613766300"`) used by storefront scripts, and the
/// opaque global-id form (`"gid://shopify/Product/8094613766300"`) used by
/// the admin GraphQL API. Both normalize to the bare form.
///
/// Normalization never fails: input that is neither form is used verbatim as
/// the lookup key, and a lookup for it simply finds no match. Absence of
/// configuration is the default state for any product, so an unparseable
/// identifier is a miss, not an error.
///
/// ## Examples
///
/// ```
/// use monogram_core::ProductKey;
///
/// assert_eq!(ProductKey::normalize("gid://shopify/Product/123").as_str(), "123");
/// assert_eq!(ProductKey::normalize("123").as_str(), "123");
/// assert_eq!(ProductKey::normalize("gid://shopify/Collection/9").as_str(), "gid://shopify/Collection/9");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ProductKey(String);

impl ProductKey {
    /// Normalize a product identifier into its canonical store-key form.
    ///
    /// Strips the `gid://<namespace>/Product/` prefix when present; any
    /// other input (bare numeric ids included) passes through unchanged
    /// apart from surrounding whitespace.
    #[must_use]
    pub fn normalize(input: &str) -> Self {
        let trimmed = input.trim();

        if let Some(rest) = trimmed.strip_prefix(GID_SCHEME) {
            let mut segments = rest.splitn(3, '/');
            if let (Some(namespace), Some("Product"), Some(id)) =
                (segments.next(), segments.next(), segments.next())
            {
                if !namespace.is_empty() && !id.is_empty() {
                    return Self(id.to_owned());
                }
            }
        }

        Self(trimmed.to_owned())
    }

    /// Returns the canonical key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether the key looks like a numeric Shopify product id.
    ///
    /// Lookups for non-numeric keys are legal and simply miss; this exists
    /// for diagnostics only.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductKey {
    fn from(input: &str) -> Self {
        Self::normalize(input)
    }
}

impl AsRef<str> for ProductKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ProductKey {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ProductKey {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are already canonical
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ProductKey {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
