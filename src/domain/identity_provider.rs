//! Identity provider attribute domain model
//!
//! Attributes wire an organization to its federated identity provider
//! (issuer, client id and similar key/value settings). They are owned by the
//! organization: loaded with it, saved with it, and deleted once detached.

use super::common::validate_not_blank;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Key/value setting of an organization's identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderAttribute {
    /// Row id, `None` until the attribute has been stored
    #[serde(default)]
    pub id: Option<i64>,
    #[validate(custom(function = "validate_not_blank"))]
    pub attribute_name: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub attribute_value: String,
    /// Back-reference to the owning organization
    #[serde(skip)]
    #[sqlx(rename = "id_organization")]
    pub organization_id: Option<i64>,
}

impl IdentityProviderAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            attribute_name: name.into(),
            attribute_value: value.into(),
            organization_id: None,
        }
    }

    /// The name/value pair, ignoring storage identity
    pub fn pair(&self) -> (&str, &str) {
        (&self.attribute_name, &self.attribute_value)
    }
}
