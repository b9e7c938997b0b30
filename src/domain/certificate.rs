//! Certificate view
//!
//! Certificates are minted and revoked by the certificate subsystem. This
//! service only reads them as part of an organization and never writes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// X.509 certificate issued to an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Option<i64>,
    /// PEM encoded certificate
    pub certificate: String,
    pub serial_number: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoke_reason: Option<String>,
    /// Back-reference to the owning organization
    #[serde(skip)]
    #[sqlx(rename = "id_organization")]
    pub organization_id: Option<i64>,
}
