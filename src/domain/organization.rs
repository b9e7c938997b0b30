//! Organization aggregate
//!
//! An organization owns its logo and its identity-provider attributes and
//! holds a read-only view of the certificates issued to it. Children point
//! back at their organization through its id; [`Organization::set_child_ids`]
//! re-establishes those back-references after every write and copy.

use super::certificate::Certificate;
use super::common::validate_not_blank;
use super::identity_provider::IdentityProviderAttribute;
use super::logo::Logo;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Which fields a projection copies from one organization onto another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyProfile {
    /// Every field, including short name, approval, logo and certificates.
    /// Reserved for system tooling.
    Full,
    /// Descriptive fields and identity-provider attributes only. Short name,
    /// approval, logo and certificates of the target are left alone.
    EditableSubset,
}

/// Capability of entities holding data that must not cross a trust boundary
pub trait SensitiveFields {
    /// Whether [`SensitiveFields::clear_sensitive_fields`] must run before
    /// the value is serialized for an untrusted audience
    fn has_sensitive_fields(&self) -> bool;

    /// Drop the confidential parts. The value is then fit for outbound
    /// projection only and must not be written back to storage.
    fn clear_sensitive_fields(&mut self);
}

/// A registered organization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Assigned by storage; never exposed
    #[serde(skip)]
    pub id: Option<i64>,

    /// The name of the organization
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    /// The unique short name of the organization, 3 to 10 characters
    #[validate(length(min = 3, max = 10))]
    pub short_name: String,

    #[validate(email)]
    pub email: String,

    #[validate(custom(function = "validate_not_blank"), url)]
    pub url: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub address: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub country: String,

    /// Free-form classifier, internal only
    #[serde(skip)]
    pub org_type: Option<String>,

    /// Set by an administrator, internal only
    #[serde(skip)]
    pub approved: bool,

    #[serde(skip)]
    pub logo: Option<Logo>,

    /// Cannot be created or updated through the organization; use the
    /// dedicated certificate calls
    #[serde(default, skip_deserializing)]
    #[schema(read_only)]
    certificates: Vec<Certificate>,

    #[serde(default, skip_serializing)]
    #[validate(nested)]
    pub identity_provider_attributes: Option<Vec<IdentityProviderAttribute>>,
}

impl Organization {
    pub fn new(
        name: impl Into<String>,
        short_name: impl Into<String>,
        email: impl Into<String>,
        url: impl Into<String>,
        address: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            email: email.into(),
            url: url.into(),
            address: address.into(),
            country: country.into(),
            ..Self::default()
        }
    }

    /// Certificates issued to this organization
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    /// Attach the certificate view when loading from storage
    pub fn with_certificates(mut self, certificates: Vec<Certificate>) -> Self {
        self.certificates = certificates;
        self.set_child_ids();
        self
    }

    /// Copy every field onto `target`
    pub fn full_copy_into<'a>(
        &self,
        target: Option<&'a mut Organization>,
    ) -> Result<&'a mut Organization> {
        self.copy_into(target, CopyProfile::Full)
    }

    /// Copy the editable fields onto `target`
    pub fn selective_copy_into<'a>(
        &self,
        target: Option<&'a mut Organization>,
    ) -> Result<&'a mut Organization> {
        self.copy_into(target, CopyProfile::EditableSubset)
    }

    /// Project this organization onto `target` according to `profile`.
    ///
    /// Child collections are deep-cloned; the target never shares them with
    /// the source. The target's children are re-parented to the target.
    pub fn copy_into<'a>(
        &self,
        target: Option<&'a mut Organization>,
        profile: CopyProfile,
    ) -> Result<&'a mut Organization> {
        let target = target.ok_or(AppError::NullTarget("organization"))?;
        self.project_onto(target, profile);
        Ok(target)
    }

    /// An identity-less organization equal to this one under a full copy
    pub fn copy(&self) -> Organization {
        let mut org = Organization::default();
        self.project_onto(&mut org, CopyProfile::Full);
        org
    }

    fn project_onto(&self, target: &mut Organization, profile: CopyProfile) {
        target.name.clone_from(&self.name);
        target.email.clone_from(&self.email);
        target.url.clone_from(&self.url);
        target.address.clone_from(&self.address);
        target.country.clone_from(&self.country);
        target.org_type.clone_from(&self.org_type);
        target
            .identity_provider_attributes
            .clone_from(&self.identity_provider_attributes);

        if profile == CopyProfile::Full {
            target.short_name.clone_from(&self.short_name);
            target.approved = self.approved;
            target.logo.clone_from(&self.logo);
            target.certificates.clone_from(&self.certificates);
        }

        target.set_child_ids();
    }

    /// Point every child back at this organization.
    ///
    /// Storage runs this on the reloaded aggregate after each insert and
    /// update, so callers may submit children without back-references.
    pub fn set_child_ids(&mut self) {
        let id = self.id;
        for cert in &mut self.certificates {
            cert.organization_id = id;
        }
        if let Some(attrs) = self.identity_provider_attributes.as_mut() {
            for attr in attrs {
                attr.organization_id = id;
            }
        }
    }

    /// Tie a freshly minted certificate to this organization
    pub fn assign_to_cert(&self, cert: &mut Certificate) {
        cert.organization_id = self.id;
    }
}

impl SensitiveFields for Organization {
    fn has_sensitive_fields(&self) -> bool {
        true
    }

    fn clear_sensitive_fields(&mut self) {
        self.identity_provider_attributes = None;
    }
}
