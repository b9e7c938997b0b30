//! API integration tests infrastructure
//!
//! This module provides test utilities for API handler testing without
//! external dependencies (no database).

pub mod http;

use async_trait::async_trait;
use identity_registry::domain::{Certificate, IdentityProviderAttribute, Logo, Organization};
use identity_registry::error::{AppError, Result};
use identity_registry::repository::{claim_attribute_rows, OrganizationRepository};
use tokio::sync::RwLock;

// ============================================================================
// Test Organization Repository
// ============================================================================

/// Stored organization row; children live in their own tables
struct OrganizationRecord {
    org: Organization,
    logo_id: Option<i64>,
}

impl OrganizationRecord {
    fn new(id: i64, org: &Organization, logo_id: Option<i64>) -> Self {
        let mut stored = org.copy().with_certificates(vec![]);
        stored.id = Some(id);
        stored.logo = None;
        stored.identity_provider_attributes = None;
        Self {
            org: stored,
            logo_id,
        }
    }
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    organizations: Vec<OrganizationRecord>,
    attributes: Vec<IdentityProviderAttribute>,
    logos: Vec<Logo>,
    certificates: Vec<Certificate>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn short_name_taken(&self, short_name: &str, except: Option<i64>) -> bool {
        self.organizations
            .iter()
            .any(|r| r.org.short_name == short_name && r.org.id != except)
    }

    fn insert_logo(&mut self, logo: &Logo) -> i64 {
        let id = self.next_id();
        self.logos.push(Logo {
            id: Some(id),
            ..logo.clone()
        });
        id
    }

    fn insert_attribute(&mut self, organization_id: i64, attr: &IdentityProviderAttribute) {
        let id = self.next_id();
        self.attributes.push(IdentityProviderAttribute {
            id: Some(id),
            organization_id: Some(organization_id),
            ..attr.clone()
        });
    }

    /// Load an organization with its children, like the MySQL repository does
    fn assemble(&self, record: &OrganizationRecord) -> Organization {
        let id = record.org.id;
        let mut attributes: Vec<_> = self
            .attributes
            .iter()
            .filter(|a| a.organization_id == id)
            .cloned()
            .collect();
        attributes.sort_by_key(|a| a.id);
        let certificates = self
            .certificates
            .iter()
            .filter(|c| c.organization_id == id)
            .cloned()
            .collect();

        let mut org = record.org.clone();
        org.logo = record
            .logo_id
            .and_then(|logo_id| self.logos.iter().find(|l| l.id == Some(logo_id)))
            .cloned();
        org.identity_provider_attributes = Some(attributes);
        org.with_certificates(certificates)
    }

    fn find(&self, id: i64) -> Option<&OrganizationRecord> {
        self.organizations.iter().find(|r| r.org.id == Some(id))
    }
}

/// In-memory repository honouring the same storage rules as MySQL: unique
/// short names, owned logo, orphan removal of identity-provider attributes
/// and certificates that outlive their organization.
pub struct TestOrganizationRepository {
    tables: RwLock<Tables>,
}

impl TestOrganizationRepository {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// All stored identity-provider attribute rows
    pub async fn attribute_rows(&self) -> Vec<IdentityProviderAttribute> {
        self.tables.read().await.attributes.clone()
    }

    pub async fn logo_count(&self) -> usize {
        self.tables.read().await.logos.len()
    }

    /// Certificate rows as the certificate subsystem would write them
    pub async fn add_certificate(&self, mut certificate: Certificate) -> Certificate {
        let mut tables = self.tables.write().await;
        certificate.id = Some(tables.next_id());
        tables.certificates.push(certificate.clone());
        certificate
    }

    pub async fn certificate_rows(&self) -> Vec<Certificate> {
        self.tables.read().await.certificates.clone()
    }
}

impl Default for TestOrganizationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrganizationRepository for TestOrganizationRepository {
    async fn create(&self, org: &Organization) -> Result<Organization> {
        let mut tables = self.tables.write().await;

        if tables.short_name_taken(&org.short_name, None) {
            return Err(AppError::Conflict(
                "Organization short name is already taken".to_string(),
            ));
        }

        let id = tables.next_id();
        let logo_id = org.logo.as_ref().map(|logo| tables.insert_logo(logo));
        for attr in org.identity_provider_attributes.iter().flatten() {
            tables.insert_attribute(id, attr);
        }

        let record = OrganizationRecord::new(id, org, logo_id);
        let created = tables.assemble(&record);
        tables.organizations.push(record);
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Organization>> {
        let tables = self.tables.read().await;
        Ok(tables.find(id).map(|r| tables.assemble(r)))
    }

    async fn find_by_short_name(&self, short_name: &str) -> Result<Option<Organization>> {
        let tables = self.tables.read().await;
        Ok(tables
            .organizations
            .iter()
            .find(|r| r.org.short_name == short_name)
            .map(|r| tables.assemble(r)))
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Organization>> {
        let tables = self.tables.read().await;
        let mut records: Vec<_> = tables.organizations.iter().collect();
        records.sort_by(|a, b| a.org.short_name.cmp(&b.org.short_name));
        Ok(records
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|r| tables.assemble(r))
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.tables.read().await.organizations.len() as i64)
    }

    async fn update(&self, org: &Organization) -> Result<Organization> {
        let id = org.id.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Cannot update an organization without id"))
        })?;
        let mut tables = self.tables.write().await;

        let current_logo_id = tables
            .find(id)
            .ok_or_else(|| AppError::NotFound(format!("Organization {} not found", id)))?
            .logo_id;
        if tables.short_name_taken(&org.short_name, Some(id)) {
            return Err(AppError::Conflict(
                "Organization short name is already taken".to_string(),
            ));
        }

        let logo_id = match &org.logo {
            Some(logo) if logo.id.is_some() && logo.id == current_logo_id => current_logo_id,
            Some(logo) => Some(tables.insert_logo(logo)),
            None => None,
        };
        if let Some(old) = current_logo_id.filter(|old| Some(*old) != logo_id) {
            tables.logos.retain(|l| l.id != Some(old));
        }

        let attributes = org.identity_provider_attributes.as_deref().unwrap_or_default();
        let stored_ids: Vec<i64> = tables
            .attributes
            .iter()
            .filter(|row| row.organization_id == Some(id))
            .filter_map(|row| row.id)
            .collect();
        let claims = claim_attribute_rows(attributes, &stored_ids);
        tables.attributes.retain(|row| {
            row.organization_id != Some(id) || claims.contains(&row.id)
        });
        for (attr, claim) in attributes.iter().zip(claims) {
            match claim {
                Some(attr_id) => {
                    if let Some(row) = tables.attributes.iter_mut().find(|r| r.id == Some(attr_id)) {
                        row.attribute_name = attr.attribute_name.clone();
                        row.attribute_value = attr.attribute_value.clone();
                    }
                }
                None => tables.insert_attribute(id, attr),
            }
        }

        let record = OrganizationRecord::new(id, org, logo_id);
        let updated = tables.assemble(&record);
        if let Some(slot) = tables.organizations.iter_mut().find(|r| r.org.id == Some(id)) {
            *slot = record;
        }
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;

        let position = tables
            .organizations
            .iter()
            .position(|r| r.org.id == Some(id))
            .ok_or_else(|| AppError::NotFound(format!("Organization {} not found", id)))?;
        let record = tables.organizations.remove(position);

        tables.attributes.retain(|a| a.organization_id != Some(id));
        if let Some(logo_id) = record.logo_id {
            tables.logos.retain(|l| l.id != Some(logo_id));
        }
        for cert in tables
            .certificates
            .iter_mut()
            .filter(|c| c.organization_id == Some(id))
        {
            cert.organization_id = None;
        }
        Ok(())
    }
}

// ============================================================================
// Test Data Helpers
// ============================================================================

/// A valid organization candidate with two identity-provider attributes
pub fn create_test_organization(short_name: &str) -> Organization {
    let mut org = Organization::new(
        format!("Organization {}", short_name),
        short_name,
        format!("info@{}.example", short_name),
        format!("https://{}.example", short_name),
        "1 Harbour Road",
        "DK",
    );
    org.identity_provider_attributes = Some(vec![
        IdentityProviderAttribute::new("iss", "u1"),
        IdentityProviderAttribute::new("clientId", "c1"),
    ]);
    org
}

pub fn create_test_certificate(serial_number: &str) -> Certificate {
    let start = chrono::Utc::now();
    Certificate {
        id: None,
        certificate: "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----".to_string(),
        serial_number: serial_number.to_string(),
        start,
        end: start + chrono::Duration::days(365),
        revoked: false,
        revoked_at: None,
        revoke_reason: None,
        organization_id: None,
    }
}
