//! Organization business logic

use crate::domain::{Logo, Organization};
use crate::error::{AppError, Result};
use crate::repository::OrganizationRepository;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

pub struct OrganizationService<R: OrganizationRepository> {
    repo: Arc<R>,
}

impl<R: OrganizationRepository> OrganizationService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Register a new organization. It starts out unapproved, without logo
    /// and without certificates whatever the candidate carries.
    pub async fn create(&self, candidate: Organization) -> Result<Organization> {
        candidate.validate()?;

        let mut org = Organization::default();
        org.short_name.clone_from(&candidate.short_name);
        candidate.selective_copy_into(Some(&mut org))?;
        if let Some(attrs) = org.identity_provider_attributes.as_mut() {
            for attr in attrs {
                attr.id = None;
            }
        }

        if self.repo.find_by_short_name(&org.short_name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Organization with short name '{}' already exists",
                org.short_name
            )));
        }

        let org = self.repo.create(&org).await?;
        metrics::counter!("identity_registry_organizations_created_total").increment(1);
        info!(
            short_name = %org.short_name,
            organization_id = ?org.id,
            "Organization registered"
        );
        Ok(org)
    }

    pub async fn get(&self, id: i64) -> Result<Organization> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organization {} not found", id)))
    }

    pub async fn get_by_short_name(&self, short_name: &str) -> Result<Organization> {
        self.repo
            .find_by_short_name(short_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organization '{}' not found", short_name)))
    }

    pub async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Organization>, i64)> {
        let offset = page
            .checked_sub(1)
            .and_then(|skipped| skipped.checked_mul(per_page))
            .filter(|offset| *offset >= 0)
            .ok_or_else(|| AppError::BadRequest(format!("Page {} is out of range", page)))?;
        let orgs = self.repo.list(offset, per_page).await?;
        let total = self.repo.count().await?;
        Ok((orgs, total))
    }

    /// Apply a caller-supplied candidate to the stored organization. Only the
    /// editable fields are taken over; the candidate's attribute list replaces
    /// the stored one and detached attributes are deleted.
    pub async fn update(&self, short_name: &str, candidate: Organization) -> Result<Organization> {
        let mut org = self.get_by_short_name(short_name).await?;
        candidate.selective_copy_into(Some(&mut org))?;
        org.validate()?;

        self.repo.update(&org).await
    }

    /// Replace every field of the stored organization, short name and
    /// approval included. Meant for administrative tooling, not for
    /// registrar-facing endpoints.
    pub async fn replace(&self, short_name: &str, replacement: &Organization) -> Result<Organization> {
        let mut org = self.get_by_short_name(short_name).await?;
        replacement.full_copy_into(Some(&mut org))?;
        org.validate()?;

        if org.short_name != short_name
            && self.repo.find_by_short_name(&org.short_name).await?.is_some()
        {
            return Err(AppError::Conflict(format!(
                "Organization with short name '{}' already exists",
                org.short_name
            )));
        }

        let org = self.repo.update(&org).await?;
        info!(short_name = %org.short_name, previous = %short_name, "Organization replaced");
        Ok(org)
    }

    pub async fn approve(&self, short_name: &str) -> Result<Organization> {
        let mut org = self.get_by_short_name(short_name).await?;
        if org.approved {
            return Ok(org);
        }
        org.approved = true;

        let org = self.repo.update(&org).await?;
        metrics::counter!("identity_registry_organizations_approved_total").increment(1);
        info!(short_name = %org.short_name, organization_id = ?org.id, "Organization approved");
        Ok(org)
    }

    pub async fn get_logo(&self, short_name: &str) -> Result<Logo> {
        self.get_by_short_name(short_name)
            .await?
            .logo
            .ok_or_else(|| AppError::NotFound(format!("Organization '{}' has no logo", short_name)))
    }

    /// Store a new logo; a previous one is deleted
    pub async fn set_logo(&self, short_name: &str, logo: Logo) -> Result<Organization> {
        let mut org = self.get_by_short_name(short_name).await?;
        org.logo = Some(Logo { id: None, ..logo });
        self.repo.update(&org).await
    }

    pub async fn delete_logo(&self, short_name: &str) -> Result<()> {
        let mut org = self.get_by_short_name(short_name).await?;
        if org.logo.take().is_none() {
            return Err(AppError::NotFound(format!(
                "Organization '{}' has no logo",
                short_name
            )));
        }
        self.repo.update(&org).await?;
        Ok(())
    }

    /// Delete the organization together with its logo and identity-provider
    /// attributes. Certificates outlive it.
    pub async fn delete(&self, short_name: &str) -> Result<()> {
        let org = self.get_by_short_name(short_name).await?;
        let id = org
            .id
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Stored organization without id")))?;

        self.repo.delete(id).await?;

        warn!(
            short_name = %org.short_name,
            organization_id = id,
            attributes = org.identity_provider_attributes.as_ref().map_or(0, Vec::len),
            had_logo = org.logo.is_some(),
            certificates = org.certificates().len(),
            "Organization deleted with owned children"
        );
        Ok(())
    }
}
