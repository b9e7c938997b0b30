//! Organization repository
//!
//! Every write runs in one transaction and returns the reloaded aggregate with
//! its back-references rewired. Identity-provider attributes and the logo are
//! owned: attributes missing from an update are deleted, and a replaced or
//! cleared logo is deleted with the write that detached it.

use crate::domain::{Certificate, IdentityProviderAttribute, Logo, Organization};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::{FromRow, MySqlConnection, MySqlPool};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create(&self, org: &Organization) -> Result<Organization>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Organization>>;
    async fn find_by_short_name(&self, short_name: &str) -> Result<Option<Organization>>;
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Organization>>;
    async fn count(&self) -> Result<i64>;
    async fn update(&self, org: &Organization) -> Result<Organization>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct OrganizationRepositoryImpl {
    pool: MySqlPool,
}

impl OrganizationRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct OrganizationRow {
    id: i64,
    name: String,
    short_name: String,
    email: String,
    url: String,
    address: String,
    country: String,
    #[sqlx(rename = "type")]
    org_type: Option<String>,
    approved: bool,
    id_logo: Option<i64>,
}

const ORGANIZATION_COLUMNS: &str =
    "id, name, short_name, email, url, address, country, `type`, approved, id_logo";

/// Attach owned and referenced children to a stored row
async fn assemble(conn: &mut MySqlConnection, row: OrganizationRow) -> Result<Organization> {
    let attributes = sqlx::query_as::<_, IdentityProviderAttribute>(
        r#"
        SELECT id, attribute_name, attribute_value, id_organization
        FROM identity_provider_attributes
        WHERE id_organization = ?
        ORDER BY id
        "#,
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?;

    let logo = match row.id_logo {
        Some(logo_id) => {
            sqlx::query_as::<_, Logo>("SELECT id, image, mime_type FROM logos WHERE id = ?")
                .bind(logo_id)
                .fetch_optional(&mut *conn)
                .await?
        }
        None => None,
    };

    let certificates = sqlx::query_as::<_, Certificate>(
        r#"
        SELECT id, certificate, serial_number, `start`, `end`, revoked, revoked_at,
               revoke_reason, id_organization
        FROM certificates
        WHERE id_organization = ?
        ORDER BY id
        "#,
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?;

    let mut org = Organization::new(
        row.name,
        row.short_name,
        row.email,
        row.url,
        row.address,
        row.country,
    );
    org.id = Some(row.id);
    org.org_type = row.org_type;
    org.approved = row.approved;
    org.logo = logo;
    org.identity_provider_attributes = Some(attributes);

    Ok(org.with_certificates(certificates))
}

async fn fetch_by_id(conn: &mut MySqlConnection, id: i64) -> Result<Option<Organization>> {
    let row = sqlx::query_as::<_, OrganizationRow>(&format!(
        "SELECT {} FROM organizations WHERE id = ?",
        ORGANIZATION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(assemble(conn, row).await?)),
        None => Ok(None),
    }
}

async fn insert_logo(conn: &mut MySqlConnection, logo: &Logo) -> Result<i64> {
    let result =
        sqlx::query("INSERT INTO logos (image, mime_type, created_at) VALUES (?, ?, NOW())")
            .bind(&logo.image)
            .bind(&logo.mime_type)
            .execute(&mut *conn)
            .await?;
    Ok(result.last_insert_id() as i64)
}

async fn delete_logo(conn: &mut MySqlConnection, logo_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM logos WHERE id = ?")
        .bind(logo_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_attribute(
    conn: &mut MySqlConnection,
    organization_id: i64,
    attr: &IdentityProviderAttribute,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO identity_provider_attributes (attribute_name, attribute_value, id_organization)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&attr.attribute_name)
    .bind(&attr.attribute_value)
    .bind(organization_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Stored row each submitted attribute is written to, `None` meaning a new
/// row. A stored id is honoured once; repeats and foreign ids get new rows.
pub fn claim_attribute_rows(
    attributes: &[IdentityProviderAttribute],
    stored_ids: &[i64],
) -> Vec<Option<i64>> {
    let mut claims = Vec::with_capacity(attributes.len());
    for attr in attributes {
        let claim = attr
            .id
            .filter(|attr_id| stored_ids.contains(attr_id) && !claims.contains(&Some(*attr_id)));
        claims.push(claim);
    }
    claims
}

fn map_conflict_if_duplicate(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.is_unique_violation() {
            return AppError::Conflict("Organization short name is already taken".to_string());
        }
    }
    AppError::Database(error)
}

#[async_trait]
impl OrganizationRepository for OrganizationRepositoryImpl {
    async fn create(&self, org: &Organization) -> Result<Organization> {
        let mut tx = self.pool.begin().await?;

        let logo_id = match &org.logo {
            Some(logo) => Some(insert_logo(&mut tx, logo).await?),
            None => None,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO organizations
                (name, short_name, email, url, address, country, `type`, approved, id_logo,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(&org.name)
        .bind(&org.short_name)
        .bind(&org.email)
        .bind(&org.url)
        .bind(&org.address)
        .bind(&org.country)
        .bind(&org.org_type)
        .bind(org.approved)
        .bind(logo_id)
        .execute(&mut *tx)
        .await
        .map_err(map_conflict_if_duplicate)?;
        let id = result.last_insert_id() as i64;

        for attr in org.identity_provider_attributes.iter().flatten() {
            insert_attribute(&mut tx, id, attr).await?;
        }

        let created = fetch_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create organization")))?;
        tx.commit().await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Organization>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    async fn find_by_short_name(&self, short_name: &str) -> Result<Option<Organization>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {} FROM organizations WHERE short_name = ?",
            ORGANIZATION_COLUMNS
        ))
        .bind(short_name)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(Some(assemble(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Organization>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {} FROM organizations ORDER BY short_name LIMIT ? OFFSET ?",
            ORGANIZATION_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        let mut orgs = Vec::with_capacity(rows.len());
        for row in rows {
            orgs.push(assemble(&mut conn, row).await?);
        }
        Ok(orgs)
    }

    async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM organizations")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn update(&self, org: &Organization) -> Result<Organization> {
        let id = org.id.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Cannot update an organization without id"))
        })?;

        let mut tx = self.pool.begin().await?;

        let current_logo: Option<(Option<i64>,)> =
            sqlx::query_as("SELECT id_logo FROM organizations WHERE id = ? FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (current_logo_id,) = current_logo
            .ok_or_else(|| AppError::NotFound(format!("Organization {} not found", id)))?;

        let logo_id = match &org.logo {
            Some(logo) if logo.id.is_some() && logo.id == current_logo_id => current_logo_id,
            Some(logo) => Some(insert_logo(&mut tx, logo).await?),
            None => None,
        };

        sqlx::query(
            r#"
            UPDATE organizations
            SET name = ?, short_name = ?, email = ?, url = ?, address = ?, country = ?,
                `type` = ?, approved = ?, id_logo = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(&org.name)
        .bind(&org.short_name)
        .bind(&org.email)
        .bind(&org.url)
        .bind(&org.address)
        .bind(&org.country)
        .bind(&org.org_type)
        .bind(org.approved)
        .bind(logo_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_conflict_if_duplicate)?;

        if let Some(old_logo_id) = current_logo_id.filter(|old| Some(*old) != logo_id) {
            delete_logo(&mut tx, old_logo_id).await?;
        }

        let stored_ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM identity_provider_attributes WHERE id_organization = ?")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let attributes = org.identity_provider_attributes.as_deref().unwrap_or_default();
        let claims = claim_attribute_rows(attributes, &stored_ids);

        for orphan in stored_ids
            .iter()
            .filter(|stored| !claims.contains(&Some(**stored)))
        {
            sqlx::query("DELETE FROM identity_provider_attributes WHERE id = ?")
                .bind(orphan)
                .execute(&mut *tx)
                .await?;
        }

        for (attr, claim) in attributes.iter().zip(claims) {
            match claim {
                Some(attr_id) => {
                    sqlx::query(
                        r#"
                        UPDATE identity_provider_attributes
                        SET attribute_name = ?, attribute_value = ?
                        WHERE id = ?
                        "#,
                    )
                    .bind(&attr.attribute_name)
                    .bind(&attr.attribute_value)
                    .bind(attr_id)
                    .execute(&mut *tx)
                    .await?;
                }
                None => insert_attribute(&mut tx, id, attr).await?,
            }
        }

        let updated = fetch_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organization {} not found", id)))?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let logo: Option<(Option<i64>,)> =
            sqlx::query_as("SELECT id_logo FROM organizations WHERE id = ? FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((logo_id,)) = logo else {
            return Err(AppError::NotFound(format!("Organization {} not found", id)));
        };

        sqlx::query("DELETE FROM identity_provider_attributes WHERE id_organization = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Organization {} not found", id)));
        }

        if let Some(logo_id) = logo_id {
            delete_logo(&mut tx, logo_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
