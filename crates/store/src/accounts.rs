//! User and partner account storage.

use chrono::Utc;
use deskhand_core::user::{Partner, PartnerClient, User};
use deskhand_core::StoreError;
use sqlx::Row;

use crate::{new_id, parse_timestamp, Store};

/// Fields for a new partner client, before the earnings split is applied.
#[derive(Debug, Clone)]
pub struct NewPartnerClient {
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub client_company: String,
    pub billing_amount: f64,
    pub billing_period: String,
    pub notes: String,
    pub preferences: String,
}

impl Store {
    /// Insert a new owner account. The email must be unused.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        business_name: &str,
        country_code: &str,
        whatsapp_number: &str,
    ) -> Result<User, StoreError> {
        let user = User {
            id: new_id(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            business_name: business_name.to_string(),
            country_code: country_code.to_string(),
            whatsapp_number: whatsapp_number.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, business_name, country_code,
                               whatsapp_number, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.business_name)
        .bind(&user.country_code)
        .bind(&user.whatsapp_number)
        .bind(user.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(format!("email {email} already registered"))
            }
            other => StoreError::Storage(format!("INSERT user: {other}")),
        })?;

        Ok(user)
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("user by email: {e}")))?;
        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("user by id: {e}")))?;
        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn create_partner(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        company: &str,
        phone: &str,
    ) -> Result<Partner, StoreError> {
        let partner = Partner {
            id: new_id(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            company: company.to_string(),
            phone: phone.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO partners (id, name, email, password_hash, company, phone, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&partner.id)
        .bind(&partner.name)
        .bind(&partner.email)
        .bind(&partner.password_hash)
        .bind(&partner.company)
        .bind(&partner.phone)
        .bind(partner.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(format!("partner email {email} already registered"))
            }
            other => StoreError::Storage(format!("INSERT partner: {other}")),
        })?;

        Ok(partner)
    }

    pub async fn partner_by_email(&self, email: &str) -> Result<Option<Partner>, StoreError> {
        let row = sqlx::query("SELECT * FROM partners WHERE email = ?1")
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("partner by email: {e}")))?;
        row.as_ref().map(row_to_partner).transpose()
    }

    pub async fn partner_by_id(&self, id: &str) -> Result<Option<Partner>, StoreError> {
        let row = sqlx::query("SELECT * FROM partners WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("partner by id: {e}")))?;
        row.as_ref().map(row_to_partner).transpose()
    }

    /// Add a client to a partner's book, applying the 60/40 earnings split.
    pub async fn add_partner_client(
        &self,
        partner_id: &str,
        new: NewPartnerClient,
    ) -> Result<PartnerClient, StoreError> {
        let (partner_earnings, platform_earnings) =
            PartnerClient::split_earnings(new.billing_amount);
        let client = PartnerClient {
            id: new_id(),
            partner_id: partner_id.to_string(),
            client_name: new.client_name,
            client_email: new.client_email,
            client_phone: new.client_phone,
            client_company: new.client_company,
            billing_amount: new.billing_amount,
            billing_period: new.billing_period,
            partner_earnings,
            platform_earnings,
            notes: new.notes,
            preferences: new.preferences,
            status: "active".to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO partner_clients (id, partner_id, client_name, client_email, client_phone,
                                         client_company, billing_amount, billing_period,
                                         partner_earnings, platform_earnings, notes, preferences,
                                         status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&client.id)
        .bind(&client.partner_id)
        .bind(&client.client_name)
        .bind(&client.client_email)
        .bind(&client.client_phone)
        .bind(&client.client_company)
        .bind(client.billing_amount)
        .bind(&client.billing_period)
        .bind(client.partner_earnings)
        .bind(client.platform_earnings)
        .bind(&client.notes)
        .bind(&client.preferences)
        .bind(&client.status)
        .bind(client.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT partner client: {e}")))?;

        Ok(client)
    }

    /// All of one partner's clients, most recent first.
    pub async fn partner_clients(&self, partner_id: &str) -> Result<Vec<PartnerClient>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM partner_clients WHERE partner_id = ?1 ORDER BY created_at DESC",
        )
        .bind(partner_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::QueryFailed(format!("partner clients: {e}")))?;

        rows.iter().map(row_to_partner_client).collect()
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, StoreError> {
    let created_at: String = get(row, "created_at")?;
    Ok(User {
        id: get(row, "id")?,
        email: get(row, "email")?,
        password_hash: get(row, "password_hash")?,
        business_name: get(row, "business_name")?,
        country_code: get(row, "country_code")?,
        whatsapp_number: get(row, "whatsapp_number")?,
        created_at: parse_timestamp(&created_at),
    })
}

fn row_to_partner(row: &sqlx::sqlite::SqliteRow) -> Result<Partner, StoreError> {
    let created_at: String = get(row, "created_at")?;
    Ok(Partner {
        id: get(row, "id")?,
        name: get(row, "name")?,
        email: get(row, "email")?,
        password_hash: get(row, "password_hash")?,
        company: get(row, "company")?,
        phone: get(row, "phone")?,
        created_at: parse_timestamp(&created_at),
    })
}

fn row_to_partner_client(row: &sqlx::sqlite::SqliteRow) -> Result<PartnerClient, StoreError> {
    let created_at: String = get(row, "created_at")?;
    Ok(PartnerClient {
        id: get(row, "id")?,
        partner_id: get(row, "partner_id")?,
        client_name: get(row, "client_name")?,
        client_email: get(row, "client_email")?,
        client_phone: get(row, "client_phone")?,
        client_company: get(row, "client_company")?,
        billing_amount: get_f64(row, "billing_amount")?,
        billing_period: get(row, "billing_period")?,
        partner_earnings: get_f64(row, "partner_earnings")?,
        platform_earnings: get_f64(row, "platform_earnings")?,
        notes: get(row, "notes")?,
        preferences: get(row, "preferences")?,
        status: get(row, "status")?,
        created_at: parse_timestamp(&created_at),
    })
}

pub(crate) fn get(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<String, StoreError> {
    row.try_get(column)
        .map_err(|e| StoreError::QueryFailed(format!("{column} column: {e}")))
}

pub(crate) fn get_f64(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<f64, StoreError> {
    row.try_get(column)
        .map_err(|e| StoreError::QueryFailed(format!("{column} column: {e}")))
}

pub(crate) fn get_i64(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<i64, StoreError> {
    row.try_get(column)
        .map_err(|e| StoreError::QueryFailed(format!("{column} column: {e}")))
}

pub(crate) fn get_opt(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<String>, StoreError> {
    row.try_get(column)
        .map_err(|e| StoreError::QueryFailed(format!("{column} column: {e}")))
}
