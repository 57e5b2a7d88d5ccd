//! Dataset and sales record storage.
//!
//! Dataset rows are stored as one JSON array column — these are small
//! owner-uploaded files, not analytical tables. Query evaluation happens in
//! `deskhand_core::dataset` over the decoded rows.

use chrono::Utc;
use deskhand_core::sales::SaleRecord;
use deskhand_core::{Dataset, StoreError};
use serde_json::Value;

use crate::accounts::{get, get_f64, get_i64};
use crate::{new_id, parse_timestamp, Store};

/// Fields for a new sale; `total` is computed at insert time.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub customer_name: String,
    pub product_service: String,
    pub amount: f64,
    pub quantity: i64,
    pub sale_date: String,
    pub payment_method: String,
    pub customer_contact: String,
    pub notes: String,
}

impl Store {
    /// Store an uploaded dataset. Immutable once created.
    pub async fn insert_dataset(
        &self,
        owner_id: &str,
        name: &str,
        description: &str,
        source_filename: &str,
        source_type: &str,
        records: Vec<Value>,
    ) -> Result<Dataset, StoreError> {
        let dataset = Dataset {
            id: new_id(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            source_filename: source_filename.to_string(),
            source_type: source_type.to_string(),
            record_count: records.len(),
            records,
            created_at: Utc::now(),
        };

        let records_json = serde_json::to_string(&dataset.records)
            .map_err(|e| StoreError::Storage(format!("records serialization: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO datasets (id, owner_id, name, description, source_filename, source_type,
                                  records, record_count, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&dataset.id)
        .bind(&dataset.owner_id)
        .bind(&dataset.name)
        .bind(&dataset.description)
        .bind(&dataset.source_filename)
        .bind(&dataset.source_type)
        .bind(&records_json)
        .bind(dataset.record_count as i64)
        .bind(dataset.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT dataset: {e}")))?;

        Ok(dataset)
    }

    /// All datasets for an owner, most recent first.
    pub async fn datasets_for_owner(&self, owner_id: &str) -> Result<Vec<Dataset>, StoreError> {
        let rows =
            sqlx::query("SELECT * FROM datasets WHERE owner_id = ?1 ORDER BY created_at DESC")
                .bind(owner_id)
                .fetch_all(self.pool())
                .await
                .map_err(|e| StoreError::QueryFailed(format!("datasets for owner: {e}")))?;

        rows.iter().map(row_to_dataset).collect()
    }

    /// One dataset, owner-scoped.
    pub async fn dataset(
        &self,
        owner_id: &str,
        dataset_id: &str,
    ) -> Result<Option<Dataset>, StoreError> {
        let row = sqlx::query("SELECT * FROM datasets WHERE id = ?1 AND owner_id = ?2")
            .bind(dataset_id)
            .bind(owner_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("dataset lookup: {e}")))?;
        row.as_ref().map(row_to_dataset).transpose()
    }

    /// Record a sale against a dataset.
    pub async fn insert_sale(
        &self,
        owner_id: &str,
        dataset_id: &str,
        new: NewSale,
    ) -> Result<SaleRecord, StoreError> {
        let sale = SaleRecord {
            id: new_id(),
            owner_id: owner_id.to_string(),
            dataset_id: dataset_id.to_string(),
            customer_name: new.customer_name,
            product_service: new.product_service,
            amount: new.amount,
            quantity: new.quantity,
            total: new.amount * new.quantity as f64,
            sale_date: new.sale_date,
            payment_method: new.payment_method,
            customer_contact: new.customer_contact,
            notes: new.notes,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO sales_records (id, owner_id, dataset_id, customer_name, product_service,
                                       amount, quantity, total, sale_date, payment_method,
                                       customer_contact, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.owner_id)
        .bind(&sale.dataset_id)
        .bind(&sale.customer_name)
        .bind(&sale.product_service)
        .bind(sale.amount)
        .bind(sale.quantity)
        .bind(sale.total)
        .bind(&sale.sale_date)
        .bind(&sale.payment_method)
        .bind(&sale.customer_contact)
        .bind(&sale.notes)
        .bind(sale.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT sale: {e}")))?;

        Ok(sale)
    }

    /// All sales for a dataset, most recent sale date first.
    pub async fn sales_for_dataset(
        &self,
        owner_id: &str,
        dataset_id: &str,
    ) -> Result<Vec<SaleRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM sales_records
            WHERE dataset_id = ?1 AND owner_id = ?2
            ORDER BY sale_date DESC
            "#,
        )
        .bind(dataset_id)
        .bind(owner_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::QueryFailed(format!("sales for dataset: {e}")))?;

        rows.iter().map(row_to_sale).collect()
    }
}

fn row_to_dataset(row: &sqlx::sqlite::SqliteRow) -> Result<Dataset, StoreError> {
    let records_json: String = get(row, "records")?;
    let records: Vec<Value> = serde_json::from_str(&records_json).unwrap_or_default();
    let created_at: String = get(row, "created_at")?;

    Ok(Dataset {
        id: get(row, "id")?,
        owner_id: get(row, "owner_id")?,
        name: get(row, "name")?,
        description: get(row, "description")?,
        source_filename: get(row, "source_filename")?,
        source_type: get(row, "source_type")?,
        records,
        record_count: get_i64(row, "record_count")? as usize,
        created_at: parse_timestamp(&created_at),
    })
}

fn row_to_sale(row: &sqlx::sqlite::SqliteRow) -> Result<SaleRecord, StoreError> {
    let created_at: String = get(row, "created_at")?;
    Ok(SaleRecord {
        id: get(row, "id")?,
        owner_id: get(row, "owner_id")?,
        dataset_id: get(row, "dataset_id")?,
        customer_name: get(row, "customer_name")?,
        product_service: get(row, "product_service")?,
        amount: get_f64(row, "amount")?,
        quantity: get_i64(row, "quantity")?,
        total: get_f64(row, "total")?,
        sale_date: get(row, "sale_date")?,
        payment_method: get(row, "payment_method")?,
        customer_contact: get(row, "customer_contact")?,
        notes: get(row, "notes")?,
        created_at: parse_timestamp(&created_at),
    })
}
