use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use campus_shared::{FeeRecord, FeeStatus, NewFeeRecord};
use campus_store::Collection;

use crate::engine::{encode, SyncEngine};
use crate::error::Result;
use crate::validator::{validate_fee, validate_fee_record};

/// The columns an edit to an existing fee record may touch.
#[derive(Debug, Serialize)]
struct FeePatch {
    amount: f64,
    status: FeeStatus,
    paid_date: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

/// Paid date for a record entering `status` at `now`.
fn paid_date_for(status: FeeStatus, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    status.is_settled().then_some(now)
}

impl SyncEngine {
    pub async fn add_fee_record(&self, record: NewFeeRecord) -> Result<Uuid> {
        let outcome = self.insert_fee_record(record).await;
        self.report(
            outcome,
            "Fee record added successfully",
            "Failed to add fee record",
        )
    }

    /// Persist a changed amount or status. The paid date is recomputed from
    /// the status; other fields are left as stored.
    pub async fn update_fee_record(&self, record: &FeeRecord) -> Result<()> {
        let outcome = self.write_fee_record(record).await;
        self.report(
            outcome,
            "Fee record updated successfully",
            "Failed to update fee record",
        )
    }

    async fn insert_fee_record(&self, record: NewFeeRecord) -> Result<Uuid> {
        validate_fee_record(&record)?;

        let id = Uuid::new_v4();
        let mut row = encode(&record)?;
        row.insert("id".into(), Value::String(id.to_string()));
        row.insert(
            "paid_date".into(),
            serde_json::to_value(paid_date_for(record.status, Utc::now()))?,
        );

        self.store.insert(Collection::FeeRecords, row).await?;

        info!(fee_record_id = %id, student_id = %record.student_id, month = record.month, year = record.year, "Fee record added");
        self.refresh(Collection::FeeRecords).await;
        Ok(id)
    }

    async fn write_fee_record(&self, record: &FeeRecord) -> Result<()> {
        validate_fee(record.month, record.amount)?;

        let now = Utc::now();
        let patch = FeePatch {
            amount: record.amount,
            status: record.status,
            paid_date: paid_date_for(record.status, now),
            updated_at: now,
        };

        self.store
            .update(Collection::FeeRecords, record.id, encode(&patch)?)
            .await?;

        info!(fee_record_id = %record.id, status = ?record.status, "Fee record updated");
        self.refresh(Collection::FeeRecords).await;
        Ok(())
    }
}
