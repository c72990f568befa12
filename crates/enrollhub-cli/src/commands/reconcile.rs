//! Roster reconciliation command.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use enrollhub_core::config::AppConfig;
use enrollhub_core::error::AppError;
use enrollhub_core::types::BatchId;
use enrollhub_database::open_store;
use enrollhub_service::{BatchDrift, BatchLocks, EnrollmentReconciler};

use crate::output::{self, OutputFormat};

/// Arguments for the reconcile command
#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Only check this batch
    #[arg(long)]
    pub batch: Option<Uuid>,
}

/// One drifted batch, for display.
#[derive(Debug, Serialize, Tabled)]
struct DriftRow {
    #[tabled(rename = "Batch")]
    batch_id: String,
    #[tabled(rename = "Counter")]
    counter_before: i32,
    #[tabled(rename = "Roster")]
    registry_before: usize,
    #[tabled(rename = "Seat holders")]
    seat_holders: usize,
    #[tabled(rename = "Outcome")]
    outcome: &'static str,
}

impl From<&BatchDrift> for DriftRow {
    fn from(drift: &BatchDrift) -> Self {
        Self {
            batch_id: drift.batch_id.to_string(),
            counter_before: drift.counter_before,
            registry_before: drift.registry_before,
            seat_holders: drift.seat_holders,
            outcome: if drift.repaired {
                "repaired"
            } else {
                "over capacity"
            },
        }
    }
}

/// Execute the reconcile command
pub async fn execute(
    args: &ReconcileArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let store = open_store(&config.database).await?;
    let locks = Arc::new(BatchLocks::new(config.booking.lock_timeout()));
    let reconciler = EnrollmentReconciler::new(store, locks);

    let (checked, drifts): (usize, Vec<BatchDrift>) = match args.batch {
        Some(id) => {
            let drift = reconciler.reconcile_batch(BatchId::from_uuid(id)).await?;
            (1, drift.into_iter().collect())
        }
        None => {
            let report = reconciler.reconcile_all().await?;
            let mut drifts = report.repaired;
            drifts.extend(report.over_capacity);
            (report.batches_checked, drifts)
        }
    };

    let rows: Vec<DriftRow> = drifts.iter().map(DriftRow::from).collect();
    output::print_list(&rows, format);

    let oversold = drifts.iter().filter(|d| !d.repaired).count();
    if oversold > 0 {
        output::print_warning(&format!(
            "{oversold} batch(es) have more active bookings than seats and need manual review"
        ));
    }
    output::print_success(&format!(
        "Checked {checked} batch(es), repaired {}",
        drifts.len() - oversold
    ));
    Ok(())
}
