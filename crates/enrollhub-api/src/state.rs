//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use enrollhub_core::config::AppConfig;
use enrollhub_database::store::EnrollmentStore;
use enrollhub_service::{
    AvailabilityService, BatchLocks, BatchService, BookingService, CatalogService,
    EnrollmentReconciler,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process start, for uptime reporting
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Enrollment store (memory or PostgreSQL)
    pub store: Arc<dyn EnrollmentStore>,
    /// Per-batch locks shared by every seat-moving service
    pub locks: Arc<BatchLocks>,

    // ── Services ─────────────────────────────────────────────
    /// Booking lifecycle
    pub booking_service: Arc<BookingService>,
    /// Batch administration
    pub batch_service: Arc<BatchService>,
    /// Students and programs
    pub catalog_service: Arc<CatalogService>,
    /// Read-only availability projections
    pub availability_service: Arc<AvailabilityService>,
    /// Roster/booking reconciliation
    pub reconciler: Arc<EnrollmentReconciler>,
}

impl AppState {
    /// Wire every service over `store`.
    pub fn new(config: AppConfig, store: Arc<dyn EnrollmentStore>) -> Self {
        let locks = Arc::new(BatchLocks::new(config.booking.lock_timeout()));

        let booking_service = Arc::new(BookingService::new(
            Arc::clone(&store),
            Arc::clone(&locks),
            config.booking.clone(),
        ));
        let batch_service = Arc::new(BatchService::new(
            Arc::clone(&store),
            Arc::clone(&locks),
            Arc::clone(&booking_service),
        ));
        let catalog_service = Arc::new(CatalogService::new(
            Arc::clone(&store),
            Arc::clone(&batch_service),
        ));
        let availability_service = Arc::new(AvailabilityService::new(Arc::clone(&store)));
        let reconciler = Arc::new(EnrollmentReconciler::new(
            Arc::clone(&store),
            Arc::clone(&locks),
        ));

        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
            store,
            locks,
            booking_service,
            batch_service,
            catalog_service,
            availability_service,
            reconciler,
        }
    }
}
