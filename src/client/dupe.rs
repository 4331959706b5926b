use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::client::executor::RequestExecutor;
use crate::client::service::CityService;
use crate::dto::CityDto;

/// Outcome of a duplicate check. A failed check is never reported as `Unique`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DupeStatus {
    Unique,
    Duplicate,
    Error(String),
}

/// Runs duplicate checks with last-request-wins semantics.
///
/// Every check takes a generation ticket. A result is only delivered if no newer
/// check was started and [`invalidate`](Self::invalidate) was not called while it
/// was in flight.
#[derive(Debug, Clone, Default)]
pub struct DupeCheckValidator {
    generation: Arc<AtomicU64>,
}

impl DupeCheckValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every in-flight check as stale.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Start a new check generation, superseding every earlier one.
    pub fn issue_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns `None` when the result was superseded before it arrived.
    pub async fn check<E: RequestExecutor>(
        &self,
        service: &CityService<E>,
        candidate: &CityDto,
    ) -> Option<DupeStatus> {
        let ticket = self.issue_ticket();
        self.check_with_ticket(ticket, service, candidate).await
    }

    /// Run a check under a ticket taken earlier with [`issue_ticket`](Self::issue_ticket).
    pub async fn check_with_ticket<E: RequestExecutor>(
        &self,
        ticket: u64,
        service: &CityService<E>,
        candidate: &CityDto,
    ) -> Option<DupeStatus> {
        let status = match service.is_dupe_city(candidate).await {
            Ok(true) => DupeStatus::Duplicate,
            Ok(false) => DupeStatus::Unique,
            Err(e) => {
                tracing::error!(name = %candidate.name, "Duplicate check failed: {}", e);
                DupeStatus::Error(e.to_string())
            }
        };

        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, "Discarding stale duplicate check result");
            return None;
        }
        Some(status)
    }
}
