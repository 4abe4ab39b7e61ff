//! Test utilities for placement-core consumers.
//!
//! Provides the mockall-generated advisor mock plus two trivial advisor
//! stubs for wiring failure paths without expectation setup.

use async_trait::async_trait;

use crate::advisor::{AdvisorError, AdvisorRequest, PlacementAdvisor};
use crate::scoring::PlacementReport;

pub use crate::advisor::MockPlacementAdvisor;

/// Advisor that always returns the same report.
pub struct StaticAdvisor(pub PlacementReport);

#[async_trait]
impl PlacementAdvisor for StaticAdvisor {
    async fn analyze(&self, _request: &AdvisorRequest) -> Result<PlacementReport, AdvisorError> {
        Ok(self.0.clone())
    }
}

/// Advisor that always fails.
pub struct FailingAdvisor;

#[async_trait]
impl PlacementAdvisor for FailingAdvisor {
    async fn analyze(&self, _request: &AdvisorRequest) -> Result<PlacementReport, AdvisorError> {
        Err(AdvisorError::Unavailable)
    }
}
