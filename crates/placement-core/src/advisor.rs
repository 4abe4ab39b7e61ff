//! Advisory analyzer interface.
//!
//! An analyzer (typically a large-language-model call) may enrich the final
//! report. The engine treats it as a strictly optional side path: the
//! rule-based fallback is always computed first, the analyzer runs under a
//! wall-clock budget, and any timeout, transport failure, or invalid output
//! yields the fallback unchanged.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{AnsweredRecord, NovakidLevel};
use crate::scoring::PlacementReport;
use crate::session::SessionState;

/// Enriched session history handed to the analyzer.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisorRequest {
    pub history: Vec<AnsweredRecord>,
    pub final_level: NovakidLevel,
    pub overall_accuracy: f64,
    pub momentum: f64,
    pub questions_answered: usize,
    pub audio_served: u32,
    pub text_served: u32,
    pub started_at: DateTime<Utc>,
}

impl AdvisorRequest {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            history: state.history.clone(),
            final_level: state.current_level,
            overall_accuracy: state.overall_accuracy().unwrap_or(0.0),
            momentum: state.momentum,
            questions_answered: state.q_index,
            audio_served: state.category_tally.audio,
            text_served: state.category_tally.text,
            started_at: state.started_at,
        }
    }
}

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("advisor transport failure: {0}")]
    Transport(String),

    #[error("advisor returned malformed output: {0}")]
    Malformed(String),

    #[error("advisor is unavailable")]
    Unavailable,
}

/// Synchronous contract for the external analyzer. Implementations must
/// finish within the configured time budget; the caller enforces it with a
/// timeout either way.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PlacementAdvisor: Send + Sync {
    async fn analyze(&self, request: &AdvisorRequest) -> Result<PlacementReport, AdvisorError>;
}

/// Run the analyzer against the request and return its report if it arrives
/// in time and validates; otherwise return the fallback unchanged.
pub async fn resolve_report(
    advisor: &dyn PlacementAdvisor,
    request: &AdvisorRequest,
    fallback: PlacementReport,
    timeout_seconds: u64,
) -> PlacementReport {
    let budget = Duration::from_secs(timeout_seconds);
    match tokio::time::timeout(budget, advisor.analyze(request)).await {
        Err(_) => {
            warn!(timeout_seconds, "advisor timed out; using fallback report");
            fallback
        }
        Ok(Err(error)) => {
            warn!(%error, "advisor failed; using fallback report");
            fallback
        }
        Ok(Ok(report)) => match report.validate() {
            Ok(()) => {
                debug!("advisor report accepted");
                report
            }
            Err(reason) => {
                warn!(reason = %reason, "advisor report rejected; using fallback report");
                fallback
            }
        },
    }
}
