//! Dashboard generation with tiered fallback.
//!
//! Tiers are tried in order until one succeeds:
//! 1. embedded: the backend-rendered report URL, checked for a 2xx
//! 2. unified: `/unified-report-data` JSON
//! 3. legacy: `/dashboard-data` JSON
//!
//! Each failed tier is logged and recorded; when all fail the caller gets
//! one fixed user-facing message.

use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use cw_client::ReportingApi;
use cw_common::{validate_inputs, DashboardView, DateRange, PatientId, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when no tier produced a dashboard.
pub const DASHBOARD_FAILED: &str = "Failed to generate dashboard. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Embedded,
    Unified,
    Legacy,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Embedded => "embedded",
            Tier::Unified => "unified",
            Tier::Legacy => "legacy",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which JSON shape a data dashboard was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Unified,
    Legacy,
}

/// One tier that was tried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierAttempt {
    pub tier: Tier,
    /// `None` when the tier succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardOutcome {
    Embedded { url: String },
    Data { source: DataSource, view: DashboardView },
}

/// A generated dashboard plus the tiers tried to get it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub patient_id: PatientId,
    pub range: DateRange,
    pub outcome: DashboardOutcome,
    pub attempts: Vec<TierAttempt>,
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to generate dashboard. Please try again.")]
    AllTiersFailed { attempts: Vec<TierAttempt> },
}

/// Patient/date selection as entered.
#[derive(Debug, Clone, Default)]
pub struct DashboardRequest<'a> {
    pub patient: Option<&'a str>,
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
    pub include_analysis: bool,
}

pub struct DashboardController<'a, A: ?Sized> {
    api: &'a A,
    ctx: LogContext,
    skip_embedded: bool,
}

impl<'a, A: ReportingApi + ?Sized> DashboardController<'a, A> {
    pub fn new(api: &'a A, ctx: LogContext) -> Self {
        Self {
            api,
            ctx,
            skip_embedded: false,
        }
    }

    /// Start the chain at the unified tier.
    pub fn skip_embedded(mut self, skip: bool) -> Self {
        self.skip_embedded = skip;
        self
    }

    pub fn generate(&self, request: &DashboardRequest<'_>) -> Result<Dashboard, DashboardError> {
        let (patient, range) = validate_inputs(request.patient, request.start, request.end)?;
        let start = range.start_str();
        let end = range.end_str();
        let mut attempts = Vec::new();

        let done = |outcome: DashboardOutcome, attempts: Vec<TierAttempt>| {
            log_event!(
                self.ctx,
                INFO,
                event_names::FETCH_DASHBOARD_READY,
                Stage::Fetch,
                "dashboard ready",
                patient_id = patient.as_str(),
                tiers_tried = attempts.len()
            );
            Dashboard {
                patient_id: patient.clone(),
                range,
                outcome,
                attempts,
            }
        };

        if !self.skip_embedded {
            self.started(Tier::Embedded);
            let url = self.api.embedded_report_url(
                &patient,
                Some(&start),
                Some(&end),
                request.include_analysis,
            );
            match self.api.check_url(&url) {
                Ok(()) => {
                    attempts.push(TierAttempt {
                        tier: Tier::Embedded,
                        error: None,
                    });
                    return Ok(done(DashboardOutcome::Embedded { url }, attempts));
                }
                Err(e) => attempts.push(self.failed(Tier::Embedded, &e)),
            }
        }

        self.started(Tier::Unified);
        match self.api.fetch_unified_report_data(
            &patient,
            Some(&start),
            Some(&end),
            request.include_analysis,
        ) {
            Ok(data) => {
                attempts.push(TierAttempt {
                    tier: Tier::Unified,
                    error: None,
                });
                let outcome = DashboardOutcome::Data {
                    source: DataSource::Unified,
                    view: DashboardView::from_unified(&data),
                };
                return Ok(done(outcome, attempts));
            }
            Err(e) => attempts.push(self.failed(Tier::Unified, &e)),
        }

        self.started(Tier::Legacy);
        match self.api.fetch_dashboard_data(
            &patient,
            Some(&start),
            Some(&end),
            request.include_analysis,
        ) {
            Ok(data) => {
                attempts.push(TierAttempt {
                    tier: Tier::Legacy,
                    error: None,
                });
                let outcome = DashboardOutcome::Data {
                    source: DataSource::Legacy,
                    view: DashboardView::from_legacy(&data),
                };
                Ok(done(outcome, attempts))
            }
            Err(e) => {
                attempts.push(self.failed(Tier::Legacy, &e));
                log_event!(
                    self.ctx,
                    ERROR,
                    event_names::FETCH_FAILED,
                    Stage::Fetch,
                    DASHBOARD_FAILED,
                    patient_id = patient.as_str()
                );
                Err(DashboardError::AllTiersFailed { attempts })
            }
        }
    }

    fn started(&self, tier: Tier) {
        log_event!(
            self.ctx,
            DEBUG,
            event_names::FETCH_TIER_STARTED,
            Stage::Fetch,
            "trying dashboard tier",
            tier = tier.as_str()
        );
    }

    fn failed(&self, tier: Tier, error: &cw_client::ApiError) -> TierAttempt {
        log_event!(
            self.ctx,
            WARN,
            event_names::FETCH_TIER_FAILED,
            Stage::Fetch,
            "dashboard tier failed",
            tier = tier.as_str(),
            error = error.to_string().as_str()
        );
        TierAttempt {
            tier,
            error: Some(error.to_string()),
        }
    }
}
