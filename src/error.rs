use std::fmt;

use thiserror::Error;

/// Pipeline step names surfaced with every ingestion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ResolveTeams,
    GetOrCreateOpponent,
    CreateMatchRecord,
    ExtractOurLineup,
    ExtractOpponentLineup,
    BuildLineupRows,
    BulkInsertEvents,
    ExtractGoals,
    ComputeMatchStatistics,
    ComputePlayerStatistics,
    RecomputeClubSeason,
    RecomputePlayerSeason,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::ResolveTeams => "resolve-teams",
            Step::GetOrCreateOpponent => "get-or-create-opponent",
            Step::CreateMatchRecord => "create-match-record",
            Step::ExtractOurLineup => "extract-our-lineup",
            Step::ExtractOpponentLineup => "extract-opponent-lineup",
            Step::BuildLineupRows => "build-lineup-rows",
            Step::BulkInsertEvents => "bulk-insert-events",
            Step::ExtractGoals => "extract-goals",
            Step::ComputeMatchStatistics => "compute-match-statistics",
            Step::ComputePlayerStatistics => "compute-player-statistics",
            Step::RecomputeClubSeason => "recompute-club-season",
            Step::RecomputePlayerSeason => "recompute-player-season",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every ingestion run either commits fully or fails with exactly one of
/// these. Malformed input and inconsistent uploads are `Validation`;
/// duplicate uploads are `Conflict`; anything unexpected from the store is
/// wrapped as `Storage` with the step it interrupted.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("validation failed at {step}: {detail}")]
    Validation { step: Step, detail: String },

    #[error("{what} not found at {step}")]
    NotFound { step: Step, what: String },

    #[error("duplicate ingest: {detail}")]
    Conflict { detail: String },

    #[error("storage failure at {step}: {source}")]
    Storage {
        step: Step,
        #[source]
        source: rusqlite::Error,
    },
}

impl StatsError {
    pub fn validation(step: Step, detail: impl Into<String>) -> Self {
        StatsError::Validation {
            step,
            detail: detail.into(),
        }
    }

    pub fn not_found(step: Step, what: impl Into<String>) -> Self {
        StatsError::NotFound {
            step,
            what: what.into(),
        }
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        StatsError::Conflict {
            detail: detail.into(),
        }
    }

    /// Adapter for `map_err` at store call sites.
    pub fn storage(step: Step) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| StatsError::Storage { step, source }
    }

    pub fn step(&self) -> Option<Step> {
        match self {
            StatsError::Validation { step, .. }
            | StatsError::NotFound { step, .. }
            | StatsError::Storage { step, .. } => Some(*step),
            StatsError::Conflict { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_are_kebab_case() {
        assert_eq!(Step::ResolveTeams.as_str(), "resolve-teams");
        assert_eq!(Step::RecomputePlayerSeason.as_str(), "recompute-player-season");
    }

    #[test]
    fn validation_error_carries_step() {
        let err = StatsError::validation(Step::CreateMatchRecord, "declared 2 != derived 1");
        assert_eq!(err.step(), Some(Step::CreateMatchRecord));
        assert!(err.to_string().contains("create-match-record"));
    }
}
