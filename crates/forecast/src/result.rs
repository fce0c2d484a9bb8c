use thiserror::Error;

/// Failure of the primary statistical model.
///
/// Always recoverable: the demand model falls back to the heuristic rung.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelFitError {
    #[error("need at least {required} observations for seasonal fit, found {found}")]
    InsufficientSeasons { required: usize, found: usize },

    #[error("exogenous design matrix is singular")]
    SingularDesign,

    #[error("exogenous columns are misaligned: {0}")]
    MisalignedCovariates(String),

    #[error("model produced non-finite values")]
    NonFinite,

    #[error("model degenerated to a constant forecast")]
    Degenerate,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("insufficient history: need {required} observations, found {found}")]
    DataInsufficient { required: usize, found: usize },

    #[error("history is empty")]
    EmptyHistory,

    #[error("model fit failed: {0}")]
    ModelFit(#[from] ModelFitError),

    #[error("invalid forecast input: {0}")]
    InvalidInput(String),

    #[error("tenant scope violation: {0}")]
    TenantScope(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ForecastError {
    /// Conditions the fallback ladder absorbs instead of surfacing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ForecastError::DataInsufficient { .. }
                | ForecastError::EmptyHistory
                | ForecastError::ModelFit(_)
        )
    }
}
