/// Errors produced by the statistical routines.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StatsError {
    /// The sample is too small for the requested procedure.
    #[display("insufficient data: need at least {needed} observations, got {actual}")]
    InsufficientData { needed: usize, actual: usize },
    /// The sample has no spread, so a scale-dependent estimate is undefined.
    #[display("sample has zero variance")]
    ZeroVariance,
    /// A parameter is outside its valid domain.
    #[display("invalid parameter {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
    /// Building a reference distribution failed.
    #[display("distribution error: {_0}")]
    Distribution(statrs::StatsError),
}

impl From<statrs::StatsError> for StatsError {
    fn from(err: statrs::StatsError) -> Self {
        Self::Distribution(err)
    }
}

impl StatsError {
    pub(crate) fn require(needed: usize, actual: usize) -> Result<(), Self> {
        if actual < needed {
            return Err(Self::InsufficientData { needed, actual });
        }
        Ok(())
    }
}
