use thiserror::Error;

/// The taxonomy distinguishes fatal, construction-time failures from the
/// soft, iteration-time violations that `kernels`/`neighborhoods` fold into a
/// `MoveDescriptor`'s violation accumulator instead of raising.
#[derive(Debug, Error)]
pub enum D2dError {
    #[error("failed to import problem {path:?}: {reason}")]
    ProblemImport { path: String, reason: String },

    #[error(
        "illegal neighborhood Swap({l1}, {l2}): L2 must satisfy 1 <= L2 <= L1 and both must fit the path"
    )]
    NeighborhoodConfiguration { l1: usize, l2: usize },

    #[error("solution fails feasibility: {reason}")]
    InfeasibleSolution { reason: String },

    #[error("recomputed cost {recomputed:?} disagrees with stored cost {stored:?} beyond tolerance")]
    Integrity {
        stored: [f64; 2],
        recomputed: [f64; 2],
    },
}

pub type Result<T> = std::result::Result<T, D2dError>;

/// Casts an `Option<T>` that is only absent on malformed input into a
/// [`D2dError::ProblemImport`]. Kept from the teacher's `ExpectedValue`
/// helper under a name that states what it is for.
pub fn expect_field<T>(value: Option<T>, path: &str, field: &str) -> Result<T> {
    value.ok_or_else(|| D2dError::ProblemImport {
        path: path.to_string(),
        reason: format!("missing or malformed field: {field}"),
    })
}
