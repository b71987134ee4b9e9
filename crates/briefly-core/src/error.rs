use thiserror::Error;

/// Domain error kinds the pipeline needs to distinguish (spec §7).
#[derive(Error, Debug)]
pub enum BrieflyError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("transient external error: {0}")]
    TransientExternal(String),

    #[error("permanent external error: {0}")]
    PermanentExternal(String),

    #[error("missing capability: {0}")]
    MissingCapability(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("data shape violation: {0}")]
    DataShape(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cost cap exceeded: {0}")]
    CostCapExceeded(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BrieflyError {
    /// True for kinds that should cause the whole stage run to abort and be
    /// retried by the scheduler (spec §7 kind 1 and 6), as opposed to being
    /// absorbed per-item inside the stage loop.
    pub fn is_stage_fatal(&self) -> bool {
        matches!(
            self,
            BrieflyError::Database(_) | BrieflyError::TransientExternal(_)
        )
    }
}
