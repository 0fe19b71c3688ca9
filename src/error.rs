use thiserror::Error;

/// Faults raised by the frame pipeline.
///
/// A missing detection is not one of them: frames without a subject take the
/// no-subject path. A missing landmark breaks the pose source contract and
/// halts the instance; later frames get [`PipelineError::Poisoned`].
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid exercise thresholds: {0:#}")]
    InvalidThresholds(#[source] anyhow::Error),

    #[error("pose source returned landmarks without landmark {0}")]
    MissingLandmark(usize),

    #[error(transparent)]
    PoseSource(#[from] anyhow::Error),

    #[error("pipeline halted after an earlier contract violation; create a new instance")]
    Poisoned,
}
