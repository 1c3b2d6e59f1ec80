use std::fmt::Display;
use std::path::PathBuf;

/// The pipeline stage in which an error was raised. Every `ChangeError` names its stage so that an aborted run
/// always tells the user where it stopped
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    Configuration,
    Input,
    DensityEstimation,
    ThresholdFilter,
    Clustering,
    BoundaryReconstruction,
    VolumeIntegration,
    Summary,
    Output,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::Input => "input",
            Stage::DensityEstimation => "density estimation",
            Stage::ThresholdFilter => "threshold filter",
            Stage::Clustering => "clustering",
            Stage::BoundaryReconstruction => "boundary reconstruction",
            Stage::VolumeIntegration => "volume integration",
            Stage::Summary => "summary",
            Stage::Output => "output",
        };
        f.write_str(name)
    }
}

/// Errors raised by the change detection stages.
///
/// `InvalidParameter` and `Io` are always fatal. `DataInsufficient` and `GeometryDegenerate` are recoverable
/// when they concern a single cluster: the cluster is reported with zero area and volume instead of aborting
/// the whole run.
#[derive(Debug, thiserror::Error)]
pub enum ChangeError {
    #[error("[{stage}] invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        stage: Stage,
        parameter: &'static str,
        reason: String,
    },
    #[error("[{stage}] insufficient data: {reason}")]
    DataInsufficient { stage: Stage, reason: String },
    #[error("[{stage}] degenerate geometry: {reason}")]
    GeometryDegenerate { stage: Stage, reason: String },
    #[error("[{stage}] I/O failure on '{}': {source}", .path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ChangeError {
    pub fn invalid_parameter<S: Into<String>>(
        stage: Stage,
        parameter: &'static str,
        reason: S,
    ) -> Self {
        Self::InvalidParameter {
            stage,
            parameter,
            reason: reason.into(),
        }
    }

    pub fn data_insufficient<S: Into<String>>(stage: Stage, reason: S) -> Self {
        Self::DataInsufficient {
            stage,
            reason: reason.into(),
        }
    }

    pub fn geometry_degenerate<S: Into<String>>(stage: Stage, reason: S) -> Self {
        Self::GeometryDegenerate {
            stage,
            reason: reason.into(),
        }
    }

    pub fn io<P: Into<PathBuf>>(stage: Stage, path: P, source: std::io::Error) -> Self {
        Self::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    /// Returns the stage in which this error was raised
    pub fn stage(&self) -> Stage {
        match self {
            ChangeError::InvalidParameter { stage, .. }
            | ChangeError::DataInsufficient { stage, .. }
            | ChangeError::GeometryDegenerate { stage, .. }
            | ChangeError::Io { stage, .. } => *stage,
        }
    }

    /// Returns true if this error only invalidates a single cluster and the batch can continue
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ChangeError::DataInsufficient { .. } | ChangeError::GeometryDegenerate { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ChangeError>;
