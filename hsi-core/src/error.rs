use thiserror::Error;

/// Boxed error coming out of a collaborator (a file reader, a warp backend, ...).
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can abort a transect.
///
/// There are no retries anywhere in the core. Each variant is surfaced to the caller, which
/// decides whether to skip the transect or stop the run.
#[derive(Debug, Error)]
pub enum Error {
    /// A required parameter is missing or cannot be parsed. Raised before any I/O happens.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// The inputs describe a degenerate footprint or an empty raster grid.
    #[error("degenerate geometry: {0}")]
    Geometry(String),
    /// No feature correspondence survived filtering.
    ///
    /// This only aborts the calibration stage. Orthorectification products that were already
    /// produced stay valid.
    #[error("feature matching failed: {0}")]
    Matching(String),
    /// The coordinate transform backend rejected the points.
    #[error("coordinate transform {source_crs} -> {target_crs} failed: {reason}")]
    Crs {
        source_crs: String,
        target_crs: String,
        reason: String,
    },
    /// A raster that has to share the mosaic grid does not.
    #[error("{raster} is not aligned with the mosaic grid: {reason}")]
    GridMismatch { raster: &'static str, reason: String },
    /// An upstream artifact could not be opened.
    #[error("cannot open {artifact}; it is produced by the {stage} stage")]
    MissingArtifact {
        artifact: String,
        stage: String,
        #[source]
        source: Option<BoxedError>,
    },
    /// The DEM has no height at a world position.
    #[error("no DEM height at ({x}, {y})")]
    Sampling { x: f64, y: f64 },
}

impl Error {
    /// Builds a [`Error::MissingArtifact`] naming the artifact and the stage that produces it.
    pub fn missing_artifact(
        artifact: impl Into<String>,
        stage: impl Into<String>,
        source: Option<BoxedError>,
    ) -> Self {
        Self::MissingArtifact {
            artifact: artifact.into(),
            stage: stage.into(),
            source,
        }
    }

    /// Returns `true` for errors that leave already-produced orthorectification outputs usable.
    pub fn is_calibration_only(&self) -> bool {
        matches!(self, Self::Matching(_))
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
