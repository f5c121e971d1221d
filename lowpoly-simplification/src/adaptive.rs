//! Quality-gated decimation loop
//!
//! [`AdaptiveDecimator`] repeatedly decimates a fresh copy of a snapshot,
//! measures the one-sided Hausdorff distance back to the snapshot and either
//! accepts the copy or raises the target polygon count and tries again.
//!
//! The loop always returns a mesh. When the attempt budget runs out the last
//! result is accepted and the report is flagged with
//! [`DecimationReport::accepted_via_exhaustion`].

use crate::decimate::DecimationOperator;
use crate::hausdorff::SurfaceIndex;
use crate::quality::{DecimationConfig, QualityThreshold};
use lowpoly_core::{Error, Mesh, MeshSnapshot, Result, WorkingMesh};
use tracing::{debug, info, warn};

/// Outcome of a single decimate-and-measure attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptResult {
    /// Zero-based attempt number
    pub attempt_index: usize,
    /// Target polygon count of this attempt
    pub target_face_count: usize,
    /// Polygon count after decimation
    pub face_count_after: usize,
    /// One-sided Hausdorff distance to the snapshot
    pub hausdorff_distance: f64,
    /// Whether the loop stopped on this attempt
    pub accepted: bool,
}

/// Result of a decimation session
#[derive(Debug, Clone)]
pub struct DecimationReport {
    /// The accepted mesh
    pub mesh: WorkingMesh,
    /// Every attempt, in order
    pub attempts: Vec<AttemptResult>,
    /// Distance of the accepted mesh to the snapshot
    pub final_distance: f64,
    /// Target polygon count of the accepted attempt
    pub final_target: usize,
    /// Tolerance the session ran with
    pub threshold: QualityThreshold,
    /// The threshold was never met and the last attempt was taken anyway
    pub accepted_via_exhaustion: bool,
    /// The snapshot was already at or below the initial target
    pub short_circuited: bool,
    /// Number of times the decimation operator ran
    pub decimation_calls: usize,
}

impl DecimationReport {
    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    pub fn met_threshold(&self) -> bool {
        self.final_distance <= self.threshold.absolute
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh.into_mesh()
    }
}

/// Next target after a rejected attempt.
///
/// Always strictly larger than `current`.
pub fn escalate_target(current: usize, growth_factor: f64) -> usize {
    let next = (current as f64 * growth_factor).round() as usize;
    next.max(current.saturating_add(1))
}

/// Drives the decimate / measure / escalate loop over a [`DecimationOperator`].
#[derive(Debug, Clone)]
pub struct AdaptiveDecimator<D> {
    operator: D,
    growth_factor: f64,
}

impl<D: DecimationOperator> AdaptiveDecimator<D> {
    pub const DEFAULT_MAX_ATTEMPTS: usize = 6;

    pub fn new(operator: D) -> Self {
        Self {
            operator,
            growth_factor: DecimationConfig::MIN_GROWTH_FACTOR,
        }
    }

    /// Override the target growth applied after a rejected attempt.
    pub fn with_growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    fn validate(
        &self,
        snapshot: &MeshSnapshot,
        initial_target: usize,
        threshold: &QualityThreshold,
        max_attempts: usize,
    ) -> Result<()> {
        if snapshot.face_count() == 0 {
            return Err(Error::InvalidGeometry(
                "cannot decimate a mesh with zero polygons".to_string(),
            ));
        }
        if initial_target == 0 {
            return Err(Error::InvalidConfiguration(
                "target polygon count must be positive".to_string(),
            ));
        }
        if max_attempts == 0 {
            return Err(Error::InvalidConfiguration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !threshold.absolute.is_finite() || threshold.absolute <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "absolute Hausdorff threshold must be positive, got {}",
                threshold.absolute
            )));
        }
        if !self.growth_factor.is_finite() || self.growth_factor < DecimationConfig::MIN_GROWTH_FACTOR {
            return Err(Error::InvalidConfiguration(format!(
                "growth factor must be at least {}, got {}",
                DecimationConfig::MIN_GROWTH_FACTOR,
                self.growth_factor
            )));
        }
        Ok(())
    }

    /// Decimate `snapshot` towards `initial_target` polygons while keeping
    /// the one-sided Hausdorff distance within `threshold`.
    ///
    /// Configuration and geometry errors are returned before the snapshot is
    /// copied. Errors from the operator or the measure abort the session.
    pub fn decimate_with_quality_control(
        &self,
        snapshot: &MeshSnapshot,
        initial_target: usize,
        threshold: &QualityThreshold,
        max_attempts: usize,
    ) -> Result<DecimationReport> {
        self.validate(snapshot, initial_target, threshold, max_attempts)?;

        let faces = snapshot.face_count();
        if faces <= initial_target {
            info!(faces, target = initial_target, "mesh already within target, skipping decimation");
            return Ok(DecimationReport {
                mesh: snapshot.working_copy(),
                attempts: Vec::new(),
                final_distance: 0.0,
                final_target: initial_target,
                threshold: *threshold,
                accepted_via_exhaustion: false,
                short_circuited: true,
                decimation_calls: 0,
            });
        }

        let mut index: Option<SurfaceIndex> = None;
        let mut attempts = Vec::with_capacity(max_attempts);
        let mut decimation_calls = 0;
        let mut target = initial_target;
        let mut attempt_index = 0;

        loop {
            let mut working = snapshot.working_copy();
            let ratio = (target as f64 / faces as f64).min(1.0);

            let distance = if ratio >= 1.0 {
                debug!(attempt = attempt_index, target, "target no longer binding");
                0.0
            } else {
                self.operator.decimate(&mut working, ratio)?;
                decimation_calls += 1;
                let index = index.get_or_insert_with(|| SurfaceIndex::build(snapshot.mesh()));
                index.one_sided_hausdorff(working.mesh())?
            };

            let within = distance <= threshold.absolute;
            let last = attempt_index + 1 >= max_attempts;
            let accepted = within || last;

            info!(
                attempt = attempt_index,
                target_faces = target,
                result_faces = working.face_count(),
                hausdorff = distance,
                threshold = threshold.absolute,
                accepted,
                "decimation attempt"
            );

            attempts.push(AttemptResult {
                attempt_index,
                target_face_count: target,
                face_count_after: working.face_count(),
                hausdorff_distance: distance,
                accepted,
            });

            if accepted {
                let accepted_via_exhaustion = !within;
                if accepted_via_exhaustion {
                    warn!(
                        attempts = max_attempts,
                        hausdorff = distance,
                        threshold = threshold.absolute,
                        faces = working.face_count(),
                        "quality threshold not met, accepting best-effort result"
                    );
                }
                return Ok(DecimationReport {
                    mesh: working,
                    attempts,
                    final_distance: distance,
                    final_target: target,
                    threshold: *threshold,
                    accepted_via_exhaustion,
                    short_circuited: false,
                    decimation_calls,
                });
            }

            target = escalate_target(target, self.growth_factor);
            attempt_index += 1;
        }
    }
}
