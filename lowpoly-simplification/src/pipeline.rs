//! Per-group decimation pipeline
//!
//! Runs one independent session for a single material-group mesh:
//! cleanup, snapshot, preset and threshold resolution, then the adaptive
//! loop. Sessions share no state, so callers may run one per worker thread.

use crate::adaptive::{AdaptiveDecimator, AttemptResult, DecimationReport};
use crate::cleanup::{CleanupConfig, CleanupStats, MeshCleanup};
use crate::decimate::{CollapseDecimator, DecimationOperator};
use crate::quality::{DecimationConfig, QualityThreshold};
use lowpoly_core::{Mesh, MeshSnapshot, Result};
use tracing::info;

/// Result of running one group through the pipeline
#[derive(Debug, Clone)]
pub struct GroupOutcome {
    /// The decimated mesh
    pub mesh: Mesh,
    /// Polygon count of the group as loaded
    pub input_faces: usize,
    /// Polygon count entering decimation, after cleanup
    pub original_faces: usize,
    /// Polygon count after decimation
    pub final_faces: usize,
    /// Percentage of the loaded polygons removed
    pub reduction_percent: f64,
    pub cleanup: CleanupStats,
    /// Session details, minus the mesh
    pub report: DecimationSummary,
}

/// Decimation session details kept after the mesh is handed off
#[derive(Debug, Clone)]
pub struct DecimationSummary {
    pub attempts: Vec<AttemptResult>,
    pub final_distance: f64,
    pub final_target: usize,
    pub threshold: QualityThreshold,
    pub accepted_via_exhaustion: bool,
    pub short_circuited: bool,
    pub decimation_calls: usize,
}

impl GroupOutcome {
    fn from_report(
        report: DecimationReport,
        input_faces: usize,
        original_faces: usize,
        cleanup: CleanupStats,
    ) -> Self {
        let summary = DecimationSummary {
            attempts: report.attempts,
            final_distance: report.final_distance,
            final_target: report.final_target,
            threshold: report.threshold,
            accepted_via_exhaustion: report.accepted_via_exhaustion,
            short_circuited: report.short_circuited,
            decimation_calls: report.decimation_calls,
        };
        let mesh = report.mesh.into_mesh();
        let final_faces = mesh.face_count();
        let reduction_percent = if input_faces == 0 {
            0.0
        } else {
            (1.0 - final_faces as f64 / input_faces as f64) * 100.0
        };
        Self {
            mesh,
            input_faces,
            original_faces,
            final_faces,
            reduction_percent,
            cleanup,
            report: summary,
        }
    }
}

/// Cleanup followed by quality-controlled decimation
#[derive(Debug, Clone)]
pub struct GroupPipeline<D = CollapseDecimator> {
    pub decimation: DecimationConfig,
    pub cleanup: CleanupConfig,
    operator: D,
}

impl GroupPipeline<CollapseDecimator> {
    pub fn new(decimation: DecimationConfig, cleanup: CleanupConfig) -> Self {
        Self::with_operator(decimation, cleanup, CollapseDecimator::default())
    }
}

impl Default for GroupPipeline<CollapseDecimator> {
    fn default() -> Self {
        Self::new(DecimationConfig::default(), CleanupConfig::default())
    }
}

impl<D: DecimationOperator + Clone> GroupPipeline<D> {
    pub fn with_operator(decimation: DecimationConfig, cleanup: CleanupConfig, operator: D) -> Self {
        Self {
            decimation,
            cleanup,
            operator,
        }
    }

    /// Run one session on `mesh`.
    ///
    /// The configuration is checked before the mesh is touched.
    pub fn run(&self, mut mesh: Mesh) -> Result<GroupOutcome> {
        let initial_target = self.decimation.initial_target()?;
        mesh.validate()?;

        let input_faces = mesh.face_count();
        let cleanup = MeshCleanup::new(self.cleanup).apply(&mut mesh);

        let snapshot = MeshSnapshot::new(mesh)?;
        let original_faces = snapshot.face_count();
        let threshold =
            QualityThreshold::from_diagonal(snapshot.diagonal(), self.decimation.relative_threshold)?;

        let report = AdaptiveDecimator::new(self.operator.clone())
            .with_growth_factor(self.decimation.growth_factor)
            .decimate_with_quality_control(
                &snapshot,
                initial_target,
                &threshold,
                self.decimation.max_attempts,
            )?;

        let outcome = GroupOutcome::from_report(report, input_faces, original_faces, cleanup);
        info!(
            input_faces,
            original_faces,
            final_faces = outcome.final_faces,
            reduction_percent = outcome.reduction_percent,
            hausdorff = outcome.report.final_distance,
            shortfall = outcome.report.accepted_via_exhaustion,
            "group decimated"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lowpoly_core::{Error, Point3f};

    fn grid(size: usize) -> Mesh {
        let mut vertices = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let fx = x as f32 / (size - 1) as f32 * std::f32::consts::PI;
                vertices.push(Point3f::new(x as f32, y as f32, fx.sin()));
            }
        }
        let mut faces = Vec::new();
        for y in 0..(size - 1) {
            for x in 0..(size - 1) {
                let tl = y * size + x;
                faces.push(vec![tl, tl + size, tl + size + 1, tl + 1]);
            }
        }
        Mesh::from_vertices_and_faces(vertices, faces)
    }

    #[test]
    fn test_small_group_is_short_circuited() {
        let pipeline = GroupPipeline::default();
        let outcome = pipeline.run(grid(6)).unwrap();

        assert!(outcome.report.short_circuited);
        assert_eq!(outcome.report.decimation_calls, 0);
        assert_eq!(outcome.input_faces, 25);
        assert_eq!(outcome.original_faces, 25);
        assert_eq!(outcome.final_faces, 25);
        assert_eq!(outcome.reduction_percent, 0.0);
    }

    #[test]
    fn test_quad_group_below_target_is_untouched() {
        let decimation = DecimationConfig {
            preset: "custom".to_string(),
            custom_target: Some(1000),
            ..Default::default()
        };
        let mesh = grid(31);
        let outcome = GroupPipeline::new(decimation, CleanupConfig::default())
            .run(mesh.clone())
            .unwrap();

        assert_eq!(outcome.input_faces, 900);
        assert_eq!(outcome.original_faces, 900);
        assert!(outcome.report.short_circuited);
        assert_eq!(outcome.report.decimation_calls, 0);
        assert_eq!(outcome.mesh.faces, mesh.faces);
    }

    #[test]
    fn test_reduction_measured_against_loaded_polygons() {
        let decimation = DecimationConfig {
            preset: "custom".to_string(),
            custom_target: Some(10),
            ..Default::default()
        };
        let cleanup = CleanupConfig {
            triangulate: true,
            ..Default::default()
        };
        let outcome = GroupPipeline::new(decimation, cleanup).run(grid(6)).unwrap();

        assert_eq!(outcome.input_faces, 25);
        assert_eq!(outcome.original_faces, 50);
        let expected = (1.0 - outcome.final_faces as f64 / 25.0) * 100.0;
        assert!((outcome.reduction_percent - expected).abs() < 1e-9);
    }

    #[test]
    fn test_custom_target_reduces() {
        let decimation = DecimationConfig {
            preset: "custom".to_string(),
            custom_target: Some(100),
            relative_threshold: 0.05,
            ..Default::default()
        };
        let outcome = GroupPipeline::new(decimation, CleanupConfig::default())
            .run(grid(16))
            .unwrap();

        assert_eq!(outcome.input_faces, 225);
        assert_eq!(outcome.original_faces, 225);
        assert!(outcome.final_faces < outcome.original_faces);
        assert!(outcome.reduction_percent > 0.0);
        assert!(outcome.report.decimation_calls >= 1);
    }

    #[test]
    fn test_bad_config_fails_first() {
        let decimation = DecimationConfig {
            preset: "custom".to_string(),
            custom_target: None,
            ..Default::default()
        };
        let err = GroupPipeline::new(decimation, CleanupConfig::default())
            .run(Mesh::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_empty_group_is_invalid_geometry() {
        let err = GroupPipeline::default().run(Mesh::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry(_)));
    }
}
