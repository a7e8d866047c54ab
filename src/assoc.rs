//! Association between live tracks and candidate detections.
//!
//! Tracks are rows and detections are columns throughout. The cost of a pair
//! is `1 - IoU`; the optimal assignment is found with [`lapjv`] and then
//! gated on the raw IoU.

use crate::lapjv::lapjv;
use crate::{error::TrackError, rect::Rect};
use nalgebra::DMatrix;

/// Compute IoU between all pairs of track boxes and detection boxes.
///
/// # Returns
/// A matrix of shape (num_tracks, num_detections)
pub fn iou_batch(
    tracks: &[Rect<f32>],
    detections: &[Rect<f32>],
) -> DMatrix<f32> {
    DMatrix::from_fn(tracks.len(), detections.len(), |i, j| {
        tracks[i].calc_iou(&detections[j])
    })
}

/// IoU distance (`1 - IoU`) used as the assignment cost.
pub fn iou_distance(ious: &DMatrix<f32>) -> DMatrix<f32> {
    ious.map(|iou| 1.0 - iou)
}

/// Result of linear assignment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssignmentResult {
    /// Matched pairs as (track_index, detection_index)
    pub matches: Vec<(usize, usize)>,
    /// Indices of unmatched tracks
    pub unmatched_tracks: Vec<usize>,
    /// Indices of unmatched detections
    pub unmatched_detections: Vec<usize>,
}

impl AssignmentResult {
    fn all_unmatched(num_trks: usize, num_dets: usize) -> Self {
        Self {
            matches: vec![],
            unmatched_tracks: (0..num_trks).collect(),
            unmatched_detections: (0..num_dets).collect(),
        }
    }
}

/// Optimal assignment on `cost`, keeping only pairs with `IoU >= gate`.
///
/// Pairs the solver proposes below the gate are dropped and both sides are
/// reported unmatched. With no tracks or no detections the solver is skipped.
///
/// # Panics
/// If the solver names a column outside the matrix, which would mean the
/// solver itself is broken.
pub fn linear_assignment(
    ious: &DMatrix<f32>,
    cost_matrix: &DMatrix<f32>,
    gate: f32,
) -> Result<AssignmentResult, TrackError> {
    let (num_trks, num_dets) = cost_matrix.shape();
    debug_assert_eq!(ious.shape(), cost_matrix.shape());

    if num_trks == 0 || num_dets == 0 {
        return Ok(AssignmentResult::all_unmatched(num_trks, num_dets));
    }

    let cost = cost_matrix.map(f64::from);
    let solution = lapjv(&cost)?;
    log::trace!(
        "assignment {}x{} total cost {:.4}",
        num_trks,
        num_dets,
        solution.total_cost(&cost)
    );

    let mut track_matched = vec![false; num_trks];
    let mut det_matched = vec![false; num_dets];
    let mut matches = Vec::new();

    for (trk, det) in solution.x.iter().enumerate() {
        let Some(det) = *det else { continue };
        assert!(
            det < num_dets,
            "assignment solver returned column {} for a {}x{} matrix",
            det,
            num_trks,
            num_dets
        );
        if ious[(trk, det)] >= gate {
            matches.push((trk, det));
            track_matched[trk] = true;
            det_matched[det] = true;
        }
    }

    let unmatched = |flags: &[bool]| -> Vec<usize> {
        flags
            .iter()
            .enumerate()
            .filter(|(_, matched)| !**matched)
            .map(|(i, _)| i)
            .collect()
    };

    Ok(AssignmentResult {
        unmatched_tracks: unmatched(&track_matched),
        unmatched_detections: unmatched(&det_matched),
        matches,
    })
}

/// Build the IoU cost between `tracks` and `detections` and assign them.
pub fn associate(
    tracks: &[Rect<f32>],
    detections: &[Rect<f32>],
    gate: f32,
) -> Result<AssignmentResult, TrackError> {
    let ious = iou_batch(tracks, detections);
    let cost_matrix = iou_distance(&ious);
    linear_assignment(&ious, &cost_matrix, gate)
}
