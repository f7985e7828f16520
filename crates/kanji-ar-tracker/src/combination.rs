//! Pairwise glyph combinations within one frame.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::dictionary::{LabelDictionary, LabelId};
use crate::pose::{Pose, PoseEstimator};
use crate::state::{corners_center, TrackerState};

/// Combination resolved for an ordered marker pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCombination {
    pub id: LabelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    /// Pose of a virtual marker halfway between the two markers; absent
    /// when the estimator rejects the shifted corners.
    pub pose: Option<Pose>,
}

/// Two detected markers ordered left to right in the image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombinationLink {
    pub left_id: LabelId,
    pub right_id: LabelId,
    pub left_center: Point2<f64>,
    pub right_center: Point2<f64>,
    pub combination: Option<ResolvedCombination>,
}

impl CombinationLink {
    pub fn is_match(&self) -> bool {
        self.combination.is_some()
    }
}

/// Every marker pair of one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameCombinations {
    pub links: Vec<CombinationLink>,
}

impl FrameCombinations {
    /// Pair up all markers in `state`, ordering each pair by image-space
    /// center x, and look the pair up in `dictionary`.
    pub fn resolve(
        state: &TrackerState,
        dictionary: &LabelDictionary,
        estimator: &PoseEstimator,
        marker_size: f64,
    ) -> Self {
        let centers: Vec<(LabelId, Point2<f64>)> = state.centers().into_iter().collect();
        let mut links = Vec::new();
        for (i, &a) in centers.iter().enumerate() {
            for &b in &centers[i + 1..] {
                let (left, right) = if a.1.x < b.1.x { (a, b) } else { (b, a) };
                let combination = dictionary.combination(left.0, right.0).map(|entry| {
                    let pose = virtual_pose(state, left.0, right.0, estimator, marker_size);
                    ResolvedCombination {
                        id: entry.id,
                        word: entry.word.clone(),
                        pose,
                    }
                });
                links.push(CombinationLink {
                    left_id: left.0,
                    right_id: right.0,
                    left_center: left.1,
                    right_center: right.1,
                    combination,
                });
            }
        }
        Self { links }
    }

    pub fn matches(&self) -> impl Iterator<Item = &CombinationLink> {
        self.links.iter().filter(|l| l.is_match())
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Pose of the left marker's corners shifted halfway toward the right marker.
pub fn virtual_pose(
    state: &TrackerState,
    left: LabelId,
    right: LabelId,
    estimator: &PoseEstimator,
    marker_size: f64,
) -> Option<Pose> {
    let l = state.corners(left)?;
    let r = state.corners(right)?;
    let offset = (corners_center(r) - corners_center(l)) / 2.0;
    let shifted = l.map(|c| c + offset);
    match estimator.estimate_from_image(&shifted, marker_size) {
        Ok(pose) => Some(pose),
        Err(err) => {
            log::debug!("virtual pose for {left}+{right} failed: {err}");
            None
        }
    }
}
