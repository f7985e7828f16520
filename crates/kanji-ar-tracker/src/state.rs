use std::collections::BTreeMap;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::dictionary::LabelId;
use crate::pose::Pose;

/// One identified marker in a frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedMarker {
    pub id: LabelId,
    pub glyph: String,
    /// Refined corners in image pixels, re-indexed to the upright glyph
    /// (top-left, top-right, bottom-right, bottom-left).
    pub image_corners: [Point2<f64>; 4],
    /// Same corners relative to the principal point, y up.
    pub camera_corners: [Point2<f64>; 4],
    pub pose: Pose,
    /// Clockwise quarter turns that made the glyph upright.
    pub rotations: u8,
}

impl DetectedMarker {
    /// Mean of the image-space corners.
    pub fn center(&self) -> Point2<f64> {
        corners_center(&self.image_corners)
    }
}

pub(crate) fn corners_center(corners: &[Point2<f64>; 4]) -> Point2<f64> {
    let sum = corners
        .iter()
        .fold(nalgebra::Vector2::zeros(), |acc, c| acc + c.coords);
    Point2::from(sum / 4.0)
}

/// Detections of one frame keyed by label id; at most one entry per id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerState {
    markers: BTreeMap<LabelId, DetectedMarker>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a detection; a later marker with the same id replaces the
    /// earlier one.
    pub fn insert(&mut self, marker: DetectedMarker) -> Option<DetectedMarker> {
        self.markers.insert(marker.id, marker)
    }

    pub fn get(&self, id: LabelId) -> Option<&DetectedMarker> {
        self.markers.get(&id)
    }

    pub fn corners(&self, id: LabelId) -> Option<&[Point2<f64>; 4]> {
        self.get(id).map(|m| &m.image_corners)
    }

    pub fn center(&self, id: LabelId) -> Option<Point2<f64>> {
        self.get(id).map(DetectedMarker::center)
    }

    pub fn pose(&self, id: LabelId) -> Option<&Pose> {
        self.get(id).map(|m| &m.pose)
    }

    pub fn centers(&self) -> BTreeMap<LabelId, Point2<f64>> {
        self.markers.iter().map(|(&id, m)| (id, m.center())).collect()
    }

    pub fn poses(&self) -> BTreeMap<LabelId, Pose> {
        self.markers.iter().map(|(&id, m)| (id, m.pose)).collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = LabelId> + '_ {
        self.markers.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetectedMarker> {
        self.markers.values()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Merge `other` into `self`, `other` winning on shared ids.
    pub fn extend(&mut self, other: TrackerState) {
        self.markers.extend(other.markers);
    }
}

impl IntoIterator for TrackerState {
    type Item = DetectedMarker;
    type IntoIter = std::collections::btree_map::IntoValues<LabelId, DetectedMarker>;

    fn into_iter(self) -> Self::IntoIter {
        self.markers.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: LabelId, x0: f64) -> DetectedMarker {
        let corners = [
            Point2::new(x0, 10.0),
            Point2::new(x0 + 20.0, 10.0),
            Point2::new(x0 + 20.0, 30.0),
            Point2::new(x0, 30.0),
        ];
        DetectedMarker {
            id,
            glyph: format!("g{id}"),
            image_corners: corners,
            camera_corners: corners,
            pose: Pose::identity(),
            rotations: 0,
        }
    }

    #[test]
    fn duplicate_ids_keep_the_last_write() {
        let mut state = TrackerState::new();
        assert!(state.insert(marker(3, 0.0)).is_none());
        assert!(state.insert(marker(3, 100.0)).is_some());
        assert_eq!(state.len(), 1);
        assert_eq!(state.center(3), Some(Point2::new(110.0, 20.0)));
    }

    #[test]
    fn queries_by_id() {
        let mut state = TrackerState::new();
        state.insert(marker(2, 50.0));
        state.insert(marker(1, 0.0));
        assert_eq!(state.ids().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(state.corners(2).unwrap()[1], Point2::new(70.0, 10.0));
        assert_eq!(state.centers()[&1], Point2::new(10.0, 20.0));
        assert_eq!(state.poses().len(), 2);
        assert!(state.pose(9).is_none());

        state.clear();
        assert!(state.is_empty());
    }
}
