//! Per-group configuration: tree poses plus their cached polygons.

use crate::geometry::{normalize_deg, overlap, Aabb, TreePoly};

/// Tolerance for classifying a tree as touching the global bounding box.
const CORNER_EPS: f64 = 0.01;

/// The pose of one tree: center position and rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub deg: f64,
}

impl Pose {
    /// Creates a new pose.
    pub fn new(x: f64, y: f64, deg: f64) -> Self {
        Self { x, y, deg }
    }

    /// This pose shifted by `(dx, dy)`.
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            deg: self.deg,
        }
    }

    /// This pose rotated by `ddeg`, with the angle reduced to `[0, 360)`.
    pub fn rotated(self, ddeg: f64) -> Self {
        Self {
            deg: normalize_deg(self.deg + ddeg),
            ..self
        }
    }
}

/// One group's mutable state: `n` poses and the polygons derived from
/// them.
///
/// [`Layout::set_pose`] is the only mutator and rebuilds the cached
/// polygon in the same call, so the pose and polygon vectors can never
/// disagree.
#[derive(Debug, Clone)]
pub struct Layout {
    poses: Vec<Pose>,
    polys: Vec<TreePoly>,
}

impl Layout {
    /// A layout of `n` trees, all at the origin in canonical rotation.
    pub fn with_len(n: usize) -> Self {
        Self::from_poses(vec![Pose::default(); n])
    }

    /// Builds a layout from explicit poses.
    pub fn from_poses(poses: Vec<Pose>) -> Self {
        let polys = poses
            .iter()
            .map(|p| TreePoly::at(p.x, p.y, p.deg))
            .collect();
        Self { poses, polys }
    }

    /// Number of trees in the group.
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// True when the group has no trees.
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// The pose of tree `i`.
    pub fn pose(&self, i: usize) -> Pose {
        self.poses[i]
    }

    /// All poses in index order.
    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    /// The placed polygon of tree `i`.
    pub fn poly(&self, i: usize) -> &TreePoly {
        &self.polys[i]
    }

    /// Replaces the pose of tree `i` and rebuilds its polygon.
    pub fn set_pose(&mut self, i: usize, pose: Pose) {
        self.poses[i] = pose;
        self.polys[i] = TreePoly::at(pose.x, pose.y, pose.deg);
    }

    /// True iff tree `i` intersects any other tree.
    pub fn has_overlap(&self, i: usize) -> bool {
        (0..self.len()).any(|j| j != i && overlap(&self.polys[i], &self.polys[j]))
    }

    /// True iff trees `i` and `j` intersect each other or any third tree.
    ///
    /// The re-check against the rest of the layout is intentional: after
    /// a two-tree move it proves global feasibility without trusting the
    /// caller's assumptions about which trees actually changed.
    pub fn has_overlap_pair(&self, i: usize, j: usize) -> bool {
        if overlap(&self.polys[i], &self.polys[j]) {
            return true;
        }
        (0..self.len()).any(|k| {
            k != i
                && k != j
                && (overlap(&self.polys[i], &self.polys[k])
                    || overlap(&self.polys[j], &self.polys[k]))
        })
    }

    /// True iff any two trees in the group intersect.
    pub fn any_overlap(&self) -> bool {
        for i in 0..self.len() {
            for j in (i + 1)..self.len() {
                if overlap(&self.polys[i], &self.polys[j]) {
                    return true;
                }
            }
        }
        false
    }

    /// Bounding box over all placed polygons.
    pub fn bounding_box(&self) -> Aabb {
        self.polys
            .iter()
            .map(TreePoly::bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(Aabb::ZERO)
    }

    /// The longer edge of the global bounding box.
    pub fn side(&self) -> f64 {
        self.bounding_box().longer_side()
    }

    /// The group objective `side² / n`. Requires a non-empty layout.
    pub fn score(&self) -> f64 {
        let s = self.side();
        s * s / self.len() as f64
    }

    /// Mean of the pose centers.
    pub fn centroid(&self) -> (f64, f64) {
        let (sx, sy) = self
            .poses
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        let n = self.len() as f64;
        (sx / n, sy / n)
    }

    /// Indices of trees whose own bounding box touches the global one.
    ///
    /// Only these trees can shrink `side` when moved inward.
    pub fn corner_trees(&self) -> Vec<usize> {
        let global = self.bounding_box();
        (0..self.len())
            .filter(|&i| {
                let b = self.polys[i].bbox();
                (b.min_x - global.min_x).abs() < CORNER_EPS
                    || (b.max_x - global.max_x).abs() < CORNER_EPS
                    || (b.min_y - global.min_y).abs() < CORNER_EPS
                    || (b.max_y - global.max_y).abs() < CORNER_EPS
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(n: usize, pitch: f64) -> Layout {
        Layout::from_poses(
            (0..n)
                .map(|i| Pose::new(i as f64 * pitch, 0.0, 0.0))
                .collect(),
        )
    }

    #[test]
    fn test_single_tree_metrics() {
        let layout = Layout::from_poses(vec![Pose::new(0.0, 0.0, 0.0)]);
        assert_relative_eq!(layout.side(), 1.0);
        assert_relative_eq!(layout.score(), 1.0);
        assert_eq!(layout.corner_trees(), vec![0]);
        let (cx, cy) = layout.centroid();
        assert_relative_eq!(cx, 0.0);
        assert_relative_eq!(cy, 0.0);
    }

    #[test]
    fn test_set_pose_rebuilds_polygon() {
        let mut layout = Layout::with_len(1);
        layout.set_pose(0, Pose::new(1.0, 2.0, 30.0));
        let expected = TreePoly::at(1.0, 2.0, 30.0);
        assert_eq!(layout.poly(0).vertices(), expected.vertices());
        assert_eq!(layout.poly(0).bbox(), expected.bbox());
    }

    #[test]
    fn test_overlap_queries() {
        let layout = row(2, 0.1);
        assert!(layout.has_overlap(0));
        assert!(layout.has_overlap(1));
        assert!(layout.has_overlap_pair(0, 1));
        assert!(layout.any_overlap());

        let spread = row(2, 3.0);
        assert!(!spread.has_overlap(0));
        assert!(!spread.has_overlap_pair(0, 1));
        assert!(!spread.any_overlap());
    }

    #[test]
    fn test_pair_check_sees_third_tree() {
        // Trees 0 and 1 are clear of each other, but tree 2 sits on
        // tree 0; the pair query must still report the conflict.
        let layout = Layout::from_poses(vec![
            Pose::new(0.0, 0.0, 0.0),
            Pose::new(3.0, 0.0, 0.0),
            Pose::new(0.1, 0.0, 0.0),
        ]);
        assert!(layout.has_overlap_pair(0, 1));
    }

    #[test]
    fn test_row_metrics() {
        let layout = row(3, 1.5);
        // Width 0.7 + 2 * 1.5, height 1.0.
        assert_relative_eq!(layout.side(), 3.7);
        assert_relative_eq!(layout.score(), 3.7 * 3.7 / 3.0);
        let (cx, cy) = layout.centroid();
        assert_relative_eq!(cx, 1.5);
        assert_relative_eq!(cy, 0.0);
    }

    #[test]
    fn test_corner_trees_in_grid() {
        let poses: Vec<Pose> = (0..9)
            .map(|i| Pose::new((i % 3) as f64 * 1.5, (i / 3) as f64 * 1.5, 0.0))
            .collect();
        let layout = Layout::from_poses(poses);
        let corners = layout.corner_trees();
        assert_eq!(corners.len(), 8);
        assert!(!corners.contains(&4));
    }

    #[test]
    fn test_empty_layout_side() {
        let layout = Layout::with_len(0);
        assert_relative_eq!(layout.side(), 0.0);
    }
}
