//! Bulk-loaded 2D k-d tree over latitude/longitude degrees.
//!
//! The tree is built once from a snapshot of points and never mutated
//! afterwards, so a built index can be shared by reference across threads
//! without locking.
//!
//! Nodes live in a flat array. Coordinates and point ids are stored in two
//! parallel arrays reordered so that every leaf covers a contiguous range.
//! Distances are Euclidean in degree space (latitude and longitude treated
//! as planar axes).
//!
//! # Example
//!
//! ```rust
//! use geonear::{GeoPoint, SpatialIndex};
//!
//! let points = vec![
//!     GeoPoint::new(0.0, 0.0),
//!     GeoPoint::new(1.0, 0.0),
//!     GeoPoint::new(0.0, 1.0),
//!     GeoPoint::new(1.0, 1.0),
//! ];
//! let index = SpatialIndex::build(&points);
//!
//! let near = index.k_nearest(&GeoPoint::new(0.1, 0.1), 2).unwrap();
//! assert_eq!(near[0].id, 0);
//! assert_eq!(index.range_query(&GeoPoint::new(0.0, 0.0), 0.5).unwrap(), vec![0]);
//! ```

use crate::compute::validation::{validate_k, validate_query_point, validate_radius};
use crate::config::{IndexConfig, SplitStrategy};
use crate::error::Result;
use crate::store::PointStore;
use geonear_types::PointId;
use geonear_types::assignment::Neighbor;
use geonear_types::bbox::BoundingBox2D;
use geonear_types::geo::GeoPoint;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

const LAT: usize = 0;
const LON: usize = 1;

#[derive(Debug, Clone)]
enum Node {
    /// Points with `coord[axis] <= value` go left, `>= value` go right.
    Split {
        axis: usize,
        value: f64,
        left: usize,
        right: usize,
    },
    /// Range `[start, end)` into `coords`/`ids`.
    Leaf { start: usize, end: usize },
}

/// Immutable k-d tree answering range and k-nearest queries.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    nodes: Vec<Node>,
    coords: Vec<[f64; 2]>,
    ids: Vec<PointId>,
    bounds: Option<BoundingBox2D>,
}

/// Heap entry ordered by `(dist_sq, id)`, so the max-heap top is the current
/// worst candidate and equal distances favour the lower id.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist_sq: f64,
    id: PointId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl SpatialIndex {
    /// Build with default settings. Point ids are the slice positions.
    pub fn build(points: &[GeoPoint]) -> Self {
        Self::build_with(points, &IndexConfig::default())
    }

    /// Build over every point of a store, using the store's identities.
    pub fn from_store(store: &PointStore) -> Self {
        Self::build_with(store.points(), &IndexConfig::default())
    }

    /// Build with explicit leaf size and split strategy.
    ///
    /// Non-finite points cannot be ordered meaningfully and are left out of
    /// the tree; the remaining points keep their slice positions as ids.
    pub fn build_with(points: &[GeoPoint], config: &IndexConfig) -> Self {
        let mut coords = Vec::with_capacity(points.len());
        let mut ids = Vec::with_capacity(points.len());
        for (id, point) in points.iter().enumerate() {
            if point.is_finite() {
                coords.push(point.coords());
                ids.push(id);
            }
        }

        let skipped = points.len() - coords.len();
        if skipped > 0 {
            log::warn!(
                "Skipped {} non-finite points while building spatial index",
                skipped
            );
        }

        let bounds = BoundingBox2D::covering(points.iter().filter(|p| p.is_finite()));
        Self::from_parts(coords, ids, bounds, config)
    }

    fn from_parts(
        coords: Vec<[f64; 2]>,
        ids: Vec<PointId>,
        bounds: Option<BoundingBox2D>,
        config: &IndexConfig,
    ) -> Self {
        let n = coords.len();
        if n == 0 {
            return Self {
                nodes: Vec::new(),
                coords,
                ids,
                bounds: None,
            };
        }

        let leaf_size = config.leaf_size.max(1);
        let mut builder = TreeBuilder {
            coords: &coords,
            nodes: Vec::with_capacity(2 * n / leaf_size + 1),
            leaf_size,
            strategy: config.split_strategy,
        };

        let mut order: Vec<usize> = (0..n).collect();
        builder.build_recursive(&mut order, 0, n, 0);
        let nodes = builder.nodes;

        let sorted_coords: Vec<[f64; 2]> = order.iter().map(|&i| coords[i]).collect();
        let sorted_ids: Vec<PointId> = order.iter().map(|&i| ids[i]).collect();

        Self {
            nodes,
            coords: sorted_coords,
            ids: sorted_ids,
            bounds,
        }
    }

    /// Ids of all points within `radius` degrees of `center`, sorted by id.
    ///
    /// Membership is exact under the degree metric: no point at distance
    /// `<= radius` is missed and none farther away is returned.
    pub fn range_query(&self, center: &GeoPoint, radius: f64) -> Result<Vec<PointId>> {
        validate_query_point(center)?;
        validate_radius(radius)?;

        let mut results = Vec::new();
        if !self.nodes.is_empty() {
            self.range_recursive(0, &center.coords(), radius * radius, &mut |id| {
                results.push(id)
            });
        }
        results.sort_unstable();
        Ok(results)
    }

    /// Number of points within `radius` degrees of `center`.
    pub fn range_count(&self, center: &GeoPoint, radius: f64) -> Result<usize> {
        validate_query_point(center)?;
        validate_radius(radius)?;

        let mut count = 0;
        if !self.nodes.is_empty() {
            self.range_recursive(0, &center.coords(), radius * radius, &mut |_| count += 1);
        }
        Ok(count)
    }

    fn range_recursive(
        &self,
        node_idx: usize,
        query: &[f64; 2],
        radius_sq: f64,
        emit: &mut impl FnMut(PointId),
    ) {
        match self.nodes[node_idx] {
            Node::Leaf { start, end } => {
                for i in start..end {
                    if squared_distance(query, &self.coords[i]) <= radius_sq {
                        emit(self.ids[i]);
                    }
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = query[axis] - value;
                let (near, far) = if diff <= 0.0 {
                    (left, right)
                } else {
                    (right, left)
                };

                self.range_recursive(near, query, radius_sq, emit);
                if diff * diff <= radius_sq {
                    self.range_recursive(far, query, radius_sq, emit);
                }
            }
        }
    }

    /// The `k` nearest points, ascending by distance, ties by id.
    ///
    /// Returns every point when the index holds fewer than `k`.
    pub fn k_nearest(&self, query: &GeoPoint, k: usize) -> Result<Vec<Neighbor>> {
        validate_k(k)?;
        validate_query_point(query)?;

        if self.nodes.is_empty() {
            return Ok(Vec::new());
        }

        let mut heap = BinaryHeap::with_capacity(k.min(self.len()));
        self.knn_recursive(0, &query.coords(), k, &mut heap);

        let mut results: Vec<Neighbor> = heap
            .into_vec()
            .into_iter()
            .map(|c| Neighbor::new(c.id, c.dist_sq.sqrt()))
            .collect();
        results.sort_unstable_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(results)
    }

    fn knn_recursive(
        &self,
        node_idx: usize,
        query: &[f64; 2],
        k: usize,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        match self.nodes[node_idx] {
            Node::Leaf { start, end } => {
                for i in start..end {
                    let candidate = Candidate {
                        dist_sq: squared_distance(query, &self.coords[i]),
                        id: self.ids[i],
                    };
                    if heap.len() < k {
                        heap.push(candidate);
                    } else if let Some(worst) = heap.peek()
                        && candidate < *worst
                    {
                        heap.pop();
                        heap.push(candidate);
                    }
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = query[axis] - value;
                let (near, far) = if diff <= 0.0 {
                    (left, right)
                } else {
                    (right, left)
                };

                self.knn_recursive(near, query, k, heap);

                // `<=` keeps equally distant points with lower ids reachable.
                let visit_far = heap.len() < k
                    || heap
                        .peek()
                        .is_some_and(|worst| diff * diff <= worst.dist_sq);
                if visit_far {
                    self.knn_recursive(far, query, k, heap);
                }
            }
        }
    }

    /// The single nearest point, or `None` for an empty index.
    pub fn nearest(&self, query: &GeoPoint) -> Result<Option<Neighbor>> {
        validate_query_point(query)?;

        if self.nodes.is_empty() {
            return Ok(None);
        }

        let mut best = Candidate {
            dist_sq: f64::INFINITY,
            id: PointId::MAX,
        };
        self.nearest_recursive(0, &query.coords(), &mut best);
        Ok(Some(Neighbor::new(best.id, best.dist_sq.sqrt())))
    }

    fn nearest_recursive(&self, node_idx: usize, query: &[f64; 2], best: &mut Candidate) {
        match self.nodes[node_idx] {
            Node::Leaf { start, end } => {
                for i in start..end {
                    let candidate = Candidate {
                        dist_sq: squared_distance(query, &self.coords[i]),
                        id: self.ids[i],
                    };
                    if candidate < *best {
                        *best = candidate;
                    }
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = query[axis] - value;
                let (near, far) = if diff <= 0.0 {
                    (left, right)
                } else {
                    (right, left)
                };

                self.nearest_recursive(near, query, best);
                if diff * diff <= best.dist_sq {
                    self.nearest_recursive(far, query, best);
                }
            }
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Bounding box of the indexed points.
    pub fn bounds(&self) -> Option<&BoundingBox2D> {
        self.bounds.as_ref()
    }

    /// Length of the longest root-to-leaf path, counted in nodes.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        let mut max_depth = 0;
        let mut stack = vec![(0usize, 1usize)];
        while let Some((idx, depth)) = stack.pop() {
            match self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        max_depth
    }
}

struct TreeBuilder<'a> {
    coords: &'a [[f64; 2]],
    nodes: Vec<Node>,
    leaf_size: usize,
    strategy: SplitStrategy,
}

impl TreeBuilder<'_> {
    fn build_recursive(
        &mut self,
        order: &mut [usize],
        start: usize,
        end: usize,
        depth: usize,
    ) -> usize {
        let count = end - start;

        if count <= self.leaf_size {
            let node_idx = self.nodes.len();
            self.nodes.push(Node::Leaf { start, end });
            return node_idx;
        }

        let axis = match self.strategy {
            SplitStrategy::Spread => self.widest_axis(&order[start..end]),
            SplitStrategy::Alternate => depth % 2,
        };

        let median = count / 2;
        let coords = self.coords;
        order[start..end].select_nth_unstable_by(median, |&a, &b| {
            coords[a][axis].total_cmp(&coords[b][axis])
        });
        let median_pos = start + median;
        let value = coords[order[median_pos]][axis];

        // Placeholder until both children exist.
        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf { start: 0, end: 0 });

        let left = self.build_recursive(order, start, median_pos, depth + 1);
        let right = self.build_recursive(order, median_pos, end, depth + 1);

        self.nodes[node_idx] = Node::Split {
            axis,
            value,
            left,
            right,
        };

        node_idx
    }

    fn widest_axis(&self, order: &[usize]) -> usize {
        let mut lo = [f64::INFINITY; 2];
        let mut hi = [f64::NEG_INFINITY; 2];
        for &idx in order {
            let c = self.coords[idx];
            for axis in [LAT, LON] {
                lo[axis] = lo[axis].min(c[axis]);
                hi[axis] = hi[axis].max(c[axis]);
            }
        }

        if hi[LON] - lo[LON] > hi[LAT] - lo[LAT] {
            LON
        } else {
            LAT
        }
    }
}

#[inline]
fn squared_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let d_lat = a[LAT] - b[LAT];
    let d_lon = a[LON] - b[LON];
    d_lat * d_lat + d_lon * d_lon
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoNearError;

    fn unit_square() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
        ]
    }

    fn random_points(n: usize, seed: u64) -> Vec<GeoPoint> {
        let mut state = seed;
        let mut rng = move || -> f64 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state as f64) / (u64::MAX as f64)
        };
        (0..n)
            .map(|_| GeoPoint::new(-24.0 + rng(), -47.0 + rng()))
            .collect()
    }

    fn brute_force_knn(points: &[GeoPoint], q: &GeoPoint, k: usize) -> Vec<Neighbor> {
        let mut all: Vec<Neighbor> = points
            .iter()
            .enumerate()
            .map(|(id, p)| Neighbor::new(id, squared_distance(&q.coords(), &p.coords()).sqrt()))
            .collect();
        all.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        all.truncate(k);
        all
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::build(&[]);
        let q = GeoPoint::new(0.0, 0.0);

        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert_eq!(index.depth(), 0);
        assert!(index.bounds().is_none());
        assert!(index.range_query(&q, 10.0).unwrap().is_empty());
        assert_eq!(index.range_count(&q, 10.0).unwrap(), 0);
        assert!(index.k_nearest(&q, 3).unwrap().is_empty());
        assert!(index.nearest(&q).unwrap().is_none());
    }

    #[test]
    fn test_range_query_unit_square() {
        let index = SpatialIndex::build(&unit_square());

        let ids = index.range_query(&GeoPoint::new(0.0, 0.0), 0.5).unwrap();
        assert_eq!(ids, vec![0]);

        let ids = index.range_query(&GeoPoint::new(0.0, 0.0), 1.0).unwrap();
        assert_eq!(ids, vec![0, 1, 2]);

        let ids = index.range_query(&GeoPoint::new(0.5, 0.5), 0.75).unwrap();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(
            index.range_count(&GeoPoint::new(0.5, 0.5), 0.75).unwrap(),
            4
        );
    }

    #[test]
    fn test_k_nearest_equal_distances_ordered_by_id() {
        let index = SpatialIndex::build(&unit_square());
        let result = index.k_nearest(&GeoPoint::new(0.5, 0.5), 4).unwrap();

        let ids: Vec<PointId> = result.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        for n in &result {
            assert_eq!(n.distance, result[0].distance);
        }
    }

    #[test]
    fn test_k_nearest_fewer_points_than_k() {
        let index = SpatialIndex::build(&unit_square());
        let result = index.k_nearest(&GeoPoint::new(0.1, 0.1), 10).unwrap();
        assert_eq!(result.len(), 4);
        assert_eq!(result[0].id, 0);
    }

    #[test]
    fn test_k_nearest_rejects_zero_k() {
        let index = SpatialIndex::build(&unit_square());
        let err = index.k_nearest(&GeoPoint::new(0.0, 0.0), 0).unwrap_err();
        assert!(matches!(err, GeoNearError::InvalidArgument(_)));
    }

    #[test]
    fn test_invalid_query_arguments() {
        let index = SpatialIndex::build(&unit_square());
        let nan = GeoPoint::new(f64::NAN, 0.0);
        assert!(index.range_query(&nan, 1.0).is_err());
        assert!(index.range_query(&GeoPoint::new(0.0, 0.0), -1.0).is_err());
        assert!(index.k_nearest(&nan, 1).is_err());
        assert!(index.nearest(&nan).is_err());
    }

    #[test]
    fn test_duplicate_points_tie_break() {
        let points = vec![GeoPoint::new(5.0, 5.0); 40];
        let config = IndexConfig::default().with_leaf_size(2);
        let index = SpatialIndex::build_with(&points, &config);

        let result = index.k_nearest(&GeoPoint::new(5.0, 5.0), 5).unwrap();
        let ids: Vec<PointId> = result.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);

        let nearest = index.nearest(&GeoPoint::new(6.0, 6.0)).unwrap().unwrap();
        assert_eq!(nearest.id, 0);
    }

    #[test]
    fn test_non_finite_points_are_skipped_at_build() {
        let points = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(f64::NAN, 1.0),
            GeoPoint::new(2.0, 2.0),
        ];
        let index = SpatialIndex::build(&points);
        assert_eq!(index.len(), 2);

        let result = index.k_nearest(&GeoPoint::new(2.0, 2.0), 3).unwrap();
        let ids: Vec<PointId> = result.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 0]);

        assert_eq!(
            index.bounds(),
            Some(&BoundingBox2D::new(0.0, 0.0, 2.0, 2.0))
        );
    }

    #[test]
    fn test_brute_force_equivalence() {
        let points = random_points(2_000, 0x9E37_79B9_7F4A_7C15);
        let queries = random_points(50, 42);

        for strategy in [SplitStrategy::Spread, SplitStrategy::Alternate] {
            for leaf_size in [1, 4, 16, 64] {
                let config = IndexConfig::default()
                    .with_leaf_size(leaf_size)
                    .with_split_strategy(strategy);
                let index = SpatialIndex::build_with(&points, &config);
                assert_eq!(index.len(), points.len());

                for q in &queries {
                    let expected = brute_force_knn(&points, q, 7);
                    let got = index.k_nearest(q, 7).unwrap();
                    assert_eq!(got, expected);

                    let nearest = index.nearest(q).unwrap().unwrap();
                    assert_eq!(nearest, expected[0]);

                    let radius = 0.05;
                    let mut expected_ids: Vec<PointId> = points
                        .iter()
                        .enumerate()
                        .filter(|(_, p)| squared_distance(&q.coords(), &p.coords()) <= radius * radius)
                        .map(|(id, _)| id)
                        .collect();
                    expected_ids.sort_unstable();
                    assert_eq!(index.range_query(q, radius).unwrap(), expected_ids);
                }
            }
        }
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let points = random_points(500, 7);
        let a = SpatialIndex::build(&points);
        let b = SpatialIndex::build(&points);
        let q = GeoPoint::new(-23.5, -46.5);

        assert_eq!(a.k_nearest(&q, 20).unwrap(), b.k_nearest(&q, 20).unwrap());
        assert_eq!(
            a.range_query(&q, 0.1).unwrap(),
            b.range_query(&q, 0.1).unwrap()
        );
    }

    #[test]
    fn test_tree_is_balanced() {
        let points = random_points(4_096, 11);
        let config = IndexConfig::default().with_leaf_size(1);
        let index = SpatialIndex::build_with(&points, &config);
        // 4096 = 2^12 points, one per leaf
        assert_eq!(index.depth(), 13);
    }

    #[test]
    fn test_bounds() {
        let index = SpatialIndex::build(&unit_square());
        let bounds = index.bounds().unwrap();
        assert_eq!(bounds.min_lat(), 0.0);
        assert_eq!(bounds.max_lat(), 1.0);
        assert_eq!(bounds.min_lon(), 0.0);
        assert_eq!(bounds.max_lon(), 1.0);
    }
}
