use rstar::primitives::GeomWithData;
use rstar::RTree;

/// A neighbor returned by a [`SpatialIndex`] query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the point in the slice the index was built from.
    pub index: usize,
    pub distance: f64,
}

/// Nearest-neighbor lookup over a fixed set of 2d points.
pub trait SpatialIndex {
    fn build(points: &[[f64; 2]]) -> Self
    where
        Self: Sized;

    /// The closest point to `query`.
    ///
    /// When several points are equally close, the one built from the lowest index is returned,
    /// so the result does not depend on the internal layout of the index.
    fn nearest(&self, query: [f64; 2]) -> Option<Neighbor>;

    /// Like [`SpatialIndex::nearest`], but only if that point lies within `radius`.
    fn nearest_within(&self, query: [f64; 2], radius: f64) -> Option<Neighbor> {
        self.nearest(query)
            .filter(|neighbor| neighbor.distance <= radius)
    }
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// [`SpatialIndex`] backed by an R*-tree.
#[derive(Debug, Clone)]
pub struct RTreeIndex {
    tree: RTree<IndexedPoint>,
}

impl RTreeIndex {
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SpatialIndex for RTreeIndex {
    fn build(points: &[[f64; 2]]) -> Self {
        let points = points
            .iter()
            .enumerate()
            .map(|(index, &point)| IndexedPoint::new(point, index))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    fn nearest(&self, query: [f64; 2]) -> Option<Neighbor> {
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best) = candidates.next()?;
        let index = candidates
            .take_while(|&(_, distance_2)| distance_2 <= best)
            .fold(first.data, |lowest, (point, _)| lowest.min(point.data));
        Some(Neighbor {
            index,
            distance: best.sqrt(),
        })
    }
}
