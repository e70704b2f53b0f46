//! Points and axis-aligned extents.

use mpi::traits::Equivalence;

/// A point in three-dimensional space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Equivalence)]
pub struct Point {
    coords: [f64; 3],
}

impl Point {
    /// Create a new point from its coordinates.
    pub fn new(coords: [f64; 3]) -> Self {
        Self { coords }
    }

    /// Return the coordinates.
    pub fn coords(&self) -> [f64; 3] {
        self.coords
    }
}

impl std::ops::Index<usize> for Point {
    type Output = f64;

    fn index(&self, axis: usize) -> &f64 {
        &self.coords[axis]
    }
}

impl std::ops::IndexMut<usize> for Point {
    fn index_mut(&mut self, axis: usize) -> &mut f64 {
        &mut self.coords[axis]
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [x, y, z] = self.coords;
        write!(f, "({}, {}, {})", x, y, z)
    }
}

/// An axis-aligned bounding box.
///
/// The empty extent has `lo` above `hi` in every axis and acts as the
/// identity for [`Extent::add_extent`], so extents can be unioned across
/// ranks without special-casing ranks that hold no points.
#[derive(Clone, Copy, Debug, PartialEq, Equivalence)]
pub struct Extent {
    /// Lower corner.
    pub lo: [f64; 3],
    /// Upper corner.
    pub hi: [f64; 3],
}

impl Extent {
    /// The empty extent.
    pub fn empty() -> Self {
        Self {
            lo: [f64::MAX; 3],
            hi: [f64::MIN; 3],
        }
    }

    /// Bounding box of a point sequence. Empty input gives the empty extent.
    pub fn from_points(points: &[Point]) -> Self {
        let mut extent = Self::empty();
        for point in points {
            extent.add_point(point);
        }
        extent
    }

    /// Grow to cover `point`.
    pub fn add_point(&mut self, point: &Point) {
        for axis in 0..3 {
            self.lo[axis] = f64::min(self.lo[axis], point[axis]);
            self.hi[axis] = f64::max(self.hi[axis], point[axis]);
        }
    }

    /// Grow to cover `other`.
    pub fn add_extent(&mut self, other: &Extent) {
        for axis in 0..3 {
            self.lo[axis] = f64::min(self.lo[axis], other.lo[axis]);
            self.hi[axis] = f64::max(self.hi[axis], other.hi[axis]);
        }
    }

    /// Edge length along `axis`.
    pub fn length(&self, axis: usize) -> f64 {
        self.hi[axis] - self.lo[axis]
    }

    /// The axis with the largest edge length.
    pub fn longest_axis(&self) -> usize {
        let mut longest = 0;
        let mut max_length = self.length(0);
        for axis in 1..3 {
            if self.length(axis) > max_length {
                max_length = self.length(axis);
                longest = axis;
            }
        }
        longest
    }

    /// Midpoint of the box.
    pub fn center(&self) -> [f64; 3] {
        [
            0.5 * (self.lo[0] + self.hi[0]),
            0.5 * (self.lo[1] + self.hi[1]),
            0.5 * (self.lo[2] + self.hi[2]),
        ]
    }

    /// Whether `point` lies inside the box (boundaries included).
    pub fn contains(&self, point: &Point) -> bool {
        (0..3).all(|axis| point[axis] >= self.lo[axis] && point[axis] <= self.hi[axis])
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(lo: {} {} {}, hi: {} {} {})",
            self.lo[0], self.lo[1], self.lo[2], self.hi[0], self.hi[1], self.hi[2]
        )
    }
}

#[cfg(test)]
mod test {
    use super::{Extent, Point};

    #[test]
    fn bounding_box_of_points() {
        let points = [
            Point::new([0.0, -1.0, 2.0]),
            Point::new([3.0, 1.0, 0.5]),
            Point::new([-2.0, 0.0, 1.0]),
        ];
        let extent = Extent::from_points(&points);
        assert_eq!(extent.lo, [-2.0, -1.0, 0.5]);
        assert_eq!(extent.hi, [3.0, 1.0, 2.0]);
        assert_eq!(extent.longest_axis(), 0);
        assert_eq!(extent.center()[0], 0.5);
        assert!(points.iter().all(|p| extent.contains(p)));
    }

    #[test]
    fn empty_extent_is_union_identity() {
        let mut empty = Extent::empty();
        let other = Extent::from_points(&[Point::new([1.0, 2.0, 3.0])]);
        empty.add_extent(&other);
        assert_eq!(empty, other);
    }

    #[test]
    fn longest_axis_prefers_first_on_tie() {
        let extent = Extent {
            lo: [0.0; 3],
            hi: [1.0; 3],
        };
        assert_eq!(extent.longest_axis(), 0);
    }
}
