// Copyright (c) 2018-2021 Thomas Kramer.
// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Boolean set operations on planar geometries.
//!
//! This crate computes intersection, union, difference and symmetric
//! difference of multisegments (collections of straight line segments)
//! and of multipolygons (collections of simple polygons with holes).
//! The `complete_intersect_*` variants additionally report the
//! lower-dimensional residues of an intersection: isolated touch points
//! and shared boundary segments.
//!
//! The implementation is a single-pass plane sweep over the segment
//! arrangement of both operands. Geometric value types and predicates
//! come from the `iron-shapes` crate; the segment intersection primitive
//! is passed in by the caller, which makes the engine exact whenever the
//! coordinates and the supplied intersection function are exact
//! (see [`edge_intersection_rational`]).
//!
//! # Example
//! ```
//! use iron_shapes_clipping::*;
//! use iron_shapes::prelude::*;
//!
//! let p1 = MultiPolygon::from_polygons(vec![
//!     Polygon::from(vec![(0., 0.), (2., 0.), (2., 2.), (0., 2.)])
//! ]);
//! let p2 = MultiPolygon::from_polygons(vec![
//!     Polygon::from(vec![(1., 1.), (3., 1.), (3., 3.), (1., 3.)])
//! ]);
//!
//! let union = unite_multipolygons(edge_intersection_float, &p1, &p2).unwrap();
//! assert_eq!(union.len(), 1);
//! ```

extern crate iron_shapes;
extern crate itertools;
extern crate libreda_splay;
extern crate log;
extern crate num_integer;
extern crate num_rational;
extern crate num_traits;
extern crate thiserror;

mod compare_segments;
mod connect_edges;
mod edge_intersection;
mod polygon_ops;
mod possible_intersection;
mod segment_ops;
mod sweep_event;

// Public interface.
pub use edge_intersection::{
    edge_intersection_float, edge_intersection_integer, edge_intersection_rational,
};
pub use polygon_ops::{
    boolean_op, complete_intersect_multipolygons, intersect_multipolygons,
    subtract_multipolygons, symmetric_subtract_multipolygons, unite_multipolygons,
};
pub use segment_ops::{
    complete_intersect_multisegments, intersect_multisegments, merge_segments,
    subtract_multisegments, symmetric_subtract_multisegments, unite_multisegments,
};

use thiserror::Error;

/// The boolean set operation to apply to the two operands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operation {
    Intersection,
    Difference,
    Union,
    SymmetricDifference,
}

/// Errors reported for malformed operands.
///
/// The engine does not attempt to repair inputs; every error aborts the
/// operation without partial output.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipError {
    /// A segment with coincident endpoints was passed as input.
    #[error("degenerate segment: start and end point coincide")]
    DegenerateSegment,
    /// Two edges of the same operand overlap in a common sub-segment.
    /// Boundaries of a single multipolygon and segments of a single
    /// multisegment must not overlap each other.
    #[error("edges of the same operand must not overlap")]
    SelfOverlap,
}
