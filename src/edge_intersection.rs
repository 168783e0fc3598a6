// Copyright (c) 2018-2021 Thomas Kramer.
// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Segment intersection primitives supplied to the sweep.
//!
//! The engine never computes intersection points itself; the caller
//! chooses one of these functions (or provides its own) depending on the
//! coordinate type. Only the rational variant is exact.

use iron_shapes::edge::{Edge, EdgeIntersection};
use iron_shapes::CoordinateType;
use num_integer::Integer;
use num_rational::Ratio;
use num_traits::{Float, PrimInt};
use std::fmt::Debug;

/// Intersection primitive for floating point coordinates. Crossing
/// points are located within a small tolerance and are generally not
/// representable exactly; degenerate inputs may behave surprisingly.
pub fn edge_intersection_float<F: Float>(
    e1: &Edge<F>,
    e2: &Edge<F>,
) -> EdgeIntersection<F, F, Edge<F>> {
    e1.edge_intersection_approx(e2, F::from(1e-8).unwrap())
}

/// Intersection primitive for rational coordinates. Every crossing point
/// of two rational segments is itself rational, so this variant is
/// exact and the preferred one for robust results.
pub fn edge_intersection_rational<T>(
    e1: &Edge<Ratio<T>>,
    e2: &Edge<Ratio<T>>,
) -> EdgeIntersection<Ratio<T>, Ratio<T>, Edge<Ratio<T>>>
where
    T: CoordinateType + Integer,
{
    e1.edge_intersection_rational(e2)
}

/// Intersection primitive for integer coordinates. Crossing points are
/// snapped to the grid, except between axis-parallel edges where they
/// are already on it.
pub fn edge_intersection_integer<T: PrimInt + Debug>(
    e1: &Edge<T>,
    e2: &Edge<T>,
) -> EdgeIntersection<T, T, Edge<T>> {
    e1.edge_intersection_rounded(e2)
}
