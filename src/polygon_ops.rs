// Copyright (c) 2018-2021 Thomas Kramer.
// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Boolean operations on multipolygons.
//!
//! The sweep processes the edges of both operands in lexicographic
//! order. Every left event is labelled with the position of the edge
//! relative to the other operand (`compute_fields`); the per-operation
//! selector (`is_in_result`) decides which edges survive, and
//! `connect_edges` stitches the survivors back into polygons with holes.

use std::collections::binary_heap::BinaryHeap;

use iron_shapes::edge::{Edge, EdgeIntersection, Side};
use iron_shapes::multi_polygon::MultiPolygon;
use iron_shapes::point::Point;
use iron_shapes::polygon::{Polygon, SimplePolygon};
use std::rc::{Rc, Weak};

use super::compare_segments::compare_events_by_segments;
use super::connect_edges::connect_edges;
use super::possible_intersection::{possible_intersection, SelfOverlap};
use super::sweep_event::*;
use super::{ClipError, Operation};
use iron_shapes::CoordinateType;
use itertools::Itertools;
use libreda_splay::SplaySet;
use log::{debug, trace};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::ops::RangeFrom;

/// Determine the orientation of a contour given as a cyclic edge
/// sequence. Returns `None` for contours without area (all vertices
/// collinear); those contribute nothing to a boolean operation.
fn is_counter_clockwise<T: CoordinateType>(edges: &[Edge<T>]) -> Option<bool> {
    if edges.len() < 3 {
        return None;
    }

    // The turn at the lexicographically smallest vertex determines the
    // orientation of the whole contour.
    let min_index = edges
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.start.partial_cmp(&b.start).unwrap())
        .map(|(index, _)| index)
        .unwrap();

    let n = edges.len();
    let prev = edges[(min_index + n - 1) % n];
    let here = edges[min_index];
    debug_assert!(prev.end == here.start);

    match Edge::new(prev.start, here.start).side_of(here.end) {
        Side::Left => Some(true),
        Side::Right => Some(false),
        Side::Center => None,
    }
}

/// Insert the edges of a contour into the event queue such that the
/// operand's interior lies to the left of the traversal direction:
/// shells are walked counter-clockwise, holes clockwise.
fn process_contour<T: CoordinateType>(
    event_queue: &mut BinaryHeap<Rc<SweepEvent<T>>>,
    contour: &SimplePolygon<T>,
    operand: Operand,
    is_hole: bool,
    edge_ids: &mut RangeFrom<usize>,
) {
    // Repeated vertices produce zero-length edges; drop them.
    let edges: Vec<_> = contour
        .edges()
        .into_iter()
        .filter(|edge| !edge.is_degenerate())
        .collect();

    let ccw = match is_counter_clockwise(&edges) {
        Some(ccw) => ccw,
        // Zero-area contour.
        None => return,
    };
    let forward = ccw != is_hole;

    for edge in edges {
        let (a, b) = if forward {
            (edge.start, edge.end)
        } else {
            (edge.end, edge.start)
        };

        let edge_id = edge_ids.next().unwrap();
        let event_a_is_left = a < b;
        // Walking left to right keeps the interior above the edge.
        let interior_to_left = event_a_is_left;

        let event_a = SweepEvent::new_rc(
            edge_id,
            a,
            event_a_is_left,
            Weak::new(),
            operand,
            interior_to_left,
        );
        let event_b = SweepEvent::new_rc(
            edge_id,
            b,
            !event_a_is_left,
            Rc::downgrade(&event_a),
            operand,
            interior_to_left,
        );

        event_a.set_other_event(&event_b);

        event_queue.push(event_a);
        event_queue.push(event_b);
    }
}

/// Seed the event queue with the oriented edges of both operands.
fn fill_queue<'a, T, S, C>(subject: S, clipping: C) -> BinaryHeap<Rc<SweepEvent<T>>>
where
    S: Iterator<Item = &'a Polygon<T>>,
    C: Iterator<Item = &'a Polygon<T>>,
    T: CoordinateType + 'a,
{
    let mut event_queue = BinaryHeap::new();
    let mut edge_ids = 0..;

    fn process_polygon<T: CoordinateType>(
        event_queue: &mut BinaryHeap<Rc<SweepEvent<T>>>,
        poly: &Polygon<T>,
        operand: Operand,
        edge_ids: &mut RangeFrom<usize>,
    ) {
        process_contour(event_queue, &poly.exterior, operand, false, edge_ids);
        for hole in &poly.interiors {
            process_contour(event_queue, hole, operand, true, edge_ids);
        }
    }

    for p in subject {
        process_polygon(&mut event_queue, p, Operand::Subject, &mut edge_ids);
    }
    for p in clipping {
        process_polygon(&mut event_queue, p, Operand::Clipping, &mut edge_ids);
    }

    event_queue
}

/// Check if the edge of the event contributes to the result of the operation.
fn is_in_result<T: CoordinateType>(event: &SweepEvent<T>, operation: Operation) -> bool {
    match operation {
        Operation::Intersection => {
            event.is_inside_other()
                || (event.operand == Operand::Clipping && event.is_common_region_boundary())
        }
        Operation::Union => {
            event.is_outside_other()
                || (event.operand == Operand::Clipping && event.is_common_region_boundary())
        }
        Operation::Difference => match event.operand {
            Operand::Subject => event.is_outside_other(),
            Operand::Clipping => event.is_inside_other() || event.is_common_polyline_component(),
        },
        Operation::SymmetricDifference => !event.is_overlap(),
    }
}

/// Label a freshly inserted left event from the edge directly below it
/// in the scan line, or with the defaults when there is none.
fn compute_fields<T>(
    event: &Rc<SweepEvent<T>>,
    maybe_below: Option<&Rc<SweepEvent<T>>>,
    operation: Operation,
) where
    T: CoordinateType,
{
    if let Some(below) = maybe_below {
        let other_interior_to_left = if event.operand == below.operand {
            below.other_interior_to_left()
        } else {
            below.interior_to_left
        };
        event.set_other_interior_to_left(other_interior_to_left);

        // Remember the closest contributing edge below. Vertical edges
        // cannot separate regions at the current abscissa and are skipped.
        let below_in_result = if !below.is_in_result() || below.is_vertical() {
            below.get_below_in_result()
        } else {
            Rc::downgrade(below)
        };
        event.set_below_in_result(below_in_result);
    }
    event.set_in_result(is_in_result(event, operation));
}

/// Find all intersecting segments and subdivide them such that the set of
/// resulting segments contains no interior intersections anymore, while
/// labelling every left event for the given operation.
/// The resulting events are sorted by their processing order.
fn subdivide_segments<T, I>(
    edge_intersection: &I,
    event_queue: &mut BinaryHeap<Rc<SweepEvent<T>>>,
    operation: Operation,
) -> Result<Vec<Rc<SweepEvent<T>>>, ClipError>
where
    T: CoordinateType + Debug,
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
{
    let mut sorted_events = Vec::with_capacity(event_queue.len());

    let mut scan_line = SplaySet::new(compare_events_by_segments);

    while let Some(event) = event_queue.pop() {
        debug_assert!(event.is_left_event() ^ event.get_other_event().unwrap().is_left_event());

        let other_event = event.get_other_event().unwrap();

        sorted_events.push(event.clone());

        if event.is_left_event() {
            debug_assert!(
                !scan_line.contains(&event),
                "A start event may enter the scan line only once."
            );

            scan_line.insert(event.clone());

            let maybe_prev = scan_line.prev(&event).cloned();
            let maybe_next = scan_line.next(&event).cloned();

            compute_fields(&event, maybe_prev.as_ref(), operation);

            if let Some(next) = &maybe_next {
                debug_assert_ne!(compare_events_by_segments(&event, next), Ordering::Greater);
                if possible_intersection(
                    edge_intersection,
                    &event,
                    next,
                    event_queue,
                    SelfOverlap::Forbid,
                )? {
                    // The segments coincide: labels of both carriers
                    // change.
                    compute_fields(&event, maybe_prev.as_ref(), operation);
                    compute_fields(next, Some(&event), operation);
                }
            }

            if let Some(prev) = &maybe_prev {
                debug_assert_ne!(compare_events_by_segments(&event, prev), Ordering::Less);
                if possible_intersection(
                    edge_intersection,
                    prev,
                    &event,
                    event_queue,
                    SelfOverlap::Forbid,
                )? {
                    let prev_prev = scan_line.prev(prev).cloned();
                    compute_fields(prev, prev_prev.as_ref(), operation);
                    compute_fields(&event, Some(prev), operation);
                }
            }
        } else {
            let left_event = other_event;

            debug_assert!(!event.is_left_event());
            debug_assert!(left_event.is_left_event());
            debug_assert!(
                scan_line.contains(&left_event),
                "The segment must still be active when its end event arrives."
            );

            if scan_line.contains(&left_event) {
                let maybe_prev = scan_line.prev(&left_event).cloned();
                let maybe_next = scan_line.next(&left_event).cloned();

                scan_line.remove(&left_event);

                // The removal puts prev and next side by side.
                if let (Some(prev), Some(next)) = (maybe_prev, maybe_next) {
                    debug_assert_ne!(
                        compare_events_by_segments(&next, &prev),
                        Ordering::Less
                    );
                    possible_intersection(
                        edge_intersection,
                        &prev,
                        &next,
                        event_queue,
                        SelfOverlap::Forbid,
                    )?;
                }
            }
        }
    }

    debug_assert!(event_queue.is_empty(), "Every queued event must be consumed.");
    debug_assert!(scan_line.is_empty(), "No segment may stay active past its end event.");

    // Subdivisions make the pop order only almost sorted.
    sorted_events.sort_by(|a, b| b.cmp(a));

    debug_assert!(
        sorted_events.windows(2).all(|w| w[0].p <= w[1].p),
        "Sorted events must be in point order."
    );

    Ok(sorted_events)
}

/// Perform a boolean operation on iterators of polygons.
///
/// This is the generic driver behind the `*_multipolygons` functions.
///
/// # Example
/// ```
/// use iron_shapes_clipping::*;
/// use iron_shapes::prelude::*;
/// let lower = Polygon::from(vec![(0., 0.), (4., 0.), (4., 2.), (0., 2.)]);
/// let upper = Polygon::from(vec![(2., 1.), (6., 1.), (6., 3.), (2., 3.)]);
///
/// let union = boolean_op(edge_intersection_float, vec![&lower], vec![&upper],
///                        Operation::Union).unwrap();
///
/// assert_eq!(union.len(), 1);
/// assert_eq!(union.polygons[0],
///            Polygon::from(vec![(0., 0.), (4., 0.), (4., 1.), (6., 1.),
///                               (6., 3.), (2., 3.), (2., 2.), (0., 2.)]));
/// ```
pub fn boolean_op<'a, I, T, S, C>(
    edge_intersection: I,
    subject: S,
    clipping: C,
    operation: Operation,
) -> Result<MultiPolygon<T>, ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug + 'a,
    S: IntoIterator<Item = &'a Polygon<T>>,
    C: IntoIterator<Item = &'a Polygon<T>>,
{
    let mut event_queue = fill_queue(subject.into_iter(), clipping.into_iter());
    debug!(
        "{:?} of multipolygons, {} input events",
        operation,
        event_queue.len()
    );

    // Compute the edge intersections, the result is a set of sorted
    // non-intersecting edges stored as labelled events.
    let sorted_events = subdivide_segments(&edge_intersection, &mut event_queue, operation)?;
    trace!("sweep produced {} events", sorted_events.len());

    // Connect the contributing edges into polygons.
    let polygons = connect_edges(&sorted_events);
    Ok(MultiPolygon::from_polygons(polygons))
}

/// Intersection of two multipolygons.
pub fn intersect_multipolygons<I, T>(
    edge_intersection: I,
    first: &MultiPolygon<T>,
    second: &MultiPolygon<T>,
) -> Result<MultiPolygon<T>, ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug,
{
    if first.len() == 0 || second.len() == 0 {
        return Ok(MultiPolygon::from_polygons(Vec::new()));
    }
    boolean_op(
        edge_intersection,
        &first.polygons,
        &second.polygons,
        Operation::Intersection,
    )
}

/// Union of two multipolygons.
pub fn unite_multipolygons<I, T>(
    edge_intersection: I,
    first: &MultiPolygon<T>,
    second: &MultiPolygon<T>,
) -> Result<MultiPolygon<T>, ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug,
{
    if first.len() == 0 {
        return Ok(second.clone());
    }
    if second.len() == 0 {
        return Ok(first.clone());
    }
    boolean_op(
        edge_intersection,
        &first.polygons,
        &second.polygons,
        Operation::Union,
    )
}

/// Difference of two multipolygons (`first` minus `second`).
pub fn subtract_multipolygons<I, T>(
    edge_intersection: I,
    first: &MultiPolygon<T>,
    second: &MultiPolygon<T>,
) -> Result<MultiPolygon<T>, ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug,
{
    if first.len() == 0 {
        return Ok(MultiPolygon::from_polygons(Vec::new()));
    }
    if second.len() == 0 {
        return Ok(first.clone());
    }
    boolean_op(
        edge_intersection,
        &first.polygons,
        &second.polygons,
        Operation::Difference,
    )
}

/// Symmetric difference of two multipolygons.
pub fn symmetric_subtract_multipolygons<I, T>(
    edge_intersection: I,
    first: &MultiPolygon<T>,
    second: &MultiPolygon<T>,
) -> Result<MultiPolygon<T>, ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug,
{
    if first.len() == 0 {
        return Ok(second.clone());
    }
    if second.len() == 0 {
        return Ok(first.clone());
    }
    boolean_op(
        edge_intersection,
        &first.polygons,
        &second.polygons,
        Operation::SymmetricDifference,
    )
}

/// Intersection of two multipolygons retaining the lower-dimensional
/// residues: the returned triple holds the isolated touch points, the
/// shared boundary segments that do not bound common area, and the
/// common area itself.
pub fn complete_intersect_multipolygons<I, T>(
    edge_intersection: I,
    first: &MultiPolygon<T>,
    second: &MultiPolygon<T>,
) -> Result<(Vec<Point<T>>, Vec<Edge<T>>, MultiPolygon<T>), ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug,
{
    if first.len() == 0 || second.len() == 0 {
        return Ok((
            Vec::new(),
            Vec::new(),
            MultiPolygon::from_polygons(Vec::new()),
        ));
    }

    let mut event_queue = fill_queue(first.polygons.iter(), second.polygons.iter());
    let sorted_events =
        subdivide_segments(&edge_intersection, &mut event_queue, Operation::Intersection)?;

    let mut touch_points = Vec::new();
    let mut shared_segments = Vec::new();

    // Inspect the clusters of events sharing a point. A cluster with
    // edges of both operands but no contributing left event is a
    // boundary contact: either a pair of coinciding fragments (a 1D
    // residue) or an isolated touch point (a 0D residue).
    for (point, group) in &sorted_events.iter().group_by(|event| event.p) {
        let events: Vec<_> = group.collect();

        if events
            .iter()
            .any(|e| e.is_left_event() && e.is_in_result())
        {
            continue;
        }
        if events.iter().map(|e| e.operand).all_equal() {
            continue;
        }

        let mut segment_found = false;
        for pair in events.windows(2) {
            let (e, f) = (&pair[0], &pair[1]);
            if e.operand != f.operand
                && e.get_other_event().unwrap().p == f.get_other_event().unwrap().p
            {
                segment_found = true;
                if e.is_left_event() {
                    shared_segments.push(e.get_edge_left_right().unwrap());
                }
            }
        }

        if !segment_found {
            let any_in_result = events.iter().any(|e| {
                if e.is_left_event() {
                    e.is_in_result()
                } else {
                    e.get_other_event().map(|o| o.is_in_result()).unwrap_or(false)
                }
            });
            if !any_in_result {
                touch_points.push(point);
            }
        }
    }

    shared_segments.sort_by(super::segment_ops::compare_edges_lexicographically);

    let polygons = connect_edges(&sorted_events);
    Ok((
        touch_points,
        shared_segments,
        MultiPolygon::from_polygons(polygons),
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::edge_intersection::edge_intersection_float;

    #[test]
    fn test_orientation_of_square() {
        let ccw = SimplePolygon::new(vec![
            (0.0, 0.0).into(),
            (1.0, 0.0).into(),
            (1.0, 1.0).into(),
            (0.0, 1.0).into(),
        ]);
        let edges: Vec<_> = ccw.edges().into_iter().collect();
        assert_eq!(is_counter_clockwise(&edges), Some(true));

        let cw = SimplePolygon::new(vec![
            (0.0, 0.0).into(),
            (0.0, 1.0).into(),
            (1.0, 1.0).into(),
            (1.0, 0.0).into(),
        ]);
        let edges: Vec<_> = cw.edges().into_iter().collect();
        assert_eq!(is_counter_clockwise(&edges), Some(false));
    }

    #[test]
    fn test_zero_area_contour_is_dropped() {
        let degenerate = SimplePolygon::new(vec![(0.0, 0.0).into(), (1.0, 1.0).into()]);
        let edges: Vec<_> = degenerate
            .edges()
            .into_iter()
            .filter(|e| !e.is_degenerate())
            .collect();
        assert_eq!(is_counter_clockwise(&edges), None);
    }

    #[test]
    fn test_labels_of_disjoint_squares() {
        let p1 = Polygon::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let p2 = Polygon::from(vec![(4.0, 0.0), (5.0, 0.0), (5.0, 1.0), (4.0, 1.0)]);

        let mut queue = fill_queue(vec![&p1].into_iter(), vec![&p2].into_iter());
        let events =
            subdivide_segments(&edge_intersection_float, &mut queue, Operation::Intersection)
                .unwrap();

        // No edge of a disjoint pair lies inside the other operand.
        assert!(events
            .iter()
            .filter(|e| e.is_left_event())
            .all(|e| !e.is_in_result()));
    }
}
