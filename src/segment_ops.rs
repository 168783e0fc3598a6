// Copyright (c) 2018-2021 Thomas Kramer.
// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Boolean operations on multisegments.
//!
//! A multisegment is a collection of line segments, here represented as
//! a slice of `Edge`s. The sweep subdivides the segments of both
//! operands at all intersection points; afterwards every fragment is
//! present as one group of identical edges and the operation reduces to
//! a membership test on the operands in each group. The reconstruction
//! deduplicates the selected fragments and merges collinear chains back
//! into maximal segments.

use std::collections::binary_heap::BinaryHeap;

use iron_shapes::edge::{Edge, EdgeIntersection};
use iron_shapes::point::Point;
use std::rc::{Rc, Weak};

use super::compare_segments::compare_events_by_segments;
use super::possible_intersection::{possible_intersection, SelfOverlap};
use super::sweep_event::*;
use super::ClipError;
use iron_shapes::CoordinateType;
use itertools::Itertools;
use libreda_splay::SplaySet;
use log::debug;
use std::cmp::Ordering;
use std::fmt::Debug;

/// Insert the segments of the operands into the event queue.
/// Rejects degenerate segments.
fn fill_queue<T: CoordinateType>(
    operands: &[(&[Edge<T>], Operand)],
) -> Result<BinaryHeap<Rc<SweepEvent<T>>>, ClipError> {
    let mut event_queue = BinaryHeap::new();
    let mut edge_ids = 0..;

    for (segments, operand) in operands {
        for edge in segments.iter() {
            if edge.is_degenerate() {
                return Err(ClipError::DegenerateSegment);
            }

            let edge_id = edge_ids.next().unwrap();
            let event_a_is_left = edge.start < edge.end;

            let event_a = SweepEvent::new_rc(
                edge_id,
                edge.start,
                event_a_is_left,
                Weak::new(),
                *operand,
                event_a_is_left,
            );
            let event_b = SweepEvent::new_rc(
                edge_id,
                edge.end,
                !event_a_is_left,
                Rc::downgrade(&event_a),
                *operand,
                event_a_is_left,
            );

            event_a.set_other_event(&event_b);

            event_queue.push(event_a);
            event_queue.push(event_b);
        }
    }

    Ok(event_queue)
}

/// Find all intersecting segments and subdivide them such that the set of
/// resulting fragments contains no interior intersections anymore.
/// Returns all events sorted by their processing order.
fn sweep_segments<T, I>(
    edge_intersection: &I,
    event_queue: &mut BinaryHeap<Rc<SweepEvent<T>>>,
    self_overlap: SelfOverlap,
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

            if let Some(next) = &maybe_next {
                debug_assert_ne!(compare_events_by_segments(&event, next), Ordering::Greater);
                possible_intersection(edge_intersection, &event, next, event_queue, self_overlap)?;
            }

            if let Some(prev) = &maybe_prev {
                debug_assert_ne!(compare_events_by_segments(&event, prev), Ordering::Less);
                possible_intersection(edge_intersection, prev, &event, event_queue, self_overlap)?;
            }
        } else {
            let left_event = other_event;

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
                    possible_intersection(edge_intersection, &prev, &next, event_queue, self_overlap)?;
                }
            }
        }
    }

    debug_assert!(scan_line.is_empty(), "No segment may stay active past its end event.");

    // Subdivisions make the pop order only almost sorted.
    sorted_events.sort_by(|a, b| b.cmp(a));

    Ok(sorted_events)
}

pub(crate) fn compare_edges_lexicographically<T: CoordinateType>(
    a: &Edge<T>,
    b: &Edge<T>,
) -> Ordering {
    a.start
        .partial_cmp(&b.start)
        .unwrap()
        .then(a.end.partial_cmp(&b.end).unwrap())
}

/// Group the subdivided fragments into classes of identical edges and
/// keep the classes accepted by `keep`. Each class is reduced to one
/// canonical edge.
fn contributing_fragments<T, K>(events: &[Rc<SweepEvent<T>>], keep: K) -> Vec<Edge<T>>
where
    T: CoordinateType,
    K: Fn(&[&Rc<SweepEvent<T>>]) -> bool,
{
    let mut left_events: Vec<_> = events.iter().filter(|e| e.is_left_event()).collect();
    left_events.sort_by(|a, b| {
        compare_edges_lexicographically(&a.get_edge().unwrap(), &b.get_edge().unwrap())
    });

    let mut result = Vec::new();
    for (edge, group) in &left_events
        .iter()
        .group_by(|event| event.get_edge().unwrap())
    {
        let group: Vec<_> = group.copied().collect();
        if keep(&group) {
            result.push(edge);
        }
    }
    result
}

/// Merge collinear fragments that meet in an endpoint shared by exactly
/// those two fragments into maximal segments. The result is sorted by
/// the canonical `(start, end)` of its segments.
fn merge_connected_fragments<T: CoordinateType>(mut fragments: Vec<Edge<T>>) -> Vec<Edge<T>> {
    fragments.sort_by(compare_edges_lexicographically);

    // Endpoint incidences: (point, fragment, fragment starts here).
    let mut endpoints = Vec::with_capacity(fragments.len() * 2);
    for (index, fragment) in fragments.iter().enumerate() {
        endpoints.push((fragment.start, index, true));
        endpoints.push((fragment.end, index, false));
    }
    endpoints.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    // `next[i]`: the fragment continuing fragment i beyond its end.
    let mut next: Vec<Option<usize>> = vec![None; fragments.len()];
    let mut has_prev = vec![false; fragments.len()];

    let mut i = 0;
    while i < endpoints.len() {
        let mut j = i + 1;
        while j < endpoints.len() && endpoints[j].0 == endpoints[i].0 {
            j += 1;
        }
        if j - i == 2 {
            let (_, f1, f1_starts_here) = endpoints[i];
            let (_, f2, f2_starts_here) = endpoints[i + 1];
            let link = match (f1_starts_here, f2_starts_here) {
                (false, true) => Some((f1, f2)),
                (true, false) => Some((f2, f1)),
                _ => None,
            };
            if let Some((before, after)) = link {
                if fragments[before].is_collinear(&fragments[after]) {
                    next[before] = Some(after);
                    has_prev[after] = true;
                }
            }
        }
        i = j;
    }

    let mut result = Vec::with_capacity(fragments.len());
    let mut consumed = vec![false; fragments.len()];
    for start in 0..fragments.len() {
        if consumed[start] || has_prev[start] {
            continue;
        }
        consumed[start] = true;
        let mut last = start;
        while let Some(successor) = next[last] {
            last = successor;
            consumed[last] = true;
        }
        result.push(Edge::new(fragments[start].start, fragments[last].end));
    }
    debug_assert!(consumed.iter().all(|&c| c), "Fragment chains must be acyclic.");

    result.sort_by(compare_edges_lexicographically);
    result
}

fn sweep_both<T, I>(
    edge_intersection: &I,
    first: &[Edge<T>],
    second: &[Edge<T>],
) -> Result<Vec<Rc<SweepEvent<T>>>, ClipError>
where
    T: CoordinateType + Debug,
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
{
    let mut event_queue = fill_queue(&[(first, Operand::Subject), (second, Operand::Clipping)])?;
    debug!("multisegment sweep, {} input events", event_queue.len());
    sweep_segments(edge_intersection, &mut event_queue, SelfOverlap::Forbid)
}

/// Intersection of two multisegments: the segments common to both.
pub fn intersect_multisegments<I, T>(
    edge_intersection: I,
    first: &[Edge<T>],
    second: &[Edge<T>],
) -> Result<Vec<Edge<T>>, ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug,
{
    if first.is_empty() || second.is_empty() {
        return Ok(Vec::new());
    }
    let events = sweep_both(&edge_intersection, first, second)?;
    let fragments = contributing_fragments(&events, |group| {
        !group.iter().map(|e| e.operand).all_equal()
    });
    Ok(merge_connected_fragments(fragments))
}

/// Union of two multisegments.
pub fn unite_multisegments<I, T>(
    edge_intersection: I,
    first: &[Edge<T>],
    second: &[Edge<T>],
) -> Result<Vec<Edge<T>>, ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug,
{
    if first.is_empty() {
        return Ok(second.to_vec());
    }
    if second.is_empty() {
        return Ok(first.to_vec());
    }
    let events = sweep_both(&edge_intersection, first, second)?;
    let fragments = contributing_fragments(&events, |_| true);
    Ok(merge_connected_fragments(fragments))
}

/// Difference of two multisegments: the parts of `first` not covered by
/// `second`.
pub fn subtract_multisegments<I, T>(
    edge_intersection: I,
    first: &[Edge<T>],
    second: &[Edge<T>],
) -> Result<Vec<Edge<T>>, ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug,
{
    if first.is_empty() {
        return Ok(Vec::new());
    }
    if second.is_empty() {
        return Ok(first.to_vec());
    }
    let events = sweep_both(&edge_intersection, first, second)?;
    let fragments = contributing_fragments(&events, |group| {
        group.iter().all(|e| e.operand == Operand::Subject)
    });
    Ok(merge_connected_fragments(fragments))
}

/// Symmetric difference of two multisegments: the parts covered by
/// exactly one operand.
pub fn symmetric_subtract_multisegments<I, T>(
    edge_intersection: I,
    first: &[Edge<T>],
    second: &[Edge<T>],
) -> Result<Vec<Edge<T>>, ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug,
{
    if first.is_empty() {
        return Ok(second.to_vec());
    }
    if second.is_empty() {
        return Ok(first.to_vec());
    }
    let events = sweep_both(&edge_intersection, first, second)?;
    let fragments = contributing_fragments(&events, |group| {
        group.iter().map(|e| e.operand).all_equal()
    });
    Ok(merge_connected_fragments(fragments))
}

/// Intersection of two multisegments retaining the isolated touch
/// points: the first element of the pair holds the points where the
/// operands touch without sharing a segment, the second the shared
/// segments.
///
/// The shared segments are returned as the subdivided fragments, without
/// merging: for identical operands this reproduces the operand itself.
pub fn complete_intersect_multisegments<I, T>(
    edge_intersection: I,
    first: &[Edge<T>],
    second: &[Edge<T>],
) -> Result<(Vec<Point<T>>, Vec<Edge<T>>), ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug,
{
    if first.is_empty() || second.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let mut events = sweep_both(&edge_intersection, first, second)?;

    // Cluster all events by their point; within a cluster order by the
    // other endpoint so that coinciding fragments are neighbours.
    events.sort_by(|a, b| {
        a.p.partial_cmp(&b.p)
            .unwrap()
            .then_with(|| {
                a.get_other_event()
                    .unwrap()
                    .p
                    .partial_cmp(&b.get_other_event().unwrap().p)
                    .unwrap()
            })
            .then_with(|| {
                let rank = |e: &Rc<SweepEvent<T>>| (e.operand == Operand::Clipping) as u8;
                rank(a).cmp(&rank(b))
            })
    });

    let mut touch_points = Vec::new();
    let mut shared_segments = Vec::new();

    for (point, group) in &events.iter().group_by(|event| event.p) {
        let events_here: Vec<_> = group.collect();

        if events_here.iter().map(|e| e.operand).all_equal() {
            continue;
        }

        let mut segment_found = false;
        for pair in events_here.windows(2) {
            let (e, f) = (&pair[0], &pair[1]);
            if e.operand != f.operand
                && e.get_other_event().unwrap().p == f.get_other_event().unwrap().p
            {
                segment_found = true;
                if e.is_left_event() {
                    shared_segments.push(e.get_edge().unwrap());
                }
            }
        }

        if !segment_found {
            touch_points.push(point);
        }
    }

    shared_segments.sort_by(compare_edges_lexicographically);
    Ok((touch_points, shared_segments))
}

/// Normalize a collection of possibly intersecting and overlapping
/// segments into a canonical multisegment: subdivide at all intersection
/// points, drop duplicates and merge collinear chains.
pub fn merge_segments<I, T>(
    edge_intersection: I,
    segments: &[Edge<T>],
) -> Result<Vec<Edge<T>>, ClipError>
where
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
    T: CoordinateType + Debug,
{
    if segments.is_empty() {
        return Ok(Vec::new());
    }
    let mut event_queue = fill_queue(&[(segments, Operand::Subject)])?;
    let events = sweep_segments(&edge_intersection, &mut event_queue, SelfOverlap::Allow)?;
    let fragments = contributing_fragments(&events, |_| true);
    Ok(merge_connected_fragments(fragments))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::edge_intersection::edge_intersection_float;

    fn edge(start: (f64, f64), end: (f64, f64)) -> Edge<f64> {
        let start: Point<f64> = start.into();
        let end: Point<f64> = end.into();
        Edge::new(start, end)
    }

    #[test]
    fn test_merge_segments_splits_overlap() {
        let segments = vec![edge((0., 0.), (2., 0.)), edge((1., 0.), (3., 0.))];
        let merged = merge_segments(edge_intersection_float, &segments).unwrap();
        // The overlapping pair is normalized into one maximal segment.
        assert_eq!(merged, vec![edge((0., 0.), (3., 0.))]);
    }

    #[test]
    fn test_merge_segments_splits_crossing() {
        let segments = vec![edge((0., 0.), (2., 2.)), edge((0., 2.), (2., 0.))];
        let merged = merge_segments(edge_intersection_float, &segments).unwrap();
        // A crossing splits both segments. Four fragments meet in the
        // crossing point, so nothing merges back.
        assert_eq!(
            merged,
            vec![
                edge((0., 0.), (1., 1.)),
                edge((0., 2.), (1., 1.)),
                edge((1., 1.), (2., 0.)),
                edge((1., 1.), (2., 2.)),
            ]
        );
    }

    #[test]
    fn test_degenerate_segment_is_rejected() {
        let segments = vec![edge((1., 1.), (1., 1.))];
        assert_eq!(
            merge_segments(edge_intersection_float, &segments),
            Err(ClipError::DegenerateSegment)
        );
    }

    #[test]
    fn test_self_overlap_is_rejected_in_binary_ops() {
        let first = vec![edge((0., 0.), (2., 0.)), edge((1., 0.), (3., 0.))];
        let second = vec![edge((0., 1.), (1., 1.))];
        assert_eq!(
            unite_multisegments(edge_intersection_float, &first, &second),
            Err(ClipError::SelfOverlap)
        );
    }

    #[test]
    fn test_merge_chain_requires_degree_two() {
        // Three segments meet in (1, 0): no merging may happen there.
        let first = vec![edge((0., 0.), (1., 0.)), edge((1., 0.), (2., 0.))];
        let second = vec![edge((1., 0.), (1., 1.))];
        let union = unite_multisegments(edge_intersection_float, &first, &second).unwrap();
        assert_eq!(
            union,
            vec![
                edge((0., 0.), (1., 0.)),
                edge((1., 0.), (1., 1.)),
                edge((1., 0.), (2., 0.)),
            ]
        );
    }
}
