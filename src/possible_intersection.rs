// Copyright (c) 2018-2021 Thomas Kramer.
// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Detection and resolution of intersections between neighboring
//! segments in the scan line. Intersecting segments are subdivided in
//! place by re-linking the event pairs; coincident segments are marked
//! with their overlap kind so that labelling and selection can treat
//! them as one canonical edge.

use super::sweep_event::*;
use crate::ClipError;
use iron_shapes::edge::{Edge, EdgeIntersection};
use iron_shapes::point::Point;
use iron_shapes::CoordinateType;
use std::collections::binary_heap::BinaryHeap;
use std::fmt::Debug;
use std::rc::Rc;

/// How to treat a collinear overlap between two segments of the same
/// operand. Boolean operations reject it as malformed input; the
/// single-operand segment normalization resolves it by subdivision.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SelfOverlap {
    Forbid,
    Allow,
}

/// Cut the segment of `event` at the interior point `cut`. The head
/// keeps the existing event pair with a shortened extent; the tail gets
/// a fresh pair that is pushed onto the queue and processed later.
pub fn divide_segment<T>(
    event: &Rc<SweepEvent<T>>,
    cut: Point<T>,
    queue: &mut BinaryHeap<Rc<SweepEvent<T>>>,
) where
    T: CoordinateType,
{
    debug_assert!(event.is_left_event());

    if let Some(right_event) = event.get_other_event() {
        debug_assert!(
            event.p < cut && cut < right_event.p,
            "The cut must fall strictly between the endpoints."
        );

        let head_end = SweepEvent::new_rc(
            event.get_edge_id(),
            cut,
            false,
            Rc::downgrade(event),
            event.operand,
            event.interior_to_left,
        );

        let tail_start = SweepEvent::new_rc(
            event.get_edge_id(),
            cut,
            true,
            Rc::downgrade(&right_event),
            event.operand,
            event.interior_to_left,
        );

        right_event.set_other_event(&tail_start);
        event.set_other_event(&head_end);

        // Neither fragment may collapse, and every pair must keep one
        // event per endpoint kind.
        debug_assert!(!event.get_edge().unwrap().is_degenerate());
        debug_assert!(!tail_start.get_edge().unwrap().is_degenerate());
        debug_assert!(event.is_left_event() ^ head_end.is_left_event());
        debug_assert!(tail_start.is_left_event() ^ right_event.is_left_event());

        queue.push(tail_start);
        queue.push(head_end);
    }
}

/// Resolve the intersection, if any, between two segments that became
/// neighbours in the scan line: crossing or touching segments are cut at
/// the meeting point, collinear overlaps are aligned and marked with
/// their [`OverlapKind`].
///
/// `event1` is the lower neighbour, `event2` the upper one.
///
/// Returns `true` iff the two segments turned out to coincide starting at
/// their shared left endpoint. In that case the labels of both events
/// must be recomputed by the caller.
pub fn possible_intersection<T, I>(
    edge_intersection_fn: &I,
    event1: &Rc<SweepEvent<T>>,
    event2: &Rc<SweepEvent<T>>,
    queue: &mut BinaryHeap<Rc<SweepEvent<T>>>,
    self_overlap: SelfOverlap,
) -> Result<bool, ClipError>
where
    T: CoordinateType + Debug,
    I: Fn(&Edge<T>, &Edge<T>) -> EdgeIntersection<T, T, Edge<T>>,
{
    debug_assert!(event1.is_left_event());
    debug_assert!(event2.is_left_event());

    let edge1 = event1.get_edge().unwrap();
    let edge2 = event2.get_edge().unwrap();

    // Edges of left events run from left to right and have an extent.
    debug_assert!(!edge1.is_degenerate());
    debug_assert!(!edge2.is_degenerate());
    debug_assert!(edge1.start <= edge1.end);
    debug_assert!(edge2.start <= edge2.end);

    match edge_intersection_fn(&edge1, &edge2) {
        EdgeIntersection::None => Ok(false),
        EdgeIntersection::Point(p) => {
            // Segments cross in their interiors: split both.
            if p != edge1.start && p != edge1.end {
                divide_segment(event1, p, queue);
            }
            if p != edge2.start && p != edge2.end {
                divide_segment(event2, p, queue);
            }
            Ok(false)
        }
        EdgeIntersection::EndPoint(p) => {
            debug_assert!(
                edge1.start == p || edge1.end == p || edge2.start == p || edge2.end == p,
                "This variant implies the meeting point is an endpoint of one segment."
            );

            if p != edge1.start && p != edge1.end {
                // T-junction: the touch falls into the interior of edge1.
                divide_segment(event1, p, queue);
            } else if p != edge2.start && p != edge2.end {
                // T-junction: the touch falls into the interior of edge2.
                divide_segment(event2, p, queue);
            }
            // A shared endpoint of both segments needs no cut.
            Ok(false)
        }

        EdgeIntersection::Overlap(overlap) => {
            // The segments coincide in a non-degenerate sub-segment.
            debug_assert!(overlap.start <= overlap.end);

            let same_operand = event1.operand == event2.operand;
            if same_operand && self_overlap == SelfOverlap::Forbid {
                return Err(ClipError::SelfOverlap);
            }

            let left_coincide = edge1.start == edge2.start;
            let right_coincide = edge1.end == edge2.end;

            if left_coincide {
                if !same_operand {
                    // The shared prefix is a coincident fragment; one of the
                    // two events becomes the canonical carrier of the
                    // combined attribution during selection.
                    let kind = if event1.interior_to_left == event2.interior_to_left {
                        OverlapKind::SameOrientation
                    } else {
                        OverlapKind::DifferentOrientation
                    };
                    event1.set_overlap_kind(kind);
                    event2.set_overlap_kind(kind);
                }
                if !right_coincide {
                    // Left points coincide but not right: align the longer
                    // segment with the shorter one.
                    if edge1.end < edge2.end {
                        divide_segment(event2, edge1.end, queue);
                    } else {
                        divide_segment(event1, edge2.end, queue);
                    }
                }
                Ok(!same_operand)
            } else if right_coincide {
                // The segments share their right endpoint.
                if edge1.start < edge2.start {
                    divide_segment(event1, edge2.start, queue);
                } else {
                    divide_segment(event2, edge1.start, queue);
                }
                Ok(false)
            } else if edge1.start < edge2.start {
                if edge2.end < edge1.end {
                    // edge1 fully includes edge2.
                    divide_segment(event1, edge2.end, queue);
                    divide_segment(event1, edge2.start, queue);
                } else {
                    // Partial overlap.
                    divide_segment(event2, edge1.end, queue);
                    divide_segment(event1, edge2.start, queue);
                }
                Ok(false)
            } else {
                if edge1.end < edge2.end {
                    // edge2 fully includes edge1.
                    divide_segment(event2, edge1.end, queue);
                    divide_segment(event2, edge1.start, queue);
                } else {
                    // Partial overlap.
                    divide_segment(event1, edge2.end, queue);
                    divide_segment(event2, edge1.start, queue);
                }
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::edge_intersection::edge_intersection_float;
    use std::rc::Weak;

    fn event_pair(
        edge_id: usize,
        left: (f64, f64),
        right: (f64, f64),
        operand: Operand,
    ) -> (Rc<SweepEvent<f64>>, Rc<SweepEvent<f64>>) {
        let other = SweepEvent::new_rc(edge_id, right.into(), false, Weak::new(), operand, true);
        let event = SweepEvent::new_rc(
            edge_id,
            left.into(),
            true,
            Rc::downgrade(&other),
            operand,
            true,
        );
        other.set_other_event(&event);
        (event, other)
    }

    #[test]
    fn test_divide_segment() {
        let mut queue = BinaryHeap::new();
        let (event, other) = event_pair(1, (0.0, 0.0), (2.0, 2.0), Operand::Subject);

        divide_segment(&event, (1.0, 1.0).into(), &mut queue);

        assert_eq!(queue.len(), 2);
        // The head was shortened, the tail linked to the old right event.
        assert_eq!(event.get_edge().unwrap().end, (1.0, 1.0).into());
        let tail = other.get_other_event().unwrap();
        assert!(tail.is_left_event());
        assert_eq!(tail.p, (1.0, 1.0).into());
        assert_eq!(tail.get_edge().unwrap().end, (2.0, 2.0).into());
    }

    #[test]
    fn test_crossing_divides_both() {
        let mut queue = BinaryHeap::new();
        let (e1, _o1) = event_pair(1, (0.0, 0.0), (2.0, 2.0), Operand::Subject);
        let (e2, _o2) = event_pair(2, (0.0, 2.0), (2.0, 0.0), Operand::Clipping);

        // e1 passes below e2 at x=0.
        let recompute = possible_intersection(
            &edge_intersection_float,
            &e1,
            &e2,
            &mut queue,
            SelfOverlap::Forbid,
        )
        .unwrap();

        assert!(!recompute);
        // Two fragments, two new event pairs.
        assert_eq!(queue.len(), 4);
        assert_eq!(e1.get_edge().unwrap().end, (1.0, 1.0).into());
        assert_eq!(e2.get_edge().unwrap().end, (1.0, 1.0).into());
    }

    #[test]
    fn test_same_operand_overlap_is_rejected() {
        let mut queue = BinaryHeap::new();
        let (e1, _o1) = event_pair(1, (0.0, 0.0), (2.0, 0.0), Operand::Subject);
        let (e2, _o2) = event_pair(2, (1.0, 0.0), (3.0, 0.0), Operand::Subject);

        let result = possible_intersection(
            &edge_intersection_float,
            &e1,
            &e2,
            &mut queue,
            SelfOverlap::Forbid,
        );

        assert_eq!(result, Err(ClipError::SelfOverlap));
    }

    #[test]
    fn test_coinciding_fragments_are_marked() {
        let mut queue = BinaryHeap::new();
        let (e1, _o1) = event_pair(1, (0.0, 0.0), (2.0, 0.0), Operand::Subject);
        let (e2, _o2) = event_pair(2, (0.0, 0.0), (3.0, 0.0), Operand::Clipping);

        let recompute = possible_intersection(
            &edge_intersection_float,
            &e1,
            &e2,
            &mut queue,
            SelfOverlap::Forbid,
        )
        .unwrap();

        assert!(recompute);
        assert_eq!(e1.overlap_kind(), OverlapKind::SameOrientation);
        assert_eq!(e2.overlap_kind(), OverlapKind::SameOrientation);
        // The longer segment was aligned with the shorter one.
        assert_eq!(e2.get_edge().unwrap().end, (2.0, 0.0).into());
    }
}
