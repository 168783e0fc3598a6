// Copyright (c) 2018-2021 Thomas Kramer.
// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Sweep events and their processing order in the event queue.

use iron_shapes::edge::{Edge, Side};
use iron_shapes::point::Point;
use iron_shapes::CoordinateType;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use std::cmp::Ordering;

/// Operand a segment originates from. `Subject` is the left operand of
/// the operation, `Clipping` the right one.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Operand {
    Subject,
    Clipping,
}

/// Coincidence class of a segment fragment with respect to the other
/// operand's boundary.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum OverlapKind {
    /// The fragment does not coincide with an edge of the other operand.
    None,
    /// Coincides with an other-operand edge, both interiors on the same side.
    SameOrientation,
    /// Coincides with an other-operand edge, interiors on opposite sides.
    DifferentOrientation,
}

#[derive(Debug, Clone)]
struct MutablePart<T: CoordinateType> {
    /// The event at the opposite endpoint of the segment.
    other_event: Weak<SweepEvent<T>>,
    /// Closest edge below this one that made it into the result.
    /// This is used to find polygon-hole relationships.
    below_in_result: Weak<SweepEvent<T>>,
    /// Whether `p` is the lexicographically smaller endpoint.
    is_left_event: bool,
    /// Does the interior of the *other* operand lie above this edge?
    other_interior_to_left: bool,
    /// Coincidence with the other operand's boundary.
    overlap_kind: OverlapKind,
    /// Does this edge contribute to the result of the operation?
    in_result: bool,
    /// Index of the event in the sorted event list.
    pos: usize,
    /// Stable identifier of the segment, shared by its fragments after
    /// subdivision. The last resort of the comparators, so that
    /// coinciding segments still have a total order.
    edge_id: usize,
}

/// An endpoint of a segment, together with the bookkeeping the plane
/// sweep attaches to it. Events come in pairs linked through
/// `other_event`; exactly one event of a pair is a left event.
#[derive(Debug, Clone)]
pub struct SweepEvent<T: CoordinateType> {
    /// State that changes during the sweep, checked at runtime.
    mutable: RefCell<MutablePart<T>>,
    /// The endpoint this event stands for.
    pub p: Point<T>,
    /// Operand this segment belongs to.
    pub operand: Operand,
    /// Does the interior of the own operand lie above this edge?
    /// Derived from the traversal direction of the originating contour;
    /// carries only orientation for multisegment operands.
    pub interior_to_left: bool,
}

impl<T: CoordinateType> SweepEvent<T> {
    pub fn new_rc(
        edge_id: usize,
        point: Point<T>,
        is_left_event: bool,
        other_event: Weak<SweepEvent<T>>,
        operand: Operand,
        interior_to_left: bool,
    ) -> Rc<SweepEvent<T>> {
        Rc::new(SweepEvent {
            mutable: RefCell::new(MutablePart {
                other_event,
                below_in_result: Weak::new(),
                is_left_event,
                other_interior_to_left: false,
                overlap_kind: OverlapKind::None,
                in_result: false,
                pos: 0,
                edge_id,
            }),
            p: point,
            operand,
            interior_to_left,
        })
    }

    pub fn is_left_event(&self) -> bool {
        self.mutable.borrow().is_left_event
    }

    pub fn get_other_event(&self) -> Option<Rc<SweepEvent<T>>> {
        self.mutable.borrow().other_event.upgrade()
    }

    pub fn set_other_event(&self, other_event: &Rc<SweepEvent<T>>) {
        debug_assert_ne!(self.is_left_event(), other_event.is_left_event());
        self.mutable.borrow_mut().other_event = Rc::downgrade(other_event);
    }

    /// The segment as seen from this event: it runs from the own point
    /// to the paired event's point.
    pub fn get_edge(&self) -> Option<Edge<T>> {
        self.get_other_event().map(|other| {
            debug_assert!(self.is_left_event() ^ other.is_left_event());
            Edge::new(self.p, other.p)
        })
    }

    /// The segment in canonical direction, running from its left
    /// endpoint to its right endpoint.
    pub fn get_edge_left_right(&self) -> Option<Edge<T>> {
        self.get_other_event().map(|other| {
            debug_assert!(self.is_left_event() ^ other.is_left_event());
            if self.is_left_event() {
                Edge::new(self.p, other.p)
            } else {
                Edge::new(other.p, self.p)
            }
        })
    }

    /// Whether both endpoints of the segment share their x-coordinate.
    pub fn is_vertical(&self) -> bool {
        match self.get_other_event() {
            Some(ref other_event) => self.p.x == other_event.p.x,
            None => false,
        }
    }

    pub fn other_interior_to_left(&self) -> bool {
        self.mutable.borrow().other_interior_to_left
    }

    pub fn set_other_interior_to_left(&self, other_interior_to_left: bool) {
        self.mutable.borrow_mut().other_interior_to_left = other_interior_to_left;
    }

    pub fn overlap_kind(&self) -> OverlapKind {
        self.mutable.borrow().overlap_kind
    }

    pub fn set_overlap_kind(&self, kind: OverlapKind) {
        self.mutable.borrow_mut().overlap_kind = kind;
    }

    /// The fragment lies strictly within the region of the other operand.
    pub fn is_inside_other(&self) -> bool {
        let m = self.mutable.borrow();
        m.other_interior_to_left && m.overlap_kind == OverlapKind::None
    }

    /// The fragment touches or is disjoint with the other operand.
    pub fn is_outside_other(&self) -> bool {
        let m = self.mutable.borrow();
        !m.other_interior_to_left && m.overlap_kind == OverlapKind::None
    }

    /// The fragment lies on the boundary of both operands with the
    /// interiors on the same side.
    pub fn is_common_region_boundary(&self) -> bool {
        self.overlap_kind() == OverlapKind::SameOrientation
    }

    /// The fragment lies on the boundary of both operands with the
    /// interiors on opposite sides.
    pub fn is_common_polyline_component(&self) -> bool {
        self.overlap_kind() == OverlapKind::DifferentOrientation
    }

    /// The fragment lies on the boundary of both operands.
    pub fn is_overlap(&self) -> bool {
        self.overlap_kind() != OverlapKind::None
    }

    pub fn is_in_result(&self) -> bool {
        self.mutable.borrow().in_result
    }

    pub fn set_in_result(&self, in_result: bool) {
        self.mutable.borrow_mut().in_result = in_result;
    }

    pub fn get_below_in_result(&self) -> Weak<SweepEvent<T>> {
        self.mutable.borrow().below_in_result.clone()
    }

    pub fn set_below_in_result(&self, below: Weak<SweepEvent<T>>) {
        self.mutable.borrow_mut().below_in_result = below;
    }

    pub fn get_pos(&self) -> usize {
        self.mutable.borrow().pos
    }

    pub fn set_pos(&self, pos: usize) {
        self.mutable.borrow_mut().pos = pos;
    }

    pub fn get_edge_id(&self) -> usize {
        self.mutable.borrow().edge_id
    }
}

impl<T> PartialEq for SweepEvent<T>
where
    T: CoordinateType,
{
    fn eq(&self, other: &Self) -> bool {
        self.p == other.p
    }
}

impl<T> Eq for SweepEvent<T> where T: CoordinateType {}

impl<T> PartialOrd for SweepEvent<T>
where
    T: CoordinateType,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: CoordinateType> SweepEvent<T> {
    /// Tie-break between two events at the same point. End events go
    /// first so that a segment has left the scan line before anything
    /// new is inserted there; among events of the same kind the segment
    /// staying lower goes first, and collinear segments fall back to
    /// their edge id.
    fn cmp_at_shared_point(&self, other: &Self) -> Ordering {
        debug_assert!(self.p == other.p);

        if self.is_left_event() != other.is_left_event() {
            // The caller expects reversed ordering, so the event that is
            // processed first is the greater one.
            return if self.is_left_event() {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }

        let own = self.get_edge_left_right().unwrap();
        let competing = other.get_edge_left_right().unwrap();
        debug_assert!(own.start == competing.start || own.end == competing.end);

        // Both segments hang off the shared point; the free endpoint of
        // the competing segment tells which one dips below.
        let free_endpoint = if other.is_left_event() {
            competing.end
        } else {
            competing.start
        };

        match own.side_of(free_endpoint) {
            Side::Left => Ordering::Greater,
            Side::Right => Ordering::Less,
            Side::Center => {
                debug_assert!(own.is_collinear(&competing));
                other.get_edge_id().cmp(&self.get_edge_id())
            }
        }
    }
}

impl<T> Ord for SweepEvent<T>
where
    T: CoordinateType,
{
    /// Processing order of the events, reversed so that popping a
    /// max-heap yields the event with the smallest point first.
    fn cmp(&self, other: &Self) -> Ordering {
        match other.p.partial_cmp(&self.p).unwrap() {
            Ordering::Equal => self.cmp_at_shared_point(other),
            by_point => by_point,
        }
    }
}
