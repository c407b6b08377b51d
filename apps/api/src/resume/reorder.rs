//! Reorder Engine: pointer-driven list moves shared by every reorderable collection.
//!
//! `drop_index` turns a drop event (dragged index, target index, pointer offset inside
//! the target) into an insertion index; `move_item` performs the remove-then-insert.
//! `ReorderController` carries the drag state for one collection kind and throttles
//! hover recomputation. The final drop is never throttled.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default minimum interval between two hover recomputations.
pub const DEFAULT_HOVER_THROTTLE: Duration = Duration::from_millis(25);

/// Where the pointer sits relative to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPosition {
    Above,
    Below,
}

impl DropPosition {
    /// Upper half of the target's height is `Above`, everything else `Below`.
    pub fn from_pointer(offset_y: f64, target_height: f64) -> Self {
        if offset_y < target_height / 2.0 {
            DropPosition::Above
        } else {
            DropPosition::Below
        }
    }
}

/// Computes the index the dragged element is inserted at, after it has been removed.
///
/// `len` is the list length before removal. Dropping below a target that sits after the
/// source compensates for the leftward shift caused by removing the source first.
pub fn drop_index(from: usize, target: usize, position: DropPosition, len: usize) -> usize {
    let mut index = match position {
        DropPosition::Above => target,
        DropPosition::Below => target + 1,
    };
    if from < target && position == DropPosition::Below {
        index -= 1;
    }
    index.min(len.saturating_sub(1))
}

/// Removes the element at `from` and inserts it at `to`, clamped to the shortened list.
///
/// Returns the final index, or `None` when `from` is out of range (the list is untouched).
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Option<usize> {
    if from >= items.len() {
        return None;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
    Some(to)
}

/// Applies a full drop event to `items`.
pub fn reorder_by_drop<T>(
    items: &mut Vec<T>,
    from: usize,
    target: usize,
    position: DropPosition,
) -> Option<usize> {
    if from >= items.len() || target >= items.len() {
        return None;
    }
    let to = drop_index(from, target, position, items.len());
    move_item(items, from, to)
}

/// Last hover observed by a controller.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverState<Id> {
    pub target: Id,
    pub position: DropPosition,
}

/// A completed drop: move the element `dragged` relative to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct DropOutcome<Id> {
    pub dragged: Id,
    pub target: Id,
    pub position: DropPosition,
}

/// Drag state for one collection kind, generic over the element id type.
///
/// Owns its throttle clock, so dropping the controller drops every pending timing state
/// with it.
#[derive(Debug, Clone)]
pub struct ReorderController<Id> {
    throttle: Duration,
    dragged: Option<Id>,
    hover: Option<HoverState<Id>>,
    last_update: Option<Instant>,
}

impl<Id: Clone + PartialEq + std::fmt::Debug> ReorderController<Id> {
    pub fn new(throttle: Duration) -> Self {
        Self {
            throttle,
            dragged: None,
            hover: None,
            last_update: None,
        }
    }

    pub fn dragged(&self) -> Option<&Id> {
        self.dragged.as_ref()
    }

    pub fn hover(&self) -> Option<&HoverState<Id>> {
        self.hover.as_ref()
    }

    /// Starts a drag, discarding any previous one.
    pub fn start(&mut self, id: Id) {
        self.dragged = Some(id);
        self.hover = None;
        self.last_update = None;
    }

    /// Records a pointer move over `target`.
    ///
    /// Returns `None` when no drag is active or the event arrived inside the throttle window.
    pub fn hover_over(
        &mut self,
        target: Id,
        offset_y: f64,
        target_height: f64,
        now: Instant,
    ) -> Option<DropPosition> {
        self.dragged.as_ref()?;
        if let Some(last) = self.last_update {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.throttle {
                debug!(
                    "Reorder hover throttled ({}ms < {}ms)",
                    elapsed.as_millis(),
                    self.throttle.as_millis()
                );
                return None;
            }
        }
        let position = DropPosition::from_pointer(offset_y, target_height);
        self.hover = Some(HoverState { target, position });
        self.last_update = Some(now);
        Some(position)
    }

    /// Completes the drag. Always honored, regardless of the throttle window.
    pub fn drop_on(
        &mut self,
        target: Id,
        offset_y: f64,
        target_height: f64,
    ) -> Option<DropOutcome<Id>> {
        let dragged = self.dragged.take()?;
        self.hover = None;
        self.last_update = None;
        if dragged == target {
            return None;
        }
        Some(DropOutcome {
            dragged,
            target,
            position: DropPosition::from_pointer(offset_y, target_height),
        })
    }
}

impl<Id: Clone + PartialEq + std::fmt::Debug> Default for ReorderController<Id> {
    fn default() -> Self {
        Self::new(DEFAULT_HOVER_THROTTLE)
    }
}

/// Applies a drop outcome to a list of elements identified by `id_of`.
pub fn apply_drop<T, Id, F>(
    items: &mut Vec<T>,
    outcome: &DropOutcome<Id>,
    id_of: F,
) -> Option<usize>
where
    Id: PartialEq,
    F: Fn(&T) -> Id,
{
    let from = items.iter().position(|item| id_of(item) == outcome.dragged)?;
    let target = items.iter().position(|item| id_of(item) == outcome.target)?;
    reorder_by_drop(items, from, target, outcome.position)
}
