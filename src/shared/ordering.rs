//! Pure ordering rules for sortable lists (entries, categories, objectives).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;

/// Direction for a single-step move (swap with the adjacent row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    #[error("Id {0} does not belong to this list")]
    UnknownId(Uuid),

    #[error("Id {0} appears more than once")]
    DuplicateId(Uuid),

    #[error("Position {position} is out of range for a list of {len}")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Id {0} is archived; archived rows cannot be repositioned")]
    Archived(Uuid),
}

impl From<OrderingError> for AppError {
    fn from(e: OrderingError) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Either a one-step move or a drag-and-drop target position
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReorderTargetDto {
    pub direction: Option<MoveDirection>,
    /// Zero-based position among the visible rows
    pub position: Option<usize>,
}

/// What a reorder request resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderTarget {
    Step(MoveDirection),
    Position(usize),
}

impl ReorderTargetDto {
    pub fn resolve(&self) -> Result<ReorderTarget, String> {
        match (self.direction, self.position) {
            (Some(direction), None) => Ok(ReorderTarget::Step(direction)),
            (None, Some(position)) => Ok(ReorderTarget::Position(position)),
            (Some(_), Some(_)) => Err("Give either a direction or a position, not both".into()),
            (None, None) => Err("A direction or a position is required".into()),
        }
    }
}

/// Full new order for a list
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReorderDto {
    #[validate(length(min = 1, message = "ordered_ids must not be empty"))]
    pub ordered_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReorderResponseDto {
    /// Every row of the list in its new order
    pub ordered_ids: Vec<Uuid>,
}

/// Full order for a list after the caller supplied `requested`.
///
/// Requested ids come first, in the given order. Ids of `current` the caller
/// did not mention follow in their existing relative order, so every row still
/// gets a distinct position.
pub fn plan_sequence(current: &[Uuid], requested: &[Uuid]) -> Result<Vec<Uuid>, OrderingError> {
    let known: HashSet<Uuid> = current.iter().copied().collect();
    let mut seen = HashSet::with_capacity(requested.len());

    for id in requested {
        if !known.contains(id) {
            return Err(OrderingError::UnknownId(*id));
        }
        if !seen.insert(*id) {
            return Err(OrderingError::DuplicateId(*id));
        }
    }

    let mut plan = requested.to_vec();
    plan.extend(current.iter().filter(|id| !seen.contains(id)).copied());
    Ok(plan)
}

/// Drag-and-drop: move `id` to zero-based `position` within `visible`.
pub fn move_to_position(
    visible: &[Uuid],
    id: Uuid,
    position: usize,
) -> Result<Vec<Uuid>, OrderingError> {
    let from = visible
        .iter()
        .position(|v| *v == id)
        .ok_or(OrderingError::UnknownId(id))?;

    if position >= visible.len() {
        return Err(OrderingError::PositionOutOfRange {
            position,
            len: visible.len(),
        });
    }

    let mut reordered = visible.to_vec();
    let moved = reordered.remove(from);
    reordered.insert(position, moved);
    Ok(reordered)
}

/// Full order of a scope after moving `id` to `position` among its visible rows.
///
/// `rows` is the whole scope in current order with each row's archived flag.
/// Archived rows keep their relative order after the visible ones.
pub fn reposition(
    rows: &[(Uuid, bool)],
    id: Uuid,
    position: usize,
) -> Result<Vec<Uuid>, OrderingError> {
    match rows.iter().find(|(row, _)| *row == id) {
        None => return Err(OrderingError::UnknownId(id)),
        Some((_, true)) => return Err(OrderingError::Archived(id)),
        Some((_, false)) => {}
    }

    let all: Vec<Uuid> = rows.iter().map(|(row, _)| *row).collect();
    let visible: Vec<Uuid> = rows
        .iter()
        .filter(|(_, archived)| !archived)
        .map(|(row, _)| *row)
        .collect();

    let reordered = move_to_position(&visible, id, position)?;
    plan_sequence(&all, &reordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_plan_sequence_full_list() {
        let current = ids(3);
        let requested = vec![current[2], current[0], current[1]];
        assert_eq!(plan_sequence(&current, &requested).unwrap(), requested);
    }

    #[test]
    fn test_plan_sequence_appends_unmentioned_rows() {
        let current = ids(4);
        let plan = plan_sequence(&current, &[current[3], current[1]]).unwrap();
        assert_eq!(plan, vec![current[3], current[1], current[0], current[2]]);
    }

    #[test]
    fn test_plan_sequence_rejects_foreign_id() {
        let current = ids(2);
        let stranger = Uuid::new_v4();
        assert_eq!(
            plan_sequence(&current, &[stranger]),
            Err(OrderingError::UnknownId(stranger))
        );
    }

    #[test]
    fn test_plan_sequence_rejects_duplicates() {
        let current = ids(2);
        assert_eq!(
            plan_sequence(&current, &[current[0], current[0]]),
            Err(OrderingError::DuplicateId(current[0]))
        );
    }

    #[test]
    fn test_move_to_position_forward_and_back() {
        let list = ids(4);

        let forward = move_to_position(&list, list[0], 2).unwrap();
        assert_eq!(forward, vec![list[1], list[2], list[0], list[3]]);

        let back = move_to_position(&forward, list[0], 0).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn test_move_to_position_out_of_range() {
        let list = ids(2);
        assert_eq!(
            move_to_position(&list, list[0], 2),
            Err(OrderingError::PositionOutOfRange {
                position: 2,
                len: 2
            })
        );
    }

    #[test]
    fn test_reposition_skips_archived_rows() {
        let list = ids(4);
        let rows = vec![
            (list[0], false),
            (list[1], true),
            (list[2], false),
            (list[3], false),
        ];

        let plan = reposition(&rows, list[3], 0).unwrap();
        assert_eq!(plan, vec![list[3], list[0], list[2], list[1]]);
    }

    #[test]
    fn test_reposition_archived_row_is_rejected_by_name() {
        let list = ids(2);
        let rows = vec![(list[0], false), (list[1], true)];

        let error = reposition(&rows, list[1], 0).unwrap_err();
        assert_eq!(error, OrderingError::Archived(list[1]));

        let message = AppError::from(error).to_string();
        assert!(message.contains("archived"), "{}", message);
        assert!(!message.contains("does not belong"), "{}", message);
    }

    #[test]
    fn test_reposition_unknown_row() {
        let list = ids(1);
        let stranger = Uuid::new_v4();
        assert_eq!(
            reposition(&[(list[0], false)], stranger, 0),
            Err(OrderingError::UnknownId(stranger))
        );
    }

    #[test]
    fn test_ordering_error_is_validation() {
        let error: AppError = OrderingError::DuplicateId(Uuid::nil()).into();
        assert!(matches!(error, AppError::Validation(_)));
    }
}
