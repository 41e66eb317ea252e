use crate::domain::model::{
    AstralObject, Cell, ComethDirection, GoalMap, ObjectKind, Position, SoloonColor,
};
use crate::utils::error::{MegaverseError, Result};
use crate::utils::validation::validate_position;
use std::collections::BTreeMap;

pub fn create_from_cell(cell: Cell, row: usize, column: usize) -> Result<Option<AstralObject>> {
    let position = Position::new(row, column);
    validate_position(position).map_err(|e| MegaverseError::ObjectCreation {
        message: format!("Failed to create object from cell '{}' at {}: {}", cell, position, e),
    })?;
    Ok(AstralObject::from_cell(cell, position))
}

/// Every non-space cell of `goal_map`, in row-major order.
pub fn create_from_map(goal_map: &GoalMap) -> Result<Vec<AstralObject>> {
    let mut objects = Vec::new();
    for (position, cell) in goal_map.cells() {
        if let Some(object) = create_from_cell(cell, position.row, position.column)? {
            objects.push(object);
        }
    }

    tracing::debug!("Created {} astral objects from goal map", objects.len());
    Ok(objects)
}

pub fn create_polyanet(row: usize, column: usize) -> Result<AstralObject> {
    let position = Position::new(row, column);
    validate_position(position)?;
    Ok(AstralObject::new(position, ObjectKind::Polyanet))
}

pub fn create_soloon(row: usize, column: usize, color: &str) -> Result<AstralObject> {
    let position = Position::new(row, column);
    validate_position(position)?;
    let color: SoloonColor = color.parse()?;
    Ok(AstralObject::new(position, ObjectKind::Soloon { color }))
}

pub fn create_cometh(row: usize, column: usize, direction: &str) -> Result<AstralObject> {
    let position = Position::new(row, column);
    validate_position(position)?;
    let direction: ComethDirection = direction.parse()?;
    Ok(AstralObject::new(position, ObjectKind::Cometh { direction }))
}

pub fn group_by_type(objects: &[AstralObject]) -> BTreeMap<&'static str, Vec<AstralObject>> {
    let mut groups: BTreeMap<&'static str, Vec<AstralObject>> = BTreeMap::new();
    for object in objects {
        groups
            .entry(object.kind.type_name())
            .or_default()
            .push(*object);
    }
    groups
}

/// Polyanets first, then soloons, then comeths; each pass sorted by (row, column).
/// Soloons are only accepted next to an existing polyanet, so anchors must land first.
pub fn creation_order(objects: &[AstralObject]) -> Vec<AstralObject> {
    let mut ordered = objects.to_vec();
    ordered.sort_by_key(|o| (o.kind.pass(), o.position));
    ordered
}

/// Reverse of `creation_order`: satellites and comets go before their anchors.
pub fn deletion_order(objects: &[AstralObject]) -> Vec<AstralObject> {
    let mut ordered = creation_order(objects);
    ordered.reverse();
    ordered
}

/// Goal objects whose cell in `current` does not already hold the same object.
pub fn missing_objects(goal: &GoalMap, current: &GoalMap) -> Result<Vec<AstralObject>> {
    let wanted = create_from_map(goal)?;
    Ok(wanted
        .into_iter()
        .filter(|object| current.get(object.position) != Some(object.cell()))
        .collect())
}

/// Objects present in `current` that the goal does not place on the same cell.
pub fn unexpected_objects(goal: &GoalMap, current: &GoalMap) -> Result<Vec<AstralObject>> {
    let present = create_from_map(current)?;
    Ok(present
        .into_iter()
        .filter(|object| goal.get(object.position) != Some(object.cell()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::goal_loader::parse_goal_json;
    use serde_json::json;

    fn sample_map() -> GoalMap {
        parse_goal_json(&json!({
            "goal": [
                ["RIGHT_COMETH", "POLYANET", "SPACE"],
                ["BLUE_SOLOON", "SPACE", "POLYANET"],
                ["SPACE", "RED_SOLOON", "SPACE"]
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_create_from_cell_space_is_none() {
        assert!(create_from_cell(Cell::Space, 0, 0).unwrap().is_none());
    }

    #[test]
    fn test_create_from_cell_rejects_out_of_range_position() {
        let err = create_from_cell(Cell::Polyanet, 50, 0).unwrap_err();
        assert!(matches!(err, MegaverseError::ObjectCreation { .. }));
    }

    #[test]
    fn test_create_from_map_is_row_major() {
        let objects = create_from_map(&sample_map()).unwrap();
        let positions: Vec<Position> = objects.iter().map(|o| o.position).collect();
        assert_eq!(
            positions,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(1, 0),
                Position::new(1, 2),
                Position::new(2, 1),
            ]
        );
    }

    #[test]
    fn test_typed_constructors() {
        assert_eq!(create_polyanet(1, 1).unwrap().object_type(), "POLYANET");
        assert_eq!(create_soloon(0, 1, "Blue").unwrap().object_type(), "BLUE_SOLOON");
        assert_eq!(create_cometh(2, 2, "LEFT").unwrap().object_type(), "LEFT_COMETH");
        assert!(create_soloon(0, 0, "green").is_err());
        assert!(create_cometh(0, 0, "diagonal").is_err());
        assert!(create_polyanet(60, 0).is_err());
    }

    #[test]
    fn test_creation_order_anchors_then_satellites_then_comets() {
        let objects = create_from_map(&sample_map()).unwrap();
        let ordered = creation_order(&objects);
        let labels: Vec<String> = ordered.iter().map(|o| o.to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "POLYANET at (0, 1)",
                "POLYANET at (1, 2)",
                "BLUE_SOLOON at (1, 0)",
                "RED_SOLOON at (2, 1)",
                "RIGHT_COMETH at (0, 0)",
            ]
        );
    }

    #[test]
    fn test_deletion_order_is_reverse_of_creation() {
        let objects = create_from_map(&sample_map()).unwrap();
        let deleted = deletion_order(&objects);
        assert_eq!(deleted.first().unwrap().object_type(), "RIGHT_COMETH");
        assert_eq!(deleted.last().unwrap().to_string(), "POLYANET at (0, 1)");
    }

    #[test]
    fn test_group_by_type() {
        let objects = create_from_map(&sample_map()).unwrap();
        let groups = group_by_type(&objects);
        assert_eq!(groups["Polyanet"].len(), 2);
        assert_eq!(groups["Soloon"].len(), 2);
        assert_eq!(groups["Cometh"].len(), 1);
    }

    #[test]
    fn test_missing_and_unexpected_objects() {
        let goal = sample_map();
        let current = parse_goal_json(&json!({
            "goal": [
                ["SPACE", "POLYANET", "SPACE"],
                ["PURPLE_SOLOON", "SPACE", "SPACE"],
                ["SPACE", "RED_SOLOON", "POLYANET"]
            ]
        }))
        .unwrap();

        let missing: Vec<String> = missing_objects(&goal, &current)
            .unwrap()
            .iter()
            .map(|o| o.to_string())
            .collect();
        assert_eq!(
            missing,
            vec![
                "RIGHT_COMETH at (0, 0)",
                "BLUE_SOLOON at (1, 0)",
                "POLYANET at (1, 2)",
            ]
        );

        let extra: Vec<String> = unexpected_objects(&goal, &current)
            .unwrap()
            .iter()
            .map(|o| o.to_string())
            .collect();
        assert_eq!(extra, vec!["PURPLE_SOLOON at (1, 0)", "POLYANET at (2, 2)"]);
    }
}
