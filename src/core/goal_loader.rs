use crate::domain::model::{Cell, GoalMap, MapStatistics};
use crate::domain::ports::MegaverseApi;
use crate::utils::error::{MegaverseError, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Parses `{"goal": [[cell, ...], ...]}` into a validated grid.
pub fn parse_goal_json(value: &serde_json::Value) -> Result<GoalMap> {
    let goal = value
        .get("goal")
        .ok_or_else(|| MegaverseError::goal_map("'goal' key not found"))?;
    parse_grid(goal)
}

/// Parses a bare 2-D JSON array of cells.
pub fn parse_grid(grid: &serde_json::Value) -> Result<GoalMap> {
    let rows = grid
        .as_array()
        .ok_or_else(|| MegaverseError::goal_map("Goal map must be a list of lists"))?;

    let mut parsed = Vec::with_capacity(rows.len());
    for (row_idx, row) in rows.iter().enumerate() {
        let cells = row.as_array().ok_or_else(|| {
            MegaverseError::goal_map(format!("Row {} of the goal map is not a list", row_idx))
        })?;
        let mut parsed_row = Vec::with_capacity(cells.len());
        for (col_idx, cell) in cells.iter().enumerate() {
            let cell = Cell::from_json(cell).map_err(|e| {
                MegaverseError::goal_map(format!("Invalid cell at ({}, {}): {}", row_idx, col_idx, e))
            })?;
            parsed_row.push(cell);
        }
        parsed.push(parsed_row);
    }

    GoalMap::new(parsed).map_err(|e| MegaverseError::goal_map(e.to_string()))
}

pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<GoalMap> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MegaverseError::goal_map(format!(
            "Goal map file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        MegaverseError::goal_map(format!("Cannot read goal map file {}: {}", path.display(), e))
    })?;
    let data: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        MegaverseError::goal_map(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    let goal_map = parse_goal_json(&data)
        .map_err(|e| e.in_goal_context(&path.display().to_string()))?;

    tracing::info!(
        "Loaded goal map from {} ({}x{})",
        path.display(),
        goal_map.rows(),
        goal_map.columns()
    );
    Ok(goal_map)
}

pub async fn load_from_api<A: MegaverseApi + ?Sized>(api: &A, candidate_id: &str) -> Result<GoalMap> {
    let data = api.get_goal_map(candidate_id).await?;
    let goal_map = parse_goal_json(&data).map_err(|e| e.in_goal_context("goal map from API"))?;

    tracing::info!(
        "Loaded goal map from API ({}x{})",
        goal_map.rows(),
        goal_map.columns()
    );
    Ok(goal_map)
}

pub fn save_to_file<P: AsRef<Path>>(goal_map: &GoalMap, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let data = serde_json::json!({ "goal": goal_map.as_rows() });
    std::fs::write(path, serde_json::to_string_pretty(&data)?)?;

    tracing::info!("Saved goal map to {}", path.display());
    Ok(())
}

pub fn statistics(goal_map: &GoalMap) -> MapStatistics {
    let mut stats = MapStatistics {
        rows: goal_map.rows(),
        columns: goal_map.columns(),
        total_cells: goal_map.rows() * goal_map.columns(),
        ..MapStatistics::default()
    };

    for (_, cell) in goal_map.cells() {
        if cell.is_space() {
            stats.space_count += 1;
        } else {
            *stats.object_counts.entry(cell.to_string()).or_insert(0) += 1;
        }
    }

    let mut type_counts = BTreeMap::from([
        ("POLYANET".to_string(), 0),
        ("SOLOON".to_string(), 0),
        ("COMETH".to_string(), 0),
    ]);
    for (_, cell) in goal_map.cells() {
        let family = match cell {
            Cell::Space => continue,
            Cell::Polyanet => "POLYANET",
            Cell::Soloon(_) => "SOLOON",
            Cell::Cometh(_) => "COMETH",
        };
        if let Some(count) = type_counts.get_mut(family) {
            *count += 1;
        }
    }
    stats.total_objects = type_counts.values().sum();
    stats.type_counts = type_counts;

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ComethDirection, SoloonColor};
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_goal() -> serde_json::Value {
        json!({
            "goal": [
                ["SPACE", "POLYANET", "SPACE"],
                ["BLUE_SOLOON", "SPACE", "RIGHT_COMETH"],
                ["SPACE", "RED_SOLOON", "SPACE"]
            ]
        })
    }

    #[test]
    fn test_parse_goal_json() {
        let map = parse_goal_json(&sample_goal()).unwrap();
        assert_eq!(map.rows(), 3);
        assert_eq!(map.columns(), 3);
        assert_eq!(map.get(crate::domain::model::Position::new(0, 1)), Some(Cell::Polyanet));
        assert_eq!(
            map.get(crate::domain::model::Position::new(1, 0)),
            Some(Cell::Soloon(SoloonColor::Blue))
        );
        assert_eq!(
            map.get(crate::domain::model::Position::new(1, 2)),
            Some(Cell::Cometh(ComethDirection::Right))
        );
    }

    #[test]
    fn test_parse_goal_json_missing_key() {
        let err = parse_goal_json(&json!({"map": []})).unwrap_err();
        assert!(err.to_string().contains("'goal' key not found"));
    }

    #[test]
    fn test_parse_goal_json_reports_cell_position() {
        let err = parse_goal_json(&json!({"goal": [["SPACE", "MOON"]]})).unwrap_err();
        assert!(err.to_string().contains("(0, 1)"));
    }

    #[test]
    fn test_unreadable_goal_path_is_a_goal_map_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_from_file(temp_dir.path()).unwrap_err();
        assert!(matches!(err, MegaverseError::GoalMap { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_load_from_file_round_trips_through_save() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("goal.json");

        let map = parse_goal_json(&sample_goal()).unwrap();
        save_to_file(&map, &path).unwrap();

        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = load_from_file("/definitely/not/here/goal.json").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_from_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("invalid_goal.json");
        std::fs::write(&path, "invalid json content").unwrap();

        let err = load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_statistics() {
        let map = parse_goal_json(&sample_goal()).unwrap();
        let stats = statistics(&map);

        assert_eq!(stats.rows, 3);
        assert_eq!(stats.columns, 3);
        assert_eq!(stats.total_cells, 9);
        assert_eq!(stats.space_count, 5);
        assert_eq!(stats.total_objects, 4);
        assert_eq!(stats.type_counts["POLYANET"], 1);
        assert_eq!(stats.type_counts["SOLOON"], 2);
        assert_eq!(stats.type_counts["COMETH"], 1);
        assert_eq!(stats.object_counts["BLUE_SOLOON"], 1);
        assert_eq!(stats.object_counts["RED_SOLOON"], 1);
    }
}
