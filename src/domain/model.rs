use crate::utils::error::{MegaverseError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Largest row or column index accepted by the challenge API.
pub const MAX_GRID_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoloonColor {
    Blue,
    Red,
    Purple,
    White,
}

impl SoloonColor {
    pub const ALL: [SoloonColor; 4] = [Self::Blue, Self::Red, Self::Purple, Self::White];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Purple => "purple",
            Self::White => "white",
        }
    }
}

impl FromStr for SoloonColor {
    type Err = MegaverseError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| {
                MegaverseError::validation(format!(
                    "Invalid color: '{}'. Valid colors: blue, red, purple, white",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComethDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ComethDirection {
    pub const ALL: [ComethDirection; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl FromStr for ComethDirection {
    type Err = MegaverseError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| {
                MegaverseError::validation(format!(
                    "Invalid direction: '{}'. Valid directions: up, down, left, right",
                    s
                ))
            })
    }
}

/// One cell of a goal or current map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Space,
    Polyanet,
    Soloon(SoloonColor),
    Cometh(ComethDirection),
}

impl Cell {
    pub fn is_space(&self) -> bool {
        matches!(self, Cell::Space)
    }

    /// Parses a JSON cell: a string label, `null`, or the API's
    /// `{"type": 0|1|2, ...}` object form.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Cell::Space),
            serde_json::Value::String(label) => label.parse(),
            serde_json::Value::Object(obj) => {
                let kind = obj.get("type").and_then(|t| t.as_u64()).ok_or_else(|| {
                    MegaverseError::validation(format!("Cell object has no numeric type: {}", value))
                })?;
                let attr = |name: &str| {
                    obj.get(name).and_then(|v| v.as_str()).ok_or_else(|| {
                        MegaverseError::validation(format!(
                            "Cell of type {} is missing '{}': {}",
                            kind, name, value
                        ))
                    })
                };
                match kind {
                    0 => Ok(Cell::Polyanet),
                    1 => Ok(Cell::Soloon(attr("color")?.parse()?)),
                    2 => Ok(Cell::Cometh(attr("direction")?.parse()?)),
                    other => Err(MegaverseError::validation(format!(
                        "Unknown object type number: {}",
                        other
                    ))),
                }
            }
            other => Err(MegaverseError::validation(format!(
                "Invalid cell value: {}",
                other
            ))),
        }
    }
}

impl FromStr for Cell {
    type Err = MegaverseError;

    fn from_str(label: &str) -> Result<Self> {
        let upper = label.trim().to_ascii_uppercase();
        match upper.as_str() {
            "SPACE" => Ok(Cell::Space),
            "POLYANET" => Ok(Cell::Polyanet),
            _ => {
                if let Some(color) = upper.strip_suffix("_SOLOON") {
                    Ok(Cell::Soloon(color.parse()?))
                } else if let Some(direction) = upper.strip_suffix("_COMETH") {
                    Ok(Cell::Cometh(direction.parse()?))
                } else {
                    Err(MegaverseError::validation(format!(
                        "Unknown object type: {}",
                        label
                    )))
                }
            }
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Space => write!(f, "SPACE"),
            Cell::Polyanet => write!(f, "POLYANET"),
            Cell::Soloon(color) => write!(f, "{}_SOLOON", color.as_str().to_uppercase()),
            Cell::Cometh(direction) => write!(f, "{}_COMETH", direction.as_str().to_uppercase()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Polyanet,
    Soloon { color: SoloonColor },
    Cometh { direction: ComethDirection },
}

impl ObjectKind {
    /// Creation pass: anchors first, then satellites, then comets.
    pub fn pass(&self) -> u8 {
        match self {
            ObjectKind::Polyanet => 0,
            ObjectKind::Soloon { .. } => 1,
            ObjectKind::Cometh { .. } => 2,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Polyanet => "Polyanet",
            ObjectKind::Soloon { .. } => "Soloon",
            ObjectKind::Cometh { .. } => "Cometh",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AstralObject {
    pub position: Position,
    pub kind: ObjectKind,
}

impl AstralObject {
    pub fn new(position: Position, kind: ObjectKind) -> Self {
        Self { position, kind }
    }

    /// Builds the object a map cell describes; `None` for empty space.
    pub fn from_cell(cell: Cell, position: Position) -> Option<Self> {
        let kind = match cell {
            Cell::Space => return None,
            Cell::Polyanet => ObjectKind::Polyanet,
            Cell::Soloon(color) => ObjectKind::Soloon { color },
            Cell::Cometh(direction) => ObjectKind::Cometh { direction },
        };
        Some(Self::new(position, kind))
    }

    pub fn cell(&self) -> Cell {
        match self.kind {
            ObjectKind::Polyanet => Cell::Polyanet,
            ObjectKind::Soloon { color } => Cell::Soloon(color),
            ObjectKind::Cometh { direction } => Cell::Cometh(direction),
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self.kind {
            ObjectKind::Polyanet => "polyanets",
            ObjectKind::Soloon { .. } => "soloons",
            ObjectKind::Cometh { .. } => "comeths",
        }
    }

    pub fn payload(&self, candidate_id: &str) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "candidateId": candidate_id,
            "row": self.position.row,
            "column": self.position.column,
        });
        match self.kind {
            ObjectKind::Polyanet => {}
            ObjectKind::Soloon { color } => {
                payload["color"] = serde_json::Value::from(color.as_str());
            }
            ObjectKind::Cometh { direction } => {
                payload["direction"] = serde_json::Value::from(direction.as_str());
            }
        }
        payload
    }

    pub fn object_type(&self) -> String {
        self.cell().to_string()
    }
}

impl fmt::Display for AstralObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.object_type(), self.position)
    }
}

/// A rectangular grid of cells, indexed `[row][column]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalMap {
    rows: Vec<Vec<Cell>>,
}

impl GoalMap {
    /// Wraps a grid after checking it is non-empty, rectangular and within bounds.
    pub fn new(rows: Vec<Vec<Cell>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(MegaverseError::validation("Goal map cannot be empty"));
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(MegaverseError::validation("Goal map rows cannot be empty"));
        }
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(MegaverseError::validation(format!(
                "All rows in goal map must have the same length (row 0 has {}, row {} has {})",
                width,
                idx,
                row.len()
            )));
        }
        if rows.len() > MAX_GRID_SIZE || width > MAX_GRID_SIZE {
            return Err(MegaverseError::validation(format!(
                "Goal map {}x{} exceeds maximum size {}",
                rows.len(),
                width,
                MAX_GRID_SIZE
            )));
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn get(&self, position: Position) -> Option<Cell> {
        self.rows
            .get(position.row)
            .and_then(|r| r.get(position.column))
            .copied()
    }

    /// Row-major iteration over every cell.
    pub fn cells(&self) -> impl Iterator<Item = (Position, Cell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, cell)| (Position::new(r, c), *cell))
        })
    }

    pub fn as_rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapStatistics {
    pub rows: usize,
    pub columns: usize,
    pub total_cells: usize,
    pub space_count: usize,
    /// Count per cell label, e.g. `BLUE_SOLOON`.
    pub object_counts: BTreeMap<String, usize>,
    /// Count per object family: `POLYANET`, `SOLOON`, `COMETH`.
    pub type_counts: BTreeMap<String, usize>,
    pub total_objects: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
    pub failures: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            successful: 0,
            failed: 0,
            total,
            failures: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record(&mut self, object: &AstralObject, success: bool) {
        if success {
            self.successful += 1;
        } else {
            self.failed += 1;
            self.failures.push(object.to_string());
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

#[derive(Debug, Clone)]
pub struct CreationPreview {
    pub statistics: MapStatistics,
    pub objects: Vec<AstralObject>,
    pub groups: BTreeMap<&'static str, Vec<AstralObject>>,
    pub estimated_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_labels_parse_case_insensitively() {
        assert_eq!("SPACE".parse::<Cell>().unwrap(), Cell::Space);
        assert_eq!("polyanet".parse::<Cell>().unwrap(), Cell::Polyanet);
        assert_eq!(
            "BLUE_SOLOON".parse::<Cell>().unwrap(),
            Cell::Soloon(SoloonColor::Blue)
        );
        assert_eq!(
            "right_cometh".parse::<Cell>().unwrap(),
            Cell::Cometh(ComethDirection::Right)
        );
        assert!("GREEN_SOLOON".parse::<Cell>().is_err());
        assert!("SIDEWAYS_COMETH".parse::<Cell>().is_err());
        assert!("ASTEROID".parse::<Cell>().is_err());
    }

    #[test]
    fn test_cell_from_api_type_numbers() {
        use serde_json::json;
        assert_eq!(Cell::from_json(&json!(null)).unwrap(), Cell::Space);
        assert_eq!(Cell::from_json(&json!({"type": 0})).unwrap(), Cell::Polyanet);
        assert_eq!(
            Cell::from_json(&json!({"type": 1, "color": "purple"})).unwrap(),
            Cell::Soloon(SoloonColor::Purple)
        );
        assert_eq!(
            Cell::from_json(&json!({"type": 2, "direction": "up"})).unwrap(),
            Cell::Cometh(ComethDirection::Up)
        );
        assert!(Cell::from_json(&json!({"type": 1})).is_err());
        assert!(Cell::from_json(&json!({"type": 7})).is_err());
        assert!(Cell::from_json(&json!(42)).is_err());
    }

    #[test]
    fn test_cell_label_display() {
        assert_eq!(Cell::Soloon(SoloonColor::White).to_string(), "WHITE_SOLOON");
        assert_eq!(Cell::Cometh(ComethDirection::Left).to_string(), "LEFT_COMETH");
    }

    #[test]
    fn test_payloads() {
        let polyanet = AstralObject::new(Position::new(1, 2), ObjectKind::Polyanet);
        assert_eq!(polyanet.endpoint(), "polyanets");
        assert_eq!(
            polyanet.payload("cand"),
            serde_json::json!({"candidateId": "cand", "row": 1, "column": 2})
        );

        let soloon = AstralObject::new(
            Position::new(0, 1),
            ObjectKind::Soloon {
                color: SoloonColor::Blue,
            },
        );
        assert_eq!(soloon.endpoint(), "soloons");
        assert_eq!(
            soloon.payload("cand"),
            serde_json::json!({"candidateId": "cand", "row": 0, "column": 1, "color": "blue"})
        );

        let cometh = AstralObject::new(
            Position::new(2, 1),
            ObjectKind::Cometh {
                direction: ComethDirection::Right,
            },
        );
        assert_eq!(cometh.endpoint(), "comeths");
        assert_eq!(
            cometh.payload("cand"),
            serde_json::json!({"candidateId": "cand", "row": 2, "column": 1, "direction": "right"})
        );
        assert_eq!(cometh.to_string(), "RIGHT_COMETH at (2, 1)");
    }

    #[test]
    fn test_goal_map_rejects_ragged_rows() {
        let rows = vec![vec![Cell::Space, Cell::Polyanet], vec![Cell::Space]];
        assert!(GoalMap::new(rows).is_err());
        assert!(GoalMap::new(vec![]).is_err());
        assert!(GoalMap::new(vec![vec![]]).is_err());
    }

    #[test]
    fn test_goal_map_rejects_oversized_grid() {
        let rows = vec![vec![Cell::Space; MAX_GRID_SIZE + 1]];
        assert!(GoalMap::new(rows).is_err());
    }

    #[test]
    fn test_run_summary_tally() {
        let obj = AstralObject::new(Position::new(0, 0), ObjectKind::Polyanet);
        let mut summary = RunSummary::new(2);
        summary.record(&obj, true);
        summary.record(&obj, false);
        summary.finish();
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures, vec!["POLYANET at (0, 0)".to_string()]);
        assert!(!summary.is_success());
        assert!(summary.elapsed().is_some());
    }
}
