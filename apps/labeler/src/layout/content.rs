#![allow(dead_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layout::error::LayoutError;
use crate::layout::schema::{ElementKind, Position, PositionMap};

/// Content for one label: `Position -> text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowContent(BTreeMap<Position, String>);

impl RowContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, position: Position) -> Option<&str> {
        self.0.get(&position).map(String::as_str)
    }

    /// Sets `position`, or appends with a comma if it already holds content.
    pub fn push(&mut self, position: Position, text: &str) {
        self.0
            .entry(position)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(text);
            })
            .or_insert_with(|| text.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &str)> {
        self.0.iter().map(|(p, s)| (*p, s.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Maps one record of `(header, value)` cells onto positions.
    ///
    /// Title positions receive the header itself, everything else the value.
    /// Headers with no mapping are ignored; a mapping to an undeclared position
    /// is a schema error.
    pub fn from_fields(
        schema: &PositionMap,
        field_positions: &BTreeMap<String, Vec<Position>>,
        record: &[(String, String)],
    ) -> Result<Self, LayoutError> {
        let mut row = RowContent::new();

        for (header, value) in record {
            let Some(positions) = field_positions.get(header) else {
                continue;
            };
            let mut positions = positions.clone();
            positions.sort();
            positions.dedup();

            for pos in positions {
                let kind = schema.kind(pos).ok_or_else(|| {
                    LayoutError::Schema(format!("field `{header}` maps to undeclared position {pos}"))
                })?;
                let text = if kind == ElementKind::Title { header } else { value };
                row.push(pos, text);
            }
        }
        Ok(row)
    }
}

impl FromIterator<(Position, String)> for RowContent {
    fn from_iter<T: IntoIterator<Item = (Position, String)>>(iter: T) -> Self {
        let mut row = RowContent::new();
        for (pos, text) in iter {
            row.push(pos, &text);
        }
        row
    }
}
