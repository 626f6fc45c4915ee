// Grouping of annotated skeleton objects into cells.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::catmaid::NeuronEntity;
use crate::error::CellError;
use crate::types::{CELL_NUMBER_MARKER, Cell, CellNumber, CellObject, SkeletonId};

/// Annotation marking a two-node line from the mother centriole outwards.
pub const VECTOR_LINE_ANNOTATION: &str = "centriole vector line";

/// Cells of a project plus every annotation seen while grouping.
#[derive(Debug, Default)]
pub struct CellIndex {
    pub cells: BTreeMap<CellNumber, Cell>,
    /// Every distinct lower-cased annotation other than cell numbers,
    /// including those on objects that belong to no cell.
    pub all_annotations: BTreeSet<String>,
    /// Objects with a cell number but no other annotation.
    pub unannotated: Vec<String>,
}

impl CellIndex {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }
}

/// One entity after validation: its skeleton, cell number (if any) and
/// lower-cased annotations without the cell number.
#[derive(Debug)]
struct ParsedEntity {
    skeleton_id: SkeletonId,
    cell: Option<CellNumber>,
    annotations: BTreeSet<String>,
}

fn parse_entity(entity: &NeuronEntity) -> Result<ParsedEntity, CellError> {
    let skeleton_id = match entity.skeleton_ids.as_slice() {
        [id] => SkeletonId(*id),
        ids => {
            return Err(CellError::MalformedEntity {
                name: entity.name.clone(),
                reason: format!("expected exactly one skeleton id, found {}", ids.len()),
            });
        }
    };

    let mut cell = None;
    let mut annotations = BTreeSet::new();
    for name in entity.annotation_names() {
        let lower = name.to_lowercase();
        if lower.contains(CELL_NUMBER_MARKER) {
            let number =
                parse_cell_number(&lower).ok_or_else(|| CellError::MalformedEntity {
                    name: entity.name.clone(),
                    reason: format!("unreadable cell number annotation {name:?}"),
                })?;
            cell = Some(number);
        } else {
            annotations.insert(lower);
        }
    }

    Ok(ParsedEntity {
        skeleton_id,
        cell,
        annotations,
    })
}

/// Parse the number out of a `cell #NNN` annotation.
pub fn parse_cell_number(annotation: &str) -> Option<CellNumber> {
    let lower = annotation.to_lowercase();
    let (_, after) = lower.split_once(CELL_NUMBER_MARKER)?;
    let digits = after.trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(CellNumber)
}

/// Group neuron entities into cells by their `cell #` annotation.
///
/// Entities without a cell number are ignored; entities with nothing but a
/// cell number are logged and skipped.
pub fn group_cells(entities: &[NeuronEntity]) -> Result<CellIndex, CellError> {
    let mut index = CellIndex::default();

    for entity in entities {
        let parsed = parse_entity(entity)?;
        index
            .all_annotations
            .extend(parsed.annotations.iter().cloned());

        let Some(cell) = parsed.cell else {
            continue;
        };

        if parsed.annotations.is_empty() {
            warn!(name = %entity.name, cell = %cell, "No annotations besides the cell number");
            index.unannotated.push(entity.name.clone());
            continue;
        }

        index
            .cells
            .entry(cell)
            .or_insert_with(|| Cell {
                number: cell,
                objects: Vec::new(),
            })
            .objects
            .push(CellObject {
                skeleton_id: parsed.skeleton_id,
                annotations: parsed.annotations,
                name: entity.name.clone(),
            });
    }

    debug!(
        cells = index.cells.len(),
        annotations = index.all_annotations.len(),
        "Grouped entities into cells"
    );
    Ok(index)
}

/// A `centriole vector line` skeleton and the cell it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorLine {
    pub cell: CellNumber,
    pub skeleton_id: SkeletonId,
}

/// Pick out vector-line skeletons, in entity order.
pub fn select_vector_lines(entities: &[NeuronEntity]) -> Result<Vec<VectorLine>, CellError> {
    let mut lines = Vec::new();
    for entity in entities {
        let is_vector = entity
            .annotation_names()
            .any(|a| a.eq_ignore_ascii_case(VECTOR_LINE_ANNOTATION));
        if !is_vector {
            continue;
        }

        let parsed = parse_entity(entity)?;
        let Some(cell) = parsed.cell else {
            debug!(name = %entity.name, "Vector line without a cell number, ignoring");
            continue;
        };
        lines.push(VectorLine {
            cell,
            skeleton_id: parsed.skeleton_id,
        });
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, id: i64, annotations: &[&str]) -> NeuronEntity {
        NeuronEntity::new(name, id, annotations.iter().copied())
    }

    #[test]
    fn parse_cell_number_forms() {
        assert_eq!(parse_cell_number("cell #012"), Some(CellNumber(12)));
        assert_eq!(parse_cell_number("Cell #7"), Some(CellNumber(7)));
        assert_eq!(parse_cell_number("cell # 140"), Some(CellNumber(140)));
        assert_eq!(parse_cell_number("cell #abc"), None);
        assert_eq!(parse_cell_number("cell #"), None);
        assert_eq!(parse_cell_number("cilium"), None);
    }

    #[test]
    fn groups_objects_by_cell_number() {
        let entities = vec![
            entity("a", 1, &["cell #002", "Mother Centriole"]),
            entity("b", 2, &["cell #001", "cilium"]),
            entity("c", 3, &["Cell #002", "Daughter Centriole"]),
        ];
        let index = group_cells(&entities).unwrap();
        assert_eq!(index.len(), 2);

        let numbers: Vec<_> = index.iter().map(|c| c.number.0).collect();
        assert_eq!(numbers, vec![1, 2]);

        let two = &index.cells[&CellNumber(2)];
        assert_eq!(two.objects.len(), 2);
        assert!(two.objects[0].has("mother centriole"));
        assert!(two.objects[1].has("daughter centriole"));
        assert!(
            two.objects
                .iter()
                .all(|o| !o.annotations.iter().any(|a| a.contains("cell #")))
        );
    }

    #[test]
    fn ignores_objects_without_cell_but_records_annotations() {
        let entities = vec![
            entity("loose", 9, &["EGL boundary"]),
            entity("a", 1, &["cell #003", "ML"]),
        ];
        let index = group_cells(&entities).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.all_annotations.contains("egl boundary"));
        assert!(index.all_annotations.contains("ml"));
    }

    #[test]
    fn skips_objects_with_only_a_cell_number() {
        let entities = vec![
            entity("bare", 1, &["cell #004"]),
            entity("ok", 2, &["cell #005", "migrating"]),
        ];
        let index = group_cells(&entities).unwrap();
        assert!(!index.cells.contains_key(&CellNumber(4)));
        assert_eq!(index.unannotated, vec!["bare".to_string()]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn rejects_entity_with_multiple_skeletons() {
        let mut bad = entity("twins", 1, &["cell #001", "ml"]);
        bad.skeleton_ids.push(2);
        let err = group_cells(&[bad]).unwrap_err();
        assert!(matches!(err, CellError::MalformedEntity { .. }));
    }

    #[test]
    fn rejects_unreadable_cell_number() {
        let err = group_cells(&[entity("x", 1, &["cell #twelve", "ml"])]).unwrap_err();
        assert!(err.to_string().contains("unreadable cell number"), "{err}");
    }

    #[test]
    fn selects_vector_lines_in_order() {
        let entities = vec![
            entity("v2", 20, &["centriole vector line", "cell #002"]),
            entity("other", 5, &["cell #002", "cilium"]),
            entity("v1", 10, &["Centriole Vector Line", "cell #001"]),
            entity("stray", 30, &["centriole vector line"]),
        ];
        let lines = select_vector_lines(&entities).unwrap();
        assert_eq!(
            lines,
            vec![
                VectorLine {
                    cell: CellNumber(2),
                    skeleton_id: SkeletonId(20)
                },
                VectorLine {
                    cell: CellNumber(1),
                    skeleton_id: SkeletonId(10)
                },
            ]
        );
    }
}
