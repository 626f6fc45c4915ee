//! Annotation-driven classification of a cell.
//!
//! Every classifier scans the cell's objects, takes the first matching
//! annotation per object from a precedence table, and rejects cells whose
//! objects disagree. All annotations are compared lower-cased.

use std::fmt;

use crate::error::CellError;
use crate::types::{Cell, CellNumber, CellObject, SkeletonId};

macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labelled_enum!(
    /// How the mother centriole sits relative to the membrane.
    CentrioleState {
        Tethered => "tethered",
        Docked => "docked",
    }
);

labelled_enum!(
    /// Morphological class of a cell's cilium.
    CiliumKind {
        PreCiliary => "pre-ciliary",
        Incomplete => "incomplete",
        Concealed => "concealed",
        Pocket => "pocket",
        Surface => "surface",
    }
);

labelled_enum!(
    CellType {
        Unsure => "Unsure",
        GranuleCell => "Granule Cell",
        BergmannGlia => "Bergmann glia",
        PurkinjeCell => "Purkinje Cell",
    }
);

labelled_enum!(
    /// Cerebellar layer the cell body sits in.
    Location {
        Ml => "ML",
        Egl => "EGL",
        Igl => "IGL",
        Pcl => "PCL",
    }
);

labelled_enum!(
    CellCyclePhase {
        Prophase => "prophase",
        Prometaphase => "prometaphase",
        Telophase => "telophase",
        MetaphaseAnaphase => "metaphase/anaphase",
        Cytokinesis => "cytokinesis",
    }
);

labelled_enum!(
    CellStage {
        Mitotic => "mitotic",
        SG2 => "S/G2",
    }
);

const CENTRIOLE_STATES: &[(&str, CentrioleState)] = &[
    ("tethered centriole", CentrioleState::Tethered),
    ("docked centriole", CentrioleState::Docked),
];

const CILIUM_KINDS: &[(&str, CiliumKind)] = &[
    ("pre-ciliary structure", CiliumKind::PreCiliary),
    ("incomplete cilium", CiliumKind::Incomplete),
    ("concealed cilium", CiliumKind::Concealed),
    ("pocket cilium", CiliumKind::Pocket),
    ("surface cilium", CiliumKind::Surface),
];

// The dataset spells it "Purkinge".
const CELL_TYPES: &[(&str, CellType)] = &[
    ("granule cell", CellType::GranuleCell),
    ("bergmann glia", CellType::BergmannGlia),
    ("purkinge cell", CellType::PurkinjeCell),
    ("purkinje cell", CellType::PurkinjeCell),
];

const LOCATIONS: &[(&str, Location)] = &[
    ("ml", Location::Ml),
    ("egl", Location::Egl),
    ("igl", Location::Igl),
    ("pcl", Location::Pcl),
];

const CELL_CYCLE_PHASES: &[(&str, CellCyclePhase)] = &[
    ("prophase", CellCyclePhase::Prophase),
    ("prometaphase", CellCyclePhase::Prometaphase),
    ("telophase", CellCyclePhase::Telophase),
    ("metaphase/anaphase", CellCyclePhase::MetaphaseAnaphase),
    ("cytokinesis", CellCyclePhase::Cytokinesis),
];

const CELL_STAGES: &[(&str, CellStage)] = &[
    ("mitotic", CellStage::Mitotic),
    ("s/g2", CellStage::SG2),
];

pub const BASAL_BODY: &str = "basal body";
pub const MIGRATING: &str = "migrating";
pub const CILIUM: &str = "cilium";
pub const CENTRIOLE: &str = "centriole";
pub const MOTHER_CENTRIOLE: &str = "mother centriole";
pub const DAUGHTER_CENTRIOLE: &str = "daughter centriole";

/// First entry of `table` whose annotation the object carries.
fn first_match<T: Copy>(object: &CellObject, table: &[(&str, T)]) -> Option<T> {
    table
        .iter()
        .find(|(annotation, _)| object.has(annotation))
        .map(|(_, value)| *value)
}

/// Classify each object by `table` and require all matches to agree.
fn agreeing<T: Copy + PartialEq + fmt::Display>(
    cell: &Cell,
    field: &'static str,
    table: &[(&str, T)],
) -> Result<Option<T>, CellError> {
    let mut found: Option<T> = None;
    for object in &cell.objects {
        let Some(value) = first_match(object, table) else {
            continue;
        };
        match found {
            Some(existing) if existing != value => {
                return Err(CellError::Conflict {
                    cell: cell.number,
                    field,
                    first: existing.to_string(),
                    second: value.to_string(),
                });
            }
            _ => found = Some(value),
        }
    }
    Ok(found)
}

pub fn basal_body(cell: &Cell) -> bool {
    cell.any_has(BASAL_BODY)
}

pub fn migrating(cell: &Cell) -> bool {
    cell.any_has(MIGRATING)
}

pub fn centriole_state(cell: &Cell) -> Result<Option<CentrioleState>, CellError> {
    agreeing(cell, "centriole", CENTRIOLE_STATES)
}

/// A cell has at most one object classified as a cilium kind, even when two
/// objects would agree.
pub fn cilium_kind(cell: &Cell) -> Result<Option<CiliumKind>, CellError> {
    let mut found: Option<(CiliumKind, SkeletonId)> = None;
    for object in &cell.objects {
        let Some(kind) = first_match(object, CILIUM_KINDS) else {
            continue;
        };
        if let Some((_, first)) = found {
            return Err(CellError::DuplicateCilium {
                cell: cell.number,
                first,
                second: object.skeleton_id,
            });
        }
        found = Some((kind, object.skeleton_id));
    }
    Ok(found.map(|(kind, _)| kind))
}

pub fn cell_type(cell: &Cell) -> Result<CellType, CellError> {
    Ok(agreeing(cell, "cell type", CELL_TYPES)?.unwrap_or(CellType::Unsure))
}

pub fn location(cell: &Cell) -> Result<Option<Location>, CellError> {
    agreeing(cell, "location", LOCATIONS)
}

/// Mitotic phase and cycle stage, classified independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellCycle {
    pub phase: Option<CellCyclePhase>,
    pub stage: Option<CellStage>,
}

pub fn cell_cycle(cell: &Cell) -> Result<CellCycle, CellError> {
    Ok(CellCycle {
        phase: agreeing(cell, "cell cycle phase", CELL_CYCLE_PHASES)?,
        stage: agreeing(cell, "cell stage", CELL_STAGES)?,
    })
}

/// The single skeleton annotated `cilium`, if any.
pub fn cilium_skeleton(cell: &Cell) -> Result<Option<SkeletonId>, CellError> {
    let mut cilia = cell.objects_with(CILIUM);
    let first = cilia.next().map(|o| o.skeleton_id);
    if let (Some(first), Some(second)) = (first, cilia.next()) {
        return Err(CellError::DuplicateCilium {
            cell: cell.number,
            first,
            second: second.skeleton_id,
        });
    }
    Ok(first)
}

// ── Centriole pairs ────────────────────────────────────────────────

/// Dividing cells carry two centriole pairs; the second is marked "B".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentriolePair {
    A,
    B,
}

impl CentriolePair {
    fn of(object: &CellObject) -> Self {
        if object.has("b") || object.name.contains('B') {
            Self::B
        } else {
            Self::A
        }
    }

    fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
        }
    }
}

/// Mother and daughter skeletons of one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PairMembers {
    pub mother: Option<SkeletonId>,
    pub daughter: Option<SkeletonId>,
}

/// Mother/daughter skeletons of both pairs of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CentrioleRoles {
    pub a: PairMembers,
    pub b: PairMembers,
}

impl CentrioleRoles {
    pub fn pair(&self, pair: CentriolePair) -> PairMembers {
        match pair {
            CentriolePair::A => self.a,
            CentriolePair::B => self.b,
        }
    }
}

fn assign(
    slot: &mut Option<SkeletonId>,
    id: SkeletonId,
    cell: CellNumber,
    pair: CentriolePair,
    role: &'static str,
) -> Result<(), CellError> {
    if let Some(first) = *slot {
        return Err(CellError::DuplicateCentriole {
            cell,
            pair: pair.letter(),
            role,
            first,
            second: id,
        });
    }
    *slot = Some(id);
    Ok(())
}

/// Assign mother/daughter centrioles to pair A or B. An object annotated as
/// mother is never also counted as a daughter.
pub fn centriole_roles(cell: &Cell) -> Result<CentrioleRoles, CellError> {
    let mut roles = CentrioleRoles::default();
    for object in &cell.objects {
        let pair = CentriolePair::of(object);
        let members = match pair {
            CentriolePair::A => &mut roles.a,
            CentriolePair::B => &mut roles.b,
        };
        if object.has(MOTHER_CENTRIOLE) {
            assign(&mut members.mother, object.skeleton_id, cell.number, pair, "mother")?;
        } else if object.has(DAUGHTER_CENTRIOLE) {
            assign(&mut members.daughter, object.skeleton_id, cell.number, pair, "daughter")?;
        }
    }
    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(objects: Vec<CellObject>) -> Cell {
        Cell {
            number: CellNumber(1),
            objects,
        }
    }

    fn obj(id: i64, name: &str, annotations: &[&str]) -> CellObject {
        CellObject::new(id, name, annotations.iter().copied())
    }

    #[test]
    fn flags_scan_all_objects() {
        let c = cell(vec![obj(1, "x", &["cilium"]), obj(2, "y", &["Basal Body", "Migrating"])]);
        assert!(basal_body(&c));
        assert!(migrating(&c));
        assert!(!basal_body(&cell(vec![obj(1, "x", &["cilium"])])));
    }

    #[test]
    fn centriole_state_prefers_tethered_within_an_object() {
        let c = cell(vec![obj(1, "m", &["docked centriole", "tethered centriole"])]);
        assert_eq!(centriole_state(&c).unwrap(), Some(CentrioleState::Tethered));
    }

    #[test]
    fn centriole_state_repeats_are_fine_conflicts_are_not() {
        let same = cell(vec![
            obj(1, "m", &["docked centriole"]),
            obj(2, "d", &["docked centriole"]),
        ]);
        assert_eq!(centriole_state(&same).unwrap(), Some(CentrioleState::Docked));

        let conflict = cell(vec![
            obj(1, "m", &["docked centriole"]),
            obj(2, "d", &["tethered centriole"]),
        ]);
        let err = centriole_state(&conflict).unwrap_err();
        assert!(matches!(err, CellError::Conflict { field: "centriole", .. }));
    }

    #[test]
    fn cilium_kind_precedence_and_uniqueness() {
        let c = cell(vec![obj(1, "c", &["surface cilium", "pocket cilium"])]);
        assert_eq!(cilium_kind(&c).unwrap(), Some(CiliumKind::Pocket));

        let twice = cell(vec![obj(1, "c", &["pocket cilium"]), obj(2, "c2", &["pocket cilium"])]);
        assert!(matches!(
            cilium_kind(&twice).unwrap_err(),
            CellError::DuplicateCilium { .. }
        ));

        assert_eq!(cilium_kind(&cell(vec![obj(1, "c", &["cilium"])])).unwrap(), None);
    }

    #[test]
    fn cell_type_defaults_to_unsure() {
        assert_eq!(cell_type(&cell(vec![obj(1, "x", &["ml"])])).unwrap(), CellType::Unsure);
        let gc = cell(vec![obj(1, "x", &["Granule Cell"]), obj(2, "y", &["granule cell"])]);
        assert_eq!(cell_type(&gc).unwrap(), CellType::GranuleCell);
        let pc = cell(vec![obj(1, "x", &["Purkinge Cell"])]);
        assert_eq!(cell_type(&pc).unwrap().as_str(), "Purkinje Cell");
    }

    #[test]
    fn cell_type_conflict_is_an_error() {
        let c = cell(vec![obj(1, "x", &["granule cell"]), obj(2, "y", &["bergmann glia"])]);
        let err = cell_type(&c).unwrap_err();
        assert!(err.to_string().contains("Granule Cell vs Bergmann glia"), "{err}");
    }

    #[test]
    fn location_ignores_egl_boundary() {
        let c = cell(vec![obj(1, "x", &["egl boundary"])]);
        assert_eq!(location(&c).unwrap(), None);
        let c = cell(vec![obj(1, "x", &["egl boundary", "IGL"])]);
        assert_eq!(location(&c).unwrap(), Some(Location::Igl));
    }

    #[test]
    fn location_conflict_is_an_error() {
        let c = cell(vec![obj(1, "x", &["ml"]), obj(2, "y", &["pcl"])]);
        assert!(location(&c).is_err());
    }

    #[test]
    fn cell_cycle_reports_phase_and_stage() {
        let c = cell(vec![
            obj(1, "x", &["mitotic", "prometaphase"]),
            obj(2, "y", &["prometaphase"]),
        ]);
        let cycle = cell_cycle(&c).unwrap();
        assert_eq!(cycle.phase, Some(CellCyclePhase::Prometaphase));
        assert_eq!(cycle.stage, Some(CellStage::Mitotic));
        assert_eq!(CellStage::SG2.as_str(), "S/G2");

        let empty = cell_cycle(&cell(vec![obj(1, "x", &["ml"])])).unwrap();
        assert_eq!(empty, CellCycle::default());
    }

    #[test]
    fn cell_cycle_phase_conflict() {
        let c = cell(vec![obj(1, "x", &["telophase"]), obj(2, "y", &["cytokinesis"])]);
        let err = cell_cycle(&c).unwrap_err();
        assert!(matches!(err, CellError::Conflict { field: "cell cycle phase", .. }));
    }

    #[test]
    fn cilium_skeleton_is_unique() {
        assert_eq!(cilium_skeleton(&cell(vec![obj(1, "x", &["ml"])])).unwrap(), None);
        let one = cell(vec![obj(7, "c", &["cilium", "pocket cilium"])]);
        assert_eq!(cilium_skeleton(&one).unwrap(), Some(SkeletonId(7)));
        let two = cell(vec![obj(7, "c", &["cilium"]), obj(8, "d", &["cilium"])]);
        assert!(cilium_skeleton(&two).is_err());
    }

    #[test]
    fn centriole_roles_split_pairs_by_marker() {
        let c = cell(vec![
            obj(1, "mother", &["mother centriole", "centriole"]),
            obj(2, "daughter", &["daughter centriole", "centriole"]),
            obj(3, "mother B", &["mother centriole", "centriole"]),
            obj(4, "daughter", &["daughter centriole", "centriole", "B"]),
        ]);
        let roles = centriole_roles(&c).unwrap();
        assert_eq!(roles.a.mother, Some(SkeletonId(1)));
        assert_eq!(roles.a.daughter, Some(SkeletonId(2)));
        assert_eq!(roles.pair(CentriolePair::B).mother, Some(SkeletonId(3)));
        assert_eq!(roles.pair(CentriolePair::B).daughter, Some(SkeletonId(4)));
    }

    #[test]
    fn lowercase_b_in_name_is_pair_a() {
        let c = cell(vec![obj(1, "basal mother", &["mother centriole"])]);
        let roles = centriole_roles(&c).unwrap();
        assert_eq!(roles.a.mother, Some(SkeletonId(1)));
        assert_eq!(roles.b.mother, None);
    }

    #[test]
    fn duplicate_mother_in_pair_is_an_error() {
        let c = cell(vec![
            obj(1, "m1", &["mother centriole"]),
            obj(2, "m2", &["mother centriole"]),
        ]);
        let err = centriole_roles(&c).unwrap_err();
        assert!(matches!(
            err,
            CellError::DuplicateCentriole { pair: 'A', role: "mother", .. }
        ));
    }
}
