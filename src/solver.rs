//! The placement solver.
//!
//! [`solve`] lazily enumerates arrangements of required parts on the grid;
//! [`place_all`] re-materializes one solution into a per-square ownership
//! map. Everything else supports those two entry points.

mod candidates;
mod grid;
mod mask;
pub mod partsets;
mod search;

pub use grid::PlaceError;
pub use mask::{Mask, MaskShapeError};
pub use search::solve;

use grid::Grid;

/// A grid offset, measured from the top-left cell. Either coordinate may be
/// negative when a mask's empty border hangs off the grid.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub x: isize,
    pub y: isize,
}

/// Where a part goes and how often it is turned 90 degrees clockwise.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub position: Position,
    pub rotation: usize,
}

/// The choice made for one requirement.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub loc: Location,
    pub compressed: bool,
}

/// One placement per requirement, in the order the requirements were given.
pub type Solution = Vec<Placement>;

/// A part that can be placed on the grid.
///
/// Solid parts are programs and belong on the command line; non-solid "plus"
/// parts do not. The two masks are the part's compressed and uncompressed
/// footprints; they may be identical.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub is_solid: bool,
    pub color: usize,
    pub compressed_mask: Mask,
    pub uncompressed_mask: Mask,
}

/// A constraint field that may demand, forbid, or ignore a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tristate {
    Yes,
    No,
    #[default]
    Any,
}

impl Tristate {
    /// Whether an observed value satisfies this field.
    pub fn admits(self, value: bool) -> bool {
        match self {
            Tristate::Yes => value,
            Tristate::No => !value,
            Tristate::Any => true,
        }
    }
}

/// Per-instance demands on how a requirement may be placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub compressed: Tristate,
    pub on_command_line: Tristate,
    pub bugged: Tristate,
}

/// A demand that one instance of a part appear on the grid. A requirement's
/// index in the input list is its identity everywhere: in the runtime grid,
/// in solutions, and in ownership maps.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub part_index: usize,
    pub constraint: Constraint,
}

/// The fixed geometry of the customization grid. With `has_oob`, the corner
/// squares are forbidden and the outermost ring is out of bounds.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSettings {
    pub height: usize,
    pub width: usize,
    pub has_oob: bool,
    pub command_line_row: usize,
}

/// Re-stamps a complete solution onto a fresh grid.
///
/// Returns row-major per-square ownership: the occupying requirement index,
/// or `None` for squares left empty. A solution that overlaps itself or
/// escapes the grid comes back as the stamping error instead.
///
/// Part indices must be in range and `placements` must line up with
/// `requirements`; this is the same contract [`solve`] output satisfies.
pub fn place_all(
    parts: &[Part],
    requirements: &[Requirement],
    placements: &[Placement],
    grid_settings: GridSettings,
) -> Result<Vec<Option<usize>>, PlaceError> {
    let mut grid = Grid::new(grid_settings);

    for (req_idx, placement) in placements.iter().enumerate() {
        let part = &parts[requirements[req_idx].part_index];
        let mask = if placement.compressed {
            &part.compressed_mask
        } else {
            &part.uncompressed_mask
        };
        let mask = mask.rotate(placement.loc.rotation);

        grid.place(&mask, placement.loc.position, req_idx)?;
    }

    Ok(grid.into_ownership())
}
