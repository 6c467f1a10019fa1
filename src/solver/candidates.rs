use std::borrow::Cow;
use std::collections::HashSet;

use super::grid::Grid;
use super::mask::Mask;
use super::{Constraint, GridSettings, Location, Part, Placement, Position, Tristate};

/// One way a requirement could land on the grid, with its mask already
/// rotated into place.
pub(crate) struct Candidate {
    pub(crate) placement: Placement,
    pub(crate) mask: Mask,
}

/// Per-placement admissibility, checked after a single piece was stamped.
///
/// Same-color contact is unknown until every piece lands, so only the lower
/// bound of the bugged predicate can reject here; the full predicate runs on
/// the completed grid.
pub(crate) fn placement_is_admissible(
    grid: &Grid,
    req_idx: usize,
    is_solid: bool,
    on_command_line: Tristate,
    bugged: Tristate,
) -> bool {
    // A piece living entirely in the out-of-bounds ring is never legal.
    if grid.settings.has_oob && !grid.covers_interior(req_idx) {
        return false;
    }

    let out_of_bounds = grid.settings.has_oob && grid.touches_outer_ring(req_idx);
    let on_line = grid.touches_row(grid.settings.command_line_row, req_idx);

    if !on_command_line.admits(on_line) {
        return false;
    }

    if bugged == Tristate::No && (out_of_bounds || (is_solid != on_line)) {
        return false;
    }

    true
}

/// Every position at which `mask` can be stamped onto an empty grid and
/// survive the per-placement checks, in row-major order.
fn positions_for_mask(
    mask: &Mask,
    is_solid: bool,
    settings: GridSettings,
    on_command_line: Tristate,
    bugged: Tristate,
) -> Vec<Position> {
    let mut positions = vec![];

    let mask_h = mask.height() as isize;
    let mask_w = mask.width() as isize;

    for y in (1 - mask_h)..settings.height as isize {
        for x in (1 - mask_w)..settings.width as isize {
            let pos = Position { x, y };

            let mut grid = Grid::new(settings);
            if grid.place(mask, pos, 0).is_err() {
                continue;
            }

            if !placement_is_admissible(&grid, 0, is_solid, on_command_line, bugged) {
                continue;
            }

            positions.push(pos);
        }
    }

    positions
}

/// Positions for every distinct rotation of `mask`. Rotation 0 is always
/// tried; a spinnable part also gets rotations 1 through 3, stopping as soon
/// as a rotation trims to a shape already tried.
fn locations_for_mask(
    mask: &Mask,
    is_solid: bool,
    settings: GridSettings,
    on_command_line: Tristate,
    bugged: Tristate,
    spinnable: bool,
) -> Vec<(Location, Mask)> {
    let mut locations = positions_for_mask(mask, is_solid, settings, on_command_line, bugged)
        .into_iter()
        .map(|position| {
            (
                Location {
                    position,
                    rotation: 0,
                },
                mask.clone(),
            )
        })
        .collect::<Vec<_>>();

    if spinnable {
        let mut seen = HashSet::new();
        seen.insert(mask.trimmed());

        let mut rotated = Cow::Borrowed(mask);
        for rotation in 1..4 {
            rotated = Cow::Owned(rotated.rotate90());
            if !seen.insert(rotated.trimmed()) {
                // Rotations cycle; the first repeat means every further turn
                // repeats too.
                break;
            }

            locations.extend(
                positions_for_mask(&rotated, is_solid, settings, on_command_line, bugged)
                    .into_iter()
                    .map(|position| {
                        (
                            Location { position, rotation },
                            rotated.clone().into_owned(),
                        )
                    }),
            );
        }
    }

    locations
}

/// The full candidate set for one requirement: compression variants ×
/// rotations × positions, in that enumeration order.
pub(crate) fn candidates_for_requirement(
    part: &Part,
    constraint: &Constraint,
    settings: GridSettings,
    spinnable: bool,
) -> Vec<Candidate> {
    let passes: Vec<(&Mask, bool)> = match constraint.compressed {
        Tristate::Yes => vec![(&part.compressed_mask, true)],
        Tristate::No => vec![(&part.uncompressed_mask, false)],
        Tristate::Any if part.compressed_mask == part.uncompressed_mask => {
            vec![(&part.compressed_mask, true)]
        }
        Tristate::Any => vec![
            (&part.compressed_mask, true),
            (&part.uncompressed_mask, false),
        ],
    };

    passes
        .into_iter()
        .flat_map(|(mask, compressed)| {
            locations_for_mask(
                mask,
                part.is_solid,
                settings,
                constraint.on_command_line,
                constraint.bugged,
                spinnable,
            )
            .into_iter()
            .map(move |(loc, mask)| Candidate {
                placement: Placement { loc, compressed },
                mask,
            })
        })
        .collect()
}
