use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use genawaiter::yield_;

use super::candidates::{candidates_for_requirement, placement_is_admissible, Candidate};
use super::grid::{Cell, Grid};
use super::{GridSettings, Part, Placement, Requirement, Solution, Tristate};

/// Cheap whole-input feasibility checks. A failure here means no solution
/// can exist, so the search is skipped entirely.
fn requirements_are_admissible(
    parts: &[Part],
    requirements: &[Requirement],
    settings: GridSettings,
) -> bool {
    let demanded_on_line = requirements
        .iter()
        .filter(|req| req.constraint.on_command_line == Tristate::Yes)
        .count();
    if demanded_on_line > settings.width {
        log::debug!(
            "{} requirements demand the command line but the grid only has {} columns",
            demanded_on_line,
            settings.width
        );
        return false;
    }

    let occupied = requirements
        .iter()
        .map(|req| {
            let part = &parts[req.part_index];
            if req.constraint.compressed == Tristate::No {
                part.uncompressed_mask.popcount()
            } else {
                part.compressed_mask.popcount()
            }
        })
        .sum::<usize>();
    let capacity = settings.width * settings.height - if settings.has_oob { 4 } else { 0 };
    if occupied > capacity {
        log::debug!(
            "requirements occupy at least {} squares but the grid only has {}",
            occupied,
            capacity
        );
        return false;
    }

    true
}

/// The full bugged predicate, decidable only once every piece has landed.
///
/// One scan of the grid collects, per requirement: whether it touches the
/// out-of-bounds ring, whether it touches the command line, and whether any
/// 4-neighbor belongs to a different requirement of the same color.
fn solution_is_admissible(parts: &[Part], requirements: &[Requirement], grid: &Grid) -> bool {
    #[derive(Clone, Copy, Default)]
    struct ReqFlags {
        out_of_bounds: bool,
        on_command_line: bool,
        touching_same_color: bool,
    }

    let mut flags = vec![ReqFlags::default(); requirements.len()];
    let (h, w) = grid.cells.dim();

    for (y, row) in grid.cells.rows().into_iter().enumerate() {
        for (x, &cell) in row.into_iter().enumerate() {
            let req_idx = match cell {
                Cell::Placed(req_idx) => req_idx,
                _ => continue,
            };
            let part = &parts[requirements[req_idx].part_index];
            let entry = &mut flags[req_idx];

            if grid.settings.has_oob && (x == 0 || y == 0 || x == w - 1 || y == h - 1) {
                entry.out_of_bounds = true;
            }

            if y == grid.settings.command_line_row {
                entry.on_command_line = true;
            }

            let neighbors = [
                x.checked_sub(1).and_then(|x| grid.cells.get([y, x])),
                x.checked_add(1).and_then(|x| grid.cells.get([y, x])),
                y.checked_sub(1).and_then(|y| grid.cells.get([y, x])),
                y.checked_add(1).and_then(|y| grid.cells.get([y, x])),
            ];
            if neighbors.iter().any(|neighbor| match neighbor {
                Some(Cell::Placed(other)) => {
                    *other != req_idx
                        && parts[requirements[*other].part_index].color == part.color
                }
                _ => false,
            }) {
                entry.touching_same_color = true;
            }
        }
    }

    requirements.iter().zip(flags).all(|(req, flags)| {
        let part = &parts[req.part_index];
        let bugged = flags.out_of_bounds
            || (part.is_solid != flags.on_command_line)
            || flags.touching_same_color;
        req.constraint.bugged.admits(bugged)
    })
}

/// Depth-first search over the precomputed candidate lists.
///
/// Yields suffixes of `(req_idx, placement)` pairs; the caller restores the
/// original requirement order. Suspends between results.
fn search(
    parts: Rc<Vec<Part>>,
    requirements: Rc<Vec<Requirement>>,
    grid: Grid,
    ordered: Rc<Vec<(usize, Vec<Candidate>)>>,
    depth: usize,
    visited: Rc<RefCell<HashSet<Vec<u8>>>>,
) -> Box<dyn Iterator<Item = Vec<(usize, Placement)>>> {
    Box::new(
        genawaiter::rc::gen!({
            let (req_idx, cands) = match ordered.get(depth) {
                Some(entry) => entry,
                None => {
                    yield_!(Vec::with_capacity(requirements.len()));
                    return;
                }
            };

            let requirement = &requirements[*req_idx];
            let part = &parts[requirement.part_index];

            for candidate in cands {
                let mut placed = grid.clone();
                if placed
                    .place(&candidate.mask, candidate.placement.loc.position, *req_idx)
                    .is_err()
                {
                    continue;
                }

                if !placement_is_admissible(
                    &placed,
                    *req_idx,
                    part.is_solid,
                    requirement.constraint.on_command_line,
                    requirement.constraint.bugged,
                ) {
                    continue;
                }

                // Branches that rearrange identical parts into a grid reached
                // some other way are pruned here.
                if !visited
                    .borrow_mut()
                    .insert(placed.part_fingerprint(&requirements))
                {
                    continue;
                }

                if depth + 1 == ordered.len()
                    && !solution_is_admissible(&parts, &requirements, &placed)
                {
                    continue;
                }

                for mut suffix in search(
                    parts.clone(),
                    requirements.clone(),
                    placed,
                    ordered.clone(),
                    depth + 1,
                    visited.clone(),
                ) {
                    suffix.push((*req_idx, candidate.placement.clone()));
                    yield_!(suffix);
                }
            }
        })
        .into_iter(),
    )
}

/// Lazily enumerates every arrangement of `requirements` on the grid.
///
/// Each yielded solution holds one placement per requirement, in the order
/// the requirements were given. The sequence is deterministic for identical
/// inputs and is computed on demand; dropping the iterator cancels the
/// search.
pub fn solve(
    parts: Vec<Part>,
    requirements: Vec<Requirement>,
    grid_settings: GridSettings,
    spinnable_colors: Vec<bool>,
) -> impl Iterator<Item = Solution> + 'static {
    genawaiter::rc::gen!({
        if grid_settings.command_line_row >= grid_settings.height {
            log::debug!(
                "command line row {} does not exist on a grid {} rows tall",
                grid_settings.command_line_row,
                grid_settings.height
            );
            return;
        }

        if !requirements_are_admissible(&parts, &requirements, grid_settings) {
            return;
        }

        let num_requirements = requirements.len();

        let ordered = {
            let start = instant::Instant::now();

            let mut ordered = requirements
                .iter()
                .enumerate()
                .map(|(req_idx, req)| {
                    let part = &parts[req.part_index];
                    let spinnable = spinnable_colors.get(part.color).copied().unwrap_or(false);
                    (
                        req_idx,
                        candidates_for_requirement(part, &req.constraint, grid_settings, spinnable),
                    )
                })
                .collect::<Vec<_>>();

            // Hardest to place first. Ties keep requirements of the same part
            // adjacent, which lets the fingerprint set collapse their
            // permutations early.
            ordered.sort_unstable_by_key(|(req_idx, cands)| (cands.len(), *req_idx));

            log::info!(
                "candidate precomputation took {:?}, placement order: {:?}",
                start.elapsed(),
                ordered
                    .iter()
                    .map(|(req_idx, cands)| (*req_idx, cands.len()))
                    .collect::<Vec<_>>()
            );

            ordered
        };

        for mut tagged in search(
            Rc::new(parts),
            Rc::new(requirements),
            Grid::new(grid_settings),
            Rc::new(ordered),
            0,
            Rc::new(RefCell::new(HashSet::new())),
        ) {
            tagged.sort_by_key(|(req_idx, _)| *req_idx);
            assert!(tagged.len() == num_requirements);
            yield_!(tagged
                .into_iter()
                .map(|(_, placement)| placement)
                .collect::<Vec<_>>());
        }
    })
    .into_iter()
}

#[cfg(test)]
mod tests {
    use super::super::{place_all, Constraint, Location, Mask, Position};
    use super::*;

    fn part(is_solid: bool, color: usize, mask: Mask) -> Part {
        Part {
            is_solid,
            color,
            compressed_mask: mask.clone(),
            uncompressed_mask: mask,
        }
    }

    fn requirement(part_index: usize, constraint: Constraint) -> Requirement {
        Requirement {
            part_index,
            constraint,
        }
    }

    #[test]
    fn test_solve() {
        let super_armor = Mask::new(
            3,
            3,
            vec![
                true, false, false, //
                true, true, false, //
                true, false, false, //
            ],
        )
        .unwrap();

        assert_eq!(
            solve(
                vec![part(true, 0, super_armor)],
                vec![requirement(
                    0,
                    Constraint {
                        compressed: Tristate::Yes,
                        on_command_line: Tristate::Yes,
                        bugged: Tristate::No,
                    },
                )],
                GridSettings {
                    height: 3,
                    width: 3,
                    has_oob: false,
                    command_line_row: 1,
                },
                vec![true],
            )
            .collect::<Vec<_>>(),
            vec![
                vec![Placement {
                    loc: Location {
                        position: Position { x: 0, y: 0 },
                        rotation: 0
                    },
                    compressed: true
                }],
                vec![Placement {
                    loc: Location {
                        position: Position { x: 1, y: 0 },
                        rotation: 0
                    },
                    compressed: true
                }],
                vec![Placement {
                    loc: Location {
                        position: Position { x: 0, y: 0 },
                        rotation: 1
                    },
                    compressed: true
                }],
                vec![Placement {
                    loc: Location {
                        position: Position { x: 0, y: 1 },
                        rotation: 1
                    },
                    compressed: true
                }],
                vec![Placement {
                    loc: Location {
                        position: Position { x: -1, y: 0 },
                        rotation: 2
                    },
                    compressed: true
                }],
                vec![Placement {
                    loc: Location {
                        position: Position { x: 0, y: 0 },
                        rotation: 2
                    },
                    compressed: true
                }],
                vec![Placement {
                    loc: Location {
                        position: Position { x: 0, y: -1 },
                        rotation: 3
                    },
                    compressed: true
                }],
                vec![Placement {
                    loc: Location {
                        position: Position { x: 0, y: 0 },
                        rotation: 3
                    },
                    compressed: true
                }]
            ]
        );
    }

    #[test]
    fn test_solve_collapses_identical_parts() {
        let bit = Mask::new(1, 1, vec![true]).unwrap();
        let on_line = Constraint {
            on_command_line: Tristate::Yes,
            ..Constraint::default()
        };

        let solutions = solve(
            vec![part(true, 0, bit)],
            vec![requirement(0, on_line), requirement(0, on_line)],
            GridSettings {
                height: 2,
                width: 2,
                has_oob: false,
                command_line_row: 0,
            },
            vec![false],
        )
        .collect::<Vec<_>>();

        // Swapping the two requirements produces the same grid of parts, so
        // only one arrangement survives.
        assert_eq!(solutions.len(), 1);
        assert_eq!(
            solutions[0]
                .iter()
                .map(|p| p.loc.position)
                .collect::<Vec<_>>(),
            vec![Position { x: 0, y: 0 }, Position { x: 1, y: 0 }]
        );
    }

    #[test]
    fn test_solve_command_line_row_out_of_range() {
        let bit = Mask::new(1, 1, vec![true]).unwrap();

        assert_eq!(
            solve(
                vec![part(true, 0, bit)],
                vec![requirement(0, Constraint::default())],
                GridSettings {
                    height: 3,
                    width: 3,
                    has_oob: false,
                    command_line_row: 3,
                },
                vec![false],
            )
            .count(),
            0
        );
    }

    #[test]
    fn test_solve_too_many_on_command_line() {
        let bit = Mask::new(1, 1, vec![true]).unwrap();
        let on_line = Constraint {
            on_command_line: Tristate::Yes,
            ..Constraint::default()
        };

        assert_eq!(
            solve(
                vec![part(true, 0, bit)],
                vec![
                    requirement(0, on_line),
                    requirement(0, on_line),
                    requirement(0, on_line),
                ],
                GridSettings {
                    height: 2,
                    width: 2,
                    has_oob: false,
                    command_line_row: 0,
                },
                vec![false],
            )
            .count(),
            0
        );
    }

    #[test]
    fn test_solve_over_capacity() {
        let block = Mask::new(2, 2, vec![true; 4]).unwrap();

        assert_eq!(
            solve(
                vec![part(true, 0, block)],
                vec![
                    requirement(0, Constraint::default()),
                    requirement(0, Constraint::default()),
                ],
                GridSettings {
                    height: 2,
                    width: 2,
                    has_oob: false,
                    command_line_row: 0,
                },
                vec![false],
            )
            .count(),
            0
        );
    }

    #[test]
    fn test_solve_unbugged_plus_part_avoids_line_and_ring() {
        let block = Mask::new(2, 2, vec![true; 4]).unwrap();
        let parts = vec![part(false, 0, block)];
        let requirements = vec![requirement(
            0,
            Constraint {
                bugged: Tristate::No,
                ..Constraint::default()
            },
        )];
        let settings = GridSettings {
            height: 7,
            width: 7,
            has_oob: true,
            command_line_row: 3,
        };

        let solutions = solve(
            parts.clone(),
            requirements.clone(),
            settings,
            vec![false],
        )
        .collect::<Vec<_>>();

        // The block has to sit fully inside the ring without touching row 3:
        // two rows of offsets with four columns each.
        assert_eq!(solutions.len(), 8);

        for solution in &solutions {
            let cells = place_all(&parts, &requirements, solution, settings).unwrap();
            for (i, owner) in cells.iter().enumerate() {
                if owner.is_none() {
                    continue;
                }
                let (y, x) = (i / settings.width, i % settings.width);
                assert_ne!(y, settings.command_line_row);
                assert!(y > 0 && y < settings.height - 1);
                assert!(x > 0 && x < settings.width - 1);
            }
        }
    }

    #[test]
    fn test_solve_two_programs_share_command_line() {
        let zigzag = Mask::new(
            2,
            3,
            vec![
                true, false, true, //
                true, true, false, //
            ],
        )
        .unwrap();
        let parts = vec![part(true, 0, zigzag)];
        let on_line = Constraint {
            on_command_line: Tristate::Yes,
            ..Constraint::default()
        };
        let requirements = vec![requirement(0, on_line), requirement(0, on_line)];
        let settings = GridSettings {
            height: 7,
            width: 7,
            has_oob: true,
            command_line_row: 3,
        };

        let solutions = solve(
            parts.clone(),
            requirements.clone(),
            settings,
            vec![false],
        )
        .take(16)
        .collect::<Vec<_>>();
        assert!(!solutions.is_empty());

        for solution in &solutions {
            let cells = place_all(&parts, &requirements, solution, settings).unwrap();

            // No overlap: both stamps landed in full.
            assert_eq!(cells.iter().filter(|c| c.is_some()).count(), 8);

            for req_idx in 0..requirements.len() {
                let owned = cells
                    .iter()
                    .enumerate()
                    .filter(|(_, owner)| **owner == Some(req_idx))
                    .map(|(i, _)| (i / settings.width, i % settings.width))
                    .collect::<Vec<_>>();
                assert_eq!(owned.len(), 4);
                assert!(owned.iter().any(|(y, _)| *y == settings.command_line_row));
                assert!(owned
                    .iter()
                    .any(|(y, x)| *y > 0
                        && *y < settings.height - 1
                        && *x > 0
                        && *x < settings.width - 1));
            }
        }
    }

    #[test]
    fn test_solve_is_restartable() {
        let zigzag = Mask::new(
            2,
            3,
            vec![
                true, false, true, //
                true, true, false, //
            ],
        )
        .unwrap();
        let parts = vec![part(true, 0, zigzag)];
        let requirements = vec![requirement(
            0,
            Constraint {
                on_command_line: Tristate::Yes,
                ..Constraint::default()
            },
        )];
        let settings = GridSettings {
            height: 7,
            width: 7,
            has_oob: false,
            command_line_row: 1,
        };

        let first = solve(
            parts.clone(),
            requirements.clone(),
            settings,
            vec![true],
        )
        .take(10)
        .collect::<Vec<_>>();
        let second = solve(parts, requirements, settings, vec![true])
            .take(10)
            .collect::<Vec<_>>();

        assert_eq!(first, second);
    }

    #[test]
    fn test_solve_same_color_contact_counts_as_bugged() {
        let bit = Mask::new(1, 1, vec![true]).unwrap();
        let unbugged_on_line = Constraint {
            on_command_line: Tristate::Yes,
            bugged: Tristate::No,
            ..Constraint::default()
        };

        // Two same-colored programs on a two-column command line would have
        // to touch, which bugs both of them.
        assert_eq!(
            solve(
                vec![part(true, 0, bit.clone())],
                vec![
                    requirement(0, unbugged_on_line),
                    requirement(0, unbugged_on_line),
                ],
                GridSettings {
                    height: 2,
                    width: 2,
                    has_oob: false,
                    command_line_row: 0,
                },
                vec![false],
            )
            .count(),
            0
        );

        // Differently colored neighbors are fine.
        assert_eq!(
            solve(
                vec![part(true, 0, bit.clone()), part(true, 1, bit)],
                vec![
                    requirement(0, unbugged_on_line),
                    requirement(1, unbugged_on_line),
                ],
                GridSettings {
                    height: 2,
                    width: 2,
                    has_oob: false,
                    command_line_row: 0,
                },
                vec![false],
            )
            .count(),
            2
        );
    }

    #[test]
    fn test_solve_no_requirements_yields_one_empty_solution() {
        let solutions = solve(
            vec![],
            vec![],
            GridSettings {
                height: 3,
                width: 3,
                has_oob: false,
                command_line_row: 1,
            },
            vec![],
        )
        .collect::<Vec<_>>();

        assert_eq!(solutions, vec![vec![]]);
    }
}
