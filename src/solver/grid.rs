use super::mask::Mask;
use super::{GridSettings, Position, Requirement};

/// One square of the customization grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Cell {
    Empty,
    /// Owned by the requirement with this index.
    Placed(usize),
    /// Corner squares when the grid carries an out-of-bounds ring.
    Forbidden,
}

/// Why a stamp was refused. The grid is untouched in either case.
#[derive(thiserror::Error, Debug)]
pub enum PlaceError {
    #[error("source clipped")]
    SourceClipped,

    #[error("destination clobbered")]
    DestinationClobbered,
}

#[derive(Clone, Debug)]
pub(crate) struct Grid {
    pub(crate) settings: GridSettings,
    pub(crate) cells: ndarray::Array2<Cell>,
}

impl Grid {
    pub(crate) fn new(settings: GridSettings) -> Self {
        let mut cells = ndarray::Array2::from_elem((settings.height, settings.width), Cell::Empty);

        if settings.has_oob {
            cells[[0, 0]] = Cell::Forbidden;
            cells[[settings.height - 1, 0]] = Cell::Forbidden;
            cells[[0, settings.width - 1]] = Cell::Forbidden;
            cells[[settings.height - 1, settings.width - 1]] = Cell::Forbidden;
        }

        Self { settings, cells }
    }

    /// Stamps `mask` with its top-left corner at `pos`, claiming every
    /// occupied cell for `req_idx`.
    ///
    /// Fails if any occupied cell would land outside the grid or on a
    /// non-empty square. Validation runs before the first write, so a failed
    /// stamp leaves the grid exactly as it was.
    pub(crate) fn place(
        &mut self,
        mask: &Mask,
        pos: Position,
        req_idx: usize,
    ) -> Result<(), PlaceError> {
        let (h, w) = self.cells.dim();

        for (y, row) in mask.as_ndarray().rows().into_iter().enumerate() {
            for (x, &v) in row.into_iter().enumerate() {
                if !v {
                    continue;
                }

                let gx = x as isize + pos.x;
                let gy = y as isize + pos.y;
                if gx < 0 || gy < 0 || gx >= w as isize || gy >= h as isize {
                    return Err(PlaceError::SourceClipped);
                }
                if self.cells[[gy as usize, gx as usize]] != Cell::Empty {
                    return Err(PlaceError::DestinationClobbered);
                }
            }
        }

        for (y, row) in mask.as_ndarray().rows().into_iter().enumerate() {
            for (x, &v) in row.into_iter().enumerate() {
                if v {
                    self.cells[[(y as isize + pos.y) as usize, (x as isize + pos.x) as usize]] =
                        Cell::Placed(req_idx);
                }
            }
        }

        Ok(())
    }

    /// Whether any cell of `req_idx` lies strictly inside the outer ring.
    pub(crate) fn covers_interior(&self, req_idx: usize) -> bool {
        let (h, w) = self.cells.dim();
        if h < 3 || w < 3 {
            return false;
        }

        self.cells
            .slice(ndarray::s![1..h - 1, 1..w - 1])
            .iter()
            .any(|cell| matches!(cell, Cell::Placed(i) if *i == req_idx))
    }

    /// Whether any cell of `req_idx` lies on the outermost ring.
    pub(crate) fn touches_outer_ring(&self, req_idx: usize) -> bool {
        let (h, w) = self.cells.dim();
        let owned = |cell: &Cell| matches!(cell, Cell::Placed(i) if *i == req_idx);

        self.cells.row(0).iter().any(owned)
            || self.cells.row(h - 1).iter().any(owned)
            || self.cells.column(0).iter().any(owned)
            || self.cells.column(w - 1).iter().any(owned)
    }

    pub(crate) fn touches_row(&self, row: usize, req_idx: usize) -> bool {
        self.cells
            .row(row)
            .iter()
            .any(|cell| matches!(cell, Cell::Placed(i) if *i == req_idx))
    }

    /// The part-identity projection of the grid, one byte per cell in
    /// row-major order: the low byte of the owning requirement's part index,
    /// or 0xff for a sentinel. Two partial grids that only permute
    /// requirements of the same part project identically.
    pub(crate) fn part_fingerprint(&self, requirements: &[Requirement]) -> Vec<u8> {
        self.cells
            .iter()
            .map(|cell| match cell {
                Cell::Placed(req_idx) => requirements[*req_idx].part_index as u8,
                Cell::Empty | Cell::Forbidden => u8::MAX,
            })
            .collect()
    }

    /// Row-major per-cell ownership: the occupying requirement index, or
    /// `None` for empty and forbidden squares.
    pub(crate) fn into_ownership(self) -> Vec<Option<usize>> {
        self.cells
            .into_iter()
            .map(|cell| match cell {
                Cell::Placed(req_idx) => Some(req_idx),
                Cell::Empty | Cell::Forbidden => None,
            })
            .collect()
    }
}
