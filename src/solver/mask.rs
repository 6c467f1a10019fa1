use std::borrow::Cow;

/// The silhouette of a part as a row-major boolean grid.
///
/// A mask may be larger than the silhouette it holds; leading and trailing
/// empty rows and columns shift where the silhouette lands relative to the
/// placement position, so they are preserved. Trimming only happens when
/// canonicalizing rotations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mask {
    cells: Vec<bool>,
    height: usize,
    width: usize,
}

#[derive(thiserror::Error, Debug)]
#[error("mask of shape ({height}, {width}) cannot hold {len} cells")]
pub struct MaskShapeError {
    pub height: usize,
    pub width: usize,
    pub len: usize,
}

impl Mask {
    pub fn new(height: usize, width: usize, cells: Vec<bool>) -> Result<Self, MaskShapeError> {
        if cells.len() != height * width {
            return Err(MaskShapeError {
                height,
                width,
                len: cells.len(),
            });
        }

        Ok(Mask {
            cells,
            height,
            width,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of occupied cells.
    pub(crate) fn popcount(&self) -> usize {
        self.cells.iter().filter(|v| **v).count()
    }

    pub(crate) fn as_ndarray(&self) -> ndarray::ArrayView2<'_, bool> {
        ndarray::ArrayView2::from_shape((self.height, self.width), &self.cells).unwrap()
    }

    /// 90 degrees clockwise: transpose, then reverse every row.
    pub(crate) fn rotate90(&self) -> Self {
        let mut rotated = self.as_ndarray().t().as_standard_layout().into_owned();
        for row in rotated.rows_mut() {
            row.into_slice().unwrap().reverse();
        }

        let (height, width) = rotated.dim();
        Mask {
            cells: rotated.into_raw_vec(),
            height,
            width,
        }
    }

    pub(crate) fn rotate(&self, num: usize) -> Cow<'_, Self> {
        let mut mask = Cow::Borrowed(self);
        for _ in 0..num {
            mask = Cow::Owned(mask.rotate90());
        }
        mask
    }

    /// The smallest subarray with an occupied cell on every border row and
    /// column. Rotations of the same silhouette trim to the same mask
    /// whenever the rotation was a symmetry.
    pub(crate) fn trimmed(&self) -> Self {
        let view = self.as_ndarray();
        let (h, w) = view.dim();

        let left = (0..w)
            .find(|&x| view.column(x).iter().any(|&v| v))
            .unwrap_or(0);
        let top = (0..h)
            .find(|&y| view.row(y).iter().any(|&v| v))
            .unwrap_or(0);
        let right = (0..w)
            .rev()
            .find(|&x| view.column(x).iter().any(|&v| v))
            .unwrap_or(w - 1)
            + 1;
        let bottom = (0..h)
            .rev()
            .find(|&y| view.row(y).iter().any(|&v| v))
            .unwrap_or(h - 1)
            + 1;

        let view = view.slice(ndarray::s![top..bottom, left..right]);

        let (height, width) = view.dim();
        Mask {
            cells: view.into_owned().into_raw_vec(),
            height,
            width,
        }
    }
}
