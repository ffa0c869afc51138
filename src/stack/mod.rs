//! Image stacks and navigation geometry.
//!
//! `ImageStack` is a borrowed view of a batch of same-shaped intensity images
//! stored contiguously in a flat buffer, addressed by a flattened navigation
//! index. The navigation grid itself (0, 1 or 2 dimensions) is described by
//! `NavShape`; the physical step sizes of that grid, used to build spatial
//! coordinate arrays for result maps, live in `NavCalibration`.

use crate::util::{DictIndexError, DictIndexResult};

/// Logical grid of pattern positions over which images vary.
///
/// Navigation dimensions above two are unrepresentable by construction;
/// collaborator metadata claiming more is rejected by [`NavShape::from_dims`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavShape {
    /// A single image with no navigation axis.
    Point,
    /// A 1-D chain of images.
    Line(usize),
    /// A 2-D scan grid, row-major.
    Grid { rows: usize, cols: usize },
}

impl NavShape {
    /// Builds a navigation shape from a collaborator-supplied dimension list.
    pub fn from_dims(dims: &[usize]) -> DictIndexResult<Self> {
        match *dims {
            [] => Ok(Self::Point),
            [n] => Ok(Self::Line(n)),
            [rows, cols] => Ok(Self::Grid { rows, cols }),
            _ => Err(DictIndexError::InvalidNavigationDimension { ndim: dims.len() }),
        }
    }

    /// Returns the number of navigation positions.
    pub fn len(&self) -> usize {
        match *self {
            Self::Point => 1,
            Self::Line(n) => n,
            Self::Grid { rows, cols } => rows * cols,
        }
    }

    /// Returns true if the grid holds no positions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of navigation dimensions (0, 1 or 2).
    pub fn ndim(&self) -> usize {
        match self {
            Self::Point => 0,
            Self::Line(_) => 1,
            Self::Grid { .. } => 2,
        }
    }

    /// Number of axes beyond the two image axes once navigation is collapsed
    /// to one flat dimension.
    pub(crate) fn extra_ndim(&self) -> usize {
        match self {
            Self::Point => 0,
            _ => 1,
        }
    }
}

/// Physical calibration of the navigation grid.
///
/// Step sizes and origin are in the scan unit of the acquisition; result maps
/// carry the derived coordinate arrays so downstream consumers can plot them.
#[derive(Clone, Debug, PartialEq)]
pub struct NavCalibration {
    /// Step size along the fast (x) axis.
    pub dx: f32,
    /// Step size along the slow (y) axis.
    pub dy: f32,
    /// Origin of the x axis.
    pub x0: f32,
    /// Origin of the y axis.
    pub y0: f32,
    /// Scan unit label, e.g. "um".
    pub scan_unit: Option<String>,
}

impl Default for NavCalibration {
    fn default() -> Self {
        Self {
            dx: 1.0,
            dy: 1.0,
            x0: 0.0,
            y0: 0.0,
            scan_unit: None,
        }
    }
}

impl NavCalibration {
    /// Builds per-position x and y coordinate arrays for a navigation shape.
    ///
    /// A `Point` grid has no coordinates, a `Line` only x, a `Grid` both,
    /// flattened row-major to match the flattened navigation index.
    pub fn spatial_arrays(&self, nav: NavShape) -> (Option<Vec<f32>>, Option<Vec<f32>>) {
        match nav {
            NavShape::Point => (None, None),
            NavShape::Line(n) => {
                let x = (0..n).map(|i| self.x0 + i as f32 * self.dx).collect();
                (Some(x), None)
            }
            NavShape::Grid { rows, cols } => {
                let mut x = Vec::with_capacity(rows * cols);
                let mut y = Vec::with_capacity(rows * cols);
                for r in 0..rows {
                    for c in 0..cols {
                        x.push(self.x0 + c as f32 * self.dx);
                        y.push(self.y0 + r as f32 * self.dy);
                    }
                }
                (Some(x), Some(y))
            }
        }
    }
}

/// Borrowed stack of same-shaped images over a flat buffer.
#[derive(Copy, Clone)]
pub struct ImageStack<'a> {
    data: &'a [f32],
    nav: NavShape,
    rows: usize,
    cols: usize,
}

impl<'a> ImageStack<'a> {
    /// Creates a stack view, validating the buffer against the geometry.
    pub fn new(
        data: &'a [f32],
        nav: NavShape,
        rows: usize,
        cols: usize,
    ) -> DictIndexResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(DictIndexError::InvalidDimensions { rows, cols });
        }
        let needed = nav
            .len()
            .checked_mul(rows)
            .and_then(|v| v.checked_mul(cols))
            .ok_or(DictIndexError::InvalidDimensions { rows, cols })?;
        if data.len() < needed {
            return Err(DictIndexError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            nav,
            rows,
            cols,
        })
    }

    /// Creates a view of a single image with no navigation axis.
    pub fn single(data: &'a [f32], rows: usize, cols: usize) -> DictIndexResult<Self> {
        Self::new(data, NavShape::Point, rows, cols)
    }

    /// Returns the navigation shape.
    pub fn nav(&self) -> NavShape {
        self.nav
    }

    /// Returns the flattened number of images.
    pub fn nav_len(&self) -> usize {
        self.nav.len()
    }

    /// Returns the image shape as (rows, cols).
    pub fn image_shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the number of pixels per image.
    pub fn pixels(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns the flattened pixels of image `i`, if within bounds.
    pub fn image(&self, i: usize) -> Option<&'a [f32]> {
        if i >= self.nav_len() {
            return None;
        }
        let px = self.pixels();
        self.data.get(i * px..(i + 1) * px)
    }

    /// Returns the exact backing slice covering all images.
    pub fn images(&self) -> &'a [f32] {
        &self.data[..self.nav_len() * self.pixels()]
    }

    /// Returns this stack as a matrix of pre-flattened row vectors.
    pub fn as_matrix(&self) -> MatrixView<'a> {
        MatrixView {
            data: self.images(),
            n: self.nav_len(),
            d: self.pixels(),
        }
    }
}

/// Borrowed matrix of `n` row vectors of length `d`.
///
/// This is what flat metric kernels consume: one value per pixel, images
/// pre-flattened, with no image geometry attached.
#[derive(Copy, Clone)]
pub struct MatrixView<'a> {
    data: &'a [f32],
    n: usize,
    d: usize,
}

impl<'a> MatrixView<'a> {
    /// Creates a matrix view, validating the buffer length.
    pub fn new(data: &'a [f32], n: usize, d: usize) -> DictIndexResult<Self> {
        let needed = n
            .checked_mul(d)
            .ok_or(DictIndexError::InvalidDimensions { rows: n, cols: d })?;
        if data.len() < needed {
            return Err(DictIndexError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { data, n, d })
    }

    /// Returns the number of row vectors.
    pub fn n_rows(&self) -> usize {
        self.n
    }

    /// Returns the row vector length.
    pub fn dim(&self) -> usize {
        self.d
    }

    /// Returns row `i`, if within bounds.
    pub fn row(&self, i: usize) -> Option<&'a [f32]> {
        if i >= self.n {
            return None;
        }
        self.data.get(i * self.d..(i + 1) * self.d)
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageStack, NavCalibration, NavShape};
    use crate::util::DictIndexError;

    #[test]
    fn nav_shape_from_dims_rejects_three_axes() {
        assert_eq!(NavShape::from_dims(&[]).unwrap(), NavShape::Point);
        assert_eq!(NavShape::from_dims(&[4]).unwrap(), NavShape::Line(4));
        assert_eq!(
            NavShape::from_dims(&[2, 3]).unwrap(),
            NavShape::Grid { rows: 2, cols: 3 }
        );
        assert_eq!(
            NavShape::from_dims(&[2, 3, 4]).err().unwrap(),
            DictIndexError::InvalidNavigationDimension { ndim: 3 }
        );
    }

    #[test]
    fn stack_rejects_short_buffer() {
        let data = vec![0.0f32; 7];
        let err = ImageStack::new(&data, NavShape::Line(2), 2, 2).err().unwrap();
        assert_eq!(err, DictIndexError::BufferTooSmall { needed: 8, got: 7 });
    }

    #[test]
    fn stack_rejects_zero_dimensions() {
        let data = vec![0.0f32; 4];
        let err = ImageStack::new(&data, NavShape::Point, 0, 2).err().unwrap();
        assert_eq!(err, DictIndexError::InvalidDimensions { rows: 0, cols: 2 });
    }

    #[test]
    fn stack_addresses_images_by_flat_index() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let stack = ImageStack::new(&data, NavShape::Line(3), 2, 2).unwrap();
        assert_eq!(stack.nav_len(), 3);
        assert_eq!(stack.image(1).unwrap(), &[4.0, 5.0, 6.0, 7.0]);
        assert!(stack.image(3).is_none());

        let m = stack.as_matrix();
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.dim(), 4);
        assert_eq!(m.row(2).unwrap(), &[8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn spatial_arrays_follow_row_major_grid() {
        let cal = NavCalibration {
            dx: 0.5,
            dy: 2.0,
            x0: 1.0,
            y0: 10.0,
            scan_unit: Some("um".to_string()),
        };
        let (x, y) = cal.spatial_arrays(NavShape::Grid { rows: 2, cols: 3 });
        assert_eq!(x.unwrap(), vec![1.0, 1.5, 2.0, 1.0, 1.5, 2.0]);
        assert_eq!(y.unwrap(), vec![10.0, 10.0, 10.0, 12.0, 12.0, 12.0]);

        let (x, y) = cal.spatial_arrays(NavShape::Point);
        assert!(x.is_none() && y.is_none());
    }
}
