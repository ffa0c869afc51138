//! Dictionaries of simulated templates with known orientations.
//!
//! A [`Dictionary`] pairs a template source (one navigation dimension) with a
//! parallel orientation sequence and a phase descriptor. Orientations and
//! phases are opaque to the engine; they are carried through to result maps
//! unchanged. [`TemplateSource`] is the seam that lets template data live out
//! of core: the matcher only ever asks for contiguous blocks.

use std::ops::Range;

use crate::stack::ImageStack;
use crate::util::{DictIndexError, DictIndexResult};

/// Opaque crystal orientation, stored as a unit quaternion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation(pub [f32; 4]);

impl Orientation {
    /// The identity orientation.
    pub fn identity() -> Self {
        Self([1.0, 0.0, 0.0, 0.0])
    }
}

/// Opaque phase descriptor attached to a dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Phase {
    name: String,
}

impl Phase {
    /// Creates a phase descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the phase name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Source of simulated template images, possibly out of core.
pub trait TemplateSource {
    /// Returns the number of templates.
    fn n_templates(&self) -> usize;

    /// Returns the template image shape as (rows, cols).
    fn image_shape(&self) -> (usize, usize);

    /// Number of axes beyond the two image axes (0 for a bare single image,
    /// 1 for a template batch).
    fn extra_ndim(&self) -> usize {
        1
    }

    /// Reads the flattened pixels of templates `range` into `out`,
    /// replacing its contents.
    fn read_block(&self, range: Range<usize>, out: &mut Vec<f32>) -> DictIndexResult<()>;
}

impl TemplateSource for ImageStack<'_> {
    fn n_templates(&self) -> usize {
        self.nav_len()
    }

    fn image_shape(&self) -> (usize, usize) {
        ImageStack::image_shape(self)
    }

    fn extra_ndim(&self) -> usize {
        self.nav().extra_ndim()
    }

    fn read_block(&self, range: Range<usize>, out: &mut Vec<f32>) -> DictIndexResult<()> {
        let px = self.pixels();
        let start = range.start * px;
        let end = range.end * px;
        let data = self
            .images()
            .get(start..end)
            .ok_or(DictIndexError::BufferTooSmall {
                needed: end,
                got: self.images().len(),
            })?;
        out.clear();
        out.extend_from_slice(data);
        Ok(())
    }
}

/// A template source plus the orientation of every template and the phase
/// the templates were simulated for.
pub struct Dictionary<S> {
    templates: S,
    orientations: Vec<Orientation>,
    phase: Phase,
}

impl<S: TemplateSource> Dictionary<S> {
    /// Creates a dictionary, validating that the orientation sequence is
    /// parallel to the template sequence.
    pub fn new(
        templates: S,
        orientations: Vec<Orientation>,
        phase: Phase,
    ) -> DictIndexResult<Self> {
        if templates.n_templates() == 0 {
            return Err(DictIndexError::InvalidInput("dictionary has no templates"));
        }
        if orientations.len() != templates.n_templates() {
            return Err(DictIndexError::OrientationCountMismatch {
                orientations: orientations.len(),
                templates: templates.n_templates(),
            });
        }
        Ok(Self {
            templates,
            orientations,
            phase,
        })
    }

    /// Returns the template source.
    pub fn templates(&self) -> &S {
        &self.templates
    }

    /// Returns the number of templates.
    pub fn len(&self) -> usize {
        self.templates.n_templates()
    }

    /// Returns true if the dictionary is empty (never, by construction).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the orientation sequence, one per template.
    pub fn orientations(&self) -> &[Orientation] {
        &self.orientations
    }

    /// Returns the phase descriptor.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }
}
