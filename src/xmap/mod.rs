//! Result maps of selected orientations and match diagnostics.
//!
//! A [`ResultMap`] is the navigation-shaped output of one indexing run: per
//! pixel, the `keep_n` best-ranked orientations with their `scores` and
//! `simulation_indices` properties, plus the phase list, spatial coordinate
//! arrays and optional `osm` confidence and provenance properties.

pub mod merge;
pub mod osm;

pub use merge::merge_maps;
pub use osm::{orientation_similarity_map, OsmConfig};

use crate::dictionary::{Orientation, Phase};
use crate::stack::NavShape;
use crate::util::{DictIndexError, DictIndexResult};

/// Navigation-shaped container of ranked orientations and match properties.
#[derive(Clone, Debug)]
pub struct ResultMap {
    nav: NavShape,
    keep_n: usize,
    orientations: Vec<Orientation>,
    phases: Vec<Phase>,
    x: Option<Vec<f32>>,
    y: Option<Vec<f32>>,
    scan_unit: Option<String>,
    scores: Vec<f32>,
    simulation_indices: Vec<usize>,
    osm: Option<Vec<f32>>,
    provenance: Option<Vec<usize>>,
}

impl ResultMap {
    /// Creates a single-phase result map from ranked match data.
    ///
    /// `orientations`, `scores` and `simulation_indices` are row-major
    /// `nav_len x keep_n` arrays, best rank first.
    pub fn new(
        nav: NavShape,
        keep_n: usize,
        orientations: Vec<Orientation>,
        phase: Phase,
        scores: Vec<f32>,
        simulation_indices: Vec<usize>,
    ) -> DictIndexResult<Self> {
        if keep_n == 0 {
            return Err(DictIndexError::InvalidInput("keep_n must be at least 1"));
        }
        let needed = nav.len() * keep_n;
        for got in [orientations.len(), scores.len(), simulation_indices.len()] {
            if got != needed {
                return Err(DictIndexError::BufferTooSmall { needed, got });
            }
        }
        Ok(Self {
            nav,
            keep_n,
            orientations,
            phases: vec![phase],
            x: None,
            y: None,
            scan_unit: None,
            scores,
            simulation_indices,
            osm: None,
            provenance: None,
        })
    }

    /// Attaches spatial coordinate arrays and the scan unit.
    pub fn with_coordinates(
        mut self,
        x: Option<Vec<f32>>,
        y: Option<Vec<f32>>,
        scan_unit: Option<String>,
    ) -> Self {
        self.x = x;
        self.y = y;
        self.scan_unit = scan_unit;
        self
    }

    pub(crate) fn set_phases(&mut self, phases: Vec<Phase>) {
        self.phases = phases;
    }

    pub(crate) fn set_provenance(&mut self, provenance: Vec<usize>) {
        self.provenance = Some(provenance);
    }

    /// Stores an orientation similarity array under the `osm` property.
    pub fn set_osm(&mut self, osm: Vec<f32>) -> DictIndexResult<()> {
        if osm.len() != self.nav.len() {
            return Err(DictIndexError::BufferTooSmall {
                needed: self.nav.len(),
                got: osm.len(),
            });
        }
        self.osm = Some(osm);
        Ok(())
    }

    /// Returns the navigation shape.
    pub fn nav(&self) -> NavShape {
        self.nav
    }

    /// Returns the number of kept ranks per pixel.
    pub fn keep_n(&self) -> usize {
        self.keep_n
    }

    /// Returns the phases present, in provenance order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Returns the x coordinate array, if the map has a navigation axis.
    pub fn x(&self) -> Option<&[f32]> {
        self.x.as_deref()
    }

    /// Returns the y coordinate array for 2-D navigation.
    pub fn y(&self) -> Option<&[f32]> {
        self.y.as_deref()
    }

    /// Returns the scan unit label.
    pub fn scan_unit(&self) -> Option<&str> {
        self.scan_unit.as_deref()
    }

    /// Returns all scores, row-major `nav_len x keep_n`.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Returns all template indices, row-major `nav_len x keep_n`.
    pub fn simulation_indices(&self) -> &[usize] {
        &self.simulation_indices
    }

    /// Returns the ranked scores for one pixel.
    pub fn scores_at(&self, nav_idx: usize) -> &[f32] {
        &self.scores[nav_idx * self.keep_n..(nav_idx + 1) * self.keep_n]
    }

    /// Returns the ranked template indices for one pixel.
    pub fn indices_at(&self, nav_idx: usize) -> &[usize] {
        &self.simulation_indices[nav_idx * self.keep_n..(nav_idx + 1) * self.keep_n]
    }

    /// Returns the ranked orientations for one pixel.
    pub fn orientations_at(&self, nav_idx: usize) -> &[Orientation] {
        &self.orientations[nav_idx * self.keep_n..(nav_idx + 1) * self.keep_n]
    }

    /// Returns the rank-0 orientation for one pixel.
    pub fn best_orientation(&self, nav_idx: usize) -> Orientation {
        self.orientations[nav_idx * self.keep_n]
    }

    /// Returns the rank-0 score for one pixel.
    pub fn best_score(&self, nav_idx: usize) -> f32 {
        self.scores[nav_idx * self.keep_n]
    }

    /// Returns the `osm` property, if computed.
    pub fn osm(&self) -> Option<&[f32]> {
        self.osm.as_deref()
    }

    /// Returns per-pixel provenance (winning input position), if merged.
    pub fn provenance(&self) -> Option<&[usize]> {
        self.provenance.as_deref()
    }
}
