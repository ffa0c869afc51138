//! Fusion of per-dictionary result maps into one best-of-all map.

use crate::util::{DictIndexError, DictIndexResult};
use crate::xmap::ResultMap;

/// Merges single-phase result maps over the same navigation grid into one
/// map holding, per pixel, the full ranked row of the map whose rank-0 score
/// is optimal under the given ordering convention.
///
/// Ties go to the earliest map in the input list. The merged map's phase
/// list concatenates the inputs' phases in order, so the per-pixel
/// provenance doubles as an index into it.
pub fn merge_maps(maps: &[ResultMap], greater_is_better: bool) -> DictIndexResult<ResultMap> {
    let first = maps
        .first()
        .ok_or(DictIndexError::InvalidInput("no result maps to merge"))?;
    let nav = first.nav();
    let keep_n = first.keep_n();
    for map in maps {
        if map.nav() != nav {
            return Err(DictIndexError::NavShapeMismatch {
                left: nav,
                right: map.nav(),
            });
        }
        if map.keep_n() != keep_n {
            return Err(DictIndexError::InvalidInput(
                "result maps must share keep_n to be merged",
            ));
        }
        if map.phases().len() != 1 {
            return Err(DictIndexError::InvalidInput(
                "only single-phase result maps can be merged",
            ));
        }
    }

    let nav_len = nav.len();
    let mut orientations = Vec::with_capacity(nav_len * keep_n);
    let mut scores = Vec::with_capacity(nav_len * keep_n);
    let mut simulation_indices = Vec::with_capacity(nav_len * keep_n);
    let mut provenance = Vec::with_capacity(nav_len);

    for px in 0..nav_len {
        let mut winner = 0usize;
        for (i, map) in maps.iter().enumerate().skip(1) {
            let best = map.best_score(px);
            let current = maps[winner].best_score(px);
            // Strict improvement only, so ties keep the earliest input.
            let improves = if greater_is_better {
                best > current
            } else {
                best < current
            };
            if improves {
                winner = i;
            }
        }
        let map = &maps[winner];
        orientations.extend_from_slice(map.orientations_at(px));
        scores.extend_from_slice(map.scores_at(px));
        simulation_indices.extend_from_slice(map.indices_at(px));
        provenance.push(winner);
    }

    let mut merged = ResultMap::new(
        nav,
        keep_n,
        orientations,
        first.phases()[0].clone(),
        scores,
        simulation_indices,
    )?
    .with_coordinates(
        first.x().map(<[f32]>::to_vec),
        first.y().map(<[f32]>::to_vec),
        first.scan_unit().map(str::to_string),
    );
    merged.set_phases(maps.iter().map(|m| m.phases()[0].clone()).collect());
    merged.set_provenance(provenance);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::merge_maps;
    use crate::dictionary::{Orientation, Phase};
    use crate::stack::NavShape;
    use crate::util::DictIndexError;
    use crate::xmap::ResultMap;

    fn map_1x1(name: &str, score: f32) -> ResultMap {
        ResultMap::new(
            NavShape::Point,
            1,
            vec![Orientation::identity()],
            Phase::new(name),
            vec![score],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn higher_best_score_wins_the_pixel() {
        let a = map_1x1("a", 0.9);
        let b = map_1x1("b", 0.95);
        let merged = merge_maps(&[a, b], true).unwrap();
        assert_eq!(merged.provenance().unwrap(), &[1]);
        assert_eq!(merged.best_score(0), 0.95);
        assert_eq!(merged.phases().len(), 2);
        assert_eq!(merged.phases()[1].name(), "b");
    }

    #[test]
    fn lower_is_better_inverts_the_winner() {
        let a = map_1x1("a", 0.9);
        let b = map_1x1("b", 0.95);
        let merged = merge_maps(&[a, b], false).unwrap();
        assert_eq!(merged.provenance().unwrap(), &[0]);
        assert_eq!(merged.best_score(0), 0.9);
    }

    #[test]
    fn ties_go_to_the_earliest_map() {
        let a = map_1x1("a", 0.5);
        let b = map_1x1("b", 0.5);
        let merged = merge_maps(&[a, b], true).unwrap();
        assert_eq!(merged.provenance().unwrap(), &[0]);
    }

    #[test]
    fn mismatching_navigation_grids_are_rejected() {
        let a = map_1x1("a", 0.5);
        let b = ResultMap::new(
            NavShape::Line(2),
            1,
            vec![Orientation::identity(); 2],
            Phase::new("b"),
            vec![0.1, 0.2],
            vec![0, 1],
        )
        .unwrap();
        let err = merge_maps(&[a, b], true).err().unwrap();
        assert_eq!(
            err,
            DictIndexError::NavShapeMismatch {
                left: NavShape::Point,
                right: NavShape::Line(2),
            }
        );
    }
}
