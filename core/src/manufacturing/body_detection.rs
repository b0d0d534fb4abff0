//! Connected-body detection across adjacent layers.

use super::layer_stack;
use crate::error::LaminateResult;
use crate::geometry::{PlanarRegion, Point};
use crate::laminate::Laminate;
use crate::layers::{LayerDefinition, LayerId};
use std::collections::VecDeque;
use tracing::debug;

struct Fragment {
    layer: LayerId,
    index: usize,
    region: PlanarRegion,
}

/// Split a laminate into its physically connected bodies.
///
/// Every polygon on every layer is a fragment. Two fragments are connected
/// when they sit on adjacent layers and their regions intersect; bodies are
/// the connected components of that relation, found by breadth-first search.
/// The result is sorted by each body's minimum corner, x first then y.
pub fn find_bodies(laminate: &Laminate, def: &LayerDefinition) -> LaminateResult<Vec<Laminate>> {
    let mut fragments = Vec::new();
    for (index, (layer, region)) in layer_stack(laminate, def)?.into_iter().enumerate() {
        for part in region.parts() {
            if !part.is_empty() {
                fragments.push(Fragment { layer, index, region: part });
            }
        }
    }

    let mut visited = vec![false; fragments.len()];
    let mut bodies: Vec<(Point, Laminate)> = Vec::new();

    for start in 0..fragments.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        let mut members = Vec::new();

        while let Some(current) = queue.pop_front() {
            members.push(current);
            let here = &fragments[current];
            for (other, candidate) in fragments.iter().enumerate() {
                if visited[other] || here.index.abs_diff(candidate.index) != 1 {
                    continue;
                }
                if here.region.intersects(&candidate.region) {
                    visited[other] = true;
                    queue.push_back(other);
                }
            }
        }

        let mut body = Laminate::new(def);
        let mut corner = [f64::INFINITY, f64::INFINITY];
        for &member in &members {
            let fragment = &fragments[member];
            if let Some(min) = fragment.region.min_corner() {
                corner = [corner[0].min(min[0]), corner[1].min(min[1])];
            }
            body.insert_layer_geometry(fragment.layer, std::slice::from_ref(&fragment.region))?;
        }
        bodies.push((corner, body));
    }

    bodies.sort_by(|(a, _), (b, _)| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    debug!("Found {} bodies in {} fragments", bodies.len(), fragments.len());
    Ok(bodies.into_iter().map(|(_, body)| body).collect())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    fn disc(x: f64, y: f64, r: f64) -> PlanarRegion {
        PlanarRegion::disc([x, y], r, 64).unwrap()
    }

    #[test]
    fn test_overlapping_discs_on_adjacent_layers_form_one_body() {
        let def = stack(2);
        let ids = def.ids();
        let mut lam = Laminate::new(&def);
        lam.replace_layer_geometry(ids[0], disc(0.0, 0.0, 2.0)).unwrap();
        lam.replace_layer_geometry(ids[1], disc(1.5, 0.0, 2.0)).unwrap();

        let bodies = find_bodies(&lam, &def).unwrap();
        assert_eq!(bodies.len(), 1);
        assert!(!bodies[0].layer_geometry(ids[0]).unwrap().is_empty());
        assert!(!bodies[0].layer_geometry(ids[1]).unwrap().is_empty());
    }

    #[test]
    fn test_separate_discs_on_one_layer_are_two_bodies_in_corner_order() {
        let def = stack(1);
        let id = def.ids()[0];
        let mut lam = Laminate::new(&def);
        let right = disc(10.0, 0.0, 1.0);
        let left = disc(0.0, 5.0, 1.0);
        lam.replace_layer_geometry(id, right.union(&left)).unwrap();

        let bodies = find_bodies(&lam, &def).unwrap();
        assert_eq!(bodies.len(), 2);
        let first = bodies[0].layer_geometry(id).unwrap().min_corner().unwrap();
        let second = bodies[1].layer_geometry(id).unwrap().min_corner().unwrap();
        assert!(first[0] < second[0]);
        assert!((first[0] - -1.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_position_non_adjacent_layers_are_separate() {
        let def = stack(3);
        let ids = def.ids();
        let mut lam = Laminate::new(&def);
        lam.replace_layer_geometry(ids[0], rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        lam.replace_layer_geometry(ids[2], rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert_eq!(find_bodies(&lam, &def).unwrap().len(), 2);
    }

    #[test]
    fn test_bridge_through_middle_layer() {
        let def = stack(3);
        let ids = def.ids();
        let mut lam = Laminate::new(&def);
        lam.replace_layer_geometry(ids[0], rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        lam.replace_layer_geometry(ids[1], rect(0.5, 0.0, 1.5, 1.0)).unwrap();
        lam.replace_layer_geometry(ids[2], rect(1.0, 0.0, 2.0, 1.0)).unwrap();
        assert_eq!(find_bodies(&lam, &def).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_laminate_has_no_bodies() {
        let def = stack(2);
        assert!(find_bodies(&Laminate::new(&def), &def).unwrap().is_empty());
    }
}
