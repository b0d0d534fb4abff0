use super::{assemble, layer_stack, sweep_down, sweep_up, RemovabilityMode};
use crate::error::LaminateResult;
use crate::laminate::Laminate;
use crate::layers::LayerDefinition;

/// Region on each layer that must stay clear for a part to be pulled out
/// of the stack in the given direction.
pub fn removability(
    laminate: &Laminate,
    def: &LayerDefinition,
    mode: RemovabilityMode,
) -> LaminateResult<Laminate> {
    let stack = layer_stack(laminate, def)?;
    let (ids, regions): (Vec<_>, Vec<_>) = stack.into_iter().unzip();

    let per_layer = match mode {
        // Lifting out the top sweeps everything beneath through the layer.
        RemovabilityMode::OneWayUp => sweep_down(&regions),
        RemovabilityMode::OneWayDown => sweep_up(&regions),
        RemovabilityMode::TwoWay => {
            let up = sweep_up(&regions);
            let down = sweep_down(&regions);
            up.iter().zip(down.iter()).map(|(u, d)| u.intersection(d)).collect()
        }
    };

    assemble(def, ids.into_iter().zip(per_layer))
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_one_way_modes_mirror() {
        let (def, lam) = stepped();
        let up = removability(&lam, &def, RemovabilityMode::OneWayUp).unwrap();
        let down = removability(&lam, &def, RemovabilityMode::OneWayDown).unwrap();
        let ids = def.ids();
        assert!((up.layer_geometry(ids[2]).unwrap().area() - 100.0).abs() < 1e-6);
        assert!((up.layer_geometry(ids[0]).unwrap().area() - 100.0).abs() < 1e-6);
        assert!((down.layer_geometry(ids[2]).unwrap().area() - 20.0).abs() < 1e-6);
        assert!((down.layer_geometry(ids[0]).unwrap().area() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_two_way_is_intersection() {
        let (def, lam) = stepped();
        let two = removability(&lam, &def, RemovabilityMode::TwoWay).unwrap();
        let up = removability(&lam, &def, RemovabilityMode::OneWayUp).unwrap();
        let down = removability(&lam, &def, RemovabilityMode::OneWayDown).unwrap();
        for id in def.ids() {
            let expected = up
                .layer_geometry(id)
                .unwrap()
                .intersection(&down.layer_geometry(id).unwrap());
            assert!((two.layer_geometry(id).unwrap().area() - expected.area()).abs() < 1e-6);
        }
    }
}
