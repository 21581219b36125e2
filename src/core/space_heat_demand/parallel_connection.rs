//! Parallel connection of RC branches according to VDI 6007.
//!
//! Several building elements of the same class are reduced to one equivalent
//! resistance / capacity pair that reproduces their combined response to a
//! periodic excitation of angular frequency `omega`.
use crate::core::space_heat_demand::building_element::BuildingElement;

/// Default time constant for the parallel connection, in days
pub const ZONE_T_BT: f64 = 5.;

/// A single resistance (K/W) in series with a single capacity (J/K)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RcBranch {
    pub r1: f64,
    pub c1: f64,
}

impl RcBranch {
    pub fn new(r1: f64, c1: f64) -> Self {
        Self { r1, c1 }
    }
}

/// Combine two branches in parallel with the closed form of VDI 6007.
///
/// The result is not symmetric in floating point, `first` is the running
/// result of a reduction and `second` the next element.
pub fn combine_two_branches(first: RcBranch, second: RcBranch, omega: f64) -> RcBranch {
    let RcBranch { r1: r_a, c1: c_a } = first;
    let RcBranch { r1: r_b, c1: c_b } = second;
    let omega_sq = omega.powi(2);

    let denominator_r1 = (c_a + c_b).powi(2)
        + omega_sq * (r_a + r_b).powi(2) * c_a.powi(2) * c_b.powi(2);

    let r1 = (r_a * c_a.powi(2)
        + r_b * c_b.powi(2)
        + omega_sq * r_a * r_b * (r_a + r_b) * c_a.powi(2) * c_b.powi(2))
        / denominator_r1;

    let c1 = denominator_r1
        / (c_a + c_b + omega_sq * (r_a.powi(2) * c_a + r_b.powi(2) * c_b) * c_a * c_b);

    RcBranch { r1, c1 }
}

/// Reduce an ordered list of branches to one equivalent branch.
///
/// Branches are folded from left to right. Returns `None` for an empty list,
/// a single branch is passed through unchanged.
pub fn reduce_parallel(branches: &[RcBranch], omega: f64) -> Option<RcBranch> {
    let (first, rest) = branches.split_first()?;
    Some(
        rest.iter()
            .fold(*first, |running, next| combine_two_branches(running, *next, omega)),
    )
}

/// Reduce the outer walls of a zone.
///
/// A single wall keeps its corrected capacity, several walls are combined
/// from their uncorrected capacities.
pub fn reduce_outer_walls(outer_walls: &[BuildingElement], omega: f64) -> Option<RcBranch> {
    match outer_walls {
        [] => None,
        [wall] => Some(RcBranch::new(wall.r1, wall.c1_korr)),
        walls => reduce_parallel(
            &walls
                .iter()
                .map(|wall| RcBranch::new(wall.r1, wall.c1))
                .collect::<Vec<_>>(),
            omega,
        ),
    }
}

pub fn reduce_inner_walls(inner_walls: &[BuildingElement], omega: f64) -> Option<RcBranch> {
    reduce_parallel(
        &inner_walls
            .iter()
            .map(|wall| RcBranch::new(wall.r1, wall.c1))
            .collect::<Vec<_>>(),
        omega,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::space_heat_demand::building_element::ElementKind;
    use crate::core::units::{vdi_angular_frequency, Orientation};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn omega() -> f64 {
        vdi_angular_frequency(ZONE_T_BT)
    }

    #[fixture]
    fn branches() -> [RcBranch; 3] {
        [
            RcBranch::new(0.00436791293674, 1600848.94),
            RcBranch::new(0.0017362530106, 5259932.23),
            RcBranch::new(0.01, 250000.),
        ]
    }

    fn wall_with(r1: f64, c1: f64, c1_korr: f64) -> BuildingElement {
        let mut wall = BuildingElement::new(
            "wall",
            ElementKind::OuterWall,
            10.,
            Orientation::new(0).unwrap(),
            90.,
            vec![],
        );
        wall.r1 = r1;
        wall.c1 = c1;
        wall.c1_korr = c1_korr;
        wall
    }

    #[rstest]
    fn should_combine_two_branches(omega: f64, branches: [RcBranch; 3]) {
        let combined = combine_two_branches(branches[0], branches[1], omega);

        assert_relative_eq!(combined.r1, 0.001258152474209878, max_relative = 1e-6);
        assert_relative_eq!(combined.c1, 6859606.112021635, max_relative = 1e-6);
    }

    #[rstest]
    fn should_fold_left_to_right(omega: f64, branches: [RcBranch; 3]) {
        let reduced = reduce_parallel(&branches, omega).unwrap();

        assert_relative_eq!(reduced.r1, 0.001183487577903159, max_relative = 1e-6);
        assert_relative_eq!(reduced.c1, 7107691.971022033, max_relative = 1e-6);
    }

    #[rstest]
    fn should_be_associative_within_tolerance(omega: f64, branches: [RcBranch; 3]) {
        let left = reduce_parallel(&branches, omega).unwrap();
        let right = combine_two_branches(
            branches[0],
            combine_two_branches(branches[1], branches[2], omega),
            omega,
        );

        assert_relative_eq!(left.r1, right.r1, max_relative = 1e-9);
        assert_relative_eq!(left.c1, right.c1, max_relative = 1e-9);
    }

    #[rstest]
    fn should_pass_single_branch_through(omega: f64, branches: [RcBranch; 3]) {
        assert_eq!(reduce_parallel(&branches[..1], omega), Some(branches[0]));
        assert_eq!(reduce_parallel(&[], omega), None);
    }

    #[rstest]
    fn should_use_corrected_capacity_for_single_outer_wall(omega: f64) {
        let walls = [wall_with(0.004, 1.5e6, 1.6e6)];
        assert_eq!(
            reduce_outer_walls(&walls, omega),
            Some(RcBranch::new(0.004, 1.6e6))
        );
    }

    #[rstest]
    fn should_use_raw_capacity_for_several_outer_walls(omega: f64, branches: [RcBranch; 3]) {
        let walls = [
            wall_with(branches[0].r1, branches[0].c1, 1.),
            wall_with(branches[1].r1, branches[1].c1, 1.),
        ];
        let reduced = reduce_outer_walls(&walls, omega).unwrap();

        assert_relative_eq!(reduced.r1, 0.001258152474209878, max_relative = 1e-6);
        assert_relative_eq!(reduced.c1, 6859606.112021635, max_relative = 1e-6);
    }

    #[rstest]
    fn should_use_raw_capacity_for_single_inner_wall(omega: f64) {
        let mut wall = wall_with(0.002, 3e6, 9e9);
        wall.r1 = 0.002;
        assert_eq!(
            reduce_inner_walls(&[wall], omega),
            Some(RcBranch::new(0.002, 3e6))
        );
        assert_eq!(reduce_inner_walls(&[], omega), None);
    }
}
