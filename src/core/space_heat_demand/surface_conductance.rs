use crate::core::space_heat_demand::building_element::BuildingElement;
use tracing::debug;

/// Zone-level surface resistances and UA-value of one class of building elements.
///
/// Resistances of the individual elements are connected in parallel, UA-values
/// are summed. Only outer walls, rooftops and windows contribute to the outer
/// side, doors and ground floors do not. For an empty class the resistances are infinite and the derived
/// coefficients are NaN, which callers have to treat as undefined.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceAggregate {
    /// W/K
    pub ua_value: f64,
    /// m2
    pub area: f64,
    pub r_conv_inner: f64,
    pub r_rad_inner: f64,
    pub r_comb_inner: f64,
    pub r_conv_outer: f64,
    pub r_rad_outer: f64,
    pub r_comb_outer: f64,
    /// area of the elements contributing to the outer side, in m2
    pub area_outer: f64,
}

impl SurfaceAggregate {
    /// Combine the elements of one class whose UA-value and surface resistances
    /// have been calculated.
    pub fn from_elements(elements: &[BuildingElement]) -> Self {
        let weather_facing = || {
            elements
                .iter()
                .filter(|element| element.kind().joins_outer_side())
        };

        Self {
            ua_value: elements.iter().map(|element| element.ua_value).sum(),
            area: elements.iter().map(|element| element.area).sum(),
            r_conv_inner: parallel_resistance(elements.iter().map(|e| e.r_inner_conv)),
            r_rad_inner: parallel_resistance(elements.iter().map(|e| e.r_inner_rad)),
            r_comb_inner: parallel_resistance(elements.iter().map(|e| e.r_inner_comb)),
            r_conv_outer: parallel_resistance(weather_facing().map(|e| e.r_outer_conv)),
            r_rad_outer: parallel_resistance(weather_facing().map(|e| e.r_outer_rad)),
            r_comb_outer: parallel_resistance(weather_facing().map(|e| e.r_outer_comb)),
            area_outer: weather_facing().map(|element| element.area).sum(),
        }
    }

    pub fn alpha_conv_inner(&self) -> f64 {
        heat_transfer_coefficient(self.r_conv_inner, self.area)
    }

    pub fn alpha_rad_inner(&self) -> f64 {
        heat_transfer_coefficient(self.r_rad_inner, self.area)
    }

    pub fn alpha_comb_inner(&self) -> f64 {
        heat_transfer_coefficient(self.r_comb_inner, self.area)
    }

    pub fn alpha_conv_outer(&self) -> f64 {
        heat_transfer_coefficient(self.r_conv_outer, self.area_outer)
    }

    pub fn alpha_rad_outer(&self) -> f64 {
        heat_transfer_coefficient(self.r_rad_outer, self.area_outer)
    }

    pub fn alpha_comb_outer(&self) -> f64 {
        heat_transfer_coefficient(self.r_comb_outer, self.area_outer)
    }
}

/// Inverse of the sum of inverses. Infinite for an empty iterator.
pub fn parallel_resistance(resistances: impl Iterator<Item = f64>) -> f64 {
    1. / resistances.map(|resistance| 1. / resistance).sum::<f64>()
}

fn heat_transfer_coefficient(resistance: f64, area: f64) -> f64 {
    1. / (resistance * area)
}

/// Area-weighted mean of a window property, NaN when there is no window area.
fn area_weighted_window_property(
    windows: &[BuildingElement],
    property: impl Fn(&BuildingElement) -> Option<f64>,
) -> f64 {
    let (weighted_sum, area) = windows
        .iter()
        .filter_map(|window| property(window).map(|value| (value * window.area, window.area)))
        .fold((0., 0.), |(sum, total), (value, area)| (sum + value, total + area));

    weighted_sum / area
}

/// Area-weighted total solar energy transmittance of the windows
pub fn weighted_g_value(windows: &[BuildingElement]) -> f64 {
    let g_value = area_weighted_window_property(windows, BuildingElement::g_value);
    if g_value.is_nan() {
        debug!("Weighted g-value is undefined as no window area is defined");
    }
    g_value
}

/// Area-weighted convective fraction of the solar radiation entering through the windows
pub fn ratio_conv_rad_inner_win(windows: &[BuildingElement]) -> f64 {
    area_weighted_window_property(windows, BuildingElement::a_conv)
}

/// Radiative properties of the weather-facing opaque surfaces of a zone
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OuterSurfaceOptics {
    pub solar_absorp: f64,
    pub ir_emissivity: f64,
}

impl OuterSurfaceOptics {
    /// Area-weighted over the outermost layer of every outer wall and rooftop.
    /// Elements without layers are skipped.
    pub fn from_outer_walls(outer_walls: &[BuildingElement]) -> Self {
        let (absorp, emissivity, area) = outer_walls
            .iter()
            .filter(|wall| wall.kind().joins_outer_side())
            .filter_map(|wall| wall.outermost_layer().map(|layer| (layer, wall.area)))
            .fold((0., 0., 0.), |(absorp, emissivity, total), (layer, area)| {
                (
                    absorp + layer.material.solar_absorp * area,
                    emissivity + layer.material.ir_emissivity * area,
                    total + area,
                )
            });

        Self {
            solar_absorp: absorp / area,
            ir_emissivity: emissivity / area,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::material_properties::{Layer, Material};
    use crate::core::space_heat_demand::building_element::ElementKind;
    use crate::core::units::Orientation;
    use approx::assert_relative_eq;
    use rstest::*;

    fn concrete_element(name: &str, kind: ElementKind, area: f64, orientation: i32) -> BuildingElement {
        let mut element = BuildingElement::new(
            name,
            kind,
            area,
            Orientation::new(orientation).unwrap(),
            90.,
            vec![Layer::new(
                0.2,
                Material::new(2400., 2.1, 1.0).with_surface_properties(0.5, 0.9),
            )],
        );
        element.calc_ua_value();
        element
    }

    #[fixture]
    fn outer_walls() -> Vec<BuildingElement> {
        vec![
            concrete_element("south", ElementKind::OuterWall, 10., 180),
            concrete_element("roof", ElementKind::Rooftop, 30., -1),
            concrete_element("slab", ElementKind::GroundFloor, 40., -2),
        ]
    }

    #[fixture]
    fn windows() -> Vec<BuildingElement> {
        let mut windows = vec![
            BuildingElement::new(
                "south window",
                ElementKind::window(0.6),
                2.,
                Orientation::new(180).unwrap(),
                90.,
                vec![Layer::new(0.024, Material::new(2500., 0.96, 0.84))],
            ),
            BuildingElement::new(
                "east window",
                ElementKind::window(0.3),
                6.,
                Orientation::new(90).unwrap(),
                90.,
                vec![Layer::new(0.024, Material::new(2500., 0.96, 0.84))],
            ),
        ];
        windows.iter_mut().for_each(BuildingElement::calc_ua_value);
        windows
    }

    #[rstest]
    fn should_sum_ua_values_and_areas(outer_walls: Vec<BuildingElement>) {
        let aggregate = SurfaceAggregate::from_elements(&outer_walls);

        let expected_ua: f64 = outer_walls.iter().map(|wall| wall.ua_value).sum();
        assert_relative_eq!(aggregate.ua_value, expected_ua);
        assert_relative_eq!(aggregate.area, 80.);
    }

    #[rstest]
    fn should_exclude_ground_floor_from_outer_side(outer_walls: Vec<BuildingElement>) {
        let aggregate = SurfaceAggregate::from_elements(&outer_walls);

        assert_relative_eq!(aggregate.area_outer, 40.);
        assert_relative_eq!(aggregate.r_comb_outer, 1. / (25. * 40.));
        assert_relative_eq!(aggregate.alpha_comb_outer(), 25., max_relative = 1e-12);
        assert_relative_eq!(aggregate.alpha_conv_outer(), 20., max_relative = 1e-12);
        assert_relative_eq!(aggregate.alpha_rad_outer(), 5., max_relative = 1e-12);
    }

    #[rstest]
    fn should_combine_inner_resistances_in_parallel(outer_walls: Vec<BuildingElement>) {
        let aggregate = SurfaceAggregate::from_elements(&outer_walls);

        // vertical wall at 2.7, horizontal roof and slab at 1.7
        let conductance = 2.7 * 10. + 1.7 * 30. + 1.7 * 40.;
        assert_relative_eq!(aggregate.r_conv_inner, 1. / conductance, max_relative = 1e-12);
        assert_relative_eq!(
            aggregate.alpha_conv_inner(),
            conductance / 80.,
            max_relative = 1e-12
        );
        assert_relative_eq!(aggregate.alpha_rad_inner(), 5., max_relative = 1e-12);
    }

    #[rstest]
    fn should_leave_empty_class_undefined() {
        let aggregate = SurfaceAggregate::from_elements(&[]);

        assert_eq!(aggregate.ua_value, 0.);
        assert!(aggregate.r_comb_inner.is_infinite());
        assert!(aggregate.alpha_comb_inner().is_nan());
    }

    #[rstest]
    fn should_weight_g_value_by_area(windows: Vec<BuildingElement>) {
        assert_relative_eq!(weighted_g_value(&windows), (0.6 * 2. + 0.3 * 6.) / 8.);
        assert_relative_eq!(ratio_conv_rad_inner_win(&windows), 0.03);
        assert!(weighted_g_value(&[]).is_nan());
    }

    #[rstest]
    fn should_weight_outer_surface_optics_over_weather_facing_walls(
        outer_walls: Vec<BuildingElement>,
    ) {
        let mut walls = outer_walls;
        walls.push(BuildingElement::new(
            "bare door",
            ElementKind::Door,
            2.,
            Orientation::new(0).unwrap(),
            90.,
            vec![Layer::new(
                0.04,
                Material::new(600., 0.13, 1.6).with_surface_properties(0.9, 0.5),
            )],
        ));
        let optics = OuterSurfaceOptics::from_outer_walls(&walls);

        // the door is left out of the weighting
        assert_relative_eq!(optics.solar_absorp, 0.5);
        assert_relative_eq!(optics.ir_emissivity, 0.9);
    }

    #[rstest]
    fn should_keep_doors_out_of_outer_side() {
        let elements = vec![
            concrete_element("south", ElementKind::OuterWall, 10., 180),
            concrete_element("entrance", ElementKind::Door, 2., 180),
        ];
        let aggregate = SurfaceAggregate::from_elements(&elements);

        assert_relative_eq!(aggregate.area, 12.);
        assert_relative_eq!(aggregate.area_outer, 10.);
        assert_relative_eq!(aggregate.r_comb_outer, 1. / (25. * 10.));
        assert_relative_eq!(aggregate.alpha_comb_outer(), 25., max_relative = 1e-12);
        assert_relative_eq!(
            aggregate.ua_value,
            elements[0].ua_value + elements[1].ua_value
        );
    }

    #[rstest]
    fn should_count_windows_on_outer_side(windows: Vec<BuildingElement>) {
        let aggregate = SurfaceAggregate::from_elements(&windows);

        assert_relative_eq!(aggregate.area_outer, 8.);
        assert_relative_eq!(aggregate.alpha_comb_outer(), 25., max_relative = 1e-12);
    }
}
