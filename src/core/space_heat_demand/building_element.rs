use crate::core::material_properties::Layer;
use crate::core::units::{vdi_angular_frequency, Orientation};
use nalgebra::{Complex, Matrix2};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tracing::warn;

/// Time constant used for the element-level impedance, in days
pub const ELEMENT_T_BT: f64 = 7.;

// Surface heat transfer coefficients, in W / (m2.K)
const ALPHA_CONV_INNER_VERTICAL: f64 = 2.7;
const ALPHA_CONV_INNER_HORIZONTAL: f64 = 1.7;
const ALPHA_RAD_INNER: f64 = 5.0;
const ALPHA_CONV_OUTER: f64 = 20.0;
const ALPHA_RAD_OUTER: f64 = 5.0;

const DEFAULT_WINDOW_A_CONV: f64 = 0.03;

/// The collection of a thermal zone an element belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElementCollection {
    OuterWalls,
    InnerWalls,
    Windows,
}

impl ElementCollection {
    pub fn label(&self) -> &'static str {
        match self {
            ElementCollection::OuterWalls => "outer walls",
            ElementCollection::InnerWalls => "inner walls",
            ElementCollection::Windows => "windows",
        }
    }
}

impl Display for ElementCollection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ElementKind {
    OuterWall,
    Rooftop,
    GroundFloor,
    Door,
    InnerWall,
    Ceiling,
    Floor,
    Window {
        /// total solar energy transmittance
        g_value: f64,
        /// convective fraction of transmitted solar radiation
        #[serde(default = "default_window_a_conv")]
        a_conv: f64,
        /// factor on the transmitted solar radiation while the shading is in use
        #[serde(default = "default_shading_g_total")]
        shading_g_total: f64,
        /// irradiance above which the shading is in use, in W/m2. Unshaded when absent.
        #[serde(default)]
        shading_max_irr: Option<f64>,
    },
}

fn default_window_a_conv() -> f64 {
    DEFAULT_WINDOW_A_CONV
}

fn default_shading_g_total() -> f64 {
    1.0
}

impl ElementKind {
    pub fn window(g_value: f64) -> Self {
        ElementKind::Window {
            g_value,
            a_conv: DEFAULT_WINDOW_A_CONV,
            shading_g_total: 1.0,
            shading_max_irr: None,
        }
    }

    pub fn collection(&self) -> ElementCollection {
        match self {
            ElementKind::OuterWall
            | ElementKind::Rooftop
            | ElementKind::GroundFloor
            | ElementKind::Door => ElementCollection::OuterWalls,
            ElementKind::InnerWall | ElementKind::Ceiling | ElementKind::Floor => {
                ElementCollection::InnerWalls
            }
            ElementKind::Window { .. } => ElementCollection::Windows,
        }
    }

    /// Whether the element exchanges heat with the outdoor environment at its outer face
    pub fn has_outer_surface(&self) -> bool {
        matches!(
            self,
            ElementKind::OuterWall
                | ElementKind::Rooftop
                | ElementKind::Door
                | ElementKind::Window { .. }
        )
    }

    /// Whether the outer surface of the element counts toward the outer-side
    /// coefficients of its collection.
    ///
    /// Doors keep outer coefficients for their own UA-value but are left out here.
    pub fn joins_outer_side(&self) -> bool {
        matches!(
            self,
            ElementKind::OuterWall | ElementKind::Rooftop | ElementKind::Window { .. }
        )
    }

    pub fn default_coefficients(&self) -> SurfaceCoefficients {
        let inner_convection = match self {
            ElementKind::Rooftop
            | ElementKind::GroundFloor
            | ElementKind::Ceiling
            | ElementKind::Floor => ALPHA_CONV_INNER_HORIZONTAL,
            _ => ALPHA_CONV_INNER_VERTICAL,
        };
        let (outer_convection, outer_radiation) = if self.has_outer_surface() {
            (Some(ALPHA_CONV_OUTER), Some(ALPHA_RAD_OUTER))
        } else {
            (None, None)
        };

        SurfaceCoefficients {
            inner_convection,
            inner_radiation: ALPHA_RAD_INNER,
            outer_convection,
            outer_radiation,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::OuterWall => "OuterWall",
            ElementKind::Rooftop => "Rooftop",
            ElementKind::GroundFloor => "GroundFloor",
            ElementKind::Door => "Door",
            ElementKind::InnerWall => "InnerWall",
            ElementKind::Ceiling => "Ceiling",
            ElementKind::Floor => "Floor",
            ElementKind::Window { .. } => "Window",
        }
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Surface heat transfer coefficients, in W / (m2.K)
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SurfaceCoefficients {
    pub inner_convection: f64,
    pub inner_radiation: f64,
    pub outer_convection: Option<f64>,
    pub outer_radiation: Option<f64>,
}

impl SurfaceCoefficients {
    fn outer(&self) -> Option<(f64, f64)> {
        match (self.outer_convection, self.outer_radiation) {
            (Some(convection), Some(radiation)) => Some((convection, radiation)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildingElement {
    pub name: String,
    kind: ElementKind,
    /// m2
    pub area: f64,
    pub orientation: Orientation,
    /// degrees from horizontal
    pub tilt: f64,
    /// ordered from the inside to the outside
    pub layers: Vec<Layer>,
    pub coefficients: SurfaceCoefficients,

    /// equivalent resistance, in K/W
    pub r1: f64,
    /// equivalent capacity, in J/K
    pub c1: f64,
    /// equivalent capacity including the outer surface resistance, in J/K
    pub c1_korr: f64,
    /// conduction resistance of all layers, in K/W
    pub r_conduc: f64,
    /// W/K
    pub ua_value: f64,
    /// W/(m2.K)
    pub u_value: f64,
    pub r_inner_conv: f64,
    pub r_inner_rad: f64,
    pub r_inner_comb: f64,
    pub r_outer_conv: f64,
    pub r_outer_rad: f64,
    pub r_outer_comb: f64,
}

impl BuildingElement {
    pub fn new(
        name: impl Into<String>,
        kind: ElementKind,
        area: f64,
        orientation: Orientation,
        tilt: f64,
        layers: Vec<Layer>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            area,
            orientation,
            tilt,
            layers,
            coefficients: kind.default_coefficients(),
            r1: 0.,
            c1: 0.,
            c1_korr: 0.,
            r_conduc: 0.,
            ua_value: 0.,
            u_value: 0.,
            r_inner_conv: 0.,
            r_inner_rad: 0.,
            r_inner_comb: 0.,
            r_outer_conv: 0.,
            r_outer_rad: 0.,
            r_outer_comb: 0.,
        }
    }

    /// Override the default surface coefficients of the element kind.
    ///
    /// Outer coefficients are dropped for kinds without an outer surface.
    pub fn with_coefficients(mut self, coefficients: SurfaceCoefficients) -> Self {
        self.coefficients = if self.kind.has_outer_surface() {
            coefficients
        } else {
            SurfaceCoefficients {
                outer_convection: None,
                outer_radiation: None,
                ..coefficients
            }
        };
        self
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn g_value(&self) -> Option<f64> {
        match self.kind {
            ElementKind::Window { g_value, .. } => Some(g_value),
            _ => None,
        }
    }

    pub fn a_conv(&self) -> Option<f64> {
        match self.kind {
            ElementKind::Window { a_conv, .. } => Some(a_conv),
            _ => None,
        }
    }

    /// Shading factor and activation irradiance. Elements without shading
    /// transmit fully and are never shaded.
    pub fn shading(&self) -> (f64, Option<f64>) {
        match self.kind {
            ElementKind::Window {
                shading_g_total,
                shading_max_irr,
                ..
            } => (shading_g_total, shading_max_irr),
            _ => (1.0, None),
        }
    }

    pub fn outermost_layer(&self) -> Option<&Layer> {
        self.layers.last()
    }

    /// Calculate the conduction resistance of the layered construction, in K/W
    fn conduction_resistance(&self) -> f64 {
        self.layers.iter().map(Layer::resistance).sum::<f64>() / self.area
    }

    /// Calculate the single resistance / single capacity equivalent of the element
    /// according to VDI 6007, from the complex transfer matrix of its layers.
    ///
    /// ## Arguments
    /// * `t_bt` - time constant of the periodic excitation, in days
    pub fn calc_equivalent_res(&mut self, t_bt: f64) {
        let omega = vdi_angular_frequency(t_bt);
        self.r_conduc = self.conduction_resistance();

        if let ElementKind::Window { .. } = self.kind {
            self.r1 = self.r_conduc;
            self.c1 = 0.;
            self.c1_korr = 0.;
            return;
        }

        if self.layers.is_empty() {
            warn!(
                "Building element '{}' has no layers, its equivalent resistance and capacity are set to zero",
                self.name
            );
            self.r1 = 0.;
            self.c1 = 0.;
            self.c1_korr = 0.;
            return;
        }

        let chain = transfer_matrix(&self.layers, omega);

        match self.kind.collection() {
            ElementCollection::OuterWalls => {
                // outer face held at a steady temperature
                let (r1, c1) = series_rc(chain[(0, 1)] / chain[(1, 1)], omega);
                self.r1 = r1 / self.area;
                self.c1 = c1 * self.area;

                self.c1_korr = match self.coefficients.outer() {
                    Some((convection, radiation)) => {
                        let corrected = chain * massless_layer(1. / (convection + radiation));
                        let (_, c1_korr) = series_rc(corrected[(0, 1)] / corrected[(1, 1)], omega);
                        c1_korr * self.area
                    }
                    None => self.c1,
                };
            }
            _ => {
                // adiabatic back face
                let (r1, c1) = series_rc(chain[(0, 0)] / chain[(1, 0)], omega);
                self.r1 = r1 / self.area;
                self.c1 = c1 * self.area;
                self.c1_korr = self.c1;
            }
        }
    }

    /// Calculate the surface resistances and the UA-value of the element
    pub fn calc_ua_value(&mut self) {
        let SurfaceCoefficients {
            inner_convection,
            inner_radiation,
            ..
        } = self.coefficients;

        self.r_conduc = self.conduction_resistance();
        self.r_inner_conv = 1. / (inner_convection * self.area);
        self.r_inner_rad = 1. / (inner_radiation * self.area);
        self.r_inner_comb = 1. / ((inner_convection + inner_radiation) * self.area);

        (self.r_outer_conv, self.r_outer_rad, self.r_outer_comb) = match self.coefficients.outer()
        {
            Some((convection, radiation)) => (
                1. / (convection * self.area),
                1. / (radiation * self.area),
                1. / ((convection + radiation) * self.area),
            ),
            None => (0., 0., 0.),
        };

        self.ua_value = 1. / (self.r_inner_comb + self.r_conduc + self.r_outer_comb);
        self.u_value = self.ua_value / self.area;
    }
}

/// Transfer matrix of a homogeneous layer per unit area, relating temperature and
/// heat flux density at its inner face to those at its outer face.
fn layer_matrix(layer: &Layer, omega: f64) -> Matrix2<Complex<f64>> {
    let resistance = layer.resistance();
    let capacity = layer.heat_capacity();
    if capacity == 0. {
        return massless_layer(resistance);
    }

    let gamma = Complex::new(0., omega * resistance * capacity).sqrt();
    let r = Complex::from(resistance);
    Matrix2::new(
        gamma.cosh(),
        r * gamma.sinh() / gamma,
        gamma * gamma.sinh() / r,
        gamma.cosh(),
    )
}

fn massless_layer(resistance: f64) -> Matrix2<Complex<f64>> {
    Matrix2::new(
        Complex::from(1.),
        Complex::from(resistance),
        Complex::from(0.),
        Complex::from(1.),
    )
}

fn transfer_matrix(layers: &[Layer], omega: f64) -> Matrix2<Complex<f64>> {
    layers
        .iter()
        .fold(Matrix2::identity(), |chain, layer| chain * layer_matrix(layer, omega))
}

/// Split an impedance into a series resistance and capacity
fn series_rc(impedance: Complex<f64>, omega: f64) -> (f64, f64) {
    (impedance.re, -1. / (omega * impedance.im))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::material_properties::Material;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    pub fn outer_wall_layers() -> Vec<Layer> {
        vec![
            Layer::new(0.015, Material::new(1400., 0.7, 1.0)),
            Layer::new(0.2, Material::new(2400., 2.1, 1.0)),
            Layer::new(0.1, Material::new(30., 0.04, 1.5)),
        ]
    }

    #[fixture]
    pub fn outer_wall(outer_wall_layers: Vec<Layer>) -> BuildingElement {
        BuildingElement::new(
            "south wall",
            ElementKind::OuterWall,
            10.5,
            Orientation::new(180).unwrap(),
            90.,
            outer_wall_layers,
        )
    }

    #[fixture]
    pub fn inner_wall() -> BuildingElement {
        BuildingElement::new(
            "partition",
            ElementKind::InnerWall,
            20.,
            Orientation::new(0).unwrap(),
            90.,
            vec![Layer::new(0.1, Material::new(2000., 1.0, 1.0))],
        )
    }

    #[rstest]
    fn should_calc_ua_value_for_outer_wall(mut outer_wall: BuildingElement) {
        outer_wall.calc_ua_value();

        assert_relative_eq!(outer_wall.r_conduc, 0.2492063492063492, max_relative = 1e-12);
        assert_relative_eq!(outer_wall.r_inner_comb, 1. / (7.7 * 10.5));
        assert_relative_eq!(outer_wall.r_outer_comb, 1. / (25. * 10.5));
        assert_relative_eq!(outer_wall.ua_value, 3.768118193540369, max_relative = 1e-12);
        assert_relative_eq!(outer_wall.u_value, 3.768118193540369 / 10.5, max_relative = 1e-12);
    }

    #[rstest]
    fn should_calc_equivalent_res_for_outer_wall(mut outer_wall: BuildingElement) {
        outer_wall.calc_equivalent_res(ELEMENT_T_BT);

        assert_relative_eq!(outer_wall.r1, 0.006100489727329862, max_relative = 1e-9);
        assert_relative_eq!(outer_wall.c1, 5201831.095670657, max_relative = 1e-9);
        assert_relative_eq!(outer_wall.c1_korr, 5202224.628546042, max_relative = 1e-9);
    }

    #[rstest]
    fn should_calc_equivalent_res_for_inner_wall(mut inner_wall: BuildingElement) {
        inner_wall.calc_equivalent_res(ELEMENT_T_BT);

        assert_relative_eq!(inner_wall.r1, 0.0016662100255512887, max_relative = 1e-9);
        assert_relative_eq!(inner_wall.c1, 3996167.7940227217, max_relative = 1e-9);
        assert_eq!(inner_wall.c1_korr, inner_wall.c1);
    }

    #[rstest]
    fn should_treat_windows_as_massless() {
        let mut window = BuildingElement::new(
            "window",
            ElementKind::window(0.6),
            2.,
            Orientation::new(90).unwrap(),
            90.,
            vec![Layer::new(0.024, Material::new(2500., 0.96, 0.84))],
        );
        window.calc_equivalent_res(ELEMENT_T_BT);
        window.calc_ua_value();

        assert_relative_eq!(window.r1, 0.0125);
        assert_eq!(window.c1, 0.);
        assert_eq!(window.g_value(), Some(0.6));
        assert_relative_eq!(window.r_outer_comb, 1. / 50.);
    }

    #[rstest]
    fn should_drop_outer_coefficients_for_ground_floor() {
        let mut ground_floor = BuildingElement::new(
            "slab",
            ElementKind::GroundFloor,
            50.,
            Orientation::GROUND,
            0.,
            vec![Layer::new(0.2, Material::new(2400., 2.1, 1.0))],
        )
        .with_coefficients(SurfaceCoefficients {
            inner_convection: 1.7,
            inner_radiation: 5.,
            outer_convection: Some(20.),
            outer_radiation: Some(5.),
        });
        ground_floor.calc_ua_value();
        ground_floor.calc_equivalent_res(ELEMENT_T_BT);

        assert_eq!(ground_floor.r_outer_comb, 0.);
        assert_relative_eq!(
            ground_floor.ua_value,
            1. / (1. / (6.7 * 50.) + 0.2 / 2.1 / 50.)
        );
        assert_eq!(ground_floor.c1_korr, ground_floor.c1);
    }

    #[rstest]
    fn should_map_kinds_to_collections_and_capabilities() {
        assert_eq!(
            ElementKind::Rooftop.collection(),
            ElementCollection::OuterWalls
        );
        assert_eq!(
            ElementKind::GroundFloor.collection(),
            ElementCollection::OuterWalls
        );
        assert_eq!(ElementKind::Ceiling.collection(), ElementCollection::InnerWalls);
        assert_eq!(
            ElementKind::window(0.5).collection(),
            ElementCollection::Windows
        );
        assert!(ElementKind::OuterWall.has_outer_surface());
        assert!(!ElementKind::GroundFloor.has_outer_surface());
        assert!(!ElementKind::Floor.has_outer_surface());
        assert!(ElementKind::Door.has_outer_surface());
        assert!(!ElementKind::Door.joins_outer_side());
        assert!(ElementKind::Rooftop.joins_outer_side());
        assert!(ElementKind::window(0.5).joins_outer_side());
        assert_eq!(ElementKind::Floor.default_coefficients().inner_convection, 1.7);
    }

    #[rstest]
    fn should_deserialize_tagged_window_kind() {
        let kind: ElementKind = serde_json::from_value(serde_json::json!({
            "type": "Window",
            "g_value": 0.5
        }))
        .unwrap();
        assert_eq!(kind, ElementKind::window(0.5));

        let shaded: ElementKind = serde_json::from_value(serde_json::json!({
            "type": "Window",
            "g_value": 0.5,
            "shading_g_total": 0.3,
            "shading_max_irr": 180.0
        }))
        .unwrap();
        assert_eq!(
            shaded,
            ElementKind::Window {
                g_value: 0.5,
                a_conv: 0.03,
                shading_g_total: 0.3,
                shading_max_irr: Some(180.),
            }
        );
    }
}
