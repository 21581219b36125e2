use crate::core::space_heat_demand::building_element::BuildingElement;
use crate::core::space_heat_demand::zone::CalculationCore;
use crate::core::units::Orientation;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Bucket {
    ua_value: f64,
    area: f64,
    /// sum of area times shading factor
    shaded_area: f64,
    /// lowest activation irradiance of the elements in the bucket
    shading_max_irr: Option<f64>,
}

impl Bucket {
    const EMPTY: Self = Self {
        ua_value: 0.,
        area: 0.,
        shaded_area: 0.,
        shading_max_irr: None,
    };

    fn add(&mut self, element: &BuildingElement) {
        let (g_total, max_irr) = element.shading();
        self.ua_value += element.ua_value;
        self.area += element.area;
        self.shaded_area += g_total * element.area;
        self.shading_max_irr = match (self.shading_max_irr, max_irr) {
            (Some(current), Some(max_irr)) => Some(current.min(max_irr)),
            (current, max_irr) => current.or(max_irr),
        };
    }

    fn shading_g_total(&self) -> f64 {
        self.shaded_area / self.area
    }
}

/// Elements grouped by their exact orientation code.
///
/// Compass buckets are kept in ascending order of azimuth, the roof bucket is
/// held back so it can be appended after them.
#[derive(Debug, Default)]
struct OrientationBuckets {
    compass: Vec<(Orientation, Bucket)>,
    roof: Option<Bucket>,
    ground: Option<Bucket>,
}

impl OrientationBuckets {
    fn from_elements(elements: &[BuildingElement]) -> Self {
        let mut by_orientation: BTreeMap<Orientation, Bucket> = BTreeMap::new();
        for element in elements {
            by_orientation
                .entry(element.orientation)
                .or_insert(Bucket::EMPTY)
                .add(element);
        }

        let mut buckets = Self::default();
        for (orientation, bucket) in by_orientation {
            if orientation.is_roof() {
                buckets.roof = Some(bucket);
            } else if orientation.is_ground() {
                buckets.ground = Some(bucket);
            } else {
                buckets.compass.push((orientation, bucket));
            }
        }
        buckets
    }

    /// Compass buckets followed by the roof bucket
    fn facades(&self) -> impl Iterator<Item = (Orientation, Bucket)> + '_ {
        self.compass
            .iter()
            .copied()
            .chain(self.roof.map(|roof| (Orientation::ROOF, roof)))
    }
}

/// Share of the envelope UA-value per orientation.
///
/// `ow` and `win` are ordered by ascending azimuth with the roof appended last.
/// Solar inputs handed to the simulator have to follow `orientations_win`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightFactors {
    pub ow: Vec<f64>,
    pub win: Vec<f64>,
    pub ground: Vec<f64>,
    pub orientations_ow: Vec<Orientation>,
    pub orientations_win: Vec<Orientation>,
    /// m2, aligned with `ow`
    pub outer_wall_areas: Vec<f64>,
    /// m2, aligned with `win`
    pub window_areas: Vec<f64>,
    /// area-weighted shading factor, aligned with `win`
    pub window_shading_g_total: Vec<f64>,
    /// lowest activation irradiance in W/m2, aligned with `win`
    pub window_shading_max_irr: Vec<Option<f64>>,
}

impl WeightFactors {
    pub fn calculate(
        outer_walls: &[BuildingElement],
        windows: &[BuildingElement],
        calculation_core: CalculationCore,
    ) -> Self {
        let ua_value_ow: f64 = outer_walls.iter().map(|wall| wall.ua_value).sum();
        let ua_value_win: f64 = windows.iter().map(|window| window.ua_value).sum();

        let (norm_ow, norm_win) = match calculation_core {
            CalculationCore::Vdi => {
                let total = ua_value_ow + ua_value_win;
                (total, total)
            }
            CalculationCore::Ebc => (ua_value_ow, ua_value_win),
        };

        let walls = OrientationBuckets::from_elements(outer_walls);
        let glazing = OrientationBuckets::from_elements(windows);

        if glazing.ground.is_some() {
            debug!("Windows facing the ground are not assigned a weight factor");
        }

        let (orientations_ow, (ow, outer_wall_areas)): (Vec<_>, (Vec<_>, Vec<_>)) = walls
            .facades()
            .map(|(orientation, bucket)| (orientation, (bucket.ua_value / norm_ow, bucket.area)))
            .unzip();
        let (orientations_win, (win, window_areas)): (Vec<_>, (Vec<_>, Vec<_>)) = glazing
            .facades()
            .map(|(orientation, bucket)| (orientation, (bucket.ua_value / norm_win, bucket.area)))
            .unzip();

        let (window_shading_g_total, window_shading_max_irr): (Vec<_>, Vec<_>) = glazing
            .facades()
            .map(|(_, bucket)| (bucket.shading_g_total(), bucket.shading_max_irr))
            .unzip();

        Self {
            ow,
            win,
            ground: walls
                .ground
                .iter()
                .map(|bucket| bucket.ua_value / norm_ow)
                .collect(),
            orientations_ow,
            orientations_win,
            outer_wall_areas,
            window_areas,
            window_shading_g_total,
            window_shading_max_irr,
        }
    }
}
