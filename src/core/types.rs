use std::collections::BTreeMap;

use serde::Serialize;

use super::error::RowError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Ssp126,
    Ssp245,
    Ssp585,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Ssp126, Scenario::Ssp245, Scenario::Ssp585];

    pub fn id(self) -> &'static str {
        match self {
            Scenario::Ssp126 => "ssp126",
            Scenario::Ssp245 => "ssp245",
            Scenario::Ssp585 => "ssp585",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scenario::Ssp126 => "SSP126",
            Scenario::Ssp245 => "SSP245",
            Scenario::Ssp585 => "SSP585",
        }
    }
}

/// Physical constants shared by every basin in a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Levee height along rivers for the open protection variant (m).
    pub river_levee_height: f64,
    /// Long base / short base of the levee trapezoid.
    pub levee_width_ratio: f64,
    /// Seaward distance the coastline is advanced (m).
    pub offshore_distance: f64,
    /// Converts sediment mass flux to volume flux (kg/m3).
    pub sediment_bulk_density: f64,
    pub seconds_per_year: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            river_levee_height: 5.0,
            levee_width_ratio: 6.0,
            offshore_distance: 10_000.0,
            sediment_bulk_density: 1_600.0,
            seconds_per_year: 365.0 * 24.0 * 3_600.0,
        }
    }
}

/// Column names of a basin-scenario input table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputField {
    BasinId,
    Slr,
    Vlm,
    OffshoreSlope,
    CoastlineLength,
    RiverDischarge,
    SedimentDischarge,
    StormSurgeHeight,
    WaveHeight,
    RiverWidth,
    RiverLength,
    InundationDepth,
    UrbanInundatedArea,
    AccRaise0p5,
    AccRaise1,
    AccRaise10,
    WholeUrbanInundatedVolume,
    TotalInundationVolume,
    UrbanInundatedVolume,
    UrbanNonInundatedArea,
    NonInundatedArea,
}

impl InputField {
    pub const ALL: [InputField; 21] = [
        InputField::BasinId,
        InputField::Slr,
        InputField::Vlm,
        InputField::OffshoreSlope,
        InputField::CoastlineLength,
        InputField::RiverDischarge,
        InputField::SedimentDischarge,
        InputField::StormSurgeHeight,
        InputField::WaveHeight,
        InputField::RiverWidth,
        InputField::RiverLength,
        InputField::InundationDepth,
        InputField::UrbanInundatedArea,
        InputField::AccRaise0p5,
        InputField::AccRaise1,
        InputField::AccRaise10,
        InputField::WholeUrbanInundatedVolume,
        InputField::TotalInundationVolume,
        InputField::UrbanInundatedVolume,
        InputField::UrbanNonInundatedArea,
        InputField::NonInundatedArea,
    ];

    pub fn column(self) -> &'static str {
        match self {
            InputField::BasinId => "BasinID2",
            InputField::Slr => "SLR",
            InputField::Vlm => "VLM_value",
            InputField::OffshoreSlope => "Bathymetric_Slope_from_RM_Sbr",
            InputField::CoastlineLength => "Coastline_length",
            InputField::RiverDischarge => "Discharge_dist",
            InputField::SedimentDischarge => "QRiver_dist",
            InputField::StormSurgeHeight => "Storm_surge_height",
            InputField::WaveHeight => "Wave_Height_Hw",
            InputField::RiverWidth => "Total_river_width",
            InputField::RiverLength => "Total_river_length",
            InputField::InundationDepth => "inundation_depth",
            InputField::UrbanInundatedArea => "urban_inundated_area",
            InputField::AccRaise0p5 => "acc_raise_0p5",
            InputField::AccRaise1 => "acc_raise_1",
            InputField::AccRaise10 => "acc_raise_10",
            InputField::WholeUrbanInundatedVolume => "whole_urban_inundated_volume",
            InputField::TotalInundationVolume => "total_inundation_volume",
            InputField::UrbanInundatedVolume => "urban_inundated_volume",
            InputField::UrbanNonInundatedArea => "urban_non_inundated_area",
            InputField::NonInundatedArea => "non_inundated_area",
        }
    }
}

/// Which inundated volume the accommodation fill time is computed for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeVariant {
    /// Urban areas raised by the mean flood depth, flooded or not.
    WholeUrbanInundated,
    /// The entire flooded area.
    TotalInundation,
    /// Only the flooded urban area.
    UrbanInundated,
}

impl VolumeVariant {
    pub const ALL: [VolumeVariant; 3] = [
        VolumeVariant::WholeUrbanInundated,
        VolumeVariant::TotalInundation,
        VolumeVariant::UrbanInundated,
    ];

    pub fn input_field(self) -> InputField {
        match self {
            VolumeVariant::WholeUrbanInundated => InputField::WholeUrbanInundatedVolume,
            VolumeVariant::TotalInundation => InputField::TotalInundationVolume,
            VolumeVariant::UrbanInundated => InputField::UrbanInundatedVolume,
        }
    }
}

/// Land a flooded urban population could move to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetreatTarget {
    UrbanNonInundated,
    NonInundated,
}

impl RetreatTarget {
    pub const ALL: [RetreatTarget; 2] = [RetreatTarget::UrbanNonInundated, RetreatTarget::NonInundated];

    pub fn availability_column(self) -> &'static str {
        match self {
            RetreatTarget::UrbanNonInundated => "urban_non_inundated_area_land_availability",
            RetreatTarget::NonInundated => "non_inundated_area_land_availability",
        }
    }
}

/// One untyped input row: column name to cell text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn remove(&mut self, column: &str) -> Option<String> {
        self.cells.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn basin_id(&self) -> Option<&str> {
        self.get(InputField::BasinId.column())
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccommodationRaise {
    #[serde(rename = "acc_raise_0p5")]
    pub raise_0p5: f64,
    #[serde(rename = "acc_raise_1")]
    pub raise_1: f64,
    #[serde(rename = "acc_raise_10")]
    pub raise_10: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InundationVolumes {
    pub whole_urban_inundated: f64,
    pub total_inundation: f64,
    pub urban_inundated: f64,
}

impl InundationVolumes {
    pub fn get(&self, variant: VolumeVariant) -> f64 {
        match variant {
            VolumeVariant::WholeUrbanInundated => self.whole_urban_inundated,
            VolumeVariant::TotalInundation => self.total_inundation,
            VolumeVariant::UrbanInundated => self.urban_inundated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetreatAreas {
    pub urban_non_inundated: f64,
    pub non_inundated: f64,
}

impl RetreatAreas {
    pub fn get(&self, target: RetreatTarget) -> f64 {
        match target {
            RetreatTarget::UrbanNonInundated => self.urban_non_inundated,
            RetreatTarget::NonInundated => self.non_inundated,
        }
    }
}

/// Validated basin-scenario input. Lengths in m, areas in m2, volumes in
/// m3, river discharge in m3/s, sediment discharge in kg/s.
#[derive(Debug, Clone, PartialEq)]
pub struct BasinRecord {
    pub basin_id: String,
    pub slr: f64,
    pub vlm: f64,
    pub offshore_slope: f64,
    pub coastline_length: f64,
    pub river_discharge: f64,
    pub sediment_discharge: f64,
    pub storm_surge_height: f64,
    pub wave_height: f64,
    pub river_width: f64,
    pub river_length: f64,
    pub inundation_depth: f64,
    pub urban_inundated_area: f64,
    pub acc_raise: AccommodationRaise,
    pub volumes: InundationVolumes,
    pub retreat_areas: RetreatAreas,
}

impl TryFrom<&RawRow> for BasinRecord {
    type Error = RowError;

    fn try_from(row: &RawRow) -> Result<Self, Self::Error> {
        let basin_id = row.basin_id().ok_or(RowError::MissingBasinId)?.to_string();
        let field = |f: InputField| parse_field(row, &basin_id, f);

        let offshore_slope = field(InputField::OffshoreSlope)?;
        if offshore_slope < 0.0 {
            return Err(RowError::Negative {
                basin_id: basin_id.clone(),
                field: InputField::OffshoreSlope.column(),
                value: offshore_slope,
            });
        }

        Ok(BasinRecord {
            slr: field(InputField::Slr)?,
            vlm: field(InputField::Vlm)?,
            offshore_slope,
            coastline_length: field(InputField::CoastlineLength)?,
            river_discharge: field(InputField::RiverDischarge)?,
            sediment_discharge: field(InputField::SedimentDischarge)?,
            storm_surge_height: field(InputField::StormSurgeHeight)?,
            wave_height: field(InputField::WaveHeight)?,
            river_width: field(InputField::RiverWidth)?,
            river_length: field(InputField::RiverLength)?,
            inundation_depth: field(InputField::InundationDepth)?,
            urban_inundated_area: field(InputField::UrbanInundatedArea)?,
            acc_raise: AccommodationRaise {
                raise_0p5: field(InputField::AccRaise0p5)?,
                raise_1: field(InputField::AccRaise1)?,
                raise_10: field(InputField::AccRaise10)?,
            },
            volumes: InundationVolumes {
                whole_urban_inundated: field(InputField::WholeUrbanInundatedVolume)?,
                total_inundation: field(InputField::TotalInundationVolume)?,
                urban_inundated: field(InputField::UrbanInundatedVolume)?,
            },
            retreat_areas: RetreatAreas {
                urban_non_inundated: field(InputField::UrbanNonInundatedArea)?,
                non_inundated: field(InputField::NonInundatedArea)?,
            },
            basin_id,
        })
    }
}

fn parse_field(row: &RawRow, basin_id: &str, field: InputField) -> Result<f64, RowError> {
    let column = field.column();
    let raw = row
        .get(column)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RowError::MissingField {
            basin_id: basin_id.to_string(),
            field: column,
        })?;
    let value = raw.parse::<f64>().map_err(|_| RowError::NonNumeric {
        basin_id: basin_id.to_string(),
        field: column,
        value: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(RowError::NonFinite {
            basin_id: basin_id.to_string(),
            field: column,
            value,
        });
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdvanceOutcome {
    pub offshore_depth_incl_slr: f64,
    pub sand_required: f64,
    pub pump_capacity: f64,
    pub years_to_fill: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProtectClosedOutcome {
    pub levee_volume: f64,
    pub pump_capacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProtectOpenOutcome {
    pub levee_volume: f64,
    /// Relayed as the storm-surge barrier span.
    pub river_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccommodateOutcome {
    pub raise: AccommodationRaise,
    pub years_to_fill: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LandAvailability {
    pub urban_non_inundated: f64,
    pub non_inundated: f64,
}

impl LandAvailability {
    pub fn get(&self, target: RetreatTarget) -> f64 {
        match target {
            RetreatTarget::UrbanNonInundated => self.urban_non_inundated,
            RetreatTarget::NonInundated => self.non_inundated,
        }
    }
}

/// One basin-scenario sub-case row. Advance and protect fields repeat
/// across the sub-cases of a basin; only the accommodation variant differs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyResult {
    pub basin_id: String,
    pub subcase: VolumeVariant,
    pub advance: AdvanceOutcome,
    pub protect_closed: ProtectClosedOutcome,
    pub protect_open: ProtectOpenOutcome,
    pub accommodate: AccommodateOutcome,
    pub volume_to_fill: f64,
    pub land_availability: LandAvailability,
}
