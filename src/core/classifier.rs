use std::collections::HashSet;

use serde::{Serialize, Serializer};

use super::types::{Scenario, StrategyResult};

const PUMP_CAPACITY_LIMITS: [f64; 3] = [1_200.0, 600.0, 12_000.0];
const ADVANCE_YEARS_LIMITS: [f64; 3] = [50.0, 100.0, 25.0];
const OFFSHORE_DEPTH_LIMITS: [f64; 3] = [30.0, 3.0, 60.0];
const BARRIER_WIDTH_LIMITS: [f64; 3] = [9_000.0, 4_500.0, 90_000.0];
const LAND_AVAILABILITY_LIMIT: f64 = 1.0;

fn flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// Per-row threshold indicators. Every field depends only on basin-level
/// outputs, so all sub-case rows of a basin produce the same value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Indicators {
    #[serde(serialize_with = "flag")]
    pub adv_1200: bool,
    #[serde(serialize_with = "flag")]
    pub adv_600: bool,
    #[serde(serialize_with = "flag")]
    pub adv_12000: bool,
    #[serde(serialize_with = "flag")]
    pub adv_number_years_50: bool,
    #[serde(serialize_with = "flag")]
    pub adv_number_years_100: bool,
    #[serde(serialize_with = "flag")]
    pub adv_number_years_25: bool,
    #[serde(serialize_with = "flag")]
    pub adv_offshore_depth_30: bool,
    #[serde(serialize_with = "flag")]
    pub adv_offshore_depth_3: bool,
    #[serde(serialize_with = "flag")]
    pub adv_offshore_depth_60: bool,
    #[serde(serialize_with = "flag")]
    pub pc_1200: bool,
    #[serde(serialize_with = "flag")]
    pub pc_600: bool,
    #[serde(serialize_with = "flag")]
    pub pc_12000: bool,
    #[serde(serialize_with = "flag")]
    pub po_9: bool,
    #[serde(serialize_with = "flag")]
    pub po_4p5: bool,
    #[serde(serialize_with = "flag")]
    pub po_90: bool,
    pub acc_raise_1: f64,
    pub acc_raise_0p5: f64,
    pub acc_raise_10: f64,
    #[serde(serialize_with = "flag")]
    pub ret_ni_area: bool,
    #[serde(serialize_with = "flag")]
    pub ret_urb_ni_area: bool,
    #[serde(serialize_with = "flag")]
    pub ret_out_delta: bool,
}

impl Indicators {
    pub fn from_result(result: &StrategyResult) -> Self {
        let below = |value: f64, limits: [f64; 3]| limits.map(|limit| value < limit);

        let [adv_1200, adv_600, adv_12000] =
            below(result.advance.pump_capacity, PUMP_CAPACITY_LIMITS);
        let [adv_number_years_50, adv_number_years_100, adv_number_years_25] =
            below(result.advance.years_to_fill, ADVANCE_YEARS_LIMITS);
        let [adv_offshore_depth_30, adv_offshore_depth_3, adv_offshore_depth_60] =
            below(result.advance.offshore_depth_incl_slr, OFFSHORE_DEPTH_LIMITS);
        let [pc_1200, pc_600, pc_12000] =
            below(result.protect_closed.pump_capacity, PUMP_CAPACITY_LIMITS);
        let [po_9, po_4p5, po_90] = below(result.protect_open.river_width, BARRIER_WIDTH_LIMITS);
        let raise = result.accommodate.raise;
        let land = result.land_availability;

        Self {
            adv_1200,
            adv_600,
            adv_12000,
            adv_number_years_50,
            adv_number_years_100,
            adv_number_years_25,
            adv_offshore_depth_30,
            adv_offshore_depth_3,
            adv_offshore_depth_60,
            pc_1200,
            pc_600,
            pc_12000,
            po_9,
            po_4p5,
            po_90,
            acc_raise_1: raise.raise_1,
            acc_raise_0p5: raise.raise_0p5,
            acc_raise_10: raise.raise_10,
            ret_ni_area: land.non_inundated > LAND_AVAILABILITY_LIMIT,
            ret_urb_ni_area: land.urban_non_inundated > LAND_AVAILABILITY_LIMIT,
            ret_out_delta: true,
        }
    }
}

/// Columns of a threshold table, in output order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ThresholdColumn {
    Adv1200,
    Adv600,
    Adv12000,
    AdvNumberYears50,
    AdvNumberYears100,
    AdvNumberYears25,
    AdvOffshoreDepth30,
    AdvOffshoreDepth3,
    AdvOffshoreDepth60,
    Pc1200,
    Pc600,
    Pc12000,
    Po9,
    Po4p5,
    Po90,
    AccRaise1,
    AccRaise0p5,
    AccRaise10,
    RetNiArea,
    RetUrbNiArea,
    RetOutDelta,
    AdvCurrentKnown,
    AdvSimple,
    AdvInnovative,
}

impl ThresholdColumn {
    pub const ALL: [ThresholdColumn; 24] = [
        ThresholdColumn::Adv1200,
        ThresholdColumn::Adv600,
        ThresholdColumn::Adv12000,
        ThresholdColumn::AdvNumberYears50,
        ThresholdColumn::AdvNumberYears100,
        ThresholdColumn::AdvNumberYears25,
        ThresholdColumn::AdvOffshoreDepth30,
        ThresholdColumn::AdvOffshoreDepth3,
        ThresholdColumn::AdvOffshoreDepth60,
        ThresholdColumn::Pc1200,
        ThresholdColumn::Pc600,
        ThresholdColumn::Pc12000,
        ThresholdColumn::Po9,
        ThresholdColumn::Po4p5,
        ThresholdColumn::Po90,
        ThresholdColumn::AccRaise1,
        ThresholdColumn::AccRaise0p5,
        ThresholdColumn::AccRaise10,
        ThresholdColumn::RetNiArea,
        ThresholdColumn::RetUrbNiArea,
        ThresholdColumn::RetOutDelta,
        ThresholdColumn::AdvCurrentKnown,
        ThresholdColumn::AdvSimple,
        ThresholdColumn::AdvInnovative,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ThresholdColumn::Adv1200 => "adv_1200",
            ThresholdColumn::Adv600 => "adv_600",
            ThresholdColumn::Adv12000 => "adv_12000",
            ThresholdColumn::AdvNumberYears50 => "adv_number_years_50",
            ThresholdColumn::AdvNumberYears100 => "adv_number_years_100",
            ThresholdColumn::AdvNumberYears25 => "adv_number_years_25",
            ThresholdColumn::AdvOffshoreDepth30 => "adv_offshore_depth_30",
            ThresholdColumn::AdvOffshoreDepth3 => "adv_offshore_depth_3",
            ThresholdColumn::AdvOffshoreDepth60 => "adv_offshore_depth_60",
            ThresholdColumn::Pc1200 => "pc_1200",
            ThresholdColumn::Pc600 => "pc_600",
            ThresholdColumn::Pc12000 => "pc_12000",
            ThresholdColumn::Po9 => "po_9",
            ThresholdColumn::Po4p5 => "po_4p5",
            ThresholdColumn::Po90 => "po_90",
            ThresholdColumn::AccRaise1 => "acc_raise_1",
            ThresholdColumn::AccRaise0p5 => "acc_raise_0p5",
            ThresholdColumn::AccRaise10 => "acc_raise_10",
            ThresholdColumn::RetNiArea => "ret_ni_area",
            ThresholdColumn::RetUrbNiArea => "ret_urb_ni_area",
            ThresholdColumn::RetOutDelta => "ret_out_delta",
            ThresholdColumn::AdvCurrentKnown => "adv_CurrentKnown",
            ThresholdColumn::AdvSimple => "adv_Simple",
            ThresholdColumn::AdvInnovative => "adv_Innovative",
        }
    }

    /// Accommodation raise heights are relayed values, not 0/1 flags.
    pub fn is_flag(self) -> bool {
        !matches!(
            self,
            ThresholdColumn::AccRaise1 | ThresholdColumn::AccRaise0p5 | ThresholdColumn::AccRaise10
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdRecord {
    #[serde(rename = "BasinID2")]
    pub basin_id: String,
    #[serde(flatten)]
    pub indicators: Indicators,
    #[serde(rename = "adv_CurrentKnown", serialize_with = "flag")]
    pub adv_current_known: bool,
    #[serde(rename = "adv_Simple", serialize_with = "flag")]
    pub adv_simple: bool,
    #[serde(rename = "adv_Innovative", serialize_with = "flag")]
    pub adv_innovative: bool,
}

impl ThresholdRecord {
    pub fn new(basin_id: String, indicators: Indicators) -> Self {
        let i = &indicators;
        let gated = |gate: bool, years: bool, depth: bool| (gate && years) || (gate && depth);
        Self {
            adv_current_known: gated(i.adv_1200, i.adv_number_years_50, i.adv_offshore_depth_30),
            adv_simple: gated(i.adv_600, i.adv_number_years_100, i.adv_offshore_depth_3),
            adv_innovative: gated(i.adv_12000, i.adv_number_years_25, i.adv_offshore_depth_60),
            basin_id,
            indicators,
        }
    }

    pub fn value(&self, column: ThresholdColumn) -> f64 {
        let i = &self.indicators;
        let bit = |b: bool| if b { 1.0 } else { 0.0 };
        match column {
            ThresholdColumn::Adv1200 => bit(i.adv_1200),
            ThresholdColumn::Adv600 => bit(i.adv_600),
            ThresholdColumn::Adv12000 => bit(i.adv_12000),
            ThresholdColumn::AdvNumberYears50 => bit(i.adv_number_years_50),
            ThresholdColumn::AdvNumberYears100 => bit(i.adv_number_years_100),
            ThresholdColumn::AdvNumberYears25 => bit(i.adv_number_years_25),
            ThresholdColumn::AdvOffshoreDepth30 => bit(i.adv_offshore_depth_30),
            ThresholdColumn::AdvOffshoreDepth3 => bit(i.adv_offshore_depth_3),
            ThresholdColumn::AdvOffshoreDepth60 => bit(i.adv_offshore_depth_60),
            ThresholdColumn::Pc1200 => bit(i.pc_1200),
            ThresholdColumn::Pc600 => bit(i.pc_600),
            ThresholdColumn::Pc12000 => bit(i.pc_12000),
            ThresholdColumn::Po9 => bit(i.po_9),
            ThresholdColumn::Po4p5 => bit(i.po_4p5),
            ThresholdColumn::Po90 => bit(i.po_90),
            ThresholdColumn::AccRaise1 => i.acc_raise_1,
            ThresholdColumn::AccRaise0p5 => i.acc_raise_0p5,
            ThresholdColumn::AccRaise10 => i.acc_raise_10,
            ThresholdColumn::RetNiArea => bit(i.ret_ni_area),
            ThresholdColumn::RetUrbNiArea => bit(i.ret_urb_ni_area),
            ThresholdColumn::RetOutDelta => bit(i.ret_out_delta),
            ThresholdColumn::AdvCurrentKnown => bit(self.adv_current_known),
            ThresholdColumn::AdvSimple => bit(self.adv_simple),
            ThresholdColumn::AdvInnovative => bit(self.adv_innovative),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    pub scenario: Scenario,
    pub records: Vec<ThresholdRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSum {
    pub column: &'static str,
    pub sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub scenario: Scenario,
    pub basins: usize,
    pub rejected_rows: usize,
    pub adv_current_known: usize,
    pub adv_simple: usize,
    pub adv_innovative: usize,
    pub column_sums: Vec<ColumnSum>,
}

impl ThresholdTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, basin_id: &str) -> Option<&ThresholdRecord> {
        self.records.iter().find(|r| r.basin_id == basin_id)
    }

    pub fn column_sum(&self, column: ThresholdColumn) -> f64 {
        self.records.iter().map(|r| r.value(column)).sum()
    }

    /// Rows whose value in `column` is non-zero.
    pub fn count(&self, column: ThresholdColumn) -> usize {
        self.records.iter().filter(|r| r.value(column) != 0.0).count()
    }

    pub fn summary(&self, rejected_rows: usize) -> ScenarioSummary {
        ScenarioSummary {
            scenario: self.scenario,
            basins: self.len(),
            rejected_rows,
            adv_current_known: self.count(ThresholdColumn::AdvCurrentKnown),
            adv_simple: self.count(ThresholdColumn::AdvSimple),
            adv_innovative: self.count(ThresholdColumn::AdvInnovative),
            column_sums: ThresholdColumn::ALL
                .iter()
                .map(|&column| ColumnSum {
                    column: column.name(),
                    sum: self.column_sum(column),
                })
                .collect(),
        }
    }
}

/// Derives indicators for every strategy row, keeps the first row of each
/// basin, then combines the advance indicators into categories.
pub fn classify(scenario: Scenario, results: &[StrategyResult]) -> ThresholdTable {
    let indicated = results
        .iter()
        .map(|r| (r.basin_id.as_str(), Indicators::from_result(r)))
        .collect::<Vec<_>>();

    let mut seen = HashSet::new();
    let records = indicated
        .into_iter()
        .filter(|(basin_id, _)| seen.insert(*basin_id))
        .map(|(basin_id, indicators)| ThresholdRecord::new(basin_id.to_string(), indicators))
        .collect();

    ThresholdTable { scenario, records }
}
