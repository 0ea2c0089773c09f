use tracing::debug;

use super::models::{accommodate, advance, protect_closed, protect_open, retreat};
use super::types::{
    BasinRecord, LandAvailability, ModelConfig, RetreatTarget, StrategyResult, VolumeVariant,
};

/// Runs every strategy model for one basin-scenario row and fans the
/// results out to one row per accommodation volume variant.
///
/// Advance, protection and retreat depend only on the basin, so they are
/// computed once and repeated on each sub-case row.
pub fn evaluate_basin(config: &ModelConfig, record: &BasinRecord) -> Vec<StrategyResult> {
    let advance = advance(
        config,
        record.offshore_slope,
        record.coastline_length,
        record.slr,
        record.vlm,
        record.river_discharge,
        record.sediment_discharge,
    );
    let protect_closed = protect_closed(
        config,
        record.storm_surge_height,
        record.wave_height,
        record.slr,
        record.vlm,
        record.coastline_length,
        record.river_discharge,
    );
    let protect_open = protect_open(
        config,
        record.storm_surge_height,
        record.wave_height,
        record.slr,
        record.vlm,
        record.coastline_length,
        record.river_width,
        record.river_length,
    );
    let land = |target: RetreatTarget| {
        retreat(record.urban_inundated_area, record.retreat_areas.get(target))
    };
    let land_availability = LandAvailability {
        urban_non_inundated: land(RetreatTarget::UrbanNonInundated),
        non_inundated: land(RetreatTarget::NonInundated),
    };

    debug!(
        basin = %record.basin_id,
        years_adv = advance.years_to_fill,
        levee_pc = protect_closed.levee_volume,
        levee_po = protect_open.levee_volume,
        "evaluated basin"
    );

    VolumeVariant::ALL
        .iter()
        .map(|&variant| {
            let volume_to_fill = record.volumes.get(variant);
            StrategyResult {
                basin_id: record.basin_id.clone(),
                subcase: variant,
                advance,
                protect_closed,
                protect_open,
                accommodate: accommodate(
                    config,
                    record.acc_raise,
                    record.sediment_discharge,
                    volume_to_fill,
                ),
                volume_to_fill,
                land_availability,
            }
        })
        .collect()
}
