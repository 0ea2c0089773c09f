use super::types::{
    AccommodateOutcome, AccommodationRaise, AdvanceOutcome, ModelConfig, ProtectClosedOutcome,
    ProtectOpenOutcome,
};

/// Stand-in for an empty retreat target so the ratio collapses toward zero.
pub const EMPTY_RETREAT_TARGET: f64 = 1e-10;

/// Land availability reported when nothing urban floods.
pub const NO_FLOODING_AVAILABILITY: f64 = 9_999.0;

/// Reclaims land seaward over `config.offshore_distance` along the whole
/// coastline and fills it with river sediment.
pub fn advance(
    config: &ModelConfig,
    slope: f64,
    coastline: f64,
    slr: f64,
    vlm: f64,
    river_discharge: f64,
    sediment_discharge: f64,
) -> AdvanceOutcome {
    let distance = config.offshore_distance;
    let depth = slope * distance;
    let offshore_depth_incl_slr = depth + slr;

    let wedge = 0.5 * depth * distance * coastline;
    let rslr = slr - vlm;
    let sand_required = wedge + distance * rslr * coastline;

    AdvanceOutcome {
        offshore_depth_incl_slr,
        sand_required,
        pump_capacity: river_discharge,
        years_to_fill: fill_years(config, sand_required, sediment_discharge),
    }
}

/// Closes the delta with a coastal levee sized from surge plus waves.
pub fn protect_closed(
    config: &ModelConfig,
    storm_surge_height: f64,
    wave_height: f64,
    slr: f64,
    vlm: f64,
    coastline: f64,
    river_discharge: f64,
) -> ProtectClosedOutcome {
    let height = coastal_levee_height(storm_surge_height, wave_height);
    ProtectClosedOutcome {
        levee_volume: levee_volume(height, config.levee_width_ratio, coastline, slr - vlm, 1.0),
        pump_capacity: river_discharge,
    }
}

/// Leaves river mouths open: coastal levee between the mouths plus levees
/// on both river banks at the fixed river-levee height.
#[allow(clippy::too_many_arguments)]
pub fn protect_open(
    config: &ModelConfig,
    storm_surge_height: f64,
    wave_height: f64,
    slr: f64,
    vlm: f64,
    coastline: f64,
    river_width: f64,
    river_length: f64,
) -> ProtectOpenOutcome {
    let rslr = slr - vlm;
    let ratio = config.levee_width_ratio;

    let coastal = levee_volume(
        coastal_levee_height(storm_surge_height, wave_height),
        ratio,
        coastline - river_width,
        rslr,
        1.0,
    );
    let river = levee_volume(config.river_levee_height, ratio, river_length, rslr, 2.0);

    ProtectOpenOutcome {
        levee_volume: coastal + river,
        river_width,
    }
}

/// Years of sediment supply needed to raise `volume_to_fill`. The raise
/// heights are relayed untouched.
pub fn accommodate(
    config: &ModelConfig,
    raise: AccommodationRaise,
    sediment_discharge: f64,
    volume_to_fill: f64,
) -> AccommodateOutcome {
    AccommodateOutcome {
        raise,
        years_to_fill: fill_years(config, volume_to_fill, sediment_discharge),
    }
}

/// Ratio of land to retreat to over flooded urban land; above 1 means
/// there is room.
pub fn retreat(urban_flooded_area: f64, retreat_to: f64) -> f64 {
    if urban_flooded_area == 0.0 {
        return NO_FLOODING_AVAILABILITY;
    }
    let retreat_to = if retreat_to == 0.0 {
        EMPTY_RETREAT_TARGET
    } else {
        retreat_to
    };
    retreat_to / urban_flooded_area
}

fn coastal_levee_height(storm_surge_height: f64, wave_height: f64) -> f64 {
    3.0 * (storm_surge_height + wave_height)
}

// Trapezoid of bases h and h*ratio, height h, plus a slab of RSLR over the
// long base for each bank.
fn levee_volume(height: f64, ratio: f64, length: f64, rslr: f64, banks: f64) -> f64 {
    let short_base = height;
    let long_base = height * ratio;
    let trapezoid = 0.5 * (short_base + long_base) * height * length;
    trapezoid + rslr * long_base * length * banks
}

fn fill_years(config: &ModelConfig, volume: f64, sediment_discharge: f64) -> f64 {
    let volume_rate = sediment_discharge / config.sediment_bulk_density;
    volume / volume_rate / config.seconds_per_year
}
