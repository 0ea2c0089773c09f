mod batch;
mod classifier;
mod error;
mod evaluator;
mod models;
mod types;

pub use batch::{RejectedRow, ScenarioRun, run_scenario};
pub use classifier::{
    ColumnSum, Indicators, ScenarioSummary, ThresholdColumn, ThresholdRecord, ThresholdTable,
    classify,
};
pub use error::{LoadError, RowError};
pub use evaluator::evaluate_basin;
pub use models::{
    EMPTY_RETREAT_TARGET, NO_FLOODING_AVAILABILITY, accommodate, advance, protect_closed,
    protect_open, retreat,
};
pub use types::{
    AccommodateOutcome, AccommodationRaise, AdvanceOutcome, BasinRecord, InputField,
    InundationVolumes, LandAvailability, ModelConfig, ProtectClosedOutcome, ProtectOpenOutcome,
    RawRow, RetreatAreas, RetreatTarget, Scenario, StrategyResult, VolumeVariant,
};
