pub mod table;

use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    ModelConfig, RawRow, Scenario, ScenarioRun, ScenarioSummary, ThresholdColumn,
    ThresholdRecord, ThresholdTable, classify, run_scenario,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliScenario {
    Ssp126,
    Ssp245,
    Ssp585,
}

impl From<CliScenario> for Scenario {
    fn from(value: CliScenario) -> Self {
        match value {
            CliScenario::Ssp126 => Scenario::Ssp126,
            CliScenario::Ssp245 => Scenario::Ssp245,
            CliScenario::Ssp585 => Scenario::Ssp585,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiScenario {
    #[serde(alias = "SSP126", alias = "ssp1-2.6")]
    Ssp126,
    #[serde(alias = "SSP245", alias = "ssp2-4.5")]
    Ssp245,
    #[serde(alias = "SSP585", alias = "ssp5-8.5")]
    Ssp585,
}

impl From<ApiScenario> for Scenario {
    fn from(value: ApiScenario) -> Self {
        match value {
            ApiScenario::Ssp126 => Scenario::Ssp126,
            ApiScenario::Ssp245 => Scenario::Ssp245,
            ApiScenario::Ssp585 => Scenario::Ssp585,
        }
    }
}

/// Physical constants, overridable for sensitivity runs.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(long, default_value_t = 5.0, help = "River levee height in m")]
    river_levee_height: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Levee long base as a multiple of its height"
    )]
    levee_width_ratio: f64,
    #[arg(
        long,
        default_value_t = 10000.0,
        help = "Seaward distance the coastline is advanced, in m"
    )]
    offshore_distance: f64,
    #[arg(
        long,
        default_value_t = 1600.0,
        help = "Sediment bulk density in kg/m3"
    )]
    sediment_bulk_density: f64,
    #[arg(long, default_value_t = 31_536_000.0)]
    seconds_per_year: f64,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, default_value = "data/raw", help = "Directory holding the scenario tables")]
    data_dir: PathBuf,
    #[arg(
        long,
        default_value = "deltas_30_{scenario}_decr.csv",
        help = "File name template; {scenario} becomes ssp126, ssp245 or ssp585"
    )]
    file_template: String,
    #[arg(long, help = "Explicit SSP1-2.6 table, overrides the template")]
    ssp126: Option<PathBuf>,
    #[arg(long, help = "Explicit SSP2-4.5 table, overrides the template")]
    ssp245: Option<PathBuf>,
    #[arg(long, help = "Explicit SSP5-8.5 table, overrides the template")]
    ssp585: Option<PathBuf>,
    #[arg(
        long = "scenario",
        value_enum,
        help = "Restrict the run to these scenarios (repeatable); defaults to all three"
    )]
    scenarios: Vec<CliScenario>,
    #[arg(long, help = "Write threshold and strategy tables here as CSV")]
    out_dir: Option<PathBuf>,
    #[arg(long, default_value_t = 5, help = "Threshold rows to print per scenario")]
    preview_rows: usize,
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

/// Everything produced for one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub run: ScenarioRun,
    pub table: ThresholdTable,
}

impl ScenarioOutcome {
    pub fn summary(&self) -> ScenarioSummary {
        self.table.summary(self.run.rejected.len())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EvaluatePayload {
    scenarios: BTreeMap<ApiScenario, Vec<serde_json::Map<String, Value>>>,
    river_levee_height: Option<f64>,
    levee_width_ratio: Option<f64>,
    offshore_distance: Option<f64>,
    sediment_bulk_density: Option<f64>,
    seconds_per_year: Option<f64>,
}

#[derive(Debug)]
struct ApiRequest {
    config: ModelConfig,
    inputs: Vec<(Scenario, Vec<RawRow>)>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RejectedResponse {
    row: usize,
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioResponse {
    scenario: Scenario,
    summary: ScenarioSummary,
    thresholds: Vec<ThresholdRecord>,
    rejected: Vec<RejectedResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateResponse {
    config: ModelConfig,
    scenarios: Vec<ScenarioResponse>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_config(args: ConfigArgs) -> Result<ModelConfig, String> {
    for (name, value) in [
        ("--river-levee-height", args.river_levee_height),
        ("--levee-width-ratio", args.levee_width_ratio),
        ("--offshore-distance", args.offshore_distance),
        ("--sediment-bulk-density", args.sediment_bulk_density),
        ("--seconds-per-year", args.seconds_per_year),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be finite"));
        }
    }
    if args.river_levee_height < 0.0 {
        return Err("--river-levee-height must be >= 0".to_string());
    }
    if args.levee_width_ratio <= 0.0 {
        return Err("--levee-width-ratio must be > 0".to_string());
    }
    if args.offshore_distance < 0.0 {
        return Err("--offshore-distance must be >= 0".to_string());
    }
    if args.sediment_bulk_density <= 0.0 {
        return Err("--sediment-bulk-density must be > 0".to_string());
    }
    if args.seconds_per_year <= 0.0 {
        return Err("--seconds-per-year must be > 0".to_string());
    }

    Ok(ModelConfig {
        river_levee_height: args.river_levee_height,
        levee_width_ratio: args.levee_width_ratio,
        offshore_distance: args.offshore_distance,
        sediment_bulk_density: args.sediment_bulk_density,
        seconds_per_year: args.seconds_per_year,
    })
}

fn default_config_args() -> ConfigArgs {
    let defaults = ModelConfig::default();
    ConfigArgs {
        river_levee_height: defaults.river_levee_height,
        levee_width_ratio: defaults.levee_width_ratio,
        offshore_distance: defaults.offshore_distance,
        sediment_bulk_density: defaults.sediment_bulk_density,
        seconds_per_year: defaults.seconds_per_year,
    }
}

/// Runs each scenario on its own blocking task; scenarios share nothing
/// but the read-only config.
pub async fn evaluate_scenarios(
    config: ModelConfig,
    inputs: Vec<(Scenario, Vec<RawRow>)>,
) -> Result<Vec<ScenarioOutcome>, String> {
    let handles = inputs
        .into_iter()
        .map(|(scenario, rows)| {
            tokio::task::spawn_blocking(move || {
                let run = run_scenario(&config, scenario, &rows);
                let table = classify(scenario, &run.results);
                ScenarioOutcome { run, table }
            })
        })
        .collect::<Vec<_>>();

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(
            handle
                .await
                .map_err(|e| format!("scenario task failed: {e}"))?,
        );
    }
    Ok(outcomes)
}

fn selected_scenarios(args: &RunArgs) -> Vec<Scenario> {
    if args.scenarios.is_empty() {
        return Scenario::ALL.to_vec();
    }
    Scenario::ALL
        .into_iter()
        .filter(|s| args.scenarios.iter().any(|&c| Scenario::from(c) == *s))
        .collect()
}

fn scenario_path(args: &RunArgs, scenario: Scenario) -> PathBuf {
    let explicit = match scenario {
        Scenario::Ssp126 => &args.ssp126,
        Scenario::Ssp245 => &args.ssp245,
        Scenario::Ssp585 => &args.ssp585,
    };
    explicit.clone().unwrap_or_else(|| {
        args.data_dir
            .join(args.file_template.replace("{scenario}", scenario.id()))
    })
}

/// Loads the scenario tables, evaluates them and prints the category
/// counts; optionally writes the tables to `--out-dir`.
pub async fn run_pipeline(args: RunArgs) -> Result<(), String> {
    let config = build_config(args.config.clone())?;

    let mut inputs = Vec::new();
    for scenario in selected_scenarios(&args) {
        let path = scenario_path(&args, scenario);
        let rows = table::read_rows(&path).map_err(|e| e.to_string())?;
        info!(scenario = scenario.id(), path = %path.display(), rows = rows.len(), "loaded scenario table");
        inputs.push((scenario, rows));
    }

    let outcomes = evaluate_scenarios(config, inputs).await?;
    print_report(&outcomes, args.preview_rows)?;

    if let Some(dir) = &args.out_dir {
        write_outputs(dir, &outcomes)?;
    }
    Ok(())
}

fn print_report(outcomes: &[ScenarioOutcome], preview_rows: usize) -> Result<(), String> {
    for outcome in outcomes {
        let preview = table::threshold_table_csv(&ThresholdTable {
            scenario: outcome.table.scenario,
            records: outcome
                .table
                .records
                .iter()
                .take(preview_rows)
                .cloned()
                .collect(),
        })
        .map_err(|e| format!("failed to format preview: {e}"))?;
        println!("{}:", outcome.table.scenario.label());
        print!("{preview}");
    }

    for outcome in outcomes {
        let summary = outcome.summary();
        let label = summary.scenario.label();
        println!("{label} - Advance Known Max: {}", summary.adv_current_known);
        println!("{label} - Advance Simple: {}", summary.adv_simple);
        println!("{label} - Advance Innovative: {}", summary.adv_innovative);
        if summary.rejected_rows > 0 {
            println!("{label} - Rejected rows: {}", summary.rejected_rows);
        }
    }
    Ok(())
}

fn write_outputs(dir: &Path, outcomes: &[ScenarioOutcome]) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("failed to create {}: {e}", dir.display()))?;
    for outcome in outcomes {
        let id = outcome.table.scenario.id();
        for (name, body) in [
            (
                format!("threshold_analysis_{id}.csv"),
                table::threshold_table_csv(&outcome.table),
            ),
            (
                format!("equation_results_{id}.csv"),
                table::strategy_results_csv(&outcome.run.results),
            ),
        ] {
            let path = dir.join(name);
            let body = body.map_err(|e| format!("failed to format {}: {e}", path.display()))?;
            fs::write(&path, body)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            info!(path = %path.display(), "wrote table");
        }
    }
    Ok(())
}

pub async fn run_http_server(args: ServeArgs) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let app = Router::new()
        .route("/api/evaluate", post(evaluate_handler))
        .route("/api/config", get(config_handler))
        .route("/api/columns", get(columns_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("delta adaptation API listening on http://{addr}");
    axum::serve(listener, app).await
}

async fn config_handler() -> Response {
    json_response(StatusCode::OK, ModelConfig::default())
}

async fn columns_handler() -> Response {
    let columns = ThresholdColumn::ALL
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>();
    json_response(StatusCode::OK, columns)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn evaluate_handler(Json(payload): Json<EvaluatePayload>) -> Response {
    evaluate_handler_impl(payload).await
}

async fn evaluate_handler_impl(payload: EvaluatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            warn!(%msg, "rejected evaluate request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match evaluate_scenarios(request.config, request.inputs).await {
        Ok(outcomes) => json_response(
            StatusCode::OK,
            build_evaluate_response(request.config, outcomes),
        ),
        Err(msg) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &msg),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<EvaluatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn api_request_from_payload(payload: EvaluatePayload) -> Result<ApiRequest, String> {
    let mut args = default_config_args();
    if let Some(v) = payload.river_levee_height {
        args.river_levee_height = v;
    }
    if let Some(v) = payload.levee_width_ratio {
        args.levee_width_ratio = v;
    }
    if let Some(v) = payload.offshore_distance {
        args.offshore_distance = v;
    }
    if let Some(v) = payload.sediment_bulk_density {
        args.sediment_bulk_density = v;
    }
    if let Some(v) = payload.seconds_per_year {
        args.seconds_per_year = v;
    }
    let config = build_config(args)?;

    if payload.scenarios.is_empty() {
        return Err("scenarios must contain at least one of ssp126, ssp245, ssp585".to_string());
    }
    let inputs = payload
        .scenarios
        .into_iter()
        .map(|(scenario, rows)| {
            let rows = rows
                .into_iter()
                .map(|cells| {
                    cells
                        .into_iter()
                        .map(|(column, value)| (column, cell_text(value)))
                        .collect::<RawRow>()
                })
                .collect();
            (Scenario::from(scenario), rows)
        })
        .collect();

    Ok(ApiRequest { config, inputs })
}

fn build_evaluate_response(config: ModelConfig, outcomes: Vec<ScenarioOutcome>) -> EvaluateResponse {
    EvaluateResponse {
        config,
        scenarios: outcomes
            .into_iter()
            .map(|outcome| ScenarioResponse {
                scenario: outcome.table.scenario,
                summary: outcome.summary(),
                rejected: outcome
                    .run
                    .rejected
                    .iter()
                    .map(|r| RejectedResponse {
                        row: r.index,
                        error: r.error.to_string(),
                    })
                    .collect(),
                thresholds: outcome.table.records,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InputField;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_run_args() -> RunArgs {
        RunArgs {
            data_dir: PathBuf::from("data/raw"),
            file_template: "deltas_30_{scenario}_decr.csv".to_string(),
            ssp126: None,
            ssp245: None,
            ssp585: None,
            scenarios: Vec::new(),
            out_dir: None,
            preview_rows: 5,
            config: default_config_args(),
        }
    }

    fn row_json(basin_id: &str) -> String {
        format!(
            r#"{{
              "BasinID2": "{basin_id}",
              "SLR": 0.5, "VLM_value": 0.0, "Bathymetric_Slope_from_RM_Sbr": 0.001,
              "Coastline_length": 10000, "Discharge_dist": 1000, "QRiver_dist": 16000,
              "Storm_surge_height": 1.5, "Wave_Height_Hw": 1.0,
              "Total_river_width": 3000, "Total_river_length": 50000,
              "inundation_depth": 0.8, "urban_inundated_area": 2000000,
              "acc_raise_0p5": 0.5, "acc_raise_1": 1, "acc_raise_10": 10,
              "whole_urban_inundated_volume": 3000000, "total_inundation_volume": 90000000,
              "urban_inundated_volume": 1600000,
              "urban_non_inundated_area": 1000000, "non_inundated_area": 400000000
            }}"#
        )
    }

    #[test]
    fn build_config_defaults_match_model_defaults() {
        let config = build_config(default_config_args()).expect("valid config");
        assert_eq!(config, ModelConfig::default());
        assert_approx(config.seconds_per_year, 31_536_000.0);
    }

    #[test]
    fn build_config_rejects_non_positive_density() {
        let mut args = default_config_args();
        args.sediment_bulk_density = 0.0;
        let err = build_config(args).expect_err("must reject zero density");
        assert!(err.contains("--sediment-bulk-density"));
    }

    #[test]
    fn build_config_rejects_non_finite_values() {
        let mut args = default_config_args();
        args.offshore_distance = f64::NAN;
        let err = build_config(args).expect_err("must reject NaN distance");
        assert!(err.contains("--offshore-distance"));
    }

    #[test]
    fn build_config_rejects_negative_levee_height() {
        let mut args = default_config_args();
        args.river_levee_height = -1.0;
        let err = build_config(args).expect_err("must reject negative height");
        assert!(err.contains("--river-levee-height"));
    }

    #[test]
    fn scenario_path_uses_template_unless_overridden() {
        let mut args = sample_run_args();
        assert_eq!(
            scenario_path(&args, Scenario::Ssp245),
            PathBuf::from("data/raw/deltas_30_ssp245_decr.csv")
        );
        args.ssp585 = Some(PathBuf::from("/tmp/high.csv"));
        assert_eq!(
            scenario_path(&args, Scenario::Ssp585),
            PathBuf::from("/tmp/high.csv")
        );
    }

    #[test]
    fn selected_scenarios_keep_canonical_order() {
        let mut args = sample_run_args();
        assert_eq!(selected_scenarios(&args), Scenario::ALL.to_vec());
        args.scenarios = vec![CliScenario::Ssp585, CliScenario::Ssp126];
        assert_eq!(
            selected_scenarios(&args),
            vec![Scenario::Ssp126, Scenario::Ssp585]
        );
    }

    #[test]
    fn api_request_from_json_parses_rows_and_overrides() {
        let json = format!(
            r#"{{
              "offshoreDistance": 5000,
              "leveeWidthRatio": 4,
              "scenarios": {{ "ssp585": [{}], "SSP126": [{}] }}
            }}"#,
            row_json("1"),
            row_json("2")
        );
        let request = api_request_from_json(&json).expect("json should parse");

        assert_approx(request.config.offshore_distance, 5_000.0);
        assert_approx(request.config.levee_width_ratio, 4.0);
        assert_approx(request.config.sediment_bulk_density, 1_600.0);
        assert_eq!(request.inputs.len(), 2);
        assert_eq!(request.inputs[0].0, Scenario::Ssp126);
        assert_eq!(request.inputs[1].0, Scenario::Ssp585);
        let row = &request.inputs[1].1[0];
        assert_eq!(row.basin_id(), Some("1"));
        assert_eq!(row.get(InputField::RiverDischarge.column()), Some("1000"));
    }

    #[test]
    fn api_request_rejects_empty_scenarios_and_bad_config() {
        let err = api_request_from_json("{}").expect_err("no scenarios");
        assert!(err.contains("scenarios"));

        let json = format!(
            r#"{{ "sedimentBulkDensity": -1, "scenarios": {{ "ssp245": [{}] }} }}"#,
            row_json("1")
        );
        let err = api_request_from_json(&json).expect_err("bad density");
        assert!(err.contains("--sediment-bulk-density"));
    }

    #[tokio::test]
    async fn evaluate_scenarios_isolates_bad_rows_and_classifies() {
        let json = format!(
            r#"{{ "scenarios": {{ "ssp245": [{}, {{ "BasinID2": "x", "SLR": null }}, {}] }} }}"#,
            row_json("1"),
            row_json("1")
        );
        let request = api_request_from_json(&json).expect("json should parse");
        let outcomes = evaluate_scenarios(request.config, request.inputs)
            .await
            .expect("tasks complete");

        assert_eq!(outcomes.len(), 1);
        let outcome = &outcomes[0];
        assert_eq!(outcome.run.rejected.len(), 1);
        assert_eq!(outcome.run.rejected[0].index, 1);
        assert_eq!(outcome.table.len(), 1);

        let summary = outcome.summary();
        assert_eq!(summary.adv_current_known, 1);
        assert_eq!(summary.rejected_rows, 1);
    }

    #[tokio::test]
    async fn evaluate_response_serialization_contains_expected_fields() {
        let json = format!(r#"{{ "scenarios": {{ "ssp126": [{}] }} }}"#, row_json("1"));
        let request = api_request_from_json(&json).expect("json should parse");
        let config = request.config;
        let outcomes = evaluate_scenarios(config, request.inputs)
            .await
            .expect("tasks complete");
        let response = build_evaluate_response(config, outcomes);
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"config\""));
        assert!(json.contains("\"offshoreDistance\""));
        assert!(json.contains("\"scenario\":\"ssp126\""));
        assert!(json.contains("\"advCurrentKnown\":1"));
        assert!(json.contains("\"columnSums\""));
        assert!(json.contains("\"adv_CurrentKnown\":1"));
        assert!(json.contains("\"rejected\":[]"));
    }

    #[tokio::test]
    async fn evaluate_handler_returns_bad_request_for_invalid_payload() {
        let response = evaluate_handler_impl(EvaluatePayload::default()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&header::HeaderValue::from_static("no-store"))
        );
    }

    #[tokio::test]
    async fn run_pipeline_writes_tables_for_selected_scenario() {
        let dir = std::env::temp_dir().join(format!("delta-adapt-run-{}", std::process::id()));
        let out = dir.join("out");
        fs::create_dir_all(&dir).expect("temp dir");

        let header = InputField::ALL
            .iter()
            .map(|f| f.column())
            .collect::<Vec<_>>()
            .join(",");
        let body = format!(
            "{header}\n1,0.5,0,0.001,10000,1000,16000,1.5,1,3000,50000,0.8,2000000,0.5,1,10,3000000,90000000,1600000,1000000,400000000\n"
        );
        fs::write(dir.join("deltas_30_ssp126_decr.csv"), body).expect("write input");

        let mut args = sample_run_args();
        args.data_dir = dir.clone();
        args.scenarios = vec![CliScenario::Ssp126];
        args.out_dir = Some(out.clone());
        run_pipeline(args).await.expect("pipeline runs");

        let thresholds =
            fs::read_to_string(out.join("threshold_analysis_ssp126.csv")).expect("threshold csv");
        assert_eq!(thresholds.lines().count(), 2);
        let strategy =
            fs::read_to_string(out.join("equation_results_ssp126.csv")).expect("strategy csv");
        assert_eq!(strategy.lines().count(), 4);

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn run_pipeline_reports_missing_table() {
        let mut args = sample_run_args();
        args.data_dir = PathBuf::from("no/such/dir");
        let err = run_pipeline(args).await.expect_err("missing input");
        assert!(err.contains("no/such/dir"));
    }
}
