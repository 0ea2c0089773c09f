//! Delimited-text boundary: scenario input tables in, threshold and strategy
//! tables out.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::core::{
    InputField, LoadError, RawRow, RetreatTarget, StrategyResult, ThresholdColumn, ThresholdTable,
};

pub fn read_rows(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let source = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: source.clone(),
        source: e,
    })?;
    parse_rows(&text, &source)
}

fn csv_error(source: &str, err: csv::Error) -> LoadError {
    if let csv::ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = err.kind()
    {
        return LoadError::RaggedRow {
            path: source.to_string(),
            line: pos.as_ref().map_or(0, |p| p.line()),
            expected: *expected_len,
            found: *len,
        };
    }
    LoadError::Csv {
        path: source.to_string(),
        source: err,
    }
}

/// Parses comma-separated text with a header row into rows keyed by column
/// name. Header names must be unique.
pub fn parse_rows(text: &str, source: &str) -> Result<Vec<RawRow>, LoadError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let columns = reader
        .headers()
        .map_err(|e| csv_error(source, e))?
        .iter()
        .map(|c| c.trim().to_string())
        .collect::<Vec<_>>();
    if columns.is_empty() {
        return Err(LoadError::MissingHeader {
            path: source.to_string(),
        });
    }
    let mut seen = HashSet::new();
    if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
        return Err(LoadError::DuplicateColumn {
            path: source.to_string(),
            column: dup.clone(),
        });
    }

    reader
        .records()
        .map(|record| -> Result<RawRow, LoadError> {
            let record = record.map_err(|e| csv_error(source, e))?;
            Ok(columns.iter().cloned().zip(record.iter()).collect::<RawRow>())
        })
        .collect()
}

fn into_text(writer: csv::Writer<Vec<u8>>) -> Result<String, csv::Error> {
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| csv::Error::from(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn format_value(column: ThresholdColumn, value: f64) -> String {
    if column.is_flag() {
        format!("{}", value as u8)
    } else {
        format!("{value}")
    }
}

pub fn threshold_table_csv(table: &ThresholdTable) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(
        std::iter::once(InputField::BasinId.column())
            .chain(ThresholdColumn::ALL.iter().map(|c| c.name())),
    )?;
    for record in &table.records {
        writer.write_record(
            std::iter::once(record.basin_id.clone()).chain(
                ThresholdColumn::ALL
                    .iter()
                    .map(|&c| format_value(c, record.value(c))),
            ),
        )?;
    }
    into_text(writer)
}

const STRATEGY_COLUMNS: [&str; 15] = [
    "BasinID2",
    "volume_to_fill_variant",
    "depth_10km_offshore_inclSLR",
    "sand_req_adv",
    "pump_cap_adv",
    "number_years_adv",
    "levee_req_pc",
    "pump_cap_pc",
    "levee_req_po",
    "river_width_po",
    "acc_raise_0p5",
    "acc_raise_1",
    "acc_raise_10",
    "volume_to_fill",
    "number_years_acc",
];

/// One line per strategy sub-case row.
pub fn strategy_results_csv(results: &[StrategyResult]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(
        STRATEGY_COLUMNS
            .iter()
            .copied()
            .chain(RetreatTarget::ALL.iter().map(|t| t.availability_column())),
    )?;
    for r in results {
        let numbers = [
            r.advance.offshore_depth_incl_slr,
            r.advance.sand_required,
            r.advance.pump_capacity,
            r.advance.years_to_fill,
            r.protect_closed.levee_volume,
            r.protect_closed.pump_capacity,
            r.protect_open.levee_volume,
            r.protect_open.river_width,
            r.accommodate.raise.raise_0p5,
            r.accommodate.raise.raise_1,
            r.accommodate.raise.raise_10,
            r.volume_to_fill,
            r.accommodate.years_to_fill,
        ];
        writer.write_record(
            [
                r.basin_id.clone(),
                r.subcase.input_field().column().to_string(),
            ]
            .into_iter()
            .chain(numbers.iter().map(f64::to_string))
            .chain(
                RetreatTarget::ALL
                    .iter()
                    .map(|&t| r.land_availability.get(t).to_string()),
            ),
        )?;
    }
    into_text(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ModelConfig, Scenario, classify, run_scenario};

    fn header() -> String {
        InputField::ALL
            .iter()
            .map(|f| f.column())
            .collect::<Vec<_>>()
            .join(",")
    }

    const ROW_1: &str = "1,0.5,0,0.001,10000,1000,16000,1.5,1,3000,50000,0.8,2000000,0.5,1,10,3000000,90000000,1600000,1000000,400000000";
    const ROW_2: &str = "\"Mekong, lower\",0.7,-0.1,0.0005,20000,15000,40000,2,1.5,12000,90000,1.2,5000000,0.5,1,10,8000000,300000000,6000000,0,100000000";

    #[test]
    fn parse_rows_maps_header_names_to_cells() {
        let text = format!("\u{feff}{}\r\n{ROW_1}\r\n\n{ROW_2}\n", header());
        let rows = parse_rows(&text, "mem").expect("valid table");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].basin_id(), Some("1"));
        assert_eq!(rows[0].get("QRiver_dist"), Some("16000"));
        assert_eq!(rows[1].basin_id(), Some("Mekong, lower"));
        assert_eq!(rows[1].get("urban_non_inundated_area"), Some("0"));
    }

    #[test]
    fn parse_rows_handles_escaped_quotes() {
        let rows = parse_rows("BasinID2,note\n7,\"say \"\"hi\"\"\"\n", "mem").expect("valid");
        assert_eq!(rows[0].get("note"), Some("say \"hi\""));
    }

    #[test]
    fn parse_rows_reports_structural_errors() {
        let err = parse_rows("", "empty.csv").expect_err("no header");
        assert!(matches!(err, LoadError::MissingHeader { .. }));

        let err = parse_rows("a,b\n1,2,3\n", "ragged.csv").expect_err("ragged row");
        assert!(matches!(
            err,
            LoadError::RaggedRow {
                line: 2,
                expected: 2,
                found: 3,
                ..
            }
        ));

        let err = parse_rows("BasinID2,SLR,SLR\n1,0.5,9.9\n", "dup.csv").expect_err("dup");
        assert!(matches!(
            err,
            LoadError::DuplicateColumn { ref column, .. } if column == "SLR"
        ));
        assert!(err.to_string().contains("dup.csv"));
    }

    #[test]
    fn parse_rows_keeps_line_breaks_inside_quoted_cells() {
        let rows = parse_rows(
            "BasinID2,note\n7,\"line one\nline two\"\n8,plain\n",
            "mem",
        )
        .expect("valid table");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("note"), Some("line one\nline two"));
        assert_eq!(rows[1].basin_id(), Some("8"));
    }

    #[test]
    fn read_rows_names_missing_file() {
        let err = read_rows(Path::new("does/not/exist.csv")).expect_err("missing file");
        assert!(err.to_string().contains("does/not/exist.csv"));
    }

    #[test]
    fn threshold_csv_has_fixed_column_order_and_integer_flags() {
        let text = format!("{}\n{ROW_1}\n{ROW_2}\n", header());
        let rows = parse_rows(&text, "mem").expect("valid table");
        let run = run_scenario(&ModelConfig::default(), Scenario::Ssp126, &rows);
        assert!(run.rejected.is_empty());
        let table = classify(run.scenario, &run.results);

        let csv = threshold_table_csv(&table).expect("table formats");
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("BasinID2,adv_1200,adv_600,adv_12000,"));
        assert!(lines[0].ends_with(",adv_CurrentKnown,adv_Simple,adv_Innovative"));
        assert!(lines[1].starts_with("1,1,0,1,"));
        assert!(lines[2].starts_with("\"Mekong, lower\","));

        let reparsed = parse_rows(&csv, "out").expect("output parses back");
        assert_eq!(reparsed[1].get("acc_raise_10"), Some("10"));
        assert_eq!(reparsed[1].get("ret_urb_ni_area"), Some("0"));
    }

    #[test]
    fn strategy_csv_has_one_line_per_subcase() {
        let text = format!("{}\n{ROW_1}\n", header());
        let rows = parse_rows(&text, "mem").expect("valid table");
        let run = run_scenario(&ModelConfig::default(), Scenario::Ssp126, &rows);

        let csv = strategy_results_csv(&run.results).expect("results format");
        let parsed = parse_rows(&csv, "strategy").expect("output parses back");
        assert_eq!(parsed.len(), 3);
        assert_eq!(
            parsed[1].get("volume_to_fill_variant"),
            Some("total_inundation_volume")
        );
        assert_eq!(parsed[0].get("pump_cap_adv"), Some("1000"));
        assert_eq!(
            parsed[2].get("non_inundated_area_land_availability"),
            Some("200")
        );
    }
}
