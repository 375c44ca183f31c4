//! Scenario files driven through the command layer.

use std::io::Write;
use std::process::ExitCode;

use qtheory::cli::{evaluate_file, format_json, run_scenarios, ReportStatus};
use qtheory::prelude::*;
use tempfile::NamedTempFile;

fn write_temp(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(yaml.as_bytes()).expect("write scenarios");
    file
}

#[test]
fn scenario_file_survives_yaml_round_trip() {
    let original = ScenarioFile {
        schema_version: "1.0".to_string(),
        config: SolverConfig::builder().significant_digits(10).build(),
        scenarios: vec![
            Scenario {
                name: "checkout".to_string(),
                parameters: Parameters::Mms(Mms::new(4.0, 2.0, 3.0).with_time(0.5)),
            },
            Scenario {
                name: "repair-shop".to_string(),
                parameters: Parameters::Mm1Finite(Mm1Finite::new(0.1, 1.0, 6.0)),
            },
            Scenario {
                name: "triage".to_string(),
                parameters: Parameters::PriorityPreemptive(PriorityPreemptive::new(
                    vec![1.0, 1.0],
                    4.0,
                    1.0,
                )),
            },
        ],
    };

    let yaml = original.to_yaml().expect("serializes");
    let file = write_temp(&yaml);

    assert_eq!(ScenarioFile::load(file.path()).expect("reloads"), original);

    let reports = evaluate_file(file.path()).expect("evaluates");
    assert_eq!(reports.len(), 3);
    assert!(reports
        .iter()
        .all(|r| matches!(r.status, ReportStatus::Stable { .. })));
    assert_eq!(reports[1].model, ModelKind::Mm1Finite);
}

#[test]
fn json_report_lists_every_scenario() {
    let file = write_temp(
        r"
scenarios:
  - name: buffer
    parameters:
      model: mm1k
      lambda: 3
      mu: 3
      k: 5
  - name: flooded
    parameters:
      model: mms
      lambda: 10
      mu: 1
      s: 2
",
    );
    let reports = evaluate_file(file.path()).expect("evaluates");
    let json = format_json(&reports).expect("serializes");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    assert_eq!(value[0]["name"], "buffer");
    assert_eq!(value[0]["status"], "stable");
    assert_eq!(value[0]["results"]["probabilities"].as_array().map(Vec::len), Some(6));
    assert_eq!(value[1]["status"], "unstable");
    assert!(value[1]["results"]["wq"].is_null());
}

#[test]
fn invalid_scenario_fails_the_run() {
    let file = write_temp(
        r"
config:
  logging:
    level: warn
scenarios:
  - name: fine
    parameters:
      model: mm1
      lambda: 1
      mu: 2
  - name: too-small
    parameters:
      model: mmsk
      lambda: 1
      mu: 2
      s: 3
      k: 2
",
    );
    let code = run_scenarios(file.path(), true, false);
    assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::from(1)));

    let reports = evaluate_file(file.path()).expect("evaluates");
    match &reports[1].status {
        ReportStatus::Invalid { error } => assert!(error.contains("smaller than server count")),
        other => panic!("expected invalid, got {other:?}"),
    }
}

#[test]
fn malformed_files_are_rejected_before_evaluation() {
    let unknown_model = write_temp(
        r"
scenarios:
  - name: x
    parameters:
      model: gg1
      lambda: 1
",
    );
    assert!(matches!(
        evaluate_file(unknown_model.path()),
        Err(QueueError::YamlParse(_))
    ));

    let duplicate = write_temp(
        r"
scenarios:
  - name: same
    parameters: { model: mm1, lambda: 1, mu: 2 }
  - name: same
    parameters: { model: mm1, lambda: 1, mu: 3 }
",
    );
    assert!(matches!(
        evaluate_file(duplicate.path()),
        Err(QueueError::Config { .. })
    ));

    let bad_precision = write_temp(
        r"
config:
  precision:
    significant_digits: 40
scenarios:
  - name: x
    parameters: { model: mm1, lambda: 1, mu: 2 }
",
    );
    assert!(matches!(
        evaluate_file(bad_precision.path()),
        Err(QueueError::Validation(_))
    ));
}
