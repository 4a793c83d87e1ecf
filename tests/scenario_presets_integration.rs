use std::process::Command;

#[derive(Debug)]
struct Kpis {
    generation_kwh: f64,
    grid_import_kwh: f64,
    self_sufficiency_pct: f64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_dynamics() {
    let household = run_and_parse_kpis(&["--scenario", "scenarios/household.toml"]);
    let overcast = run_and_parse_kpis(&["--scenario", "scenarios/overcast.toml"]);
    let best_hour = run_and_parse_kpis(&["--scenario", "scenarios/best_hour.toml"]);

    assert!(
        household.generation_kwh > overcast.generation_kwh,
        "expected household to out-generate overcast: household={:.3}, overcast={:.3}",
        household.generation_kwh,
        overcast.generation_kwh
    );
    assert!(
        household.self_sufficiency_pct > overcast.self_sufficiency_pct,
        "expected household to be more self-sufficient: household={:.1}, overcast={:.1}",
        household.self_sufficiency_pct,
        overcast.self_sufficiency_pct
    );
    assert!(best_hour.generation_kwh > 0.0);
    assert!(overcast.grid_import_kwh > 0.0);
}

#[test]
fn presets_run_via_cli() {
    for preset in ["household", "demo_profile"] {
        let kpis = run_and_parse_kpis(&["--preset", preset, "--days", "2"]);
        assert!(kpis.generation_kwh > 0.0, "{preset}: {kpis:?}");
    }
}

#[test]
fn comparison_csv_is_written_via_cli() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let out = dir.path().join("comparison.csv");

    let output = Command::new(env!("CARGO_BIN_EXE_home-pv-sim"))
        .args([
            "--preset",
            "household",
            "--days",
            "2",
            "--forecast",
            "tests/data/two_clear_days.csv",
            "--compare-actuals",
            "tests/data/measured_generation.csv",
            "--comparison-out",
        ])
        .arg(&out)
        .output()
        .expect("home-pv-sim process should run");
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = std::fs::read_to_string(&out).expect("comparison CSV should exist");
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "date,simulated_kwh,actual_kwh,difference_kwh");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("2024-06-01,"));
    assert!(lines[1].contains(",27.400,"));
    assert!(lines[2].starts_with("2024-06-02,"));
}

#[test]
fn unknown_preset_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_home-pv-sim"))
        .args(["--preset", "mansion"])
        .output()
        .expect("home-pv-sim process should run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

fn run_and_parse_kpis(args: &[&str]) -> Kpis {
    let output = Command::new(env!("CARGO_BIN_EXE_home-pv-sim"))
        .args(args)
        .output()
        .expect("home-pv-sim process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    Kpis {
        generation_kwh: parse_metric(&stdout, "PV generation:", "kWh"),
        grid_import_kwh: parse_metric(&stdout, "Grid import:", "kWh"),
        self_sufficiency_pct: parse_metric(&stdout, "Self-sufficiency:", "%"),
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing KPI line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid KPI format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from KPI line `{line}`"))
}
