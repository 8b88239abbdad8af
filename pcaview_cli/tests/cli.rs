use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

const DOC: &str = r#"{
    "points": [{"x": 1, "y": 2, "label": "frame_500fs"}, {"x": 3, "y": 4, "label": "B"}],
    "explained_variance_ratio_all": [0.6, 0.3],
    "cumulative_variance_ratio_all": [0.6, 0.9],
    "method": "sklearn"
}"#;

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn cli_help_smoke() {
    let mut cmd = Command::cargo_bin("pcaview").unwrap();
    cmd.arg("--help");
    cmd.assert().success();
}

#[test]
fn stats_prints_four_cards() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "result.json", DOC);

    let mut cmd = Command::cargo_bin("pcaview").unwrap();
    cmd.arg("stats").arg(&input);
    let text = stdout_of(&mut cmd);
    assert!(text.contains("Data Points"));
    assert!(text.contains("60.0%"));
    assert!(text.contains("90.0%"));
}

#[test]
fn stats_json_uses_display_names() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "result.json", DOC);

    let mut cmd = Command::cargo_bin("pcaview").unwrap();
    cmd.arg("stats").arg(&input).arg("--json");
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&mut cmd)).unwrap();
    assert_eq!(value["pointCount"], 2);
    assert_eq!(value["pc2VariancePct"], 30.0);
}

#[test]
fn validate_reports_each_file_and_fails_on_any_error() {
    let tmp = TempDir::new().unwrap();
    let good = write(tmp.path(), "good.json", DOC);
    let missing = write(tmp.path(), "missing.json", r#"{ "points": [] }"#);
    let wrong_ext = write(tmp.path(), "result.txt", DOC);

    let mut cmd = Command::cargo_bin("pcaview").unwrap();
    cmd.arg("validate").arg(&good);
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("pcaview").unwrap();
    cmd.arg("validate").arg(&good).arg(&missing).arg(&wrong_ext);
    let output = cmd.output().unwrap();
    assert!(!output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("OK    "));
    assert!(text.contains("required keys missing"));
    assert!(text.contains("unsupported file type"));
}

#[test]
fn uppercase_extension_accepted_with_flag() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "RESULT.JSON", DOC);

    let mut cmd = Command::cargo_bin("pcaview").unwrap();
    cmd.arg("validate").arg(&input);
    cmd.assert().failure();

    let mut cmd = Command::cargo_bin("pcaview").unwrap();
    cmd.arg("validate").arg(&input).arg("--ignore-extension-case");
    cmd.assert().success();
}

#[test]
fn render_writes_report_and_chart_json() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "result.json", DOC);
    let html = tmp.path().join("report.html");
    let charts = tmp.path().join("charts.json");

    let mut cmd = Command::cargo_bin("pcaview").unwrap();
    cmd.arg("render")
        .arg(&input)
        .arg("-o")
        .arg(&html)
        .arg("--sections")
        .arg("pca,cumulative")
        .arg("--charts-json")
        .arg(&charts);
    cmd.assert().success();

    let page = fs::read_to_string(&html).unwrap();
    assert!(page.contains("plotly"));
    assert!(page.contains("result.json"));
    // Hidden at load, still drawable from its toggle.
    assert!(page.contains(r#"charts["contribution"] = "#));
    assert!(page.contains(r#"["pca","cumulative"].forEach(draw);"#));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&charts).unwrap()).unwrap();
    assert_eq!(value["pca"]["traces"][0]["marker"]["color"], serde_json::json!([0.5, 1.0]));
    assert_eq!(value["cumulative"]["layout"]["yaxis"]["range"][1], 1.1);
    assert!(value.get("contribution").is_none());
}

#[test]
fn render_fails_on_malformed_input() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "broken.json", "{ not json");
    let html = tmp.path().join("report.html");

    let mut cmd = Command::cargo_bin("pcaview").unwrap();
    cmd.arg("render").arg(&input).arg("-o").arg(&html);
    cmd.assert().failure();
    assert!(!html.exists());
}

#[test]
fn export_points_to_stdout() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "result.json", DOC);

    let mut cmd = Command::cargo_bin("pcaview").unwrap();
    cmd.arg("export").arg(&input).arg("--table").arg("points");
    let text = stdout_of(&mut cmd);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "index,label,x,y,time_ps,color_value");
    assert_eq!(lines[1], "0,frame_500fs,1,2,0.5,0.5");
    assert_eq!(lines[2], "1,B,3,4,,1");
}

#[test]
fn config_file_sets_marker_size() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "result.json", DOC);
    let config = write(tmp.path(), "viewer.json", r#"{ "marker_size": 6 }"#);
    let charts = tmp.path().join("charts.json");

    let mut cmd = Command::cargo_bin("pcaview").unwrap();
    cmd.arg("render")
        .arg(&input)
        .arg("-o")
        .arg(tmp.path().join("report.html"))
        .arg("--charts-json")
        .arg(&charts)
        .arg("--config")
        .arg(&config);
    cmd.assert().success();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&charts).unwrap()).unwrap();
    assert_eq!(value["pca"]["traces"][0]["marker"]["size"], 6.0);
}
