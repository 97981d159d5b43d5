use assert_cmd::Command;

fn cli() -> Command {
    Command::cargo_bin("sheetform-verify").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    let output = cli().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("list"));
    assert!(stdout.contains("run-file"));
    assert!(stdout.contains("--headed"));
}

#[test]
fn test_list_prints_builtin_scenarios() {
    let output = cli().arg("list").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["duplicate-house", "house-journey", "servicos-save"] {
        assert!(stdout.contains(name), "missing {} in:\n{}", name, stdout);
    }
}

#[test]
fn test_unknown_scenario_is_rejected() {
    let output = cli().args(["run", "no-such-scenario"]).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown scenario 'no-such-scenario'"), "{}", stderr);
}

#[test]
fn test_invalid_scenario_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "name: broken\nsteps: not-a-list\n").unwrap();

    let output = cli().arg("run-file").arg(&path).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Scenario parse error"), "{}", stderr);
    assert!(stderr.contains("broken.yaml"), "{}", stderr);
}

#[test]
fn test_missing_scenario_file_is_rejected() {
    let output = cli()
        .args(["run-file", "/definitely/not/here.yaml"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_out_with_several_scenarios_is_rejected() {
    let output = cli()
        .args(["run", "duplicate-house", "house-journey", "--out", "x.png"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--out"), "{}", stderr);
}

#[test]
fn test_sample_scenario_file_parses() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/add-house.yaml");
    let scenario = sheetform_verify::Scenario::from_file(&path).unwrap();
    assert_eq!(scenario.name, "add-house");
    assert_eq!(scenario.steps.len(), 7);
}
