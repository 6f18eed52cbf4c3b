use std::fs;

use super::helpers::TestProject;

#[test]
fn test_empty_environment_succeeds() {
    let project = TestProject::new();
    project.write_registry("");

    let output = project.run_collector(&[]);

    assert!(output.status.success());
    assert!(project.output_dir().join("source").is_dir());
    let entries: Vec<_> = fs::read_dir(project.output_dir()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert!(String::from_utf8_lossy(&output.stdout).contains("License Collection (0 packages)"));
}

#[test]
fn test_local_license_is_copied() {
    let project = TestProject::new();
    project.write_registry("");
    project.install_package("attrs", "23.1.0", "License: MIT\n", Some("The MIT License\n"));

    let output = project.run_collector(&["--verbose"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(project.output_dir().join("attrs.LICENSE")).unwrap(),
        "The MIT License\n"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Copied local license for attrs"));
}

#[test]
fn test_unresolvable_package_fails_at_end() {
    let project = TestProject::new();
    project.write_registry("# nothing registered yet\n");
    project.install_package("attrs", "23.1.0", "License: MIT\n", Some("MIT"));
    project.install_package("mystery-lib", "0.0.1", "Home-page: https://mystery.example\n", None);

    let output = project.run_collector(&[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("  - mystery-lib"));
    assert!(stderr.contains("registry.csv"));

    // Processing continued past the missing package
    assert!(project.output_dir().join("attrs.LICENSE").is_file());
    assert!(!project.output_dir().join("mystery-lib.LICENSE").exists());
}

#[test]
fn test_json_report_is_written() {
    let project = TestProject::new();
    project.write_registry("");
    project.install_package("attrs", "23.1.0", "License: MIT\n", Some("MIT"));
    let report_path = project.dir.path().join("report.json");

    let output = project.run_collector(&["--quiet", "--report", report_path.to_str().unwrap()]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(report["summary"]["total_packages"], 1);
    assert_eq!(report["packages"][0]["name"], "attrs");
    assert_eq!(report["packages"][0]["outcome"], "local");
}

#[test]
fn test_missing_registry_file_is_an_error() {
    let project = TestProject::new();

    let output = project.run_collector(&[]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read registry file"));
}

#[test]
fn test_json_format_keeps_stdout_parseable() {
    let project = TestProject::new();
    project.write_registry("");
    project.install_package("attrs", "23.1.0", "License: MIT\n", Some("MIT"));

    let output = project.run_collector(&["--verbose", "-f", "json"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["total_packages"], 1);
    assert_eq!(report["packages"][0]["outcome"], "local");

    // Progress moved to stderr
    assert!(String::from_utf8_lossy(&output.stderr).contains("Copied local license for attrs"));
}

#[test]
fn test_no_sources_skips_archival_of_gpl_package() {
    let project = TestProject::new();
    project.write_registry("");
    project.install_package("chardet", "3.0.4", "License: LGPL\n", Some("GNU LESSER GENERAL PUBLIC LICENSE\n"));

    // pip would fail to start if archival were attempted
    let output = project.run_collector(&["--no-sources", "--python", "/nonexistent/python"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Skipping source archival for chardet==3.0.4"));
    assert!(project.output_dir().join("chardet.LICENSE").is_file());

    let sources: Vec<_> = fs::read_dir(project.output_dir().join("source")).unwrap().collect();
    assert!(sources.is_empty());
}

#[test]
fn test_gpl_package_reaches_archival() {
    let project = TestProject::new();
    project.write_registry("");
    project.install_package("chardet", "3.0.4", "License: LGPL\n", Some("GNU LESSER GENERAL PUBLIC LICENSE\n"));

    let output = project.run_collector(&["--python", "/nonexistent/python"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Archiving sources of chardet==3.0.4"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to run '/nonexistent/python -m pip'"));
}

#[test]
fn test_branch_flag_changes_guessed_location() {
    let project = TestProject::new();
    project.write_registry("");
    project.install_package(
        "ghost",
        "0.1.0",
        "Home-page: https://github.com/py-license-collector-nonexistent-org/ghost\n",
        None,
    );

    let output = project.run_collector(&["--branch", "trunk"]);

    // Unreachable either way; the guessed URL is what matters
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains(
        "https://raw.githubusercontent.com/py-license-collector-nonexistent-org/ghost/trunk/LICENSE"
    ));
    assert!(String::from_utf8_lossy(&output.stderr).contains("  - ghost"));
}

#[test]
fn test_duplicate_install_falls_back_to_older_license() {
    let project = TestProject::new();
    project.write_registry("");
    project.install_package("foo", "1.0", "License: MIT\n", Some("MIT from 1.0\n"));
    project.install_package("foo", "2.0", "License: MIT\n", None);
    let report_path = project.dir.path().join("report.json");

    let output = project.run_collector(&["--report", report_path.to_str().unwrap()]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stderr).contains("foo is installed more than once"));
    assert_eq!(
        fs::read_to_string(project.output_dir().join("foo.LICENSE")).unwrap(),
        "MIT from 1.0\n"
    );

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(report["summary"]["total_packages"], 1);
    assert_eq!(report["packages"][0]["version"], "2.0");
}
