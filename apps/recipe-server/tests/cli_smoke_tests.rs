//! CLI smoke tests for the recipe-server binary
//!
//! These run the real binary: help output, configuration validation,
//! startup with an in-memory database and superuser creation.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

/// Helper to run the recipe-server binary with given arguments
fn run_recipe_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_recipe-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute recipe-server")
}

/// Helper to run the recipe-server binary with timeout
async fn run_recipe_server_with_timeout(
    args: &[&str],
    timeout_duration: Duration,
) -> Result<std::process::Output, Box<dyn std::error::Error>> {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_recipe-server"));
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(timeout_duration, cmd.output()).await {
        Ok(result) => result.map_err(|e| e.into()),
        Err(elapsed) => Err(elapsed.into()),
    }
}

/// Writes a config whose home dir lives inside `dir`.
fn write_config(dir: &Path, name: &str, database_url: &str) -> String {
    let home = dir.join("home");
    let content = format!(
        r#"
server:
  home_dir: "{home}"
  host: "127.0.0.1"
  port: 0

database:
  url: "{database_url}"

logging:
  default:
    console_level: info
    file: "logs/recipe-api.log"
    file_level: info
    max_age_days: 28
    max_backups: 3
    max_size_mb: 10

auth:
  secret: "smoke-test-secret"
"#,
        home = home.to_string_lossy().replace('\\', "/"),
    );
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write config file");
    path.to_string_lossy().to_string()
}

#[test]
fn test_cli_help_command() {
    let output = run_recipe_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("recipe-server"), "Should contain binary name");
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(
        stdout.contains("create-superuser"),
        "Should contain 'create-superuser' subcommand"
    );
    assert!(stdout.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_recipe_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("recipe-server"), "Should contain binary name");
    assert!(stdout.contains("0.1.0"), "Should contain version number");
}

#[test]
fn test_cli_invalid_command() {
    let output = run_recipe_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error"),
        "Should contain error message about invalid command"
    );
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_recipe_server(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config file not found"),
        "Should mention config file issue: {}",
        stderr
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_recipe_server(&["--config", config_path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
}

#[test]
fn test_cli_config_validation_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "valid.yaml", "sqlite://database/recipes.db");

    let output = run_recipe_server(&["--config", &config_path, "check"]);

    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
        eprintln!("STDOUT: {}", String::from_utf8_lossy(&output.stdout));
    }
    assert!(output.status.success(), "Should succeed with valid config");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("api_ingress"), "derived ingress section is printed");
}

#[test]
fn test_cli_unsupported_database_fails_check() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "mysql.yaml", "mysql://localhost/recipes");

    let output = run_recipe_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "mysql is not a supported backend");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsupported database type"), "{}", stderr);
}

#[test]
fn test_cli_mock_flag() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "mock.yaml", "mysql://localhost/nonexistent");

    // --mock swaps in an in-memory database, so the configured DSN is not checked
    let output = run_recipe_server(&["--config", &config_path, "--mock", "check"]);

    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(output.status.success(), "Should succeed with mock database");
}

#[test]
fn test_cli_print_config_applies_port_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "print.yaml", "sqlite://database/recipes.db");

    let output = run_recipe_server(&["--config", &config_path, "--port", "9123", "--print-config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 9123"), "{}", stdout);
    assert!(stdout.contains("127.0.0.1:9123"), "{}", stdout);
}

#[tokio::test]
async fn test_cli_run_command_with_mock_database() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "run.yaml", "sqlite://database/recipes.db");

    let result = run_recipe_server_with_timeout(
        &["--config", &config_path, "--mock", "run"],
        Duration::from_secs(5),
    )
    .await;

    // Server should start and keep running until the timeout
    match result {
        Err(err) => assert!(
            err.to_string().contains("elapsed"),
            "Server failed to start: {}",
            err
        ),
        Ok(output) => panic!(
            "Server exited early: {}",
            String::from_utf8_lossy(&output.stderr)
        ),
    }
}

#[test]
fn test_cli_create_superuser() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "admin.yaml", "sqlite://database/recipes.db");
    let args = [
        "--config",
        &config_path,
        "create-superuser",
        "--email",
        "admin@EXAMPLE.com",
        "--password",
        "testpass123",
    ];

    let output = run_recipe_server(&args);
    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(output.status.success(), "superuser should be created");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("admin@example.com"), "{}", stdout);
    assert!(temp_dir.path().join("home/database/recipes.db").exists());

    // same email again is a conflict
    let output = run_recipe_server(&args);
    assert!(!output.status.success(), "duplicate superuser must fail");
}

#[test]
fn test_cli_create_superuser_requires_email() {
    let output = run_recipe_server(&["create-superuser", "--password", "testpass123"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--email"), "{}", stderr);
}
