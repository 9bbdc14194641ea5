//! CLI Smoke Tests
//!
//! Runs the built `mathlabel` binary for each subcommand, covering the
//! happy paths and the failures a user is most likely to hit.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn mathlabel(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mathlabel"))
        .args(args)
        .output()
        .expect("failed to run mathlabel")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn temp_output(ext: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    path.push(format!("mathlabel_test_{}_{}.{}", std::process::id(), id, ext));
    path
}

#[test]
fn test_help_lists_commands() {
    let output = mathlabel(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["measure", "wrap", "render"] {
        assert!(text.contains(command), "help should mention {}", command);
    }
}

#[test]
fn test_measure_plain_numbers() {
    // Built-in metrics: 0.6em per character, 1.25em lines
    let output = mathlabel(&["measure", "abc"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "36 25 18.5");
}

#[test]
fn test_measure_json() {
    let output = mathlabel(&["measure", "ab\ncd", "--json"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(report["width"], 24.0);
    assert_eq!(report["height"], 50.0);
    assert_eq!(report["engineReady"], false);
    assert_eq!(report["lines"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_wrap_breaks_words() {
    let output = mathlabel(&["wrap", "aaaa bbbb", "--width", "60"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "aaaa\nbbbb\n");
}

#[test]
fn test_wrap_isolates_oversized_math() {
    let output = mathlabel(&["wrap", "x \\(abcdefghij\\) y", "--width", "100"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "x \n\\(abcdefghij\\)\ny\n");
}

#[test]
fn test_render_svg() {
    let path = temp_output("svg");
    let output = mathlabel(&[
        "render",
        "area \\(x\\)",
        "--output",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let svg = fs::read_to_string(&path).expect("svg written");
    assert!(svg.starts_with("<?xml"));
    assert!(svg.contains("<text"));
    let _ = fs::remove_file(&path);
}

#[test]
fn test_render_png_needs_a_font() {
    let path = temp_output("png");
    let output = mathlabel(&["render", "abc", "--output", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--font-file"));
    assert!(!path.exists());
}

#[test]
fn test_render_rejects_unknown_formats() {
    let output = mathlabel(&["render", "abc", "--output", "label.bmp"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains(".png or .svg"));
}

#[test]
fn test_missing_font_file_fails() {
    let output = mathlabel(&["measure", "abc", "--font-file", "/nonexistent/font.ttf"]);
    assert!(!output.status.success());
}

#[cfg(unix)]
#[test]
fn test_measure_with_engine_command() {
    let output = mathlabel(&[
        "measure",
        "\\(x\\)",
        "--engine-cmd",
        "sh",
        "--engine-arg",
        "-c",
        "--engine-arg",
        "printf '<svg width=\"2ex\" height=\"2ex\"></svg>'",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output).trim(), "20 20 20");
}
