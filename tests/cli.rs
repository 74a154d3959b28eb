use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn get_trio_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_trio"))
}

fn script(name: &str, source: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("trio-cli-{}-{}", std::process::id(), name));
    std::fs::write(&path, source).expect("Failed to write script");
    path
}

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = get_trio_binary()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn trio");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for trio")
}

#[test]
fn test_version_flag() {
    let output = get_trio_binary().arg("--version").output().expect("Failed to execute trio");

    assert!(output.status.success(), "Version flag should succeed");
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("trio"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_runs_anna_file() {
    let path = script("hello.anna", "message := \"Hello from Anna!\"\nprint message\nprint 2 + 3 * 4\n");
    let output = get_trio_binary().arg("anna").arg(&path).output().expect("Failed to execute trio");
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "Hello from Anna!\n14\n");
}

#[test]
fn test_runs_alex_file_with_blocks() {
    let source = "def square(n):\n    return n * n\nfor i in range(3):\n    print square(i)\n";
    let path = script("blocks.alex", source);
    let output = get_trio_binary().arg("alex").arg(&path).output().expect("Failed to execute trio");
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "0\n1\n4\n");
}

#[test]
fn test_error_exits_with_diagnostic() {
    let path = script("broken.anna", "print 1\nprint 1 / 0\nprint 3\n");
    let output = get_trio_binary()
        .args(["anna", "--color", "never"])
        .arg(&path)
        .output()
        .expect("Failed to execute trio");
    std::fs::remove_file(&path).ok();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "1\n");
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("error[E0203]: division by zero"));
    assert!(stderr.contains(":2:1"));
}

#[test]
fn test_max_steps_stops_runaway_loop() {
    let path = script("spin.alex", "while true: pass\n");
    let output = get_trio_binary()
        .args(["alex", "--max-steps", "1000", "--color", "never"])
        .arg(&path)
        .output()
        .expect("Failed to execute trio");
    std::fs::remove_file(&path).ok();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("execution budget of 1000 steps exhausted"));
}

#[test]
fn test_timeout_stops_runaway_loop() {
    let path = script("slow.alex", "while true: pass\n");
    let output = get_trio_binary()
        .args(["alex", "--timeout-ms", "50", "--color", "never"])
        .arg(&path)
        .output()
        .expect("Failed to execute trio");
    std::fs::remove_file(&path).ok();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("error[E0304]") || stderr.contains("error[E0305]"));
}

#[test]
fn test_dump_env_json() {
    let path = script("dump.rosa", "fact sky_is_blue\nn := 3\nname := \"rosa\"\n");
    let output = get_trio_binary()
        .args(["rosa", "--dump-env", "json"])
        .arg(&path)
        .output()
        .expect("Failed to execute trio");
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("dump should be JSON");
    assert_eq!(parsed["facts"], serde_json::json!(["sky_is_blue"]));
    assert_eq!(parsed["n"], serde_json::json!(3));
    assert_eq!(parsed["name"], serde_json::json!("rosa"));
}

#[test]
fn test_dump_env_text() {
    let path = script("dump.anna", "x := 1\ny := [x, \"two\"]\n");
    let output = get_trio_binary()
        .args(["anna", "--dump-env", "text"])
        .arg(&path)
        .output()
        .expect("Failed to execute trio");
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "x = 1\ny = [1, \"two\"]\n");
}

#[test]
fn test_repl_from_stdin() {
    let output = run_with_stdin(&["anna"], "x := 5\nprint x + 1\n:quit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Anna REPL"));
    assert!(stdout.contains("anna> 6\n"));
}

#[test]
fn test_repl_after_file() {
    let path = script("setup.alex", "set base = 10\n");
    let output = run_with_stdin(&["alex", path.to_str().unwrap(), "--repl"], "print base * 2\n");
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("alex> 20\n"));
}

#[test]
fn test_missing_dialect() {
    let output = get_trio_binary().output().expect("Failed to execute trio");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unknown_dialect_rejected() {
    let output = get_trio_binary().arg("bob").output().expect("Failed to execute trio");
    assert!(!output.status.success());
}

#[test]
fn test_missing_file() {
    let output = get_trio_binary()
        .args(["anna", "/definitely/not/here.anna", "--color", "never"])
        .output()
        .expect("Failed to execute trio");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr).unwrap().contains("Failed to read"));
}

#[test]
fn test_completions() {
    let output = get_trio_binary()
        .args(["complete", "bash"])
        .output()
        .expect("Failed to execute trio");
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("trio"));
}
