use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn make_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before UNIX_EPOCH")
        .as_nanos();
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("argsheet-integ-{prefix}-{pid}-{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn argsheet() -> Command {
    Command::new(env!("CARGO_BIN_EXE_argsheet"))
}

const SHEET: &str = r#"{
  "program-name": "convert",
  "description": "Converts a document between formats.",
  "epilogue": "Exit status is zero on success.",
  "options": [
    { "aliases": ["-f", "--format"], "arity": 1, "params": "<fmt>", "help": "Output format." },
    { "aliases": ["-v", "--verbose"], "help": "Report progress." },
    { "aliases": ["--crop"], "arity": 4, "params": "<x> <y> <w> <h>", "help": "Crop rectangle." }
  ],
  "positionals": [
    { "name": "input", "help": "Document to read." },
    { "name": "output", "help": "Document to write." }
  ]
}"#;

fn write_sheet(prefix: &str) -> (PathBuf, PathBuf) {
    let dir = make_temp_dir(prefix);
    let sheet = dir.join("argsheet.json");
    fs::write(&sheet, SHEET).expect("failed to write sheet");
    (dir, sheet)
}

fn assert_success(out: &Output, what: &str) {
    assert!(
        out.status.success(),
        "{what} failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
}

#[test]
fn help_works() {
    let out = argsheet()
        .arg("--help")
        .output()
        .expect("failed to run argsheet --help");
    assert_success(&out, "argsheet --help");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("argsheet") && stdout.contains("parse") && stdout.contains("reflow"),
        "unexpected help output:\n{stdout}"
    );
}

#[test]
fn parse_prints_json_report() {
    let (dir, sheet) = write_sheet("parse-report");

    let out = argsheet()
        .arg("parse")
        .arg("--sheet")
        .arg(&sheet)
        .arg("--")
        .args(["in.md", "-f", "pdf", "--verbose", "out.pdf"])
        .output()
        .expect("failed to run argsheet parse");
    assert_success(&out, "argsheet parse");

    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("parse output is not JSON");
    assert_eq!(report["program"], "convert");
    assert_eq!(report["present"], serde_json::json!(["-f", "-v"]));
    assert_eq!(report["values"]["-f"], serde_json::json!(["pdf"]));
    assert_eq!(report["positionals"], serde_json::json!(["in.md", "out.pdf"]));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_derives_program_name_when_skipping_first_token() {
    let dir = make_temp_dir("parse-start");
    let sheet = dir.join("argsheet.json");
    fs::write(&sheet, r#"{ "positionals": [ { "name": "file" } ] }"#).unwrap();

    let out = argsheet()
        .arg("parse")
        .arg("--sheet")
        .arg(&sheet)
        .arg("--start")
        .arg("1")
        .arg("--")
        .args(["/opt/tools/frobnicate", "data.bin"])
        .output()
        .expect("failed to run argsheet parse");
    assert_success(&out, "argsheet parse --start 1");

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["program"], "frobnicate");
    assert_eq!(report["positionals"], serde_json::json!(["data.bin"]));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_help_token_prints_help_and_succeeds() {
    let (dir, sheet) = write_sheet("parse-help");

    let out = argsheet()
        .arg("parse")
        .arg("--sheet")
        .arg(&sheet)
        .arg("--")
        .args(["--help", "--no-such-flag"])
        .output()
        .expect("failed to run argsheet parse --help");
    assert_success(&out, "argsheet parse -- --help");
    assert_eq!(out.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("Converts a document between formats.\n\nUsage:\n"));
    assert!(stdout.contains("POSITIONAL ARGUMENTS: 2\n"));
    assert!(stdout.contains("--crop <x> <y> <w> <h>\nCrop rectangle.\n"));
    assert!(stdout.ends_with("\nExit status is zero on success.\n"));
    assert!(!stdout.contains("\"program\""));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_failures_exit_nonzero() {
    let (dir, sheet) = write_sheet("parse-errors");

    let cases: [(&[&str], &str); 2] = [
        (&["a", "b", "c"], "invalid argument: \"c\""),
        (&["--crop", "1", "2"], "\"--crop\""),
    ];
    for (args, needle) in cases {
        let out = argsheet()
            .arg("parse")
            .arg("--sheet")
            .arg(&sheet)
            .arg("--")
            .args(args)
            .output()
            .expect("failed to run argsheet parse");
        assert!(!out.status.success(), "expected failure for {args:?}");
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains(needle), "missing {needle:?} in stderr:\n{stderr}");
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn usage_lists_positionals() {
    let (dir, sheet) = write_sheet("usage");

    let out = argsheet()
        .arg("usage")
        .arg("--sheet")
        .arg(&sheet)
        .output()
        .expect("failed to run argsheet usage");
    assert_success(&out, "argsheet usage");
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "Usage:\n    convert OPTIONS \\\n            input \\\n            output\n"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn init_then_show_help() {
    let dir = make_temp_dir("init");

    let out = argsheet()
        .arg("init")
        .arg(&dir)
        .output()
        .expect("failed to run argsheet init");
    assert_success(&out, "argsheet init");
    assert!(dir.join("argsheet.json").is_file(), "argsheet.json not created");

    let again = argsheet().arg("init").arg(&dir).output().unwrap();
    assert!(!again.status.success(), "init should refuse to overwrite");

    let out = argsheet()
        .arg("show-help")
        .arg("--sheet")
        .arg(dir.join("argsheet.json"))
        .output()
        .expect("failed to run argsheet show-help");
    assert_success(&out, "argsheet show-help");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("-b, --block <bytes>"), "unexpected help:\n{stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn reflow_reads_stdin() {
    let mut child = argsheet()
        .args(["reflow", "--margin", "2", "--width", "12"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn argsheet reflow");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"the quick brown fox\nsupercalifragilistic")
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert_success(&out, "argsheet reflow");
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "  the quick\n  brown fox\n  supercalifragilistic\n"
    );
}
