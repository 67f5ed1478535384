use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper struct to manage test files
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        TestFixture {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a file with content inside the fixture directory
    fn create_file<P: AsRef<Path>>(&self, path: P, content: &str) -> PathBuf {
        let file_path = self.temp_dir.path().join(path.as_ref());
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    fn dir(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// Helper to run the CLI binary with an isolated config and working directory
fn run_cli_in(dir: &Path, args: &[&str]) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_lcompare_cli");
    let config_dir = TempDir::new().expect("Failed to create config dir");
    Command::new(exe)
        .args(args)
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", config_dir.path())
        .env("APPDATA", config_dir.path())
        .env("HOME", config_dir.path())
        .output()
        .expect("Failed to execute command")
}

fn run_cli(fixture: &TestFixture, args: &[&str]) -> std::process::Output {
    run_cli_in(fixture.dir(), args)
}

/// Helper to run CLI and expect a zero exit code
fn run_cli_success(fixture: &TestFixture, args: &[&str]) -> std::process::Output {
    let output = run_cli(fixture, args);
    if !output.status.success() {
        eprintln!("STDOUT:\n{}", String::from_utf8_lossy(&output.stdout));
        eprintln!("STDERR:\n{}", String::from_utf8_lossy(&output.stderr));
        panic!("Command failed with status: {}", output.status);
    }
    output
}

#[test]
fn test_compare_identical_files() {
    let fixture = TestFixture::new();
    let left = fixture.create_file("left.txt", "alpha\nbeta\ngamma\n");
    let right = fixture.create_file("right.txt", "alpha\nbeta\ngamma\n");

    let output = run_cli_success(
        &fixture,
        &["compare", left.to_str().unwrap(), right.to_str().unwrap()],
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Files are identical"));
}

#[test]
fn test_compare_different_files_exits_one() {
    let fixture = TestFixture::new();
    let left = fixture.create_file("left.txt", "alpha\nbeta\n");
    let right = fixture.create_file("right.txt", "alpha\nBETA\n");

    let output = run_cli(
        &fixture,
        &["compare", left.to_str().unwrap(), right.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("line 2 is not equal in both files"));
    assert!(stdout.contains("Files differ"));
}

#[test]
fn test_compare_writes_report_with_caret() {
    let fixture = TestFixture::new();
    let left = fixture.create_file("left.txt", "abcdef\n");
    let right = fixture.create_file("right.txt", "abcxef\n");
    let report = fixture.path("result.log");

    run_cli(
        &fixture,
        &[
            "compare",
            left.to_str().unwrap(),
            right.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
        ],
    );

    let log = fs::read_to_string(&report).expect("report should exist");
    assert!(log.contains("line 1 is not equal in both files"));
    assert!(log.contains("   File A: abcdef"));
    assert!(log.contains("   File B: abcxef"));
    // Caret under the first differing column: 11 prefix spaces + offset 3.
    assert!(log.contains("\n              ^"));
}

#[test]
fn test_compare_equal_files_write_no_report() {
    let fixture = TestFixture::new();
    let left = fixture.create_file("left.txt", "same\n");
    let right = fixture.create_file("right.txt", "same\n");
    let report = fixture.path("result.log");

    run_cli_success(
        &fixture,
        &[
            "compare",
            left.to_str().unwrap(),
            right.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
        ],
    );

    assert!(!report.exists());
}

#[test]
fn test_compare_shorter_right_file() {
    let fixture = TestFixture::new();
    let left = fixture.create_file("left.txt", "a\nb\nc\nd\ne\n");
    let right = fixture.create_file("right.txt", "a\nb\n");
    let report = fixture.path("result.log");

    let output = run_cli(
        &fixture,
        &[
            "compare",
            left.to_str().unwrap(),
            right.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    let log = fs::read_to_string(&report).unwrap();
    assert!(log.contains("File B has less lines than File A"));
    assert!(log.contains("   File B: 2 lines"));
    assert!(log.contains("   File A: 5 lines"));
}

#[test]
fn test_compare_ignore_whitespace_flag() {
    let fixture = TestFixture::new();
    let left = fixture.create_file("left.txt", "  a b  \n");
    let right = fixture.create_file("right.txt", "ab\n");

    let strict = run_cli(
        &fixture,
        &["compare", left.to_str().unwrap(), right.to_str().unwrap()],
    );
    assert_eq!(strict.status.code(), Some(1));

    run_cli_success(
        &fixture,
        &[
            "compare",
            left.to_str().unwrap(),
            right.to_str().unwrap(),
            "--ignore-whitespace",
        ],
    );
}

#[test]
fn test_compare_case_insensitive_flag() {
    let fixture = TestFixture::new();
    let left = fixture.create_file("left.txt", "ABC\n");
    let right = fixture.create_file("right.txt", "abc\n");

    run_cli_success(
        &fixture,
        &[
            "compare",
            left.to_str().unwrap(),
            right.to_str().unwrap(),
            "-i",
        ],
    );
}

#[test]
fn test_compare_region_ignores_outside_lines() {
    let fixture = TestFixture::new();
    let left = fixture.create_file("left.txt", "aaaa\nXXhello world\nmid\nYYtail lineQQ\nz1\n");
    let right = fixture.create_file("right.txt", "bbbb\nQQhello world\nmid\nYYtail lineZZ\nz2\n");

    run_cli_success(
        &fixture,
        &[
            "compare",
            left.to_str().unwrap(),
            right.to_str().unwrap(),
            "--region",
            "2,3,4,12",
        ],
    );

    let unbounded = run_cli(
        &fixture,
        &["compare", left.to_str().unwrap(), right.to_str().unwrap()],
    );
    assert_eq!(unbounded.status.code(), Some(1));
}

#[test]
fn test_compare_bad_region_is_an_error() {
    let fixture = TestFixture::new();
    let left = fixture.create_file("left.txt", "a\n");
    let right = fixture.create_file("right.txt", "a\n");

    let output = run_cli(
        &fixture,
        &[
            "compare",
            left.to_str().unwrap(),
            right.to_str().unwrap(),
            "--region",
            "1,2,3",
        ],
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_compare_json_output() {
    let fixture = TestFixture::new();
    let left = fixture.create_file("left.txt", "one\ntwo\n");
    let right = fixture.create_file("right.txt", "one\nTWO\n");

    let output = run_cli(
        &fixture,
        &[
            "compare",
            left.to_str().unwrap(),
            right.to_str().unwrap(),
            "--json",
        ],
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");

    assert_eq!(json["equal"], false);
    assert_eq!(json["left_lines"], 2);
    assert_eq!(json["summary"]["total"], 1);
    assert_eq!(json["summary"]["line_mismatches"], 1);
    assert_eq!(json["discrepancies"][0]["kind"], "line_mismatch");
    assert_eq!(json["discrepancies"][0]["line_number"], 2);
}

#[test]
fn test_compare_nonexistent_path() {
    let fixture = TestFixture::new();
    let right = fixture.create_file("right.txt", "a\n");

    let output = run_cli(
        &fixture,
        &["compare", "/nonexistent/left.txt", right.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"));
}

#[test]
fn test_modify_replace_first() {
    let fixture = TestFixture::new();
    let file = fixture.create_file(
        "modify.txt",
        "There is a few lines here.\nOne Here.\nAnd one Here.\n",
    );

    run_cli_success(
        &fixture,
        &[
            "modify",
            file.to_str().unwrap(),
            "--mode",
            "first",
            "One];[Two",
        ],
    );

    let content = fs::read_to_string(&file).unwrap();
    assert_eq!(
        content,
        "There is a few lines here.\nTwo Here.\nAnd one Here.\n"
    );
}

#[test]
fn test_modify_accepts_numeric_mode() {
    let fixture = TestFixture::new();
    let file = fixture.create_file("modify.txt", "x.y.z\n");

    run_cli_success(
        &fixture,
        &["modify", file.to_str().unwrap(), "--mode", "1", ".];[!"],
    );

    assert_eq!(fs::read_to_string(&file).unwrap(), "x!y!z\n");
}

#[test]
fn test_modify_replace_lines() {
    let fixture = TestFixture::new();
    let file = fixture.create_file("modify.txt", "l1\nl2\nl3\nl4\n");

    run_cli_success(
        &fixture,
        &[
            "modify",
            file.to_str().unwrap(),
            "--mode",
            "lines",
            "1;3-4];[X",
        ],
    );

    assert_eq!(fs::read_to_string(&file).unwrap(), "X\nl2\nX\nX\n");
}

#[test]
fn test_modify_replace_regex() {
    let fixture = TestFixture::new();
    let file = fixture.create_file("modify.txt", "id=123 code=456\n");

    run_cli_success(
        &fixture,
        &[
            "modify",
            file.to_str().unwrap(),
            "--mode",
            "regex",
            r"[0-9]+];[N",
        ],
    );

    assert_eq!(fs::read_to_string(&file).unwrap(), "id=N code=N\n");
}

#[test]
fn test_modify_malformed_directive_leaves_file_unchanged() {
    let fixture = TestFixture::new();
    let content = "untouched\ncontent\n";
    let file = fixture.create_file("modify.txt", content);

    let output = run_cli(
        &fixture,
        &[
            "modify",
            file.to_str().unwrap(),
            "--mode",
            "first",
            "missingSeparator",
        ],
    );

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(fs::read_to_string(&file).unwrap(), content);
}

#[test]
fn test_find_exit_codes() {
    let fixture = TestFixture::new();
    let file = fixture.create_file("haystack.txt", "alpha\nbeta\ngamma\n");

    let found = run_cli(
        &fixture,
        &["find", file.to_str().unwrap(), "eta", "--line", "2"],
    );
    assert!(found.status.success());
    assert!(String::from_utf8_lossy(&found.stdout).contains("Found"));

    let wrong_line = run_cli(
        &fixture,
        &["find", file.to_str().unwrap(), "eta", "--line", "3"],
    );
    assert_eq!(wrong_line.status.code(), Some(1));

    let past_end = run_cli(
        &fixture,
        &["find", file.to_str().unwrap(), "eta", "--line", "999"],
    );
    assert_eq!(past_end.status.code(), Some(1));
}

#[test]
fn test_help_flag() {
    let fixture = TestFixture::new();
    let output = run_cli(&fixture, &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Line-oriented text file comparison"));
    assert!(stdout.contains("compare"));
    assert!(stdout.contains("modify"));
}

#[test]
fn test_version_flag() {
    let fixture = TestFixture::new();
    let output = run_cli(&fixture, &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lcompare"));
}

#[test]
fn test_missing_subcommand() {
    let fixture = TestFixture::new();
    let output = run_cli(&fixture, &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage:") || stderr.contains("subcommand"));
}

#[test]
fn test_region_conflicts_with_csv() {
    let fixture = TestFixture::new();
    let left = fixture.create_file("left.csv", "a\n1\n");
    let right = fixture.create_file("right.csv", "a\n1\n");

    let output = run_cli(
        &fixture,
        &[
            "compare",
            left.to_str().unwrap(),
            right.to_str().unwrap(),
            "--csv",
            "--region",
            "1,1,1,1",
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot be used with") || stderr.contains("conflict"));
}
