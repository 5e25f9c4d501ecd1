//! End-to-end tests for the abcmode binary.
//!
//! Every test works on files in a fresh temp directory, and runs from there so
//! no stray ./abcmode.toml is picked up.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const BOOK: &str = "X:2\nT:First\nK:G\nabc|\nX:5\nT:Second\nK:D\ndef|\n";

fn abcmode(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("abcmode").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("ABCMODE_CONFIG")
        .env_remove("ABCMODE_RENDERER")
        .env_remove("ABCMODE_CONVERTER")
        .env_remove("ABCMODE_TRANSFORMER")
        .env_remove("ABCMODE_PREPROCESSOR")
        .env_remove("ABCMODE_LOG_LEVEL");
    cmd
}

fn book(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("book.abc");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn renumber_writes_file_back() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, BOOK);

    abcmode(&dir)
        .arg("renumber")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Renumbered 2 tunes"));

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, BOOK.replace("X:2", "X:1").replace("X:5", "X:2"));
}

#[test]
fn renumber_to_stdout_leaves_file_alone() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, BOOK);

    abcmode(&dir)
        .args(["renumber", "--stdout"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("X:1\nT:First"));

    assert_eq!(fs::read_to_string(&path).unwrap(), BOOK);
}

#[test]
fn record_at_line() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, BOOK);

    abcmode(&dir)
        .arg("record")
        .arg(&path)
        .args(["--line", "6"])
        .assert()
        .success()
        .stdout("5\n");
}

#[test]
fn record_before_first_tune_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, &format!("% header\n{}", BOOK));

    abcmode(&dir)
        .arg("record")
        .arg(&path)
        .args(["--line", "1"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("No tune found"));
}

#[test]
fn lint_reports_duplicates() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, "X:1\nK:C\nabc|\nX:1\nK:D\nd^=ef|\n");

    abcmode(&dir)
        .arg("lint")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(":4:1: warning: Reference number 1 already used"))
        .stdout(predicate::str::contains(":6:2: warning: Stacked accidentals"))
        .stdout(predicate::str::contains("hint: Run renumber"));
}

#[test]
fn classify_as_json() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, "K:Cmaj % comment\n");

    let output = abcmode(&dir)
        .args(["--json", "classify"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["kind"], "annotations");
    let span = &value["value"][0][1][0];
    assert_eq!(span["start"], 0);
    assert_eq!(span["end"], 6);
    assert_eq!(span["category"], "key-or-voice-field");
}

#[test]
fn titles_list() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, BOOK);

    abcmode(&dir)
        .arg("titles")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2  First"))
        .stdout(predicate::str::contains("6  Second"));
}

#[test]
fn new_tune_at_end() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, BOOK);

    abcmode(&dir)
        .args(["new-tune", "--stdout"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::ends_with("def|\nX:6\nT:\nC:\nM:4/4\nL:1/8\nK:C\n"));
}

#[test]
fn field_and_instrument_insertion() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, "X:1\nK:G\n");

    abcmode(&dir)
        .arg("field")
        .arg(&path)
        .arg("composer")
        .assert()
        .success();
    abcmode(&dir)
        .arg("instrument")
        .arg(&path)
        .arg("fiddle")
        .args(["--line", "2"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "X:1\n%%MIDI program 110\nK:G\nC:"
    );
}

#[test]
fn unknown_field_fails_without_editing() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, BOOK);

    abcmode(&dir)
        .arg("field")
        .arg(&path)
        .arg("colour")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown field 'colour'"));
    assert_eq!(fs::read_to_string(&path).unwrap(), BOOK);
}

#[test]
fn wrap_slur() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, "abc def\n");

    abcmode(&dir)
        .args(["wrap", "slur"])
        .arg(&path)
        .args(["--start", "7", "--end", "4"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&path).unwrap(), "abc (def)\n");
}

#[test]
fn pad_click_inserts_token() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, "X:1\nK:G\n");

    // Row 0, column 1 is the single bar
    abcmode(&dir)
        .arg("pad")
        .arg(&path)
        .args(["--row", "0", "--column", "1"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&path).unwrap(), "X:1\nK:G\n|");

    // Whitespace is ignored
    abcmode(&dir)
        .arg("pad")
        .arg(&path)
        .args(["--row", "0", "--column", "0"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&path).unwrap(), "X:1\nK:G\n|");
}

#[test]
fn pad_layout() {
    let dir = TempDir::new().unwrap();
    abcmode(&dir)
        .arg("pad")
        .assert()
        .success()
        .stdout(predicate::str::contains("6: del   space   newline   undo"));
}

#[test]
fn instruments_list() {
    let dir = TempDir::new().unwrap();
    abcmode(&dir)
        .arg("instruments")
        .assert()
        .success()
        .stdout(predicate::str::contains(" 40  Violin"))
        .stdout(predicate::str::contains("127  Gunshot"));
}

#[test]
fn instruments_list_with_aliases() {
    let dir = TempDir::new().unwrap();
    abcmode(&dir)
        .args(["instruments", "--names"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" 78  tin whistle"))
        .stdout(predicate::str::contains("110  Fiddle"))
        .stdout(predicate::str::contains("  0  piano"));
}

#[test]
fn render_dry_run_one_tune() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, BOOK);

    abcmode(&dir)
        .arg("render")
        .arg(&path)
        .args(["--option-set", "pretty", "--tune", "--line", "6", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "$ abcm2ps -p {} -e 5",
            path.display()
        )));
}

#[test]
fn render_unknown_option_set() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, BOOK);

    abcmode(&dir)
        .arg("render")
        .arg(&path)
        .args(["--option-set", "glossy", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown renderer option set 'glossy'"));
}

#[test]
fn midi_dry_run_uses_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("set.abp");
    fs::write(&path, BOOK).unwrap();
    fs::write(
        dir.path().join("abcmode.toml"),
        "[tools]\npreprocessor = \"abcpp\"\nconverter = \"midigen\"\n",
    )
    .unwrap();

    abcmode(&dir)
        .arg("midi")
        .arg(&path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "$ abcpp -MIDI {} {}.abc",
            path.display(),
            path.display()
        )))
        .stdout(predicate::str::contains(format!("$ midigen {}.abc", path.display())));
}

#[test]
fn transpose_dry_run() {
    let dir = TempDir::new().unwrap();
    let path = book(&dir, BOOK);

    abcmode(&dir)
        .arg("transpose")
        .arg(&path)
        .arg("-2")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("abc2abc"))
        .stdout(predicate::str::contains("-t -2"));
}

#[test]
fn config_shows_env_override() {
    let dir = TempDir::new().unwrap();
    abcmode(&dir)
        .args(["config", "--sources"])
        .env("ABCMODE_RENDERER", "abcm2ps-dev")
        .assert()
        .success()
        .stdout(predicate::str::contains("[tools]"))
        .stdout(predicate::str::contains("abcm2ps-dev"))
        .stdout(predicate::str::contains("# env: ABCMODE_RENDERER"));
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    abcmode(&dir)
        .args(["--config", "nope.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
