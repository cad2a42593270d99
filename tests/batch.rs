use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const ERROR: &str = "An error has occurred\n";

/// Runs `script` as a batch file from inside `dir`.
fn gush(dir: &Path, script: &str) -> Output {
    let path = dir.join("script.gush");
    fs::write(&path, script).expect("write batch file");
    Command::new(env!("CARGO_BIN_EXE_gush"))
        .arg(&path)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run gush")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn errors(count: usize) -> String {
    ERROR.repeat(count)
}

fn workdir() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let cwd = fs::canonicalize(dir.path()).unwrap();
    (dir, cwd)
}

#[test]
fn parallel_groups_both_run_before_next_line() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "pwd & pwd\npwd\n");

    let line = format!("{}\n", cwd.display());
    assert!(output.status.success());
    assert_eq!(stdout(&output), line.repeat(3));
    assert_eq!(stderr(&output), "");
}

#[test]
fn parallel_builtins_update_the_session() {
    let (_dir, cwd) = workdir();
    fs::create_dir(cwd.join("sub")).unwrap();
    let output = gush(&cwd, "cd sub & path\npwd\necho gone\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), format!("{}\n", cwd.join("sub").display()));
    assert_eq!(stderr(&output), errors(1));
}

#[test]
fn exit_in_a_parallel_line_stops_after_the_line() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "exit & echo last\necho unreachable\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), "last\n");
    assert_eq!(stderr(&output), "");
}

#[test]
fn output_then_input_redirection_round_trip() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "path /bin /usr/bin\necho hi > out.txt\ncat < out.txt\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), "hi\n");
    assert_eq!(stderr(&output), "");
    assert_eq!(fs::read_to_string(cwd.join("out.txt")).unwrap(), "hi\n");
}

#[test]
fn redirected_output_is_owner_only_and_truncated() {
    let (_dir, cwd) = workdir();
    fs::write(cwd.join("out.txt"), "something much longer than pwd\n").unwrap();
    let output = gush(&cwd, "pwd > out.txt\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), "");
    assert_eq!(
        fs::read_to_string(cwd.join("out.txt")).unwrap(),
        format!("{}\n", cwd.display())
    );

    let output = gush(&cwd, "pwd > fresh.txt\n");
    assert!(output.status.success());
    let mode = fs::metadata(cwd.join("fresh.txt")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn redirection_is_restored_after_each_command() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "echo one > a.txt & echo two > b.txt\necho three\n");

    assert_eq!(stdout(&output), "three\n");
    assert_eq!(fs::read_to_string(cwd.join("a.txt")).unwrap(), "one\n");
    assert_eq!(fs::read_to_string(cwd.join("b.txt")).unwrap(), "two\n");
}

#[test]
fn missing_input_file_runs_the_line_as_typed() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "echo before < nope.txt\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), "before < nope.txt\n");
    assert_eq!(stderr(&output), errors(1));
}

#[test]
fn uncreatable_output_ends_the_session() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "pwd > missing_dir/out.txt\npwd\n");

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "");
    assert_eq!(stderr(&output), errors(1));
}

#[test]
fn cd_changes_directory_for_later_lines() {
    let (_dir, cwd) = workdir();
    fs::create_dir(cwd.join("sub")).unwrap();
    let output = gush(&cwd, "cd sub\npwd\n");

    assert_eq!(stdout(&output), format!("{}\n", cwd.join("sub").display()));
    assert_eq!(stderr(&output), "");
}

#[test]
fn cd_usage_errors_leave_directory_unchanged() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "cd\ncd a b\ncd does_not_exist\npwd\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), format!("{}\n", cwd.display()));
    assert_eq!(stderr(&output), errors(3));
}

#[test]
fn history_lists_numbered_commands() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "path /bin\necho a   b\nhistory\n");

    assert_eq!(stdout(&output), "a b\n1: path /bin\n2: echo a b\n");
}

#[test]
fn history_shortcut_reruns_a_command() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "echo first\necho second\n!1\nhistory\n");

    assert_eq!(
        stdout(&output),
        "first\nsecond\nfirst\n1: echo first\n2: echo second\n3: echo first\n"
    );
    assert_eq!(stderr(&output), "");
}

#[test]
fn history_shortcut_past_the_end_is_an_error() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "echo a\necho b\n!3\necho c\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), "a\nb\nc\n");
    assert_eq!(stderr(&output), errors(1));
}

#[test]
fn history_keeps_only_the_last_twenty() {
    let (_dir, cwd) = workdir();
    let mut script: String = (1..=25).map(|i| format!("echo {}\n", i)).collect();
    script.push_str("!5\n!25\n");
    let output = gush(&cwd, &script);

    let mut expected: String = (1..=25).map(|i| format!("{}\n", i)).collect();
    expected.push_str("25\n");
    assert_eq!(stdout(&output), expected);
    assert_eq!(stderr(&output), errors(1));
}

#[test]
fn history_display_numbers_start_at_one() {
    let (_dir, cwd) = workdir();
    let mut script: String = (1..=22).map(|i| format!("echo {} > /dev/null\n", i)).collect();
    script.push_str("history\n");
    let output = gush(&cwd, &script);

    let listing = stdout(&output);
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 20);
    assert_eq!(lines[0], "1: echo 3 > /dev/null");
    assert_eq!(lines[19], "20: echo 22 > /dev/null");
}

#[test]
fn builtin_arguments_are_never_options() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "exit --help\npwd -h\npath -x /bin\necho reached\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), "reached\n");
    assert_eq!(stderr(&output), errors(2));
}

#[test]
fn exit_with_argument_is_an_error_and_exit_stops() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "exit foo\necho alive\nexit\necho unreachable\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), "alive\n");
    assert_eq!(stderr(&output), errors(1));
}

#[test]
fn unknown_command_is_reported_and_session_continues() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "no_such_command_here\npath\necho gone\necho\n/bin/echo explicit\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), "explicit\n");
    assert_eq!(stderr(&output), errors(3));
}

#[test]
fn blank_and_separator_only_lines_do_nothing() {
    let (_dir, cwd) = workdir();
    let output = gush(&cwd, "\n   \t\n& &\n& & &\necho ok &\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), "ok\n");
    assert_eq!(stderr(&output), "");
}

#[test]
fn missing_batch_file_exits_with_failure() {
    let (_dir, cwd) = workdir();
    let output = Command::new(env!("CARGO_BIN_EXE_gush"))
        .arg(cwd.join("missing.gush"))
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "");
    assert_eq!(stderr(&output), errors(1));
}

#[test]
fn more_than_one_argument_is_rejected() {
    let (_dir, cwd) = workdir();
    fs::write(cwd.join("a.gush"), "echo a\n").unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_gush"))
        .args(["a.gush", "b.gush"])
        .current_dir(&cwd)
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "");
    assert_eq!(stderr(&output), errors(1));
}
