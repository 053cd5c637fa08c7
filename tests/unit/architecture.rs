//! Structural tests for layer boundary enforcement.
//!
//! These scan the source tree so the domain / application / infra / output
//! split survives future changes.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        if line.trim().contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

fn src_dir(sub: &[&str]) -> PathBuf {
    sub.iter()
        .fold(Path::new(env!("CARGO_MANIFEST_DIR")).join("src"), |p, s| {
            p.join(s)
        })
}

fn rel(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
}

/// Non-comment, non-test lines of every file under `dir` containing any of
/// `needles`, formatted as `path:line: text`.
fn find_outside_tests(dir: &Path, needles: &[&str]) -> Vec<String> {
    let mut hits = Vec::new();
    for file in collect_rs_files(dir) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let mut tracker = CfgTestTracker::new();
        for (i, line) in content.lines().enumerate() {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            if in_test || trimmed.starts_with("//") {
                continue;
            }
            if needles.iter().any(|n| line.contains(n)) {
                hits.push(format!("{}:{}: {trimmed}", rel(&file), i + 1));
            }
        }
    }
    hits
}

#[test]
fn domain_has_no_outer_layer_imports() {
    let violations = find_outside_tests(
        &src_dir(&["domain"]),
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "crate::image",
            "tokio",
            "std::process",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must stay pure:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_has_no_infra_or_presentation_imports() {
    let violations = find_outside_tests(
        &src_dir(&["application"]),
        &["crate::infra", "crate::commands", "crate::output"],
    );
    assert!(
        violations.is_empty(),
        "application/ may depend on domain/ only:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = find_outside_tests(
        &src_dir(&["infra"]),
        &["crate::commands", "crate::output"],
    );
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn pipeline_and_infra_never_print() {
    for layer in ["infra", "image", "domain", "application"] {
        let violations = find_outside_tests(&src_dir(&[layer]), &["println!", "eprintln!"]);
        assert!(
            violations.is_empty(),
            "{layer}/ must report through ProgressReporter or tracing:\n{}",
            violations.join("\n")
        );
    }
}

#[test]
fn no_tokio_command_runner_new_outside_infra_and_app() {
    let violations: Vec<String> = find_outside_tests(&src_dir(&[]), &["TokioCommandRunner::new"])
        .into_iter()
        .filter(|v| {
            let v = v.replace('\\', "/");
            !v.starts_with("src/infra/") && !v.starts_with("src/app.rs")
        })
        .collect();
    assert!(
        violations.is_empty(),
        "construct the process runner in app.rs only:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_inline_json_branching_in_commands() {
    let violations = find_outside_tests(
        &src_dir(&["commands"]),
        &["json: bool", "if json", "if !json", "is_json()"],
    );
    assert!(
        violations.is_empty(),
        "commands/ must render through app.renderer():\n{}",
        violations.join("\n")
    );
}

#[test]
fn command_handlers_accept_app_context() {
    for file in collect_rs_files(&src_dir(&["commands"])) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        if content.contains("pub fn run(") || content.contains("pub async fn run(") {
            assert!(
                content.contains("app: &AppContext"),
                "{} has a run() that does not take &AppContext",
                rel(&file)
            );
        }
    }
}
