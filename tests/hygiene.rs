//! Hygiene budgets for the library sources under `src/`.
//!
//! Each pattern has a fixed budget. Adding an occurrence means removing one
//! elsewhere first; budgets only go down. Sibling `*_test.rs` files and the
//! test-only `test_support.rs` are exempt.

use std::fs;
use std::path::Path;

struct Budget {
    pattern: &'static str,
    max: usize,
}

/// Process-crashing constructs. The one `panic!` is `use_ui()` outside a provider scope.
const CRASHES: &[Budget] = &[
    Budget { pattern: ".unwrap()", max: 0 },
    Budget { pattern: ".expect(", max: 0 },
    Budget { pattern: "panic!(", max: 1 },
    Budget { pattern: "unreachable!(", max: 0 },
    Budget { pattern: "todo!(", max: 0 },
    Budget { pattern: "unimplemented!(", max: 0 },
];

/// Errors dropped without inspection. The one `.ok()` tries an error body as JSON.
const DISCARDS: &[Budget] = &[Budget { pattern: "let _ =", max: 0 }, Budget { pattern: ".ok()", max: 1 }];

/// Output that bypasses `tracing`, and silenced dead code.
const STYLE: &[Budget] = &[
    Budget { pattern: "println!(", max: 0 },
    Budget { pattern: "eprintln!(", max: 0 },
    Budget { pattern: "dbg!(", max: 0 },
    Budget { pattern: "#[allow(dead_code)]", max: 0 },
];

struct SourceFile {
    path: String,
    content: String,
}

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect(Path::new("src"), &mut files);
    assert!(!files.is_empty(), "no sources found; run from the crate root");
    files
}

fn collect(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
            continue;
        }
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        if !name.ends_with(".rs") || name.ends_with("_test.rs") || name == "test_support.rs" {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path.to_string_lossy().into_owned(), content });
        }
    }
}

/// Returns one message per exceeded budget.
fn violations(files: &[SourceFile], budgets: &[Budget]) -> Vec<String> {
    budgets
        .iter()
        .filter_map(|budget| {
            let hits: Vec<String> = files
                .iter()
                .filter_map(|file| {
                    let count = file.content.lines().filter(|l| l.contains(budget.pattern)).count();
                    (count > 0).then(|| format!("  {}: {count}", file.path))
                })
                .collect();
            let total: usize = files
                .iter()
                .map(|f| f.content.lines().filter(|l| l.contains(budget.pattern)).count())
                .sum();
            (total > budget.max).then(|| format!("{} found {total}, max {}\n{}", budget.pattern, budget.max, hits.join("\n")))
        })
        .collect()
}

fn check(budgets: &[Budget]) {
    let found = violations(&source_files(), budgets);
    assert!(found.is_empty(), "budget exceeded:\n{}", found.join("\n"));
}

#[test]
fn crash_budget() {
    check(CRASHES);
}

#[test]
fn discard_budget() {
    check(DISCARDS);
}

#[test]
fn style_budget() {
    check(STYLE);
}
