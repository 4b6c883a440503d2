//! Hygiene: source-tree budgets for constructs the crate does not allow.
//!
//! Each budget is a ceiling on matching lines across `src/`, excluding the
//! colocated `*_test.rs` files. Budgets only ever go down.

use std::fs;
use std::path::Path;

struct Budget {
    pattern: &'static str,
    max: usize,
    why: &'static str,
}

const BUDGETS: &[Budget] = &[
    // Panics.
    Budget { pattern: ".unwrap()", max: 0, why: "propagate with ? instead" },
    Budget { pattern: ".expect(", max: 0, why: "propagate with ? instead" },
    Budget { pattern: "panic!(", max: 0, why: "return an error" },
    Budget { pattern: "unreachable!(", max: 0, why: "make the state unrepresentable" },
    Budget { pattern: "todo!(", max: 0, why: "finish the stub" },
    Budget { pattern: "unimplemented!(", max: 0, why: "finish the stub" },
    // Silent loss.
    Budget { pattern: "let _ =", max: 0, why: "inspect or log the value" },
    Budget { pattern: ".ok()", max: 0, why: "inspect or log the error" },
    // Structure.
    Budget { pattern: "#[allow(dead_code)]", max: 0, why: "delete the dead code" },
    // Only the demo binary writes to stdout; the library logs through tracing.
    Budget { pattern: "println!(", max: 1, why: "use tracing" },
    Budget { pattern: "eprintln!(", max: 0, why: "use tracing" },
];

struct SourceFile {
    path: String,
    content: String,
}

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            let path_str = path.to_string_lossy().to_string();
            if path_str.ends_with("_test.rs") {
                continue;
            }
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path: path_str, content });
            }
        }
    }
}

fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

#[test]
fn source_tree_is_scanned() {
    let files = source_files();
    assert!(files.iter().any(|f| f.path.ends_with("lib.rs")), "run from the crate root");
    assert!(files.iter().all(|f| !f.path.ends_with("_test.rs")));
}

#[test]
fn budgets_hold() {
    let files = source_files();
    let mut failures = Vec::new();
    for budget in BUDGETS {
        let found = hits(&files, budget.pattern);
        let count: usize = found.iter().map(|(_, c)| c).sum();
        if count > budget.max {
            let detail = found.iter().map(|(path, c)| format!("    {path}: {c}")).collect::<Vec<_>>().join("\n");
            failures.push(format!(
                "`{}` budget exceeded: found {count}, max {} ({}).\n{detail}",
                budget.pattern, budget.max, budget.why
            ));
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}
