//! Structural tests for layer boundaries.
//!
//! Scans source files so an inward layer never starts importing an outward
//! one.

use std::path::{Path, PathBuf};

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

/// Non-comment lines of every file under `src/<layer>`, tagged with the file.
fn code_lines(layer: &str) -> Vec<(PathBuf, String)> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(layer);
    collect_rs_files(&dir)
        .into_iter()
        .flat_map(|path| {
            let content = std::fs::read_to_string(&path).unwrap_or_default();
            content
                .lines()
                .filter(|l| !l.trim().starts_with("//"))
                .map(|l| (path.clone(), l.to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn violations(layer: &str, forbidden: &[&str]) -> Vec<String> {
    code_lines(layer)
        .into_iter()
        .filter(|(_, line)| forbidden.iter().any(|f| line.contains(f)))
        .map(|(path, line)| format!("{}: {}", path.display(), line.trim()))
        .collect()
}

#[test]
fn domain_depends_on_nothing_outward() {
    let found = violations(
        "domain",
        &[
            "crate::application",
            "crate::infra",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::process",
        ],
    );
    assert!(found.is_empty(), "domain imports outward layers:\n{}", found.join("\n"));
}

#[test]
fn application_never_imports_adapters() {
    let found = violations(
        "application",
        &["crate::infra", "crate::commands", "crate::output", "crate::app::"],
    );
    assert!(found.is_empty(), "application imports adapters:\n{}", found.join("\n"));
}

#[test]
fn infra_never_imports_presentation() {
    let found = violations("infra", &["crate::commands", "crate::output", "crate::app::"]);
    assert!(found.is_empty(), "infra imports presentation:\n{}", found.join("\n"));
}
