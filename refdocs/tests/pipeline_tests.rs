//! Integration tests for the full documentation pipeline.
//!
//! The local end-to-end tests substitute shell scripts for go, npm, and the
//! installed generator, so the whole sequence (workspace bootstrap, clone,
//! branch reset, generation, cleanup) runs without touching the host
//! toolchain or the network. The real-upstream test needs go, npm, and
//! network access and is ignored by default.

#![cfg(unix)]

use pipeline::{default_branches, ToolchainConfig, RELEASE_1_6};
use refdocs::{enable_branches, run, PipelineError, RunConfig};
use serial_test::serial;
use std::path::{Path, PathBuf};

#[test]
fn test_enable_branches_flips_table_entries() {
    let mut branches = default_branches();
    enable_branches(&mut branches, &["release-1.6".to_string()]).unwrap();
    let spec = branches.iter().find(|b| b.branch == RELEASE_1_6).unwrap();
    assert!(spec.enabled);
}

#[test]
fn test_enable_unknown_branch_fails() {
    let mut branches = default_branches();
    let err = enable_branches(&mut branches, &["release-9.9".to_string()]).unwrap_err();
    assert!(matches!(err, PipelineError::UnknownBranch { .. }));
    assert!(err.to_string().contains("release-9.9"));
}

#[test]
#[serial]
fn test_missing_tool_fails_before_any_mutation() {
    let root = tempfile::tempdir().unwrap();
    let mut config = RunConfig::new(root.path());
    config.toolchain = ToolchainConfig::default().with_go("refdocs-test-no-such-go");

    let err = run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Toolchain(_)));

    // Nothing was written under the website root
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

/// Count leftover workspace directories in the system temp dir
fn workspace_dir_count() -> usize {
    std::fs::read_dir(std::env::temp_dir())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with("refdocs-gopath-") || name.starts_with("refdocs-gocache-")
        })
        .count()
}

#[test]
#[serial]
fn test_workspace_cleaned_after_failed_run() {
    let before = workspace_dir_count();

    let root = tempfile::tempdir().unwrap();
    let mut config = RunConfig::new(root.path());
    // `true` satisfies the toolchain probe and the install step, then the
    // clone of a nonexistent upstream fails mid-pipeline.
    config.toolchain = ToolchainConfig::default().with_go("true").with_npm("true");
    config.upstream_url = "/nonexistent/refdocs-test-upstream".to_string();

    let err = run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Checkout(_)));

    assert_eq!(workspace_dir_count(), before);
}

/// Write an executable shell script
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, body).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Stand-in for go: answers the version probe, "installs" a stand-in
/// generator into GOBIN, vendors as a no-op, and prints usage for `go run`.
/// When `guard_legacy` is set, `go run` fails unless the legacy API group is
/// still present and the generator fails if it still is, which pins the
/// release-1.6 ordering.
fn write_fake_go(path: &Path, guard_legacy: bool) {
    let run_case = if guard_legacy {
        "    if [ ! -d pkg/apis/conductor/v1alpha1 ]; then\n      echo 'legacy API group already pruned' >&2\n      exit 1\n    fi\n    echo 'Usage: conductor [command]'\n"
    } else {
        "    echo 'Usage: conductor [command]'\n"
    };
    let generator_guard = if guard_legacy {
        "if [ -d \"\\$api/conductor/v1alpha1\" ]; then\n  echo 'legacy API group present' >&2\n  exit 1\nfi\n"
    } else {
        ""
    };

    let body = format!(
        r##"#!/bin/sh
case "$1" in
  version)
    echo go1.22
    ;;
  install)
    mkdir -p "$GOBIN"
    cat > "$GOBIN/gen-apidocs" <<EOF
#!/bin/sh
api=""
out=""
while [ "\$#" -gt 0 ]; do
  case "\$1" in
    --api-dir) api="\$2" ;;
    --out-file) out="\$2" ;;
  esac
  shift
done
{generator_guard}printf '# API reference\n' > "\$out"
EOF
    chmod +x "$GOBIN/gen-apidocs"
    ;;
  mod)
    exit 0
    ;;
  run)
{run_case}    ;;
  clean)
    exit 0
    ;;
esac
"##
    );
    write_script(path, &body);
}

/// Stand-in for npm: answers the version probe, otherwise passes stdin
/// through like the markdown formatter with no rewrites to make.
fn write_fake_npm(path: &Path) {
    write_script(
        path,
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then\n  echo 10.0.0\n  exit 0\nfi\ncat\n",
    );
}

/// Build a local "upstream" with the given release branches, a cobra-flagged
/// go.mod, one command entry point, and the legacy API subtrees.
fn make_upstream(dir: &Path, branches: &[&str]) {
    std::fs::create_dir_all(dir.join("cmd/conductor")).unwrap();
    std::fs::write(dir.join("cmd/conductor/main.go"), "package main\n").unwrap();
    std::fs::write(
        dir.join("go.mod"),
        "module github.com/conductor-project/conductor\n\nrequire github.com/spf13/cobra v1.8.0\n",
    )
    .unwrap();
    std::fs::create_dir_all(dir.join("pkg/apis/core")).unwrap();
    std::fs::write(dir.join("pkg/apis/core/types.go"), "package core\n").unwrap();
    std::fs::create_dir_all(dir.join("pkg/apis/conductor/v1alpha1")).unwrap();
    std::fs::write(
        dir.join("pkg/apis/conductor/v1alpha1/types.go"),
        "package v1alpha1\n",
    )
    .unwrap();

    let repo = git2::Repository::init(dir).unwrap();
    let sig = git2::Signature::now("test", "test@example.com").unwrap();
    let tree_id = {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        index.write_tree().unwrap()
    };
    let commit_id = {
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap()
    };
    let commit = repo.find_commit(commit_id).unwrap();
    for branch in branches {
        repo.branch(branch, &commit, true).unwrap();
    }
}

fn fake_tool_config(dir: &Path, guard_legacy: bool) -> ToolchainConfig {
    let go = dir.join("fake-go");
    let npm = dir.join("fake-npm");
    write_fake_go(&go, guard_legacy);
    write_fake_npm(&npm);
    ToolchainConfig::default()
        .with_go(go.display().to_string())
        .with_npm(npm.display().to_string())
}

#[test]
#[serial]
fn test_end_to_end_generates_reference_tree() {
    let scratch = tempfile::tempdir().unwrap();
    let upstream = scratch.path().join("upstream");
    std::fs::create_dir_all(&upstream).unwrap();
    make_upstream(&upstream, &["release-1.8"]);

    let root = scratch.path().join("website");
    std::fs::create_dir_all(&root).unwrap();

    let mut config = RunConfig::new(&root);
    config.toolchain = fake_tool_config(scratch.path(), false);
    config.upstream_url = upstream.display().to_string();

    let summary = run(&config).unwrap();
    assert_eq!(summary.branches.len(), 1);
    assert_eq!(summary.branches[0].version_dir, "v1.8");

    // API reference exists and is non-empty
    let api_docs = root.join("content/v1.8/reference/api-docs.md");
    let contents = std::fs::read_to_string(&api_docs).unwrap();
    assert_eq!(contents, "# API reference\n");

    // conductor help was captured; conductorctl has no entry point and was
    // skipped without failing the run
    let cli_doc = root.join("content/v1.8/cli/conductor.md");
    let doc = std::fs::read_to_string(&cli_doc).unwrap();
    assert!(doc.starts_with("---\ntitle: \"conductor conductor\""));
    assert!(doc.contains("Usage: conductor [command]"));
    assert!(!root.join("content/v1.8/cli/conductorctl.md").exists());

    let statuses: Vec<&str> = summary.branches[0]
        .cli
        .iter()
        .map(|r| r.status.as_str())
        .collect();
    assert!(statuses[0].starts_with("written:"));
    assert!(statuses[1].starts_with("skipped:"));
}

#[test]
#[serial]
fn test_release_1_6_extracts_cli_before_pruning() {
    let scratch = tempfile::tempdir().unwrap();
    let upstream = scratch.path().join("upstream");
    std::fs::create_dir_all(&upstream).unwrap();
    make_upstream(&upstream, &[RELEASE_1_6]);

    let root = scratch.path().join("website");
    std::fs::create_dir_all(&root).unwrap();

    let mut config = RunConfig::new(&root);
    // The guarded fake tools make `go run` fail once the legacy API group is
    // pruned and make the generator fail while it is still present, so this
    // run only succeeds with the release-1.6 ordering.
    config.toolchain = fake_tool_config(scratch.path(), true);
    config.upstream_url = upstream.display().to_string();
    for spec in &mut config.branches {
        spec.enabled = spec.branch == RELEASE_1_6;
    }

    let summary = run(&config).unwrap();
    assert_eq!(summary.branches.len(), 1);

    let cli_doc = root.join("content/v1.6/cli/conductor.md");
    assert!(std::fs::read_to_string(&cli_doc)
        .unwrap()
        .contains("Usage: conductor [command]"));

    let api_docs = root.join("content/v1.6/reference/api-docs.md");
    assert_eq!(std::fs::read_to_string(&api_docs).unwrap(), "# API reference\n");
}

#[test]
fn test_summary_serializes_to_json() {
    let summary = refdocs::RunSummary {
        started: chrono::Utc::now(),
        finished: chrono::Utc::now(),
        branches: vec![refdocs::BranchOutcome {
            branch: "release-1.8".to_string(),
            version_dir: "v1.8".to_string(),
            api_docs: PathBuf::from("content/v1.8/reference/api-docs.md"),
            cli: vec![refdocs::CliReport {
                name: "conductor".to_string(),
                status: "written: content/v1.8/cli/conductor.md".to_string(),
            }],
        }],
    };

    let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["branches"][0]["branch"], "release-1.8");
    assert_eq!(json["branches"][0]["cli"][0]["name"], "conductor");
}

/// Full run against the real upstream. Requires go, npm, and network access.
#[test]
#[ignore]
#[serial]
fn test_full_run_against_real_upstream() {
    let root = tempfile::tempdir().unwrap();
    let config = RunConfig::new(root.path());

    let summary = run(&config).unwrap();
    for outcome in &summary.branches {
        let api_docs = root
            .path()
            .join("content")
            .join(&outcome.version_dir)
            .join("reference/api-docs.md");
        let metadata = std::fs::metadata(&api_docs).unwrap();
        assert!(metadata.len() > 0);
    }
}
