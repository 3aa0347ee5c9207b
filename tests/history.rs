//! End-to-end history operations against a throwaway remote and a fake query
//! tool that answers from canned rows.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use git2::{Repository, Signature};
use tempfile::TempDir;

use gitreader::config::{Config, GitServerConfig, QueryConfig};
use gitreader::{AppError, ErrorKind, HistoryService};

const FAKE_TOOL: &str = r#"#!/bin/sh
printf '%s|%s\n' "$1" "$3" >> "@LOG@"
case "$1" in
  *"FROM blame WHERE path = 'records/2.json'"*)
    printf '%s\n' '{"commit_id":"c1"}' '{"commit_id":"c2"}' ;;
  *"FROM blame WHERE path = 'gap.json'"*)
    printf '%s\n' '{"commit_id":"c1"}' '{"commit_id":"c9"}' ;;
  *"FROM blame WHERE path = 'broken.json'"*)
    printf '%s' '{"commit_id":"c1"'
    echo 'database is locked' >&2
    exit 1 ;;
  *"FROM blame WHERE path = 'garbage.json'"*)
    echo 'this is not json' ;;
  *"FROM blame"*) ;;
  *"FROM files WHERE commit_id = 'c1' AND name = 'records/2.json'"*)
    printf '%s\n' '{"contents":"{\"id\":\"r-1\",\"version\":1}"}' ;;
  *"FROM files WHERE commit_id = 'c2' AND name = 'records/2.json'"*)
    printf '%s\n' '{"contents":"{\"id\":\"r-1\",\"version\":2}"}' '{"contents":"ignored"}' ;;
  *"FROM files WHERE commit_id = 'c1' AND name = 'notes.txt'"*)
    printf '%s\n' '{"contents":"plain text"}' ;;
  *"FROM files"*) ;;
  *"FROM commits WHERE id = 'c1'"*)
    printf '%s\n' '{"id":"c1","message":"first\n","summary":"first","author_name":"Ada","author_email":"ada@example.com","author_when":"2021-03-01T10:00:00Z","committer_name":"Ada","committer_email":"ada@example.com","committer_when":"2021-03-01T10:00:00Z","parent_id":null,"parent_count":0}' ;;
  *"FROM commits WHERE id = 'c2'"*)
    printf '%s\n' '{"id":"c2","message":"bump\n","summary":"bump","author_name":"Bo","author_email":"bo@example.com","author_when":"2021-03-02T10:00:00Z","committer_name":"Bo","committer_email":"bo@example.com","committer_when":"2021-03-02T10:00:00Z","parent_id":"c1","parent_count":1}' ;;
  *"FROM commits"*) ;;
esac
"#;

struct Fixture {
    _remote: TempDir,
    local: TempDir,
    exports: TempDir,
    log: PathBuf,
    service: HistoryService,
}

impl Fixture {
    fn new() -> Self {
        let remote = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        let exports = tempfile::tempdir().unwrap();
        seed_remote(&remote.path().join("ledger").join("records"));

        let log = exports.path().join("calls.log");
        let tool = local.path().join("fake-askgit.sh");
        std::fs::write(&tool, FAKE_TOOL.replace("@LOG@", &log.to_string_lossy())).unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let clones = local.path().join("clones");
        std::fs::create_dir(&clones).unwrap();

        let config = Config {
            git_server: GitServerConfig {
                url: remote.path().to_string_lossy().to_string(),
                username: "ledger".to_string(),
                local_repos_location: clones.to_string_lossy().to_string(),
                local_base_override: None,
            },
            query: QueryConfig {
                tool: tool.to_string_lossy().to_string(),
                artifact_dir: exports.path().to_path_buf(),
            },
        };

        Self {
            _remote: remote,
            local,
            exports,
            log,
            service: HistoryService::new(config),
        }
    }

    fn clone_path(&self, repo: &str) -> PathBuf {
        self.local.path().join("clones").join(repo)
    }

    fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn assert_no_artifacts(&self) {
        let leftovers: Vec<_> = std::fs::read_dir(self.exports.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(".json"))
            .collect();
        assert!(leftovers.is_empty(), "leftover artifacts: {leftovers:?}");
    }
}

fn seed_remote(path: &Path) {
    let repo = Repository::init(path).unwrap();
    std::fs::create_dir_all(path.join("records")).unwrap();
    std::fs::write(path.join("records/2.json"), r#"{"id":"r-1","version":1}"#).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new("records/2.json")).unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Ada", "ada@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "first", &tree, &[])
        .unwrap();
}

#[test]
fn lists_commits_after_cloning() {
    let fx = Fixture::new();

    let ids = fx
        .service
        .list_commits_for_file("records/2.json", "records")
        .unwrap();

    assert_eq!(ids, vec!["c1", "c2"]);
    assert!(fx.clone_path("records").join("records/2.json").exists());
    assert_eq!(
        fx.calls(),
        vec![format!(
            "SELECT DISTINCT commit_id FROM blame WHERE path = 'records/2.json'|{}",
            fx.clone_path("records").display()
        )]
    );
    fx.assert_no_artifacts();
}

#[test]
fn no_matching_commit_is_not_found() {
    let fx = Fixture::new();

    let err = fx
        .service
        .list_commits_for_file("unknown.json", "records")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    fx.assert_no_artifacts();
}

#[test]
fn history_keeps_commit_order() {
    let fx = Fixture::new();

    let commits = fx.service.history("records/2.json", "records").unwrap();

    let ids: Vec<_> = commits.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
    assert_eq!(commits[0].parent_id, "");
    assert_eq!(commits[1].parent_id, "c1");
    assert_eq!(commits[1].author_email, "bo@example.com");
    assert_eq!(fx.calls().len(), 3);
    fx.assert_no_artifacts();
}

#[test]
fn history_fails_whole_when_one_commit_is_missing() {
    let fx = Fixture::new();

    let err = fx.service.history("gap.json", "records").unwrap_err();

    match err {
        AppError::NotFound(msg) => assert!(msg.contains("c9")),
        other => panic!("expected not found, got {other:?}"),
    }
    fx.assert_no_artifacts();
}

#[test]
fn content_uses_first_row_only() {
    let fx = Fixture::new();

    let contents = fx
        .service
        .content_at_commit("c2", "records/2.json", "records")
        .unwrap();

    assert_eq!(contents, r#"{"id":"r-1","version":2}"#);
    fx.assert_no_artifacts();
}

#[test]
fn missing_content_is_not_found() {
    let fx = Fixture::new();

    let err = fx
        .service
        .content_at_commit("c2", "absent.json", "records")
        .unwrap_err();

    match err {
        AppError::NotFound(msg) => assert_eq!(msg, "no results were found"),
        other => panic!("expected not found, got {other:?}"),
    }
    fx.assert_no_artifacts();
}

#[test]
fn failed_run_still_removes_partial_artifact() {
    let fx = Fixture::new();

    let err = fx
        .service
        .list_commits_for_file("broken.json", "records")
        .unwrap_err();

    match &err {
        AppError::Execution { detail, .. } => assert!(detail.contains("database is locked")),
        other => panic!("expected execution error, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    fx.assert_no_artifacts();
}

#[test]
fn malformed_output_is_a_decode_error() {
    let fx = Fixture::new();

    let err = fx
        .service
        .list_commits_for_file("garbage.json", "records")
        .unwrap_err();

    assert!(matches!(err, AppError::Decode { .. }));
    fx.assert_no_artifacts();
}

#[test]
fn diff_highlights_the_changed_value() {
    let fx = Fixture::new();

    let html = fx
        .service
        .diff("c1", "c2", "records/2.json", "records")
        .unwrap();

    assert_eq!(
        html,
        "{\n\t\"id\": \"r-1\",\n\t\"version\": <span class=\"removed-code\">1</span><span class=\"added-code\">2</span>\n}"
    );
    fx.assert_no_artifacts();
}

#[test]
fn diff_of_non_json_content_is_a_format_error() {
    let fx = Fixture::new();

    let err = fx
        .service
        .diff("c1", "c1", "notes.txt", "records")
        .unwrap_err();

    assert!(matches!(err, AppError::Format { .. }));
    fx.assert_no_artifacts();
}

#[test]
fn clone_failure_runs_no_query() {
    let fx = Fixture::new();

    let err = fx
        .service
        .list_commits_for_file("records/2.json", "ghost")
        .unwrap_err();

    match err {
        AppError::Clone { url, .. } => {
            assert_eq!(url, fx.service.config().remote_url("ghost"));
            assert!(url.ends_with("/ledger/ghost"));
        }
        other => panic!("expected clone error, got {other:?}"),
    }
    assert!(fx.calls().is_empty());
    fx.assert_no_artifacts();
}

#[test]
fn concurrent_calls_share_one_clone() {
    let fx = Fixture::new();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    fx.service
                        .list_commits_for_file("records/2.json", "records")
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec!["c1", "c2"]);
        }
    });

    assert_eq!(fx.calls().len(), 4);
    fx.assert_no_artifacts();
}
