mod common;

use common::{stderr_lines, Repo, FOX, FOX_MD5};

#[test]
fn missing_paths_is_a_usage_error() {
    let repo = Repo::new();
    let assert = repo.qdvc().arg("add").assert().code(2);
    assert!(stderr_lines(&assert).contains(&"✗ No paths given.".to_string()));
}

#[test]
fn outside_a_repository_fails() {
    let repo = Repo::bare();
    repo.write("file.txt", FOX);
    repo.qdvc().args(["add", "file.txt"]).assert().code(3);
}

#[test]
fn remote_commands_need_credentials() {
    let repo = Repo::new();
    repo.write_pointer("file.txt", FOX_MD5, 44);
    repo.qdvc().args(["pull", "file.txt"]).assert().code(4);
    repo.qdvc()
        .args(["status", "--repo", "file.txt"])
        .assert()
        .code(4);
}

#[test]
fn local_commands_need_no_credentials() {
    let repo = Repo::new();
    repo.write("file.txt", FOX);
    repo.qdvc().args(["status", "file.txt"]).assert().success();
}

#[test]
fn unmatched_inputs_find_no_files() {
    let repo = Repo::new();
    repo.qdvc().args(["status", "*.png"]).assert().code(5);
}

#[test]
fn missing_remote_url_is_reported() {
    let repo = Repo::new();
    repo.write_pointer("file.txt", FOX_MD5, 44);
    repo.qdvc()
        .args(["-u", "user", "-p", "token", "push", "file.txt"])
        .assert()
        .code(6);
}
