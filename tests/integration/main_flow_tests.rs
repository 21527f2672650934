use crate::common::{init_test_env, seed_store, write_rank_file};
use contest_rating::{
    database::{json_store::JsonStore, PlayerStore},
    utils::test_utils::{generate_player, temp_path}
};
use serial_test::serial;
use std::{
    path::Path,
    process::{Command, Output}
};

fn run_binary(db_file: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_contest-rating"))
        .env_remove("CONNECTION_STRING")
        .env("RUST_LOG", "error")
        .arg("--db-file")
        .arg(db_file)
        .args(args)
        .output()
        .expect("Failed to execute contest-rating")
}

/// Test that the application exits with error code when database connection fails
#[test]
#[serial]
fn test_application_exits_on_connection_failure() {
    let output = Command::new(env!("CARGO_BIN_EXE_contest-rating"))
        .env(
            "CONNECTION_STRING",
            "host=127.0.0.1 port=1 user=postgres password=wrong dbname=nonexistent connect_timeout=2"
        )
        .env("RUST_LOG", "error")
        .args(["reset"])
        .output()
        .expect("Failed to execute contest-rating");

    assert!(!output.status.success(), "Process should fail with invalid connection");
}

#[tokio::test]
#[serial]
async fn test_missing_rank_file_fails_without_mutation() {
    init_test_env();
    let store = seed_store("flow_missing_rank_file", &[generate_player("A", 1500.0, 350.0, 2)]).await;
    let before = std::fs::read(store.path()).unwrap();

    let output = run_binary(store.path(), &["process", "/nonexistent/codechef-none.in"]);

    assert!(!output.status.success());
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
}

#[tokio::test]
#[serial]
async fn test_empty_rank_file_fails_without_mutation() {
    init_test_env();
    let store = seed_store("flow_empty_rank_file", &[generate_player("A", 1500.0, 350.0, 2)]).await;
    let rank_file = write_rank_file("flow_empty.in", "\n\n");
    let before = std::fs::read(store.path()).unwrap();

    let output = run_binary(store.path(), &["process", rank_file.to_str().unwrap()]);

    assert!(!output.status.success());
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
}

#[tokio::test]
#[serial]
async fn test_no_known_participants_is_a_successful_no_op() {
    init_test_env();
    let mut active = generate_player("A", 1650.0, 150.0, 4);
    active.last_five = 1;
    let store = seed_store("flow_no_known", &[active]).await;
    let rank_file = write_rank_file("flow_no_known.in", "GHOST\nPHANTOM\n");
    let before = std::fs::read(store.path()).unwrap();

    let output = run_binary(store.path(), &["process", rank_file.to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
}

#[tokio::test]
#[serial]
async fn test_process_then_export() {
    init_test_env();
    let store = seed_store(
        "flow_process_export",
        &[
            generate_player("A", 1500.0, 350.0, 0),
            generate_player("B", 1500.0, 350.0, 0),
            generate_player("C", 1500.0, 350.0, 0),
        ]
    )
    .await;
    let rank_file = write_rank_file("flow_process_export.in", "B\nA\n");
    let scoreboard = temp_path("flow_scoreboard.csv");

    let processed = run_binary(store.path(), &["process", rank_file.to_str().unwrap()]);
    let exported = run_binary(store.path(), &["export", "--output", scoreboard.to_str().unwrap()]);

    assert!(processed.status.success());
    assert!(exported.status.success());

    let players = JsonStore::new(store.path()).get_players().await.unwrap();
    assert!(players[1].rating > players[0].rating);
    assert_eq!(players[2].times_played, 0);

    let csv = std::fs::read_to_string(&scoreboard).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("1,B,"));
    assert!(lines[2].starts_with("2,A,"));
}

#[tokio::test]
#[serial]
async fn test_reset_command() {
    init_test_env();
    let store = seed_store("flow_reset", &[generate_player("A", 1820.0, 95.0, 11)]).await;

    let output = run_binary(store.path(), &["reset"]);

    assert!(output.status.success());
    let players = JsonStore::new(store.path()).get_players().await.unwrap();
    assert_eq!(players[0].rating, 1500.0);
    assert_eq!(players[0].times_played, 0);
}
