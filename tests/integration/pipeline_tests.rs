use crate::common::{init_test_env, seed_store, write_rank_file};
use contest_rating::{
    database::{db_structs::Player, json_store::JsonStore, PlayerStore},
    leaderboard::export_leaderboard,
    model::{
        processor::{process_rank_file, ContestProcessor, ProcessorError},
        rank_file::RankFileError,
        rating::RatingParameters,
        structures::site::Site
    },
    reconcile::reconcile_handles,
    utils::test_utils::{generate_player, generate_players, temp_path}
};
use serial_test::serial;

fn fresh(ids: &[&str]) -> Vec<Player> {
    ids.iter().map(|id| Player::new(*id, format!("Player {}", id))).collect()
}

fn find<'a>(players: &'a [Player], id: &str) -> &'a Player {
    players.iter().find(|p| p.id == id).unwrap()
}

#[tokio::test]
#[serial]
async fn test_contest_is_written_back() {
    init_test_env();
    let mut store = seed_store("pipeline_written_back", &fresh(&["A", "B", "C", "D"])).await;
    let rank_file = write_rank_file("pipeline_written_back.in", "A\nB C\nD\n");

    let outcome = process_rank_file(&mut store, &rank_file, &ContestProcessor::default())
        .await
        .unwrap();
    let players = store.get_players().await.unwrap();

    assert_eq!(outcome.n, 4);
    assert_eq!(find(&players, "B").rating.to_bits(), find(&players, "C").rating.to_bits());
    assert!(find(&players, "A").rating > find(&players, "B").rating);
    assert!(find(&players, "B").rating > find(&players, "D").rating);
    assert!(players.iter().all(|p| p.times_played == 1 && p.last_five == 5));
}

#[tokio::test]
#[serial]
async fn test_absentees_decay_across_contests() {
    init_test_env();
    let mut players = fresh(&["A", "B"]);
    let mut idle = generate_player("IDLE", 1900.0, 120.0, 8);
    idle.last_five = 2;
    players.push(idle);
    players.push(Player::new("NEW", "Newcomer"));
    let mut store = seed_store("pipeline_decay", &players).await;
    let rank_file = write_rank_file("pipeline_decay.in", "A\nB\n");
    let processor = ContestProcessor::default();

    process_rank_file(&mut store, &rank_file, &processor).await.unwrap();
    let after_first = store.get_players().await.unwrap();
    assert_eq!(find(&after_first, "IDLE").rating, 1900.0);
    assert_eq!(find(&after_first, "IDLE").last_five, 1);

    let outcome = process_rank_file(&mut store, &rank_file, &processor).await.unwrap();
    let after_second = store.get_players().await.unwrap();
    assert!((find(&after_second, "IDLE").rating - 1881.0).abs() < 1e-9);
    assert_eq!(find(&after_second, "IDLE").last_five, 5);
    assert_eq!(find(&after_second, "NEW"), find(&players, "NEW"));
    assert_eq!(outcome.decayed(), 1);
}

#[tokio::test]
#[serial]
async fn test_replay_from_snapshot_is_identical() {
    init_test_env();
    let snapshot = generate_players(30, 99);
    let rank_file = write_rank_file("pipeline_replay.in", "P3 P7\nP1\nP12 P0 P5\nP28\nP9\n");
    let processor = ContestProcessor::default();

    let mut first = seed_store("pipeline_replay_a", &snapshot).await;
    let mut second = seed_store("pipeline_replay_b", &snapshot).await;
    process_rank_file(&mut first, &rank_file, &processor).await.unwrap();
    process_rank_file(&mut second, &rank_file, &processor).await.unwrap();

    assert_eq!(
        std::fs::read(first.path()).unwrap(),
        std::fs::read(second.path()).unwrap()
    );
}

#[tokio::test]
#[serial]
async fn test_unknown_identifiers_are_skipped() {
    init_test_env();
    let mut store = seed_store("pipeline_unknown", &fresh(&["A", "B"])).await;
    let rank_file = write_rank_file("pipeline_unknown.in", "GHOST\nA\nSTRANGER\nB\n");

    let outcome = process_rank_file(&mut store, &rank_file, &ContestProcessor::default())
        .await
        .unwrap();
    let players = store.get_players().await.unwrap();

    assert_eq!(outcome.ignored, vec!["GHOST".to_string(), "STRANGER".to_string()]);
    assert_eq!(outcome.n, 2);
    assert_eq!(players.len(), 2);
    assert!(find(&players, "A").rating > 1500.0);
    assert!(find(&players, "A").rating > find(&players, "B").rating);
}

#[tokio::test]
#[serial]
async fn test_longer_decay_window_round_trips() {
    init_test_env();
    let mut players = fresh(&["A", "B"]);
    let mut idle = generate_player("IDLE", 1700.0, 150.0, 6);
    idle.last_five = 7;
    players.push(idle);
    let mut store = JsonStore::new(temp_path("pipeline_decay_window.json"))
        .with_decay_window(7)
        .seed(&players)
        .await
        .unwrap();
    let rank_file = write_rank_file("pipeline_decay_window.in", "A\nB\n");
    let processor = ContestProcessor::new(RatingParameters {
        decay_window: 7,
        ..Default::default()
    });

    process_rank_file(&mut store, &rank_file, &processor).await.unwrap();
    process_rank_file(&mut store, &rank_file, &processor).await.unwrap();
    let players = store.get_players().await.unwrap();

    assert_eq!(find(&players, "A").last_five, 7);
    assert_eq!(find(&players, "IDLE").last_five, 5);
    assert_eq!(find(&players, "IDLE").rating, 1700.0);
    assert_eq!(find(&players, "A").times_played, 2);
}

#[tokio::test]
#[serial]
async fn test_failed_runs_leave_store_untouched() {
    init_test_env();
    let mut store = seed_store("pipeline_failed", &fresh(&["A", "B"])).await;
    let before = std::fs::read(store.path()).unwrap();
    let processor = ContestProcessor::default();

    let missing = process_rank_file(&mut store, &temp_path("pipeline_missing.in"), &processor).await;
    let empty_field = process_rank_file(
        &mut store,
        &write_rank_file("pipeline_failed.in", "X\nY\n"),
        &processor
    )
    .await;

    assert!(matches!(missing, Err(ProcessorError::RankFile(RankFileError::Io { .. }))));
    assert!(matches!(empty_field, Err(ProcessorError::EmptyField)));
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
}

#[tokio::test]
#[serial]
async fn test_reconcile_then_process() {
    init_test_env();
    let mut alice = Player::new("01FB15ECS001", "Alice");
    alice.handles.insert(Site::Codechef, "alice_cc".to_string());
    let mut bob = Player::new("01FB15ECS002", "Bob");
    bob.handles.insert(Site::Codechef, "bob".to_string());
    let mut store = seed_store("pipeline_reconcile", &[alice, bob]).await;

    let ranks_dir = temp_path("pipeline_contest_ranks");
    let _ = std::fs::remove_dir_all(&ranks_dir);
    std::fs::create_dir_all(&ranks_dir).unwrap();
    let rank_file = ranks_dir.join("codechef-cookoff-jan.in");
    std::fs::write(&rank_file, "bob\nstranger alice_cc\n").unwrap();
    std::fs::write(ranks_dir.join("topcoder-srm.in"), "bob\n").unwrap();
    let report = temp_path("pipeline_unmapped.out");

    let summary = reconcile_handles(&store, &ranks_dir, &report).await.unwrap();

    assert_eq!(summary.files_rewritten, 1);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(
        std::fs::read_to_string(&rank_file).unwrap(),
        "01FB15ECS002\nstranger 01FB15ECS001\n"
    );
    assert_eq!(std::fs::read_to_string(&report).unwrap(), "1\ncodechef stranger 1\n");

    let outcome = process_rank_file(&mut store, &rank_file, &ContestProcessor::default())
        .await
        .unwrap();
    assert_eq!(outcome.n, 2);
    assert_eq!(outcome.adjustment("01FB15ECS001").and_then(|a| a.rank), Some(2));
}

#[tokio::test]
#[serial]
async fn test_export_after_contest() {
    init_test_env();
    let mut store = seed_store("pipeline_export", &fresh(&["A", "B", "C"])).await;
    let rank_file = write_rank_file("pipeline_export.in", "C\nA\n");
    process_rank_file(&mut store, &rank_file, &ContestProcessor::default())
        .await
        .unwrap();
    let output = temp_path("pipeline_scoreboard.csv");

    let ranked = export_leaderboard(&store, &output).await.unwrap();

    assert_eq!(ranked, 2);
    let csv = std::fs::read_to_string(&output).unwrap();
    assert!(csv.starts_with("Rank,USN,Name,Graduation Year,Contests,Rating,Best\n1,C,Player C,,1,"));
}
