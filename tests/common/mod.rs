use contest_rating::{
    database::{db_structs::Player, json_store::JsonStore},
    utils::test_utils::temp_path
};
use std::{path::PathBuf, sync::Once};

static INIT: Once = Once::new();

/// Initialize test environment with RUST_LOG=WARN
pub fn init_test_env() {
    INIT.call_once(|| {
        std::env::set_var("RUST_LOG", "warn");
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A JSON store holding `players`, in a file unique to the calling test.
pub async fn seed_store(name: &str, players: &[Player]) -> JsonStore {
    JsonStore::create(temp_path(&format!("{}.json", name)), players)
        .await
        .expect("Failed to seed player store")
}

pub fn write_rank_file(name: &str, contents: &str) -> PathBuf {
    let path = temp_path(name);
    std::fs::write(&path, contents).expect("Failed to write rank file");

    path
}
