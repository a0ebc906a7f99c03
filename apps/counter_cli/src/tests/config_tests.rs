use super::*;

use std::{
    collections::HashMap,
    env,
    sync::atomic::{AtomicU32, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

static NEXT_DIR: AtomicU32 = AtomicU32::new(0);

fn temp_config(contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let n = NEXT_DIR.fetch_add(1, Ordering::SeqCst);
    let dir = env::temp_dir().join(format!("counter_cli_config_test_{suffix}_{n}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("counter.toml");
    fs::write(&path, contents).expect("write config");
    path
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn defaults_target_devnet_with_program_minimum_fee() {
    let settings = Settings::default();
    assert_eq!(settings.rpc_url, "https://api.devnet.solana.com");
    assert_eq!(settings.program_id, PROGRAM_ID);
    assert_eq!(settings.fee_lamports, 10_000_000);
    assert_eq!(settings.commitment, Commitment::Confirmed);
    assert!(settings.keypair_path.ends_with(".config/solana/id.json"));
}

#[test]
fn resolves_cluster_monikers_and_urls() {
    assert_eq!(
        resolve_rpc_url("localnet").expect("moniker"),
        "http://127.0.0.1:8899"
    );
    assert_eq!(
        resolve_rpc_url("mainnet-beta").expect("moniker"),
        "https://api.mainnet-beta.solana.com"
    );
    assert_eq!(
        resolve_rpc_url("https://rpc.example.org").expect("url"),
        "https://rpc.example.org"
    );
    assert!(resolve_rpc_url("ws://rpc.example.org").is_err());
    assert!(resolve_rpc_url("not a url").is_err());
}

#[test]
fn file_then_env_then_flags() {
    let path = temp_config(
        r#"
rpc_url = "testnet"
fee_lamports = 20000000
commitment = "finalized"
keypair = "/tmp/file.json"
refresh_attempts = 3
"#,
    );
    let env_vars = HashMap::from([
        ("COUNTER__FEE_LAMPORTS", "30000000"),
        ("COUNTER__RPC_URL", "devnet"),
    ]);
    let overrides = Overrides {
        rpc_url: Some("http://127.0.0.1:9999".into()),
        keypair: None,
    };

    let settings = load_settings_with(Some(&path), &overrides, |key| {
        env_vars.get(key).map(|v| v.to_string())
    })
    .expect("settings");

    assert_eq!(settings.rpc_url, "http://127.0.0.1:9999");
    assert_eq!(settings.fee_lamports, 30_000_000);
    assert_eq!(settings.commitment, Commitment::Finalized);
    assert_eq!(settings.keypair_path, PathBuf::from("/tmp/file.json"));
    assert_eq!(settings.refresh_attempts, 3);

    let config = settings.controller_config();
    assert_eq!(config.refresh.max_attempts, 3);
    assert_eq!(config.mutation_fee_lamports, 30_000_000);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn explicit_config_file_must_exist() {
    let missing = env::temp_dir().join("counter_cli_does_not_exist.toml");
    assert!(load_settings_with(Some(&missing), &Overrides::default(), no_env).is_err());
}

#[test]
fn rejects_invalid_values() {
    let bad_program = HashMap::from([("COUNTER__PROGRAM_ID", "not-base58!")]);
    let err = load_settings_with(None, &Overrides::default(), |key| {
        bad_program.get(key).map(|v| v.to_string())
    })
    .expect_err("bad program id");
    assert!(err.to_string().contains("invalid program id"));

    let bad_commitment = HashMap::from([("COUNTER__COMMITMENT", "eventually")]);
    assert!(load_settings_with(None, &Overrides::default(), |key| {
        bad_commitment.get(key).map(|v| v.to_string())
    })
    .is_err());

    let path = temp_config("rpc_url = \"devnet\"\nunknown_key = 1\n");
    assert!(load_settings_with(Some(&path), &Overrides::default(), no_env).is_err());
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn zero_refresh_attempts_is_rejected() {
    let path = temp_config("refresh_attempts = 0\n");
    let err = load_settings_with(Some(&path), &Overrides::default(), no_env)
        .expect_err("zero attempts");
    assert!(err.to_string().contains("refresh_attempts"));
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn fixed_settle_switch_selects_single_delayed_read() {
    let path = temp_config("fixed_settle = true\n");
    let settings =
        load_settings_with(Some(&path), &Overrides::default(), no_env).expect("settings");
    assert!(settings.fixed_settle);
    assert_eq!(settings.controller_config().refresh, RefreshPolicy::fixed_settle());
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");

    let env_vars = HashMap::from([("COUNTER__FIXED_SETTLE", "yes")]);
    assert!(load_settings_with(None, &Overrides::default(), |key| {
        env_vars.get(key).map(|v| v.to_string())
    })
    .is_err());
}
