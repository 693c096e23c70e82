use std::process::{Command, Output};

use tempfile::TempDir;

fn etl_load(dir: &TempDir, args: &[&str]) -> Output {
    let url = format!("sqlite:{}", dir.path().join("cli.db").display());
    Command::new(env!("CARGO_BIN_EXE_etl-load"))
        .args(args)
        .current_dir(dir.path())
        .env("DATABASE_URL", url)
        .env_remove("ETL_BATCH_SIZE")
        .env("RUST_LOG", "warn")
        .output()
        .expect("spawn etl-load")
}

fn base<'a>(task: &'a str, country: &'a str, from: &'a str) -> Vec<&'a str> {
    vec![
        "-t", task, "-c", country, "--date-from", from, "--date-to", "2023-01-01", "-r", "D",
    ]
}

#[test]
fn unknown_country_fails_before_touching_the_warehouse() {
    let dir = TempDir::new().unwrap();
    let out = etl_load(&dir, &[base("ASNS", "XX", "2023-01-01"), vec!["--init-schema"]].concat());

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown country code"));
    assert!(!dir.path().join("cli.db").exists());
}

#[test]
fn unknown_task_and_resolution_are_rejected() {
    let dir = TempDir::new().unwrap();
    assert!(!etl_load(&dir, &base("PRICES", "NL", "2023-01-01")).status.success());

    let mut args = base("ASNS", "NL", "2023-01-01");
    let last = args.len() - 1;
    args[last] = "Q";
    assert!(!etl_load(&dir, &args).status.success());
}

#[test]
fn malformed_date_is_rejected() {
    let dir = TempDir::new().unwrap();
    let out = etl_load(&dir, &base("ASNS", "NL", "01/01/2023"));
    assert!(!out.status.success());
}

#[test]
fn empty_date_range_runs_without_fetching() {
    let dir = TempDir::new().unwrap();
    // from is after to, so the planner yields nothing and no request is made
    let out = etl_load(
        &dir,
        &[base("asns", "nl", "2023-02-01"), vec!["--init-schema"]].concat(),
    );

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.path().join("cli.db").exists());
}
