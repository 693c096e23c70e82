mod common;
use common::{d, setup_warehouse};

use metrics_ingestor::models::{
    radar::TrafficSeries,
    registry::{Neighbour, ResourceStat, StatsResolution, TimelineSlot},
};
use warehouse_sync::{
    domains::{
        CountryScope,
        asn::{AsnInventory, AsnRecord},
        country_stat::{self, CountryStats, StatScope},
        neighbour::{self, AsnNeighbours},
        traffic::{self, CountryTraffic},
    },
    error::{EtlError, StorageError},
    read,
    sync::{LoadOptions, sync_rows},
};

fn asn(asn: i64, is_routed: bool) -> AsnRecord {
    AsnRecord {
        country_iso2: "US".into(),
        as_of_date: d(2023, 1, 1),
        asn,
        is_routed,
    }
}

fn stat(start: &str, v4_prefixes_ris: Option<i64>) -> ResourceStat {
    ResourceStat {
        timeline: vec![TimelineSlot {
            starttime: start.to_string(),
            endtime: None,
        }],
        v4_prefixes_ris,
        asns_ris: Some(12),
        ..Default::default()
    }
}

#[test]
fn loading_the_same_batch_twice_is_idempotent() {
    let wh = setup_warehouse();
    let scope = CountryScope::new("US");
    let batch = vec![asn(123, true), asn(456, false)];

    let first = sync_rows::<AsnInventory>(&wh.pool, &scope, batch.clone(), &wh.options()).unwrap();
    assert_eq!(first.inserted, 2);

    let second = sync_rows::<AsnInventory>(&wh.pool, &scope, batch, &wh.options()).unwrap();
    assert!(second.is_noop());
    assert_eq!(second.already_stored, 2);

    let stored = read::asn_records(&wh.pool, "US").unwrap();
    assert_eq!(stored, vec![asn(123, true), asn(456, false)]);
}

#[test]
fn partially_overlapping_batches_add_only_new_keys() {
    let wh = setup_warehouse();
    let scope = CountryScope::new("US");

    sync_rows::<AsnInventory>(&wh.pool, &scope, vec![asn(1, true), asn(2, true)], &wh.options())
        .unwrap();
    let report =
        sync_rows::<AsnInventory>(&wh.pool, &scope, vec![asn(2, true), asn(3, false)], &wh.options())
            .unwrap();

    assert_eq!(report.already_stored, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(read::table_counts(&wh.pool).unwrap().asn, 3);
}

#[test]
fn repeated_keys_inside_one_batch_are_inserted_once() {
    let wh = setup_warehouse();
    let scope = CountryScope::new("US");
    // batch_size 1 puts the repeat in a later chunk, after the first insert
    let opts = LoadOptions {
        batch_size: 1,
        ..wh.options()
    };

    let report = sync_rows::<AsnInventory>(
        &wh.pool,
        &scope,
        vec![asn(7, true), asn(8, true), asn(7, true)],
        &opts,
    )
    .unwrap();

    assert_eq!(report.candidates, 3);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.already_stored, 1);
    assert_eq!(read::table_counts(&wh.pool).unwrap().asn, 2);
}

#[test]
fn absent_measures_round_trip_as_null() {
    let wh = setup_warehouse();
    let rows = country_stat::stats_from(
        "NL",
        StatsResolution::Daily,
        &[stat("2023-01-01T00:00:00", None)],
    )
    .unwrap();
    let scope = StatScope {
        country_iso2: "NL".into(),
        resolution: StatsResolution::Daily,
    };
    sync_rows::<CountryStats>(&wh.pool, &scope, rows.clone(), &wh.options()).unwrap();

    let stored = read::country_stats(&wh.pool, "NL", Some(StatsResolution::Daily)).unwrap();
    assert_eq!(stored, rows);
    assert_eq!(stored[0].v4_prefixes_ris, None);
    assert_eq!(stored[0].asns_ris, Some(12));
}

#[test]
fn zulu_and_explicit_offset_are_the_same_key() {
    let wh = setup_warehouse();
    let scope = StatScope {
        country_iso2: "NL".into(),
        resolution: StatsResolution::FiveMinute,
    };
    let zulu = country_stat::stats_from(
        "NL",
        StatsResolution::FiveMinute,
        &[stat("2023-01-01T00:00:00Z", Some(1))],
    )
    .unwrap();
    let offset = country_stat::stats_from(
        "NL",
        StatsResolution::FiveMinute,
        &[stat("2023-01-01T00:00:00+00:00", Some(2))],
    )
    .unwrap();

    sync_rows::<CountryStats>(&wh.pool, &scope, zulu, &wh.options()).unwrap();
    let report = sync_rows::<CountryStats>(&wh.pool, &scope, offset, &wh.options()).unwrap();

    assert_eq!(report.already_stored, 1);
    let stored = read::country_stats(&wh.pool, "NL", None).unwrap();
    assert_eq!(stored.len(), 1);
    // write-once: the first value stays
    assert_eq!(stored[0].v4_prefixes_ris, Some(1));
}

#[test]
fn same_timestamp_at_other_resolution_is_a_new_key() {
    let wh = setup_warehouse();
    for resolution in [StatsResolution::Daily, StatsResolution::FiveMinute] {
        let rows =
            country_stat::stats_from("NL", resolution, &[stat("2023-01-01T00:00:00", Some(1))])
                .unwrap();
        let scope = StatScope {
            country_iso2: "NL".into(),
            resolution,
        };
        let report = sync_rows::<CountryStats>(&wh.pool, &scope, rows, &wh.options()).unwrap();
        assert_eq!(report.inserted, 1);
    }
    assert_eq!(read::table_counts(&wh.pool).unwrap().country_stat, 2);
}

#[test]
fn neighbour_edge_reported_by_two_countries_is_stored_once() {
    let wh = setup_warehouse();
    let peer = Neighbour {
        asn: 200,
        kind: "peer".into(),
        power: Some(5),
        v4_peers: Some(4),
        v6_peers: Some(1),
    };
    let edges = neighbour::edges_from(100, d(2023, 1, 1), &[peer]);

    for country in ["DE", "FR"] {
        sync_rows::<AsnNeighbours>(
            &wh.pool,
            &CountryScope::new(country),
            edges.clone(),
            &wh.options(),
        )
        .unwrap();
    }

    assert_eq!(read::neighbour_edges(&wh.pool, 100).unwrap(), edges);
}

#[test]
fn empty_batch_writes_nothing() {
    let wh = setup_warehouse();
    let opts = LoadOptions {
        persist_audit: true,
        ..wh.options()
    };

    let report = sync_rows::<AsnInventory>(&wh.pool, &CountryScope::new("US"), vec![], &opts).unwrap();

    assert!(report.is_noop());
    assert_eq!(read::table_counts(&wh.pool).unwrap(), Default::default());
    assert!(wh.audit_files().is_empty());
}

#[test]
fn fully_stored_batch_writes_no_audit_file() {
    let wh = setup_warehouse();
    let scope = CountryScope::new("US");
    sync_rows::<AsnInventory>(&wh.pool, &scope, vec![asn(1, true)], &wh.options()).unwrap();

    let opts = LoadOptions {
        persist_audit: true,
        ..wh.options()
    };
    let report = sync_rows::<AsnInventory>(&wh.pool, &scope, vec![asn(1, true)], &opts).unwrap();

    assert!(report.audit_files.is_empty());
    assert!(wh.audit_files().is_empty());
}

#[test]
fn audit_only_mode_saves_sql_without_writing() {
    let wh = setup_warehouse();
    let series = TrafficSeries {
        timestamps: vec!["2024-01-01T00:00:00Z".into(), "2024-01-08T00:00:00Z".into()],
        values: vec![0.25, 0.5],
    };
    let rows = traffic::samples_from("BR", &series).unwrap();
    let opts = LoadOptions {
        persist_audit: true,
        write_to_store: false,
        ..wh.options()
    };

    let report =
        sync_rows::<CountryTraffic>(&wh.pool, &CountryScope::new("BR"), rows, &opts).unwrap();

    assert_eq!(report.new_rows, 2);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.audit_files.len(), 1);
    assert!(read::traffic_samples(&wh.pool, "BR").unwrap().is_empty());

    let sql = std::fs::read_to_string(&report.audit_files[0]).unwrap();
    assert!(sql.starts_with("INSERT INTO country_traffic (country_iso2, sample_timestamp, traffic)"));
    assert!(sql.contains("'2024-01-08 00:00:00+00:00'"));
}

#[test]
fn fractional_seconds_share_the_stored_key() {
    let wh = setup_warehouse();
    let scope = CountryScope::new("BR");
    let series = |stamps: &[&str]| TrafficSeries {
        timestamps: stamps.iter().map(|s| s.to_string()).collect(),
        values: vec![0.5; stamps.len()],
    };

    let once = traffic::samples_from("BR", &series(&["2024-01-01T00:00:00.500Z"])).unwrap();
    let first = sync_rows::<CountryTraffic>(&wh.pool, &scope, once.clone(), &wh.options()).unwrap();
    assert_eq!(first.inserted, 1);
    let rerun = sync_rows::<CountryTraffic>(&wh.pool, &scope, once, &wh.options()).unwrap();
    assert!(rerun.is_noop());
    assert_eq!(rerun.already_stored, 1);

    // two instants inside one second collapse to one row
    let same_second = traffic::samples_from(
        "BR",
        &series(&["2024-01-08T00:00:00.200Z", "2024-01-08T00:00:00.700Z"]),
    )
    .unwrap();
    let report =
        sync_rows::<CountryTraffic>(&wh.pool, &scope, same_second, &wh.options()).unwrap();
    assert_eq!(report.repeated, 1);
    assert_eq!(report.inserted, 1);

    let stored = read::traffic_samples(&wh.pool, "BR").unwrap();
    let stamps: Vec<String> = stored.iter().map(|s| s.sample_timestamp.to_string()).collect();
    assert_eq!(stamps, ["2024-01-01 00:00:00+00:00", "2024-01-08 00:00:00+00:00"]);
}

#[test]
fn rejected_insert_rolls_back_and_surfaces_a_storage_error() {
    let wh = setup_warehouse();
    wh.pool
        .batch_execute(
            "CREATE TRIGGER reject_asn BEFORE INSERT ON asn WHEN NEW.asn = 456 \
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();
    let opts = LoadOptions {
        persist_audit: true,
        ..wh.options()
    };

    let err = sync_rows::<AsnInventory>(
        &wh.pool,
        &CountryScope::new("US"),
        vec![asn(123, true), asn(456, false)],
        &opts,
    )
    .unwrap_err();

    assert!(matches!(err, EtlError::Storage(StorageError::Query(_))), "{err:?}");
    // the first row of the statement is rolled back with the second
    assert!(read::asn_records(&wh.pool, "US").unwrap().is_empty());
    // the statement was saved before it ran
    let files = wh.audit_files();
    assert_eq!(files.len(), 1);
    let sql = std::fs::read_to_string(&files[0]).unwrap();
    assert!(sql.starts_with("INSERT INTO asn"));
}
