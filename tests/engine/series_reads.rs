//! Chunked reads across series of several devices.

use exoquery::{InfoOptions, ListingOptions, ReadOptions, ResourceType, Row, SortOrder};
use serde_json::json;

use crate::common::Portal;

#[test]
fn merged_rows_across_devices() {
    let portal = Portal::new();
    let client = portal.client();
    let request = client
        .read_request(50, SortOrder::Desc)
        .chunk_size(7);

    let rows: Vec<Row> = client
        .read_many(&portal.auth, portal.series.clone(), request)
        .collect::<Result<_, _>>()
        .unwrap();

    let timestamps: Vec<i64> = rows.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, (50..=295).rev().step_by(5).collect::<Vec<_>>());
    assert!(portal.store.calls() <= 9);

    let at = |t: i64| rows.iter().find(|r| r.timestamp == t).unwrap();
    assert_eq!(at(295).values, vec![None, None, Some(json!(29.5))]);
    assert_eq!(at(195).values, vec![Some(json!(19.5)), None, Some(json!(19.5))]);
    assert_eq!(
        at(150).values,
        vec![Some(json!(15.0)), Some(json!(15.0)), Some(json!(15.0))]
    );
}

#[test]
fn windowed_ascending_read() {
    let portal = Portal::new();
    let client = portal.client();
    let request = client
        .read_request(1000, SortOrder::Asc)
        .window(Some(180), Some(220))
        .chunk_size(3);

    let rows: Vec<Row> = client
        .read_many(&portal.auth, portal.series.clone(), request)
        .collect::<Result<_, _>>()
        .unwrap();

    let timestamps: Vec<i64> = rows.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, (180..=220).step_by(5).collect::<Vec<_>>());
}

#[test]
fn device_alias_then_read() {
    let portal = Portal::new();
    let client = portal.client();
    let device_auth = portal.auth.as_client(portal.devices[0].clone());

    let humidity = client.lookup(&device_auth, "humidity").unwrap();
    assert_eq!(humidity, portal.series[1]);

    let latest = client
        .read(&device_auth, &humidity, ReadOptions::new(1, SortOrder::Desc))
        .unwrap();
    assert_eq!(latest[0].timestamp, 190);
}

#[test]
fn device_listing_with_latest_values() {
    let portal = Portal::new();
    let client = portal.client();
    let device_auth = portal.auth.as_client(portal.devices[0].clone());

    let listed = client
        .listing_with_info(
            &device_auth,
            &[ResourceType::Dataport],
            InfoOptions::new().with("description"),
            ListingOptions::default(),
            Some(ReadOptions::new(1, SortOrder::Desc)),
        )
        .unwrap();

    let (_, ports) = &listed[0];
    let names: Vec<_> = ports
        .iter()
        .map(|p| p.info["description"]["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("temp"), json!("humidity")]);
    let latest: Vec<_> = ports
        .iter()
        .map(|p| p.read.as_ref().unwrap()[0].timestamp)
        .collect();
    assert_eq!(latest, vec![195, 190]);
}

#[test]
fn flushed_points_are_not_read_back() {
    let portal = Portal::new();
    let client = portal.client();

    client
        .flush(&portal.auth, &portal.series[..2], Some(100), None)
        .unwrap();

    let rows: Vec<Row> = client
        .read_many(
            &portal.auth,
            portal.series[..2].to_vec(),
            client.read_request(5, SortOrder::Desc),
        )
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows[0].timestamp, 100);
}
