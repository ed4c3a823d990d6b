use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn fixture_data() -> PathBuf {
    PathBuf::from("tests/fixtures/sortcart.csv")
}

const HEADER: &str = "Street Name,From No,To No,Side,Beat No,Team No,Suburb,Postcode,Map Link";

#[test]
fn cli_export_writes_csv_file_alongside_text_output() {
    let dir = tempdir().expect("tempdir");
    let export_path = dir.path().join("beat.csv");

    let mut cmd = cargo_bin_cmd!("beatlookup");
    cmd.env_remove("BEATLOOKUP_DATA");
    cmd.arg("--data").arg(fixture_data());
    cmd.args(["beat", "1011", "--export"]);
    cmd.arg(&export_path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Found 4 match(es)."))
        .stderr(predicate::str::contains("Exported 4 row(s)"));

    let contents = fs::read_to_string(&export_path).expect("read export");
    let lines: Vec<&str> = contents.lines().collect();

    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], HEADER);
    assert!(lines[1].starts_with("CHURCH ROAD,10,30,Even,1011,3,ALPHA PARK,2163,https://www.google.com/maps/search/?api=1&query=10%20CHURCH%20ROAD"));
    assert!(!contents.contains("CHURCH RD"), "short names are not exported");
}

#[test]
fn cli_csv_format_matches_export_file_byte_for_byte() {
    let dir = tempdir().expect("tempdir");
    let export_path = dir.path().join("address.csv");

    let mut cmd = cargo_bin_cmd!("beatlookup");
    cmd.env_remove("BEATLOOKUP_DATA");
    cmd.arg("--data").arg(fixture_data());
    cmd.args(["address", "KING STREET", "23", "--format", "csv", "--export"]);
    cmd.arg(&export_path);

    let assert = cmd.assert().success();
    let stdout = assert.get_output().stdout.clone();
    let file = fs::read(&export_path).expect("read export");

    assert_eq!(stdout, file);

    let text = String::from_utf8(file).expect("utf-8");
    assert_eq!(text.lines().count(), 3);
    assert!(text.contains("query=23%20KING%20STREET%2C%20VILLAWOOD"));
}

#[test]
fn cli_export_of_empty_result_has_header_only() {
    let dir = tempdir().expect("tempdir");
    let export_path = dir.path().join("empty.csv");

    let mut cmd = cargo_bin_cmd!("beatlookup");
    cmd.env_remove("BEATLOOKUP_DATA");
    cmd.arg("--data").arg(fixture_data());
    cmd.args(["beat", "4242", "--export"]);
    cmd.arg(&export_path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No records found for this beat."));

    let contents = fs::read_to_string(&export_path).expect("read export");
    assert_eq!(contents, format!("{HEADER}\n"));
}

#[test]
fn cli_repeated_exports_are_identical() {
    let dir = tempdir().expect("tempdir");
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");

    for path in [&first, &second] {
        let mut cmd = cargo_bin_cmd!("beatlookup");
        cmd.env_remove("BEATLOOKUP_DATA");
        cmd.arg("--data").arg(fixture_data());
        cmd.args(["suburb", "LEIGHTONFIELD", "--format", "json", "--export"]);
        cmd.arg(path);
        cmd.assert().success();
    }

    assert_eq!(
        fs::read(&first).expect("first"),
        fs::read(&second).expect("second")
    );
}
