use predicates::prelude::*;
use predicates::str::{contains, diff};

#[test]
fn list_operators_prints_name_patterns() {
    let expected = concat!(
        "random\n",
        "remove_<n>\n",
        "replace_<n>\n",
        "replace_<n>_fill\n",
        "swap_<n>\n",
    );

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vod-placement");
    cmd.arg("list-operators");
    cmd.assert().success().stdout(diff(expected));
}

#[test]
fn show_config_prints_reference_scenario() {
    let expected = concat!(
        "Horizon: 0-3600s (3 intervals)\n",
        "Handling mean: 0.5s\n",
        "Jitter: 0.3-0.7s\n",
        "Movies:\n",
        "- 0: 850 (small)\n",
        "- 1: 950 (medium)\n",
        "- 2: 1000 (medium)\n",
        "- 3: 1200 (large)\n",
        "- 4: 800 (small)\n",
        "- 5: 900 (small)\n",
        "- 6: 1000 (medium)\n",
        "- 7: 750 (small)\n",
        "- 8: 700 (small)\n",
        "- 9: 1100 (medium)\n",
        "Capacities:\n",
        "- ASN1: 3500\n",
        "- ASN2: 3500\n",
        "Groups:\n",
        "- G1 (rates: 0.8, 1.2, 0.5; links: MSN 0.5s, ASN1 0.2s)\n",
        "- G2 (rates: 0.9, 1.3, 0.3; links: MSN 0.5s, ASN1 0.3s, ASN2 0.4s)\n",
        "- G3 (rates: 0.7, 1.5, 0.4; links: MSN 0.5s, ASN2 0.2s)\n",
        "Placement: baseline\n",
    );

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vod-placement");
    cmd.arg("show-config");
    cmd.assert().success().stdout(diff(expected));
}

#[test]
fn show_config_json_is_parseable() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vod-placement");
    cmd.args(["show-config", "--format", "json"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let value: serde_json::Value =
        serde_json::from_slice(&output).expect("stdout should be JSON");
    assert_eq!(value["scenario"]["capacities"]["ASN1"], 3500);
    assert_eq!(value["optimizer"]["operators"][0], "random");
}

#[test]
fn simulate_reports_each_run() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vod-placement");
    cmd.args(["simulate", "--runs", "2", "--seed", "7"]);
    cmd.assert()
        .success()
        .stdout(contains("Seed: 7\nArrivals: iterative\n"))
        .stdout(contains("Run 1: "))
        .stdout(contains("Run 2: "))
        .stdout(contains("Run 3: ").not())
        .stdout(contains("edge hits 0.0%"))
        .stdout(contains("Node totals:\nMSN: "));
}

#[test]
fn simulate_is_reproducible_for_a_seed() {
    let run = || {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vod-placement");
        cmd.args(["simulate", "--runs", "2", "--seed", "11", "--format", "json"]);
        cmd.assert().success().get_output().stdout.clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn optimize_prints_history_and_best_placement() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vod-placement");
    cmd.args([
        "optimize",
        "--iterations",
        "3",
        "--replications",
        "2",
        "--operator",
        "swap_one",
        "--operator",
        "replace_1_fill",
    ]);
    cmd.assert()
        .success()
        .stdout(contains("Metric: mean\nIterations:\n1 random -> accepted"))
        .stdout(contains("Best mean: "))
        .stdout(contains("- ASN1: ["));
}

#[test]
fn optimize_json_has_history() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vod-placement");
    cmd.args([
        "optimize",
        "--iterations",
        "2",
        "--replications",
        "2",
        "--metric",
        "median",
        "--format",
        "json",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let value: serde_json::Value =
        serde_json::from_slice(&output).expect("stdout should be JSON");
    assert_eq!(value["metric"], "median");
    assert_eq!(value["history"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["history"][0]["operator"], "random");
}
