// SPDX-License-Identifier: Apache-2.0

use aigmap::aig_serdes::emit_aiger::emit_aiger;
use aigmap::test_utils::{mixed_graph, nor_graph};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const FULL_LIBRARY: &str = r#"{
  "information": {"cell_num": "9", "attribute_num": "7"},
  "cells": [
    {"cell_name": "and_1", "cell_type": "and", "data_4_f": "2.0", "data_6_f": "4.0"},
    {"cell_name": "and_2", "cell_type": "and", "data_4_f": "1.5", "data_6_f": "5.0"},
    {"cell_name": "not_1", "cell_type": "not", "data_4_f": "0.5", "data_6_f": "1.0"},
    {"cell_name": "not_2", "cell_type": "not", "data_4_f": "0.25", "data_6_f": "2.0"},
    {"cell_name": "nand_1", "cell_type": "nand", "data_4_f": "1.0", "data_6_f": "3.0"},
    {"cell_name": "nor_1", "cell_type": "nor", "data_4_f": "1.25", "data_6_f": "3.0"},
    {"cell_name": "or_1", "cell_type": "or", "data_4_f": "1.75", "data_6_f": "4.0"},
    {"cell_name": "xor_1", "cell_type": "xor", "data_4_f": "3.0", "data_6_f": "6.0"},
    {"cell_name": "xnor_1", "cell_type": "xnor", "data_4_f": "3.0", "data_6_f": "6.0"}
  ]
}"#;

const AND_NOT_LIBRARY: &str = r#"{"cells": [
    {"cell_name": "and_1", "cell_type": "and", "data_4_f": 2.0, "data_6_f": 4.0},
    {"cell_name": "not_1", "cell_type": "not", "data_4_f": 0.5, "data_6_f": 1.0}
]}"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn run(exe: &str, args: &[&dyn AsRef<std::ffi::OsStr>]) -> Output {
    let mut cmd = Command::new(exe);
    for a in args {
        cmd.arg(a);
    }
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        cmd.env("RUST_LOG", rust_log);
    }
    let output = cmd.output().expect("binary should run");
    println!("stdout: {}", String::from_utf8_lossy(&output.stdout));
    println!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    output
}

fn aigmap(args: &[&dyn AsRef<std::ffi::OsStr>]) -> Output {
    run(env!("CARGO_BIN_EXE_aigmap"), args)
}

#[test]
fn maps_and_writes_netlist() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let aig = write(dir.path(), "mixed.aag", &emit_aiger(&mixed_graph()));
    let lib = write(dir.path(), "lib.json", FULL_LIBRARY);
    let out = dir.path().join("out.v");
    let abc = dir.path().join("out_abc.v");
    let progress = dir.path().join("progress.jsonl");
    let summary = dir.path().join("summary.json");

    let output = aigmap(&[
        &aig,
        &lib,
        &out,
        &"-n",
        &"200",
        &"--paranoid",
        &"--progress-interval",
        &"50",
        &"--progress-path",
        &progress,
        &"--abc-output",
        &abc,
        &"--summary",
        &summary,
    ]);
    assert!(output.status.success());

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("module mixed ("), "{}", text);
    assert!(text.ends_with("endmodule\n"), "{}", text);
    assert!(text.contains("assign f3 = i3;"), "{}", text);
    assert!(std::fs::read_to_string(&abc).unwrap().contains("endmodule"));

    // Two stages of 200 steps with a record every 50.
    let lines = std::fs::read_to_string(&progress).unwrap();
    assert_eq!(lines.lines().count(), 8);
    let first: serde_json::Value = serde_json::from_str(lines.lines().next().unwrap()).unwrap();
    assert!(first.get("best_cost").is_some());

    let s: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    assert!(s["best_metric"].as_f64().unwrap() <= s["initial_metric"].as_f64().unwrap());
    assert_eq!(s["stages"].as_array().unwrap().len(), 2);
}

#[test]
fn same_seed_gives_identical_netlists() {
    let dir = tempfile::tempdir().unwrap();
    let aig = write(dir.path(), "mixed.aag", &emit_aiger(&mixed_graph()));
    let lib = write(dir.path(), "lib.json", FULL_LIBRARY);
    let outs: Vec<PathBuf> = ["a.v", "b.v"].iter().map(|n| dir.path().join(n)).collect();
    for out in &outs {
        let output = aigmap(&[&aig, &lib, out, &"-n", &"300", &"--seed", &"3"]);
        assert!(output.status.success());
    }
    let a = std::fs::read(&outs[0]).unwrap();
    let b = std::fs::read(&outs[1]).unwrap();
    assert_eq!(a, b);
}

#[test]
fn missing_default_cell_fails() {
    let dir = tempfile::tempdir().unwrap();
    let aig = write(dir.path(), "nor.aag", &emit_aiger(&nor_graph(false)));
    let lib = write(
        dir.path(),
        "lib.json",
        r#"{"cells": [{"cell_name": "and_1", "cell_type": "and", "data_4_f": 1, "data_6_f": 1}]}"#,
    );
    let output = aigmap(&[&aig, &lib, &dir.path().join("out.v")]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not"));
}

#[test]
fn cell_lookup_miss_during_bind_fails() {
    let dir = tempfile::tempdir().unwrap();
    let aig = write(dir.path(), "nor.aag", &emit_aiger(&nor_graph(false)));
    let lib = write(dir.path(), "lib.json", AND_NOT_LIBRARY);
    let out = dir.path().join("out.v");
    let output = aigmap(&[&aig, &lib, &out, &"-n", &"5", &"--transitions", &"add-random-gate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nor"));

    // With pruning the only candidate is dropped and the run succeeds.
    let output = aigmap(&[
        &aig,
        &lib,
        &out,
        &"-n",
        &"5",
        &"--transitions",
        &"add-random-gate",
        &"--prune-unmappable",
        &"true",
    ]);
    assert!(output.status.success());
}

#[test]
fn malformed_inputs_fail() {
    let dir = tempfile::tempdir().unwrap();
    let aig = write(dir.path(), "bad.aag", "aag 1 1 1 0 0\n2\n2 3\n");
    let lib = write(dir.path(), "lib.json", FULL_LIBRARY);
    let output = aigmap(&[&aig, &lib, &dir.path().join("out.v")]);
    assert!(!output.status.success());

    let aig = write(dir.path(), "ok.aag", &emit_aiger(&nor_graph(false)));
    let lib = write(dir.path(), "bad.json", "{\"cells\": [");
    let output = aigmap(&[&aig, &lib, &dir.path().join("out.v")]);
    assert!(!output.status.success());
}

#[test]
fn netlist_cost_scores_aigmap_output() {
    let dir = tempfile::tempdir().unwrap();
    let aig = write(dir.path(), "nor.aag", &emit_aiger(&nor_graph(false)));
    let lib = write(dir.path(), "lib.json", AND_NOT_LIBRARY);
    let out = dir.path().join("out.v");
    let abc = dir.path().join("abc.v");
    let output = aigmap(&[
        &aig,
        &lib,
        &out,
        &"-n",
        &"10",
        &"--transitions",
        &"change-default-cell",
        &"--abc-output",
        &abc,
    ]);
    assert!(output.status.success());

    let exe = env!("CARGO_BIN_EXE_netlist-cost");
    for (path, abc_flag) in [(&out, false), (&abc, true)] {
        let mut args: Vec<&dyn AsRef<std::ffi::OsStr>> = vec![path, &lib, &"--json"];
        if abc_flag {
            args.push(&"--abc");
        }
        let output = run(exe, &args);
        assert!(output.status.success());
        let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        // Two inverters and one AND gate.
        assert_eq!(v["area"].as_f64().unwrap(), 6.0);
        assert_eq!(v["static_power"].as_f64().unwrap(), 3.0);
        assert!(!v["penalized"].as_bool().unwrap());
    }
}
