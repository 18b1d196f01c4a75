//! End-to-end tests driving the built `scalebench` binary.
//!
//! These exercise the real process pool (worker processes spawned from the
//! binary), the runners' exit-code contract, and a full orchestrated sweep.

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::Command;
use std::thread;

fn scalebench() -> Command {
    Command::new(env!("CARGO_BIN_EXE_scalebench"))
}

fn write_corpus(dir: &Path) {
    fs::write(dir.join("f1.txt"), "a b a").unwrap();
    fs::write(dir.join("f2.txt"), "b c").unwrap();
    fs::write(dir.join("f3.txt"), "c c a").unwrap();
}

fn load_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn cpu_run_counts_are_stable_across_worker_counts() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());

    for workers in 1..=3usize {
        let out = dir.path().join(format!("hist_{workers}.json"));
        let status = scalebench()
            .args(["cpu", "--input"])
            .arg(dir.path())
            .args(["--workers", &workers.to_string(), "--top", "10", "--out"])
            .arg(&out)
            .status()
            .unwrap();
        assert!(status.success(), "workers={workers}");

        let doc = load_json(&out);
        assert_eq!(doc["meta"]["mode"], "cpu-process-pool");
        assert_eq!(doc["meta"]["workers"], workers as u64);
        assert_eq!(doc["meta"]["files"], 3);
        assert_eq!(doc["meta"]["total_tokens"], 8);
        assert_eq!(doc["meta"]["unique_tokens"], 3);

        // conservation: meta total equals the sum of per-file counts
        let per_file_sum: u64 = doc["per_file"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["tokens"].as_u64().unwrap())
            .sum();
        assert_eq!(per_file_sum, 8);

        // per_file sorted by path
        let paths: Vec<&str> = doc["per_file"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["path"].as_str().unwrap())
            .collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);

        // frequency table: {a:3, b:2, c:3}
        let counts: Vec<(String, u64)> = doc["top_words"]
            .as_array()
            .unwrap()
            .iter()
            .map(|w| {
                (
                    w["word"].as_str().unwrap().to_string(),
                    w["count"].as_u64().unwrap(),
                )
            })
            .collect();
        assert_eq!(counts.len(), 3);
        assert_eq!(
            counts.iter().find(|(w, _)| w == "a").unwrap().1,
            3,
            "workers={workers}"
        );
        assert_eq!(counts.iter().find(|(w, _)| w == "b").unwrap().1, 2);
        assert_eq!(counts.iter().find(|(w, _)| w == "c").unwrap().1, 3);
    }
}

#[test]
fn empty_input_exits_2_without_document() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("hist.json");

    let status = scalebench()
        .args(["cpu", "--input"])
        .arg(dir.path())
        .args(["--out"])
        .arg(&out)
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(2));
    assert!(!out.exists());
}

#[test]
fn empty_url_list_exits_2_without_document() {
    let dir = tempfile::tempdir().unwrap();
    let urls = dir.path().join("urls.txt");
    fs::write(&urls, "# only comments\n\n").unwrap();
    let out = dir.path().join("crawl.json");

    let status = scalebench()
        .args(["crawl", "--input"])
        .arg(&urls)
        .args(["--out"])
        .arg(&out)
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(2));
    assert!(!out.exists());
}

#[test]
fn cpu_sweep_writes_summary_with_unit_speedup_at_base() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let out_dir = dir.path().join("bench");

    let status = scalebench()
        .args(["bench", "--mode", "cpu", "--input"])
        .arg(dir.path())
        .args(["--min", "1", "--max", "2", "--quiet", "--out-dir"])
        .arg(&out_dir)
        .status()
        .unwrap();
    assert!(status.success());

    // per-run documents exist
    assert!(out_dir.join("hist_w1.json").exists());
    assert!(out_dir.join("hist_w2.json").exists());

    let summary = load_json(&out_dir.join("summary_cpu.json"));
    assert_eq!(summary["meta"]["mode"], "cpu");
    assert_eq!(summary["meta"]["workers_min"], 1);
    assert_eq!(summary["meta"]["workers_max"], 2);

    let rows = summary["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["workers"], 1);
    assert_eq!(rows[1]["workers"], 2);
    for row in rows {
        assert_eq!(row["total_tokens"], 8);
        assert_eq!(row["unique_tokens"], 3);
    }
    // the base row's speedup is exactly 1.0 (or null on a 0 ms fluke)
    if !rows[0]["speedup_vs_1"].is_null() {
        assert_eq!(rows[0]["speedup_vs_1"].as_f64().unwrap(), 1.0);
    }
}

#[test]
fn cpu_sweep_aborts_without_summary_on_child_failure() {
    let dir = tempfile::tempdir().unwrap();
    // No corpus: every child exits 2, so the first run already fails
    let out_dir = dir.path().join("bench");

    let output = scalebench()
        .args(["bench", "--mode", "cpu", "--input"])
        .arg(dir.path().join("missing"))
        .args(["--min", "1", "--max", "3", "--quiet", "--out-dir"])
        .arg(&out_dir)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(!out_dir.join("summary_cpu.json").exists());
}

#[test]
fn crawl_run_records_mixed_outcomes() {
    // One stub answers 200 with a page, the other 404
    fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/", addr)
    }

    let body = "<title>E2E</title>alpha beta";
    let ok_url = serve_once(format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    let bad_url = serve_once(
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
    );

    let dir = tempfile::tempdir().unwrap();
    let urls = dir.path().join("urls.txt");
    fs::write(&urls, format!("{ok_url}\n{bad_url}\n")).unwrap();
    let out = dir.path().join("crawl.json");

    let status = scalebench()
        .args(["crawl", "--input"])
        .arg(&urls)
        .args(["--workers", "2", "--timeout", "5", "--out"])
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success(), "per-unit failures are data, not errors");

    let doc = load_json(&out);
    assert_eq!(doc["meta"]["total_urls"], 2);
    assert_eq!(doc["meta"]["ok"], 1);
    assert_eq!(doc["meta"]["failed"], 1);

    let results = doc["results"].as_array().unwrap();
    let bad = results.iter().find(|r| !r["ok"].as_bool().unwrap()).unwrap();
    assert_eq!(bad["status"], 404);

    // results sorted by URL
    let emitted: Vec<&str> = results.iter().map(|r| r["url"].as_str().unwrap()).collect();
    let mut sorted = emitted.clone();
    sorted.sort();
    assert_eq!(emitted, sorted);
}
