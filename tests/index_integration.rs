//! Integration tests for the `TreeIndex` facade and the command driver.
//!
//! These tests verify cross-component behavior that unit tests don't cover.

use std::fs;
use std::sync::Arc;
use std::thread;

use bplustree::command::{self, RunSummary};
use bplustree::{Error, Order, TreeIndex, Value};
use tempfile::tempdir;

fn create_index(m: usize) -> TreeIndex {
    let index = TreeIndex::new();
    index.initialize(Order::new(m).unwrap()).unwrap();
    index
}

/// Test the full lifecycle through the facade.
#[test]
fn test_index_lifecycle() {
    let index = TreeIndex::new();
    assert!(matches!(index.get(1), Err(Error::NotInitialized)));

    index.initialize(Order::new(3).unwrap()).unwrap();
    for k in 0..100 {
        assert!(index.insert(k, k as Value).unwrap());
    }
    for k in (0..100).step_by(2) {
        assert_eq!(index.delete(k).unwrap(), Some(k as Value));
    }

    assert_eq!(index.len().unwrap(), 50);
    assert_eq!(index.range(10, 15).unwrap(), vec![11.0, 13.0, 15.0]);
    index.validate().unwrap();

    let stats = index.stats().unwrap();
    assert_eq!(stats.inserts, 100);
    assert_eq!(stats.deletes, 50);
    assert!(stats.merges > 0);
}

/// Test that readers see a consistent tree while a writer runs.
#[test]
fn test_concurrent_readers_and_writer() {
    let index = Arc::new(create_index(5));
    for k in 0..500 {
        index.insert(k, k as Value).unwrap();
    }

    let writer = {
        let index = Arc::clone(&index);
        thread::spawn(move || {
            for k in 500..1500 {
                index.insert(k, k as Value).unwrap();
            }
            for k in 0..250 {
                index.delete(k).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for _ in 0..200 {
                    // Keys 250..500 are never touched by the writer.
                    let values = index.range(250, 499).unwrap();
                    assert_eq!(values.len(), 250);
                    assert_eq!(index.get(300).unwrap(), Some(300.0));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(index.len().unwrap(), 1250);
    index.validate().unwrap();
}

/// Test the driver end to end through real files.
#[test]
fn test_run_file_end_to_end() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output_file.txt");

    let script = "\
Search(1)
Initialize(3)
Insert(21, 0.3)
Insert(108, 31.907)
Insert(56089, 3.26)
Insert(234, 121.56)
Insert(4325, -109.23)
Delete(108)
Search(234)
Insert(102, 39.56)
Insert(65, -3.95)
Delete(102)
Delete(21)
Insert(106, -3.91)
Insert(23, 3.55)
Search(23, 99)
Insert(32, 0.02)
Insert(220, 3.55)
Search(33)
Delete(234)
Search(65)
Search(0, 100000)
Bogus
";
    fs::write(&input, script).unwrap();

    let summary = command::run_file(&input, &output).unwrap();

    assert_eq!(
        summary,
        RunSummary {
            executed: 21,
            rejected: 2,
            lines: 23,
        }
    );
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "121.56\n3.55,-3.95\nNull\n-3.95\n3.55,0.02,-3.95,-3.91,3.55,-109.23,3.26\n"
    );
}

/// Test that results and diagnostics go to separate sinks.
#[test]
fn test_run_separates_output_and_diagnostics() {
    let script = "Initialize(4)\nInsert(1, 1.5)\nInsert(1)\nInsert(x, 1.0)\nSearch(1)\n";
    let mut output = Vec::new();
    let mut diagnostics = Vec::new();

    command::run(script.as_bytes(), &mut output, &mut diagnostics).unwrap();

    assert_eq!(String::from_utf8(output).unwrap(), "1.5\n");
    let diagnostics = String::from_utf8(diagnostics).unwrap();
    assert_eq!(
        diagnostics,
        "malformed instruction: Insert does not take 1 argument(s). Operation is ignored. Line: 3\n\
         invalid number: \"x\". Operation is ignored. Line: 4\n"
    );
}
