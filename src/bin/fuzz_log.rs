//! AFL Fuzz harness for GroupedLog
//!
//! Drives a log with random appends, folds and expands, and after every
//! operation checks it against a naive model that materialises every row:
//! 1. The visible count matches the number of model rows
//! 2. Every visible index resolves to the same row as the model
//! 3. A rejected append changes nothing

use afl::fuzz;
use grouplog::config::Config;
use grouplog::log::{Entry, GroupedLog, Row};

const GROUP_DURATION: f64 = 2.0;

/// Operation types the fuzzer can generate
#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    /// Append `count` entries, each `gap` quarter-steps after the previous
    Append { count: u8, gap: u8 },
    /// Append one entry that goes back in time
    AppendStale { back: u8 },
    Fold { group_frac: u8 },
    Expand { group_frac: u8 },
    /// Resolve a window of visible rows
    Window { start_frac: u8, len: u8 },
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        if bytes.is_empty() {
            return None;
        }

        let op_type = bytes[0] % 5;
        let rest = &bytes[1..];

        match op_type {
            0 if rest.len() >= 2 => {
                let op = FuzzOp::Append {
                    count: (rest[0] % 16).saturating_add(1), // 1-16 entries
                    gap: rest[1] % 16,
                };
                Some((op, &rest[2..]))
            }
            1 if !rest.is_empty() => {
                let op = FuzzOp::AppendStale { back: rest[0].saturating_add(1) };
                Some((op, &rest[1..]))
            }
            2 if !rest.is_empty() => Some((FuzzOp::Fold { group_frac: rest[0] }, &rest[1..])),
            3 if !rest.is_empty() => Some((FuzzOp::Expand { group_frac: rest[0] }, &rest[1..])),
            4 if rest.len() >= 2 => {
                let op = FuzzOp::Window { start_frac: rest[0], len: rest[1] % 32 };
                Some((op, &rest[2..]))
            }
            _ => None,
        }
    }
}

/// Reference rows: `None` for a group header, `Some(i)` for entry `i`,
/// tagged with the group they belong to.
fn model_rows(log: &GroupedLog) -> Vec<(usize, Option<usize>)> {
    let mut rows = Vec::new();
    for group in log.groups() {
        rows.push((group.index, None));
        if group.is_expanded {
            for entry in group.entry_range() {
                rows.push((group.index, Some(entry)));
            }
        }
    }
    rows
}

fn check_row(log: &GroupedLog, row: Row, expected: (usize, Option<usize>)) {
    match (row, expected) {
        (Row::Group(group), (index, None)) => assert_eq!(group.index, index),
        (Row::Entry(entry), (_, Some(index))) => {
            assert_eq!(entry, log.entry(index).unwrap())
        }
        (row, expected) => panic!("row {:?} != expected {:?}", row, expected),
    }
}

fn main() {
    fuzz!(|data: &[u8]| {
        let mut log = GroupedLog::new(Config::new(GROUP_DURATION).unwrap());
        let mut clock = 0.0f64;
        let mut remaining = data;

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;

            match op {
                FuzzOp::Append { count, gap } => {
                    let batch: Vec<Entry> = (0..count)
                        .map(|i| {
                            clock += gap as f64 * 0.25;
                            Entry::new(format!("{}:{}", log.entry_count(), i), clock)
                        })
                        .collect();
                    log.append(batch).unwrap();
                }

                FuzzOp::AppendStale { back } => {
                    if log.is_empty() {
                        continue;
                    }
                    let before = log.clone();
                    let stale = Entry::new("stale", clock - back as f64);
                    assert!(log.append(vec![Entry::new("fresh", clock), stale]).is_err());
                    assert_eq!(log.entry_count(), before.entry_count());
                    assert_eq!(log.groups(), before.groups());
                    assert_eq!(log.visible_count(), before.visible_count());
                }

                FuzzOp::Fold { group_frac } => {
                    if log.group_count() > 0 {
                        let group = group_frac as usize * log.group_count() / 256;
                        log.fold(group).unwrap();
                    }
                    assert!(log.fold(log.group_count()).is_err());
                }

                FuzzOp::Expand { group_frac } => {
                    if log.group_count() > 0 {
                        let group = group_frac as usize * log.group_count() / 256;
                        log.expand(group).unwrap();
                    }
                    assert!(log.expand(log.group_count()).is_err());
                }

                FuzzOp::Window { start_frac, len } => {
                    let count = log.visible_count();
                    let start = start_frac as usize * count / 256;
                    let end = (start + len as usize).min(count);
                    let model = model_rows(&log);
                    let rows = log.resolve_visible_range(start..end).unwrap();
                    assert_eq!(rows.len(), end - start);
                    for (row, &expected) in rows.into_iter().zip(&model[start..end]) {
                        check_row(&log, row, expected);
                    }
                }
            }
        }

        // Every visible index must agree with the model, both one at a time
        // and as a single walk.
        let model = model_rows(&log);
        assert_eq!(log.visible_count(), model.len(), "Visible count mismatch");
        for (i, &expected) in model.iter().enumerate() {
            check_row(&log, log.row(i).unwrap(), expected);
        }
        let walked = log.resolve_visible_range(0..model.len()).unwrap();
        for (row, &expected) in walked.into_iter().zip(&model) {
            check_row(&log, row, expected);
        }
        assert!(log.row(model.len()).is_err());
    });
}
