//! Integration test: read/write visibility and merge results of
//! fork/join programs.
//!
//! Each scenario runs in a fresh root revision and checks, inside and
//! outside the forked revisions, the values every revision observes.
//! Assertion failures inside a forked revision surface as
//! `JoinError::Panicked` and fail the test through `unwrap()`.

use braid_core::{Additive, Max, Min};
use braid_engine::{fork, join, Versioned};
use braid_test_utils::run_fresh;

// ── Basic visibility ─────────────────────────────────────────────────

#[test]
fn declared_value_reads_back() {
    run_fresh(|| {
        let v: Versioned<i32> = Versioned::new();
        v.set(0);
        assert_eq!(v.get(), Ok(0));
    });
}

#[test]
fn unset_value_reads_type_default() {
    run_fresh(|| {
        let v: Versioned<u64> = Versioned::new();
        assert_eq!(v.get(), Ok(0));
        let s: Versioned<Vec<u8>> = Versioned::new();
        assert_eq!(s.get(), Ok(Vec::new()));
    });
}

#[test]
fn child_write_visible_only_after_join() {
    run_fresh(|| {
        let v: Versioned<i32> = Versioned::new();
        let r = {
            let v = v.clone();
            fork(move || v.set(2)).unwrap()
        };
        v.set(1);
        assert_eq!(v.get(), Ok(1));
        join(r).unwrap();
        assert_eq!(v.get(), Ok(2));
    });
}

#[test]
fn overwrite_takes_joined_value_even_if_main_wrote_later() {
    run_fresh(|| {
        let v: Versioned<i32> = Versioned::with_value(0);
        let r = {
            let v = v.clone();
            fork(move || v.set(1)).unwrap()
        };
        v.set(99);
        join(r).unwrap();
        assert_eq!(v.get(), Ok(1));
    });
}

#[test]
fn unwritten_value_is_not_merged() {
    run_fresh(|| {
        let x: Versioned<i32> = Versioned::with_value(0);
        let y: Versioned<i32> = Versioned::with_value(0);
        let r = {
            let y = y.clone();
            fork(move || y.set(1)).unwrap()
        };
        x.set(5);
        join(r).unwrap();
        assert_eq!(x.get(), Ok(5));
        assert_eq!(y.get(), Ok(1));
    });
}

// ── Determinism scenarios ────────────────────────────────────────────

#[test]
fn reads_in_both_branches_see_fork_state() {
    run_fresh(|| {
        let x: Versioned<i32> = Versioned::with_value(0);
        let y: Versioned<i32> = Versioned::with_value(0);
        let r = {
            let x = x.clone();
            fork(move || {
                assert_eq!(x.get(), Ok(0));
                x.set(1);
                assert_eq!(x.get(), Ok(1));
            })
            .unwrap()
        };
        assert_eq!(x.get(), Ok(0));
        y.set(x.get().unwrap());
        assert_eq!(y.get(), Ok(0));
        join(r).unwrap();
        assert_eq!(x.get(), Ok(1));
        assert_eq!(y.get(), Ok(0));
    });
}

#[test]
fn sibling_revisions_do_not_see_each_other() {
    run_fresh(|| {
        let x: Versioned<i32> = Versioned::with_value(5);
        let y: Versioned<i32> = Versioned::with_value(7);
        let r1 = {
            let (x, y) = (x.clone(), y.clone());
            fork(move || {
                assert_eq!(x.get(), Ok(5));
                if x.get() == Ok(5) {
                    y.set(1);
                }
                assert_eq!(y.get(), Ok(1));
            })
            .unwrap()
        };
        let r2 = {
            let (x, y) = (x.clone(), y.clone());
            fork(move || {
                assert_eq!(y.get(), Ok(7));
                if y.get() == Ok(7) {
                    x.set(10);
                }
                assert_eq!(x.get(), Ok(10));
            })
            .unwrap()
        };
        join(r1).unwrap();
        join(r2).unwrap();
        assert_eq!(x.get(), Ok(10));
        assert_eq!(y.get(), Ok(1));
    });
}

#[test]
fn nested_fork_joined_inside_child() {
    run_fresh(|| {
        let x: Versioned<i32> = Versioned::with_value(5);
        let y: Versioned<i32> = Versioned::with_value(7);
        let r1 = {
            let (x, y) = (x.clone(), y.clone());
            fork(move || {
                assert_eq!(x.get(), Ok(5));
                let r2 = {
                    let (x, y) = (x.clone(), y.clone());
                    fork(move || {
                        assert_eq!(y.get(), Ok(7));
                        if y.get() == Ok(7) {
                            x.set(10);
                        }
                        assert_eq!(x.get(), Ok(10));
                    })
                    .unwrap()
                };
                if x.get() == Ok(5) {
                    y.set(1);
                }
                assert_eq!(y.get(), Ok(1));
                join(r2).unwrap();
                assert_eq!(x.get(), Ok(10));
                assert_eq!(y.get(), Ok(1));
            })
            .unwrap()
        };
        if x.get() == Ok(5) {
            y.set(111);
        }
        assert_eq!(x.get(), Ok(5));
        assert_eq!(y.get(), Ok(111));
        join(r1).unwrap();
        assert_eq!(x.get(), Ok(10));
        assert_eq!(y.get(), Ok(1));
    });
}

#[test]
fn sequential_rounds_see_previous_joins() {
    run_fresh(|| {
        let x: Versioned<i32> = Versioned::with_value(5);
        let y: Versioned<i32> = Versioned::with_value(7);

        let r1 = {
            let (x, y) = (x.clone(), y.clone());
            fork(move || {
                if x.get() == Ok(5) {
                    y.set(1);
                }
                assert_eq!(x.get(), Ok(5));
                assert_eq!(y.get(), Ok(1));
            })
            .unwrap()
        };
        if x.get() == Ok(5) {
            y.set(111);
        }
        assert_eq!(y.get(), Ok(111));
        join(r1).unwrap();
        assert_eq!(x.get(), Ok(5));
        assert_eq!(y.get(), Ok(1));

        let r2 = {
            let (x, y) = (x.clone(), y.clone());
            fork(move || {
                assert_eq!(y.get(), Ok(1));
                assert_eq!(x.get(), Ok(5));
                if y.get() == Ok(1) {
                    x.set(222);
                }
                assert_eq!(x.get(), Ok(222));
            })
            .unwrap()
        };
        if y.get() == Ok(1) {
            x.set(2);
        }
        assert_eq!(x.get(), Ok(2));
        join(r2).unwrap();
        assert_eq!(x.get(), Ok(222));
        assert_eq!(y.get(), Ok(1));
    });
}

// ── Merge functions ──────────────────────────────────────────────────

#[test]
fn builtin_merge_strategies() {
    run_fresh(|| {
        let x_add: Versioned<i32, Additive> = Versioned::new();
        let y_max: Versioned<i32, Max> = Versioned::new();
        let z_min: Versioned<i32, Min> = Versioned::new();

        let round = || {
            let (x_add, y_max, z_min) = (x_add.clone(), y_max.clone(), z_min.clone());
            fork(move || {
                x_add.set(x_add.get().unwrap() + 5);
                y_max.set(10);
                z_min.set(-5);
            })
            .unwrap()
        };

        let r1 = round();
        x_add.set(x_add.get().unwrap() + 3);
        y_max.set(5);
        z_min.set(-10);
        join(r1).unwrap();

        assert_eq!(x_add.get(), Ok(8));
        assert_eq!(y_max.get(), Ok(10));
        assert_eq!(z_min.get(), Ok(-10));

        let r2 = round();
        join(r2).unwrap();
        assert_eq!(x_add.get(), Ok(13));
        assert_eq!(y_max.get(), Ok(10));
        assert_eq!(z_min.get(), Ok(-10));
    });
}

#[test]
fn additive_merge_through_handle_passed_to_ancestor() {
    run_fresh(|| {
        let x: Versioned<i32, Additive> = Versioned::with_value(100);
        let r1 = {
            let x = x.clone();
            fork(move || {
                x.set(x.get().unwrap() + 2);
                let r2 = {
                    let x = x.clone();
                    fork(move || x.set(x.get().unwrap() + 4)).unwrap()
                };
                x.set(x.get().unwrap() + 3);
                r2
            })
            .unwrap()
        };
        x.set(x.get().unwrap() + 1);

        let r2 = join(r1).unwrap();
        assert_eq!(x.get(), Ok(106));
        join(r2).unwrap();
        assert_eq!(x.get(), Ok(110));
    });
}

#[test]
fn additive_unsigned_child_decrement_merges() {
    run_fresh(|| {
        let x: Versioned<u64, Additive> = Versioned::with_value(10);
        let r = {
            let x = x.clone();
            fork(move || x.set(9)).unwrap()
        };
        x.set(12);

        assert_eq!(join(r), Ok(()));
        assert_eq!(x.get(), Ok(11));
    });
}

#[test]
fn value_written_in_several_child_segments_merges_once() {
    run_fresh(|| {
        let x: Versioned<i32, Additive> = Versioned::with_value(0);
        let r = {
            let x = x.clone();
            fork(move || {
                // Each inner fork starts a new segment in this revision.
                for _ in 0..4 {
                    x.set(x.get().unwrap() + 1);
                    join(fork(|| ()).unwrap()).unwrap();
                }
            })
            .unwrap()
        };
        join(r).unwrap();
        assert_eq!(x.get(), Ok(4));
    });
}

#[test]
fn value_declared_in_child_is_adopted_on_join() {
    let (value, _) = run_fresh(|| {
        let r = fork(|| Versioned::<String>::with_value("from child".to_string())).unwrap();
        let v = join(r).unwrap();
        v.get()
    });
    assert_eq!(value, Ok("from child".to_string()));
}

#[test]
fn fork_result_is_returned_by_join() {
    run_fresh(|| {
        let r = fork(|| (1..=10).sum::<i32>()).unwrap();
        assert_eq!(join(r), Ok(55));
    });
}
