use anyhow::Result;
use monadflow::testing::{assert_collections_equal, ValueLogger};
use monadflow::{original_error, safe_try, FlowError, OpKind, Outcome, Stream};
use std::num::ParseIntError;
use std::panic::{self, AssertUnwindSafe};

#[test]
fn map_collect_is_deterministic() -> Result<()> {
    let out = Stream::from_iterable(vec![0, 1, 2, 3]).map(|x: i32| x + 1).collect()?;
    assert_collections_equal(&out, &[1, 2, 3, 4]);
    Ok(())
}

#[test]
fn partition_then_filter_map() -> Result<()> {
    let (evens, odds) = Stream::from_iterable(0..10)
        .map(|x: i32| x + 1)
        .partition(|x: &i32| x % 2 == 0)?;

    assert_eq!(evens.collect()?, vec![2, 4, 6, 8, 10]);
    assert_eq!(odds.collect()?, vec![1, 3, 5, 7, 9]);
    assert!(evens.plan().is_empty());

    let out = evens.map(|x: i32| x + 2).filter(|x: &i32| x % 3 == 0).collect()?;
    assert_eq!(out, vec![6, 12]);
    Ok(())
}

#[test]
fn partitioned_streams_replay() -> Result<()> {
    let (evens, _) = Stream::from_iterable(0..10).partition(|x: &i32| x % 2 == 0)?;
    let doubled = evens.map(|x: i32| x * 2);
    assert_eq!(doubled.collect()?, doubled.collect()?);
    assert_eq!(doubled.collect()?, vec![0, 4, 8, 12, 16]);
    Ok(())
}

#[test]
fn fold_sums() -> Result<()> {
    let s = Stream::from_iterable(0..10);
    assert_eq!(s.fold(0, |a, b| a + b)?, 45);
    assert_eq!(s.map(|x: i32| x + 1).fold(0, |a, b| a + b)?, 55);
    assert_eq!(s.fold(String::new(), |acc, x| acc + &x.to_string())?, "0123456789");
    Ok(())
}

#[test]
fn once_wraps_a_single_value() -> Result<()> {
    let s = Stream::once(vec![1, 2, 3]);
    assert_eq!(s.len(), 1);
    assert_eq!(s.map(|v: Vec<i32>| v.len()).collect()?, vec![3]);
    assert_eq!(Stream::once(0).collect()?, vec![0]);
    Ok(())
}

#[test]
fn empty_stream_collects_nothing() -> Result<()> {
    let s = Stream::<i32>::from_iterable(Vec::new()).map(|x: i32| x * 2);
    assert!(s.is_empty());
    assert!(s.collect()?.is_empty());
    assert!(s.par_collect(4, false)?.is_empty());
    assert!(s.par_collect(4, true)?.is_empty());
    Ok(())
}

#[test]
fn filter_short_circuits_later_ops() -> Result<()> {
    let seen = ValueLogger::new();
    let out = Stream::from_iterable(0..10)
        .filter(|x: &i32| x % 2 == 0)
        .tap(seen.recorder())
        .collect()?;
    assert_eq!(out, vec![0, 2, 4, 6, 8]);
    assert_eq!(seen.values(), out);
    Ok(())
}

#[test]
fn filter_all_is_ordered_and() -> Result<()> {
    let checked = ValueLogger::new();
    let rec = checked.recorder();
    let preds: Vec<Box<dyn Fn(&i32) -> bool + Send + Sync>> = vec![
        Box::new(|x: &i32| *x > 2),
        Box::new(move |x: &i32| {
            rec(*x);
            x % 2 == 0
        }),
    ];
    let out = Stream::from_iterable(0..6).filter_all(preds).collect()?;
    assert_eq!(out, vec![4]);
    // the second predicate only saw what passed the first
    assert_eq!(checked.values(), vec![3, 4, 5]);
    Ok(())
}

#[test]
fn map_all_composes_left_to_right() -> Result<()> {
    let fns: Vec<fn(i32) -> i32> = vec![|x| x + 1, |x| x * 10];
    let out = Stream::from_iterable(vec![1, 2]).map_all(fns).collect()?;
    assert_eq!(out, vec![20, 30]);
    assert_eq!(Stream::from_iterable(vec![1, 2]).map_all(fns_none()).plan().len(), 0);
    Ok(())
}

fn fns_none() -> Vec<fn(i32) -> i32> {
    Vec::new()
}

#[test]
fn tap_sees_copies_and_discards_results() -> Result<()> {
    let first = ValueLogger::new();
    let second = ValueLogger::new();
    let (r1, r2) = (first.recorder(), second.recorder());

    let out = Stream::from_iterable(vec![vec![1], vec![2]])
        .tap(move |mut v: Vec<i32>| {
            v.push(99);
            r1(v);
            "ignored"
        })
        .tap(r2)
        .collect()?;

    assert_eq!(out, vec![vec![1], vec![2]]);
    assert_eq!(first.values(), vec![vec![1, 99], vec![2, 99]]);
    assert_eq!(second.values(), vec![vec![1], vec![2]]);
    Ok(())
}

#[test]
fn tap_all_runs_every_function() -> Result<()> {
    let log = ValueLogger::new();
    let out = Stream::from_iterable(vec![1, 2])
        .tap_all(vec![log.recorder(), log.recorder()])
        .collect()?;
    assert_eq!(out, vec![1, 2]);
    assert_eq!(log.values(), vec![1, 1, 2, 2]);
    Ok(())
}

#[test]
fn plan_describes_operations() {
    let s = Stream::from_iterable(0..3)
        .map(|x: i32| x.to_string())
        .filter(|s: &String| !s.is_empty())
        .tap(|_s: String| ());
    let plan = s.plan();
    let kinds: Vec<OpKind> = plan.iter().map(|p| p.kind).collect();
    assert_eq!(kinds, vec![OpKind::Map, OpKind::Filter, OpKind::Tap]);
    assert!(plan[0].name.contains("closure"));
}

#[cfg(feature = "async")]
#[test]
fn sync_actions_reject_async_plans() {
    let s = Stream::from_iterable(0..3).map_async(|x: i32| async move { x + 1 });

    for result in [s.collect(), s.par_collect(2, false), s.par_collect(2, true)] {
        let err = result.unwrap_err();
        assert!(matches!(err.downcast_ref::<FlowError>(), Some(FlowError::AsyncOperation { .. })));
    }
    assert!(s.fold(0, |a, b| a + b).is_err());
    assert!(s.partition(|x: &i32| *x > 0).is_err());
}

#[test]
fn invalid_worker_counts_are_rejected() {
    let s = Stream::from_iterable(0..3);
    for workers in [0, -2, -100] {
        let err = s.par_collect(workers, false).unwrap_err();
        assert_eq!(err.downcast_ref::<FlowError>(), Some(&FlowError::InvalidWorkers(workers)));
        assert!(s.par_fold(0, |a, b| a + b, workers, true).is_err());
        assert!(s.par_partition(|_: &i32| true, workers, false).is_err());
    }
}

fn explode(x: i32) -> i32 {
    if x == 7 {
        panic!("element {x} exploded");
    }
    x
}

#[test]
fn panics_propagate_from_sequential_collect() {
    let s = Stream::from_iterable(0..20).map(explode);
    let caught = panic::catch_unwind(AssertUnwindSafe(|| s.collect()));
    assert!(caught.is_err());
}

#[test]
fn panics_propagate_from_pool_workers() {
    let s = Stream::from_iterable(0..100).map(explode);
    let caught = panic::catch_unwind(AssertUnwindSafe(|| s.par_collect(4, false)));
    assert!(caught.is_err());
}

#[test]
fn panics_propagate_from_thread_workers() {
    let s = Stream::from_iterable(0..100).map(explode);
    let caught = panic::catch_unwind(AssertUnwindSafe(|| s.par_collect(4, true)));
    assert!(caught.is_err());
}

#[test]
fn streams_from_conversions() -> Result<()> {
    let a: Stream<u8> = vec![1, 2].into();
    let b: Stream<u8> = (1..=2).collect();
    assert_eq!(a.collect()?, b.collect()?);
    Ok(())
}

#[test]
fn collected_failures_unwrap_to_their_original_error() -> Result<()> {
    let parsed = Stream::from_iterable(vec!["1", "x"]).map(safe_try(|s: &str| s.parse::<i32>()));
    let (good, bad) = parsed.partition(|o: &Outcome<i32>| o.is_ok())?;
    assert_eq!(good.collect()?, vec![Outcome::Ok(1)]);

    // every collect replays clones of the same failure
    for failed in bad.collect()?.into_iter().chain(bad.collect()?) {
        let err = failed.unwrap().unwrap_err();
        let original = original_error::<ParseIntError>(&err).expect("ParseIntError");
        assert_eq!(original.to_string(), "invalid digit found in string");
    }
    Ok(())
}
