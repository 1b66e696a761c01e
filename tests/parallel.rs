use anyhow::Result;
use monadflow::runner::{Backend, ExecMode, Runner};
use monadflow::{safe, Outcome, Stream};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn pipeline(data: Vec<i64>) -> Stream<i64> {
    Stream::from_iterable(data)
        .map(|x: i64| x.wrapping_mul(3))
        .filter(|x: &i64| x % 2 != 0)
        .map(|x: i64| x - 1)
}

#[test]
fn parallel_matches_sequential() -> Result<()> {
    let s = pipeline((0..1_000).collect());
    let expected = s.collect()?;
    for workers in [1, 4, -1] {
        for use_threads in [true, false] {
            assert_eq!(
                s.par_collect(workers, use_threads)?,
                expected,
                "workers={workers} threads={use_threads}"
            );
        }
    }
    Ok(())
}

#[test]
fn small_inputs_use_one_batch() -> Result<()> {
    let s = Stream::from_iterable(0..5).map(|x: i32| x * x);
    assert_eq!(s.par_collect(8, true)?, vec![0, 1, 4, 9, 16]);
    assert_eq!(s.par_collect(8, false)?, vec![0, 1, 4, 9, 16]);
    Ok(())
}

#[test]
fn fold_is_independent_of_workers() -> Result<()> {
    let s = Stream::from_iterable(0..10);
    for workers in [1, 2, 4, -1] {
        assert_eq!(s.par_fold(0, |a, b| a + b, workers, false)?, 45);
        assert_eq!(s.par_fold(0, |a, b| a + b, workers, true)?, 45);
    }
    Ok(())
}

#[test]
fn par_partition_matches_partition() -> Result<()> {
    let s = Stream::from_iterable(0..200).map(|x: i32| x + 1);
    let (a, b) = s.partition(|x: &i32| x % 3 == 0)?;
    let (pa, pb) = s.par_partition(|x: &i32| x % 3 == 0, 4, true)?;
    assert_eq!(a.collect()?, pa.collect()?);
    assert_eq!(b.collect()?, pb.collect()?);
    Ok(())
}

#[test]
fn thread_backend_names_workers() -> Result<()> {
    let s = Stream::from_iterable(0..40)
        .map(|_x: i32| thread::current().name().map(str::to_string));
    let runner = Runner {
        mode: ExecMode::Parallel { workers: 4, backend: Backend::Threads },
        min_batch_size: 10,
    };
    let names = s.collect_with(&runner)?;
    // batch w goes to worker w
    assert_eq!(names[0].as_deref(), Some("monadflow-worker-0"));
    assert_eq!(names[39].as_deref(), Some("monadflow-worker-3"));
    Ok(())
}

#[test]
fn explicit_runner_configuration() -> Result<()> {
    let runner = Runner {
        mode: ExecMode::Parallel { workers: 3, backend: Backend::Threads },
        min_batch_size: 1,
    };
    let s = Stream::from_iterable(0..7).map(|x: i32| x * 2);
    assert_eq!(s.collect_with(&runner)?, vec![0, 2, 4, 6, 8, 10, 12]);
    assert_eq!(s.collect_with(&Runner::default())?, s.collect()?);
    Ok(())
}

#[test]
fn safe_failures_stay_in_place_across_workers() -> Result<()> {
    let inverse = safe(|x: i32| 1_000 / x);
    let s = Stream::from_iterable(-50..50).map(inverse);
    let seq = s.collect()?;
    let par = s.par_collect(4, false)?;
    assert_eq!(seq, par);
    assert!(par[50].is_err());
    assert_eq!(par.iter().filter(|o| o.is_ok()).count(), 99);
    assert_eq!(par[51], Outcome::Ok(1_000));
    Ok(())
}

// work stealing decides placement, so a fast machine may still use one thread
#[mark_flaky_tests::flaky]
#[test]
fn pool_backend_spreads_batches() {
    let names = Arc::new(Mutex::new(HashSet::new()));
    let seen = Arc::clone(&names);
    let s = Stream::from_iterable(0..400).tap(move |_x: i32| {
        thread::sleep(Duration::from_micros(200));
        let name = thread::current().name().map(str::to_string);
        seen.lock().unwrap().insert(name);
    });
    s.par_collect(4, false).unwrap();
    let names = names.lock().unwrap();
    assert!(names.len() > 1);
    assert!(names.iter().flatten().all(|n| n.starts_with("monadflow-pool-")));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn equivalence_for_any_input(
        data in proptest::collection::vec(any::<i64>(), 0..300),
        workers in 1isize..6,
    ) {
        let s = pipeline(data);
        let expected = s.collect().unwrap();
        prop_assert_eq!(s.par_collect(workers, false).unwrap(), expected.clone());
        prop_assert_eq!(s.par_collect(workers, true).unwrap(), expected);
    }
}
