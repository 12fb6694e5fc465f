//! Fan-in progress reporting over a set of futures

use crate::error::{Error, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;

fn check_fractions(count: usize, start: f64, end: f64) -> Result<()> {
    if count == 0 {
        return Err(Error::InvalidProgress(
            "promises must be a none empty array".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&start) {
        return Err(Error::InvalidProgress(format!(
            "Progress fraction must be in range [0, 1], but got startFraction {start}"
        )));
    }
    if !(0.0..=1.0).contains(&end) {
        return Err(Error::InvalidProgress(format!(
            "Progress fraction must be in range [0, 1], but got endFraction {end}"
        )));
    }
    if end < start {
        return Err(Error::InvalidProgress(format!(
            "startFraction must be no more than endFraction, but got startFraction {start} and endFraction {end}"
        )));
    }
    Ok(())
}

/// Await every future, calling `on_progress` once per completion with a
/// fraction interpolated linearly between `start` (default 0) and `end`
/// (default 1).
///
/// Arguments are validated before anything is polled. Results come back
/// in input order regardless of completion order.
pub fn monitor_promises_progress<T, Fut, P>(
    futures: Vec<Fut>,
    mut on_progress: P,
    start: Option<f64>,
    end: Option<f64>,
) -> Result<impl Future<Output = Vec<T>>>
where
    Fut: Future<Output = T>,
    P: FnMut(f64),
{
    let (start, end) = (start.unwrap_or(0.0), end.unwrap_or(1.0));
    check_fractions(futures.len(), start, end)?;

    let total = futures.len();
    Ok(async move {
        let mut pending: FuturesUnordered<_> = futures
            .into_iter()
            .enumerate()
            .map(|(i, fut)| async move { (i, fut.await) })
            .collect();

        let mut results: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut done = 0usize;
        while let Some((i, value)) = pending.next().await {
            done += 1;
            on_progress(start + done as f64 / total as f64 * (end - start));
            results[i] = Some(value);
        }
        results.into_iter().flatten().collect()
    })
}

/// Like [`monitor_promises_progress`] for fallible futures. The first
/// error is returned as soon as it completes; remaining futures are
/// dropped without further progress calls.
pub fn try_monitor_promises_progress<T, E, Fut, P>(
    futures: Vec<Fut>,
    mut on_progress: P,
    start: Option<f64>,
    end: Option<f64>,
) -> Result<impl Future<Output = std::result::Result<Vec<T>, E>>>
where
    Fut: Future<Output = std::result::Result<T, E>>,
    P: FnMut(f64),
{
    let (start, end) = (start.unwrap_or(0.0), end.unwrap_or(1.0));
    check_fractions(futures.len(), start, end)?;

    let total = futures.len();
    Ok(async move {
        let mut pending: FuturesUnordered<_> = futures
            .into_iter()
            .enumerate()
            .map(|(i, fut)| async move { (i, fut.await) })
            .collect();

        let mut results: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut done = 0usize;
        while let Some((i, outcome)) = pending.next().await {
            let value = match outcome {
                Ok(value) => value,
                Err(e) => return Err(e),
            };
            done += 1;
            on_progress(start + done as f64 / total as f64 * (end - start));
            results[i] = Some(value);
        }
        Ok(results.into_iter().flatten().collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use futures::future::{ready, BoxFuture, FutureExt};
    use std::cell::RefCell;

    fn assert_fractions(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-9);
        }
    }

    #[tokio::test]
    async fn test_default_range() {
        let seen = RefCell::new(Vec::new());
        let futures: Vec<_> = (0..4).map(ready).collect();
        let results = monitor_promises_progress(futures, |f| seen.borrow_mut().push(f), None, None)
            .unwrap()
            .await;

        assert_eq!(results, vec![0, 1, 2, 3]);
        assert_fractions(&seen.borrow(), &[0.25, 0.5, 0.75, 1.0]);
    }

    #[tokio::test]
    async fn test_custom_range() {
        let seen = RefCell::new(Vec::new());
        let futures: Vec<_> = (0..4).map(ready).collect();
        monitor_promises_progress(futures, |f| seen.borrow_mut().push(f), Some(0.2), Some(0.8))
            .unwrap()
            .await;

        assert_fractions(&seen.borrow(), &[0.35, 0.5, 0.65, 0.8]);
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let (tx, rx) = futures::channel::oneshot::channel::<&str>();
        let futures: Vec<BoxFuture<'static, &str>> = vec![
            async move { rx.await.unwrap_or("dropped") }.boxed(),
            async move {
                let _ = tx.send("first");
                "second"
            }
            .boxed(),
        ];
        let results = monitor_promises_progress(futures, |_| {}, None, None)
            .unwrap()
            .await;
        assert_eq!(results, vec!["first", "second"]);
    }

    #[test]
    fn test_rejects_invalid_arguments_before_polling() {
        let empty: Vec<futures::future::Ready<i32>> = Vec::new();
        let err = monitor_promises_progress(empty, |_| {}, None, None).err().unwrap();
        assert!(err.to_string().contains("none empty array"));

        let futures = vec![ready(1)];
        let err = monitor_promises_progress(futures, |_| {}, Some(-1.0), None).err().unwrap();
        assert!(err.to_string().contains("startFraction -1"));

        let futures = vec![ready(1)];
        let err = monitor_promises_progress(futures, |_| {}, Some(0.6), Some(0.4))
            .err()
            .unwrap();
        assert!(err.to_string().contains("no more than endFraction"));

        let futures = vec![ready(1)];
        assert!(monitor_promises_progress(futures, |_| {}, None, Some(1.5)).is_err());
    }

    #[tokio::test]
    async fn test_try_variant_stops_at_first_error() {
        let calls = RefCell::new(0);
        let futures: Vec<_> = vec![ready(Ok(1)), ready(Err("boom")), ready(Ok(3))];
        let outcome = try_monitor_promises_progress(futures, |_| *calls.borrow_mut() += 1, None, None)
            .unwrap()
            .await;
        assert_eq!(outcome, Err("boom"));
        assert!(*calls.borrow() < 3);
    }

    #[tokio::test]
    async fn test_try_variant_all_ok() {
        let futures: Vec<_> = vec![ready(Ok::<_, String>(1)), ready(Ok(2))];
        let values = try_monitor_promises_progress(futures, |_| {}, None, None)
            .unwrap()
            .await
            .unwrap();
        assert_eq!(values, vec![1, 2]);
    }
}
