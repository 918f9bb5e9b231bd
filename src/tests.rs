use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::dispatch::{dispatch, SendStatus};
use crate::error::Error;

fn init_logging() {
    let _ = env_logger::init();
}

fn addresses(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("user{}@example.com", i)).collect()
}

#[test]
fn all_attempts_succeed() {
    init_logging();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let status = dispatch(&CancelToken::new(), &addresses(5), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();
    assert_eq!(status, SendStatus::Delivered);
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
}

#[test]
fn duplicate_recipients_each_get_an_attempt() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let recipients = vec!["a@x.com".to_string(), "a@x.com".to_string()];
    let status = dispatch(&CancelToken::new(), &recipients, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();
    assert_eq!(status, SendStatus::Delivered);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn empty_recipient_list_is_a_successful_noop() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let status = dispatch(&CancelToken::new(), &[], move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();
    assert_eq!(status, SendStatus::Delivered);
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}

#[test]
fn failing_attempt_surfaces_its_error_verbatim() {
    let recipients = vec!["bad@x.com".to_string()];
    let err = dispatch(&CancelToken::new(), &recipients, |_| {
        Err(Error::Provider("mailbox unavailable".to_string()))
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "mailbox unavailable");
}

#[test]
fn one_failure_among_successes_fails_the_dispatch() {
    let recipients = vec![
        "a@x.com".to_string(),
        "bad@x.com".to_string(),
        "b@x.com".to_string(),
    ];
    let result = dispatch(&CancelToken::new(), &recipients, |recipient| {
        if recipient.starts_with("bad") {
            Err(Error::Provider("mailbox unavailable".to_string()))
        } else {
            Ok(())
        }
    });
    assert!(result.is_err());
}

#[test]
fn slow_recipient_does_not_block_the_others() {
    // All attempts must be launched before any is awaited; with five
    // workers sleeping 200ms each, anything close to sequential would blow
    // well past the assertion.
    let start = Instant::now();
    let status = dispatch(&CancelToken::new(), &addresses(5), |_| {
        thread::sleep(Duration::from_millis(200));
        Ok(())
    })
    .unwrap();
    assert_eq!(status, SendStatus::Delivered);
    assert!(start.elapsed() < Duration::from_millis(700));
}

#[test]
fn cancellation_returns_promptly_without_error() {
    init_logging();
    let cancel = CancelToken::new();
    let fire = cancel.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        fire.cancel();
    });

    let start = Instant::now();
    let status = dispatch(&cancel, &addresses(3), |_| {
        // Far longer than the test is willing to wait; these attempts would
        // all fail if they were awaited.
        thread::sleep(Duration::from_secs(10));
        Err(Error::Provider("too late".to_string()))
    })
    .unwrap();
    assert_eq!(status, SendStatus::Cancelled);
    assert!(start.elapsed() < Duration::from_secs(2));
}
