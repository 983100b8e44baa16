// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use nix::sys::signal::{raise, Signal};
use serial_test::serial;

use super::*;

#[test]
#[serial(signals)]
fn delivered_signal_is_reported_once() {
    let mut watcher = SignalWatcher::new();
    watcher.watch(Signal::SIGUSR1 as i32).unwrap();
    assert!(watcher.take_pending().is_empty());

    raise(Signal::SIGUSR1).unwrap();
    assert_eq!(watcher.take_pending(), vec![Signal::SIGUSR1 as i32]);
    assert!(watcher.take_pending().is_empty());
}

#[test]
#[serial(signals)]
fn pending_signals_come_out_in_order() {
    let mut watcher = SignalWatcher::new();
    watcher.watch(Signal::SIGUSR2 as i32).unwrap();
    watcher.watch(Signal::SIGUSR1 as i32).unwrap();
    watcher.watch(Signal::SIGUSR1 as i32).unwrap();

    raise(Signal::SIGUSR2).unwrap();
    raise(Signal::SIGUSR1).unwrap();
    assert_eq!(
        watcher.take_pending(),
        vec![Signal::SIGUSR1 as i32, Signal::SIGUSR2 as i32]
    );
}

#[test]
fn uncatchable_signals_are_refused() {
    let mut watcher = SignalWatcher::new();
    let err = watcher.watch(Signal::SIGKILL as i32).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert!(watcher.take_pending().is_empty());
}
