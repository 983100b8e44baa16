// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;
use std::path::PathBuf;

use nix::unistd::{lseek, Whence};
use serial_test::serial;

use super::*;

fn target_of(fd: RawFd) -> Option<PathBuf> {
    fs::read_link(format!("/proc/self/fd/{fd}")).ok()
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap()
}

fn write_to(fd: RawFd, path: &Path) -> ResolvedRedirect {
    ResolvedRedirect::new(fd, RedirectOp::Write, path.display().to_string())
}

fn close_fd(manager: &mut RedirectionManager, fd: RawFd) {
    let close = ResolvedRedirect::new(fd, RedirectOp::DupWrite, "-");
    manager
        .apply(&[close], Discipline::Permanent, false)
        .unwrap();
}

#[test]
#[serial(fds)]
fn temporary_redirect_is_undone() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let mut manager = RedirectionManager::new();

    let mark = manager
        .apply(&[write_to(7, &out)], Discipline::Temporary, false)
        .unwrap();
    assert_eq!(target_of(7), Some(canonical(&out)));

    manager.restore(mark);
    assert_eq!(target_of(7), None);
}

#[test]
#[serial(fds)]
fn restore_brings_back_previous_target() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    let mut manager = RedirectionManager::new();

    manager
        .apply(&[write_to(8, &first)], Discipline::Permanent, false)
        .unwrap();
    let mark = manager
        .apply(&[write_to(8, &second)], Discipline::Temporary, false)
        .unwrap();
    assert_eq!(target_of(8), Some(canonical(&second)));

    manager.restore(mark);
    assert_eq!(target_of(8), Some(canonical(&first)));
    close_fd(&mut manager, 8);
    assert_eq!(target_of(8), None);
}

#[test]
#[serial(fds)]
fn noclobber_refuses_existing_regular_file() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("existing");
    fs::write(&existing, "keep").unwrap();
    let mut manager = RedirectionManager::new();

    let err = manager
        .apply(&[write_to(7, &existing)], Discipline::Temporary, true)
        .unwrap_err();
    assert!(matches!(err, ExecError::Clobber { .. }));
    assert_eq!(fs::read_to_string(&existing).unwrap(), "keep");
    assert_eq!(target_of(7), None);

    let forced = ResolvedRedirect::new(7, RedirectOp::Clobber, existing.display().to_string());
    let mark = manager
        .apply(&[forced], Discipline::Temporary, true)
        .unwrap();
    assert_eq!(fs::read_to_string(&existing).unwrap(), "");
    manager.restore(mark);
}

#[test]
#[serial(fds)]
fn partial_failure_rolls_back_earlier_redirects() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let missing = dir.path().join("missing");
    let mut manager = RedirectionManager::new();

    let redirects = [
        write_to(7, &out),
        ResolvedRedirect::new(8, RedirectOp::Read, missing.display().to_string()),
    ];
    let err = manager
        .apply(&redirects, Discipline::Temporary, false)
        .unwrap_err();
    assert!(matches!(err, ExecError::Redirect { .. }));
    assert!(err.to_string().contains("cannot open"));
    assert_eq!(target_of(7), None);
    assert_eq!(manager.mark(), FdMark(0));
}

#[test]
#[serial(fds)]
fn here_document_is_readable() {
    let mut manager = RedirectionManager::new();
    let doc = ResolvedRedirect::new(7, RedirectOp::HereDoc, "hello\n");
    let mark = manager.apply(&[doc], Discipline::Temporary, false).unwrap();

    let text = fs::read_to_string("/proc/self/fd/7").unwrap();
    assert_eq!(text, "hello\n");
    manager.restore(mark);
}

#[test]
#[serial(fds)]
fn rewrite_truncates_at_final_offset() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("data");
    fs::write(&file, "abcdef").unwrap();
    let mut manager = RedirectionManager::new();

    let rewrite = ResolvedRedirect::new(7, RedirectOp::ReadWriteRewrite, file.display().to_string());
    let mark = manager
        .apply(&[rewrite], Discipline::Temporary, false)
        .unwrap();
    lseek(7, 2, Whence::SeekSet).unwrap();
    manager.restore(mark);

    assert_eq!(fs::read_to_string(&file).unwrap(), "ab");
}

#[test]
#[serial(fds)]
fn duplicates_and_closes_descriptors() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let mut manager = RedirectionManager::new();

    let redirects = [
        write_to(7, &out),
        ResolvedRedirect::new(8, RedirectOp::DupWrite, "7"),
    ];
    let mark = manager
        .apply(&redirects, Discipline::Temporary, false)
        .unwrap();
    assert_eq!(target_of(8), Some(canonical(&out)));

    let inner = manager
        .apply(
            &[ResolvedRedirect::new(8, RedirectOp::DupWrite, "-")],
            Discipline::Temporary,
            false,
        )
        .unwrap();
    assert_eq!(target_of(8), None);
    manager.restore(inner);
    assert_eq!(target_of(8), Some(canonical(&out)));

    manager.restore(mark);
    assert_eq!(target_of(7), None);
    assert_eq!(target_of(8), None);
}

#[test]
#[serial(fds)]
fn bad_duplication_sources() {
    let mut manager = RedirectionManager::new();
    for target in ["9", "abc"] {
        let err = manager
            .apply(
                &[ResolvedRedirect::new(7, RedirectOp::DupRead, target)],
                Discipline::Temporary,
                false,
            )
            .unwrap_err();
        assert!(matches!(err, ExecError::BadDescriptor { .. }), "{target}");
        assert_eq!(target_of(7), None);
    }
}

#[test]
#[serial(fds)]
fn snapshot_restores_low_descriptors() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    let mut manager = RedirectionManager::new();
    manager
        .apply(&[write_to(7, &first)], Discipline::Permanent, false)
        .unwrap();

    let snapshot = FdSnapshot::capture().unwrap();
    manager
        .apply(
            &[write_to(7, &second), write_to(6, &second)],
            Discipline::Permanent,
            false,
        )
        .unwrap();
    snapshot.restore();

    assert_eq!(target_of(7), Some(canonical(&first)));
    assert_eq!(target_of(6), None);
    close_fd(&mut manager, 7);
}
