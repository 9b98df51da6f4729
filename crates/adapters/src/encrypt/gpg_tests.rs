// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn missing_binary_fails_without_leaving_ciphertext() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("plain.bin");
    let cipher = dir.path().join("plain.bin.gpg");
    let key = dir.path().join("key.pub");
    std::fs::write(&plain, b"secret").unwrap();
    std::fs::write(&key, b"not a real key").unwrap();

    let adapter = GpgEncryptAdapter::with_binary("/nonexistent/gpg");
    let err = adapter.encrypt(&plain, &cipher, &key).await.unwrap_err();

    assert!(matches!(err, EncryptError::Tool(_)), "{err}");
    assert!(!cipher.exists());
    // The plaintext is untouched
    assert_eq!(std::fs::read(&plain).unwrap(), b"secret");
}

#[tokio::test]
async fn failed_tool_removes_partial_ciphertext() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("plain.bin");
    let cipher = dir.path().join("plain.bin.gpg");
    let key = dir.path().join("key.pub");
    std::fs::write(&plain, b"secret").unwrap();
    std::fs::write(&key, b"key").unwrap();

    // A "gpg" that writes a partial output file and then fails
    let script = dir.path().join("fake-gpg.sh");
    std::fs::write(
        &script,
        b"#!/bin/sh\nwhile [ $# -gt 1 ]; do\n  if [ \"$1\" = \"--output\" ]; then out=\"$2\"; fi\n  shift\ndone\necho partial > \"$out\"\necho 'boom' >&2\nexit 2\n",
    )
    .unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let adapter = GpgEncryptAdapter::with_binary(&script);
    let err = adapter.encrypt(&plain, &cipher, &key).await.unwrap_err();

    let EncryptError::Tool(detail) = err else {
        panic!("expected Tool error");
    };
    assert!(detail.contains("boom"), "{detail}");
    assert!(!cipher.exists(), "partial ciphertext must be removed");
}
