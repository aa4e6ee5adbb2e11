//! Byte-signature heuristic scan
//!
//! Advisory only: it looks at the size of a stored object and the first
//! [`SCAN_HEADER_LEN`] bytes for executable or server-script markers. A real
//! antivirus engine can be plugged in behind [`ContentScanner`].

use async_trait::async_trait;
use storeguard_core::ScanVerdict;

/// Number of leading bytes handed to a scanner.
pub const SCAN_HEADER_LEN: usize = 512;

/// Objects smaller than this are treated as suspicious.
pub const MIN_PLAUSIBLE_SIZE: u64 = 100;

#[async_trait]
pub trait ContentScanner: Send + Sync {
    /// Judge a stored object from its total size and leading bytes.
    async fn scan(&self, size: u64, header: &[u8]) -> ScanVerdict;

    fn name(&self) -> &'static str;
}

/// Markers that must appear at offset 0.
const LEADING_SIGNATURES: &[(&[u8], &str)] = &[
    (b"MZ", "Windows executable header"),
    (b"\x7fELF", "ELF executable header"),
    (b"#!", "script interpreter line"),
];

/// Markers looked for anywhere in the header, ASCII case-insensitive.
const EMBEDDED_SIGNATURES: &[(&[u8], &str)] = &[
    (b"<?php", "embedded PHP opener"),
    (b"<?=", "embedded PHP short echo tag"),
    (b"<%@", "embedded server page directive"),
    (b"<%=", "embedded server page expression"),
    (b"PE\0\0", "portable executable signature"),
];

fn contains_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

#[derive(Debug, Clone, Copy)]
pub struct SignatureScanner {
    max_size: u64,
}

impl SignatureScanner {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    /// Synchronous core of the scan.
    pub fn check(&self, size: u64, header: &[u8]) -> ScanVerdict {
        if size < MIN_PLAUSIBLE_SIZE {
            return ScanVerdict::Unsafe(format!("file is suspiciously small ({} bytes)", size));
        }
        if size > self.max_size {
            return ScanVerdict::Unsafe(format!("file exceeds the size limit ({} bytes)", size));
        }

        let header = &header[..header.len().min(SCAN_HEADER_LEN)];

        if let Some((_, label)) = LEADING_SIGNATURES
            .iter()
            .find(|(signature, _)| header.starts_with(signature))
        {
            return ScanVerdict::Unsafe(label.to_string());
        }

        if let Some((_, label)) = EMBEDDED_SIGNATURES
            .iter()
            .find(|(signature, _)| contains_ignore_ascii_case(header, signature))
        {
            return ScanVerdict::Unsafe(label.to_string());
        }

        ScanVerdict::Clean
    }
}

#[async_trait]
impl ContentScanner for SignatureScanner {
    async fn scan(&self, size: u64, header: &[u8]) -> ScanVerdict {
        self.check(size, header)
    }

    fn name(&self) -> &'static str {
        "signature"
    }
}
