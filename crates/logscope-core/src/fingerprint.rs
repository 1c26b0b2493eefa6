use logscope_types::ErrorFingerprint;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

// Lone ESC bytes are removed too, otherwise stripping one sequence could
// splice a new one together and break idempotence.
static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-~])?").unwrap());

static LEADING_BRACKET_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[[^\]]*\d{1,2}:\d{2}[^\]]*\]\s*").unwrap());

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(?::\d{2})?(?:[.,]\d+)?(?:Z|[+-]\d{2}:?\d{2})?",
    )
    .unwrap()
});

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b").unwrap()
});

static HEX_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b0x[0-9a-f]+\b").unwrap());

// Single digits survive: they are usually attempt/retry counters.
static NUMBER_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{2,}").unwrap());

static ABSOLUTE_PATH_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|[\s(\[{'"=,@])(?:[A-Za-z]:[\\/]+|/+)(?:[^\s\\/:()\[\]{}'"]+[\\/]+)+"#).unwrap()
});

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Canonicalize an error line so that noise (timestamps, ids, addresses,
/// counters, machine-specific paths, whitespace) does not affect identity.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let text = ANSI_ESCAPE.replace_all(raw, "");
    let text = LEADING_BRACKET_TIME.replace(&text, "");
    let text = TIMESTAMP.replace_all(&text, "<TS>");
    let text = UUID.replace_all(&text, "<UUID>");
    let text = HEX_ADDRESS.replace_all(&text, "<HEX>");
    let text = NUMBER_RUN.replace_all(&text, "<N>");
    let text = ABSOLUTE_PATH_PREFIX.replace_all(&text, "$1");
    let text = WHITESPACE_RUN.replace_all(&text, " ");
    text.trim().to_string()
}

/// 8 lowercase hex characters: the first four bytes of SHA-256 over the
/// UTF-8 bytes of `canonical`.
pub fn hash(canonical: &str) -> ErrorFingerprint {
    let digest = Sha256::digest(canonical.as_bytes());
    let hex: String = digest[..4].iter().map(|b| format!("{:02x}", b)).collect();
    ErrorFingerprint::new(hex)
}

/// `hash(normalize(raw))`
pub fn fingerprint(raw: &str) -> ErrorFingerprint {
    hash(&normalize(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOISY: &[&str] = &[
        "[12:34:56.789] E/flutter (12345): Bad state: Stream has already been listened to. at 0x7fff5fbff8c0 id=550e8400-e29b-41d4-a716-446655440000 2024-03-01T10:00:00Z /home/dev/app/lib/main.dart:42",
        "2024-01-15 08:30:00 ERROR request 98231 failed after retry 3",
        "\x1b[31mFATAL\x1b[0m  C:\\Users\\dev\\app\\Program.cs:120   crashed",
        "\x1b\x1b[0m[31m dangling escape",
        "[10:00:00] [12:00:00] nested stamps 2024-03-01 10:00:00.123+02:00",
        "segfault at 0xDEADBEEF in (/usr/lib/libc.so.6)",
        "crash in /usr//lib/libfoo.so",
        "loaded from //opt///vendor/lib//libbar.so and C:\\\\Users\\dev\\app.dll",
        "",
    ];

    #[test]
    fn test_normalize_replaces_noise() {
        insta::assert_snapshot!(
            normalize(NOISY[0]),
            @"E/flutter (<N>): Bad state: Stream has already been listened to. at <HEX> id=<UUID> <TS> main.dart:<N>"
        );
        insta::assert_snapshot!(
            normalize(NOISY[1]),
            @"<TS> ERROR request <N> failed after retry 3"
        );
    }

    #[test]
    fn test_normalize_strips_ansi_and_windows_paths() {
        assert_eq!(normalize(NOISY[2]), "FATAL Program.cs:<N> crashed");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in NOISY {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_single_digits_preserved() {
        assert_eq!(normalize("attempt 3 of 5"), "attempt 3 of 5");
        assert_eq!(normalize("attempt 13 of 15"), "attempt <N> of <N>");
    }

    #[test]
    fn test_relative_paths_untouched() {
        assert_eq!(
            normalize("at package:myapp/src/home.dart"),
            "at package:myapp/src/home.dart"
        );
    }

    #[test]
    fn test_same_error_different_noise_same_fingerprint() {
        let a = "[09:01:02] E/flutter (4411): Null check operator used on a null value at 0x1a2b";
        let b = "[17:45:10] E/flutter (9812): Null check operator used on a null value at 0xffee";
        assert_eq!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn test_repeated_separators_same_fingerprint() {
        assert_eq!(normalize("crash in /usr//lib/libfoo.so"), "crash in libfoo.so");
        assert_eq!(
            fingerprint("crash in /usr//lib/libfoo.so"),
            fingerprint("crash in /usr/lib/libfoo.so")
        );
        assert_eq!(
            normalize("at C:\\\\Users\\dev\\\\app\\Main.cs:12"),
            "at Main.cs:<N>"
        );
    }

    #[test]
    fn test_distinct_errors_hash_differently() {
        assert_ne!(
            fingerprint("Bad state: No element"),
            fingerprint("Bad state: Too many elements")
        );
    }

    #[test]
    fn test_hash_shape() {
        let long = "x".repeat(10_000);
        for input in ["", "a", long.as_str()] {
            let h = hash(input);
            assert_eq!(h.as_str().len(), 8);
            assert!(
                h.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            );
        }
    }

    #[test]
    fn test_hash_stable_and_whitespace_invariant() {
        let a = fingerprint("  StateError:   widget   disposed ");
        let b = fingerprint("StateError: widget\tdisposed");
        assert_eq!(a, b);
        assert_eq!(a, fingerprint("StateError: widget disposed"));
    }
}
