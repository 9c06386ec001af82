//! Pure numeric/string conversions that don't need heap or evaluator
//! access. Conversions that *do* need the heap (ToPrimitive, ToString of an
//! object, ToObject) live on [`crate::evaluator::Evaluator`] because they
//! may invoke script-level `toString`/`valueOf` methods.

/// Renders a number the way script code observes it via `String(n)` /
/// string concatenation. Spec §1 Non-goals explicitly excuses us from
/// bit-identical formatting versus any particular implementation; this
/// covers the common cases (`NaN`, `Infinity`, integers, plain decimals)
/// well enough to satisfy the round-trip law in spec §8 for "normalized
/// decimal numeric literals".
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{n:.0}");
    }
    let mut s = format!("{n}");
    // Rust's default float Display never emits a trailing ".0" for
    // fractional values and already matches JS-style shortest-round-trip
    // output closely enough for our purposes; normalize exponent form
    // (`1e10` vs Rust's `10000000000`) is not attempted further.
    if s.ends_with(".0") {
        s.truncate(s.len() - 2);
    }
    s
}

/// ToInt32 (used by the bitwise operators and shift counts).
pub(crate) fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let m = n.trunc().rem_euclid(4294967296.0);
    if m >= 2147483648.0 {
        (m - 4294967296.0) as i32
    } else {
        m as i32
    }
}

/// ToUint32.
pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4294967296.0) as u32
}

/// Parses a decimal/hex/(V1/V3 octal) numeric literal exactly as the
/// lexer recognizes it. Shared between the lexer and `Number(str)`/global
/// `parseFloat`-adjacent callers that accept the same literal grammar.
pub(crate) fn parse_numeric_literal(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok().map(|v| v as f64);
    }
    s.parse::<f64>().ok()
}

/// UTF-16 <-> `String` helpers (spec §3: strings are "an immutable
/// UTF-16-ish sequence of 16-bit code units").
pub(crate) fn to_utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

pub(crate) fn from_utf16_lossy(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}
