//! # Hexadecimal Float Encoding
//!
//! IPPcode21 serializes `float` literals in C99 `%a`/`strtod` hex-float
//! form (e.g. `0x1.8p+1`). No crate in the reference corpus offers this
//! formatter, so both directions are hand-implemented directly against the
//! IEEE-754 bit pattern — the same function backs `READ` and `WRITE`, which
//! is what guarantees the round-trip property the specification requires.

/// Format an `f64` as a C99-style hexadecimal float literal.
///
/// Produces the canonical normalized form `-0x1.<hex mantissa>p<exp>` (or
/// `0x0p+0` / subnormal forms where applicable), trimming trailing zero
/// mantissa digits the way `printf("%a")` does.
pub fn format_hex_float(v: f64) -> String {
    if v == 0.0 {
        return if v.is_sign_negative() {
            "-0x0p+0".to_string()
        } else {
            "0x0p+0".to_string()
        };
    }
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v < 0.0 { "-inf".to_string() } else { "inf".to_string() };
    }

    let bits = v.to_bits();
    let sign = (bits >> 63) & 1;
    let raw_exp = ((bits >> 52) & 0x7ff) as i64;
    let mantissa = bits & 0x000f_ffff_ffff_ffff;

    let (lead, exp, mantissa) = if raw_exp == 0 {
        // Subnormal: leading digit is 0, unbiased exponent is fixed at -1022.
        (0u64, -1022i64, mantissa)
    } else {
        (1u64, raw_exp - 1023, mantissa)
    };

    let mut hex = format!("{:013x}", mantissa);
    while hex.len() > 1 && hex.ends_with('0') {
        hex.pop();
    }

    let sign_str = if sign == 1 { "-" } else { "" };
    if hex == "0" {
        format!("{}0x{}p{:+}", sign_str, lead, exp)
    } else {
        format!("{}0x{}.{}p{:+}", sign_str, lead, hex, exp)
    }
}

/// Parse a C99-style hexadecimal float literal into an `f64`.
///
/// Accepts the form `[-+]?0x<hex-digit>(.<hex-digits>)?p[-+]?<decimal exp>`,
/// case-insensitively, plus the `inf`/`nan` spellings `format_hex_float`
/// produces. Returns `None` on any syntactic or range problem.
pub fn parse_hex_float(s: &str) -> Option<f64> {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();
    match lower.as_str() {
        "inf" | "+inf" => return Some(f64::INFINITY),
        "-inf" => return Some(f64::NEG_INFINITY),
        "nan" => return Some(f64::NAN),
        _ => {}
    }

    let (neg, rest) = match lower.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, lower.strip_prefix('+').unwrap_or(&lower)),
    };

    let rest = rest.strip_prefix("0x")?;
    let p_pos = rest.find('p')?;
    let (mantissa_part, exp_part) = rest.split_at(p_pos);
    let exp_part = &exp_part[1..];
    if mantissa_part.is_empty() || exp_part.is_empty() {
        return None;
    }

    let exp: i64 = exp_part.parse().ok()?;

    let (int_part, frac_part) = match mantissa_part.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa_part, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut value: f64 = 0.0;
    for c in int_part.chars() {
        value = value * 16.0 + c.to_digit(16)? as f64;
    }
    let mut frac_scale = 1.0 / 16.0;
    for c in frac_part.chars() {
        value += c.to_digit(16)? as f64 * frac_scale;
        frac_scale /= 16.0;
    }

    let result = value * 2f64.powi(exp as i32);
    Some(if neg { -result } else { result })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_simple_values() {
        for v in [0.0f64, 1.0, -1.0, 0.5, 3.0, 100.25, -0.125] {
            let s = format_hex_float(v);
            let parsed = parse_hex_float(&s).unwrap();
            assert_eq!(parsed, v, "round-trip failed for {} via {}", v, s);
        }
    }

    #[test]
    fn formats_canonical_examples() {
        assert_eq!(format_hex_float(1.5), "0x1.8p+0");
        assert_eq!(format_hex_float(3.0), "0x1.8p+1");
        assert_eq!(format_hex_float(0.0), "0x0p+0");
    }

    #[test]
    fn parses_canonical_examples() {
        assert_eq!(parse_hex_float("0x1.8p+1"), Some(3.0));
        assert_eq!(parse_hex_float("0x1p+0"), Some(1.0));
        assert_eq!(parse_hex_float("not a float"), None);
    }
}
