//! # Lexical Rules for Operand Text
//!
//! The loader validates the decoded text of `var`, `label`, and `string`
//! operands against the grammars below before turning them into
//! [`crate::instruction::Operand`] values. Patterns are compiled once, on
//! first use, via `once_cell::sync::Lazy` — the same "build it lazily, reuse
//! forever" shape the teacher used for its file-handle table, repointed here
//! at a small regex cache since this interpreter has no file builtins.

use once_cell::sync::Lazy;
use regex::Regex;

static VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(LF|TF|GF)@[A-Za-z_\-$&%*!?][A-Za-z0-9_\-$&%*!?]*$").unwrap());

static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_\-$&%*!?][A-Za-z0-9_\-$&%*!?]*$").unwrap());

static STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[^\s#\\]|\\[0-9]{3})*$").unwrap());

static ESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\([0-9]{3})").unwrap());

/// `true` iff `s` matches the `FRAME@ident` variable grammar.
pub fn is_valid_var(s: &str) -> bool {
    VAR_RE.is_match(s)
}

/// `true` iff `s` matches the label/identifier grammar.
pub fn is_valid_label(s: &str) -> bool {
    LABEL_RE.is_match(s)
}

/// `true` iff `s` is a syntactically valid (not yet escape-decoded) string
/// literal body.
pub fn is_valid_string_literal(s: &str) -> bool {
    STRING_RE.is_match(s)
}

/// Decode `\DDD` three-digit decimal escapes into their code points.
///
/// Callers must validate with [`is_valid_string_literal`] first; this
/// function does not re-validate the grammar, only expands escapes already
/// known to be well-formed.
pub fn decode_string_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for caps in ESCAPE_RE.captures_iter(s) {
        let m = caps.get(0).unwrap();
        out.push_str(&s[last..m.start()]);
        let code: u32 = caps[1].parse().unwrap();
        if let Some(c) = char::from_u32(code) {
            out.push(c);
        }
        last = m.end();
    }
    out.push_str(&s[last..]);
    out
}

/// Split a `var` operand's text into its frame tag and bare name.
///
/// Returns `None` if the text doesn't match [`is_valid_var`]'s grammar.
pub fn split_var(s: &str) -> Option<(&str, &str)> {
    if !is_valid_var(s) {
        return None;
    }
    s.split_once('@')
}
