//! Location fingerprints.
//!
//! A fingerprint identifies "the same logical spot" across commits: it hashes
//! the file path plus the whitespace-normalized target line and up to two lines
//! of context on either side. Line numbers are not part of the input, so a note
//! survives code moving up or down the file as long as its neighborhood is
//! unchanged. Collisions are accepted and read as "same note".

use crate::patterns::RE_WHITESPACE_RUN;

/// Lines of context taken on each side of the target line.
pub const CONTEXT_RADIUS: usize = 2;

const LINE_DELIMITER: char = '|';

/// Computes the fingerprint for a note location.
///
/// `context_lines` is the window returned by [`context_window`]: up to five
/// lines, fewer at file boundaries. `line_number` is accepted for call-site
/// symmetry and does not influence the result.
pub fn generate(filepath: &str, _line_number: u32, context_lines: &[&str]) -> String {
    let mut input = String::with_capacity(filepath.len() + 1 + context_lines.len() * 40);
    input.push_str(filepath);
    input.push(':');
    for line in context_lines {
        input.push_str(&normalize_whitespace(line));
        input.push(LINE_DELIMITER);
    }
    format!("{:08x}", djb2(input.as_bytes()))
}

/// Fingerprints a location directly from the full text of a file.
pub fn fingerprint_in_text(filepath: &str, line_number: u32, text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let window = context_window(&lines, line_number);
    generate(filepath, line_number, window)
}

/// Returns the slice of `lines` around the 1-based `line_number`.
///
/// The window is clamped at both file boundaries; a line past the end of the
/// file yields whatever tail of context still exists (possibly empty).
pub fn context_window<'a, 'b>(lines: &'b [&'a str], line_number: u32) -> &'b [&'a str] {
    if lines.is_empty() || line_number == 0 {
        return &[];
    }
    let target = line_number as usize - 1;
    let start = target.saturating_sub(CONTEXT_RADIUS).min(lines.len());
    let end = (target + CONTEXT_RADIUS + 1).min(lines.len());
    &lines[start..end]
}

/// Collapses whitespace runs to a single space and trims both ends.
///
/// Whitespace here is Unicode `White_Space`, not just ASCII: a no-break
/// space (U+00A0) or an ideographic space normalizes the same as a plain
/// space. Lines differing only in the kind of whitespace therefore share a
/// fingerprint. Changing this would change the fingerprint of every stored
/// note whose context contains non-ASCII whitespace.
pub fn normalize_whitespace(line: &str) -> String {
    RE_WHITESPACE_RUN.replace_all(line.trim(), " ").into_owned()
}

/// djb2 over bytes, wrapping at 2^32.
fn djb2(bytes: &[u8]) -> u32 {
    bytes.iter().fold(5381u32, |hash, &b| {
        hash.wrapping_mul(33).wrapping_add(u32::from(b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn djb2_matches_reference_values() {
        assert_eq!(djb2(b""), 5381);
        // 5381 * 33 + 'a'(97)
        assert_eq!(djb2(b"a"), 177_670);
    }

    #[test]
    fn generate_is_deterministic_and_fixed_width() {
        let ctx = ["a", "b", "c", "d", "e"];
        let first = generate("src/a.py", 10, &ctx);
        let second = generate("src/a.py", 10, &ctx);
        assert_eq!(first, second);
        assert_eq!(first.len(), 8);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn generate_ignores_line_number() {
        let ctx = ["x = 1", "y = 2", "z = 3"];
        assert_eq!(generate("f.rs", 3, &ctx), generate("f.rs", 90, &ctx));
    }

    #[test]
    fn generate_ignores_whitespace_differences() {
        let a = ["fn  main() {", "\tlet x =   1;", "}"];
        let b = ["fn main() {", "    let x = 1;   ", "}"];
        assert_eq!(generate("m.rs", 2, &a), generate("m.rs", 2, &b));
    }

    #[test]
    fn generate_depends_on_path_and_content() {
        let ctx = ["a", "b", "c"];
        assert_ne!(generate("one.rs", 1, &ctx), generate("two.rs", 1, &ctx));
        assert_ne!(generate("one.rs", 1, &ctx), generate("one.rs", 1, &["a", "b", "d"]));
    }

    #[test]
    fn delimiter_separates_lines() {
        assert_ne!(generate("f", 1, &["ab", "c"]), generate("f", 1, &["a", "bc"]));
    }

    #[test]
    fn window_is_clamped_at_file_start() {
        let lines = ["l1", "l2", "l3", "l4", "l5", "l6"];
        assert_eq!(context_window(&lines, 1), &["l1", "l2", "l3"]);
        assert_eq!(context_window(&lines, 2), &["l1", "l2", "l3", "l4"]);
    }

    #[test]
    fn window_is_full_in_the_middle() {
        let lines = ["l1", "l2", "l3", "l4", "l5", "l6"];
        assert_eq!(context_window(&lines, 4), &["l2", "l3", "l4", "l5", "l6"]);
    }

    #[test]
    fn window_is_clamped_at_file_end() {
        let lines = ["l1", "l2", "l3", "l4", "l5", "l6"];
        assert_eq!(context_window(&lines, 6), &["l4", "l5", "l6"]);
        assert!(context_window(&lines, 20).is_empty());
        assert!(context_window(&lines, 0).is_empty());
    }

    #[test]
    fn shifted_code_keeps_its_fingerprint() {
        let before = "use std::io;\n\nfn parse() {\n    let n = read();\n    check(n);\n}\n";
        let after = format!("// header\n// more\n{before}");
        assert_eq!(
            fingerprint_in_text("src/p.rs", 4, before),
            fingerprint_in_text("src/p.rs", 6, &after)
        );
    }

    #[test]
    fn normalize_collapses_runs() {
        assert_eq!(normalize_whitespace("  a \t b\u{a0} "), "a b");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn non_ascii_whitespace_matches_plain_space() {
        assert_eq!(normalize_whitespace("let\u{a0}x = 1;"), "let x = 1;");
        assert_eq!(normalize_whitespace("let\u{3000}x = 1;"), "let x = 1;");
        assert_eq!(
            generate("a.rs", 1, &["let\u{a0}x = 1;"]),
            generate("a.rs", 1, &["let x = 1;"])
        );
    }
}
