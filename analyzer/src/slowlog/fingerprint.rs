//! SQL fingerprinting
//!
//! Reduces a statement to a canonical pattern so that executions differing
//! only in literal values group together.

use once_cell::sync::Lazy;
use regex::Regex;

static HEX_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b0x[0-9a-f]+\b").unwrap());

static NUMBER_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+(?:\.\d+)?(?:e[+-]?\d+)?\b").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static IN_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bin\s*\(\s*\?(?:\s*,\s*\?)*\s*\)").unwrap());

static VALUES_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bvalues?\s*\([^()]*\)(?:\s*,\s*\([^()]*\))*").unwrap()
});

static USE_DB: Lazy<Regex> = Lazy::new(|| Regex::new(r"^use \S+$").unwrap());

/// Canonical pattern of a SQL statement.
///
/// Comments are removed, the text is lowercased, string/numeric/hex literals
/// become `?`, `IN (...)` and multi-row `VALUES (...)` lists collapse to a
/// single placeholder, and whitespace is squeezed.
pub fn fingerprint(query: &str) -> String {
    let stripped = strip_literals_and_comments(query).to_lowercase();

    let s = HEX_LITERAL.replace_all(&stripped, "?");
    let s = NUMBER_LITERAL.replace_all(&s, "?");
    let s = WHITESPACE.replace_all(&s, " ");
    let s = IN_LIST.replace_all(&s, "in(?+)");
    let s = VALUES_LIST.replace_all(&s, "values(?+)");

    let mut s = s.trim().trim_end_matches(';').trim_end().to_string();
    if USE_DB.is_match(&s) {
        s = "use ?".to_string();
    }
    s
}

/// Replace quoted strings with `?` and drop `/* */`, `--` and `#` comments.
/// Backtick-quoted identifiers are not string literals and pass through.
fn strip_literals_and_comments(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                skip_quoted(&mut chars, c);
                out.push('?');
            }
            '`' => {
                out.push(c);
                for next in chars.by_ref() {
                    out.push(next);
                    if next == '`' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                skip_line(&mut chars);
                out.push(' ');
            }
            '#' => {
                skip_line(&mut chars);
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn skip_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) {
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            // doubled quote is an escaped quote
            if chars.peek() == Some(&quote) {
                chars.next();
            } else {
                return;
            }
        }
    }
}

fn skip_line(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    for c in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_collapse() {
        assert_eq!(
            fingerprint("SELECT * FROM t WHERE id=1"),
            fingerprint("SELECT * FROM t WHERE id=2")
        );
        assert_eq!(
            fingerprint("SELECT * FROM t WHERE id=1"),
            "select * from t where id=?"
        );
        assert_eq!(
            fingerprint("select a from t1 where x > 1.5e3"),
            "select a from t1 where x > ?"
        );
    }

    #[test]
    fn test_strings_and_hex() {
        assert_eq!(
            fingerprint("SELECT * FROM users WHERE name = 'O''Brien' AND tag = \"a\\\"b\""),
            "select * from users where name = ? and tag = ?"
        );
        assert_eq!(fingerprint("select 0xDEADbeef"), "select ?");
    }

    #[test]
    fn test_comments_removed() {
        assert_eq!(
            fingerprint("SELECT /* hint */ c FROM t -- trailing\nWHERE id = 3 # more"),
            "select c from t where id = ?"
        );
    }

    #[test]
    fn test_identifiers_kept() {
        assert_eq!(
            fingerprint("SELECT `order id` FROM `db`.`t2` WHERE x = 'y'"),
            "select `order id` from `db`.`t2` where x = ?"
        );
    }

    #[test]
    fn test_lists_collapse() {
        assert_eq!(
            fingerprint("SELECT * FROM t WHERE id IN (1, 2, 3)"),
            "select * from t where id in(?+)"
        );
        assert_eq!(
            fingerprint("select * from t where id in (7)"),
            fingerprint("SELECT * FROM t WHERE id IN (1,2,3,4,5)")
        );
        assert_eq!(
            fingerprint("INSERT INTO t (a, b) VALUES (1, 'x'), (2, 'y');"),
            "insert into t (a, b) values(?+)"
        );
    }

    #[test]
    fn test_whitespace_and_terminator() {
        assert_eq!(
            fingerprint("  SELECT\n\t a\n  FROM   t ;  "),
            "select a from t"
        );
    }

    #[test]
    fn test_use_statement() {
        assert_eq!(fingerprint("USE shop"), "use ?");
        assert_eq!(fingerprint("use `shop`;"), "use ?");
    }
}
