use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AdBlockError, ListErrorKind, Result};
use crate::types::DomainSet;

/// Regex pattern for the one recognized rule form: `||<domain>^`
static RULE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|\|(.+)\^$").expect("RULE_PATTERN: hardcoded regex is invalid")
});

/// Lines between progress log ticks while parsing large lists.
const PROGRESS_INTERVAL: usize = 50_000;

/// Parse a raw block list from text.
///
/// Only lines of the exact shape `||<domain>^` contribute a domain; comments,
/// exceptions, element-hiding and cosmetic rules are silently skipped. This is
/// a deliberate narrow-format filter, not a general ad-block-syntax parser.
pub fn parse_list(text: &str) -> DomainSet {
    let mut domains = DomainSet::new();
    let mut count = 0usize;

    for line in text.lines() {
        count += 1;
        accept_line(line, &mut domains);
        if count % PROGRESS_INTERVAL == 0 {
            debug!("block list: parsed {} lines, {} domains", count, domains.len());
        }
    }

    domains
}

/// Parse a raw block list line by line from a reader.
///
/// The list may run to hundreds of thousands of lines; this form avoids
/// materializing it. A read failure is the only error and maps to
/// [`ListErrorKind::Unreadable`].
pub fn parse_list_from_reader<R: BufRead>(reader: R) -> Result<DomainSet> {
    let mut domains = DomainSet::new();
    let mut count = 0usize;

    for line in reader.lines() {
        let line = line.map_err(|e| AdBlockError::ListError {
            kind: ListErrorKind::Unreadable,
            message: format!("Failed to read block list: {}", e),
        })?;
        count += 1;
        accept_line(&line, &mut domains);
        if count % PROGRESS_INTERVAL == 0 {
            debug!("block list: parsed {} lines, {} domains", count, domains.len());
        }
    }

    Ok(domains)
}

/// Parse a raw block list from a file.
pub fn parse_list_from_file(path: impl AsRef<Path>) -> Result<DomainSet> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|e| AdBlockError::ListError {
        kind: ListErrorKind::Unreadable,
        message: format!("Failed to open block list '{}': {}", path.display(), e),
    })?;
    parse_list_from_reader(BufReader::new(file))
}

/// Extract the domain from one line, if it has the accepted shape.
fn accept_line(line: &str, domains: &mut DomainSet) {
    // Cheap pre-filter keeps the regex off the overwhelmingly common
    // non-matching lines.
    if line.len() < 4 || !line.starts_with("||") {
        return;
    }
    if let Some(captures) = RULE_PATTERN.captures(line) {
        domains.insert(captures.get(1).unwrap().as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_pattern_regex_compiles() {
        // Forces Lazy evaluation; if the pattern is invalid, this panics
        // with the expect message rather than an opaque unwrap.
        assert!(RULE_PATTERN.is_match("||example.com^"));
    }

    #[test]
    fn test_parse_simple_rule() {
        let domains = parse_list("||doubleclick.net^");
        assert_eq!(domains.len(), 1);
        assert!(domains.contains("doubleclick.net"));
    }

    #[test]
    fn test_parse_skips_other_shapes() {
        let text = "\
! comment line
[Adblock Plus 2.0]
||^
||x
ads.example.com
@@||allowed.example^
example.com##.ad-banner
/banner/*/img^
||adsrv.example^";
        let domains = parse_list(text);
        assert_eq!(domains.len(), 1);
        assert!(domains.contains("adsrv.example"));
    }

    #[test]
    fn test_parse_minimum_length() {
        // "||a^" is the shortest accepted rule.
        assert_eq!(parse_list("||a^").len(), 1);
        assert_eq!(parse_list("||^").len(), 0);
    }

    #[test]
    fn test_parse_case_collapses() {
        let domains = parse_list("||Ads.Example.com^\n||ADS.EXAMPLE.COM^");
        assert_eq!(domains.len(), 1);
        assert!(domains.contains("ads.example.com"));
    }

    #[test]
    fn test_parse_idempotent_and_order_independent() {
        let a = parse_list("||a.com^\n||b.com^\n! noise\n||c.com^");
        let b = parse_list("||c.com^\n||b.com^\n||a.com^\n! noise");
        assert_eq!(a, b);
        assert_eq!(a, parse_list("||a.com^\n||b.com^\n! noise\n||c.com^"));
    }

    #[test]
    fn test_parse_never_errors_on_garbage() {
        let domains = parse_list("|||^^\n||\u{fffd}^\n^||^\n\n||ok.example^");
        assert!(domains.contains("ok.example"));
    }

    #[test]
    fn test_parse_from_reader() {
        let text = "||doubleclick.net^\n! skip\n||adsrv.example^\n";
        let domains = parse_list_from_reader(std::io::Cursor::new(text)).unwrap();
        assert_eq!(domains.len(), 2);
    }

    #[test]
    fn test_parse_from_missing_file() {
        let result = parse_list_from_file("/nonexistent/easylist.txt");
        match result {
            Err(AdBlockError::ListError { kind, .. }) => {
                assert!(matches!(kind, ListErrorKind::Unreadable));
            }
            other => panic!("expected ListError, got {:?}", other.map(|d| d.len())),
        }
    }
}
