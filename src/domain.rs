//! Domain normalization: user input to the ASCII form that goes on the wire.

use std::fmt;

use idna::uts46::{AsciiDenyList, DnsLength, Hyphens, Uts46};
use unicode_normalization::char::is_combining_mark;

/// Longest name accepted after IDNA conversion
pub const MAX_DOMAIN_LENGTH: usize = 253;

/// A domain in IDNA ASCII form, between 1 and 253 characters, containing at
/// least one label separator. Only [`normalize_domain`] creates one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedDomain(String);

impl NormalizedDomain {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Owner name as it appears in presentation format (trailing dot, lower case)
    pub fn fqdn(&self) -> String {
        let mut name = self.0.trim_end_matches('.').to_ascii_lowercase();
        name.push('.');
        name
    }
}

impl fmt::Display for NormalizedDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Convert a possibly internationalized domain to its ASCII-compatible
/// encoding. Returns `None` when the conversion fails, a label holds a code
/// point IDNA2008 does not permit, or the result is empty, longer than 253
/// characters, or has no `.`. A trailing root dot is kept.
pub fn normalize_domain(input: &str) -> Option<NormalizedDomain> {
    let ascii = Uts46::new()
        .to_ascii(
            input.as_bytes(),
            AsciiDenyList::STD3,
            Hyphens::Check,
            DnsLength::VerifyAllowRootDot,
        )
        .ok()?
        .into_owned();

    if ascii.trim_end_matches('.').is_empty()
        || ascii.len() > MAX_DOMAIN_LENGTH
        || !ascii.contains('.')
    {
        return None;
    }
    if !idna2008_permits(&ascii) {
        return None;
    }
    Some(NormalizedDomain(ascii))
}

/// UTS #46 maps but still lets through symbols and emoji that IDNA2008
/// disallows. Every decoded label may only hold letters, digits, combining
/// marks and hyphens.
fn idna2008_permits(ascii: &str) -> bool {
    let (unicode, result) = idna::domain_to_unicode(ascii);
    if result.is_err() {
        return false;
    }
    unicode.split('.').all(|label| {
        label.chars().all(|c| {
            if c.is_ascii() {
                c.is_ascii_alphanumeric() || c == '-'
            } else {
                c.is_alphanumeric() || is_combining_mark(c)
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_domain_passes_through() {
        let domain = normalize_domain("example.com").unwrap();
        assert_eq!(domain.as_str(), "example.com");
        assert_eq!(domain.fqdn(), "example.com.");
    }

    #[test]
    fn test_unicode_domain_is_punycoded() {
        assert_eq!(
            normalize_domain("münchen.de").unwrap().as_str(),
            "xn--mnchen-3ya.de"
        );
        assert_eq!(
            normalize_domain("例え.テスト").unwrap().as_str(),
            "xn--r8jz45g.xn--zckzah"
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for input in ["example.com", "Example.COM", "bücher.example", "a.b.c.d.e"] {
            let once = normalize_domain(input).unwrap();
            let twice = normalize_domain(once.as_str()).unwrap();
            assert_eq!(once, twice, "{input}");
        }
    }

    #[test]
    fn test_ascii_form_is_lower_case() {
        let domain = normalize_domain("Example.COM").unwrap();
        assert_eq!(domain.as_str(), "example.com");
        assert_eq!(
            normalize_domain("MÜNCHEN.de").unwrap().as_str(),
            "xn--mnchen-3ya.de"
        );
    }

    #[test]
    fn test_trailing_root_dot_is_kept() {
        let domain = normalize_domain("example.com.").unwrap();
        assert_eq!(domain.as_str(), "example.com.");
        assert_eq!(domain.fqdn(), "example.com.");
        assert_eq!(
            normalize_domain("münchen.de.").unwrap().as_str(),
            "xn--mnchen-3ya.de."
        );
        assert!(normalize_domain(".").is_none());
        assert!(normalize_domain("example.com..").is_none());
    }

    #[test]
    fn test_rejects_symbols_and_emoji() {
        assert!(normalize_domain("💩.la").is_none());
        assert!(normalize_domain("xn--ls8h.la").is_none());
        assert!(normalize_domain("☃.example").is_none());
        assert!(normalize_domain("a♥b.example").is_none());
    }

    #[test]
    fn test_keeps_letters_and_marks() {
        // Devanagari with a virama (combining mark)
        assert!(normalize_domain("हिन्दी.example").is_some());
        assert!(normalize_domain("ελληνικά.example").is_some());
        assert!(normalize_domain("a1-b2.example").is_some());
    }

    #[test]
    fn test_rejects_missing_separator() {
        assert!(normalize_domain("localhost").is_none());
        assert!(normalize_domain("").is_none());
    }

    #[test]
    fn test_rejects_malformed_labels() {
        assert!(normalize_domain("xn--invalid..").is_none());
        assert!(normalize_domain("exa mple.com").is_none());
        assert!(normalize_domain("example..com").is_none());
        assert!(normalize_domain(&format!("{}.com", "a".repeat(64))).is_none());
    }

    #[test]
    fn test_rejects_overlong_names() {
        // 4 labels of 63 plus separators and a TLD: 258 characters
        let long = format!("{0}.{0}.{0}.{0}.com", "a".repeat(63));
        assert!(long.len() > MAX_DOMAIN_LENGTH);
        assert!(normalize_domain(&long).is_none());

        let fits = format!("{0}.{0}.{0}.{1}.com", "a".repeat(63), "a".repeat(57));
        assert_eq!(fits.len(), MAX_DOMAIN_LENGTH);
        assert!(normalize_domain(&fits).is_some());
    }
}
