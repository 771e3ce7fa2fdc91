//! Syntactic email check used for an informational report line.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
        r"@",
        r"[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$",
    ))
    .ok()
});

/// Whether `s` is a bare `local-part@domain` address.
///
/// Display names, angle brackets and surrounding whitespace are rejected:
/// the whole string must be the address.
#[must_use]
pub fn email_looks_valid(s: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_values() {
        assert!(email_looks_valid("cloudqa.advanced@test.com"));
        assert!(!email_looks_valid("not-an-email"));
    }

    #[test]
    fn test_accepts_common_shapes() {
        assert!(email_looks_valid("a@b"));
        assert!(email_looks_valid("first.last+tag@sub.example.org"));
        assert!(email_looks_valid("o'brien@example.ie"));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "@example.com",
            "user@",
            "user@@example.com",
            "user name@example.com",
            ".user@example.com",
            "user.@example.com",
            "us..er@example.com",
            "user@-example.com",
            "user@example..com",
            "Jane <jane@example.com>",
            " jane@example.com",
            "jane@example.com ",
        ] {
            assert!(!email_looks_valid(bad), "accepted {bad:?}");
        }
    }

    proptest! {
        #[test]
        fn prop_without_at_sign_is_invalid(s in "[^@]*") {
            prop_assert!(!email_looks_valid(&s));
        }

        #[test]
        fn prop_simple_addresses_are_valid(
            local in "[a-z0-9]{1,12}",
            host in "[a-z0-9]{1,12}",
            tld in "[a-z]{2,6}",
        ) {
            let address = format!("{local}@{host}.{tld}");
            prop_assert!(email_looks_valid(&address));
        }
    }
}
