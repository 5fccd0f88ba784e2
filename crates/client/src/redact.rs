//! Scrubbing of credentials embedded in request paths.

use {
    regex::Regex,
    std::{borrow::Cow, sync::LazyLock},
};

/// `/bot<id>:<secret>/` or `/user<id>:<secret>/` in a request path.
#[allow(clippy::expect_used)]
static CREDENTIAL_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(bot|user)(\d+):[^/]+/").expect("credential path pattern is valid")
});

/// Replaces every `/bot<id>:<secret>/` or `/user<id>:<secret>/` in
/// `message` with `/bot<id>:[REDACTED]/` (resp. `/user…`).
///
/// `<id>` must be one or more ASCII digits and `<secret>` one or more
/// characters other than `/`. Borrows when nothing matched.
pub fn redact_token(message: &str) -> Cow<'_, str> {
    CREDENTIAL_PATH.replace_all(message, "/$1$2:[REDACTED]/")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("POST /bot12345:ABCDEF/ failed", "POST /bot12345:[REDACTED]/ failed")]
    #[case(
        "error sending request for url (https://api.telegram.org/bot123:AAH-x_y/sendPhoto)",
        "error sending request for url (https://api.telegram.org/bot123:[REDACTED]/sendPhoto)"
    )]
    #[case("/user42:s3cr3t/getMe", "/user42:[REDACTED]/getMe")]
    #[case("/bot1:a/x /bot2:b/y", "/bot1:[REDACTED]/x /bot2:[REDACTED]/y")]
    #[case("/bot1:abc/test/getMe", "/bot1:[REDACTED]/test/getMe")]
    fn redacts(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(redact_token(input), expected);
    }

    #[rstest]
    #[case("connection refused")]
    #[case("/bot:abc/")]
    #[case("/botname:abc/")]
    #[case("/bot12:/")]
    #[case("/bot12:abc")]
    #[case("/robot12:abc/")]
    fn leaves_non_matching(#[case] input: &str) {
        assert!(matches!(redact_token(input), Cow::Borrowed(_)));
    }
}
