/// Expand `${VAR}` and `${VAR:-fallback}` placeholders in raw config text.
///
/// A placeholder whose variable is unset and has no fallback is kept
/// verbatim, so a missing secret fails loudly at use rather than becoming an
/// empty string.
pub fn substitute_env(input: &str) -> String {
    expand(input, |name| std::env::var(name).ok())
}

fn expand(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: copy the tail unchanged.
            out.push_str(&rest[start..]);
            return out;
        };
        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };
        match (name.is_empty(), lookup(name), fallback) {
            (false, Some(value), _) => out.push_str(&value),
            (false, None, Some(fallback)) => out.push_str(fallback),
            _ => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "TGWIRE_TEST_TOKEN" => Some("123:abc".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            expand("token = \"${TGWIRE_TEST_TOKEN}\"", lookup),
            "token = \"123:abc\""
        );
    }

    #[test]
    fn fallback_used_when_unset() {
        assert_eq!(
            expand("root=${TGWIRE_NOPE:-https://api.telegram.org}", lookup),
            "root=https://api.telegram.org"
        );
    }

    #[test]
    fn fallback_ignored_when_set() {
        assert_eq!(expand("${TGWIRE_TEST_TOKEN:-x}", lookup), "123:abc");
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(expand("a ${TGWIRE_NOPE} b", lookup), "a ${TGWIRE_NOPE} b");
    }

    #[test]
    fn unterminated_and_empty() {
        assert_eq!(expand("x ${OPEN", lookup), "x ${OPEN");
        assert_eq!(expand("${}", lookup), "${}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
