/// 把后端返回的推荐链接补全为绝对链接
///
/// - 已带 scheme：原样返回
/// - 以 `/` 开头：拼接 origin
/// - 其他：视为裸路径，拼接 `origin + "/"`
///
/// 纯函数且幂等：结果总是带 scheme，再次调用原样返回。
pub fn normalize_referral_link(raw: &str, origin: &str) -> String {
    let raw = raw.trim();
    if has_scheme(raw) {
        return raw.to_string();
    }

    let origin = origin.trim().trim_end_matches('/');
    if raw.starts_with('/') {
        format!("{}{}", origin, raw)
    } else {
        format!("{}/{}", origin, raw)
    }
}

/// RFC 3986 scheme：字母开头，后接字母/数字/`+`/`-`/`.`，以 `:` 结束
fn has_scheme(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://salon.example";

    #[test]
    fn test_absolute_kept_verbatim() {
        assert_eq!(
            normalize_referral_link("https://other.example/ref/a", ORIGIN),
            "https://other.example/ref/a"
        );
    }

    #[test]
    fn test_root_relative_gets_origin() {
        assert_eq!(
            normalize_referral_link("/ref/abc", ORIGIN),
            "https://salon.example/ref/abc"
        );
    }

    #[test]
    fn test_bare_path_gets_origin_and_slash() {
        assert_eq!(
            normalize_referral_link("ref/abc", "https://salon.example/"),
            "https://salon.example/ref/abc"
        );
    }

    #[test]
    fn test_port_is_not_a_scheme() {
        // "localhost:8080/x" 的 "localhost" 是合法 scheme 语法，按规则原样返回
        assert!(has_scheme("localhost:8080/x"));
        assert!(!has_scheme("/a:b"));
        assert!(!has_scheme("8080:x"));
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "https://x.example/ref/a",
            "/ref/b",
            "ref/c",
            "",
            "  /ref/d  ",
            "mailto:someone@example.com",
        ];
        for raw in inputs {
            let once = normalize_referral_link(raw, ORIGIN);
            assert_eq!(normalize_referral_link(&once, ORIGIN), once, "input {:?}", raw);
        }
    }
}
