use mcp_inject::detect::{has_trailing_comma, has_unquoted_comments, is_plain_json};
use mcp_inject::indent::{detect_indentation, FALLBACK_INDENT};
use mcp_inject::{classify, DocumentKind};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_markers_inside_strings_are_data() {
        let text =
            r#"{"exampleCode": "// here is the example code", "url": "https://example.com/path"}"#;
        assert!(!has_unquoted_comments(text));
        assert!(is_plain_json(text));
    }

    #[test]
    fn test_real_comment_after_empty_block() {
        assert!(has_unquoted_comments(r#"{"servers": {} // real comment}"#));
    }

    #[test]
    fn test_trailing_comma_separated_by_newline_and_whitespace() {
        let with_comma = "{\n  \"servers\": {\n    \"a\": {\"command\": \"x\"},\n  \t\n  }\n}";
        let without_comma = "{\n  \"servers\": {\n    \"a\": {\"command\": \"x\"}\n  }\n}";
        assert!(has_trailing_comma(with_comma));
        assert!(!is_plain_json(with_comma));
        assert!(is_plain_json(without_comma));
    }

    #[test]
    fn test_fixture_classification() {
        assert_eq!(
            classify(include_str!("../fixtures/json5_settings.json")),
            DocumentKind::ExtendedJson
        );
        assert_eq!(
            classify(include_str!("../fixtures/no_servers.jsonc")),
            DocumentKind::ExtendedJson
        );
        assert_eq!(classify(include_str!("../fixtures/strict.json")), DocumentKind::StrictJson);
    }

    #[test]
    fn test_indentation_matches_existing_servers() {
        let text = include_str!("../fixtures/json5_settings.json");
        let close = text.rfind("\n    },").unwrap() + 1;
        assert_eq!(detect_indentation(text, close), 8);
    }

    #[test]
    fn test_indentation_fallback() {
        let text = "{\n  // nothing nested here\n  \"a\": 1\n}";
        assert_eq!(detect_indentation(text, text.len() - 1), FALLBACK_INDENT);
    }
}
