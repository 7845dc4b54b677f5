use mcp_inject::{merge, DocumentKind, MergeConfig, MergeError, MergeStrategy, PendingEntries, ServerEntry};
use serde_json::{json, Value};

fn boost() -> ServerEntry {
    ServerEntry::new("boost", "php").args(["artisan", "boost:mcp"])
}

fn pending(entries: impl IntoIterator<Item = ServerEntry>) -> PendingEntries {
    entries.into_iter().collect()
}

fn squash(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scenario_empty_object() {
        let outcome = merge(&MergeConfig::new("mcpServers"), Some("{}"), &pending([boost()])).unwrap();
        assert_eq!(
            squash(&outcome.document),
            r#"{"mcpServers":{"boost":{"command":"php","args":["artisan","boost:mcp"]}}}"#
        );
    }

    #[test]
    fn test_json5_document_keeps_comments_and_gains_one_entry() {
        let text = include_str!("../fixtures/json5_settings.json");
        let config = MergeConfig::default();

        let first = merge(&config, Some(text), &pending([boost()])).unwrap();
        assert_eq!(first.mode, DocumentKind::ExtendedJson);
        for comment in [
            "// Editor-wide settings, maintained by hand.",
            "/* keep vcs dirs hidden */",
            "/*\n     * MCP servers discovered by the editor.\n     */",
            "// the package",
        ] {
            assert!(first.document.contains(comment), "missing {comment:?}");
        }
        assert_eq!(first.document.matches("\"boost\"").count(), 1);

        let second = merge(&config, Some(&first.document), &pending([boost()])).unwrap();
        assert!(!second.changed);
        assert_eq!(second.document, first.document);
        assert_eq!(second.document.matches("\"boost\"").count(), 1);
    }

    #[test]
    fn test_json5_insertion_is_a_pure_addition() {
        let text = include_str!("../fixtures/json5_settings.json");
        let outcome = merge(&MergeConfig::default(), Some(text), &pending([boost()])).unwrap();

        let inserted = "        \"boost\": {\n            \"command\": \"php\",\n            \"args\": [\n                \"artisan\",\n                \"boost:mcp\"\n            ]\n        },\n";
        let anchor = text.rfind("    },\n}").unwrap();
        let mut expected = text.to_string();
        expected.insert_str(anchor, inserted);
        assert_eq!(outcome.document, expected);
    }

    #[test]
    fn test_missing_key_is_injected_once() {
        let text = include_str!("../fixtures/no_servers.jsonc");
        let config = MergeConfig::new("servers");
        let entries = pending([ServerEntry::new("im-new-here", "./start-mcp")]);

        let outcome = merge(&config, Some(text), &entries).unwrap();
        assert_eq!(outcome.document.matches("\"servers\"").count(), 1);
        assert!(outcome.document.contains("// Workspace inputs prompted on first launch."));
        assert!(outcome.document.contains("\"description\": \"API key // not a comment\","));
        assert!(outcome.document.starts_with(
            "{\n  \"servers\": {\n    \"im-new-here\": {\n        \"command\": \"./start-mcp\"\n    }\n  },\n  // Workspace"
        ));

        let again = merge(&config, Some(&outcome.document), &entries).unwrap();
        assert!(!again.changed);
    }

    #[test]
    fn test_empty_block_with_adjacent_comments() {
        let text = "{\n    // servers below\n    \"mcpServers\": { /* none yet */ },\n    \"other\": 1,\n}";
        let outcome = merge(&MergeConfig::default(), Some(text), &pending([boost()])).unwrap();
        assert!(outcome.document.contains("// servers below"));
        assert!(outcome.document.contains("/* none yet */"));
        assert!(outcome.document.contains("\"mcpServers\": {\n        \"boost\": {"));
        assert!(!outcome.document.contains("{,"));
    }

    #[test]
    fn test_strict_document_keeps_unrelated_keys_in_order() {
        let text = include_str!("../fixtures/strict.json");
        let outcome = merge(&MergeConfig::default(), Some(text), &pending([boost()])).unwrap();
        assert_eq!(outcome.mode, DocumentKind::StrictJson);

        let value: Value = serde_json::from_str(&outcome.document).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["theme", "mcpServers", "telemetry"]);
        assert_eq!(
            value["mcpServers"],
            json!({
                "existing": {"command": "node", "args": ["server.js"]},
                "boost": {"command": "php", "args": ["artisan", "boost:mcp"]}
            })
        );
    }

    #[test]
    fn test_multiple_entries_in_one_merge() {
        let text = "{\n  // c\n  \"mcpServers\": {\n    \"a\": {\"command\": \"x\"}\n  }\n}";
        let entries = pending([
            ServerEntry::new("b", "y").env("K", "V"),
            ServerEntry::new("a", "ignored"),
            ServerEntry::new("c", "z"),
        ]);
        let outcome = merge(&MergeConfig::default(), Some(text), &entries).unwrap();

        assert_eq!(outcome.added, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(outcome.skipped, vec!["a".to_string()]);
        let b = outcome.document.find("\"b\"").unwrap();
        let c = outcome.document.find("\"c\"").unwrap();
        assert!(b < c);
        assert!(outcome.document.contains("\"command\": \"x\"},\n    \"b\": {"));
        assert!(outcome.document.contains("    },\n    \"c\": {"));
    }

    #[test]
    fn test_overwrite_in_json5_document() {
        let text = "{\n  // c\n  \"mcpServers\": {\n    \"boost\": {\"command\": \"old\"},\n  },\n}";
        let config = MergeConfig::default().with_strategy(MergeStrategy::Overwrite);
        let outcome = merge(&config, Some(text), &pending([boost()])).unwrap();
        assert_eq!(outcome.updated, vec!["boost".to_string()]);
        assert!(!outcome.document.contains("old"));
        assert!(outcome.document.contains("// c"));
        assert_eq!(outcome.document.matches("\"boost\"").count(), 1);
    }

    #[test]
    fn test_unbalanced_json5_fails() {
        let text = "{\n  // c\n  \"mcpServers\": {\n    \"a\": {\"command\": \"x\"}\n}";
        let err = merge(&MergeConfig::default(), Some(text), &pending([boost()])).unwrap_err();
        assert!(matches!(err, MergeError::Unbalanced { .. }));
    }

    #[test]
    fn test_root_array_fails() {
        let err = merge(&MergeConfig::default(), Some("[1, 2,]"), &pending([boost()])).unwrap_err();
        assert!(matches!(err, MergeError::NotAnObject));
    }
}
