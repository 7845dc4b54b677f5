use assert_fs::prelude::*;
use mcp_inject::{ConfigWriter, DocumentKind, MergeStrategy, ServerEntry};
use std::fs;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_fresh_file_with_servers_key() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let target = temp_dir.child(".vscode/mcp.json");

        let saved = ConfigWriter::new(target.path())
            .config_key("servers")
            .add_server(ServerEntry::new("im-new-here", "./start-mcp"))
            .save();

        assert!(saved);
        let content = fs::read_to_string(target.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, serde_json::json!({"servers": {"im-new-here": {"command": "./start-mcp"}}}));
    }

    #[test]
    fn test_save_json5_file_twice() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let target = temp_dir.child("mcp.json");
        target.write_str(include_str!("../fixtures/json5_settings.json")).unwrap();

        let writer = ConfigWriter::new(target.path())
            .add_server(ServerEntry::new("boost", "php").args(["artisan", "boost:mcp"]));

        let first = writer.try_save().unwrap();
        assert!(first.written);
        assert_eq!(first.outcome.mode, DocumentKind::ExtendedJson);
        let after_first = fs::read_to_string(target.path()).unwrap();

        let second = writer.try_save().unwrap();
        assert!(!second.written);
        assert_eq!(fs::read_to_string(target.path()).unwrap(), after_first);
        assert_eq!(after_first.matches("\"boost\"").count(), 1);
        assert!(after_first.contains("// Editor-wide settings, maintained by hand."));
        assert!(after_first.contains("/* keep vcs dirs hidden */"));
    }

    #[test]
    fn test_last_add_server_call_wins() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let target = temp_dir.child("mcp.json");

        assert!(ConfigWriter::new(target.path())
            .add_server(ServerEntry::new("boost", "first"))
            .add_server(ServerEntry::new("boost", "second"))
            .save());

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(target.path()).unwrap()).unwrap();
        assert_eq!(parsed["mcpServers"]["boost"]["command"], "second");
    }

    #[test]
    fn test_overwrite_strategy_replaces_entry() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let target = temp_dir.child("mcp.json");
        target.write_str(r#"{"mcpServers": {"boost": {"command": "old"}}}"#).unwrap();

        let report = ConfigWriter::new(target.path())
            .strategy(MergeStrategy::Overwrite)
            .add_server(ServerEntry::new("boost", "php"))
            .try_save()
            .unwrap();

        assert_eq!(report.outcome.updated, vec!["boost".to_string()]);
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(target.path()).unwrap()).unwrap();
        assert_eq!(parsed["mcpServers"]["boost"]["command"], "php");
    }

    #[test]
    fn test_failed_merge_leaves_original_bytes() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let target = temp_dir.child("mcp.json");
        let original = "{\n  // unfinished edit\n  \"mcpServers\": {\n    \"a\": {\n}";
        target.write_str(original).unwrap();

        let saved =
            ConfigWriter::new(target.path()).add_server(ServerEntry::new("boost", "php")).save();

        assert!(!saved);
        target.assert(original);
    }

    #[test]
    fn test_config_key_holding_array_fails() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let target = temp_dir.child("mcp.json");
        target.write_str(r#"{"servers": []}"#).unwrap();

        let result = ConfigWriter::new(target.path())
            .config_key("servers")
            .add_server(ServerEntry::new("boost", "php"))
            .try_save();

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("expected an object"));
        target.assert(r#"{"servers": []}"#);
    }
}
