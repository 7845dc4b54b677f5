use mcp_inject::{merge, MergeConfig, PendingEntries, ServerEntry};
use proptest::prelude::*;
use std::collections::BTreeMap;

const DOCUMENTS: &[Option<&str>] = &[
    None,
    Some("{}"),
    Some("{\n  \"mcpServers\": {}, // empty\n}"),
    Some("{ /* c */ \"mcpServers\": {\"x\": {\"command\": \"y\"}} }"),
    Some(include_str!("../fixtures/strict.json")),
    Some(include_str!("../fixtures/json5_settings.json")),
    Some(include_str!("../fixtures/no_servers.jsonc")),
];

fn entry_strategy() -> impl Strategy<Value = (Vec<String>, BTreeMap<String, String>, String)> {
    (
        prop::collection::vec("[a-z0-9:/ ]{0,8}", 0..3),
        prop::collection::btree_map("[A-Z]{1,5}", "[a-z0-9]{0,6}", 0..3),
        "[a-z./]{1,10}",
    )
}

fn entries_strategy() -> impl Strategy<Value = PendingEntries> {
    prop::collection::btree_map(r#"srv-[a-z0-9"\\ ]{1,8}"#, entry_strategy(), 1..4).prop_map(|servers| {
        servers
            .into_iter()
            .map(|(key, (args, env, command))| ServerEntry::new(key, command).args(args).envs(env))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_second_merge_changes_nothing(
            document in prop::sample::select(DOCUMENTS),
            entries in entries_strategy(),
            use_servers_key in any::<bool>(),
        ) {
            let config = MergeConfig::new(if use_servers_key { "servers" } else { "mcpServers" });

            let first = merge(&config, document, &entries).unwrap();
            let second = merge(&config, Some(&first.document), &entries).unwrap();

            prop_assert!(!second.changed);
            prop_assert_eq!(&second.document, &first.document);
            prop_assert!(second.added.is_empty());
            for entry in &entries {
                let quoted = serde_json::to_string(&entry.key).unwrap();
                prop_assert_eq!(first.document.matches(&quoted).count(), 1);
                prop_assert!(second.skipped.contains(&entry.key));
            }
        }
    }
}
