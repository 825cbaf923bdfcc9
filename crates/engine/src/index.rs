//! Indexing walks
//!
//! The write path registers an entry under every level of a tag's ancestor
//! chain; the delete path unwinds the same chain. Both only queue commands
//! onto a pipeline — execution (and therefore atomicity) belongs to the
//! caller, which batches the walks for all of an entry's tags into one
//! transaction.
//!
//! Duplicate `ZADD`/`ZREM` commands across shared ancestors (two requested
//! tags with a common parent, or the root) are harmless: both commands are
//! idempotent per (key, member).

use tagbase_core::{KeySpace, Tag};
use tagbase_store::Pipeline;

/// Queue the registration of `id` under `tag` and every ancestor
///
/// Records the exact requested path in the entry's membership set (ancestors
/// are re-derivable from it), adds the entry to the sorted set of each level
/// with the same score, and registers each level in its parent's children
/// registry so subtrees can be enumerated and cleaned up later.
pub(crate) fn index_entry(
    mut pipe: Pipeline,
    keys: &KeySpace,
    tag: &Tag,
    id: &str,
    score: f64,
) -> Pipeline {
    pipe = pipe.sadd(keys.entry_tags_key(id), vec![tag.name().to_string()]);

    let mut current = tag.clone();
    while let Some(parent) = current.parent() {
        pipe = pipe.zadd(keys.tag_key(&current), vec![(score, id.to_string())]);
        pipe = pipe.zadd(
            keys.tag_children_key(&parent),
            vec![(0.0, current.name().to_string())],
        );
        current = parent;
    }
    // current is now the root, which indexes every entry
    pipe.zadd(keys.tag_key(&current), vec![(score, id.to_string())])
}

/// Queue the removal of `id` from `tag` and every ancestor
pub(crate) fn unindex_entry(
    mut pipe: Pipeline,
    keys: &KeySpace,
    tag: &Tag,
    id: &str,
) -> Pipeline {
    for ancestor in tag.ancestors() {
        pipe = pipe.zrem(keys.tag_key(&ancestor), vec![id.to_string()]);
    }
    pipe
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagbase_store::Command;

    fn keys() -> KeySpace {
        KeySpace::new("tb", "db")
    }

    fn zadd_keys(pipe: &Pipeline) -> Vec<&str> {
        pipe.commands()
            .iter()
            .filter_map(|cmd| match cmd {
                Command::ZAdd { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_index_entry_walks_to_root() {
        let pipe = index_entry(Pipeline::new(), &keys(), &Tag::from_path("a/b/c"), "id1", 7.0);

        let zadds = zadd_keys(&pipe);
        // Entry registered at every level plus the root, children edges at
        // every non-root level
        assert!(zadds.contains(&"tb:db:tag:a/b/c"));
        assert!(zadds.contains(&"tb:db:tag:a/b"));
        assert!(zadds.contains(&"tb:db:tag:a"));
        assert!(zadds.contains(&"tb:db:tag"));
        assert!(zadds.contains(&"tb:db:tag:a/b:children"));
        assert!(zadds.contains(&"tb:db:tag:a:children"));
        assert!(zadds.contains(&"tb:db:tag:children"));
    }

    #[test]
    fn test_index_entry_records_leaf_path_only() {
        let pipe = index_entry(Pipeline::new(), &keys(), &Tag::from_path("a/b"), "id1", 1.0);

        let memberships: Vec<&Command> = pipe
            .commands()
            .iter()
            .filter(|cmd| matches!(cmd, Command::SAdd { .. }))
            .collect();
        assert_eq!(memberships.len(), 1);
        assert_eq!(
            memberships[0],
            &Command::SAdd {
                key: "tb:db:id1/tags".to_string(),
                members: vec!["a/b".to_string()],
            }
        );
    }

    #[test]
    fn test_index_root_tag_touches_root_set_only() {
        let pipe = index_entry(Pipeline::new(), &keys(), &Tag::root(), "id1", 1.0);
        assert_eq!(zadd_keys(&pipe), vec!["tb:db:tag"]);
    }

    #[test]
    fn test_unindex_entry_covers_every_ancestor() {
        let pipe = unindex_entry(Pipeline::new(), &keys(), &Tag::from_path("a/b"), "id1");

        let zrems: Vec<&str> = pipe
            .commands()
            .iter()
            .filter_map(|cmd| match cmd {
                Command::ZRem { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(zrems, vec!["tb:db:tag:a/b", "tb:db:tag:a", "tb:db:tag"]);
    }

    #[test]
    fn test_same_score_at_every_level() {
        let pipe = index_entry(Pipeline::new(), &keys(), &Tag::from_path("x/y"), "id9", 42.0);

        for cmd in pipe.commands() {
            if let Command::ZAdd { key, entries } = cmd {
                if !key.ends_with(":children") {
                    assert_eq!(entries, &vec![(42.0, "id9".to_string())]);
                }
            }
        }
    }
}
