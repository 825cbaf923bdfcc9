//! Tag expression planning
//!
//! Every query ultimately reads one sorted set. This module resolves a
//! [`Where`] expression down to the single tag whose sorted set answers it:
//! bare paths resolve directly, while AND/OR combinations materialize a
//! derived aggregate tag — a `ZINTERSTORE`/`ZUNIONSTORE` of the member
//! tags' sets, stored under a name built from the member paths.
//!
//! Aggregates are cached with a short expiration and reused by any query
//! that derives the same name while enough of that expiration remains, so
//! repeated pages of one logical query hit the same precomputed set. A
//! reused aggregate can therefore be up to its TTL stale with respect to
//! concurrent saves.

use tagbase_core::{Error, Result, Tag, Where};
use tagbase_store::{Aggregate, Pipeline, StoreBackend};
use tracing::trace;

use crate::database::Tagbase;

/// How an aggregate combines its source sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combine {
    Union,
    Intersection,
}

impl Combine {
    /// Separator joining member paths into the aggregate's tag name
    fn separator(self) -> &'static str {
        match self {
            Combine::Union => "+",
            Combine::Intersection => "&",
        }
    }
}

impl<V, S> Tagbase<V, S>
where
    S: StoreBackend,
{
    /// Resolve an expression to the tag whose sorted set holds the matching
    /// entry ids
    ///
    /// A sole term resolves directly whether it was given as AND or OR; an
    /// OR combination of one tag alongside AND terms is rejected because a
    /// one-armed union is always a caller mistake.
    pub(crate) fn resolve_entries_filter(&self, filter: &Where) -> Result<Tag> {
        match filter {
            Where::Everything => Ok(Tag::root()),
            Where::Path(path) => Ok(Tag::from_path(path)),
            Where::Query { and, or } => match (and.as_slice(), or.as_slice()) {
                ([], []) => Ok(Tag::root()),
                ([only], []) | ([], [only]) => Ok(Tag::from_path(only)),
                (_, [_]) => Err(Error::InvalidQuery(
                    "an OR combination needs at least two tags".to_string(),
                )),
                (and_paths, or_paths) => {
                    let union = if or_paths.is_empty() {
                        None
                    } else {
                        Some(self.get_or_create_aggregate(or_paths, Combine::Union)?)
                    };
                    let inter = match and_paths {
                        [] => None,
                        [only] => Some(Tag::from_path(only)),
                        many => Some(self.get_or_create_aggregate(many, Combine::Intersection)?),
                    };
                    match (union, inter) {
                        (Some(u), Some(i)) => {
                            let arms = [u.name().to_string(), i.name().to_string()];
                            self.get_or_create_aggregate(&arms, Combine::Intersection)
                        }
                        (Some(u), None) => Ok(u),
                        (None, Some(i)) => Ok(i),
                        // unreachable: both slices were non-empty above
                        (None, None) => Ok(Tag::root()),
                    }
                }
            },
        }
    }

    /// Resolve an expression to the tag whose children registry should be
    /// listed
    ///
    /// Only bare paths and OR combinations make sense here: listing the
    /// children of an intersection has no coherent meaning, so AND terms
    /// are rejected. An OR combination materializes the union of the member
    /// tags' children registries under the combined tag's registry key.
    pub(crate) fn resolve_tags_filter(&self, filter: &Where) -> Result<Tag> {
        match filter {
            Where::Everything => Ok(Tag::root()),
            Where::Path(path) => Ok(Tag::from_path(path)),
            Where::Query { and, or } => {
                if !and.is_empty() {
                    return Err(Error::InvalidQuery(
                        "tag listing supports OR combinations only".to_string(),
                    ));
                }
                match or.as_slice() {
                    [] => Ok(Tag::root()),
                    [only] => Ok(Tag::from_path(only)),
                    many => {
                        let target = Tag::from_path(&many.join(Combine::Union.separator()));
                        let sources = many
                            .iter()
                            .map(|path| self.keys.tag_children_key(&Tag::from_path(path)))
                            .collect();
                        let destination = self.keys.tag_children_key(&target);
                        self.materialize_aggregate(&destination, sources, Combine::Union)?;
                        Ok(target)
                    }
                }
            }
        }
    }

    /// Materialize the combination of several tags as a derived tag
    ///
    /// The derived tag's name is the member paths joined with the combine
    /// separator, so equal combinations land on the same key and share the
    /// cached set.
    fn get_or_create_aggregate(&self, paths: &[String], combine: Combine) -> Result<Tag> {
        let target = Tag::from_path(&paths.join(combine.separator()));
        let sources = paths
            .iter()
            .map(|path| self.keys.tag_key(&Tag::from_path(path)))
            .collect();
        self.materialize_aggregate(&self.keys.tag_key(&target), sources, combine)?;
        Ok(target)
    }

    /// Compute an aggregate set at `destination` unless a fresh one exists
    ///
    /// An existing aggregate is reused while its remaining TTL exceeds the
    /// configured buffer; one about to expire mid-query is recomputed
    /// instead. Scores aggregate with `Min`, so a paged walk over a
    /// combination orders entries by their earliest membership score.
    fn materialize_aggregate(
        &self,
        destination: &str,
        sources: Vec<String>,
        combine: Combine,
    ) -> Result<()> {
        let remaining = self.store.ttl(destination)?;
        if remaining as f64 > self.config.aggregate_ttl_buffer {
            trace!(destination, remaining, "reusing cached aggregate");
            return Ok(());
        }
        trace!(destination, sources = sources.len(), "computing aggregate");
        let pipe = match combine {
            Combine::Union => Pipeline::new().zunionstore(destination, sources, Aggregate::Min),
            Combine::Intersection => {
                Pipeline::new().zinterstore(destination, sources, Aggregate::Min)
            }
        };
        self.store
            .exec(pipe.expire(destination, self.config.aggregate_ttl_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Query, SaveOptions};
    use std::time::Duration;
    use tagbase_core::Order;

    fn db() -> Tagbase<String> {
        Tagbase::in_memory("plan")
    }

    fn ids(db: &Tagbase<String>, filter: Where) -> Vec<String> {
        db.filter(&Query::filtered(filter))
            .unwrap()
            .into_iter()
            .map(|entry| entry.id)
            .collect()
    }

    // === Resolution ===

    #[test]
    fn test_everything_resolves_to_root() {
        let db = db();
        assert!(db.resolve_entries_filter(&Where::Everything).unwrap().is_root());
        assert!(db
            .resolve_entries_filter(&Where::Query {
                and: vec![],
                or: vec![],
            })
            .unwrap()
            .is_root());
    }

    #[test]
    fn test_sole_term_resolves_directly() {
        let db = db();
        let and = db.resolve_entries_filter(&Where::all_of(["a/b"])).unwrap();
        let or = db.resolve_entries_filter(&Where::any_of(["a/b"])).unwrap();
        assert_eq!(and.name(), "a/b");
        assert_eq!(or.name(), "a/b");
    }

    #[test]
    fn test_one_armed_union_alongside_and_rejected() {
        let db = db();
        let result = db.resolve_entries_filter(&Where::Query {
            and: vec!["a".to_string()],
            or: vec!["b".to_string()],
        });
        assert!(matches!(result, Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn test_tags_filter_rejects_and_terms() {
        let db = db();
        let result = db.resolve_tags_filter(&Where::all_of(["a", "b"]));
        assert!(matches!(result, Err(Error::InvalidQuery(_))));
    }

    // === Aggregates ===

    #[test]
    fn test_union_aggregate() {
        let db = db();
        db.save("1", &"x".to_string(), SaveOptions::new().tag("foo")).unwrap();
        db.save("2", &"y".to_string(), SaveOptions::new().tag("bar")).unwrap();

        let tag = db
            .resolve_entries_filter(&Where::any_of(["foo", "bar"]))
            .unwrap();
        assert_eq!(tag.name(), "foo+bar");

        let members = db
            .store
            .zrange(&db.keys.tag_key(&tag), 0, -1, Order::Ascending)
            .unwrap();
        assert_eq!(members, vec!["1", "2"]);
        // Cached with the configured expiration
        assert_eq!(db.store.ttl(&db.keys.tag_key(&tag)).unwrap(), 10);
    }

    #[test]
    fn test_intersection_aggregate() {
        let db = db();
        db.save("1", &"x".to_string(), SaveOptions::new().tags(["foo", "bar"]))
            .unwrap();
        db.save("2", &"y".to_string(), SaveOptions::new().tag("foo")).unwrap();

        let hits = ids(&db, Where::all_of(["foo", "bar"]));
        assert_eq!(hits, vec!["1"]);
    }

    #[test]
    fn test_mixed_and_or_combination() {
        let db = db();
        db.save("1", &"x".to_string(), SaveOptions::new().tags(["a", "c"]))
            .unwrap();
        db.save("2", &"y".to_string(), SaveOptions::new().tags(["b", "c"]))
            .unwrap();
        db.save("3", &"z".to_string(), SaveOptions::new().tag("c")).unwrap();

        // (a OR b) AND c
        let tag = db
            .resolve_entries_filter(&Where::Query {
                and: vec!["c".to_string()],
                or: vec!["a".to_string(), "b".to_string()],
            })
            .unwrap();
        assert_eq!(tag.name(), "a+b&c");

        let hits = ids(
            &db,
            Where::Query {
                and: vec!["c".to_string()],
                or: vec!["a".to_string(), "b".to_string()],
            },
        );
        assert_eq!(hits, vec!["1", "2"]);
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let db = db();
        db.save("1", &"x".to_string(), SaveOptions::new().tag("foo")).unwrap();
        db.save("2", &"y".to_string(), SaveOptions::new().tag("bar")).unwrap();

        assert!(ids(&db, Where::all_of(["foo", "bar"])).is_empty());
    }

    #[test]
    fn test_aggregate_reused_while_fresh() {
        let db = db();
        db.save("1", &"x".to_string(), SaveOptions::new().tag("foo")).unwrap();
        db.save("2", &"y".to_string(), SaveOptions::new().tag("bar")).unwrap();

        assert_eq!(ids(&db, Where::any_of(["foo", "bar"])).len(), 2);

        // A save after materialization is invisible while the cache lives
        db.save("3", &"z".to_string(), SaveOptions::new().tag("foo")).unwrap();
        assert_eq!(ids(&db, Where::any_of(["foo", "bar"])).len(), 2);

        // and visible once it expires
        db.store.advance_clock(Duration::from_secs(11));
        assert_eq!(ids(&db, Where::any_of(["foo", "bar"])).len(), 3);
    }

    #[test]
    fn test_tags_union_lists_merged_children() {
        let db = db();
        db.save("1", &"x".to_string(), SaveOptions::new().tag("a/one")).unwrap();
        db.save("2", &"y".to_string(), SaveOptions::new().tag("b/two")).unwrap();

        let children = db
            .tags(&Query::filtered(Where::any_of(["a", "b"])))
            .unwrap();
        assert_eq!(children, vec!["a/one", "b/two"]);
    }
}
