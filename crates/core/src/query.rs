//! Query expression types
//!
//! A [`Where`] expression selects entries by tag membership: everything, a
//! single tag path, or a boolean combination of paths (all of `and`, at least
//! one of `or`). Resolution of expressions into concrete tags is the query
//! planner's job; these types are plain data.

use serde::{Deserialize, Serialize};

/// Ordering direction for range queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Order {
    /// Lowest score first
    #[default]
    Ascending,
    /// Highest score first
    Descending,
}

/// One end of a score range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScoreBound {
    /// Unbounded below (`-inf`)
    NegInf,
    /// Unbounded above (`+inf`)
    PosInf,
    /// Inclusive numeric bound
    Value(f64),
}

/// Inclusive score range for count queries
///
/// Defaults to `-inf..+inf`, matching every score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    /// Lower bound (inclusive)
    pub min: ScoreBound,
    /// Upper bound (inclusive)
    pub max: ScoreBound,
}

impl Default for ScoreRange {
    fn default() -> Self {
        ScoreRange {
            min: ScoreBound::NegInf,
            max: ScoreBound::PosInf,
        }
    }
}

impl ScoreRange {
    /// Range between two inclusive numeric bounds
    pub fn between(min: f64, max: f64) -> Self {
        ScoreRange {
            min: ScoreBound::Value(min),
            max: ScoreBound::Value(max),
        }
    }

    /// Whether a score falls within this range
    pub fn contains(&self, score: f64) -> bool {
        let above_min = match self.min {
            ScoreBound::NegInf => true,
            ScoreBound::PosInf => false,
            ScoreBound::Value(v) => score >= v,
        };
        let below_max = match self.max {
            ScoreBound::NegInf => false,
            ScoreBound::PosInf => true,
            ScoreBound::Value(v) => score <= v,
        };
        above_min && below_max
    }
}

/// Tag-membership selection expression
///
/// - [`Where::Everything`] matches every entry (the root tag).
/// - [`Where::Path`] matches one tag and its subtree.
/// - [`Where::Query`] matches entries in all `and` tags and at least one
///   `or` tag. An `or` list of exactly one path is rejected by the planner
///   as an ambiguous single-element union.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Where {
    /// Match every entry in the database
    #[default]
    Everything,
    /// Match entries under a single tag path
    Path(String),
    /// Match a boolean combination of tag paths
    Query {
        /// Entries must be members of every one of these tags
        and: Vec<String>,
        /// Entries must be members of at least one of these tags
        or: Vec<String>,
    },
}

impl Where {
    /// Select a single tag path
    pub fn path(path: impl Into<String>) -> Self {
        Where::Path(path.into())
    }

    /// Select entries belonging to all of the given tags
    pub fn all_of<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Where::Query {
            and: paths.into_iter().map(Into::into).collect(),
            or: Vec::new(),
        }
    }

    /// Select entries belonging to at least one of the given tags
    pub fn any_of<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Where::Query {
            and: Vec::new(),
            or: paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<&str> for Where {
    fn from(path: &str) -> Self {
        Where::Path(path.to_string())
    }
}

/// A stored value plus its identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<V> {
    /// Entry identifier (caller-supplied or generated)
    pub id: String,
    /// Deserialized entry value
    pub value: V,
}
