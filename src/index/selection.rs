use crate::index;

use std::{cmp, collections};

/// A facet matched by the index selector.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MatchedFacet {
    /// The attribute name.
    pub name: String,
    /// Whether the attribute is composed into the partition or the sort key.
    pub role: index::KeyRole,
}

/// Result of routing supplied facet names to an index.
///
/// No viable index is reported as an empty identifier with no keys, which tells it apart
/// from a match on the primary index (empty identifier, at least one key).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexMatch {
    /// The identifier of the selected index.
    pub index: String,
    /// The matched facets, partition key facets first then the sort key prefix.
    pub keys: Vec<MatchedFacet>,
}

impl IndexMatch {
    /// Whether no index could serve the supplied facets.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug)]
struct Candidate<'a> {
    index: &'a index::Index,
    matched_sk: usize,
    position: usize,
}

impl Candidate<'_> {
    fn score(&self) -> usize {
        self.index.pk.facets.len() + self.matched_sk
    }

    // Higher score first, then secondary before primary, then declaration order.
    fn rank(&self, other: &Self) -> cmp::Ordering {
        other
            .score()
            .cmp(&self.score())
            .then_with(|| self.index.is_primary().cmp(&other.index.is_primary()))
            .then_with(|| self.position.cmp(&other.position))
    }
}

impl index::IndexRegistry {
    /// Pick the index that makes use of the most supplied facets.
    ///
    /// An index is viable when all of its partition key facets are supplied; it then scores
    /// one point per partition key facet plus one per sort key facet of the longest supplied
    /// prefix of its sort key (a missing facet ends the prefix, later ones do not count).
    ///
    /// ```rust
    /// use dynamodb_facet::{entity, schema};
    /// use serde_json::json;
    ///
    /// let schema: schema::EntitySchema = serde_json::from_value(json!({
    ///     "service": "s",
    ///     "entity": "e",
    ///     "table": "t",
    ///     "version": "1",
    ///     "attributes": {"id": {}, "mall": {}, "store": {}},
    ///     "indexes": {
    ///         "record": {"pk": {"field": "pk", "facets": ["id"]}},
    ///         "stores": {
    ///             "index": "gsi1",
    ///             "pk": {"field": "gsi1pk", "facets": ["mall"]},
    ///             "sk": {"field": "gsi1sk", "facets": ["store"]}
    ///         }
    ///     }
    /// })).unwrap();
    /// let entity = entity::Entity::new(schema).unwrap();
    /// let matched = entity.registry().find_best_match(&["store", "mall"]);
    /// assert_eq!(matched.index, "gsi1");
    /// assert_eq!(matched.keys.len(), 2);
    /// ```
    pub fn find_best_match<S: AsRef<str>>(&self, supplied: &[S]) -> IndexMatch {
        let supplied: collections::HashSet<&str> =
            supplied.iter().map(|name| name.as_ref()).collect();
        let mut candidates: Vec<_> = self
            .indexes()
            .iter()
            .enumerate()
            .filter(|(_, index)| {
                index
                    .pk
                    .facets
                    .iter()
                    .all(|facet| supplied.contains(facet.as_str()))
            })
            .map(|(position, index)| Candidate {
                index,
                matched_sk: index
                    .sk_facets()
                    .iter()
                    .take_while(|facet| supplied.contains(facet.as_str()))
                    .count(),
                position,
            })
            .collect();
        candidates.sort_by(Candidate::rank);
        match candidates.first() {
            Some(best) => {
                let pk = best.index.pk.facets.iter().map(|name| MatchedFacet {
                    name: name.clone(),
                    role: index::KeyRole::Pk,
                });
                let sk = best.index.sk_facets()[..best.matched_sk]
                    .iter()
                    .map(|name| MatchedFacet {
                        name: name.clone(),
                        role: index::KeyRole::Sk,
                    });
                IndexMatch {
                    index: best.index.id.clone(),
                    keys: pk.chain(sk).collect(),
                }
            }
            None => IndexMatch::default(),
        }
    }
}
