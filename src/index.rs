//! The immutable set of indexes an entity is reachable through.
//!
//! The registry is built once, when the entity schema is resolved, and only read afterwards:
//! - [`crate::common::key`] composes the physical pk/sk strings of one index
//! - [`selection`] routes an arbitrary bag of attribute names to the most specific index

/// Index selection from supplied facet names.
pub mod selection;

use crate::{
    error::{Error, Result},
    schema,
};

use serde::Serialize;
use std::{collections, fmt};

/// Role a facet plays in an index key.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    /// Part of the partition key.
    Pk,
    /// Part of the sort key.
    Sk,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pk => f.write_str("pk"),
            Self::Sk => f.write_str("sk"),
        }
    }
}

/// An attribute's participation in one index key.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Facet {
    /// The identifier of the index, empty for the primary index.
    pub index: String,
    /// The attribute name.
    pub name: String,
    /// Whether the attribute is composed into the partition or the sort key.
    pub role: KeyRole,
}

/// A resolved index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Index {
    /// The physical index name, empty for the primary index.
    pub id: String,
    /// The access pattern name the index was declared under.
    pub name: String,
    /// The partition key field and its ordered facets.
    pub pk: schema::KeyDefinition,
    /// The sort key field and its ordered facets, if the index has a sort key.
    pub sk: Option<schema::KeyDefinition>,
}

impl Index {
    /// Whether this is the primary index.
    pub fn is_primary(&self) -> bool {
        self.id.is_empty()
    }

    /// The ordered sort key facets, empty when the index has no sort key.
    pub fn sk_facets(&self) -> &[String] {
        self.sk
            .as_ref()
            .map(|sk| sk.facets.as_slice())
            .unwrap_or_default()
    }

    /// Every facet of the index, partition key facets first.
    pub fn facets(&self) -> impl Iterator<Item = Facet> + '_ {
        let pk = self.pk.facets.iter().map(|name| (name, KeyRole::Pk));
        let sk = self.sk_facets().iter().map(|name| (name, KeyRole::Sk));
        pk.chain(sk).map(|(name, role)| Facet {
            index: self.id.clone(),
            name: name.clone(),
            role,
        })
    }

    /// Every facet name of the index, partition key facets first.
    pub fn facet_names(&self) -> Vec<String> {
        self.pk
            .facets
            .iter()
            .chain(self.sk_facets())
            .cloned()
            .collect()
    }
}

/// Registry of the indexes of one entity, in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexRegistry {
    indexes: Vec<Index>,
    pub(crate) pk_prefix: String,
    primary: usize,
    pub(crate) sk_prefix: String,
}

impl IndexRegistry {
    pub(crate) fn new(pk_prefix: String, sk_prefix: String, indexes: Vec<Index>) -> Result<Self> {
        let mut primary = None;
        let mut ids = collections::HashSet::with_capacity(indexes.len());
        for (position, index) in indexes.iter().enumerate() {
            if !ids.insert(index.id.as_str()) {
                let message = if index.is_primary() {
                    format!(
                        "Duplicate primary index: \"{}\". Only one index may omit the \"index\" property",
                        index.name
                    )
                } else {
                    format!("Duplicate index identifier: \"{}\"", index.id)
                };
                return Err(Error::InvalidSchema(message));
            }
            if index.is_primary() {
                primary = Some(position);
            }
            if index.pk.facets.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "Index \"{}\" has no partition key facets",
                    index.name
                )));
            }
            let mut seen = collections::HashSet::new();
            if let Some(facet) = index.facet_names().into_iter().find(|name| !seen.insert(name.clone())) {
                return Err(Error::InvalidSchema(format!(
                    "Facet \"{facet}\" is used more than once in index \"{}\"",
                    index.name
                )));
            }
        }
        let primary = primary.ok_or_else(|| {
            Error::InvalidSchema(
                "Missing primary index. Exactly one index must omit the \"index\" property"
                    .to_string(),
            )
        })?;
        let registry = Self {
            indexes,
            pk_prefix,
            primary,
            sk_prefix,
        };
        Ok(registry)
    }

    /// All indexes, in declaration order.
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// The primary index.
    pub fn primary(&self) -> &Index {
        &self.indexes[self.primary]
    }

    /// Look an index up by its identifier (empty for the primary index).
    pub fn get(&self, id: &str) -> Result<&Index> {
        self.indexes
            .iter()
            .find(|index| index.id == id)
            .ok_or_else(|| Error::InvalidIndex(id.to_string()))
    }

    /// Look an index up by the access pattern name it was declared under.
    pub fn by_name(&self, name: &str) -> Result<&Index> {
        self.indexes
            .iter()
            .find(|index| index.name == name)
            .ok_or_else(|| Error::InvalidIndex(name.to_string()))
    }

    /// Every facet of every index.
    pub fn facets(&self) -> impl Iterator<Item = Facet> + '_ {
        self.indexes.iter().flat_map(Index::facets)
    }

    /// The facets an attribute takes part in, across all indexes.
    pub fn facets_for(&self, attribute: &str) -> Vec<Facet> {
        self.facets().filter(|facet| facet.name == attribute).collect()
    }
}
