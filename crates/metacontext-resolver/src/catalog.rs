//! Type Catalog: every type definition of the connected store, loaded once.
//!
//! The catalog is read-only after loading and is shared freely between
//! concurrent requests. There is no refresh path; types added to the store
//! later are invisible here (direct lookups fall back to the store, see
//! [`crate::ResolverService::type_definition`]).

use crate::error::{ResolverError, Result};
use ahash::{AHashMap, AHashSet};
use metacontext_graph::{MetadataStore, TypeDef};

#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    by_name: AHashMap<String, TypeDef>,
    guid_to_name: AHashMap<String, String>,
    direct_subtypes: AHashMap<String, Vec<String>>,
}

impl TypeCatalog {
    /// Fetch all type definitions from the store.
    pub fn load<S: MetadataStore + ?Sized>(store: &S, user: &str) -> Result<Self> {
        let defs = store.get_all_type_definitions(user)?;
        let catalog = Self::from_definitions(defs);
        tracing::info!(types = catalog.len(), "type catalog loaded");
        Ok(catalog)
    }

    pub fn from_definitions(defs: impl IntoIterator<Item = TypeDef>) -> Self {
        let mut catalog = Self::default();
        for def in defs {
            if let Some(parent) = &def.super_type {
                catalog
                    .direct_subtypes
                    .entry(parent.clone())
                    .or_default()
                    .push(def.name.clone());
            }
            catalog
                .guid_to_name
                .insert(def.guid.clone(), def.name.clone());
            catalog.by_name.insert(def.name.clone(), def);
        }
        for subs in catalog.direct_subtypes.values_mut() {
            subs.sort();
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Every catalogued type name, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn resolve_type_id(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(|d| d.guid.as_str())
    }

    pub fn type_by_name(&self, name: &str) -> Option<&TypeDef> {
        self.by_name.get(name)
    }

    pub fn type_by_guid(&self, guid: &str) -> Option<&TypeDef> {
        self.guid_to_name
            .get(guid)
            .and_then(|name| self.by_name.get(name))
    }

    /// Whether `type_name` is `ancestor` or has it somewhere up its supertype
    /// chain. Unknown `type_name` is never a kind of anything. Malformed
    /// (cyclic) chains terminate with `false`.
    pub fn is_kind_of(&self, type_name: &str, ancestor: &str) -> bool {
        let Some(mut current) = self.by_name.get(type_name) else {
            return false;
        };
        if type_name == ancestor {
            return true;
        }
        let mut visited: AHashSet<&str> = AHashSet::new();
        visited.insert(type_name);
        while let Some(parent) = current.super_type.as_deref() {
            if parent == ancestor {
                return true;
            }
            if !visited.insert(parent) {
                tracing::warn!(type_name, parent, "supertype cycle in type catalog");
                return false;
            }
            match self.by_name.get(parent) {
                Some(def) => current = def,
                None => return false,
            }
        }
        false
    }

    /// Supertype names of `type_name`, nearest first.
    pub fn supertypes(&self, type_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut visited: AHashSet<&str> = AHashSet::new();
        visited.insert(type_name);
        let mut current = self.by_name.get(type_name);
        while let Some(parent) = current.and_then(|d| d.super_type.as_deref()) {
            if !visited.insert(parent) {
                break;
            }
            out.push(parent.to_string());
            current = self.by_name.get(parent);
        }
        out
    }

    /// `type_name` followed by every transitive subtype, breadth first.
    /// Unknown names are a hard `TypeUnknown`.
    pub fn subtypes_of(&self, type_name: &str) -> Result<Vec<&TypeDef>> {
        let root = self
            .by_name
            .get(type_name)
            .ok_or_else(|| ResolverError::TypeUnknown(type_name.to_string()))?;
        let mut out = vec![root];
        let mut visited: AHashSet<&str> = AHashSet::new();
        visited.insert(root.name.as_str());
        let mut i = 0;
        while i < out.len() {
            let def: &TypeDef = out[i];
            if let Some(subs) = self.direct_subtypes.get(def.name.as_str()) {
                for sub in subs {
                    if visited.insert(sub.as_str()) {
                        if let Some(def) = self.by_name.get(sub) {
                            out.push(def);
                        }
                    }
                }
            }
            i += 1;
        }
        Ok(out)
    }
}
