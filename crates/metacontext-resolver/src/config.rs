//! Resolver configuration.
//!
//! Every field has a default, so a partial JSON document only needs the
//! values it overrides.

use crate::error::{ResolverError, Result};
use metacontext_graph::{InstanceStatus, Paging};
use serde::{Deserialize, Serialize};

/// Type names the resolver dispatches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainTypeNames {
    pub column: String,
    pub table: String,
    pub data_store: String,
    pub deployed_schema: String,
    pub glossary_term: String,
    pub asset: String,
    pub schema_element: String,
    pub schema_attribute: String,
}

impl Default for ChainTypeNames {
    fn default() -> Self {
        Self {
            column: "RelationalColumn".to_string(),
            table: "RelationalTable".to_string(),
            data_store: "DataStore".to_string(),
            deployed_schema: "DeployedDatabaseSchema".to_string(),
            glossary_term: "GlossaryTerm".to_string(),
            asset: "Asset".to_string(),
            schema_element: "SchemaElement".to_string(),
            schema_attribute: "SchemaAttribute".to_string(),
        }
    }
}

/// Edge type used at each hop of the context chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotEdgeNames {
    pub schema_attribute_type: String,
    pub attribute_for_schema: String,
    pub asset_schema_type: String,
    pub data_content_for_data_set: String,
    pub connection_to_asset: String,
    pub connection_connector_type: String,
    pub connection_endpoint: String,
    pub semantic_assignment: String,
}

impl Default for PivotEdgeNames {
    fn default() -> Self {
        Self {
            schema_attribute_type: "SchemaAttributeType".to_string(),
            attribute_for_schema: "AttributeForSchema".to_string(),
            asset_schema_type: "AssetSchemaType".to_string(),
            data_content_for_data_set: "DataContentForDataSet".to_string(),
            connection_to_asset: "ConnectionToAsset".to_string(),
            connection_connector_type: "ConnectionConnectorType".to_string(),
            connection_endpoint: "ConnectionEndpoint".to_string(),
            semantic_assignment: "SemanticAssignment".to_string(),
        }
    }
}

/// What a chain hop does when the pivot edge type is present more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipSelection {
    /// Proceed only when exactly one pivot edge exists; otherwise the hop is unknown.
    #[default]
    ExactlyOne,
    /// Proceed through the first pivot edge the store returns.
    First,
}

/// What a search does when resolving one hit's context hits a store fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitFailurePolicy {
    /// Fail the whole search with that fault.
    #[default]
    Abort,
    /// Drop the hit, log a warning and keep going.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub types: ChainTypeNames,
    pub pivots: PivotEdgeNames,
    pub relationship_selection: RelationshipSelection,
    pub hit_failure: HitFailurePolicy,
    /// Worker threads for glossary fan-out and per-hit resolution; 1 runs inline.
    pub fan_out_workers: usize,
    /// Largest page a caller may request; 0 page size means "up to this".
    pub max_page_size: usize,
    pub max_neighborhood_depth: u32,
    pub qualified_name_property: String,
    pub display_name_property: String,
    /// Status filter used when a request does not name one.
    pub default_status: Vec<InstanceStatus>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            types: ChainTypeNames::default(),
            pivots: PivotEdgeNames::default(),
            relationship_selection: RelationshipSelection::default(),
            hit_failure: HitFailurePolicy::default(),
            fan_out_workers: 4,
            max_page_size: 500,
            max_neighborhood_depth: 10,
            qualified_name_property: "qualifiedName".to_string(),
            display_name_property: "displayName".to_string(),
            default_status: vec![InstanceStatus::Active],
        }
    }
}

impl ResolverConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| ResolverError::InvalidArgument(format!("resolver config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fan_out_workers == 0 {
            return Err(ResolverError::InvalidArgument(
                "fan_out_workers must be at least 1".to_string(),
            ));
        }
        if self.max_page_size == 0 {
            return Err(ResolverError::InvalidArgument(
                "max_page_size must be at least 1".to_string(),
            ));
        }
        if self.qualified_name_property.trim().is_empty() {
            return Err(ResolverError::InvalidArgument(
                "qualified_name_property is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Clamp a requested page to `max_page_size`. An oversized request is an
    /// error; a zero size asks for the largest allowed page.
    pub fn effective_paging(&self, paging: Paging) -> Result<Paging> {
        if paging.size > self.max_page_size {
            return Err(ResolverError::InvalidArgument(format!(
                "page size {} exceeds the maximum of {}",
                paging.size, self.max_page_size
            )));
        }
        let size = if paging.size == 0 {
            self.max_page_size
        } else {
            paging.size
        };
        Ok(Paging::new(paging.start, size))
    }

    pub fn status_or_default(&self, status: Option<&[InstanceStatus]>) -> Vec<InstanceStatus> {
        match status {
            Some(s) => s.to_vec(),
            None => self.default_status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ResolverConfig::from_json_str(
            r#"{ "relationship_selection": "first", "pivots": { "semantic_assignment": "Meaning" } }"#,
        )
        .unwrap();
        assert_eq!(config.relationship_selection, RelationshipSelection::First);
        assert_eq!(config.pivots.semantic_assignment, "Meaning");
        assert_eq!(config.pivots.connection_endpoint, "ConnectionEndpoint");
        assert_eq!(config.hit_failure, HitFailurePolicy::Abort);
        assert_eq!(config.types.column, "RelationalColumn");
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = ResolverConfig::from_json_str(r#"{ "fan_out_workers": 0 }"#).unwrap_err();
        assert!(matches!(err, ResolverError::InvalidArgument(_)));
    }

    #[test]
    fn malformed_json_is_an_invalid_argument() {
        assert!(matches!(
            ResolverConfig::from_json_str("[1,2"),
            Err(ResolverError::InvalidArgument(_))
        ));
    }

    #[test]
    fn paging_is_bounded_by_the_configured_maximum() {
        let config = ResolverConfig {
            max_page_size: 50,
            ..ResolverConfig::default()
        };
        assert_eq!(config.effective_paging(Paging::new(10, 0)).unwrap(), Paging::new(10, 50));
        assert_eq!(config.effective_paging(Paging::new(0, 20)).unwrap(), Paging::new(0, 20));
        assert!(config.effective_paging(Paging::new(0, 51)).is_err());
    }
}
