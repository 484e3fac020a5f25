//! Configuration-driven tool registry builder
//!
//! Registers the shipped retail tools in a fixed order: product search,
//! store locator, policy search. A tool whose endpoint is not configured is
//! left out of the catalog.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ToolsConfig;
use crate::error::Result;
use crate::tools::{
    JsonEndpoint, PolicySearchTool, ProductSearchTool, StoreLocatorTool, ToolRegistry,
};

/// Builder for tool registries
///
/// # Examples
///
/// ```
/// use retail_assistant::config::ToolsConfig;
/// use retail_assistant::tools::registry_builder::ToolRegistryBuilder;
///
/// let registry = ToolRegistryBuilder::new(ToolsConfig::default())
///     .build()
///     .expect("Failed to build registry");
/// assert_eq!(
///     registry.names(),
///     vec!["search_products", "get_near_store", "search_terms_conditions"]
/// );
/// ```
pub struct ToolRegistryBuilder {
    tools_config: ToolsConfig,
}

impl ToolRegistryBuilder {
    /// Create a new tool registry builder
    pub fn new(tools_config: ToolsConfig) -> Self {
        Self { tools_config }
    }

    /// Build the registry
    ///
    /// # Errors
    ///
    /// Returns error if an endpoint HTTP client cannot be created
    pub fn build(&self) -> Result<ToolRegistry> {
        let timeout = Duration::from_secs(self.tools_config.timeout_seconds);
        let mut registry = ToolRegistry::new().with_timeout(timeout);

        if let Some(url) = &self.tools_config.product_search_url {
            registry.register(Arc::new(ProductSearchTool::new(JsonEndpoint::new(
                url.as_str(),
                timeout,
            )?)));
        }

        if let Some(url) = &self.tools_config.store_locator_url {
            registry.register(Arc::new(StoreLocatorTool::new(JsonEndpoint::new(
                url.as_str(),
                timeout,
            )?)));
        }

        if let Some(url) = &self.tools_config.policy_search_url {
            registry.register(Arc::new(PolicySearchTool::new(JsonEndpoint::new(
                url.as_str(),
                timeout,
            )?)));
        }

        tracing::debug!(tools = ?registry.names(), "Built tool registry");
        Ok(registry)
    }
}
