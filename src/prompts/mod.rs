//! System prompts
//!
//! This module builds the system prompt that opens every orchestration run.

pub mod sales_prompt;

/// Builds the system prompt for the registered tools
///
/// # Arguments
///
/// * `tool_names` - Names of the tools in the registry
///
/// # Returns
///
/// A string containing the system prompt
///
/// # Examples
///
/// ```
/// use retail_assistant::prompts::build_system_prompt;
///
/// let prompt = build_system_prompt(&["search_products".to_string()]);
/// assert!(prompt.contains("search_products"));
/// assert!(prompt.contains("RESPONSE FORMAT"));
/// ```
pub fn build_system_prompt(tool_names: &[String]) -> String {
    sales_prompt::generate_sales_prompt(tool_names)
}
