//! Sales assistant system prompt
//!
//! Instructs the model to answer with the structured JSON shape and to use
//! each lookup tool only when it adds information the conversation does not
//! already contain.

use crate::tools::policy_search::SEARCH_TERMS_CONDITIONS;
use crate::tools::product_search::SEARCH_PRODUCTS;
use crate::tools::store_locator::GET_NEAR_STORE;

const INTRO: &str = "You are a retail electronics sales assistant helping customers find \
products, store locations and store policies.";

const RESPONSE_FORMAT: &str = r#"RESPONSE FORMAT - ALWAYS respond with this JSON structure and nothing else:
{
  "answer": "your conversational response only - NO product or store details here",
  "products": [product objects, only if search_products was used],
  "stores": [store objects, only if get_near_store was used],
  "end": "follow-up question to continue the conversation"
}

ANSWER FIELD RULES:
- NEVER put product names, prices or specifications in "answer"
- NEVER put store names, addresses or timings in "answer"
- Only put conversational guidance and insights in "answer"

EXAMPLES:
User: "show me phones"
{"answer": "I found some great smartphones for you! These offer excellent value and modern features.", "products": [...], "end": "What's your budget range?"}

User: "find a store in Delhi"
{"answer": "I found several stores in Delhi you can visit.", "stores": [...], "end": "Which area is most convenient for you?"}"#;

const CONVERSATION_RULES: &str = "CONVERSATION INTELLIGENCE:
- Remember which products and stores were already shown
- When the customer refers to something already shown, explain it without a new search
- Track preferences (budget, brands, features) across the conversation

SALES APPROACH:
- Be helpful and conversational
- Guide the customer toward a purchase decision
- Suggest visiting a store for hands-on experience
- Ask a relevant follow-up question every time";

/// Generates the sales assistant system prompt
///
/// Tool usage rules are listed only for tools that are actually available.
///
/// # Arguments
///
/// * `tool_names` - Names of the registered tools
///
/// # Examples
///
/// ```
/// use retail_assistant::prompts::sales_prompt::generate_sales_prompt;
///
/// let prompt = generate_sales_prompt(&["get_near_store".to_string()]);
/// assert!(prompt.contains("get_near_store"));
/// assert!(!prompt.contains("Use search_products"));
/// ```
pub fn generate_sales_prompt(tool_names: &[String]) -> String {
    let has = |name: &str| tool_names.iter().any(|t| t == name);

    let mut rules = Vec::new();
    if has(SEARCH_PRODUCTS) {
        rules.push(format!(
            "Use {} ONLY when the customer asks for products they have not seen yet",
            SEARCH_PRODUCTS
        ));
    }
    if has(GET_NEAR_STORE) {
        rules.push(format!(
            "Use {} ONLY when the customer asks about store locations by city or zipcode",
            GET_NEAR_STORE
        ));
    }
    if has(SEARCH_TERMS_CONDITIONS) {
        rules.push(format!(
            "Use {} when the customer asks about returns, warranty, delivery, privacy or other store policies",
            SEARCH_TERMS_CONDITIONS
        ));
    }

    let tool_section = if rules.is_empty() {
        "No lookup tools are available. Answer from the conversation so far and suggest \
         visiting a store for details."
            .to_string()
    } else {
        rules.push("DON'T use tools when discussing products or stores already shown".to_string());
        let numbered: Vec<String> = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| format!("{}. {}", i + 1, rule))
            .collect();
        format!("TOOL USAGE RULES:\n{}", numbered.join("\n"))
    };

    format!(
        "{}\n\n{}\n\n{}\n\n{}",
        INTRO, tool_section, RESPONSE_FORMAT, CONVERSATION_RULES
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tools() -> Vec<String> {
        vec![
            SEARCH_PRODUCTS.to_string(),
            GET_NEAR_STORE.to_string(),
            SEARCH_TERMS_CONDITIONS.to_string(),
        ]
    }

    #[test]
    fn test_prompt_lists_every_available_tool() {
        let prompt = generate_sales_prompt(&all_tools());
        assert!(prompt.contains("1. Use search_products"));
        assert!(prompt.contains("2. Use get_near_store"));
        assert!(prompt.contains("3. Use search_terms_conditions"));
        assert!(prompt.contains("4. DON'T use tools"));
    }

    #[test]
    fn test_prompt_describes_response_format() {
        let prompt = generate_sales_prompt(&all_tools());
        assert!(prompt.contains("\"answer\""));
        assert!(prompt.contains("\"products\""));
        assert!(prompt.contains("\"stores\""));
        assert!(prompt.contains("\"end\""));
    }

    #[test]
    fn test_prompt_without_tools() {
        let prompt = generate_sales_prompt(&[]);
        assert!(prompt.contains("No lookup tools are available"));
        assert!(!prompt.contains("TOOL USAGE RULES"));
    }
}
