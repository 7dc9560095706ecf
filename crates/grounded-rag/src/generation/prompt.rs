//! Prompt templates for grounded generation and query analysis

use crate::types::QueryAnalysis;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

const SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant with access to a knowledge base through RAG (Retrieval Augmented Generation).

Your responsibilities:
1. Answer user questions based on the provided context from the knowledge base
2. Be accurate and cite your sources when possible
3. If the context doesn't contain enough information, clearly state this
4. Provide comprehensive yet concise answers
5. Maintain a professional and helpful tone

Guidelines:
- Always base your answers on the provided context
- If you're unsure about something, express uncertainty rather than guessing
- When referencing information, mention which document or source it came from
- When the context contains tables, quote figures exactly and say when a table was sampled
- If the context is insufficient, suggest what additional information might be needed"#;

const ANALYSIS_SYSTEM_PROMPT: &str = "You are a query analysis expert. Respond with valid JSON only.";

impl PromptBuilder {
    /// System prompt for answer generation
    pub fn system_prompt() -> &'static str {
        SYSTEM_PROMPT
    }

    /// User prompt carrying the assembled context and the question
    pub fn user_prompt(query: &str, context: &str) -> String {
        format!(
            r#"Based on the following context from the knowledge base, please answer the user's question.

Context:
{context}

User Question: {query}

Please provide a comprehensive answer based on the context above. If the context doesn't contain sufficient information to fully answer the question, please say so and suggest what additional information might be helpful."#
        )
    }

    pub fn analysis_system_prompt() -> &'static str {
        ANALYSIS_SYSTEM_PROMPT
    }

    /// Ask for intent, topics, search terms and complexity as JSON
    pub fn analysis_prompt(query: &str) -> String {
        format!(
            r#"Analyze the following user query and provide insights about:
1. Query intent (what is the user trying to achieve?)
2. Key topics/concepts mentioned
3. Suggested search terms for better retrieval
4. Query complexity level

Query: "{query}"

Respond with a JSON object with the keys "intent", "topics", "search_terms" and "complexity"."#
        )
    }

    /// Parse a model reply to [`analysis_prompt`](Self::analysis_prompt).
    ///
    /// Accepts a bare JSON object, one wrapped in a markdown code fence, or
    /// one with text around it.
    pub fn parse_analysis(reply: &str) -> Option<QueryAnalysis> {
        // Outermost object; covers code fences and chatter around the JSON
        let start = reply.find('{')?;
        let end = reply.rfind('}')?;
        if end < start {
            return None;
        }
        serde_json::from_str(&reply[start..=end]).ok()
    }
}
