//! Answer generation helpers: prompts and tabular answer enhancement

pub mod enhancer;
pub mod prompt;

pub use enhancer::AnswerEnhancer;
pub use prompt::PromptBuilder;
