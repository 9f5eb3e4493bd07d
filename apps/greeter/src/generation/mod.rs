// Daily post generation: template rendering, phrase/caption prompts,
// anti-repetition history and the end-to-end pipeline.
// All model calls go through llm_client / image_client traits.

pub mod caption;
pub mod history;
pub mod phrase;
pub mod pipeline;
pub mod template;
