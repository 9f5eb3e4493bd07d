use tracing::info;

use crate::errors::AppError;
use crate::generation::phrase::ResponseDetails;
use crate::generation::template::render_template;
use crate::llm_client::LlmClient;

/// Renders the caption template and returns the model's reply verbatim.
///
/// Placeholders: `phrase`, `topic`, `style`, `language`, `hashtags`
/// (empty when the persona defines none).
pub async fn generate(
    llm: &dyn LlmClient,
    template: &str,
    details: &ResponseDetails,
    language: &str,
    hashtags: Option<&str>,
    temperature: f64,
) -> Result<String, AppError> {
    let prompt = render_template(
        template,
        &[
            ("phrase", details.phrase.as_str()),
            ("topic", details.topic.as_str()),
            ("style", details.style.as_str()),
            ("language", language),
            ("hashtags", hashtags.unwrap_or_default()),
        ],
    )?;

    info!("Generating Instagram caption...");
    let caption = llm.generate_text(&prompt, temperature).await?;
    info!("Caption: {caption}");
    Ok(caption)
}
