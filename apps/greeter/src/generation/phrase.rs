//! Phrase + image concept generation.
//!
//! Flow: render creation template → LLM (JSON answer) → parse →
//!       render image template.

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::generation::template::render_template;
use crate::llm_client::{strip_json_fences, LlmClient};

/// The structured answer to the creation prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseDetails {
    pub phrase: String,
    pub topic: String,
    pub style: String,
    pub font: String,
}

/// Inputs for [`generate`].
pub struct PhraseRequest<'a> {
    pub creation_template: &'a str,
    pub image_template: &'a str,
    pub past_records: &'a str,
    pub language: &'a str,
    pub day_of_week: String,
    pub temperature: f64,
}

/// Current local weekday, e.g. `Monday`.
pub fn day_of_week() -> String {
    Local::now().format("%A").to_string()
}

/// Parses the model's JSON answer. Missing or non-string fields become empty
/// strings; anything that is not a JSON object is a parse error.
pub fn parse_response(response: &str) -> Result<ResponseDetails, AppError> {
    let value: Value = serde_json::from_str(strip_json_fences(response))
        .map_err(|e| AppError::Parse(format!("response is not valid JSON: {e}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| AppError::Parse("expected a JSON object".to_string()))?;

    let field = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    Ok(ResponseDetails {
        phrase: field("phrase"),
        topic: field("topic"),
        style: field("style"),
        font: field("font"),
    })
}

/// Asks the model for today's phrase and image concept, then renders the
/// final image-generation prompt.
pub async fn generate(
    llm: &dyn LlmClient,
    request: &PhraseRequest<'_>,
) -> Result<(String, ResponseDetails), AppError> {
    let prompt = render_template(
        request.creation_template,
        &[
            ("day_of_week", request.day_of_week.as_str()),
            ("past_records", request.past_records),
            ("language", request.language),
        ],
    )?;

    info!("Generating morning phrase for {}...", request.day_of_week);
    debug!("Creation prompt: {prompt}");

    let response = llm.generate_text(&prompt, request.temperature).await?;
    info!("LLM response: {response}");

    let details = parse_response(&response)?;

    let image_prompt = render_template(
        request.image_template,
        &[
            ("phrase", details.phrase.as_str()),
            ("topic", details.topic.as_str()),
            ("style", details.style.as_str()),
            ("font", details.font.as_str()),
            ("language", request.language),
        ],
    )?;
    info!("Generated prompt for image generation: {image_prompt}");

    Ok((image_prompt, details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::MockLlmClient;

    const VALID: &str = r#"{"phrase": "Buenos días, hoy es lunes.", "topic": "motivación", "style": "alegre", "font": "arial"}"#;

    #[test]
    fn test_day_of_week_is_a_weekday_name() {
        let day = day_of_week();
        assert!([
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
            "Sunday"
        ]
        .contains(&day.as_str()));
    }

    #[test]
    fn test_parse_valid_response() {
        let details = parse_response(VALID).unwrap();
        assert_eq!(details.phrase, "Buenos días, hoy es lunes.");
        assert_eq!(details.topic, "motivación");
        assert_eq!(details.style, "alegre");
        assert_eq!(details.font, "arial");
    }

    #[test]
    fn test_parse_missing_keys_default_to_empty() {
        let details = parse_response(r#"{"phrase": "Hola"}"#).unwrap();
        assert_eq!(details.phrase, "Hola");
        assert_eq!(details.topic, "");
        assert_eq!(details.style, "");
        assert_eq!(details.font, "");
    }

    #[test]
    fn test_parse_trims_fields_and_fences() {
        let details =
            parse_response("```json\n{\"phrase\": \"  Hola  \", \"topic\": null}\n```").unwrap();
        assert_eq!(details.phrase, "Hola");
        assert_eq!(details.topic, "");
    }

    #[test]
    fn test_parse_malformed_response() {
        assert!(matches!(
            parse_response("not a json string"),
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_non_object_response() {
        assert!(matches!(
            parse_response(r#"["phrase"]"#),
            Err(AppError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_renders_both_templates() {
        let llm = MockLlmClient::new(VALID);
        let request = PhraseRequest {
            creation_template: "Today is {{day_of_week}}. Avoid:\n{{past_records}}\nLanguage: {{language}}",
            image_template: "Image of {{topic}} in {{style}} with '{{phrase}}' in {{font}}",
            past_records: "\t{\"phrase\": \"old\"}",
            language: "spanish",
            day_of_week: "Monday".to_string(),
            temperature: 0.5,
        };

        let (image_prompt, details) = generate(&llm, &request).await.unwrap();

        assert_eq!(
            image_prompt,
            "Image of motivación in alegre with 'Buenos días, hoy es lunes.' in arial"
        );
        assert_eq!(details.font, "arial");

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].0,
            "Today is Monday. Avoid:\n\t{\"phrase\": \"old\"}\nLanguage: spanish"
        );
        assert_eq!(calls[0].1, 0.5);
    }

    #[tokio::test]
    async fn test_generate_rejects_unknown_placeholder_before_calling_llm() {
        let llm = MockLlmClient::new(VALID);
        let request = PhraseRequest {
            creation_template: "Today is {{weekday}}",
            image_template: "{{phrase}}",
            past_records: "",
            language: "spanish",
            day_of_week: "Monday".to_string(),
            temperature: 0.5,
        };
        assert!(matches!(
            generate(&llm, &request).await,
            Err(AppError::Template(_))
        ));
        assert!(llm.calls().is_empty());
    }
}
