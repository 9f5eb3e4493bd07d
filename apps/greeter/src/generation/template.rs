use crate::errors::TemplateError;

/// Fills `{{key}}` placeholders in a persona prompt template.
///
/// Every key is substituted independently. Rendering is strict: if any `{{`
/// survives substitution the template is rejected, so a half-filled prompt
/// never reaches the model. Empty values are valid substitutions.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut rendered = template.to_string();
    for (key, value) in values {
        let placeholder = format!("{{{{{key}}}}}");
        rendered = rendered.replace(&placeholder, value);
    }

    if rendered.contains("{{") {
        return Err(TemplateError::Unresolved { template: rendered });
    }

    Ok(rendered)
}
