//! Layered persona configuration.
//!
//! Resolution order: `.env` → `base.yaml` → `personas/default.yaml` →
//! `personas/<persona>.yaml`. The result is a single immutable [`Config`]
//! built once per run and passed explicitly to every pipeline step.

pub mod layering;

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::errors::ConfigError;
use layering::{deep_merge, first_present, load_yaml, non_empty_string, scalar_string, section};

pub const DEFAULT_CONFIG_DIR: &str = "./config";
pub const BASE_CONFIG_FILE: &str = "base.yaml";
pub const PERSONAS_DIR: &str = "personas";
pub const DEFAULT_PERSONA: &str = "default";

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

pub const DEFAULT_LANGUAGE: &str = "spanish";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4.1-nano";
pub const DEFAULT_LLM_TEMPERATURE: f64 = 0.8;
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1-mini";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_IMAGE_STORAGE_PATH: &str = "./outputs/images";
pub const DEFAULT_PAST_RECORDS_TO_RETRIEVE: u32 = 10;

// Tolerated key spellings. Closed lists: nothing else is consulted.
const LLM_SECTION_KEYS: &[&str] = &["LLM", "llm"];
const BASE_CREDENTIAL_KEYS: &[&str] = &["OPENAI_API_KEY", "llm_api_key"];
const SYSTEM_PROMPT_KEYS: &[&str] = &["system", "system_prompt"];
const DB_PATH_KEYS: &[&str] = &["past_records_path", "past_records_database_path"];

pub const PROMPT_KEY_CREATION: &str = "creation_template";
pub const PROMPT_KEY_IMAGE: &str = "image_template";
pub const PROMPT_KEY_CAPTION: &str = "instagram_caption_template";

/// Persona identity.
#[derive(Debug, Clone, PartialEq)]
pub struct GrandmaConfig {
    pub name: String,
    pub language: String,
    pub watermark_path: Option<PathBuf>,
    pub hashtags: Option<String>,
}

impl GrandmaConfig {
    /// Table holding this persona's run records. Always derived from the name.
    pub fn runs_table_name(&self) -> String {
        format!("{}_runs", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub system_prompt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageConfig {
    pub api_key: String,
    pub model: String,
    pub size: String,
    pub storage_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptsConfig {
    pub creation_template: String,
    pub image_gen_template: String,
    pub instagram_caption_template: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub past_records_path: PathBuf,
    pub past_records_to_retrieve: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub grandma: GrandmaConfig,
    pub llm: LlmConfig,
    pub image: ImageConfig,
    pub prompts: PromptsConfig,
    pub database: DatabaseConfig,
}

impl Config {
    /// Resolves configuration for `persona` from `config_dir`, reading the
    /// credential from the process environment (after loading `.env`).
    pub fn load(persona: Option<&str>, config_dir: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::load_with_env(persona, config_dir, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an explicit environment lookup.
    pub fn load_with_env<F>(
        persona: Option<&str>,
        config_dir: &Path,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = load_yaml(&config_dir.join(BASE_CONFIG_FILE))?;
        let default_persona = load_yaml(&persona_path(config_dir, DEFAULT_PERSONA))?;

        let persona_config = match persona.filter(|p| *p != DEFAULT_PERSONA) {
            Some(name) => {
                let override_path = persona_path(config_dir, name);
                if !override_path.is_file() {
                    return Err(ConfigError::NotFound {
                        path: override_path,
                    });
                }
                let persona_override = load_yaml(&override_path)?;
                deep_merge(&default_persona, &persona_override)
            }
            None => default_persona,
        };

        let empty = Mapping::new();
        let persona_grandma = section(&persona_config, &["grandma"]).unwrap_or(&empty);
        let persona_prompts = section(&persona_config, &["prompts"]).unwrap_or(&empty);

        let api_key = resolve_api_key(&base, env)?;
        let grandma = build_grandma_config(persona_grandma)?;
        let llm = build_llm_config(&base, persona_prompts, &api_key)?;
        let image = build_image_config(&base, &api_key);
        let prompts = build_prompts_config(persona_prompts)?;
        let database = build_database_config(&base)?;

        let config = Config {
            grandma,
            llm,
            image,
            prompts,
            database,
        };
        debug!(
            persona = %config.grandma.name,
            llm_model = %config.llm.model,
            image_model = %config.image.model,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn runs_table_name(&self) -> String {
        self.grandma.runs_table_name()
    }
}

/// Persona names available under `<config_dir>/personas`, sorted.
pub fn list_personas(config_dir: &Path) -> Vec<String> {
    let dir = config_dir.join(PERSONAS_DIR);
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };

    let mut personas: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "yaml"))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    personas.sort();
    personas
}

fn persona_path(config_dir: &Path, persona: &str) -> PathBuf {
    config_dir.join(PERSONAS_DIR).join(format!("{persona}.yaml"))
}

fn resolve_api_key<F>(base: &Mapping, env: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = env(ENV_OPENAI_API_KEY).filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }

    // legacy locations in base.yaml
    non_empty_string(base, BASE_CREDENTIAL_KEYS)
        .or_else(|| section(base, &["LLM"]).and_then(|llm| non_empty_string(llm, &["api_key"])))
        .ok_or(ConfigError::MissingCredential {
            env_var: ENV_OPENAI_API_KEY,
        })
}

fn build_grandma_config(grandma: &Mapping) -> Result<GrandmaConfig, ConfigError> {
    let name = non_empty_string(grandma, &["name"])
        .ok_or_else(|| ConfigError::MissingField("grandma.name".to_string()))?;

    let hashtags = match grandma.get("hashtags") {
        Some(Value::Sequence(tags)) => {
            let joined = tags
                .iter()
                .filter_map(scalar_string)
                .collect::<Vec<_>>()
                .join(" ");
            Some(joined).filter(|s| !s.is_empty())
        }
        Some(other) => scalar_string(other).filter(|s| !s.is_empty()),
        None => None,
    };

    Ok(GrandmaConfig {
        name,
        language: non_empty_string(grandma, &["language"])
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        watermark_path: non_empty_string(grandma, &["watermark_path"]).map(PathBuf::from),
        hashtags,
    })
}

fn build_llm_config(
    base: &Mapping,
    prompts: &Mapping,
    api_key: &str,
) -> Result<LlmConfig, ConfigError> {
    let empty = Mapping::new();
    let llm = section(base, LLM_SECTION_KEYS).unwrap_or(&empty);

    let temperature = match llm.get("temperature") {
        Some(v) => coerce_f64(v, "LLM.temperature")?,
        None => DEFAULT_LLM_TEMPERATURE,
    };

    let system_prompt = first_present(prompts, SYSTEM_PROMPT_KEYS)
        .and_then(scalar_string)
        .unwrap_or_default();

    Ok(LlmConfig {
        api_key: api_key.to_string(),
        model: non_empty_string(llm, &["model"]).unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
        temperature,
        system_prompt,
    })
}

fn build_image_config(base: &Mapping, api_key: &str) -> ImageConfig {
    let empty = Mapping::new();
    let image = section(base, &["image"]).unwrap_or(&empty);

    ImageConfig {
        api_key: api_key.to_string(),
        model: non_empty_string(image, &["model"])
            .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
        size: non_empty_string(image, &["size"]).unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string()),
        storage_path: non_empty_string(image, &["storage_path"])
            .unwrap_or_else(|| DEFAULT_IMAGE_STORAGE_PATH.to_string())
            .into(),
    }
}

fn build_prompts_config(prompts: &Mapping) -> Result<PromptsConfig, ConfigError> {
    let creation = non_empty_string(prompts, &[PROMPT_KEY_CREATION]);
    let image = non_empty_string(prompts, &[PROMPT_KEY_IMAGE]);
    let caption = non_empty_string(prompts, &[PROMPT_KEY_CAPTION]);

    match (creation, image, caption) {
        (Some(creation_template), Some(image_gen_template), Some(instagram_caption_template)) => {
            Ok(PromptsConfig {
                creation_template,
                image_gen_template,
                instagram_caption_template,
            })
        }
        (creation, image, caption) => {
            let missing = [
                (PROMPT_KEY_CREATION, creation.is_none()),
                (PROMPT_KEY_IMAGE, image.is_none()),
                (PROMPT_KEY_CAPTION, caption.is_none()),
            ]
            .into_iter()
            .filter(|(_, absent)| *absent)
            .map(|(key, _)| key.to_string())
            .collect();
            Err(ConfigError::MissingTemplates(missing))
        }
    }
}

fn build_database_config(base: &Mapping) -> Result<DatabaseConfig, ConfigError> {
    let empty = Mapping::new();
    let db = section(base, &["database"]).unwrap_or(&empty);

    let past_records_path = non_empty_string(db, DB_PATH_KEYS).ok_or_else(|| {
        ConfigError::MissingField(format!("database.{} in base config", DB_PATH_KEYS[0]))
    })?;

    let past_records_to_retrieve = match db.get("past_records_to_retrieve") {
        Some(v) => coerce_u32(v, "database.past_records_to_retrieve")?,
        None => DEFAULT_PAST_RECORDS_TO_RETRIEVE,
    };

    Ok(DatabaseConfig {
        past_records_path: past_records_path.into(),
        past_records_to_retrieve,
    })
}

fn coerce_f64(value: &Value, field: &str) -> Result<f64, ConfigError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ConfigError::InvalidValue {
        field: field.to_string(),
        reason: format!("expected a number, got {value:?}"),
    })
}

fn coerce_u32(value: &Value, field: &str) -> Result<u32, ConfigError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ConfigError::InvalidValue {
        field: field.to_string(),
        reason: format!("expected a non-negative integer, got {value:?}"),
    })
}
