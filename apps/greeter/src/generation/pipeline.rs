//! Daily post pipeline: runs every step once, in order.
//!
//! Flow: past records → phrase + image prompt → caption → image (+ watermark)
//!       → save image → append run record.
//!
//! Any failure aborts the run. The run record is written last, so a failed
//! run never leaves a partial record behind.

use chrono::{SubsecRound, Utc};
use tracing::info;

use crate::errors::AppError;
use crate::generation::phrase::{self, PhraseRequest};
use crate::generation::{caption, history};
use crate::models::run_record::RunRecord;
use crate::state::AppState;
use crate::storage::image_file_name;
use crate::watermark::{Watermark, DEFAULT_OPACITY, DEFAULT_SCALE};

const IMAGE_EXTENSION: &str = ".png";

/// Runs the pipeline for the configured persona and returns the stored record.
///
/// Steps:
/// 1. retrieve_past_n_days() → anti-repetition context
/// 2. phrase::generate() → image prompt + phrase/topic/style/font
/// 3. caption::generate() → caption text
/// 4. image.generate_image() → bytes, watermarked when a mark is available
/// 5. storage.save_file() → image reference
/// 6. records.save_record() → append to `<persona>_runs`
pub async fn run(state: &AppState) -> Result<RunRecord, AppError> {
    let config = state.config.as_ref();
    let table = config.runs_table_name();

    // Step 1: Past records
    let past_records = history::retrieve_past_n_days(
        state.records.as_ref(),
        &table,
        config.database.past_records_to_retrieve,
    )
    .await?;

    // Step 2: Phrase and image prompt
    let request = PhraseRequest {
        creation_template: &config.prompts.creation_template,
        image_template: &config.prompts.image_gen_template,
        past_records: &past_records,
        language: &config.grandma.language,
        day_of_week: phrase::day_of_week(),
        temperature: config.llm.temperature,
    };
    let (image_prompt, details) = phrase::generate(state.llm.as_ref(), &request).await?;

    // Step 3: Caption
    let caption = caption::generate(
        state.llm.as_ref(),
        &config.prompts.instagram_caption_template,
        &details,
        &config.grandma.language,
        config.grandma.hashtags.as_deref(),
        config.llm.temperature,
    )
    .await?;

    // Step 4: Image, watermarked if a usable mark is configured
    info!("Generating image ({})...", config.image.size);
    let mut image_bytes = state
        .image
        .generate_image(&image_prompt, &config.image.size)
        .await?;

    if let Some(watermark) = Watermark::load(
        config.grandma.watermark_path.as_deref(),
        DEFAULT_OPACITY,
        DEFAULT_SCALE,
    ) {
        info!("Applying watermark");
        image_bytes = watermark.apply(&image_bytes)?;
    }

    // Step 5: Persist image
    info!("Saving image...");
    let filename = image_file_name(&image_bytes, IMAGE_EXTENSION, true);
    let image_path = state.storage.save_file(&image_bytes, &filename).await?;

    // Step 6: Append run record
    let record = RunRecord {
        // microseconds, the precision the record store keeps
        timestamp: Utc::now().trunc_subsecs(6),
        prompt: image_prompt,
        phrase: details.phrase,
        topic: details.topic,
        style: details.style,
        caption,
        image_path,
    };

    info!("Saving run information to the database...");
    state.records.save_record(&table, &record).await?;
    info!("Run information saved successfully.");

    Ok(record)
}
