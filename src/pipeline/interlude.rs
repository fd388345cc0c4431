use log::debug;

use crate::app_config::InterludeConfig;
use crate::errors::GenerationError;
use crate::media::{InterludeSpec, Transcoder};
use crate::pipeline::lifecycle::{ensure_output, ResourceRegistry, TempResource};
use crate::practice::FocusInterlude;

/// Render parameters for one interlude message
pub fn interlude_spec(config: &InterludeConfig, message: &str) -> InterludeSpec {
    InterludeSpec {
        message: message.to_string(),
        duration_secs: config.duration_secs,
        width: config.width,
        height: config.height,
        background_color: config.background_color.clone(),
        font_color: config.font_color.clone(),
        font_size: config.font_size,
        font_file: config.font_file.clone(),
    }
}

/// Render the clip shown after a pass
pub async fn render_interlude(
    transcoder: &dyn Transcoder,
    registry: &mut ResourceRegistry,
    config: &InterludeConfig,
    interlude: &FocusInterlude,
) -> Result<TempResource, GenerationError> {
    let output = registry.allocate(&format!("interlude{}", interlude.after_pass), "mp4");
    debug!("Interlude after pass {}: {:?}", interlude.after_pass, interlude.message);

    transcoder
        .render_interlude(&interlude_spec(config, &interlude.message), output.path())
        .await?;
    ensure_output(output.path())?;
    Ok(output)
}
