//! Generator dispatch.
//!
//! Exactly one generator runs per request, or none when there is nothing
//! to convert.

use crate::generators::{GeneratorResult, GeneratorSet};
use crate::pipeline::descriptor::{FormatSelection, RequestDescriptor};
use crate::pipeline::error::PipelineError;

/// What the response assembler receives.
#[derive(Debug)]
pub enum Dispatch {
    /// No subscription link: show the landing page.
    NoTarget,
    Generated {
        format: FormatSelection,
        result: GeneratorResult,
    },
}

pub async fn dispatch(
    descriptor: &RequestDescriptor,
    generators: &GeneratorSet,
) -> Result<Dispatch, PipelineError> {
    if !descriptor.has_targets() {
        return Ok(Dispatch::NoTarget);
    }

    let format = descriptor.format_selection();
    let generator = match format {
        FormatSelection::Singbox => &generators.singbox,
        FormatSelection::Mihomo => &generators.mihomo,
        FormatSelection::V2ray => &generators.v2ray,
        FormatSelection::None => return Err(PipelineError::MissingFormatSelection),
    };

    tracing::debug!(format = format.as_str(), mode = %descriptor.mode, "Dispatching to generator");
    let result = generator.generate(descriptor).await?;
    Ok(Dispatch::Generated { format, result })
}
