//! Per-entity aggregate handler.

use chrono::Utc;

use fleetops_core::{EntityKind, Fleet};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(fleet: &Fleet, kind: EntityKind, global: &GlobalOpts) -> Result<(), CliError> {
    let controller = fleet.controller(kind);
    controller.load().await?;
    let summary = controller.summary(Utc::now());

    let out = match global.output {
        OutputFormat::Table => output::render_pairs(&summary.lines()),
        OutputFormat::Plain => summary
            .lines()
            .into_iter()
            .map(|(_, value)| value)
            .collect::<Vec<_>>()
            .join("\n"),
        ref structured => output::render_structured(structured, &summary)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
