//! Quick-action handlers: one-field status changes that skip the dialog.

use chrono::Utc;

use fleetops_core::{ActionDialog, EntityKind, Fleet, QuickAction, StockAdjustment};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn advance(fleet: &Fleet, id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    run(fleet, QuickAction::AdvanceWorkOrder, id, global).await
}

pub async fn complete(fleet: &Fleet, id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    run(fleet, QuickAction::CompleteMaintenance, id, global).await
}

pub async fn acknowledge(fleet: &Fleet, id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    run(fleet, QuickAction::AcknowledgeAlert, id, global).await
}

pub async fn adjust(
    fleet: &Fleet,
    id: &str,
    add: Option<i64>,
    remove: Option<i64>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let adjustment = match (add, remove) {
        (Some(quantity), None) => StockAdjustment::add(quantity),
        (None, Some(quantity)) => StockAdjustment::remove(quantity),
        _ => {
            return Err(CliError::Validation {
                field: "adjust".into(),
                reason: "pass exactly one of --add or --remove".into(),
            });
        }
    };
    run(fleet, QuickAction::AdjustStock(adjustment), id, global).await
}

/// Fetch the record, apply the action, and print the updated record.
async fn run(
    fleet: &Fleet,
    action: QuickAction,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let id = util::record_id(id)?;
    let kind: EntityKind = action.kind();
    let controller = fleet.controller(kind);
    controller.fetch_one(&id).await?;

    tracing::debug!(%action, %id, "running quick action");
    let record = controller.run(action, &id, Utc::now()).await?;

    let view = ActionDialog::view(controller, &id)?;
    let out = output::render_details(
        &global.output,
        record.as_ref(),
        &view.details(),
        &id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
