//! Command dispatch: bridges CLI args to list controllers, dialogs and
//! quick actions, then to output formatting.

pub mod actions;
pub mod config_cmd;
pub mod dashboard;
pub mod records;
pub mod stats;
pub mod util;

use fleetops_core::{EntityKind, Fleet};

use crate::cli::{
    AlertsCommand, Command, GlobalOpts, InventoryCommand, MaintenanceCommand, WorkOrdersCommand,
};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, fleet: &Fleet, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Aircraft(args) => {
            records::handle(fleet, EntityKind::Aircraft, args.command, global).await
        }
        Command::Compliance(args) => {
            records::handle(fleet, EntityKind::Compliance, args.command, global).await
        }
        Command::Telemetry(args) => {
            records::handle(fleet, EntityKind::Telemetry, args.command, global).await
        }

        Command::WorkOrders(args) => match args.command {
            WorkOrdersCommand::Record(cmd) => {
                records::handle(fleet, EntityKind::WorkOrders, cmd, global).await
            }
            WorkOrdersCommand::Advance { id } => actions::advance(fleet, &id, global).await,
        },
        Command::Maintenance(args) => match args.command {
            MaintenanceCommand::Record(cmd) => {
                records::handle(fleet, EntityKind::Maintenance, cmd, global).await
            }
            MaintenanceCommand::Complete { id } => actions::complete(fleet, &id, global).await,
        },
        Command::Inventory(args) => match args.command {
            InventoryCommand::Record(cmd) => {
                records::handle(fleet, EntityKind::Inventory, cmd, global).await
            }
            InventoryCommand::Adjust { id, add, remove } => {
                actions::adjust(fleet, &id, add, remove, global).await
            }
        },
        Command::Alerts(args) => match args.command {
            AlertsCommand::Record(cmd) => {
                records::handle(fleet, EntityKind::Alerts, cmd, global).await
            }
            AlertsCommand::Acknowledge { id } => actions::acknowledge(fleet, &id, global).await,
        },

        Command::Stats(args) => stats::handle(fleet, args.entity, global).await,
        Command::Dashboard => dashboard::overview(fleet, global).await,
        Command::Analytics => dashboard::analytics(fleet, global).await,
        Command::Whoami => dashboard::whoami(fleet, global),

        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions run without a backend".into(),
        )),
    }
}
