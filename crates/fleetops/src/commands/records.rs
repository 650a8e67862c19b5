//! Generic record handlers: list, show, add, edit, delete, fields,
//! reference choices.
//!
//! Every entity goes through the same path: a list controller for reads,
//! an action dialog for writes.

use chrono::Local;

use fleetops_core::{ActionDialog, EntityKind, FieldKind, Fleet, Outcome, RestGateway};

use crate::cli::{GlobalOpts, ListArgs, OutputFormat, RecordCommand, SetArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    fleet: &Fleet,
    kind: EntityKind,
    cmd: RecordCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        RecordCommand::List(args) => list(fleet, kind, args, global).await,
        RecordCommand::Show { id } => show(fleet, kind, &id, global).await,
        RecordCommand::Add(set) => add(fleet, kind, set, global).await,
        RecordCommand::Edit { id, set } => edit(fleet, kind, &id, set, global).await,
        RecordCommand::Delete { id } => delete(fleet, kind, &id, global).await,
        RecordCommand::Fields => fields(kind, global),
        RecordCommand::Choices { field } => choices(fleet, kind, &field, global).await,
    }
}

async fn list(
    fleet: &Fleet,
    kind: EntityKind,
    args: ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut query = kind.descriptor().query();
    for raw in &args.filter {
        query = query.filter(util::parse_filter(raw)?);
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }

    let controller = fleet.controller_with(kind, query);
    let records = controller.load().await?;
    let color = output::should_color(&global.color, &std::io::stdout());
    let out = output::render_records(&global.output, controller.descriptor(), &records, color)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn show(
    fleet: &Fleet,
    kind: EntityKind,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let id = util::record_id(id)?;
    let controller = fleet.controller(kind);
    let record = controller.fetch_one(&id).await?;

    let dialog = ActionDialog::view(controller, &id)?;
    dialog.open();
    let out = output::render_details(
        &global.output,
        record.as_ref(),
        &dialog.details(),
        &id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn add(
    fleet: &Fleet,
    kind: EntityKind,
    set: SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let dialog = ActionDialog::add(fleet.controller(kind), Local::now().date_naive());
    submit(dialog, &set, global).await
}

async fn edit(
    fleet: &Fleet,
    kind: EntityKind,
    id: &str,
    set: SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if set.set.is_empty() {
        return Err(CliError::Validation {
            field: "set".into(),
            reason: "nothing to change; pass at least one --set FIELD=VALUE".into(),
        });
    }
    let id = util::record_id(id)?;
    let controller = fleet.controller(kind);
    controller.fetch_one(&id).await?;
    submit(ActionDialog::edit(controller, &id)?, &set, global).await
}

/// Open the dialog, apply every assignment, submit once, and print the
/// saved record.
async fn submit(
    dialog: ActionDialog<RestGateway>,
    set: &SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    dialog.open();
    let descriptor = dialog.descriptor();
    for raw in &set.set {
        let (field, value) = util::parse_assignment(raw)?;
        match descriptor.field(&field).map(|f| f.kind) {
            Some(FieldKind::Reference(_)) => dialog.set_reference(&field, &value).await?,
            _ => dialog.set_field(&field, value)?,
        }
    }

    let Outcome::Saved(record) = dialog.submit().await? else {
        return Err(CliError::Internal("save dialog returned no record".into()));
    };
    let out = output::render_details(
        &global.output,
        record.as_ref(),
        &dialog.details(),
        &record.id().to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn delete(
    fleet: &Fleet,
    kind: EntityKind,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let id = util::record_id(id)?;
    let controller = fleet.controller(kind);
    let record = controller.fetch_one(&id).await?;

    let descriptor = controller.descriptor();
    let title = record.display(descriptor.title_field);
    let prompt = format!(
        "Delete {} '{}'?",
        descriptor.singular.to_lowercase(),
        if title.is_empty() { id.to_string() } else { title }
    );
    if !util::confirm("delete", &prompt, global.yes)? {
        eprintln!("Cancelled");
        return Ok(());
    }

    let dialog = ActionDialog::delete(controller, &id)?;
    dialog.open();
    dialog.submit().await?;
    if matches!(global.output, OutputFormat::Plain) && !global.quiet {
        println!("{id}");
    }
    Ok(())
}

fn fields(kind: EntityKind, global: &GlobalOpts) -> Result<(), CliError> {
    let descriptor = kind.descriptor();
    let out = match global.output {
        OutputFormat::Table => {
            let lines: Vec<(String, String)> = descriptor
                .fields
                .iter()
                .map(|f| {
                    let mut kind = kind_label(f.kind);
                    if f.required {
                        kind.push_str(", required");
                    }
                    (f.name.to_owned(), format!("{kind}  ({})", f.label))
                })
                .collect();
            output::render_pairs(&lines)
        }
        OutputFormat::Plain => descriptor
            .fields
            .iter()
            .map(|f| f.name)
            .collect::<Vec<_>>()
            .join("\n"),
        ref structured => {
            let rows: Vec<serde_json::Value> = descriptor
                .fields
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "name": f.name,
                        "label": f.label,
                        "kind": kind_label(f.kind),
                        "required": f.required,
                    })
                })
                .collect();
            output::render_structured(structured, &rows)?
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn choices(
    fleet: &Fleet,
    kind: EntityKind,
    field: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let dialog = ActionDialog::add(fleet.controller(kind), Local::now().date_naive());
    let choices = dialog.reference_choices(field).await?;

    let out = match global.output {
        OutputFormat::Table => {
            let lines: Vec<(String, String)> = choices
                .iter()
                .map(|c| (c.label.clone(), c.id.to_string()))
                .collect();
            output::render_pairs(&lines)
        }
        OutputFormat::Plain => choices
            .iter()
            .map(|c| c.id.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        ref structured => output::render_structured(structured, &choices)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn kind_label(kind: FieldKind) -> String {
    match kind {
        FieldKind::Text => "text".into(),
        FieldKind::Integer => "integer".into(),
        FieldKind::Decimal => "decimal".into(),
        FieldKind::Date => "date".into(),
        FieldKind::Timestamp => "timestamp".into(),
        FieldKind::Boolean => "boolean".into(),
        FieldKind::Choice(options) => format!("one of {}", options.join("|")),
        FieldKind::Reference(target) => format!("{} id or {}", target.table, target.display),
    }
}
