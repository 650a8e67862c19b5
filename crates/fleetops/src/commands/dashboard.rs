//! Dashboard, analytics and whoami handlers.

use std::sync::Arc;

use serde_json::json;

use fleetops_core::{EntityKind, Fleet, Record};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn overview(fleet: &Fleet, global: &GlobalOpts) -> Result<(), CliError> {
    let overview = fleet.overview().await?;

    let out = match global.output {
        OutputFormat::Table => {
            let color = output::should_color(&global.color, &std::io::stdout());
            let counts = output::render_pairs(&[
                ("Total Aircraft", overview.total_aircraft.to_string()),
                ("Operational", overview.operational.to_string()),
                ("In Maintenance", overview.in_maintenance.to_string()),
                ("Fleet Availability", format!("{}%", overview.availability_pct)),
                ("Active Work Orders", overview.active_work_orders.to_string()),
                ("Pending Alerts", overview.pending_alerts.to_string()),
            ]);
            let alerts = preview(EntityKind::Alerts, overview.recent_alerts, color)?;
            let upcoming = preview(EntityKind::Maintenance, overview.upcoming_maintenance, color)?;
            format!("{counts}\n\nRecent alerts\n{alerts}\n\nUpcoming maintenance\n{upcoming}")
        }
        OutputFormat::Plain => format!(
            "{}\n{}\n{}\n{}\n{}",
            overview.total_aircraft,
            overview.operational,
            overview.in_maintenance,
            overview.active_work_orders,
            overview.pending_alerts
        ),
        ref structured => output::render_structured(structured, &overview)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn preview(kind: EntityKind, records: Vec<Record>, color: bool) -> Result<String, CliError> {
    if records.is_empty() {
        return Ok("  (none)".into());
    }
    let records: Vec<Arc<Record>> = records.into_iter().map(Arc::new).collect();
    output::render_records(&OutputFormat::Table, kind.descriptor(), &records, color)
}

pub async fn analytics(fleet: &Fleet, global: &GlobalOpts) -> Result<(), CliError> {
    let analytics = fleet.analytics().await?;
    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => output::render_pairs(&[
            ("Total Work Orders", analytics.total_work_orders.to_string()),
            ("Completed", analytics.completed_work_orders.to_string()),
            ("Completion Rate", format!("{}%", analytics.completion_pct)),
            ("Inventory Value", format!("${:.2}", analytics.inventory_value)),
            ("Total Flight Hours", analytics.total_flight_hours.to_string()),
        ]),
        ref structured => output::render_structured(structured, &analytics)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn whoami(fleet: &Fleet, global: &GlobalOpts) -> Result<(), CliError> {
    let Some(session) = fleet.session() else {
        let out = match global.output {
            OutputFormat::Table | OutputFormat::Plain => "anonymous (project API key)".to_owned(),
            ref structured => output::render_structured(structured, &json!({ "user": null }))?,
        };
        output::print_output(&out, global.quiet);
        return Ok(());
    };

    let out = match global.output {
        OutputFormat::Table => output::render_pairs(&[
            ("Name", session.display_name()),
            ("Email", session.user.email.as_deref().unwrap_or_default()),
            ("Role", session.role().unwrap_or_default()),
            ("User ID", session.user.id.as_str()),
        ]),
        OutputFormat::Plain => session.user.id.clone(),
        ref structured => output::render_structured(
            structured,
            &json!({
                "user": session.user,
                "profile": session.profile,
                "display_name": session.display_name(),
            }),
        )?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
