use clap::ArgMatches;
use farmware_client::DashboardController;
use farmware_client::HttpBackend;
use farmware_core::AdvisoryId;
use farmware_core::AdvisoryRow;
use farmware_core::CollectionKind;
use farmware_core::Config;
use farmware_core::FarmerRow;
use farmware_core::ResultModel;
use farmware_core::ResultStatus;
use farmware_core::SelectionSource;
use farmware_core::TableBody;
use farmware_core::TableView;
use farmware_core::PROVIDER_DETAILS_HEADING;
use tracing::error;
use tracing::info;

use crate::ui;

pub async fn run_command(
    matches: &ArgMatches,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = HttpBackend::new(config.backend.clone())?;
    let mut controller = DashboardController::new(backend);

    match matches.subcommand() {
        None | Some(("dashboard", _)) => ui::run(controller, &config).await,
        Some(("list", sub)) => {
            let raw = sub
                .get_one::<String>("collection")
                .ok_or("collection is required")?;
            let kind = CollectionKind::parse(raw).ok_or_else(|| format!("unknown collection: {raw}"))?;
            handle_list_command(&mut controller, kind).await
        }
        Some(("send", sub)) => {
            let advisory = sub.get_one::<String>("advisory").ok_or("--advisory is required")?;
            let phone = sub.get_one::<String>("phone").ok_or("--phone is required")?;
            handle_send_command(&mut controller, AdvisoryId::new(advisory.as_str()), phone).await
        }
        Some((other, _)) => Err(format!("unknown command: {other}").into()),
    }
}

async fn handle_list_command(
    controller: &mut DashboardController<HttpBackend>,
    kind: CollectionKind,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(event = "cli.list_started", collection = kind.label());
    controller.refresh(kind);
    controller.settle().await;

    let (lines, notice) = match kind {
        CollectionKind::Farmers => {
            let view = controller.farmer_table();
            (farmer_lines(&view), view.notice)
        }
        CollectionKind::Advisories => {
            let view = controller.advisory_table();
            (advisory_lines(&view), view.notice)
        }
    };
    for line in lines {
        println!("{line}");
    }
    if let Some(notice) = notice {
        error!(event = "cli.list_failed", collection = kind.label(), notice = notice.as_str());
        return Err(notice.into());
    }
    Ok(())
}

async fn handle_send_command(
    controller: &mut DashboardController<HttpBackend>,
    advisory: AdvisoryId,
    phone: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        event = "cli.send_started",
        advisory_id = advisory.as_str(),
        phone = phone
    );
    controller.refresh_all();
    controller.settle().await;

    controller.select_advisory(Some(advisory), SelectionSource::Dropdown);
    controller.select_farmer(Some(phone.to_string()), SelectionSource::Dropdown);
    if let Some(preview) = controller.preview().model() {
        println!("Sending \"{}\" to {}", preview.advisory_title, preview.farmer_phone);
        println!("{}", preview.truncated_message);
        println!();
    }

    controller.submit().map_err(|err| format!("{}: {err}", err.notice()))?;
    controller.settle().await;

    let result = controller.result().ok_or("dispatch did not complete")?;
    for line in result_lines(&result) {
        println!("{line}");
    }
    let notice = controller
        .state()
        .notice
        .as_ref()
        .map(|notice| notice.message.to_string());
    if result_failed(&result) {
        error!(event = "cli.send_failed");
        return Err(notice.unwrap_or_else(|| "Failed to send SMS".to_string()).into());
    }
    if let Some(notice) = notice {
        println!("{notice}");
    }
    Ok(())
}

fn result_failed(result: &ResultModel) -> bool {
    result.status == ResultStatus::Failed
}

pub fn farmer_lines(view: &TableView<FarmerRow>) -> Vec<String> {
    let mut lines = vec![format!("Farmers ({})", view.count)];
    match &view.body {
        TableBody::Loading => lines.push("Loading...".to_string()),
        TableBody::Empty(label) => lines.push((*label).to_string()),
        TableBody::Rows(rows) => {
            let phone_width = rows
                .iter()
                .map(|row| row.phone.chars().count())
                .max()
                .unwrap_or(5)
                .max(5);
            lines.push(format!(
                "{:<6} {:<phone_width$} {:<12} {}",
                "ID", "Phone", "Secret Key", "Created"
            ));
            for row in rows {
                lines.push(format!(
                    "{:<6} {:<phone_width$} {:<12} {}",
                    row.id, row.phone, row.secret_key_preview, row.created
                ));
            }
        }
    }
    lines
}

pub fn advisory_lines(view: &TableView<AdvisoryRow>) -> Vec<String> {
    let mut lines = vec![format!("Advisories ({})", view.count)];
    match &view.body {
        TableBody::Loading => lines.push("Loading...".to_string()),
        TableBody::Empty(label) => lines.push((*label).to_string()),
        TableBody::Rows(rows) => {
            let title_width = rows
                .iter()
                .map(|row| row.title.chars().count())
                .max()
                .unwrap_or(5)
                .clamp(5, 40);
            lines.push(format!(
                "{:<6} {:<title_width$} {:<19} {}",
                "ID", "Title", "Created", "Message"
            ));
            for row in rows {
                lines.push(format!(
                    "{:<6} {:<title_width$} {:<19} {}",
                    row.id.as_str(),
                    row.title,
                    row.created,
                    row.message_preview
                ));
            }
        }
    }
    lines
}

pub fn result_lines(result: &ResultModel) -> Vec<String> {
    let mut lines = vec![
        result.heading.to_string(),
        format!("Status: {}", result.status.label()),
    ];
    for line in &result.lines {
        lines.push(format!("{}: {}", line.field.label(), line.value));
    }
    if let Some(details) = &result.provider_details {
        lines.push(String::new());
        lines.push(PROVIDER_DETAILS_HEADING.to_string());
        lines.extend(details.lines().map(str::to_string));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmware_core::ResultField;
    use farmware_core::ResultLine;
    use farmware_core::RESULT_HEADING;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_farmer_table_prints_label() {
        let view = TableView::<FarmerRow> {
            count: 0,
            body: TableBody::Empty("No farmers found"),
            notice: None,
        };
        assert_eq!(farmer_lines(&view), vec!["Farmers (0)", "No farmers found"]);
    }

    #[test]
    fn farmer_rows_are_aligned() {
        let view = TableView {
            count: 1,
            body: TableBody::Rows(vec![FarmerRow {
                id: 1,
                phone: "+10000000001".to_string(),
                secret_key_preview: "ab12...".to_string(),
                created: "N/A".to_string(),
                selected: false,
            }]),
            notice: None,
        };
        let lines = farmer_lines(&view);
        assert_eq!(lines[1], "ID     Phone        Secret Key   Created");
        assert_eq!(lines[2], "1      +10000000001 ab12...      N/A");
    }

    #[test]
    fn advisory_rows_include_message_preview() {
        let view = TableView {
            count: 1,
            body: TableBody::Rows(vec![AdvisoryRow {
                id: AdvisoryId::from(7),
                title: "Frost".to_string(),
                message_preview: "Cover seedlings.".to_string(),
                created: "2024-02-01 08:00:00".to_string(),
                selected: false,
            }]),
            notice: None,
        };
        let lines = advisory_lines(&view);
        assert_eq!(lines[0], "Advisories (1)");
        assert_eq!(lines[2], "7      Frost 2024-02-01 08:00:00 Cover seedlings.");
    }

    #[test]
    fn result_lines_follow_panel_layout() {
        let result = ResultModel {
            status: ResultStatus::Failed,
            heading: RESULT_HEADING,
            lines: vec![
                ResultLine {
                    field: ResultField::Error,
                    value: "provider timeout".to_string(),
                },
                ResultLine {
                    field: ResultField::FailedStep,
                    value: "send".to_string(),
                },
            ],
            provider_details: Some("{\n  \"code\": 504\n}".to_string()),
        };

        assert_eq!(
            result_lines(&result),
            vec![
                "SMS Sending Result",
                "Status: FAILED",
                "Error: provider timeout",
                "Failed at: send",
                "",
                "SMS Provider Details",
                "{",
                "  \"code\": 504",
                "}",
            ]
        );
        assert!(result_failed(&result));
    }
}
