use anyhow::Result;
use clap::ValueEnum;
use colored_json::to_colored_json_auto;
use console::style;
use gerrit_rest::{Body, Change};
use once_cell::sync::Lazy;
use prettytable::Table;
use serde_json::Value;

pub static TABLE_FORMAT: Lazy<prettytable::format::TableFormat> = Lazy::new(|| {
    use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};

    FormatBuilder::new()
        .column_separator(' ')
        .separator(LinePosition::Top, LineSeparator::new('─', ' ', ' ', ' '))
        .separator(LinePosition::Title, LineSeparator::new('─', ' ', ' ', ' '))
        .separator(LinePosition::Intern, LineSeparator::new('┈', ' ', ' ', ' '))
        .separator(LinePosition::Bottom, LineSeparator::new('─', ' ', ' ', ' '))
        .padding(1, 1)
        .build()
});

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

fn status(status: &str) -> String {
    match status {
        "NEW" => format!("{}", style("●").green().bold()),
        "MERGED" => format!("{}", style("✓").blue().bold()),
        "ABANDONED" => format!("{}", style("✗").red().bold()),
        _ => format!("{}", style("?").bold()),
    }
}

pub fn changes_table(changes: &[Change<'_>]) -> Table {
    let mut table = Table::new();
    table.set_format(*TABLE_FORMAT);
    table.set_titles(row!["", "number", "updated", "project (branch)", "subject"]);

    for change in changes {
        let info = change.info();

        table.add_row(row![
            status(change.status()),
            style(change.id()).bold(),
            info.updated_at()
                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            format!("{}\n{}", info.project, style(&info.branch).dim()),
            info.subject,
        ]);
    }

    table
}

pub fn print_value(value: &Value, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            #[cfg(windows)]
            let _enabled = colored_json::enable_ansi_support();

            println!("{}", to_colored_json_auto(value)?);
        }
        Format::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }

    Ok(())
}

pub fn print_body(body: &Body, format: Format) -> Result<()> {
    match body {
        Body::Json(value) => print_value(value, format),
        Body::Text(text) if text.is_empty() => Ok(()),
        Body::Text(text) => {
            println!("{text}");
            Ok(())
        }
    }
}
