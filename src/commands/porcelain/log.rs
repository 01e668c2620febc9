use crate::HistoryFormat;
use crate::areas::repository::Repository;
use crate::artifacts::history::format::{DateDisplay, RowColumns, label};
use crate::artifacts::history::model::HistoryModel;
use crate::artifacts::history::reconcile::ReconcileOptions;
use crate::artifacts::history::row::HeadMarkers;
use crate::artifacts::history::sequence::HistorySequence;
use crate::artifacts::history::trigger::ChangeTrigger;
use colored::Colorize;
use derive_new::new;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, new)]
pub struct LogOptions {
    pub reconcile: ReconcileOptions,
    pub format: HistoryFormat,
    pub dates: DateDisplay,
}

/// Open the repository at `path` and reconcile its history once
pub async fn load_history(
    path: &Path,
    options: &ReconcileOptions,
) -> anyhow::Result<Arc<HistorySequence>> {
    let repository = Repository::open(path)?;
    let model = HistoryModel::new(ChangeTrigger::new(), options.clone());

    Ok(model.set_repository(repository).await?)
}

pub fn write_history(
    history: &HistorySequence,
    options: &LogOptions,
    writer: &mut dyn Write,
) -> anyhow::Result<()> {
    let rows = history
        .iter()
        .map(|row| row.columns(&options.dates))
        .collect::<Vec<_>>();

    match options.format {
        HistoryFormat::Oneline => {
            for columns in &rows {
                writeln!(
                    writer,
                    "{} {}",
                    columns.short_id.yellow(),
                    colored_label(columns)
                )?;
            }
        }
        HistoryFormat::Table => {
            let label_width = column_width(&rows, |columns| columns.label());
            let author_width = column_width(&rows, |columns| columns.author.clone());

            for columns in &rows {
                writeln!(
                    writer,
                    "{}  {}{}  {}{}  {}",
                    columns.short_id.yellow(),
                    colored_label(columns),
                    padding(label_width, &columns.label()),
                    columns.author,
                    padding(author_width, &columns.author),
                    columns.date
                )?;
            }
        }
    }

    Ok(())
}

fn colored_label(columns: &RowColumns) -> String {
    let marker = columns.markers.label().map(|marker| {
        if columns.markers == HeadMarkers::LOCAL | HeadMarkers::REMOTE {
            marker.cyan().bold().to_string()
        } else if columns.markers.contains(HeadMarkers::LOCAL) {
            marker.green().bold().to_string()
        } else {
            marker.red().bold().to_string()
        }
    });

    label(marker.as_deref(), &columns.message)
}

fn column_width(rows: &[RowColumns], column: impl Fn(&RowColumns) -> String) -> usize {
    rows.iter()
        .map(|columns| column(columns).chars().count())
        .max()
        .unwrap_or(0)
}

// colour codes would throw `{:<width$}` off, so pad on the plain text
fn padding(width: usize, plain: &str) -> String {
    " ".repeat(width.saturating_sub(plain.chars().count()))
}
