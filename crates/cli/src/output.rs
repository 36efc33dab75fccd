use crate::error::CliError;
use engine_core::{error::ScanError, scan::ScanOutcome};
use model::{records::document::Document, state::SyncState};
use std::path::PathBuf;
use tokio::{
    fs::File,
    io::{self, AsyncWrite, AsyncWriteExt, BufWriter},
    sync::mpsc,
};

/// Writes every received document as one JSON line until all senders are
/// dropped. Returns the number of lines written.
pub async fn write_documents(
    mut rx: mpsc::Receiver<Document>,
    path: Option<PathBuf>,
) -> Result<u64, CliError> {
    let sink: Box<dyn AsyncWrite + Unpin + Send> = match path {
        Some(path) => Box::new(File::create(path).await?),
        None => Box::new(io::stdout()),
    };
    let mut writer = BufWriter::new(sink);
    let mut written = 0;

    while let Some(document) = rx.recv().await {
        let mut line = serde_json::to_vec(&document)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        written += 1;
    }

    writer.flush().await?;
    Ok(written)
}

pub type ScanResult = ((String, String), Result<ScanOutcome, ScanError>);

pub fn print_summary(results: &[ScanResult]) {
    eprintln!(
        "{:<20} {:<20} {:<10} {:>6} {:>8} {:>8} {:>8}",
        "Connector", "Datasource", "Status", "Pages", "Rows", "Docs", "Skipped"
    );
    for ((connector, datasource), result) in results {
        match result {
            Ok(outcome) => eprintln!(
                "{:<20} {:<20} {:<10} {:>6} {:>8} {:>8} {:>8}",
                connector,
                datasource,
                if outcome.is_cancelled() { "cancelled" } else { "completed" },
                outcome.metrics.pages,
                outcome.metrics.rows,
                outcome.metrics.documents,
                outcome.metrics.transform_skipped + outcome.metrics.decode_failures,
            ),
            Err(err) => eprintln!("{connector:<20} {datasource:<20} {:<10} {err}", "failed"),
        }
    }
}

pub fn print_state_table(state: &SyncState) {
    println!(
        "State for connector '{}' / datasource '{}':",
        state.connector_id, state.datasource_id
    );
    println!("-----------------------------");
    println!("{:<16} {}", "Mode", state.mode.as_str());
    println!("{:<16} {}", "Property", state.property);
    println!("{:<16} {}", "Cursor", state.cursor);
    let updated = state
        .updated_at
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "n/a".to_string());
    println!("{:<16} {}", "Updated", updated);
}

pub fn print_state_list(states: &[SyncState]) {
    if states.is_empty() {
        println!("No watermarks stored");
        return;
    }
    println!(
        "{:<20} {:<20} {:<16} {:<40} {}",
        "Connector", "Datasource", "Property", "Cursor", "Updated"
    );
    for state in states {
        let updated = state
            .updated_at
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{:<20} {:<20} {:<16} {:<40} {}",
            state.connector_id,
            state.datasource_id,
            state.property,
            state.cursor.to_string(),
            updated
        );
    }
}
