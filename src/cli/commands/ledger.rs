//! Ledger command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{LedgerArgs, LedgerCommand, LedgerRecordArgs, LedgerShowArgs, OutputFormat};
use crate::data::DatasetSnapshot;
use crate::ledger::{FeatureLedger, LedgerDocument, PurgeOutcome};

pub fn run_ledger(args: LedgerArgs, level: LogLevel) -> Result<(), String> {
    match args.command {
        LedgerCommand::Record(args) => record(args, level),
        LedgerCommand::Show(args) => show(args, level),
        LedgerCommand::Purge(args) => {
            let ledger = FeatureLedger::new(&args.ledger);
            let outcome = ledger
                .purge()
                .map_err(|e| format!("Failed to purge ledger: {e}"))?;
            let msg = match outcome {
                PurgeOutcome::Deleted => format!("{} has been deleted.", ledger.path().display()),
                PurgeOutcome::Absent => format!("{} does not exist.", ledger.path().display()),
            };
            log(level, LogLevel::Normal, &msg);
            Ok(())
        }
    }
}

fn record(args: LedgerRecordArgs, level: LogLevel) -> Result<(), String> {
    let snapshot = DatasetSnapshot::from_csv(&args.csv)
        .map_err(|e| format!("Failed to load {}: {e}", args.csv.display()))?;
    let ledger = FeatureLedger::new(&args.ledger);
    let entry = ledger
        .record(&snapshot, &args.name, &args.description)
        .map_err(|e| format!("Failed to record features: {e}"))?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Feature information for {} saved to {} ({} features)",
            entry.dataset_name,
            ledger.path().display(),
            entry.num_features
        ),
    );
    Ok(())
}

fn show(args: LedgerShowArgs, level: LogLevel) -> Result<(), String> {
    let ledger = FeatureLedger::new(&args.ledger);
    let document = ledger
        .load()
        .map_err(|e| format!("Failed to load ledger: {e}"))?;

    if args.format == OutputFormat::Text && document.is_empty() {
        log(
            level,
            LogLevel::Normal,
            &format!("No ledger entries in {}", ledger.path().display()),
        );
        return Ok(());
    }

    let rendered = render_document(&document, args.format, level == LogLevel::Verbose)?;
    log(level, LogLevel::Normal, &rendered);
    Ok(())
}

/// The document in the requested output format, without a trailing newline
pub(crate) fn render_document(
    document: &LedgerDocument,
    format: OutputFormat,
    detailed: bool,
) -> Result<String, String> {
    match format {
        OutputFormat::Text => Ok(text_lines(document, detailed).join("\n")),
        OutputFormat::Json => serde_json::to_string_pretty(document)
            .map_err(|e| format!("JSON serialization error: {e}")),
        OutputFormat::Yaml => document
            .to_yaml()
            .map(|yaml| yaml.trim_end().to_string())
            .map_err(|e| format!("YAML serialization error: {e}")),
    }
}

/// One summary line per snapshot, plus one line per column when `detailed`
pub(crate) fn text_lines(document: &LedgerDocument, detailed: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for name in document.names() {
        let Some(entry) = document.entry(name) else {
            lines.push(format!("{name}: (unrecognised entry)"));
            continue;
        };
        let mut line = format!("{name}: {} features", entry.num_features);
        if !entry.description.is_empty() {
            line.push_str(&format!(" - {}", entry.description));
        }
        lines.push(line);
        if detailed {
            for (column, dtype) in &entry.features {
                lines.push(format!("  {column:<30} {dtype}"));
            }
        }
    }
    lines
}
