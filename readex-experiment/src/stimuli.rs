use crate::config::ColumnNames;
use crate::error::StimulusError;
use readex_core::{Choice, ChoiceLabel, Stimulus, TRIAL_COLUMNS};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Loads every row of the Stimulus Source. Fails before anything is shown
/// when the paragraph-text column is missing.
pub fn load_stimuli(path: &Path, columns: &ColumnNames) -> Result<Vec<Stimulus>, StimulusError> {
    let file = std::fs::File::open(path).map_err(|e| StimulusError::Open {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let stimuli = read_stimuli(file, path, columns)?;
    info!(path = %path.display(), count = stimuli.len(), "stimuli loaded");
    Ok(stimuli)
}

pub fn read_stimuli<R: Read>(
    reader: R,
    path: &Path,
    columns: &ColumnNames,
) -> Result<Vec<Stimulus>, StimulusError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|source| StimulusError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let text_idx = position(&columns.text).ok_or_else(|| StimulusError::MissingColumn {
        path: path.to_path_buf(),
        column: columns.text.clone(),
    })?;
    if let Some(clash) = headers
        .iter()
        .enumerate()
        .find(|(i, name)| *i != text_idx && TRIAL_COLUMNS.contains(name))
    {
        return Err(StimulusError::ReservedColumn {
            path: path.to_path_buf(),
            column: clash.1.to_string(),
        });
    }
    let question_idx = position(&columns.question);
    let correct_idx = position(&columns.correct);
    let option_idx: Vec<(ChoiceLabel, Option<usize>)> = ChoiceLabel::ALL
        .into_iter()
        .zip(columns.options.iter())
        .map(|(label, name)| (label, position(name)))
        .collect();

    let mut out = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|source| StimulusError::Row {
            path: path.to_path_buf(),
            row,
            source,
        })?;
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).and_then(present);

        let choices = option_idx
            .iter()
            .filter_map(|(label, idx)| {
                field(*idx).map(|text| Choice {
                    label: *label,
                    text,
                })
            })
            .collect();

        let metadata = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != text_idx)
            .map(|(i, name)| (name.to_string(), record.get(i).unwrap_or("").to_string()))
            .collect();

        out.push(Stimulus {
            id: row,
            text: record.get(text_idx).unwrap_or("").to_string(),
            question: field(question_idx),
            choices,
            correct: field(correct_idx),
            metadata,
        });
    }
    Ok(out)
}

/// Blank cells and pandas' "nan" count as absent.
fn present(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(raw.to_string())
    }
}
