use crate::error::StimulusError;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// A fixed preference page: one topic, two paragraphs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPage {
    pub title: String,
    pub left: String,
    pub right: String,
}

const TITLE: &str = "PageTitle";
const LEFT: &str = "Paragraph1";
const RIGHT: &str = "Paragraph2";

pub fn load_pages(path: &Path) -> Result<Vec<FixedPage>, StimulusError> {
    let file = std::fs::File::open(path).map_err(|e| StimulusError::Open {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let pages = read_pages(file, path)?;
    info!(path = %path.display(), count = pages.len(), "preference pages loaded");
    Ok(pages)
}

pub fn read_pages<R: Read>(reader: R, path: &Path) -> Result<Vec<FixedPage>, StimulusError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|source| StimulusError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| StimulusError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let (t, l, r) = (column(TITLE)?, column(LEFT)?, column(RIGHT)?);

    rdr.records()
        .enumerate()
        .map(|(row, record)| {
            let record = record.map_err(|source| StimulusError::Row {
                path: path.to_path_buf(),
                row,
                source,
            })?;
            let get = |i: usize| record.get(i).unwrap_or("").to_string();
            Ok(FixedPage {
                title: get(t),
                left: get(l),
                right: get(r),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_pages_in_order() {
        let csv = "PageTitle,Paragraph1,Paragraph2\nWater Cycle,story,facts\nClimate,chart,poem\n";
        let pages = read_pages(csv.as_bytes(), Path::new("pages.csv")).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].title, "Climate");
        assert_eq!(pages[0].right, "facts");
    }

    #[test]
    fn requires_both_paragraph_columns() {
        let err = read_pages("PageTitle,Paragraph1\nx,y\n".as_bytes(), Path::new("p.csv"))
            .unwrap_err();
        assert!(matches!(err, StimulusError::MissingColumn { column, .. } if column == "Paragraph2"));
    }
}
