use std::io::Read;

use tracing::warn;

use crate::{ImporterError, Result};

/// A CSV table: the header row and the data rows, all padded to one width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    /// Read comma-separated cells. Byte order marks are removed and every
    /// cell is trimmed; rows shorter than the widest one are padded with
    /// empty cells.
    pub fn from_reader<R: Read>(input: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            let cells: Vec<String> = record
                .iter()
                .map(|cell| cell.replace('\u{feff}', "").trim().to_string())
                .collect();
            records.push(cells);
        }

        let width = records.iter().map(Vec::len).max().unwrap_or(0);
        if records.iter().any(|r| r.len() != width) {
            warn!("Row lengths are non-uniform, padding short rows to {} cells", width);
            for record in &mut records {
                record.resize(width, String::new());
            }
        }

        let mut records = records.into_iter();
        let header = records
            .next()
            .ok_or_else(|| ImporterError::Grid("CSV file has no header row".to_string()))?;

        Ok(Self {
            header,
            rows: records.collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Index of the column whose header equals `name`, ignoring case.
    pub fn column(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.header.iter().position(|h| h.to_lowercase() == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_header_and_rows() {
        let csv = "Koht,Nimi,Kool,1,2\n1.,Jaan Tamm,Kesklinna Kool,5,3\n2.,Mari Mets,,4,4\n";
        let grid = Grid::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(grid.header, vec!["Koht", "Nimi", "Kool", "1", "2"]);
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[1][2], "");
        assert_eq!(grid.width(), 5);
    }

    #[test]
    fn test_strips_bom_and_trims_cells() {
        let csv = "\u{feff}Koht , Nimi\n 1. ,  Jaan Tamm \n";
        let grid = Grid::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(grid.header, vec!["Koht", "Nimi"]);
        assert_eq!(grid.rows[0], vec!["1.", "Jaan Tamm"]);
    }

    #[test]
    fn test_pads_short_rows() {
        let csv = "Koht,Nimi,Kokku\n1,Jaan Tamm\n2,Mari Mets,7\n";
        let grid = Grid::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(grid.rows[0], vec!["1", "Jaan Tamm", ""]);
        assert!(grid.rows.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn test_column_lookup_ignores_case() {
        let grid = Grid::from_reader("Koht,Õpilase nimi\n".as_bytes()).unwrap();

        assert_eq!(grid.column("koht"), Some(0));
        assert_eq!(grid.column("ÕPILASE NIMI"), Some(1));
        assert_eq!(grid.column("Kool"), None);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let err = Grid::from_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, ImporterError::Grid(_)));
    }
}
