//! Journals data-dump datasource
//!
//! Consumes a journals dump CSV with one row per journal:
//! `eissn, pissn, title, alternative_title, publisher`. The analyse stage
//! derives three artifacts inside the instance:
//!
//! - `coincident_issns.csv`: both orderings of each eissn/pissn pair, and
//!   `(issn, "")` rows for journals with a single identifier
//! - `titles.csv`: `issn, title, main|alt` candidate rows
//! - `publishers.csv`: `issn, publisher` candidate rows

use std::fs;

use tracing::info;

use crate::analysis::{Analysis, AnalysisKind, read_csv_rows};
use crate::config::Settings;
use crate::entity::Datasource;
use crate::pipeline::{PipelineError, PipelineResult};
use crate::storage::FileStore;

pub struct Journals {
    id: String,
    settings: Settings,
    store: FileStore,
}

/// Registry constructor
pub fn construct(settings: &Settings, id: &str) -> Box<dyn Datasource> {
    Box::new(Journals::new(settings, id))
}

impl Journals {
    pub fn new(settings: &Settings, id: &str) -> Self {
        Self {
            id: id.to_string(),
            store: FileStore::new(settings, id),
            settings: settings.clone(),
        }
    }

    fn origin_rows(&self) -> PipelineResult<Vec<Vec<String>>> {
        Ok(read_csv_rows(&self.store.path_for("origin.csv")?)?)
    }

    fn write_rows(&self, filename: &str, rows: &[Vec<String>]) -> PipelineResult<()> {
        let mut writer = csv::Writer::from_writer(self.store.open_output(filename)?);
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn coincident_issns(&self) -> PipelineResult<()> {
        let mut pairs: Vec<Vec<String>> = Vec::new();
        for row in self.origin_rows()? {
            let eissn = row.first().cloned().unwrap_or_default();
            let pissn = row.get(1).cloned().unwrap_or_default();
            match (eissn.is_empty(), pissn.is_empty()) {
                (false, false) => {
                    pairs.push(vec![eissn.clone(), pissn.clone()]);
                    pairs.push(vec![pissn, eissn]);
                }
                (false, true) => pairs.push(vec![eissn, String::new()]),
                (true, false) => pairs.push(vec![pissn, String::new()]),
                (true, true) => {}
            }
        }
        pairs.sort();
        self.write_rows("coincident_issns.csv", &pairs)
    }

    fn title_map(&self) -> PipelineResult<()> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for row in self.origin_rows()? {
            let title = row.get(2).cloned().unwrap_or_default();
            let alt = row.get(3).cloned().unwrap_or_default();
            for issn in [row.first(), row.get(1)].into_iter().flatten() {
                if issn.is_empty() {
                    continue;
                }
                if !title.is_empty() {
                    rows.push(vec![issn.clone(), title.clone(), "main".to_string()]);
                }
                if !alt.is_empty() {
                    rows.push(vec![issn.clone(), alt.clone(), "alt".to_string()]);
                }
            }
        }
        self.write_rows("titles.csv", &rows)
    }

    fn publisher_map(&self) -> PipelineResult<()> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for row in self.origin_rows()? {
            let publisher = row.get(4).cloned().unwrap_or_default();
            if publisher.is_empty() {
                continue;
            }
            for issn in [row.first(), row.get(1)].into_iter().flatten() {
                if !issn.is_empty() {
                    rows.push(vec![issn.clone(), publisher.clone()]);
                }
            }
        }
        self.write_rows("publishers.csv", &rows)
    }
}

impl Datasource for Journals {
    fn id(&self) -> &str {
        &self.id
    }

    fn store(&self) -> &FileStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut FileStore {
        &mut self.store
    }

    fn fetch(&mut self) -> PipelineResult<()> {
        let dump = self.settings.journals_dump.as_ref().ok_or_else(|| {
            PipelineError::MissingInput(format!("journals_dump for datasource '{}'", self.id))
        })?;
        let dest = self.store.path_for("origin.csv")?;
        info!(entity = %self.id, from = %dump.display(), to = %dest.display(), "copying journals dump");
        fs::copy(dump, &dest)?;
        Ok(())
    }

    fn analyse(&mut self) -> PipelineResult<()> {
        self.coincident_issns()?;
        self.title_map()?;
        self.publisher_map()?;
        info!(entity = %self.id, "journal analyses written");
        Ok(())
    }

    fn provides_analysis(&self, kind: AnalysisKind) -> bool {
        matches!(
            kind,
            AnalysisKind::CoincidentIssns | AnalysisKind::Titles | AnalysisKind::Publishers
        )
    }

    fn analysis(&self, kind: AnalysisKind) -> PipelineResult<Option<Analysis>> {
        let filename = match kind {
            AnalysisKind::CoincidentIssns => "coincident_issns.csv",
            AnalysisKind::Titles => "titles.csv",
            AnalysisKind::Publishers => "publishers.csv",
        };
        Ok(Some(Analysis::from_csv(
            &self.id,
            self.store.path_for(filename)?,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn journals_with_dump(rows: &str) -> (TempDir, Journals) {
        let temp = TempDir::new().unwrap();
        let dump = temp.path().join("dump.csv");
        fs::write(&dump, rows).unwrap();
        let settings = Settings::new()
            .with_store_root(temp.path().join("store"))
            .with_journals_dump(&dump);
        let journals = Journals::new(&settings, "journals");
        (temp, journals)
    }

    #[test]
    fn test_fetch_copies_dump_into_instance() {
        let (_temp, mut journals) = journals_with_dump("1111-1111,2222-2222,Nature,,Springer\n");
        journals.store_mut().fresh();
        journals.fetch().unwrap();

        let origin = journals.store().path_for("origin.csv").unwrap();
        assert!(origin.is_file());
    }

    #[test]
    fn test_analyse_derives_artifacts() {
        let (_temp, mut journals) = journals_with_dump(
            "1111-1111,2222-2222,Nature,Nat.,Springer\n3333-3333,,Science,,AAAS\n",
        );
        journals.store_mut().fresh();
        journals.fetch().unwrap();
        journals.analyse().unwrap();

        let issns = journals
            .analysis(AnalysisKind::CoincidentIssns)
            .unwrap()
            .unwrap()
            .entries()
            .unwrap();
        assert!(issns.contains(&vec!["1111-1111".to_string(), "2222-2222".to_string()]));
        assert!(issns.contains(&vec!["2222-2222".to_string(), "1111-1111".to_string()]));
        assert!(issns.contains(&vec!["3333-3333".to_string(), "".to_string()]));

        let titles = journals
            .analysis(AnalysisKind::Titles)
            .unwrap()
            .unwrap()
            .entries()
            .unwrap();
        assert!(titles.contains(&vec![
            "1111-1111".to_string(),
            "Nature".to_string(),
            "main".to_string()
        ]));
        assert!(titles.contains(&vec![
            "2222-2222".to_string(),
            "Nat.".to_string(),
            "alt".to_string()
        ]));

        let publishers = journals
            .analysis(AnalysisKind::Publishers)
            .unwrap()
            .unwrap()
            .entries()
            .unwrap();
        assert!(publishers.contains(&vec!["3333-3333".to_string(), "AAAS".to_string()]));
    }

    #[test]
    fn test_fetch_without_dump_configured() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::new().with_store_root(temp.path());
        let mut journals = Journals::new(&settings, "journals");
        journals.store_mut().fresh();
        let err = journals.fetch().unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(_)));
    }
}
