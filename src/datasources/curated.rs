//! Curated journal list datasource
//!
//! Consumes a hand-maintained CSV of `issn, title, publisher` rows and
//! derives the same artifacts as the journals dump: singleton coincidence
//! rows, `main`-marked title candidates and publisher candidates. Useful as
//! a correction layer over scraped sources when ranked ahead of them in the
//! preference order.

use std::fs;

use tracing::info;

use crate::analysis::{Analysis, AnalysisKind, read_csv_rows};
use crate::config::Settings;
use crate::entity::Datasource;
use crate::pipeline::{PipelineError, PipelineResult};
use crate::storage::FileStore;

pub struct Curated {
    id: String,
    settings: Settings,
    store: FileStore,
}

/// Registry constructor
pub fn construct(settings: &Settings, id: &str) -> Box<dyn Datasource> {
    Box::new(Curated::new(settings, id))
}

impl Curated {
    pub fn new(settings: &Settings, id: &str) -> Self {
        Self {
            id: id.to_string(),
            store: FileStore::new(settings, id),
            settings: settings.clone(),
        }
    }

    fn write_rows(&self, filename: &str, rows: &[Vec<String>]) -> PipelineResult<()> {
        let mut writer = csv::Writer::from_writer(self.store.open_output(filename)?);
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Datasource for Curated {
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
        let file = self.settings.curated_file.as_ref().ok_or_else(|| {
            PipelineError::MissingInput(format!("curated_file for datasource '{}'", self.id))
        })?;
        let dest = self.store.path_for("origin.csv")?;
        info!(entity = %self.id, from = %file.display(), "copying curated journal list");
        fs::copy(file, &dest)?;
        Ok(())
    }

    fn analyse(&mut self) -> PipelineResult<()> {
        let origin = read_csv_rows(&self.store.path_for("origin.csv")?)?;

        let mut issns: Vec<Vec<String>> = Vec::new();
        let mut titles: Vec<Vec<String>> = Vec::new();
        let mut publishers: Vec<Vec<String>> = Vec::new();

        for row in origin {
            let issn = row.first().cloned().unwrap_or_default();
            if issn.is_empty() {
                continue;
            }
            issns.push(vec![issn.clone(), String::new()]);
            if let Some(title) = row.get(1)
                && !title.is_empty()
            {
                titles.push(vec![issn.clone(), title.clone(), "main".to_string()]);
            }
            if let Some(publisher) = row.get(2)
                && !publisher.is_empty()
            {
                publishers.push(vec![issn.clone(), publisher.clone()]);
            }
        }
        issns.sort();

        self.write_rows("coincident_issns.csv", &issns)?;
        self.write_rows("titles.csv", &titles)?;
        self.write_rows("publishers.csv", &publishers)?;
        info!(entity = %self.id, "curated analyses written");
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
