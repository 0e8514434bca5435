//! Journal autocomplete product
//!
//! Merges coincident-ISSN observations from the product's sources into
//! disjoint identifier clusters, then assembles one record per cluster with
//! a preference-resolved canonical title, alternate titles, a publisher and
//! an index block of lookup variants. The assembled `jac.json` is a
//! line-by-line JSON feed.

use std::collections::HashMap;
use std::io::Write;

use serde_json::json;
use tracing::info;

use crate::analysis::{Analysis, AnalysisKind, FormatKind, JsonFeed, read_csv_rows};
use crate::cluster::prefer::{Candidate, extract_preferred};
use crate::cluster::{self, issn};
use crate::config::Settings;
use crate::entity::{Product, Registry};
use crate::pipeline::PipelineResult;
use crate::storage::FileStore;

pub struct Jac {
    id: String,
    settings: Settings,
    store: FileStore,
}

/// Registry constructor
pub fn construct(settings: &Settings, id: &str) -> Box<dyn Product> {
    Box::new(Jac::new(settings, id))
}

impl Jac {
    pub fn new(settings: &Settings, id: &str) -> Self {
        Self {
            id: id.to_string(),
            store: FileStore::new(settings, id),
            settings: settings.clone(),
        }
    }

    /// Collect the three analysis kinds from this product's sources,
    /// reading each source's current instance
    fn source_analyses(&self) -> PipelineResult<(Vec<Analysis>, Vec<Analysis>, Vec<Analysis>)> {
        let registry = Registry::with_defaults();
        let mut issns = Vec::new();
        let mut titles = Vec::new();
        let mut publishers = Vec::new();

        for name in self.settings.sources_for(&self.id) {
            let mut datasource = registry.datasource(&self.settings, name)?;
            datasource.store_mut().resolve_current(false)?;

            for (kind, bucket) in [
                (AnalysisKind::CoincidentIssns, &mut issns),
                (AnalysisKind::Titles, &mut titles),
                (AnalysisKind::Publishers, &mut publishers),
            ] {
                if datasource.provides_analysis(kind)
                    && let Some(analysis) = datasource.analysis(kind)?
                {
                    bucket.push(analysis);
                }
            }
        }
        Ok((issns, titles, publishers))
    }

    fn write_rows(&self, filename: &str, rows: &[Vec<String>]) -> PipelineResult<()> {
        // cluster rows vary in width
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(self.store.open_output(filename)?);
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Canonical title and alternates for a cluster
    ///
    /// Main-marked candidates take precedence; alt-marked candidates are
    /// only promoted when no main exists. Preference resolution breaks ties
    /// between competing candidates.
    fn titles_for(
        &self,
        issns: &[String],
        titles: &HashMap<String, Vec<Vec<String>>>,
    ) -> (Option<String>, Vec<String>) {
        let mut mains: Vec<Candidate> = Vec::new();
        let mut alts: Vec<Candidate> = Vec::new();

        for issn in issns {
            for candidate in titles.get(issn).map(Vec::as_slice).unwrap_or(&[]) {
                let (Some(value), Some(marker)) = (candidate.first(), candidate.get(1)) else {
                    continue;
                };
                let source = candidate.get(2).cloned().unwrap_or_default();
                match marker.as_str() {
                    "main" => mains.push(Candidate::new(source, value.trim())),
                    "alt" => alts.push(Candidate::new(source, value.trim())),
                    _ => {}
                }
            }
        }

        let order = &self.settings.preference_order;
        if mains.is_empty() {
            // no main titles at all: promote the best alternate
            return match extract_preferred(&alts, order) {
                Some(preferred) => (Some(preferred.canonical), preferred.alternates),
                None => (None, Vec::new()),
            };
        }

        let Some(preferred) = extract_preferred(&mains, order) else {
            return (None, Vec::new());
        };
        let mut alternates = preferred.alternates;
        for alt in &alts {
            if alt.value != preferred.canonical && !alternates.contains(&alt.value) {
                alternates.push(alt.value.clone());
            }
        }
        (Some(preferred.canonical), alternates)
    }

    /// Preference-resolved publisher for a cluster
    fn publisher_for(
        &self,
        issns: &[String],
        publishers: &HashMap<String, Vec<Vec<String>>>,
    ) -> Option<String> {
        let mut candidates: Vec<Candidate> = Vec::new();
        for issn in issns {
            for candidate in publishers.get(issn).map(Vec::as_slice).unwrap_or(&[]) {
                let Some(value) = candidate.first() else {
                    continue;
                };
                let source = candidate.get(1).cloned().unwrap_or_default();
                candidates.push(Candidate::new(source, value.trim()));
            }
        }
        extract_preferred(&candidates, &self.settings.preference_order)
            .map(|preferred| preferred.canonical)
    }
}

/// Normalised lookup variants of a title
fn title_variants(title: &str) -> Vec<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let lower = trimmed.to_lowercase();
    let mut variants = vec![lower.clone()];
    if let Some(rest) = lower.strip_prefix("the ") {
        variants.push(rest.to_string());
    }
    let depunct: String = lower
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    if depunct != lower && !variants.contains(&depunct) {
        variants.push(depunct);
    }
    variants
}

/// Index block for a record: lowercased and hyphen-stripped issn forms plus
/// title variants. Alt variants include the main title variants, which
/// improves match scores for the main title.
fn index_for(issns: &[String], title: &str, alts: &[String]) -> serde_json::Value {
    let mut issn_variants: Vec<String> = issns.iter().map(|i| i.to_lowercase()).collect();
    let stripped: Vec<String> = issn_variants.iter().map(|i| issn::unhyphenated(i)).collect();
    issn_variants.extend(stripped);

    let main_variants = title_variants(title);
    let mut alt_variants = main_variants.clone();
    for alt in alts {
        for variant in title_variants(alt) {
            if !alt_variants.contains(&variant) {
                alt_variants.push(variant);
            }
        }
    }

    json!({
        "issns": issn_variants,
        "title": main_variants,
        "alts": alt_variants,
    })
}

impl Product for Jac {
    fn id(&self) -> &str {
        &self.id
    }

    fn store(&self) -> &FileStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut FileStore {
        &mut self.store
    }

    fn gather(&mut self, force_update: bool) -> PipelineResult<()> {
        let sources = self.settings.sources_for(&self.id).to_vec();
        info!(entity = %self.id, ?sources, "gathering journal sources");

        let registry = Registry::with_defaults();
        let mut datasources = Vec::with_capacity(sources.len());
        for name in &sources {
            datasources.push(registry.datasource(&self.settings, name)?);
        }
        crate::pipeline::Resolver::new(&self.settings).resolve(
            &mut datasources,
            force_update,
            &crate::pipeline::ResolveStage::all(),
        )
    }

    fn analyse(&mut self) -> PipelineResult<()> {
        info!(entity = %self.id, "analysing data for journal autocomplete");
        let (issns, titles, publishers) = self.source_analyses()?;

        self.write_rows("issn_clusters.csv", &cluster::issn_clusters(&issns)?)?;
        self.write_rows("titles.csv", &cluster::cat_and_dedupe(&titles)?)?;
        self.write_rows("publishers.csv", &cluster::cat_and_dedupe(&publishers)?)?;

        info!(entity = %self.id, "analysed data written");
        Ok(())
    }

    fn assemble(&mut self) -> PipelineResult<()> {
        info!(entity = %self.id, "assembling journal autocomplete data");

        let titlerows = read_csv_rows(&self.store.path_for("titles.csv")?)?;
        let pubrows = read_csv_rows(&self.store.path_for("publishers.csv")?)?;
        let titles = cluster::cluster_to_map(&titlerows, 3);
        let publishers = cluster::cluster_to_map(&pubrows, 2);

        let clusters = read_csv_rows(&self.store.path_for("issn_clusters.csv")?)?;
        let mut out = self.store.open_output("jac.json")?;
        let mut records = 0usize;

        for issns in &clusters {
            let mut record = serde_json::Map::new();
            record.insert("issns".to_string(), json!(issns));

            let (main, alternates) = self.titles_for(issns, &titles);
            let title = main.unwrap_or_default();
            record.insert("title".to_string(), json!(title));
            if !alternates.is_empty() {
                record.insert("alts".to_string(), json!(alternates));
            }

            if let Some(publisher) = self.publisher_for(issns, &publishers) {
                record.insert("publisher".to_string(), json!(publisher));
            }

            record.insert("index".to_string(), index_for(issns, &title, &alternates));

            serde_json::to_writer(&mut out, &serde_json::Value::Object(record))?;
            writeln!(out)?;
            records += 1;
        }
        out.flush()?;

        info!(entity = %self.id, records, "journal autocomplete data assembled");
        Ok(())
    }

    fn provides_format(&self, kind: FormatKind) -> bool {
        matches!(kind, FormatKind::JsonFeed)
    }

    fn format(&self, kind: FormatKind) -> PipelineResult<Option<JsonFeed>> {
        match kind {
            FormatKind::JsonFeed => Ok(Some(JsonFeed::new(self.store.path_for("jac.json")?))),
        }
    }
}
