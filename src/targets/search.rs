//! Search index target
//!
//! Prepares an Elasticsearch-style bulk file from the JSON feeds of the
//! products this target serves, then delivers it into a configured outgoing
//! directory for the indexing side to pick up. Records without an `id` get
//! a generated one so the bulk action line can address them.

use std::fs;
use std::io::Write;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::analysis::FormatKind;
use crate::config::Settings;
use crate::entity::{Registry, Target};
use crate::pipeline::{PipelineError, PipelineResult};
use crate::storage::FileStore;

const BULK_FILE: &str = "bulk.ndjson";

pub struct Search {
    id: String,
    settings: Settings,
    store: FileStore,
}

/// Registry constructor
pub fn construct(settings: &Settings, id: &str) -> Box<dyn Target> {
    Box::new(Search::new(settings, id))
}

impl Search {
    pub fn new(settings: &Settings, id: &str) -> Self {
        Self {
            id: id.to_string(),
            store: FileStore::new(settings, id),
            settings: settings.clone(),
        }
    }
}

impl Target for Search {
    fn id(&self) -> &str {
        &self.id
    }

    fn store(&self) -> &FileStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut FileStore {
        &mut self.store
    }

    fn prepare(&mut self) -> PipelineResult<()> {
        info!(entity = %self.id, "preparing bulk file");

        let registry = Registry::with_defaults();
        let mut feeds = Vec::new();
        for name in self.settings.products_for(&self.id) {
            let mut product = registry.product(&self.settings, name)?;
            product.store_mut().resolve_current(false)?;
            if product.provides_format(FormatKind::JsonFeed)
                && let Some(feed) = product.format(FormatKind::JsonFeed)?
            {
                feeds.push(feed);
            }
        }

        let mut out = self.store.open_output(BULK_FILE)?;
        let mut records = 0usize;
        for feed in &feeds {
            for mut doc in feed.entries()? {
                let id = match doc.get("id").and_then(|v| v.as_str()) {
                    Some(existing) => existing.to_string(),
                    None => {
                        let generated = Uuid::new_v4().simple().to_string();
                        if let Some(object) = doc.as_object_mut() {
                            object.insert("id".to_string(), json!(generated));
                        }
                        generated
                    }
                };
                serde_json::to_writer(&mut out, &json!({"index": {"_id": id}}))?;
                writeln!(out)?;
                serde_json::to_writer(&mut out, &doc)?;
                writeln!(out)?;
                records += 1;
            }
        }
        out.flush()?;

        info!(entity = %self.id, records, "bulk file prepared");
        Ok(())
    }

    fn load(&mut self) -> PipelineResult<()> {
        let outgoing = self.settings.outgoing.as_ref().ok_or_else(|| {
            PipelineError::MissingInput(format!("outgoing directory for target '{}'", self.id))
        })?;

        let source = self.store.path_for(BULK_FILE)?;
        let instance = self.store.instance_name()?;
        let dest = outgoing.join(format!("{}-{}.ndjson", self.id, instance));

        fs::create_dir_all(outgoing)?;
        fs::copy(&source, &dest)?;

        info!(entity = %self.id, to = %dest.display(), "bulk file delivered");
        Ok(())
    }
}
