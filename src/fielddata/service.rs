//! Per-index registry of field data factories

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use tracing::info;

use super::index::{FieldDataListener, IndexFieldData};
use crate::config::FieldDataSettings;
use crate::error::Result;
use crate::segment::SegmentId;

pub struct FieldDataService {
    settings: ArcSwap<FieldDataSettings>,
    fields: DashMap<String, Arc<IndexFieldData>>,
    listener: Option<Arc<dyn FieldDataListener>>,
}

impl FieldDataService {
    pub fn new(settings: FieldDataSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings: ArcSwap::from_pointee(settings),
            fields: DashMap::new(),
            listener: None,
        })
    }

    /// Attach a listener to every factory created from now on
    pub fn with_listener(mut self, listener: Arc<dyn FieldDataListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn settings(&self) -> Arc<FieldDataSettings> {
        self.settings.load_full()
    }

    /// The factory for `field`, created from the current settings on first use
    pub fn for_field(&self, field: &str) -> Arc<IndexFieldData> {
        if let Some(existing) = self.fields.get(field) {
            return Arc::clone(existing.value());
        }
        let entry = self.fields.entry(field.to_string()).or_insert_with(|| {
            let settings = self.settings.load();
            let mut field_data =
                IndexFieldData::new(field, settings.format_for(field), settings.page_size);
            if let Some(listener) = &self.listener {
                field_data = field_data.with_listener(Arc::clone(listener));
            }
            Arc::new(field_data)
        });
        Arc::clone(entry.value())
    }

    /// Replace the settings. Factories whose format changed are dropped
    /// along with their cached data and rebuilt on next use.
    pub fn update_settings(&self, settings: FieldDataSettings) -> Result<()> {
        settings.validate()?;
        let page_size_changed = settings.page_size != self.settings.load().page_size;
        self.fields.retain(|name, field_data| {
            let keep = !page_size_changed && field_data.format() == settings.format_for(name);
            if !keep {
                field_data.clear();
            }
            keep
        });
        info!(
            default_format = %settings.default_format,
            page_size = settings.page_size,
            "Updated field data settings"
        );
        self.settings.store(Arc::new(settings));
        Ok(())
    }

    pub fn clear_field(&self, field: &str) {
        if let Some(field_data) = self.fields.get(field) {
            field_data.clear();
        }
    }

    /// Forget a closed segment for every field
    pub fn clear_segment(&self, segment: SegmentId) {
        for field_data in self.fields.iter() {
            field_data.evict(segment);
        }
    }

    pub fn clear(&self) {
        for field_data in self.fields.iter() {
            field_data.clear();
        }
    }

    pub fn memory_size_in_bytes(&self) -> u64 {
        self.fields
            .iter()
            .map(|field_data| field_data.memory_size_in_bytes())
            .sum()
    }
}
