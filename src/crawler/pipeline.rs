//! Item pipeline
//!
//! Every scraped item passes through the pipeline before it is counted.
//! A rejected item is reported through `item_dropped`.

use crate::crawler::spider::Item;
use thiserror::Error;

/// An item was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DropItem(pub String);

pub trait ItemPipeline {
    fn process(&mut self, item: Item) -> Result<Item, DropItem>;
}

/// Drops items without a source URL or with a blank field value
#[derive(Debug, Default)]
pub struct ValidationPipeline;

impl ItemPipeline for ValidationPipeline {
    fn process(&mut self, item: Item) -> Result<Item, DropItem> {
        if item.url.trim().is_empty() {
            return Err(DropItem("Missing URL in item!".to_string()));
        }

        if let Some((name, _)) = item.fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(DropItem(format!("Blank value for field '{}'", name)));
        }

        Ok(item)
    }
}
