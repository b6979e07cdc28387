//! Selector-driven listing spider
//!
//! Extracts one item per card matched by the item selector and follows a
//! single "next page" control. Every selector is compiled once, when the
//! spider is built.

use crate::classify::ParseFailure;
use crate::config::{FieldConfig, SpiderConfig};
use crate::crawler::spider::{Item, Page, Pagination, ParseError, ParseOutput, Spider};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// A field with its selector compiled
#[derive(Debug)]
struct CompiledField {
    name: String,
    selector: Selector,
    attr: Option<String>,
    required: bool,
}

impl CompiledField {
    fn new(config: &FieldConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            name: config.name.clone(),
            selector: compile(&config.selector)?,
            attr: config.attr.clone(),
            required: config.required,
        })
    }

    /// Reads the field from an item card; blank values count as missing
    fn extract(&self, card: ElementRef<'_>) -> Option<String> {
        let element = card.select(&self.selector).next()?;
        let value = match &self.attr {
            Some(attr) => element.value().attr(attr)?.trim().to_string(),
            None => element.text().collect::<String>().trim().to_string(),
        };
        Some(value).filter(|v| !v.is_empty())
    }
}

/// Spider built from a `[[spider]]` configuration block
#[derive(Debug)]
pub struct ListingSpider {
    name: String,
    start_urls: Vec<String>,
    item_selector: Selector,
    fields: Vec<CompiledField>,
    next_selector: Option<Selector>,
    disabled_selector: Option<Selector>,
    expect_pagination: bool,
}

impl ListingSpider {
    /// Compiles the spider's selectors
    ///
    /// # Returns
    ///
    /// * `Ok(ListingSpider)` - All selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - A selector is not valid CSS
    pub fn new(config: &SpiderConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            name: config.name.clone(),
            start_urls: config.start_urls.clone(),
            item_selector: compile(&config.item_selector)?,
            fields: config
                .fields
                .iter()
                .map(CompiledField::new)
                .collect::<Result<_, _>>()?,
            next_selector: config.next_selector.as_deref().map(compile).transpose()?,
            disabled_selector: config
                .disabled_selector
                .as_deref()
                .map(compile)
                .transpose()?,
            expect_pagination: config.expect_pagination,
        })
    }

    fn extract_items(&self, document: &Html, page_url: &str) -> (Vec<Item>, Vec<ParseFailure>) {
        let mut items = Vec::new();
        let mut issues = Vec::new();
        let mut candidates = 0;

        for card in document.select(&self.item_selector) {
            candidates += 1;

            let mut fields = BTreeMap::new();
            let mut missing = Vec::new();

            for field in &self.fields {
                match field.extract(card) {
                    Some(value) => {
                        fields.insert(field.name.clone(), value);
                    }
                    None if field.required => missing.push(field.name.clone()),
                    None => {}
                }
            }

            if missing.is_empty() {
                items.push(Item {
                    url: page_url.to_string(),
                    fields,
                });
            } else {
                tracing::debug!("Card {} on {} lacks {:?}", candidates, page_url, missing);
                issues.push(ParseFailure::MissingRequiredData { fields: missing });
            }
        }

        if candidates == 0 {
            issues.push(ParseFailure::NoItemsFound);
        }

        (items, issues)
    }

    fn pagination(&self, document: &Html, page_url: &str) -> Pagination {
        let Some(next_selector) = &self.next_selector else {
            return Pagination::Absent { expected: false };
        };

        let Some(control) = document.select(next_selector).next() else {
            return Pagination::Absent {
                expected: self.expect_pagination,
            };
        };

        if self.is_disabled(control) {
            return Pagination::Exhausted;
        }

        let Some(href) = control.value().attr("href").map(str::trim) else {
            return Pagination::Failed("next page control has no href".to_string());
        };

        match Url::parse(page_url).and_then(|base| base.join(href)) {
            Ok(next) => Pagination::Next(next.to_string()),
            Err(e) => Pagination::Failed(format!("cannot resolve '{}': {}", href, e)),
        }
    }

    fn is_disabled(&self, control: ElementRef<'_>) -> bool {
        let element = control.value();
        self.disabled_selector
            .as_ref()
            .is_some_and(|selector| selector.matches(&control))
            || element.attr("aria-disabled") == Some("true")
            || element.attr("disabled").is_some()
    }
}

impl Spider for ListingSpider {
    fn name(&self) -> &str {
        &self.name
    }

    fn start_urls(&self) -> Vec<String> {
        self.start_urls.clone()
    }

    fn parse(&mut self, page: &Page) -> Result<ParseOutput, ParseError> {
        if let Some(content_type) = &page.content_type {
            if !content_type.contains("html") {
                return Err(ParseError::ContentType(content_type.clone()));
            }
        }

        let document = Html::parse_document(&page.body);
        let (items, issues) = self.extract_items(&document, &page.url);
        let pagination = self.pagination(&document, &page.url);

        Ok(ParseOutput {
            items,
            issues,
            pagination,
        })
    }
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}
