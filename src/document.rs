//! HTML document querying
//!
//! The listing parser never touches the HTML library directly. It only needs
//! to select elements, read their text and read attributes, which is what the
//! [`Document`] trait captures. [`HtmlDocument`] implements it on top of
//! `scraper`.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors that can occur while querying a document
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A CSS selector could not be parsed
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Read-only query capability over a parsed HTML page
pub trait Document {
    /// Handle to a single element, borrowed from the document
    type Element<'a>: Copy
    where
        Self: 'a;

    /// Returns all elements matching `selector`, in document order
    fn find_all<'a>(&'a self, selector: &str) -> Result<Vec<Self::Element<'a>>, DocumentError>;

    /// Returns all descendants of `scope` matching `selector`, in document order
    fn find_within<'a>(
        &'a self,
        scope: Self::Element<'a>,
        selector: &str,
    ) -> Result<Vec<Self::Element<'a>>, DocumentError>;

    /// Returns the concatenated text content of an element
    fn text<'a>(&'a self, element: Self::Element<'a>) -> String;

    /// Returns the value of an attribute, if present
    fn attr<'a>(&'a self, element: Self::Element<'a>, name: &str) -> Option<String>;
}

/// A fully parsed HTML page backed by `scraper`
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses a complete HTML document
    ///
    /// HTML parsing is lenient, so this never fails; malformed markup simply
    /// yields fewer matches later on.
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }
}

fn compile(selector: &str) -> Result<Selector, DocumentError> {
    Selector::parse(selector).map_err(|e| DocumentError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

impl Document for HtmlDocument {
    type Element<'a> = ElementRef<'a>;

    fn find_all<'a>(&'a self, selector: &str) -> Result<Vec<ElementRef<'a>>, DocumentError> {
        let selector = compile(selector)?;
        Ok(self.html.select(&selector).collect())
    }

    fn find_within<'a>(
        &'a self,
        scope: ElementRef<'a>,
        selector: &str,
    ) -> Result<Vec<ElementRef<'a>>, DocumentError> {
        let selector = compile(selector)?;
        Ok(scope.select(&selector).collect())
    }

    fn text<'a>(&'a self, element: ElementRef<'a>) -> String {
        element.text().collect()
    }

    fn attr<'a>(&'a self, element: ElementRef<'a>, name: &str) -> Option<String> {
        element.value().attr(name).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="entry"><a href="/one">One</a></div>
          <div class="entry"><a href="/two">Two <b>bold</b></a></div>
        </body></html>
    "#;

    #[test]
    fn test_find_all_in_document_order() {
        let doc = HtmlDocument::parse(PAGE);
        let entries = doc.find_all("div.entry").unwrap();
        assert_eq!(entries.len(), 2);

        let links = doc.find_within(entries[1], "a").unwrap();
        assert_eq!(doc.attr(links[0], "href").as_deref(), Some("/two"));
        assert_eq!(doc.text(links[0]), "Two bold");
    }

    #[test]
    fn test_missing_attribute() {
        let doc = HtmlDocument::parse(PAGE);
        let entries = doc.find_all("div.entry").unwrap();
        assert_eq!(doc.attr(entries[0], "href"), None);
    }

    #[test]
    fn test_invalid_selector() {
        let doc = HtmlDocument::parse(PAGE);
        let result = doc.find_all("div[");
        assert!(matches!(result, Err(DocumentError::InvalidSelector { .. })));
    }
}
