/// Blocking HTTP transport for the catalog host.
use super::{CatalogTransport, TransportError};
use reqwest::header::REFERER;

/// [`CatalogTransport`] backed by a blocking `reqwest` client.
///
/// No timeouts and no retries: a failing request surfaces immediately.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates a new transport with a default client.
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Checks the status and reads the body of a response.
    fn read_body(url: &str, response: reqwest::blocking::Response) -> Result<String, TransportError> {
        if !response.status().is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().map_err(|e| TransportError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogTransport for HttpTransport {
    fn get_html(&self, url: &str, query: &[(&str, &str)]) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Self::read_body(url, response)
    }

    fn post_form(
        &self,
        url: &str,
        referer: &str,
        form: &[(&str, &str)],
    ) -> Result<String, TransportError> {
        // `form` sets `Content-Type: application/x-www-form-urlencoded`
        let response = self
            .client
            .post(url)
            .header(REFERER, referer)
            .form(form)
            .send()
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Self::read_body(url, response)
    }
}
