//! Built-in macro providers.

use std::collections::BTreeMap;

use crate::domain::layout::PAYLOAD_JAR;
use crate::domain::template::MacroProvider;

/// Directive telling the wrapper to refresh the payload jar on start.
pub const PAYLOAD_DOWNLOAD: &str = "PAYLOAD_DOWNLOAD";

/// Marker placed where no download URL could be determined.
pub const MISSING_URL_MARKER: &str = "TODO:payloadJarURL";

/// Builds the value of [`PAYLOAD_DOWNLOAD`].
///
/// Only HTTPS URLs produce an active directive; any other scheme yields the
/// same directive commented out. Without a URL the directive is commented
/// out and carries [`MISSING_URL_MARKER`].
#[must_use]
pub fn download_macro_value(url: Option<&str>) -> String {
    match url {
        Some(url) if is_https(url) => download_directive(url),
        Some(url) => format!("<!-- {} -->", download_directive(url)),
        None => format!("<!-- {} -->", download_directive(MISSING_URL_MARKER)),
    }
}

fn download_directive(url: &str) -> String {
    format!(
        "<download from=\"{}\" to=\"%BASE%\\{PAYLOAD_JAR}\"/>",
        escape_attr(url)
    )
}

fn is_https(url: &str) -> bool {
    url.get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Supplies [`PAYLOAD_DOWNLOAD`] from a URL lookup made by the caller.
///
/// A failed lookup degrades to the disabled directive.
#[derive(Debug, Clone)]
pub struct PayloadDownloadProvider {
    lookup: Result<Option<String>, String>,
}

impl PayloadDownloadProvider {
    #[must_use]
    pub fn new(lookup: Result<Option<String>, String>) -> Self {
        Self { lookup }
    }

    #[must_use]
    pub fn with_url(url: Option<String>) -> Self {
        Self::new(Ok(url))
    }

    /// Why the directive is inert, if it is.
    #[must_use]
    pub fn lookup_error(&self) -> Option<&str> {
        self.lookup.as_ref().err().map(String::as_str)
    }
}

impl MacroProvider for PayloadDownloadProvider {
    fn macro_names(&self) -> Vec<String> {
        vec![PAYLOAD_DOWNLOAD.to_string()]
    }

    fn default_value(&self, name: &str) -> Option<String> {
        (name == PAYLOAD_DOWNLOAD).then(|| download_macro_value(None))
    }

    fn values(&self) -> BTreeMap<String, String> {
        let url = self.lookup.as_ref().ok().and_then(Option::as_deref);
        BTreeMap::from([(PAYLOAD_DOWNLOAD.to_string(), download_macro_value(url))])
    }
}
