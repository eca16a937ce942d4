//! URL construction for the conversation, suggestion and PDF endpoints.

use url::Url;

use crate::suggest::EntityType;

/// API generation, selected purely by the entry path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    /// `/v2...` selects the versioned API, anything else the legacy one.
    pub fn from_entry_path(path: &str) -> Self {
        if path.starts_with("/v2") {
            ApiVersion::V2
        } else {
            ApiVersion::V1
        }
    }

    /// Prefix of the conversation endpoints.
    pub fn base(self) -> &'static str {
        match self {
            ApiVersion::V1 => "/api",
            ApiVersion::V2 => "/api/v2",
        }
    }

    /// The destructive reset is `/restart` on v1 and `/reset` on v2.
    pub fn reset_path(self) -> &'static str {
        match self {
            ApiVersion::V1 => "/restart",
            ApiVersion::V2 => "/reset",
        }
    }
}

/// Resolved endpoint set for one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    server: Url,
    version: ApiVersion,
}

impl Endpoints {
    pub fn new(server_url: &str, entry_path: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            server: Url::parse(server_url)?,
            version: ApiVersion::from_entry_path(entry_path),
        })
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    pub fn state(&self) -> Url {
        self.conversation("/state")
    }

    pub fn chat(&self) -> Url {
        self.conversation("/chat")
    }

    pub fn back(&self) -> Url {
        self.conversation("/back")
    }

    pub fn reset(&self) -> Url {
        self.conversation(self.version.reset_path())
    }

    /// Typeahead lookups are not versioned.
    pub fn suggest(&self, entity: EntityType, query: &str) -> Url {
        let mut url = self.at(&format!("/api/suggest/{}", entity.as_path()));
        url.query_pairs_mut().append_pair("q", query);
        url
    }

    /// Per-recipient PDF reference.
    pub fn download_pdf(&self, recipient_id: &str) -> Url {
        let mut url = self.at("/api/v2/download-pdf");
        url.query_pairs_mut().append_pair("recipient_id", recipient_id);
        url
    }

    fn conversation(&self, path: &str) -> Url {
        self.at(&format!("{}{}", self.version.base(), path))
    }

    fn at(&self, path: &str) -> Url {
        let mut url = self.server.clone();
        let prefix = self.server.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", prefix, path));
        url.set_query(None);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_from_entry_path() {
        assert_eq!(ApiVersion::from_entry_path("/v2"), ApiVersion::V2);
        assert_eq!(ApiVersion::from_entry_path("/v2/"), ApiVersion::V2);
        assert_eq!(ApiVersion::from_entry_path("/"), ApiVersion::V1);
        assert_eq!(ApiVersion::from_entry_path("/draft/abc"), ApiVersion::V1);
    }

    #[test]
    fn test_legacy_endpoints() {
        let endpoints = Endpoints::new("http://localhost:5000", "/").unwrap();
        assert_eq!(endpoints.state().as_str(), "http://localhost:5000/api/state");
        assert_eq!(endpoints.chat().as_str(), "http://localhost:5000/api/chat");
        assert_eq!(endpoints.back().as_str(), "http://localhost:5000/api/back");
        assert_eq!(endpoints.reset().as_str(), "http://localhost:5000/api/restart");
    }

    #[test]
    fn test_versioned_endpoints() {
        let endpoints = Endpoints::new("http://localhost:5000/", "/v2").unwrap();
        assert_eq!(endpoints.state().as_str(), "http://localhost:5000/api/v2/state");
        assert_eq!(endpoints.reset().as_str(), "http://localhost:5000/api/v2/reset");
    }

    #[test]
    fn test_suggest_and_pdf_are_unversioned() {
        let endpoints = Endpoints::new("https://example.org/wizard", "/v2").unwrap();
        let suggest = endpoints.suggest(EntityType::Company, "ООО Ромашка");
        assert_eq!(suggest.path(), "/wizard/api/suggest/company");
        assert_eq!(
            suggest.query_pairs().next().map(|(k, v)| (k.into_owned(), v.into_owned())),
            Some(("q".to_string(), "ООО Ромашка".to_string()))
        );

        let pdf = endpoints.download_pdf("gji msk");
        assert_eq!(pdf.path(), "/wizard/api/v2/download-pdf");
        assert_eq!(pdf.query(), Some("recipient_id=gji+msk"));
    }
}
