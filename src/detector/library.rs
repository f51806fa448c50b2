use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::Path;

use super::osv::OsvClient;
use super::LibraryDetector;
use crate::model::{DetectedVulnerability, Library};

/// Lockfile names and the OSV ecosystem their libraries belong to.
const LOCKFILE_ECOSYSTEMS: &[(&str, &str)] = &[
    ("Gemfile.lock", "RubyGems"),
    ("composer.lock", "Packagist"),
    ("package-lock.json", "npm"),
    ("yarn.lock", "npm"),
    ("Cargo.lock", "crates.io"),
    ("Pipfile.lock", "PyPI"),
    ("poetry.lock", "PyPI"),
    ("requirements.txt", "PyPI"),
    ("go.sum", "Go"),
    ("packages.lock.json", "NuGet"),
];

/// Returns the OSV ecosystem for an application file, based on its file name.
pub fn ecosystem_for_file(file_path: &str) -> Option<&'static str> {
    let file_name = Path::new(file_path).file_name()?.to_str()?;
    LOCKFILE_ECOSYSTEMS
        .iter()
        .find(|(name, _)| *name == file_name)
        .map(|(_, ecosystem)| *ecosystem)
}

/// Library detector backed by the OSV language ecosystem feeds.
pub struct OsvLibraryDetector {
    client: OsvClient,
}

impl OsvLibraryDetector {
    pub fn new(client: OsvClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LibraryDetector for OsvLibraryDetector {
    async fn detect(
        &self,
        file_path: &str,
        libraries: &[Library],
    ) -> Result<Vec<DetectedVulnerability>> {
        let ecosystem = ecosystem_for_file(file_path)
            .ok_or_else(|| anyhow!("unknown file type: {file_path}"))?;

        let queries: Vec<(&str, &str)> = libraries
            .iter()
            .map(|l| (l.name.as_str(), l.version.as_str()))
            .collect();
        self.client.query(ecosystem, &queries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_ecosystem_for_file() {
        assert_eq!(ecosystem_for_file("/app/Gemfile.lock"), Some("RubyGems"));
        assert_eq!(ecosystem_for_file("/app/composer.lock"), Some("Packagist"));
        assert_eq!(ecosystem_for_file("srv/web/yarn.lock"), Some("npm"));
        assert_eq!(ecosystem_for_file("Cargo.lock"), Some("crates.io"));
        assert_eq!(ecosystem_for_file("/go/src/app/go.sum"), Some("Go"));
    }

    #[test]
    fn test_ecosystem_for_unknown_file() {
        assert_eq!(ecosystem_for_file("/app/Gemfile"), None);
        assert_eq!(ecosystem_for_file("/app/composer-lock.json"), None);
        assert_eq!(ecosystem_for_file(""), None);
    }

    #[tokio::test]
    async fn test_detect_unknown_file_type_is_an_error() {
        let detector =
            OsvLibraryDetector::new(OsvClient::new().with_base_url("http://127.0.0.1:9"));
        let err = detector
            .detect("/app/unknown.lock", &[Library::new("foo", "1.0")])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("unknown file type"));
    }

    #[tokio::test]
    async fn test_detect_bundler_lockfile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/querybatch"))
            .and(body_partial_json(serde_json::json!({
                "queries": [{
                    "package": {"name": "rails", "ecosystem": "RubyGems"},
                    "version": "6.0"
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"vulns": [{"id": "CVE-2020-10000"}]}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/vulns/CVE-2020-10000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "CVE-2020-10000"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let detector = OsvLibraryDetector::new(OsvClient::new().with_base_url(server.uri()));
        let vulns = detector
            .detect("/app/Gemfile.lock", &[Library::new("rails", "6.0")])
            .await
            .unwrap();

        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].vulnerability_id, "CVE-2020-10000");
        assert_eq!(vulns[0].pkg_name, "rails");
    }
}
