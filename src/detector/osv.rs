use crate::cache::Cache;
use crate::model::{DetectedVulnerability, Severity};
use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Public OSV API endpoint.
pub const DEFAULT_OSV_URL: &str = "https://api.osv.dev";

/// Maximum number of packages to query in a single batch request.
const BATCH_SIZE: usize = 100;

/// Upper bound on follow-up requests for paged batch results.
const MAX_PAGES: usize = 50;

/// Maximum number of vulnerability records fetched at once.
const MAX_CONCURRENT_FETCHES: usize = 8;

/// Client for the OSV batch query API.
///
/// The batch endpoint only reports vulnerability IDs, so every distinct ID
/// is then fetched from `/v1/vulns/{id}` for its severity, fixed version and
/// references. Per-package answers and vulnerability records are cached when
/// a [`Cache`] is attached.
#[derive(Clone)]
pub struct OsvClient {
    client: reqwest::Client,
    base_url: String,
    cache: Option<Cache>,
}

impl OsvClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_OSV_URL.to_string(),
            cache: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Looks up `(name, version)` pairs in one OSV ecosystem.
    ///
    /// Vulnerabilities are returned grouped by package, in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails or the response cannot be decoded.
    pub async fn query(
        &self,
        ecosystem: &str,
        packages: &[(&str, &str)],
    ) -> Result<Vec<DetectedVulnerability>> {
        let mut found: Vec<Option<Vec<DetectedVulnerability>>> = packages
            .iter()
            .map(|(name, version)| self.cached(&package_cache_key(ecosystem, name, version)))
            .collect();

        let misses: Vec<usize> = found
            .iter()
            .enumerate()
            .filter(|(_, hit)| hit.is_none())
            .map(|(idx, _)| idx)
            .collect();

        debug!(
            ecosystem,
            packages = packages.len(),
            uncached = misses.len(),
            "querying OSV"
        );

        for chunk in misses.chunks(BATCH_SIZE) {
            let batch: Vec<(&str, &str)> = chunk.iter().map(|&idx| packages[idx]).collect();
            let batch_ids = self.batch_query(ecosystem, &batch).await?;
            let records = self.fetch_vulns(batch_ids.iter().flatten()).await?;

            for (&idx, ids) in chunk.iter().zip(&batch_ids) {
                let (name, version) = packages[idx];
                let detected: Vec<DetectedVulnerability> = ids
                    .iter()
                    .filter_map(|id| records.get(id))
                    .map(|v| to_detected(v, name, version))
                    .collect();
                self.remember(&package_cache_key(ecosystem, name, version), &detected);
                found[idx] = Some(detected);
            }
        }

        Ok(found.into_iter().flatten().flatten().collect())
    }

    /// Returns the vulnerability IDs of each package, following page tokens
    /// until every package is exhausted.
    async fn batch_query(
        &self,
        ecosystem: &str,
        packages: &[(&str, &str)],
    ) -> Result<Vec<Vec<String>>> {
        let mut ids: Vec<Vec<String>> = vec![Vec::new(); packages.len()];
        let mut pending: Vec<(usize, Option<String>)> =
            (0..packages.len()).map(|idx| (idx, None)).collect();
        let mut pages = 0;

        while !pending.is_empty() {
            pages += 1;
            if pages > MAX_PAGES {
                bail!("OSV kept paging results after {MAX_PAGES} requests");
            }

            let queries = pending
                .iter()
                .map(|(idx, page_token)| {
                    let (name, version) = packages[*idx];
                    OsvBatchQueryItem {
                        package: OsvPackage {
                            name: name.to_string(),
                            ecosystem: ecosystem.to_string(),
                        },
                        version: version.to_string(),
                        page_token: page_token.clone(),
                    }
                })
                .collect();
            let results = self.send_batch(OsvBatchQuery { queries }).await?;

            let mut next = Vec::new();
            for ((idx, _), result) in pending.iter().zip(results) {
                ids[*idx].extend(result.vulns.into_iter().flatten().map(|v| v.id));
                if let Some(token) = result.next_page_token.filter(|t| !t.is_empty()) {
                    next.push((*idx, Some(token)));
                }
            }
            pending = next;
        }

        Ok(ids)
    }

    async fn send_batch(&self, query: OsvBatchQuery) -> Result<Vec<OsvBatchResult>> {
        let url = format!("{}/v1/querybatch", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&query)
            .send()
            .await
            .with_context(|| format!("OSV request to {url} failed"))?
            .error_for_status()
            .context("OSV returned an error status")?;

        let batch_response: OsvBatchResponse = response
            .json()
            .await
            .context("failed to decode OSV response")?;

        if batch_response.results.len() != query.queries.len() {
            bail!(
                "OSV returned {} results for {} queries",
                batch_response.results.len(),
                query.queries.len()
            );
        }

        Ok(batch_response.results)
    }

    /// Fetches the full record of each distinct vulnerability ID.
    async fn fetch_vulns<'a>(
        &self,
        ids: impl Iterator<Item = &'a String>,
    ) -> Result<HashMap<String, OsvVuln>> {
        let distinct: BTreeSet<String> = ids.cloned().collect();

        stream::iter(distinct)
            .map(|id: String| async move { self.fetch_vuln(&id).await.map(|v| (id, v)) })
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .try_collect()
            .await
    }

    async fn fetch_vuln(&self, id: &str) -> Result<OsvVuln> {
        let key = vuln_cache_key(id);
        if let Some(vuln) = self.cached(&key) {
            return Ok(vuln);
        }

        let url = format!("{}/v1/vulns/{id}", self.base_url);
        let vuln: OsvVuln = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("OSV request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("OSV returned an error status for {id}"))?
            .json()
            .await
            .with_context(|| format!("failed to decode OSV record {id}"))?;

        self.remember(&key, &vuln);
        Ok(vuln)
    }

    fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.cache.as_ref()?.get(key)
    }

    fn remember<T: Serialize>(&self, key: &str, value: &T) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(key, value) {
                debug!(error = %e, "failed to cache OSV response");
            }
        }
    }
}

impl Default for OsvClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Ecosystem and name are length-prefixed so no two packages share a key.
fn package_cache_key(ecosystem: &str, name: &str, version: &str) -> String {
    format!(
        "osv_pkg_{}_{ecosystem}_{}_{name}_{version}",
        ecosystem.len(),
        name.len()
    )
}

fn vuln_cache_key(id: &str) -> String {
    format!("osv_vuln_{id}")
}

#[derive(Serialize, Clone)]
struct OsvPackage {
    name: String,
    ecosystem: String,
}

#[derive(Serialize)]
struct OsvBatchQuery {
    queries: Vec<OsvBatchQueryItem>,
}

#[derive(Serialize)]
struct OsvBatchQueryItem {
    package: OsvPackage,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

#[derive(Deserialize)]
struct OsvBatchResponse {
    results: Vec<OsvBatchResult>,
}

#[derive(Deserialize)]
struct OsvBatchResult {
    vulns: Option<Vec<OsvBatchVuln>>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct OsvBatchVuln {
    id: String,
}

#[derive(Serialize, Deserialize)]
struct OsvVuln {
    id: String,
    summary: Option<String>,
    severity: Option<Vec<OsvSeverity>>,
    affected: Option<Vec<OsvAffected>>,
    references: Option<Vec<OsvReference>>,
}

#[derive(Serialize, Deserialize)]
struct OsvSeverity {
    score: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct OsvAffected {
    ranges: Option<Vec<OsvRange>>,
}

#[derive(Serialize, Deserialize)]
struct OsvRange {
    events: Option<Vec<OsvEvent>>,
}

#[derive(Serialize, Deserialize)]
struct OsvEvent {
    fixed: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct OsvReference {
    url: Option<String>,
}

fn to_detected(vuln: &OsvVuln, name: &str, version: &str) -> DetectedVulnerability {
    let reference_url = vuln
        .references
        .iter()
        .flatten()
        .find_map(|r| r.url.clone());

    DetectedVulnerability {
        vulnerability_id: vuln.id.clone(),
        pkg_name: name.to_string(),
        installed_version: version.to_string(),
        fixed_version: extract_fixed_version(vuln).unwrap_or_default(),
        severity: parse_severity(vuln),
        title: vuln.summary.clone(),
        reference_url,
    }
}

/// Parses CVSS score into a severity level.
///
/// Supports both numeric scores and CVSS vector strings.
pub fn parse_cvss_score(score: &str) -> Severity {
    if let Ok(cvss) = score.parse::<f32>() {
        return match cvss {
            s if s >= 9.0 => Severity::Critical,
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Medium,
            s if s > 0.0 => Severity::Low,
            _ => Severity::Unknown,
        };
    }

    // Vector strings carry no base score; approximate from the impact metrics.
    if score.contains("CVSS:") {
        if score.contains("/C:H") || score.contains("/I:H") || score.contains("/A:H") {
            return Severity::High;
        }
        if score.contains("/C:L") || score.contains("/I:L") || score.contains("/A:L") {
            return Severity::Medium;
        }
        return Severity::Low;
    }

    Severity::Unknown
}

fn parse_severity(vuln: &OsvVuln) -> Severity {
    vuln.severity
        .iter()
        .flatten()
        .filter_map(|sev| sev.score.as_deref())
        .map(parse_cvss_score)
        .find(|s| *s != Severity::Unknown)
        .unwrap_or(Severity::Unknown)
}

fn extract_fixed_version(vuln: &OsvVuln) -> Option<String> {
    vuln.affected.as_ref()?.iter().find_map(|affected| {
        affected.ranges.as_ref()?.iter().find_map(|range| {
            range
                .events
                .as_ref()?
                .iter()
                .find_map(|event| event.fixed.clone())
        })
    })
}
