//! Discovery, validation and registration of declarative queue sources.
//!
//! 每个配置源独立处理：校验失败或解析异常只影响该来源本身，扫描继续进行。
use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::{
    config::AppConfig,
    error::{DeploymentError, InvalidConfiguration, QueueError, Result},
    naming::NamingTree,
    queue::{check_destination, QueueDefinition},
    receivers,
    registry::{QueueRegistry, Registered},
    sender::SenderFactory,
};

/// Enumerates declarative source files under an application root.
pub trait ConfigDiscovery: Send + Sync {
    /// A root that does not exist yields no files rather than an error.
    fn glob_dir(&self, root: &Path, patterns: &[String]) -> anyhow::Result<Vec<PathBuf>>;
}

/// Structural and semantic check of one source before anything is read from it.
pub trait ConfigValidator: Send + Sync {
    fn validate_file(&self, path: &Path) -> std::result::Result<(), InvalidConfiguration>;
}

/// Reads the `(destination, type)` pairs out of a validated source.
pub trait DescriptorParser: Send + Sync {
    fn parse(&self, path: &Path) -> anyhow::Result<Vec<QueueDefinition>>;
}

/// Filesystem discovery. Patterns are root-relative, `/`-separated; `*` and `?` match within one
/// segment.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDiscovery;

impl ConfigDiscovery for FsDiscovery {
    fn glob_dir(&self, root: &Path, patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "application root missing; nothing to discover");
            return Ok(Vec::new());
        }
        let depth = patterns
            .iter()
            .map(|p| p.split('/').filter(|s| !s.is_empty()).count())
            .max()
            .unwrap_or(0);
        if depth == 0 {
            return Ok(Vec::new());
        }
        let mut found = BTreeSet::new();
        for entry in WalkDir::new(root).min_depth(1).max_depth(depth) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let rel: Vec<String> = entry
                .path()
                .strip_prefix(root)?
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if patterns.iter().any(|p| path_matches(p, &rel)) {
                found.insert(entry.into_path());
            }
        }
        Ok(found.into_iter().collect())
    }
}

fn path_matches(pattern: &str, rel: &[String]) -> bool {
    let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    parts.len() == rel.len()
        && parts
            .iter()
            .zip(rel)
            .all(|(p, seg)| wildcard_match(p, seg))
}

// 单段通配：`*` 任意长度，`?` 单个字符
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

pub const ROOT_ELEMENT: &str = "message-queues";

/// JSON queue descriptors:
/// `{"message-queues": [{"type": "OrderCreatedHandler", "destination": "orders/created"}]}`
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDescriptorFormat;

#[derive(Deserialize)]
struct DescriptorFile {
    #[serde(rename = "message-queues")]
    queues: Vec<DescriptorEntry>,
}

#[derive(Deserialize)]
struct DescriptorEntry {
    #[serde(rename = "type")]
    receiver_type: String,
    destination: String,
}

impl ConfigValidator for JsonDescriptorFormat {
    fn validate_file(&self, path: &Path) -> std::result::Result<(), InvalidConfiguration> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| InvalidConfiguration(format!("unreadable: {e}")))?;
        let doc: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| InvalidConfiguration(format!("malformed JSON: {e}")))?;
        let root = doc
            .as_object()
            .ok_or_else(|| InvalidConfiguration("document root must be an object".to_string()))?;
        let entries = root
            .get(ROOT_ELEMENT)
            .ok_or_else(|| InvalidConfiguration(format!("missing root element `{ROOT_ELEMENT}`")))?
            .as_array()
            .ok_or_else(|| InvalidConfiguration(format!("`{ROOT_ELEMENT}` must be an array")))?;
        for (i, entry) in entries.iter().enumerate() {
            for key in ["type", "destination"] {
                match entry.get(key).and_then(|v| v.as_str()) {
                    Some(v) if !v.is_empty() => {}
                    _ => {
                        return Err(InvalidConfiguration(format!(
                            "entry {i}: `{key}` must be a non-empty string"
                        )))
                    }
                }
            }
        }
        Ok(())
    }
}

impl DescriptorParser for JsonDescriptorFormat {
    fn parse(&self, path: &Path) -> anyhow::Result<Vec<QueueDefinition>> {
        let raw = std::fs::read_to_string(path)?;
        let file: DescriptorFile = serde_json::from_str(&raw)?;
        Ok(file
            .queues
            .into_iter()
            .map(|e| QueueDefinition::new(e.destination, e.receiver_type))
            .collect())
    }
}

/// Result of processing one discovered source.
#[derive(Debug)]
pub struct SourceOutcome {
    pub path: PathBuf,
    /// Number of queues registered from this source.
    pub result: std::result::Result<usize, DeploymentError>,
}

#[derive(Debug, Default)]
pub struct DeploymentReport {
    pub sources: Vec<SourceOutcome>,
}

impl DeploymentReport {
    pub fn registered(&self) -> usize {
        self.sources
            .iter()
            .filter_map(|s| s.result.as_ref().ok())
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeploymentError> {
        self.sources.iter().filter_map(|s| s.result.as_ref().err())
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Where registered definitions go: the application's registry and naming tree.
pub struct DeployTarget<'a> {
    pub registry: &'a QueueRegistry,
    pub naming: &'a NamingTree,
    pub factory: &'a Arc<SenderFactory>,
}

pub struct Deployer {
    discovery: Arc<dyn ConfigDiscovery>,
    validator: Arc<dyn ConfigValidator>,
    parser: Arc<dyn DescriptorParser>,
    patterns: Vec<String>,
    strict_receivers: bool,
}

impl fmt::Debug for Deployer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployer")
            .field("patterns", &self.patterns)
            .field("strict_receivers", &self.strict_receivers)
            .finish()
    }
}

impl Deployer {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            discovery: Arc::new(FsDiscovery),
            validator: Arc::new(JsonDescriptorFormat),
            parser: Arc::new(JsonDescriptorFormat),
            patterns: cfg.descriptor_patterns.clone(),
            strict_receivers: cfg.strict_receivers,
        }
    }

    pub fn with_discovery(mut self, discovery: Arc<dyn ConfigDiscovery>) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn ConfigValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn DescriptorParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Discover every source under `root` and register what each valid one declares.
    /// Only a failure to enumerate `root` itself is returned as an error.
    pub fn deploy(&self, root: &Path, target: &DeployTarget<'_>) -> Result<DeploymentReport> {
        let sources = self
            .discovery
            .glob_dir(root, &self.patterns)
            .map_err(|source| QueueError::Discovery {
                root: root.to_path_buf(),
                source,
            })?;
        let mut report = DeploymentReport::default();
        for path in sources {
            let result = self.deploy_source(&path, target);
            match &result {
                Ok(n) => {
                    tracing::debug!(source = %path.display(), queues = n, "queue source deployed")
                }
                Err(e @ DeploymentError::InvalidConfiguration { .. }) => {
                    tracing::error!(source = %path.display(), error = %e, "queue source failed validation");
                    tracing::error!(critical = true, source = %path.display(), "queues declared in this source are not deployed; dependent queues may be missing");
                }
                Err(e) => {
                    tracing::error!(source = %path.display(), error = %e, "failed to deploy queue source");
                }
            }
            report.sources.push(SourceOutcome { path, result });
        }
        tracing::info!(
            root = %root.display(),
            sources = report.sources.len(),
            registered = report.registered(),
            failed = report.failures().count(),
            "queue deployment finished"
        );
        Ok(report)
    }

    fn deploy_source(
        &self,
        path: &Path,
        target: &DeployTarget<'_>,
    ) -> std::result::Result<usize, DeploymentError> {
        self.validator
            .validate_file(path)
            .map_err(|e| DeploymentError::InvalidConfiguration {
                path: path.to_path_buf(),
                message: e.0,
            })?;
        let definitions = self
            .parser
            .parse(path)
            .map_err(|source| DeploymentError::Descriptor {
                path: path.to_path_buf(),
                source,
            })?;

        // 先整体检查再注册：一个来源要么全部生效，要么全部不生效
        for def in &definitions {
            check_destination(&def.destination).map_err(|reason| {
                DeploymentError::InvalidDefinition {
                    path: path.to_path_buf(),
                    reason,
                }
            })?;
            if !receivers::is_registered(&def.receiver_type) {
                if self.strict_receivers {
                    return Err(DeploymentError::UnknownReceiver {
                        path: path.to_path_buf(),
                        receiver: def.receiver_type.clone(),
                        destination: def.destination.clone(),
                    });
                }
                tracing::warn!(source = %path.display(), receiver = %def.receiver_type, destination = %def.destination, "receiver type is not declared in this binary");
            }
        }

        let mut count = 0;
        for def in definitions {
            if target.registry.register(def.to_descriptor()) == Registered::Kept {
                continue;
            }
            target
                .naming
                .bind(&def.destination, target.factory.clone())
                .map_err(|e| DeploymentError::InvalidDefinition {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::wildcard_match;

    #[test]
    fn wildcard_segments() {
        assert!(wildcard_match("*.json", "message-queues.json"));
        assert!(wildcard_match("message-queues.json", "message-queues.json"));
        assert!(wildcard_match("q?.json", "q1.json"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("*.json", "queues.xml"));
        assert!(!wildcard_match("q?.json", "q12.json"));
    }

    #[test]
    fn wildcard_counts_characters_not_bytes() {
        assert!(wildcard_match("q?.json", "qé.json"));
        assert!(wildcard_match("订单?.json", "订单表.json"));
        assert!(wildcard_match("*单.json", "订单.json"));
        assert!(!wildcard_match("q?.json", "qéé.json"));
    }
}
