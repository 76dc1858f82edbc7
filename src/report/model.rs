use serde::{Deserialize, Serialize};

/// Severity level reported by the backend for a vulnerability.
///
/// The four known levels drive the chart buckets. Anything else the
/// backend sends (e.g. "Info") is kept verbatim so it can still be shown
/// in the table, but it is not tallied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Other(raw) => raw,
        }
    }

    /// Chart bucket for this severity, `None` for unrecognised levels.
    pub fn bucket(&self) -> Option<usize> {
        match self {
            Severity::Critical => Some(0),
            Severity::High => Some(1),
            Severity::Medium => Some(2),
            Severity::Low => Some(3),
            Severity::Other(_) => None,
        }
    }
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        // Case-sensitive, the backend emits the capitalised names.
        match raw.as_str() {
            "Critical" => Severity::Critical,
            "High" => Severity::High,
            "Medium" => Severity::Medium,
            "Low" => Severity::Low,
            _ => Severity::Other(raw),
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single vulnerability found by one of the backend's scanner modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub severity: Severity,

    /// Scanner module that produced it, e.g. "Prompt Injection"
    pub module: String,

    /// Short title
    pub name: String,

    /// Raw model output or probe that demonstrates the issue
    pub evidence: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,

    /// e.g. "LLM01: Prompt Injection"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owasp_category: Option<String>,
}

/// Result of one scan as returned by `POST /api/v1/scan`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub risk_score: f64,
    pub failed_tests: u32,
    pub passed_tests: u32,
    pub vulnerabilities: Vec<Vulnerability>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tests: Option<u32>,

    /// Backend timestamp of the scan, used to find it again in the history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub target_metadata: serde_json::Map<String, serde_json::Value>,

    /// Explicit history index, when the backend provides one
    #[serde(default, alias = "scan_index", skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<usize>,
}

/// One element of `GET /api/v1/history`.
///
/// The client treats entries as opaque; only the timestamp is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntry(pub serde_json::Value);

impl HistoryEntry {
    pub fn timestamp(&self) -> Option<&str> {
        self.0.get("timestamp").and_then(|v| v.as_str())
    }

    pub fn risk_score(&self) -> Option<f64> {
        self.0.get("risk_score").and_then(|v| v.as_f64())
    }

    pub fn failed_tests(&self) -> Option<u64> {
        self.0.get("failed_tests").and_then(|v| v.as_u64())
    }

    pub fn passed_tests(&self) -> Option<u64> {
        self.0.get("passed_tests").and_then(|v| v.as_u64())
    }

    pub fn vulnerability_count(&self) -> Option<usize> {
        self.0
            .get("vulnerabilities")
            .and_then(|v| v.as_array())
            .map(|a| a.len())
    }
}

/// Mitigation report from `GET /api/v1/mitigations/{index}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationReport {
    pub summary: MitigationSummary,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationSummary {
    pub total_vulnerabilities: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// OWASP category the controls apply to
    pub category: String,
    pub strategy: String,
    #[serde(default)]
    pub controls: Vec<String>,
    #[serde(default)]
    pub affected_vulnerabilities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_result_from_backend_payload() {
        let json = r#"{
            "target_metadata": {"type": "mock", "model": "mock-llm-v1"},
            "timestamp": "2026-10-16T09:12:44.120311",
            "risk_score": 27.0,
            "vulnerabilities": [
                {
                    "module": "Prompt Injection",
                    "name": "Direct Instruction Override",
                    "severity": "Critical",
                    "description": "Model followed injected instructions",
                    "evidence": "PWNED",
                    "mitigation": "Isolate system prompts",
                    "owasp_category": "LLM01: Prompt Injection",
                    "timestamp": "2026-10-16T09:12:40.000000"
                },
                {
                    "module": "Overreliance",
                    "name": "Unhedged answer",
                    "severity": "Info",
                    "description": "",
                    "evidence": "Yes.",
                    "mitigation": "",
                    "owasp_category": "LLM09: Overreliance"
                }
            ],
            "passed_tests": 7,
            "failed_tests": 2,
            "total_tests": 9
        }"#;

        let result: ScanResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.risk_score, 27.0);
        assert_eq!(result.total_tests, Some(9));
        assert_eq!(result.scan_id, None);
        assert_eq!(result.vulnerabilities[0].severity, Severity::Critical);
        assert_eq!(
            result.vulnerabilities[1].severity,
            Severity::Other("Info".to_string())
        );
        assert_eq!(result.target_metadata["model"], "mock-llm-v1");
    }

    #[test]
    fn test_minimal_payload_and_scan_index_alias() {
        let json = r#"{"risk_score": 0, "failed_tests": 0, "passed_tests": 9,
                       "vulnerabilities": [], "scan_index": 4}"#;
        let result: ScanResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.scan_id, Some(4));
        assert!(result.timestamp.is_none());
        assert!(result.vulnerabilities.is_empty());
    }

    #[test]
    fn test_severity_keeps_unknown_text() {
        let sev: Severity = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(sev, Severity::Other("critical".to_string()));
        assert_eq!(sev.bucket(), None);
        assert_eq!(serde_json::to_string(&sev).unwrap(), "\"critical\"");
        assert_eq!(Severity::Low.bucket(), Some(3));
    }

    #[test]
    fn test_history_entry_accessors() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"timestamp": "t1", "risk_score": 12.5, "failed_tests": 1,
                "passed_tests": 8, "vulnerabilities": [{}, {}]}"#,
        )
        .unwrap();
        assert_eq!(entry.timestamp(), Some("t1"));
        assert_eq!(entry.risk_score(), Some(12.5));
        assert_eq!(entry.vulnerability_count(), Some(2));

        let opaque = HistoryEntry(serde_json::json!(["not", "an", "object"]));
        assert_eq!(opaque.timestamp(), None);
    }
}
