use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

// Flag data as served by the flag source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "is_enabled")]
    pub enabled: bool,
}

// Targeting rule as served by the rule source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetingRule {
    pub flag_name: String,
    #[serde(rename = "is_enabled")]
    pub enabled: bool,
    #[serde(rename = "rules")]
    pub rule: RuleBody,
}

// The nested rule object. `value` stays dynamic on the wire; the only
// defined kind is "PERCENTAGE" and anything else fails closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: serde_json::Value,
}

impl RuleBody {
    /// Coerce the rule into a rollout percentage. Returns `None` for unknown
    /// kinds or non-numeric values, which the evaluator treats as a non-match.
    pub fn percentage(&self) -> Option<f64> {
        if self.kind != "PERCENTAGE" {
            return None;
        }
        self.value.as_f64()
    }
}

// The unit stored in the cache. A cached entry always carries the flag;
// the rule is optional (no segmentation configured).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedFlagInfo {
    pub flag: FlagConfig,
    pub rule: Option<TargetingRule>,
}

/// Evaluate whether the flag is on for this user
pub fn evaluate(info: &CombinedFlagInfo, user_id: &str) -> bool {
    // Step 1: The global kill switch dominates everything
    if !info.flag.enabled {
        return false;
    }

    // Step 2: No rule (or a disabled rule) means no segmentation,
    // so the flag's global state wins
    let rule = match &info.rule {
        Some(r) if r.enabled => r,
        _ => return true,
    };

    // Step 3: Unrecognized or malformed rules fail closed
    let percentage = match rule.rule.percentage() {
        Some(p) => p,
        None => return false,
    };

    // Step 4: Deterministic percentage rollout. Strict less-than, so 0
    // admits nobody and 100 admits everybody (buckets are 0..=99).
    let user_bucket = bucket(&format!("{}{}", user_id, info.flag.name));
    (user_bucket as f64) < percentage
}

/// Map a string onto a stable bucket in [0, 100).
/// The same input always lands in the same bucket, across restarts and
/// across processes, so rollout cohorts never shuffle.
pub fn bucket(input: &str) -> u32 {
    let digest = Sha1::digest(input.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    prefix % 100
}
