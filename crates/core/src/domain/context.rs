use serde::{Deserialize, Serialize};

/// Coarse project-size bucket driving which ticket band applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Small,
    Standard,
    Enterprise,
}

impl Scale {
    pub fn key(&self) -> &'static str {
        match self {
            Scale::Small => "small",
            Scale::Standard => "standard",
            Scale::Enterprise => "enterprise",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientProfile {
    Freelancer,
    SmallBusiness,
    Agency,
    Startup,
    Enterprise,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftwareComplexity {
    Low,
    Medium,
    High,
}

/// Advisory complexity signals detected for software-sector descriptions.
/// Not used by pricing directly; exposed for downstream consumers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoftwareProfile {
    pub score: u32,
    pub complexity: SoftwareComplexity,
    pub has_web_admin: bool,
    pub has_mobile_app: bool,
    pub mentions_external_api: bool,
    pub mentions_analytics: bool,
    pub named_integrations: Vec<String>,
    pub is_saas: bool,
}

/// Structured signals extracted from a free-text project description.
///
/// Every field is optional: absence means "no adjustment", never zero.
/// Multiplier fields, when present, are strictly positive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub scale_hint: Option<Scale>,
    pub urgency_multiplier: Option<f64>,
    pub urgency_reason: Option<String>,
    pub timeline_weeks: Option<u32>,
    pub location_hint: Option<String>,
    pub location_multiplier: Option<f64>,
    pub region: Option<String>,
    pub client_profile: Option<ClientProfile>,
    pub project_type: Option<String>,
    pub fluctuation_warning: Option<String>,
    pub software_profile: Option<SoftwareProfile>,
}

#[cfg(test)]
mod tests {
    use super::ProjectContext;

    #[test]
    fn default_context_carries_no_adjustments() {
        let context = ProjectContext::default();
        assert!(context.scale_hint.is_none());
        assert!(context.urgency_multiplier.is_none());
        assert!(context.location_multiplier.is_none());
    }
}
