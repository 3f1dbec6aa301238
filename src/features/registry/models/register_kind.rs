use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;

/// Every document register shares one schema; the kind tells them apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "register_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegisterKind {
    Certificates,
    CorrectiveActions,
    EnvironmentalGuidance,
    HseGuidance,
    ManagementReviews,
    Manuals,
    Procedures,
    RiskAssessments,
    TechnicalFiles,
    WorkInstructions,
    InterestedParties,
    SoaControls,
}

impl RegisterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegisterKind::Certificates => "certificates",
            RegisterKind::CorrectiveActions => "corrective_actions",
            RegisterKind::EnvironmentalGuidance => "environmental_guidance",
            RegisterKind::HseGuidance => "hse_guidance",
            RegisterKind::ManagementReviews => "management_reviews",
            RegisterKind::Manuals => "manuals",
            RegisterKind::Procedures => "procedures",
            RegisterKind::RiskAssessments => "risk_assessments",
            RegisterKind::TechnicalFiles => "technical_files",
            RegisterKind::WorkInstructions => "work_instructions",
            RegisterKind::InterestedParties => "interested_parties",
            RegisterKind::SoaControls => "soa_controls",
        }
    }

    /// Key of the cached default listing for this register
    pub fn cache_key(&self) -> String {
        format!("registers/{}", self.as_str())
    }

    /// Statement-of-applicability entries must carry a control reference
    pub fn requires_reference(&self) -> bool {
        matches!(self, RegisterKind::SoaControls)
    }
}

impl std::fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
