//! Government scheme and loan matching by land holding and crop.

use async_trait::async_trait;

use super::{AdvisoryAgent, AgentResult};
use crate::domain::{
    AdvisoryRequest, AgentId, FinancePolicyDetails, LoanMatch, RawRecommendation, RiskLevel,
    SchemeMatch,
};

const MAX_TASKS: usize = 6;
const TOP_SCHEMES: usize = 5;
const TOP_LOANS: usize = 3;
/// Keyword relevance needed for a non-eligible entry to be listed.
const KEYWORD_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FarmerCategory {
    Marginal,
    Small,
    Medium,
    Large,
}

impl FarmerCategory {
    fn from_holding(hectares: f64) -> Self {
        if hectares <= 1.0 {
            FarmerCategory::Marginal
        } else if hectares <= 2.0 {
            FarmerCategory::Small
        } else if hectares <= 5.0 {
            FarmerCategory::Medium
        } else {
            FarmerCategory::Large
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            FarmerCategory::Marginal => "marginal",
            FarmerCategory::Small => "small",
            FarmerCategory::Medium => "medium",
            FarmerCategory::Large => "large",
        }
    }

    fn smallholder(self) -> bool {
        matches!(self, FarmerCategory::Marginal | FarmerCategory::Small)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemeKind {
    IncomeSupport,
    Insurance,
    Credit,
    Subsidy,
    Testing,
}

struct Scheme {
    id: &'static str,
    name: &'static str,
    benefit_amount: &'static str,
    application_process: &'static str,
    eligibility: &'static [&'static str],
    keywords: &'static [&'static str],
    kind: SchemeKind,
}

const SCHEMES: &[Scheme] = &[
    Scheme {
        id: "pm_kisan",
        name: "PM-KISAN",
        benefit_amount: "Rs. 6000 per year",
        application_process: "Online through PM-KISAN portal",
        eligibility: &["Small and marginal farmers", "Landholding up to 2 hectares"],
        keywords: &["income support", "direct benefit", "small farmers", "marginal farmers"],
        kind: SchemeKind::IncomeSupport,
    },
    Scheme {
        id: "pm_fasal_bima",
        name: "PM Fasal Bima Yojana",
        benefit_amount: "Up to 100% of sum insured",
        application_process: "Through banks or insurance companies",
        eligibility: &["All farmers", "All crops"],
        keywords: &["crop insurance", "natural calamities", "risk protection", "insurance"],
        kind: SchemeKind::Insurance,
    },
    Scheme {
        id: "kisan_credit_card",
        name: "Kisan Credit Card",
        benefit_amount: "Up to Rs. 3 lakhs",
        application_process: "Through banks and cooperative societies",
        eligibility: &["All farmers", "Good credit history"],
        keywords: &["credit", "loan", "agricultural finance", "banking"],
        kind: SchemeKind::Credit,
    },
    Scheme {
        id: "pm_ksy",
        name: "PM-KSY (Kisan Sampada Yojana)",
        benefit_amount: "Up to 50% subsidy on project cost",
        application_process: "Online through Ministry of Food Processing",
        eligibility: &["Farmers", "FPOs", "Agri-entrepreneurs"],
        keywords: &["food processing", "value addition", "agri-business", "subsidy"],
        kind: SchemeKind::Subsidy,
    },
    Scheme {
        id: "soil_health_card",
        name: "Soil Health Card Scheme",
        benefit_amount: "Free soil testing",
        application_process: "Through agriculture department",
        eligibility: &["All farmers"],
        keywords: &["soil testing", "soil health", "nutrient management", "free"],
        kind: SchemeKind::Testing,
    },
    Scheme {
        id: "pm_ksn",
        name: "PM-KSN (Kisan Samman Nidhi)",
        benefit_amount: "Additional Rs. 2000 per year",
        application_process: "Automatic for PM-KISAN beneficiaries",
        eligibility: &["PM-KISAN beneficiaries"],
        keywords: &["additional support", "income", "pm-kisan", "benefit"],
        kind: SchemeKind::IncomeSupport,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoanKind {
    Term,
    Crop,
    Livestock,
    Equipment,
}

struct Loan {
    id: &'static str,
    name: &'static str,
    interest_rate: &'static str,
    tenure: &'static str,
    amount: &'static str,
    keywords: &'static [&'static str],
    kind: LoanKind,
}

const LOANS: &[Loan] = &[
    Loan {
        id: "agricultural_term_loan",
        name: "Agricultural Term Loan",
        interest_rate: "8.5% - 12%",
        tenure: "3-15 years",
        amount: "Up to Rs. 10 lakhs",
        keywords: &["term loan", "long term", "investment", "land"],
        kind: LoanKind::Term,
    },
    Loan {
        id: "crop_loan",
        name: "Crop Loan",
        interest_rate: "7% - 9%",
        tenure: "6-18 months",
        amount: "Up to Rs. 3 lakhs",
        keywords: &["crop", "short term", "production", "seasonal"],
        kind: LoanKind::Crop,
    },
    Loan {
        id: "dairy_loan",
        name: "Dairy Loan",
        interest_rate: "8% - 11%",
        tenure: "3-7 years",
        amount: "Up to Rs. 5 lakhs",
        keywords: &["dairy", "livestock", "animal husbandry", "farming"],
        kind: LoanKind::Livestock,
    },
    Loan {
        id: "farm_mechanization_loan",
        name: "Farm Mechanization Loan",
        interest_rate: "9% - 13%",
        tenure: "3-8 years",
        amount: "Up to Rs. 15 lakhs",
        keywords: &["machinery", "equipment", "mechanization", "tractor"],
        kind: LoanKind::Equipment,
    },
];

struct Profile {
    holding: f64,
    category: FarmerCategory,
    stage: String,
    context: Vec<String>,
    eligible_schemes: Vec<&'static str>,
    eligible_loans: Vec<&'static str>,
}

impl Profile {
    fn from_request(request: &AdvisoryRequest) -> Self {
        let p = &request.profile;
        let holding = p.farm_size_hectares.unwrap_or_default();
        let crop = p.crop_key();

        let mut eligible_schemes = Vec::new();
        if holding <= 2.0 {
            eligible_schemes.push("pm_kisan");
        }
        eligible_schemes.extend(["pm_fasal_bima", "soil_health_card", "kisan_credit_card"]);
        if matches!(crop.as_str(), "wheat" | "rice" | "maize") {
            eligible_schemes.push("pm_ksy");
        }

        let context = std::iter::once(crop)
            .chain(
                [&p.farming_practice, &p.irrigation_type, &p.growth_stage]
                    .into_iter()
                    .flatten()
                    .map(|s| s.trim().to_lowercase()),
            )
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            holding,
            category: FarmerCategory::from_holding(holding),
            stage: p.stage_key(),
            context,
            eligible_schemes,
            eligible_loans: vec!["crop_loan", "agricultural_term_loan"],
        }
    }

    /// Share of `keywords` that overlap the request context, capped at 1.
    fn keyword_relevance(&self, keywords: &[&str]) -> f64 {
        if keywords.is_empty() {
            return 0.0;
        }
        let matches = self
            .context
            .iter()
            .flat_map(|c| keywords.iter().map(move |k| (c, k)))
            .filter(|(c, k)| c.contains(*k) || k.contains(c.as_str()))
            .count();
        (matches as f64 / keywords.len() as f64).min(1.0)
    }

    fn scheme_relevance(&self, scheme: &Scheme) -> f64 {
        let mut points = 5 + 3;
        if self.category.smallholder() && scheme.kind == SchemeKind::IncomeSupport {
            points += 2;
        }
        if scheme.kind == SchemeKind::Insurance {
            points += 1;
        }
        f64::from(points.min(10)) / 10.0
    }

    fn loan_relevance(&self, loan: &Loan) -> f64 {
        let mut points = 5;
        if loan.kind == LoanKind::Crop && matches!(self.stage.as_str(), "sowing" | "vegetative") {
            points += 3;
        }
        if loan.kind == LoanKind::Term && !self.category.smallholder() {
            points += 2;
        }
        if loan.kind == LoanKind::Equipment && self.holding > 5.0 {
            points += 2;
        }
        f64::from(points.min(10)) / 10.0
    }
}

fn match_schemes(profile: &Profile) -> Vec<(&'static Scheme, f64)> {
    let mut matched: Vec<(&'static Scheme, f64)> = profile
        .eligible_schemes
        .iter()
        .filter_map(|id| SCHEMES.iter().find(|s| s.id == *id))
        .map(|s| (s, profile.scheme_relevance(s)))
        .collect();
    for scheme in SCHEMES {
        if profile.eligible_schemes.contains(&scheme.id) {
            continue;
        }
        let relevance = profile.keyword_relevance(scheme.keywords);
        if relevance > KEYWORD_THRESHOLD {
            matched.push((scheme, relevance));
        }
    }
    matched.sort_by(|a, b| b.1.total_cmp(&a.1));
    matched.truncate(TOP_SCHEMES);
    matched
}

fn match_loans(profile: &Profile) -> Vec<(&'static Loan, f64)> {
    let mut matched: Vec<(&'static Loan, f64)> = profile
        .eligible_loans
        .iter()
        .filter_map(|id| LOANS.iter().find(|l| l.id == *id))
        .map(|l| (l, profile.loan_relevance(l)))
        .collect();
    for loan in LOANS {
        if profile.eligible_loans.contains(&loan.id) {
            continue;
        }
        let relevance = profile.keyword_relevance(loan.keywords);
        if relevance > KEYWORD_THRESHOLD {
            matched.push((loan, relevance));
        }
    }
    matched.sort_by(|a, b| b.1.total_cmp(&a.1));
    matched.truncate(TOP_LOANS);
    matched
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FinancePolicyAgent;

#[async_trait]
impl AdvisoryAgent for FinancePolicyAgent {
    fn id(&self) -> AgentId {
        AgentId::FinancePolicy
    }

    async fn invoke(&self, request: &AdvisoryRequest) -> AgentResult<RawRecommendation> {
        let profile = Profile::from_request(request);
        let schemes = match_schemes(&profile);
        let loans = match_loans(&profile);

        let mut tasks = Vec::new();
        let mut explanation = Vec::new();
        if let Some((top, _)) = schemes.first() {
            tasks.push(format!("Apply for {} - {}", top.name, top.benefit_amount));
            tasks.push(format!("Application process: {}", top.application_process));
            tasks.push(format!(
                "Check eligibility: {}",
                top.eligibility
                    .iter()
                    .take(2)
                    .copied()
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            explanation.push(format!("Top scheme: {} ({}).", top.name, top.benefit_amount));
        }
        if let Some((top, _)) = loans.first() {
            tasks.push(format!(
                "Consider {} - Interest rate: {}",
                top.name, top.interest_rate
            ));
            tasks.push(format!("Loan amount: {}, Tenure: {}", top.amount, top.tenure));
            explanation.push(format!(
                "Recommended loan: {} at {} interest.",
                top.name, top.interest_rate
            ));
        }
        tasks.push("Visit nearest bank branch for detailed information".to_string());
        tasks.push(
            "Keep required documents ready (Aadhaar, land records, bank passbook)".to_string(),
        );
        tasks.push("Check online portals for scheme updates".to_string());
        tasks.truncate(MAX_TASKS);
        explanation.push(format!(
            "Found {} relevant schemes and {} loan options.",
            schemes.len(),
            loans.len()
        ));

        let p = &request.profile;
        let priority = match p.farm_size_hectares {
            Some(size) if size <= 2.0 => 8,
            _ => 6,
        };
        let mut confidence: f64 = 0.8;
        if p.farm_size_hectares.is_some() {
            confidence += 0.1;
        }
        if p.state.is_some() {
            confidence += 0.1;
        }

        let details = FinancePolicyDetails {
            farmer_category: Some(profile.category.as_str().to_string()),
            schemes: schemes
                .iter()
                .map(|(s, relevance)| SchemeMatch {
                    name: s.name.to_string(),
                    benefit_amount: s.benefit_amount.to_string(),
                    relevance_score: *relevance,
                })
                .collect(),
            loans: loans
                .iter()
                .map(|(l, relevance)| LoanMatch {
                    name: l.name.to_string(),
                    interest_rate: l.interest_rate.to_string(),
                    relevance_score: *relevance,
                })
                .collect(),
            ..Default::default()
        };

        Ok(RawRecommendation::new(
            AgentId::FinancePolicy,
            priority,
            confidence.min(1.0),
            format!(
                "Financial schemes and loan opportunities for {} farming",
                p.crop
            ),
        )
        .with_explanation(explanation.join(" "))
        .with_sources([
            "Government Schemes Database",
            "Banking Regulations",
            "Agricultural Policy Database",
        ])
        .with_tasks(tasks)
        .with_risk(RiskLevel::Low)
        .with_impact("positive")
        .with_details(&details))
    }
}
