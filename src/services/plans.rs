// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan permission table.
//!
//! Single source of truth for which plan unlocks which feature. Admins are
//! granted everything inside [`can_access_feature`] so call sites never need
//! their own bypass.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Plan, Role};

/// Plan-gated feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    VoiceCoach,
    Vlm,
    CreatePost,
}

impl Feature {
    pub const ALL: [Feature; 3] = [Feature::VoiceCoach, Feature::Vlm, Feature::CreatePost];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::VoiceCoach => "voiceCoach",
            Feature::Vlm => "vlm",
            Feature::CreatePost => "createPost",
        }
    }

    /// Accepts the camelCase key and the backend's snake_case key.
    pub fn parse(value: &str) -> Option<Feature> {
        match value {
            "voiceCoach" | "voice_coach" => Some(Feature::VoiceCoach),
            "vlm" => Some(Feature::Vlm),
            "createPost" | "create_post" => Some(Feature::CreatePost),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Feature::VoiceCoach => "AI Voice Coach",
            Feature::Vlm => "Hook Detector (VLM)",
            Feature::CreatePost => "AI Post Creator",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static (plan × feature) matrix.
fn plan_allows(plan: Plan, feature: Feature) -> bool {
    match (plan, feature) {
        (Plan::Starter, _) => false,
        (Plan::Professional, Feature::VoiceCoach) => true,
        (Plan::Professional, Feature::Vlm | Feature::CreatePost) => false,
        (Plan::Business, _) => true,
    }
}

/// Whether a user with `plan` and `role` may use `feature`.
///
/// A missing plan is treated as starter.
pub fn can_access_feature(plan: Option<Plan>, role: Role, feature: Feature) -> bool {
    if role.is_admin() {
        return true;
    }
    plan_allows(plan.unwrap_or(Plan::Starter), feature)
}

/// Plans that unlock `feature`, cheapest first.
pub fn required_plans(feature: Feature) -> Vec<Plan> {
    Plan::ALL
        .into_iter()
        .filter(|plan| plan_allows(*plan, feature))
        .collect()
}

pub fn plan_display_name(plan: Plan) -> &'static str {
    match plan {
        Plan::Starter => "Starter",
        Plan::Professional => "Professional",
        Plan::Business => "Business",
    }
}

/// Monthly price in USD.
pub fn plan_price(plan: Plan) -> u32 {
    match plan {
        Plan::Starter => 0,
        Plan::Professional => 19,
        Plan::Business => 49,
    }
}

/// Where plan selection continues: free plans go straight to the dashboard.
pub fn next_path_after_selection(plan: Plan) -> &'static str {
    match plan {
        Plan::Starter => "/dashboard",
        Plan::Professional | Plan::Business => "/payment",
    }
}

/// Body of a plan-restriction refusal.
#[derive(Debug, Clone, Serialize)]
pub struct UpgradePrompt {
    pub error: &'static str,
    pub message: String,
    pub feature: Feature,
    pub current_plan: Plan,
    pub required_plans: Vec<Plan>,
}

impl UpgradePrompt {
    pub fn new(plan: Option<Plan>, feature: Feature) -> Self {
        Self {
            error: "plan_restriction",
            message: format!("Upgrade your plan to access {}", feature.display_name()),
            feature,
            current_plan: plan.unwrap_or(Plan::Starter),
            required_plans: required_plans(feature),
        }
    }
}

/// Entry of the plan-selection catalog.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOffer {
    pub id: Plan,
    pub name: &'static str,
    pub price: u32,
    pub period: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub cta: &'static str,
    pub popular: bool,
}

pub fn plan_catalog() -> Vec<PlanOffer> {
    vec![
        PlanOffer {
            id: Plan::Starter,
            name: plan_display_name(Plan::Starter),
            price: plan_price(Plan::Starter),
            period: "/forever",
            description: "Perfect for individuals getting started with analytics",
            features: &[
                "1 social account",
                "Basic analytics dashboard",
                "7-day data history",
                "Weekly email reports",
                "Community support",
            ],
            cta: "Start Free",
            popular: false,
        },
        PlanOffer {
            id: Plan::Professional,
            name: plan_display_name(Plan::Professional),
            price: plan_price(Plan::Professional),
            period: "/month",
            description: "Best for creators handling multiple platforms",
            features: &[
                "Up to 5 social accounts",
                "Advanced AI insights",
                "90-day data history",
                "Custom reports & PDF export",
                "Best posting time analysis",
                "Competitor tracking",
                "AI Voice Coach",
                "Priority email support",
            ],
            cta: "Start Free Trial",
            popular: true,
        },
        PlanOffer {
            id: Plan::Business,
            name: plan_display_name(Plan::Business),
            price: plan_price(Plan::Business),
            period: "/month",
            description: "Built for teams and brand campaigns",
            features: &[
                "Unlimited social accounts",
                "Team collaboration (5 seats)",
                "1-year data history",
                "White-label reports",
                "API access",
                "Custom AI training",
                "AI Voice Coach",
                "Hook Detector (VLM)",
                "AI Post Creator",
                "Dedicated account manager",
                "24/7 priority support",
            ],
            cta: "Start Free Trial",
            popular: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_plan() -> impl Strategy<Value = Option<Plan>> {
        prop_oneof![
            Just(None),
            Just(Some(Plan::Starter)),
            Just(Some(Plan::Professional)),
            Just(Some(Plan::Business)),
        ]
    }

    fn any_feature() -> impl Strategy<Value = Feature> {
        prop_oneof![
            Just(Feature::VoiceCoach),
            Just(Feature::Vlm),
            Just(Feature::CreatePost),
        ]
    }

    proptest! {
        #[test]
        fn admin_sees_everything(plan in any_plan(), feature in any_feature()) {
            prop_assert!(can_access_feature(plan, Role::Admin, feature));
        }

        #[test]
        fn missing_plan_matches_starter(feature in any_feature(), role in prop_oneof![Just(Role::User), Just(Role::Banned)]) {
            prop_assert_eq!(
                can_access_feature(None, role, feature),
                can_access_feature(Some(Plan::Starter), role, feature)
            );
        }

        #[test]
        fn unknown_plan_strings_never_exceed_starter(raw in "[a-z]{0,12}", feature in any_feature()) {
            let plan = Plan::parse(&raw).unwrap_or(Plan::Starter);
            if Plan::parse(&raw).is_none() {
                prop_assert!(!can_access_feature(Some(plan), Role::User, feature));
            }
        }
    }

    #[test]
    fn test_matrix() {
        use Feature::*;
        let user = Role::User;
        assert!(!can_access_feature(Some(Plan::Starter), user, VoiceCoach));
        assert!(!can_access_feature(Some(Plan::Starter), user, Vlm));
        assert!(can_access_feature(Some(Plan::Professional), user, VoiceCoach));
        assert!(!can_access_feature(Some(Plan::Professional), user, Vlm));
        assert!(can_access_feature(Some(Plan::Business), user, Vlm));
        assert!(can_access_feature(Some(Plan::Business), user, CreatePost));
    }

    #[test]
    fn test_required_plans() {
        assert_eq!(
            required_plans(Feature::VoiceCoach),
            vec![Plan::Professional, Plan::Business]
        );
        assert_eq!(required_plans(Feature::Vlm), vec![Plan::Business]);
    }

    #[test]
    fn test_upgrade_prompt_for_starter_voice_coach() {
        let prompt = UpgradePrompt::new(Some(Plan::Starter), Feature::VoiceCoach);
        assert_eq!(prompt.message, "Upgrade your plan to access AI Voice Coach");
        assert_eq!(prompt.current_plan, Plan::Starter);
    }

    #[test]
    fn test_catalog_prices_match_table() {
        for offer in plan_catalog() {
            assert_eq!(offer.price, plan_price(offer.id));
        }
        assert_eq!(next_path_after_selection(Plan::Starter), "/dashboard");
        assert_eq!(next_path_after_selection(Plan::Business), "/payment");
    }

    #[test]
    fn test_feature_keys() {
        for feature in Feature::ALL {
            assert_eq!(Feature::parse(feature.as_str()), Some(feature));
        }
        assert_eq!(Feature::parse("voice_coach"), Some(Feature::VoiceCoach));
        assert_eq!(Feature::parse("teleport"), None);
    }
}
