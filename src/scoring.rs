use crate::data::{AnswerSet, Category, PlanOffer};

pub const DEFAULT_INCOME: u64 = 500_000;
pub const DEFAULT_AGE: u32 = 30;
pub const DEFAULT_FAMILY_SIZE: u32 = 1;
pub const DEFAULT_VEHICLE_VALUE: u64 = 800_000;
pub const DEFAULT_VEHICLE_AGE: u32 = 0;

const HEALTH_MIN_COVER: u64 = 300_000;
const HEALTH_MAX_COVER: u64 = 1_000_000;
const TERM_MAX_COVER: u64 = 10_000_000;

/// Rank plans for a category. Pure: identical answers give identical offers.
pub fn recommend(category: Category, answers: &AnswerSet) -> Vec<PlanOffer> {
    match category {
        Category::Health => health_plans(&HealthProfile::from_answers(answers)),
        Category::Term => term_plans(&TermProfile::from_answers(answers)),
        Category::Vehicle => vehicle_plans(&VehicleProfile::from_answers(answers)),
    }
}

/// Like [`recommend`], for a category name received from outside. Names that
/// do not match a category get the single generic offer.
pub fn recommend_for(insurance_type: &str, answers: &AnswerSet) -> Vec<PlanOffer> {
    match insurance_type.parse::<Category>() {
        Ok(category) => recommend(category, answers),
        Err(_) => {
            tracing::warn!(insurance_type, "Unrecognized category, using generic offer");
            vec![fallback_offer()]
        }
    }
}

pub fn fallback_offer() -> PlanOffer {
    PlanOffer {
        id: "generic_plan".into(),
        name: "Recommended Insurance Plan".into(),
        provider: "Partner Insurer".into(),
        coverage: "As per your requirements".into(),
        premium: 10_000,
        highlights: strings(&[
            "Personalized recommendation",
            "Based on your profile",
            "Competitive rates",
        ]),
        rating: 4.3,
        link: None,
    }
}

fn amount_or(answers: &AnswerSet, question_id: &str, default: u64) -> u64 {
    answers
        .number(question_id)
        .filter(|v| *v >= 0.0)
        .map(|v| v.floor() as u64)
        .unwrap_or(default)
}

fn years_or(answers: &AnswerSet, question_id: &str, default: u32) -> u32 {
    answers
        .integer(question_id)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

/// `value * percent / 100`, rounded down and capped at `u64::MAX`.
fn scale(value: u64, percent: u64) -> u64 {
    let scaled = u128::from(value) * u128::from(percent) / 100;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq)]
struct HealthProfile {
    income: u64,
    family_size: u32,
    age: u32,
}

impl HealthProfile {
    fn from_answers(answers: &AnswerSet) -> Self {
        Self {
            income: amount_or(answers, "annualIncome", DEFAULT_INCOME),
            family_size: years_or(answers, "familySize", DEFAULT_FAMILY_SIZE),
            age: years_or(answers, "age", DEFAULT_AGE),
        }
    }
}

fn health_plans(profile: &HealthProfile) -> Vec<PlanOffer> {
    let cover = profile
        .income
        .saturating_mul(2)
        .clamp(HEALTH_MIN_COVER, HEALTH_MAX_COVER);
    let premium = cover * 2 / 100;
    let family = profile.family_size > 1;

    let shield = vec![
        "Cashless treatment at 5000+ hospitals".to_string(),
        if profile.age > 40 {
            "Free annual health check-up".to_string()
        } else {
            "No medical check-up up to 45 years".to_string()
        },
        if family {
            format!("Family floater for {} members", profile.family_size)
        } else {
            "Individual cover with no co-payment".to_string()
        },
        "Covers pre-existing diseases after 3 years".to_string(),
    ];

    let essential = vec![
        "Affordable premiums".to_string(),
        if profile.age > 35 {
            "Pre-existing diseases covered after 1 year".to_string()
        } else {
            "Wellness rewards for a healthy lifestyle".to_string()
        },
        "Day care procedures covered".to_string(),
        if family {
            "Add family members at renewal".to_string()
        } else {
            "Lifelong renewability".to_string()
        },
    ];

    let optima = vec![
        if profile.family_size > 2 {
            "Coverage for the entire family".to_string()
        } else {
            "Restoration of sum insured".to_string()
        },
        "Pre & post hospitalization cover".to_string(),
        if profile.age > 40 {
            "No room rent limit".to_string()
        } else {
            "Cumulative bonus up to 100%".to_string()
        },
        "Free annual health check-up".to_string(),
    ];

    vec![
        PlanOffer {
            id: "health_max_bupa".into(),
            name: "Comprehensive Health Shield".into(),
            provider: "Max Bupa".into(),
            coverage: format_inr(cover),
            premium,
            highlights: shield,
            rating: 4.5,
            link: None,
        },
        PlanOffer {
            id: "health_star".into(),
            name: "Essential Health Care".into(),
            provider: "Star Health".into(),
            coverage: format_inr(scale(cover, 80)),
            premium: scale(premium, 80),
            highlights: essential,
            rating: 4.2,
            link: None,
        },
        PlanOffer {
            id: "health_hdfc_ergo".into(),
            name: "Family Health Optima".into(),
            provider: "HDFC ERGO".into(),
            coverage: format_inr(scale(cover, 120)),
            premium: scale(premium, 120),
            highlights: optima,
            rating: 4.3,
            link: None,
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
struct TermProfile {
    income: u64,
    age: u32,
    smoker: bool,
}

impl TermProfile {
    fn from_answers(answers: &AnswerSet) -> Self {
        Self {
            income: amount_or(answers, "annualIncome", DEFAULT_INCOME),
            age: years_or(answers, "age", DEFAULT_AGE),
            smoker: answers.get("smoker") == Some("Yes"),
        }
    }

    fn cover_multiple(&self) -> u64 {
        match self.age {
            a if a < 35 => 15,
            a if a < 45 => 12,
            _ => 10,
        }
    }

    /// Premium loading in tenths.
    fn age_factor(&self) -> u64 {
        match self.age {
            a if a < 30 => 8,
            a if a < 40 => 12,
            _ => 18,
        }
    }
}

fn term_plans(profile: &TermProfile) -> Vec<PlanOffer> {
    let cover = profile
        .income
        .saturating_mul(profile.cover_multiple())
        .min(TERM_MAX_COVER);
    // cover x 0.001 x factor/10
    let premium = cover * profile.age_factor() / 10_000;

    let rates = if profile.smoker {
        "Smoker rates with quit-smoking benefit"
    } else {
        "Special rates for non-smokers"
    };
    let stage = if profile.age < 35 {
        "Option to increase cover at key life stages"
    } else {
        "Terminal illness benefit"
    };

    vec![
        PlanOffer {
            id: "term_icici_pru".into(),
            name: "iSecure Smart".into(),
            provider: "ICICI Prudential".into(),
            coverage: format_inr(cover),
            premium,
            highlights: strings(&[
                "Life cover up to 85 years of age",
                stage,
                rates,
                "Tax benefits under Section 80C",
            ]),
            rating: 4.7,
            link: None,
        },
        PlanOffer {
            id: "term_hdfc_life".into(),
            name: "Click 2 Protect Life".into(),
            provider: "HDFC Life".into(),
            coverage: format_inr(scale(cover, 90)),
            premium: scale(premium, 90),
            highlights: strings(&[
                "Choice of death benefit payout options",
                rates,
                "Optional critical illness cover",
                "Return of premium option",
            ]),
            rating: 4.4,
            link: None,
        },
        PlanOffer {
            id: "term_max_life".into(),
            name: "Smart Term Plan".into(),
            provider: "Max Life".into(),
            coverage: format_inr(scale(cover, 110)),
            premium: scale(premium, 110),
            highlights: strings(&[
                "98.74% claim settlement ratio",
                stage,
                "Flexibility to increase cover",
                "Optional accidental death benefit",
            ]),
            rating: 4.3,
            link: None,
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
struct VehicleProfile {
    value: u64,
    vehicle_age: u32,
    driver_age: u32,
}

impl VehicleProfile {
    fn from_answers(answers: &AnswerSet) -> Self {
        Self {
            value: amount_or(answers, "vehicleValue", DEFAULT_VEHICLE_VALUE),
            vehicle_age: years_or(answers, "vehicleAge", DEFAULT_VEHICLE_AGE),
            driver_age: years_or(answers, "age", DEFAULT_AGE),
        }
    }

    fn rate_percent(&self) -> u64 {
        match self.vehicle_age {
            a if a < 3 => 3,
            a if a < 7 => 4,
            _ => 5,
        }
    }
}

fn vehicle_plans(profile: &VehicleProfile) -> Vec<PlanOffer> {
    let premium = scale(profile.value, profile.rate_percent());

    let depreciation = if profile.vehicle_age < 5 {
        "Zero depreciation cover"
    } else {
        "Engine protection cover"
    };
    let driver = if profile.driver_age < 25 {
        "Young driver roadside assistance"
    } else {
        "No claim bonus protection"
    };

    // (id, name, provider, IDV %, premium %, rating, fixed highlights)
    let plans: [(&str, &str, &str, u64, u64, f32, [&str; 2]); 3] = [
        (
            "vehicle_bajaj",
            "Motor Secure Plus",
            "Bajaj Allianz",
            100,
            100,
            4.6,
            ["24/7 roadside assistance", "Personal accident cover"],
        ),
        (
            "vehicle_icici_lombard",
            "Drive Assured",
            "ICICI Lombard",
            95,
            90,
            4.3,
            ["Cashless repairs at network garages", "Quick policy issuance"],
        ),
        (
            "vehicle_hdfc_ergo",
            "Motor Protect Max",
            "HDFC ERGO",
            105,
            110,
            4.1,
            ["Return to invoice cover", "Easy claim settlement process"],
        ),
    ];

    plans
        .into_iter()
        .map(|(id, name, provider, idv, premium_pct, rating, fixed)| PlanOffer {
            id: id.into(),
            name: name.into(),
            provider: provider.into(),
            coverage: format!("IDV {}", format_inr(scale(profile.value, idv))),
            premium: scale(premium, premium_pct),
            highlights: strings(&[fixed[0], depreciation, driver, fixed[1]]),
            rating,
            link: None,
        })
        .collect()
}

/// Rupee amount with Indian digit grouping, e.g. `₹12,34,567`.
pub fn format_inr(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{digits}");
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("₹{},{}", groups.join(","), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, &str)]) -> AnswerSet {
        pairs.iter().copied().collect()
    }

    fn premiums(offers: &[PlanOffer]) -> Vec<u64> {
        offers.iter().map(|o| o.premium).collect()
    }

    fn coverages(offers: &[PlanOffer]) -> Vec<&str> {
        offers.iter().map(|o| o.coverage.as_str()).collect()
    }

    #[test]
    fn test_format_inr_grouping() {
        assert_eq!(format_inr(0), "₹0");
        assert_eq!(format_inr(999), "₹999");
        assert_eq!(format_inr(1_000), "₹1,000");
        assert_eq!(format_inr(500_000), "₹5,00,000");
        assert_eq!(format_inr(1_234_567), "₹12,34,567");
        assert_eq!(format_inr(12_000_000), "₹1,20,00,000");
    }

    #[test]
    fn test_vehicle_example() {
        let offers = recommend(
            Category::Vehicle,
            &answers(&[("vehicleValue", "800000"), ("vehicleAge", "2"), ("age", "30")]),
        );
        assert_eq!(premiums(&offers), vec![24_000, 21_600, 26_400]);
        assert_eq!(
            coverages(&offers),
            vec!["IDV ₹8,00,000", "IDV ₹7,60,000", "IDV ₹8,40,000"]
        );
        assert!(offers[0]
            .highlights
            .contains(&"Zero depreciation cover".to_string()));
        assert!(offers[0]
            .highlights
            .contains(&"No claim bonus protection".to_string()));
    }

    #[test]
    fn test_vehicle_rate_bands_and_highlights() {
        let mid = recommend(
            Category::Vehicle,
            &answers(&[("vehicleValue", "500000"), ("vehicleAge", "5"), ("age", "22")]),
        );
        assert_eq!(mid[0].premium, 20_000);
        assert!(mid[0]
            .highlights
            .contains(&"Engine protection cover".to_string()));
        assert!(mid[0]
            .highlights
            .contains(&"Young driver roadside assistance".to_string()));

        let old = recommend(
            Category::Vehicle,
            &answers(&[("vehicleValue", "500000"), ("vehicleAge", "7")]),
        );
        assert_eq!(old[0].premium, 25_000);
    }

    #[test]
    fn test_vehicle_defaults() {
        let offers = recommend(Category::Vehicle, &AnswerSet::new());
        assert_eq!(offers[0].premium, 24_000);
        assert_eq!(offers[0].coverage, "IDV ₹8,00,000");
    }

    #[test]
    fn test_health_cover_is_clamped() {
        let low = recommend(Category::Health, &answers(&[("annualIncome", "100000")]));
        assert_eq!(low[0].coverage, "₹3,00,000");
        assert_eq!(low[0].premium, 6_000);

        let high = recommend(Category::Health, &answers(&[("annualIncome", "2500000")]));
        assert_eq!(high[0].coverage, "₹10,00,000");
        assert_eq!(premiums(&high), vec![20_000, 16_000, 24_000]);
    }

    #[test]
    fn test_health_defaults() {
        let offers = recommend(Category::Health, &AnswerSet::new());
        assert_eq!(offers.len(), 3);
        assert_eq!(
            coverages(&offers),
            vec!["₹10,00,000", "₹8,00,000", "₹12,00,000"]
        );
        assert!(offers[0]
            .highlights
            .contains(&"Individual cover with no co-payment".to_string()));
    }

    #[test]
    fn test_health_highlights_follow_profile() {
        let offers = recommend(
            Category::Health,
            &answers(&[("age", "45"), ("familySize", "4"), ("annualIncome", "400000")]),
        );
        assert!(offers[0]
            .highlights
            .contains(&"Free annual health check-up".to_string()));
        assert!(offers[0]
            .highlights
            .contains(&"Family floater for 4 members".to_string()));
        assert!(offers[1]
            .highlights
            .contains(&"Pre-existing diseases covered after 1 year".to_string()));
        assert!(offers[2]
            .highlights
            .contains(&"Coverage for the entire family".to_string()));
        assert!(offers[2].highlights.contains(&"No room rent limit".to_string()));
    }

    #[test]
    fn test_term_bands() {
        // age 28: 15x cover, 0.8 factor
        let young = recommend(
            Category::Term,
            &answers(&[("age", "28"), ("annualIncome", "600000")]),
        );
        assert_eq!(young[0].coverage, "₹90,00,000");
        assert_eq!(young[0].premium, 7_200);
        assert_eq!(premiums(&young), vec![7_200, 6_480, 7_920]);

        // age 40: 12x cover, 1.8 factor
        let older = recommend(
            Category::Term,
            &answers(&[("age", "40"), ("annualIncome", "500000")]),
        );
        assert_eq!(older[0].coverage, "₹60,00,000");
        assert_eq!(older[0].premium, 10_800);
    }

    #[test]
    fn test_term_cover_is_capped() {
        let offers = recommend(
            Category::Term,
            &answers(&[("age", "32"), ("annualIncome", "5000000")]),
        );
        assert_eq!(offers[0].coverage, "₹1,00,00,000");
        assert_eq!(offers[0].premium, 12_000);
    }

    #[test]
    fn test_unparseable_answers_use_defaults() {
        let garbage = answers(&[
            ("age", "old"),
            ("annualIncome", "lots"),
            ("familySize", "-3"),
            ("vehicleValue", "-5"),
        ]);
        for category in Category::ALL {
            assert_eq!(
                recommend(category, &garbage),
                recommend(category, &AnswerSet::new())
            );
        }
    }

    #[test]
    fn test_extreme_amounts_still_score() {
        for huge in ["1e19", "1e300", "18446744073709551615"] {
            let input = answers(&[
                ("age", "40"),
                ("annualIncome", huge),
                ("vehicleValue", huge),
                ("vehicleAge", "2"),
                ("coverageAmount", huge),
            ]);
            for category in Category::ALL {
                assert_eq!(recommend(category, &input).len(), 3, "{category} with {huge}");
            }
        }
    }

    #[test]
    fn test_huge_vehicle_value_scales_without_overflow() {
        let offers = recommend(
            Category::Vehicle,
            &answers(&[("vehicleValue", "1e19"), ("vehicleAge", "2")]),
        );
        assert_eq!(
            premiums(&offers),
            vec![
                300_000_000_000_000_000,
                270_000_000_000_000_000,
                330_000_000_000_000_000
            ]
        );
        assert_eq!(
            offers[2].coverage,
            format!("IDV {}", format_inr(10_500_000_000_000_000_000))
        );
    }

    #[test]
    fn test_scale_caps_at_u64_max() {
        assert_eq!(scale(u64::MAX, 105), u64::MAX);
        assert_eq!(scale(u64::MAX, 100), u64::MAX);
        assert_eq!(scale(800_000, 95), 760_000);
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let input = answers(&[("age", "33"), ("annualIncome", "750000"), ("smoker", "Yes")]);
        for category in Category::ALL {
            assert_eq!(recommend(category, &input), recommend(category, &input));
            assert_eq!(recommend(category, &input).len(), 3);
        }
    }

    #[test]
    fn test_unknown_category_gets_single_fallback() {
        let offers = recommend_for("travel", &AnswerSet::new());
        assert_eq!(offers, vec![fallback_offer()]);

        let known = recommend_for("Vehicle", &AnswerSet::new());
        assert_eq!(known, recommend(Category::Vehicle, &AnswerSet::new()));
    }
}
