//! Stage- and season-aware field operations: irrigation, fertilization,
//! pest control and harvest readiness, plus a weekly task calendar.

use cropcast_core::{CropType, DomainError, DomainResult, GrowthStage};
use serde::{Deserialize, Serialize};

use crate::tables::{WaterNeeds, fertilizer_timing, profile};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// One actionable recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub action: String,
    pub timing: String,
    pub priority: Priority,
    pub reason: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPlan {
    pub crop: CropType,
    pub stage: GrowthStage,
    pub month: u32,
    pub irrigation: Advice,
    pub fertilization: Advice,
    pub pest_control: Advice,
    pub harvesting: Advice,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Build the plan for `crop` at `stage` during calendar `month` (1-12).
pub fn field_plan(crop: CropType, stage: GrowthStage, month: u32) -> DomainResult<FieldPlan> {
    if !(1..=12).contains(&month) {
        return Err(DomainError::validation(format!("month must be 1-12, got {month}")));
    }
    Ok(FieldPlan {
        crop,
        stage,
        month,
        irrigation: irrigation(crop, stage, month),
        fertilization: fertilization(crop, stage),
        pest_control: pest_control(crop, stage, month),
        harvesting: harvesting(crop, stage),
    })
}

fn irrigation(crop: CropType, stage: GrowthStage, month: u32) -> Advice {
    let (action, timing, mut priority, reason) = match stage {
        GrowthStage::Seedling => (
            "Light, frequent watering to maintain soil moisture",
            "Daily light irrigation or every 2-3 days",
            Priority::High,
            "Critical establishment phase requiring consistent moisture",
        ),
        GrowthStage::Vegetative => (
            "Deep, less frequent watering to encourage root development",
            "Every 3-5 days depending on soil type and weather",
            Priority::Medium,
            "Building strong root system and vegetative growth",
        ),
        GrowthStage::Flowering => (
            "Consistent moisture critical for flower and fruit development",
            "Monitor soil moisture daily, irrigate as needed",
            Priority::High,
            "Water stress during flowering significantly impacts yield",
        ),
        GrowthStage::Maturity => (
            "Reduce irrigation to prevent quality issues and prepare for harvest",
            "Minimal irrigation, only if severe drought conditions",
            Priority::Low,
            "Excess moisture can delay harvest and reduce grain quality",
        ),
    };

    let mut action = action.to_string();
    if profile(crop).water_needs == WaterNeeds::VeryHigh {
        action.push_str(" - This crop requires abundant water");
        priority = priority.max(Priority::Medium);
    }

    let details = match month {
        6..=8 => [
            "Increase irrigation frequency during hot summer months",
            "Consider early morning irrigation to reduce evaporation",
            "Monitor for signs of heat stress",
            "Mulch around plants to retain soil moisture",
        ],
        12 | 1 | 2 => [
            "Reduce irrigation frequency in cooler weather",
            "Avoid overwatering in low evaporation conditions",
            "Check drainage to prevent waterlogging",
            "Monitor soil temperature before irrigating",
        ],
        _ => [
            "Monitor weather forecasts before scheduling irrigation",
            "Check soil moisture at 6-inch depth before watering",
            "Adjust timing based on recent rainfall",
            "Maintain consistent moisture levels",
        ],
    };

    Advice {
        action,
        timing: timing.to_string(),
        priority,
        reason: reason.to_string(),
        details: strings(&details),
    }
}

pub(crate) fn fertilizer_priority(stage: GrowthStage) -> Priority {
    match stage {
        GrowthStage::Seedling | GrowthStage::Vegetative => Priority::High,
        GrowthStage::Flowering => Priority::Medium,
        GrowthStage::Maturity => Priority::Low,
    }
}

fn fertilization(crop: CropType, stage: GrowthStage) -> Advice {
    let products = profile(crop).fertilizers_for(stage);
    let priority = fertilizer_priority(stage);
    let details = match stage {
        GrowthStage::Seedling => [
            "Use starter fertilizer with higher phosphorus content",
            "Apply at planting or within first 2 weeks",
            "Avoid high nitrogen that can burn young plants",
            "Consider soil test results for precise application rates",
        ],
        GrowthStage::Vegetative => [
            "Apply nitrogen-rich fertilizer to promote leaf and stem growth",
            "Side-dress application recommended for row crops",
            "Split application to reduce nutrient loss",
            "Monitor plants for nitrogen deficiency signs (yellowing leaves)",
        ],
        GrowthStage::Flowering => [
            "Switch to balanced NPK fertilizer",
            "Add micronutrients (zinc, boron, iron) if deficient",
            "Avoid excessive nitrogen that can delay flowering",
            "Apply before peak flowering for maximum benefit",
        ],
        GrowthStage::Maturity => [
            "Reduce or eliminate nitrogen application",
            "Final potassium application to improve grain quality",
            "Avoid fertilizer that delays harvest maturity",
            "Focus on harvest preparation rather than growth",
        ],
    };

    Advice {
        action: format!(
            "Apply {} suitable for {} stage",
            products.join(", "),
            stage.slug()
        ),
        timing: fertilizer_timing(stage).to_string(),
        priority,
        reason: format!("{stage} stage requires specific nutrients for optimal development"),
        details: strings(&details),
    }
}

fn seasonal_pest_pressure(month: u32) -> Priority {
    match month {
        5..=9 => Priority::High,
        3 | 4 | 10 => Priority::Medium,
        _ => Priority::Low,
    }
}

fn pest_control(crop: CropType, stage: GrowthStage, month: u32) -> Advice {
    let pests = &profile(crop).pests;
    let pressure = seasonal_pest_pressure(month);
    let pressure_label = match pressure {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
    };

    let mut details = strings(&match stage {
        GrowthStage::Seedling => [
            "Focus on soil-dwelling pests and cutworms",
            "Use physical barriers or targeted treatments",
            "Monitor for damping-off diseases",
            "Inspect plants every 2-3 days for early detection",
        ],
        GrowthStage::Vegetative => [
            "Scout for leaf-feeding insects and caterpillars",
            "Check undersides of leaves for eggs and larvae",
            "Monitor growth points for damage",
            "Implement beneficial insect habitat if using IPM",
        ],
        GrowthStage::Flowering => [
            "Watch for pollinators before applying any treatments",
            "Focus on flower and developing fruit protection",
            "Monitor for disease symptoms in humid conditions",
            "Avoid spraying during peak pollinator activity",
        ],
        GrowthStage::Maturity => [
            "Inspect for storage pest prevention",
            "Monitor grain moisture to prevent mold",
            "Scout for late-season pests that affect quality",
            "Prepare for post-harvest pest management",
        ],
    });
    details.push(format!("Common pests for {crop}: {}", pests.join(", ")));

    Advice {
        action: format!("Monitor for {} and other common pests", pests[..2].join(", ")),
        timing: "Weekly scouting recommended during growing season".to_string(),
        priority: pressure,
        reason: format!("Seasonal pest pressure is {pressure_label} for this time of year"),
        details,
    }
}

fn harvesting(crop: CropType, stage: GrowthStage) -> Advice {
    if stage != GrowthStage::Maturity {
        return Advice {
            action: "Continue monitoring crop development - not ready for harvest".to_string(),
            timing: "Harvesting typically begins when crop reaches maturity stage".to_string(),
            priority: Priority::Low,
            reason: format!("Crop is currently in {} stage", stage.slug()),
            details: strings(&[
                "Monitor crop development daily",
                "Look for signs of maturity (grain color, moisture content)",
                "Prepare harvesting equipment and storage facilities",
                "Plan harvest logistics and labor requirements",
            ]),
        };
    }

    let mut details = strings(&profile(crop).harvest_checks);
    details.extend(strings(&[
        "Schedule harvest during optimal weather windows",
        "Coordinate labor and equipment availability",
        "Prepare post-harvest handling and storage systems",
        "Plan for immediate post-harvest field operations",
    ]));
    Advice {
        action: "Crop is approaching harvest readiness - begin harvest preparations".to_string(),
        timing: "Monitor daily for optimal harvest window".to_string(),
        priority: Priority::High,
        reason: "Proper timing is critical for maximizing yield and quality".to_string(),
        details,
    }
}

pub const WEEKDAYS: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTasks {
    pub day: String,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub crop: CropType,
    pub stage: GrowthStage,
    /// Monday first.
    pub days: Vec<DayTasks>,
}

impl WeeklySchedule {
    pub fn tasks_on(&self, day: &str) -> &[String] {
        self.days
            .iter()
            .find(|d| d.day.eq_ignore_ascii_case(day))
            .map(|d| d.tasks.as_slice())
            .unwrap_or(&[])
    }
}

/// Stage tasks spread round-robin from Monday, plus paddy checks for rice.
pub fn weekly_schedule(crop: CropType, stage: GrowthStage) -> WeeklySchedule {
    let tasks: &[&str] = match stage {
        GrowthStage::Seedling => &[
            "Check soil moisture and irrigate if needed",
            "Scout for emerging pests and diseases",
            "Monitor germination rates",
            "Check for weed emergence",
            "Record growth measurements",
        ],
        GrowthStage::Vegetative => &[
            "Deep watering if needed",
            "Side-dress fertilizer application",
            "Comprehensive pest scouting",
            "Weed control activities",
            "Canopy management",
            "Soil cultivation if needed",
        ],
        GrowthStage::Flowering => &[
            "Monitor soil moisture daily",
            "Check for flower damage or disease",
            "Pollinator-friendly pest management",
            "Nutrient deficiency assessment",
            "Weather monitoring for harvest planning",
        ],
        GrowthStage::Maturity => &[
            "Daily maturity assessment",
            "Grain moisture testing",
            "Harvest equipment preparation",
            "Weather forecast monitoring",
            "Storage facility preparation",
            "Harvest scheduling",
        ],
    };

    let mut days: Vec<DayTasks> = WEEKDAYS
        .iter()
        .map(|d| DayTasks {
            day: d.to_string(),
            tasks: Vec::new(),
        })
        .collect();
    for (i, task) in tasks.iter().enumerate() {
        days[i % WEEKDAYS.len()].tasks.push(task.to_string());
    }

    if crop == CropType::Rice && matches!(stage, GrowthStage::Seedling | GrowthStage::Vegetative) {
        days[0].tasks.push("Check water level in paddy fields".to_string());
        days[4].tasks.push("Monitor water quality and algae growth".to_string());
    }

    WeeklySchedule { crop, stage, days }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_outside_calendar_is_rejected() {
        assert!(field_plan(CropType::Wheat, GrowthStage::Seedling, 0).is_err());
        assert!(field_plan(CropType::Wheat, GrowthStage::Seedling, 13).is_err());
    }

    #[test]
    fn rice_maturity_irrigation_is_never_low_priority() {
        let plan = field_plan(CropType::Rice, GrowthStage::Maturity, 9).unwrap();
        assert_eq!(plan.irrigation.priority, Priority::Medium);
        assert!(plan.irrigation.action.ends_with("requires abundant water"));

        let wheat = field_plan(CropType::Wheat, GrowthStage::Maturity, 9).unwrap();
        assert_eq!(wheat.irrigation.priority, Priority::Low);
    }

    #[test]
    fn summer_and_winter_irrigation_details_differ() {
        let july = field_plan(CropType::Corn, GrowthStage::Vegetative, 7).unwrap();
        let january = field_plan(CropType::Corn, GrowthStage::Vegetative, 1).unwrap();
        assert!(july.irrigation.details[0].contains("hot summer"));
        assert!(january.irrigation.details[0].contains("cooler weather"));
    }

    #[test]
    fn pest_pressure_follows_season() {
        let plan = field_plan(CropType::Soybean, GrowthStage::Flowering, 7).unwrap();
        assert_eq!(plan.pest_control.priority, Priority::High);
        assert!(plan.pest_control.action.contains("Soybean aphid, Bean leaf beetle"));
        assert!(plan.pest_control.details.last().unwrap().contains("White mold"));

        let winter = field_plan(CropType::Soybean, GrowthStage::Flowering, 12).unwrap();
        assert_eq!(winter.pest_control.priority, Priority::Low);
    }

    #[test]
    fn harvest_advice_only_fires_at_maturity() {
        let early = field_plan(CropType::Corn, GrowthStage::Flowering, 8).unwrap();
        assert_eq!(early.harvesting.priority, Priority::Low);

        let ready = field_plan(CropType::Corn, GrowthStage::Maturity, 9).unwrap();
        assert_eq!(ready.harvesting.priority, Priority::High);
        assert!(ready.harvesting.details[1].contains("black layer"));
        assert_eq!(ready.harvesting.details.len(), 8);
    }

    #[test]
    fn fertilization_names_the_stage_products() {
        let plan = field_plan(CropType::Wheat, GrowthStage::Vegetative, 4).unwrap();
        assert_eq!(
            plan.fertilization.action,
            "Apply High nitrogen, Potassium suitable for vegetative stage"
        );
        assert_eq!(plan.fertilization.priority, Priority::High);
    }

    #[test]
    fn weekly_tasks_start_on_monday() {
        let week = weekly_schedule(CropType::Wheat, GrowthStage::Maturity);
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.tasks_on("Monday"), ["Daily maturity assessment".to_string()]);
        assert_eq!(week.tasks_on("Saturday"), ["Harvest scheduling".to_string()]);
        assert!(week.tasks_on("Sunday").is_empty());
    }

    #[test]
    fn rice_paddy_tasks_in_early_stages_only() {
        let early = weekly_schedule(CropType::Rice, GrowthStage::Seedling);
        assert!(early.tasks_on("Monday").iter().any(|t| t.contains("paddy")));
        assert!(early.tasks_on("friday").iter().any(|t| t.contains("algae")));

        let late = weekly_schedule(CropType::Rice, GrowthStage::Flowering);
        assert!(!late.tasks_on("Monday").iter().any(|t| t.contains("paddy")));
    }
}
