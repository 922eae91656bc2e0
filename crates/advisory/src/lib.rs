//! Rule-based agronomic advice.
//!
//! Everything here is a pure function of static per-crop tables and the
//! caller's inputs; no model, I/O or shared state is involved.

pub mod fertilizer;
pub mod field_plan;
pub mod recommend;
pub mod soil;
pub mod tables;
pub mod weather_impact;

pub use fertilizer::{Application, CostEstimate, FertilizerPlan, NutrientAmounts, fertilizer_plan};
pub use field_plan::{Advice, DayTasks, FieldPlan, Priority, WEEKDAYS, WeeklySchedule, field_plan, weekly_schedule};
pub use recommend::{Recommendation, StageAdvice, recommend};
pub use soil::{
    ParameterScore, ParameterStatus, SoilHealthReport, SoilRating, SuitabilityReport, soil_health, suitability,
};
pub use tables::{CropAdvisoryProfile, WaterNeeds, profile};
pub use weather_impact::{
    AlertKind, AlertSeverity, CropWeatherImpact, OverallImpact, WeatherAlert, WeatherConditions, assess_crop,
    weather_alerts, weather_impact,
};
