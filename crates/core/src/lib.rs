//! `cropcast-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no model, storage or
//! network concerns): crops, growth stages, feature vectors and their
//! validation, identifiers and the domain error type.

pub mod crop;
pub mod error;
pub mod features;
pub mod id;
pub mod value_object;

pub use crop::{CropType, GrowthStage};
pub use error::{DomainError, DomainResult};
pub use features::{Feature, FeatureBounds, FeatureRange, FeatureVector, PartialFeatures};
pub use id::ModelId;
pub use value_object::ValueObject;
