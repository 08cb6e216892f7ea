// Transform stage: field normalizers, entity transformers and quality counters

pub mod normalize;
pub mod quality;
pub mod transform;

pub use quality::{QualityCounters, QualityReport, QualitySummary};
pub use transform::{transform, EntityTransformer, TransformOutput, TransformRegistry};
