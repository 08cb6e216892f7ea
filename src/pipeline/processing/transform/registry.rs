use std::collections::HashMap;

use super::{run_transform, CustomerTransformer, EntityTransformer, OrderTransformer, ProductTransformer, TransformOutput};
use crate::error::{EtlError, Result};
use crate::types::{EntityType, RawRecord};

/// Registry of transform rules per entity type
pub struct TransformRegistry {
    transformers: HashMap<EntityType, Box<dyn EntityTransformer>>,
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformRegistry {
    /// Create a registry with the built-in customer, product and order rules
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(CustomerTransformer));
        registry.register(Box::new(ProductTransformer));
        registry.register(Box::new(OrderTransformer));
        registry
    }

    pub fn empty() -> Self {
        Self {
            transformers: HashMap::new(),
        }
    }

    /// Register rules, replacing any existing rules for the same entity
    pub fn register(&mut self, transformer: Box<dyn EntityTransformer>) {
        self.transformers.insert(transformer.entity(), transformer);
    }

    pub fn get(&self, entity: EntityType) -> Option<&dyn EntityTransformer> {
        self.transformers.get(&entity).map(|t| t.as_ref())
    }

    /// Transform `raw` with the rules registered for `entity`
    pub fn transform(&self, entity: EntityType, raw: Vec<RawRecord>) -> Result<TransformOutput> {
        let rules = self
            .get(entity)
            .ok_or_else(|| EtlError::UnknownEntity(entity.as_str().to_string()))?;
        Ok(run_transform(rules, raw))
    }

    /// Registered entity types, in pipeline order
    pub fn entities(&self) -> Vec<EntityType> {
        EntityType::all()
            .into_iter()
            .filter(|e| self.transformers.contains_key(e))
            .collect()
    }
}
