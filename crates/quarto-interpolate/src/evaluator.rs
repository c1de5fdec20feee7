/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Expression evaluation with per-type compilation caching.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{InterpolateError, InterpolateResult};
use crate::expr::CompiledExpression;
use crate::reflect::ContextRef;
use crate::value::Value;

/// Evaluates expression text against a context object.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `expression` against `context`.
    ///
    /// Compile and evaluation failures are both reported as
    /// [`InterpolateError::TemplateEvaluation`].
    fn evaluate(&self, expression: &str, context: &ContextRef<'_>) -> InterpolateResult<Value>;
}

/// The default evaluator: compiles each (context type, expression) pair once
/// with the embedded interpreter and keeps it for the life of the evaluator.
///
/// The cache is never evicted. It grows with the number of distinct context
/// types and expression texts seen.
#[derive(Debug, Default)]
pub struct CachingEvaluator {
    compiled: RwLock<HashMap<(TypeId, String), Arc<CompiledExpression>>>,
}

impl CachingEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled form of `expression` for the context's type.
    pub fn compile(
        &self,
        expression: &str,
        context: &ContextRef<'_>,
    ) -> InterpolateResult<Arc<CompiledExpression>> {
        let key = (context.type_id(), expression.to_string());
        if let Some(found) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(found));
        }

        let compiled = CompiledExpression::compile(expression, Arc::clone(context.descriptor()))
            .map_err(|source| InterpolateError::evaluation(expression, source))?;
        tracing::debug!(
            expression,
            context_type = context.descriptor().full_name(),
            "Compiled expression"
        );

        let mut cache = self.compiled.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache.entry(key).or_insert_with(|| Arc::new(compiled));
        Ok(Arc::clone(entry))
    }

    /// Number of compiled expressions held.
    pub fn len(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExpressionEvaluator for CachingEvaluator {
    fn evaluate(&self, expression: &str, context: &ContextRef<'_>) -> InterpolateResult<Value> {
        let compiled = self.compile(expression, context)?;
        let value = compiled
            .evaluate(context)
            .map_err(|source| InterpolateError::evaluation(expression, source))?;
        tracing::trace!(expression, ?value, "Evaluated expression");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExprError;
    use crate::reflect::{NoContext, Reflect, TypeBuilder};

    struct Counter {
        count: u32,
    }

    impl Reflect for Counter {
        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.field("Count", |c| c.count);
        }
    }

    #[test]
    fn test_compiles_once_per_type_and_text() {
        let evaluator = CachingEvaluator::new();
        let a = Counter { count: 1 };
        let b = Counter { count: 2 };

        assert_eq!(
            evaluator.evaluate("Count * 10", &ContextRef::new(&a)),
            Ok(Value::Int(10))
        );
        assert_eq!(
            evaluator.evaluate("Count * 10", &ContextRef::new(&b)),
            Ok(Value::Int(20))
        );
        assert_eq!(evaluator.len(), 1);

        let first = evaluator.compile("Count * 10", &ContextRef::new(&a)).unwrap();
        let second = evaluator.compile("Count * 10", &ContextRef::new(&b)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Same text, different context type.
        assert_eq!(
            evaluator.evaluate("7+3", &ContextRef::new(&NoContext)),
            Ok(Value::Int(10))
        );
        evaluator.evaluate("7+3", &ContextRef::new(&a)).unwrap();
        assert_eq!(evaluator.len(), 3);
    }

    #[test]
    fn test_concurrent_first_use_shares_one_entry() {
        let evaluator = CachingEvaluator::new();
        let counter = Counter { count: 4 };

        let compiled: Vec<Arc<CompiledExpression>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        evaluator
                            .compile("Count + 1", &ContextRef::new(&counter))
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(evaluator.len(), 1);
        assert!(compiled.iter().all(|c| Arc::ptr_eq(c, &compiled[0])));
        assert_eq!(
            compiled[0].evaluate(&ContextRef::new(&counter)),
            Ok(Value::Int(5))
        );
    }

    #[test]
    fn test_failures_carry_expression() {
        let evaluator = CachingEvaluator::new();
        let err = evaluator
            .evaluate("Nope", &ContextRef::new(&Counter { count: 0 }))
            .unwrap_err();
        match err {
            InterpolateError::TemplateEvaluation { expression, source } => {
                assert_eq!(expression, "Nope");
                assert!(matches!(source, ExprError::UnknownMember { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(evaluator.is_empty());
    }
}
