/*
 * interpolator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The interpolation pipeline: parsed-template cache, expression evaluation
//! and composite formatting.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::culture::{Culture, FormatProvider};
use crate::error::InterpolateResult;
use crate::evaluator::{CachingEvaluator, ExpressionEvaluator};
use crate::format::format_composite;
use crate::reflect::{ContextRef, NoContext, Reflect};
use crate::template::{ParsedTemplate, RegexTemplateParser, TemplateParser};
use crate::value::Value;

static GLOBAL: Lazy<Interpolator> = Lazy::new(Interpolator::new);

/// Renders templates against context objects.
///
/// Parsed templates are cached per (context type, template text) and the
/// evaluator keeps its own per-(type, expression) cache. Neither cache is
/// ever cleared.
pub struct Interpolator {
    parser: Box<dyn TemplateParser>,
    evaluator: Box<dyn ExpressionEvaluator>,
    provider: Arc<dyn FormatProvider>,
    templates: RwLock<HashMap<(TypeId, String), Arc<ParsedTemplate>>>,
}

impl Interpolator {
    /// An interpolator with the regex parser, the caching evaluator and the
    /// invariant culture.
    pub fn new() -> Self {
        InterpolatorBuilder::new().build()
    }

    pub fn builder() -> InterpolatorBuilder {
        InterpolatorBuilder::new()
    }

    /// The process-wide instance used by [`InterpolateExt`] and the free
    /// functions of this crate.
    pub fn global() -> &'static Interpolator {
        &GLOBAL
    }

    /// The provider used when none is passed explicitly.
    pub fn provider(&self) -> &dyn FormatProvider {
        self.provider.as_ref()
    }

    /// Render `template` against `context` with the default provider.
    pub fn interpolate<T: Reflect>(&self, context: &T, template: &str) -> InterpolateResult<String> {
        self.render(&ContextRef::new(context), template, self.provider.as_ref())
    }

    /// Render `template` with an explicit provider. A missing context is
    /// replaced by [`NoContext`].
    pub fn interpolate_with<T: Reflect>(
        &self,
        context: Option<&T>,
        template: &str,
        provider: &dyn FormatProvider,
    ) -> InterpolateResult<String> {
        match context {
            Some(context) => self.render(&ContextRef::new(context), template, provider),
            None => self.render(&ContextRef::new(&NoContext), template, provider),
        }
    }

    /// Render a template whose expressions use no context fields.
    pub fn interpolate_without_context(&self, template: &str) -> InterpolateResult<String> {
        self.render(&ContextRef::new(&NoContext), template, self.provider.as_ref())
    }

    /// Render against an already type-erased context.
    pub fn render(
        &self,
        context: &ContextRef<'_>,
        template: &str,
        provider: &dyn FormatProvider,
    ) -> InterpolateResult<String> {
        let parsed = self.parsed(context.type_id(), template);
        let args = parsed
            .expressions
            .iter()
            .map(|expression| self.evaluator.evaluate(expression, context))
            .collect::<InterpolateResult<Vec<Value>>>()?;
        Ok(format_composite(provider, &parsed.format, &args)?)
    }

    /// The parsed form of `template` for contexts of type `type_id`.
    pub fn parsed(&self, type_id: TypeId, template: &str) -> Arc<ParsedTemplate> {
        let key = (type_id, template.to_string());
        if let Some(found) = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(found);
        }

        let mut cache = self.templates.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache.entry(key).or_insert_with(|| {
            tracing::debug!(template, "Template cache miss");
            Arc::new(self.parser.parse(template))
        });
        Arc::clone(entry)
    }

    /// Number of cached parsed templates.
    pub fn template_count(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpolator")
            .field("provider", &self.provider.name())
            .field("templates", &self.template_count())
            .finish_non_exhaustive()
    }
}

/// Configures an [`Interpolator`]. Unset parts fall back to the defaults of
/// [`Interpolator::new`].
#[derive(Default)]
pub struct InterpolatorBuilder {
    parser: Option<Box<dyn TemplateParser>>,
    evaluator: Option<Box<dyn ExpressionEvaluator>>,
    provider: Option<Arc<dyn FormatProvider>>,
}

impl InterpolatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parser(mut self, parser: impl TemplateParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    pub fn evaluator(mut self, evaluator: impl ExpressionEvaluator + 'static) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    /// Default provider for [`Interpolator::interpolate`].
    pub fn provider(mut self, provider: impl FormatProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn build(self) -> Interpolator {
        Interpolator {
            parser: self.parser.unwrap_or_else(|| Box::new(RegexTemplateParser)),
            evaluator: self
                .evaluator
                .unwrap_or_else(|| Box::new(CachingEvaluator::new())),
            provider: self
                .provider
                .unwrap_or_else(|| Arc::new(Culture::invariant())),
            templates: RwLock::new(HashMap::new()),
        }
    }
}

/// Method-call entry points on any [`Reflect`] type, backed by
/// [`Interpolator::global`].
///
/// ```ignore
/// let text = invoice.interpolate("{Id}: {Total:C}")?;
/// ```
pub trait InterpolateExt: Reflect + Sized {
    fn interpolate(&self, template: &str) -> InterpolateResult<String> {
        Interpolator::global().interpolate(self, template)
    }

    fn interpolate_with(
        &self,
        template: &str,
        provider: &dyn FormatProvider,
    ) -> InterpolateResult<String> {
        Interpolator::global().interpolate_with(Some(self), template, provider)
    }
}

impl<T: Reflect> InterpolateExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FormatError, InterpolateError};
    use crate::reflect::TypeBuilder;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Item {
        id: i32,
        name: String,
    }

    impl Reflect for Item {
        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.field("Id", |i| i.id).field("Name", |i| i.name.clone());
        }
    }

    fn item() -> Item {
        Item {
            id: 1,
            name: "HeLLo".to_string(),
        }
    }

    struct CountingParser {
        calls: Arc<AtomicUsize>,
    }

    impl TemplateParser for CountingParser {
        fn parse(&self, template: &str) -> ParsedTemplate {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RegexTemplateParser.parse(template)
        }
    }

    #[test]
    fn test_template_parsed_once_per_type() {
        let calls = Arc::new(AtomicUsize::new(0));
        let interpolator = Interpolator::builder()
            .parser(CountingParser {
                calls: Arc::clone(&calls),
            })
            .build();

        for _ in 0..3 {
            assert_eq!(
                interpolator.interpolate(&item(), "{Name}#{Id}").unwrap(),
                "HeLLo#1"
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        interpolator.interpolate(&NoContext, "{Name}#{Id}").unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(interpolator.template_count(), 2);
    }

    #[test]
    fn test_concurrent_first_use_parses_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let interpolator = Interpolator::builder()
            .parser(CountingParser {
                calls: Arc::clone(&calls),
            })
            .build();
        let type_id = TypeId::of::<Item>();

        let parsed: Vec<Arc<ParsedTemplate>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| interpolator.parsed(type_id, "{Name}:{Id}")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(interpolator.template_count(), 1);
        assert!(parsed.iter().all(|p| Arc::ptr_eq(p, &parsed[0])));
        assert_eq!(parsed[0].format, "{0}:{1}");

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    assert_eq!(
                        interpolator.interpolate(&item(), "{Name}:{Id}").unwrap(),
                        "HeLLo:1"
                    );
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_repeated_expressions() {
        let interpolator = Interpolator::new();
        assert_eq!(
            interpolator
                .interpolate(&item(), "{Name} {Id} {Name} {Name}")
                .unwrap(),
            "HeLLo 1 HeLLo HeLLo"
        );
    }

    #[test]
    fn test_missing_context() {
        let interpolator = Interpolator::new();
        assert_eq!(
            interpolator
                .interpolate_with(None::<&Item>, "{7+3}|{GetType().Name}", &Culture::en())
                .unwrap(),
            "10|NoContext"
        );
        assert_eq!(
            interpolator.interpolate_without_context("<{7*6}>").unwrap(),
            "<42>"
        );
    }

    #[test]
    fn test_builder_provider_is_default() {
        let interpolator = Interpolator::builder().provider(Culture::ru()).build();
        assert_eq!(
            interpolator.interpolate(&item(), "{Id * 2030:n2}").unwrap(),
            "2\u{a0}030,00"
        );
        assert_eq!(
            interpolator
                .interpolate_with(Some(&item()), "{Id * 2030:n2}", &Culture::en())
                .unwrap(),
            "2,030.00"
        );
    }

    #[test]
    fn test_errors_propagate() {
        let interpolator = Interpolator::new();
        let err = interpolator.interpolate(&item(), "{Missing}").unwrap_err();
        assert!(err.to_string().contains("Error expression='Missing'"));

        assert!(matches!(
            interpolator.interpolate(&item(), "{Id:Q}"),
            Err(InterpolateError::Format(FormatError::InvalidSpecifier { .. }))
        ));
    }

    #[test]
    fn test_extension_methods() {
        assert_eq!(item().interpolate("[{Name,-7}]").unwrap(), "[HeLLo  ]");
        assert_eq!(
            item()
                .interpolate_with("{Name.ToUpper()}", &Culture::ru())
                .unwrap(),
            "HELLO"
        );
    }
}
