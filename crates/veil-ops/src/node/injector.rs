//! Deferred data-flow edges between operations.

use super::{InputContext, OpId};
use crate::error::OpsResult;

type InjectFn<V> = Box<dyn FnOnce(&V, &mut InputContext<V>) -> OpsResult<()> + Send>;

/// A deferred copy of a producer's output into a consumer's input context.
///
/// Runs exactly once, after the source finished successfully, immediately
/// before the target starts. If the source failed or was cancelled the
/// injector never runs and the target's conditions account for the missing
/// slot.
pub struct Injector<V> {
    source: OpId,
    apply: InjectFn<V>,
}

impl<V> Injector<V> {
    /// Creates an injector copying from `source`'s output.
    pub fn new<F>(source: OpId, transform: F) -> Self
    where
        F: FnOnce(&V, &mut InputContext<V>) -> OpsResult<()> + Send + 'static,
    {
        Self {
            source,
            apply: Box::new(transform),
        }
    }

    /// Returns the producing operation's ID.
    pub fn source(&self) -> OpId {
        self.source
    }

    /// Applies the transform to the source output, writing into the
    /// target's input context.
    pub(crate) fn apply(self, output: &V, ctx: &mut InputContext<V>) -> OpsResult<()> {
        (self.apply)(output, ctx)
    }
}

impl<V> std::fmt::Debug for Injector<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injector_writes_target_slot() {
        let source = OpId::new();
        let injector = Injector::new(source, |output: &u32, ctx| ctx.put("value", *output * 2));

        let mut ctx = InputContext::new();
        injector.apply(&21, &mut ctx).unwrap();

        assert_eq!(ctx.take("value").unwrap(), 42);
    }
}
