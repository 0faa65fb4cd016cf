use crate::{
    Component, Consumer, Ctx, Dependency, InjectError, InjectResult,
    MapContainerEx, Plan, Value,
};
use tracing::trace;

/// Executes a plan under a context. Values are memoised in the frame of the
/// scope their provider lives in, so each component is produced at most once
/// per active scope instance.
pub(crate) struct Engine<'a> {
    ctx: &'a Ctx,
    plan: &'a Plan,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(ctx: &'a Ctx, plan: &'a Plan) -> Self {
        Engine { ctx, plan }
    }

    /// Produces the value of the plan's root consumer.
    pub(crate) fn run(&self) -> InjectResult<Value> {
        let root = self.plan.root();
        let args = self.resolve_all(root)?;
        root.valuer().call(&args)
    }

    fn resolve_all(&self, consumer: &Consumer) -> InjectResult<Vec<Value>> {
        consumer
            .dependencies()
            .iter()
            .map(|dependency| self.resolve(dependency))
            .collect()
    }

    fn resolve(&self, dependency: &Dependency) -> InjectResult<Value> {
        self.ctx.check_cancelled()?;
        let binding = self.plan.binding(dependency).ok_or_else(|| {
            InjectError::InternalError(format!("{} was never planned", dependency))
        })?;

        if binding.components().is_empty() && !dependency.is_collector() {
            return Ok(Value::Zero);
        }

        let values = binding
            .components()
            .iter()
            .map(|component| self.produce(component))
            .collect::<InjectResult<Vec<_>>>()?;
        dependency.valuer().call(&values)
    }

    fn produce(&self, component: &Component) -> InjectResult<Value> {
        let provider = component.provider();
        let frame = self.ctx.frame_for(provider.scope()).ok_or_else(|| {
            InjectError::ScopeNotActive {
                provider: provider.to_string(),
                scope: provider.scope().to_string(),
                location: provider.location(),
            }
        })?;

        let memoised = frame
            .memo
            .with_inner(|memo| memo.components.get(component).cloned());
        if let Some(value) = memoised {
            trace!(%component, "reused memoised component");
            return Ok(value);
        }

        // Taken under the frame lock, filled outside of it. A failed call
        // leaves the slot empty.
        let slot = frame
            .memo
            .with_inner_mut(|memo| memo.provider_slot(provider.id()));
        let output = slot
            .get_or_try_init(|| {
                let args = self.resolve_all(provider.consumer())?;
                trace!(%provider, scope = %provider.scope(), "instantiating provider");
                provider.valuer().call(&args).map_err(|error| {
                    InjectError::ProviderFailed {
                        provider: provider.to_string(),
                        location: provider.location(),
                        inner: Box::new(error),
                    }
                })
            })?
            .clone();

        let value = component
            .valuer()
            .call(std::slice::from_ref(&output))
            .map_err(|error| InjectError::ProviderFailed {
                provider: provider.to_string(),
                location: provider.location(),
                inner: Box::new(error),
            })?;
        Ok(frame.memo.with_inner_mut(|memo| {
            memo.components
                .entry(component.clone())
                .or_insert(value)
                .clone()
        }))
    }
}
