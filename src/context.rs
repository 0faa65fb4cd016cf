use crate::{
    Component, InjectError, InjectResult, MapContainer, MapContainerEx,
    OnceSlot, Scope, Svc, Value,
};
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::atomic::{AtomicBool, Ordering},
};
use tracing::debug;

/// Produced values of one frame. Provider outputs live in shared slots so
/// the frame lock is released while a provider runs, and concurrent callers
/// of the same provider wait for a single call.
#[derive(Default)]
pub(crate) struct Memo {
    pub(crate) providers: HashMap<u64, Svc<OnceSlot<Value>>>,
    pub(crate) components: HashMap<Component, Value>,
}

impl Memo {
    /// The output slot of a provider, created empty on first use.
    pub(crate) fn provider_slot(&mut self, provider: u64) -> Svc<OnceSlot<Value>> {
        self.providers.entry(provider).or_default().clone()
    }
}

#[derive(Clone)]
pub(crate) struct Frame {
    pub(crate) scope: Scope,
    pub(crate) memo: MapContainer<Memo>,
}

impl Frame {
    fn new(scope: Scope) -> Self {
        Frame {
            scope,
            memo: MapContainerEx::new(Memo::default()),
        }
    }
}

/// A flag which can be raised to abort operations running under a
/// [`Ctx`]. Clones share the same flag.
#[derive(Clone, Default)]
pub struct CancelToken(Svc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Requests cancellation. Operations stop before resolving their next
    /// dependency.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Debug for CancelToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CancelToken")
            .field(&self.is_cancelled())
            .finish()
    }
}

/// The context an operation runs under: a stack of active scopes, each with
/// its own memo of produced values, and an optional cancellation token.
///
/// Contexts are cheap to clone. Clones share their frames, so values
/// memoised through one clone are visible to the others. Entering or leaving
/// a scope returns a new context and leaves the original untouched.
///
/// ```
/// use runtime_resolver::{Ctx, Scope};
///
/// let request = Scope::new("request");
/// let ctx = Ctx::new();
/// let inner = ctx.enter_scope(&request).unwrap();
///
/// assert_eq!(&request, inner.current_scope());
/// assert!(ctx.current_scope().is_global());
/// assert!(inner.leave_scope(&request).unwrap().current_scope().is_global());
/// ```
#[derive(Clone)]
pub struct Ctx {
    root: Frame,
    frames: Svc<Vec<Frame>>,
    cancel: Option<CancelToken>,
}

impl Ctx {
    /// Creates an anonymous context whose only active scope is the global
    /// scope.
    #[must_use]
    pub fn new() -> Self {
        Ctx {
            root: Frame::new(Scope::global()),
            frames: Svc::new(Vec::new()),
            cancel: None,
        }
    }

    /// Attaches a cancellation token to this context.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    /// The innermost active scope.
    #[must_use]
    pub fn current_scope(&self) -> &Scope {
        self.frames.last().map_or(&self.root.scope, |frame| &frame.scope)
    }

    /// The active scopes, outermost first.
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.all_frames().map(|frame| &frame.scope)
    }

    fn all_frames(&self) -> impl Iterator<Item = &Frame> {
        std::iter::once(&self.root).chain(self.frames.iter())
    }

    #[must_use]
    pub fn is_active(&self, scope: &Scope) -> bool {
        self.frame_for(scope).is_some()
    }

    /// Pushes a scope onto the stack. The scope must be directly enterable
    /// from the current scope.
    pub fn enter_scope(&self, scope: &Scope) -> InjectResult<Ctx> {
        let current = self.current_scope();
        if !scope.can_enter_directly_from(current) {
            return Err(InjectError::ScopeNotEnterable {
                scope: scope.to_string(),
                current: current.to_string(),
            });
        }

        debug!(%scope, from = %current, "entering scope");
        let mut frames = self.frames.as_ref().clone();
        frames.push(Frame::new(scope.clone()));
        Ok(Ctx {
            root: self.root.clone(),
            frames: Svc::new(frames),
            cancel: self.cancel.clone(),
        })
    }

    /// Pops a scope from the stack and discards everything memoised in it.
    /// The scope must be the current scope, and the outermost scope can never
    /// be left.
    pub fn leave_scope(&self, scope: &Scope) -> InjectResult<Ctx> {
        let current = self.current_scope();
        if current != scope || self.frames.is_empty() {
            return Err(InjectError::ScopeNotCurrent {
                scope: scope.to_string(),
                current: current.to_string(),
            });
        }

        debug!(%scope, "leaving scope");
        let mut frames = self.frames.as_ref().clone();
        if let Some(frame) = frames.pop() {
            frame.memo.with_inner_mut(|memo| {
                memo.providers.clear();
                memo.components.clear();
            });
        }

        Ok(Ctx {
            root: self.root.clone(),
            frames: Svc::new(frames),
            cancel: self.cancel.clone(),
        })
    }

    pub(crate) fn frame_for(&self, scope: &Scope) -> Option<&Frame> {
        self.all_frames().find(|frame| &frame.scope == scope)
    }

    pub(crate) fn check_cancelled(&self) -> InjectResult<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(InjectError::Cancelled),
            _ => Ok(()),
        }
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Ctx::new()
    }
}

impl Debug for Ctx {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ctx")
            .field("scopes", &self.scopes().collect::<Vec<_>>())
            .field("cancel", &self.cancel)
            .finish()
    }
}
