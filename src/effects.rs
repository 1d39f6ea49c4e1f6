//! Cancellable, time-bounded UI effects.
//!
//! Every transient effect in the presentation — notification toasts, the
//! grid-expansion banner, the winner popup, the deferred post-winner reload,
//! the local break-clear timer — is owned by one [`EffectScheduler`]. The
//! scheduler guarantees at most one live instance per [`EffectClass`]:
//! scheduling a new instance supersedes and aborts any pending one, so a
//! superseded effect's hide/remove transitions can never fire late against
//! the view.
//!
//! Visual effects run show → hide → remove on a spawned timer task; the
//! hide-to-remove gap is a fixed short delay that leaves room for an exit
//! animation. Non-visual effects (reload, break clear) only report expiry.
//! Expiries are delivered back into the controller's single dispatch loop
//! via an unbounded channel, generation-tagged so stale notifications are
//! discarded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::view::ViewBinding;

/// Delay between the hide transition and element removal, leaving time for
/// the exit animation.
pub const EFFECT_REMOVAL_DELAY: Duration = Duration::from_millis(300);

// ── Effect classes and payloads ─────────────────────────────────────

/// A category of transient effect. At most one instance of each class may
/// be live at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectClass {
    /// Transient notification toast (join broadcasts, errors).
    Toast,
    /// Banner shown when the seat grid grows a capacity tier.
    ExpansionNotice,
    /// One-shot winner announcement popup.
    WinnerPopup,
    /// Terminal: full page/state refresh after a winner display.
    DeferredReload,
    /// Local break expiry: re-opens joining when a `break_timer` duration
    /// elapses without a contradicting server broadcast.
    BreakClear,
}

impl EffectClass {
    /// Whether this class has a visible element with show/hide/remove
    /// transitions.
    pub fn is_visual(self) -> bool {
        matches!(
            self,
            EffectClass::Toast | EffectClass::ExpansionNotice | EffectClass::WinnerPopup
        )
    }
}

/// Severity of a notification toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Error,
}

/// Content for a visual effect's element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectPayload {
    Toast { message: String, kind: ToastKind },
    ExpansionNotice { message: String },
    WinnerPopup { username: String, emoji: String, prize: u64 },
}

// ── Handles and expiry notifications ────────────────────────────────

/// Opaque cancellable token for a scheduled effect. Stale handles (whose
/// effect was superseded or already finished) cancel nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectHandle {
    class: EffectClass,
    generation: u64,
}

impl EffectHandle {
    /// The effect class this handle refers to.
    pub fn class(&self) -> EffectClass {
        self.class
    }
}

/// Delivered on the expiry channel when an effect runs to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectExpiry {
    pub class: EffectClass,
    generation: u64,
}

struct LiveEffect {
    generation: u64,
    task: tokio::task::JoinHandle<()>,
}

// ── Scheduler ───────────────────────────────────────────────────────

/// Owns every timed effect and its timer task.
///
/// Lives on the controller's dispatch task; all methods are synchronous.
/// Timer callbacks never touch the scheduler itself — they only call the
/// view and push an [`EffectExpiry`] back to the dispatch loop, which
/// acknowledges it through [`EffectScheduler::acknowledge`].
pub struct EffectScheduler<V: ViewBinding> {
    view: Arc<V>,
    expiry_tx: mpsc::UnboundedSender<EffectExpiry>,
    live: HashMap<EffectClass, LiveEffect>,
    next_generation: u64,
}

impl<V: ViewBinding> EffectScheduler<V> {
    /// Create a scheduler and the expiry receiver the dispatch loop should
    /// select on.
    pub fn new(view: Arc<V>) -> (Self, mpsc::UnboundedReceiver<EffectExpiry>) {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            view,
            expiry_tx,
            live: HashMap::new(),
            next_generation: 0,
        };
        (scheduler, expiry_rx)
    }

    /// Schedule an effect, superseding any live instance of the same class.
    ///
    /// Visual effects (those with a `payload`) become visible synchronously,
    /// start hiding after `show_for`, and are removed
    /// [`EFFECT_REMOVAL_DELAY`] later. Non-visual effects simply expire
    /// after `show_for`.
    pub fn schedule(
        &mut self,
        class: EffectClass,
        payload: Option<EffectPayload>,
        show_for: Duration,
    ) -> EffectHandle {
        self.cancel_class(class);

        if let Some(payload) = &payload {
            self.view.show_effect(class, payload);
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let view = Arc::clone(&self.view);
        let expiry_tx = self.expiry_tx.clone();
        let visual = class.is_visual() && payload.is_some();

        let task = tokio::spawn(async move {
            tokio::time::sleep(show_for).await;
            if visual {
                view.begin_effect_hide(class);
                tokio::time::sleep(EFFECT_REMOVAL_DELAY).await;
                view.remove_effect(class);
            }
            // Receiver dropped means the controller is tearing down.
            let _ = expiry_tx.send(EffectExpiry { class, generation });
        });

        debug!(?class, generation, "effect scheduled");
        self.live.insert(class, LiveEffect { generation, task });
        EffectHandle { class, generation }
    }

    /// Cancel a specific scheduled effect. A stale handle is a no-op.
    /// Cancelling suppresses both pending transitions and removes the
    /// element immediately.
    pub fn cancel(&mut self, handle: EffectHandle) -> bool {
        match self.live.get(&handle.class) {
            Some(live) if live.generation == handle.generation => self.cancel_class(handle.class),
            _ => false,
        }
    }

    /// Cancel whatever instance of `class` is live, if any.
    pub fn cancel_class(&mut self, class: EffectClass) -> bool {
        let Some(live) = self.live.remove(&class) else {
            return false;
        };
        live.task.abort();
        if class.is_visual() {
            self.view.remove_effect(class);
        }
        debug!(?class, generation = live.generation, "effect cancelled");
        true
    }

    /// Cancel every outstanding effect. Called on teardown so no timer can
    /// fire against a torn-down view.
    pub fn cancel_all(&mut self) {
        let classes: Vec<EffectClass> = self.live.keys().copied().collect();
        for class in classes {
            self.cancel_class(class);
        }
    }

    /// Acknowledge an expiry delivered on the channel. Returns `true` when
    /// the expiry belongs to the currently live instance (the dispatch loop
    /// must ignore stale ones).
    pub fn acknowledge(&mut self, expiry: EffectExpiry) -> bool {
        match self.live.get(&expiry.class) {
            Some(live) if live.generation == expiry.generation => {
                self.live.remove(&expiry.class);
                true
            }
            _ => false,
        }
    }

    /// Whether an instance of `class` is currently live.
    pub fn is_live(&self, class: EffectClass) -> bool {
        self.live.contains_key(&class)
    }
}

impl<V: ViewBinding> Drop for EffectScheduler<V> {
    fn drop(&mut self) {
        // Abort without view calls: the view may already be gone.
        for live in self.live.values() {
            live.task.abort();
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
