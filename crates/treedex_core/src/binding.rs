//! Per-block render lifecycle.
//!
//! One [`IndexBinding`] ties a single embedded directive instance to its
//! mount target and its change subscriptions. Lifecycle:
//! `Unmounted → Mounting → Idle ⇄ Rendering → Unmounted`. Every change
//! notification triggers one full render pass in notification order; there
//! is no debouncing and no reentrancy guard. Overlapping passes race on the
//! mount target and the last writer wins: renders are idempotent functions
//! of current tree state, so a lost race heals on the next notification.

use crate::block_config::BlockConfig;
use crate::event_bus::{EventBus, Listener, SETTINGS_UPDATE};
use crate::resolver::resolve_entries;
use crate::tree::{
    MarkdownEngine, ProduceOptions, RenderError, Subscription, TextRenderer, TreeChange, Vault,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Identifies one binding towards the host engine, which scopes rendering
/// side effects to it and can drop them after the binding unmounts.
pub type BindingId = u64;

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

/// Output surface owned exclusively by one binding.
///
/// Cleared and fully repopulated on every render pass; there is no
/// incremental diffing.
#[derive(Debug, Default)]
pub struct MountTarget {
    content: Mutex<String>,
}

impl MountTarget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn clear(&self) {
        self.content.lock().clear();
    }

    pub fn set_content(&self, content: String) {
        *self.content.lock() = content;
    }

    pub fn content(&self) -> String {
        self.content.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.content.lock().is_empty()
    }
}

/// Handles to the host collaborators one binding renders through.
#[derive(Clone)]
pub struct HostContext {
    pub vault: Arc<dyn Vault>,
    pub text_renderer: Arc<dyn TextRenderer>,
    pub engine: Arc<dyn MarkdownEngine>,
    pub bus: Arc<EventBus>,
}

/// Lifecycle state of one binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unmounted,
    Mounting,
    Idle,
    Rendering,
}

/// The live association between one directive block instance, its source
/// document, its mount target and its subscriptions.
pub struct IndexBinding {
    id: BindingId,
    weak_self: Weak<IndexBinding>,
    host: HostContext,
    /// Path of the document embedding the directive block.
    source_path: String,
    /// Raw directive block text, reparsed on every render pass.
    block_source: String,
    target: Arc<MountTarget>,
    state: Mutex<BindingState>,
    /// Disposers for the tree-change registrations this binding made.
    subscriptions: Mutex<Vec<Subscription>>,
    /// The exact listener registered on the bus, kept so unmount can `off`
    /// the registration it made and nothing else.
    settings_listener: Mutex<Option<Listener>>,
}

impl IndexBinding {
    pub fn new(
        host: HostContext,
        source_path: impl Into<String>,
        block_source: impl Into<String>,
        target: Arc<MountTarget>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            id: NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed),
            weak_self: weak_self.clone(),
            host,
            source_path: source_path.into(),
            block_source: block_source.into(),
            target,
            state: Mutex::new(BindingState::Unmounted),
            subscriptions: Mutex::new(Vec::new()),
            settings_listener: Mutex::new(None),
        })
    }

    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn state(&self) -> BindingState {
        *self.state.lock()
    }

    pub fn target(&self) -> Arc<MountTarget> {
        self.target.clone()
    }

    /// Bind to the host: render once, then subscribe to settings updates
    /// and tree changes.
    ///
    /// The create subscription is deferred until the host layout is ready;
    /// a host scanning its tree during startup fires one create per
    /// discovered file and each would otherwise trigger a full render.
    pub async fn mount(&self) -> Result<(), RenderError> {
        *self.state.lock() = BindingState::Mounting;
        tracing::debug!(
            binding_id = self.id,
            source_path = %self.source_path,
            "Mounting index binding"
        );

        self.render().await?;

        let settings_listener: Listener = {
            let binding = self.weak_self.clone();
            Arc::new(move |_detail: &Value| {
                if let Some(binding) = binding.upgrade() {
                    binding.trigger_rerender();
                }
            })
        };
        self.host.bus.on(SETTINGS_UPDATE, settings_listener.clone());
        *self.settings_listener.lock() = Some(settings_listener);

        {
            let mut subscriptions = self.subscriptions.lock();
            subscriptions.push(self.subscribe_tree_change(TreeChange::Rename));
            subscriptions.push(self.subscribe_tree_change(TreeChange::Delete));
        }

        let deferred = {
            let binding = self.weak_self.clone();
            Box::new(move || {
                let Some(binding) = binding.upgrade() else {
                    return;
                };
                // The binding may have unmounted while the layout was
                // still settling.
                if binding.state() == BindingState::Unmounted {
                    return;
                }
                let subscription = binding.subscribe_tree_change(TreeChange::Create);
                binding.subscriptions.lock().push(subscription);
            })
        };
        self.host.vault.on_layout_ready(deferred);

        *self.state.lock() = BindingState::Idle;
        Ok(())
    }

    fn subscribe_tree_change(&self, change: TreeChange) -> Subscription {
        let binding = self.weak_self.clone();
        self.host.vault.on_tree_change(
            change,
            Arc::new(move |_change| {
                if let Some(binding) = binding.upgrade() {
                    binding.trigger_rerender();
                }
            }),
        )
    }

    /// Kick off one full render pass in a fresh task.
    ///
    /// Each notification gets its own pass; passes may overlap.
    pub fn trigger_rerender(&self) {
        if self.state() == BindingState::Unmounted {
            return;
        }
        let Some(binding) = self.weak_self.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = binding.render().await {
                tracing::error!(
                    ?err,
                    binding_id = binding.id,
                    source_path = %binding.source_path,
                    "Failed to re-render index block"
                );
            }
        });
    }

    /// One render pass: clear the mount target, reparse the block config,
    /// resolve the entry slice, produce Markdown text and hand it to the
    /// host engine.
    ///
    /// An unresolvable target path leaves the target empty, which is not
    /// an error; collaborator failures propagate unwrapped.
    pub async fn render(&self) -> Result<(), RenderError> {
        {
            let mut state = self.state.lock();
            if *state != BindingState::Unmounted {
                *state = BindingState::Rendering;
            }
        }

        let result = self.render_pass().await;

        {
            let mut state = self.state.lock();
            if *state == BindingState::Rendering {
                *state = BindingState::Idle;
            }
        }
        result
    }

    async fn render_pass(&self) -> Result<(), RenderError> {
        self.target.clear();

        let config = BlockConfig::parse(&self.block_source);
        let Some(entries) = resolve_entries(self.host.vault.as_ref(), &config, &self.source_path)
        else {
            tracing::debug!(
                binding_id = self.id,
                target_path = config.path.as_deref().unwrap_or(&self.source_path),
                "Index target does not resolve, leaving the block empty"
            );
            return Ok(());
        };

        let text = self
            .host
            .text_renderer
            .produce(
                &entries,
                ProduceOptions {
                    recursion_limit: config.depth,
                },
            )
            .await?;

        self.host
            .engine
            .render(&text, &self.target, &self.source_path, self.id)
            .await
    }

    /// Release everything this binding registered: the bus listener is
    /// `off`ed, the collected tree subscriptions are disposed exactly once.
    /// An in-flight render pass is not cancelled; it finishes against the
    /// detached target.
    pub fn unmount(&self) {
        *self.state.lock() = BindingState::Unmounted;

        if let Some(listener) = self.settings_listener.lock().take() {
            self.host.bus.off(SETTINGS_UPDATE, &listener);
        }

        let mut subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        for subscription in subscriptions.iter_mut() {
            subscription.dispose();
        }

        tracing::debug!(binding_id = self.id, "Unmounted index binding");
    }
}
