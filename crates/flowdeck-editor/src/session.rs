//! Editing sessions.
//!
//! An [`EditorSession`] owns one flow document for the lifetime of an
//! editing tab. It dispatches user actions against the document, keeps
//! validation and the overlays in step after every change, writes dirty
//! documents through to the local cache and pushes them to the pipeline
//! service on save.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, info, info_span, warn, Instrument};

use flowdeck_client::{ClientError, PipelineApi};
use flowdeck_graph::{
    build_payload, validate_document, DebugState, FlowDocument, FlowId, GraphError, NodeId,
    SearchState, ValidationReport,
};
use flowdeck_store::FlowCache;

use crate::actions::EditorAction;
use crate::autosave::{spawn_autosave, AutosaveHandle};
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};

/// Name given to a pipeline that does not exist anywhere yet.
const DEFAULT_PIPELINE_NAME: &str = "Untitled pipeline";

/// Notices older than this many entries are dropped.
const MAX_NOTICES: usize = 50;

/// How loud a notice is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational, e.g. recovered unsaved changes.
    Info,
    /// Something was ignored or degraded, e.g. a rejected connection.
    Warning,
    /// Something went wrong, e.g. the service rejected a save.
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// How loud the notice is.
    pub severity: Severity,
    /// Human-readable text.
    pub message: String,
    /// When the notice was raised.
    pub at: DateTime<Utc>,
}

/// Outcome of one save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// The document was pushed to the service.
    Saved,
    /// Nothing to do, the document had no unsaved changes.
    SkippedClean,
    /// Another save was already in flight.
    SkippedBusy,
    /// Local validation failed, nothing was sent.
    Invalid,
    /// The service refused the pipeline.
    Rejected,
}

/// Everything about a session that is not the document itself.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Result of the latest validation pass.
    pub validation: ValidationReport,
    /// Problems reported by the service on the last rejected save.
    pub server_errors: Vec<String>,
    /// Service-side log output from the last save attempt.
    pub save_logs: Option<String>,
    /// Transient user-facing messages, oldest first.
    pub notices: Vec<Notice>,
    /// Label search over the canvas.
    pub search: SearchState,
    /// Debug chips shown on the canvas.
    pub debug: DebugState,
    /// Node whose configuration form is open, if any.
    pub editing: Option<NodeId>,
    /// Whether the pipeline exists on the service.
    pub remote_known: bool,
    /// When the last successful save finished.
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl SessionState {
    fn push_notice(&mut self, severity: Severity, message: impl Into<String>) {
        self.notices.push(Notice {
            severity,
            message: message.into(),
            at: Utc::now(),
        });
        if self.notices.len() > MAX_NOTICES {
            self.notices.remove(0);
        }
    }
}

/// Shared interior of a session.
///
/// The document and the session state live behind separate locks so a
/// save can serialize the document without blocking overlay reads.
/// Every path that takes both locks takes the document lock first.
#[derive(Debug)]
pub(crate) struct SessionCore {
    flow_id: FlowId,
    api: Arc<dyn PipelineApi>,
    cache: Arc<dyn FlowCache>,
    document: RwLock<FlowDocument>,
    state: RwLock<SessionState>,
    save_gate: Mutex<()>,
}

impl SessionCore {
    pub(crate) fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    /// Apply one editor action to the document and bring validation,
    /// search, debug chips and the cache back in step.
    pub(crate) async fn dispatch(&self, action: EditorAction) -> EditorResult<()> {
        debug!(?action, "Dispatching editor action");
        let mut document = self.document.write().await;
        let mut state = self.state.write().await;

        match action {
            EditorAction::AddNode { kind, position } => {
                let id = document.add_node(kind, position);
                document.select(Some(id))?;
            }
            EditorAction::AddPlaceholder { position } => {
                let id = document.add_placeholder(position);
                document.select(Some(id))?;
            }
            EditorAction::DeleteNodes { ids } => {
                document.remove_nodes(&ids)?;
            }
            EditorAction::CloneNode { id } => {
                let copy = document.clone_node(&id)?;
                document.select(Some(copy))?;
            }
            EditorAction::RenameNode { id, label } => {
                document.rename_node(&id, &label)?;
            }
            EditorAction::MoveNode { id, position } => {
                document.move_node(&id, position)?;
            }
            EditorAction::ResizeNode { id, dimensions } => {
                document.resize_node(&id, dimensions)?;
            }
            EditorAction::SetName { name } => {
                document.set_name(name);
            }
            EditorAction::SelectNode { id } => {
                document.select(id)?;
            }
            EditorAction::BeginEdit { id } => {
                document.select(Some(id.clone()))?;
                state.editing = Some(id);
            }
            EditorAction::EndEdit => {
                state.editing = None;
            }
            // Connections the graph refuses for benign reasons become
            // notices instead of errors, matching how the canvas shrugs
            // off a duplicate or self-referential drag.
            EditorAction::Connect { source, target } => match document.connect(&source, &target) {
                Ok(_) => {}
                Err(err @ (GraphError::DuplicateEdge { .. } | GraphError::SelfLoop(_))) => {
                    state.push_notice(Severity::Warning, err.to_string());
                }
                Err(err) => return Err(err.into()),
            },
            EditorAction::Disconnect { edge } => {
                document.disconnect(&edge)?;
            }
            EditorAction::SetField { id, name, value } => {
                document.set_field(&id, &name, value)?;
            }
            EditorAction::SetSearch { query } => {
                state.search.set_query(query, &document);
            }
            EditorAction::SearchNext => {
                state.search.next();
                if let Some(current) = state.search.current().cloned() {
                    document.select(Some(current))?;
                }
            }
            EditorAction::SearchPrev => {
                state.search.prev();
                if let Some(current) = state.search.current().cloned() {
                    document.select(Some(current))?;
                }
            }
            EditorAction::ToggleDebug { id } => {
                if document.node(&id).is_none() {
                    return Err(GraphError::NodeNotFound(id).into());
                }
                state.debug.toggle(&id);
            }
            EditorAction::ClearDebug => {
                state.debug.clear();
            }
        }

        // Revalidate and keep the overlays consistent with the new graph.
        let report = validate_document(&document);
        document.apply_validation(&report);
        state.validation = report;
        state.search.refresh(&document);
        state.debug.prune(&document);
        if let Some(editing) = &state.editing {
            if document.node(editing).is_none() {
                state.editing = None;
            }
        }

        // Write dirty documents through to the cache so unsaved work
        // survives a crash. Failures degrade recovery, nothing else.
        if document.is_dirty() {
            if let Err(source) = self.cache.store_flow(&self.flow_id, &document).await {
                warn!(%source, "Failed to cache flow document");
            }
        }

        Ok(())
    }

    /// Push the document to the pipeline service if it needs it.
    ///
    /// Exactly one save runs at a time. A second caller is turned away
    /// with [`SaveStatus::SkippedBusy`] instead of queueing behind the
    /// first.
    pub(crate) async fn save_now(&self) -> EditorResult<SaveStatus> {
        let _gate = match self.save_gate.try_lock() {
            Ok(gate) => gate,
            Err(_) => {
                debug!("Save already in flight, skipping");
                return Ok(SaveStatus::SkippedBusy);
            }
        };

        let span = info_span!("save_pipeline", flow_id = %self.flow_id);
        async move {
            let (payload, revision, update_remote) = {
                let mut document = self.document.write().await;
                if !document.is_dirty() {
                    debug!("Document is clean, nothing to save");
                    return Ok(SaveStatus::SkippedClean);
                }

                let report = validate_document(&document);
                if !report.is_empty() {
                    debug!(issues = report.issues().len(), "Validation failed, not saving");
                    document.apply_validation(&report);
                    let mut state = self.state.write().await;
                    state.validation = report;
                    return Ok(SaveStatus::Invalid);
                }

                // Cycles are legal to edit but the service will refuse
                // them, so flag them early.
                if let Some(cycle) = document.find_cycle() {
                    warn!(nodes = cycle.len(), "Pipeline contains a dependency cycle");
                }

                document.stamp_dependencies();
                let payload = build_payload(&document)?;
                let update_remote = self.state.read().await.remote_known;
                (payload, document.revision(), update_remote)
            };

            // The service round trip runs without the document lock, so
            // editing stays responsive during a slow save.
            let outcome = if update_remote {
                info!("Updating pipeline");
                match self.api.update_pipeline(self.flow_id.as_str(), &payload).await {
                    // An offline recovery assumes the pipeline exists on
                    // the service; a 404 here means it never did.
                    Err(err) if err.is_not_found() => {
                        warn!("Pipeline is not on the service, creating it");
                        self.api.create_pipeline(&payload).await
                    }
                    other => other,
                }
            } else {
                info!("Creating pipeline");
                self.api.create_pipeline(&payload).await
            };

            match outcome {
                Ok(saved) => {
                    let mut document = self.document.write().await;
                    let settled = document.mark_saved(revision);
                    let mut state = self.state.write().await;
                    state.remote_known = true;
                    state.server_errors.clear();
                    state.save_logs = saved.logs;
                    state.last_saved_at = Some(Utc::now());
                    drop(state);

                    if let Err(source) = self.cache.store_flow(&self.flow_id, &document).await {
                        warn!(%source, "Failed to cache flow document");
                    }

                    if settled {
                        info!("Pipeline saved");
                    } else {
                        info!("Pipeline saved, edits arrived during the save");
                    }
                    Ok(SaveStatus::Saved)
                }
                Err(ClientError::Rejected(rejection)) => {
                    warn!(errors = rejection.errors.len(), "Service rejected the pipeline");
                    let mut state = self.state.write().await;
                    state.server_errors = if rejection.errors.is_empty() {
                        vec![rejection.message.clone()]
                    } else {
                        rejection.errors.clone()
                    };
                    state.save_logs = rejection.logs.clone();
                    state.push_notice(Severity::Error, rejection.message);
                    Ok(SaveStatus::Rejected)
                }
                Err(err) => Err(err.into()),
            }
        }
        .instrument(span)
        .await
    }

    /// Record a failed background save where the user can see it.
    pub(crate) async fn note_save_failure(&self, source: &EditorError) {
        let mut state = self.state.write().await;
        state.push_notice(Severity::Warning, format!("Auto-save failed: {}", source));
    }

    /// Delete the pipeline from the service and the local cache.
    pub(crate) async fn delete_flow(&self) -> EditorResult<()> {
        let remote_known = self.state.read().await.remote_known;
        if remote_known {
            match self.api.delete_pipeline(self.flow_id.as_str()).await {
                Ok(()) => {}
                // Already gone on the service is fine, the cache entry
                // still has to go.
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err.into()),
            }
        }
        self.cache.remove_flow(&self.flow_id).await?;
        info!(flow_id = %self.flow_id, "Pipeline deleted");
        Ok(())
    }
}

/// One open pipeline under edit.
pub struct EditorSession {
    core: Arc<SessionCore>,
    autosave: Option<AutosaveHandle>,
}

impl EditorSession {
    /// Open a session for a flow.
    ///
    /// The service copy is fetched first to establish whether the
    /// pipeline exists. A dirty cached copy wins over the fetched one so
    /// unsaved changes from a crashed session come back; if the service
    /// is unreachable the cached copy is used as a fallback.
    pub async fn open(
        flow_id: FlowId,
        config: &EditorConfig,
        api: Arc<dyn PipelineApi>,
        cache: Arc<dyn FlowCache>,
    ) -> EditorResult<Self> {
        let span = info_span!("open_flow", %flow_id);
        async move {
            let mut state = SessionState::default();

            let mut document = match api.get_pipeline(flow_id.as_str()).await {
                Ok(detail) => {
                    state.remote_known = true;
                    match cache.load_flow(&flow_id).await {
                        Ok(cached) if cached.is_dirty() => {
                            info!("Recovered unsaved changes from the local cache");
                            state.push_notice(Severity::Info, "Recovered unsaved changes");
                            cached
                        }
                        _ => detail.into_document()?,
                    }
                }
                Err(err) if err.is_not_found() => match cache.load_flow(&flow_id).await {
                    Ok(cached) => {
                        info!("Pipeline is not on the service yet, editing the cached copy");
                        if cached.is_dirty() {
                            state.push_notice(Severity::Info, "Recovered unsaved changes");
                        }
                        cached
                    }
                    Err(_) => {
                        info!("Starting an empty pipeline");
                        FlowDocument::new(flow_id.clone(), DEFAULT_PIPELINE_NAME)
                    }
                },
                Err(err) if err.is_transport() => match cache.load_flow(&flow_id).await {
                    Ok(cached) => {
                        warn!(error = %err, "Pipeline service unreachable, editing the cached copy");
                        state.push_notice(
                            Severity::Warning,
                            "Pipeline service unreachable, working from the cached copy",
                        );
                        state.remote_known = true;
                        cached
                    }
                    Err(_) => return Err(err.into()),
                },
                Err(err) => return Err(err.into()),
            };

            let report = validate_document(&document);
            document.apply_validation(&report);
            state.validation = report;

            let core = Arc::new(SessionCore {
                flow_id,
                api,
                cache,
                document: RwLock::new(document),
                state: RwLock::new(state),
                save_gate: Mutex::new(()),
            });

            let autosave = config
                .autosave_period()
                .map(|period| spawn_autosave(core.clone(), period));

            Ok(Self { core, autosave })
        }
        .instrument(span)
        .await
    }

    /// Id of the flow this session edits.
    pub fn flow_id(&self) -> &FlowId {
        self.core.flow_id()
    }

    /// Read access to the document.
    pub async fn document(&self) -> RwLockReadGuard<'_, FlowDocument> {
        self.core.document.read().await
    }

    /// Read access to validation results, notices and overlays.
    pub async fn state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.core.state.read().await
    }

    /// Apply one editor action.
    pub async fn dispatch(&self, action: EditorAction) -> EditorResult<()> {
        self.core.dispatch(action).await
    }

    /// Save immediately, regardless of the auto-save schedule.
    pub async fn save_now(&self) -> EditorResult<SaveStatus> {
        self.core.save_now().await
    }

    /// Delete the pipeline from the service and the local cache.
    pub async fn delete_pipeline(&self) -> EditorResult<()> {
        self.core.delete_flow().await
    }

    /// Whether a background auto-save task is running.
    pub fn autosave_running(&self) -> bool {
        self.autosave.is_some()
    }

    /// Stop the background auto-save task. Manual saves still work.
    pub fn stop_autosave(&mut self) {
        self.autosave = None;
    }
}
