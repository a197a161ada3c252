//! The edit session
//!
//! [`Wardrobe`] owns the scene graph, the current character and wearables,
//! the selection, the undo history and the position store. Every operation
//! runs to completion on the caller's thread; asset fetching is the only
//! step that happens elsewhere (see [`Wardrobe::request_load`]).
//!
//! Changes the UI must hear about are queued as [`CoreToUi`] messages and
//! collected with [`Wardrobe::drain_outbound`].

mod adjust;
mod framing;
mod loading;
mod outfit;
mod selection;
mod undo;


pub use framing::frame_character;
pub use loading::{LoadCompletion, LoadOutcome, LoadRequestOutcome, LoadTicket};
pub use outfit::Outfit;

use avatar_config::BuilderConfig;
use avatar_ipc::{
    CoreToUi, GizmoCommand, GizmoMode, HatCommand, HistoryCommand, ObjectCommand, SelectableObject, UiToCore,
    WearableCategory,
};
use tracing::{debug, info, warn};

use crate::error::WardrobeError;
use crate::graph::{NodeId, SceneGraph, SceneNode};
use crate::history::{DeletedNode, GroupSnapshot, History, HistoryEntry};
use crate::keys::{self, EditorCommand, KeyInput};
use crate::manipulate::{Manipulator, NullManipulator};
use crate::persist::{self, PositionStore};
use crate::store::{KeyValueStore, MemoryStore};

use loading::LoadQueue;

/// Name of the node every character is parented under
pub const SCENE_ROOT_NAME: &str = "Scene";

/// The loaded base character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub root: NodeId,
    pub name: String,
}

/// Avatar edit session
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
pub struct Wardrobe {
    config: BuilderConfig,
    graph: SceneGraph,
    scene_root: NodeId,
    character: Option<Character>,
    hat: Option<NodeId>,
    shirt: Option<NodeId>,
    selected: Option<NodeId>,
    edit_mode: bool,
    gizmo_mode: GizmoMode,
    dragging: bool,
    text_focus: bool,
    history: History,
    positions: PositionStore,
    manipulator: Box<dyn Manipulator>,
    loads: LoadQueue,
    /// Randomized outfit waiting for its fur
    outfit: Option<Outfit>,
    outbound: Vec<CoreToUi>,
}

impl Wardrobe {
    pub fn new(config: BuilderConfig, store: Box<dyn KeyValueStore>, manipulator: Box<dyn Manipulator>) -> Self {
        let mut graph = SceneGraph::new();
        let scene_root = graph.insert(SceneNode::group(SCENE_ROOT_NAME));
        let positions = PositionStore::new(store, config.storage_key.clone());
        info!(
            "Wardrobe session started (history limit {}, storage key '{}')",
            config.max_history,
            positions.key()
        );
        Self {
            history: History::new(config.max_history),
            config,
            graph,
            scene_root,
            character: None,
            hat: None,
            shirt: None,
            selected: None,
            edit_mode: false,
            gizmo_mode: GizmoMode::default(),
            dragging: false,
            text_focus: false,
            positions,
            manipulator,
            loads: LoadQueue::default(),
            outfit: None,
            outbound: Vec::new(),
        }
    }

    /// Session with an in-memory store and no gizmo
    pub fn in_memory(config: BuilderConfig) -> Self {
        Self::new(config, Box::new(MemoryStore::new()), Box::new(NullManipulator))
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable graph access for the rendering adapter. Edits made here are
    /// not recorded until the next commit.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn scene_root(&self) -> NodeId {
        self.scene_root
    }

    pub fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    pub fn hat(&self) -> Option<NodeId> {
        self.hat
    }

    pub fn shirt(&self) -> Option<NodeId> {
        self.shirt
    }

    pub fn wearable(&self, category: WearableCategory) -> Option<NodeId> {
        match category {
            WearableCategory::Hat => self.hat,
            WearableCategory::Shirt => self.shirt,
        }
    }

    fn slot_mut(&mut self, category: WearableCategory) -> &mut Option<NodeId> {
        match category {
            WearableCategory::Hat => &mut self.hat,
            WearableCategory::Shirt => &mut self.shirt,
        }
    }

    /// Logical name of the current wearable of `category`
    pub fn wearable_name(&self, category: WearableCategory) -> Option<&str> {
        let group = self.wearable(category)?;
        self.graph.get(group)?.tag.as_ref().map(|t| t.name.as_str())
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn gizmo_mode(&self) -> GizmoMode {
        self.gizmo_mode
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_loading(&self) -> bool {
        self.loads.is_busy()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn positions(&self) -> &PositionStore {
        &self.positions
    }

    /// Queued UI messages, oldest first
    pub fn outbound(&self) -> &[CoreToUi] {
        &self.outbound
    }

    /// Take all queued UI messages, leaving the queue empty
    pub fn drain_outbound(&mut self) -> Vec<CoreToUi> {
        std::mem::take(&mut self.outbound)
    }

    fn emit(&mut self, message: CoreToUi) {
        self.outbound.push(message);
    }

    fn alert(&mut self, error: &WardrobeError) {
        warn!("{}", error);
        self.emit(CoreToUi::Alert {
            message: error.to_string(),
        });
    }

    /// Record the current hat and shirt state.
    ///
    /// The state is written to the position store as well; a store failure
    /// is logged and otherwise ignored. Returns false if the entry matched
    /// the current one and was not stored.
    pub fn commit(&mut self, action: impl Into<String>) -> bool {
        let entry = self.snapshot_entry(action);
        self.push_entry(entry)
    }

    fn snapshot_entry(&self, action: impl Into<String>) -> HistoryEntry {
        HistoryEntry::new(
            action,
            self.hat.and_then(|g| GroupSnapshot::capture(&self.graph, g)),
            self.shirt.and_then(|g| GroupSnapshot::capture(&self.graph, g)),
        )
    }

    fn commit_deletion(&mut self, action: String, deleted: DeletedNode) {
        let entry = self.snapshot_entry(action).with_deleted(deleted);
        self.push_entry(entry);
    }

    fn push_entry(&mut self, entry: HistoryEntry) -> bool {
        let action = entry.action.clone();
        let outcome = self.history.push(entry);
        for dropped in outcome.dropped {
            if let Some(deleted) = dropped.deleted {
                self.release_deleted(deleted.node);
            }
        }
        if !outcome.coalesced {
            debug!(
                "History: '{}' ({}/{})",
                action,
                self.history.current_index().map_or(0, |i| i + 1),
                self.history.len()
            );
        }
        self.persist();
        !outcome.coalesced
    }

    /// Free a node that left the history, unless something still uses it
    fn release_deleted(&mut self, node: NodeId) {
        let in_use = self.graph.parent(node).is_some()
            || Some(node) == self.hat
            || Some(node) == self.shirt
            || self.character.as_ref().is_some_and(|c| c.root == node)
            || self.history.owns_deleted(node);
        if !in_use && self.graph.contains(node) {
            debug!("Freeing deleted node '{}'", self.graph.name(node).unwrap_or_default());
            self.graph.remove_subtree(node);
        }
    }

    fn persist(&mut self) {
        let positions = persist::capture(&self.graph, self.hat, self.shirt);
        if let Err(e) = self.positions.write(&positions) {
            warn!("Could not save positions: {}", e);
        }
    }

    /// Write the current hat and shirt transforms to the store.
    /// Returns the names that were saved.
    pub fn save_positions(&mut self) -> Vec<String> {
        let positions = persist::capture(&self.graph, self.hat, self.shirt);
        let names = positions.names();
        match self.positions.write(&positions) {
            Ok(()) => {
                info!("Saved positions for {:?}", names);
                self.emit(CoreToUi::PositionsSaved { names: names.clone() });
                names
            }
            Err(e) => {
                warn!("Could not save positions: {}", e);
                Vec::new()
            }
        }
    }

    /// Selectable ids and labels for the current wearables
    pub fn selectable_objects(&self) -> Vec<SelectableObject> {
        let mut objects = Vec::new();
        for category in WearableCategory::ALL {
            let Some(group) = self.wearable(category) else { continue };
            objects.push(SelectableObject {
                id: category.as_str().to_string(),
                label: format!("{} (Group)", category.title()),
            });
            for (index, child) in self.graph.children(group).iter().enumerate() {
                let name = self
                    .graph
                    .name(*child)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Mesh {}", index));
                objects.push(SelectableObject {
                    id: format!("{}_{}", category.as_str(), index),
                    label: format!("{}: {}", category.title(), name),
                });
            }
        }
        objects
    }

    fn publish_selectables(&mut self) {
        let objects = self.selectable_objects();
        self.emit(CoreToUi::SelectableObjectsChanged { objects });
    }

    /// A text input gained or lost focus. Keys are ignored while focused.
    pub fn set_text_focus(&mut self, focused: bool) {
        self.text_focus = focused;
    }

    /// Resolve and run a key press. Returns the command that ran.
    pub fn handle_key(&mut self, input: KeyInput) -> Option<EditorCommand> {
        if self.text_focus {
            return None;
        }
        let editable = self.edit_mode && self.selected.is_some();
        let command = keys::resolve(input, editable)?;
        self.execute(command);
        Some(command)
    }

    pub fn execute(&mut self, command: EditorCommand) {
        match command {
            EditorCommand::Undo => {
                self.undo();
            }
            EditorCommand::Redo => {
                self.redo();
            }
            EditorCommand::SetMode(mode) => self.set_gizmo_mode(mode),
            EditorCommand::DeleteSelected => {
                self.delete_selected();
            }
        }
    }

    /// Apply a UI message.
    ///
    /// Load requests are not fetched here: a started load is returned as a
    /// ticket for the caller to fetch and hand back to
    /// [`Wardrobe::complete_load`]. Errors have already been reported to the
    /// UI as alerts when they are returned.
    pub fn handle_message(&mut self, message: UiToCore) -> Result<Option<LoadTicket>, WardrobeError> {
        match message {
            UiToCore::LoadAsset { kind, name } => match self.request_load(kind, &name)? {
                LoadRequestOutcome::Started(ticket) => return Ok(Some(ticket)),
                LoadRequestOutcome::Queued => {}
            },
            UiToCore::LoadCustom { path } => return self.load_custom(&path),
            UiToCore::Randomize => return self.randomize(),
            UiToCore::RequestCatalog => self.publish_catalog(),
            UiToCore::RemoveWearable { category } => {
                self.remove_wearable(category);
            }
            UiToCore::SetEditMode { enabled } => self.set_edit_mode(enabled),
            UiToCore::ObjectCommand(command) => match command {
                ObjectCommand::Select { id } => self.select_by_id(&id)?,
                ObjectCommand::Pick { origin, direction } => {
                    self.pick(origin.into(), direction.into());
                }
                ObjectCommand::Deselect => self.deselect(),
                ObjectCommand::Transform { id, transform } => self.set_transform(&id, transform)?,
                ObjectCommand::Delete => {
                    self.delete_selected();
                }
            },
            UiToCore::GizmoCommand(command) => match command {
                GizmoCommand::SetMode(mode) => self.set_gizmo_mode(mode),
                GizmoCommand::DragChanged { dragging } => self.drag_changed(dragging),
            },
            UiToCore::HistoryCommand(command) => match command {
                HistoryCommand::Undo => {
                    self.undo();
                }
                HistoryCommand::Redo => {
                    self.redo();
                }
            },
            UiToCore::HatCommand(command) => match command {
                HatCommand::Nudge { direction, amount } => {
                    self.move_hat(direction, amount);
                }
                HatCommand::Rotate { rotation, angle } => {
                    self.rotate_hat(rotation, angle);
                }
            },
            UiToCore::SavePositions => {
                self.save_positions();
            }
            UiToCore::TextInputFocus { focused } => self.set_text_focus(focused),
        }
        Ok(None)
    }
}

impl std::fmt::Debug for Wardrobe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wardrobe")
            .field("character", &self.character)
            .field("hat", &self.hat)
            .field("shirt", &self.shirt)
            .field("selected", &self.selected)
            .field("edit_mode", &self.edit_mode)
            .field("outfit", &self.outfit)
            .field("history", &self.history.len())
            .finish()
    }
}
