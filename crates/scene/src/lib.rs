//! Bevy adapter for the avatar builder
//!
//! Hosts the [`Wardrobe`] edit session as a resource, fetches assets off the
//! main thread, maps keyboard input to editor commands and queues
//! [`CoreToUi`] messages for whichever UI host the app wires up.

use avatar_config::BuilderConfig;
use avatar_ipc::{AssetKind, CoreToUi, UiToCore};
use bevy::ecs::message::Message;
use bevy::prelude::*;
use wardrobe::{FileStore, KeyValueStore, MemoryStore, Wardrobe};

mod gizmo;
mod hotkeys;
mod loading;

pub use gizmo::{ChannelManipulator, GizmoBinding, GizmoEvent};
pub use hotkeys::{key_input_for, HotkeyPlugin};
pub use loading::{AssetLibrary, LoadChannel, LoadResult};

/// Resource for queuing messages to send to the UI.
/// The app crate drains this and writes to its UI transport.
#[derive(Resource, Default)]
pub struct OutboundUiMessages {
    pub messages: Vec<CoreToUi>,
}

impl OutboundUiMessages {
    /// Queue a message to be sent to the UI
    pub fn send(&mut self, msg: CoreToUi) {
        self.messages.push(msg);
    }

    /// Take all queued messages, leaving the queue empty
    pub fn drain(&mut self) -> Vec<CoreToUi> {
        std::mem::take(&mut self.messages)
    }
}

/// A message from the UI, delivered to the wardrobe this frame
#[derive(Message, Debug, Clone)]
pub struct UiCommand(pub UiToCore);

/// Where saved positions live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionStorage {
    /// The JSON file named by [`BuilderConfig::storage_path`]
    #[default]
    File,
    /// Process memory only
    Memory,
}

pub struct WardrobePlugin {
    pub config: BuilderConfig,
    pub storage: PositionStorage,
}

impl WardrobePlugin {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            storage: PositionStorage::File,
        }
    }

    /// Keep saved positions in memory, for tests and throwaway sessions
    pub fn in_memory(config: BuilderConfig) -> Self {
        Self {
            config,
            storage: PositionStorage::Memory,
        }
    }
}

impl Plugin for WardrobePlugin {
    fn build(&self, app: &mut App) {
        let store: Box<dyn KeyValueStore> = match self.storage {
            PositionStorage::File => Box::new(FileStore::new(self.config.storage_path.clone())),
            PositionStorage::Memory => Box::new(MemoryStore::new()),
        };
        let (manipulator, binding) = gizmo::channel();
        let wardrobe = Wardrobe::new(self.config.clone(), store, Box::new(manipulator));

        app.insert_resource(self.config.clone())
            .insert_resource(wardrobe)
            .insert_resource(binding)
            .insert_resource(AssetLibrary::gltf(self.config.asset_root.clone()))
            .init_resource::<LoadChannel>()
            .init_resource::<OutboundUiMessages>()
            .add_message::<UiCommand>()
            .add_plugins(HotkeyPlugin)
            .add_systems(Startup, request_startup_state)
            .add_systems(
                Update,
                (
                    handle_ui_commands,
                    loading::poll_loads,
                    gizmo::sync_gizmo,
                    forward_outbound,
                )
                    .chain(),
            );

        info!("Wardrobe plugin initialized (assets at {:?})", self.config.asset_root);
    }
}

/// Publish the catalog and ask for the configured base character at startup
fn request_startup_state(config: Res<BuilderConfig>, mut commands: MessageWriter<UiCommand>) {
    commands.write(UiCommand(UiToCore::RequestCatalog));
    if let Some(name) = &config.default_fur {
        info!("Requesting default character '{}'", name);
        commands.write(UiCommand(UiToCore::load(AssetKind::Fur, name.clone())));
    }
}

/// Apply UI messages and start any loads they produce
fn handle_ui_commands(
    mut commands: MessageReader<UiCommand>,
    mut wardrobe: ResMut<Wardrobe>,
    library: Res<AssetLibrary>,
    channel: Res<LoadChannel>,
) {
    for UiCommand(message) in commands.read() {
        match wardrobe.handle_message(message.clone()) {
            Ok(Some(ticket)) => loading::spawn_load(&library, &channel, ticket),
            Ok(None) => {}
            // Already reported to the UI as an alert
            Err(e) => debug!("UI command rejected: {}", e),
        }
    }
}

/// Move the wardrobe's pending messages into the outbound queue
fn forward_outbound(mut wardrobe: ResMut<Wardrobe>, mut outbound: ResMut<OutboundUiMessages>) {
    for msg in wardrobe.drain_outbound() {
        outbound.send(msg);
    }
}
