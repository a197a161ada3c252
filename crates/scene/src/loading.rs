//! Background asset loads.
//!
//! The wardrobe hands out a ticket per load. The asset is fetched on a
//! worker thread and the result comes back over a channel that
//! [`poll_loads`] drains every frame.

use std::path::PathBuf;
use std::sync::Arc;

use bevy::prelude::*;
use tokio::sync::mpsc;
use wardrobe::{AssetError, AssetSource, GltfAssetSource, LoadOutcome, LoadTicket, LoadedAsset, Wardrobe};

/// Where assets are fetched from
#[derive(Resource, Clone)]
pub struct AssetLibrary(pub Arc<dyn AssetSource>);

impl AssetLibrary {
    /// glTF files below `root`
    pub fn gltf(root: impl Into<PathBuf>) -> Self {
        Self(Arc::new(GltfAssetSource::new(root)))
    }
}

/// A finished fetch
#[derive(Debug)]
pub struct LoadResult {
    pub ticket_id: u64,
    pub result: Result<LoadedAsset, AssetError>,
}

#[derive(Resource)]
pub struct LoadChannel {
    sender: mpsc::UnboundedSender<LoadResult>,
    receiver: mpsc::UnboundedReceiver<LoadResult>,
}

impl Default for LoadChannel {
    fn default() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }
}

impl LoadChannel {
    /// Non-blocking receive of one finished fetch
    pub fn try_recv(&mut self) -> Option<LoadResult> {
        self.receiver.try_recv().ok()
    }
}

/// Fetch the ticket's asset on a worker thread
pub(crate) fn spawn_load(library: &AssetLibrary, channel: &LoadChannel, ticket: LoadTicket) {
    let source = Arc::clone(&library.0);
    let sender = channel.sender.clone();
    let LoadTicket { id, request } = ticket;
    info!("Loading {} '{}' from {}", request.kind, request.name, request.url);

    let spawned = std::thread::Builder::new()
        .name(format!("load-{}", id))
        .spawn({
            let request = request.clone();
            let sender = sender.clone();
            move || {
                let result = source.load(&request);
                // Receiver only goes away when the app shuts down
                let _ = sender.send(LoadResult { ticket_id: id, result });
            }
        });

    if let Err(e) = spawned {
        warn!("Could not start load thread ({}), loading inline", e);
        let result = library.0.load(&request);
        let _ = sender.send(LoadResult { ticket_id: id, result });
    }
}

/// Apply one finished fetch and start whatever was queued behind it
pub(crate) fn complete(
    wardrobe: &mut Wardrobe,
    library: &AssetLibrary,
    channel: &LoadChannel,
    finished: LoadResult,
) {
    let completion = match wardrobe.complete_load(finished.ticket_id, finished.result) {
        Ok(completion) => completion,
        Err(e) => {
            warn!("Dropping load result: {}", e);
            return;
        }
    };
    match &completion.outcome {
        Ok(LoadOutcome::CharacterLoaded(character)) => info!("Character '{}' ready", character.name),
        Ok(LoadOutcome::WearableAttached(attachment)) => {
            info!("Wearable attached ({:?} alignment)", attachment.alignment)
        }
        Ok(LoadOutcome::NothingToAttach) => info!("Load kept no wearable parts"),
        Err(e) => warn!("Load failed: {}", e),
    }
    for next in completion.next {
        spawn_load(library, channel, next);
    }
}

pub(crate) fn poll_loads(mut wardrobe: ResMut<Wardrobe>, library: Res<AssetLibrary>, mut channel: ResMut<LoadChannel>) {
    while let Some(finished) = channel.try_recv() {
        complete(&mut wardrobe, &library, &channel, finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatar_config::BuilderConfig;
    use avatar_ipc::{AssetKind, CoreToUi, UiToCore};
    use wardrobe::AssetRequest;

    struct MissingSource;

    impl AssetSource for MissingSource {
        fn load(&self, request: &AssetRequest) -> Result<LoadedAsset, AssetError> {
            Err(AssetError::NotFound(request.url.clone()))
        }
    }

    #[test]
    fn test_failed_background_load_reports_alert() {
        let mut wardrobe = Wardrobe::in_memory(BuilderConfig::default());
        let library = AssetLibrary(Arc::new(MissingSource));
        let mut channel = LoadChannel::default();

        let ticket = wardrobe
            .handle_message(UiToCore::load(AssetKind::Fur, "Nobody"))
            .unwrap()
            .expect("load should start");
        spawn_load(&library, &channel, ticket);

        let finished = channel.receiver.blocking_recv().unwrap();
        assert!(matches!(finished.result, Err(AssetError::NotFound(_))));
        complete(&mut wardrobe, &library, &channel, finished);

        assert!(!wardrobe.is_loading());
        let messages = wardrobe.drain_outbound();
        assert_eq!(messages.first(), Some(&CoreToUi::LoadingChanged { loading: true }));
        assert!(messages.iter().any(|m| matches!(m, CoreToUi::Alert { .. })));
        assert_eq!(messages.last(), Some(&CoreToUi::LoadingChanged { loading: false }));
    }

    #[test]
    fn test_stale_result_is_dropped() {
        let mut wardrobe = Wardrobe::in_memory(BuilderConfig::default());
        let library = AssetLibrary(Arc::new(MissingSource));
        let channel = LoadChannel::default();

        complete(
            &mut wardrobe,
            &library,
            &channel,
            LoadResult {
                ticket_id: 42,
                result: Err(AssetError::NotFound("x".to_string())),
            },
        );
        assert!(wardrobe.outbound().is_empty());
    }
}
