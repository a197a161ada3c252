//! Asset loading and application.
//!
//! Loads are split in two: [`Wardrobe::request_load`] hands out a ticket,
//! the caller fetches the asset wherever it likes, and
//! [`Wardrobe::complete_load`] applies the result. Only one load per kind is
//! in flight at a time; a request for a busy kind waits in a single pending
//! slot, where a newer request replaces an older one.

use std::collections::VecDeque;

use avatar_ipc::{AssetKind, CoreToUi, WearableCategory};
use tracing::{debug, info, warn};

use super::{Character, Wardrobe, frame_character};
use crate::attach::{Attachment, attach};
use crate::bones::{BoneRole, find_bone};
use crate::classify::{BaseBodyIndex, classify};
use crate::error::{AssetError, WardrobeError};
use crate::loader::{AssetRequest, AssetSource, LoadedAsset};
use crate::persist::apply_saved;

/// A started load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: u64,
    pub request: AssetRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequestOutcome {
    /// Fetch the asset and hand the result to [`Wardrobe::complete_load`]
    Started(LoadTicket),
    /// Another load of the same kind is running; this one starts after it
    Queued,
}

/// What a finished load did
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    CharacterLoaded(Character),
    WearableAttached(Attachment),
    /// Classification kept nothing; the previous wearable is untouched
    NothingToAttach,
}

#[derive(Debug)]
pub struct LoadCompletion {
    pub outcome: Result<LoadOutcome, WardrobeError>,
    /// Loads started because this one finished: a queued request of the
    /// same kind, and the wearables of a randomized outfit
    pub next: Vec<LoadTicket>,
}

#[derive(Debug, Default)]
pub(super) struct LoadQueue {
    next_id: u64,
    in_flight: Vec<LoadTicket>,
    pending: Vec<AssetRequest>,
}

impl LoadQueue {
    pub(super) fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub(super) fn busy_with(&self, kind: AssetKind) -> bool {
        self.in_flight.iter().any(|t| t.request.kind == kind)
    }

    pub(super) fn start(&mut self, request: AssetRequest) -> LoadTicket {
        self.next_id += 1;
        let ticket = LoadTicket {
            id: self.next_id,
            request,
        };
        self.in_flight.push(ticket.clone());
        ticket
    }

    pub(super) fn enqueue(&mut self, request: AssetRequest) {
        if let Some(index) = self.pending.iter().position(|r| r.kind == request.kind) {
            debug!("Replacing queued {} load '{}'", request.kind, self.pending[index].name);
            self.pending[index] = request;
        } else {
            self.pending.push(request);
        }
    }

    pub(super) fn finish(&mut self, id: u64) -> Option<LoadTicket> {
        let index = self.in_flight.iter().position(|t| t.id == id)?;
        Some(self.in_flight.remove(index))
    }

    pub(super) fn take_pending(&mut self, kind: AssetKind) -> Option<AssetRequest> {
        let index = self.pending.iter().position(|r| r.kind == kind)?;
        Some(self.pending.remove(index))
    }
}

impl Wardrobe {
    /// Start or queue a load.
    ///
    /// Wearables need a base character: without one the request is
    /// rejected with an alert and nothing changes.
    pub fn request_load(&mut self, kind: AssetKind, name: &str) -> Result<LoadRequestOutcome, WardrobeError> {
        if let Some(category) = kind.category()
            && self.character.is_none()
        {
            let error = WardrobeError::MissingPrerequisite { category };
            self.alert(&error);
            return Err(error);
        }

        if kind == AssetKind::Fur && self.outfit.as_ref().is_some_and(|o| o.fur != name) {
            debug!("'{}' replaces the randomized outfit", name);
            self.outfit = None;
        }

        Ok(self.submit_load(AssetRequest::new(&self.config, kind, name)))
    }

    pub(super) fn submit_load(&mut self, request: AssetRequest) -> LoadRequestOutcome {
        if self.loads.busy_with(request.kind) {
            debug!("A {} load is running; queueing '{}'", request.kind, request.name);
            self.loads.enqueue(request);
            return LoadRequestOutcome::Queued;
        }
        LoadRequestOutcome::Started(self.start_load(request))
    }

    fn start_load(&mut self, request: AssetRequest) -> LoadTicket {
        if !self.loads.is_busy() {
            self.emit(CoreToUi::LoadingChanged { loading: true });
        }
        info!("Loading {} '{}' from {}", request.kind, request.name, request.url);
        self.loads.start(request)
    }

    /// Apply the result of a fetched load.
    ///
    /// Fetch and parse failures become [`WardrobeError::LoadFailure`] in the
    /// returned outcome and are alerted; the scene is left as it was.
    pub fn complete_load(
        &mut self,
        ticket_id: u64,
        result: Result<LoadedAsset, AssetError>,
    ) -> Result<LoadCompletion, WardrobeError> {
        let ticket = self.loads.finish(ticket_id).ok_or(WardrobeError::StaleLoad(ticket_id))?;
        let request = ticket.request;

        let outcome = match result {
            Ok(asset) => self.apply_asset(&request, asset),
            Err(e) => Err(WardrobeError::LoadFailure {
                file: request.file_name(),
                folder: request.folder.clone(),
                reason: e.to_string(),
            }),
        };
        if let Err(e) = &outcome {
            self.alert(e);
        }

        let mut next: Vec<LoadTicket> = self
            .loads
            .take_pending(request.kind)
            .map(|r| {
                info!("Starting queued {} load '{}'", r.kind, r.name);
                self.loads.start(r)
            })
            .into_iter()
            .collect();
        if request.kind == AssetKind::Fur
            && !request.user_file
            && let Some(outfit) = self.outfit.take_if(|o| o.fur == request.name)
        {
            if outcome.is_ok() {
                next.extend(self.dress(outfit));
            } else {
                debug!("Dropping the outfit for '{}'", request.name);
            }
        }
        if !self.loads.is_busy() {
            self.emit(CoreToUi::LoadingChanged { loading: false });
        }
        Ok(LoadCompletion { outcome, next })
    }

    /// Fetch and apply a load on the calling thread, along with any loads
    /// it starts. Returns the outcome of the requested load.
    pub fn load_now(
        &mut self,
        source: &dyn AssetSource,
        kind: AssetKind,
        name: &str,
    ) -> Result<LoadOutcome, WardrobeError> {
        if self.loads.busy_with(kind) {
            return Err(WardrobeError::LoadBusy { kind });
        }
        let LoadRequestOutcome::Started(ticket) = self.request_load(kind, name)? else {
            return Err(WardrobeError::LoadBusy { kind });
        };
        let result = source.load(&ticket.request);
        let LoadCompletion { outcome, next } = self.complete_load(ticket.id, result)?;

        let mut follow_ups = VecDeque::from(next);
        while let Some(ticket) = follow_ups.pop_front() {
            let result = source.load(&ticket.request);
            follow_ups.extend(self.complete_load(ticket.id, result)?.next);
        }
        outcome
    }

    fn apply_asset(&mut self, request: &AssetRequest, asset: LoadedAsset) -> Result<LoadOutcome, WardrobeError> {
        match request.kind.category() {
            None => self.apply_character(request, asset).map(LoadOutcome::CharacterLoaded),
            Some(category) => self.apply_wearable(request, category, asset),
        }
    }

    /// Install a base character, replacing the current one.
    ///
    /// A replacement keeps the previous position and scale, and the current
    /// wearables move across: the hat to the new head bone (or it is
    /// dropped if there is none) and the shirt to the new root. A file the
    /// user picked is framed like a first load and starts undressed.
    fn apply_character(&mut self, request: &AssetRequest, asset: LoadedAsset) -> Result<Character, WardrobeError> {
        let root = self
            .graph
            .copy_subtree(&asset.graph, asset.root)
            .ok_or_else(|| WardrobeError::LoadFailure {
                file: request.file_name(),
                folder: request.folder.clone(),
                reason: "asset has no root node".to_string(),
            })?;

        if request.user_file {
            for category in WearableCategory::ALL {
                self.destroy_wearable(category);
            }
        }
        match self.character.take() {
            Some(previous) if !request.user_file => {
                if let Some(old) = self.graph.get(previous.root).map(|n| n.transform)
                    && let Some(node) = self.graph.get_mut(root)
                {
                    node.transform.translation = old.translation;
                    node.transform.scale = old.scale;
                }
                for group in [self.hat, self.shirt].into_iter().flatten() {
                    self.graph.detach(group);
                }
                self.graph.remove_subtree(previous.root);
            }
            previous => {
                if let Some(previous) = previous {
                    self.graph.remove_subtree(previous.root);
                }
                frame_character(&mut self.graph, root);
            }
        }
        self.graph.append_child(self.scene_root, root);

        if let Some(hat) = self.hat {
            match find_bone(&self.graph, root, BoneRole::Head) {
                Some(bone) => {
                    self.graph.append_child(bone, hat);
                }
                None => {
                    warn!("'{}' has no head bone; removing the current hat", request.name);
                    self.destroy_wearable(WearableCategory::Hat);
                }
            }
        }
        if let Some(shirt) = self.shirt {
            self.graph.append_child(root, shirt);
        }

        let character = Character {
            root,
            name: request.name.clone(),
        };
        self.character = Some(character.clone());
        info!("Character '{}' loaded", request.name);
        self.emit(CoreToUi::CharacterLoaded {
            name: request.name.clone(),
        });
        Ok(character)
    }

    fn apply_wearable(
        &mut self,
        request: &AssetRequest,
        category: WearableCategory,
        asset: LoadedAsset,
    ) -> Result<LoadOutcome, WardrobeError> {
        let Some(character_root) = self.character.as_ref().map(|c| c.root) else {
            return Err(WardrobeError::MissingPrerequisite { category });
        };

        let base = BaseBodyIndex::from_character(&self.graph, character_root);
        let classification = classify(&asset.graph, asset.root, category, Some(&base));
        if classification.is_empty() {
            warn!(
                "No wearable geometry in {} '{}' ({} nodes rejected)",
                category,
                request.name,
                classification.rejected.len()
            );
            return Ok(LoadOutcome::NothingToAttach);
        }

        self.destroy_wearable(category);
        let Some(attachment) = attach(
            &mut self.graph,
            classification.retained,
            category,
            character_root,
            &request.name,
            &self.config.hat_calibration,
        ) else {
            return Ok(LoadOutcome::NothingToAttach);
        };
        *self.slot_mut(category) = Some(attachment.group);

        if self.config.apply_saved_transforms
            && let Some(saved) = self.positions.load(category, &request.name)
        {
            debug!("Applying saved transform to {} '{}'", category, request.name);
            apply_saved(&mut self.graph, attachment.group, &saved);
        }

        self.emit(CoreToUi::RemoveAvailabilityChanged {
            category,
            enabled: true,
        });
        self.emit(CoreToUi::WearableAttached {
            category,
            name: request.name.clone(),
            alignment: attachment.alignment,
        });
        self.publish_selectables();
        self.commit(format!("Load {}", request.name));
        Ok(LoadOutcome::WearableAttached(attachment))
    }

    /// Free the current wearable of `category` and clear its slot
    pub(super) fn destroy_wearable(&mut self, category: WearableCategory) {
        let Some(group) = self.slot_mut(category).take() else {
            return;
        };
        if self.selected.is_some_and(|s| self.graph.is_ancestor_or_self(group, s)) {
            self.clear_selection();
        }
        debug!("Releasing {} '{}'", category, self.graph.name(group).unwrap_or_default());
        self.graph.remove_subtree(group);
        self.emit(CoreToUi::RemoveAvailabilityChanged {
            category,
            enabled: false,
        });
        self.publish_selectables();
    }
}
