//! Randomized outfits, custom character files and the option catalog.
//!
//! A randomized outfit is picked up front but only the fur is requested
//! straight away. The hat and shirt follow from [`Wardrobe::complete_load`]
//! once that fur is in place, so a wearable never lands on the character
//! it was not picked for.

use std::path::Path;

use avatar_config::Catalog;
use avatar_ipc::{AssetKind, CoreToUi, WearableCategory};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info};

use super::{LoadRequestOutcome, LoadTicket, Wardrobe};
use crate::constants::{HAT_CHANCE, SHIRT_CHANCE};
use crate::error::WardrobeError;
use crate::loader::AssetRequest;

/// Extensions accepted for a custom character file
const MODEL_EXTENSIONS: &[&str] = &["glb", "gltf"];

/// A picked fur with an optional hat and shirt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outfit {
    pub fur: String,
    pub hat: Option<String>,
    pub shirt: Option<String>,
}

impl Outfit {
    /// Pick an outfit from `catalog`. None if there are no furs.
    pub fn pick<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> Option<Self> {
        let fur = catalog.furs.choose(rng)?.clone();
        let hat = if rng.random_bool(HAT_CHANCE) {
            catalog.hats.choose(rng).cloned()
        } else {
            None
        };
        let shirt = if rng.random_bool(SHIRT_CHANCE) {
            catalog.shirts.choose(rng).cloned()
        } else {
            None
        };
        Some(Self { fur, hat, shirt })
    }

    fn wearable(&self, category: WearableCategory) -> Option<&str> {
        match category {
            WearableCategory::Hat => self.hat.as_deref(),
            WearableCategory::Shirt => self.shirt.as_deref(),
        }
    }
}

impl Wardrobe {
    /// Send the option catalog to the UI
    pub fn publish_catalog(&mut self) {
        let catalog = self.config.catalog.clone();
        self.emit(CoreToUi::CatalogPublished {
            furs: catalog.furs,
            hats: catalog.hats,
            shirts: catalog.shirts,
        });
    }

    /// Randomize with the thread-local generator
    pub fn randomize(&mut self) -> Result<Option<LoadTicket>, WardrobeError> {
        self.randomize_with(&mut rand::rng())
    }

    /// Pick an outfit and request its fur. Returns the fur ticket if the
    /// load started right away.
    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Option<LoadTicket>, WardrobeError> {
        let Some(outfit) = Outfit::pick(&self.config.catalog, rng) else {
            let error = WardrobeError::EmptyCatalog { kind: AssetKind::Fur };
            self.alert(&error);
            return Err(error);
        };
        info!(
            "Randomized outfit: '{}' with hat {:?} and shirt {:?}",
            outfit.fur, outfit.hat, outfit.shirt
        );
        let fur = outfit.fur.clone();
        self.outfit = Some(outfit);
        match self.request_load(AssetKind::Fur, &fur)? {
            LoadRequestOutcome::Started(ticket) => Ok(Some(ticket)),
            LoadRequestOutcome::Queued => Ok(None),
        }
    }

    /// Request a model file from disk as the base character
    pub fn load_custom(&mut self, path: &str) -> Result<Option<LoadTicket>, WardrobeError> {
        let supported = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| MODEL_EXTENSIONS.iter().any(|m| e.eq_ignore_ascii_case(m)));
        if !supported {
            let error = WardrobeError::UnsupportedFile(path.to_string());
            self.alert(&error);
            return Err(error);
        }
        self.outfit = None;
        match self.submit_load(AssetRequest::user_file(path)) {
            LoadRequestOutcome::Started(ticket) => Ok(Some(ticket)),
            LoadRequestOutcome::Queued => Ok(None),
        }
    }

    /// Start the wearable loads of an outfit whose fur just landed.
    /// A category the outfit leaves empty is removed.
    pub(super) fn dress(&mut self, outfit: Outfit) -> Vec<LoadTicket> {
        let mut started = Vec::new();
        for category in WearableCategory::ALL {
            let Some(name) = outfit.wearable(category) else {
                self.remove_wearable(category);
                continue;
            };
            let request = AssetRequest::new(&self.config, category.into(), name);
            if self.loads.busy_with(request.kind) {
                debug!("A {} load is running; queueing '{}'", request.kind, name);
                self.loads.enqueue(request);
            } else {
                info!("Loading {} '{}' from {}", request.kind, request.name, request.url);
                started.push(self.loads.start(request));
            }
        }
        started
    }
}
