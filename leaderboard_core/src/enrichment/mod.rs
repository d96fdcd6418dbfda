pub mod fetcher;

use std::fmt;
use std::sync::Arc;

/// Stamp attached to every fetch. A result is applied only while the stamp
/// still matches the view's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrichmentTarget {
    /// Page-local row index.
    Row(usize),
    /// The signed-in user's own avatar.
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnrichmentTag {
    pub target: EnrichmentTarget,
    pub generation: Generation,
}

impl EnrichmentTag {
    pub fn row(index: usize, generation: Generation) -> Self {
        Self {
            target: EnrichmentTarget::Row(index),
            generation,
        }
    }

    pub fn profile(generation: Generation) -> Self {
        Self {
            target: EnrichmentTarget::Profile,
            generation,
        }
    }
}

/// Fetched image bytes as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    bytes: Arc<[u8]>,
    content_type: Option<String>,
}

impl ImageAsset {
    pub fn new(bytes: impl Into<Arc<[u8]>>, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageState {
    /// A fetch is in flight. Renders the same as `NoImage`.
    Pending,
    Loaded(ImageAsset),
    #[default]
    NoImage,
}

impl ImageState {
    pub fn image(&self) -> Option<&ImageAsset> {
        match self {
            Self::Loaded(image) => Some(image),
            Self::Pending | Self::NoImage => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Message sent from a fetch task back to the owning view.
#[derive(Debug, Clone)]
pub struct EnrichmentResult {
    pub tag: EnrichmentTag,
    pub image: Option<ImageAsset>,
}

/// An image-state change that was actually applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpdate {
    pub target: EnrichmentTarget,
    pub state: ImageState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnrichmentStats {
    pub issued: u64,
    pub loaded: u64,
    pub failed: u64,
    pub stale: u64,
}
