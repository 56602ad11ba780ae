//! badgepress renders verifiable attendee badges and dispatches them in batches.
//!
//! The public API is session-oriented:
//!
//! - Build a [`BadgeCompositor`] from [`CompositorOpts`], an [`ImageSource`] and a font database
//! - Preview, save or send one badge through a [`SingleSession`]
//! - Generate a whole roster with a [`BulkSession`] and deliver it through a [`DispatchReporter`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Shared assets: colors, image decoding, image sources and fonts.
pub mod assets;
/// Finished badge.
pub mod artifact;
/// The badge compositor.
pub mod compose;
/// Runtime configuration.
pub mod config;
/// Batch delivery.
pub mod dispatch;
/// Output encoders and sinks.
pub mod encode;
mod foundation;
/// Attendee, event and issuer records.
pub mod model;
/// Scene description and painting.
pub mod render;
/// Single and bulk sessions.
pub mod session;

pub use crate::artifact::BadgeArtifact;
pub use crate::assets::color::ColorDef;
pub use crate::assets::decode::{PreparedImage, decode_image};
pub use crate::assets::fonts::build_fontdb;
pub use crate::assets::source::{
    FsImageSource, HttpImageSource, ImageSource, MemoryImageSource, fetch_image,
};
pub use crate::compose::{BadgeCompositor, CompositorOpts};
pub use crate::config::BadgeConfig;
pub use crate::dispatch::client::DispatchReporter;
pub use crate::dispatch::report::{BatchReport, DispatchFailure, DispatchOutcome, describe_attempt};
pub use crate::encode::png::png_data_url;
pub use crate::encode::sink::{ArtifactSink, DirSink, InMemorySink, SinkConfig};
pub use crate::encode::verification::{
    EcLevel, MAX_MARK_SIZE, VerificationMark, VerificationOpts, VerificationPayload, encode_verification,
};
pub use crate::foundation::core::{Canvas, Point, Rect, Rgba8, Size};
pub use crate::foundation::error::{BadgeError, BadgeResult};
pub use crate::model::{Attendee, Event, Issuer, Roster};
pub use crate::render::scene::{LayerDesc, Slot};
pub use crate::session::bulk::{BulkPhase, BulkProgress, BulkSession};
pub use crate::session::single::{SinglePhase, SingleSession, SingleState};
