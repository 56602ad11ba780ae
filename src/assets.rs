//! Everything a badge pulls in from outside: logos, fonts and configured colors.

/// Color values accepted in configuration.
pub mod color;
/// Image decoding into premultiplied RGBA8.
pub mod decode;
/// Font database used by text layers.
pub mod fonts;
/// Where image references are resolved.
pub mod source;
