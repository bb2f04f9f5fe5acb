//! fbmux-fb: the Linux framebuffer as a [`fbmux_core::Canvas`].
//!
//! [`Framebuffer`] maps `/dev/fbN` and packs colors into its pixel format.
//! [`Pad`] paints glyph cells from tinyfont bitmaps on any [`Surface`].

pub mod fb;
pub mod pad;
pub mod surface;

pub use fb::{FbError, Framebuffer};
pub use pad::{Fonts, Pad};
pub use surface::{PixelBuffer, Surface};
