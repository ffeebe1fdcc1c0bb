//! Result presentation: text lines for the detection list and the mask
//! overlay preview.

mod overlay;
mod text;

pub use overlay::{compose_preview, decode_mask, screen_inverted, write_png};
pub use text::{detection_line, summary_line, ResultView};
