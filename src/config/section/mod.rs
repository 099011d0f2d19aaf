//! Configuration section definitions.
//!
//! Each module corresponds to a section in `slicer.toml`:
//!
//! | Module     | TOML Section   | Purpose                                 |
//! |------------|----------------|-----------------------------------------|
//! | `slice`    | `[slice]`      | Destination, layer, overwrite policy    |
//! | `renderer` | `[renderer]`   | External renderer command and syntax    |
//! | `log`      | `[log]`        | Debug log file                          |

mod log;
mod renderer;
mod slice;

pub use log::LogConfig;
pub use renderer::RendererConfig;
pub use slice::SliceConfig;
