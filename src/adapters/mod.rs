//! Adapters: concrete implementations of the engine's port traits.
//!
//! | Adapter         | Implements      | Connects to                    |
//! |-----------------|-----------------|--------------------------------|
//! | `device_id`     | (identity)      | StoragePort `settings` ns      |
//! | `image_codec`   | ImageCodec      | `image`: PNG/JPEG in, JPEG out |
//! | `headless`      | RenderSink      | Fixed viewport, no screen      |
//! | `log_sink`      | EventSink       | `log` facade                   |
//! | `resolver`      | PortResolver    | HTTP port lookup (reqwest)     |
//! | `sim`           | AmplitudeSource | Synthetic sensor feed          |
//! | `storage`       | StoragePort     | Memory / postcard settings file|
//! | `time`          | Clock           | System wall clock              |

pub mod device_id;
pub mod image_codec;
pub mod headless;
pub mod log_sink;
pub mod resolver;
pub mod sim;
pub mod storage;
pub mod time;
pub(super) mod utils;
