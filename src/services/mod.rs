//! Services: fetching, transformation, rendering, output.

pub mod credentials;
pub mod obs_client;
pub mod pipeline;
pub mod renderer;
pub mod sink;
pub mod view_model;

pub use credentials::Credentials;
pub use obs_client::{validate_request_id, ObsClient, RequestBundle, RequestSource};
pub use renderer::Renderer;
pub use view_model::{build_view_model, RequestView};
