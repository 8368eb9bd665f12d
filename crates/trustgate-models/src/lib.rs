mod fixed;
pub use fixed::FixedModelClient;

mod scripted;
pub use scripted::ScriptedModelClient;

mod lambda;
pub use lambda::FnModelClient;

pub mod backend;
pub use backend::{FakeBackend, HttpBackend, ProviderBackend, ProviderRequest, ProviderResponse};

mod openai;
pub use openai::{OpenAiCompatClient, OpenAiCompatConfig};
