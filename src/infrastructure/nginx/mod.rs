mod renderer;
mod writer;

pub use renderer::{RenderError, TemplateRenderer};
pub use writer::{ArtifactError, ConfigFileWriter};
