//! MCP payload types: content, tools, resources, prompts, sampling.

pub mod content;
pub mod notification;
pub mod prompt;
pub mod resource;
pub mod sampling;
pub mod tool;

pub use content::*;
pub use notification::*;
pub use prompt::*;
pub use resource::*;
pub use sampling::*;
pub use tool::*;
