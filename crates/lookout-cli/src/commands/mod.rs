//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`apply`] - Create or replace declared channels
//! - [`refresh`] - Re-read tracked integrations
//! - [`destroy`] - Delete a tracked integration
//! - [`import`] - Adopt an existing integration
//! - [`show`] - Print tracked integrations

pub mod apply;
pub mod destroy;
pub mod import;
pub mod refresh;
pub mod show;

pub use apply::ApplyCommand;
pub use destroy::DestroyCommand;
pub use import::ImportCommand;
pub use refresh::RefreshCommand;
pub use show::ShowCommand;
