use serde::{Deserialize, Serialize};

use crate::{ApiVersion, OverlayBit};

/// Declarative form of the builder options, for applications that keep capture settings in a
/// config file. Applied with [`SessionBuilder::with_config`](crate::SessionBuilder::with_config).
///
/// Every field is optional; an empty document leaves the builder untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Written as `"1.6.0"`.
    pub api_version: Option<ApiVersion>,
    /// Library name or path handed to the loader instead of the platform default.
    pub library: Option<String>,
    pub overlay: Vec<OverlayBit>,
    pub disable_capture_keys: bool,
    pub disable_focus_toggle_keys: bool,
    pub capture_file_path_template: Option<String>,
    pub max_file_path_length: Option<usize>,
}
