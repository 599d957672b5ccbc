//! Simplification pass configuration.
//!
//! Provides typed configuration with a bon builder and environment variable
//! fallbacks.

use bon::bon;

use crate::fold::ConstantFolder;

/// Default upper bound on the number of elements a folded tensor may hold.
pub const DEFAULT_FOLD_MAX_ELEMENTS: usize = 1 << 20;

/// Configuration of the simplification passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplifyConfig {
    /// Constant folding gives up on tensors with more elements than this.
    pub fold_max_elements: usize,
    /// Run the all-reduce reordering pass.
    pub allreduce_reorder: bool,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self { fold_max_elements: DEFAULT_FOLD_MAX_ELEMENTS, allreduce_reorder: true }
    }
}

#[bon]
impl SimplifyConfig {
    /// Create a configuration with builder pattern.
    #[builder]
    pub fn builder(
        #[builder(default = DEFAULT_FOLD_MAX_ELEMENTS)] fold_max_elements: usize,
        #[builder(default = true)] allreduce_reorder: bool,
    ) -> Self {
        Self { fold_max_elements, allreduce_reorder }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `GRAFT_FOLD_MAX_ELEMENTS` - Largest tensor constant folding may produce (default: 1048576)
    /// * `GRAFT_NO_ALLREDUCE_REORDER` - Disable all-reduce reordering if set
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`SimplifyConfig::from_env`] with a custom variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let fold_max_elements =
            var("GRAFT_FOLD_MAX_ELEMENTS").and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_FOLD_MAX_ELEMENTS);
        let allreduce_reorder = var("GRAFT_NO_ALLREDUCE_REORDER").is_none();

        Self { fold_max_elements, allreduce_reorder }
    }

    /// Constant folder honoring this configuration.
    pub fn folder(&self) -> ConstantFolder {
        ConstantFolder::new(self.fold_max_elements)
    }
}
