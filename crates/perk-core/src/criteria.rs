use serde::{Deserialize, Serialize};

use crate::{
    description::{RuntimeConfiguration, RuntimeDescription},
    version::RuntimeVersion,
};

/// Filter over runtime descriptions.
///
/// All fields are optional and AND-combined; the empty criteria matches
/// everything. String tags compare case-insensitively, matching how
/// upstream indexes mix `Linux`/`linux` spellings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub version_min: Option<RuntimeVersion>,
    pub version_max: Option<RuntimeVersion>,
    pub platform: Option<String>,
    pub architecture: Option<String>,
    pub vm: Option<String>,
    pub configuration: Option<RuntimeConfiguration>,
}

impl SearchCriteria {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn version_min(mut self, version: RuntimeVersion) -> Self {
        self.version_min = Some(version);
        self
    }

    pub fn version_max(mut self, version: RuntimeVersion) -> Self {
        self.version_max = Some(version);
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn architecture(mut self, architecture: impl Into<String>) -> Self {
        self.architecture = Some(architecture.into());
        self
    }

    pub fn vm(mut self, vm: impl Into<String>) -> Self {
        self.vm = Some(vm.into());
        self
    }

    pub fn configuration(mut self, configuration: RuntimeConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Tests a description against the criteria. Bounds are inclusive.
    pub fn matches(&self, description: &RuntimeDescription) -> bool {
        if let Some(ref min) = self.version_min {
            if description.version < *min {
                return false;
            }
        }
        if let Some(ref max) = self.version_max {
            if description.version > *max {
                return false;
            }
        }
        if let Some(ref platform) = self.platform {
            if !description.platform.eq_ignore_ascii_case(platform) {
                return false;
            }
        }
        if let Some(ref architecture) = self.architecture {
            if !description.architecture.eq_ignore_ascii_case(architecture) {
                return false;
            }
        }
        if let Some(ref vm) = self.vm {
            if !description.vm.eq_ignore_ascii_case(vm) {
                return false;
            }
        }
        if let Some(configuration) = self.configuration {
            if description.configuration != configuration {
                return false;
            }
        }

        true
    }
}
