use std::path::PathBuf;

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use perk_core::{RuntimeConfiguration, RuntimeVersion, SearchCriteria};

use crate::error::CliError;

#[derive(Parser)]
#[command(author, version, about, arg_required_else_help = true)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory, overriding the configured one
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Abort long-running operations after this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a default configuration file
    DefConfig,

    /// List the configured repositories
    #[command(visible_alias = "r")]
    Repositories,

    /// Update one repository, or all of them
    #[command(visible_alias = "u")]
    Update {
        /// Only update the repository with this URI
        #[arg(short, long)]
        repository: Option<String>,
    },

    /// Search the merged catalog
    #[command(visible_alias = "s")]
    Search {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Download a runtime archive into the inventory
    #[command(visible_alias = "d")]
    Download {
        /// Runtime identity, e.g. `sha-256:19b935...`
        id: String,
    },

    /// List runtimes held in the local inventory
    #[command(visible_alias = "l")]
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Re-hash a stored archive against its declared digest
    Verify {
        id: String,
    },

    /// Extract a stored archive
    Unpack {
        id: String,
        /// Extraction target; defaults to the managed unpack area
        #[arg(short, long)]
        target: Option<PathBuf>,
    },

    /// Delete a runtime and its artifacts
    Delete {
        id: String,
    },

    /// Print the archive path of an inventoried runtime
    Path {
        id: String,
    },
}

#[derive(ClapArgs)]
pub struct FilterArgs {
    /// Minimum version, inclusive
    #[arg(long)]
    pub version_min: Option<String>,

    /// Maximum version, inclusive
    #[arg(long)]
    pub version_max: Option<String>,

    /// Platform tag, e.g. `linux`
    #[arg(long)]
    pub platform: Option<String>,

    /// Architecture tag, e.g. `x86_64`
    #[arg(long, visible_alias = "arch")]
    pub architecture: Option<String>,

    /// VM tag, e.g. `hotspot`
    #[arg(long)]
    pub vm: Option<String>,

    /// `jdk` or `jre`
    #[arg(long)]
    pub configuration: Option<String>,
}

impl FilterArgs {
    pub fn into_criteria(self) -> Result<SearchCriteria, CliError> {
        let mut criteria = SearchCriteria::any();

        if let Some(min) = self.version_min {
            criteria = criteria.version_min(RuntimeVersion::parse(&min)?);
        }
        if let Some(max) = self.version_max {
            criteria = criteria.version_max(RuntimeVersion::parse(&max)?);
        }
        if let Some(platform) = self.platform {
            criteria = criteria.platform(platform);
        }
        if let Some(architecture) = self.architecture {
            criteria = criteria.architecture(architecture);
        }
        if let Some(vm) = self.vm {
            criteria = criteria.vm(vm);
        }
        if let Some(configuration) = self.configuration {
            criteria = criteria.configuration(configuration.parse::<RuntimeConfiguration>()?);
        }

        Ok(criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_build_criteria() {
        let filter = FilterArgs {
            version_min: Some("11".to_string()),
            version_max: Some("17.0.2".to_string()),
            platform: Some("linux".to_string()),
            architecture: None,
            vm: None,
            configuration: Some("jdk".to_string()),
        };

        let criteria = filter.into_criteria().unwrap();
        assert_eq!(criteria.version_min, Some(RuntimeVersion::new(11, 0, 0)));
        assert_eq!(criteria.platform.as_deref(), Some("linux"));
        assert_eq!(criteria.configuration, Some(RuntimeConfiguration::Jdk));
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let filter = FilterArgs {
            version_min: None,
            version_max: None,
            platform: None,
            architecture: None,
            vm: None,
            configuration: Some("sdk".to_string()),
        };

        assert!(matches!(
            filter.into_criteria(),
            Err(CliError::Core(perk_core::CoreError::InvalidConfiguration(_)))
        ));
    }
}
