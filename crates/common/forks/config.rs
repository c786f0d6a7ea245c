use std::{fs::File, io::BufReader, path::Path};

use serde::Deserialize;
use tracing::debug;

use super::{
    error::ForkError,
    registry::{ForkRegistry, ForkRegistryBuilder},
    transition::Boundary,
};

/// Extra transition on top of the mainline catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransitionConfig {
    /// Overrides the conventional `{From}To{To}At...` name.
    #[serde(default)]
    pub name: Option<String>,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub at_block: Option<u64>,
    #[serde(default)]
    pub at_timestamp: Option<u64>,
}

impl TransitionConfig {
    fn boundary(&self) -> Result<Boundary, ForkError> {
        match (self.at_block, self.at_timestamp) {
            (Some(block), None) => Ok(Boundary::Block(block)),
            (None, Some(timestamp)) => Ok(Boundary::Timestamp(timestamp)),
            (block, _) => Err(ForkError::MalformedTransition {
                name: format!("{}To{}", self.from, self.to),
                reason: if block.is_some() {
                    "both a block and a timestamp boundary were given".to_string()
                } else {
                    "no boundary was given".to_string()
                },
            }),
        }
    }
}

/// Registry customization, usually read from a JSON file:
///
/// ```json
/// {
///   "transitions": [{ "from": "Shanghai", "to": "Cancun", "atTimestamp": 30000 }],
///   "lastDeployed": "Cancun"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default)]
    pub transitions: Vec<TransitionConfig>,
    #[serde(default)]
    pub last_deployed: Option<String>,
}

/// Values read from `FORKLINE_*` environment variables.
#[derive(Debug, Default, Deserialize)]
struct EnvConfig {
    last_deployed: Option<String>,
}

impl RegistryConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ForkError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ForkError::Config(format!("cannot open {}: {e}", path.display())))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ForkError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    pub fn from_json(json: &str) -> Result<Self, ForkError> {
        serde_json::from_str(json).map_err(|e| ForkError::Config(e.to_string()))
    }

    /// Applies `FORKLINE_LAST_DEPLOYED`, if set.
    pub fn with_env_overrides(mut self) -> Result<Self, ForkError> {
        let env: EnvConfig = envy::prefixed("FORKLINE_")
            .from_env()
            .map_err(|e| ForkError::Config(e.to_string()))?;
        if let Some(last_deployed) = env.last_deployed {
            debug!(%last_deployed, "last deployed fork taken from the environment");
            self.last_deployed = Some(last_deployed);
        }
        Ok(self)
    }

    /// Mainline catalog extended with this configuration.
    pub fn build(&self) -> Result<ForkRegistry, ForkError> {
        let mut builder = ForkRegistryBuilder::mainline();
        for transition in &self.transitions {
            let boundary = transition.boundary()?;
            builder = match &transition.name {
                Some(name) => {
                    builder.named_transition(name, &transition.from, &transition.to, boundary)?
                }
                None => builder.transition(&transition.from, &transition.to, boundary)?,
            };
        }
        if let Some(last_deployed) = &self.last_deployed {
            builder = builder.last_deployed(last_deployed)?;
        }
        Ok(builder.build())
    }
}
