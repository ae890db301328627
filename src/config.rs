//! Server settings and the variable table built from them.
//!
//! ```
//! use reqbridge::config::BridgeConfig;
//!
//! let config = BridgeConfig::from_json(r#"{
//!   "hostname": "web-1",
//!   "variables": [ { "name": "backend" }, { "name": "audit", "changeable": false } ]
//! }"#).unwrap();
//! let server = config.server_conf();
//! assert!(server.variables.lookup("backend").is_some());
//! ```

use std::sync::Arc;

use serde::Deserialize;

use crate::{
    variables::{builtin, getter, VariableDescriptor, VariableTable, VariableValue},
    BridgeError,
};

/// Settings shared by every request of a server
#[derive(Debug, Clone)]
pub struct ServerConf {
    /// Variable descriptors
    pub variables: VariableTable,
    /// Host name of the machine, `$hostname`
    pub hostname: String,
    /// Root for `$request_filename`
    pub document_root: String,
}

impl Default for ServerConf {
    /// Server with only the built-in variables
    fn default() -> ServerConf {
        let mut variables = VariableTable::new();
        builtin::register(&mut variables);
        ServerConf {
            variables,
            hostname: default_hostname(),
            document_root: default_document_root(),
        }
    }
}

/// Variable declared by the server configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeclaredVariable {
    /// Variable name, without any sigil
    pub name: String,
    /// Scripts may assign it
    #[serde(default = "default_true")]
    pub changeable: bool,
    /// It gets a per-request slot. A declared variable without one cannot hold a value.
    #[serde(default = "default_true")]
    pub indexed: bool,
}

/// Loadable configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BridgeConfig {
    /// Host name, defaults to `$HOSTNAME` or `localhost`
    #[serde(default = "default_hostname")]
    pub hostname: String,
    /// Document root, defaults to `html`
    #[serde(default = "default_document_root")]
    pub document_root: String,
    /// Filter for the log backend, in `env_logger` syntax
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Declared variables
    #[serde(default)]
    pub variables: Vec<DeclaredVariable>,
}

impl Default for BridgeConfig {
    fn default() -> BridgeConfig {
        BridgeConfig {
            hostname: default_hostname(),
            document_root: default_document_root(),
            log_filter: None,
            variables: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

fn default_document_root() -> String {
    "html".to_string()
}

fn unset(_: &crate::context::RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    Some(VariableValue::not_found())
}

impl BridgeConfig {
    /// Parses a JSON configuration
    pub fn from_json(json: &str) -> Result<BridgeConfig, BridgeError> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        for variable in &config.variables {
            if variable.name.is_empty() {
                return Err(BridgeError::Config("variable without a name".to_string()));
            }
        }
        Ok(config)
    }

    /// Builds the shared server settings: built-in variables first, then declared ones
    pub fn server_conf(&self) -> Arc<ServerConf> {
        let mut variables = VariableTable::new();
        builtin::register(&mut variables);
        for declared in &self.variables {
            let mut descriptor =
                VariableDescriptor::new(&declared.name).with_getter(getter(unset), 0);
            if declared.changeable {
                descriptor = descriptor.changeable();
            }
            if declared.indexed {
                variables.add_indexed(descriptor);
            } else {
                variables.add(descriptor);
            }
        }
        debug!(
            "server '{}' has {} variables, {} indexed",
            self.hostname,
            variables.len(),
            variables.indexed_count()
        );
        Arc::new(ServerConf {
            variables,
            hostname: self.hostname.clone(),
            document_root: self.document_root.clone(),
        })
    }
}

/// Initialises the log backend, honouring `RUST_LOG` over the configured filter. Calling it
/// more than once is harmless.
pub fn init_logging(config: &BridgeConfig) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info);
    if let Some(filter) = &config.log_filter {
        builder.parse_filters(filter);
    }
    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }
    if builder.try_init().is_err() {
        debug!("logger was already initialised");
    }
}
