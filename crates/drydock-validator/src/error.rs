use miette::Diagnostic;
use thiserror::Error;

/// Validator error type
///
/// Every variant is fatal: the run produced no report and the caller must not
/// confuse it with a report that merely contains failures.
#[derive(Error, Debug, Diagnostic)]
pub enum ValidatorError {
    /// No instance groups configured
    #[error("no instance groups found for cluster")]
    #[diagnostic(
        code(validator::no_instance_groups),
        help("Define at least one instance group before validating the cluster")
    )]
    NoInstanceGroups,

    /// The advertised API host could not be parsed
    #[error("unable to parse cluster API URL {host:?}: {reason}")]
    #[diagnostic(
        code(validator::api_host_invalid),
        help("The cluster apiHost must be an absolute URL, e.g. https://api.cluster.example.com")
    )]
    ApiHostInvalid { host: String, reason: String },

    /// DNS resolution of the API host failed
    #[error("unable to resolve cluster API host {host:?}: {message}")]
    #[diagnostic(
        code(validator::dns_resolution),
        help("Check that the API DNS record exists and the local resolver is reachable")
    )]
    DnsResolution { host: String, message: String },

    /// Listing orchestrator nodes failed
    #[error("error listing nodes: {message}")]
    #[diagnostic(
        code(validator::node_list),
        help("Check connectivity to the orchestrator control plane")
    )]
    NodeList { message: String },

    /// The cloud inventory query failed
    #[error("error querying cloud instance groups: {message}")]
    #[diagnostic(
        code(validator::cloud_inventory),
        help("Check cloud credentials and that the instance groups exist")
    )]
    CloudInventory { message: String },

    /// The pod stream failed mid-flight
    #[error("error listing pods: {message}")]
    #[diagnostic(
        code(validator::pod_stream),
        help("The pod inventory must be consumed to completion; re-run the validation")
    )]
    PodStream { message: String },

    /// The run was canceled before it finished
    #[error("validation canceled")]
    #[diagnostic(
        code(validator::canceled),
        help("A canceled run yields no report; discard any partial state and re-run")
    )]
    Canceled,
}

/// Result type for validator operations
pub type Result<T> = std::result::Result<T, ValidatorError>;

impl ValidatorError {
    /// Create an ApiHostInvalid error
    pub fn api_host_invalid(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ApiHostInvalid {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Create a DnsResolution error
    pub fn dns_resolution(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DnsResolution {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a NodeList error
    pub fn node_list(message: impl Into<String>) -> Self {
        Self::NodeList {
            message: message.into(),
        }
    }

    /// Create a CloudInventory error
    pub fn cloud_inventory(message: impl Into<String>) -> Self {
        Self::CloudInventory {
            message: message.into(),
        }
    }

    /// Create a PodStream error
    pub fn pod_stream(message: impl Into<String>) -> Self {
        Self::PodStream {
            message: message.into(),
        }
    }
}
