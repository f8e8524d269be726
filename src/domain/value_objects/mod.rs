mod domain_name;
mod email;
mod upstream;

pub use domain_name::{DomainName, DomainNameError};
pub use email::{Email, EmailError};
pub use upstream::{Upstream, UpstreamError};
