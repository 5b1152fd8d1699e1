//! Stream definitions
//!
//! Each Bitbucket resource is one type implementing [`Stream`]:
//! - `workspaces` - top level, partitioned by configured workspace
//! - `repositories` - one run per workspace record
//! - `commits` - one run per repository record, incremental with early stop
//! - `deployments` - one run per repository record
//!
//! The request parameters of every page are assembled by
//! [`Stream::url_params`]: continuation pairs from the previous `next` URL,
//! then the replication filter and sort, then the allow-list clause.

mod resources;
mod schemas;
mod types;

pub use resources::{CommitsStream, DeploymentsStream, RepositoriesStream, WorkspacesStream};
pub use types::{AllowList, ReplicationFilter, StartingTimestamp, Stream};
