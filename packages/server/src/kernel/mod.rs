// Kernel: capability traits, the dependency container, and scheduled tasks.
//
// External collaborators (push delivery, the ranking provider's committee
// roster, the points ledger) are reached exclusively through the Base* traits
// so domain actions stay testable in isolation.

pub mod deps;
pub mod ledger;
pub mod roster;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use ledger::HttpLedgerClient;
pub use roster::PgCommitteeRoster;
pub use traits::{BaseCommitteeRoster, BasePointsLedger, BasePushNotificationService};
