// Application layer - validation, orchestration and reporting on top of
// the repository. The CLI talks only to these services.

pub mod attendance;
pub mod error;
pub mod ledger;
pub mod payroll;
pub mod reporting;
pub mod roster;
pub mod summary;

pub use attendance::AttendanceService;
pub use error::*;
pub use ledger::{LedgerService, PaymentFilter};
pub use payroll::PayrollService;
pub use roster::RosterService;
pub use summary::SummaryService;

use crate::storage::{Repository, TtlCache};

/// All services wired over one repository and one shared cache.
pub struct App {
    pub ledger: LedgerService,
    pub attendance: AttendanceService,
    pub payroll: PayrollService,
    pub summary: SummaryService,
    pub roster: RosterService,
    pub cache: TtlCache,
}

impl App {
    pub fn new(repo: Repository) -> Self {
        let cache = TtlCache::new();
        let ledger = LedgerService::new(repo.clone());
        let attendance = AttendanceService::new(repo.clone());
        let payroll = PayrollService::new(repo.clone(), attendance.clone());
        let summary = SummaryService::new(repo.clone(), payroll.clone(), cache.clone());
        let roster = RosterService::new(repo);

        Self {
            ledger,
            attendance,
            payroll,
            summary,
            roster,
            cache,
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }
}
