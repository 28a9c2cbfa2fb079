use super::Role;

/// Every operation the service layer exposes, named for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RecordPayment,
    AmendPayment,
    VoidPayment,
    ListPayments,
    ViewReceipt,
    ViewAttendanceSheet,
    MarkAttendance,
    ViewMonthlyPivot,
    CalculateSalary,
    EstimateSalaries,
    PaySalary,
    ManagePayouts,
    ListPayouts,
    ViewFinancialOverview,
    ExportReports,
    ManageRoster,
    ViewRoster,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::RecordPayment => "record-payment",
            Operation::AmendPayment => "amend-payment",
            Operation::VoidPayment => "void-payment",
            Operation::ListPayments => "list-payments",
            Operation::ViewReceipt => "view-receipt",
            Operation::ViewAttendanceSheet => "view-attendance-sheet",
            Operation::MarkAttendance => "mark-attendance",
            Operation::ViewMonthlyPivot => "view-monthly-pivot",
            Operation::CalculateSalary => "calculate-salary",
            Operation::EstimateSalaries => "estimate-salaries",
            Operation::PaySalary => "pay-salary",
            Operation::ManagePayouts => "manage-payouts",
            Operation::ListPayouts => "list-payouts",
            Operation::ViewFinancialOverview => "view-financial-overview",
            Operation::ExportReports => "export-reports",
            Operation::ManageRoster => "manage-roster",
            Operation::ViewRoster => "view-roster",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const ALL_ROLES: &[Role] = &[Role::Admin, Role::Teacher, Role::Student];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// The roles allowed to perform each operation. Day-to-day recording is
/// open to any signed-in role; monthly reports, salary administration and
/// roster changes are restricted to admins.
pub fn required_roles(operation: Operation) -> &'static [Role] {
    match operation {
        Operation::RecordPayment
        | Operation::AmendPayment
        | Operation::VoidPayment
        | Operation::ListPayments
        | Operation::ViewReceipt
        | Operation::ViewAttendanceSheet
        | Operation::MarkAttendance
        | Operation::EstimateSalaries
        | Operation::ViewRoster => ALL_ROLES,
        Operation::ViewMonthlyPivot
        | Operation::CalculateSalary
        | Operation::PaySalary
        | Operation::ManagePayouts
        | Operation::ListPayouts
        | Operation::ViewFinancialOverview
        | Operation::ExportReports
        | Operation::ManageRoster => ADMIN_ONLY,
    }
}

pub fn can_perform(actor: Role, required: &[Role]) -> bool {
    required.contains(&actor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_can_do_everything() {
        let operations = [
            Operation::RecordPayment,
            Operation::ViewMonthlyPivot,
            Operation::PaySalary,
            Operation::ManageRoster,
        ];
        for operation in operations {
            assert!(can_perform(Role::Admin, required_roles(operation)));
        }
    }

    #[test]
    fn test_teacher_scope() {
        assert!(can_perform(Role::Teacher, required_roles(Operation::MarkAttendance)));
        assert!(can_perform(Role::Teacher, required_roles(Operation::EstimateSalaries)));
        assert!(!can_perform(Role::Teacher, required_roles(Operation::CalculateSalary)));
        assert!(!can_perform(Role::Teacher, required_roles(Operation::ViewFinancialOverview)));
    }

    #[test]
    fn test_student_scope() {
        assert!(can_perform(Role::Student, required_roles(Operation::ListPayments)));
        assert!(!can_perform(Role::Student, required_roles(Operation::ManageRoster)));
        assert!(!can_perform(Role::Student, required_roles(Operation::PaySalary)));
    }
}
