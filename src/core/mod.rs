pub mod decimal;
pub mod overlay;
pub mod returns;
pub mod tax;
pub mod timestamp;
pub mod transaction;
pub mod validation;
pub mod window;

pub use returns::{calculate_returns, ReturnReport, ReturnRequest, ReturnType};
pub use timestamp::format_timestamp;
pub use transaction::{
    normalize_expenses, normalize_records, read_expenses_csv, read_expenses_json, Expense,
    NormalizeOptions, Transaction,
};
pub use validation::{
    validate, validate_with_constraints, InvalidTransaction, ValidationReport, ValidatorRequest,
};
