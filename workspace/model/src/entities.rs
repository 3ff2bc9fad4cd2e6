//! This file serves as the root for all SeaORM entity modules.
//! We define the data models for the ledger here. The structure follows the
//! original accounts/transactions/bills schema but the free-floating lookup
//! tables are folded into closed enums persisted as their integer codes.

pub mod account;
pub mod bill;
pub mod bill_payment;
pub mod pay_schedule;
pub mod transaction;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::bill::Entity as Bill;
    pub use super::bill_payment::Entity as BillPayment;
    pub use super::pay_schedule::Entity as PaySchedule;
    pub use super::transaction::Entity as Transaction;
}
