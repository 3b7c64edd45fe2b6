//! Revenue reports definitions.

pub mod client_revenue;
pub mod monthly_revenue;

pub use self::{
    client_revenue::Row as ClientRevenueRow,
    monthly_revenue::Row as MonthlyRevenueRow,
};
