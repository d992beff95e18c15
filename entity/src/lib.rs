//! Store records for SmartHR.
//!
//! Records reference each other through denormalized string keys
//! (`company_name`, `emp_email`) rather than foreign keys.

pub mod announcements;
pub mod chat_messages;
pub mod companies;
pub mod employees;
pub mod job_postings;
pub mod leave_requests;
pub mod payment_logs;
pub mod payroll_runs;
pub mod payslip_requests;
pub mod profile_update_requests;
pub mod sessions;
pub mod teams;
pub mod users;
