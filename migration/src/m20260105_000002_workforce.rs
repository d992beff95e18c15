use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    CompanyName,
    EmpEmail,
    Name,
    Phone,
    Address,
    Designation,
    Department,
    MonthlySalary,
    LeaveBalance,
    Permissions,
    JoinedOn,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Announcements { Table, Id, CompanyName, Title, Body, AuthorEmail, Pinned, CreatedAt }

#[derive(DeriveIden)]
enum LeaveRequests {
    Table,
    Id,
    CompanyName,
    EmpEmail,
    Kind,
    StartDate,
    EndDate,
    Days,
    Reason,
    Status,
    DecidedBy,
    DecidedAt,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PayrollRuns { Table, Id, CompanyName, Period, Lines, TotalNet, CreatedBy, CreatedAt }

#[derive(DeriveIden)]
enum PayslipRequests { Table, Id, CompanyName, EmpEmail, Period, Status, Payslip, Note, CreatedAt, ResolvedAt }

#[derive(DeriveIden)]
enum Teams { Table, Id, CompanyName, Name, LeadEmail, Members, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum ChatMessages { Table, Id, CompanyName, Channel, SenderEmail, SenderName, Body, CreatedAt }

#[derive(DeriveIden)]
enum JobPostings {
    Table,
    Id,
    CompanyName,
    Title,
    Description,
    Location,
    EmploymentType,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProfileUpdateRequests { Table, Id, CompanyName, EmpEmail, Changes, Status, DecidedBy, DecidedAt, Note, CreatedAt }

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Employees::Table)
                .if_not_exists()
                .col(ColumnDef::new(Employees::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Employees::CompanyName).string_len(256).not_null())
                .col(ColumnDef::new(Employees::EmpEmail).string_len(320).not_null().unique_key())
                .col(ColumnDef::new(Employees::Name).string_len(256).not_null())
                .col(ColumnDef::new(Employees::Phone).string_len(64))
                .col(ColumnDef::new(Employees::Address).text())
                .col(ColumnDef::new(Employees::Designation).string_len(128))
                .col(ColumnDef::new(Employees::Department).string_len(128))
                .col(ColumnDef::new(Employees::MonthlySalary).big_integer().not_null().default(0))
                .col(ColumnDef::new(Employees::LeaveBalance).integer().not_null().default(0))
                .col(ColumnDef::new(Employees::Permissions).json().not_null())
                .col(ColumnDef::new(Employees::JoinedOn).date().not_null())
                .col(ColumnDef::new(Employees::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Employees::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;
        manager.create_index(
            Index::create().name("idx_employees_company").table(Employees::Table).col(Employees::CompanyName).to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Announcements::Table)
                .if_not_exists()
                .col(ColumnDef::new(Announcements::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Announcements::CompanyName).string_len(256).not_null())
                .col(ColumnDef::new(Announcements::Title).string_len(256).not_null())
                .col(ColumnDef::new(Announcements::Body).text().not_null())
                .col(ColumnDef::new(Announcements::AuthorEmail).string_len(320).not_null())
                .col(ColumnDef::new(Announcements::Pinned).boolean().not_null().default(false))
                .col(ColumnDef::new(Announcements::CreatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;
        manager.create_index(
            Index::create().name("idx_announcements_company").table(Announcements::Table).col(Announcements::CompanyName).to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(LeaveRequests::Table)
                .if_not_exists()
                .col(ColumnDef::new(LeaveRequests::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(LeaveRequests::CompanyName).string_len(256).not_null())
                .col(ColumnDef::new(LeaveRequests::EmpEmail).string_len(320).not_null())
                .col(ColumnDef::new(LeaveRequests::Kind).string_len(16).not_null())
                .col(ColumnDef::new(LeaveRequests::StartDate).date().not_null())
                .col(ColumnDef::new(LeaveRequests::EndDate).date().not_null())
                .col(ColumnDef::new(LeaveRequests::Days).integer().not_null())
                .col(ColumnDef::new(LeaveRequests::Reason).text().not_null())
                .col(ColumnDef::new(LeaveRequests::Status).string_len(16).not_null())
                .col(ColumnDef::new(LeaveRequests::DecidedBy).string_len(320))
                .col(ColumnDef::new(LeaveRequests::DecidedAt).timestamp_with_time_zone())
                .col(ColumnDef::new(LeaveRequests::Note).text())
                .col(ColumnDef::new(LeaveRequests::CreatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;
        manager.create_index(
            Index::create().name("idx_leave_requests_company").table(LeaveRequests::Table).col(LeaveRequests::CompanyName).to_owned()
        ).await?;
        manager.create_index(
            Index::create().name("idx_leave_requests_employee").table(LeaveRequests::Table).col(LeaveRequests::EmpEmail).to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(PayrollRuns::Table)
                .if_not_exists()
                .col(ColumnDef::new(PayrollRuns::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(PayrollRuns::CompanyName).string_len(256).not_null())
                .col(ColumnDef::new(PayrollRuns::Period).string_len(7).not_null())
                .col(ColumnDef::new(PayrollRuns::Lines).json().not_null())
                .col(ColumnDef::new(PayrollRuns::TotalNet).big_integer().not_null())
                .col(ColumnDef::new(PayrollRuns::CreatedBy).string_len(320).not_null())
                .col(ColumnDef::new(PayrollRuns::CreatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;
        manager.create_index(
            Index::create()
                .name("idx_payroll_runs_company_period")
                .table(PayrollRuns::Table)
                .col(PayrollRuns::CompanyName)
                .col(PayrollRuns::Period)
                .unique()
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(PayslipRequests::Table)
                .if_not_exists()
                .col(ColumnDef::new(PayslipRequests::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(PayslipRequests::CompanyName).string_len(256).not_null())
                .col(ColumnDef::new(PayslipRequests::EmpEmail).string_len(320).not_null())
                .col(ColumnDef::new(PayslipRequests::Period).string_len(7).not_null())
                .col(ColumnDef::new(PayslipRequests::Status).string_len(16).not_null())
                .col(ColumnDef::new(PayslipRequests::Payslip).json())
                .col(ColumnDef::new(PayslipRequests::Note).text())
                .col(ColumnDef::new(PayslipRequests::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(PayslipRequests::ResolvedAt).timestamp_with_time_zone())
                .to_owned()
        ).await?;
        manager.create_index(
            Index::create().name("idx_payslip_requests_company").table(PayslipRequests::Table).col(PayslipRequests::CompanyName).to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Teams::Table)
                .if_not_exists()
                .col(ColumnDef::new(Teams::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Teams::CompanyName).string_len(256).not_null())
                .col(ColumnDef::new(Teams::Name).string_len(128).not_null())
                .col(ColumnDef::new(Teams::LeadEmail).string_len(320))
                .col(ColumnDef::new(Teams::Members).json().not_null())
                .col(ColumnDef::new(Teams::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Teams::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;
        manager.create_index(
            Index::create()
                .name("idx_teams_company_name")
                .table(Teams::Table)
                .col(Teams::CompanyName)
                .col(Teams::Name)
                .unique()
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(ChatMessages::Table)
                .if_not_exists()
                .col(ColumnDef::new(ChatMessages::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(ChatMessages::CompanyName).string_len(256).not_null())
                .col(ColumnDef::new(ChatMessages::Channel).string_len(64).not_null())
                .col(ColumnDef::new(ChatMessages::SenderEmail).string_len(320).not_null())
                .col(ColumnDef::new(ChatMessages::SenderName).string_len(256))
                .col(ColumnDef::new(ChatMessages::Body).text().not_null())
                .col(ColumnDef::new(ChatMessages::CreatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;
        manager.create_index(
            Index::create()
                .name("idx_chat_messages_channel")
                .table(ChatMessages::Table)
                .col(ChatMessages::CompanyName)
                .col(ChatMessages::Channel)
                .col(ChatMessages::CreatedAt)
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(JobPostings::Table)
                .if_not_exists()
                .col(ColumnDef::new(JobPostings::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(JobPostings::CompanyName).string_len(256).not_null())
                .col(ColumnDef::new(JobPostings::Title).string_len(256).not_null())
                .col(ColumnDef::new(JobPostings::Description).text().not_null())
                .col(ColumnDef::new(JobPostings::Location).string_len(256))
                .col(ColumnDef::new(JobPostings::EmploymentType).string_len(64))
                .col(ColumnDef::new(JobPostings::Status).string_len(16).not_null())
                .col(ColumnDef::new(JobPostings::CreatedBy).string_len(320).not_null())
                .col(ColumnDef::new(JobPostings::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(JobPostings::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;
        manager.create_index(
            Index::create().name("idx_job_postings_company").table(JobPostings::Table).col(JobPostings::CompanyName).to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(ProfileUpdateRequests::Table)
                .if_not_exists()
                .col(ColumnDef::new(ProfileUpdateRequests::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(ProfileUpdateRequests::CompanyName).string_len(256).not_null())
                .col(ColumnDef::new(ProfileUpdateRequests::EmpEmail).string_len(320).not_null())
                .col(ColumnDef::new(ProfileUpdateRequests::Changes).json().not_null())
                .col(ColumnDef::new(ProfileUpdateRequests::Status).string_len(16).not_null())
                .col(ColumnDef::new(ProfileUpdateRequests::DecidedBy).string_len(320))
                .col(ColumnDef::new(ProfileUpdateRequests::DecidedAt).timestamp_with_time_zone())
                .col(ColumnDef::new(ProfileUpdateRequests::Note).text())
                .col(ColumnDef::new(ProfileUpdateRequests::CreatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;
        manager.create_index(
            Index::create().name("idx_profile_updates_company").table(ProfileUpdateRequests::Table).col(ProfileUpdateRequests::CompanyName).to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ProfileUpdateRequests::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(JobPostings::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(ChatMessages::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Teams::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(PayslipRequests::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(PayrollRuns::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(LeaveRequests::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Announcements::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Employees::Table).to_owned()).await?;
        Ok(())
    }
}
