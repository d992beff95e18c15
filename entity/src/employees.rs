use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub company_name: String,
    #[sea_orm(unique)]
    pub emp_email: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    /// Gross monthly pay in minor currency units.
    pub monthly_salary: i64,
    pub leave_balance: i32,
    /// JSON array of permission names.
    pub permissions: Json,
    pub joined_on: Date,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
