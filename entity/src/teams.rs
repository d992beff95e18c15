use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "teams")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    #[serde(skip)]
    pub company_name: String,
    pub name: String,
    pub lead_email: Option<String>,
    /// JSON array of member emails.
    pub members: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn member_emails(&self) -> Vec<String> {
        serde_json::from_value(self.members.clone()).unwrap_or_default()
    }

    pub fn has_member(&self, email: &str) -> bool {
        self.lead_email.as_deref() == Some(email)
            || self.member_emails().iter().any(|member| member == email)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
