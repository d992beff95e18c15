pub use sea_orm_migration::prelude::*;

mod m20260105_000001_identity;
mod m20260105_000002_workforce;
mod m20260112_000003_billing;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000001_identity::Migration),
            Box::new(m20260105_000002_workforce::Migration),
            Box::new(m20260112_000003_billing::Migration),
        ]
    }
}
