pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_identity_schema;
mod m20250301_000002_create_user_roles;

pub struct IdentityMigrator;

#[async_trait::async_trait]
impl MigratorTrait for IdentityMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_identity_schema::Migration),
            Box::new(m20250301_000002_create_user_roles::Migration),
        ]
    }
}
