pub use sea_orm_migration::prelude::*;

mod m20260110_000000_init;
mod m20260215_000000_extrato;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_000000_init::Migration),
            Box::new(m20260215_000000_extrato::Migration),
        ]
    }
}
