use colored::*;
use futures::FutureExt;
use sea_orm_migration::prelude::*;
use std::io::{self, Write};
use std::time::Instant;

const STATUS_COLUMN: usize = 72;

pub async fn run_all_migrations(url: &str) {
    let db = sea_orm::Database::connect(url)
        .await
        .expect("DB connection failed");

    println!("Applying attendance schema...");
    let manager = SchemaManager::new(&db);

    for migration in <crate::Migrator as MigratorTrait>::migrations() {
        apply(&manager, migration).await;
    }
}

async fn apply(manager: &SchemaManager<'_>, migration: Box<dyn MigrationTrait>) {
    let label = format!("  {}", migration.name().bold());
    print!(
        "{}{} ",
        label,
        ".".repeat(STATUS_COLUMN.saturating_sub(label.len()))
    );
    io::stdout().flush().unwrap();

    let start = Instant::now();
    let outcome = std::panic::AssertUnwindSafe(migration.up(manager))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => {
            let elapsed = format!("({:.2?})", start.elapsed()).dimmed();
            println!("{} {}", "ok".green(), elapsed);
        }
        Ok(Err(err)) => {
            println!("{} {}", "failed".red(), err);
            std::process::exit(1);
        }
        Err(_) => {
            println!("{} (panicked)", "failed".red());
            std::process::exit(1);
        }
    }
}
