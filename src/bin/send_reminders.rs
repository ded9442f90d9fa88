//! Sends one round of payment reminders to every customer with an unpaid loan.
//!
//! Meant to be run by an external scheduler. Exits non-zero only when the
//! unpaid loans cannot be listed; individual delivery failures are counted in
//! the summary.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loan_reminders::config::{Config, MailTransport};
use loan_reminders::db::Database;
use loan_reminders::db_storage::PgLoanStore;
use loan_reminders::mailer;
use loan_reminders::payment_link::PaymentLinkBuilder;
use loan_reminders::reminders::ReminderDispatcher;
use loan_reminders::templates::Templates;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_reminders=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    println!("{}", "=".repeat(50));
    println!("📧 LOAN PAYMENT REMINDER SYSTEM");
    println!("{}", "=".repeat(50));
    println!("Sender: {} <{}>", config.sender_name, config.sender_email);
    println!("Payment links: {}", config.base_url);
    if config.mail_transport == MailTransport::Log {
        println!("Mail transport: log only, nothing will be delivered or recorded");
    }
    println!();

    let db = Database::new(&config.database_url).await?;
    db.migrate().await?;

    let dispatcher = ReminderDispatcher::new(
        Arc::new(PgLoanStore::new(db.pool.clone())),
        mailer::from_config(&config)?,
        Arc::new(Templates::new()?),
        PaymentLinkBuilder::new(&config.base_url)?,
        config.sender_name.clone(),
        config.currency_symbol.clone(),
    );

    let summary = dispatcher.run_reminder_pass().await?;

    println!();
    println!("{}", summary);

    db.pool.close().await;
    Ok(())
}
