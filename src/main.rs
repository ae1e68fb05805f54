use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use hostel_payments::cache::PaymentCache;
use hostel_payments::config::AppConfig;
use hostel_payments::logging::init_tracing;
use hostel_payments::payments::backend::HttpPaymentsBackend;
use hostel_payments::payments::confirmers::{
    CheckoutSession, CheckoutWidget, GatewayResponse, WidgetOutcome,
};
use hostel_payments::payments::registry::MethodRegistry;
use hostel_payments::payments::types::{
    CardDetails, FormData, PaymentIntent, PaymentKind, PaymentMethod,
};
use hostel_payments::services::{PaymentHistoryService, PaymentOrchestrator};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Hostel rent payments from the terminal", long_about = None)]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Pay for a booking, a monthly rent record or an invoice
    Pay {
        /// razorpay, stripe, paytm, phonepe, upi or card
        method: PaymentMethod,
        /// advance, monthly or invoice
        kind: PaymentKind,
        target_id: String,
        /// Amount in the smallest currency unit
        amount: u64,
    },
    /// List payments or invoices
    History {
        #[arg(value_enum, default_value = "student")]
        list: HistoryList,
    },
    /// List the available payment methods
    Methods,
}

#[derive(ValueEnum, PartialEq, Eq, Clone, Copy, Debug)]
enum HistoryList {
    Student,
    Owner,
    Invoices,
}

/// Renders the hosted checkout on the terminal. An empty line closes it.
struct TerminalCheckoutWidget;

#[async_trait]
impl CheckoutWidget for TerminalCheckoutWidget {
    async fn open(&self, session: CheckoutSession) -> WidgetOutcome {
        eprintln!(
            "{} checkout: order {} for {} {} (key {})",
            session.merchant_name,
            session.order_id,
            session.amount,
            session.currency,
            session.key_id.as_deref().unwrap_or("unset")
        );
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let Some(payment_id) = prompt(&mut lines, "gateway payment id").await else {
            return WidgetOutcome::Dismissed;
        };
        let Some(signature) = prompt(&mut lines, "gateway signature").await else {
            return WidgetOutcome::Dismissed;
        };
        WidgetOutcome::Completed(GatewayResponse {
            order_id: session.order_id,
            payment_id,
            signature,
        })
    }
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Option<String> {
    eprint!("{}: ", label);
    match lines.next_line().await {
        Ok(Some(line)) if !line.trim().is_empty() => Some(line.trim().to_string()),
        _ => None,
    }
}

fn form_from_env(method: PaymentMethod) -> FormData {
    let var = |name: &str| std::env::var(name).unwrap_or_default();
    match method {
        PaymentMethod::Card => FormData::Card(CardDetails {
            number: var("CARD_NUMBER"),
            expiry: var("CARD_EXPIRY"),
            cvv: var("CARD_CVV"),
            holder_name: var("CARD_HOLDER"),
        }),
        PaymentMethod::Upi => FormData::Upi {
            upi_id: var("UPI_ID"),
        },
        _ => FormData::None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let config = AppConfig::from_env()?;
    config.validate()?;
    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        simulation_mode = config.payments.simulation_mode,
        "hostel payments client starting"
    );

    let backend = Arc::new(HttpPaymentsBackend::from_config(&config.api)?);
    let cache = PaymentCache::new();

    match opts.command {
        Command::Pay {
            method,
            kind,
            target_id,
            amount,
        } => {
            let registry = MethodRegistry::with_defaults(
                &config.payments,
                &config.gateway,
                Arc::new(TerminalCheckoutWidget),
            );
            let orchestrator = PaymentOrchestrator::new(Arc::new(registry), backend, cache)
                .with_success_hook(|record| {
                    info!(payment_id = %record.id, method = %record.method, "payment completed");
                });

            let intent = PaymentIntent::new(target_id, amount, kind, method);
            match orchestrator.pay(intent, &form_from_env(method)).await {
                Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                Err(e) => {
                    error!(error = %e, "payment did not complete");
                    anyhow::bail!(e.user_message());
                }
            }
        }
        Command::History { list } => {
            let history = PaymentHistoryService::new(backend, cache);
            let rendered = match list {
                HistoryList::Student => {
                    serde_json::to_string_pretty(&history.load_student_payments().await?)?
                }
                HistoryList::Owner => {
                    serde_json::to_string_pretty(&history.load_owner_payments().await?)?
                }
                HistoryList::Invoices => {
                    serde_json::to_string_pretty(&history.load_invoices().await?)?
                }
            };
            println!("{}", rendered);
        }
        Command::Methods => {
            let registry = MethodRegistry::with_defaults(
                &config.payments,
                &config.gateway,
                Arc::new(TerminalCheckoutWidget),
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&registry.available_methods())?
            );
        }
    }

    Ok(())
}
