use std::sync::Arc;

use rust_decimal::Decimal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use order_fulfillment::config::AppConfig;
use order_fulfillment::domain::order::OrderLine;
use order_fulfillment::domain::product::{NewProduct, Product};
use order_fulfillment::inventory::{DeadLetterQueue, InventoryLedger};
use order_fulfillment::metrics::{self, Metrics};
use order_fulfillment::service::OrderService;
use order_fulfillment::store::{
    self, InMemoryOrderStore, InMemoryProductStore, OrderStore, PgOrderStore, PgProductStore, ProductStore,
};

/// Demo catalogue: A and B for the happy path, C to run out.
struct Catalogue {
    a: Uuid,
    b: Uuid,
    c: Uuid,
}

fn demo_products() -> [NewProduct; 3] {
    [
        NewProduct::new("Product A", Decimal::new(1000, 2), 5).with_description("Happy path item"),
        NewProduct::new("Product B", Decimal::new(2000, 2), 3),
        NewProduct::new("Product C", Decimal::new(500, 2), 1).with_description("Nearly sold out"),
    ]
}

fn catalogue_from(seeded: &[Product]) -> anyhow::Result<Catalogue> {
    match seeded {
        [a, b, c] => Ok(Catalogue { a: a.id, b: b.id, c: c.id }),
        _ => anyhow::bail!("expected 3 seeded products, got {}", seeded.len()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_fulfillment=debug")),
        )
        .init();

    tracing::info!("🚀 Starting Order Fulfillment Demo");

    let config = AppConfig::from_env()?;
    tracing::info!(
        policy = ?config.transition_policy,
        deadline_ms = config.reservation_deadline.as_millis() as u64,
        postgres = config.database_url.is_some(),
        "Configuration loaded"
    );

    // === 1. Initialize Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    if config.metrics_port != 0 {
        // Start metrics HTTP server in background thread
        let metrics_registry = Arc::new(metrics.registry().clone());
        let port = config.metrics_port;
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Metrics runtime error: {}", e);
                    return;
                }
            };
            rt.block_on(async {
                if let Err(e) = metrics::start_metrics_server(metrics_registry, port).await {
                    tracing::error!("Metrics server error: {}", e);
                }
            });
        });
    }

    // === 2. Choose storage backend and seed the catalogue ===
    let (products, orders, catalogue): (Arc<dyn ProductStore>, Arc<dyn OrderStore>, Catalogue) =
        match &config.database_url {
            Some(url) => {
                tracing::info!("Connecting to PostgreSQL...");
                let pool = store::postgres::connect(url, config.db_max_connections).await?;
                store::postgres::migrate(&pool).await?;

                let products = PgProductStore::new(pool.clone());
                let mut seeded = Vec::new();
                for product in demo_products() {
                    seeded.push(products.insert_product(product).await?);
                }
                (Arc::new(products), Arc::new(PgOrderStore::new(pool)), catalogue_from(&seeded)?)
            }
            None => {
                tracing::info!("No {} set, using in-memory stores", order_fulfillment::config::ENV_DATABASE_URL);
                let products = InMemoryProductStore::new();
                let mut seeded = Vec::new();
                for product in demo_products() {
                    seeded.push(products.insert_product(product).await?);
                }
                (Arc::new(products), Arc::new(InMemoryOrderStore::new()), catalogue_from(&seeded)?)
            }
        };

    // === 3. Wire the ledger and service ===
    let dlq = Arc::new(DeadLetterQueue::new(Arc::clone(&metrics)));
    let ledger = InventoryLedger::new(Arc::clone(&products), dlq, Arc::clone(&metrics));
    let service = OrderService::new(
        orders,
        Arc::clone(&products),
        ledger,
        Arc::clone(&metrics),
        config.service_settings(),
    );

    // === 4. Demonstrate the order lifecycle ===
    tracing::info!("📝 Creating order for 2 x A and 1 x B");
    let order = service
        .create_order(
            "demo-user",
            vec![OrderLine::new(catalogue.a, 2), OrderLine::new(catalogue.b, 1)],
        )
        .await?;
    tracing::info!(order_id = %order.id, total = %order.total, status = %order.status, "Order placed");
    log_stock(products.as_ref(), &catalogue).await?;

    tracing::info!("📝 Trying to order 2 x C (only 1 in stock)");
    match service
        .create_order("demo-user", vec![OrderLine::new(catalogue.c, 2)])
        .await
    {
        Ok(order) => tracing::warn!(order_id = %order.id, "Unexpectedly placed an oversold order"),
        Err(e) => tracing::info!(kind = e.kind().as_label(), http = e.kind().status_code(), "Rejected as expected: {}", e),
    }

    match service.update_order_status(order.id, "bogus").await {
        Ok(_) => tracing::warn!("Bogus status unexpectedly accepted"),
        Err(e) => tracing::info!("Rejected as expected: {}", e),
    }

    // Both moves are legal under either transition policy
    for status in ["confirmed", "shipped"] {
        let updated = service.update_order_status(order.id, status).await?;
        tracing::info!(order_id = %updated.id, status = %updated.status, "✅ Order advanced");
    }

    tracing::info!("📝 Placing 1 x B, then cancelling it while still pending");
    let second = service
        .create_order("demo-user", vec![OrderLine::new(catalogue.b, 1)])
        .await?;
    log_stock(products.as_ref(), &catalogue).await?;

    let cancelled = service.update_order_status(second.id, "cancelled").await?;
    tracing::info!(order_id = %cancelled.id, status = %cancelled.status, "✅ Order cancelled, stock released");
    log_stock(products.as_ref(), &catalogue).await?;

    let history = service.get_user_orders("demo-user").await?;
    tracing::info!(orders = history.len(), "Order history for demo-user");

    let dlq_stats = service.ledger().dead_letters().stats().await;
    if dlq_stats.total_entries > 0 {
        tracing::warn!(entries = dlq_stats.total_entries, "Unreleased reservations waiting for redrive");
    }

    tracing::info!("🎉 Demo complete!");

    Ok(())
}

async fn log_stock(products: &dyn ProductStore, catalogue: &Catalogue) -> anyhow::Result<()> {
    for (label, id) in [("A", catalogue.a), ("B", catalogue.b), ("C", catalogue.c)] {
        let product = products.get_by_id(id).await?;
        tracing::info!(product = label, stock = product.stock_quantity, "Stock level");
    }
    Ok(())
}
