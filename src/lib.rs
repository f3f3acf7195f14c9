//! Ordering core for a restaurant point of sale: menu catalog, cart,
//! confirmed-order history, daily reports and best-effort cloud sync.

pub mod auth;
pub mod cart;
pub mod commands;
pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod models;
pub mod money;
pub mod pricing;
pub mod remote;
pub mod sync;


use chrono::NaiveDate;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use commands::{categories, orders, products, reports};

pub use cart::Cart;
pub use config::Config;
pub use db::{Database, KeyValueStore, MemoryStore};
pub use error::{PosError, PosResult};
pub use models::{
    Category, ConfirmedOrder, DaySummary, OrderLineItem, OrderStatus, PaymentMethod, PortionType,
    Product, ProductSales, Variant,
};
pub use sync::{SyncBridge, SyncOutcome, SyncReport};

/// Install the global tracing subscriber: console output plus, when enabled,
/// a daily rolling file under `{data_dir}/logs`. Keep the returned guard
/// alive for as long as file logging should flush.
pub fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,comanda_lib=debug"));

    let console_layer = fmt::layer().with_target(true);

    let (file_layer, guard) = if config.log_to_file {
        let appender = tracing_appender::rolling::daily(config.log_dir(), "comanda.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    guard
}

/// Store plus reporting timezone, with the catalog, order and report
/// operations bound to them.
pub struct Comanda<S: KeyValueStore> {
    store: Arc<S>,
    tz: Tz,
}

impl Comanda<Database> {
    /// Open (and create if needed) the SQLite store named by `config`.
    pub fn open(config: &Config) -> PosResult<Self> {
        let db = Database::new(&config.db_path())?;
        db.initialize()?;
        Ok(Self::new(db, config.timezone))
    }
}

impl<S: KeyValueStore> Comanda<S> {
    pub fn new(store: S, tz: Tz) -> Self {
        Self {
            store: Arc::new(store),
            tz,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    // Catalog

    pub fn products(&self) -> PosResult<Vec<Product>> {
        products::get_products(self.store.as_ref())
    }

    pub fn product(&self, id: &str) -> PosResult<Product> {
        products::get_product(self.store.as_ref(), id)
    }

    pub fn save_product(&self, product: Product) -> PosResult<Product> {
        products::save_product(self.store.as_ref(), product)
    }

    pub fn delete_product(&self, id: &str) -> PosResult<()> {
        products::delete_product(self.store.as_ref(), id)
    }

    pub fn reorder_products(&self, ordered_ids: &[String]) -> PosResult<Vec<Product>> {
        products::reorder_products(self.store.as_ref(), ordered_ids)
    }

    pub fn categories(&self) -> PosResult<Vec<Category>> {
        categories::get_categories(self.store.as_ref())
    }

    pub fn save_category(&self, category: Category) -> PosResult<Category> {
        categories::save_category(self.store.as_ref(), category)
    }

    pub fn delete_category(&self, id: &str) -> PosResult<()> {
        categories::delete_category(self.store.as_ref(), id)
    }

    /// Add one portion of a catalog product to `cart`.
    pub fn add_to_cart(&self, cart: &mut Cart, product_id: &str, variant: Variant) -> PosResult<()> {
        let product = self.product(product_id)?;
        cart.add_item(&product, variant)
    }

    // Orders

    pub fn orders(&self) -> PosResult<Vec<ConfirmedOrder>> {
        orders::get_orders(self.store.as_ref())
    }

    pub fn order(&self, id: &str) -> PosResult<ConfirmedOrder> {
        orders::get_order(self.store.as_ref(), id)
    }

    /// Confirm the cart. On success the cart is emptied; on failure it is
    /// left untouched.
    pub fn confirm(
        &self,
        cart: &mut Cart,
        payment_method: Option<PaymentMethod>,
    ) -> PosResult<ConfirmedOrder> {
        let order = orders::finalize(
            self.store.as_ref(),
            cart.items().to_vec(),
            payment_method,
            self.tz,
        )?;
        cart.clear();
        Ok(order)
    }

    /// Confirm locally, then hand the order to the sync bridge in the
    /// background. Must be called inside a tokio runtime.
    pub fn confirm_and_sync(
        &self,
        cart: &mut Cart,
        payment_method: Option<PaymentMethod>,
        bridge: &Arc<SyncBridge>,
    ) -> PosResult<(ConfirmedOrder, JoinHandle<SyncOutcome>)> {
        let order = self.confirm(cart, payment_method)?;
        let handle = sync::spawn_sync(Arc::clone(bridge), order.clone());
        Ok((order, handle))
    }

    pub fn edit_order_items(
        &self,
        order_id: &str,
        items: Vec<OrderLineItem>,
    ) -> PosResult<ConfirmedOrder> {
        orders::edit_items(self.store.as_ref(), order_id, items)
    }

    pub fn set_order_status(&self, order_id: &str, status: OrderStatus) -> PosResult<ConfirmedOrder> {
        orders::set_status(self.store.as_ref(), order_id, status)
    }

    pub fn delete_order(&self, order_id: &str) -> PosResult<()> {
        orders::remove(self.store.as_ref(), order_id)
    }

    // Reports

    pub fn orders_on(&self, date: NaiveDate) -> PosResult<Vec<ConfirmedOrder>> {
        Ok(reports::orders_for_date(&self.orders()?, date, self.tz))
    }

    pub fn order_dates(&self) -> PosResult<Vec<NaiveDate>> {
        Ok(reports::available_dates(&self.orders()?, self.tz))
    }

    pub fn day_summary(&self, date: NaiveDate) -> PosResult<DaySummary> {
        Ok(reports::day_summary(&self.orders()?, date, self.tz))
    }

    pub fn today(&self) -> NaiveDate {
        reports::today_in(self.tz)
    }
}
