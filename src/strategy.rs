//! Collaborator contracts owned by the driver, not the kernel: a `Strategy`
//! submits orders in response to bars, a `Datasource` supplies them. The
//! kernel only calls through these traits; it never knows how a strategy
//! is loaded or how bars were decoded from disk.

use crate::error::EngineResult;
use crate::gateway::TradingGateway;
use crate::types::MarketBar;

/// A trading strategy driven bar-by-bar by the runner.
pub trait Strategy {
    /// Parse and apply strategy-specific configuration.
    fn initialize(&mut self, config_blob: &[u8]) -> EngineResult<()>;

    /// Hand the strategy a handle to the gateway it will submit orders
    /// through, plus any auxiliary query surfaces.
    fn initialize_api(&mut self, gateway: &mut TradingGateway) -> EngineResult<()>;

    /// Observe a new bar and optionally submit orders via the gateway handle
    /// received in `initialize_api`.
    fn process_data(&mut self, bar: &MarketBar) -> EngineResult<()>;

    /// Strategy identity, used for trade/order attribution and result paths.
    fn name(&self) -> &str;
}

/// A source of market bars, consumed by the runner and the statistics engine.
pub trait Datasource {
    /// Open and prepare the backing data at `path`.
    fn initialize(&mut self, path: &str) -> EngineResult<()>;

    /// Number of bars available for `symbol`.
    fn count(&self, symbol: &str) -> EngineResult<usize>;

    /// Stream every bar for `symbol` in order, invoking `handler` for each.
    /// `handler` returns `false` to stop iteration early.
    fn read_all(
        &self,
        symbol: &str,
        handler: &mut dyn FnMut(&MarketBar) -> bool,
    ) -> EngineResult<()>;

    /// The most recent bar observed for `symbol`, if any.
    fn read_last(&self, symbol: &str) -> EngineResult<Option<MarketBar>>;

    /// The `n` bars immediately preceding `at` for `symbol`, oldest first.
    fn get_previous_n(&self, symbol: &str, at: i64, n: usize) -> EngineResult<Vec<MarketBar>>;
}
