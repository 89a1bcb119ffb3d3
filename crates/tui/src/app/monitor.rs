use super::{
    config::{ChainConfig, XrayConfig},
    view::{polling_view, stream_view, MonitorView},
};
use crate::{error::TuiError, types::ChainType};
use tokio_util::sync::CancellationToken;
use xray_chains::{
    cosmos::models::CosmosTransaction, eth::models::EthTransaction, CosmosAdapter, EthAdapter,
    EthSubscriber,
};
use xray_core::{
    types::IMPLICIT_POOL, ChainAdapter, EngineReadGuard, EngineService, ReconciliationEngine,
    ServiceHandle,
};

/// Pools Ethereum nodes always report, shown even when empty
const ETH_POOLS: [&str; 2] = ["pending", "queued"];

/// Read side of one running data source
#[derive(Debug, Clone)]
pub enum Monitor {
    Ethereum {
        name: String,
        guard: EngineReadGuard<EthTransaction>,
    },
    Cosmos {
        name: String,
        guard: EngineReadGuard<CosmosTransaction>,
    },
    Stream {
        name: String,
        subscriber: EthSubscriber,
    },
}

impl Monitor {
    /// Builds the chain client and starts its background task
    pub fn spawn(
        chain: &ChainConfig,
        config: &XrayConfig,
        shutdown: &CancellationToken,
    ) -> Result<(Self, ServiceHandle), TuiError> {
        let name = chain.display_name();
        let endpoint = chain.endpoint()?;
        let setup_error = |source| TuiError::Monitor {
            name: name.clone(),
            source,
        };

        match chain.chain_type {
            ChainType::Eth => {
                let adapter = EthAdapter::new(&name, endpoint.as_str(), config.call_timeout())
                    .map_err(setup_error)?;
                let (guard, handle) = start_engine(adapter, chain, config, shutdown)?;
                Ok((Self::Ethereum { name, guard }, handle))
            }
            ChainType::Cosmos => {
                let adapter = CosmosAdapter::new(&name, endpoint.as_str(), config.call_timeout())
                    .map_err(setup_error)?;
                let (guard, handle) = start_engine(adapter, chain, config, shutdown)?;
                Ok((Self::Cosmos { name, guard }, handle))
            }
            ChainType::EthSub => {
                let subscriber =
                    EthSubscriber::new(&name, endpoint.as_str(), config.stream_capacity()?);
                let handle = subscriber.clone().spawn(shutdown.clone());
                Ok((Self::Stream { name, subscriber }, handle))
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Ethereum { name, .. } | Self::Cosmos { name, .. } | Self::Stream { name, .. } => {
                name
            }
        }
    }

    /// Copies the current state out into display panels
    pub async fn view(&self) -> MonitorView {
        match self {
            Self::Ethereum { name, guard } => {
                polling_view(name, &guard.snapshot().await, &ETH_POOLS)
            }
            Self::Cosmos { name, guard } => {
                polling_view(name, &guard.snapshot().await, &[IMPLICIT_POOL])
            }
            Self::Stream { name, subscriber } => {
                let recent = subscriber.buffer().items().await;
                stream_view(name, &recent, subscriber.last_error().await)
            }
        }
    }
}

fn start_engine<A: ChainAdapter>(
    adapter: A,
    chain: &ChainConfig,
    config: &XrayConfig,
    shutdown: &CancellationToken,
) -> Result<(EngineReadGuard<A::Payload>, ServiceHandle), TuiError> {
    let engine = ReconciliationEngine::new(adapter, config.engine_config()?);
    let guard = engine.read_guard();
    let handle = EngineService::spawn(engine, chain.polling_rate(), shutdown.clone());
    Ok((guard, handle))
}
