use crate::domain::Opportunity;
use crate::port::inbound::strategy::{DetectionContext, Strategy};

use super::direct::DirectSpreadStrategy;
use super::statistical::{StatisticalConfig, StatisticalStrategy};

/// Registry of enabled strategies.
///
/// The registry owns a collection of strategies (and through them, any
/// rolling state such as spread histories) and runs them during detection.
///
/// Use [`StrategyRegistryBuilder`] for convenient construction from config.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing a registry from config.
    #[must_use]
    pub fn builder() -> StrategyRegistryBuilder {
        StrategyRegistryBuilder::default()
    }

    /// Register a strategy.
    ///
    /// Strategies are run in registration order.
    pub fn register(&mut self, strategy: Box<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    /// Names of the registered strategies.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run every strategy and collect their candidates.
    pub fn detect_all(&mut self, ctx: &DetectionContext<'_>) -> Vec<Opportunity> {
        self.strategies
            .iter_mut()
            .flat_map(|s| s.detect(ctx))
            .collect()
    }
}

/// Builder for constructing a [`StrategyRegistry`] from configuration.
///
/// # Example
///
/// ```ignore
/// let registry = StrategyRegistry::builder()
///     .direct(0.8)
///     .statistical(config.statistical.clone())
///     .build();
/// ```
#[derive(Default)]
pub struct StrategyRegistryBuilder {
    direct_confidence: Option<f64>,
    statistical: Option<StatisticalConfig>,
}

impl StrategyRegistryBuilder {
    /// Enable the direct spread strategy with the given base confidence.
    #[must_use]
    pub fn direct(mut self, confidence: f64) -> Self {
        self.direct_confidence = Some(confidence);
        self
    }

    /// Enable the statistical mean-reversion strategy.
    #[must_use]
    pub fn statistical(mut self, config: StatisticalConfig) -> Self {
        self.statistical = Some(config);
        self
    }

    /// Build the registry with all enabled strategies.
    #[must_use]
    pub fn build(self) -> StrategyRegistry {
        let mut registry = StrategyRegistry::new();

        if let Some(confidence) = self.direct_confidence {
            registry.register(Box::new(DirectSpreadStrategy::new(confidence)));
        }

        if let Some(config) = self.statistical {
            registry.register(Box::new(StatisticalStrategy::new(config)));
        }

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_registers_enabled_strategies() {
        let registry = StrategyRegistry::builder()
            .direct(0.8)
            .statistical(StatisticalConfig::default())
            .build();

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.strategy_names(),
            vec!["direct_spread", "statistical_mean_reversion"]
        );
    }

    #[test]
    fn empty_builder_yields_empty_registry() {
        assert!(StrategyRegistry::builder().build().is_empty());
    }
}
