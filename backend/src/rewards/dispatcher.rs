use super::events::{DomainEvent, RewardEffect};
use super::rules::{
    DailyTaskBadges, FocusSessionReward, RewardRule, TaskCompletionNotice, TaskCompletionReward,
};
use std::sync::Arc;

/// Fans a domain event out to every registered rule, in registration order
#[derive(Clone)]
pub struct EventDispatcher {
    rules: Vec<Arc<dyn RewardRule>>,
}

impl EventDispatcher {
    /// A dispatcher with no rules
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Task completion reward, daily badges, completion notice and focus reward
    pub fn with_default_rules() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(Arc::new(TaskCompletionReward));
        dispatcher.register(Arc::new(DailyTaskBadges));
        dispatcher.register(Arc::new(TaskCompletionNotice));
        dispatcher.register(Arc::new(FocusSessionReward));
        dispatcher
    }

    pub fn register(&mut self, rule: Arc<dyn RewardRule>) {
        tracing::debug!("Registered reward rule: {}", rule.name());
        self.rules.push(rule);
    }

    pub fn dispatch(&self, event: &DomainEvent) -> Vec<RewardEffect> {
        let mut effects = Vec::new();

        for rule in &self.rules {
            let produced = rule.evaluate(event);
            if !produced.is_empty() {
                tracing::debug!("Rule {} produced {} effect(s)", rule.name(), produced.len());
            }
            effects.extend(produced);
        }

        effects
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::with_default_rules()
    }
}
