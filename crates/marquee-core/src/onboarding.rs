//! Onboarding gate
//!
//! Decides once per mount whether the player may start at all. An
//! indeterminate answer is fatal for the view: it never grants access.

use crate::error::{Error, Result};
use crate::navigation::{onboarding_redirect, NavigationTarget};
use crate::types::SessionConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Source of the "has the user finished onboarding" answer
#[async_trait]
pub trait OnboardingCheck: Send + Sync {
    async fn needs_onboarding(&self) -> anyhow::Result<bool>;
}

/// Check with a fixed answer
#[derive(Debug, Clone, Copy)]
pub struct FixedOnboarding(pub bool);

#[async_trait]
impl OnboardingCheck for FixedOnboarding {
    async fn needs_onboarding(&self) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}

/// Outcome of the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Mount the session controller
    Mount,
    /// Leave the player for onboarding; the controller never mounts
    Redirect(NavigationTarget),
}

/// Gate in front of the session controller
pub struct OnboardingGate {
    check: Arc<dyn OnboardingCheck>,
    config: SessionConfig,
}

impl OnboardingGate {
    pub fn new(check: Arc<dyn OnboardingCheck>, config: SessionConfig) -> Self {
        Self { check, config }
    }

    /// Run the check for a view opened at `target_path`
    #[instrument(skip(self))]
    pub async fn check(&self, target_path: &str) -> Result<GateDecision> {
        let needed = self.check.needs_onboarding().await.map_err(|e| {
            error!(error = %e, "Onboarding check failed");
            Error::Onboarding(e.to_string())
        })?;

        if needed {
            let target = onboarding_redirect(&self.config, target_path);
            info!(redirect = %target, "Onboarding required");
            Ok(GateDecision::Redirect(target))
        } else {
            Ok(GateDecision::Mount)
        }
    }
}
