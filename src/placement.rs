use crate::board::{Pixel, PixelBuffer};
use crate::cooldown::CooldownGate;
use crate::error::CanvasError;
use crate::identity::Identity;
use crate::status::StatusLog;
use crate::sync::Publisher;

/// Outcome of one placement request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementResult {
    Sent,
    Skipped,
    NotAuthenticated,
    Invalid,
    Disabled,
}

/// Side effects the UI layer should act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRequest {
    ShowSignIn,
}

/// State a placement reads and writes, borrowed for one request
pub struct PlacementContext<'a> {
    pub buffer: &'a mut PixelBuffer,
    pub cooldown: &'a mut CooldownGate,
    pub publisher: &'a mut dyn Publisher,
    pub identity: &'a mut Identity,
    pub status: &'a mut StatusLog,
    pub ui_requests: &'a mut Vec<UiRequest>,
    pub history_active: bool,
}

/// Gatekeeper for user placements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPipeline {
    enabled: bool,
    rate_limit_seconds: u32,
}

impl PlacementPipeline {
    pub fn new(enabled: bool, rate_limit_seconds: u32) -> Self {
        Self {
            enabled,
            rate_limit_seconds,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn rate_limit_seconds(&self) -> u32 {
        self.rate_limit_seconds
    }

    /// Run the gates in order and publish if all pass
    ///
    /// Sign-in and history gates come before bounds and cooldown, so a
    /// signed-out user clicking off the board is told to sign in.
    pub fn request_placement(&self, pixel: Pixel, ctx: PlacementContext<'_>) -> PlacementResult {
        if !self.enabled {
            ctx.status.warning("Pixel placement is disabled.");
            return PlacementResult::Disabled;
        }

        if !ctx.identity.is_authenticated() {
            ctx.ui_requests.push(UiRequest::ShowSignIn);
            ctx.status.warning("Sign in to place pixels.");
            return PlacementResult::NotAuthenticated;
        }

        if ctx.history_active {
            ctx.status
                .warning("Cannot place pixels while viewing history. Reset to current state first.");
            return PlacementResult::Invalid;
        }

        if let Err(e) = ctx.buffer.check(&pixel) {
            log::debug!("rejected {pixel:?}: {e}");
            ctx.status.warning(match e {
                CanvasError::Validation(reason) => reason,
                other => other.to_string(),
            });
            return PlacementResult::Invalid;
        }

        if ctx.cooldown.is_active() {
            ctx.status.info("Cooldown active. Pixel skipped.");
            return PlacementResult::Skipped;
        }

        match ctx.publisher.publish(pixel) {
            Ok(()) => {
                ctx.cooldown.start(self.rate_limit_seconds);
                ctx.identity.pixel_count += 1;
                ctx.buffer.apply(pixel, true);
                ctx.status.success(format!("Placed pixel at ({}, {}).", pixel.x, pixel.y));
                PlacementResult::Sent
            }
            Err(e) => {
                log::warn!("publish failed: {e}");
                ctx.status.error("Failed to send pixel.");
                PlacementResult::Skipped
            }
        }
    }
}

impl Default for PlacementPipeline {
    fn default() -> Self {
        Self::new(true, 1)
    }
}
