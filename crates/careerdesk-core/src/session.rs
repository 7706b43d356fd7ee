//! Session gate and the workspace it guards.
//!
//! The controllers only exist inside a `Workspace`, and the workspace only
//! exists while the gate is open, so nothing can reach the gateway while
//! logged out.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::chat::ChatController;
use crate::gateway::Gateway;
use crate::image::ImageController;

static NEXT_MOUNT: AtomicU64 = AtomicU64::new(1);

/// Identifies one mounted controller; completions are matched against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountId(u64);

impl MountId {
    pub fn next() -> Self {
        MountId(NEXT_MOUNT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The chat and image views, mounted side by side.
pub struct Workspace {
    pub chat: ChatController,
    pub image: ImageController,
}

impl Workspace {
    pub fn mount(gateway: &Gateway) -> Self {
        Self {
            chat: ChatController::mount(gateway.clone()),
            image: ImageController::new(gateway.clone()),
        }
    }
}

pub struct SessionGate {
    gateway: Gateway,
    workspace: Option<Workspace>,
}

impl SessionGate {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            workspace: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.workspace.is_some()
    }

    /// No credentials are checked. Returns false if already logged in.
    pub fn login(&mut self) -> bool {
        if self.workspace.is_some() {
            return false;
        }
        tracing::info!("logged in");
        self.workspace = Some(Workspace::mount(&self.gateway));
        true
    }

    /// Drops the workspace with its transcript and image result.
    pub fn logout(&mut self) -> bool {
        match self.workspace.take() {
            Some(_) => {
                tracing::info!("logged out");
                true
            }
            None => false,
        }
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    pub fn workspace_mut(&mut self) -> Option<&mut Workspace> {
        self.workspace.as_mut()
    }
}
