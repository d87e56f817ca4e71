//! Window construction worker - fetches window contents off the UI thread

use std::sync::Arc;

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::supply::{ContentSupply, WindowDescription};
use crate::error::SupplyError;
use crate::pagination::Direction;

/// Unique identifier for construction requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug)]
pub enum ConstructionRequest {
    Build {
        id: RequestId,
        /// Ring generation the request belongs to; bumped when in-flight work is abandoned
        generation: u64,
        window_index: usize,
        direction: Direction,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum ConstructionResponse {
    Built {
        id: RequestId,
        generation: u64,
        direction: Direction,
        description: WindowDescription,
    },
    Failed {
        id: RequestId,
        generation: u64,
        direction: Direction,
        window_index: usize,
        error: SupplyError,
    },
}

impl ConstructionResponse {
    pub fn id(&self) -> RequestId {
        match self {
            Self::Built { id, .. } | Self::Failed { id, .. } => *id,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Self::Built { generation, .. } | Self::Failed { generation, .. } => *generation,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::Built { direction, .. } | Self::Failed { direction, .. } => *direction,
        }
    }
}

pub fn construction_worker(
    supply: Arc<dyn ContentSupply>,
    requests: Receiver<ConstructionRequest>,
    responses: Sender<ConstructionResponse>,
) {
    while let Ok(request) = requests.recv() {
        let (id, generation, window_index, direction) = match request {
            ConstructionRequest::Build {
                id,
                generation,
                window_index,
                direction,
            } => (id, generation, window_index, direction),
            ConstructionRequest::Shutdown => break,
        };

        debug!("worker: building window {window_index} ({})", direction.as_str());
        let response = match supply.describe_window(window_index) {
            Ok(description) => ConstructionResponse::Built {
                id,
                generation,
                direction,
                description,
            },
            Err(error) => {
                warn!("worker: window {window_index} failed: {error}");
                ConstructionResponse::Failed {
                    id,
                    generation,
                    direction,
                    window_index,
                    error,
                }
            }
        };

        if responses.send(response).is_err() {
            break;
        }
    }
    debug!("worker: shutting down");
}
