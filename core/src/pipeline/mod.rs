//! Orchestration of complete image builds
//!
//! Each pipeline is a straight line of states. The first error aborts the
//! build and comes back as [`Error::Aborted`] naming the last state that
//! completed; partial output is left where it is.

pub mod hybrid;
pub mod wrapped;

use std::fmt;

use log::info;

pub use hybrid::{build_hybrid, HybridReport, HybridState};
pub use wrapped::{
    build_esp, build_wrapped, wrap_esp, EspReport, EspState, WrapReport, WrapState, WrappedReport,
};

use crate::error::Error;

/// States a pipeline has completed, in order
struct Progress<S> {
    pipeline: &'static str,
    visited: Vec<S>,
}

impl<S: Copy + fmt::Display> Progress<S> {
    fn new(pipeline: &'static str) -> Self {
        Self {
            pipeline,
            visited: Vec::new(),
        }
    }

    fn reached(&mut self, state: S) {
        info!("{}: {}", self.pipeline, state);
        self.visited.push(state);
    }

    fn abort(&self, source: Error) -> Error {
        let completed = self
            .visited
            .last()
            .map_or_else(|| "start".to_string(), |s| s.to_string());
        log::error!("{}: aborted after {}: {}", self.pipeline, completed, source);
        Error::Aborted {
            pipeline: self.pipeline,
            completed,
            source: Box::new(source),
        }
    }

    fn into_states(self) -> Vec<S> {
        self.visited
    }
}
