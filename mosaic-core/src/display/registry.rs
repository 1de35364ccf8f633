//! Bounded display registry
//!
//! A fixed-capacity, insertion-ordered collection of display instances,
//! each uniquely named. The constrained target favors explicit capacity
//! failure over dynamic growth.

use core::fmt::{self, Write};

use heapless::Vec;

use crate::config::DisplayConfig;
use crate::traits::PanelDriver;

use super::instance::DisplayInstance;

/// Maximum number of registered displays
pub const MAX_DISPLAYS: usize = 8;

/// Errors from display registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Registry already holds [`MAX_DISPLAYS`] instances
    Full,
    /// A display of that name is already registered
    DuplicateName,
}

/// Fixed-capacity collection of display instances
pub struct DisplayRegistry<D> {
    displays: Vec<DisplayInstance<D>, MAX_DISPLAYS>,
}

impl<D: PanelDriver> DisplayRegistry<D> {
    pub const fn new() -> Self {
        Self { displays: Vec::new() }
    }

    /// Register a display; does not touch the hardware
    ///
    /// Fails without mutating state when at capacity or when the name is
    /// already taken.
    pub fn add(&mut self, config: DisplayConfig, driver: D) -> Result<(), RegistryError> {
        if self.get(config.name.as_str()).is_some() {
            return Err(RegistryError::DuplicateName);
        }
        self.displays
            .push(DisplayInstance::new(config, driver))
            .map_err(|_| RegistryError::Full)
    }

    /// Bring up every display in registration order
    ///
    /// Returns true only if all succeed, but keeps initializing the rest
    /// after a failure; per-instance `is_initialized` exposes partial
    /// success.
    pub fn initialize_all(&mut self) -> bool {
        let mut all_ok = true;
        for display in self.displays.iter_mut() {
            if display.init().is_err() {
                all_ok = false;
            }
        }
        all_ok
    }

    /// Exact case-sensitive lookup by name
    pub fn get(&self, name: &str) -> Option<&DisplayInstance<D>> {
        self.displays.iter().find(|d| d.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DisplayInstance<D>> {
        self.displays.iter_mut().find(|d| d.name() == name)
    }

    /// Position of a display in registration order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.displays.iter().position(|d| d.name() == name)
    }

    pub fn get_by_index(&self, index: usize) -> Option<&DisplayInstance<D>> {
        self.displays.get(index)
    }

    pub fn get_by_index_mut(&mut self, index: usize) -> Option<&mut DisplayInstance<D>> {
        self.displays.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.displays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displays.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayInstance<D>> {
        self.displays.iter()
    }

    /// Show the test pattern on every registered display, in order
    pub fn show_all_test_patterns(&mut self) {
        for display in self.displays.iter_mut() {
            display.show_test_pattern();
        }
    }

    /// Write one line per display, in registration order
    pub fn list<W: Write>(&self, out: &mut W) -> fmt::Result {
        for (index, display) in self.displays.iter().enumerate() {
            let cfg = display.config();
            writeln!(
                out,
                "[{}] {} - {}x{} ({} {})",
                index,
                display.name(),
                cfg.width,
                cfg.height,
                cfg.manufacturer.as_str(),
                cfg.model.as_str(),
            )?;
        }
        Ok(())
    }
}

impl<D: PanelDriver> Default for DisplayRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}
