//! Window managers disagree on what the geometry of a managed window means. The capability
//! table records, per manager, how the raw values have to be treated.
use std::collections::HashMap;

use tracing::debug;

/// How to interpret the geometry a particular window manager reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WmCapabilities {
    /// Position is relative to the frame and must be translated into desktop space
    pub needs_translation: bool,

    /// Reported position is the client's, the frame's top-left is `left` and `top` further out
    pub needs_border_adjust: bool,
}

impl Default for WmCapabilities {
    fn default() -> Self {
        Self { needs_translation: true, needs_border_adjust: false }
    }
}

/// CapabilityTable maps a lowercased window manager name to its capabilities
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityTable {
    entries: HashMap<String, WmCapabilities>,
    fallback: WmCapabilities,
}

impl CapabilityTable {
    /// Create an empty table where every manager gets the fallback capabilities
    pub fn new(fallback: WmCapabilities) -> Self {
        Self { entries: HashMap::new(), fallback }
    }

    /// The known quirks of common window managers
    ///
    /// ### Examples
    /// ```
    /// use libxwin::prelude::*;
    /// let table = CapabilityTable::builtin();
    /// assert!(table.lookup("KWin").needs_border_adjust);
    /// ```
    pub fn builtin() -> Self {
        let adjust = WmCapabilities { needs_translation: true, needs_border_adjust: true };
        let mut table = CapabilityTable::new(WmCapabilities::default());
        table.insert("compiz", WmCapabilities { needs_translation: false, needs_border_adjust: true });
        for name in ["kwin", "e16", "icewm", "blackbox", "fvwm"] {
            table.insert(name, adjust);
        }
        table
    }

    /// Add or replace the capabilities of the given manager
    pub fn insert(&mut self, name: &str, capabilities: WmCapabilities) {
        self.entries.insert(name.to_lowercase(), capabilities);
    }

    /// Capabilities of the given manager, the fallback if the manager is unknown
    pub fn lookup(&self, name: &str) -> WmCapabilities {
        let capabilities = self.entries.get(&name.to_lowercase()).copied().unwrap_or(self.fallback);
        debug!("capabilities: wm: {}, {:?}", name, capabilities);
        capabilities
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        CapabilityTable::builtin()
    }
}
